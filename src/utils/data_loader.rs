//! Data loading and artifact persistence helpers

use crate::error::{BackorderError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Load a CSV file with a header row. Types are inferred over the whole file.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BackorderError::DataError(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Like [`read_csv`], with `null_token` read as a missing value in every column
pub fn read_csv_with_nulls(path: impl AsRef<Path>, null_token: &str) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(BackorderError::DataError(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| {
            opts.with_null_values(Some(NullValues::AllColumnsSingle(null_token.into())))
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Parse CSV content held in memory
pub fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

/// Write a DataFrame as CSV, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Render a DataFrame as CSV bytes
pub fn csv_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(df)?;
    Ok(buf)
}

/// Persist any serializable object with bincode
pub fn save_object<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, value)?;
    Ok(())
}

pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        BackorderError::SerializationError(format!("cannot open {}: {}", path.display(), e))
    })?;
    Ok(bincode::deserialize_from(BufReader::new(file))?)
}

/// Persist a numeric matrix
pub fn save_array(path: impl AsRef<Path>, array: &Array2<f64>) -> Result<()> {
    save_object(path, array)
}

pub fn load_array(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    load_object(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn test_csv_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.csv");
        let mut df = df!(
            "qty" => &[1.0, 2.5, 3.0],
            "risk" => &["Yes", "No", "No"],
        )
        .unwrap();

        write_csv(&mut df, &path).unwrap();
        let loaded = read_csv(&path).unwrap();
        assert_eq!(loaded.shape(), (3, 2));
        assert_eq!(loaded.column("risk").unwrap().str().unwrap().get(0), Some("Yes"));
    }

    #[test]
    fn test_read_missing_csv_errors() {
        let dir = tempdir().unwrap();
        assert!(read_csv(dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn test_array_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.bin");
        let arr = array![[1.0, 0.0], [2.0, 1.0]];
        save_array(&path, &arr).unwrap();
        assert_eq!(load_array(&path).unwrap(), arr);
    }

    #[test]
    fn test_null_token_becomes_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "lead_time,deck_risk\n8,No\nna,Yes\n").unwrap();
        let df = read_csv_with_nulls(&path, "na").unwrap();
        assert_eq!(df.column("lead_time").unwrap().null_count(), 1);
        assert!(df.column("lead_time").unwrap().dtype().is_primitive_numeric());
    }

    #[test]
    fn test_csv_bytes_parse_back() {
        let mut df = df!("a" => &[1i64, 2]).unwrap();
        let bytes = csv_bytes(&mut df).unwrap();
        assert_eq!(read_csv_bytes(bytes).unwrap().height(), 2);
    }

    #[test]
    fn test_read_csv_bytes() {
        let df = read_csv_bytes(b"a,b\n1,x\n2,y\n".to_vec()).unwrap();
        assert_eq!(df.height(), 2);
    }
}

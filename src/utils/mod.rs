//! Utility functions and types

pub mod data_loader;
pub mod stats;

pub use data_loader::{
    csv_bytes, load_array, load_object, read_csv, read_csv_bytes, read_csv_with_nulls, save_array,
    save_object, write_csv,
};
pub use stats::{percentile, sorted_finite};

//! Order statistics shared by the preprocessing transformers

use std::cmp::Ordering;

/// Finite values of `values`, sorted ascending. NaN and nulls are skipped.
pub fn sorted_finite<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut out: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Percentile `q` (0..=100) of already sorted data with linear interpolation
/// between closest ranks. Returns `None` for empty input.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 100.0);
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_linear_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), Some(1.0));
        assert_eq!(percentile(&data, 100.0), Some(4.0));
        assert!((percentile(&data, 25.0).unwrap() - 1.75).abs() < 1e-12);
        assert!((percentile(&data, 75.0).unwrap() - 3.25).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_empty() {
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_sorted_finite_skips_missing() {
        let sorted = sorted_finite(vec![Some(3.0), None, Some(f64::NAN), Some(1.0)]);
        assert_eq!(sorted, vec![1.0, 3.0]);
    }
}

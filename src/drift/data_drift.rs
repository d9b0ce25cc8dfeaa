//! Two-sample Kolmogorov-Smirnov test

use crate::drift::{DriftDetector, DriftResult};
use crate::error::{BackorderError, Result};
use crate::utils::sorted_finite;
use serde::{Deserialize, Serialize};

/// Kolmogorov-Smirnov test for distribution comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KolmogorovSmirnovTest {
    /// Significance level (alpha)
    alpha: f64,
}

impl KolmogorovSmirnovTest {
    /// Create new KS test
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.001, 0.5),
        }
    }

    /// Supremum distance between the two empirical CDFs; inputs must be sorted
    pub fn statistic(reference: &[f64], current: &[f64]) -> f64 {
        let (n1, n2) = (reference.len() as f64, current.len() as f64);
        let (mut i, mut j) = (0, 0);
        let mut d: f64 = 0.0;
        while i < reference.len() && j < current.len() {
            let x = reference[i].min(current[j]);
            while i < reference.len() && reference[i] <= x {
                i += 1;
            }
            while j < current.len() && current[j] <= x {
                j += 1;
            }
            d = d.max((i as f64 / n1 - j as f64 / n2).abs());
        }
        d
    }

    /// Asymptotic p-value of statistic `d` for sample sizes `n1` and `n2`
    pub fn p_value(d: f64, n1: usize, n2: usize) -> f64 {
        let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
        let lambda = (en + 0.12 + 0.11 / en) * d;
        Self::kolmogorov_survival(lambda)
    }

    /// Q(lambda) = 2 * sum_{j>=1} (-1)^(j-1) exp(-2 j^2 lambda^2)
    fn kolmogorov_survival(lambda: f64) -> f64 {
        if lambda < 1e-3 {
            return 1.0;
        }
        let a2 = -2.0 * lambda * lambda;
        let mut sum = 0.0;
        let mut sign = 1.0;
        let mut previous = 0.0;
        for j in 1..=100 {
            let j = j as f64;
            let term = sign * 2.0 * (a2 * j * j).exp();
            sum += term;
            if term.abs() <= 1e-3 * previous || term.abs() <= 1e-8 * sum.abs() {
                return sum.clamp(0.0, 1.0);
            }
            sign = -sign;
            previous = term.abs();
        }
        // did not converge: only happens for tiny lambda, where Q is 1
        1.0
    }
}

impl Default for KolmogorovSmirnovTest {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl DriftDetector for KolmogorovSmirnovTest {
    fn detect(&self, reference: &[Option<f64>], current: &[Option<f64>]) -> Result<DriftResult> {
        let reference = sorted_finite(reference.iter().copied());
        let current = sorted_finite(current.iter().copied());
        if reference.is_empty() || current.is_empty() {
            return Err(BackorderError::ValidationError(
                "cannot test drift on a column without values".to_string(),
            ));
        }

        let statistic = Self::statistic(&reference, &current);
        let p_value = Self::p_value(statistic, reference.len(), current.len());
        Ok(DriftResult {
            drift_detected: p_value < self.alpha,
            statistic,
            p_value,
        })
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }
}

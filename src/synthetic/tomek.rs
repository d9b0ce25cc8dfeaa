//! Tomek link under-sampling

use super::{check_inputs, class_counts, squared_distance, ResampleResult, Sampler};
use crate::error::Result;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Removes the majority-class member of every Tomek link.
///
/// Two samples of different classes form a link when each is the other's
/// nearest neighbour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomekLinks {
    majority_class: Option<i64>,
}

impl TomekLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nearest neighbour of every row, ties broken by lowest index.
    ///
    /// Rows are swept in order of their first feature. A scan in either
    /// direction stops once the gap on that feature alone exceeds the best
    /// distance found.
    fn nearest_neighbors(x: &Array2<f64>) -> Vec<Option<usize>> {
        let n = x.nrows();
        if n < 2 {
            return vec![None; n];
        }
        if x.ncols() == 0 {
            // every pair is at distance zero
            return (0..n).map(|i| Some(usize::from(i == 0))).collect();
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| x[[a, 0]].total_cmp(&x[[b, 0]]).then(a.cmp(&b)));
        let mut rank_of = vec![0; n];
        for (rank, &i) in order.iter().enumerate() {
            rank_of[i] = rank;
        }

        (0..n)
            .into_par_iter()
            .map(|i| {
                let rank = rank_of[i];
                let row = x.row(i);
                let key = x[[i, 0]];
                let mut best: Option<(f64, usize)> = None;
                let mut visit = |j: usize| -> bool {
                    let gap = x[[j, 0]] - key;
                    if best.is_some_and(|(bd, _)| gap * gap > bd) {
                        return false;
                    }
                    let d = squared_distance(row, x.row(j));
                    if best.map_or(true, |(bd, bj)| d < bd || (d == bd && j < bj)) {
                        best = Some((d, j));
                    }
                    true
                };
                for &j in order[rank + 1..].iter() {
                    if !visit(j) {
                        break;
                    }
                }
                for &j in order[..rank].iter().rev() {
                    if !visit(j) {
                        break;
                    }
                }
                best.map(|(_, j)| j)
            })
            .collect()
    }

    /// Index pairs `(i, j)` with `i < j` forming Tomek links
    pub fn links(x: &Array2<f64>, y: &Array1<i64>) -> Vec<(usize, usize)> {
        let nn = Self::nearest_neighbors(x);
        nn.iter()
            .enumerate()
            .filter_map(|(i, &j)| {
                let j = j?;
                (i < j && y[i] != y[j] && nn[j] == Some(i)).then_some((i, j))
            })
            .collect()
    }
}

impl Sampler for TomekLinks {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        check_inputs(x, y)?;
        // ties resolve to the larger label so the outcome is deterministic
        self.majority_class = class_counts(y)
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(class, _)| class);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        check_inputs(x, y)?;
        let majority = match self.majority_class {
            Some(class) => class,
            None => return Err(crate::error::BackorderError::ModelNotFitted),
        };

        let mut remove = vec![false; y.len()];
        for (i, j) in Self::links(x, y) {
            for k in [i, j] {
                if y[k] == majority {
                    remove[k] = true;
                }
            }
        }

        let keep: Vec<usize> = (0..y.len()).filter(|&i| !remove[i]).collect();
        let n_removed = y.len() - keep.len();
        tracing::debug!(removed = n_removed, "tomek links cleaned");

        Ok(ResampleResult {
            x: x.select(Axis(0), &keep),
            y: y.select(Axis(0), &keep),
            n_synthetic: Vec::new(),
            n_removed,
        })
    }
}

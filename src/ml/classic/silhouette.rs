//! Silhouette widths: how well each observation sits in its cluster.
//!
//! For observation `i` with mean distance `a` to its own cluster and mean
//! distance `b` to the nearest other cluster, `s(i) = (b - a) / max(a, b)`.
//! Members of singleton clusters get 0. Values near 1 mean a tight,
//! well-separated assignment; negative values suggest a better cluster exists.

use crate::error::{Error, Result};
use crate::ml::classic::distance::DistanceMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct Silhouette {
    widths: Vec<f64>,
    mean: f64,
}

impl Silhouette {
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Average width over all observations.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Average width per cluster id.
    pub fn cluster_means(&self, assignments: &[usize]) -> Vec<f64> {
        let k = assignments.iter().max().map_or(0, |&m| m + 1);
        let mut sums = vec![0.0; k];
        let mut counts = vec![0_usize; k];
        for (&c, &w) in assignments.iter().zip(&self.widths) {
            sums[c] += w;
            counts[c] += 1;
        }
        sums.iter()
            .zip(&counts)
            .map(|(&s, &n)| if n == 0 { 0.0 } else { s / n as f64 })
            .collect()
    }
}

/// Computes silhouette widths for a labelling of the observations behind
/// `distances`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `assignments` does not have one entry
/// per observation or uses fewer than two distinct clusters.
pub fn silhouette(distances: &DistanceMatrix, assignments: &[usize]) -> Result<Silhouette> {
    let n = distances.len();
    if assignments.len() != n {
        return Err(Error::invalid_input(format!(
            "expected {n} assignments, found {}",
            assignments.len()
        )));
    }
    let k = assignments.iter().max().map_or(0, |&m| m + 1);
    let mut sizes = vec![0_usize; k];
    for &c in assignments {
        sizes[c] += 1;
    }
    if sizes.iter().filter(|&&s| s > 0).count() < 2 {
        return Err(Error::invalid_input(
            "silhouette needs at least two non-empty clusters",
        ));
    }

    let widths: Vec<f64> = (0..n)
        .map(|i| {
            let own = assignments[i];
            if sizes[own] == 1 {
                return 0.0;
            }
            let mut totals = vec![0.0; k];
            for j in (0..n).filter(|&j| j != i) {
                totals[assignments[j]] += distances.get(i, j);
            }
            let a = totals[own] / (sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own && sizes[c] > 0)
                .map(|c| totals[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom == 0.0 {
                0.0
            } else {
                (b - a) / denom
            }
        })
        .collect();
    let mean = widths.iter().sum::<f64>() / n as f64;

    Ok(Silhouette { widths, mean })
}

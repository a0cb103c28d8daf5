//! Pairwise dissimilarities between observations.
//!
//! [`compute_distances`] fills the upper triangle of an `n × n` matrix row by
//! row in parallel and mirrors it, so the result is exactly symmetric with a
//! zero diagonal.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::ml::classic::matrix::ObservationMatrix;

/// Dissimilarity between two observation vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    #[default]
    Euclidean,
    SquaredEuclidean,
    Manhattan,
    /// Largest absolute coordinate difference (Chebyshev).
    Maximum,
    /// `1 - r` where `r` is the Pearson correlation of the two profiles.
    Correlation,
}

impl Metric {
    pub fn distance(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Metric::Euclidean => squared_euclidean(a, b).sqrt(),
            Metric::SquaredEuclidean => squared_euclidean(a, b),
            Metric::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
            Metric::Maximum => a
                .iter()
                .zip(b.iter())
                .fold(0.0, |acc, (x, y)| f64::max(acc, (x - y).abs())),
            Metric::Correlation => correlation_distance(a, b),
        }
    }
}

/// Squared Euclidean distance; used directly by k-means where the square
/// root never changes a comparison.
pub fn squared_euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0, |acc, (&x, &y)| acc + (x - y).powi(2))
}

fn correlation_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.sum() / n;
    let mean_b = b.sum() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    // Flat profiles have no defined correlation.
    if var_a == 0.0 || var_b == 0.0 {
        return if a == b { 0.0 } else { 1.0 };
    }
    (1.0 - cov / (var_a * var_b).sqrt()).clamp(0.0, 2.0)
}

/// Symmetric, zero-diagonal, non-negative `n × n` dissimilarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    values: Array2<f64>,
    metric: Metric,
}

impl DistanceMatrix {
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// Largest pairwise distance, handy for scaling a heatmap.
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Computes all pairwise distances between the observations of `matrix`.
///
/// # Errors
///
/// Returns [`Error::TooFewObservations`] if the matrix has fewer than two rows.
///
/// # Example
///
/// ```
/// use exprclust::ml::classic::{compute_distances, Metric, ObservationMatrix};
///
/// let data = ObservationMatrix::from_rows(&[vec![0.0, 0.0], vec![3.0, 4.0]]).unwrap();
/// let d = compute_distances(&data, Metric::Euclidean).unwrap();
/// assert_eq!(d.get(0, 1), 5.0);
/// ```
pub fn compute_distances(matrix: &ObservationMatrix, metric: Metric) -> Result<DistanceMatrix> {
    let n = matrix.n_observations();
    if n < 2 {
        return Err(Error::TooFewObservations {
            required: 2,
            found: n,
        });
    }

    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| metric.distance(matrix.row(i), matrix.row(j)))
                .collect()
        })
        .collect();

    let mut values = Array2::zeros((n, n));
    for (i, row) in upper.iter().enumerate() {
        for (offset, &d) in row.iter().enumerate() {
            let j = i + 1 + offset;
            values[[i, j]] = d;
            values[[j, i]] = d;
        }
    }
    log::debug!("computed {} pairwise {:?} distances", n * (n - 1) / 2, metric);

    Ok(DistanceMatrix { values, metric })
}

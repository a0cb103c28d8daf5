//! Seeded synthetic data for tests, benchmarks and demos.

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::ml::classic::matrix::ObservationMatrix;

/// Draws `per_center` points around each centre from an isotropic normal
/// distribution with standard deviation `spread`.
///
/// Rows are grouped by centre: rows `[c * per_center, (c + 1) * per_center)`
/// belong to `centers[c]`.
pub fn gaussian_blobs(
    centers: &[Vec<f64>],
    per_center: usize,
    spread: f64,
    seed: u64,
) -> Result<ObservationMatrix> {
    let dims = centers.first().map(Vec::len).ok_or(Error::EmptyMatrix)?;
    if let Some((row, c)) = centers.iter().enumerate().find(|(_, c)| c.len() != dims) {
        return Err(Error::DimensionMismatch {
            row,
            expected: dims,
            found: c.len(),
        });
    }
    let noise = Normal::new(0.0, spread).map_err(|e| Error::invalid_input(e.to_string()))?;
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let mut values = Array2::zeros((centers.len() * per_center, dims));
    for (c, center) in centers.iter().enumerate() {
        for p in 0..per_center {
            let mut row = values.row_mut(c * per_center + p);
            for (x, &mu) in row.iter_mut().zip(center) {
                *x = mu + noise.sample(&mut rng);
            }
        }
    }
    ObservationMatrix::new(values)
}

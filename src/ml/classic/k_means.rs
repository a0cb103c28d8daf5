use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::ml::classic::distance::squared_euclidean;
use crate::ml::classic::matrix::ObservationMatrix;

/// Configuration options for k-means clustering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KMeansConfig {
    /// Number of clusters to find.
    pub k: usize,
    /// Number of independent runs from random initial centroids.
    pub restarts: usize,
    /// Maximum number of assign/update iterations per run.
    pub max_iterations: usize,
    /// Seed for the per-restart random streams.
    pub seed: u64,
}

impl KMeansConfig {
    /// Create a new config with default values for restarts (10),
    /// max_iterations (300) and seed (0).
    pub fn new(k: usize) -> Self {
        Self {
            k,
            restarts: 10,
            max_iterations: 300,
            seed: 0,
        }
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a k-means fit.
///
/// Every observation has exactly one cluster id in `[0, k)`, and every id
/// has at least one observation when produced by [`kmeans`].
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult {
    assignments: Vec<usize>,
    centroids: Array2<f64>,
    total_within_ss: f64,
    iterations: usize,
    converged: bool,
}

impl PartitionResult {
    /// Builds a result from precomputed parts, e.g. to score an external
    /// partition.
    pub fn new(assignments: Vec<usize>, centroids: Array2<f64>, total_within_ss: f64) -> Result<Self> {
        let k = centroids.nrows();
        if k == 0 || centroids.ncols() == 0 {
            return Err(Error::invalid_input("centroid matrix is empty"));
        }
        if let Some(&bad) = assignments.iter().find(|&&c| c >= k) {
            return Err(Error::invalid_input(format!(
                "cluster id {bad} is out of range for {k} centroids"
            )));
        }
        if !total_within_ss.is_finite() || total_within_ss < 0.0 {
            return Err(Error::invalid_input(format!(
                "total within-cluster sum of squares must be finite and non-negative, got {total_within_ss}"
            )));
        }
        Ok(Self {
            assignments,
            centroids,
            total_within_ss,
            iterations: 0,
            converged: true,
        })
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Dimensionality of the centroids (number of features).
    pub fn n_features(&self) -> usize {
        self.centroids.ncols()
    }

    pub fn n_observations(&self) -> usize {
        self.assignments.len()
    }

    /// Cluster id of every observation, in observation order.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    pub fn centroid(&self, cluster: usize) -> ArrayView1<'_, f64> {
        self.centroids.row(cluster)
    }

    /// Sum over observations of the squared distance to their centroid.
    pub fn total_within_ss(&self) -> f64 {
        self.total_within_ss
    }

    /// Assign steps performed by the winning run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// False if the winning run stopped at the iteration cap.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }

    /// Observation indices assigned to `cluster`.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.assignments
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Runs k-means (Lloyd's algorithm) `config.restarts` times and returns the
/// run with the lowest total within-cluster sum of squares.
///
/// Restart `r` draws its initial centroids from a ChaCha20 stream seeded with
/// `config.seed` on stream `r`. Runs are independent and execute in parallel,
/// but the result only depends on the inputs: identical arguments give
/// identical results, and adding restarts never makes the result worse.
///
/// # Errors
///
/// - [`Error::InvalidClusterCount`] if `k` is 0 or not less than the number
///   of observations.
/// - [`Error::InvalidRestarts`] if `restarts` is 0.
/// - [`Error::InvalidInput`] if `max_iterations` is 0.
///
/// # Example
///
/// ```
/// use exprclust::ml::classic::{kmeans, KMeansConfig, ObservationMatrix};
///
/// let data = ObservationMatrix::from_rows(&[
///     vec![1.0, 2.0],
///     vec![1.5, 1.8],
///     vec![5.0, 8.0],
///     vec![8.0, 8.0],
/// ])
/// .unwrap();
///
/// let result = kmeans(&data, &KMeansConfig::new(2).with_seed(7)).unwrap();
/// assert_eq!(result.assignments()[0], result.assignments()[1]);
/// assert_ne!(result.assignments()[0], result.assignments()[3]);
/// ```
pub fn kmeans(data: &ObservationMatrix, config: &KMeansConfig) -> Result<PartitionResult> {
    validate(data, config)?;

    let runs: Vec<PartitionResult> = (0..config.restarts)
        .into_par_iter()
        .map(|restart| {
            let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
            rng.set_stream(restart as u64);
            let run = lloyd(data, config.k, config.max_iterations, &mut rng);
            log::debug!(
                "k={} restart={} wcss={} iterations={} converged={}",
                config.k,
                restart,
                run.total_within_ss,
                run.iterations,
                run.converged
            );
            run
        })
        .collect();

    best_run(runs).ok_or(Error::InvalidRestarts)
}

/// Same as [`kmeans`], but every restart draws from the caller's random
/// source, one after another. `config.seed` is ignored.
pub fn kmeans_with_rng<R: Rng + ?Sized>(
    data: &ObservationMatrix,
    config: &KMeansConfig,
    rng: &mut R,
) -> Result<PartitionResult> {
    validate(data, config)?;

    let runs = (0..config.restarts)
        .map(|_| lloyd(data, config.k, config.max_iterations, rng))
        .collect();
    best_run(runs).ok_or(Error::InvalidRestarts)
}

fn validate(data: &ObservationMatrix, config: &KMeansConfig) -> Result<()> {
    let n = data.n_observations();
    if config.k == 0 || config.k >= n {
        return Err(Error::InvalidClusterCount {
            k: config.k,
            observations: n,
        });
    }
    if config.restarts == 0 {
        return Err(Error::InvalidRestarts);
    }
    if config.max_iterations == 0 {
        return Err(Error::invalid_input("max_iterations must be positive"));
    }
    Ok(())
}

/// Lowest WCSS wins; the earliest run wins ties.
fn best_run(runs: Vec<PartitionResult>) -> Option<PartitionResult> {
    runs.into_iter().fold(None, |best, run| match best {
        Some(b) if b.total_within_ss <= run.total_within_ss => Some(b),
        _ => Some(run),
    })
}

/// One k-means run from centroids sampled without replacement from the data.
fn lloyd<R: Rng + ?Sized>(
    data: &ObservationMatrix,
    k: usize,
    max_iterations: usize,
    rng: &mut R,
) -> PartitionResult {
    let n = data.n_observations();
    let mut centroids = Array2::zeros((k, data.n_features()));
    for (j, i) in index::sample(rng, n, k).into_iter().enumerate() {
        centroids.row_mut(j).assign(&data.row(i));
    }

    // usize::MAX marks "not yet assigned" so the first pass always changes.
    let mut assignments = vec![usize::MAX; n];
    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        iterations += 1;
        if !assign_step(data, &centroids, &mut assignments) {
            converged = true;
            break;
        }
        update_step(data, &mut centroids, &mut assignments);
    }

    let total_within_ss = within_ss(data, &centroids, &assignments);
    PartitionResult {
        assignments,
        centroids,
        total_within_ss,
        iterations,
        converged,
    }
}

/// Moves every observation to its nearest centroid. Returns whether any
/// assignment changed.
fn assign_step(data: &ObservationMatrix, centroids: &Array2<f64>, assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (i, slot) in assignments.iter_mut().enumerate() {
        let nearest = nearest_centroid(data.row(i), centroids);
        if nearest != *slot {
            *slot = nearest;
            changed = true;
        }
    }
    changed
}

/// Index of the closest centroid; the lowest index wins ties.
fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best_cluster = 0;
    let mut best_dist = f64::INFINITY;
    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_cluster = j;
        }
    }
    best_cluster
}

/// Recomputes centroids as cluster means, reseeding any empty cluster.
fn update_step(data: &ObservationMatrix, centroids: &mut Array2<f64>, assignments: &mut [usize]) {
    let mut counts = recompute_means(data, centroids, assignments);
    if reseed_empty_clusters(data, centroids, assignments, &mut counts) {
        recompute_means(data, centroids, assignments);
    }
}

/// Replaces each non-empty cluster's centroid with its mean and returns the
/// cluster sizes. Empty clusters keep their old centroid.
fn recompute_means(data: &ObservationMatrix, centroids: &mut Array2<f64>, assignments: &[usize]) -> Vec<usize> {
    let (k, dim) = centroids.dim();
    let mut sums = Array2::<f64>::zeros((k, dim));
    let mut counts = vec![0_usize; k];
    for (i, &c) in assignments.iter().enumerate() {
        counts[c] += 1;
        let mut sum = sums.row_mut(c);
        sum += &data.row(i);
    }
    for (j, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = sums.row(j).mapv(|s| s / count as f64);
            centroids.row_mut(j).assign(&mean);
        }
    }
    counts
}

/// Gives every empty cluster the observation farthest from its own centroid.
///
/// Empty clusters are handled in ascending id order. Only observations whose
/// cluster has more than one member are eligible, so no cluster is emptied in
/// the process; the lowest observation index wins ties. Returns whether any
/// cluster was reseeded.
fn reseed_empty_clusters(
    data: &ObservationMatrix,
    centroids: &mut Array2<f64>,
    assignments: &mut [usize],
    counts: &mut [usize],
) -> bool {
    let mut reseeded = false;
    for j in 0..counts.len() {
        if counts[j] > 0 {
            continue;
        }
        let farthest = assignments
            .iter()
            .enumerate()
            .filter(|(_, &c)| counts[c] > 1)
            .map(|(i, &c)| (i, squared_euclidean(data.row(i), centroids.row(c))))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((i, d)),
            });
        let Some((i, _)) = farthest else {
            continue;
        };
        log::trace!("reseeding empty cluster {j} with observation {i}");
        counts[assignments[i]] -= 1;
        assignments[i] = j;
        counts[j] = 1;
        centroids.row_mut(j).assign(&data.row(i));
        reseeded = true;
    }
    reseeded
}

fn within_ss(data: &ObservationMatrix, centroids: &Array2<f64>, assignments: &[usize]) -> f64 {
    assignments
        .iter()
        .enumerate()
        .map(|(i, &c)| squared_euclidean(data.row(i), centroids.row(c)))
        .sum()
}

//! Classical clustering for expression matrices.
//!
//! - [`distance`]: pairwise dissimilarity matrices
//! - [`hierarchical`]: agglomerative merge trees (dendrograms)
//! - [`k_means`]: seeded, multi-restart Lloyd's algorithm
//! - [`scoring`]: information criteria over k-means fits
//! - [`selection`]: choosing K among candidates by criterion
//! - [`silhouette`]: silhouette widths for a labelling
//! - [`synthetic`]: seeded Gaussian blobs
pub mod distance;
pub mod hierarchical;
pub mod k_means;
pub mod matrix;
pub mod scoring;
pub mod selection;
pub mod silhouette;
pub mod synthetic;

// Re-export public types and functions
pub use distance::{compute_distances, DistanceMatrix, Metric};
pub use hierarchical::{build_dendrogram, Dendrogram, Linkage, Merge, Node};
pub use k_means::{kmeans, kmeans_with_rng, KMeansConfig, PartitionResult};
pub use matrix::ObservationMatrix;
pub use scoring::{aic, Aic, Bic, Criterion};
pub use selection::{
    select_best_partition, select_best_partition_with, CandidateSummary, ConvergenceWarning,
    FinalAssignment, ScoredCandidate, SelectionConfig, SelectionReport,
};
pub use silhouette::{silhouette, Silhouette};
pub use synthetic::gaussian_blobs;

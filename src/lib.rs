//! Cluster-count selection for gene-expression matrices.
//!
//! Observations (patients) are rows of an [`ObservationMatrix`]. The crate
//! computes pairwise distances and an agglomerative dendrogram for
//! inspection, fits seeded k-means for a list of candidate cluster counts,
//! and keeps the fit with the lowest AIC-style score.
//!
//! ```
//! use exprclust::{select_best_partition, ObservationMatrix, SelectionConfig};
//!
//! let data = ObservationMatrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.2],
//!     vec![0.2, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 9.9],
//!     vec![9.9, 10.2],
//! ])
//! .unwrap();
//!
//! let chosen = select_best_partition(&data, &SelectionConfig::new(vec![2, 3])).unwrap();
//! assert_eq!(chosen.k(), 2);
//! ```
pub mod error;
pub mod ml;

pub use error::{Error, Result};
pub use ml::classic::*;

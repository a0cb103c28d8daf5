//! Information-criterion scores for comparing k-means fits with different K.
//!
//! A score adds a complexity penalty to the fit error so that larger K is only
//! preferred when it buys a real reduction in within-cluster variance.
//! Lower is better.

use crate::ml::classic::k_means::PartitionResult;

/// Scores a partition; lower is better.
pub trait Criterion: Sync {
    fn score(&self, result: &PartitionResult) -> f64;

    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;
}

/// `total_within_ss + 2 * m * k`, where `m` is the number of features and
/// `k` the number of clusters (`m * k` free centroid parameters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aic;

impl Criterion for Aic {
    fn score(&self, result: &PartitionResult) -> f64 {
        aic(result.total_within_ss(), result.n_features(), result.k())
    }

    fn name(&self) -> &'static str {
        "AIC"
    }
}

/// `total_within_ss + ln(n) * m * k`, with `n` the number of observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bic;

impl Criterion for Bic {
    fn score(&self, result: &PartitionResult) -> f64 {
        let n = result.n_observations() as f64;
        result.total_within_ss() + n.ln() * (result.n_features() * result.k()) as f64
    }

    fn name(&self) -> &'static str {
        "BIC"
    }
}

/// AIC-style score from its parts.
pub fn aic(total_within_ss: f64, n_features: usize, k: usize) -> f64 {
    total_within_ss + 2.0 * (n_features * k) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    #[test]
    fn test_aic_formula() {
        assert_eq!(aic(10.0, 4, 2), 26.0);
        assert_eq!(aic(0.0, 1, 1), 2.0);
    }

    #[test]
    fn test_aic_from_result() {
        let result = PartitionResult::new(vec![0, 0, 1, 1], Array2::zeros((2, 4)), 10.0).unwrap();
        assert_eq!(Aic.score(&result), 26.0);
        assert_eq!(Aic.name(), "AIC");
    }

    #[test]
    fn test_bic_from_result() {
        let result = PartitionResult::new(vec![0, 0, 1, 1], Array2::zeros((2, 4)), 10.0).unwrap();
        assert_relative_eq!(Bic.score(&result), 10.0 + 4.0_f64.ln() * 8.0);
    }

    #[test]
    fn test_penalty_grows_with_k() {
        let two = PartitionResult::new(vec![0, 1, 1], Array2::zeros((2, 3)), 5.0).unwrap();
        let three = PartitionResult::new(vec![0, 1, 2], Array2::zeros((3, 3)), 5.0).unwrap();
        assert!(Aic.score(&two) < Aic.score(&three));
    }
}

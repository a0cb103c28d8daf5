//! Choosing the number of clusters by information criterion.
//!
//! Every candidate K is fitted with [`kmeans`], scored with a [`Criterion`]
//! and the lowest score wins. All candidate scores are kept in a
//! [`SelectionReport`] so that discarded fits remain auditable.

use std::fmt;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::ml::classic::k_means::{kmeans, KMeansConfig, PartitionResult};
use crate::ml::classic::matrix::ObservationMatrix;
use crate::ml::classic::scoring::{Aic, Criterion};

/// Configuration for [`select_best_partition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Cluster counts to try, in order. Earlier candidates win exact ties.
    pub candidates: Vec<usize>,
    /// k-means restarts per candidate.
    pub restarts: usize,
    /// Iteration cap for every k-means run.
    pub max_iterations: usize,
    /// Seed shared by every candidate's restarts.
    pub seed: u64,
}

impl SelectionConfig {
    /// Create a new config with default values for restarts (25),
    /// max_iterations (300) and seed (0).
    pub fn new(candidates: Vec<usize>) -> Self {
        Self {
            candidates,
            restarts: 25,
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

    fn kmeans_config(&self, k: usize) -> KMeansConfig {
        KMeansConfig::new(k)
            .with_restarts(self.restarts)
            .with_max_iterations(self.max_iterations)
            .with_seed(self.seed)
    }
}

/// A candidate fit stopped at the iteration cap. The fit is still scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceWarning {
    pub k: usize,
    pub iterations: usize,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "k-means with k={} did not converge within {} iterations",
            self.k, self.iterations
        )
    }
}

/// A fitted candidate and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub k: usize,
    pub result: PartitionResult,
    pub score: f64,
    pub warning: Option<ConvergenceWarning>,
}

/// The part of a candidate kept after selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSummary {
    pub k: usize,
    pub score: f64,
    pub total_within_ss: f64,
    pub warning: Option<ConvergenceWarning>,
}

impl From<&ScoredCandidate> for CandidateSummary {
    fn from(candidate: &ScoredCandidate) -> Self {
        Self {
            k: candidate.k,
            score: candidate.score,
            total_within_ss: candidate.result.total_within_ss(),
            warning: candidate.warning,
        }
    }
}

/// Scores of every candidate, in the order they were requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    criterion: &'static str,
    candidates: Vec<CandidateSummary>,
    selected: usize,
}

impl SelectionReport {
    pub fn criterion(&self) -> &'static str {
        self.criterion
    }

    pub fn candidates(&self) -> &[CandidateSummary] {
        &self.candidates
    }

    /// Position of the winner in [`Self::candidates`].
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &CandidateSummary {
        &self.candidates[self.selected]
    }

    /// `(k, score)` for every candidate.
    pub fn scores(&self) -> Vec<(usize, f64)> {
        self.candidates.iter().map(|c| (c.k, c.score)).collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConvergenceWarning> {
        self.candidates.iter().filter_map(|c| c.warning.as_ref())
    }
}

/// The winning partition, ready to be joined onto per-observation records.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalAssignment {
    k: usize,
    score: f64,
    result: PartitionResult,
    report: SelectionReport,
    row_labels: Option<Vec<String>>,
}

impl FinalAssignment {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn result(&self) -> &PartitionResult {
        &self.result
    }

    pub fn report(&self) -> &SelectionReport {
        &self.report
    }

    /// Cluster id per observation.
    pub fn labels(&self) -> &[usize] {
        self.result.assignments()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        self.result.cluster_sizes()
    }

    /// `(row label, cluster id)` pairs, if the matrix carried row labels.
    pub fn labelled(&self) -> Option<Vec<(&str, usize)>> {
        self.row_labels.as_ref().map(|labels| {
            labels
                .iter()
                .map(String::as_str)
                .zip(self.labels().iter().copied())
                .collect()
        })
    }
}

/// Fits every candidate K and returns the partition with the lowest AIC-style
/// score (see [`Aic`]).
///
/// # Errors
///
/// - [`Error::EmptyCandidates`] if no candidate is given.
/// - Any error from [`kmeans`] for the first invalid candidate; no partial
///   result is returned.
pub fn select_best_partition(
    data: &ObservationMatrix,
    config: &SelectionConfig,
) -> Result<FinalAssignment> {
    select_best_partition_with(data, config, &Aic)
}

/// [`select_best_partition`] with a caller-chosen criterion.
pub fn select_best_partition_with<C: Criterion + ?Sized>(
    data: &ObservationMatrix,
    config: &SelectionConfig,
    criterion: &C,
) -> Result<FinalAssignment> {
    if config.candidates.is_empty() {
        return Err(Error::EmptyCandidates);
    }
    // Reject bad candidates in order before any fit starts.
    let n = data.n_observations();
    if let Some(&k) = config.candidates.iter().find(|&&k| k == 0 || k >= n) {
        return Err(Error::InvalidClusterCount { k, observations: n });
    }

    let scored = config
        .candidates
        .par_iter()
        .map(|&k| score_candidate(data, config, k, criterion))
        .collect::<Result<Vec<_>>>()?;

    for candidate in &scored {
        log::info!(
            "{} k={} score={:.4} wcss={:.4}",
            criterion.name(),
            candidate.k,
            candidate.score,
            candidate.result.total_within_ss()
        );
        if let Some(warning) = &candidate.warning {
            log::warn!("{warning}");
        }
    }

    let selected = scored
        .iter()
        .enumerate()
        .fold(0, |best, (i, c)| if c.score < scored[best].score { i } else { best });
    let report = SelectionReport {
        criterion: criterion.name(),
        candidates: scored.iter().map(CandidateSummary::from).collect(),
        selected,
    };

    let winner = scored
        .into_iter()
        .nth(selected)
        .ok_or_else(|| Error::invalid_input("selected candidate is missing"))?;
    log::info!(
        "selected k={} with {} score {:.4}",
        winner.k,
        criterion.name(),
        winner.score
    );

    Ok(FinalAssignment {
        k: winner.k,
        score: winner.score,
        result: winner.result,
        report,
        row_labels: data.labels().map(<[String]>::to_vec),
    })
}

fn score_candidate<C: Criterion + ?Sized>(
    data: &ObservationMatrix,
    config: &SelectionConfig,
    k: usize,
    criterion: &C,
) -> Result<ScoredCandidate> {
    let result = kmeans(data, &config.kmeans_config(k))?;
    let warning = (!result.converged()).then(|| ConvergenceWarning {
        k,
        iterations: result.iterations(),
    });
    Ok(ScoredCandidate {
        k,
        score: criterion.score(&result),
        result,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classic::scoring::{aic, Bic};
    use crate::ml::classic::synthetic::gaussian_blobs;

    fn two_blobs() -> ObservationMatrix {
        ObservationMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![0.2, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
            vec![9.9, 10.2],
        ])
        .unwrap()
    }

    #[test]
    fn test_two_blobs_select_k2() {
        let data = two_blobs();
        let config = SelectionConfig::new(vec![2, 3]).with_seed(1);
        let chosen = select_best_partition(&data, &config).unwrap();

        assert_eq!(chosen.k(), 2);
        let labels = chosen.labels();
        assert!(labels[..3].iter().all(|&l| l == labels[0]));
        assert!(labels[3..].iter().all(|&l| l == labels[3]));
        assert_ne!(labels[0], labels[3]);
        assert_eq!(chosen.cluster_sizes(), vec![3, 3]);

        let scores = chosen.report().scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0, 2);
        assert_eq!(scores[1].0, 3);
        assert!(scores[0].1 < scores[1].1);
        assert_eq!(chosen.score(), scores[0].1);
        assert_eq!(
            chosen.score(),
            aic(chosen.result().total_within_ss(), 2, 2)
        );
    }

    #[test]
    fn test_empty_candidates() {
        let config = SelectionConfig::new(vec![]);
        assert_eq!(
            select_best_partition(&two_blobs(), &config).unwrap_err(),
            Error::EmptyCandidates
        );
    }

    #[test]
    fn test_invalid_candidate_fails_whole_selection() {
        let config = SelectionConfig::new(vec![2, 6, 0]);
        assert_eq!(
            select_best_partition(&two_blobs(), &config).unwrap_err(),
            Error::InvalidClusterCount {
                k: 6,
                observations: 6
            }
        );
    }

    #[test]
    fn test_invalid_restarts_propagate() {
        let config = SelectionConfig::new(vec![2]).with_restarts(0);
        assert_eq!(
            select_best_partition(&two_blobs(), &config).unwrap_err(),
            Error::InvalidRestarts
        );
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let config = SelectionConfig::new(vec![2, 2]).with_seed(4);
        let chosen = select_best_partition(&two_blobs(), &config).unwrap();
        let report = chosen.report();
        assert_eq!(report.candidates()[0], report.candidates()[1]);
        assert_eq!(report.selected_index(), 0);
    }

    #[test]
    fn test_report_keeps_every_candidate() {
        let data = gaussian_blobs(
            &[
                vec![0.0, 0.0, 0.0],
                vec![6.0, 6.0, 0.0],
                vec![0.0, 6.0, 6.0],
            ],
            12,
            0.5,
            3,
        )
        .unwrap();
        let config = SelectionConfig::new(vec![2, 4, 7]).with_restarts(10).with_seed(2);
        let chosen = select_best_partition(&data, &config).unwrap();
        let report = chosen.report();

        assert_eq!(report.criterion(), "AIC");
        let ks: Vec<usize> = report.candidates().iter().map(|c| c.k).collect();
        assert_eq!(ks, vec![2, 4, 7]);
        let best = report
            .candidates()
            .iter()
            .map(|c| c.score)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(report.selected().score, best);
        assert_eq!(report.selected().k, chosen.k());
        for c in report.candidates() {
            assert_eq!(c.score, aic(c.total_within_ss, 3, c.k));
        }
    }

    #[test]
    fn test_selection_is_reproducible() {
        let data = gaussian_blobs(&[vec![0.0, 0.0], vec![3.0, 3.0]], 15, 1.0, 8).unwrap();
        let config = SelectionConfig::new(vec![2, 3, 4]).with_seed(17);
        let a = select_best_partition(&data, &config).unwrap();
        let b = select_best_partition(&data, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_convergence_warning_does_not_abort() {
        let config = SelectionConfig::new(vec![2, 3]).with_max_iterations(1);
        let chosen = select_best_partition(&two_blobs(), &config).unwrap();
        let warnings: Vec<&ConvergenceWarning> = chosen.report().warnings().collect();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].k, 2);
        assert_eq!(warnings[0].iterations, 1);
        assert!(warnings[0].to_string().contains("did not converge"));
    }

    #[test]
    fn test_labelled_assignment() {
        let data = two_blobs()
            .with_labels(vec!["p1", "p2", "p3", "p4", "p5", "p6"])
            .unwrap();
        let chosen = select_best_partition(&data, &SelectionConfig::new(vec![2])).unwrap();
        let labelled = chosen.labelled().unwrap();
        assert_eq!(labelled.len(), 6);
        assert_eq!(labelled[0].0, "p1");
        assert_eq!(labelled[0].1, labelled[2].1);
        assert_ne!(labelled[0].1, labelled[5].1);

        let unlabelled = select_best_partition(&two_blobs(), &SelectionConfig::new(vec![2])).unwrap();
        assert!(unlabelled.labelled().is_none());
    }

    #[test]
    fn test_custom_criterion() {
        let chosen =
            select_best_partition_with(&two_blobs(), &SelectionConfig::new(vec![2, 3]), &Bic)
                .unwrap();
        assert_eq!(chosen.report().criterion(), "BIC");
        assert_eq!(chosen.k(), 2);
    }
}

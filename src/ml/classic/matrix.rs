//! Observation matrix shared by every clustering routine.
//!
//! Rows are observations (patients), columns are features (genes). Expression
//! tables usually arrive gene-major, so [`ObservationMatrix::from_columns`]
//! accepts one vector per gene and transposes it.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{Error, Result};

/// An immutable `n × m` matrix of finite values with optional row identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationMatrix {
    values: Array2<f64>,
    labels: Option<Vec<String>>,
}

impl ObservationMatrix {
    /// Wraps an existing array. Fails if it is empty or holds NaN/infinite values.
    pub fn new(values: Array2<f64>) -> Result<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(Error::EmptyMatrix);
        }
        if let Some(((row, column), _)) = values.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFinite { row, column });
        }
        Ok(Self {
            values: values.as_standard_layout().into_owned(),
            labels: None,
        })
    }

    /// Builds a matrix from one vector per observation.
    ///
    /// Every row must have the length of the first one.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let dims = check_lengths(rows)?;
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), dims), flat)
            .map_err(|e| Error::invalid_input(e.to_string()))?;
        Self::new(values)
    }

    /// Builds a matrix from one vector per feature, so that `columns[j][i]`
    /// becomes observation `i`, feature `j`.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let n = check_lengths(columns)?;
        let flat: Vec<f64> = columns.iter().flatten().copied().collect();
        let by_feature = Array2::from_shape_vec((columns.len(), n), flat)
            .map_err(|e| Error::invalid_input(e.to_string()))?;
        Self::new(by_feature.reversed_axes())
    }

    /// Attaches one unique identifier per observation.
    pub fn with_labels<S: Into<String>>(mut self, labels: Vec<S>) -> Result<Self> {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.n_observations() {
            return Err(Error::InvalidLabels(format!(
                "expected {} labels, found {}",
                self.n_observations(),
                labels.len()
            )));
        }
        let mut seen = HashSet::with_capacity(labels.len());
        if let Some(dup) = labels.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(Error::InvalidLabels(format!("duplicate label {dup:?}")));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn n_observations(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }
}

fn check_lengths(vectors: &[Vec<f64>]) -> Result<usize> {
    let expected = vectors.first().map(Vec::len).ok_or(Error::EmptyMatrix)?;
    for (row, v) in vectors.iter().enumerate() {
        if v.len() != expected {
            return Err(Error::DimensionMismatch {
                row,
                expected,
                found: v.len(),
            });
        }
    }
    Ok(expected)
}

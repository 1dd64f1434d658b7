//! Value/uncertainty pairs.

use serde::{Deserialize, Serialize};

use crate::errors::{BnmrError, ErrorInfo};

/// A series of values with their propagated one-sigma uncertainties.
///
/// Both vectors always have the same length and errors are non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measured {
    value: Vec<f64>,
    error: Vec<f64>,
}

impl Measured {
    /// Pairs values with errors.
    ///
    /// # Panics
    ///
    /// Panics when the two vectors differ in length.
    pub fn new(value: Vec<f64>, error: Vec<f64>) -> Self {
        assert_eq!(
            value.len(),
            error.len(),
            "value and error series must have equal length"
        );
        Self { value, error }
    }

    /// Fallible variant of [`Measured::new`] for caller-supplied data.
    pub fn try_new(value: Vec<f64>, error: Vec<f64>) -> Result<Self, BnmrError> {
        if value.len() != error.len() {
            return Err(BnmrError::InvalidInput(
                ErrorInfo::new("measured-shape", "value and error series differ in length")
                    .with_context("values", value.len().to_string())
                    .with_context("errors", error.len().to_string()),
            ));
        }
        Ok(Self { value, error })
    }

    /// Series of zeros with zero error.
    pub fn zeros(len: usize) -> Self {
        Self {
            value: vec![0.0; len],
            error: vec![0.0; len],
        }
    }

    /// Central values.
    pub fn value(&self) -> &[f64] {
        &self.value
    }

    /// One-sigma uncertainties.
    pub fn error(&self) -> &[f64] {
        &self.error
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// True when the series holds no points.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Iterates over `(value, error)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.value.iter().copied().zip(self.error.iter().copied())
    }

    /// Splits into the value and error vectors.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.value, self.error)
    }
}

impl FromIterator<(f64, f64)> for Measured {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        let (value, error) = iter.into_iter().unzip();
        Self { value, error }
    }
}

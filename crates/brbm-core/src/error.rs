//! Error type shared by every brbm crate.

use std::path::PathBuf;

/// Errors raised by model construction, sampling, training and metric rendering.
#[derive(Debug, thiserror::Error)]
pub enum BrbmError {
    /// A tensor did not have the shape an operation requires.
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    /// An argument was outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A metric value could not be stored or rendered.
    #[error("unsupported metric value for '{key}': {reason}")]
    UnsupportedMetric { key: String, reason: String },
    /// A render request named a metric that was never recorded at that step.
    #[error("no metric '{key}' recorded at step {step}")]
    MissingMetric { step: usize, key: String },
    /// Reading tensor data back to the host failed.
    #[error("tensor data error: {0}")]
    TensorData(String),
    /// Configuration could not be parsed or failed validation.
    #[error("configuration error: {0}")]
    Config(String),
    /// A data file was malformed.
    #[error("malformed data file {path}: {reason}")]
    Data { path: PathBuf, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BrbmError>;

/// Fail with [`BrbmError::ShapeMismatch`] unless `actual == expected`.
pub fn ensure_shape(what: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(BrbmError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}

/// Fail unless a `[rows, cols]` batch has exactly `width` columns.
///
/// Batches may hold any number of rows; only the feature width is fixed.
pub fn ensure_width(what: &'static str, width: usize, dims: [usize; 2]) -> Result<()> {
    if dims[1] == width {
        Ok(())
    } else {
        Err(BrbmError::ShapeMismatch {
            what,
            expected: vec![dims[0], width],
            actual: dims.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_width() {
        assert!(ensure_width("ambient", 4, [10, 4]).is_ok());

        let err = ensure_width("ambient", 4, [10, 3]).unwrap_err();
        match err {
            BrbmError::ShapeMismatch {
                what,
                expected,
                actual,
            } => {
                assert_eq!(what, "ambient");
                assert_eq!(expected, vec![10, 4]);
                assert_eq!(actual, vec![10, 3]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = BrbmError::MissingMetric {
            step: 20,
            key: "kernel".into(),
        };
        assert_eq!(err.to_string(), "no metric 'kernel' recorded at step 20");
    }
}

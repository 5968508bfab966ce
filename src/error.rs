//! Error types for the decurtain crate.

use crate::dtype::DType;

/// Error type for all fallible operations in the decurtain crate.
///
/// Every error is terminal for the current invocation: no retry happens
/// internally and no partial output is returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecurtainError {
    /// Returned when a processing parameter fails validation, before any
    /// pixel is touched.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Returned when no normalization range is defined for a sample type.
    #[error("unsupported dtype {0} for range normalization")]
    UnsupportedDtype(DType),

    /// Returned when processing one slice of a stack fails. Aborts the
    /// whole stack operation; sibling tasks are not cancelled but their
    /// results are discarded.
    #[error("slice {slice} failed: {source}")]
    TaskFailure {
        /// Index of the failing slice along the depth axis.
        slice: usize,
        /// The per-slice error.
        source: Box<DecurtainError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_invalid_parameter() {
        let err = DecurtainError::InvalidParameter("sigma must be finite and positive, got 0".into());
        assert_eq!(
            err.to_string(),
            "invalid parameter: sigma must be finite and positive, got 0"
        );
    }

    #[test]
    fn error_unsupported_dtype() {
        let err = DecurtainError::UnsupportedDtype(DType::F16);
        assert_eq!(
            err.to_string(),
            "unsupported dtype float16 for range normalization"
        );
    }

    #[test]
    fn error_task_failure_wraps_source() {
        let inner = DecurtainError::InvalidParameter("decomposition levels must be at least 1".into());
        let err = DecurtainError::TaskFailure {
            slice: 3,
            source: Box::new(inner),
        };
        assert_eq!(
            err.to_string(),
            "slice 3 failed: invalid parameter: decomposition levels must be at least 1"
        );
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<DecurtainError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<DecurtainError>();
    }
}

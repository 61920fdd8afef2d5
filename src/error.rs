use thiserror::Error;

/// Errors raised by the consensus meta-program pipeline.
///
/// All preconditions are checked eagerly at the stage boundary where they
/// apply; nothing is retried internally.
#[derive(Error, Debug)]
pub enum MetaNmfError {
    /// Malformed factor matrix or configuration (negative loadings,
    /// zero-column matrix, out-of-range parameter).
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The requested clustering cannot be produced: more clusters than
    /// programs, or a similarity matrix with no structure at all.
    #[error("degenerate clustering: {reason}")]
    DegenerateClustering { reason: String },

    /// A cluster's consensus signature is empty after confidence
    /// filtering. Not fatal at the pipeline level: the cluster is dropped
    /// and recorded, reducing the realized meta-program count.
    #[error("empty consensus signature for cluster {cluster}")]
    EmptySignature { cluster: usize },
}

impl MetaNmfError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateClustering {
            reason: reason.into(),
        }
    }
}

/// Result type alias for meta-program operations.
pub type Result<T> = std::result::Result<T, MetaNmfError>;

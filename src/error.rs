use core::fmt;

/// Result alias for `atlas`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while building and reshaping organizations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A dataset id or its embedding is missing from the store.
    NotFound {
        /// The dataset id that was looked up.
        dataset_id: String,
    },

    /// Embedding dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// The vector index reported an error.
    IndexFailure(String),

    /// None of the input words have an embedding.
    NoEmbedding,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound { dataset_id } => {
                write!(f, "dataset '{dataset_id}' not found")
            }
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::IndexFailure(msg) => write!(f, "index failure: {msg}"),
            Error::NoEmbedding => write!(f, "no embeddings found for input words"),
        }
    }
}

impl std::error::Error for Error {}

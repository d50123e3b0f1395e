use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Model artifact unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model artifact truncated at byte {0}")]
    Truncated(usize),

    #[error("Unrecognized model magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("Unsupported model format version {0}")]
    UnsupportedVersion(u16),

    #[error("Malformed model artifact: {0}")]
    Malformed(String),
}

/// Fetch failures double as the user-visible text shown in place of the
/// visitor count, so the Display output is the exact on-screen string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Error: HTTP {0}")]
    Http(u16),

    #[error("Error: Empty response body")]
    EmptyBody,

    #[error("Error: {0}")]
    Request(String),
}

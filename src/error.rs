//! Error taxonomy shared by loading, geometry and detection.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input is neither a known raster format nor a paged document.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A page (or the whole single-page image) could not be decoded.
    #[error("corrupt document (page {page}): {reason}")]
    CorruptDocument { page: usize, reason: String },

    /// Decoding the page would exceed the configured memory ceiling.
    #[error("page {page} needs {required} bytes, ceiling is {ceiling}")]
    ResourceExhausted { page: usize, required: u64, ceiling: u64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A rectangle has no usable area after clamping to the raster.
    #[error("degenerate region: {0}")]
    DegenerateRegion(String),

    #[error("section name already exists: {0}")]
    DuplicateName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        Error::DegenerateRegion(msg.into())
    }

    pub(crate) fn corrupt(page: usize, reason: impl std::fmt::Display) -> Self {
        Error::CorruptDocument {
            page,
            reason: reason.to_string(),
        }
    }
}

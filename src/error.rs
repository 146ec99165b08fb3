//! Error types for the thermal-overlay-removal crate.

/// Errors that can occur while cleaning snapshots or driving a batch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A collaborator (snapshot store, temperature reader, confirmation
    /// source, or reading log) reported a failure.
    #[error("collaborator error: {0}")]
    Collaborator(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

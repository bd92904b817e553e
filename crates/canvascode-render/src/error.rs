//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while compositing or ingesting images.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The requested id set resolved to nothing paintable.
    #[error("nothing to composite")]
    EmptySelection,

    /// The SVG intermediate could not be parsed back.
    #[error("SVG rasterization failed: {0}")]
    Svg(String),

    /// Pixmap allocation or PNG encoding failed.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// The byte payload is not a recognized image format.
    #[error("unrecognized image format")]
    UnknownFormat,

    /// The payload matched a known format but did not decode.
    #[error("image decoding failed: {0}")]
    Decode(String),
}

//! CanvasCode Render Library
//!
//! Headless compositor and image ingestion for the CanvasCode editor:
//! rasterizes object subsets to PNG through an SVG intermediate, and turns
//! pasted or dropped image bytes into canvas-ready data URIs.

pub mod compositor;
pub mod error;
pub mod ingest;

pub use compositor::{COMPOSITE_PADDING, CompositeConfig, compose, compose_svg};
pub use error::{RenderError, RenderResult};
pub use ingest::{ImageFormat, MAX_INGEST_WIDTH, ingest_image};

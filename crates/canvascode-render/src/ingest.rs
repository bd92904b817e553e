//! Image ingestion: bytes from the clipboard or a file drop become a
//! data-URI-backed [`PastedImage`] at a canvas-friendly size.

use crate::error::{RenderError, RenderResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use canvascode_core::PastedImage;
use image::GenericImageView;

/// Widest an image lands on the canvas at ingestion time; larger bitmaps are
/// scaled down proportionally.
pub const MAX_INGEST_WIDTH: f64 = 400.0;

/// Image format detected from a byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    fn decoder(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
            ImageFormat::Gif => image::ImageFormat::Gif,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        // GIF: GIF87a / GIF89a
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }

        None
    }
}

/// Decode an image payload and prepare it for canvas placement: intrinsic
/// size read from the bitmap, width fitted to [`MAX_INGEST_WIDTH`], bytes
/// wrapped as a base64 data URI.
pub fn ingest_image(data: &[u8]) -> RenderResult<PastedImage> {
    let format = ImageFormat::from_magic_bytes(data).ok_or(RenderError::UnknownFormat)?;
    let decoded = image::load_from_memory_with_format(data, format.decoder())
        .map_err(|e| RenderError::Decode(e.to_string()))?;
    let (px_w, px_h) = decoded.dimensions();
    if px_w == 0 || px_h == 0 {
        return Err(RenderError::Decode("zero-sized image".to_string()));
    }

    let (width, height) = fit_width(px_w as f64, px_h as f64, MAX_INGEST_WIDTH);
    log::debug!(
        "ingested {} image, {px_w}x{px_h} px -> {width}x{height} canvas units",
        format.mime_type()
    );
    Ok(PastedImage {
        src: format!(
            "data:{};base64,{}",
            format.mime_type(),
            BASE64.encode(data)
        ),
        width,
        height,
    })
}

/// Scale `(w, h)` down proportionally so the width does not exceed
/// `max_width`. Smaller images keep their intrinsic size.
pub fn fit_width(w: f64, h: f64, max_width: f64) -> (f64, f64) {
    if w <= max_width {
        return (w, h);
    }
    let ratio = max_width / w;
    (max_width, h * ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(color: [u8; 4], w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(color));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&png_bytes([255, 0, 0, 255], 1, 1)),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(b"GIF89a----"),
            Some(ImageFormat::Gif)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"not an image"), None);
    }

    #[test]
    fn test_ingest_small_image_keeps_size() {
        let pasted = ingest_image(&png_bytes([255, 0, 0, 255], 3, 2)).unwrap();
        assert!((pasted.width - 3.0).abs() < f64::EPSILON);
        assert!((pasted.height - 2.0).abs() < f64::EPSILON);
        assert!(pasted.src.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_ingest_wide_image_fits_to_max_width() {
        let pasted = ingest_image(&png_bytes([0, 0, 255, 255], 800, 200)).unwrap();
        assert!((pasted.width - MAX_INGEST_WIDTH).abs() < f64::EPSILON);
        assert!((pasted.height - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_payload_rejected() {
        assert!(matches!(
            ingest_image(b"plain text"),
            Err(RenderError::UnknownFormat)
        ));
    }

    #[test]
    fn test_truncated_png_fails_decode() {
        let png = png_bytes([255, 0, 0, 255], 4, 4);
        assert!(matches!(
            ingest_image(&png[..20]),
            Err(RenderError::Decode(_))
        ));
    }

    #[test]
    fn test_fit_width_proportional() {
        let (w, h) = fit_width(1000.0, 500.0, MAX_INGEST_WIDTH);
        assert!((w - 400.0).abs() < f64::EPSILON);
        assert!((h - 200.0).abs() < f64::EPSILON);

        let (w, h) = fit_width(300.0, 900.0, MAX_INGEST_WIDTH);
        assert!((w - 300.0).abs() < f64::EPSILON);
        assert!((h - 900.0).abs() < f64::EPSILON);
    }
}

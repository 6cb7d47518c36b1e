use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use mupdf::{Colorspace, Document, Matrix};

use paperflow_core::{DEFAULT_JPEG_QUALITY, DEFAULT_PREVIEW_SCALE, Thumbnail, ThumbnailError, ThumbnailRenderer};

/// MuPDF-based implementation of [`ThumbnailRenderer`]. The mupdf
/// dependency (AGPL-3.0) lives only in this crate.
///
/// Page 1 is rasterized at `scale` (never below 2.0) into RGB and encoded
/// as JPEG at `quality`.
pub struct MupdfThumbnailer {
    scale: f32,
    quality: u8,
}

impl Default for MupdfThumbnailer {
    fn default() -> Self {
        Self {
            scale: DEFAULT_PREVIEW_SCALE,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl MupdfThumbnailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rasterization scale. Values below 2.0 are raised to 2.0.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() {
            scale.max(DEFAULT_PREVIEW_SCALE)
        } else {
            DEFAULT_PREVIEW_SCALE
        };
        self
    }

    /// Set the JPEG quality, clamped to 1..=100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl ThumbnailRenderer for MupdfThumbnailer {
    fn render_first_page(&self, data: &[u8]) -> Result<Thumbnail, ThumbnailError> {
        let document = Document::from_bytes(data, "application/pdf")
            .map_err(|e| ThumbnailError::OpenError(e.to_string()))?;

        let page_count = document
            .page_count()
            .map_err(|e| ThumbnailError::OpenError(e.to_string()))?;
        if page_count < 1 {
            return Err(ThumbnailError::NoPages);
        }

        let page = document
            .load_page(0)
            .map_err(|e| ThumbnailError::RenderError(e.to_string()))?;
        let matrix = Matrix::new_scale(self.scale, self.scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)
            .map_err(|e| ThumbnailError::RenderError(e.to_string()))?;

        let (width, height) = (pixmap.width(), pixmap.height());
        let jpeg = encode_jpeg(pixmap.samples(), width, height, self.quality)?;
        tracing::debug!(width, height, bytes = jpeg.len(), "rendered first-page preview");

        Ok(Thumbnail::from_jpeg(&jpeg, width, height))
    }
}

/// Encode a raw pixel buffer (RGB or RGBA rows, possibly padded) as JPEG.
/// Alpha is dropped.
pub fn encode_jpeg(
    samples: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, ThumbnailError> {
    if width == 0 || height == 0 {
        return Err(ThumbnailError::RenderError("empty page raster".into()));
    }
    let stride = samples.len() / height as usize;
    let channels = stride / width as usize;
    if !(3..=4).contains(&channels) {
        return Err(ThumbnailError::EncodeError(format!(
            "unsupported raster layout: {} bytes per row for width {}",
            stride, width
        )));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for row in samples.chunks_exact(stride) {
        for px in row[..width as usize * channels].chunks_exact(channels) {
            rgb.extend_from_slice(&px[..3]);
        }
    }
    let image = RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ThumbnailError::EncodeError("raster size mismatch".into()))?;

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode_image(&image)
        .map_err(|e| ThumbnailError::EncodeError(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_has_a_floor() {
        assert_eq!(MupdfThumbnailer::new().with_scale(1.0).scale(), 2.0);
        assert_eq!(MupdfThumbnailer::new().with_scale(3.0).scale(), 3.0);
        assert_eq!(MupdfThumbnailer::new().with_scale(f32::NAN).scale(), 2.0);
        assert_eq!(MupdfThumbnailer::new().with_quality(0).quality(), 1);
    }

    #[test]
    fn encodes_rgb_raster() {
        let samples = vec![200u8; 4 * 2 * 3];
        let jpeg = encode_jpeg(&samples, 4, 2, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn encodes_rgba_raster() {
        let samples = vec![10u8; 3 * 3 * 4];
        let jpeg = encode_jpeg(&samples, 3, 3, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn rejects_bad_layout() {
        assert!(matches!(
            encode_jpeg(&[0u8; 4], 2, 2, 80),
            Err(ThumbnailError::EncodeError(_))
        ));
        assert!(encode_jpeg(&[], 0, 0, 80).is_err());
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let result = MupdfThumbnailer::new().render_first_page(b"definitely not a pdf");
        assert!(result.is_err());
    }
}

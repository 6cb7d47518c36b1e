use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("failed to open document: {0}")]
    OpenError(String),
    #[error("document has no pages")]
    NoPages,
    #[error("failed to render page: {0}")]
    RenderError(String),
    #[error("failed to encode preview: {0}")]
    EncodeError(String),
    #[error("preview rendering unavailable")]
    Unavailable,
}

/// A rendered first-page preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// `data:image/jpeg;base64,...`
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl Thumbnail {
    pub fn from_jpeg(jpeg: &[u8], width: u32, height: u32) -> Self {
        Self {
            data_uri: jpeg_data_uri(jpeg),
            width,
            height,
        }
    }
}

/// Wrap encoded JPEG bytes in a data URI.
pub fn jpeg_data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

/// Trait for first-page preview backends.
///
/// Rendering is CPU-bound and synchronous; callers run it on the blocking
/// pool. Implementors return an error rather than a placeholder image.
pub trait ThumbnailRenderer: Send + Sync {
    /// Render page 1 of the document held in `data`.
    fn render_first_page(&self, data: &[u8]) -> Result<Thumbnail, ThumbnailError>;
}

/// Renderer used when previews are switched off. Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledThumbnails;

impl ThumbnailRenderer for DisabledThumbnails {
    fn render_first_page(&self, _data: &[u8]) -> Result<Thumbnail, ThumbnailError> {
        Err(ThumbnailError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_prefix() {
        let uri = jpeg_data_uri(&[0xFF, 0xD8, 0xFF]);
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn disabled_renderer_is_unavailable() {
        assert!(matches!(
            DisabledThumbnails.render_first_page(b"%PDF-1.7"),
            Err(ThumbnailError::Unavailable)
        ));
    }
}

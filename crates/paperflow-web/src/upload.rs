use axum::extract::Multipart;
use paperflow_core::{DocumentInput, DocumentSource, Language};

/// Parsed form fields from the multipart upload.
pub struct FormFields {
    /// Uploaded files, in the order the browser sent them. Parts that are
    /// not PDFs stay in place as rejected items so they fail on their own.
    pub files: Vec<DocumentSource>,
    pub language: Option<Language>,
}

/// Parse a multipart form upload. Every `pdf` field is one batch item.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<FormFields, String> {
    let mut files = Vec::new();
    let mut language = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdf" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("upload-{}.pdf", files.len() + 1));
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read file data: {}", e))?
                    .to_vec();

                files.push(upload_source(filename, data));
            }
            "lang" => {
                let val = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read lang: {}", e))?;
                if !val.trim().is_empty() {
                    language = Some(val.parse::<Language>()?);
                }
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    Ok(FormFields { files, language })
}

/// A batch item for one uploaded part: the document itself, or a rejected
/// item when the bytes are not a PDF.
pub fn upload_source(filename: String, data: Vec<u8>) -> DocumentSource {
    match check_pdf(&filename, &data) {
        Ok(()) => DocumentSource::from(DocumentInput::pdf(filename, data)),
        Err(reason) => {
            tracing::warn!(file = %filename, "upload rejected: not a PDF");
            DocumentSource::Rejected {
                file_name: filename,
                reason,
            }
        }
    }
}

/// Verify the PDF magic bytes.
pub fn check_pdf(filename: &str, data: &[u8]) -> Result<(), String> {
    if data.starts_with(b"%PDF-") {
        Ok(())
    } else {
        Err(format!("{} doesn't appear to be a valid PDF", filename))
    }
}

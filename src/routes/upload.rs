use actix_multipart::{Multipart, MultipartError};
use futures::StreamExt;

/// Uploads larger than this are rejected.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// One part of a multipart form.
#[derive(Debug, Default)]
pub struct FormPart {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FormPart {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).trim().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Failed to read upload: {0}")]
    Multipart(String),

    #[error("Upload exceeds {0} bytes")]
    TooLarge(usize),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err.to_string())
    }
}

/// Buffers every part of the form.
pub async fn read_form(mut payload: Multipart) -> Result<Vec<FormPart>, UploadError> {
    let mut parts = Vec::new();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let mut part = FormPart {
            name: field.name().unwrap_or_default().to_string(),
            content_type: field.content_type().map(|mime| mime.essence_str().to_string()),
            bytes: Vec::new(),
        };

        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            total += chunk.len();
            if total > MAX_UPLOAD_BYTES {
                return Err(UploadError::TooLarge(MAX_UPLOAD_BYTES));
            }
            part.bytes.extend_from_slice(&chunk);
        }
        parts.push(part);
    }

    Ok(parts)
}

pub fn find_part<'a>(parts: &'a [FormPart], name: &str) -> Option<&'a FormPart> {
    parts.iter().find(|part| part.name == name)
}

use actix_multipart::{Field, Multipart, MultipartError};
use futures::TryStreamExt;
use shared::{MAX_IMAGES, MAX_IMAGE_BYTES};

/// Text fields are buffered up to this many bytes; the rest is discarded.
pub const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Malformed multipart payload: {0}")]
    Multipart(#[from] MultipartError),
}

#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    /// Empty once the part is past the image count cap; truncated once past the size cap.
    pub data: Vec<u8>,
    /// Total number of bytes received for the part.
    pub size: usize,
}

impl UploadedFile {
    pub fn display_name(&self, index: usize) -> String {
        match self.file_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("file #{}", index + 1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawAnalysisInput {
    pub user_id: Option<String>,
    pub description: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Reads at most `limit` bytes of a field into memory and returns the full byte count.
async fn read_field(field: &mut Field, limit: usize, buffer: &mut Vec<u8>) -> Result<usize, UploadError> {
    let mut total = 0usize;
    while let Some(chunk) = field.try_next().await? {
        total += chunk.len();
        let room = limit.saturating_sub(buffer.len());
        if room > 0 {
            buffer.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
    }
    Ok(total)
}

async fn read_text(field: &mut Field) -> Result<String, UploadError> {
    let mut buffer = Vec::new();
    read_field(field, MAX_TEXT_FIELD_BYTES, &mut buffer).await?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub async fn collect_form(mut payload: Multipart) -> Result<RawAnalysisInput, UploadError> {
    let mut input = RawAnalysisInput::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_id" => input.user_id = Some(read_text(&mut field).await?),
            "description" => input.description = Some(read_text(&mut field).await?),
            "files" | "file" => {
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                let content_type = field.content_type().map(|mime| mime.to_string());

                // One byte past the cap is enough to tell an oversized file apart.
                let limit = if input.files.len() < MAX_IMAGES {
                    MAX_IMAGE_BYTES + 1
                } else {
                    0
                };
                let mut data = Vec::new();
                let size = read_field(&mut field, limit, &mut data).await?;

                let unnamed = file_name.as_deref().is_none_or(str::is_empty);
                if unnamed && size == 0 {
                    log::debug!("Skipping empty unnamed file part");
                    continue;
                }
                input.files.push(UploadedFile {
                    file_name,
                    content_type,
                    data,
                    size,
                });
            }
            other => {
                log::debug!("Ignoring unexpected form field: {}", other);
                read_field(&mut field, 0, &mut Vec::new()).await?;
            }
        }
    }

    Ok(input)
}

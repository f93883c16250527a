use shared::{FileError, MAX_DESCRIPTION_CHARS, MAX_IMAGE_BYTES, MAX_IMAGES};

use crate::media::{is_accepted, resolve_mime_type};
use crate::upload::RawAnalysisInput;

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub user_id: String,
    /// Present only when the submitted text has non-whitespace content.
    pub description: Option<String>,
    pub images: Vec<ImagePayload>,
}

impl AnalysisRequest {
    pub fn has_description(&self) -> bool {
        self.description.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("user_id is required and cannot be empty")]
    MissingUserId,
    #[error("At least one input is required: either images or description")]
    NoInput,
    #[error("Too many images. Maximum {} images allowed.", MAX_IMAGES)]
    TooManyImages { count: usize },
    #[error("Failed to process {} file(s)", .0.len())]
    InvalidFiles(Vec<FileError>),
    #[error("Description too long. Maximum {} characters allowed.", MAX_DESCRIPTION_CHARS)]
    DescriptionTooLong { length: usize },
    #[error("{0}")]
    InvalidForm(String),
}

impl ValidationError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingUserId => Some("user_id"),
            ValidationError::TooManyImages { .. } | ValidationError::InvalidFiles(_) => Some("files"),
            ValidationError::DescriptionTooLong { .. } => Some("description"),
            ValidationError::NoInput | ValidationError::InvalidForm(_) => None,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ValidationError::InvalidFiles(_) => "File processing error",
            ValidationError::InvalidForm(_) => "Invalid request",
            _ => "Validation error",
        }
    }
}

fn format_megabytes(bytes: usize) -> String {
    format!("{:.2}MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Turns raw form inputs into an [`AnalysisRequest`]; the first failing rule wins.
pub fn validate(input: RawAnalysisInput) -> Result<AnalysisRequest, ValidationError> {
    let user_id = input
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::MissingUserId)?
        .to_string();

    let has_description = input
        .description
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !has_description && input.files.is_empty() {
        return Err(ValidationError::NoInput);
    }

    if input.files.len() > MAX_IMAGES {
        return Err(ValidationError::TooManyImages {
            count: input.files.len(),
        });
    }

    let mut images = Vec::with_capacity(input.files.len());
    let mut errors = Vec::new();
    for (index, file) in input.files.into_iter().enumerate() {
        let filename = file.display_name(index);
        if file.size == 0 {
            errors.push(FileError {
                filename,
                error: "File is empty".to_string(),
            });
            continue;
        }
        if file.size > MAX_IMAGE_BYTES {
            errors.push(FileError {
                filename,
                error: format!("File too large ({})", format_megabytes(file.size)),
            });
            continue;
        }
        match resolve_mime_type(file.content_type.as_deref(), file.file_name.as_deref(), &file.data) {
            Some(mime_type) if is_accepted(&mime_type) => images.push(ImagePayload {
                mime_type,
                data: file.data,
            }),
            Some(mime_type) => errors.push(FileError {
                filename,
                error: format!("Unsupported media type: {}", mime_type),
            }),
            None => errors.push(FileError {
                filename,
                error: "Unrecognized media type".to_string(),
            }),
        }
    }
    if !errors.is_empty() {
        return Err(ValidationError::InvalidFiles(errors));
    }

    if let Some(description) = input.description.as_deref() {
        let length = description.chars().count();
        if length > MAX_DESCRIPTION_CHARS {
            return Err(ValidationError::DescriptionTooLong { length });
        }
    }

    Ok(AnalysisRequest {
        user_id,
        description: input.description.filter(|_| has_description),
        images,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadedFile;

    fn png(name: &str) -> UploadedFile {
        let data = vec![1u8; 64];
        UploadedFile {
            file_name: Some(name.to_string()),
            content_type: Some("image/png".to_string()),
            size: data.len(),
            data,
        }
    }

    fn input(user_id: Option<&str>, description: Option<&str>, files: Vec<UploadedFile>) -> RawAnalysisInput {
        RawAnalysisInput {
            user_id: user_id.map(str::to_string),
            description: description.map(str::to_string),
            files,
        }
    }

    #[test]
    fn missing_or_blank_user_id() {
        for user_id in [None, Some(""), Some("   \t")] {
            let err = validate(input(user_id, Some("leak"), vec![])).unwrap_err();
            assert_eq!(err, ValidationError::MissingUserId);
            assert_eq!(err.field(), Some("user_id"));
        }
    }

    #[test]
    fn user_id_checked_before_everything_else() {
        let files = (0..12).map(|i| png(&format!("{i}.png"))).collect();
        let err = validate(input(Some(" "), Some(&"x".repeat(3000)), files)).unwrap_err();
        assert_eq!(err, ValidationError::MissingUserId);
    }

    #[test]
    fn requires_some_input() {
        let err = validate(input(Some("u1"), None, vec![])).unwrap_err();
        assert_eq!(err, ValidationError::NoInput);
        assert_eq!(err.field(), None);

        let err = validate(input(Some("u1"), Some("   "), vec![])).unwrap_err();
        assert_eq!(err, ValidationError::NoInput);
    }

    #[test]
    fn rejects_more_than_ten_images() {
        let files = (0..11).map(|i| png(&format!("{i}.png"))).collect();
        let err = validate(input(Some("u1"), None, files)).unwrap_err();
        assert_eq!(err, ValidationError::TooManyImages { count: 11 });
        assert!(err.to_string().contains("Maximum 10 images"));
    }

    #[test]
    fn accepts_exactly_ten_images() {
        let files = (0..10).map(|i| png(&format!("{i}.png"))).collect();
        let request = validate(input(Some("u1"), None, files)).unwrap();
        assert_eq!(request.images.len(), 10);
    }

    #[test]
    fn rejects_oversized_and_unsupported_files() {
        let mut big = png("big.png");
        big.size = MAX_IMAGE_BYTES + 1;
        let mut pdf = png("manual.pdf");
        pdf.content_type = Some("application/pdf".to_string());
        let mut heic = png("photo.heic");
        heic.content_type = Some("image/heic".to_string());

        let err = validate(input(Some("u1"), None, vec![png("ok.png"), big, pdf, heic])).unwrap_err();
        match &err {
            ValidationError::InvalidFiles(errors) => {
                let names: Vec<&str> = errors.iter().map(|e| e.filename.as_str()).collect();
                assert_eq!(names, vec!["big.png", "manual.pdf", "photo.heic"]);
                assert!(errors[0].error.starts_with("File too large"));
                assert_eq!(errors[2].error, "Unsupported media type: image/heic");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.category(), "File processing error");
        assert_eq!(err.field(), Some("files"));
    }

    #[test]
    fn exactly_twenty_megabytes_is_allowed() {
        let mut file = png("edge.png");
        file.size = MAX_IMAGE_BYTES;
        assert!(validate(input(Some("u1"), None, vec![file])).is_ok());
    }

    #[test]
    fn rejects_empty_file() {
        let mut empty = png("empty.png");
        empty.data.clear();
        empty.size = 0;
        let err = validate(input(Some("u1"), None, vec![empty])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFiles(vec![FileError {
                filename: "empty.png".into(),
                error: "File is empty".into()
            }])
        );
    }

    #[test]
    fn description_length_limit_counts_characters() {
        let at_limit = "é".repeat(MAX_DESCRIPTION_CHARS);
        assert!(validate(input(Some("u1"), Some(&at_limit), vec![])).is_ok());

        let over = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        let err = validate(input(Some("u1"), Some(&over), vec![])).unwrap_err();
        assert_eq!(err, ValidationError::DescriptionTooLong { length: 2001 });
        assert_eq!(err.field(), Some("description"));
    }

    #[test]
    fn images_checked_before_description_length() {
        let files = (0..11).map(|i| png(&format!("{i}.png"))).collect();
        let over = "a".repeat(MAX_DESCRIPTION_CHARS + 1);
        let err = validate(input(Some("u1"), Some(&over), files)).unwrap_err();
        assert!(matches!(err, ValidationError::TooManyImages { .. }));
    }

    #[test]
    fn valid_request_is_normalized() {
        let request = validate(input(Some("  user-7 "), Some("   "), vec![png("a.png")])).unwrap();
        assert_eq!(request.user_id, "user-7");
        assert_eq!(request.description, None);
        assert!(!request.has_description());
        assert_eq!(request.images[0].mime_type, "image/png");
    }
}

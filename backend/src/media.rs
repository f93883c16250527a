use image::ImageFormat;

pub const ACCEPTED_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "image/svg+xml",
];

fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tiff" | "tif" => Some("image/tiff"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn mime_from_content(data: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(data).ok()?;
    match format {
        ImageFormat::Jpeg
        | ImageFormat::Png
        | ImageFormat::WebP
        | ImageFormat::Gif
        | ImageFormat::Bmp
        | ImageFormat::Tiff => Some(format.to_mime_type()),
        _ => None,
    }
}

fn normalize_declared(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/x-ms-bmp" => "image/bmp".to_string(),
        _ => essence,
    }
}

/// Resolves the media type of an upload from its declared content type, then its
/// file extension, then its leading bytes.
pub fn resolve_mime_type(
    content_type: Option<&str>,
    file_name: Option<&str>,
    data: &[u8],
) -> Option<String> {
    if let Some(declared) = content_type.map(normalize_declared) {
        if declared.starts_with("image/") {
            return Some(declared);
        }
    }
    file_name
        .and_then(mime_from_extension)
        .or_else(|| mime_from_content(data))
        .map(str::to_string)
}

pub fn is_accepted(mime_type: &str) -> bool {
    ACCEPTED_MIME_TYPES.contains(&mime_type)
}

//! Upload policy and URL shaping for stored media files.
//!
//! # Responsibility
//! - Decide whether an upload is acceptable (size, type) before storage.
//! - Build the public URL returned for a stored file.
//!
//! # Invariants
//! - Rejected uploads never reach storage.
//! - Stored filenames contain only `[A-Za-z0-9._-]`.

use crate::config::MediaConfig;
use crate::model::content::EpochMillis;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_STEM: &str = "upload";

/// Reason an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    Empty,
    TooLarge { size: u64, limit: u64 },
    UnsupportedType(String),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "upload is empty"),
            Self::TooLarge { size, limit } => {
                write!(f, "upload of {size} bytes exceeds the {limit} byte limit")
            }
            Self::UnsupportedType(kind) => write!(f, "unsupported upload type `{kind}`"),
        }
    }
}

impl Error for UploadError {}

/// Metadata and content of one stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub url: String,
    pub created_at: EpochMillis,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// Upload accepted by [`MediaPolicy::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub filename: String,
    pub mime_type: &'static str,
    pub size_bytes: u64,
}

/// Size and type rules applied to every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    max_upload_bytes: u64,
    allowed_mime_types: Vec<String>,
    public_base_url: String,
}

impl MediaPolicy {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            allowed_mime_types: config
                .allowed_mime_types
                .iter()
                .map(|kind| kind.trim().to_ascii_lowercase())
                .collect(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Validates an upload and resolves its stored filename and MIME type.
    ///
    /// The type comes from the filename extension when present, otherwise
    /// from the content's magic bytes.
    pub fn check(&self, data: &[u8], filename: Option<&str>) -> Result<AcceptedUpload, UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }
        let size = data.len() as u64;
        if size > self.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }

        let sanitized = filename.map(sanitize_filename).filter(|name| !name.is_empty());
        let mime_type = match sanitized.as_deref().and_then(extension_of) {
            Some(extension) => mime_for_extension(&extension)
                .ok_or_else(|| UploadError::UnsupportedType(format!(".{extension}")))?,
            None => sniff_mime(data)
                .ok_or_else(|| UploadError::UnsupportedType("unknown content".to_string()))?,
        };
        if !self.allowed_mime_types.iter().any(|allowed| allowed == mime_type) {
            return Err(UploadError::UnsupportedType(mime_type.to_string()));
        }

        let filename = match sanitized {
            Some(name) if extension_of(&name).is_some() => name,
            Some(name) => format!("{name}.{}", default_extension(mime_type)),
            None => format!("{DEFAULT_STEM}.{}", default_extension(mime_type)),
        };

        Ok(AcceptedUpload {
            filename,
            mime_type,
            size_bytes: size,
        })
    }

    /// Public URL for a stored file.
    pub fn file_url(&self, file_id: &str, filename: &str) -> String {
        format!("{}/{file_id}/{filename}", self.public_base_url)
    }

    /// Extracts the file id from a URL produced by [`MediaPolicy::file_url`].
    pub fn file_id_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.public_base_url.as_str())?;
        let rest = rest.strip_prefix('/')?;
        let (file_id, filename) = rest.split_once('/')?;
        if file_id.is_empty() || filename.is_empty() {
            return None;
        }
        Some(file_id)
    }
}

fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
    let mut sanitized = String::with_capacity(base.len());
    for ch in base.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            sanitized.push(ch);
        } else if !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    sanitized.trim_matches(|ch| ch == '-' || ch == '.').to_string()
}

fn extension_of(filename: &str) -> Option<String> {
    let (stem, extension) = filename.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "mp4" => Some("video/mp4"),
        _ => None,
    }
}

fn default_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if data.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    None
}

//! Detect stage: content sniffing, size, and image dimensions.

use camino::Utf8Path;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use super::{AttachmentDomainError, local};

/// MIME types accepted as photos.
pub const IMAGE_MIMES: [&str; 3] = ["image/jpeg", "image/png", "image/tiff"];

/// MIME types rendered inline through presigned URLs.
pub const PREVIEW_MIMES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/tiff",
    "image/webp",
    "image/gif",
];

/// Fallback for content nothing else recognises.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

const SIGNATURES: [(&[u8], &str); 8] = [
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"Rar!\x1a\x07", "application/x-rar-compressed"),
    (b"7z\xbc\xaf\x27\x1c", "application/x-7z-compressed"),
    (b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1", "application/x-ole-storage"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
];

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// What the detect stage learned about a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProbe {
    mime: String,
    size: u64,
    ext: String,
    dimensions: Option<Dimensions>,
}

impl FileProbe {
    /// Returns the sniffed MIME type.
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the extension with its leading dot, or an empty string.
    #[must_use]
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Returns pixel dimensions for decodable images.
    #[must_use]
    pub const fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Returns `true` when the file may be uploaded as a photo.
    #[must_use]
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }
}

/// Returns `true` for MIME types accepted as photos.
#[must_use]
pub fn is_image_mime(mime: &str) -> bool {
    IMAGE_MIMES.contains(&mime)
}

/// Returns `true` for MIME types that get presigned preview links.
#[must_use]
pub fn is_previewable_mime(mime: &str) -> bool {
    PREVIEW_MIMES.contains(&mime)
}

/// Returns the extension of the final path component with its dot.
#[must_use]
pub fn file_ext(path: &Utf8Path) -> String {
    path.extension()
        .map_or_else(String::new, |ext| format!(".{ext}"))
}

/// Identifies content by its leading bytes.
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    if let Some((_, mime)) = SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
    {
        return mime;
    }
    if std::str::from_utf8(bytes).is_ok() {
        TEXT_PLAIN
    } else {
        OCTET_STREAM
    }
}

/// Probes a local file.
///
/// # Errors
///
/// Returns [`AttachmentDomainError::Io`] when the file cannot be read and
/// [`AttachmentDomainError::Image`] when a previewable image has no
/// readable header.
pub fn probe(path: &Utf8Path) -> Result<FileProbe, AttachmentDomainError> {
    let bytes = local::read_file(path)?;
    let size = local::file_len(path)?;
    let mime = sniff_mime(&bytes);
    let dimensions = if is_previewable_mime(mime) {
        Some(image_dimensions(path, &bytes)?)
    } else {
        None
    };
    Ok(FileProbe {
        mime: mime.to_owned(),
        size,
        ext: file_ext(path),
        dimensions,
    })
}

fn image_dimensions(path: &Utf8Path, bytes: &[u8]) -> Result<Dimensions, AttachmentDomainError> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| AttachmentDomainError::io(path, &err))?
        .into_dimensions()
        .map_err(|err| AttachmentDomainError::image(path, &err))?;
    Ok(Dimensions { width, height })
}

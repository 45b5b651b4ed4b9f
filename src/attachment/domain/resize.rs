//! Resize stage: width-bounded JPEG renditions.

use camino::{Utf8Path, Utf8PathBuf};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use super::{AttachmentDomainError, local};

/// Returns the path a rendition of `path` at `width` is written to:
/// `<stem>.w<width>.jpg` next to the source.
#[must_use]
pub fn rendition_path(path: &Utf8Path, width: u32) -> Utf8PathBuf {
    let stem = path.file_stem().unwrap_or_default();
    path.with_file_name(format!("{stem}.w{width}.jpg"))
}

/// Writes a JPEG copy of `path` at most `width` pixels wide.
///
/// Aspect ratio is preserved and narrower sources are re-encoded without
/// upscaling. Returns the derived path.
///
/// # Errors
///
/// Returns [`AttachmentDomainError::Image`] when the source cannot be
/// decoded and [`AttachmentDomainError::Io`] when either file is
/// inaccessible.
pub fn resize(path: &Utf8Path, width: u32) -> Result<Utf8PathBuf, AttachmentDomainError> {
    let bytes = local::read_file(path)?;
    let source = image::load_from_memory(&bytes)
        .map_err(|err| AttachmentDomainError::image(path, &err))?;

    let scaled = if width == 0 || source.width() <= width {
        source
    } else {
        source.resize(width, u32::MAX, FilterType::Lanczos3)
    };

    let mut encoded = Vec::new();
    DynamicImage::ImageRgb8(scaled.to_rgb8())
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
        .map_err(|err| AttachmentDomainError::image(path, &err))?;

    let target = rendition_path(path, width);
    local::write_file(&target, &encoded)?;
    tracing::debug!(source = %path, target = %target, width, "resized photo");
    Ok(target)
}

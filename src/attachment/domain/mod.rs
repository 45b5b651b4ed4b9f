//! Domain model for attachments: renditions, object keys, the detect and
//! resize stages, and file records.

mod error;
mod file;
pub(crate) mod local;
mod probe;
mod rendition;
mod resize;

pub use error::AttachmentDomainError;
pub use file::{
    File, FileOwner, MAX_FILE_NAME_LEN, PersistedFile, StorageLocation, validate_name,
};
pub use probe::{
    Dimensions, FileProbe, IMAGE_MIMES, OCTET_STREAM, PREVIEW_MIMES, file_ext, is_image_mime,
    is_previewable_mime, probe, sniff_mime,
};
pub use rendition::{ObjectKey, Rendition};
pub use resize::{rendition_path, resize};

//! Capability-scoped access to local upload files.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use super::AttachmentDomainError;

/// Opens the directory holding `path` and returns it with the file name.
pub(crate) fn open_parent_dir(path: &Utf8Path) -> Result<(Dir, &str), AttachmentDomainError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| AttachmentDomainError::InvalidPath(path.to_owned()))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| AttachmentDomainError::io(path, &err))?;
    Ok((dir, file_name))
}

/// Reads a whole local file.
pub(crate) fn read_file(path: &Utf8Path) -> Result<Vec<u8>, AttachmentDomainError> {
    let (dir, name) = open_parent_dir(path)?;
    dir.read(name)
        .map_err(|err| AttachmentDomainError::io(path, &err))
}

/// Creates or truncates a local file with `contents`.
pub(crate) fn write_file(path: &Utf8Path, contents: &[u8]) -> Result<(), AttachmentDomainError> {
    let (dir, name) = open_parent_dir(path)?;
    dir.write(name, contents)
        .map_err(|err| AttachmentDomainError::io(path, &err))
}

/// Returns the size of a local file in bytes.
pub(crate) fn file_len(path: &Utf8Path) -> Result<u64, AttachmentDomainError> {
    let (dir, name) = open_parent_dir(path)?;
    dir.metadata(name)
        .map(|metadata| metadata.len())
        .map_err(|err| AttachmentDomainError::io(path, &err))
}

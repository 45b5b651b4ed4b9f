//! Port contracts for the attachment pipeline.

pub mod file_repository;
pub mod object_store;
pub mod url_cache;

pub use file_repository::{FileRepository, FileRepositoryError, FileRepositoryResult};
#[cfg(test)]
pub use object_store::MockObjectStore;
pub use object_store::{ObjectStore, ObjectStoreError, ObjectStoreResult};
pub use url_cache::{PresignedUrlCache, UrlCacheError, UrlCacheResult};

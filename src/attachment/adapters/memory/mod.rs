//! In-memory adapters for attachment storage.

mod file_repository;
mod object_store;
mod url_cache;

pub use file_repository::InMemoryFileRepository;
pub use object_store::{InMemoryObjectStore, StoredObject};
pub use url_cache::InMemoryUrlCache;

//! Unit tests for the attachment module.

mod domain_tests;
mod pipeline_tests;

use camino::{Utf8Path, Utf8PathBuf};
use image::{DynamicImage, Rgb, RgbImage};
use tempfile::TempDir;

use crate::attachment::{domain::local, services::BucketSettings};

/// Temporary directory holding source files.
pub(super) struct Sandbox {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Sandbox {
    pub(super) fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        Self { _dir: dir, root }
    }

    pub(super) fn image(&self, name: &str, width: u32, height: u32) -> Utf8PathBuf {
        let path = self.root.join(name);
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 90])))
            .save(path.as_std_path())
            .expect("image written");
        path
    }

    pub(super) fn file(&self, name: &str, contents: &[u8]) -> Utf8PathBuf {
        let path = self.root.join(name);
        local::write_file(&path, contents).expect("file written");
        path
    }
}

pub(super) fn bucket() -> BucketSettings {
    BucketSettings {
        bucket: "attachments".to_owned(),
        location: "us-east-1".to_owned(),
        endpoint: "storage.example.net".to_owned(),
        backend_url: "http://localhost:8080".to_owned(),
    }
}

pub(super) fn decoded_width(bytes: &[u8]) -> u32 {
    image::load_from_memory(bytes).expect("decodable image").width()
}

pub(super) fn exists(path: &Utf8Path) -> bool {
    local::read_file(path).is_ok()
}

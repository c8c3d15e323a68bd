//! Index of evidence images extracted from an archive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File extensions treated as evidence images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Maps image file names, as referenced by the manifest, to extracted paths.
///
/// Archives are expected to be flat. If two images share a name in different
/// folders, the one walked last wins.
#[derive(Debug, Clone, Default)]
pub struct EvidenceIndex {
    images: HashMap<String, PathBuf>,
}

impl EvidenceIndex {
    /// Walks `root` recursively and indexes every image file.
    pub fn build(root: &Path) -> Self {
        let images = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                Some((name, entry.into_path()))
            })
            .collect();

        Self { images }
    }

    /// Path of the image with this file name.
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.images.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_indexes_images_recursively() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("images/entry")).unwrap();
        std::fs::write(temp.path().join("a.jpg"), b"a").unwrap();
        std::fs::write(temp.path().join("images/B.PNG"), b"b").unwrap();
        std::fs::write(temp.path().join("images/entry/c.Jpeg"), b"c").unwrap();
        std::fs::write(temp.path().join("manifest.xml"), b"<x/>").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"n").unwrap();

        let index = EvidenceIndex::build(temp.path());
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("a.jpg"), Some(temp.path().join("a.jpg").as_path()));
        assert!(index.get("B.PNG").is_some());
        assert!(index.get("c.Jpeg").is_some());
        assert!(index.get("manifest.xml").is_none());
    }

    #[test]
    fn test_lookup_is_exact_on_name() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Plate.jpg"), b"a").unwrap();

        let index = EvidenceIndex::build(temp.path());
        assert!(index.get("Plate.jpg").is_some());
        assert!(index.get("plate.jpg").is_none());
    }

    #[test]
    fn test_name_collision_resolves_to_one_path() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::create_dir_all(temp.path().join("b")).unwrap();
        std::fs::write(temp.path().join("a/same.jpg"), b"a").unwrap();
        std::fs::write(temp.path().join("b/same.jpg"), b"b").unwrap();

        let index = EvidenceIndex::build(temp.path());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("same.jpg"), Some(temp.path().join("b/same.jpg").as_path()));
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        assert!(EvidenceIndex::build(temp.path()).is_empty());
    }
}

//! Source tree discovery

use std::path::{Path, PathBuf};
use tracing::{trace, warn};
use walkdir::WalkDir;

use crate::config::TargetFormat;
use crate::processing::formats::is_accepted;

/// Files selected for a run
#[derive(Debug, Default)]
pub struct Discovery {
    /// Qualifying files, in walk order
    pub files: Vec<PathBuf>,

    /// Regular files that did not qualify
    pub skipped: usize,
}

/// Walk `root` recursively and select files accepted by `target`
///
/// Entries are visited sorted by file name, so the order is stable across
/// platforms. Directory symlinks are not followed; file symlinks count
/// when they resolve to a regular file.
pub fn discover_files(root: &Path, target: TargetFormat) -> Discovery {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }

        if is_accepted(entry.path(), target) {
            discovery.files.push(entry.into_path());
        } else {
            trace!("Skipping non-qualifying file {:?}", entry.path());
            discovery.skipped += 1;
        }
    }

    discovery
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_recursive_selection_for_webp() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("nested/deeper/b.PNG"));
        touch(&temp.path().join("nested/c.heic"));
        touch(&temp.path().join("nested/d.webp"));
        touch(&temp.path().join("readme.txt"));

        let found = discover_files(temp.path(), TargetFormat::WebP);
        let names: Vec<_> = found
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.jpg", "c.heic", "b.PNG"]);
        assert_eq!(found.skipped, 2);
    }

    #[test]
    fn test_selection_for_jpeg() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("b.webp"));
        touch(&temp.path().join("sub/c.HEIC"));

        let found = discover_files(temp.path(), TargetFormat::Jpeg);
        assert_eq!(found.files.len(), 2);
        assert_eq!(found.skipped, 1);
    }

    #[test]
    fn test_directories_named_like_images_are_ignored() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("album.jpg")).unwrap();

        let found = discover_files(temp.path(), TargetFormat::WebP);
        assert!(found.files.is_empty());
        assert_eq!(found.skipped, 0);
    }
}

//! Zip assembly for downloaded items.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use reqwest::Url;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Error type for archive assembly.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// A downloaded file and the name it gets inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    pub name: String,
    pub path: PathBuf,
}

/// Name of the item at `index` once stored: `item-{index}{ext}`.
pub fn member_name(index: usize, url: &str) -> String {
    format!("item-{}{}", index, url_extension(url))
}

/// Extension of the last path segment of `url`, including the dot.
///
/// Query strings and fragments are ignored. Returns an empty string when the
/// segment has no extension.
pub fn url_extension(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let segment = path.rsplit('/').next().unwrap_or_default();
    segment
        .rfind('.')
        .map(|idx| segment[idx..].to_string())
        .unwrap_or_default()
}

/// Writes `members` into a deflate-compressed zip at `zip_path`, in order.
///
/// Blocking; call from `spawn_blocking`. A partially written archive is
/// removed on failure. Returns the archive size in bytes.
pub fn write_archive(zip_path: &Path, members: &[ArchiveMember]) -> Result<u64, ArchiveError> {
    let result = write_members(zip_path, members);
    if result.is_err() {
        let _ = std::fs::remove_file(zip_path);
    }
    result
}

fn write_members(zip_path: &Path, members: &[ArchiveMember]) -> Result<u64, ArchiveError> {
    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for member in members {
        zip.start_file(member.name.as_str(), options)?;
        let mut source = BufReader::new(File::open(&member.path)?);
        std::io::copy(&mut source, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    std::io::Write::flush(&mut writer)?;
    drop(writer);

    Ok(std::fs::metadata(zip_path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://example.com/a/report.pdf"), ".pdf");
        assert_eq!(url_extension("https://example.com/photo.JPG?size=large"), ".JPG");
        assert_eq!(url_extension("https://example.com/img.tar.jpeg#frag"), ".jpeg");
        assert_eq!(url_extension("https://example.com/noext"), "");
        assert_eq!(url_extension("https://example.com/dir.v2/file"), "");
        assert_eq!(url_extension("https://example.com/"), "");
    }

    #[test]
    fn test_member_name_uses_position() {
        assert_eq!(member_name(0, "https://example.com/a.pdf"), "item-0.pdf");
        assert_eq!(member_name(2, "https://example.com/b.jpg"), "item-2.jpg");
    }

    #[test]
    fn test_write_archive_preserves_order() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("item-0.pdf");
        let third = dir.path().join("item-2.jpg");
        std::fs::write(&first, b"first").unwrap();
        std::fs::write(&third, b"third").unwrap();

        let zip_path = dir.path().join("out.zip");
        let size = write_archive(
            &zip_path,
            &[
                ArchiveMember {
                    name: "item-0.pdf".to_string(),
                    path: first,
                },
                ArchiveMember {
                    name: "item-2.jpg".to_string(),
                    path: third,
                },
            ],
        )
        .unwrap();
        assert!(size > 0);

        let mut archive = ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "item-0.pdf");
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "first");
        drop(entry);

        assert_eq!(archive.by_index(1).unwrap().name(), "item-2.jpg");
    }

    #[test]
    fn test_missing_member_removes_partial_archive() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("out.zip");

        let result = write_archive(
            &zip_path,
            &[ArchiveMember {
                name: "item-0.pdf".to_string(),
                path: dir.path().join("does-not-exist"),
            }],
        );

        assert!(matches!(result, Err(ArchiveError::Io(_))));
        assert!(!zip_path.exists());
    }
}

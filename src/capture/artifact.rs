//! Local capture files and their names.
//!
//! Files are named `screenrecord_<yyyyMMdd_HHmmss>.mp4` and
//! `screenshot_<yyyyMMdd_HHmmss>.png`. When two captures finish within the
//! same second the later one gets a numeric suffix (`_1`, `_2`, ...); an
//! existing file is never overwritten.

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Recording,
    Screenshot,
}

impl CaptureKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            CaptureKind::Recording => "screenrecord",
            CaptureKind::Screenshot => "screenshot",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            CaptureKind::Recording => "mp4",
            CaptureKind::Screenshot => "png",
        }
    }
}

impl std::fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureKind::Recording => write!(f, "recording"),
            CaptureKind::Screenshot => write!(f, "screenshot"),
        }
    }
}

/// A capture that has been pulled to the local machine
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureArtifact {
    pub kind: CaptureKind,
    pub local_path: PathBuf,
    pub created_at: DateTime<Local>,
}

/// File name for a capture finalized at `at`, with an optional collision suffix
pub fn file_name(kind: CaptureKind, at: &DateTime<Local>, suffix: usize) -> String {
    let timestamp = at.format(TIMESTAMP_FORMAT);
    if suffix == 0 {
        format!("{}_{}.{}", kind.prefix(), timestamp, kind.extension())
    } else {
        format!(
            "{}_{}_{}.{}",
            kind.prefix(),
            timestamp,
            suffix,
            kind.extension()
        )
    }
}

/// A reserved, still empty capture file.
///
/// The file is removed when the reservation is dropped without being
/// committed, so a failed or cancelled pull leaves nothing behind.
#[derive(Debug)]
pub struct ReservedFile {
    path: PathBuf,
    committed: bool,
}

impl ReservedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file and return its path
    pub fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ReservedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Create `dir` if needed and reserve a fresh file for the capture.
///
/// The file is created empty so concurrent captures cannot pick the same name;
/// the pull overwrites it afterwards.
pub fn reserve_path(
    dir: &Path,
    kind: CaptureKind,
    at: &DateTime<Local>,
) -> io::Result<ReservedFile> {
    std::fs::create_dir_all(dir)?;

    let mut suffix = 0;
    loop {
        let path = dir.join(file_name(kind, at, suffix));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                return Ok(ReservedFile {
                    path,
                    committed: false,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 10, 16, 12, 34, 56).unwrap()
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("emulator-capture-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_names() {
        let at = fixed_time();
        assert_eq!(
            file_name(CaptureKind::Recording, &at, 0),
            "screenrecord_20241016_123456.mp4"
        );
        assert_eq!(
            file_name(CaptureKind::Screenshot, &at, 0),
            "screenshot_20241016_123456.png"
        );
        assert_eq!(
            file_name(CaptureKind::Screenshot, &at, 2),
            "screenshot_20241016_123456_2.png"
        );
    }

    #[test]
    fn test_reserve_creates_missing_directory() {
        let dir = temp_dir().join("nested");
        let path = reserve_path(&dir, CaptureKind::Recording, &fixed_time())
            .unwrap()
            .commit();
        assert!(dir.is_dir());
        assert_eq!(path, dir.join("screenrecord_20241016_123456.mp4"));
        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_same_second_captures_are_disambiguated() {
        let dir = temp_dir();
        let at = fixed_time();
        let first = reserve_path(&dir, CaptureKind::Screenshot, &at).unwrap();
        let second = reserve_path(&dir, CaptureKind::Screenshot, &at).unwrap();
        let third = reserve_path(&dir, CaptureKind::Screenshot, &at).unwrap();
        let (first, second, third) = (first.commit(), second.commit(), third.commit());

        assert_eq!(first, dir.join("screenshot_20241016_123456.png"));
        assert_eq!(second, dir.join("screenshot_20241016_123456_1.png"));
        assert_eq!(third, dir.join("screenshot_20241016_123456_2.png"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let taken = dir.join("screenrecord_20241016_123456.mp4");
        std::fs::write(&taken, b"keep me").unwrap();

        let path = reserve_path(&dir, CaptureKind::Recording, &fixed_time())
            .unwrap()
            .commit();
        assert_ne!(path, taken);
        assert_eq!(std::fs::read(&taken).unwrap(), b"keep me");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_uncommitted_reservation_is_removed() {
        let dir = temp_dir();
        let reserved = reserve_path(&dir, CaptureKind::Screenshot, &fixed_time()).unwrap();
        let path = reserved.path().to_path_buf();
        assert!(path.is_file());

        drop(reserved);
        assert!(!path.exists());

        // The freed name is handed out again.
        let again = reserve_path(&dir, CaptureKind::Screenshot, &fixed_time())
            .unwrap()
            .commit();
        assert_eq!(again, path);
        assert!(again.is_file());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}

//! On-disk record of a marker strip in progress.
//!
//! Written before the first rename and removed after the last restore, so a
//! journal on disk always means the payload may be in the stripped state.

use crate::error::{PayloadError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Journal file name, kept in the publish root outside the hashed payload
pub const JOURNAL_FILE_NAME: &str = ".clickonce-marker-journal.json";

/// Current version of the journal format
pub const JOURNAL_FORMAT_VERSION: u32 = 2;

/// Journal path for a publish directory
pub fn journal_path(publish_dir: &Path) -> PathBuf {
    publish_dir.join(JOURNAL_FILE_NAME)
}

/// One payload file with its marker removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrippedEntry {
    /// Stripped path relative to the payload folder
    pub path: PathBuf,
    /// Marker exactly as it was spelled on disk (`.deploy`, `.DEPLOY`, ...)
    pub suffix: String,
}

impl StrippedEntry {
    /// Entry for `path` whose marker was spelled `suffix`
    pub fn new(path: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            suffix: suffix.into(),
        }
    }
}

/// The set of files stripped of their marker by one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerJournal {
    /// Version of the journal format
    pub format_version: u32,
    /// Payload folder the entries are relative to
    pub target_dir: PathBuf,
    /// Marker extension, including the leading dot
    pub marker: String,
    /// File names that never get the marker back
    pub excluded: Vec<String>,
    /// Stripped files relative to `target_dir`
    pub entries: Vec<StrippedEntry>,
    /// Process that wrote the journal
    pub pid: u32,
    /// When stripping started
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl MarkerJournal {
    /// New journal for the current process
    pub fn new(
        target_dir: impl Into<PathBuf>,
        marker: impl Into<String>,
        excluded: Vec<String>,
        entries: Vec<StrippedEntry>,
    ) -> Self {
        Self {
            format_version: JOURNAL_FORMAT_VERSION,
            target_dir: target_dir.into(),
            marker: marker.into(),
            excluded,
            entries,
            pid: std::process::id(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Persist atomically (temp file, fsync, rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let journal_err = |reason: String| PayloadError::Journal {
            path: path.to_path_buf(),
            reason,
        };

        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| journal_err(format!("Failed to serialize journal: {e}")))?;

        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path)
                .map_err(|e| journal_err(format!("Failed to create temp file: {e}")))?;
            file.write_all(serialized.as_bytes())
                .map_err(|e| journal_err(format!("Failed to write journal: {e}")))?;
            file.sync_all()
                .map_err(|e| journal_err(format!("Failed to sync journal: {e}")))?;
        }

        fs::rename(&temp_path, path)
            .map_err(|e| journal_err(format!("Failed to rename temp file: {e}")))?;
        Ok(())
    }

    /// Load the journal at `path`, if any
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PayloadError::Journal {
                    path: path.to_path_buf(),
                    reason: format!("Failed to read journal: {e}"),
                }
                .into());
            }
        };

        let journal: Self = serde_json::from_str(&contents).map_err(|e| PayloadError::Journal {
            path: path.to_path_buf(),
            reason: format!("Journal is corrupted: {e}"),
        })?;

        if journal.format_version != JOURNAL_FORMAT_VERSION {
            return Err(PayloadError::Journal {
                path: path.to_path_buf(),
                reason: format!(
                    "Unsupported journal format {} (expected {})",
                    journal.format_version, JOURNAL_FORMAT_VERSION
                ),
            }
            .into());
        }

        Ok(Some(journal))
    }

    /// Delete the journal at `path`; a missing file is fine
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PayloadError::Journal {
                path: path.to_path_buf(),
                reason: format!("Failed to remove journal: {e}"),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = journal_path(dir.path());

        assert_eq!(MarkerJournal::load(&path).expect("load"), None);

        let journal = MarkerJournal::new(
            dir.path().join("App_1_0_0_1"),
            ".deploy",
            vec!["App.exe.manifest".to_string()],
            vec![
                StrippedEntry::new("App.exe", ".deploy"),
                StrippedEntry::new(PathBuf::from("de").join("App.resources.dll"), ".DEPLOY"),
            ],
        );
        journal.save(&path).expect("save");
        assert!(!path.with_extension("tmp").exists());

        let loaded = MarkerJournal::load(&path).expect("load").expect("present");
        assert_eq!(loaded, journal);

        MarkerJournal::remove(&path).expect("remove");
        MarkerJournal::remove(&path).expect("second remove is a no-op");
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupted_journal_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = journal_path(dir.path());
        fs::write(&path, b"{ not json").expect("write");

        let err = MarkerJournal::load(&path).unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }

    #[test]
    fn test_older_format_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = journal_path(dir.path());
        let mut journal = MarkerJournal::new(dir.path(), ".deploy", vec![], vec![]);
        journal.format_version = 1;
        journal.save(&path).expect("save");

        let err = MarkerJournal::load(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported journal format 1"));
    }
}

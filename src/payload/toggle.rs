//! Stripping and restoring the marker extension on payload files.

use super::journal::{MarkerJournal, StrippedEntry};
use crate::error::{PayloadError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of putting the marker back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreOutcome {
    /// Files renamed back to their marked name
    pub restored: usize,
    /// Files that already carried the marker
    pub already_marked: usize,
    /// Recorded files that exist under neither name
    pub missing: Vec<PathBuf>,
    /// Recorded files that exist under both names
    pub conflicts: Vec<PathBuf>,
}

impl RestoreOutcome {
    /// Whether every recorded file carries the marker again
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.conflicts.is_empty()
    }
}

/// Files under a payload folder whose marker extension was stripped
///
/// Holds exactly the set recorded before stripping; restoration touches
/// nothing else.
#[derive(Debug)]
pub struct PayloadFileSet {
    root: PathBuf,
    marker: String,
    excluded: Vec<String>,
    entries: Vec<StrippedEntry>,
    journal: PathBuf,
}

impl PayloadFileSet {
    /// Strip `marker` from every file below `root` that ends with it
    ///
    /// The marker matches regardless of ASCII case; each file keeps the
    /// spelling it had on disk when restored.
    ///
    /// The journal is written before the first rename. If a rename fails the
    /// files already renamed are put back, the journal is removed and the
    /// error is returned.
    pub fn strip(root: &Path, marker: &str, excluded: Vec<String>, journal: &Path) -> Result<Self> {
        let entries = marked_files(root, marker)?;
        log::info!(
            "Stripping '{}' from {} payload file(s) in {}",
            marker,
            entries.len(),
            root.display()
        );

        MarkerJournal::new(root, marker, excluded.clone(), entries.clone()).save(journal)?;

        let set = Self {
            root: root.to_path_buf(),
            marker: marker.to_string(),
            excluded,
            entries,
            journal: journal.to_path_buf(),
        };

        for (done, entry) in set.entries.iter().enumerate() {
            if let Err(e) = set.strip_one(entry) {
                log::error!("Stripping failed, undoing {} rename(s): {}", done, e);
                for undo in &set.entries[..done] {
                    if let Err(undo_err) = rename(&set.stripped_path(undo), &set.marked_path(undo)) {
                        log::error!("Could not undo rename of {}: {}", undo.path.display(), undo_err);
                        return Err(e);
                    }
                }
                MarkerJournal::remove(journal)?;
                return Err(e);
            }
        }

        Ok(set)
    }

    /// Paths that [`PayloadFileSet::strip`] would rename, without renaming
    pub fn scan(root: &Path, marker: &str) -> Result<Vec<PathBuf>> {
        Ok(marked_files(root, marker)?
            .into_iter()
            .map(|entry| entry.path)
            .collect())
    }

    /// Rebuild a set from a journal left by an interrupted run
    pub fn from_journal(journal: MarkerJournal, journal_path: &Path) -> Self {
        Self {
            root: journal.target_dir,
            marker: journal.marker,
            excluded: journal.excluded,
            entries: journal.entries,
            journal: journal_path.to_path_buf(),
        }
    }

    /// Payload folder
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of recorded files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was stripped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded stripped files, relative to the payload folder
    pub fn entries(&self) -> &[StrippedEntry] {
        &self.entries
    }

    /// Put the marker back on every recorded file except the excluded names
    ///
    /// Keeps going past individual failures. The journal is only removed when
    /// every file is accounted for; otherwise [`PayloadError::Incomplete`] is
    /// returned and the journal stays for a later `restore`.
    pub fn restore(&self) -> Result<RestoreOutcome> {
        let mut outcome = RestoreOutcome::default();

        for entry in &self.entries {
            if self.is_excluded(entry) {
                log::debug!("Leaving {} unmarked", entry.path.display());
                continue;
            }

            let stripped = self.stripped_path(entry);
            let marked = self.marked_path(entry);
            match (stripped.exists(), marked.exists()) {
                (true, false) => match rename(&stripped, &marked) {
                    Ok(()) => outcome.restored += 1,
                    Err(e) => {
                        log::error!("{}", e);
                        outcome.missing.push(entry.path.clone());
                    }
                },
                (false, true) => outcome.already_marked += 1,
                (true, true) => {
                    log::error!(
                        "Both {} and {} exist; leaving both",
                        stripped.display(),
                        marked.display()
                    );
                    outcome.conflicts.push(entry.path.clone());
                }
                (false, false) => {
                    log::warn!("Recorded payload file {} has disappeared", stripped.display());
                    outcome.missing.push(entry.path.clone());
                }
            }
        }

        if !outcome.is_complete() {
            return Err(PayloadError::Incomplete {
                count: outcome.missing.len() + outcome.conflicts.len(),
                journal: self.journal.clone(),
            }
            .into());
        }

        MarkerJournal::remove(&self.journal)?;
        log::info!(
            "Restored '{}' on {} payload file(s)",
            self.marker,
            outcome.restored + outcome.already_marked
        );
        Ok(outcome)
    }

    fn strip_one(&self, entry: &StrippedEntry) -> Result<()> {
        let marked = self.marked_path(entry);
        let stripped = self.stripped_path(entry);
        if stripped.exists() {
            return Err(PayloadError::Conflict { path: stripped }.into());
        }
        rename(&marked, &stripped)
    }

    fn is_excluded(&self, entry: &StrippedEntry) -> bool {
        entry
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.excluded.iter().any(|e| e.eq_ignore_ascii_case(name)))
    }

    fn stripped_path(&self, entry: &StrippedEntry) -> PathBuf {
        self.root.join(&entry.path)
    }

    fn marked_path(&self, entry: &StrippedEntry) -> PathBuf {
        let mut name: OsString = self.root.join(&entry.path).into_os_string();
        name.push(&entry.suffix);
        PathBuf::from(name)
    }
}

/// Relative, marker-free paths of all files below `root` ending in `marker`
fn marked_files(root: &Path, marker: &str) -> Result<Vec<StrippedEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if let Some(stem) = strip_marker(name, marker) {
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            entries.push(StrippedEntry::new(
                relative.with_file_name(stem),
                &name[stem.len()..],
            ));
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// `name` without a trailing `marker` (ASCII case-insensitive), if it has one
fn strip_marker<'n>(name: &'n str, marker: &str) -> Option<&'n str> {
    if name.len() <= marker.len() {
        return None;
    }
    let split = name.len() - marker.len();
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(marker).then_some(stem)
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    std::fs::rename(from, to).map_err(|source| {
        PayloadError::RenameFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::journal_path;
    use std::fs;

    fn payload(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        for file in files {
            let path = dir.path().join("App_1_0_0_1").join(file);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, file.as_bytes()).expect("write");
        }
        dir
    }

    fn files(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().display().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_strip_marker() {
        assert_eq!(strip_marker("App.exe.deploy", ".deploy"), Some("App.exe"));
        assert_eq!(strip_marker("App.exe.DEPLOY", ".deploy"), Some("App.exe"));
        assert_eq!(strip_marker(".deploy", ".deploy"), None);
        assert_eq!(strip_marker("App.exe", ".deploy"), None);
    }

    #[test]
    fn test_strip_then_restore_round_trip() {
        let dir = payload(&[
            "App.exe.deploy",
            "App.dll.deploy",
            "de/App.resources.dll.deploy",
            "App.exe.manifest",
        ]);
        let root = dir.path().join("App_1_0_0_1");
        let journal = journal_path(dir.path());

        let set = PayloadFileSet::strip(&root, ".deploy", vec!["App.exe.manifest".into()], &journal)
            .expect("strip");
        assert_eq!(set.len(), 3);
        assert!(journal.exists());
        assert!(root.join("App.exe").exists());
        assert!(root.join("de").join("App.resources.dll").exists());
        assert!(!root.join("App.exe.deploy").exists());

        let outcome = set.restore().expect("restore");
        assert_eq!(outcome.restored, 3);
        assert!(root.join("App.exe.deploy").exists());
        assert!(root.join("de").join("App.resources.dll.deploy").exists());
        assert!(root.join("App.exe.manifest").exists());
        assert!(!journal.exists());
    }

    #[test]
    fn test_marker_spelling_is_kept_through_round_trip() {
        let dir = payload(&["App.dll.deploy", "Extra.dll.DEPLOY", "Other.dll.Deploy"]);
        let root = dir.path().join("App_1_0_0_1");
        let journal = journal_path(dir.path());
        let before = files(&root);

        let set = PayloadFileSet::strip(&root, ".deploy", vec![], &journal).expect("strip");
        assert_eq!(set.len(), 3);
        assert!(root.join("Extra.dll").exists());
        assert!(root.join("Other.dll").exists());

        let recorded = MarkerJournal::load(&journal).expect("load").expect("present");
        let extra = recorded
            .entries
            .iter()
            .find(|e| e.path == Path::new("Extra.dll"))
            .expect("recorded");
        assert_eq!(extra.suffix, ".DEPLOY");

        set.restore().expect("restore");
        assert_eq!(files(&root), before);
    }

    #[test]
    fn test_excluded_names_stay_unmarked() {
        let dir = payload(&["App.application.deploy", "App.dll.deploy"]);
        let root = dir.path().join("App_1_0_0_1");
        let journal = journal_path(dir.path());

        let set = PayloadFileSet::strip(&root, ".deploy", vec!["app.application".into()], &journal)
            .expect("strip");
        set.restore().expect("restore");

        assert!(root.join("App.application").exists());
        assert!(root.join("App.dll.deploy").exists());
    }

    #[test]
    fn test_conflict_undoes_earlier_renames() {
        let dir = payload(&["a.dll.deploy", "b.dll.deploy", "b.dll"]);
        let root = dir.path().join("App_1_0_0_1");
        let journal = journal_path(dir.path());

        let err = PayloadFileSet::strip(&root, ".deploy", vec![], &journal).unwrap_err();
        assert!(matches!(
            err,
            crate::error::SignError::Payload(PayloadError::Conflict { .. })
        ));
        assert!(root.join("a.dll.deploy").exists());
        assert!(!root.join("a.dll").exists());
        assert!(!journal.exists());
    }

    #[test]
    fn test_restore_is_idempotent_and_reports_missing() {
        let dir = payload(&["a.dll.deploy", "b.dll.deploy"]);
        let root = dir.path().join("App_1_0_0_1");
        let journal = journal_path(dir.path());

        let set = PayloadFileSet::strip(&root, ".deploy", vec![], &journal).expect("strip");
        fs::rename(root.join("a.dll"), root.join("a.dll.deploy")).expect("manual restore");
        fs::remove_file(root.join("b.dll")).expect("delete");

        let err = set.restore().unwrap_err();
        assert!(matches!(
            err,
            crate::error::SignError::Payload(PayloadError::Incomplete { count: 1, .. })
        ));
        assert!(journal.exists(), "journal kept for a later restore");
    }

    #[test]
    fn test_from_journal_restores_recorded_set_only() {
        let dir = payload(&["a.dll.deploy"]);
        let root = dir.path().join("App_1_0_0_1");
        let journal = journal_path(dir.path());

        let set = PayloadFileSet::strip(&root, ".deploy", vec![], &journal).expect("strip");
        // The process dies here; only the journal survives
        drop(set);
        // A file that never carried the marker must not gain one
        fs::write(root.join("new.txt"), b"x").expect("write");

        let loaded = MarkerJournal::load(&journal).expect("load").expect("present");
        let outcome = PayloadFileSet::from_journal(loaded, &journal)
            .restore()
            .expect("restore");
        assert_eq!(outcome.restored, 1);
        assert!(root.join("a.dll.deploy").exists());
        assert!(root.join("new.txt").exists());
    }
}

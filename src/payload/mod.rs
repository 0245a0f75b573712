//! Marker-extension handling for ClickOnce payload files.
//!
//! Published payload files carry a marker extension (`.deploy`) that has to
//! be absent while mage hashes them. Stripping is modeled as a two-phase
//! commit: the file list is journaled before anything is renamed, and a
//! [`MarkerGuard`] puts the marker back on whatever path the run exits by.

mod guard;
mod journal;
mod toggle;

pub use guard::MarkerGuard;
pub use journal::{JOURNAL_FILE_NAME, MarkerJournal, StrippedEntry, journal_path};
pub use toggle::{PayloadFileSet, RestoreOutcome};

use crate::error::Result;
use std::path::Path;

/// Default marker extension appended to published payload files
pub const DEFAULT_MARKER: &str = ".deploy";

/// Restore a payload left stripped by an interrupted run
///
/// Returns `Ok(None)` when the publish directory has no journal.
pub fn repair_interrupted(publish_dir: &Path) -> Result<Option<RestoreOutcome>> {
    let path = journal_path(publish_dir);
    let Some(journal) = MarkerJournal::load(&path)? else {
        return Ok(None);
    };

    log::warn!(
        "Found journal from an interrupted run (pid {}, started {}); restoring {} file(s) in {}",
        journal.pid,
        journal.started_at,
        journal.entries.len(),
        journal.target_dir.display()
    );
    let outcome = PayloadFileSet::from_journal(journal, &path).restore()?;
    Ok(Some(outcome))
}

//! Scoped restoration of stripped payload files.

use super::toggle::{PayloadFileSet, RestoreOutcome};
use crate::error::Result;

/// Restores a stripped [`PayloadFileSet`] on every exit path
///
/// [`MarkerGuard::commit`] restores and reports the outcome. If the guard is
/// dropped instead (an error returned early, a panic unwinding, or the
/// enclosing future cancelled by Ctrl-C) restoration runs from `Drop` and is
/// logged. Restoration failures in `Drop` leave the journal on disk.
pub struct MarkerGuard {
    set: Option<PayloadFileSet>,
}

impl MarkerGuard {
    /// Guard a freshly stripped set
    pub fn new(set: PayloadFileSet) -> Self {
        Self { set: Some(set) }
    }

    /// Number of files being guarded
    pub fn len(&self) -> usize {
        self.set.as_ref().map_or(0, PayloadFileSet::len)
    }

    /// Whether the guarded set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restore now and disarm the guard
    pub fn commit(mut self) -> Result<RestoreOutcome> {
        match self.set.take() {
            Some(set) => set.restore(),
            None => Ok(RestoreOutcome::default()),
        }
    }
}

impl Drop for MarkerGuard {
    fn drop(&mut self) {
        let Some(set) = self.set.take() else {
            return;
        };

        log::warn!(
            "Signing did not complete; restoring marker on {} payload file(s) in {}",
            set.len(),
            set.root().display()
        );
        match set.restore() {
            Ok(outcome) => log::info!(
                "Payload restored ({} renamed, {} already marked)",
                outcome.restored,
                outcome.already_marked
            ),
            // Drop must not panic; the journal stays for `restore`
            Err(e) => log::error!("Payload restoration failed: {}", e),
        }
    }
}

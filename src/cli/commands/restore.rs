//! Restore command implementation.
//!
//! Repairs a payload left stripped by an interrupted `sign`, using the
//! journal in the publish directory.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::payload::repair_interrupted;
use crate::signing::check_publish_dir;
use std::path::Path;

/// Execute restore command
pub(super) async fn execute_restore(publish_dir: Option<&Path>, config: &RuntimeConfig) -> Result<()> {
    let publish_dir = check_publish_dir(publish_dir)?;
    config.verbose_println(&format!("Looking for a journal in {}", publish_dir.display()));

    match repair_interrupted(&publish_dir)? {
        None => config.success_println("Nothing to restore"),
        Some(outcome) => {
            config.success_println(&format!(
                "Restored marker on {} file(s)",
                outcome.restored
            ));
            if outcome.already_marked > 0 {
                config.indent(&format!("{} file(s) already carried it", outcome.already_marked));
            }
        }
    }

    Ok(())
}

//! Current-user personal certificate store, driven through certutil.

use super::Thumbprint;
use crate::error::Result;
use crate::tools::{ToolRunner, certutil};
use std::path::{Path, PathBuf};

/// Outcome of the best-effort store cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Nothing was imported by this run, so nothing was removed
    Skipped,
    /// certutil reported the entry as deleted
    Removed,
    /// certutil failed; the entry may still be in the store
    Failed(String),
}

/// Personal store operations for the signing flow
pub struct CertificateStore<'a, R: ToolRunner> {
    runner: &'a R,
    certutil: PathBuf,
}

impl<'a, R: ToolRunner> CertificateStore<'a, R> {
    /// Store accessed through the certutil at `certutil`
    pub fn new(runner: &'a R, certutil: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            certutil: certutil.into(),
        }
    }

    /// Whether a certificate with `thumbprint` is present
    pub async fn contains(&self, thumbprint: &Thumbprint) -> Result<bool> {
        let output = self
            .runner
            .run(&certutil::query(&self.certutil, thumbprint))
            .await?;
        log::debug!(
            "Store lookup for {}: exit {:?}",
            thumbprint,
            output.code
        );
        Ok(output.success())
    }

    /// Import a PKCS#12 bundle
    pub async fn import(&self, bundle: &Path, password: &str) -> Result<()> {
        self.runner
            .run_checked(&certutil::import_pfx(&self.certutil, bundle, password))
            .await?;
        Ok(())
    }

    /// Delete the entry matching `cert_id`; never fails the run
    pub async fn remove(&self, cert_id: &str) -> CleanupOutcome {
        match self.runner.run(&certutil::delete(&self.certutil, cert_id)).await {
            Ok(output) if output.success() => {
                log::info!("Removed '{}' from the personal store", cert_id);
                CleanupOutcome::Removed
            }
            Ok(output) => {
                let reason = output.diagnostic_tail(3);
                log::warn!("Could not remove '{}' from the store: {}", cert_id, reason);
                CleanupOutcome::Failed(reason)
            }
            Err(e) => {
                log::warn!("Could not remove '{}' from the store: {}", cert_id, e);
                CleanupOutcome::Failed(e.to_string())
            }
        }
    }
}

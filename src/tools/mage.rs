//! Command builder for `mage.exe -Update`.
//!
//! mage only signs manifests with the older RSA/SHA-1 pairing accepted by the
//! ClickOnce runtime this tool targets, so every update uses
//! [`DigestAlgorithm::Sha1`].

use super::invocation::{ToolInvocation, ToolKind};
use super::DigestAlgorithm;
use crate::certificate::Thumbprint;
use std::path::{Path, PathBuf};

/// Which manifest is being regenerated
#[derive(Clone, Debug)]
pub enum ManifestUpdate {
    /// Application manifest (`<Project>.exe.manifest`), file list rebuilt
    /// from the payload directory
    Application {
        /// Directory whose files are hashed into the manifest
        from_directory: PathBuf,
        /// Icon file name relative to the payload directory
        icon_file: Option<String>,
    },
    /// Deployment descriptor (`<Project>.application`)
    Deployment {
        /// The freshly signed application manifest
        app_manifest: PathBuf,
        /// Code base of the manifest relative to the descriptor, when they
        /// live in different folders
        app_code_base: Option<String>,
        /// Publisher display name
        publisher: String,
    },
}

/// An invocation of `mage -Update` that also signs the result
#[derive(Clone, Debug)]
pub struct MageUpdate {
    target: PathBuf,
    update: ManifestUpdate,
    thumbprint: Thumbprint,
    timestamp_url: String,
}

const ALGORITHM: DigestAlgorithm = DigestAlgorithm::Sha1;

impl MageUpdate {
    /// Update and sign the file at `target`
    pub fn new(
        target: impl Into<PathBuf>,
        update: ManifestUpdate,
        thumbprint: Thumbprint,
        timestamp_url: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            update,
            thumbprint,
            timestamp_url: timestamp_url.into(),
        }
    }

    /// File being updated
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Build the command line for the mage at `program`
    pub fn invocation(&self, program: &Path) -> ToolInvocation {
        let mut inv = ToolInvocation::new(ToolKind::Mage, program)
            .arg("-Update")
            .path_arg(&self.target);

        match &self.update {
            ManifestUpdate::Application {
                from_directory,
                icon_file,
            } => {
                inv = inv.arg("-FromDirectory").path_arg(from_directory);
                if let Some(icon) = icon_file {
                    inv = inv.arg("-IconFile").arg(icon.as_str());
                }
            }
            ManifestUpdate::Deployment {
                app_manifest,
                app_code_base,
                publisher,
            } => {
                inv = inv.arg("-AppManifest").path_arg(app_manifest);
                if let Some(code_base) = app_code_base {
                    inv = inv.arg("-AppCodeBase").arg(code_base.as_str());
                }
                inv = inv.arg("-Publisher").arg(publisher.as_str());
            }
        }

        inv.arg("-Algorithm")
            .arg(ALGORITHM.mage_name())
            .arg("-CertHash")
            .arg(self.thumbprint.as_str())
            .arg("-TimestampUri")
            .arg(self.timestamp_url.as_str())
    }
}

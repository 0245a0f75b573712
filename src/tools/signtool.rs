//! Command builder for `signtool.exe sign`.

use super::invocation::{ToolInvocation, ToolKind};
use super::DigestAlgorithm;
use crate::certificate::Thumbprint;
use std::path::{Path, PathBuf};

/// Digest for both the file signature (`/fd`) and the timestamp (`/td`)
const DIGEST: DigestAlgorithm = DigestAlgorithm::Sha256;

/// An invocation of `signtool sign` selecting the certificate by thumbprint
/// from the current user's personal store
#[derive(Clone, Debug)]
pub struct SigntoolSign {
    thumbprint: Thumbprint,
    timestamp_url: String,
    verbose: bool,
    files: Vec<PathBuf>,
}

impl SigntoolSign {
    /// Sign with `thumbprint`, timestamping against `timestamp_url` (RFC 3161)
    pub fn new(thumbprint: Thumbprint, timestamp_url: impl Into<String>) -> Self {
        Self {
            thumbprint,
            timestamp_url: timestamp_url.into(),
            verbose: false,
            files: Vec::new(),
        }
    }

    /// Verbose signtool output (`/v`)
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Add a file to sign
    pub fn file(mut self, path: impl AsRef<Path>) -> Self {
        self.files.push(path.as_ref().to_path_buf());
        self
    }

    /// Build the command line for the signtool at `program`
    pub fn invocation(&self, program: &Path) -> ToolInvocation {
        let mut inv = ToolInvocation::new(ToolKind::SignTool, program).arg("sign");

        if self.verbose {
            inv = inv.arg("/v");
        }

        inv = inv
            .arg("/s")
            .arg("My")
            .arg("/sha1")
            .arg(self.thumbprint.as_str())
            .arg("/fd")
            .arg(DIGEST.signtool_name())
            .arg("/tr")
            .arg(self.timestamp_url.as_str())
            .arg("/td")
            .arg(DIGEST.signtool_name());

        for file in &self.files {
            inv = inv.path_arg(file);
        }

        inv
    }
}

//! External tool plumbing.
//!
//! Everything the orchestrator runs goes through a [`ToolInvocation`] and a
//! [`ToolRunner`], so command lines stay structured and tests can substitute
//! a recording runner for real processes.

pub mod certutil;
mod invocation;
mod locate;
pub mod mage;
pub mod openssl;
mod runner;
pub mod signtool;

pub use invocation::{ToolArg, ToolInvocation, ToolKind, ToolOutput};
pub use locate::{Located, default_locations, locate_tool};
pub use mage::{MageUpdate, ManifestUpdate};
pub use runner::{DEFAULT_TOOL_TIMEOUT, SystemToolRunner, ToolRunner};
pub use signtool::SigntoolSign;

/// Hash algorithm requested from a signing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// SHA-1, the only algorithm the manifest tool accepts here
    Sha1,
    /// SHA-256, required for executable signatures
    Sha256,
}

impl DigestAlgorithm {
    /// Name understood by signtool's `/fd` and `/td`
    pub fn signtool_name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256",
        }
    }

    /// Name understood by mage's `-Algorithm`
    pub fn mage_name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1RSA",
            DigestAlgorithm::Sha256 => "sha256RSA",
        }
    }
}

/// Resolved executable paths for one run
#[derive(Debug, Clone)]
pub struct ToolSet {
    /// signtool.exe
    pub signtool: std::path::PathBuf,
    /// mage.exe
    pub mage: std::path::PathBuf,
    /// openssl, only needed when a certificate bundle is supplied
    pub openssl: Option<std::path::PathBuf>,
    /// certutil.exe
    pub certutil: std::path::PathBuf,
}

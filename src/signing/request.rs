//! Inputs for one signing run.

use crate::payload::DEFAULT_MARKER;
use crate::tools::DEFAULT_TOOL_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;

/// Default RFC 3161 timestamp authority
pub const DEFAULT_TIMESTAMP_URL: &str = "http://timestamp.digicert.com";

/// Default installer launcher in the publish root
pub const DEFAULT_LAUNCHER: &str = "setup.exe";

/// Certificate options as given on the command line, not yet validated
#[derive(Debug, Clone, Default)]
pub struct CertificateInput {
    /// PKCS#12 bundle to import for the run
    pub bundle: Option<PathBuf>,
    /// Password for `bundle`
    pub password: Option<String>,
    /// Thumbprint of a certificate already in the personal store
    pub thumbprint: Option<String>,
}

/// Explicit tool locations; `None` means search the defaults
#[derive(Debug, Clone, Default)]
pub struct ToolOverrides {
    /// signtool.exe
    pub signtool: Option<PathBuf>,
    /// mage.exe
    pub mage: Option<PathBuf>,
    /// openssl
    pub openssl: Option<PathBuf>,
    /// certutil.exe
    pub certutil: Option<PathBuf>,
}

/// Tunables for a signing run
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Marker extension carried by payload files, with leading dot
    pub marker: String,
    /// Installer launcher file name in the publish root
    pub launcher: String,
    /// Icon file name passed to mage; `None` uses `<Project>.ico` when present
    pub icon_file: Option<String>,
    /// Also update `<publish>/<Project>.application` when it exists
    pub update_top_level_descriptor: bool,
    /// Per-call timeout for external tools
    pub tool_timeout: Duration,
    /// Ask signtool for verbose output
    pub verbose_tools: bool,
    /// Validate and print the plan without signing
    pub dry_run: bool,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            launcher: DEFAULT_LAUNCHER.to_string(),
            icon_file: None,
            update_top_level_descriptor: true,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            verbose_tools: false,
            dry_run: false,
        }
    }
}

/// Everything one invocation needs
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// Project name, used for the folder pattern and file names
    pub project: String,
    /// Publish output root; `None` when not supplied
    pub publish_dir: Option<PathBuf>,
    /// How the certificate is identified
    pub certificate: CertificateInput,
    /// RFC 3161 timestamp authority, passed verbatim to both tools
    pub timestamp_url: String,
    /// Publisher display name for the descriptor and store cleanup
    pub publisher: String,
    /// Tool location overrides
    pub tools: ToolOverrides,
    /// Run tunables
    pub config: SigningConfig,
}

impl SigningRequest {
    /// Request with defaults for everything but the required fields
    pub fn new(project: impl Into<String>, publish_dir: impl Into<PathBuf>, publisher: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            publish_dir: Some(publish_dir.into()),
            certificate: CertificateInput::default(),
            timestamp_url: DEFAULT_TIMESTAMP_URL.to_string(),
            publisher: publisher.into(),
            tools: ToolOverrides::default(),
            config: SigningConfig::default(),
        }
    }
}

//! Comprehensive error types for ClickOnce signing operations.
//!
//! This module defines all error types with actionable error messages, recovery
//! suggestions and the process exit code each failure category maps to.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SignError>;

/// Main error type for all signing operations
#[derive(Error, Debug)]
pub enum SignError {
    /// Environment or input precondition failed before any side effect
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    /// An external tool could not be run or reported failure
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Certificate re-encoding, import or lookup failed
    #[error("Certificate error: {0}")]
    Certificate(#[from] CertificateError),

    /// Marker extension toggling failed
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// The run was interrupted before it could finish
    #[error("Interrupted during {phase}; payload restoration was attempted")]
    Interrupted {
        /// Phase that was running when the interrupt arrived
        phase: String,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Precondition errors, each with its own exit code
#[derive(Error, Debug)]
pub enum PreconditionError {
    /// Process is not running with administrator/root rights
    #[error("This command must be run with elevated (administrator) privileges")]
    NotElevated,

    /// Publish directory not given or not present
    #[error("Publish directory not found: {path}")]
    PublishDirMissing {
        /// Path that was checked
        path: PathBuf,
    },

    /// Publish directory has no "Application Files" folder
    #[error("'Application Files' folder not found under {path}")]
    ApplicationFilesMissing {
        /// Path of the expected folder
        path: PathBuf,
    },

    /// No `<Project>_<version>` folder found
    #[error("No versioned folder matching '{pattern}' found in {path}")]
    NoVersionedTarget {
        /// Search pattern used
        pattern: String,
        /// Folder that was searched
        path: PathBuf,
    },

    /// Thumbprint is not 40 hexadecimal characters
    #[error("Malformed certificate thumbprint '{thumbprint}': expected 40 hexadecimal characters")]
    MalformedFingerprint {
        /// Thumbprint as supplied
        thumbprint: String,
    },

    /// Thumbprint is well-formed but not present in the personal store
    #[error("Certificate {thumbprint} not found in the current user's personal store")]
    FingerprintNotInStore {
        /// Normalized thumbprint
        thumbprint: String,
    },

    /// signtool.exe could not be located
    #[error("Signing tool not found (checked: {})", display_paths(checked))]
    SigningToolNotFound {
        /// Locations that were checked
        checked: Vec<PathBuf>,
    },

    /// mage.exe could not be located
    #[error("Manifest tool not found (checked: {})", display_paths(checked))]
    ManifestToolNotFound {
        /// Locations that were checked
        checked: Vec<PathBuf>,
    },

    /// openssl could not be located
    #[error("Crypto toolkit not found (checked: {})", display_paths(checked))]
    CryptoToolNotFound {
        /// Locations that were checked
        checked: Vec<PathBuf>,
    },

    /// Timestamp URL failed the URL-shape check
    #[error("Invalid timestamp URL '{url}': {reason}")]
    InvalidTimestampUrl {
        /// URL as supplied
        url: String,
        /// Reason for the error
        reason: String,
    },

    /// Neither a certificate bundle nor a thumbprint was supplied
    #[error("No certificate supplied: pass --cert-file with --cert-password, or --thumbprint")]
    MissingCertificate,
}

/// External tool errors
#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool process could not be spawned
    #[error("Failed to launch {tool} ({path}): {source}")]
    SpawnFailed {
        /// Tool name
        tool: String,
        /// Executable path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Tool exited with a non-zero status
    #[error("{tool} failed with exit code {code:?}: {stderr}")]
    Failed {
        /// Tool name
        tool: String,
        /// Exit code if the process exited normally
        code: Option<i32>,
        /// Tail of the captured error output
        stderr: String,
    },

    /// Tool did not finish within the configured timeout
    #[error("{tool} timed out after {seconds}s")]
    TimedOut {
        /// Tool name
        tool: String,
        /// Timeout in seconds
        seconds: u64,
    },
}

/// Certificate provisioning errors
#[derive(Error, Debug)]
pub enum CertificateError {
    /// Certificate bundle file missing
    #[error("Certificate bundle not found: {path}")]
    BundleMissing {
        /// Path to the bundle
        path: PathBuf,
    },

    /// Bundle supplied without a password
    #[error("Certificate bundle {path} requires --cert-password")]
    PasswordMissing {
        /// Path to the bundle
        path: PathBuf,
    },

    /// No certificate could be extracted from the decrypted bundle
    #[error("No certificate found in decrypted bundle: {reason}")]
    NoCertificate {
        /// Reason for the error
        reason: String,
    },

    /// Imported certificate did not show up in the store
    #[error("Imported certificate {thumbprint} was not found in the store after import")]
    ImportNotVisible {
        /// Derived thumbprint
        thumbprint: String,
    },
}

/// Payload marker-extension errors
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Renaming a payload file failed
    #[error("Failed to rename {from} -> {to}: {source}")]
    RenameFailed {
        /// Source path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Both the marked and unmarked name exist
    #[error("Refusing to overwrite {path}: both marked and unmarked copies exist")]
    Conflict {
        /// Path that already exists
        path: PathBuf,
    },

    /// Some recorded files could not be restored
    #[error("{count} payload file(s) could not be restored; journal kept at {journal}")]
    Incomplete {
        /// Number of files left unrestored
        count: usize,
        /// Journal path for a later `restore`
        journal: PathBuf,
    },

    /// Journal could not be read or written
    #[error("Journal error at {path}: {reason}")]
    Journal {
        /// Journal path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "PATH".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SignError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SignError::Precondition(e) => e.exit_code(),
            SignError::Tool(_) => 30,
            SignError::Certificate(_) => 31,
            SignError::Payload(_) => 32,
            SignError::Interrupted { .. } => 33,
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            SignError::Precondition(PreconditionError::NotElevated) => vec![
                "Re-run from an elevated prompt (Run as administrator)".to_string(),
            ],
            SignError::Precondition(PreconditionError::ApplicationFilesMissing { .. })
            | SignError::Precondition(PreconditionError::NoVersionedTarget { .. }) => vec![
                "Publish the ClickOnce project first (msbuild /t:publish)".to_string(),
                "Check that --project matches the published application name".to_string(),
            ],
            SignError::Precondition(PreconditionError::FingerprintNotInStore { .. }) => vec![
                "List personal certificates: certutil -user -store My".to_string(),
                "Import the certificate, or pass --cert-file and --cert-password".to_string(),
            ],
            SignError::Precondition(PreconditionError::SigningToolNotFound { .. }) => vec![
                "Install the Windows 10 SDK signing tools".to_string(),
                "Point --signtool (or SIGNTOOL_PATH) at signtool.exe".to_string(),
            ],
            SignError::Precondition(PreconditionError::ManifestToolNotFound { .. }) => vec![
                "Install the .NET Framework 4.8 developer pack".to_string(),
                "Point --mage (or MAGE_PATH) at mage.exe".to_string(),
            ],
            SignError::Precondition(PreconditionError::CryptoToolNotFound { .. }) => vec![
                "Install OpenSSL and add it to PATH, or pass --openssl".to_string(),
            ],
            SignError::Payload(_) | SignError::Interrupted { .. } => vec![
                "Run `kodegen_bundler_clickonce restore` with the same --publish-dir".to_string(),
                "Inspect the journal file in the publish directory".to_string(),
            ],
            SignError::Tool(ToolError::Failed { .. }) => vec![
                "Re-run with --verbose to see the full tool output".to_string(),
                "Check that the timestamp server is reachable".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check whether the payload may have been left modified
    pub fn may_leave_payload_modified(&self) -> bool {
        matches!(
            self,
            SignError::Payload(PayloadError::Incomplete { .. }) | SignError::Interrupted { .. }
        )
    }
}

impl PreconditionError {
    /// Process exit code for this precondition
    pub fn exit_code(&self) -> i32 {
        match self {
            PreconditionError::NotElevated => 10,
            PreconditionError::PublishDirMissing { .. } => 11,
            PreconditionError::ApplicationFilesMissing { .. } => 12,
            PreconditionError::NoVersionedTarget { .. } => 13,
            PreconditionError::MalformedFingerprint { .. } => 14,
            PreconditionError::FingerprintNotInStore { .. } => 15,
            PreconditionError::SigningToolNotFound { .. } => 16,
            PreconditionError::ManifestToolNotFound { .. } => 17,
            PreconditionError::InvalidTimestampUrl { .. } => 18,
            PreconditionError::CryptoToolNotFound { .. } => 19,
            PreconditionError::MissingCertificate => 20,
        }
    }
}

//! Command line argument parsing and validation.
//!
//! Every option has an environment-variable fallback so CI pipelines can
//! configure a run without long command lines.

use crate::payload::DEFAULT_MARKER;
use crate::signing::{
    CertificateInput, DEFAULT_LAUNCHER, DEFAULT_TIMESTAMP_URL, SigningConfig, SigningRequest,
    ToolOverrides,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Dual-algorithm signing for ClickOnce publish output
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_clickonce",
    version,
    about = "Dual-algorithm signing for ClickOnce publish output",
    long_about = "Signs a ClickOnce publish tree: executables with signtool (SHA-256) and
manifests with mage (SHA-1), toggling the .deploy marker around manifest signing.

Usage:
  kodegen_bundler_clickonce sign --project MyApp --publish-dir publish --publisher \"Contoso\" --thumbprint <SHA1>
  kodegen_bundler_clickonce sign --project MyApp --publish-dir publish --publisher \"Contoso\" --cert-file cert.pfx
  kodegen_bundler_clickonce restore --publish-dir publish
  kodegen_bundler_clickonce thumbprint --cert-file cert.pfx"
)]
pub struct Args {
    /// Debug-level logging and tool output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign executables and manifests of the newest versioned payload
    Sign(SignArgs),

    /// Put the marker extension back after an interrupted run
    Restore {
        /// Publish output root containing the journal
        #[arg(long, env = "CLICKONCE_PUBLISH_DIR", value_name = "DIR")]
        publish_dir: Option<PathBuf>,
    },

    /// Print the fingerprint of a certificate bundle
    Thumbprint {
        /// PKCS#12 bundle
        #[arg(long, env = "CLICKONCE_PFX", value_name = "FILE")]
        cert_file: PathBuf,

        /// Bundle password
        #[arg(long, env = "CLICKONCE_PFX_PASSWORD", hide_env_values = true)]
        cert_password: String,

        /// openssl executable
        #[arg(long, env = "OPENSSL_PATH", value_name = "FILE")]
        openssl: Option<PathBuf>,
    },
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Sign(_) => "sign",
            Command::Restore { .. } => "restore",
            Command::Thumbprint { .. } => "thumbprint",
        }
    }
}

/// Options of the `sign` command
#[derive(clap::Args, Debug, Clone)]
pub struct SignArgs {
    /// Project name; selects `Application Files/<NAME>_*` and names the files
    #[arg(long, env = "CLICKONCE_PROJECT", value_name = "NAME")]
    pub project: String,

    /// Publish output root
    #[arg(long, env = "CLICKONCE_PUBLISH_DIR", value_name = "DIR")]
    pub publish_dir: Option<PathBuf>,

    /// PKCS#12 bundle imported for the duration of the run
    #[arg(long, env = "CLICKONCE_PFX", value_name = "FILE")]
    pub cert_file: Option<PathBuf>,

    /// Password of the bundle
    #[arg(
        long,
        env = "CLICKONCE_PFX_PASSWORD",
        hide_env_values = true,
        requires = "cert_file"
    )]
    pub cert_password: Option<String>,

    /// SHA-1 fingerprint of a certificate already in the personal store
    #[arg(long, env = "CLICKONCE_THUMBPRINT", value_name = "SHA1")]
    pub thumbprint: Option<String>,

    /// RFC 3161 timestamp authority
    #[arg(long, env = "CLICKONCE_TIMESTAMP_URL", default_value = DEFAULT_TIMESTAMP_URL)]
    pub timestamp_url: String,

    /// Publisher display name written into the deployment descriptor
    #[arg(long, env = "CLICKONCE_PUBLISHER")]
    pub publisher: String,

    /// Marker extension carried by payload files
    #[arg(long, default_value = DEFAULT_MARKER)]
    pub marker: String,

    /// Installer launcher in the publish root
    #[arg(long, default_value = DEFAULT_LAUNCHER, value_name = "FILE")]
    pub launcher: String,

    /// Icon file for the application manifest [default: <NAME>.ico when present]
    #[arg(long, value_name = "FILE")]
    pub icon_file: Option<String>,

    /// Leave `<publish>/<NAME>.application` untouched
    #[arg(long)]
    pub skip_top_level_descriptor: bool,

    /// signtool executable
    #[arg(long, env = "SIGNTOOL_PATH", value_name = "FILE")]
    pub signtool: Option<PathBuf>,

    /// mage executable
    #[arg(long, env = "MAGE_PATH", value_name = "FILE")]
    pub mage: Option<PathBuf>,

    /// openssl executable
    #[arg(long, env = "OPENSSL_PATH", value_name = "FILE")]
    pub openssl: Option<PathBuf>,

    /// certutil executable
    #[arg(long, env = "CERTUTIL_PATH", value_name = "FILE")]
    pub certutil: Option<PathBuf>,

    /// Seconds a single tool call may take
    #[arg(long, env = "CLICKONCE_TOOL_TIMEOUT", default_value_t = 600, value_name = "SECONDS")]
    pub tool_timeout: u64,

    /// Validate and print the tool calls without running them
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Sign(sign) = &self.command {
            sign.validate()?;
        }
        Ok(())
    }
}

impl SignArgs {
    /// Checks clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.project.trim().is_empty() {
            return Err("Project name must not be empty".to_string());
        }
        if self.project.contains(['/', '\\']) {
            return Err(format!("Project name '{}' must not contain path separators", self.project));
        }
        if self.publisher.trim().is_empty() {
            return Err("Publisher must not be empty".to_string());
        }
        if !self.marker.starts_with('.') || self.marker.len() < 2 {
            return Err(format!("Marker extension '{}' must start with '.'", self.marker));
        }
        if self.tool_timeout == 0 {
            return Err("Tool timeout must be at least one second".to_string());
        }
        Ok(())
    }

    /// Build the library request
    pub fn to_request(&self, verbose: bool) -> SigningRequest {
        SigningRequest {
            project: self.project.trim().to_string(),
            publish_dir: self.publish_dir.clone(),
            certificate: CertificateInput {
                bundle: self.cert_file.clone(),
                password: self.cert_password.clone(),
                thumbprint: self.thumbprint.clone(),
            },
            timestamp_url: self.timestamp_url.clone(),
            publisher: self.publisher.clone(),
            tools: ToolOverrides {
                signtool: self.signtool.clone(),
                mage: self.mage.clone(),
                openssl: self.openssl.clone(),
                certutil: self.certutil.clone(),
            },
            config: SigningConfig {
                marker: self.marker.clone(),
                launcher: self.launcher.clone(),
                icon_file: self.icon_file.clone(),
                update_top_level_descriptor: !self.skip_top_level_descriptor,
                tool_timeout: Duration::from_secs(self.tool_timeout),
                verbose_tools: verbose,
                dry_run: self.dry_run,
            },
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug)]
pub struct RuntimeConfig {
    output: super::OutputManager,
    verbose: bool,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose, quiet),
            verbose,
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.verbose, args.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kodegen_bundler_clickonce").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    fn sign_args(args: &Args) -> &SignArgs {
        match &args.command {
            Command::Sign(sign) => sign,
            other => panic!("expected sign, got {}", other.name()),
        }
    }

    #[test]
    fn test_sign_defaults() {
        let args = parse(&[
            "sign",
            "--project",
            "App",
            "--publish-dir",
            "publish",
            "--publisher",
            "Contoso",
            "--thumbprint",
            "ABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD",
        ]);
        let sign = sign_args(&args);
        assert_eq!(sign.timestamp_url, "http://timestamp.digicert.com");
        assert_eq!(sign.marker, ".deploy");
        assert_eq!(sign.launcher, "setup.exe");
        assert!(args.validate().is_ok());

        let request = sign.to_request(false);
        assert_eq!(request.project, "App");
        assert_eq!(request.config.tool_timeout, Duration::from_secs(600));
        assert!(request.config.update_top_level_descriptor);
    }

    #[test]
    fn test_password_requires_cert_file() {
        let result = Args::try_parse_from([
            "kodegen_bundler_clickonce",
            "sign",
            "--project",
            "App",
            "--publisher",
            "Contoso",
            "--cert-password",
            "secret",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_marker_and_project() {
        let mut args = parse(&["sign", "--project", "App", "--publisher", "Contoso", "--marker", "deploy"]);
        assert!(args.validate().unwrap_err().contains("Marker"));

        args = parse(&["sign", "--project", "a/b", "--publisher", "Contoso"]);
        assert!(args.validate().unwrap_err().contains("path separators"));
    }

    #[test]
    fn test_verbose_is_global() {
        let args = parse(&["restore", "--publish-dir", "publish", "--verbose"]);
        assert!(args.verbose);
        assert_eq!(args.command.name(), "restore");
    }
}

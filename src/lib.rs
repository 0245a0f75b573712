//! # kodegen_bundler_clickonce
//!
//! Dual-algorithm code signing for ClickOnce publish output.
//!
//! ClickOnce needs two kinds of signature: executables are signed with
//! signtool using SHA-256, while the application manifest and deployment
//! descriptor are regenerated and signed with mage using SHA-1. Between the
//! two, payload files lose their `.deploy` marker extension so mage hashes
//! them under their real names, and get it back afterwards.
//!
//! ## Features
//!
//! - **Fail-fast preconditions**: every input checked before anything changes, each failure with its own exit code
//! - **Certificate provisioning**: PKCS#12 bundles re-encoded for the Windows store, imported for the run and removed after
//! - **Journaled marker toggle**: an interrupted run leaves a journal that the next run (or `restore`) repairs
//! - **Structured tool calls**: no shell strings; secrets are redacted from logs
//!
//! ## Usage
//!
//! ```bash
//! kodegen_bundler_clickonce sign --project MyApp --publish-dir publish --publisher "Contoso" --thumbprint <SHA1>
//! kodegen_bundler_clickonce sign --project MyApp --publish-dir publish --publisher "Contoso" --dry-run
//! kodegen_bundler_clickonce restore --publish-dir publish
//! ```

// The Windows elevation probe is the only unsafe code and opts in locally
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod certificate;
pub mod cli;
pub mod environment;
pub mod error;
pub mod payload;
pub mod signing;
pub mod target;
pub mod tools;

pub use certificate::{CertificateSource, Thumbprint};
pub use cli::Args;
pub use environment::{Environment, StaticEnvironment, SystemEnvironment};
pub use error::{CliError, Result, SignError};
pub use signing::{Orchestrator, SignReport, SigningConfig, SigningPlan, SigningRequest};
pub use target::{ResolvedTarget, resolve_target};
pub use tools::{SystemToolRunner, ToolInvocation, ToolOutput, ToolRunner};

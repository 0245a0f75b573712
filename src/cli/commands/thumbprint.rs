//! Thumbprint command implementation.

use crate::certificate::Provisioner;
use crate::cli::RuntimeConfig;
use crate::error::{PreconditionError, Result};
use crate::tools::{Located, SystemToolRunner, ToolKind, locate_tool};
use std::path::Path;

/// Execute thumbprint command
///
/// Prints only the fingerprint on stdout so scripts can capture it.
pub(super) async fn execute_thumbprint(
    cert_file: &Path,
    cert_password: &str,
    openssl: Option<&Path>,
    config: &RuntimeConfig,
) -> Result<()> {
    let openssl = match locate_tool(ToolKind::OpenSsl, openssl) {
        Located::Found(path) => path,
        Located::NotFound(checked) => {
            return Err(PreconditionError::CryptoToolNotFound { checked }.into());
        }
    };
    config.verbose_println(&format!("Using {}", openssl.display()));

    let runner = SystemToolRunner::default();
    let thumbprint = Provisioner::new(&runner, Some(openssl.as_path()))
        .derive_thumbprint(cert_file, cert_password)
        .await?;

    println!("{}", thumbprint);
    Ok(())
}

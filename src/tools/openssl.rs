//! Command builders for the `openssl pkcs12` re-encoding round trip.
//!
//! The bundle password travels through the child environment
//! (`-passin env:` / `-passout env:`) so it never shows up in a process
//! listing or a rendered command line.

use super::invocation::{ToolInvocation, ToolKind};
use std::path::Path;

/// Environment variable carrying the bundle password into openssl
pub const PASSWORD_ENV: &str = "KODEGEN_CLICKONCE_PFX_PASSWORD";

/// Stage 1: decrypt `bundle` into an unencrypted PEM at `pem_out`
pub fn decrypt_to_pem(program: &Path, bundle: &Path, pem_out: &Path, password: &str) -> ToolInvocation {
    ToolInvocation::new(ToolKind::OpenSsl, program)
        .arg("pkcs12")
        .arg("-in")
        .path_arg(bundle)
        .arg("-out")
        .path_arg(pem_out)
        .arg("-nodes")
        .arg("-passin")
        .arg(format!("env:{PASSWORD_ENV}"))
        .env(PASSWORD_ENV, password)
}

/// Stage 2: re-export `pem` as a PKCS#12 bundle the Windows store imports
/// cleanly (3DES key and certificate encryption, SHA-1 MAC), encrypted with
/// the same password
pub fn export_legacy_pfx(
    program: &Path,
    pem: &Path,
    pfx_out: &Path,
    password: &str,
    friendly_name: Option<&str>,
) -> ToolInvocation {
    let mut inv = ToolInvocation::new(ToolKind::OpenSsl, program)
        .arg("pkcs12")
        .arg("-export")
        .arg("-in")
        .path_arg(pem)
        .arg("-out")
        .path_arg(pfx_out)
        .arg("-keypbe")
        .arg("PBE-SHA1-3DES")
        .arg("-certpbe")
        .arg("PBE-SHA1-3DES")
        .arg("-macalg")
        .arg("sha1");
    if let Some(name) = friendly_name {
        inv = inv.arg("-name").arg(name);
    }
    inv.arg("-passout")
        .arg(format!("env:{PASSWORD_ENV}"))
        .env(PASSWORD_ENV, password)
}

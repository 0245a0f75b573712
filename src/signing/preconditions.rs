//! Fail-fast validation before anything is signed or imported.
//!
//! Checks run in a fixed order and stop at the first failure, each with its
//! own exit code. Nothing here touches the certificate store or the payload.

use super::request::SigningRequest;
use crate::certificate::{CertificateSource, Thumbprint};
use crate::environment::Environment;
use crate::error::{CertificateError, PreconditionError, Result};
use crate::target::{ResolvedTarget, resolve_target};
use crate::tools::{Located, ToolKind, ToolSet, locate_tool};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// A request that passed every precondition
#[derive(Debug, Clone)]
pub struct PreparedRun {
    /// Payload folder to sign
    pub target: ResolvedTarget,
    /// Validated certificate identification
    pub certificate: CertificateSource,
    /// Validated timestamp authority
    pub timestamp_url: String,
    /// Resolved tool executables
    pub tools: ToolSet,
}

/// Run every precondition check against `request`
pub fn check_preconditions<E: Environment>(env: &E, request: &SigningRequest) -> Result<PreparedRun> {
    if !env.is_elevated() {
        return Err(PreconditionError::NotElevated.into());
    }

    let publish_dir = check_publish_dir(request.publish_dir.as_deref())?;
    let target = resolve_target(&publish_dir, &request.project)?;
    log::info!("Resolved payload folder: {}", target.directory.display());

    let certificate = check_certificate(request)?;
    let timestamp_url = check_timestamp_url(&request.timestamp_url)?;
    let tools = check_tools(request, matches!(certificate, CertificateSource::Bundle { .. }))?;

    Ok(PreparedRun {
        target,
        certificate,
        timestamp_url,
        tools,
    })
}

/// Publish directory must be given and exist; returned absolute
pub fn check_publish_dir(publish_dir: Option<&Path>) -> Result<PathBuf> {
    let Some(dir) = publish_dir.filter(|d| !d.as_os_str().is_empty()) else {
        return Err(PreconditionError::PublishDirMissing {
            path: PathBuf::new(),
        }
        .into());
    };

    if !dir.is_dir() {
        return Err(PreconditionError::PublishDirMissing {
            path: dir.to_path_buf(),
        }
        .into());
    }

    Ok(dir.absolutize()?.into_owned())
}

/// Exactly one usable identification: a bundle (with password) wins over a
/// thumbprint; a thumbprint must be well-formed
pub fn check_certificate(request: &SigningRequest) -> Result<CertificateSource> {
    let input = &request.certificate;

    if let Some(bundle) = &input.bundle {
        if input.thumbprint.is_some() {
            log::warn!("Both a certificate bundle and a thumbprint were given; using the bundle");
        }
        let password = input
            .password
            .clone()
            .ok_or_else(|| CertificateError::PasswordMissing { path: bundle.clone() })?;
        if !bundle.is_file() {
            return Err(CertificateError::BundleMissing { path: bundle.clone() }.into());
        }
        return Ok(CertificateSource::Bundle {
            path: bundle.clone(),
            password,
        });
    }

    match &input.thumbprint {
        Some(raw) => Ok(CertificateSource::Thumbprint(Thumbprint::parse(raw)?)),
        None => Err(PreconditionError::MissingCertificate.into()),
    }
}

/// Basic URL shape: absolute http(s) URL with a host
pub fn check_timestamp_url(raw: &str) -> Result<String> {
    let invalid = |reason: &str| PreconditionError::InvalidTimestampUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let parsed = url::Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https").into());
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host").into());
    }

    Ok(raw.trim().to_string())
}

/// Locate signtool and mage, plus openssl when a bundle must be re-encoded
pub fn check_tools(request: &SigningRequest, needs_openssl: bool) -> Result<ToolSet> {
    let overrides = &request.tools;

    let signtool = match locate_tool(ToolKind::SignTool, overrides.signtool.as_deref()) {
        Located::Found(path) => path,
        Located::NotFound(checked) => {
            return Err(PreconditionError::SigningToolNotFound { checked }.into());
        }
    };

    let mage = match locate_tool(ToolKind::Mage, overrides.mage.as_deref()) {
        Located::Found(path) => path,
        Located::NotFound(checked) => {
            return Err(PreconditionError::ManifestToolNotFound { checked }.into());
        }
    };

    let openssl = if needs_openssl {
        match locate_tool(ToolKind::OpenSsl, overrides.openssl.as_deref()) {
            Located::Found(path) => Some(path),
            Located::NotFound(checked) => {
                return Err(PreconditionError::CryptoToolNotFound { checked }.into());
            }
        }
    } else {
        None
    };

    // certutil ships with Windows; fall back to the bare name and let spawn report it
    let certutil = match locate_tool(ToolKind::CertUtil, overrides.certutil.as_deref()) {
        Located::Found(path) => path,
        Located::NotFound(_) => PathBuf::from("certutil.exe"),
    };

    Ok(ToolSet {
        signtool,
        mage,
        openssl,
        certutil,
    })
}

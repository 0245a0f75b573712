//! Certificate provisioning: PKCS#12 re-encoding, import and fingerprint checks.

use super::store::CertificateStore;
use super::{Thumbprint, pem};
use crate::error::{CertificateError, PreconditionError, Result};
use crate::tools::{ToolRunner, openssl};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

/// How the signing certificate is identified for this run
#[derive(Debug, Clone)]
pub enum CertificateSource {
    /// A PKCS#12 bundle that is re-encoded and imported for the run
    Bundle {
        /// Path to the `.pfx`/`.p12` file
        path: PathBuf,
        /// Bundle password, reused for re-encryption
        password: String,
    },
    /// A certificate already present in the personal store
    Thumbprint(Thumbprint),
}

/// The certificate a run signs with
#[derive(Debug, Clone)]
pub struct CertificateHandle {
    /// Fingerprint passed to both signing tools
    pub thumbprint: Thumbprint,
    /// Whether this run imported it (and so must clean it up)
    pub imported: bool,
}

/// A bundle rewritten in the encoding the Windows store imports
pub struct ReencodedBundle {
    /// Holds the intermediate files; dropping it deletes them
    _staging: TempDir,
    /// Re-encrypted bundle inside the staging directory
    pub pfx: PathBuf,
    /// Fingerprint of the leaf certificate
    pub thumbprint: Thumbprint,
}

/// Runs the provisioning steps against a runner and store
pub struct Provisioner<'a, R: ToolRunner> {
    runner: &'a R,
    openssl: Option<&'a Path>,
    import_started: AtomicBool,
}

impl<'a, R: ToolRunner> Provisioner<'a, R> {
    /// Provisioner using the openssl at `openssl` when bundles are involved
    pub fn new(runner: &'a R, openssl: Option<&'a Path>) -> Self {
        Self {
            runner,
            openssl,
            import_started: AtomicBool::new(false),
        }
    }

    /// Whether a store import was started, even if it never finished
    ///
    /// Stays `true` once set, so a caller whose provisioning future failed or
    /// was dropped knows the store may hold a certificate to clean up.
    pub fn import_started(&self) -> bool {
        self.import_started.load(Ordering::SeqCst)
    }

    fn openssl(&self) -> Result<&'a Path> {
        self.openssl.ok_or_else(|| {
            PreconditionError::CryptoToolNotFound {
                checked: Vec::new(),
            }
            .into()
        })
    }

    /// Decrypt `bundle` and derive the leaf fingerprint, without re-encrypting
    ///
    /// The unencrypted PEM only ever exists inside a private temporary
    /// directory that is removed before this returns.
    pub async fn derive_thumbprint(&self, bundle: &Path, password: &str) -> Result<Thumbprint> {
        let staging = staging_dir()?;
        self.decrypt(bundle, password, &staging).await
    }

    async fn decrypt(&self, bundle: &Path, password: &str, staging: &TempDir) -> Result<Thumbprint> {
        let openssl = self.openssl()?;
        if !bundle.is_file() {
            return Err(CertificateError::BundleMissing {
                path: bundle.to_path_buf(),
            }
            .into());
        }

        let pem_path = staging.path().join("certificate.pem");
        log::debug!("Decrypting {} to intermediate PEM", bundle.display());
        self.runner
            .run_checked(&openssl::decrypt_to_pem(openssl, bundle, &pem_path, password))
            .await?;

        let pem_text = tokio::fs::read_to_string(&pem_path).await?;
        let der = pem::leaf_certificate_der(&pem_text)?;
        Ok(Thumbprint::from_der(&der))
    }

    /// Two-stage re-encoding: decrypt to PEM, then re-export as a legacy-encoded
    /// bundle protected by the same password
    pub async fn reencode(
        &self,
        bundle: &Path,
        password: &str,
        friendly_name: Option<&str>,
    ) -> Result<ReencodedBundle> {
        let staging = staging_dir()?;
        let thumbprint = self.decrypt(bundle, password, &staging).await?;

        let pem_path = staging.path().join("certificate.pem");
        let pfx = staging.path().join("certificate-legacy.pfx");
        log::debug!("Re-exporting bundle with store-compatible encoding");
        self.runner
            .run_checked(&openssl::export_legacy_pfx(
                self.openssl()?,
                &pem_path,
                &pfx,
                password,
                friendly_name,
            ))
            .await?;

        // The plaintext key is not needed past this point
        if let Err(e) = tokio::fs::remove_file(&pem_path).await {
            log::debug!("Could not remove intermediate PEM early: {}", e);
        }

        Ok(ReencodedBundle {
            _staging: staging,
            pfx,
            thumbprint,
        })
    }

    /// Resolve the certificate for a run
    ///
    /// A bundle is re-encoded, imported and then looked up by its derived
    /// fingerprint; a bare thumbprint must already be in the store.
    pub async fn provision(
        &self,
        source: &CertificateSource,
        store: &CertificateStore<'_, R>,
        friendly_name: Option<&str>,
    ) -> Result<CertificateHandle> {
        match source {
            CertificateSource::Thumbprint(thumbprint) => {
                if !store.contains(thumbprint).await? {
                    return Err(PreconditionError::FingerprintNotInStore {
                        thumbprint: thumbprint.to_string(),
                    }
                    .into());
                }
                log::info!("Using certificate {} from the personal store", thumbprint);
                Ok(CertificateHandle {
                    thumbprint: thumbprint.clone(),
                    imported: false,
                })
            }
            CertificateSource::Bundle { path, password } => {
                let reencoded = self.reencode(path, password, friendly_name).await?;
                self.import_started.store(true, Ordering::SeqCst);
                store.import(&reencoded.pfx, password).await?;

                if !store.contains(&reencoded.thumbprint).await? {
                    return Err(CertificateError::ImportNotVisible {
                        thumbprint: reencoded.thumbprint.to_string(),
                    }
                    .into());
                }
                log::info!(
                    "Imported certificate {} into the personal store",
                    reencoded.thumbprint
                );
                Ok(CertificateHandle {
                    thumbprint: reencoded.thumbprint.clone(),
                    imported: true,
                })
            }
        }
    }
}

fn staging_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new()
        .prefix("kodegen-clickonce-")
        .tempdir()?)
}

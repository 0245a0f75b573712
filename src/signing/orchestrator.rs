//! The linear signing flow.
//!
//! Preconditions, interrupted-run repair, certificate provisioning, the
//! SHA-256 executable pass, the SHA-1 manifest pass and store cleanup run in
//! that order. Any failure stops the flow; the payload guard and store
//! cleanup still run on the way out.

use super::preconditions::{PreparedRun, check_preconditions};
use super::request::{SigningConfig, SigningRequest};
use crate::certificate::{
    CertificateSource, CertificateStore, CleanupOutcome, Provisioner, Thumbprint,
};
use crate::environment::Environment;
use crate::error::{Result, SignError};
use crate::payload::{self, MarkerGuard, PayloadFileSet, RestoreOutcome, journal_path};
use crate::target::ResolvedTarget;
use crate::tools::{
    MageUpdate, ManifestUpdate, SigntoolSign, ToolInvocation, ToolRunner, certutil,
};
use std::path::{Path, PathBuf};

/// What a completed run did
#[derive(Debug, Clone)]
pub struct SignReport {
    /// Payload folder that was signed
    pub target: ResolvedTarget,
    /// Certificate fingerprint used by both tools
    pub thumbprint: Thumbprint,
    /// Whether the certificate was imported by this run
    pub imported: bool,
    /// Files signed by signtool, in order
    pub executables_signed: Vec<PathBuf>,
    /// Manifests regenerated and signed by mage, in order
    pub manifests_signed: Vec<PathBuf>,
    /// Payload files whose marker was toggled
    pub payload_files: usize,
    /// Repair of a previously interrupted run, if one was found
    pub repaired: Option<RestoreOutcome>,
    /// Store cleanup result
    pub cleanup: CleanupOutcome,
}

/// What a run would do, computed without side effects
#[derive(Debug, Clone)]
pub struct SigningPlan {
    /// Payload folder that would be signed
    pub target: ResolvedTarget,
    /// Fingerprint that would be used
    pub thumbprint: Thumbprint,
    /// Whether a bundle would be imported (and later removed)
    pub imports_certificate: bool,
    /// Payload files that would have their marker toggled
    pub payload_files: Vec<PathBuf>,
    /// Whether a journal from an interrupted run would be repaired first
    pub pending_repair: bool,
    /// Tool invocations in execution order
    pub steps: Vec<ToolInvocation>,
}

struct PassSummary {
    executables_signed: Vec<PathBuf>,
    manifests_signed: Vec<PathBuf>,
    payload_files: usize,
}

/// Sequences a signing run against an environment and a tool runner
pub struct Orchestrator<'a, E: Environment, R: ToolRunner> {
    env: &'a E,
    runner: &'a R,
}

impl<'a, E: Environment, R: ToolRunner> Orchestrator<'a, E, R> {
    /// Orchestrator over `env` and `runner`
    pub fn new(env: &'a E, runner: &'a R) -> Self {
        Self { env, runner }
    }

    /// Run the full flow, stopping cleanly on Ctrl-C
    pub async fn run(&self, request: &SigningRequest) -> Result<SignReport> {
        self.run_until(request, ctrl_c()).await
    }

    /// Run the full flow, stopping cleanly when `shutdown` completes
    ///
    /// Completing `shutdown` during provisioning or signing drops the work in
    /// flight, which restores the payload, then removes a certificate this
    /// run started to import and returns [`SignError::Interrupted`].
    pub async fn run_until<S>(&self, request: &SigningRequest, shutdown: S) -> Result<SignReport>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let prepared = check_preconditions(self.env, request)?;
        let target = &prepared.target;

        let repaired = payload::repair_interrupted(&target.publish_dir)?;

        let store = CertificateStore::new(self.runner, &prepared.tools.certutil);
        let provisioner = Provisioner::new(self.runner, prepared.tools.openssl.as_deref());

        let provisioned = tokio::select! {
            result = provisioner.provision(&prepared.certificate, &store, Some(request.publisher.as_str())) => Some(result),
            _ = &mut shutdown => None,
        };
        let handle = match provisioned {
            Some(Ok(handle)) => handle,
            Some(Err(e)) => {
                discard_partial_import(&provisioner, &store, &request.publisher).await;
                return Err(e);
            }
            None => {
                log::warn!("Interrupted during certificate provisioning");
                discard_partial_import(&provisioner, &store, &request.publisher).await;
                return Err(SignError::Interrupted {
                    phase: "certificate provisioning".to_string(),
                });
            }
        };

        let outcome = tokio::select! {
            result = self.sign_passes(request, &prepared, &handle.thumbprint) => result,
            _ = &mut shutdown => {
                log::warn!("Interrupted; stopping external tools and restoring payload");
                Err(SignError::Interrupted {
                    phase: "signing".to_string(),
                })
            }
        };

        let cleanup = if handle.imported {
            store.remove(&request.publisher).await
        } else {
            CleanupOutcome::Skipped
        };

        let summary = outcome?;
        Ok(SignReport {
            target: prepared.target,
            thumbprint: handle.thumbprint,
            imported: handle.imported,
            executables_signed: summary.executables_signed,
            manifests_signed: summary.manifests_signed,
            payload_files: summary.payload_files,
            repaired,
            cleanup,
        })
    }

    /// Validate everything and list the invocations a run would make
    ///
    /// Neither the store nor the payload is modified. A bundle is decrypted
    /// into a private temporary directory to derive its fingerprint.
    pub async fn plan(&self, request: &SigningRequest) -> Result<SigningPlan> {
        let prepared = check_preconditions(self.env, request)?;
        let target = &prepared.target;
        let config = &request.config;

        let (thumbprint, imports_certificate) = match &prepared.certificate {
            CertificateSource::Thumbprint(thumbprint) => (thumbprint.clone(), false),
            CertificateSource::Bundle { path, password } => {
                let provisioner = Provisioner::new(self.runner, prepared.tools.openssl.as_deref());
                (provisioner.derive_thumbprint(path, password).await?, true)
            }
        };

        let mut steps = Vec::new();
        if let CertificateSource::Bundle { path, password } = &prepared.certificate {
            steps.push(certutil::import_pfx(&prepared.tools.certutil, path, password));
        }
        steps.extend(
            executable_signatures(config, target, &thumbprint, &prepared.timestamp_url)
                .iter()
                .map(|(_, sign)| sign.invocation(&prepared.tools.signtool)),
        );
        let icon = icon_file(config, target, true);
        steps.extend(
            manifest_updates(request, target, icon, &thumbprint, &prepared.timestamp_url)
                .iter()
                .map(|update| update.invocation(&prepared.tools.mage)),
        );
        if imports_certificate {
            steps.push(certutil::delete(&prepared.tools.certutil, &request.publisher));
        }

        Ok(SigningPlan {
            payload_files: PayloadFileSet::scan(&target.directory, &config.marker)?,
            pending_repair: journal_path(&target.publish_dir).exists(),
            target: prepared.target,
            thumbprint,
            imports_certificate,
            steps,
        })
    }

    async fn sign_passes(
        &self,
        request: &SigningRequest,
        prepared: &PreparedRun,
        thumbprint: &Thumbprint,
    ) -> Result<PassSummary> {
        let executables_signed = self.sign_executables(request, prepared, thumbprint).await?;
        let (manifests_signed, payload_files) = self.sign_manifests(request, prepared, thumbprint).await?;

        Ok(PassSummary {
            executables_signed,
            manifests_signed,
            payload_files,
        })
    }

    async fn sign_executables(
        &self,
        request: &SigningRequest,
        prepared: &PreparedRun,
        thumbprint: &Thumbprint,
    ) -> Result<Vec<PathBuf>> {
        let mut signed = Vec::new();

        for (file, sign) in executable_signatures(&request.config, &prepared.target, thumbprint, &prepared.timestamp_url) {
            let invocation = sign.invocation(&prepared.tools.signtool);
            log::info!("signtool: {}", invocation);
            self.runner.run_checked(&invocation).await?;
            signed.push(file);
        }

        Ok(signed)
    }

    async fn sign_manifests(
        &self,
        request: &SigningRequest,
        prepared: &PreparedRun,
        thumbprint: &Thumbprint,
    ) -> Result<(Vec<PathBuf>, usize)> {
        let target = &prepared.target;
        let config = &request.config;

        let set = PayloadFileSet::strip(
            &target.directory,
            &config.marker,
            vec![target.manifest_file_name(), target.descriptor_file_name()],
            &journal_path(&target.publish_dir),
        )?;
        let guard = MarkerGuard::new(set);
        let payload_files = guard.len();

        let icon = icon_file(config, target, false);
        let mut signed = Vec::new();
        for update in manifest_updates(request, target, icon, thumbprint, &prepared.timestamp_url) {
            let invocation = update.invocation(&prepared.tools.mage);
            log::info!("mage: {}", invocation);
            self.runner.run_checked(&invocation).await?;
            signed.push(update.target().to_path_buf());
        }

        guard.commit()?;
        Ok((signed, payload_files))
    }
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Remove a certificate whose import started before provisioning stopped
async fn discard_partial_import<R: ToolRunner>(
    provisioner: &Provisioner<'_, R>,
    store: &CertificateStore<'_, R>,
    publisher: &str,
) {
    if provisioner.import_started() {
        log::warn!("Removing certificate imported before provisioning stopped");
        store.remove(publisher).await;
    }
}

/// signtool calls for the launcher and the deployed executable, in order
fn executable_signatures(
    config: &SigningConfig,
    target: &ResolvedTarget,
    thumbprint: &Thumbprint,
    timestamp_url: &str,
) -> Vec<(PathBuf, SigntoolSign)> {
    [target.launcher(&config.launcher), target.deployed_executable(&config.marker)]
        .into_iter()
        .map(|file| {
            let sign = SigntoolSign::new(thumbprint.clone(), timestamp_url)
                .verbose(config.verbose_tools)
                .file(&file);
            (file, sign)
        })
        .collect()
}

/// Icon reference for the application manifest
///
/// An explicitly configured icon is always passed. The default
/// `<Project>.ico` is passed only when the payload contains it; `planning`
/// also accepts the still-marked name.
fn icon_file(config: &SigningConfig, target: &ResolvedTarget, planning: bool) -> Option<String> {
    if let Some(icon) = &config.icon_file {
        return Some(icon.clone());
    }

    let default = format!("{}.ico", target.project);
    let present = target.directory.join(&default).is_file()
        || (planning && marked(&target.directory.join(&default), &config.marker).is_file());
    if present {
        Some(default)
    } else {
        log::warn!(
            "No {} in {}; the application manifest will carry no icon",
            default,
            target.directory.display()
        );
        None
    }
}

fn marked(path: &Path, marker: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(marker);
    PathBuf::from(name)
}

/// mage calls in order: application manifest, versioned descriptor, then the
/// top-level descriptor when it exists
fn manifest_updates(
    request: &SigningRequest,
    target: &ResolvedTarget,
    icon_file: Option<String>,
    thumbprint: &Thumbprint,
    timestamp_url: &str,
) -> Vec<MageUpdate> {
    let mut updates = vec![
        MageUpdate::new(
            target.manifest(),
            ManifestUpdate::Application {
                from_directory: target.directory.clone(),
                icon_file,
            },
            thumbprint.clone(),
            timestamp_url,
        ),
        MageUpdate::new(
            target.descriptor(),
            ManifestUpdate::Deployment {
                app_manifest: target.manifest(),
                app_code_base: None,
                publisher: request.publisher.clone(),
            },
            thumbprint.clone(),
            timestamp_url,
        ),
    ];

    let top_level = target.top_level_descriptor();
    if request.config.update_top_level_descriptor && top_level.is_file() {
        updates.push(MageUpdate::new(
            top_level,
            ManifestUpdate::Deployment {
                app_manifest: target.manifest(),
                app_code_base: Some(target.manifest_code_base()),
                publisher: request.publisher.clone(),
            },
            thumbprint.clone(),
            timestamp_url,
        ));
    }

    updates
}

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use kodegen_bundler_clickonce::certificate::Thumbprint;
use kodegen_bundler_clickonce::signing::{CertificateInput, SigningRequest, ToolOverrides};
use kodegen_bundler_clickonce::tools::ToolKind;
use kodegen_bundler_clickonce::{Result, ToolInvocation, ToolOutput, ToolRunner};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;

/// DER bytes the fake openssl "extracts" from any bundle
pub const FAKE_DER: &[u8] = b"fake leaf certificate";

pub const STORE_THUMBPRINT: &str = "0123456789ABCDEF0123456789ABCDEF01234567";

/// Fingerprint the fake openssl output hashes to
pub fn bundle_thumbprint() -> Thumbprint {
    Thumbprint::from_der(FAKE_DER)
}

fn fake_pem() -> String {
    format!(
        "Bag Attributes\n    localKeyID: 01 02 03\nsubject=CN=Contoso\n-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
        STANDARD.encode(FAKE_DER)
    )
}

/// A call the runner saw, with a filesystem probe taken at call time
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub invocation: ToolInvocation,
    pub probe_existed: Option<bool>,
}

/// Records every invocation and answers like the real tools would
///
/// openssl writes its `-out` file, certutil keeps an in-memory store and
/// signtool/mage succeed unless told to fail.
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    store: Mutex<HashSet<String>>,
    import_adds: Mutex<Option<String>>,
    fail: Mutex<Vec<(ToolKind, String)>>,
    probe: Option<PathBuf>,
    interrupt_at: Option<ToolKind>,
    interrupted: AtomicBool,
    interrupt: Arc<Notify>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            store: Mutex::new(HashSet::new()),
            import_adds: Mutex::new(Some(bundle_thumbprint().to_string())),
            fail: Mutex::new(Vec::new()),
            probe: None,
            interrupt_at: None,
            interrupted: AtomicBool::new(false),
            interrupt: Arc::new(Notify::new()),
        }
    }

    /// Pretend `thumbprint` is already in the personal store
    pub fn with_stored(self, thumbprint: &str) -> Self {
        self.store.lock().unwrap().insert(thumbprint.to_string());
        self
    }

    /// Make an import succeed without the certificate showing up
    pub fn with_invisible_import(self) -> Self {
        *self.import_adds.lock().unwrap() = None;
        self
    }

    /// Fail calls of `kind` whose arguments contain `needle`
    pub fn failing(self, kind: ToolKind, needle: &str) -> Self {
        self.fail.lock().unwrap().push((kind, needle.to_string()));
        self
    }

    /// Record whether `path` exists at the time of each call
    pub fn probing(mut self, path: PathBuf) -> Self {
        self.probe = Some(path);
        self
    }

    /// On the first call of `kind`, fire [`RecordingRunner::shutdown`] and
    /// never return, like a tool still running when Ctrl-C arrives
    pub fn interrupting_at(mut self, kind: ToolKind) -> Self {
        self.interrupt_at = Some(kind);
        self
    }

    /// Shutdown signal for `Orchestrator::run_until`
    pub fn shutdown(&self) -> impl Future<Output = ()> + use<> {
        let interrupt = Arc::clone(&self.interrupt);
        async move { interrupt.notified().await }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: ToolKind) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.invocation.kind() == kind)
            .collect()
    }

    pub fn stored(&self, thumbprint: &str) -> bool {
        self.store.lock().unwrap().contains(thumbprint)
    }

    fn should_fail(&self, invocation: &ToolInvocation) -> bool {
        let rendered = invocation.to_string();
        self.fail
            .lock()
            .unwrap()
            .iter()
            .any(|(kind, needle)| *kind == invocation.kind() && rendered.contains(needle.as_str()))
    }
}

impl ToolRunner for RecordingRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            invocation: invocation.clone(),
            probe_existed: self.probe.as_ref().map(|p| p.exists()),
        });

        if self.interrupt_at == Some(invocation.kind()) && !self.interrupted.swap(true, Ordering::SeqCst) {
            self.interrupt.notify_one();
            std::future::pending::<()>().await;
        }

        if self.should_fail(invocation) {
            return Ok(ToolOutput::failed(1, "simulated failure"));
        }

        match invocation.kind() {
            ToolKind::OpenSsl => {
                if let Some(out) = invocation.value_of("-out") {
                    let contents = if invocation.has_arg("-export") {
                        b"re-encoded pfx".to_vec()
                    } else {
                        fake_pem().into_bytes()
                    };
                    fs::write(out, contents)?;
                }
                Ok(ToolOutput::ok(""))
            }
            ToolKind::CertUtil => {
                let mut store = self.store.lock().unwrap();
                if invocation.has_arg("-importpfx") {
                    if let Some(thumbprint) = self.import_adds.lock().unwrap().clone() {
                        store.insert(thumbprint);
                    }
                    Ok(ToolOutput::ok("CertUtil: -importPFX command completed successfully."))
                } else if invocation.has_arg("-store") {
                    let wanted = invocation.value_of("My").and_then(|v| v.to_str()).unwrap_or_default();
                    if store.contains(wanted) {
                        Ok(ToolOutput::ok("CertUtil: -store command completed successfully."))
                    } else {
                        Ok(ToolOutput::failed(-2146885628, "Cannot find object or property."))
                    }
                } else if invocation.has_arg("-delstore") {
                    store.remove(&bundle_thumbprint().to_string());
                    Ok(ToolOutput::ok("CertUtil: -delstore command completed successfully."))
                } else {
                    Ok(ToolOutput::ok(""))
                }
            }
            ToolKind::SignTool | ToolKind::Mage => Ok(ToolOutput::ok("Done")),
        }
    }
}

/// A scratch publish tree with fake tool executables next to it
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// `publish/` with `setup.exe`, a top-level descriptor and one payload
    /// folder `App_1_0_0_1` holding marked files
    pub fn new() -> Self {
        let fixture = Self {
            dir: tempfile::tempdir().expect("tempdir"),
        };
        fs::create_dir_all(fixture.tools_dir()).expect("mkdir tools");
        for tool in ["signtool.exe", "mage.exe", "openssl.exe", "certutil.exe"] {
            fs::write(fixture.tools_dir().join(tool), b"").expect("write tool stub");
        }

        fixture.write("setup.exe", b"MZ");
        fixture.write("App.application", b"<assembly/>");
        fixture.payload_file("App.exe.deploy");
        fixture.payload_file("App.dll.deploy");
        fixture.payload_file("App.ico.deploy");
        fixture.payload_file("de/App.resources.dll.deploy");
        fixture.payload_file("App.exe.manifest");
        fixture.payload_file("App.application");
        fixture
    }

    pub fn publish_dir(&self) -> PathBuf {
        self.dir.path().join("publish")
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.dir.path().join("tools")
    }

    pub fn payload_dir(&self) -> PathBuf {
        self.publish_dir().join("Application Files").join("App_1_0_0_1")
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.publish_dir().join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    pub fn payload_file(&self, relative: &str) {
        self.write(&format!("Application Files/App_1_0_0_1/{relative}"), relative.as_bytes());
    }

    /// Request signing with a certificate already in the store
    pub fn thumbprint_request(&self) -> SigningRequest {
        let mut request = SigningRequest::new("App", self.publish_dir(), "Contoso");
        request.certificate = CertificateInput {
            thumbprint: Some(STORE_THUMBPRINT.to_lowercase()),
            ..Default::default()
        };
        request.tools = self.tool_overrides();
        request
    }

    /// Request signing with a bundle imported for the run
    pub fn bundle_request(&self) -> SigningRequest {
        let pfx = self.dir.path().join("cert.pfx");
        fs::write(&pfx, b"pkcs12").expect("write pfx");

        let mut request = SigningRequest::new("App", self.publish_dir(), "Contoso");
        request.certificate = CertificateInput {
            bundle: Some(pfx),
            password: Some("s3cret".to_string()),
            thumbprint: None,
        };
        request.tools = self.tool_overrides();
        request
    }

    fn tool_overrides(&self) -> ToolOverrides {
        ToolOverrides {
            signtool: Some(self.tools_dir().join("signtool.exe")),
            mage: Some(self.tools_dir().join("mage.exe")),
            openssl: Some(self.tools_dir().join("openssl.exe")),
            certutil: Some(self.tools_dir().join("certutil.exe")),
        }
    }
}

/// Every file below `root`, relative and sorted
pub fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    files.sort();
    files
}

//! Typed command lines for external tools.
//!
//! Arguments are kept as a structured list and handed to the process API
//! one by one, so nothing is ever re-parsed by a shell. Secret arguments are
//! redacted whenever a command line is rendered for logs or dry runs.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// External tools the orchestrator drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Authenticode signing tool (`signtool.exe`)
    SignTool,
    /// Manifest generation and signing tool (`mage.exe`)
    Mage,
    /// Crypto toolkit used for PKCS#12 re-encoding (`openssl`)
    OpenSsl,
    /// Certificate store utility (`certutil.exe`)
    CertUtil,
}

impl ToolKind {
    /// Human-readable tool name
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SignTool => "signtool",
            ToolKind::Mage => "mage",
            ToolKind::OpenSsl => "openssl",
            ToolKind::CertUtil => "certutil",
        }
    }

    /// Executable file names searched for on PATH
    pub fn executable_names(&self) -> &'static [&'static str] {
        match self {
            ToolKind::SignTool => &["signtool.exe", "signtool"],
            ToolKind::Mage => &["mage.exe", "mage"],
            ToolKind::OpenSsl => &["openssl.exe", "openssl"],
            ToolKind::CertUtil => &["certutil.exe", "certutil"],
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single command-line argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolArg {
    /// Argument that may be shown in logs
    Plain(OsString),
    /// Argument that must never be rendered (passwords)
    Secret(OsString),
}

impl ToolArg {
    /// Raw value passed to the process
    pub fn as_os_str(&self) -> &OsStr {
        match self {
            ToolArg::Plain(value) | ToolArg::Secret(value) => value,
        }
    }

    /// Whether the value is redacted when rendered
    pub fn is_secret(&self) -> bool {
        matches!(self, ToolArg::Secret(_))
    }

    /// Value as it appears in logs
    pub fn rendered(&self) -> String {
        match self {
            ToolArg::Plain(value) => value.to_string_lossy().into_owned(),
            ToolArg::Secret(_) => "********".to_string(),
        }
    }
}

/// A fully specified external tool call
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    kind: ToolKind,
    program: PathBuf,
    args: Vec<ToolArg>,
    envs: Vec<(String, String)>,
}

impl ToolInvocation {
    /// Start an invocation of `program`
    pub fn new(kind: ToolKind, program: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append a plain argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(ToolArg::Plain(arg.into()));
        self
    }

    /// Append a path argument
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        self.arg(path.as_ref().as_os_str().to_os_string())
    }

    /// Append an argument that is redacted in logs
    pub fn secret_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(ToolArg::Secret(arg.into()));
        self
    }

    /// Set an environment variable for the child only; values are never rendered
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Tool being invoked
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Executable path
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Structured argument list
    pub fn args(&self) -> &[ToolArg] {
        &self.args
    }

    /// Child environment additions
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Arguments as they appear in logs
    pub fn rendered_args(&self) -> Vec<String> {
        self.args.iter().map(ToolArg::rendered).collect()
    }

    /// Whether any argument equals `value` (secrets included)
    pub fn has_arg(&self, value: &str) -> bool {
        self.args.iter().any(|a| a.as_os_str() == OsStr::new(value))
    }

    /// The argument following the first occurrence of `flag`
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        let pos = self
            .args
            .iter()
            .position(|a| a.as_os_str().eq_ignore_ascii_case(flag))?;
        self.args.get(pos + 1).map(ToolArg::as_os_str)
    }
}

fn quote(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.display().to_string()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.rendered()))?;
        }
        Ok(())
    }
}

/// Captured result of a finished tool process
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the tool exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last few lines of diagnostic output, for error messages
    pub fn diagnostic_tail(&self, max_lines: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_arguments_are_redacted() {
        let inv = ToolInvocation::new(ToolKind::CertUtil, "certutil.exe")
            .arg("-p")
            .secret_arg("hunter2")
            .arg("-importpfx");

        let rendered = inv.to_string();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("********"));
        assert!(inv.has_arg("hunter2"));
    }

    #[test]
    fn test_arguments_with_spaces_are_quoted_for_display_only() {
        let inv = ToolInvocation::new(ToolKind::Mage, r"C:\Program Files\mage.exe")
            .path_arg(r"C:\publish\Application Files\App_1_0_0_1\App.exe.manifest");

        assert_eq!(
            inv.to_string(),
            r#""C:\Program Files\mage.exe" "C:\publish\Application Files\App_1_0_0_1\App.exe.manifest""#
        );
        // The process receives the raw value, one argument per element
        assert_eq!(inv.args().len(), 1);
        assert!(!inv.args()[0].as_os_str().to_string_lossy().starts_with('"'));
    }

    #[test]
    fn test_value_of_is_case_insensitive() {
        let inv = ToolInvocation::new(ToolKind::SignTool, "signtool")
            .arg("/FD")
            .arg("SHA256");
        assert_eq!(inv.value_of("/fd"), Some(OsStr::new("SHA256")));
        assert_eq!(inv.value_of("/td"), None);
    }

    #[test]
    fn test_diagnostic_tail_prefers_stderr() {
        let out = ToolOutput {
            code: Some(1),
            stdout: "Done Adding Additional Store\n".to_string(),
            stderr: "line1\n\nline2\nline3\n".to_string(),
        };
        assert_eq!(out.diagnostic_tail(2), "line2 | line3");
        assert!(!out.success());
    }
}

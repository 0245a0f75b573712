//! Discovery of external tool executables.
//!
//! An explicitly configured path is authoritative. Without one, the usual
//! SDK install locations are probed, newest SDK first, then `PATH`.

use super::invocation::ToolKind;
use std::path::{Path, PathBuf};

const PROGRAM_FILES_X86: &str = r"C:\Program Files (x86)";
const PROGRAM_FILES: &str = r"C:\Program Files";
const SYSTEM_ROOT: &str = r"C:\Windows";

/// NETFX tool folders shipped by the .NET Framework developer packs, newest first
const NETFX_TOOLS: &[&str] = &[
    "NETFX 4.8.1 Tools",
    "NETFX 4.8 Tools",
    "NETFX 4.7.2 Tools",
    "NETFX 4.7.1 Tools",
    "NETFX 4.6.2 Tools",
];

/// Outcome of a tool lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// The executable that will be run
    Found(PathBuf),
    /// Nothing usable; every location that was tried
    NotFound(Vec<PathBuf>),
}

/// Find `kind`, honoring an explicit path when one is configured
pub fn locate_tool(kind: ToolKind, configured: Option<&Path>) -> Located {
    if let Some(path) = configured {
        return if path.is_file() {
            log::debug!("Using configured {}: {}", kind, path.display());
            Located::Found(path.to_path_buf())
        } else {
            Located::NotFound(vec![path.to_path_buf()])
        };
    }

    let mut checked = Vec::new();
    for candidate in default_locations(kind) {
        if candidate.is_file() {
            log::debug!("Found {} at default location {}", kind, candidate.display());
            return Located::Found(candidate);
        }
        checked.push(candidate);
    }

    for name in kind.executable_names() {
        if let Ok(path) = which::which(name) {
            log::debug!("Found {} on PATH: {}", kind, path.display());
            return Located::Found(path);
        }
    }

    Located::NotFound(checked)
}

fn env_dir(var: &str, fallback: &str) -> PathBuf {
    std::env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(fallback))
}

/// Fixed install locations for each tool, most preferred first
pub fn default_locations(kind: ToolKind) -> Vec<PathBuf> {
    match kind {
        ToolKind::SignTool => signtool_locations(&env_dir("ProgramFiles(x86)", PROGRAM_FILES_X86)),
        ToolKind::Mage => {
            let sdk = env_dir("ProgramFiles(x86)", PROGRAM_FILES_X86)
                .join("Microsoft SDKs")
                .join("Windows")
                .join("v10.0A")
                .join("bin");
            NETFX_TOOLS
                .iter()
                .map(|tools| sdk.join(tools).join("mage.exe"))
                .collect()
        }
        ToolKind::OpenSsl => {
            let program_files = env_dir("ProgramFiles", PROGRAM_FILES);
            vec![
                program_files.join("OpenSSL-Win64").join("bin").join("openssl.exe"),
                program_files
                    .join("Git")
                    .join("usr")
                    .join("bin")
                    .join("openssl.exe"),
            ]
        }
        ToolKind::CertUtil => vec![
            env_dir("SystemRoot", SYSTEM_ROOT)
                .join("System32")
                .join("certutil.exe"),
        ],
    }
}

/// signtool lives under a versioned Windows 10/11 SDK folder; newest version wins
fn signtool_locations(program_files_x86: &Path) -> Vec<PathBuf> {
    let kit_bin = program_files_x86
        .join("Windows Kits")
        .join("10")
        .join("bin");
    let arch = if cfg!(target_arch = "aarch64") { "arm64" } else { "x64" };

    let mut versions: Vec<String> = std::fs::read_dir(&kit_bin)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|name| name.starts_with("10."))
                .collect()
        })
        .unwrap_or_default();
    versions.sort_by_key(|v| std::cmp::Reverse(sdk_version_key(v)));

    let mut locations: Vec<PathBuf> = versions
        .iter()
        .map(|v| kit_bin.join(v).join(arch).join("signtool.exe"))
        .collect();
    locations.push(kit_bin.join(arch).join("signtool.exe"));
    locations
}

/// Numeric key for SDK folder names such as `10.0.22621.0`
fn sdk_version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_is_authoritative() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("signtool.exe");

        assert_eq!(
            locate_tool(ToolKind::SignTool, Some(&missing)),
            Located::NotFound(vec![missing.clone()])
        );

        std::fs::write(&missing, b"").expect("write fake tool");
        assert_eq!(
            locate_tool(ToolKind::SignTool, Some(&missing)),
            Located::Found(missing)
        );
    }

    #[test]
    fn test_configured_directory_is_not_a_tool() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            locate_tool(ToolKind::Mage, Some(dir.path())),
            Located::NotFound(_)
        ));
    }

    #[test]
    fn test_signtool_prefers_newest_sdk() {
        let root = tempfile::tempdir().expect("tempdir");
        let bin = root.path().join("Windows Kits").join("10").join("bin");
        for v in ["10.0.17763.0", "10.0.22621.0", "10.0.9600.0"] {
            std::fs::create_dir_all(bin.join(v)).expect("mkdir");
        }

        let locations = signtool_locations(root.path());
        assert!(locations[0].starts_with(bin.join("10.0.22621.0")));
        assert!(locations[1].starts_with(bin.join("10.0.17763.0")));
        assert!(locations[2].starts_with(bin.join("10.0.9600.0")));
        // Unversioned fallback comes last
        assert_eq!(locations.len(), 4);
    }

    #[test]
    fn test_mage_locations_cover_netfx_packs() {
        let locations = default_locations(ToolKind::Mage);
        assert_eq!(locations.len(), NETFX_TOOLS.len());
        assert!(locations.iter().all(|p| p.ends_with("mage.exe")));
    }
}

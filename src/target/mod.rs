//! Resolution of the versioned ClickOnce payload folder.
//!
//! A ClickOnce publish tree looks like:
//!
//! ```text
//! publish/
//!   setup.exe
//!   MyApp.application
//!   Application Files/
//!     MyApp_1_0_0_1/
//!       MyApp.exe.deploy
//!       MyApp.exe.manifest
//!       MyApp.application
//!     MyApp_1_0_0_2/
//! ```
//!
//! The folder picked is the first match of `<Project>_*` in *descending plain
//! string order*. That is not a version comparison: `MyApp_1.0.0.2` sorts
//! above `MyApp_1.0.0.10`.

use crate::error::{PreconditionError, Result};
use std::path::{Path, PathBuf};

/// Name of the folder holding the versioned payloads
pub const APPLICATION_FILES_DIR: &str = "Application Files";

/// The concrete payload folder a run signs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Project name the folder was matched against
    pub project: String,
    /// Publish root
    pub publish_dir: PathBuf,
    /// `<publish>/Application Files`
    pub application_files: PathBuf,
    /// The selected `<Project>_<version>` folder
    pub directory: PathBuf,
    /// File name of [`ResolvedTarget::directory`]
    pub folder_name: String,
}

impl ResolvedTarget {
    /// Installer launcher in the publish root
    pub fn launcher(&self, launcher_name: &str) -> PathBuf {
        self.publish_dir.join(launcher_name)
    }

    /// The deployed primary executable, still carrying the marker extension
    pub fn deployed_executable(&self, marker: &str) -> PathBuf {
        self.directory.join(format!("{}.exe{}", self.project, marker))
    }

    /// Application manifest inside the payload folder
    pub fn manifest(&self) -> PathBuf {
        self.directory.join(self.manifest_file_name())
    }

    /// Deployment descriptor inside the payload folder
    pub fn descriptor(&self) -> PathBuf {
        self.directory.join(self.descriptor_file_name())
    }

    /// Deployment descriptor in the publish root, read by the bootstrapper
    pub fn top_level_descriptor(&self) -> PathBuf {
        self.publish_dir.join(self.descriptor_file_name())
    }

    /// `<Project>.exe.manifest`
    pub fn manifest_file_name(&self) -> String {
        format!("{}.exe.manifest", self.project)
    }

    /// `<Project>.application`
    pub fn descriptor_file_name(&self) -> String {
        format!("{}.application", self.project)
    }

    /// Manifest location relative to the publish root, in ClickOnce's
    /// backslash-separated code base form
    pub fn manifest_code_base(&self) -> String {
        format!(
            "{}\\{}\\{}",
            APPLICATION_FILES_DIR,
            self.folder_name,
            self.manifest_file_name()
        )
    }
}

/// Locate the payload folder for `project` under `publish_dir`
pub fn resolve_target(publish_dir: &Path, project: &str) -> Result<ResolvedTarget> {
    let application_files = publish_dir.join(APPLICATION_FILES_DIR);
    if !application_files.is_dir() {
        return Err(PreconditionError::ApplicationFilesMissing {
            path: application_files,
        }
        .into());
    }

    let prefix = format!("{project}_");
    let mut candidates: Vec<String> = std::fs::read_dir(&application_files)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| matches_project(name, &prefix))
        .collect();

    log::debug!(
        "Versioned folders matching '{}*': {:?}",
        prefix,
        candidates
    );

    let folder_name = select_newest(&mut candidates).ok_or_else(|| {
        PreconditionError::NoVersionedTarget {
            pattern: format!("{prefix}*"),
            path: application_files.clone(),
        }
    })?;

    if candidates.len() > 1 {
        log::info!(
            "{} versioned folders found; selected '{}' by descending name order",
            candidates.len(),
            folder_name
        );
    }

    Ok(ResolvedTarget {
        project: project.to_string(),
        publish_dir: publish_dir.to_path_buf(),
        directory: application_files.join(&folder_name),
        application_files,
        folder_name,
    })
}

/// Windows file names compare case-insensitively, so the prefix does too
fn matches_project(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len()
        && name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Sort descending by plain string order and take the first
fn select_newest(candidates: &mut [String]) -> Option<String> {
    candidates.sort_by(|a, b| b.cmp(a));
    candidates.first().cloned()
}

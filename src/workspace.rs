//! Workspace layout and cleanup.
//!
//! The workspace is the plugin repository checkout. Downloaded payloads live
//! in two well-known directories that are wiped before every fetch.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{BuildError, Result};
use crate::tool_args::is_dry_run;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

/// Directories removed by [`Workspace::clean`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final component of the root, used to name the package directory.
    ///
    /// Falls back to the canonical path when the root is `.` or similar.
    pub fn name(&self) -> Result<String> {
        let named = match self.root.file_name() {
            Some(name) => Some(name.to_os_string()),
            None => fs::canonicalize(&self.root)?
                .file_name()
                .map(|n| n.to_os_string()),
        };
        named
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BuildError::validation(format!(
                    "workspace {} has no directory name",
                    self.root.display()
                ))
            })
    }

    /// `<root>/Content`
    pub fn content_dir(&self) -> PathBuf {
        self.root.join("Content")
    }

    /// `<root>/Source/ThirdParty`
    pub fn thirdparty_dir(&self) -> PathBuf {
        self.root.join("Source").join("ThirdParty")
    }

    /// `<root>/<output_dir>/<workspace name>`
    pub fn output_dir(&self, config: &PipelineConfig) -> Result<PathBuf> {
        Ok(self.root.join(&config.output_dir).join(self.name()?))
    }

    /// Resolve a workspace-relative path from the configuration.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Remove the content and third-party payload directories.
    ///
    /// Missing directories are skipped. The output directory is never
    /// touched.
    pub fn clean(&self) -> Result<CleanReport> {
        let mut report = CleanReport::default();
        for dir in [self.content_dir(), self.thirdparty_dir()] {
            if !dir.exists() {
                debug!("{} not present, nothing to remove", dir.display());
                continue;
            }
            if is_dry_run() {
                info!("[DRY RUN] Would remove {}", dir.display());
            } else {
                info!("Removing {}", dir.display());
                fs::remove_dir_all(&dir)?;
            }
            report.removed.push(dir);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout() {
        let ws = Workspace::new("/work/MyPlugin");
        assert_eq!(ws.content_dir(), PathBuf::from("/work/MyPlugin/Content"));
        assert_eq!(
            ws.thirdparty_dir(),
            PathBuf::from("/work/MyPlugin/Source/ThirdParty")
        );
        assert_eq!(ws.name().unwrap(), "MyPlugin");
        assert_eq!(
            ws.output_dir(&PipelineConfig::default()).unwrap(),
            PathBuf::from("/work/MyPlugin/Output/MyPlugin")
        );
    }

    #[test]
    fn test_name_of_dot_uses_canonical_path() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().join("."));
        let expected = fs::canonicalize(dir.path())
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert_eq!(ws.name().unwrap(), expected);
    }

    #[test]
    fn test_clean_keeps_rest_of_source() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let module = dir.path().join("Source/Convai/Convai.Build.cs");
        fs::create_dir_all(module.parent().unwrap()).unwrap();
        fs::write(&module, "// module").unwrap();
        fs::create_dir_all(ws.thirdparty_dir().join("gRPC")).unwrap();

        let report = ws.clean().unwrap();
        assert_eq!(report.removed, vec![ws.thirdparty_dir()]);
        assert!(module.exists());
        assert!(!ws.thirdparty_dir().exists());
    }
}

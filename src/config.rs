//! Pipeline configuration.
//!
//! Defaults reproduce the stock pipeline for the Convai plugin: two archives
//! on Google Drive, `-Rocket -Marketplace`, packages under `Output/`. A JSON
//! file can override any field; missing fields keep their defaults.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::fetch::{DriveFileId, DRIVE_DOWNLOAD_URL};

/// File name looked up in the workspace root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "uplugin-build.json";

/// One remote archive and where it is unpacked, relative to the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSource {
    pub file_id: DriveFileId,
    pub extract_to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Archive holding the top-level `Content/` directory
    pub content_archive: ArchiveSource,
    /// Archive holding `ThirdParty/`, unpacked under `Source/`
    pub thirdparty_archive: ArchiveSource,
    /// Flags passed to `BuildPlugin` before any caller-supplied ones
    pub package_flags: Vec<String>,
    /// Packages land in `<workspace>/<output_dir>/<workspace name>`
    pub output_dir: PathBuf,
    /// Drive download endpoint
    pub download_url: String,
    pub download_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content_archive: ArchiveSource {
                file_id: DriveFileId::new_unchecked("1-sWOJ8amM425eoZDhnZ_1FEVdhXajI7L"),
                extract_to: PathBuf::from("."),
            },
            thirdparty_archive: ArchiveSource {
                file_id: DriveFileId::new_unchecked("1qqrJXv62dz9MOsL9fMbL-E_RT5DhwB97"),
                extract_to: PathBuf::from("Source"),
            },
            package_flags: vec!["-Rocket".to_string(), "-Marketplace".to_string()],
            output_dir: PathBuf::from("Output"),
            download_url: DRIVE_DOWNLOAD_URL.to_string(),
            download_timeout_secs: 600,
        }
    }
}

impl PipelineConfig {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| {
            BuildError::config(format!(
                "failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            BuildError::config(format!("failed to read {}: {}", path.as_ref().display(), e))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Resolve the configuration for a run.
    ///
    /// An explicit path must exist. Otherwise `uplugin-build.json` in the
    /// workspace is used when present, and the defaults when not.
    pub fn resolve(explicit: Option<&Path>, workspace_root: &Path) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let candidate = workspace_root.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    info!("Loading configuration from {}", candidate.display());
                    Self::load_from_file(&candidate)?
                } else {
                    debug!("No {} in workspace, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, source) in [
            ("content_archive", &self.content_archive),
            ("thirdparty_archive", &self.thirdparty_archive),
        ] {
            source.file_id.validate()?;
            ensure_contained(&source.extract_to)
                .map_err(|e| BuildError::validation(format!("{}.extract_to: {}", name, e)))?;
        }

        ensure_contained(&self.output_dir)
            .map_err(|e| BuildError::validation(format!("output_dir: {}", e)))?;
        if self.output_dir.components().all(|c| c == Component::CurDir) {
            return Err(BuildError::validation(
                "output_dir must name a directory inside the workspace",
            ));
        }

        if !(self.download_url.starts_with("https://") || self.download_url.starts_with("http://"))
        {
            return Err(BuildError::validation(format!(
                "download_url '{}' must be an http(s) URL",
                self.download_url
            )));
        }

        if self.download_timeout_secs == 0 {
            return Err(BuildError::validation(
                "download_timeout_secs must be greater than zero",
            ));
        }

        if let Some(flag) = self.package_flags.iter().find(|f| f.trim().is_empty()) {
            return Err(BuildError::validation(format!(
                "package_flags contains an empty flag: {:?}",
                flag
            )));
        }
        Ok(())
    }
}

/// Relative path that stays inside its base directory
fn ensure_contained(path: &Path) -> std::result::Result<(), String> {
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("'{}' must not contain '..'", path.display()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("'{}' must be relative", path.display()));
            }
        }
    }
    Ok(())
}

//! Plugin packaging with the engine's Automation Tool.
//!
//! Finds the `.uplugin` descriptor in the workspace and runs
//! `RunUAT BuildPlugin` against it. The tool's own output goes straight to
//! the terminal; only its exit code is inspected.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::PipelineConfig;
use crate::error::{BuildError, Result};
use crate::tool_args::{is_dry_run, OutputMode, ToolArgs};
use crate::tool_runner::run_tool;
use crate::workspace::Workspace;

const DESCRIPTOR_EXTENSION: &str = "uplugin";

/// Path of the Automation Tool entry point inside an engine installation.
pub fn uat_script(engine_dir: &Path) -> PathBuf {
    let script = if cfg!(windows) { "RunUAT.bat" } else { "RunUAT.sh" };
    engine_dir
        .join("Engine")
        .join("Build")
        .join("BatchFiles")
        .join(script)
}

fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DESCRIPTOR_EXTENSION))
}

/// Find the plugin descriptor under `root`.
///
/// Directories named in `skip` (relative to `root`) and `.git` are not
/// descended into, so packaged copies under the output directory are never
/// picked up. When several descriptors exist the first in file-name order
/// wins.
pub fn find_plugin_descriptor(root: &Path, skip: &[PathBuf]) -> Result<PathBuf> {
    let skipped: Vec<PathBuf> = skip.iter().map(|p| root.join(p)).collect();
    let keep = |entry: &DirEntry| {
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_dir() {
            entry.file_name() != ".git" && !skipped.iter().any(|s| s == entry.path())
        } else {
            true
        }
    };

    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(keep)
    {
        let entry = entry.map_err(|e| {
            BuildError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("filesystem loop while searching for descriptor")
            }))
        })?;
        if entry.file_type().is_file() && is_descriptor(entry.path()) {
            found.push(entry.into_path());
        }
    }

    let mut found = found.into_iter();
    let first = found
        .next()
        .ok_or_else(|| BuildError::DescriptorNotFound(root.to_path_buf()))?;
    for other in found {
        warn!("Ignoring additional plugin descriptor {}", other.display());
    }
    Ok(first)
}

/// `RunUAT BuildPlugin` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCommand {
    pub uat_script: PathBuf,
    /// Absolute path to the `.uplugin` file
    pub plugin: PathBuf,
    /// Absolute path to the package output directory
    pub package_dir: PathBuf,
    pub package_flags: Vec<String>,
    pub extra_flags: Vec<String>,
}

impl ToolArgs for PackageCommand {
    fn program(&self) -> OsString {
        self.uat_script.clone().into_os_string()
    }

    fn to_cli_args(&self) -> Vec<OsString> {
        let mut plugin = OsString::from("-Plugin=");
        plugin.push(&self.plugin);
        let mut package = OsString::from("-Package=");
        package.push(&self.package_dir);

        let mut args = vec![OsString::from("BuildPlugin"), plugin, package];
        args.extend(self.package_flags.iter().map(OsString::from));
        args.extend(self.extra_flags.iter().map(OsString::from));
        args
    }

    fn describe(&self) -> String {
        "RunUAT BuildPlugin".to_string()
    }
}

/// Result of a successful packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub descriptor: PathBuf,
    pub package_dir: PathBuf,
}

/// Package the plugin in `workspace` with the engine at `engine_dir`.
pub fn build_plugin(
    engine_dir: &Path,
    workspace: &Workspace,
    config: &PipelineConfig,
    extra_flags: &[String],
) -> Result<BuildArtifact> {
    let descriptor = find_plugin_descriptor(workspace.root(), &[config.output_dir.clone()])?;
    let descriptor = std::path::absolute(&descriptor)?;
    println!("Building Plugin: {}", descriptor.display());

    let package_dir = std::path::absolute(workspace.output_dir(config)?)?;
    if !is_dry_run() {
        fs::create_dir_all(&package_dir)?;
    }

    let command = PackageCommand {
        uat_script: uat_script(engine_dir),
        plugin: descriptor.clone(),
        package_dir: package_dir.clone(),
        package_flags: config.package_flags.clone(),
        extra_flags: extra_flags.to_vec(),
    };
    let output = run_tool(&command, OutputMode::Inherit)?;
    if !output.success {
        return Err(BuildError::Packaging { code: output.exit_code });
    }

    info!("Plugin packaged into {}", package_dir.display());
    Ok(BuildArtifact { descriptor, package_dir })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_descriptor() {
        assert!(is_descriptor(Path::new("Convai.uplugin")));
        assert!(is_descriptor(Path::new("a/B.UPLUGIN")));
        assert!(!is_descriptor(Path::new("Convai.uproject")));
        assert!(!is_descriptor(Path::new("uplugin")));
    }

    #[test]
    fn test_uat_script_location() {
        let script = uat_script(Path::new("/opt/UE_5.3"));
        assert!(script.starts_with("/opt/UE_5.3/Engine/Build/BatchFiles"));
        let name = script.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name == "RunUAT.sh" || name == "RunUAT.bat");
    }

    #[test]
    fn test_package_command_args() {
        let cmd = PackageCommand {
            uat_script: PathBuf::from("/ue/Engine/Build/BatchFiles/RunUAT.sh"),
            plugin: PathBuf::from("/w/Convai.uplugin"),
            package_dir: PathBuf::from("/w/Output/w"),
            package_flags: vec!["-Rocket".into(), "-Marketplace".into()],
            extra_flags: vec!["-TargetPlatforms=Win64".into()],
        };
        let args: Vec<String> = cmd
            .to_cli_args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "BuildPlugin",
                "-Plugin=/w/Convai.uplugin",
                "-Package=/w/Output/w",
                "-Rocket",
                "-Marketplace",
                "-TargetPlatforms=Win64",
            ]
        );
    }

    #[test]
    fn test_find_skips_output_and_git() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Output/Plugin")).unwrap();
        fs::write(root.join("Output/Plugin/AAA.uplugin"), "{}").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/A.uplugin"), "{}").unwrap();
        fs::write(root.join("Convai.uplugin"), "{}").unwrap();

        let found = find_plugin_descriptor(root, &[PathBuf::from("Output")]).unwrap();
        assert_eq!(found, root.join("Convai.uplugin"));
    }

    #[test]
    fn test_find_first_in_name_order() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/Second.uplugin"), "{}").unwrap();
        fs::write(root.join("a/First.uplugin"), "{}").unwrap();

        let found = find_plugin_descriptor(root, &[]).unwrap();
        assert_eq!(found, root.join("a/First.uplugin"));
    }
}

//! uplugin-build library
//!
//! Prepares an Unreal Engine plugin repository and packages it:
//! update, clean, fetch content, fetch third-party, build.

pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod invocation;
pub mod pipeline;
pub mod process_guard;
pub mod sanity;
pub mod tool_args;
pub mod tool_runner;
pub mod vcs;
pub mod workspace;

// Re-export main types for convenience
pub use builder::{build_plugin, find_plugin_descriptor, BuildArtifact, PackageCommand};
pub use config::{ArchiveSource, PipelineConfig};
pub use error::{BuildError, Result};
pub use fetch::{download_and_extract, extract_archive, DriveClient, DriveFileId};
pub use invocation::{resolve_invocation, Invocation, Prompt, WorkspaceSource};
pub use pipeline::{Pipeline, PipelineOptions, PipelineReport, PipelineStep};
pub use process_guard::{ChildRegistry, CommandProcessGroup};
pub use tool_args::{enable_dry_run, is_dry_run, OutputMode, ToolArgs};
pub use tool_runner::{run_tool, ToolOutput};
pub use vcs::{clone_repository, is_repository, pull, repository_name};
pub use workspace::{CleanReport, Workspace};

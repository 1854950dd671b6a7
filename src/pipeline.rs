//! The fixed build pipeline: update, clean, fetch, fetch, build.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::info;

use crate::builder::{build_plugin, BuildArtifact};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fetch::{download_and_extract, DriveClient};
use crate::tool_args::is_dry_run;
use crate::vcs;
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum PipelineStep {
    #[strum(to_string = "update repository")]
    Update,
    #[strum(to_string = "clean payloads")]
    Clean,
    #[strum(to_string = "fetch content")]
    FetchContent,
    #[strum(to_string = "fetch third-party")]
    FetchThirdParty,
    #[strum(to_string = "build plugin")]
    Build,
}

/// Switches for steps the caller wants to leave out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub skip_pull: bool,
    /// Keep the existing payloads: no clean, no fetch
    pub skip_fetch: bool,
}

impl PipelineOptions {
    pub fn runs(&self, step: PipelineStep) -> bool {
        match step {
            PipelineStep::Update => !self.skip_pull,
            PipelineStep::Clean | PipelineStep::FetchContent | PipelineStep::FetchThirdParty => {
                !self.skip_fetch
            }
            PipelineStep::Build => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub completed: Vec<PipelineStep>,
    pub artifact: Option<BuildArtifact>,
}

pub struct Pipeline {
    pub engine_dir: PathBuf,
    pub workspace: Workspace,
    pub config: PipelineConfig,
    pub extra_flags: Vec<String>,
    pub options: PipelineOptions,
}

impl Pipeline {
    /// Run every enabled step in order, stopping at the first failure.
    pub fn run(&self) -> Result<PipelineReport> {
        let mut report = PipelineReport { completed: Vec::new(), artifact: None };
        let mut client: Option<DriveClient> = None;

        for step in PipelineStep::iter() {
            if !self.options.runs(step) {
                info!("Skipping step: {}", step);
                continue;
            }
            info!("Step: {}", step);
            let started = Instant::now();

            match step {
                PipelineStep::Update => vcs::pull(self.workspace.root())?,
                PipelineStep::Clean => {
                    let cleaned = self.workspace.clean()?;
                    info!("Removed {} payload director(ies)", cleaned.removed.len());
                }
                PipelineStep::FetchContent | PipelineStep::FetchThirdParty => {
                    let source = if step == PipelineStep::FetchContent {
                        &self.config.content_archive
                    } else {
                        &self.config.thirdparty_archive
                    };
                    if client.is_none() {
                        client = Some(DriveClient::with_base_url(
                            self.config.download_url.clone(),
                            Duration::from_secs(self.config.download_timeout_secs),
                        )?);
                    }
                    if let Some(client) = &client {
                        download_and_extract(client, source, &self.workspace)?;
                    }
                }
                PipelineStep::Build if is_dry_run() && !self.workspace.root().is_dir() => {
                    // the dry-run clone never created the checkout
                    info!(
                        "[DRY RUN] Would search {} for a .uplugin and run RunUAT BuildPlugin",
                        self.workspace.root().display()
                    );
                }
                PipelineStep::Build => {
                    report.artifact = Some(build_plugin(
                        &self.engine_dir,
                        &self.workspace,
                        &self.config,
                        &self.extra_flags,
                    )?);
                }
            }

            info!("Finished {} in {:.1}s", step, started.elapsed().as_secs_f64());
            report.completed.push(step);
        }
        Ok(report)
    }
}

//! uplugin-build - command-line entry point
//!
//! Resolves the engine directory and workspace from the command line (or a
//! prompt), clones the repository when asked to, and runs the pipeline.

use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use uplugin_build::cli::Cli;
use uplugin_build::config::PipelineConfig;
use uplugin_build::invocation::{resolve_invocation, StdinPrompt, WorkspaceSource};
use uplugin_build::pipeline::{Pipeline, PipelineOptions};
use uplugin_build::tool_args::{enable_dry_run, is_dry_run};
use uplugin_build::workspace::Workspace;
use uplugin_build::{process_guard, sanity, vcs};

/// Initialize the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);
    debug!("CLI arguments parsed: {:?}", cli);

    // Stop git/RunUAT process trees if we are interrupted
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n✗ Build failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.dry_run {
        enable_dry_run();
        info!("Dry-run mode: external commands and deletions are only logged");
    }

    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    let cwd_is_repo = vcs::is_repository(&cwd);
    debug!("{} is a repository: {}", cwd.display(), cwd_is_repo);

    let invocation = resolve_invocation(&cli.positionals, &cwd, cwd_is_repo, &mut StdinPrompt)
        .context("Invalid arguments")?;
    info!(
        "Engine: {}, workspace: {}, extra flags: {:?}",
        invocation.engine_dir.display(),
        invocation.workspace.root().display(),
        invocation.extra_flags
    );

    if !cli.no_preflight {
        let checks = sanity::verify_environment(&invocation.engine_dir);
        if !checks.is_ok() {
            sanity::print_failures(&checks);
            if is_dry_run() {
                warn!("Continuing despite failed pre-flight checks (dry run)");
            } else {
                bail!("pre-flight checks failed");
            }
        }
    }

    if let WorkspaceSource::Clone { url, dir } = &invocation.workspace {
        vcs::clone_repository(url, dir)
            .with_context(|| format!("Failed to clone {}", url))?;
    }

    let workspace = Workspace::new(invocation.workspace.root());
    let config = PipelineConfig::resolve(cli.config.as_deref(), workspace.root())
        .context("Failed to load pipeline configuration")?;

    let pipeline = Pipeline {
        engine_dir: invocation.engine_dir,
        workspace,
        config,
        extra_flags: invocation.extra_flags,
        options: PipelineOptions {
            skip_pull: cli.skip_pull,
            skip_fetch: cli.skip_fetch,
        },
    };
    let report = pipeline.run()?;

    if let Some(artifact) = report.artifact {
        println!("\n✓ Plugin packaged into {}", artifact.package_dir.display());
    }
    Ok(())
}

use clap::Parser;
use std::path::PathBuf;

/// Fetch payloads for an Unreal Engine plugin repository and package it
///
/// Positional forms:
///   uplugin-build                              prompt for the engine, build here
///   uplugin-build <ENGINE_DIR> [FLAGS...]      build the repository here
///   uplugin-build <ENGINE_DIR> <REPO_URL> [FLAGS...]
///                                              clone, then build (outside a repository)
#[derive(Parser, Debug)]
#[command(name = "uplugin-build", verbatim_doc_comment)]
#[command(version)]
pub struct Cli {
    /// Pipeline configuration file (JSON). Defaults to uplugin-build.json in
    /// the workspace when present.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log every external command and filesystem change instead of doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Keep the existing Content/ and Source/ThirdParty/ (no clean, no download)
    #[arg(long)]
    pub skip_fetch: bool,

    /// Do not run `git pull` before building
    #[arg(long)]
    pub skip_pull: bool,

    /// Skip the pre-flight checks for git and the engine layout
    #[arg(long)]
    pub no_preflight: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    pub verbose: bool,

    /// Engine directory, optional repository URL, then packaging flags
    /// passed through to BuildPlugin
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub positionals: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

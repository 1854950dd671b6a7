//! Generates the man page and shell completions from the clap definition.

use clap::CommandFactory;
use clap_complete::{generate_to, Shell};
use std::env;
use std::fs;

// Brings in `Cli` along with its `clap::Parser` and `PathBuf` imports
include!("src/cli.rs");

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = match env::var_os("OUT_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => return Ok(()),
    };

    let mut cmd = Cli::command();

    let man = clap_mangen::Man::new(cmd.clone());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    fs::write(out_dir.join("uplugin-build.1"), buffer)?;

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
        generate_to(shell, &mut cmd, "uplugin-build", &out_dir)?;
    }
    Ok(())
}

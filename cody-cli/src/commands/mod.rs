pub mod analyze;
pub mod check;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use cody_core::{CodyConfig, CodyError};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyse board documents and print the event-sourcing summary
    Analyze(analyze::AnalyzeArgs),
    /// Validate board documents without analysing them
    Check(check::CheckArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Analyze(args) => analyze::run(&args),
        Command::Check(args) => check::run(&args),
    }
}

/// Explicit `--config` path, else `.cody.toml` in the working directory.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<CodyConfig> {
    let config = match path {
        Some(path) => CodyConfig::load(path),
        None => {
            let cwd = std::env::current_dir().context("Cannot resolve working directory")?;
            CodyConfig::discover(&cwd)
        }
    };
    config.map_err(|e| anyhow::Error::new(CodyError::from(e)))
}

/// Document sources in order; stdin when no file is given.
pub(crate) fn read_documents(files: &[PathBuf]) -> anyhow::Result<Vec<(String, String)>> {
    if files.is_empty() {
        let mut json = String::new();
        std::io::stdin()
            .read_to_string(&mut json)
            .context("Cannot read diagram from stdin")?;
        return Ok(vec![("<stdin>".to_string(), json)]);
    }

    files
        .iter()
        .map(|path| -> anyhow::Result<(String, String)> {
            let json = std::fs::read_to_string(path)
                .map_err(CodyError::from)
                .with_context(|| format!("Cannot read diagram: {}", path.display()))?;
            Ok((path.display().to_string(), json))
        })
        .collect()
}

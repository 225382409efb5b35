use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};

use cody_core::{AnalysisSummary, CodyWorkflow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Board documents to analyse, in order (default: stdin)
    pub files: Vec<PathBuf>,

    /// Configuration file (default: .cody.toml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let mut workflow = CodyWorkflow::from_config(&config);

    for (source, json) in super::read_documents(&args.files)? {
        let nodes = workflow
            .analyse_json(&json)
            .with_context(|| format!("Cannot analyse {source}"))?;
        tracing::info!(source = %source, nodes, "Analysed document");
    }

    let summary = AnalysisSummary::from_analyzer(workflow.analyzer());
    match args.format {
        OutputFormat::Text => print!("{}", summary.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

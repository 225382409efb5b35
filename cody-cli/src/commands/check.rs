use std::path::PathBuf;

use clap::Args;

use cody_core::error::ValidationError;
use cody_core::{CodyError, CodyWorkflow};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Board documents to validate (default: stdin)
    pub files: Vec<PathBuf>,

    /// Configuration file (default: .cody.toml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &CheckArgs) -> anyhow::Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let mut workflow = CodyWorkflow::from_config(&config);

    let mut violations = Vec::new();
    for (source, json) in super::read_documents(&args.files)? {
        let found = workflow
            .check_json(&json)
            .map_err(|e| anyhow::Error::new(e).context(format!("Cannot check {source}")))?;
        for violation in &found {
            println!("{source}: {violation}");
        }
        violations.extend(found);
    }

    if violations.is_empty() {
        println!("OK");
        return Ok(());
    }
    Err(CodyError::from(ValidationError::Invalid(violations)).into())
}

use clap::Parser;

use cody_core::CodyError;
use cody_graph::GraphError;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "cody",
    version,
    about = "Analyse event-sourcing board diagrams"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into a process exit code.
///
/// Exit codes:
///   0 — success
///   1 — general/unknown error (I/O, undecodable JSON)
///   2 — configuration error
///   3 — invalid diagram (constraint violations)
///   4 — domain rule violation (ambiguous command, unsupported type, mismatch)
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let Some(cody) = err.chain().find_map(|e| e.downcast_ref::<CodyError>()) else {
        return 1;
    };
    match cody {
        CodyError::Config(_) => 2,
        CodyError::Validation(_) => 3,
        CodyError::Graph(graph) => match graph {
            GraphError::VertexNotFound { .. } => 1,
            _ => 4,
        },
        CodyError::Decode(_) | CodyError::Io(_) => 1,
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use cody_core::error::{ConfigError, ConstraintViolation, ValidationError};

    use super::*;

    #[test]
    fn exit_code_config() {
        let err = anyhow::Error::new(CodyError::from(ConfigError::NotFound(".cody.toml".into())));
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_validation() {
        let violation = ConstraintViolation {
            node: "s1".into(),
            constraint: "known-type",
            message: "type \"sticky\" is not supported".into(),
        };
        let err = anyhow::Error::new(CodyError::from(ValidationError::Invalid(vec![violation])));
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_domain_rule_through_context() {
        let result: Result<(), CodyError> = Err(GraphError::AmbiguousCommand {
            aggregate: "Building".into(),
            commands: vec!["Add Building".into(), "Rename Building".into()],
        }
        .into());
        let err = result.context("Cannot analyse board.json").unwrap_err();
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Something unexpected happened");
        assert_eq!(classify_exit_code(&err), 1);
    }
}

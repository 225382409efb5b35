//! Cody core library — board JSON decoding, validation, configuration and
//! the analysis workflow on top of `cody-graph`.
//!
//! The main entry point is [`workflow::CodyWorkflow`], which runs
//! Decode → Validate → Analyse over board documents and accumulates the
//! result in an [`cody_graph::EventSourcingAnalyzer`].

pub mod config;
pub mod error;
pub mod metadata;
pub mod naming;
pub mod node;
pub mod summary;
pub mod validator;
pub mod workflow;

pub use config::CodyConfig;
pub use error::{CodyError, Result};
pub use metadata::JsonMetadataFactory;
pub use naming::NameFilterKind;
pub use node::JsonNode;
pub use summary::AnalysisSummary;
pub use validator::{Constraint, ConstraintChain, ConstraintKind, Validator};
pub use workflow::CodyWorkflow;

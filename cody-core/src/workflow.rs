// Workflow — decode board JSON, validate it, then fold it into the analyzer.

use std::path::Path;

use tracing::info;

use cody_graph::{EventSourcingAnalyzer, EventSourcingGraph};

use crate::config::CodyConfig;
use crate::error::{ConstraintViolation, Result};
use crate::metadata::JsonMetadataFactory;
use crate::node::JsonNode;
use crate::validator::Validator;

/// Pairs a [`Validator`] with an [`EventSourcingAnalyzer`] that accumulates
/// across calls.
#[derive(Debug)]
pub struct CodyWorkflow {
    validator: Validator,
    analyzer: EventSourcingAnalyzer,
}

impl CodyWorkflow {
    pub fn new(validator: Validator, analyzer: EventSourcingAnalyzer) -> Self {
        Self {
            validator,
            analyzer,
        }
    }

    pub fn from_config(config: &CodyConfig) -> Self {
        let mut graph = EventSourcingGraph::new(config.naming.filter);
        if config.analysis.parse_metadata {
            graph = graph.with_metadata_factory(JsonMetadataFactory);
        }
        let analyzer = EventSourcingAnalyzer::new(graph)
            .with_reference_resolution(config.analysis.resolve_references);
        Self::new(config.validator(), analyzer)
    }

    /// Validate and analyse one decoded node.
    pub fn analyse_node(&mut self, node: &JsonNode) -> Result<()> {
        self.validator.validate(node)?;
        self.analyzer.analyse(node)?;
        Ok(())
    }

    /// Analyse every node of a JSON document (one node or an array).
    ///
    /// All nodes are validated before the first one is analysed. Returns the
    /// number of analysed nodes.
    pub fn analyse_json(&mut self, json: &str) -> Result<usize> {
        let nodes = JsonNode::from_json_batch(json)?;
        for node in &nodes {
            self.validator.validate(node)?;
        }
        for node in &nodes {
            self.analyzer.analyse(node)?;
        }

        info!(
            nodes = nodes.len(),
            vertices = self.analyzer.vertices().len(),
            aggregate_connections = self.analyzer.aggregate_connection_map().len(),
            "Analysed diagram document"
        );
        Ok(nodes.len())
    }

    pub fn analyse_file(&mut self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        self.analyse_json(&json)
    }

    /// Remove every node of a JSON document from the analysis.
    ///
    /// Returns how many of them were known.
    pub fn remove_json(&mut self, json: &str) -> Result<usize> {
        let nodes = JsonNode::from_json_batch(json)?;
        let mut removed = 0;
        for node in &nodes {
            if self.analyzer.remove(node)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Validate a document without analysing it, collecting every violation.
    pub fn check_json(&mut self, json: &str) -> Result<Vec<ConstraintViolation>> {
        let nodes = JsonNode::from_json_batch(json)?;
        let mut violations = Vec::new();
        for node in &nodes {
            if !self.validator.is_valid(node) {
                violations.extend_from_slice(self.validator.errors());
            }
        }
        Ok(violations)
    }

    pub fn analyzer(&self) -> &EventSourcingAnalyzer {
        &self.analyzer
    }

    pub fn into_analyzer(self) -> EventSourcingAnalyzer {
        self.analyzer
    }
}

impl Default for CodyWorkflow {
    fn default() -> Self {
        Self::from_config(&CodyConfig::default())
    }
}

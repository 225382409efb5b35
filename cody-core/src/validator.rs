// Diagram validation — a chain of constraints run over a node tree before analysis.

use serde::{Deserialize, Serialize};
use tracing::warn;

use cody_graph::{NameFilter, Node, NodeType};

use crate::error::{ConstraintViolation, ValidationError};
use crate::naming::NameFilterKind;

/// One rule a node must satisfy.
pub trait Constraint: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, node: &dyn Node) -> Option<ConstraintViolation>;
}

/// Ordered set of constraints; every constraint runs on every node.
#[derive(Default)]
pub struct ConstraintChain {
    constraints: Vec<Box<dyn Constraint>>,
}

impl std::fmt::Debug for ConstraintChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.constraints.iter().map(|c| c.name()))
            .finish()
    }
}

impl ConstraintChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, constraint: impl Constraint + 'static) -> Self {
        self.constraints.push(Box::new(constraint));
        self
    }

    pub fn push(&mut self, constraint: Box<dyn Constraint>) {
        self.constraints.push(constraint);
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn check(&self, node: &dyn Node) -> Vec<ConstraintViolation> {
        self.constraints
            .iter()
            .filter_map(|c| c.check(node))
            .collect()
    }
}

// ── Built-in constraints ───────────────────────────────────────────

/// Domain elements must carry a name after filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyName {
    pub filter: NameFilterKind,
}

impl Constraint for NonEmptyName {
    fn name(&self) -> &'static str {
        "non-empty-name"
    }

    fn check(&self, node: &dyn Node) -> Option<ConstraintViolation> {
        let is_vertex = NodeType::of(node).vertex_type().is_some();
        (is_vertex && self.filter.filter(node.name()).is_empty()).then(|| ConstraintViolation {
            node: node.id().to_string(),
            constraint: self.name(),
            message: format!("{} has an empty name", node.node_type()),
        })
    }
}

/// Type tags must be a known domain or structural kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownType;

impl Constraint for KnownType {
    fn name(&self) -> &'static str {
        "known-type"
    }

    fn check(&self, node: &dyn Node) -> Option<ConstraintViolation> {
        matches!(NodeType::of(node), NodeType::Unknown(_)).then(|| ConstraintViolation {
            node: node.id().to_string(),
            constraint: self.name(),
            message: format!("type \"{}\" is not supported", node.node_type()),
        })
    }
}

/// Constraint names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    NonEmptyName,
    KnownType,
}

impl ConstraintKind {
    pub fn build(self, filter: NameFilterKind) -> Box<dyn Constraint> {
        match self {
            Self::NonEmptyName => Box::new(NonEmptyName { filter }),
            Self::KnownType => Box::new(KnownType),
        }
    }
}

// ── Validator ──────────────────────────────────────────────────────

/// Runs a [`ConstraintChain`] over a node and all of its descendants.
///
/// With an empty chain every graph is valid.
#[derive(Debug, Default)]
pub struct Validator {
    chain: ConstraintChain,
    errors: Vec<ConstraintViolation>,
}

impl Validator {
    pub fn new(chain: ConstraintChain) -> Self {
        Self {
            chain,
            errors: Vec::new(),
        }
    }

    /// Validate `node`, replacing the errors of the previous run.
    pub fn is_valid(&mut self, node: &dyn Node) -> bool {
        self.errors.clear();
        if self.chain.is_empty() {
            return true;
        }
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            self.errors.extend(self.chain.check(current));
            pending.extend(current.children().into_iter().rev());
        }
        for violation in &self.errors {
            warn!(node = %violation.node, constraint = violation.constraint, "{}", violation.message);
        }
        self.errors.is_empty()
    }

    /// Like [`is_valid`](Self::is_valid), returning the violations as an error.
    pub fn validate(&mut self, node: &dyn Node) -> Result<(), ValidationError> {
        if self.is_valid(node) {
            Ok(())
        } else {
            Err(ValidationError::Invalid(self.errors.clone()))
        }
    }

    pub fn errors(&self) -> &[ConstraintViolation] {
        &self.errors
    }
}

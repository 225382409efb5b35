// Vertex model — typed, analysed counterparts of domain-bearing diagram nodes.

use serde::{Deserialize, Serialize};

use crate::filter::NameFilter;
use crate::metadata::{Metadata, MetadataFactory};
use crate::node::Node;
use crate::{GraphError, Result};

// ── Vertex type ────────────────────────────────────────────────────

/// The closed set of domain-bearing element kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VertexType {
    Command,
    Event,
    Aggregate,
    Document,
    Policy,
    Ui,
    ExternalSystem,
    HotSpot,
    Role,
    Feature,
    BoundedContext,
}

impl VertexType {
    pub const COUNT: usize = 11;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Command,
        Self::Event,
        Self::Aggregate,
        Self::Document,
        Self::Policy,
        Self::Ui,
        Self::ExternalSystem,
        Self::HotSpot,
        Self::Role,
        Self::Feature,
        Self::BoundedContext,
    ];

    /// Board type tag of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Event => "event",
            Self::Aggregate => "aggregate",
            Self::Document => "document",
            Self::Policy => "policy",
            Self::Ui => "ui",
            Self::ExternalSystem => "externalSystem",
            Self::HotSpot => "hotSpot",
            Self::Role => "role",
            Self::Feature => "feature",
            Self::BoundedContext => "boundedContext",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// Like [`from_tag`](Self::from_tag) but fails with `UnsupportedType`.
    pub fn parse(tag: &str) -> Result<Self> {
        Self::from_tag(tag).ok_or_else(|| GraphError::UnsupportedType(tag.to_string()))
    }

    /// Position in [`ALL`](Self::ALL); used to index per-type storage.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for VertexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Vertex ─────────────────────────────────────────────────────────

/// An analysed diagram element. Identity is the diagram id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vertex {
    id: String,
    #[serde(rename = "type")]
    kind: VertexType,
    label: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata_instance: Option<Metadata>,
}

impl Vertex {
    /// Bare vertex without metadata; `name` doubles as the label.
    pub fn new(id: impl Into<String>, kind: VertexType, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            kind,
            label: name.clone(),
            name,
            metadata: None,
            metadata_instance: None,
        }
    }

    /// Build the vertex matching the node's type tag.
    pub fn from_node(
        node: &dyn Node,
        filter: &dyn NameFilter,
        factory: Option<&dyn MetadataFactory>,
    ) -> Result<Self> {
        let kind = VertexType::parse(node.node_type())?;
        Self::typed(kind, node, filter, factory)
    }

    /// Build a vertex of `expected` kind, rejecting nodes of any other tag.
    pub fn typed(
        expected: VertexType,
        node: &dyn Node,
        filter: &dyn NameFilter,
        factory: Option<&dyn MetadataFactory>,
    ) -> Result<Self> {
        if node.node_type() != expected.as_str() {
            return Err(GraphError::TypeMismatch {
                expected,
                found: node.node_type().to_string(),
            });
        }

        let metadata_instance = match factory {
            Some(factory) => factory.create(node, filter)?,
            None => None,
        };
        if let Some(instance) = &metadata_instance {
            if !instance.fits(expected) {
                return Err(GraphError::MetadataMismatch {
                    kind: expected,
                    metadata: instance.kind_name(),
                });
            }
        }

        Ok(Self {
            id: node.id().to_string(),
            kind: expected,
            label: node.name().to_string(),
            name: filter.filter(node.name()),
            metadata: node.metadata().map(str::to_string),
            metadata_instance,
        })
    }

    pub fn with_metadata_instance(mut self, instance: Metadata) -> Result<Self> {
        if !instance.fits(self.kind) {
            return Err(GraphError::MetadataMismatch {
                kind: self.kind,
                metadata: instance.kind_name(),
            });
        }
        self.metadata_instance = Some(instance);
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> VertexType {
        self.kind
    }

    /// Raw label as drawn on the board.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Label after name filtering; the domain name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    pub fn metadata_instance(&self) -> Option<&Metadata> {
        self.metadata_instance.as_ref()
    }

    pub(crate) fn replace_metadata_instance(&mut self, instance: Metadata) {
        self.metadata_instance = Some(instance);
    }

    /// Absorb a newer observation of the same element.
    ///
    /// Id and kind must match; label, name, metadata and metadata instance
    /// are replaced with the incoming values.
    pub fn merge(&mut self, other: &Vertex) -> Result<()> {
        if self.id != other.id {
            return Err(GraphError::IdMismatch {
                expected: self.id.clone(),
                found: other.id.clone(),
            });
        }
        if self.kind != other.kind {
            return Err(GraphError::KindMismatch {
                expected: self.kind,
                found: other.kind,
            });
        }
        self.label.clone_from(&other.label);
        self.name.clone_from(&other.name);
        self.metadata.clone_from(&other.metadata);
        self.metadata_instance.clone_from(&other.metadata_instance);
        Ok(())
    }
}

// Node contract — the read-only view of one diagram element the engine consumes.

use serde::{Deserialize, Serialize};

use crate::vertex::VertexType;

/// A diagram element as delivered by the modelling board.
///
/// Implementations own the element tree; the engine only borrows it for the
/// duration of one analysis. `sources()` and `targets()` return the far ends
/// of connecting edges, already dereferenced.
pub trait Node: Send + Sync {
    fn id(&self) -> &str;

    /// Raw display label, before name filtering.
    fn name(&self) -> &str;

    /// Raw type tag, e.g. `"command"` or `"edge"`.
    fn node_type(&self) -> &str;

    fn tags(&self) -> &[String];

    fn is_layer(&self) -> bool;

    fn is_default_layer(&self) -> bool;

    fn parent(&self) -> Option<&dyn Node>;

    fn children(&self) -> Vec<&dyn Node>;

    fn sources(&self) -> Vec<&dyn Node>;

    fn targets(&self) -> Vec<&dyn Node>;

    /// Raw metadata payload, usually a JSON document.
    fn metadata(&self) -> Option<&str>;
}

impl std::fmt::Debug for dyn Node + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("type", &self.node_type())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

// ── Structural elements ────────────────────────────────────────────

/// Board elements that carry no domain meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructuralType {
    Edge,
    Layer,
    Image,
    FreeText,
    Text,
    Icon,
}

impl StructuralType {
    pub const ALL: [Self; 6] = [
        Self::Edge,
        Self::Layer,
        Self::Image,
        Self::FreeText,
        Self::Text,
        Self::Icon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Layer => "layer",
            Self::Image => "image",
            Self::FreeText => "freeText",
            Self::Text => "text",
            Self::Icon => "icon",
        }
    }
}

impl std::fmt::Display for StructuralType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Type classification ────────────────────────────────────────────

/// Classification of a raw node type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Vertex(VertexType),
    Structural(StructuralType),
    Unknown(String),
}

impl NodeType {
    pub fn classify(tag: &str) -> Self {
        if let Some(kind) = VertexType::from_tag(tag) {
            return Self::Vertex(kind);
        }
        StructuralType::ALL
            .iter()
            .find(|s| s.as_str() == tag)
            .map_or_else(|| Self::Unknown(tag.to_string()), |s| Self::Structural(*s))
    }

    pub fn of(node: &dyn Node) -> Self {
        Self::classify(node.node_type())
    }

    pub fn vertex_type(&self) -> Option<VertexType> {
        match self {
            Self::Vertex(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// The vertex kind of a node, or `None` for structural and unknown tags.
pub fn vertex_type_of(node: &dyn Node) -> Option<VertexType> {
    VertexType::from_tag(node.node_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_vertex_tags() {
        assert_eq!(
            NodeType::classify("command"),
            NodeType::Vertex(VertexType::Command)
        );
        assert_eq!(
            NodeType::classify("externalSystem"),
            NodeType::Vertex(VertexType::ExternalSystem)
        );
        assert_eq!(
            NodeType::classify("boundedContext"),
            NodeType::Vertex(VertexType::BoundedContext)
        );
    }

    #[test]
    fn classify_structural_tags() {
        for s in StructuralType::ALL {
            assert_eq!(NodeType::classify(s.as_str()), NodeType::Structural(s));
        }
    }

    #[test]
    fn classify_unknown_tag() {
        assert_eq!(
            NodeType::classify("sticky"),
            NodeType::Unknown("sticky".to_string())
        );
        assert!(NodeType::classify("Command").vertex_type().is_none());
    }
}

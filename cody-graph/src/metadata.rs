// Metadata instances — typed views of a vertex's raw metadata payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::filter::NameFilter;
use crate::node::Node;
use crate::vertex::VertexType;

/// Builds the typed metadata instance for a node, if it carries one.
pub trait MetadataFactory: Send + Sync {
    fn create(&self, node: &dyn Node, filter: &dyn NameFilter) -> Result<Option<Metadata>>;
}

// ── Instances ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommandMetadata {
    /// The command creates a new aggregate instance.
    pub new_aggregate: bool,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventMetadata {
    /// The event is published outside its bounded context.
    pub public: bool,
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateMetadata {
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetadata {
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyMetadata {
    /// Event streams the policy listens to.
    pub streams: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum Metadata {
    Command(CommandMetadata),
    Event(EventMetadata),
    Aggregate(AggregateMetadata),
    Document(DocumentMetadata),
    Policy(PolicyMetadata),
    /// Untyped payload, accepted on any vertex kind.
    Raw(Value),
}

impl Metadata {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::Event(_) => "event",
            Self::Aggregate(_) => "aggregate",
            Self::Document(_) => "document",
            Self::Policy(_) => "policy",
            Self::Raw(_) => "raw",
        }
    }

    /// Whether this instance may be attached to a vertex of `kind`.
    pub fn fits(&self, kind: VertexType) -> bool {
        matches!(
            (self, kind),
            (Self::Command(_), VertexType::Command)
                | (Self::Event(_), VertexType::Event)
                | (Self::Aggregate(_), VertexType::Aggregate)
                | (Self::Document(_), VertexType::Document)
                | (Self::Policy(_), VertexType::Policy)
                | (Self::Raw(_), _)
        )
    }

    pub fn schema(&self) -> Option<&Value> {
        match self {
            Self::Command(m) => m.schema.as_ref(),
            Self::Event(m) => m.schema.as_ref(),
            Self::Aggregate(m) => m.schema.as_ref(),
            Self::Document(m) => m.schema.as_ref(),
            Self::Policy(_) | Self::Raw(_) => None,
        }
    }

    fn schema_mut(&mut self) -> Option<&mut Value> {
        match self {
            Self::Command(m) => m.schema.as_mut(),
            Self::Event(m) => m.schema.as_mut(),
            Self::Aggregate(m) => m.schema.as_mut(),
            Self::Document(m) => m.schema.as_mut(),
            Self::Policy(_) | Self::Raw(_) => None,
        }
    }

    /// All `$ref` targets inside the schema, in document order.
    pub fn references(&self) -> Vec<String> {
        let mut refs = Vec::new();
        if let Some(schema) = self.schema() {
            collect_refs(schema, &mut refs);
        }
        refs
    }

    /// Replace every `{"$ref": ..}` object the resolver knows with its value.
    ///
    /// Resolution is one level deep: substituted values are not scanned again.
    /// Returns the number of replaced references.
    pub fn resolve_references<F>(&mut self, resolve: F) -> usize
    where
        F: Fn(&str) -> Option<Value>,
    {
        self.schema_mut()
            .map_or(0, |schema| substitute_refs(schema, &resolve))
    }
}

/// Name a reference points at: its last path segment.
///
/// `"/Building"` and `"#/definitions/Building"` both name `"Building"`.
pub fn reference_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '#'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(reference)
}

fn ref_target(value: &Value) -> Option<&str> {
    value.as_object()?.get("$ref")?.as_str()
}

fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    if let Some(target) = ref_target(value) {
        refs.push(target.to_string());
        return;
    }
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_refs(v, refs)),
        Value::Array(items) => items.iter().for_each(|v| collect_refs(v, refs)),
        _ => {}
    }
}

fn substitute_refs<F>(value: &mut Value, resolve: &F) -> usize
where
    F: Fn(&str) -> Option<Value>,
{
    if let Some(target) = ref_target(value) {
        return match resolve(target) {
            Some(resolved) => {
                *value = resolved;
                1
            }
            None => 0,
        };
    }
    match value {
        Value::Object(map) => map.values_mut().map(|v| substitute_refs(v, resolve)).sum(),
        Value::Array(items) => items.iter_mut().map(|v| substitute_refs(v, resolve)).sum(),
        _ => 0,
    }
}

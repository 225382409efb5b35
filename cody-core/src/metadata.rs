// JSON metadata factory — typed metadata instances from board payloads.

use serde::de::DeserializeOwned;
use serde_json::Value;

use cody_graph::metadata::{
    AggregateMetadata, CommandMetadata, DocumentMetadata, EventMetadata, PolicyMetadata,
};
use cody_graph::{GraphError, Metadata, MetadataFactory, NameFilter, Node, VertexType};

/// Parses the JSON metadata string carried by board nodes.
///
/// Blank payloads yield the kind's default instance for commands, events,
/// aggregates, documents and policies, and nothing for other kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataFactory;

impl MetadataFactory for JsonMetadataFactory {
    fn create(
        &self,
        node: &dyn Node,
        filter: &dyn NameFilter,
    ) -> cody_graph::Result<Option<Metadata>> {
        let Some(kind) = VertexType::from_tag(node.node_type()) else {
            return Ok(None);
        };
        let raw = node.metadata().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Ok(default_instance(kind));
        }

        let metadata = match kind {
            VertexType::Command => {
                let mut meta: CommandMetadata = parse(node, raw)?;
                meta.schema = meta.schema.map(decode_schema);
                Metadata::Command(meta)
            }
            VertexType::Event => {
                let mut meta: EventMetadata = parse(node, raw)?;
                meta.schema = meta.schema.map(decode_schema);
                Metadata::Event(meta)
            }
            VertexType::Aggregate => {
                let mut meta: AggregateMetadata = parse(node, raw)?;
                meta.schema = meta.schema.map(decode_schema);
                Metadata::Aggregate(meta)
            }
            VertexType::Document => {
                let mut meta: DocumentMetadata = parse(node, raw)?;
                meta.schema = meta.schema.map(decode_schema);
                Metadata::Document(meta)
            }
            VertexType::Policy => {
                let mut meta: PolicyMetadata = parse(node, raw)?;
                meta.streams = meta.streams.iter().map(|s| filter.filter(s)).collect();
                Metadata::Policy(meta)
            }
            _ => Metadata::Raw(parse(node, raw)?),
        };
        Ok(Some(metadata))
    }
}

fn parse<T: DeserializeOwned>(node: &dyn Node, raw: &str) -> cody_graph::Result<T> {
    serde_json::from_str(raw).map_err(|e| GraphError::Metadata {
        id: node.id().to_string(),
        message: e.to_string(),
    })
}

/// Schemas are sometimes exported as JSON-encoded strings.
fn decode_schema(schema: Value) -> Value {
    match schema {
        Value::String(encoded) => serde_json::from_str(&encoded).unwrap_or(Value::String(encoded)),
        other => other,
    }
}

fn default_instance(kind: VertexType) -> Option<Metadata> {
    match kind {
        VertexType::Command => Some(Metadata::Command(CommandMetadata::default())),
        VertexType::Event => Some(Metadata::Event(EventMetadata::default())),
        VertexType::Aggregate => Some(Metadata::Aggregate(AggregateMetadata::default())),
        VertexType::Document => Some(Metadata::Document(DocumentMetadata::default())),
        VertexType::Policy => Some(Metadata::Policy(PolicyMetadata::default())),
        _ => None,
    }
}

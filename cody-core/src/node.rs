// Cody board JSON — the node tree as exported by the modelling board.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use cody_graph::Node;

use crate::error::DecodeError;

/// One board element with its nested neighbourhood.
///
/// `sourcesList`/`targetsList` hold the far ends of connecting edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub layer: bool,
    #[serde(default)]
    pub default_layer: bool,
    #[serde(default)]
    pub parent: Option<Box<JsonNode>>,
    #[serde(default, rename = "childrenList")]
    pub children: Vec<JsonNode>,
    #[serde(default, rename = "sourcesList")]
    pub sources: Vec<JsonNode>,
    #[serde(default, rename = "targetsList")]
    pub targets: Vec<JsonNode>,
    #[serde(default, deserialize_with = "metadata_payload")]
    pub metadata: Option<String>,
}

/// Metadata is usually a JSON-encoded string; inline objects are accepted too.
fn metadata_payload<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl JsonNode {
    /// Decode a single node document.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let node: Self = serde_json::from_str(json)?;
        node.check_ids()?;
        Ok(node)
    }

    /// Decode a document holding either one node or an array of nodes.
    pub fn from_json_batch(json: &str) -> Result<Vec<Self>, DecodeError> {
        let value: Value = serde_json::from_str(json)?;
        let nodes = match value {
            Value::Array(_) => serde_json::from_value::<Vec<Self>>(value)?,
            other => vec![serde_json::from_value::<Self>(other)?],
        };
        for node in &nodes {
            node.check_ids()?;
        }
        Ok(nodes)
    }

    fn check_ids(&self) -> Result<(), DecodeError> {
        if self.id.trim().is_empty() {
            return Err(DecodeError::MissingId(self.node_type.clone()));
        }
        self.parent
            .iter()
            .map(|parent| &**parent)
            .chain(&self.children)
            .chain(&self.sources)
            .chain(&self.targets)
            .try_for_each(Self::check_ids)
    }
}

impl Node for JsonNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn node_type(&self) -> &str {
        &self.node_type
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn is_layer(&self) -> bool {
        self.layer
    }

    fn is_default_layer(&self) -> bool {
        self.default_layer
    }

    fn parent(&self) -> Option<&dyn Node> {
        self.parent.as_deref().map(|p| p as &dyn Node)
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.children.iter().map(|n| n as &dyn Node).collect()
    }

    fn sources(&self) -> Vec<&dyn Node> {
        self.sources.iter().map(|n| n as &dyn Node).collect()
    }

    fn targets(&self) -> Vec<&dyn Node> {
        self.targets.iter().map(|n| n as &dyn Node).collect()
    }

    fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_board_lists() {
        let json = json!({
            "id": "9bJ5Y7yuBcfWyei7i2ZSDC",
            "name": "Add Building",
            "type": "command",
            "link": "https://board.example/link",
            "tags": ["core"],
            "layer": false,
            "defaultLayer": false,
            "parent": {"id": "f1", "name": "Building", "type": "feature"},
            "childrenList": [],
            "sourcesList": [],
            "targetsList": [{"id": "a1", "name": "Building ", "type": "aggregate"}],
            "geometry": {"x": 10, "y": 20},
            "metadata": "{\"newAggregate\": true}"
        })
        .to_string();

        let node = JsonNode::from_json(&json).unwrap();
        assert_eq!(node.node_type(), "command");
        assert_eq!(node.parent().unwrap().id(), "f1");
        assert_eq!(node.targets()[0].name(), "Building ");
        assert_eq!(node.metadata(), Some("{\"newAggregate\": true}"));
        assert_eq!(node.tags(), ["core".to_string()]);
    }

    #[test]
    fn null_and_inline_metadata() {
        let null = JsonNode::from_json(r#"{"id":"e1","type":"event","metadata":null}"#).unwrap();
        assert!(null.metadata().is_none());

        let inline =
            JsonNode::from_json(r#"{"id":"e1","type":"event","metadata":{"public":true}}"#).unwrap();
        assert_eq!(inline.metadata(), Some(r#"{"public":true}"#));
    }

    #[test]
    fn batch_accepts_single_node_or_array() {
        let one = JsonNode::from_json_batch(r#"{"id":"c1","type":"command"}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many = JsonNode::from_json_batch(
            r#"[{"id":"c1","type":"command"},{"id":"e1","type":"event"}]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].id(), "e1");
    }

    #[test]
    fn rejects_missing_or_blank_ids() {
        assert!(matches!(
            JsonNode::from_json(r#"{"type":"command"}"#),
            Err(DecodeError::Json(_))
        ));
        let nested = r#"{"id":"f1","type":"feature","childrenList":[{"id":" ","type":"command"}]}"#;
        assert!(matches!(
            JsonNode::from_json(nested),
            Err(DecodeError::MissingId(t)) if t == "command"
        ));
    }
}

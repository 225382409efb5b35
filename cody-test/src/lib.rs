// Board fixtures and helpers shared by the integration tests.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use cody_core::JsonNode;

// ── Ids ──────────────────────────────────────────────────────────

pub const FEATURE_BUILDING: &str = "stW5qRRPsQbowcNpiS8PNy";
pub const ADD_BUILDING: &str = "9bJ5Y7yuBcfWyei7i2ZSDC";
pub const BUILDING: &str = "buTwEKKNLBBo6WAERYN1Gn";
pub const BUILDING_ADDED: &str = "tF2ZuZCXsdQMhRmRXydfuW";
pub const BUILDING_DOC: &str = "4gYkBjXufnkWMN5ybfBvPq";
pub const NAME_VO: &str = "a4HLmzMb2g2MVQWXy4BKN1";
pub const CHECK_IN_USER: &str = "aKvhibi95v18MKjNjb6tL3";
pub const BUILDING_USER: &str = "eiaS8gtsBemMReTNbeNRXj";
pub const USER_CHECKED_IN: &str = "q3thtbbiWsgyRqGadCBLte";
pub const DOUBLE_CHECK_IN: &str = "8H79vCoLa3Y2RrpVy7ZMYE";

// ── Leaf nodes ───────────────────────────────────────────────────

fn feature() -> Value {
    json!({"id": FEATURE_BUILDING, "name": "Building", "type": "feature"})
}

fn leaf(id: &str, name: &str, node_type: &str) -> Value {
    json!({"id": id, "name": name, "type": node_type, "parent": feature()})
}

fn add_building_leaf() -> Value {
    leaf(ADD_BUILDING, "Add Building", "command")
}

fn building_leaf() -> Value {
    leaf(BUILDING, "Building ", "aggregate")
}

fn building_added_leaf() -> Value {
    leaf(BUILDING_ADDED, "Building Added", "event")
}

fn check_in_user_leaf() -> Value {
    leaf(CHECK_IN_USER, "Check In User ", "command")
}

fn building_user_leaf() -> Value {
    leaf(BUILDING_USER, "Building ", "aggregate")
}

fn user_checked_in_leaf() -> Value {
    leaf(USER_CHECKED_IN, "User Checked In", "event")
}

fn double_check_in_leaf() -> Value {
    leaf(DOUBLE_CHECK_IN, "Double Check In Detected ", "event")
}

fn edge(id: &str, source: Value, target: Value) -> Value {
    json!({"id": id, "name": "", "type": "edge", "sourcesList": [source], "targetsList": [target]})
}

// ── Focal documents ──────────────────────────────────────────────

/// Command "Add Building" targeting aggregate "Building".
pub fn add_building() -> Value {
    json!({
        "id": ADD_BUILDING,
        "name": "Add Building",
        "type": "command",
        "metadata": "{\"newAggregate\": true, \"schema\": {\"type\": \"object\", \"properties\": {\"name\": {\"$ref\": \"/definitions/Name\"}}}}",
        "parent": feature(),
        "targetsList": [building_leaf()]
    })
}

/// Event "Building Added" recorded by aggregate "Building".
pub fn building_added() -> Value {
    json!({
        "id": BUILDING_ADDED,
        "name": "Building Added",
        "type": "event",
        "parent": feature(),
        "sourcesList": [building_leaf()]
    })
}

/// Aggregate "Building" with its command, event and state document.
pub fn building() -> Value {
    json!({
        "id": BUILDING,
        "name": "Building ",
        "type": "aggregate",
        "parent": feature(),
        "sourcesList": [add_building_leaf()],
        "targetsList": [building_added_leaf(), leaf(BUILDING_DOC, "Building ", "document")]
    })
}

/// Second "Building" aggregate handling the check-in flow.
pub fn building_user() -> Value {
    json!({
        "id": BUILDING_USER,
        "name": "Building ",
        "type": "aggregate",
        "parent": feature(),
        "sourcesList": [check_in_user_leaf()],
        "targetsList": [user_checked_in_leaf(), double_check_in_leaf()]
    })
}

/// Value object "Name" attached to aggregate "Building".
pub fn name_vo() -> Value {
    json!({
        "id": NAME_VO,
        "name": "Name",
        "type": "document",
        "metadata": "{\"schema\": {\"type\": \"string\", \"minLength\": 1}}",
        "parent": feature(),
        "targetsList": [building_leaf()]
    })
}

/// Feature "Building" with both command flows, wired by two edges.
pub fn feature_building() -> Value {
    let child = |node: Value, sources: Vec<Value>, targets: Vec<Value>| {
        let mut node = node;
        node["sourcesList"] = Value::Array(sources);
        node["targetsList"] = Value::Array(targets);
        node
    };

    let mut node = feature();
    node["childrenList"] = json!([
        child(add_building_leaf(), vec![], vec![building_leaf()]),
        child(building_leaf(), vec![add_building_leaf()], vec![]),
        child(check_in_user_leaf(), vec![], vec![building_user_leaf()]),
        child(
            building_user_leaf(),
            vec![check_in_user_leaf()],
            vec![user_checked_in_leaf(), double_check_in_leaf()]
        ),
        child(user_checked_in_leaf(), vec![building_user_leaf()], vec![]),
        child(double_check_in_leaf(), vec![building_user_leaf()], vec![]),
        edge("edge-add-building", add_building_leaf(), building_leaf()),
        edge("edge-check-in-user", check_in_user_leaf(), building_user_leaf()),
    ]);
    node
}

/// Aggregate "Building" fed by two commands at once.
pub fn ambiguous_building() -> Value {
    json!({
        "id": BUILDING,
        "name": "Building ",
        "type": "aggregate",
        "parent": feature(),
        "sourcesList": [add_building_leaf(), check_in_user_leaf()]
    })
}

// ── Helpers ──────────────────────────────────────────────────────

/// Decode a fixture the same way board JSON is decoded.
pub fn node(fixture: &Value) -> JsonNode {
    JsonNode::from_json(&fixture.to_string()).expect("fixture decodes")
}

/// Write a fixture (or an array of fixtures) into `dir/name`.
pub fn write_fixture(dir: &Path, name: &str, fixture: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(fixture).expect("fixture serialises"))
        .expect("write fixture");
    path
}

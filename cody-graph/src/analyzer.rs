// Event-sourcing analyzer — accumulates vertices and connections node by node.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::connection::{
    AggregateConnectionMap, FeatureConnectionMap, VertexConnection, VertexConnectionMap,
};
use crate::graph::EventSourcingGraph;
use crate::node::{Node, NodeType, StructuralType};
use crate::vertex::{Vertex, VertexType};
use crate::vertex_map::{VertexMap, VertexMaps};
use crate::{GraphError, Result};

/// Stateful facade over [`EventSourcingGraph`].
///
/// Each [`analyse`](Self::analyse) call is atomic: the vertex maps of the
/// kinds the node touches and the changed connection records are staged, and
/// only committed once every fallible step has passed, so a failing call
/// leaves the analyzer unchanged.
#[derive(Debug)]
pub struct EventSourcingAnalyzer {
    graph: EventSourcingGraph,
    vertices: VertexMaps,
    aggregate_connections: AggregateConnectionMap,
    feature_connections: FeatureConnectionMap,
    connections: VertexConnectionMap,
    resolve_references: bool,
}

impl EventSourcingAnalyzer {
    pub fn new(graph: EventSourcingGraph) -> Self {
        Self {
            graph,
            vertices: VertexMaps::new(),
            aggregate_connections: AggregateConnectionMap::new(),
            feature_connections: FeatureConnectionMap::new(),
            connections: VertexConnectionMap::new(),
            resolve_references: true,
        }
    }

    /// Toggle `$ref` resolution of metadata schemas (on by default).
    #[must_use]
    pub fn with_reference_resolution(mut self, enabled: bool) -> Self {
        self.resolve_references = enabled;
        self
    }

    /// Fold one node and its immediate neighbourhood into the analysis.
    ///
    /// Returns the focal vertex's adjacency, or `None` when the focal node is
    /// a structural element (edge, layer, ...).
    pub fn analyse(&mut self, node: &dyn Node) -> Result<Option<&VertexConnection>> {
        let node_type = NodeType::of(node);
        if let NodeType::Unknown(tag) = &node_type {
            return Err(GraphError::UnsupportedType(tag.clone()));
        }
        self.check_kinds(node)?;

        let touched: Vec<VertexType> = VertexType::ALL
            .into_iter()
            .filter(|&kind| !EventSourcingGraph::nodes_of_type(node, kind).is_empty())
            .collect();
        let staged = touched
            .par_iter()
            .map(|&kind| {
                self.graph
                    .analyse_map(node, self.vertices.get(kind).clone(), kind)
                    .map(|map| (kind, map))
            })
            .collect::<Result<Vec<(VertexType, VertexMap)>>>()?;
        let previous: Vec<(VertexType, VertexMap)> = staged
            .into_iter()
            .map(|(kind, map)| (kind, self.vertices.replace(kind, map)))
            .collect();

        let changes = self.connection_changes(node);
        let (aggregate_changes, feature_changes) = match changes {
            Ok(changes) => changes,
            Err(err) => {
                for (kind, map) in previous {
                    self.vertices.set(kind, map);
                }
                return Err(err);
            }
        };

        let changed_aggregates = aggregate_changes.len();
        let changed_features = feature_changes.len();
        self.aggregate_connections.apply(aggregate_changes);
        self.feature_connections.apply(feature_changes);
        self.graph.analyse_vertex_connections(node, &mut self.connections)?;
        let resolved_refs = if self.resolve_references {
            self.graph.resolve_metadata_references(node, &mut self.vertices)
        } else {
            0
        };

        debug!(
            id = node.id(),
            node_type = node.node_type(),
            kinds = touched.len(),
            changed_aggregates,
            changed_features,
            resolved_refs,
            "Analysed node"
        );

        Ok(match node_type {
            NodeType::Vertex(_) => self.connections.connection(node.id()),
            _ => None,
        })
    }

    /// Staged aggregate and feature records for `node`, read against the
    /// current vertex maps.
    fn connection_changes(&self, node: &dyn Node) -> Result<(AggregateConnectionMap, FeatureConnectionMap)> {
        let aggregates =
            self.graph
                .analyse_aggregate_connection_map(node, &self.vertices, &self.aggregate_connections)?;
        let features =
            self.graph
                .analyse_feature_connection_map(node, &self.vertices, &self.feature_connections)?;
        Ok((aggregates, features))
    }

    /// An identity keeps the kind it was first analysed as; remove it before
    /// analysing it as another kind.
    fn check_kinds(&self, node: &dyn Node) -> Result<()> {
        let mut seen: HashMap<&str, VertexType> = HashMap::new();
        for kind in VertexType::ALL {
            for neighbour in EventSourcingGraph::nodes_of_type(node, kind) {
                let known = self
                    .vertices
                    .find(neighbour.id())
                    .map(Vertex::kind)
                    .or_else(|| seen.get(neighbour.id()).copied());
                if let Some(expected) = known.filter(|&expected| expected != kind) {
                    return Err(GraphError::KindMismatch {
                        expected,
                        found: kind,
                    });
                }
                seen.insert(neighbour.id(), kind);
            }
        }
        Ok(())
    }

    /// Forget a previously analysed identity.
    ///
    /// The id disappears from its vertex map, from every connection record
    /// and from the adjacency of its neighbours. Removing an edge only drops
    /// the links it stood for. Returns whether anything changed.
    pub fn remove(&mut self, node: &dyn Node) -> Result<bool> {
        let removed = match NodeType::of(node) {
            NodeType::Unknown(tag) => return Err(GraphError::UnsupportedType(tag)),
            NodeType::Structural(StructuralType::Edge) => {
                let targets: Vec<_> = node.targets().iter().map(|t| t.id().to_string()).collect();
                for source in node.sources() {
                    for target in &targets {
                        self.connections.unlink(source.id(), target);
                        self.aggregate_connections.unlink(source.id(), target);
                    }
                }
                !targets.is_empty()
            }
            NodeType::Structural(_) => false,
            NodeType::Vertex(kind) => {
                let id = node.id();
                let vertex = self.vertices.get_mut(kind).remove(id);
                let aggregate = self.aggregate_connections.remove(id);
                self.aggregate_connections.detach(id);
                let feature = self.feature_connections.remove(id);
                self.feature_connections.detach(id);
                let connection = self.connections.remove(id);
                vertex.is_some() || aggregate.is_some() || feature.is_some() || connection.is_some()
            }
        };

        debug!(id = node.id(), node_type = node.node_type(), removed, "Removed node");
        Ok(removed)
    }

    /// Drop all accumulated state.
    pub fn clear(&mut self) {
        self.vertices = VertexMaps::new();
        self.aggregate_connections = AggregateConnectionMap::new();
        self.feature_connections = FeatureConnectionMap::new();
        self.connections = VertexConnectionMap::new();
    }

    // ── Vertex maps ────────────────────────────────────────────────

    pub fn vertices(&self) -> &VertexMaps {
        &self.vertices
    }

    pub fn vertex_map(&self, kind: VertexType) -> &VertexMap {
        self.vertices.get(kind)
    }

    pub fn command_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Command)
    }

    pub fn event_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Event)
    }

    pub fn aggregate_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Aggregate)
    }

    pub fn document_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Document)
    }

    pub fn policy_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Policy)
    }

    pub fn ui_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Ui)
    }

    pub fn external_system_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::ExternalSystem)
    }

    pub fn hot_spot_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::HotSpot)
    }

    pub fn role_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Role)
    }

    pub fn feature_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::Feature)
    }

    pub fn bounded_context_map(&self) -> &VertexMap {
        self.vertex_map(VertexType::BoundedContext)
    }

    /// Vertex with `id`, whatever its kind.
    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.find(id)
    }

    // ── Connections ────────────────────────────────────────────────

    pub fn aggregate_connection_map(&self) -> &AggregateConnectionMap {
        &self.aggregate_connections
    }

    pub fn feature_connection_map(&self) -> &FeatureConnectionMap {
        &self.feature_connections
    }

    pub fn connection_map(&self) -> &VertexConnectionMap {
        &self.connections
    }

    pub fn connection(&self, id: &str) -> Option<&VertexConnection> {
        self.connections.connection(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.connections.has(id)
    }

    /// Number of vertices with an adjacency record.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.vertices.is_empty()
    }

    pub fn aggregate_of_command(&self, command: &str) -> Option<&Vertex> {
        self.aggregate_connections
            .aggregate_of_command(command)
            .and_then(|id| self.aggregate_map().vertex(id))
    }

    pub fn aggregate_of_event(&self, event: &str) -> Option<&Vertex> {
        self.aggregate_connections
            .aggregate_of_event(event)
            .and_then(|id| self.aggregate_map().vertex(id))
    }

    pub fn feature_of(&self, id: &str) -> Option<&Vertex> {
        self.feature_connections
            .feature_of(id)
            .and_then(|feature| self.feature_map().vertex(feature))
    }
}

impl Default for EventSourcingAnalyzer {
    fn default() -> Self {
        Self::new(EventSourcingGraph::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestNode;

    fn feature() -> TestNode {
        TestNode::new("f1", "feature", "Building Feature")
    }

    fn add_building() -> TestNode {
        TestNode::new("c1", "command", "Add Building")
            .parent(feature())
            .target(TestNode::new("a1", "aggregate", "Building ").parent(feature()))
    }

    #[test]
    fn analyse_returns_focal_adjacency() {
        let mut analyzer = EventSourcingAnalyzer::default();
        let conn = analyzer.analyse(&add_building()).unwrap().unwrap();

        assert_eq!(conn.vertex(), "c1");
        assert!(conn.to().contains("a1"));

        assert_eq!(analyzer.command_map().len(), 1);
        assert_eq!(analyzer.aggregate_map().len(), 1);
        assert_eq!(analyzer.feature_map().len(), 1);
        assert_eq!(analyzer.aggregate_connection_map().len(), 1);
        assert_eq!(analyzer.feature_connection_map().len(), 1);
        assert_eq!(analyzer.aggregate_of_command("c1").unwrap().name(), "Building");
        assert_eq!(analyzer.feature_of("c1").unwrap().id(), "f1");
        assert!(analyzer.has("a1"));
    }

    #[test]
    fn analysing_twice_is_idempotent() {
        let mut analyzer = EventSourcingAnalyzer::default();
        let node = add_building();
        analyzer.analyse(&node).unwrap();
        let vertices = analyzer.vertices().clone();
        let aggregates = analyzer.aggregate_connection_map().clone();
        let connections = analyzer.connection_map().clone();

        analyzer.analyse(&node).unwrap();
        assert_eq!(analyzer.vertices(), &vertices);
        assert_eq!(analyzer.aggregate_connection_map(), &aggregates);
        assert_eq!(analyzer.connection_map(), &connections);
    }

    #[test]
    fn structural_focal_returns_none() {
        let mut analyzer = EventSourcingAnalyzer::default();
        let layer = TestNode::new("l1", "layer", "Board").child(feature());
        assert!(analyzer.analyse(&layer).unwrap().is_none());
        assert_eq!(analyzer.feature_map().len(), 1);
        assert!(analyzer.has("f1"));
    }

    #[test]
    fn unsupported_focal_leaves_state_untouched() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&add_building()).unwrap();

        let err = analyzer.analyse(&TestNode::new("s1", "sticky", "Note")).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedType(_)));
        assert_eq!(analyzer.len(), 3);
    }

    #[test]
    fn failed_analysis_is_atomic() {
        let mut analyzer = EventSourcingAnalyzer::default();
        let bad = TestNode::new("a1", "aggregate", "Building")
            .source(TestNode::new("c1", "command", "Add Building"))
            .source(TestNode::new("c2", "command", "Rename Building"));

        let err = analyzer.analyse(&bad).unwrap_err();
        assert!(matches!(err, GraphError::AmbiguousCommand { .. }));
        assert!(analyzer.is_empty());
        assert!(analyzer.command_map().is_empty());
    }

    #[test]
    fn conflicting_command_from_neighbour_is_rejected() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&add_building()).unwrap();

        let rival = TestNode::new("c2", "command", "Rename Building")
            .target(TestNode::new("a1", "aggregate", "Building"));
        let err = analyzer.analyse(&rival).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Multiple command connections to aggregate \"Building\" found. Can not handle it. \
             Commands: Add Building, Rename Building"
        );
        assert!(!analyzer.command_map().has("c2"));
    }

    #[test]
    fn remove_detaches_identity_everywhere() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&add_building()).unwrap();

        let removed = analyzer
            .remove(&TestNode::new("c1", "command", "Add Building"))
            .unwrap();

        assert!(removed);
        assert!(analyzer.command_map().is_empty());
        assert!(!analyzer.has("c1"));
        assert!(analyzer.aggregate_of_command("c1").is_none());
        assert!(analyzer.aggregate_map().has("a1"));
        assert!(analyzer.connection("a1").unwrap().from().is_empty());
        assert!(analyzer.feature_of("c1").is_none());
    }

    #[test]
    fn remove_edge_unlinks_endpoints() {
        let mut analyzer = EventSourcingAnalyzer::default();
        let edge = || {
            TestNode::new("x1", "edge", "")
                .source(TestNode::new("c1", "command", "Add Building"))
                .target(TestNode::new("a1", "aggregate", "Building"))
        };
        analyzer.analyse(&edge()).unwrap();
        assert!(analyzer.connection("c1").unwrap().to().contains("a1"));

        assert!(analyzer.remove(&edge()).unwrap());
        assert!(analyzer.connection("c1").unwrap().to().is_empty());
        assert!(analyzer.has("a1"));
    }

    #[test]
    fn rewired_command_frees_its_old_aggregate() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&add_building()).unwrap();

        let rewired = TestNode::new("c1", "command", "Add Building")
            .parent(feature())
            .target(TestNode::new("a2", "aggregate", "House").parent(feature()));
        analyzer.analyse(&rewired).unwrap();
        assert_eq!(analyzer.aggregate_of_command("c1").unwrap().id(), "a2");
        assert_eq!(analyzer.aggregate_connection_map().connection("a1").unwrap().command(), None);

        let rival = TestNode::new("c2", "command", "Rename Building")
            .parent(feature())
            .target(TestNode::new("a1", "aggregate", "Building").parent(feature()));
        analyzer.analyse(&rival).unwrap();
        assert_eq!(analyzer.aggregate_of_command("c2").unwrap().id(), "a1");
        assert!(analyzer.connection("a1").unwrap().from().contains("c2"));
        assert!(!analyzer.connection("a1").unwrap().from().contains("c1"));
    }

    #[test]
    fn removing_an_edge_frees_the_command_slot() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&add_building()).unwrap();

        let edge = TestNode::new("x1", "edge", "")
            .source(TestNode::new("c1", "command", "Add Building"))
            .target(TestNode::new("a1", "aggregate", "Building"));
        assert!(analyzer.remove(&edge).unwrap());

        assert!(analyzer.aggregate_of_command("c1").is_none());
        assert!(analyzer.aggregate_map().has("a1"));
        assert!(analyzer.command_map().has("c1"));
    }

    #[test]
    fn retyping_a_known_identity_is_rejected() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&TestNode::new("x1", "command", "Check In")).unwrap();

        let err = analyzer
            .analyse(&TestNode::new("x1", "event", "Checked In"))
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::KindMismatch {
                expected: VertexType::Command,
                found: VertexType::Event
            }
        ));
        assert_eq!(analyzer.vertices().len(), 1);
        assert!(analyzer.event_map().is_empty());

        analyzer.remove(&TestNode::new("x1", "command", "Check In")).unwrap();
        analyzer.analyse(&TestNode::new("x1", "event", "Checked In")).unwrap();
        assert_eq!(analyzer.vertex("x1").unwrap().kind(), VertexType::Event);
        assert_eq!(analyzer.vertices().len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut analyzer = EventSourcingAnalyzer::default();
        analyzer.analyse(&add_building()).unwrap();
        analyzer.clear();
        assert!(analyzer.is_empty());
        assert!(analyzer.vertex("c1").is_none());
    }
}

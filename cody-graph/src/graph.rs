// Event-sourcing graph rules — derive vertices and connections from one focal node.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::connection::{
    Adjacency, AggregateConnection, AggregateConnectionMap, CommandConflict, Endpoint,
    FeatureConnection, FeatureConnectionMap, VertexConnectionMap,
};
use crate::filter::NameFilter;
use crate::metadata::{Metadata, MetadataFactory, reference_name};
use crate::node::{Node, NodeType, StructuralType, vertex_type_of};
use crate::vertex::{Vertex, VertexType};
use crate::vertex_map::{VertexMap, VertexMaps};
use crate::{GraphError, Result};

/// Stateless rule engine; the name filter and metadata factory are its only
/// configuration.
pub struct EventSourcingGraph {
    filter: Arc<dyn NameFilter>,
    metadata_factory: Option<Arc<dyn MetadataFactory>>,
}

impl std::fmt::Debug for EventSourcingGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcingGraph")
            .field("metadata_factory", &self.metadata_factory.is_some())
            .finish_non_exhaustive()
    }
}

impl EventSourcingGraph {
    pub fn new(filter: impl NameFilter + 'static) -> Self {
        Self {
            filter: Arc::new(filter),
            metadata_factory: None,
        }
    }

    #[must_use]
    pub fn with_metadata_factory(mut self, factory: impl MetadataFactory + 'static) -> Self {
        self.metadata_factory = Some(Arc::new(factory));
        self
    }

    pub fn filter_name(&self, label: &str) -> String {
        self.filter.filter(label)
    }

    /// Same filtered name and type tag.
    pub fn are_nodes_equal(&self, node: &dyn Node, vertex: &Vertex) -> bool {
        node.node_type() == vertex.kind().as_str() && self.filter_name(node.name()) == vertex.name()
    }

    /// Same id and type tag.
    pub fn are_nodes_identical(node: &dyn Node, vertex: &Vertex) -> bool {
        node.node_type() == vertex.kind().as_str() && node.id() == vertex.id()
    }

    pub fn vertex(&self, node: &dyn Node) -> Result<Vertex> {
        Vertex::from_node(node, self.filter.as_ref(), self.metadata_factory.as_deref())
    }

    // ── Vertex maps ────────────────────────────────────────────────

    /// Nodes of `kind` in the focal neighbourhood: the node itself, its
    /// parent, sources, targets and children, in that order.
    pub fn nodes_of_type(node: &dyn Node, kind: VertexType) -> Vec<&dyn Node> {
        std::iter::once(node)
            .chain(node.parent())
            .chain(node.sources())
            .chain(node.targets())
            .chain(node.children())
            .filter(|n| n.node_type() == kind.as_str())
            .collect()
    }

    pub fn vertices_of_type(&self, node: &dyn Node, kind: VertexType) -> Result<Vec<Vertex>> {
        Self::nodes_of_type(node, kind)
            .into_iter()
            .map(|n| {
                Vertex::typed(
                    kind,
                    n,
                    self.filter.as_ref(),
                    self.metadata_factory.as_deref(),
                )
            })
            .collect()
    }

    /// Merge the vertices of `kind` found around `node` into `map`.
    pub fn analyse_map(&self, node: &dyn Node, mut map: VertexMap, kind: VertexType) -> Result<VertexMap> {
        for vertex in self.vertices_of_type(node, kind)? {
            map.insert(vertex)?;
        }
        Ok(map)
    }

    /// The analysed vertex for `node`. Its kind's map must hold it already.
    pub fn vertex_of_node<'m>(&self, node: &dyn Node, maps: &'m VertexMaps) -> Result<&'m Vertex> {
        let kind = VertexType::parse(node.node_type())?;
        maps.vertex(kind, node.id())
            .ok_or_else(|| GraphError::VertexNotFound {
                kind,
                id: node.id().to_string(),
            })
    }

    // ── Typed connections ──────────────────────────────────────────

    /// Aggregate records touched by `node`, staged on top of `current`.
    ///
    /// Only changed records are returned; [`AggregateConnectionMap::apply`]
    /// commits them. A command, event or document focal node is detached
    /// from every aggregate its neighbourhood no longer reaches.
    pub fn analyse_aggregate_connection_map(
        &self,
        node: &dyn Node,
        maps: &VertexMaps,
        current: &AggregateConnectionMap,
    ) -> Result<AggregateConnectionMap> {
        let mut changes = AggregateConnectionMap::new();
        let mut reached = IndexSet::new();
        for candidate in Self::nodes_of_type(node, VertexType::Aggregate) {
            let aggregate = self.vertex_of_node(candidate, maps)?;

            let commands = self.connected_of_type(node, VertexType::Command, aggregate, maps)?;
            let events = self.connected_of_type(node, VertexType::Event, aggregate, maps)?;
            let documents = self.connected_of_type(node, VertexType::Document, aggregate, maps)?;

            if commands.len() > 1 {
                return Err(GraphError::AmbiguousCommand {
                    aggregate: aggregate.name().to_string(),
                    commands: commands.iter().map(|id| display_name(id, maps)).collect(),
                });
            }

            let connection = match commands.into_iter().next() {
                Some(command) => AggregateConnection::new(aggregate.id()).with_command_events(command, events),
                None => AggregateConnection::new(aggregate.id()).with_events(events),
            }
            .with_documents(documents);

            if connection.contains(node.id()) {
                reached.insert(aggregate.id().to_string());
            }
            if candidate.id() == node.id() {
                changes.replace(connection);
            } else {
                changes
                    .staged(current, aggregate.id())
                    .merge(&connection)
                    .map_err(|conflict| ambiguous(&conflict, maps))?;
            }
        }

        if matches!(
            vertex_type_of(node),
            Some(VertexType::Command | VertexType::Event | VertexType::Document)
        ) {
            changes.detach_except(current, node.id(), &reached);
        }
        Ok(changes)
    }

    /// Feature records touched by `node`, staged on top of `current`.
    pub fn analyse_feature_connection_map(
        &self,
        node: &dyn Node,
        maps: &VertexMaps,
        current: &FeatureConnectionMap,
    ) -> Result<FeatureConnectionMap> {
        let mut changes = FeatureConnectionMap::new();
        let mut reached = IndexSet::new();
        for candidate in Self::nodes_of_type(node, VertexType::Feature) {
            let feature = self.vertex_of_node(candidate, maps)?;

            let mut connection = FeatureConnection::new(feature.id());
            for kind in FeatureConnection::MEMBER_KINDS {
                connection = connection.with(kind, self.connected_of_type(node, kind, feature, maps)?);
            }

            if connection.contains(node.id()) {
                reached.insert(feature.id().to_string());
            }
            if candidate.id() == node.id() {
                changes.replace(connection);
            } else {
                changes.staged(current, feature.id()).merge(&connection);
            }
        }

        // focal kinds that register themselves with their parent feature
        if matches!(
            vertex_type_of(node),
            Some(VertexType::Aggregate | VertexType::Command | VertexType::Event | VertexType::Document)
        ) {
            changes.detach_except(current, node.id(), &reached);
        }
        Ok(changes)
    }

    /// Ids of `kind` around the focal node that belong to `anchor`.
    ///
    /// Which neighbours count depends on the focal node's own kind; focal
    /// kinds other than aggregate, command, event, document and feature
    /// contribute nothing.
    fn connected_of_type(
        &self,
        node: &dyn Node,
        kind: VertexType,
        anchor: &Vertex,
        maps: &VertexMaps,
    ) -> Result<IndexSet<String>> {
        let mut found = IndexSet::new();
        let focal_is_kind = node.node_type() == kind.as_str();
        let parent_is_anchor = node
            .parent()
            .is_some_and(|parent| self.are_nodes_equal(parent, anchor));

        match vertex_type_of(node) {
            Some(VertexType::Aggregate) => {
                for neighbour in node.sources().into_iter().chain(node.targets()) {
                    if neighbour.node_type() != kind.as_str() {
                        continue;
                    }
                    if let Some(vertex) = maps.vertex(kind, neighbour.id()) {
                        found.insert(vertex.id().to_string());
                    }
                }
                if focal_is_kind && parent_is_anchor {
                    found.insert(self.vertex_of_node(node, maps)?.id().to_string());
                }
            }
            Some(VertexType::Command | VertexType::Event | VertexType::Document) => {
                for neighbour in node.sources().into_iter().chain(node.targets()) {
                    if focal_is_kind && self.are_nodes_equal(neighbour, anchor) {
                        found.insert(self.vertex_of_node(node, maps)?.id().to_string());
                    } else if let Some(parent) = neighbour.parent() {
                        if neighbour.node_type() == kind.as_str() && self.are_nodes_equal(parent, anchor) {
                            found.insert(self.vertex_of_node(neighbour, maps)?.id().to_string());
                        }
                    }
                }
                if focal_is_kind && parent_is_anchor {
                    found.insert(self.vertex_of_node(node, maps)?.id().to_string());
                }
            }
            Some(VertexType::Feature) => {
                for child in node.children() {
                    if child.node_type() != kind.as_str() {
                        continue;
                    }
                    let Some(vertex) = maps.vertex(kind, child.id()) else {
                        continue;
                    };
                    if anchor.kind() == VertexType::Feature || Self::is_wired_to(node, vertex, anchor) {
                        found.insert(vertex.id().to_string());
                    }
                }
            }
            _ => {}
        }
        Ok(found)
    }

    /// Whether a non-edge child of `feature` identical to `anchor` has
    /// `vertex` among its sources or targets.
    fn is_wired_to(feature: &dyn Node, vertex: &Vertex, anchor: &Vertex) -> bool {
        feature
            .children()
            .into_iter()
            .filter(|child| child.node_type() != StructuralType::Edge.as_str())
            .filter(|child| Self::are_nodes_identical(*child, anchor))
            .any(|child| {
                child
                    .sources()
                    .into_iter()
                    .chain(child.targets())
                    .any(|n| Self::are_nodes_identical(n, vertex))
            })
    }

    // ── Generic adjacency ──────────────────────────────────────────

    /// Update the adjacency records around `node`.
    ///
    /// A vertex focal node has its neighbourhood replaced. An edge links each
    /// vertex source to each vertex target; other structural nodes only
    /// register their vertex neighbours. An unknown tag fails before `map`
    /// is touched.
    pub fn analyse_vertex_connections(&self, node: &dyn Node, map: &mut VertexConnectionMap) -> Result<()> {
        match NodeType::of(node) {
            NodeType::Vertex(kind) => {
                let focal = (node.id().to_string(), kind);
                let adjacency = Adjacency {
                    from: endpoints(node.sources()),
                    to: endpoints(node.targets()),
                    parent: node.parent().and_then(endpoint),
                    children: endpoints(node.children()),
                };
                map.replace(&focal, adjacency);

                if kind == VertexType::Feature {
                    for child in node.children() {
                        let Some(child_end) = endpoint(child) else {
                            continue;
                        };
                        for source in endpoints(child.sources()) {
                            map.link(&source, &child_end);
                        }
                        for target in endpoints(child.targets()) {
                            map.link(&child_end, &target);
                        }
                    }
                }
            }
            NodeType::Structural(StructuralType::Edge) => {
                let targets = endpoints(node.targets());
                for source in endpoints(node.sources()) {
                    for target in &targets {
                        map.link(&source, target);
                    }
                }
            }
            NodeType::Structural(_) => {
                let neighbours = node
                    .parent()
                    .into_iter()
                    .chain(node.sources())
                    .chain(node.targets())
                    .chain(node.children());
                for (id, kind) in neighbours.filter_map(endpoint) {
                    map.ensure(&id, kind);
                }
            }
            NodeType::Unknown(tag) => return Err(GraphError::UnsupportedType(tag)),
        }
        Ok(())
    }

    // ── Metadata references ────────────────────────────────────────

    /// Resolve `$ref` schema references of the focal vertex and its direct
    /// neighbours against the schemas of named documents.
    ///
    /// Returns the number of substituted references.
    pub fn resolve_metadata_references(&self, node: &dyn Node, maps: &mut VertexMaps) -> usize {
        let ids: IndexSet<String> = std::iter::once(node)
            .chain(node.parent())
            .chain(node.sources())
            .chain(node.targets())
            .chain(node.children())
            .filter(|n| vertex_type_of(*n).is_some())
            .map(|n| n.id().to_string())
            .collect();

        let documents = maps.get(VertexType::Document);
        let mut resolved = Vec::new();
        for id in &ids {
            let Some(instance) = maps.find(id).and_then(Vertex::metadata_instance) else {
                continue;
            };
            if instance.references().is_empty() {
                continue;
            }
            let mut instance = instance.clone();
            let count = instance.resolve_references(|target| {
                let name = self.filter_name(reference_name(target));
                documents
                    .vertex_by_name(&name)
                    .and_then(Vertex::metadata_instance)
                    .and_then(Metadata::schema)
                    .cloned()
            });
            if count > 0 {
                resolved.push((id, instance, count));
            }
        }

        let mut total = 0;
        for (id, instance, count) in resolved {
            if let Some(vertex) = maps.find_mut(id) {
                vertex.replace_metadata_instance(instance);
                total += count;
            }
        }
        total
    }
}

impl Default for EventSourcingGraph {
    fn default() -> Self {
        Self::new(crate::filter::Trim)
    }
}

fn endpoint(node: &dyn Node) -> Option<Endpoint> {
    vertex_type_of(node).map(|kind| (node.id().to_string(), kind))
}

fn endpoints(nodes: Vec<&dyn Node>) -> Vec<Endpoint> {
    nodes.into_iter().filter_map(endpoint).collect()
}

fn display_name(id: &str, maps: &VertexMaps) -> String {
    maps.find(id)
        .map_or_else(|| id.to_string(), |v| v.name().to_string())
}

fn ambiguous(conflict: &CommandConflict, maps: &VertexMaps) -> GraphError {
    GraphError::AmbiguousCommand {
        aggregate: display_name(&conflict.aggregate, maps),
        commands: vec![
            display_name(&conflict.existing, maps),
            display_name(&conflict.incoming, maps),
        ],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::metadata::{AggregateMetadata, DocumentMetadata};
    use crate::test_support::TestNode;

    fn feature() -> TestNode {
        TestNode::new("f1", "feature", "Building Feature")
    }

    fn building() -> TestNode {
        TestNode::new("a1", "aggregate", "Building ").parent(feature())
    }

    fn add_building() -> TestNode {
        TestNode::new("c1", "command", "Add Building")
            .parent(feature())
            .target(building())
    }

    fn building_added() -> TestNode {
        TestNode::new("e1", "event", "Building Added")
            .parent(feature())
            .source(building())
    }

    fn stage(graph: &EventSourcingGraph, node: &dyn Node, maps: &VertexMaps) -> VertexMaps {
        let mut staged = VertexMaps::new();
        for kind in VertexType::ALL {
            let map = graph.analyse_map(node, maps.get(kind).clone(), kind).unwrap();
            staged.set(kind, map);
        }
        staged
    }

    fn aggregates(
        graph: &EventSourcingGraph,
        node: &dyn Node,
        maps: &VertexMaps,
        mut map: AggregateConnectionMap,
    ) -> Result<AggregateConnectionMap> {
        let changes = graph.analyse_aggregate_connection_map(node, maps, &map)?;
        map.apply(changes);
        Ok(map)
    }

    fn features(
        graph: &EventSourcingGraph,
        node: &dyn Node,
        maps: &VertexMaps,
        mut map: FeatureConnectionMap,
    ) -> Result<FeatureConnectionMap> {
        let changes = graph.analyse_feature_connection_map(node, maps, &map)?;
        map.apply(changes);
        Ok(map)
    }

    #[test]
    fn nodes_of_type_scans_neighbourhood_in_order() {
        let node = add_building();
        let graph = EventSourcingGraph::default();

        let commands = EventSourcingGraph::nodes_of_type(&node, VertexType::Command);
        assert_eq!(commands.len(), 1);
        let aggregates = EventSourcingGraph::nodes_of_type(&node, VertexType::Aggregate);
        assert_eq!(aggregates[0].id(), "a1");
        let features = EventSourcingGraph::nodes_of_type(&node, VertexType::Feature);
        assert_eq!(features[0].id(), "f1");

        let vertices = graph.vertices_of_type(&node, VertexType::Aggregate).unwrap();
        assert_eq!(vertices[0].name(), "Building");
    }

    #[test]
    fn structural_nodes_never_become_vertices() {
        let graph = EventSourcingGraph::default();
        let edge = TestNode::new("x1", "edge", "")
            .source(TestNode::new("c1", "command", "Add Building"))
            .target(TestNode::new("a1", "aggregate", "Building"));

        let maps = stage(&graph, &edge, &VertexMaps::new());
        assert_eq!(maps.len(), 2);
        assert!(maps.find("x1").is_none());
    }

    #[test]
    fn vertex_of_node_requires_analysed_map() {
        let graph = EventSourcingGraph::default();
        let node = add_building();
        let err = graph.vertex_of_node(&node, &VertexMaps::new()).unwrap_err();
        assert!(matches!(err, GraphError::VertexNotFound { .. }));

        let maps = stage(&graph, &node, &VertexMaps::new());
        assert_eq!(graph.vertex_of_node(&node, &maps).unwrap().id(), "c1");
    }

    #[test]
    fn command_focal_drives_target_aggregate() {
        let graph = EventSourcingGraph::default();
        let node = add_building();
        let maps = stage(&graph, &node, &VertexMaps::new());

        let map = aggregates(&graph, &node, &maps, AggregateConnectionMap::new())
            .unwrap();

        assert_eq!(map.len(), 1);
        let conn = map.connection("a1").unwrap();
        assert_eq!(conn.command(), Some("c1"));
        assert_eq!(conn.events().count(), 0);
        assert_eq!(conn.documents().count(), 0);
    }

    #[test]
    fn event_neighbour_merges_into_existing_flow() {
        let graph = EventSourcingGraph::default();
        let first = add_building();
        let maps = stage(&graph, &first, &VertexMaps::new());
        let map = aggregates(&graph, &first, &maps, AggregateConnectionMap::new())
            .unwrap();

        let second = building_added();
        let maps = stage(&graph, &second, &maps);
        let map = aggregates(&graph, &second, &maps, map)
            .unwrap();

        let conn = map.connection("a1").unwrap();
        assert_eq!(conn.command(), Some("c1"));
        assert_eq!(conn.events().collect::<Vec<_>>(), vec!["e1"]);
    }

    #[test]
    fn two_commands_into_one_aggregate_fail() {
        let graph = EventSourcingGraph::default();
        let node = TestNode::new("a1", "aggregate", "Building")
            .source(TestNode::new("c1", "command", "Add Building"))
            .source(TestNode::new("c2", "command", "Rename Building"));
        let maps = stage(&graph, &node, &VertexMaps::new());

        let err = aggregates(&graph, &node, &maps, AggregateConnectionMap::new())
            .unwrap_err();

        assert!(
            err.to_string()
                .starts_with("Multiple command connections to aggregate \"Building\" found.")
        );
    }

    #[test]
    fn aggregate_focal_replaces_its_record() {
        let graph = EventSourcingGraph::default();
        let first = add_building();
        let maps = stage(&graph, &first, &VertexMaps::new());
        let map = aggregates(&graph, &first, &maps, AggregateConnectionMap::new())
            .unwrap();

        // the aggregate now only has an outgoing event
        let focal = TestNode::new("a1", "aggregate", "Building")
            .parent(feature())
            .target(TestNode::new("e1", "event", "Building Added"));
        let maps = stage(&graph, &focal, &maps);
        let map = aggregates(&graph, &focal, &maps, map)
            .unwrap();

        let conn = map.connection("a1").unwrap();
        assert_eq!(conn.command(), None);
        assert_eq!(conn.events().collect::<Vec<_>>(), vec!["e1"]);
    }

    #[test]
    fn command_focal_leaves_aggregates_it_no_longer_targets() {
        let graph = EventSourcingGraph::default();
        let first = add_building();
        let maps = stage(&graph, &first, &VertexMaps::new());
        let map = aggregates(&graph, &first, &maps, AggregateConnectionMap::new()).unwrap();

        let rewired = TestNode::new("c1", "command", "Add Building")
            .parent(feature())
            .target(TestNode::new("a2", "aggregate", "House").parent(feature()));
        let maps = stage(&graph, &rewired, &maps);
        let changes = graph
            .analyse_aggregate_connection_map(&rewired, &maps, &map)
            .unwrap();
        assert_eq!(changes.len(), 2);

        let map = aggregates(&graph, &rewired, &maps, map).unwrap();
        assert_eq!(map.connection("a1").unwrap().command(), None);
        assert_eq!(map.aggregate_of_command("c1"), Some("a2"));
    }

    #[test]
    fn feature_connection_from_child_command() {
        let graph = EventSourcingGraph::default();
        let node = add_building();
        let maps = stage(&graph, &node, &VertexMaps::new());

        let map = features(&graph, &node, &maps, FeatureConnectionMap::new())
            .unwrap();

        let conn = map.connection("f1").unwrap();
        assert!(conn.commands().contains("c1"));
        assert!(conn.aggregates().contains("a1"));
        assert!(conn.events().is_empty());
    }

    #[test]
    fn feature_focal_wires_children_per_aggregate() {
        let graph = EventSourcingGraph::default();
        let cmd = TestNode::new("c1", "command", "Add Building");
        let evt = TestNode::new("e1", "event", "Building Added");
        let other = TestNode::new("c2", "command", "Check In User");
        let node = TestNode::new("f1", "feature", "Building Feature")
            .child(cmd.clone())
            .child(evt.clone())
            .child(other)
            .child(
                TestNode::new("a1", "aggregate", "Building")
                    .source(cmd.clone())
                    .target(evt.clone()),
            )
            .child(TestNode::new("x1", "edge", "").source(cmd).target(TestNode::new("a1", "aggregate", "Building")));
        let maps = stage(&graph, &node, &VertexMaps::new());

        let features = features(&graph, &node, &maps, FeatureConnectionMap::new())
            .unwrap();
        let conn = features.connection("f1").unwrap();
        assert_eq!(conn.commands().len(), 2);
        assert_eq!(conn.events().len(), 1);
        assert_eq!(conn.aggregates().len(), 1);

        let aggregates = aggregates(&graph, &node, &maps, AggregateConnectionMap::new())
            .unwrap();
        // the feature is the focal node, so a1 is reached as a neighbour
        let conn = aggregates.connection("a1").unwrap();
        assert_eq!(conn.command(), Some("c1"));
        assert_eq!(conn.events().collect::<Vec<_>>(), vec!["e1"]);
    }

    #[test]
    fn other_focal_kinds_add_no_typed_members() {
        let graph = EventSourcingGraph::default();
        let node = TestNode::new("p1", "policy", "Notify Admin")
            .parent(feature())
            .source(TestNode::new("e1", "event", "Building Added").parent(feature()));
        let maps = stage(&graph, &node, &VertexMaps::new());

        let features = features(&graph, &node, &maps, FeatureConnectionMap::new())
            .unwrap();
        assert!(features.connection("f1").unwrap().is_empty());
    }

    #[test]
    fn vertex_connections_replace_focal_neighbourhood() {
        let graph = EventSourcingGraph::default();
        let node = add_building();
        let mut map = VertexConnectionMap::new();
        graph.analyse_vertex_connections(&node, &mut map).unwrap();

        let conn = map.connection("c1").unwrap();
        assert!(conn.to().contains("a1"));
        assert_eq!(conn.parent(), Some("f1"));
        assert!(map.connection("a1").unwrap().from().contains("c1"));
        assert!(map.connection("f1").unwrap().children().contains("c1"));
    }

    #[test]
    fn edge_focal_links_endpoints() {
        let graph = EventSourcingGraph::default();
        let edge = TestNode::new("x1", "edge", "")
            .source(TestNode::new("c1", "command", "Add Building"))
            .target(TestNode::new("a1", "aggregate", "Building"));

        let mut map = VertexConnectionMap::new();
        graph.analyse_vertex_connections(&edge, &mut map).unwrap();

        assert!(!map.has("x1"));
        assert!(map.connection("c1").unwrap().to().contains("a1"));
    }

    #[test]
    fn unknown_focal_type_is_unsupported() {
        let graph = EventSourcingGraph::default();
        let node = TestNode::new("s1", "sticky", "Note");
        let mut map = VertexConnectionMap::new();
        let err = graph.analyse_vertex_connections(&node, &mut map).unwrap_err();
        assert_eq!(err.to_string(), "Type \"sticky\" is not supported");
    }

    #[test]
    fn schema_references_resolve_against_documents() {
        let graph = EventSourcingGraph::default();
        let node = TestNode::new("a1", "aggregate", "Building")
            .target(TestNode::new("d1", "document", "Name"));
        let mut maps = stage(&graph, &node, &VertexMaps::new());

        let name = Vertex::new("d1", VertexType::Document, "Name")
            .with_metadata_instance(Metadata::Document(DocumentMetadata {
                schema: Some(json!({"type": "string", "minLength": 1})),
            }))
            .unwrap();
        maps.get_mut(VertexType::Document).insert(name).unwrap();
        let building = Vertex::new("a1", VertexType::Aggregate, "Building")
            .with_metadata_instance(Metadata::Aggregate(AggregateMetadata {
                schema: Some(json!({"properties": {"name": {"$ref": "/Name"}}})),
            }))
            .unwrap();
        maps.get_mut(VertexType::Aggregate).insert(building).unwrap();

        assert_eq!(graph.resolve_metadata_references(&node, &mut maps), 1);
        let schema = maps
            .vertex(VertexType::Aggregate, "a1")
            .and_then(Vertex::metadata_instance)
            .and_then(Metadata::schema)
            .unwrap();
        assert_eq!(schema["properties"]["name"]["minLength"], json!(1));
    }

    #[test]
    fn closure_filters_drive_equality() {
        let graph = EventSourcingGraph::new(|s: &str| s.trim().to_lowercase());
        let node = TestNode::new("a9", "aggregate", " BUILDING ");
        let vertex = Vertex::new("a1", VertexType::Aggregate, "building");
        assert!(graph.are_nodes_equal(&node, &vertex));
        assert!(!EventSourcingGraph::are_nodes_identical(&node, &vertex));
    }
}

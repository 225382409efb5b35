// In-memory node tree for unit tests.

use crate::node::Node;

#[derive(Debug, Clone, Default)]
pub(crate) struct TestNode {
    id: String,
    name: String,
    node_type: String,
    tags: Vec<String>,
    parent: Option<Box<TestNode>>,
    children: Vec<TestNode>,
    sources: Vec<TestNode>,
    targets: Vec<TestNode>,
    metadata: Option<String>,
}

impl TestNode {
    pub(crate) fn new(id: &str, node_type: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            node_type: node_type.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn parent(mut self, parent: TestNode) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub(crate) fn child(mut self, child: TestNode) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn source(mut self, source: TestNode) -> Self {
        self.sources.push(source);
        self
    }

    pub(crate) fn target(mut self, target: TestNode) -> Self {
        self.targets.push(target);
        self
    }
}

impl Node for TestNode {
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
        self.node_type == "layer"
    }

    fn is_default_layer(&self) -> bool {
        false
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

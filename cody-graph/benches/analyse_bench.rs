// Benchmark analyser throughput on synthetic features of growing size.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use cody_graph::{EventSourcingAnalyzer, Node};

struct BenchNode {
    id: String,
    name: String,
    node_type: &'static str,
    children: Vec<BenchNode>,
    sources: Vec<BenchNode>,
    targets: Vec<BenchNode>,
}

impl BenchNode {
    fn new(id: String, node_type: &'static str) -> Self {
        Self {
            name: format!("{node_type} {id}"),
            id,
            node_type,
            children: Vec::new(),
            sources: Vec::new(),
            targets: Vec::new(),
        }
    }

    fn leaf(&self) -> Self {
        Self::new(self.id.clone(), self.node_type)
    }
}

impl Node for BenchNode {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn node_type(&self) -> &str {
        self.node_type
    }
    fn tags(&self) -> &[String] {
        &[]
    }
    fn is_layer(&self) -> bool {
        false
    }
    fn is_default_layer(&self) -> bool {
        false
    }
    fn parent(&self) -> Option<&dyn Node> {
        None
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
        None
    }
}

/// One feature holding `slices` command → aggregate → event slices.
fn build_feature(slices: usize) -> BenchNode {
    let mut feature = BenchNode::new("feature".to_string(), "feature");
    for i in 0..slices {
        let command = BenchNode::new(format!("c{i}"), "command");
        let event = BenchNode::new(format!("e{i}"), "event");
        let mut aggregate = BenchNode::new(format!("a{i}"), "aggregate");
        aggregate.sources.push(command.leaf());
        aggregate.targets.push(event.leaf());
        feature.children.push(command);
        feature.children.push(aggregate);
        feature.children.push(event);
    }
    feature
}

fn bench_analyse(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyse_feature");
    for slices in [10, 100, 500] {
        let feature = build_feature(slices);
        group.bench_with_input(BenchmarkId::from_parameter(slices), &feature, |b, feature| {
            b.iter(|| {
                let mut analyzer = EventSourcingAnalyzer::default();
                analyzer.analyse(feature).unwrap();
                analyzer.len()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_analyse);
criterion_main!(benches);

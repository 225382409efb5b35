// Summary — serialisable snapshot of an analysis, keyed by vertex names.

use std::fmt::Write as _;

use serde::Serialize;

use cody_graph::{EventSourcingAnalyzer, FeatureConnection, VertexType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindCount {
    pub kind: VertexType,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VertexSummary {
    pub id: String,
    pub kind: VertexType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub aggregate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub events: Vec<String>,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub kind: VertexType,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    pub feature: String,
    pub members: Vec<MemberSummary>,
}

/// What an analyzer currently knows, with ids resolved to names.
///
/// Kinds without vertices and empty member sets are left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub counts: Vec<KindCount>,
    pub vertices: Vec<VertexSummary>,
    pub aggregates: Vec<AggregateSummary>,
    pub features: Vec<FeatureSummary>,
}

impl AnalysisSummary {
    pub fn from_analyzer(analyzer: &EventSourcingAnalyzer) -> Self {
        let name_of = |id: &str| {
            analyzer
                .vertex(id)
                .map_or_else(|| id.to_string(), |v| v.name().to_string())
        };

        let counts = analyzer
            .vertices()
            .iter()
            .filter(|(_, map)| !map.is_empty())
            .map(|(kind, map)| KindCount {
                kind,
                count: map.len(),
            })
            .collect();

        let vertices = analyzer
            .vertices()
            .iter()
            .flat_map(|(_, map)| map.iter())
            .map(|v| VertexSummary {
                id: v.id().to_string(),
                kind: v.kind(),
                name: v.name().to_string(),
            })
            .collect();

        let aggregates = analyzer
            .aggregate_connection_map()
            .iter()
            .map(|connection| AggregateSummary {
                aggregate: name_of(connection.aggregate()),
                command: connection.command().map(name_of),
                events: connection.events().map(name_of).collect(),
                documents: connection.documents().map(name_of).collect(),
            })
            .collect();

        let features = analyzer
            .feature_connection_map()
            .iter()
            .map(|connection| FeatureSummary {
                feature: name_of(connection.feature()),
                members: FeatureConnection::MEMBER_KINDS
                    .into_iter()
                    .filter_map(|kind| {
                        let ids = connection.members(kind)?;
                        (!ids.is_empty()).then(|| MemberSummary {
                            kind,
                            names: ids.iter().map(|id| name_of(id)).collect(),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self {
            counts,
            vertices,
            aggregates,
            features,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    /// Plain-text rendering used by the CLI.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Vertices: {}", self.vertex_count());
        for count in &self.counts {
            let _ = writeln!(out, "  {}: {}", count.kind, count.count);
        }

        if !self.aggregates.is_empty() {
            let _ = writeln!(out, "Aggregates:");
            for aggregate in &self.aggregates {
                let _ = writeln!(out, "  {}", aggregate.aggregate);
                if let Some(command) = &aggregate.command {
                    let _ = writeln!(out, "    command: {command}");
                }
                if !aggregate.events.is_empty() {
                    let _ = writeln!(out, "    events: {}", aggregate.events.join(", "));
                }
                if !aggregate.documents.is_empty() {
                    let _ = writeln!(out, "    documents: {}", aggregate.documents.join(", "));
                }
            }
        }

        if !self.features.is_empty() {
            let _ = writeln!(out, "Features:");
            for feature in &self.features {
                let _ = writeln!(out, "  {}", feature.feature);
                for member in &feature.members {
                    let _ = writeln!(out, "    {}: {}", member.kind, member.names.join(", "));
                }
            }
        }
        out
    }
}

pub mod analyzer;
pub mod connection;
pub mod filter;
pub mod graph;
pub mod metadata;
pub mod node;
pub mod vertex;
pub mod vertex_map;

#[cfg(test)]
pub(crate) mod test_support;

pub use analyzer::EventSourcingAnalyzer;
pub use connection::{
    AggregateConnection, AggregateConnectionMap, AggregateFlow, CommandConflict,
    FeatureConnection, FeatureConnectionMap, VertexConnection, VertexConnectionMap,
};
pub use filter::{NameFilter, Trim};
pub use graph::EventSourcingGraph;
pub use metadata::{Metadata, MetadataFactory};
pub use node::{Node, NodeType, StructuralType};
pub use vertex::{Vertex, VertexType};
pub use vertex_map::{VertexMap, VertexMaps};

/// Error type for the event-sourcing graph engine.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Type \"{0}\" is not supported")]
    UnsupportedType(String),

    #[error("Wrong vertex type \"{found}\" provided. Vertex type must be \"{expected}\".")]
    TypeMismatch { expected: VertexType, found: String },

    #[error("Can not merge vertex due different ids: \"{expected}\" and \"{found}\"")]
    IdMismatch { expected: String, found: String },

    #[error("Can not merge vertex due different types: \"{expected}\" and \"{found}\"")]
    KindMismatch {
        expected: VertexType,
        found: VertexType,
    },

    #[error(
        "Multiple command connections to aggregate \"{aggregate}\" found. Can not handle it. Commands: {}",
        commands.join(", ")
    )]
    AmbiguousCommand {
        aggregate: String,
        commands: Vec<String>,
    },

    #[error("No {kind} vertex with id \"{id}\" found. Was the {kind} map analysed before?")]
    VertexNotFound { kind: VertexType, id: String },

    #[error("Invalid metadata on node \"{id}\": {message}")]
    Metadata { id: String, message: String },

    #[error("Metadata of kind \"{metadata}\" can not be attached to a {kind} vertex")]
    MetadataMismatch {
        kind: VertexType,
        metadata: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GraphError>;

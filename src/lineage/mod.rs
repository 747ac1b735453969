//! Pipeline lineage
//!
//! Assembles a DAG of datasets and transforms for a pipeline version by
//! walking its nodes upstream from the targets. Source tables are named
//! after the table entity they read (`schema.table`); a table that no
//! longer exists is kept in the graph as an unresolved object.

mod builder;
mod types;

pub use builder::LineageBuilder;
pub use types::{LineageEdge, LineageGraph, LineageObject, NodeKind, NodeProperties, PipelineNode};

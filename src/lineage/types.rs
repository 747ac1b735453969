//! Lineage graph types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a node in a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    SourceTable,
    Transform,
    TargetTable,
}

impl NodeKind {
    /// Classify a node by its `type` field (case-insensitive)
    pub fn from_node_type(node_type: &str) -> Self {
        match node_type.trim().to_ascii_lowercase().as_str() {
            "source" | "source_table" => NodeKind::SourceTable,
            "target" | "target_table" => NodeKind::TargetTable,
            _ => NodeKind::Transform,
        }
    }
}

/// Table coordinates carried by source and target nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NodeProperties {
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub target_schema_name: Option<String>,
    #[serde(default)]
    pub target_table_name: Option<String>,
}

/// One node of a pipeline version, as listed by the platform
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// Ids of upstream nodes
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub properties: NodeProperties,
}

impl PipelineNode {
    pub fn from_value(value: Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_node_type(&self.node_type)
    }

    /// Name used when nothing better is known
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// A dataset or transform that appears in the lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageObject {
    pub node_id: String,
    pub kind: NodeKind,
    /// `schema.table` for tables, the node name for transforms
    pub qualified_name: String,
    /// False when the backing table could not be found
    pub resolved: bool,
}

/// Data flows from `upstream` into `downstream`
///
/// Names are qualified names and may repeat across nodes; the ids are
/// unique within a pipeline version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineageEdge {
    pub upstream: String,
    pub downstream: String,
    pub upstream_id: String,
    pub downstream_id: String,
}

/// Lineage of one pipeline version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub objects: Vec<LineageObject>,
    pub edges: Vec<LineageEdge>,
}

impl LineageGraph {
    pub fn object(&self, qualified_name: &str) -> Option<&LineageObject> {
        self.objects
            .iter()
            .find(|o| o.qualified_name == qualified_name)
    }

    pub fn object_by_id(&self, node_id: &str) -> Option<&LineageObject> {
        self.objects.iter().find(|o| o.node_id == node_id)
    }

    /// Edges as `(upstream, downstream)` pairs
    pub fn edge_pairs(&self) -> Vec<(&str, &str)> {
        self.edges
            .iter()
            .map(|e| (e.upstream.as_str(), e.downstream.as_str()))
            .collect()
    }
}

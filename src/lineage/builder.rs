//! Pipeline lineage walk

use super::types::{LineageEdge, LineageGraph, LineageObject, NodeKind, PipelineNode};
use crate::envelope::Envelope;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::pagination::{ListParams, PageCollector};
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Builds the lineage DAG of a pipeline version
///
/// The walk starts at the version's target nodes and follows `inputs`
/// upstream. Each node is visited once, so shared ancestors and cycles
/// terminate. All state lives in a single call.
#[derive(Debug, Clone, Copy)]
pub struct LineageBuilder<'a> {
    client: &'a HttpClient,
}

impl<'a> LineageBuilder<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Lineage of one version, folded into an envelope whose response is
    /// the serialized [`LineageGraph`]
    pub async fn build(&self, domain_id: &str, pipeline_id: &str, version_id: &str) -> Envelope {
        let graph = match self.build_graph(domain_id, pipeline_id, version_id).await {
            Ok(graph) => graph,
            Err(e) => return Envelope::from_error(&e),
        };
        match serde_json::to_value(&graph) {
            Ok(value) => Envelope::success_with_entity(version_id.trim(), value),
            Err(e) => Envelope::from_error(&Error::from(e)),
        }
    }

    /// Lineage of the pipeline's active version
    pub async fn build_active(&self, domain_id: &str, pipeline_id: &str) -> Envelope {
        let version_id = match self.active_version(domain_id, pipeline_id).await {
            Ok(version_id) => version_id,
            Err(e) => return Envelope::from_error(&e),
        };
        self.build(domain_id, pipeline_id, &version_id).await
    }

    pub async fn build_graph(
        &self,
        domain_id: &str,
        pipeline_id: &str,
        version_id: &str,
    ) -> Result<LineageGraph> {
        let nodes = self.fetch_nodes(domain_id, pipeline_id, version_id).await?;
        let (order, edges) = walk(&nodes);

        let objects =
            try_join_all(order.iter().map(|id| self.describe(&nodes[*id]))).await?;
        let names: HashMap<&str, String> = order
            .iter()
            .zip(&objects)
            .map(|(id, object)| (*id, object.qualified_name.clone()))
            .collect();

        let edges = edges
            .into_iter()
            .filter_map(|(up, down)| {
                Some(LineageEdge {
                    upstream: names.get(up)?.clone(),
                    downstream: names.get(down)?.clone(),
                    upstream_id: up.to_string(),
                    downstream_id: down.to_string(),
                })
            })
            .collect::<Vec<_>>();

        debug!(
            "Lineage for pipeline {} version {}: {} objects, {} edges",
            pipeline_id,
            version_id,
            objects.len(),
            edges.len()
        );
        Ok(LineageGraph { objects, edges })
    }

    async fn active_version(&self, domain_id: &str, pipeline_id: &str) -> Result<String> {
        let path = format!(
            "/v3/domains/{}/pipelines/{}",
            require(domain_id, "domain_id")?,
            require(pipeline_id, "pipeline_id")?
        );
        let response = self.client.get(&path).await?.error_for_status()?;
        response
            .body
            .pointer("/result/active_version_id")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::missing_result(&path, "result.active_version_id"))
    }

    async fn fetch_nodes(
        &self,
        domain_id: &str,
        pipeline_id: &str,
        version_id: &str,
    ) -> Result<HashMap<String, PipelineNode>> {
        let path = format!(
            "/v3/domains/{}/pipelines/{}/versions/{}/nodes",
            require(domain_id, "domain_id")?,
            require(pipeline_id, "pipeline_id")?,
            require(version_id, "version_id")?
        );
        let records = PageCollector::new(self.client)
            .fetch_all(&path, &ListParams::new())
            .await?;

        records
            .into_iter()
            .map(|record| {
                PipelineNode::from_value(record)
                    .with_context(|| format!("malformed node in {path}"))
                    .map(|node| (node.id.clone(), node))
            })
            .collect()
    }

    /// Descriptor for one node; source tables are looked up on the platform
    async fn describe(&self, node: &PipelineNode) -> Result<LineageObject> {
        let kind = node.kind();
        let (qualified_name, resolved) = match kind {
            NodeKind::SourceTable => self.source_table_name(node).await?,
            NodeKind::TargetTable => match (
                node.properties.target_schema_name.as_deref(),
                node.properties.target_table_name.as_deref(),
            ) {
                (Some(schema), Some(table)) => (format!("{schema}.{table}"), true),
                _ => (node.display_name().to_string(), true),
            },
            NodeKind::Transform => (node.display_name().to_string(), true),
        };

        Ok(LineageObject {
            node_id: node.id.clone(),
            kind,
            qualified_name,
            resolved,
        })
    }

    async fn source_table_name(&self, node: &PipelineNode) -> Result<(String, bool)> {
        let (Some(source_id), Some(table_id)) = (
            node.properties.source_id.as_deref(),
            node.properties.table_id.as_deref(),
        ) else {
            warn!("Source node {} has no source/table reference", node.id);
            return Ok((node.display_name().to_string(), false));
        };

        let path = format!("/v3/sources/{source_id}/tables/{table_id}");
        let response = self.client.get(&path).await?;
        if response.status == 404 {
            warn!(
                "Table {} of source {} not found; node {} left unresolved",
                table_id, source_id, node.id
            );
            return Ok((format!("{source_id}.{table_id}"), false));
        }

        let response = response.error_for_status()?;
        let table = response
            .result()
            .ok_or_else(|| Error::missing_result(&path, "result"))?;
        let name = table
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::missing_result(&path, "result.name"))?;
        let qualified = match table.get("schema_name_at_source").and_then(Value::as_str) {
            Some(schema) if !schema.is_empty() => format!("{schema}.{name}"),
            _ => name.to_string(),
        };
        Ok((qualified, true))
    }
}

fn require<'s>(value: &'s str, field: &str) -> Result<&'s str> {
    crate::resources::require_id(field, value)
}

/// Depth-first walk upstream from the target nodes
///
/// Returns visited node ids in visit order and `(upstream, downstream)` id
/// pairs. Nodes are visited at most once.
fn walk(nodes: &HashMap<String, PipelineNode>) -> (Vec<&str>, Vec<(&str, &str)>) {
    let mut roots: Vec<&str> = nodes
        .values()
        .filter(|n| n.kind() == NodeKind::TargetTable)
        .map(|n| n.id.as_str())
        .collect();
    if roots.is_empty() {
        // No explicit targets: start from nodes nothing else reads
        let consumed: HashSet<&str> = nodes
            .values()
            .flat_map(|n| n.inputs.iter().map(String::as_str))
            .collect();
        roots = nodes
            .keys()
            .map(String::as_str)
            .filter(|id| !consumed.contains(id))
            .collect();
    }
    roots.sort_unstable();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut order = Vec::new();
    let mut edges = Vec::new();
    let mut stack: Vec<&str> = roots.into_iter().rev().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id);
        let Some(node) = nodes.get(id) else {
            continue;
        };

        let mut seen_inputs = HashSet::new();
        for input in &node.inputs {
            let input = input.as_str();
            if !seen_inputs.insert(input) {
                continue;
            }
            match nodes.get_key_value(input) {
                Some((key, _)) => {
                    edges.push((key.as_str(), node.id.as_str()));
                    if !visited.contains(key.as_str()) {
                        stack.push(key.as_str());
                    }
                }
                None => warn!("Node {} reads unknown node {}", node.id, input),
            }
        }
    }

    (order, edges)
}

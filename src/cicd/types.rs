//! Bulk upload types

use crate::envelope::Envelope;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Resource family a configuration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Source,
    Pipeline,
    Workflow,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Source => "source",
            ArtifactKind::Pipeline => "pipeline",
            ArtifactKind::Workflow => "workflow",
        })
    }
}

/// Points at an existing entity whose configuration can be moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: ArtifactKind,
    /// Required for pipelines and workflows
    #[serde(default)]
    pub domain_id: Option<String>,
    pub entity_id: String,
}

impl EntityRef {
    pub fn source(entity_id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Source,
            domain_id: None,
            entity_id: entity_id.into(),
        }
    }

    pub fn pipeline(domain_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Pipeline,
            domain_id: Some(domain_id.into()),
            entity_id: entity_id.into(),
        }
    }

    pub fn workflow(domain_id: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Workflow,
            domain_id: Some(domain_id.into()),
            entity_id: entity_id.into(),
        }
    }

    /// Short label used in outcomes and logs
    pub fn label(&self) -> String {
        match &self.domain_id {
            Some(domain) => format!("{}:{}/{}", self.kind, domain, self.entity_id),
            None => format!("{}:{}", self.kind, self.entity_id),
        }
    }
}

/// A configuration document to import into an existing entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigArtifact {
    pub name: String,
    pub target: EntityRef,
    pub configuration: Value,
}

impl ConfigArtifact {
    pub fn new(name: impl Into<String>, target: EntityRef, configuration: Value) -> Self {
        Self {
            name: name.into(),
            target,
            configuration,
        }
    }
}

/// Result for one artifact of a bulk run
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    /// Position of the artifact in the submitted list
    pub index: usize,
    pub name: String,
    pub envelope: Envelope,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        self.envelope.is_success()
    }
}

//! Worker pool for configuration uploads and exports

use super::types::{ArtifactKind, ConfigArtifact, EntityRef, UploadOutcome};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::resources::{PipelinesApi, ResourceApi, SourcesApi, WorkflowsApi};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Fixed-size pool that pushes configurations to the platform
///
/// Workers pull from a bounded queue and share one dispatcher, so a token
/// refreshed by one worker is used by all of them.
#[derive(Debug, Clone)]
pub struct BulkUploader {
    api: ResourceApi,
    workers: usize,
    queue_capacity: usize,
}

impl BulkUploader {
    pub fn new(api: ResourceApi, workers: usize, queue_capacity: usize) -> Self {
        Self {
            api,
            workers: workers.max(1),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Import every artifact into its target entity
    ///
    /// Returns one outcome per artifact in completion order; use
    /// [`UploadOutcome::index`] to match outcomes to inputs.
    pub async fn upload_all(&self, artifacts: Vec<ConfigArtifact>) -> Vec<UploadOutcome> {
        let names = artifacts.iter().map(|a| a.name.clone()).collect();
        let api = self.api.clone();
        self.run(artifacts, names, move |index, artifact| {
            import(api.clone(), index, artifact)
        })
        .await
    }

    /// Fetch the configuration of every referenced entity
    ///
    /// Each successful outcome's envelope carries the exported document.
    pub async fn export_all(&self, refs: Vec<EntityRef>) -> Vec<UploadOutcome> {
        let names = refs.iter().map(EntityRef::label).collect();
        let api = self.api.clone();
        self.run(refs, names, move |index, entity| {
            export(api.clone(), index, entity)
        })
        .await
    }

    async fn run<T, F, Fut>(&self, items: Vec<T>, names: Vec<String>, task: F) -> Vec<UploadOutcome>
    where
        T: Send + 'static,
        F: Fn(usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = UploadOutcome> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Vec::new();
        }

        let (work_tx, work_rx) = mpsc::channel::<(usize, T)>(self.queue_capacity);
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<UploadOutcome>();
        let task = Arc::new(task);

        let mut pool = JoinSet::new();
        for worker in 0..self.workers.min(total) {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = done_tx.clone();
            let task = Arc::clone(&task);
            pool.spawn(async move {
                loop {
                    let next = work_rx.lock().await.recv().await;
                    let Some((index, item)) = next else {
                        break;
                    };
                    if done_tx.send(task(index, item).await).is_err() {
                        break;
                    }
                }
                debug!("Upload worker {} finished", worker);
            });
        }
        drop(done_tx);
        drop(work_rx);

        for (index, item) in items.into_iter().enumerate() {
            if work_tx.send((index, item)).await.is_err() {
                warn!("Work queue closed with {} items not submitted", total - index);
                break;
            }
        }
        drop(work_tx);

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = done_rx.recv().await {
            outcomes.push(outcome);
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!("Upload worker stopped abnormally: {}", e);
            }
        }

        // Items lost to a crashed worker still get an outcome
        let mut reported = vec![false; total];
        for outcome in &outcomes {
            reported[outcome.index] = true;
        }
        for (index, name) in names.into_iter().enumerate() {
            if !reported[index] {
                let err = Error::worker_pool(format!("no result for item {index} ({name})"));
                outcomes.push(UploadOutcome {
                    index,
                    name,
                    envelope: Envelope::from_error(&err),
                });
            }
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(
            "Bulk run finished: {} items, {} failed",
            total, failed
        );
        outcomes
    }
}

async fn import(api: ResourceApi, index: usize, artifact: ConfigArtifact) -> UploadOutcome {
    let ConfigArtifact {
        name,
        target,
        configuration,
    } = artifact;
    debug!("Importing {} into {}", name, target.label());

    let envelope = send_configuration(api, &target, Some(configuration)).await;
    if envelope.is_failure() {
        warn!(
            "Import of {} failed: {} {}",
            name,
            envelope.error_code(),
            envelope.error.error_desc
        );
    }
    UploadOutcome {
        index,
        name,
        envelope,
    }
}

async fn export(api: ResourceApi, index: usize, entity: EntityRef) -> UploadOutcome {
    let name = entity.label();
    let envelope = send_configuration(api, &entity, None).await;
    UploadOutcome {
        index,
        name,
        envelope,
    }
}

/// Import when `configuration` is given, export otherwise
async fn send_configuration(
    api: ResourceApi,
    target: &EntityRef,
    configuration: Option<Value>,
) -> Envelope {
    let domain = target.domain_id.as_deref().unwrap_or_default();
    let id = target.entity_id.as_str();
    match (target.kind, configuration) {
        (ArtifactKind::Source, Some(config)) => {
            SourcesApi::new(api).import_configuration(id, config).await
        }
        (ArtifactKind::Source, None) => SourcesApi::new(api).export_configuration(id).await,
        (ArtifactKind::Pipeline, Some(config)) => {
            PipelinesApi::new(api)
                .import_configuration(domain, id, config)
                .await
        }
        (ArtifactKind::Pipeline, None) => {
            PipelinesApi::new(api).export_configuration(domain, id).await
        }
        (ArtifactKind::Workflow, Some(config)) => {
            WorkflowsApi::new(api)
                .import_configuration(domain, id, config)
                .await
        }
        (ArtifactKind::Workflow, None) => {
            WorkflowsApi::new(api).export_configuration(domain, id).await
        }
    }
}

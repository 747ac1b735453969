//! Users, environments, storage and compute

use super::base::{envelope_try, require_id, result_id, ResourceApi};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::pagination::{ListParams, PageCollector};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

const USERS_PATH: &str = "/v3/admin/users";
const ENVIRONMENTS_PATH: &str = "/v3/admin/manage-environments";

/// Names of the default environment, storage and compute to look up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultNames {
    pub environment: String,
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub compute: Option<String>,
}

/// Identifiers resolved from [`DefaultNames`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultIds {
    pub environment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_id: Option<String>,
}

/// Client for the `/v3/admin` endpoints
#[derive(Debug, Clone)]
pub struct AdminApi {
    api: ResourceApi,
}

impl AdminApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn list_users(&self, params: &ListParams) -> Envelope {
        self.api.list(USERS_PATH, params).await
    }

    pub async fn get_user(&self, user_id: &str) -> Envelope {
        let id = envelope_try!(require_id("user_id", user_id));
        self.api.get_entity(&format!("{USERS_PATH}/{id}")).await
    }

    pub async fn create_user(&self, body: Value) -> Envelope {
        self.api.create(USERS_PATH, body).await
    }

    // ========================================================================
    // Environments
    // ========================================================================

    pub async fn list_environments(&self, params: &ListParams) -> Envelope {
        self.api.list(ENVIRONMENTS_PATH, params).await
    }

    pub async fn get_environment(&self, environment_id: &str) -> Envelope {
        let id = envelope_try!(require_id("environment_id", environment_id));
        self.api
            .get_entity(&format!("{ENVIRONMENTS_PATH}/{id}"))
            .await
    }

    pub async fn list_storage(&self, environment_id: &str, params: &ListParams) -> Envelope {
        let id = envelope_try!(require_id("environment_id", environment_id));
        self.api
            .list(&storage_path(id), params)
            .await
    }

    pub async fn list_compute(&self, environment_id: &str, params: &ListParams) -> Envelope {
        let id = envelope_try!(require_id("environment_id", environment_id));
        self.api
            .list(&compute_path(id), params)
            .await
    }

    // ========================================================================
    // Default resolution
    // ========================================================================

    /// Look up environment, storage and compute identifiers by name
    ///
    /// The success envelope's response is a serialized [`DefaultIds`]. A name
    /// that matches nothing yields a `NOT_FOUND` failure.
    pub async fn resolve_defaults(&self, names: &DefaultNames) -> Envelope {
        match self.try_resolve_defaults(names).await {
            Ok(ids) => match serde_json::to_value(&ids) {
                Ok(value) => Envelope::success_with_entity(ids.environment_id.clone(), value),
                Err(e) => Envelope::from_error(&Error::from(e)),
            },
            Err(e) => Envelope::from_error(&e),
        }
    }

    async fn try_resolve_defaults(&self, names: &DefaultNames) -> Result<DefaultIds> {
        let environment = require_id("environment", &names.environment)?;
        let environment_id = self
            .find_by_name(ENVIRONMENTS_PATH, environment)
            .await?;

        let storage_id = match names.storage.as_deref() {
            Some(name) => Some(self.find_by_name(&storage_path(&environment_id), name).await?),
            None => None,
        };
        let compute_id = match names.compute.as_deref() {
            Some(name) => Some(self.find_by_name(&compute_path(&environment_id), name).await?),
            None => None,
        };

        Ok(DefaultIds {
            environment_id,
            storage_id,
            compute_id,
        })
    }

    /// Id of the first record in a collection whose `name` matches
    async fn find_by_name(&self, path: &str, name: &str) -> Result<String> {
        let params = ListParams::new().filter(json!({ "name": name }));
        let records = PageCollector::new(self.api.client())
            .fetch_all(path, &params)
            .await?;

        let id = records
            .iter()
            .filter(|record| record.get("name").and_then(Value::as_str) == Some(name))
            .find_map(result_id)
            .ok_or_else(|| Error::http_status(404, format!("no entry named '{name}' under {path}")))?;
        debug!("Resolved '{}' under {} to {}", name, path, id);
        Ok(id)
    }
}

fn storage_path(environment_id: &str) -> String {
    format!("{ENVIRONMENTS_PATH}/{environment_id}/environment-storage")
}

fn compute_path(environment_id: &str) -> String {
    format!("{ENVIRONMENTS_PATH}/{environment_id}/environment-compute-template")
}

impl DefaultIds {
    /// Read ids back out of a [`AdminApi::resolve_defaults`] envelope
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let value = envelope.clone().into_result()?;
        Ok(serde_json::from_value(value)?)
    }
}

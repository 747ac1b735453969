//! Domains and the sources they can read

use super::base::{envelope_try, fill_defaults, require_id, ResourceApi};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::pagination::ListParams;
use serde_json::{json, Value};

/// Client for `/v3/domains`
#[derive(Debug, Clone)]
pub struct DomainsApi {
    api: ResourceApi,
}

impl DomainsApi {
    pub fn new(api: ResourceApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, params: &ListParams) -> Envelope {
        self.api.list("/v3/domains", params).await
    }

    pub async fn get(&self, domain_id: &str) -> Envelope {
        let id = envelope_try!(require_id("domain_id", domain_id));
        self.api.get_entity(&format!("/v3/domains/{id}")).await
    }

    pub async fn create(&self, mut body: Value) -> Envelope {
        let conn = self.api.client().connection();
        fill_defaults(
            &mut body,
            &[("environment_id", conn.default_environment_id.as_ref())],
        );
        self.api.create("/v3/domains", body).await
    }

    pub async fn delete(&self, domain_id: &str) -> Envelope {
        let id = envelope_try!(require_id("domain_id", domain_id));
        self.api.delete(&format!("/v3/domains/{id}")).await
    }

    pub async fn list_accessible_sources(&self, domain_id: &str, params: &ListParams) -> Envelope {
        let id = envelope_try!(require_id("domain_id", domain_id));
        self.api
            .list(&format!("/v3/domains/{id}/sources"), params)
            .await
    }

    /// Grant the domain access to the given sources
    pub async fn attach_sources(&self, domain_id: &str, source_ids: &[String]) -> Envelope {
        let id = envelope_try!(require_id("domain_id", domain_id));
        if source_ids.is_empty() {
            return Envelope::from_error(&Error::validation("source_ids", "must not be empty"));
        }
        for source_id in source_ids {
            envelope_try!(require_id("source_ids", source_id));
        }
        self.api
            .post_action(
                &format!("/v3/domains/{id}/sources"),
                json!({ "entity_ids": source_ids }),
            )
            .await
    }
}

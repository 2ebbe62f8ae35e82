//! HTTP mirror for the external update-status service.
//!
//! Each successful local update is re-posted as
//! `POST {base}/update-status` with `{"status": <code>, "kdsOrderId": <id>}`.
//! Codes are read from a shared catalog at post time, so a settings reload
//! is picked up without rebuilding the registry.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};
use voxorder_core::error::{Result, VoxorderError};
use voxorder_core::{Status, StatusCatalog, StatusMirror};

/// Status codes shared between the host and the mirror.
pub type SharedCatalog = Arc<RwLock<StatusCatalog>>;

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusBody<'a> {
    status: u16,
    kds_order_id: &'a str,
}

pub struct HttpStatusMirror {
    client: reqwest::blocking::Client,
    endpoint: String,
    catalog: SharedCatalog,
}

impl HttpStatusMirror {
    pub fn new(base_url: &str, timeout: Duration, catalog: SharedCatalog) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoxorderError::CollaboratorUnavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: update_status_endpoint(base_url),
            catalog,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&self, id: &'a str, status: Status) -> Result<UpdateStatusBody<'a>> {
        let code = self.catalog.read().code_of(status).ok_or_else(|| {
            VoxorderError::CollaboratorUnavailable(format!("no code configured for {status}"))
        })?;
        Ok(UpdateStatusBody {
            status: code,
            kds_order_id: id,
        })
    }
}

pub fn update_status_endpoint(base_url: &str) -> String {
    format!("{}/update-status", base_url.trim_end_matches('/'))
}

impl StatusMirror for HttpStatusMirror {
    fn mirror(&self, id: &str, status: Status) -> Result<()> {
        let body = self.request_body(id, status)?;
        let code = body.status;
        debug!(endpoint = %self.endpoint, order_id = %id, code, "posting status update");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| VoxorderError::CollaboratorUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VoxorderError::CollaboratorUnavailable(format!(
                "update-status returned {}",
                response.status()
            )));
        }
        info!(order_id = %id, code, "status mirrored");
        Ok(())
    }
}

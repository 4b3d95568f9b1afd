//! Admin passthroughs to the device-approval endpoints.
//!
//! Cashier-role accounts may only log in from devices an admin has
//! approved; these calls manage the pending queue. Mutating calls
//! refresh the cached request list so the admin view stays current.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::backend::{ApiError, list_entries};
use crate::models::{DeviceRequest, DeviceSummaryEntry};
use crate::session::SessionManager;

pub struct DeviceService {
    session: Arc<SessionManager>,
    requests: RwLock<Vec<DeviceRequest>>,
}

impl DeviceService {
    #[must_use]
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Last fetched pending list, without a network round-trip.
    pub async fn cached(&self) -> Vec<DeviceRequest> {
        self.requests.read().await.clone()
    }

    /// Fetches the pending approval queue and refreshes the cache.
    pub async fn list(&self) -> Result<Vec<DeviceRequest>, ApiError> {
        let data = self
            .session
            .request(Method::GET, "devices/requests", None)
            .await?;

        let requests: Vec<DeviceRequest> = list_entries(&data)
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();

        *self.requests.write().await = requests.clone();
        Ok(requests)
    }

    /// Approves a pending request by id.
    pub async fn approve(&self, request_id: &str) -> Result<(), ApiError> {
        self.session
            .request(
                Method::POST,
                &format!("devices/requests/{request_id}/approve"),
                Some(json!({})),
            )
            .await?;

        info!(request_id, "device request approved");
        self.list().await?;
        Ok(())
    }

    /// Approves via the code the backend emailed to the account owner.
    pub async fn approve_by_code(&self, code: &str) -> Result<(), ApiError> {
        self.session
            .request(
                Method::POST,
                "devices/approve-code",
                Some(json!({ "code": code })),
            )
            .await?;

        info!("device approved by emailed code");
        self.list().await?;
        Ok(())
    }

    /// Rejects a pending request by id.
    pub async fn reject(&self, request_id: &str) -> Result<(), ApiError> {
        self.session
            .request(
                Method::POST,
                &format!("devices/requests/{request_id}/reject"),
                Some(json!({})),
            )
            .await?;

        info!(request_id, "device request rejected");
        self.list().await?;
        Ok(())
    }

    /// Per-user roll-up of already-approved devices.
    pub async fn summary(&self) -> Result<Vec<DeviceSummaryEntry>, ApiError> {
        let data = self
            .session
            .request(Method::GET, "devices/summary", None)
            .await?;

        Ok(list_entries(&data)
            .into_iter()
            .filter_map(|entry: Value| serde_json::from_value(entry).ok())
            .collect())
    }
}

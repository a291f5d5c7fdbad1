//! Client for the maritime tracking backend.
//!
//! The backend is a REST API exposing one JSON array per entity:
//!
//! - `GET /vessels`
//! - `GET /ports`
//! - `GET /history`
//! - `GET /events`
//! - `GET /voyages`
//!
//! Requests carry the operator's bearer token. A 401 from any endpoint means
//! the token is no longer valid and the whole fetch fails with
//! [`BackendError::Unauthorized`]. Any other failure of a single endpoint
//! leaves that array absent from the snapshot, which the parser records as a
//! missing endpoint.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::BackendError;
use crate::model::RawSnapshot;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for fetching snapshots from the tracking backend.
#[derive(Clone)]
pub struct MaritimeApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl MaritimeApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000/api`).
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one endpoint's array.
    ///
    /// Returns `Ok(None)` when the endpoint answered with a non-success status
    /// or a body that is not JSON, and `Err(Transport)` when it could not be
    /// reached at all.
    pub async fn fetch_endpoint(&self, endpoint: &str) -> Result<Option<Value>, BackendError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized {
                endpoint: endpoint.to_string(),
            });
        }
        if !status.is_success() {
            warn!(endpoint, status = %status, "Endpoint unavailable");
            return Ok(None);
        }

        match response.json::<Value>().await {
            Ok(body) => {
                debug!(endpoint, "Endpoint fetched");
                Ok(Some(body))
            }
            Err(e) => {
                warn!(endpoint, error = %e, "Endpoint returned an unreadable body");
                Ok(None)
            }
        }
    }

    /// Fetch all five arrays concurrently.
    ///
    /// Fails if any endpoint answers 401, or if no endpoint could be reached.
    pub async fn fetch_snapshot(&self) -> Result<RawSnapshot, BackendError> {
        let (vessels, ports, history, events, voyages) = tokio::join!(
            self.fetch_endpoint("vessels"),
            self.fetch_endpoint("ports"),
            self.fetch_endpoint("history"),
            self.fetch_endpoint("events"),
            self.fetch_endpoint("voyages"),
        );

        let mut unreachable = Vec::new();
        let snapshot = RawSnapshot {
            vessels: settle("vessels", vessels, &mut unreachable)?,
            ports: settle("ports", ports, &mut unreachable)?,
            history: settle("history", history, &mut unreachable)?,
            events: settle("events", events, &mut unreachable)?,
            voyages: settle("voyages", voyages, &mut unreachable)?,
        };

        if unreachable.len() == 5 {
            if let Some(e) = unreachable.into_iter().next() {
                return Err(BackendError::Transport(e));
            }
        }

        Ok(snapshot)
    }
}

/// Downgrade a transport failure of a single endpoint to an absent array.
fn settle(
    endpoint: &str,
    result: Result<Option<Value>, BackendError>,
    unreachable: &mut Vec<reqwest::Error>,
) -> Result<Option<Value>, BackendError> {
    match result {
        Err(BackendError::Transport(e)) => {
            warn!(endpoint, error = %e, "Endpoint unreachable");
            unreachable.push(e);
            Ok(None)
        }
        other => other,
    }
}

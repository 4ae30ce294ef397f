//! Federated registries: the ordered server list and the fetch capability used
//! to download each peer's agent listing.

use crate::error::BookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default listing endpoint, relative to a federated server's base URL.
pub const DEFAULT_AGENTS_ENDPOINT: &str = "/api/agents";

/// One agent advertised by a federated server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAgentRecord {
    pub agent_name: String,
    #[serde(default)]
    pub permanent_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteAgentsResponse {
    #[serde(default)]
    agents: Vec<RemoteAgentRecord>,
}

/// Fetches the agent listing of one federated server.
#[async_trait]
pub trait FederationClient: Send + Sync {
    async fn fetch_agents(&self, server_url: &str) -> Result<Vec<RemoteAgentRecord>, BookError>;
}

/// Ordered list of federated server base URLs.
#[async_trait]
pub trait FederationList: Send + Sync {
    async fn federated_servers(&self) -> Result<Vec<String>, BookError>;
}

#[async_trait]
impl FederationList for Vec<String> {
    async fn federated_servers(&self) -> Result<Vec<String>, BookError> {
        Ok(self.clone())
    }
}

/// `reqwest`-backed [`FederationClient`].
#[derive(Debug, Clone)]
pub struct HttpFederationClient {
    client: reqwest::Client,
    agents_endpoint: String,
}

impl HttpFederationClient {
    pub fn new(timeout: Duration, agents_endpoint: &str) -> Result<Self, BookError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            agents_endpoint: agents_endpoint.to_string(),
        })
    }

    fn listing_url(&self, server_url: &str) -> String {
        format!(
            "{}/{}",
            server_url.trim_end_matches('/'),
            self.agents_endpoint.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl FederationClient for HttpFederationClient {
    async fn fetch_agents(&self, server_url: &str) -> Result<Vec<RemoteAgentRecord>, BookError> {
        let url = self.listing_url(server_url);
        debug!(url = %url, "Fetching federated agent listing");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: RemoteAgentsResponse = response.json().await?;
        Ok(body.agents)
    }
}

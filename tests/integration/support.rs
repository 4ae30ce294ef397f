//! Shared fakes for the integration tests.

use agentbook::resolver::{
    FederatedAgentReferenceResolver, FederationClient, RemoteAgentRecord,
};
use agentbook::{AgentSummary, BookError};
use async_trait::async_trait;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const LOCAL_SERVER: &str = "https://local.example";

pub fn local_url() -> Url {
    Url::parse(LOCAL_SERVER).unwrap()
}

pub fn agent(name: &str, permanent_id: Option<&str>) -> AgentSummary {
    AgentSummary {
        agent_name: name.to_string(),
        permanent_id: permanent_id.map(str::to_string),
    }
}

/// In-process federation: fixed listings per server URL.
#[derive(Default)]
pub struct StaticFederation {
    listings: HashMap<String, Vec<RemoteAgentRecord>>,
    pub fetches: AtomicUsize,
}

impl StaticFederation {
    pub fn with_listing(mut self, server: &str, agents: &[(&str, &str)]) -> Self {
        self.listings.insert(
            server.to_string(),
            agents
                .iter()
                .map(|(name, id)| RemoteAgentRecord {
                    agent_name: name.to_string(),
                    permanent_id: Some(id.to_string()),
                    url: None,
                })
                .collect(),
        );
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FederationClient for StaticFederation {
    async fn fetch_agents(&self, server_url: &str) -> Result<Vec<RemoteAgentRecord>, BookError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.listings
            .get(server_url)
            .cloned()
            .ok_or_else(|| BookError::FederationError(format!("{} is offline", server_url)))
    }
}

pub fn local_resolver(agents: &[AgentSummary]) -> FederatedAgentReferenceResolver {
    FederatedAgentReferenceResolver::new(
        &local_url(),
        agents,
        Vec::new(),
        Arc::new(StaticFederation::default()),
    )
}

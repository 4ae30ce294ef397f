//! Name/id → URL lookup tables for one registry (local or federated).

use crate::name::normalize_agent_name;
use crate::registry::AgentSummary;
use reqwest::Url;
use std::collections::HashMap;

/// Minimum length of a permanent-id-shaped reference.
const PERMANENT_ID_MIN_LEN: usize = 6;

/// Whether a reference has the base58-like shape of a permanent id.
pub fn looks_like_permanent_id(reference: &str) -> bool {
    reference.chars().count() >= PERMANENT_ID_MIN_LEN
        && reference.chars().all(|c| {
            c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
        })
}

/// Whether a reference is an absolute `http(s)` URL.
pub fn is_absolute_http_url(reference: &str) -> bool {
    Url::parse(reference)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// `<server>/agents/<identifier>` with the identifier percent-encoded.
pub fn agent_url(server: &Url, identifier: &str) -> String {
    let mut url = server.clone();
    url.set_query(None);
    url.set_fragment(None);
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().push("agents").push(identifier);
        }
        Err(()) => {
            return format!(
                "{}/agents/{}",
                server.as_str().trim_end_matches('/'),
                identifier
            )
        }
    }
    url.to_string()
}

/// Lookup tables of one registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct AgentLookup {
    /// Normalized agent name → URL.
    pub by_name: HashMap<String, String>,
    /// Exact agent name → URL.
    pub by_raw_name: HashMap<String, String>,
    /// Permanent id → URL.
    pub by_id: HashMap<String, String>,
}

impl AgentLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from local agent summaries hosted at `server`.
    pub fn from_local_agents(server: &Url, agents: &[AgentSummary]) -> Self {
        let mut lookup = Self::new();
        for agent in agents {
            let identifier = agent.permanent_id.as_deref().unwrap_or(&agent.agent_name);
            lookup.insert(
                &agent.agent_name,
                agent.permanent_id.as_deref(),
                agent_url(server, identifier),
            );
        }
        lookup
    }

    /// Insert one agent; the first agent registered under a key keeps it.
    pub fn insert(&mut self, agent_name: &str, permanent_id: Option<&str>, url: String) {
        let normalized = normalize_agent_name(agent_name);
        if !normalized.is_empty() {
            self.by_name.entry(normalized).or_insert_with(|| url.clone());
        }
        self.by_raw_name
            .entry(agent_name.to_string())
            .or_insert_with(|| url.clone());
        if let Some(id) = permanent_id.filter(|id| !id.is_empty()) {
            self.by_id.entry(id.to_string()).or_insert(url);
        }
    }

    pub fn find_by_id(&self, reference: &str) -> Option<&str> {
        self.by_id.get(reference).map(String::as_str)
    }

    /// Normalized name first, then the raw reference text.
    pub fn find_by_name(&self, reference: &str) -> Option<&str> {
        let normalized = normalize_agent_name(reference);
        if !normalized.is_empty() {
            if let Some(url) = self.by_name.get(&normalized) {
                return Some(url);
            }
        }
        self.by_raw_name.get(reference).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_raw_name.is_empty() && self.by_id.is_empty()
    }
}

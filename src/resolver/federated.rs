//! Resolver over the local registry, federated peer registries and pseudo-agents.

use super::federation::{FederationClient, RemoteAgentRecord};
use super::lookup::{agent_url, is_absolute_http_url, looks_like_permanent_id, AgentLookup};
use super::{AgentReferenceResolutionIssue, AgentReferenceResolver, IssueQueue, VOID_SENTINEL};
use crate::commitment::INHERITANCE_DIRECTIVE;
use crate::reference::{
    extract_reference_tokens, resolve_pseudo_agent_kind, PseudoAgentKind, ReferenceTokenMatch,
};
use crate::registry::AgentSummary;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Url;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default upper bound for a single federated listing fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

type SharedRemoteFetch = Shared<BoxFuture<'static, Arc<AgentLookup>>>;

/// Reference resolver backed by a local snapshot and federated servers.
///
/// Each federated server's listing is fetched at most once per instance;
/// concurrent lookups of a server that is still loading share one request.
/// A failed fetch is kept as an empty listing until the instance is dropped,
/// so a dead peer costs one timeout per instance rather than one per lookup.
pub struct FederatedAgentReferenceResolver {
    local: AgentLookup,
    servers: Vec<String>,
    client: Arc<dyn FederationClient>,
    fetch_timeout: Duration,
    remote: Mutex<HashMap<String, SharedRemoteFetch>>,
    issues: IssueQueue,
}

impl FederatedAgentReferenceResolver {
    pub fn new(
        local_server_url: &Url,
        local_agents: &[AgentSummary],
        federated_servers: Vec<String>,
        client: Arc<dyn FederationClient>,
    ) -> Self {
        let mut seen = HashSet::new();
        let servers = federated_servers
            .into_iter()
            .map(|server| server.trim().trim_end_matches('/').to_string())
            .filter(|server| !server.is_empty() && seen.insert(server.clone()))
            .collect();

        Self {
            local: AgentLookup::from_local_agents(local_server_url, local_agents),
            servers,
            client,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            remote: Mutex::new(HashMap::new()),
            issues: IssueQueue::default(),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Federated servers in lookup order.
    pub fn federated_servers(&self) -> &[String] {
        &self.servers
    }

    async fn remote_lookup(&self, server: &str) -> Arc<AgentLookup> {
        let fetch = {
            let mut remote = self.remote.lock();
            remote
                .entry(server.to_string())
                .or_insert_with(|| {
                    fetch_remote_lookup(
                        Arc::clone(&self.client),
                        server.to_string(),
                        self.fetch_timeout,
                    )
                    .boxed()
                    .shared()
                })
                .clone()
        };

        fetch.await
    }

    /// Resolve one token; `Err` carries the issue message.
    async fn resolve_token(
        &self,
        directive_type: &str,
        token: &ReferenceTokenMatch,
    ) -> Result<String, String> {
        let reference = token.reference.as_str();

        if is_absolute_http_url(reference) {
            return Ok(reference.to_string());
        }

        if let Some(kind) = resolve_pseudo_agent_kind(&token.token) {
            if !kind.is_allowed_in(directive_type) {
                return Err(kind.disallowed_message(directive_type));
            }
            if kind == PseudoAgentKind::Void && directive_type == INHERITANCE_DIRECTIVE {
                return Ok(kind.canonical_token());
            }
            return Ok(kind.canonical_url().to_string());
        }

        if looks_like_permanent_id(reference) {
            if let Some(url) = self.local.find_by_id(reference) {
                debug!(reference, "Resolved reference by local permanent id");
                return Ok(url.to_string());
            }
            for server in &self.servers {
                if let Some(url) = self.remote_lookup(server).await.find_by_id(reference) {
                    debug!(reference, server = %server, "Resolved reference by federated id");
                    return Ok(url.to_string());
                }
            }
        }

        if let Some(url) = self.local.find_by_name(reference) {
            debug!(reference, "Resolved reference by local name");
            return Ok(url.to_string());
        }

        for server in &self.servers {
            if let Some(url) = self.remote_lookup(server).await.find_by_name(reference) {
                debug!(reference, server = %server, "Resolved reference by federated name");
                return Ok(url.to_string());
            }
        }

        Err(format!("Agent \"{}\" could not be resolved.", reference))
    }
}

async fn fetch_remote_lookup(
    client: Arc<dyn FederationClient>,
    server: String,
    timeout: Duration,
) -> Arc<AgentLookup> {
    let failed = || Arc::new(AgentLookup::new());

    let base = match Url::parse(&server) {
        Ok(base) => base,
        Err(e) => {
            warn!(server = %server, error = %e, "Invalid federated server URL");
            return failed();
        }
    };

    match tokio::time::timeout(timeout, client.fetch_agents(&server)).await {
        Ok(Ok(records)) => {
            debug!(server = %server, agents = records.len(), "Loaded federated agent listing");
            Arc::new(remote_lookup_from_records(&base, &records))
        }
        Ok(Err(e)) => {
            warn!(server = %server, error = %e, "Federated agent listing failed");
            failed()
        }
        Err(_) => {
            warn!(
                server = %server,
                timeout_ms = timeout.as_millis() as u64,
                "Federated agent listing timed out"
            );
            failed()
        }
    }
}

fn remote_lookup_from_records(base: &Url, records: &[RemoteAgentRecord]) -> AgentLookup {
    let mut lookup = AgentLookup::new();
    for record in records {
        let url = match &record.url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => agent_url(
                base,
                record.permanent_id.as_deref().unwrap_or(&record.agent_name),
            ),
        };
        lookup.insert(&record.agent_name, record.permanent_id.as_deref(), url);
    }
    lookup
}

#[async_trait]
impl AgentReferenceResolver for FederatedAgentReferenceResolver {
    async fn resolve_directive_content(&self, directive_type: &str, content: &str) -> String {
        let tokens = extract_reference_tokens(content);
        let is_inheritance = directive_type == INHERITANCE_DIRECTIVE;

        if tokens.is_empty() {
            // Bare legacy `FROM void` / `FROM null` forms.
            if is_inheritance && resolve_pseudo_agent_kind(content) == Some(PseudoAgentKind::Void) {
                return PseudoAgentKind::Void.canonical_token();
            }
            return content.to_string();
        }

        let mut resolved = String::with_capacity(content.len());
        let mut cursor = 0;
        let mut reported = HashSet::new();

        for token in &tokens {
            resolved.push_str(&content[cursor..token.byte_range.start]);
            match self.resolve_token(directive_type, token).await {
                Ok(url) => resolved.push_str(&url),
                Err(message) => {
                    if is_inheritance {
                        resolved.push_str(VOID_SENTINEL);
                    }
                    if reported.insert(token.token.clone()) {
                        debug!(
                            directive_type,
                            reference = %token.reference,
                            "Agent reference left unresolved"
                        );
                        self.issues.push(AgentReferenceResolutionIssue {
                            commitment_type: directive_type.to_string(),
                            token: token.token.clone(),
                            reference: token.reference.clone(),
                            message,
                        });
                    }
                }
            }
            cursor = token.byte_range.end;
        }
        resolved.push_str(&content[cursor..]);
        resolved
    }

    fn consume_resolution_issues(&self) -> Vec<AgentReferenceResolutionIssue> {
        self.issues.drain()
    }
}

impl std::fmt::Debug for FederatedAgentReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederatedAgentReferenceResolver")
            .field("local_agents", &self.local.by_raw_name.len())
            .field("servers", &self.servers)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

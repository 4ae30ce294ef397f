//! Local agent collection: the port the resolvers use to enumerate and load
//! agents hosted on this server, plus in-memory and directory adapters.

use crate::commitment::{parse_agent_source, DirectiveRegistry};
use crate::error::BookError;
use crate::name::normalize_agent_name;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File extension of agent books in a [`DirectoryAgentCollection`].
pub const BOOK_EXTENSION: &str = "book";

/// Listing entry of a local agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub agent_name: String,
    #[serde(default)]
    pub permanent_id: Option<String>,
}

/// Local agent collection port.
#[async_trait]
pub trait LocalAgentCollection: Send + Sync {
    /// All locally hosted agents.
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, BookError>;

    /// Permanent id for an identifier that is either a permanent id or an agent name.
    async fn get_agent_permanent_id(&self, identifier: &str) -> Result<Option<String>, BookError>;

    /// Book source of the agent with the given permanent id.
    async fn get_agent_source(&self, permanent_id: &str) -> Result<Option<String>, BookError>;
}

#[derive(Debug, Clone)]
struct StoredAgent {
    summary: AgentSummary,
    source: String,
}

impl StoredAgent {
    fn id(&self) -> &str {
        self.summary
            .permanent_id
            .as_deref()
            .unwrap_or(&self.summary.agent_name)
    }
}

/// Find the permanent id among stored agents: exact id, exact name, then normalized name.
fn find_permanent_id(agents: &[StoredAgent], identifier: &str) -> Option<String> {
    let identifier = identifier.trim();
    if let Some(agent) = agents.iter().find(|a| a.id() == identifier) {
        return Some(agent.id().to_string());
    }
    if let Some(agent) = agents.iter().find(|a| a.summary.agent_name == identifier) {
        return Some(agent.id().to_string());
    }
    let normalized = normalize_agent_name(identifier);
    if normalized.is_empty() {
        return None;
    }
    agents
        .iter()
        .find(|a| normalize_agent_name(&a.summary.agent_name) == normalized)
        .map(|a| a.id().to_string())
}

/// In-memory collection, used when embedding the engine and in tests.
#[derive(Debug, Default)]
pub struct InMemoryAgentCollection {
    agents: RwLock<Vec<StoredAgent>>,
}

impl InMemoryAgentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace, by permanent id) an agent.
    pub fn register(&self, agent_name: &str, permanent_id: Option<&str>, source: &str) {
        let stored = StoredAgent {
            summary: AgentSummary {
                agent_name: agent_name.to_string(),
                permanent_id: permanent_id.map(str::to_string),
            },
            source: source.to_string(),
        };
        let mut agents = self.agents.write();
        agents.retain(|existing| existing.id() != stored.id());
        agents.push(stored);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_agent(self, agent_name: &str, permanent_id: Option<&str>, source: &str) -> Self {
        self.register(agent_name, permanent_id, source);
        self
    }

    pub fn remove(&self, permanent_id: &str) {
        self.agents.write().retain(|a| a.id() != permanent_id);
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}

#[async_trait]
impl LocalAgentCollection for InMemoryAgentCollection {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, BookError> {
        Ok(self.agents.read().iter().map(|a| a.summary.clone()).collect())
    }

    async fn get_agent_permanent_id(&self, identifier: &str) -> Result<Option<String>, BookError> {
        Ok(find_permanent_id(&self.agents.read(), identifier))
    }

    async fn get_agent_source(&self, permanent_id: &str) -> Result<Option<String>, BookError> {
        Ok(self
            .agents
            .read()
            .iter()
            .find(|a| a.id() == permanent_id)
            .map(|a| a.source.clone()))
    }
}

/// Collection backed by a directory of `*.book` files.
///
/// The file stem is the permanent id and the parsed agent name is the display
/// name. The directory is rescanned on every call, on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct DirectoryAgentCollection {
    root: PathBuf,
    registry: DirectiveRegistry,
}

impl DirectoryAgentCollection {
    pub fn new(root: impl Into<PathBuf>, registry: DirectiveRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan(&self) -> Result<Vec<StoredAgent>, BookError> {
        if !self.root.is_dir() {
            return Err(BookError::RegistryError(format!(
                "Agents directory not found: {}",
                self.root.display()
            )));
        }

        let mut agents = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                BookError::RegistryError(format!("Failed to walk agents directory: {}", e))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(BOOK_EXTENSION)
            {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(path)?;
            let agent_name = parse_agent_source(&source, &self.registry)
                .agent_name
                .unwrap_or_else(|| stem.to_string());
            agents.push(StoredAgent {
                summary: AgentSummary {
                    agent_name,
                    permanent_id: Some(stem.to_string()),
                },
                source,
            });
        }

        debug!(root = %self.root.display(), count = agents.len(), "Scanned agents directory");
        Ok(agents)
    }

    async fn scan_in_background(&self) -> Result<Vec<StoredAgent>, BookError> {
        let collection = self.clone();
        tokio::task::spawn_blocking(move || collection.scan())
            .await
            .map_err(|e| BookError::RegistryError(format!("Agents directory scan failed: {}", e)))?
    }
}

#[async_trait]
impl LocalAgentCollection for DirectoryAgentCollection {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, BookError> {
        Ok(self
            .scan_in_background()
            .await?
            .into_iter()
            .map(|a| a.summary)
            .collect())
    }

    async fn get_agent_permanent_id(&self, identifier: &str) -> Result<Option<String>, BookError> {
        Ok(find_permanent_id(&self.scan_in_background().await?, identifier))
    }

    async fn get_agent_source(&self, permanent_id: &str) -> Result<Option<String>, BookError> {
        Ok(self
            .scan_in_background()
            .await?
            .into_iter()
            .find(|a| a.id() == permanent_id)
            .map(|a| a.source))
    }
}

//! Agent reference resolution.
//!
//! A resolver rewrites directive content, replacing each reference token with
//! the canonical URL of the agent it names. Failures never abort resolution:
//! they are queued as [`AgentReferenceResolutionIssue`]s and drained by the
//! caller with [`AgentReferenceResolver::consume_resolution_issues`].

pub mod book_scoped;
pub mod cache;
pub mod federated;
pub mod federation;
pub mod lookup;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub use book_scoped::{
    build_synthetic_agent_id, extract_embedded_agents, parse_synthetic_agent_id,
    resolve_book_scoped_agent_context, BookScopedAgentReferenceResolver, EmbeddedAgent,
    ResolvedBookScopedAgentContext, SyntheticAgentId,
};
pub use cache::{FederatedResolverFactory, ProvideOptions, ResolverCacheProvider, ResolverFactory};
pub use federated::FederatedAgentReferenceResolver;
pub use federation::{FederationClient, FederationList, HttpFederationClient, RemoteAgentRecord};
pub use lookup::AgentLookup;

/// Sentinel substituted for an unresolvable parent in the inheritance directive.
pub const VOID_SENTINEL: &str = "VOID";

/// One failed resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReferenceResolutionIssue {
    pub commitment_type: String,
    pub token: String,
    pub reference: String,
    pub message: String,
}

/// Resolves agent references inside directive content.
#[async_trait]
pub trait AgentReferenceResolver: Send + Sync {
    /// Return `content` with every reference token substituted in place.
    async fn resolve_directive_content(&self, directive_type: &str, content: &str) -> String;

    /// Drain queued issues. Read-once: a second call returns an empty list.
    ///
    /// Resolvers that do not track issues keep the default.
    fn consume_resolution_issues(&self) -> Vec<AgentReferenceResolutionIssue> {
        Vec::new()
    }
}

/// FIFO queue of resolution issues owned by a single resolver instance.
#[derive(Debug, Default)]
pub(crate) struct IssueQueue {
    issues: Mutex<Vec<AgentReferenceResolutionIssue>>,
}

impl IssueQueue {
    pub(crate) fn push(&self, issue: AgentReferenceResolutionIssue) {
        self.issues.lock().push(issue);
    }

    pub(crate) fn drain(&self) -> Vec<AgentReferenceResolutionIssue> {
        std::mem::take(&mut *self.issues.lock())
    }
}

//! Book-scoped resolution: agents embedded in horizontal-rule sections of a
//! parent book are addressable through synthetic identifiers.
//!
//! A synthetic id is `book~<base64url(parent)>.<base64url(normalized name)>`,
//! so it survives as a single URL path segment and can be decoded back into
//! the parent identifier and the embedded agent's normalized name.

use super::lookup::agent_url;
use super::{AgentReferenceResolutionIssue, AgentReferenceResolver};
use crate::commitment::{
    is_horizontal_rule, is_reference_directive, parse_agent_source, split_lines,
    DirectiveRegistry,
};
use crate::error::BookError;
use crate::name::normalize_agent_name;
use crate::reference::extract_reference_tokens;
use crate::registry::LocalAgentCollection;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Url;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const SYNTHETIC_ID_PREFIX: &str = "book~";
const SYNTHETIC_ID_SEPARATOR: char = '.';

/// Decoded synthetic identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticAgentId {
    pub parent_identifier: String,
    pub embedded_agent_name: String,
}

/// Build the synthetic id of the agent `embedded_name` embedded in `parent_identifier`'s book.
///
/// `None` when the parent identifier is empty or the name normalizes to
/// nothing; every id this returns decodes back with [`parse_synthetic_agent_id`].
pub fn build_synthetic_agent_id(parent_identifier: &str, embedded_name: &str) -> Option<String> {
    let normalized_name = normalize_agent_name(embedded_name);
    if parent_identifier.is_empty() || normalized_name.is_empty() {
        return None;
    }
    Some(format!(
        "{}{}{}{}",
        SYNTHETIC_ID_PREFIX,
        URL_SAFE_NO_PAD.encode(parent_identifier),
        SYNTHETIC_ID_SEPARATOR,
        URL_SAFE_NO_PAD.encode(normalized_name)
    ))
}

/// Decode a synthetic id; `None` for anything malformed.
pub fn parse_synthetic_agent_id(identifier: &str) -> Option<SyntheticAgentId> {
    let encoded = identifier.trim().strip_prefix(SYNTHETIC_ID_PREFIX)?;
    let mut segments = encoded.split(SYNTHETIC_ID_SEPARATOR);
    let (parent, name) = match (segments.next(), segments.next(), segments.next()) {
        (Some(parent), Some(name), None) => (parent, name),
        _ => return None,
    };

    let decode = |segment: &str| -> Option<String> {
        let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
        String::from_utf8(bytes).ok().filter(|s| !s.is_empty())
    };

    Some(SyntheticAgentId {
        parent_identifier: decode(parent)?,
        embedded_agent_name: decode(name)?,
    })
}

/// An agent defined in a section of a parent book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedAgent {
    pub agent_name: String,
    pub normalized_name: String,
    /// The section's text, itself a complete book.
    pub source: String,
    /// 1-based line of the section's first line within the parent book.
    pub start_line: usize,
}

/// Agents defined in the sections after the first horizontal rule.
///
/// A section counts as an agent when it parses to a name and at least one
/// commitment. The first section with a given normalized name wins.
pub fn extract_embedded_agents(source: &str, registry: &DirectiveRegistry) -> Vec<EmbeddedAgent> {
    let mut sections: Vec<(usize, Vec<&str>)> = vec![(1, Vec::new())];
    for (index, line) in split_lines(source).into_iter().enumerate() {
        if is_horizontal_rule(line.trim()) {
            sections.push((index + 2, Vec::new()));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }

    let mut agents: Vec<EmbeddedAgent> = Vec::new();
    for (start_line, lines) in sections.into_iter().skip(1) {
        let section = lines.join("\n");
        let parsed = parse_agent_source(&section, registry);
        let Some(agent_name) = parsed.agent_name else {
            continue;
        };
        let normalized_name = normalize_agent_name(&agent_name);
        if parsed.commitments.is_empty()
            || normalized_name.is_empty()
            || agents.iter().any(|a| a.normalized_name == normalized_name)
        {
            continue;
        }
        agents.push(EmbeddedAgent {
            agent_name,
            normalized_name,
            source: section,
            start_line,
        });
    }
    agents
}

/// Decorator resolving references to agents embedded in the same book before
/// delegating everything else to the wrapped resolver.
pub struct BookScopedAgentReferenceResolver {
    parent_identifier: String,
    local_server_url: Url,
    embedded: HashMap<String, EmbeddedAgent>,
    fallback: Arc<dyn AgentReferenceResolver>,
}

impl BookScopedAgentReferenceResolver {
    pub fn new(
        parent_identifier: &str,
        embedded_agents: Vec<EmbeddedAgent>,
        local_server_url: Url,
        fallback: Arc<dyn AgentReferenceResolver>,
    ) -> Self {
        Self {
            parent_identifier: parent_identifier.to_string(),
            local_server_url,
            embedded: embedded_agents
                .into_iter()
                .map(|agent| (agent.normalized_name.clone(), agent))
                .collect(),
            fallback,
        }
    }

    /// Scope a resolver to the embedded agents of `parent_source`.
    pub fn from_book(
        parent_identifier: &str,
        parent_source: &str,
        registry: &DirectiveRegistry,
        local_server_url: Url,
        fallback: Arc<dyn AgentReferenceResolver>,
    ) -> Self {
        Self::new(
            parent_identifier,
            extract_embedded_agents(parent_source, registry),
            local_server_url,
            fallback,
        )
    }

    pub fn embedded_agent(&self, name: &str) -> Option<&EmbeddedAgent> {
        self.embedded.get(&normalize_agent_name(name))
    }

    pub fn embedded_agent_count(&self) -> usize {
        self.embedded.len()
    }

    fn embedded_url(&self, reference: &str) -> Option<String> {
        let agent = self.embedded.get(&normalize_agent_name(reference))?;
        let synthetic_id = build_synthetic_agent_id(&self.parent_identifier, &agent.normalized_name)?;
        debug!(
            parent = %self.parent_identifier,
            agent = %agent.agent_name,
            "Resolved reference to embedded agent"
        );
        Some(agent_url(&self.local_server_url, &synthetic_id))
    }
}

#[async_trait]
impl AgentReferenceResolver for BookScopedAgentReferenceResolver {
    async fn resolve_directive_content(&self, directive_type: &str, content: &str) -> String {
        if !is_reference_directive(directive_type) || self.embedded.is_empty() {
            return self.fallback.resolve_directive_content(directive_type, content).await;
        }

        let tokens = extract_reference_tokens(content);
        let targets: Vec<Option<String>> = tokens
            .iter()
            .map(|token| self.embedded_url(&token.reference))
            .collect();
        if targets.iter().all(Option::is_none) {
            return self.fallback.resolve_directive_content(directive_type, content).await;
        }

        // Embedded tokens become bare URLs, which are not reference tokens, so
        // the remaining tokens reach the fallback together in a single call.
        let mut substituted = String::with_capacity(content.len());
        let mut cursor = 0;
        for (token, target) in tokens.iter().zip(&targets) {
            if let Some(url) = target {
                substituted.push_str(&content[cursor..token.byte_range.start]);
                substituted.push_str(url);
                cursor = token.byte_range.end;
            }
        }
        substituted.push_str(&content[cursor..]);

        if targets.iter().all(Option::is_some) {
            return substituted;
        }
        self.fallback
            .resolve_directive_content(directive_type, &substituted)
            .await
    }

    fn consume_resolution_issues(&self) -> Vec<AgentReferenceResolutionIssue> {
        self.fallback.consume_resolution_issues()
    }
}

impl std::fmt::Debug for BookScopedAgentReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.embedded.keys().collect();
        names.sort();
        f.debug_struct("BookScopedAgentReferenceResolver")
            .field("parent_identifier", &self.parent_identifier)
            .field("local_server_url", &self.local_server_url.as_str())
            .field("embedded", &names)
            .finish()
    }
}

/// A route identifier resolved to the agent it denotes, with the resolver
/// scoped to that agent's book.
pub struct ResolvedBookScopedAgentContext {
    pub resolved_agent_name: String,
    pub resolved_agent_source: String,
    pub parent_agent_permanent_id: Option<String>,
    pub parent_agent_source: Option<String>,
    pub is_book_scoped_agent: bool,
    pub scoped_resolver: Arc<BookScopedAgentReferenceResolver>,
}

impl std::fmt::Debug for ResolvedBookScopedAgentContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBookScopedAgentContext")
            .field("resolved_agent_name", &self.resolved_agent_name)
            .field("parent_agent_permanent_id", &self.parent_agent_permanent_id)
            .field("is_book_scoped_agent", &self.is_book_scoped_agent)
            .field("scoped_resolver", &self.scoped_resolver)
            .finish()
    }
}

/// Resolve a route identifier (permanent id, agent name or synthetic id).
///
/// Unknown identifiers yield `Ok(None)`. A well-formed synthetic id whose
/// parent exists but no longer embeds the named agent is an
/// [`BookError::EmbeddedAgentNotFound`] error.
pub async fn resolve_book_scoped_agent_context(
    identifier: &str,
    collection: &dyn LocalAgentCollection,
    registry: &DirectiveRegistry,
    local_server_url: &Url,
    fallback: Arc<dyn AgentReferenceResolver>,
) -> Result<Option<ResolvedBookScopedAgentContext>, BookError> {
    if let Some(synthetic) = parse_synthetic_agent_id(identifier) {
        let Some(parent_id) = collection
            .get_agent_permanent_id(&synthetic.parent_identifier)
            .await?
        else {
            return Ok(None);
        };
        let Some(parent_source) = collection.get_agent_source(&parent_id).await? else {
            return Ok(None);
        };

        let embedded_agents = extract_embedded_agents(&parent_source, registry);
        let embedded = embedded_agents
            .iter()
            .find(|agent| agent.normalized_name == synthetic.embedded_agent_name)
            .cloned()
            .ok_or_else(|| BookError::EmbeddedAgentNotFound {
                parent: parent_id.clone(),
                agent_name: synthetic.embedded_agent_name.clone(),
            })?;

        let scoped_resolver = Arc::new(BookScopedAgentReferenceResolver::new(
            &parent_id,
            embedded_agents,
            local_server_url.clone(),
            fallback,
        ));
        return Ok(Some(ResolvedBookScopedAgentContext {
            resolved_agent_name: embedded.agent_name,
            resolved_agent_source: embedded.source,
            parent_agent_permanent_id: Some(parent_id),
            parent_agent_source: Some(parent_source),
            is_book_scoped_agent: true,
            scoped_resolver,
        }));
    }

    let Some(permanent_id) = collection.get_agent_permanent_id(identifier).await? else {
        return Ok(None);
    };
    let Some(source) = collection.get_agent_source(&permanent_id).await? else {
        return Ok(None);
    };
    let agent_name = parse_agent_source(&source, registry)
        .agent_name
        .unwrap_or_else(|| permanent_id.clone());
    let scoped_resolver = Arc::new(BookScopedAgentReferenceResolver::from_book(
        &permanent_id,
        &source,
        registry,
        local_server_url.clone(),
        fallback,
    ));

    Ok(Some(ResolvedBookScopedAgentContext {
        resolved_agent_name: agent_name,
        resolved_agent_source: source,
        parent_agent_permanent_id: None,
        parent_agent_source: None,
        is_book_scoped_agent: false,
        scoped_resolver,
    }))
}

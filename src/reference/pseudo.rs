//! Pseudo-agents: reserved identities that are not authored books.
//!
//! `User` stands for the human talking to the agent and is only meaningful in
//! a teammate list. `Void` marks the intentional absence of an agent (most
//! often "no parent" in `FROM`) and is accepted everywhere.

use super::tokens::unwrap_reference;
use crate::commitment::TEAMMATE_DIRECTIVE;
use serde::Serialize;

/// Legacy spellings of `Void` accepted even without `{…}`/`@` wrappers.
const LEGACY_VOID_ALIASES: [&str; 4] = ["void", "null", "none", "nil"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PseudoAgentKind {
    User,
    Void,
}

impl PseudoAgentKind {
    pub const ALL: [PseudoAgentKind; 2] = [PseudoAgentKind::User, PseudoAgentKind::Void];

    /// Canonical URL substituted for an allowed reference.
    pub fn canonical_url(self) -> &'static str {
        match self {
            PseudoAgentKind::User => "pseudo-agent://user",
            PseudoAgentKind::Void => "pseudo-agent://void",
        }
    }

    /// Display name used in messages and canonical tokens.
    pub fn display_name(self) -> &'static str {
        match self {
            PseudoAgentKind::User => "User",
            PseudoAgentKind::Void => "Void",
        }
    }

    /// Canonical wrapped token, e.g. `{Void}`.
    pub fn canonical_token(self) -> String {
        format!("{{{}}}", self.display_name())
    }

    /// Normalized aliases accepted inside a `{…}`/`@` wrapper.
    fn wrapped_aliases(self) -> &'static [&'static str] {
        match self {
            PseudoAgentKind::User => &["user"],
            PseudoAgentKind::Void => &LEGACY_VOID_ALIASES,
        }
    }

    /// Whether the pseudo-agent may appear in commitments of `directive_type`.
    pub fn is_allowed_in(self, directive_type: &str) -> bool {
        match self {
            PseudoAgentKind::User => directive_type == TEAMMATE_DIRECTIVE,
            PseudoAgentKind::Void => true,
        }
    }

    /// Issue message for a use outside the allow-list.
    pub fn disallowed_message(self, directive_type: &str) -> String {
        format!(
            "Pseudo-agent \"{}\" cannot be used in {} commitment.",
            self.display_name(),
            directive_type
        )
    }
}

/// Lowercase and drop whitespace, `_` and `-`.
fn pseudo_agent_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve a raw reference (`{User}`, `@void`, `null`, a canonical URL) to a pseudo-agent.
///
/// Wrapped references match any alias of either kind; bare text only matches
/// the legacy `Void` aliases so an authored agent named "User" stays reachable.
pub fn resolve_pseudo_agent_kind(raw: &str) -> Option<PseudoAgentKind> {
    let (inner, wrapped) = unwrap_reference(raw);
    if inner.is_empty() {
        return None;
    }
    if let Some(kind) = resolve_pseudo_agent_kind_from_url(inner) {
        return Some(kind);
    }

    let key = pseudo_agent_key(inner);
    if wrapped {
        PseudoAgentKind::ALL
            .into_iter()
            .find(|kind| kind.wrapped_aliases().contains(&key.as_str()))
    } else if LEGACY_VOID_ALIASES.contains(&key.as_str()) {
        Some(PseudoAgentKind::Void)
    } else {
        None
    }
}

/// Map a canonical pseudo-agent URL back to its kind.
pub fn resolve_pseudo_agent_kind_from_url(url: &str) -> Option<PseudoAgentKind> {
    let candidate = url.trim().trim_end_matches('/');
    PseudoAgentKind::ALL
        .into_iter()
        .find(|kind| kind.canonical_url().eq_ignore_ascii_case(candidate))
}

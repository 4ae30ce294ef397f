//! Agent references embedded in commitment content.

mod pseudo;
mod tokens;

pub use pseudo::{resolve_pseudo_agent_kind, resolve_pseudo_agent_kind_from_url, PseudoAgentKind};
pub use tokens::{extract_reference_tokens, unwrap_reference, ReferenceTokenMatch};

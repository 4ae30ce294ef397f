//! Agentbook: agent book parsing and cross-agent reference resolution
//!
//! An agent book is a plain-text agent definition: a name line followed by
//! keyword-introduced commitments (`PERSONA`, `RULE`, `TEAM`, `FROM`, ...).
//! This crate parses books, finds the agent references inside `FROM`, `TEAM`
//! and `IMPORT` commitments, and rewrites them to canonical agent URLs using
//! the local registry, federated servers and agents embedded in the same book.

pub mod commitment;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod name;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod route;
pub mod tooling;

pub use commitment::{parse_agent_source, AgentSourceParseResult, DirectiveRegistry, ParsedCommitment};
pub use diagnostics::{compute_reference_diagnostics, ReferenceDiagnostic, ReferenceDiagnosticsReport};
pub use error::BookError;
pub use name::normalize_agent_name;
pub use reference::{extract_reference_tokens, PseudoAgentKind, ReferenceTokenMatch};
pub use registry::{AgentSummary, LocalAgentCollection};
pub use resolver::{AgentReferenceResolutionIssue, AgentReferenceResolver};
pub use route::{RouteTarget, RouteTargetNormalizer};

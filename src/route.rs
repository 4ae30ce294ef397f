//! Route targets: turn a user-supplied agent reference (a name, `@handle`,
//! `{Name}`, permanent id or URL) into the agent page it should open.

use crate::commitment::TEAMMATE_DIRECTIVE;
use crate::reference::unwrap_reference;
use crate::resolver::{ProvideOptions, ResolverCacheProvider};
use percent_encoding::percent_decode_str;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Where a reference routes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RouteTarget {
    /// Agent hosted on this server.
    #[serde(rename_all = "camelCase")]
    Local {
        canonical_id: String,
        canonical_url: String,
    },
    /// Agent hosted on a federated server.
    Remote { url: String },
}

/// Strip trailing sentence punctuation and a `{…}`/`@` wrapper.
///
/// Returns `None` when nothing is left.
pub fn normalize_route_identifier(raw: &str) -> Option<String> {
    let stripped = raw.trim().trim_end_matches(TRAILING_PUNCTUATION);
    let (reference, _) = unwrap_reference(stripped);
    if reference.is_empty() {
        None
    } else {
        Some(reference.to_string())
    }
}

/// Percent-decoded agent id of an `.../agents/<id>` URL.
fn agent_id_from_url(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., "agents", id] => Some(percent_decode_str(id).decode_utf8_lossy().into_owned()),
        _ => None,
    }
}

/// Resolves route identifiers through the shared resolver cache.
#[derive(Debug, Clone)]
pub struct RouteTargetNormalizer {
    provider: Arc<ResolverCacheProvider>,
    local_server_url: Url,
}

impl RouteTargetNormalizer {
    pub fn new(provider: Arc<ResolverCacheProvider>, local_server_url: Url) -> Self {
        Self {
            provider,
            local_server_url,
        }
    }

    /// Route target for `raw`, or `None` when it does not name a routable agent.
    ///
    /// Failure is read from the cached resolver's issue queue, which is drained
    /// before and after resolving. Concurrent callers sharing that resolver can
    /// drain each other's issues, so calls must not overlap on one provider.
    pub async fn resolve(&self, raw: &str) -> Option<RouteTarget> {
        let reference = normalize_route_identifier(raw)?;
        let resolver = match self.provider.provide(ProvideOptions::default()).await {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!(error = %e, reference = %reference, "Route resolution unavailable");
                return None;
            }
        };

        let token = format!("{{{}}}", reference);
        resolver.consume_resolution_issues();
        let resolved = resolver
            .resolve_directive_content(TEAMMATE_DIRECTIVE, &token)
            .await;
        if !resolver.consume_resolution_issues().is_empty() {
            debug!(reference = %reference, "Route reference did not resolve");
            return None;
        }

        let url = Url::parse(resolved.trim()).ok()?;
        let canonical_id = agent_id_from_url(&url)?;
        if url.origin() == self.local_server_url.origin() {
            Some(RouteTarget::Local {
                canonical_id,
                canonical_url: url.to_string(),
            })
        } else {
            Some(RouteTarget::Remote {
                url: url.to_string(),
            })
        }
    }
}

//! Short-lived resolver cache.
//!
//! Building a resolver lists every local agent, so request handlers share one
//! instance for a TTL window. Concurrent callers join the same build.

use super::federated::{FederatedAgentReferenceResolver, DEFAULT_FETCH_TIMEOUT};
use super::federation::{FederationClient, FederationList};
use super::AgentReferenceResolver;
use crate::error::BookError;
use crate::registry::LocalAgentCollection;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default lifetime of a cached resolver.
pub const DEFAULT_RESOLVER_TTL: Duration = Duration::from_millis(5000);

type BuildResult = Result<Arc<dyn AgentReferenceResolver>, BookError>;
type SharedBuild = Shared<BoxFuture<'static, BuildResult>>;

/// Builds a fresh resolver from the current registry state.
#[async_trait]
pub trait ResolverFactory: Send + Sync {
    async fn build_resolver(&self) -> BuildResult;
}

/// Builds a [`FederatedAgentReferenceResolver`] over a snapshot of the local
/// collection and the current federated server list.
pub struct FederatedResolverFactory {
    collection: Arc<dyn LocalAgentCollection>,
    federation: Arc<dyn FederationList>,
    client: Arc<dyn FederationClient>,
    local_server_url: Url,
    fetch_timeout: Duration,
}

impl FederatedResolverFactory {
    pub fn new(
        collection: Arc<dyn LocalAgentCollection>,
        federation: Arc<dyn FederationList>,
        client: Arc<dyn FederationClient>,
        local_server_url: Url,
    ) -> Self {
        Self {
            collection,
            federation,
            client,
            local_server_url,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

#[async_trait]
impl ResolverFactory for FederatedResolverFactory {
    async fn build_resolver(&self) -> BuildResult {
        let agents = self
            .collection
            .list_agents()
            .await
            .map_err(|e| BookError::ResolverBuildError(e.to_string()))?;
        let servers = self
            .federation
            .federated_servers()
            .await
            .map_err(|e| BookError::ResolverBuildError(e.to_string()))?;
        debug!(
            local_agents = agents.len(),
            federated_servers = servers.len(),
            "Building federated reference resolver"
        );

        let resolver = FederatedAgentReferenceResolver::new(
            &self.local_server_url,
            &agents,
            servers,
            self.client.clone(),
        )
        .with_fetch_timeout(self.fetch_timeout);
        Ok(Arc::new(resolver))
    }
}

/// Options for [`ResolverCacheProvider::provide`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvideOptions {
    /// Rebuild even when the cached resolver has not expired.
    pub force_refresh: bool,
}

#[derive(Default)]
struct CachedResolverState {
    resolver: Option<Arc<dyn AgentReferenceResolver>>,
    expires_at: Option<Instant>,
    in_flight: Option<SharedBuild>,
}

/// TTL cache with single-flight construction around a [`ResolverFactory`].
pub struct ResolverCacheProvider {
    factory: Arc<dyn ResolverFactory>,
    ttl: Duration,
    state: Arc<Mutex<CachedResolverState>>,
}

impl ResolverCacheProvider {
    pub fn new(factory: Arc<dyn ResolverFactory>) -> Self {
        Self {
            factory,
            ttl: DEFAULT_RESOLVER_TTL,
            state: Arc::new(Mutex::new(CachedResolverState::default())),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached resolver if fresh, otherwise the result of a (shared) rebuild.
    ///
    /// A failed build is returned to every waiting caller and leaves the
    /// cache unchanged; the next call starts a new build.
    pub async fn provide(&self, options: ProvideOptions) -> BuildResult {
        let build = {
            let mut state = self.state.lock();
            if !options.force_refresh {
                if let (Some(resolver), Some(expires_at)) = (&state.resolver, state.expires_at) {
                    if Instant::now() < expires_at {
                        return Ok(resolver.clone());
                    }
                }
            }
            match state.in_flight.clone() {
                Some(build) => build,
                None => self.start_build(&mut state),
            }
        };
        build.await
    }

    /// Drop the cached resolver. A build already in flight still completes
    /// and stores its result.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.resolver = None;
        state.expires_at = None;
        debug!("Reference resolver cache invalidated");
    }

    fn start_build(&self, state: &mut CachedResolverState) -> SharedBuild {
        let factory = self.factory.clone();
        let shared_state = self.state.clone();
        let ttl = self.ttl;

        let build = async move {
            let result = factory.build_resolver().await;
            let mut state = shared_state.lock();
            state.in_flight = None;
            match &result {
                Ok(resolver) => {
                    state.resolver = Some(resolver.clone());
                    state.expires_at = Some(Instant::now() + ttl);
                    info!(ttl_ms = ttl.as_millis() as u64, "Reference resolver built");
                }
                Err(e) => warn!(error = %e, "Failed to build reference resolver"),
            }
            result
        }
        .boxed()
        .shared();

        state.in_flight = Some(build.clone());
        build
    }
}

impl std::fmt::Debug for ResolverCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResolverCacheProvider")
            .field("ttl", &self.ttl)
            .field("cached", &state.resolver.is_some())
            .field("building", &state.in_flight.is_some())
            .finish()
    }
}

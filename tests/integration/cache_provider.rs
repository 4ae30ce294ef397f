use crate::support::{local_url, StaticFederation};
use agentbook::registry::{InMemoryAgentCollection, LocalAgentCollection};
use agentbook::resolver::{
    FederatedResolverFactory, ProvideOptions, ResolverCacheProvider, ResolverFactory,
};
use agentbook::{AgentReferenceResolver, AgentSummary, BookError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Local collection that counts listings and answers slowly.
struct SlowCollection {
    inner: InMemoryAgentCollection,
    listings: AtomicUsize,
}

#[async_trait]
impl LocalAgentCollection for SlowCollection {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>, BookError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.list_agents().await
    }

    async fn get_agent_permanent_id(&self, identifier: &str) -> Result<Option<String>, BookError> {
        self.inner.get_agent_permanent_id(identifier).await
    }

    async fn get_agent_source(&self, permanent_id: &str) -> Result<Option<String>, BookError> {
        self.inner.get_agent_source(permanent_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn concurrent_provides_share_one_build_and_force_refresh_adds_one() {
    let collection = Arc::new(SlowCollection {
        inner: InMemoryAgentCollection::new().with_agent("Alice", Some("aLc12345"), "Alice"),
        listings: AtomicUsize::new(0),
    });
    let factory = FederatedResolverFactory::new(
        collection.clone(),
        Arc::new(Vec::<String>::new()),
        Arc::new(StaticFederation::default()),
        local_url(),
    );
    let provider = ResolverCacheProvider::new(Arc::new(factory));

    let (first, second) = tokio::join!(
        provider.provide(ProvideOptions::default()),
        provider.provide(ProvideOptions::default())
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(collection.listings.load(Ordering::SeqCst), 1);

    let refreshed = provider
        .provide(ProvideOptions {
            force_refresh: true,
        })
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &refreshed));
    assert_eq!(collection.listings.load(Ordering::SeqCst), 2);

    assert_eq!(
        refreshed.resolve_directive_content("TEAM", "{Alice}").await,
        "https://local.example/agents/aLc12345"
    );
}

#[tokio::test(start_paused = true)]
async fn registry_changes_are_seen_after_ttl_or_invalidation() {
    let collection = Arc::new(InMemoryAgentCollection::new());
    let factory = FederatedResolverFactory::new(
        collection.clone(),
        Arc::new(Vec::<String>::new()),
        Arc::new(StaticFederation::default()),
        local_url(),
    );
    let provider =
        ResolverCacheProvider::new(Arc::new(factory)).with_ttl(Duration::from_millis(500));

    let before = provider.provide(ProvideOptions::default()).await.unwrap();
    collection.register("Bob", Some("bB123456"), "Bob");

    let cached = provider.provide(ProvideOptions::default()).await.unwrap();
    assert_eq!(cached.resolve_directive_content("TEAM", "{Bob}").await, "");
    assert!(Arc::ptr_eq(&before, &cached));

    tokio::time::advance(Duration::from_millis(501)).await;
    let expired = provider.provide(ProvideOptions::default()).await.unwrap();
    assert_eq!(
        expired.resolve_directive_content("TEAM", "{Bob}").await,
        "https://local.example/agents/bB123456"
    );

    collection.remove("bB123456");
    provider.invalidate();
    let invalidated = provider.provide(ProvideOptions::default()).await.unwrap();
    assert_eq!(invalidated.resolve_directive_content("TEAM", "{Bob}").await, "");
}

#[tokio::test]
async fn factory_errors_surface_as_build_errors() {
    struct BrokenCollection;

    #[async_trait]
    impl LocalAgentCollection for BrokenCollection {
        async fn list_agents(&self) -> Result<Vec<AgentSummary>, BookError> {
            Err(BookError::RegistryError("disk unavailable".to_string()))
        }

        async fn get_agent_permanent_id(&self, _identifier: &str) -> Result<Option<String>, BookError> {
            Ok(None)
        }

        async fn get_agent_source(&self, _permanent_id: &str) -> Result<Option<String>, BookError> {
            Ok(None)
        }
    }

    let factory = FederatedResolverFactory::new(
        Arc::new(BrokenCollection),
        Arc::new(Vec::<String>::new()),
        Arc::new(StaticFederation::default()),
        local_url(),
    );
    let err = factory.build_resolver().await.err().expect("expected resolver build error");
    assert!(matches!(err, BookError::ResolverBuildError(ref m) if m.contains("disk unavailable")));
}

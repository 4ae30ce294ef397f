use crate::support::{local_resolver, local_url, StaticFederation};
use agentbook::registry::InMemoryAgentCollection;
use agentbook::resolver::{
    build_synthetic_agent_id, parse_synthetic_agent_id, resolve_book_scoped_agent_context,
    BookScopedAgentReferenceResolver, FederatedResolverFactory, ResolverCacheProvider,
};
use agentbook::{AgentReferenceResolver, DirectiveRegistry, RouteTarget, RouteTargetNormalizer};
use std::sync::Arc;

const TEAM_BOOK: &str = "Editorial Lead
PERSONA Plans the issue
TEAM {Fact Checker}, {Copy Editor} and {User}

---

Fact Checker
PERSONA Verifies every claim
TEAM {Copy Editor}

---

Copy Editor
RULE Keep the house style";

fn collection() -> Arc<InMemoryAgentCollection> {
    Arc::new(
        InMemoryAgentCollection::new()
            .with_agent("Editorial Lead", Some("eD123456"), TEAM_BOOK)
            .with_agent("Photo Desk", Some("pH123456"), "Photo Desk\nPERSONA Picks images"),
    )
}

fn normalizer(collection: Arc<InMemoryAgentCollection>) -> RouteTargetNormalizer {
    let federation = StaticFederation::default()
        .with_listing("https://peer.example", &[("Wire Service", "wS123456")]);
    let factory = FederatedResolverFactory::new(
        collection,
        Arc::new(vec!["https://peer.example".to_string()]),
        Arc::new(federation),
        local_url(),
    );
    RouteTargetNormalizer::new(
        Arc::new(ResolverCacheProvider::new(Arc::new(factory))),
        local_url(),
    )
}

#[tokio::test]
async fn embedded_agents_resolve_to_synthetic_ids_without_the_fallback() {
    let collection = collection();
    let context = resolve_book_scoped_agent_context(
        "eD123456",
        collection.as_ref(),
        &DirectiveRegistry::standard(),
        &local_url(),
        Arc::new(local_resolver(&[])),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(!context.is_book_scoped_agent);

    let resolved = context
        .scoped_resolver
        .resolve_directive_content("TEAM", "{Fact Checker}, {Copy Editor} and {User}")
        .await;
    let fact_checker = build_synthetic_agent_id("eD123456", "Fact Checker").unwrap();
    let copy_editor = build_synthetic_agent_id("eD123456", "Copy Editor").unwrap();
    assert_eq!(
        resolved,
        format!(
            "https://local.example/agents/{}, https://local.example/agents/{} and pseudo-agent://user",
            fact_checker, copy_editor
        )
    );
    assert!(context.scoped_resolver.consume_resolution_issues().is_empty());
}

#[tokio::test]
async fn repeated_unknown_reference_next_to_embedded_agent_queues_one_issue() {
    let scoped = BookScopedAgentReferenceResolver::from_book(
        "eD123456",
        TEAM_BOOK,
        &DirectiveRegistry::standard(),
        local_url(),
        Arc::new(local_resolver(&[])),
    );
    let plain = local_resolver(&[]);

    let resolved = scoped
        .resolve_directive_content("TEAM", "{Copy Editor} {Ghost} {Ghost}")
        .await;
    plain.resolve_directive_content("TEAM", "{Ghost} {Ghost}").await;

    let copy_editor = build_synthetic_agent_id("eD123456", "Copy Editor").unwrap();
    assert_eq!(
        resolved,
        format!("https://local.example/agents/{}  ", copy_editor)
    );
    let scoped_issues = scoped.consume_resolution_issues();
    assert_eq!(scoped_issues.len(), 1);
    assert_eq!(scoped_issues[0].reference, "Ghost");
    assert_eq!(plain.consume_resolution_issues().len(), scoped_issues.len());
}

#[tokio::test]
async fn synthetic_route_ids_round_trip_to_the_embedded_section() {
    let collection = collection();
    let synthetic = build_synthetic_agent_id("eD123456", "fact checker").unwrap();
    let decoded = parse_synthetic_agent_id(&synthetic).unwrap();
    assert_eq!(decoded.parent_identifier, "eD123456");
    assert_eq!(decoded.embedded_agent_name, "fact-checker");

    let context = resolve_book_scoped_agent_context(
        &synthetic,
        collection.as_ref(),
        &DirectiveRegistry::standard(),
        &local_url(),
        Arc::new(local_resolver(&[])),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(context.is_book_scoped_agent);
    assert_eq!(context.resolved_agent_name, "Fact Checker");
    assert!(context.resolved_agent_source.contains("Verifies every claim"));
    assert_eq!(context.parent_agent_permanent_id.as_deref(), Some("eD123456"));

    // Siblings stay reachable from inside the embedded agent.
    let sibling = context
        .scoped_resolver
        .resolve_directive_content("TEAM", "{Copy Editor}")
        .await;
    assert!(sibling.ends_with(&build_synthetic_agent_id("eD123456", "Copy Editor").unwrap()));
}

#[tokio::test]
async fn route_targets_distinguish_local_and_remote_agents() {
    let normalizer = normalizer(collection());

    assert_eq!(
        normalizer.resolve("@photo-desk,").await,
        Some(RouteTarget::Local {
            canonical_id: "pH123456".to_string(),
            canonical_url: "https://local.example/agents/pH123456".to_string(),
        })
    );
    assert_eq!(
        normalizer.resolve("{Wire Service}!").await,
        Some(RouteTarget::Remote {
            url: "https://peer.example/agents/wS123456".to_string(),
        })
    );
    assert_eq!(
        normalizer
            .resolve("https://local.example/agents/Editorial%20Lead")
            .await,
        Some(RouteTarget::Local {
            canonical_id: "Editorial Lead".to_string(),
            canonical_url: "https://local.example/agents/Editorial%20Lead".to_string(),
        })
    );
}

#[tokio::test]
async fn unroutable_references_yield_none() {
    let normalizer = normalizer(collection());

    assert_eq!(normalizer.resolve("{Nobody Here}").await, None);
    assert_eq!(normalizer.resolve("{User}").await, None);
    assert_eq!(normalizer.resolve("https://local.example/about").await, None);
    assert_eq!(normalizer.resolve("  ?! ").await, None);
}

#[tokio::test]
async fn sequential_routes_on_one_normalizer_do_not_see_stale_issues() {
    let normalizer = normalizer(collection());

    assert_eq!(normalizer.resolve("{Nobody Here}").await, None);
    assert_eq!(
        normalizer.resolve("@photo-desk").await,
        Some(RouteTarget::Local {
            canonical_id: "pH123456".to_string(),
            canonical_url: "https://local.example/agents/pH123456".to_string(),
        })
    );
    assert_eq!(normalizer.resolve("{Ghost}").await, None);
    assert!(normalizer.resolve("{Wire Service}").await.is_some());
}

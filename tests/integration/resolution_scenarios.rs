use crate::support::{agent, local_resolver, local_url, StaticFederation};
use agentbook::commitment::{INHERITANCE_DIRECTIVE, TEAMMATE_DIRECTIVE};
use agentbook::resolver::{FederatedAgentReferenceResolver, VOID_SENTINEL};
use agentbook::{parse_agent_source, AgentReferenceResolver, DirectiveRegistry, PseudoAgentKind};
use std::sync::Arc;

#[tokio::test]
async fn simple_local_name_resolves_to_permanent_id_url() {
    let resolver = local_resolver(&[agent("Alice Cooper", Some("abc123"))]);

    let resolved = resolver
        .resolve_directive_content(TEAMMATE_DIRECTIVE, "{Alice Cooper}")
        .await;

    assert_eq!(resolved, "https://local.example/agents/abc123");
    assert!(resolver.consume_resolution_issues().is_empty());
}

#[tokio::test]
async fn unresolved_inheritance_becomes_void_with_one_issue() {
    let resolver = local_resolver(&[]);

    let resolved = resolver
        .resolve_directive_content(INHERITANCE_DIRECTIVE, "{Unknown Agent}")
        .await;

    assert_eq!(resolved, VOID_SENTINEL);
    let issues = resolver.consume_resolution_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].commitment_type, "FROM");
    assert_eq!(issues[0].reference, "Unknown Agent");
}

#[tokio::test]
async fn pseudo_agents_are_case_insensitive_and_restricted() {
    let resolver = local_resolver(&[]);

    let void = resolver
        .resolve_directive_content(INHERITANCE_DIRECTIVE, "{VoId}")
        .await;
    assert_eq!(void, "{Void}");
    assert!(resolver.consume_resolution_issues().is_empty());

    let user = resolver
        .resolve_directive_content(TEAMMATE_DIRECTIVE, "{UsEr}")
        .await;
    assert_eq!(user, PseudoAgentKind::User.canonical_url());
    assert!(resolver.consume_resolution_issues().is_empty());

    let parent = resolver
        .resolve_directive_content(INHERITANCE_DIRECTIVE, "{User}")
        .await;
    assert_eq!(parent, VOID_SENTINEL);
    let issues = resolver.consume_resolution_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues[0].message,
        "Pseudo-agent \"User\" cannot be used in FROM commitment."
    );
}

#[tokio::test]
async fn resolution_is_deterministic_and_issues_drain_once() {
    let resolver = local_resolver(&[agent("Alice Cooper", Some("abc123"))]);

    let first = resolver
        .resolve_directive_content(TEAMMATE_DIRECTIVE, "{Alice Cooper} with {Ghost} and {Ghost}")
        .await;
    let first_issues = resolver.consume_resolution_issues();
    let second = resolver
        .resolve_directive_content(TEAMMATE_DIRECTIVE, "{Alice Cooper} with {Ghost} and {Ghost}")
        .await;
    let second_issues = resolver.consume_resolution_issues();

    assert_eq!(first, second);
    assert_eq!(first, "https://local.example/agents/abc123 with  and ");
    assert_eq!(first_issues, second_issues);
    assert_eq!(first_issues.len(), 1);
    assert!(resolver.consume_resolution_issues().is_empty());
}

#[tokio::test]
async fn federated_servers_are_consulted_in_order_after_local() {
    let federation = Arc::new(
        StaticFederation::default()
            .with_listing("https://peer-a.example", &[("Zed", "zZa12345")])
            .with_listing("https://peer-b.example", &[("Zed", "zZb12345"), ("Yara", "yYb12345")]),
    );
    let resolver = FederatedAgentReferenceResolver::new(
        &local_url(),
        &[agent("Yara", Some("yLc12345"))],
        vec![
            "https://peer-a.example".to_string(),
            "https://peer-b.example/".to_string(),
        ],
        federation.clone(),
    );

    let resolved = resolver
        .resolve_directive_content(TEAMMATE_DIRECTIVE, "{Zed}, {Yara} and {zZb12345}")
        .await;

    assert_eq!(
        resolved,
        "https://peer-a.example/agents/zZa12345, https://local.example/agents/yLc12345 and https://peer-b.example/agents/zZb12345"
    );
    assert!(resolver.consume_resolution_issues().is_empty());
    assert_eq!(federation.fetch_count(), 2);
}

#[test]
fn horizontal_rule_at_end_of_input_closes_commitment() {
    let result = parse_agent_source(
        "Agent\nPERSONA Kind and\n  patient\n---",
        &DirectiveRegistry::standard(),
    );

    assert_eq!(result.commitments.len(), 1);
    assert_eq!(result.commitments[0].content, "Kind and\n  patient");
    assert_eq!(result.commitments[0].end_line_number, 3);
    assert_eq!(result.non_commitment_lines, vec!["---".to_string()]);
}

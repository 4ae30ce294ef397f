use crate::support::{local_url, StaticFederation};
use agentbook::registry::DirectoryAgentCollection;
use agentbook::resolver::{FederatedResolverFactory, ResolverFactory};
use agentbook::{BookError, DirectiveRegistry, LocalAgentCollection};
use std::sync::Arc;
use tempfile::TempDir;

fn books_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("research")).unwrap();
    std::fs::write(
        temp.path().join("aN4lyst9.book"),
        "Data Analyst\nPERSONA Reads the numbers\nTEAM {Field Researcher}",
    )
    .unwrap();
    std::fs::write(
        temp.path().join("research").join("fR3search.book"),
        "Field Researcher\nPERSONA Collects interviews",
    )
    .unwrap();
    temp
}

#[tokio::test]
async fn directory_books_feed_the_resolver() {
    let temp = books_dir();
    let collection = Arc::new(DirectoryAgentCollection::new(
        temp.path(),
        DirectiveRegistry::standard(),
    ));

    let mut agents = collection.list_agents().await.unwrap();
    agents.sort_by(|a, b| a.agent_name.cmp(&b.agent_name));
    let names: Vec<&str> = agents.iter().map(|a| a.agent_name.as_str()).collect();
    assert_eq!(names, vec!["Data Analyst", "Field Researcher"]);

    let factory = FederatedResolverFactory::new(
        collection.clone(),
        Arc::new(Vec::<String>::new()),
        Arc::new(StaticFederation::default()),
        local_url(),
    );
    let resolver = factory.build_resolver().await.unwrap();
    assert_eq!(
        resolver
            .resolve_directive_content("TEAM", "{field researcher} and @data-analyst")
            .await,
        "https://local.example/agents/fR3search and https://local.example/agents/aN4lyst9"
    );

    // Books added later are picked up by the next build.
    std::fs::write(temp.path().join("n3wcomer.book"), "Newcomer\nPERSONA Just joined").unwrap();
    let rebuilt = factory.build_resolver().await.unwrap();
    assert_eq!(
        rebuilt.resolve_directive_content("FROM", "{Newcomer}").await,
        "https://local.example/agents/n3wcomer"
    );
}

#[tokio::test]
async fn missing_directory_is_a_registry_error() {
    let temp = TempDir::new().unwrap();
    let collection =
        DirectoryAgentCollection::new(temp.path().join("absent"), DirectiveRegistry::standard());
    assert!(matches!(
        collection.list_agents().await,
        Err(BookError::RegistryError(_))
    ));
}

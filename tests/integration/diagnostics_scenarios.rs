use crate::support::{agent, local_resolver};
use agentbook::diagnostics::DIAGNOSTIC_SOURCE;
use agentbook::{compute_reference_diagnostics, DirectiveRegistry};

const SCENARIO_BOOK: &str = "Scenario Agent
FROM {Missing Parent}
PERSONA Careful reviewer
TEAM {Known Teammate}
TEAM {Missing Teammate}
IMPORT {Missing Import}
RULE Cite sources";

#[tokio::test]
async fn diagnostics_report_ranges_of_unresolved_references() {
    let resolver = local_resolver(&[agent("Known Teammate", Some("kT123456"))]);

    let report =
        compute_reference_diagnostics(SCENARIO_BOOK, &DirectiveRegistry::standard(), &resolver)
            .await;

    let starts: Vec<(usize, usize)> = report
        .diagnostics
        .iter()
        .map(|d| (d.start_line, d.start_column))
        .collect();
    assert_eq!(starts, vec![(2, 6), (5, 6), (6, 8)]);
    assert_eq!(report.missing_references, vec!["Missing Teammate".to_string()]);

    let parent = &report.diagnostics[0];
    assert_eq!(parent.commitment_type, "FROM");
    assert_eq!(parent.reference, "Missing Parent");
    assert_eq!((parent.end_line, parent.end_column), (2, 22));
    assert_eq!(parent.message, "Agent \"Missing Parent\" could not be resolved.");
    assert!(report.diagnostics.iter().all(|d| d.source == DIAGNOSTIC_SOURCE));
}

#[tokio::test]
async fn diagnostics_serialize_in_camel_case() {
    let resolver = local_resolver(&[]);
    let report = compute_reference_diagnostics(
        "Agent\nTEAM {Ghost}",
        &DirectiveRegistry::standard(),
        &resolver,
    )
    .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["missingReferences"][0], "Ghost");
    assert_eq!(json["diagnostics"][0]["startLine"], 2);
    assert_eq!(json["diagnostics"][0]["startColumn"], 6);
    assert_eq!(json["diagnostics"][0]["commitmentType"], "TEAM");
    assert_eq!(json["diagnostics"][0]["source"], "agent-references");
}

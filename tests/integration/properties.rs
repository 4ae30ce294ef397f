use agentbook::normalize_agent_name;
use agentbook::resolver::{build_synthetic_agent_id, parse_synthetic_agent_id};
use proptest::prelude::*;

proptest! {
    #[test]
    fn normalization_is_idempotent(name in "[A-Za-zÀ-ÿ0-9 _.,'\\-]{0,40}") {
        let once = normalize_agent_name(&name);
        prop_assert_eq!(normalize_agent_name(&once), once);
    }

    #[test]
    fn normalization_is_idempotent_for_greek_and_cyrillic(name in "[α-ωΑ-Ωа-яА-Я ]{0,24}") {
        let once = normalize_agent_name(&name);
        prop_assert_eq!(normalize_agent_name(&once), once);
    }

    #[test]
    fn normalized_names_have_no_edge_or_double_separators(name in "[A-Za-z0-9 _.\\-]{0,40}") {
        let normalized = normalize_agent_name(&name);
        prop_assert!(!normalized.starts_with('-'));
        prop_assert!(!normalized.ends_with('-'));
        prop_assert!(!normalized.contains("--"));
    }

    #[test]
    fn synthetic_ids_round_trip(
        parent in "[A-Za-z0-9~._:/\\-]{1,32}",
        embedded in "[A-Za-z][A-Za-z0-9 ]{0,24}",
    ) {
        let id = build_synthetic_agent_id(&parent, &embedded).unwrap();
        let decoded = parse_synthetic_agent_id(&id).unwrap();
        prop_assert_eq!(decoded.parent_identifier, parent);
        prop_assert_eq!(decoded.embedded_agent_name, normalize_agent_name(&embedded));
    }

    #[test]
    fn every_built_synthetic_id_decodes(parent in "\\PC{0,16}", embedded in "\\PC{0,16}") {
        match build_synthetic_agent_id(&parent, &embedded) {
            Some(id) => {
                let decoded = parse_synthetic_agent_id(&id).unwrap();
                prop_assert_eq!(decoded.parent_identifier, parent);
                prop_assert_eq!(decoded.embedded_agent_name, normalize_agent_name(&embedded));
            }
            None => {
                prop_assert!(parent.is_empty() || normalize_agent_name(&embedded).is_empty());
            }
        }
    }

    #[test]
    fn parsing_arbitrary_ids_never_panics(id in "\\PC{0,64}") {
        let _ = parse_synthetic_agent_id(&id);
    }
}

//! Property-based tests for stack props, naming and synthesis.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;

use efsml_cli::application::services::plan::plan_stack;
use efsml_cli::domain::buildspec::BuildSpec;
use efsml_cli::domain::checks::{all_passed, run_checks};
use efsml_cli::domain::config::{
    MAX_NAME_BASE_LEN, StackProps, VALID_CONFIG_KEYS, validate_config_key, validate_config_value,
};
use efsml_cli::domain::graph::ResourceGraph;
use efsml_cli::domain::stack::{SynthOptions, synthesize};

/// Name fragments accepted by the prefix/stage validator.
fn name_fragment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}(-[a-z0-9]{1,4})?"
}

/// Edge count and the sorted (dependent type, dependency type) pairs.
fn edge_signature(prefix: &str, stage: &str) -> (usize, Vec<(String, String)>) {
    let props = StackProps::new(prefix, stage, None).unwrap();
    let template = synthesize(&props, &SynthOptions::default()).unwrap().template;
    let graph = ResourceGraph::from_template(&template).unwrap();
    let type_of = |id: &str| template.resource(id).unwrap().resource_type.clone();
    let mut pairs: Vec<(String, String)> = template
        .resources
        .keys()
        .flat_map(|id| {
            graph
                .dependencies_of(id)
                .into_iter()
                .map(|dep| (type_of(id.as_str()), type_of(dep)))
                .collect::<Vec<_>>()
        })
        .collect();
    pairs.sort();
    (graph.edge_count(), pairs)
}

// ============================================================================
// Synthesis invariants
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Every valid prefix/stage yields the same resource count and passes
    /// every structural check.
    #[test]
    fn prop_any_valid_names_synthesize_checked_stack(
        prefix in name_fragment(),
        stage in name_fragment(),
    ) {
        let props = StackProps::new(&prefix, &stage, None).unwrap();
        let stack = synthesize(&props, &SynthOptions::default()).unwrap();
        prop_assert_eq!(stack.template.resources.len(), 42);
        prop_assert_eq!(stack.stack_name, format!("{prefix}-{stage}-stack"));
        let results = run_checks(&stack.template);
        prop_assert!(all_passed(&results), "{:?}", results);
    }

    /// The wave structure does not depend on the names.
    #[test]
    fn prop_wave_shape_is_name_independent(
        prefix in name_fragment(),
        stage in name_fragment(),
    ) {
        let reference = plan_stack(&StackProps::new("efsml", "dev", None).unwrap()).unwrap();
        let plan = plan_stack(&StackProps::new(&prefix, &stage, None).unwrap()).unwrap();
        let shape = |p: &efsml_cli::application::services::plan::Plan| {
            p.waves.iter().map(Vec::len).collect::<Vec<_>>()
        };
        prop_assert_eq!(shape(&plan), shape(&reference));
    }

    /// The dependency edges do not depend on the names.
    #[test]
    fn prop_dependency_edges_are_name_independent(
        prefix in name_fragment(),
        stage in name_fragment(),
    ) {
        let (ref_count, ref_pairs) = edge_signature("efsml", "dev");
        let (count, pairs) = edge_signature(&prefix, &stage);
        prop_assert_eq!(count, ref_count);
        prop_assert_eq!(pairs, ref_pairs);
    }

    /// Logical ids are alphanumeric and unique per template.
    #[test]
    fn prop_logical_ids_are_alphanumeric(
        prefix in name_fragment(),
        stage in name_fragment(),
    ) {
        let props = StackProps::new(&prefix, &stage, None).unwrap();
        let stack = synthesize(&props, &SynthOptions::default()).unwrap();
        for id in stack.template.resources.keys() {
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()), "bad id: {}", id);
            prop_assert!(id.len() <= 255);
        }
    }
}

// ============================================================================
// StackProps validation
// ============================================================================

proptest! {
    /// Names with a character outside [A-Za-z0-9-] are rejected.
    #[test]
    fn prop_names_with_symbols_rejected(
        head in "[a-z]{1,5}",
        symbol in "[_./ :@]",
        tail in "[a-z]{0,5}",
    ) {
        let bad = format!("{head}{symbol}{tail}");
        prop_assert!(StackProps::new(&bad, "dev", None).is_err());
        prop_assert!(StackProps::new("efsml", &bad, None).is_err());
    }

    /// Names longer than the limit are rejected whatever their content.
    #[test]
    fn prop_overlong_name_base_rejected(extra in 1usize..20) {
        let prefix = "a".repeat(MAX_NAME_BASE_LEN - 3 + extra);
        prop_assert!(StackProps::new(&prefix, "dev", None).is_err());
    }

    /// Any package list survives the shell as the same pip arguments.
    #[test]
    fn prop_packages_reach_pip_as_written(
        packages in proptest::collection::vec("[a-z]{1,8}[;|&`$<>=~\\[\\]'\x22()!*]{0,3}[0-9.]{0,4}", 1..4),
    ) {
        let list = packages.join(" ");
        let spec = BuildSpec::install(Some(&list));
        let (_, args) = spec.install_command().unwrap().split_once("pip3 install ").unwrap();
        prop_assert_eq!(shell_words::split(args).unwrap(), packages);
    }

    /// Version-pinned package lists are accepted.
    #[test]
    fn prop_pinned_packages_accepted(
        pkg in "[a-z]{1,10}",
        major in 0u32..10,
        minor in 0u32..20,
    ) {
        let packages = format!("{pkg}=={major}.{minor} pillow");
        let props = StackProps::new("efsml", "dev", Some(&packages)).unwrap();
        prop_assert_eq!(props.install_packages(), Some(packages.as_str()));
    }
}

// ============================================================================
// validate_config_key() and validate_config_value() property tests
// ============================================================================

proptest! {
    /// Arbitrary keys (not in whitelist) are rejected.
    #[test]
    fn prop_arbitrary_keys_rejected(key in "[a-z]{1,20}\\.[a-z_]{1,20}") {
        if !VALID_CONFIG_KEYS.contains(&key.as_str()) {
            prop_assert!(validate_config_key(&key).is_err(), "accepted invalid key: {key}");
        }
    }

    /// Valid name fragments are accepted for both name keys.
    #[test]
    fn prop_valid_names_accepted_as_values(name in name_fragment()) {
        prop_assert!(validate_config_value("stack.prefix", &name).is_ok());
        prop_assert!(validate_config_value("stack.stage", &name).is_ok());
    }
}

#[test]
fn test_longest_name_base_keeps_dependency_edges() {
    let prefix = "a".repeat(MAX_NAME_BASE_LEN - 4);
    assert_eq!(edge_signature(&prefix, "dev"), edge_signature("efsml", "dev"));
}

#[test]
fn test_every_whitelisted_key_validates() {
    for key in VALID_CONFIG_KEYS {
        assert!(validate_config_key(key).is_ok(), "{key}");
    }
}

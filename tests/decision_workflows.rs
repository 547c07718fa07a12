//! Integration tests for common Vane workflows.
//!
//! These tests go through the facade crate the way an embedding application
//! would: load a datafile, build an engine, decide flags.

use std::io::Write;
use std::sync::Arc;

use vane::ConfigError;
use vane::prelude::*;

const DATAFILE: &str = r#"{
    "version": "4",
    "revision": "12",
    "experiments": [
        {
            "id": "exp_search", "key": "search_ranking", "status": "Running",
            "audienceIds": ["mobile"],
            "variations": [
                {"id": "v_classic", "key": "classic", "featureEnabled": false},
                {"id": "v_neural", "key": "neural", "featureEnabled": true,
                 "variables": [{"id": "var_depth", "value": "5"}]}
            ],
            "trafficAllocation": [
                {"entityId": "", "endOfRange": 0},
                {"entityId": "v_neural", "endOfRange": 10000}
            ]
        }
    ],
    "rollouts": [
        {
            "id": "ro_search",
            "experiments": [
                {"id": "rule_staff", "key": "staff", "status": "Running",
                 "audienceIds": ["staff"],
                 "variations": [{"id": "v_staff", "key": "staff_on", "featureEnabled": true}],
                 "trafficAllocation": [{"entityId": "v_staff", "endOfRange": 10000}]},
                {"id": "rule_everyone", "key": "everyone_else", "status": "Running",
                 "variations": [{"id": "v_off", "key": "off", "featureEnabled": false}],
                 "trafficAllocation": [{"entityId": "v_off", "endOfRange": 10000}]}
            ]
        }
    ],
    "featureFlags": [
        {
            "id": "flag_search", "key": "smart_search",
            "experimentIds": ["exp_search"], "rolloutId": "ro_search",
            "variables": [
                {"id": "var_depth", "key": "depth", "type": "integer", "defaultValue": "1"},
                {"id": "var_label", "key": "label", "type": "string", "defaultValue": "Search"}
            ]
        }
    ],
    "audiences": [
        {"id": "mobile", "name": "Mobile",
         "conditions": "[\"and\", [\"or\", [\"or\", {\"name\": \"platform\", \"type\": \"custom_attribute\", \"value\": \"mobile\"}]]]"},
        {"id": "staff", "name": "Staff",
         "conditions": "[\"and\", [\"or\", [\"or\", {\"name\": \"email\", \"type\": \"custom_attribute\", \"match\": \"substring\", \"value\": \"@vane.dev\"}]]]"}
    ]
}"#;

fn attributes(pairs: &[(&str, &str)]) -> UserAttributes {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), AttributeValue::from(*value)))
        .collect()
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_engine_from_datafile_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DATAFILE.as_bytes()).unwrap();

    let config = ProjectConfig::from_file(file.path()).unwrap();
    let engine = DecisionEngine::new(config);
    assert_eq!(engine.config().unwrap().revision(), "12");
}

#[test]
fn test_bad_datafile_is_rejected() {
    let result = ProjectConfig::from_json(r#"{"version": "1"}"#);
    assert!(matches!(result, Err(ConfigError::UnsupportedVersion(_))));
}

// =============================================================================
// Decide
// =============================================================================

#[test]
fn test_experiment_decision_with_variables() {
    let engine = DecisionEngine::new(ProjectConfig::from_json(DATAFILE).unwrap());
    let user = engine.create_user_context("u-1", attributes(&[("platform", "mobile")]));

    let decision = user.decide("smart_search", &[]);
    assert_eq!(decision.variation_key.as_deref(), Some("neural"));
    assert!(decision.enabled);
    assert_eq!(decision.source, DecisionSource::Experiment);
    assert_eq!(decision.variables["depth"], serde_json::json!(5));
    assert_eq!(decision.variables["label"], serde_json::json!("Search"));
}

#[test]
fn test_rollout_targeting_and_catch_all() {
    let engine = DecisionEngine::new(ProjectConfig::from_json(DATAFILE).unwrap());

    let staff = engine.create_user_context("s-1", attributes(&[("email", "kim@vane.dev")]));
    let decision = staff.decide("smart_search", &[]);
    assert_eq!(decision.rule_key.as_deref(), Some("staff"));
    assert!(decision.enabled);

    let visitor = engine.create_user_context("v-1", attributes(&[("email", "kim@example.com")]));
    let decision = visitor.decide("smart_search", &[]);
    assert_eq!(decision.rule_key.as_deref(), Some("everyone_else"));
    assert!(!decision.enabled);
    assert_eq!(decision.variables["depth"], serde_json::json!(1));
}

#[test]
fn test_attribute_updates_change_decisions() {
    let engine = DecisionEngine::new(ProjectConfig::from_json(DATAFILE).unwrap());
    let user = engine.create_user_context("u-2", UserAttributes::new());
    assert_eq!(
        user.decide("smart_search", &[]).rule_key.as_deref(),
        Some("everyone_else")
    );

    user.set_attribute("platform", "mobile");
    assert_eq!(
        user.decide("smart_search", &[]).rule_key.as_deref(),
        Some("search_ranking")
    );
}

#[test]
fn test_forced_decision_then_removal() {
    let engine = DecisionEngine::new(ProjectConfig::from_json(DATAFILE).unwrap());
    let user = engine.create_user_context("u-3", attributes(&[("platform", "mobile")]));
    let context = DecisionContext::flag("smart_search");

    user.set_forced_decision(context.clone(), ForcedDecision::new("staff_on"));
    let decision = user.decide("smart_search", &[]);
    assert_eq!(decision.variation_key.as_deref(), Some("staff_on"));
    assert_eq!(decision.source, DecisionSource::Rollout);

    assert!(user.remove_forced_decision(&context));
    assert_eq!(
        user.decide("smart_search", &[]).variation_key.as_deref(),
        Some("neural")
    );
}

#[test]
fn test_sticky_store_round_trip() {
    let store = Arc::new(InMemoryStickyStore::new());
    let engine = DecisionEngine::builder()
        .config(ProjectConfig::from_json(DATAFILE).unwrap())
        .sticky_store(store.clone())
        .build();

    let user = engine.create_user_context("u-4", attributes(&[("platform", "mobile")]));
    user.decide("smart_search", &[]);

    let record = store.lookup("u-4").unwrap().unwrap();
    assert_eq!(record.variation_id("exp_search"), Some("v_neural"));

    // Rollout decisions are never stored.
    let visitor = engine.create_user_context("v-2", UserAttributes::new());
    visitor.decide("smart_search", &[]);
    assert!(store.lookup("v-2").unwrap().is_none());
}

#[test]
fn test_not_ready_until_config_arrives() {
    let engine = DecisionEngine::builder().build();
    let user = engine.create_user_context("u-5", UserAttributes::new());
    assert!(!user.decide("smart_search", &[]).enabled);

    engine.update_config(ProjectConfig::from_json(DATAFILE).unwrap());
    assert_eq!(
        user.decide("smart_search", &[]).rule_key.as_deref(),
        Some("everyone_else")
    );
}

#[test]
fn test_decide_all_with_reasons() {
    let engine = DecisionEngine::new(ProjectConfig::from_json(DATAFILE).unwrap());
    let user = engine.create_user_context("u-6", UserAttributes::new());

    let decisions = user.decide_all(&[DecideOption::IncludeReasons]);
    assert_eq!(decisions.len(), 1);
    assert!(
        decisions[0]
            .reasons
            .iter()
            .any(|reason| reason.contains("Everyone Else"))
    );
}

//! Integration tests for the mappable (explicit association) validator.

mod common;

use std::sync::Arc;

use common::{DisposalLog, LogBuffer, Recorder, Settable, Tracked};
use nebula_wiring::prelude::*;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rstest::rstest;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn constant(value: u32) -> DataProviderRef<u32> {
    Arc::new(move || value)
}

fn describe(tag: &'static str) -> RuleRef<u32, String> {
    Arc::new(move |v: &u32| format!("{tag}({v})"))
}

// ============================================================================
// FAN-OUT FOLLOWS THE MAPPINGS
// ============================================================================

#[test]
fn two_independent_chains() {
    let log = log();
    let (t1, t2) = (Arc::new(ManualTrigger::new()), Arc::new(ManualTrigger::new()));
    let (p1, p2) = (constant(1), constant(2));
    let (r1, r2) = (describe("r1"), describe("r2"));
    let validator: DefaultMappableValidator<u32, String> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(t1.clone()), Some(p1.clone()));
    validator.map_trigger_to_data_provider(Some(t2.clone()), Some(p2.clone()));
    validator.map_data_provider_to_rule(Some(p1), Some(r1.clone()));
    validator.map_data_provider_to_rule(Some(p2), Some(r2.clone()));
    validator.map_rule_to_result_handler(Some(r1), Some(common::tagged("h1", &log)));
    validator.map_rule_to_result_handler(Some(r2), Some(common::tagged("h2", &log)));

    t1.fire();
    assert_eq!(*log.lock(), vec!["h1:r1(1)"]);

    log.lock().clear();
    t2.fire();
    assert_eq!(*log.lock(), vec!["h2:r2(2)"]);
}

#[test]
fn nested_order_is_provider_then_rule_then_handler() {
    let log = log();
    let trigger = Arc::new(ManualTrigger::new());
    let (p1, p2) = (constant(1), constant(2));
    let (ra, rb) = (describe("a"), describe("b"));
    let validator: DefaultMappableValidator<u32, String> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(p1.clone()));
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(p2.clone()));
    validator.map_data_provider_to_rule(Some(p1), Some(ra.clone()));
    validator.map_data_provider_to_rule(Some(p2.clone()), Some(rb.clone()));
    validator.map_data_provider_to_rule(Some(p2), Some(ra.clone()));
    validator.map_rule_to_result_handler(Some(ra.clone()), Some(common::tagged("x", &log)));
    validator.map_rule_to_result_handler(Some(ra), Some(common::tagged("y", &log)));
    validator.map_rule_to_result_handler(Some(rb), Some(common::tagged("z", &log)));

    trigger.fire();

    assert_eq!(
        *log.lock(),
        vec!["x:a(1)", "y:a(1)", "z:b(2)", "x:a(2)", "y:a(2)"]
    );
}

#[test]
fn provider_mapped_twice_is_read_twice_with_one_listener() {
    let trigger = Arc::new(ManualTrigger::new());
    let provider = constant(3);
    let rule: RuleRef<u32, bool> = Arc::new(|v: &u32| *v == 3);
    let recorder = Recorder::<bool>::new();
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_data_provider_to_rule(Some(provider), Some(rule.clone()));
    validator.map_rule_to_result_handler(Some(rule), Some(recorder.clone()));

    assert_eq!(trigger.listener_count(), 1);
    assert_eq!(validator.listener_count(), 1);

    trigger.fire();
    assert_eq!(recorder.seen(), vec![true, true]);
}

#[test]
fn missing_rule_skips_only_that_provider() {
    let log = log();
    let trigger = Arc::new(ManualTrigger::new());
    let (bare, wired) = (constant(1), constant(2));
    let rule = describe("r");
    let validator: DefaultMappableValidator<u32, String> =
        MappableValidator::with_config(EngineConfig::default().with_unmatched(DiagnosticLevel::Off));

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(bare));
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(wired.clone()));
    validator.map_data_provider_to_rule(Some(wired), Some(rule.clone()));
    validator.map_rule_to_result_handler(Some(rule), Some(common::tagged("h", &log)));

    trigger.fire();

    assert_eq!(*log.lock(), vec!["h:r(2)"]);
}

#[test]
fn rule_without_handlers_skips_only_that_rule() {
    let log = log();
    let trigger = Arc::new(ManualTrigger::new());
    let provider = constant(4);
    let bare: RuleRef<u32, bool> = Arc::new(|v: &u32| *v > 10);
    let wired: RuleRef<u32, bool> = Arc::new(|v: &u32| *v % 2 == 0);
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(bare));
    validator.map_data_provider_to_rule(Some(provider), Some(wired.clone()));
    validator.map_rule_to_result_handler(Some(wired), Some(common::tagged("h", &log)));

    trigger.fire();

    assert_eq!(*log.lock(), vec!["h:true"]);
}

#[test]
fn result_without_handlers_skips_only_that_value() {
    let log = log();
    let trigger = Arc::new(ManualTrigger::new());
    let provider = constant(3);
    let is_odd: RuleRef<u32, bool> = Arc::new(|v: &u32| *v % 2 == 1);
    let is_even: RuleRef<u32, bool> = Arc::new(|v: &u32| *v % 2 == 0);
    let validator: ResultMappableValidator<u32, bool> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    // `false` comes first and has no handler
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(is_even));
    validator.map_data_provider_to_rule(Some(provider), Some(is_odd));
    validator.map_result_to_result_handler(Some(true), Some(common::tagged("h", &log)));

    trigger.fire();

    assert_eq!(*log.lock(), vec!["h:true"]);
}

#[test]
fn missing_handler_is_reported_once_per_branch() {
    let logs = LogBuffer::default();
    let log = log();

    logs.capture(|| {
        let trigger = Arc::new(ManualTrigger::new());
        let provider = constant(1);
        let bare = describe("bare");
        let wired = describe("wired");
        let validator: DefaultMappableValidator<u32, String> = MappableValidator::new();
        validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
        validator.map_data_provider_to_rule(Some(provider.clone()), Some(bare));
        validator.map_data_provider_to_rule(Some(provider), Some(wired.clone()));
        validator.map_rule_to_result_handler(Some(wired), Some(common::tagged("h", &log)));
        trigger.fire();
    });

    assert_eq!(*log.lock(), vec!["h:wired(1)"]);
    assert_eq!(logs.lines_at("WARN", "no matching result handler").len(), 1);
}

// ============================================================================
// ABSENT ARGUMENTS
// ============================================================================

#[test]
fn absent_trigger_unmaps_provider_everywhere() {
    common::init_tracing();
    let (t1, t2) = (Arc::new(ManualTrigger::new()), Arc::new(ManualTrigger::new()));
    let (p, q) = (constant(1), constant(2));
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(t1.clone()), Some(p.clone()));
    validator.map_trigger_to_data_provider(Some(t2.clone()), Some(p.clone()));
    validator.map_trigger_to_data_provider(Some(t2.clone()), Some(q.clone()));
    validator.map_trigger_to_data_provider(Some(t2.clone()), Some(p.clone()));

    validator.map_trigger_to_data_provider(None, Some(p));

    assert_eq!(t1.listener_count(), 0);
    assert_eq!(t2.listener_count(), 1);
    let remaining = validator.data_providers_for(&t2);
    assert_eq!(remaining.len(), 1);
    assert!(Arc::ptr_eq(&remaining[0], &q));
    assert!(validator.data_providers_for(&t1).is_empty());
}

#[test]
fn absent_provider_removes_trigger_and_listener() {
    let trigger = Arc::new(ManualTrigger::new());
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(constant(1)));
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(constant(2)));

    validator.map_trigger_to_data_provider(Some(trigger.clone()), None);

    assert_eq!(trigger.listener_count(), 0);
    assert!(validator.triggers().is_empty());
}

#[test]
fn absent_rule_wipes_every_rule_of_provider() {
    let provider = constant(1);
    let other = constant(2);
    let (r1, r2) = (describe("r1"), describe("r2"));
    let validator: DefaultMappableValidator<u32, String> = MappableValidator::new();
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(r1.clone()));
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(r2.clone()));
    validator.map_data_provider_to_rule(Some(other.clone()), Some(r1.clone()));

    // "map to nothing" is a bulk unmap
    validator.map_data_provider_to_rule(Some(provider.clone()), None);
    assert!(validator.rules_for(&provider).is_empty());
    assert_eq!(validator.rules_for(&other).len(), 1);

    validator.unmap_data_provider_from_rule(None, Some(r1));
    assert!(validator.rules_for(&other).is_empty());
}

#[test]
fn absent_handler_and_absent_rule_at_handler_layer() {
    let (r1, r2) = (describe("r1"), describe("r2"));
    let log = log();
    let shared = common::tagged::<String>("shared", &log);
    let validator: DefaultMappableValidator<u32, String> = MappableValidator::new();
    validator.map_rule_to_result_handler(Some(r1.clone()), Some(shared.clone()));
    validator.map_rule_to_result_handler(Some(r2.clone()), Some(shared.clone()));
    validator.map_rule_to_result_handler(Some(r2.clone()), Some(common::tagged("own", &log)));

    validator.map_rule_to_result_handler(None, Some(shared));
    assert!(validator.result_handlers_for(&r1).is_empty());
    assert_eq!(validator.result_handlers_for(&r2).len(), 1);

    validator.unmap_rule_from_result_handler(Some(r2.clone()), None);
    assert!(validator.result_handlers_for(&r2).is_empty());
}

#[test]
fn both_absent_changes_nothing() {
    let trigger = Arc::new(ManualTrigger::new());
    let provider = constant(1);
    let rule = describe("r");
    let validator: DefaultMappableValidator<u32, String> = MappableValidator::new();
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(rule.clone()));
    validator.map_rule_to_result_handler(Some(rule.clone()), Some(common::tagged("h", &log())));

    validator.map_trigger_to_data_provider(None, None);
    validator.unmap_trigger_from_data_provider(None, None);
    validator.map_data_provider_to_rule(None, None);
    validator.unmap_data_provider_from_rule(None, None);
    validator.map_rule_to_result_handler(None, None);
    validator.unmap_rule_from_result_handler(None, None);

    assert_eq!(validator.data_providers_for(&trigger).len(), 1);
    assert_eq!(validator.rules_for(&provider).len(), 1);
    assert_eq!(validator.result_handlers_for(&rule).len(), 1);
    assert_eq!(trigger.listener_count(), 1);
}

#[rstest]
#[case::warn(DiagnosticLevel::Warn, 6)]
#[case::off(DiagnosticLevel::Off, 0)]
fn both_absent_is_reported_at_configured_level(
    #[case] level: DiagnosticLevel,
    #[case] expected: usize,
) {
    let logs = LogBuffer::default();

    logs.capture(|| {
        let validator: DefaultMappableValidator<u32, bool> =
            MappableValidator::with_config(EngineConfig::default().with_unmatched(level));
        validator.map_trigger_to_data_provider(None, None);
        validator.unmap_trigger_from_data_provider(None, None);
        validator.map_data_provider_to_rule(None, None);
        validator.unmap_data_provider_from_rule(None, None);
        validator.map_rule_to_result_handler(None, None);
        validator.unmap_rule_from_result_handler(None, None);
    });

    let warnings = logs.lines_at("WARN", "both sides of the association are None");
    assert_eq!(warnings.len(), expected);
    if expected > 0 {
        assert!(warnings[0].contains("map_trigger_to_data_provider"));
        assert!(warnings[5].contains("unmap_rule_from_result_handler"));
    }
}

#[test]
fn unmap_removes_a_single_occurrence() {
    let trigger = Arc::new(ManualTrigger::new());
    let provider = constant(5);
    let rule: RuleRef<u32, bool> = Arc::new(|v: &u32| *v == 5);
    let recorder = Recorder::<bool>::new();
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(rule.clone()));
    validator.map_data_provider_to_rule(Some(provider.clone()), Some(rule.clone()));
    validator.map_rule_to_result_handler(Some(rule.clone()), Some(recorder.clone()));

    validator.unmap_data_provider_from_rule(Some(provider.clone()), Some(rule.clone()));
    trigger.fire();
    assert_eq!(recorder.seen(), vec![true]);

    validator.unmap_trigger_from_data_provider(Some(trigger.clone()), Some(provider));
    assert_eq!(trigger.listener_count(), 0);
    trigger.fire();
    assert_eq!(recorder.seen(), vec![true]);
}

// ============================================================================
// RESULT-KEYED HANDLERS
// ============================================================================

#[test]
fn handlers_keyed_by_result_value() {
    let trigger = Arc::new(ManualTrigger::new());
    let input = Settable::new(String::from("42"));
    let provider: DataProviderRef<String> = input.clone();
    let rule: RuleRef<String, bool> = Arc::new(|s: &String| s.parse::<i64>().is_ok());
    let (valid, invalid) = (Recorder::<bool>::new(), Recorder::<bool>::new());
    let validator: ResultMappableValidator<String, bool> = MappableValidator::new();

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_data_provider_to_rule(Some(provider), Some(rule));
    validator.map_result_to_result_handler(Some(true), Some(valid.clone()));
    validator.map_result_to_result_handler(Some(false), Some(invalid.clone()));

    trigger.fire();
    input.set(String::from("abc"));
    trigger.fire();

    assert_eq!(valid.seen(), vec![true]);
    assert_eq!(invalid.seen(), vec![false]);
    assert_eq!(validator.result_handlers_for(&true).len(), 1);

    validator.unmap_result_from_result_handler(Some(false), None);
    assert!(validator.result_handlers_for(&false).is_empty());
}

// ============================================================================
// DISPOSAL
// ============================================================================

fn tracked_chain(
    log: &DisposalLog,
) -> (Arc<Tracked>, Arc<Tracked>, Arc<Tracked>, Arc<Tracked>) {
    (
        Tracked::new("trigger", log),
        Tracked::new("provider", log),
        Tracked::new("rule", log),
        Tracked::new("handler", log),
    )
}

#[rstest]
#[case::cascade(
    DisposalPolicy::Cascade,
    vec!["trigger", "provider", "provider", "rule", "rule", "handler"]
)]
#[case::at_most_once(
    DisposalPolicy::AtMostOnce,
    vec!["trigger", "provider", "rule", "handler"]
)]
fn dispose_walks_layers_in_order(#[case] policy: DisposalPolicy, #[case] expected: Vec<&'static str>) {
    let log = DisposalLog::default();
    let (trigger, provider, rule, handler) = tracked_chain(&log);
    let provider_ref: DataProviderRef<u32> = provider.clone();
    let rule_ref: RuleRef<u32, bool> = rule.clone();
    let handler_ref: ResultHandlerRef<bool> = handler.clone();
    let validator: DefaultMappableValidator<u32, bool> =
        MappableValidator::with_config(EngineConfig::default().with_disposal(policy));

    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider_ref.clone()));
    validator.map_data_provider_to_rule(Some(provider_ref), Some(rule_ref.clone()));
    validator.map_rule_to_result_handler(Some(rule_ref), Some(handler_ref));
    assert_eq!(trigger.listener_count(), 1);

    validator.dispose();

    assert_eq!(log.entries(), expected);
    assert_eq!(trigger.listener_count(), 0);
    assert!(validator.triggers().is_empty());
    assert!(validator.rules_for(&provider).is_empty());
    assert!(validator.result_handlers_for(&rule).is_empty());
}

#[test]
fn disposed_validator_ignores_triggers_and_disposes_once() {
    let trigger = Arc::new(ManualTrigger::new());
    let provider = constant(1);
    let rule: RuleRef<u32, bool> = Arc::new(|_: &u32| true);
    let recorder = Recorder::<bool>::new();
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider.clone()));
    validator.map_data_provider_to_rule(Some(provider), Some(rule.clone()));
    validator.map_rule_to_result_handler(Some(rule), Some(recorder.clone()));

    validator.dispose();
    trigger.fire();
    validator.dispose();

    assert!(recorder.seen().is_empty());
    assert_eq!(validator.listener_count(), 0);
}

#[test]
fn dropping_detaches_without_disposing() {
    let log = DisposalLog::default();
    let (trigger, provider, _, _) = tracked_chain(&log);
    let validator: DefaultMappableValidator<u32, bool> = MappableValidator::new();
    validator.map_trigger_to_data_provider(Some(trigger.clone()), Some(provider));

    drop(validator);

    assert_eq!(trigger.listener_count(), 0);
    assert!(log.entries().is_empty());
}

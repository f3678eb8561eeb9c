//! Property-based tests for change-gated memoization.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use stencil_render::{
    AttributeBag, Change, ComponentDefinition, ComponentInstance, Memoized, Memoizer, RenderResult,
    TemplateDefinition, TemplaterId,
};

fn counting_template(mask: Change, calls: Arc<AtomicUsize>) -> TemplateDefinition {
    TemplateDefinition::new(mask, move |_, _, _, reason| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok(RenderResult::from(json!(format!("{}:{}", n, reason.bits()))))
    })
}

fn instance() -> ComponentInstance {
    let definition = ComponentDefinition::builder().tag_name("x-memo").build();
    ComponentInstance::new(&definition, "x-memo", AttributeBag::new(), None, "en")
}

fn text(result: &Memoized<RenderResult>) -> Option<String> {
    result.value.as_ref().map(|v| v.to_text().unwrap().text)
}

fn change() -> impl Strategy<Value = Change> {
    (0u8..16).prop_map(Change::from_bits_truncate)
}

proptest! {
    /// A request recomputes exactly when nothing is cached yet, or when the
    /// mask is not NEVER and intersects the reason.
    #[test]
    fn recompute_follows_mask_and_reason(
        mask in change(),
        reasons in prop::collection::vec(change(), 1..12),
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let template = counting_template(mask, calls.clone());
        let component = instance();
        let templater = TemplaterId::next();
        let mut memo = Memoizer::new();

        let mut expected_calls = 0;
        let mut last = None;
        for (i, reason) in reasons.iter().enumerate() {
            let result = memo.render(&template, *reason, &component, templater).unwrap();
            let expected = i == 0 || (!mask.is_never() && reason.intersects(mask));
            prop_assert_eq!(result.changed, expected);
            if expected {
                expected_calls += 1;
            } else {
                prop_assert_eq!(text(&result), last.clone());
            }
            last = text(&result);
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
        prop_assert_eq!(memo.len(), 1);
    }

    /// Templaters never share cache entries.
    #[test]
    fn templaters_are_isolated(count in 1usize..6) {
        let calls = Arc::new(AtomicUsize::new(0));
        let template = counting_template(Change::NEVER, calls.clone());
        let component = instance();
        let mut memo = Memoizer::new();

        let templaters: Vec<_> = (0..count).map(|_| TemplaterId::next()).collect();
        for templater in &templaters {
            prop_assert!(memo.render(&template, Change::FORCE, &component, *templater).unwrap().changed);
        }
        for templater in &templaters {
            prop_assert!(!memo.render(&template, Change::FORCE, &component, *templater).unwrap().changed);
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), count);

        prop_assert_eq!(memo.release_templater(templaters[0]), 1);
        prop_assert_eq!(memo.len(), count - 1);
    }
}

#[test]
fn test_gated_reuse_scenario() {
    let calls = Arc::new(AtomicUsize::new(0));
    let template = counting_template(Change::PROP, calls.clone());
    let component = instance();
    let templater = TemplaterId::next();
    let mut memo = Memoizer::new();

    let first = memo.render(&template, Change::PROP, &component, templater).unwrap();
    let second = memo.render(&template, Change::THEME, &component, templater).unwrap();
    let third = memo.render(&template, Change::PROP, &component, templater).unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert!(third.changed);
    assert_eq!(text(&second), text(&first));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_never_ignores_force() {
    let calls = Arc::new(AtomicUsize::new(0));
    let template = counting_template(Change::NEVER, calls.clone());
    let component = instance();
    let templater = TemplaterId::next();
    let mut memo = Memoizer::new();

    for _ in 0..3 {
        memo.render(&template, Change::FORCE, &component, templater).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_force_mask_recomputes_on_intersecting_reason() {
    let calls = Arc::new(AtomicUsize::new(0));
    let template = counting_template(Change::FORCE, calls.clone());
    let component = instance();
    let templater = TemplaterId::next();
    let mut memo = Memoizer::new();

    memo.render(&template, Change::PROP, &component, templater).unwrap();
    let second = memo.render(&template, Change::PROP, &component, templater).unwrap();
    assert!(second.changed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

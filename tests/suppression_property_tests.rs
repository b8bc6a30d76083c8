//! Property-based tests for suppression matching and fingerprints.

use proptest::prelude::*;
use std::path::PathBuf;

use warden::config::SuppressionRule;
use warden::pipeline::suppression::SuppressionEngine;
use warden::types::{finding_fingerprint, Finding, Severity};
use warden::utils::glob::key_match;

fn segment() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

proptest! {
    /// `frame:*:*` always matches any key with that frame id
    #[test]
    fn frame_wildcard_matches_own_frame(frame in segment(), rule in segment(), target in segment()) {
        let key = format!("{}:{}:{}", frame, rule, target);
        let pattern = format!("{}:*:*", frame);
        prop_assert!(key_match(&pattern, &key));
    }

    /// a rule for a different frame never matches
    #[test]
    fn other_frame_never_matches(frame in segment(), rule in segment(), target in segment()) {
        let key = format!("{}:{}:{}", frame, rule, target);
        let other = format!("zz_{}", frame);
        let pattern = format!("{}:*:*", other);
        prop_assert!(!key_match(&pattern, &key));
    }

    /// the exact key always matches itself
    #[test]
    fn exact_key_matches_itself(frame in segment(), rule in segment(), target in segment()) {
        let key = format!("{}:{}:{}", frame, rule, target);
        prop_assert!(key_match(&key, &key));
    }

    /// adding a suppression rule never increases survivors; removing one
    /// never decreases them
    #[test]
    fn suppression_is_monotone(
        frames in proptest::collection::vec(segment(), 1..8),
        extra_pattern in segment(),
    ) {
        let findings: Vec<Finding> = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                Finding::new(frame, Severity::Medium, "issue")
                    .with_rule("r")
                    .with_location(PathBuf::from(format!("f{}.py", i)), 1)
            })
            .collect();

        let base_rules = vec![SuppressionRule {
            rule: format!("{}:*:*", frames[0]),
            files: vec![],
            reason: None,
        }];
        let mut extended_rules = base_rules.clone();
        extended_rules.push(SuppressionRule {
            rule: format!("{}:*:*", extra_pattern),
            files: vec![],
            reason: None,
        });

        let (kept_base, suppressed_base) =
            SuppressionEngine::new(&base_rules).apply(findings.clone());
        let (kept_ext, suppressed_ext) =
            SuppressionEngine::new(&extended_rules).apply(findings.clone());

        prop_assert!(kept_ext.len() <= kept_base.len());
        prop_assert!(suppressed_ext >= suppressed_base);
        prop_assert_eq!(kept_base.len() + suppressed_base, findings.len());
    }

    /// moving a file changes the fingerprint; the message and rule staying
    /// fixed is not enough to keep identity
    #[test]
    fn fingerprint_changes_with_path(
        frame in segment(),
        rule in segment(),
        path_a in "[a-z]{1,10}\\.py",
        path_b in "[a-z]{1,10}\\.rs",
        line in 1u32..10_000,
    ) {
        let a = finding_fingerprint(&frame, Some(&rule), Some(&path_a), Some(line), "msg");
        let b = finding_fingerprint(&frame, Some(&rule), Some(&path_b), Some(line), "msg");
        prop_assert_ne!(a, b);
    }

    /// fingerprints are stable across repeated computation
    #[test]
    fn fingerprint_is_deterministic(
        frame in segment(),
        message in ".{0,80}",
        line in proptest::option::of(1u32..10_000),
    ) {
        let a = finding_fingerprint(&frame, None, None, line, &message);
        let b = finding_fingerprint(&frame, None, None, line, &message);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn glossary_examples_hold() {
    assert!(key_match("spec:*:*", "spec:missing_operation:createUser"));
    assert!(key_match(
        "spec:missing_operation:*",
        "spec:missing_operation:createUser"
    ));
    assert!(!key_match("other:*:*", "spec:missing_operation:createUser"));
}

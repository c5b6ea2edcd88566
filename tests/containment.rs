// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Property-based containment tests using the `proptest` crate.
//!
//! Whatever text reaches an engine, the outcome is always a result
//! envelope: no panic, no partial geometry on failure, and identical
//! output for identical input.

use proptest::prelude::*;

use cadscript::{EngineManager, LanguageEngine, NativeEngine, OpenscadEngine};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary text, biased toward characters that appear in scripts so
/// near-miss sources are common.
fn arb_source() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z0-9\\(\\)\\[\\]\\{\\};,=+\\-*/\" \\n]{0,120}").unwrap()
}

/// A well-formed primitive call with arbitrary literal arguments.
fn arb_primitive() -> impl Strategy<Value = String> {
    prop_oneof![
        (0.1f64..100.0).prop_map(|r| format!("sphere({r});")),
        (0.1f64..100.0, 0.1f64..100.0, 0.1f64..100.0)
            .prop_map(|(x, y, z)| format!("cube([{x}, {y}, {z}]);")),
        (0.1f64..100.0, 0.1f64..100.0).prop_map(|(r, h)| format!("cylinder({r}, {h});")),
        (0.1f64..50.0, 0.1f64..50.0).prop_map(|(w, h)| format!("rectangle({w}, {h});")),
    ]
}

fn arb_offset() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
}

const TOL: f64 = 1e-9;

// ---------------------------------------------------------------------------
// 1. Containment: arbitrary text never panics and never half-succeeds
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn native_engine_contains_arbitrary_text(source in arb_source()) {
        let mut engine = NativeEngine::default();
        let result = engine.execute(&source);
        if result.success {
            prop_assert!(result.error.is_none());
        } else {
            prop_assert!(result.error.is_some());
            prop_assert!(result.objects.is_empty());
            prop_assert!(result.exports.is_empty());
        }
    }

    #[test]
    fn openscad_engine_contains_arbitrary_text(source in arb_source()) {
        let mut engine = OpenscadEngine::default();
        let result = engine.execute(&source);
        prop_assert_eq!(result.success, result.error.is_none());
        if !result.success {
            prop_assert!(result.objects.is_empty());
        }
    }

    #[test]
    fn validate_never_panics(source in arb_source()) {
        let engine = NativeEngine::default();
        let report = engine.validate(&source);
        prop_assert_eq!(report.valid, report.errors.is_empty());
    }
}

// ---------------------------------------------------------------------------
// 2. Determinism: the same source always yields the same envelope
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn execution_is_deterministic(statements in proptest::collection::vec(arb_primitive(), 1..6)) {
        let source = statements.join("\n");
        let mut engine = NativeEngine::default();
        let first = engine.execute(&source);
        let second = engine.execute(&source);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn runs_do_not_leak_objects(statements in proptest::collection::vec(arb_primitive(), 1..6)) {
        let source = statements.join("\n");
        let mut engine = NativeEngine::default();
        engine.execute(&source);
        let after = engine.execute("cube();");
        prop_assert!(after.success);
        prop_assert_eq!(after.objects.len(), 1);
    }
}

// ---------------------------------------------------------------------------
// 3. Transform accumulation: two translations equal their sum
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn translations_accumulate((ax, ay, az) in arb_offset(), (bx, by, bz) in arb_offset()) {
        let mut engine = NativeEngine::default();
        let split = engine.execute(&format!(
            "let b = cube(); translate(b, [{ax}, {ay}, {az}]); translate(b, [{bx}, {by}, {bz}]);"
        ));
        let joined = engine.execute(&format!(
            "translate(cube(), [{}, {}, {}]);",
            ax + bx,
            ay + by,
            az + bz
        ));
        prop_assert!(split.success && joined.success);

        let p = split.objects[0].transform.position3().unwrap();
        let q = joined.objects[0].transform.position3().unwrap();
        prop_assert!((p - q).norm() < TOL, "split={p:?} joined={q:?}");
    }
}

// ---------------------------------------------------------------------------
// 4. Manager: an unknown language id never disturbs the active engine
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn unknown_language_ids_are_harmless(id in "[a-z]{1,12}") {
        let mut manager = EngineManager::new();
        let before = manager.current_language().to_string();
        let switched = manager.set_language(&id);
        if switched {
            prop_assert_eq!(&id, manager.current_language());
        } else {
            prop_assert_eq!(&before, manager.current_language());
        }
        // Both stock dialects accept a bare cube call.
        prop_assert!(manager.execute("cube();").success);
    }
}

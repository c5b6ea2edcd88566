// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! End-to-end tests for the native-expression engine

use approx::assert_relative_eq;
use cadscript::object::Transform;
use cadscript::{EngineConfig, LanguageEngine, NativeEngine, ObjectKind, ScriptError};

fn engine() -> NativeEngine {
    NativeEngine::default()
}

#[test]
fn test_execute_is_deterministic() {
    let mut engine = engine();
    let source = "for (let i = 0; i < 3; i += 1) { translate(sphere(i + 1), [i * 2, 0, 0]); }";
    let first = engine.execute(source);
    let second = engine.execute(source);
    assert!(first.success);
    assert_eq!(first.objects, second.objects);
}

#[test]
fn test_containment_over_malformed_sources() {
    let mut engine = engine();
    for source in [
        "",
        "cube(",
        "let = 5;",
        "undefined_name;",
        "frobnicate(1);",
        "translate(cube(), \"not a vector\");",
        "let a = [1]; log(a[99]);",
        "break;",
    ] {
        let result = engine.execute(source);
        assert!(!result.success, "expected failure for {source:?}");
        assert!(result.objects.is_empty());
        let message = result.error_message().expect("error present");
        assert!(!message.is_empty());
    }
}

#[test]
fn test_failed_run_surfaces_no_partial_geometry() {
    let mut engine = engine();
    let result = engine.execute("cube(); cube(); explode();");
    assert!(!result.success);
    assert!(result.objects.is_empty());

    // The engine still works afterwards and starts from a clean slate.
    let next = engine.execute("sphere();");
    assert!(next.success);
    assert_eq!(next.objects.len(), 1);
}

#[test]
fn test_flatten_expands_boolean_trees_depth_first() {
    let mut engine = engine();
    let source = "let a = cube(1);\n\
                  let b = cube(2);\n\
                  let c = cube(3);\n\
                  let d = cube(4);\n\
                  union(a, difference(b, c), d);";
    let result = engine.execute(source);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.objects.len(), 4);

    let sizes: Vec<f64> = result
        .objects
        .iter()
        .map(|object| match &object.kind {
            ObjectKind::Cube { size } => size.x,
            other => panic!("expected cube, got {}", other.kind_name()),
        })
        .collect();
    assert_eq!(sizes, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_transform_composition_mutates_one_object() {
    let mut engine = engine();
    let source = "let a = scale(cube([1, 1, 1]), [2, 2, 2]);\n\
                  let b = rotate(a, [0, 0, Math.PI / 2]);\n\
                  let c = translate(b, [1, 0, 0]);\n\
                  log(a == b && b == c);";
    let result = engine.execute(source);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.logs, vec!["true".to_string()]);
    assert_eq!(result.objects.len(), 1);

    match result.objects[0].transform {
        Transform::Spatial {
            position,
            rotation,
            scale,
        } => {
            assert_relative_eq!(position.x, 1.0);
            assert_relative_eq!(position.y, 0.0);
            assert_relative_eq!(rotation.z, std::f64::consts::FRAC_PI_2);
            assert_relative_eq!(scale.x, 2.0);
            assert_relative_eq!(scale.z, 2.0);
        }
        Transform::Planar { .. } => panic!("expected spatial transform"),
    }
}

#[test]
fn test_clone_breaks_shared_identity() {
    let mut engine = engine();
    let source = "let a = cube();\n\
                  let b = clone(a);\n\
                  translate(a, [5, 0, 0]);";
    let result = engine.execute(source);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.objects.len(), 2);

    let xs: Vec<f64> = result
        .objects
        .iter()
        .map(|object| object.transform.position3().unwrap().x)
        .collect();
    assert_eq!(xs, vec![5.0, 0.0]);
}

#[test]
fn test_alias_equivalence() {
    let mut engine = engine();
    let aliased = engine.execute("color(move(box([2, 2, 2]), [1, 1, 0]), \"#123456\");");
    let canonical =
        engine.execute("set_color(translate(cube([2, 2, 2]), [1, 1, 0]), \"#123456\");");
    assert!(aliased.success);
    assert_eq!(aliased.objects, canonical.objects);
}

#[test]
fn test_default_parameters() {
    let mut engine = engine();
    let result = engine.execute("sphere();");
    assert!(result.success);
    match result.objects[0].kind {
        ObjectKind::Sphere { radius, segments } => {
            assert_relative_eq!(radius, 1.0);
            assert_eq!(segments, 32);
        }
        _ => panic!("expected sphere"),
    }
    let position = result.objects[0].transform.position3().unwrap();
    assert_relative_eq!(position.norm(), 0.0);
}

#[test]
fn test_planar_pipeline_with_extrusion() {
    let mut engine = engine();
    let source = "let profile = polygon([[0, 0], [4, 0], [2, 3]]);\n\
                  linear_extrude(profile, 10, 0, 1, false);";
    let result = engine.execute(source);
    assert!(result.success, "{:?}", result.error);
    // The profile stays a top-level object next to the extrusion.
    assert_eq!(result.objects.len(), 2);

    let extruded = result
        .objects
        .iter()
        .find(|object| object.kind_name() == "extruded")
        .expect("extrusion present");
    match &extruded.kind {
        ObjectKind::Extruded { shape, height, .. } => {
            assert_relative_eq!(*height, 10.0);
            assert_eq!(shape.kind_name(), "polygon2d");
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_logs_and_exports_travel_in_the_envelope() {
    let mut engine = engine();
    let source = "let r = 3;\n\
                  log(\"radius\", r);\n\
                  sphere(r);\n\
                  export(\"part.stl\");";
    let result = engine.execute(source);
    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.logs, vec!["radius 3".to_string()]);
    assert_eq!(result.exports.len(), 1);
    assert_eq!(result.exports[0].filename, "part.stl");
}

#[test]
fn test_step_budget_contains_infinite_loops() {
    let config = EngineConfig {
        max_steps: 1_000,
        ..EngineConfig::default()
    };
    let mut engine = NativeEngine::new(config);
    let result = engine.execute("while (true) { }");
    assert!(!result.success);
    assert!(matches!(
        result.error,
        Some(ScriptError::StepBudget { limit: 1_000 })
    ));
}

#[test]
fn test_object_budget_contains_allocation_storms() {
    let config = EngineConfig {
        max_objects: 10,
        ..EngineConfig::default()
    };
    let mut engine = NativeEngine::new(config);
    let result = engine.execute("for (let i = 0; i < 1000; i += 1) { cube(); }");
    assert!(!result.success);
    assert!(matches!(
        result.error,
        Some(ScriptError::ObjectBudget { limit: 10 })
    ));
}

#[test]
fn test_nesting_budget_contains_deep_boolean_chains() {
    // A union chain grows one level per iteration while staying well
    // inside the step and object budgets, so the depth budget is what
    // has to stop it before recursive walks exhaust the stack.
    let mut engine = engine();
    let source = "let u = cube();\n\
                  for (let i = 0; i < 40000; i += 1) { u = union(u, cube()); }";
    let result = engine.execute(source);
    assert!(!result.success);
    assert!(matches!(
        result.error,
        Some(ScriptError::DepthBudget { limit: 256 })
    ));
    assert!(result.objects.is_empty());
}

#[test]
fn test_nesting_budget_allows_reasonable_depth() {
    let mut engine = engine();
    let source = "let u = cube();\n\
                  for (let i = 0; i < 100; i += 1) { u = union(u, cube()); }";
    let result = engine.execute(source);
    assert!(result.success, "{:?}", result.error);
    assert!(!result.objects.is_empty());
}

#[test]
fn test_scene_serializes_with_kind_tags() {
    let mut engine = engine();
    let result = engine.execute("set_color(cube([1, 2, 3]), \"#ff8800\", 0.5);");
    assert!(result.success);

    let json = serde_json::to_value(&result.objects).unwrap();
    assert_eq!(json[0]["kind"], "cube");
    assert_eq!(json[0]["color"], "#ff8800");
    assert_eq!(json[0]["transparent"], true);
}

#[test]
fn test_available_commands_cover_catalog_and_aliases() {
    let engine = engine();
    let commands = engine.available_commands();
    for name in ["cube", "union", "translate", "move", "box", "echo"] {
        assert!(
            commands.contains(&name.to_string()),
            "missing command {name}"
        );
    }
    let help = engine.command_help("move").expect("alias resolves");
    assert!(help.syntax.contains("translate"));
}

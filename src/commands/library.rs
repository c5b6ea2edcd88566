// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Typed object builders and mutators
//!
//! The only way objects enter or change in the graph. Command handlers
//! coerce script values and delegate here; hosts embedding the crate can
//! call these directly with native types.

use crate::error::ScriptError;
use crate::object::{Appearance, CadNode, NodeKind, ObjectArena, ObjectId, Transform, Vec2, Vec3};

/// Default segment count for round shapes
pub const DEFAULT_SEGMENTS: u32 = 32;

fn solid(kind: NodeKind) -> CadNode {
    CadNode {
        kind,
        transform: Transform::spatial(),
        appearance: Appearance::solid(),
    }
}

fn planar(kind: NodeKind) -> CadNode {
    CadNode {
        kind,
        transform: Transform::planar(),
        appearance: Appearance::planar(),
    }
}

fn resolve(arena: &ObjectArena, id: ObjectId) -> Result<&CadNode, ScriptError> {
    arena
        .get(id)
        .ok_or_else(|| ScriptError::runtime(format!("{id} does not exist in this scene")))
}

// Source shapes for extrusions and planar modifiers: a planar leaf, a
// planar modifier, or a boolean grouping of them.
fn check_profile(arena: &ObjectArena, shape: ObjectId, command: &str) -> Result<(), ScriptError> {
    let node = resolve(arena, shape)?;
    if node.kind.is_planar() || node.kind.is_boolean() {
        Ok(())
    } else {
        Err(ScriptError::argument(
            command,
            format!("requires a planar shape, got {}", node.kind.kind_name()),
        ))
    }
}

pub fn cube(arena: &mut ObjectArena, size: Vec3) -> ObjectId {
    arena.alloc(solid(NodeKind::Cube { size }))
}

pub fn sphere(arena: &mut ObjectArena, radius: f64, segments: u32) -> ObjectId {
    arena.alloc(solid(NodeKind::Sphere { radius, segments }))
}

pub fn cylinder(arena: &mut ObjectArena, radius: f64, height: f64, segments: u32) -> ObjectId {
    arena.alloc(solid(NodeKind::Cylinder {
        radius,
        height,
        segments,
    }))
}

pub fn rectangle(arena: &mut ObjectArena, width: f64, height: f64) -> ObjectId {
    arena.alloc(planar(NodeKind::Rectangle2d { width, height }))
}

pub fn circle(arena: &mut ObjectArena, radius: f64, segments: u32) -> ObjectId {
    arena.alloc(planar(NodeKind::Circle2d { radius, segments }))
}

pub fn polygon(arena: &mut ObjectArena, points: Vec<Vec2>) -> Result<ObjectId, ScriptError> {
    if points.len() < 3 {
        return Err(ScriptError::argument(
            "polygon",
            format!("requires at least 3 points, got {}", points.len()),
        ));
    }
    Ok(arena.alloc(planar(NodeKind::Polygon2d { points })))
}

pub fn arc(
    arena: &mut ObjectArena,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    segments: u32,
) -> ObjectId {
    arena.alloc(planar(NodeKind::Arc2d {
        radius,
        start_angle,
        end_angle,
        segments,
    }))
}

pub fn line(arena: &mut ObjectArena, start: Vec2, end: Vec2) -> ObjectId {
    arena.alloc(planar(NodeKind::Line2d { start, end }))
}

pub fn linear_extrude(
    arena: &mut ObjectArena,
    shape: ObjectId,
    height: f64,
    twist: f64,
    slices: u32,
    center: bool,
) -> Result<ObjectId, ScriptError> {
    check_profile(arena, shape, "linear_extrude")?;
    Ok(arena.alloc(solid(NodeKind::Extruded {
        shape,
        height,
        twist,
        slices,
        center,
    })))
}

pub fn rotate_extrude(
    arena: &mut ObjectArena,
    shape: ObjectId,
    angle: f64,
    segments: u32,
) -> Result<ObjectId, ScriptError> {
    check_profile(arena, shape, "rotate_extrude")?;
    Ok(arena.alloc(solid(NodeKind::RotatedExtruded {
        shape,
        angle,
        segments,
    })))
}

pub fn offset(
    arena: &mut ObjectArena,
    shape: ObjectId,
    delta: f64,
) -> Result<ObjectId, ScriptError> {
    check_profile(arena, shape, "offset")?;
    Ok(arena.alloc(planar(NodeKind::Offset2d { shape, delta })))
}

pub fn fillet(
    arena: &mut ObjectArena,
    shape: ObjectId,
    radius: f64,
) -> Result<ObjectId, ScriptError> {
    check_profile(arena, shape, "fillet")?;
    Ok(arena.alloc(planar(NodeKind::Fillet2d { shape, radius })))
}

pub fn chamfer(
    arena: &mut ObjectArena,
    shape: ObjectId,
    distance: f64,
) -> Result<ObjectId, ScriptError> {
    check_profile(arena, shape, "chamfer")?;
    Ok(arena.alloc(planar(NodeKind::Chamfer2d { shape, distance })))
}

fn boolean(
    arena: &mut ObjectArena,
    command: &str,
    children: Vec<ObjectId>,
    build: fn(Vec<ObjectId>) -> NodeKind,
) -> Result<ObjectId, ScriptError> {
    if children.is_empty() {
        return Err(ScriptError::argument(
            command,
            "requires at least one object",
        ));
    }
    for child in &children {
        resolve(arena, *child)?;
    }
    Ok(arena.alloc(solid(build(children))))
}

pub fn union(arena: &mut ObjectArena, children: Vec<ObjectId>) -> Result<ObjectId, ScriptError> {
    boolean(arena, "union", children, |children| NodeKind::Union {
        children,
    })
}

pub fn difference(
    arena: &mut ObjectArena,
    children: Vec<ObjectId>,
) -> Result<ObjectId, ScriptError> {
    boolean(arena, "difference", children, |children| {
        NodeKind::Difference { children }
    })
}

pub fn intersection(
    arena: &mut ObjectArena,
    children: Vec<ObjectId>,
) -> Result<ObjectId, ScriptError> {
    boolean(arena, "intersection", children, |children| {
        NodeKind::Intersection { children }
    })
}

/// Shift an object in place. Returns the same handle it was given.
pub fn translate(
    arena: &mut ObjectArena,
    id: ObjectId,
    offset: &[f64],
) -> Result<ObjectId, ScriptError> {
    resolve(arena, id)?;
    if let Some(node) = arena.get_mut(id) {
        node.transform.translate(offset);
    }
    Ok(id)
}

/// Add to an object's rotation in place. Angles are radians.
pub fn rotate(
    arena: &mut ObjectArena,
    id: ObjectId,
    angles: &[f64],
) -> Result<ObjectId, ScriptError> {
    resolve(arena, id)?;
    if let Some(node) = arena.get_mut(id) {
        node.transform.rotate(angles);
    }
    Ok(id)
}

/// Multiply an object's scale in place.
pub fn scale(
    arena: &mut ObjectArena,
    id: ObjectId,
    factors: &[f64],
) -> Result<ObjectId, ScriptError> {
    resolve(arena, id)?;
    if let Some(node) = arena.get_mut(id) {
        node.transform.scale(factors);
    }
    Ok(id)
}

/// Recolor an object in place. An opacity below 1 marks it transparent.
pub fn set_color(
    arena: &mut ObjectArena,
    id: ObjectId,
    color: String,
    opacity: Option<f64>,
) -> Result<ObjectId, ScriptError> {
    resolve(arena, id)?;
    if let Some(node) = arena.get_mut(id) {
        node.appearance.color = color;
        if let Some(opacity) = opacity {
            let opacity = opacity.clamp(0.0, 1.0);
            node.appearance.opacity = opacity;
            node.appearance.transparent = opacity < 1.0;
        }
    }
    Ok(id)
}

/// Deep-copy an object, returning the handle of the independent copy.
pub fn clone_object(arena: &mut ObjectArena, id: ObjectId) -> Result<ObjectId, ScriptError> {
    resolve(arena, id)?;
    arena
        .clone_subtree(id)
        .ok_or_else(|| ScriptError::runtime(format!("{id} could not be copied")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_returns_the_same_handle() {
        let mut arena = ObjectArena::new();
        let id = cube(&mut arena, Vec3::repeat(1.0));
        let moved = translate(&mut arena, id, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(id, moved);
        let pos = arena.get(id).unwrap().transform.position3().unwrap();
        assert_relative_eq!(pos.y, 2.0);
    }

    #[test]
    fn test_polygon_requires_three_points() {
        let mut arena = ObjectArena::new();
        let two = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        assert!(polygon(&mut arena, two).is_err());
    }

    #[test]
    fn test_extrude_rejects_solid_profile() {
        let mut arena = ObjectArena::new();
        let solid = cube(&mut arena, Vec3::repeat(1.0));
        let err = linear_extrude(&mut arena, solid, 1.0, 0.0, 1, false).unwrap_err();
        assert!(err.to_string().contains("planar"));
    }

    #[test]
    fn test_extrude_accepts_boolean_profile() {
        let mut arena = ObjectArena::new();
        let a = circle(&mut arena, 1.0, 32);
        let b = circle(&mut arena, 2.0, 32);
        let profile = union(&mut arena, vec![a, b]).unwrap();
        assert!(linear_extrude(&mut arena, profile, 3.0, 0.0, 1, false).is_ok());
    }

    #[test]
    fn test_boolean_requires_children() {
        let mut arena = ObjectArena::new();
        assert!(union(&mut arena, vec![]).is_err());
    }

    #[test]
    fn test_set_color_marks_transparency() {
        let mut arena = ObjectArena::new();
        let id = sphere(&mut arena, 1.0, DEFAULT_SEGMENTS);
        set_color(&mut arena, id, "#ff0000".into(), Some(0.5)).unwrap();
        let appearance = &arena.get(id).unwrap().appearance;
        assert_eq!(appearance.color, "#ff0000");
        assert!(appearance.transparent);
        assert_relative_eq!(appearance.opacity, 0.5);

        set_color(&mut arena, id, "#00ff00".into(), Some(1.0)).unwrap();
        assert!(!arena.get(id).unwrap().appearance.transparent);
    }

    #[test]
    fn test_planar_rotation_is_scalar() {
        let mut arena = ObjectArena::new();
        let id = rectangle(&mut arena, 2.0, 1.0);
        rotate(&mut arena, id, &[std::f64::consts::FRAC_PI_2]).unwrap();
        match arena.get(id).unwrap().transform {
            Transform::Planar { rotation, .. } => {
                assert_relative_eq!(rotation, std::f64::consts::FRAC_PI_2)
            }
            _ => panic!("expected planar transform"),
        }
    }
}

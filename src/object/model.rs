// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Materialized scene object records
//!
//! A [`CadObject`] is the self-contained form handed to hosts: composite
//! kinds own deep copies of their children, so a record stays valid after
//! the graph it came from is dropped. The in-place mutable form lives in
//! the arena module.

use serde::{Deserialize, Serialize};

/// 2D vector type alias
pub type Vec2 = nalgebra::Vector2<f64>;
/// 3D vector type alias
pub type Vec3 = nalgebra::Vector3<f64>;

/// Default fill color for solid kinds
pub const DEFAULT_COLOR_3D: &str = "#6699cc";
/// Default fill color for planar kinds
pub const DEFAULT_COLOR_2D: &str = "#44aa88";

/// A fully materialized scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadObject {
    #[serde(flatten)]
    pub kind: ObjectKind,
    #[serde(flatten)]
    pub transform: Transform,
    #[serde(flatten)]
    pub appearance: Appearance,
}

impl CadObject {
    /// Shape name as it appears in serialized output and logs.
    pub fn kind_name(&self) -> &'static str {
        self.kind.kind_name()
    }
}

/// Shape payload of a scene object.
///
/// Exactly one kind per object; fields that make no sense for a kind do
/// not exist on it. Boolean and wrapper kinds carry owned child records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    // Solids
    Cube {
        size: Vec3,
    },
    Sphere {
        radius: f64,
        segments: u32,
    },
    Cylinder {
        radius: f64,
        height: f64,
        segments: u32,
    },

    // Planar shapes
    Rectangle2d {
        width: f64,
        height: f64,
    },
    Circle2d {
        radius: f64,
        segments: u32,
    },
    Polygon2d {
        points: Vec<Vec2>,
    },
    Arc2d {
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        segments: u32,
    },
    Line2d {
        start: Vec2,
        end: Vec2,
    },

    // Derived solids
    Extruded {
        shape: Box<CadObject>,
        height: f64,
        twist: f64,
        slices: u32,
        center: bool,
    },
    RotatedExtruded {
        shape: Box<CadObject>,
        angle: f64,
        segments: u32,
    },

    // Planar modifiers
    Offset2d {
        shape: Box<CadObject>,
        delta: f64,
    },
    Fillet2d {
        shape: Box<CadObject>,
        radius: f64,
    },
    Chamfer2d {
        shape: Box<CadObject>,
        distance: f64,
    },

    // Boolean groupings, kept symbolic for the viewer
    Union {
        children: Vec<CadObject>,
    },
    Difference {
        children: Vec<CadObject>,
    },
    Intersection {
        children: Vec<CadObject>,
    },
}

impl ObjectKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObjectKind::Cube { .. } => "cube",
            ObjectKind::Sphere { .. } => "sphere",
            ObjectKind::Cylinder { .. } => "cylinder",
            ObjectKind::Rectangle2d { .. } => "rectangle2d",
            ObjectKind::Circle2d { .. } => "circle2d",
            ObjectKind::Polygon2d { .. } => "polygon2d",
            ObjectKind::Arc2d { .. } => "arc2d",
            ObjectKind::Line2d { .. } => "line2d",
            ObjectKind::Extruded { .. } => "extruded",
            ObjectKind::RotatedExtruded { .. } => "rotated_extruded",
            ObjectKind::Offset2d { .. } => "offset2d",
            ObjectKind::Fillet2d { .. } => "fillet2d",
            ObjectKind::Chamfer2d { .. } => "chamfer2d",
            ObjectKind::Union { .. } => "union",
            ObjectKind::Difference { .. } => "difference",
            ObjectKind::Intersection { .. } => "intersection",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            ObjectKind::Union { .. } | ObjectKind::Difference { .. } | ObjectKind::Intersection { .. }
        )
    }

    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            ObjectKind::Rectangle2d { .. }
                | ObjectKind::Circle2d { .. }
                | ObjectKind::Polygon2d { .. }
                | ObjectKind::Arc2d { .. }
                | ObjectKind::Line2d { .. }
                | ObjectKind::Offset2d { .. }
                | ObjectKind::Fillet2d { .. }
                | ObjectKind::Chamfer2d { .. }
        )
    }
}

/// Placement of an object, dimension-matched to its kind.
///
/// Planar shapes live in the XY plane: 2D position and scale, a single
/// rotation angle. Solids carry full 3D vectors with Euler rotation.
/// Angles are radians throughout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "snake_case")]
pub enum Transform {
    Planar {
        position: Vec2,
        rotation: f64,
        scale: Vec2,
    },
    Spatial {
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
    },
}

impl Transform {
    /// Identity placement for a planar shape.
    pub fn planar() -> Self {
        Transform::Planar {
            position: Vec2::zeros(),
            rotation: 0.0,
            scale: Vec2::repeat(1.0),
        }
    }

    /// Identity placement for a solid.
    pub fn spatial() -> Self {
        Transform::Spatial {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::repeat(1.0),
        }
    }

    pub fn is_planar(&self) -> bool {
        matches!(self, Transform::Planar { .. })
    }

    /// Shift position by `offset`. Planar placements ignore a third
    /// component; spatial placements zero-fill missing ones.
    pub fn translate(&mut self, offset: &[f64]) {
        match self {
            Transform::Planar { position, .. } => {
                position.x += component(offset, 0, 0.0);
                position.y += component(offset, 1, 0.0);
            }
            Transform::Spatial { position, .. } => {
                position.x += component(offset, 0, 0.0);
                position.y += component(offset, 1, 0.0);
                position.z += component(offset, 2, 0.0);
            }
        }
    }

    /// Add to the rotation. Planar placements take the first component
    /// as the in-plane angle; spatial placements add per Euler axis.
    pub fn rotate(&mut self, angles: &[f64]) {
        match self {
            Transform::Planar { rotation, .. } => {
                *rotation += component(angles, 0, 0.0);
            }
            Transform::Spatial { rotation, .. } => {
                rotation.x += component(angles, 0, 0.0);
                rotation.y += component(angles, 1, 0.0);
                rotation.z += component(angles, 2, 0.0);
            }
        }
    }

    /// Multiply the scale componentwise, one-filling missing components.
    pub fn scale(&mut self, factors: &[f64]) {
        match self {
            Transform::Planar { scale, .. } => {
                scale.x *= component(factors, 0, 1.0);
                scale.y *= component(factors, 1, 1.0);
            }
            Transform::Spatial { scale, .. } => {
                scale.x *= component(factors, 0, 1.0);
                scale.y *= component(factors, 1, 1.0);
                scale.z *= component(factors, 2, 1.0);
            }
        }
    }

    /// Spatial position, if this is a spatial placement.
    pub fn position3(&self) -> Option<Vec3> {
        match self {
            Transform::Spatial { position, .. } => Some(*position),
            Transform::Planar { .. } => None,
        }
    }

    /// Planar position, if this is a planar placement.
    pub fn position2(&self) -> Option<Vec2> {
        match self {
            Transform::Planar { position, .. } => Some(*position),
            Transform::Spatial { .. } => None,
        }
    }
}

fn component(values: &[f64], idx: usize, default: f64) -> f64 {
    values.get(idx).copied().unwrap_or(default)
}

/// Presentation hints attached to every object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// Hex color string, e.g. `#6699cc`
    pub color: String,
    pub transparent: bool,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
}

impl Appearance {
    /// Defaults for solid kinds.
    pub fn solid() -> Self {
        Self {
            color: DEFAULT_COLOR_3D.to_string(),
            transparent: false,
            opacity: 1.0,
        }
    }

    /// Defaults for planar kinds.
    pub fn planar() -> Self {
        Self {
            color: DEFAULT_COLOR_2D.to_string(),
            transparent: false,
            opacity: 1.0,
        }
    }
}

/// Expand boolean groupings into a flat list of leaf records.
///
/// Depth-first, left-to-right, preserving encounter order. The boolean
/// node itself is discarded together with its own placement and
/// appearance. Non-boolean objects pass through untouched, including
/// extrusions whose nested shape may itself contain booleans.
pub fn flatten(objects: &[CadObject]) -> Vec<CadObject> {
    let mut out = Vec::new();
    for object in objects {
        flatten_into(object, &mut out);
    }
    out
}

fn flatten_into(object: &CadObject, out: &mut Vec<CadObject>) {
    match &object.kind {
        ObjectKind::Union { children }
        | ObjectKind::Difference { children }
        | ObjectKind::Intersection { children } => {
            for child in children {
                flatten_into(child, out);
            }
        }
        _ => out.push(object.clone()),
    }
}

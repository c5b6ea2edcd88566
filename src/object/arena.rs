// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Object graph arena
//!
//! Scripts address objects through [`ObjectId`] handles into a run-scoped
//! arena. Mutating commands edit nodes in place, so every handle bound to
//! an object observes the same edit. Composite nodes reference children
//! by id; [`ObjectArena::materialize`] deep-copies a node into the
//! self-contained [`CadObject`] form.

use super::model::{Appearance, CadObject, ObjectKind, Transform, Vec2, Vec3};
use std::fmt;

/// Opaque handle to a node in an [`ObjectArena`].
///
/// Only valid for the arena that issued it. Handles are never reused
/// within a run; the arena grows monotonically until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// One node of the object graph.
#[derive(Debug, Clone, PartialEq)]
pub struct CadNode {
    pub kind: NodeKind,
    pub transform: Transform,
    pub appearance: Appearance,
}

/// Shape payload of a graph node.
///
/// Mirrors [`ObjectKind`] with children held as arena ids instead of
/// owned records, which is what lets later commands mutate a child and
/// have every composite referencing it observe the change.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
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
    Extruded {
        shape: ObjectId,
        height: f64,
        twist: f64,
        slices: u32,
        center: bool,
    },
    RotatedExtruded {
        shape: ObjectId,
        angle: f64,
        segments: u32,
    },
    Offset2d {
        shape: ObjectId,
        delta: f64,
    },
    Fillet2d {
        shape: ObjectId,
        radius: f64,
    },
    Chamfer2d {
        shape: ObjectId,
        distance: f64,
    },
    Union {
        children: Vec<ObjectId>,
    },
    Difference {
        children: Vec<ObjectId>,
    },
    Intersection {
        children: Vec<ObjectId>,
    },
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Cube { .. } => "cube",
            NodeKind::Sphere { .. } => "sphere",
            NodeKind::Cylinder { .. } => "cylinder",
            NodeKind::Rectangle2d { .. } => "rectangle2d",
            NodeKind::Circle2d { .. } => "circle2d",
            NodeKind::Polygon2d { .. } => "polygon2d",
            NodeKind::Arc2d { .. } => "arc2d",
            NodeKind::Line2d { .. } => "line2d",
            NodeKind::Extruded { .. } => "extruded",
            NodeKind::RotatedExtruded { .. } => "rotated_extruded",
            NodeKind::Offset2d { .. } => "offset2d",
            NodeKind::Fillet2d { .. } => "fillet2d",
            NodeKind::Chamfer2d { .. } => "chamfer2d",
            NodeKind::Union { .. } => "union",
            NodeKind::Difference { .. } => "difference",
            NodeKind::Intersection { .. } => "intersection",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            NodeKind::Union { .. } | NodeKind::Difference { .. } | NodeKind::Intersection { .. }
        )
    }

    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            NodeKind::Rectangle2d { .. }
                | NodeKind::Circle2d { .. }
                | NodeKind::Polygon2d { .. }
                | NodeKind::Arc2d { .. }
                | NodeKind::Line2d { .. }
                | NodeKind::Offset2d { .. }
                | NodeKind::Fillet2d { .. }
                | NodeKind::Chamfer2d { .. }
        )
    }
}

/// Run-scoped store for the object graph.
///
/// Each node's nesting depth is recorded at allocation, so the budget
/// check that keeps recursive walks (materialize, clone, drop,
/// serialization) stack-safe is O(children) rather than a tree scan.
#[derive(Debug, Default)]
pub struct ObjectArena {
    nodes: Vec<CadNode>,
    depths: Vec<usize>,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            depths: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.depths.clear();
    }

    pub fn alloc(&mut self, node: CadNode) -> ObjectId {
        let id = ObjectId(self.nodes.len());
        self.depths.push(1 + self.max_child_depth(&node.kind));
        self.nodes.push(node);
        id
    }

    /// Nesting depth of a node: 1 for a leaf, 1 + the deepest child for
    /// composites. Unknown handles report 0.
    pub fn depth(&self, id: ObjectId) -> usize {
        self.depths.get(id.0).copied().unwrap_or(0)
    }

    fn max_child_depth(&self, kind: &NodeKind) -> usize {
        match kind {
            NodeKind::Extruded { shape, .. }
            | NodeKind::RotatedExtruded { shape, .. }
            | NodeKind::Offset2d { shape, .. }
            | NodeKind::Fillet2d { shape, .. }
            | NodeKind::Chamfer2d { shape, .. } => self.depth(*shape),
            NodeKind::Union { children }
            | NodeKind::Difference { children }
            | NodeKind::Intersection { children } => children
                .iter()
                .map(|child| self.depth(*child))
                .max()
                .unwrap_or(0),
            _ => 0,
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&CadNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut CadNode> {
        self.nodes.get_mut(id.0)
    }

    /// Deep-copy a node into its materialized form.
    ///
    /// Children that no longer resolve are logged and skipped rather than
    /// failing the whole copy; a missing root or missing wrapped shape
    /// yields `None`.
    pub fn materialize(&self, id: ObjectId) -> Option<CadObject> {
        let node = self.get(id)?;
        let kind = match &node.kind {
            NodeKind::Cube { size } => ObjectKind::Cube { size: *size },
            NodeKind::Sphere { radius, segments } => ObjectKind::Sphere {
                radius: *radius,
                segments: *segments,
            },
            NodeKind::Cylinder {
                radius,
                height,
                segments,
            } => ObjectKind::Cylinder {
                radius: *radius,
                height: *height,
                segments: *segments,
            },
            NodeKind::Rectangle2d { width, height } => ObjectKind::Rectangle2d {
                width: *width,
                height: *height,
            },
            NodeKind::Circle2d { radius, segments } => ObjectKind::Circle2d {
                radius: *radius,
                segments: *segments,
            },
            NodeKind::Polygon2d { points } => ObjectKind::Polygon2d {
                points: points.clone(),
            },
            NodeKind::Arc2d {
                radius,
                start_angle,
                end_angle,
                segments,
            } => ObjectKind::Arc2d {
                radius: *radius,
                start_angle: *start_angle,
                end_angle: *end_angle,
                segments: *segments,
            },
            NodeKind::Line2d { start, end } => ObjectKind::Line2d {
                start: *start,
                end: *end,
            },
            NodeKind::Extruded {
                shape,
                height,
                twist,
                slices,
                center,
            } => ObjectKind::Extruded {
                shape: Box::new(self.materialize_shape(*shape, id)?),
                height: *height,
                twist: *twist,
                slices: *slices,
                center: *center,
            },
            NodeKind::RotatedExtruded {
                shape,
                angle,
                segments,
            } => ObjectKind::RotatedExtruded {
                shape: Box::new(self.materialize_shape(*shape, id)?),
                angle: *angle,
                segments: *segments,
            },
            NodeKind::Offset2d { shape, delta } => ObjectKind::Offset2d {
                shape: Box::new(self.materialize_shape(*shape, id)?),
                delta: *delta,
            },
            NodeKind::Fillet2d { shape, radius } => ObjectKind::Fillet2d {
                shape: Box::new(self.materialize_shape(*shape, id)?),
                radius: *radius,
            },
            NodeKind::Chamfer2d { shape, distance } => ObjectKind::Chamfer2d {
                shape: Box::new(self.materialize_shape(*shape, id)?),
                distance: *distance,
            },
            NodeKind::Union { children } => ObjectKind::Union {
                children: self.materialize_children(children, id),
            },
            NodeKind::Difference { children } => ObjectKind::Difference {
                children: self.materialize_children(children, id),
            },
            NodeKind::Intersection { children } => ObjectKind::Intersection {
                children: self.materialize_children(children, id),
            },
        };
        Some(CadObject {
            kind,
            transform: node.transform,
            appearance: node.appearance.clone(),
        })
    }

    fn materialize_shape(&self, shape: ObjectId, parent: ObjectId) -> Option<CadObject> {
        let materialized = self.materialize(shape);
        if materialized.is_none() {
            tracing::warn!(%shape, %parent, "wrapped shape missing from graph, dropping parent");
        }
        materialized
    }

    fn materialize_children(&self, children: &[ObjectId], parent: ObjectId) -> Vec<CadObject> {
        children
            .iter()
            .filter_map(|child| {
                let materialized = self.materialize(*child);
                if materialized.is_none() {
                    tracing::warn!(%child, %parent, "child missing from graph, skipping");
                }
                materialized
            })
            .collect()
    }

    /// Recursively copy a subtree, returning the handle of the new root.
    ///
    /// The copy is fully independent: mutating the original afterwards
    /// leaves the copy untouched and vice versa.
    pub fn clone_subtree(&mut self, id: ObjectId) -> Option<ObjectId> {
        let node = self.get(id)?.clone();
        let kind = match node.kind {
            NodeKind::Extruded {
                shape,
                height,
                twist,
                slices,
                center,
            } => NodeKind::Extruded {
                shape: self.clone_subtree(shape)?,
                height,
                twist,
                slices,
                center,
            },
            NodeKind::RotatedExtruded {
                shape,
                angle,
                segments,
            } => NodeKind::RotatedExtruded {
                shape: self.clone_subtree(shape)?,
                angle,
                segments,
            },
            NodeKind::Offset2d { shape, delta } => NodeKind::Offset2d {
                shape: self.clone_subtree(shape)?,
                delta,
            },
            NodeKind::Fillet2d { shape, radius } => NodeKind::Fillet2d {
                shape: self.clone_subtree(shape)?,
                radius,
            },
            NodeKind::Chamfer2d { shape, distance } => NodeKind::Chamfer2d {
                shape: self.clone_subtree(shape)?,
                distance,
            },
            NodeKind::Union { children } => NodeKind::Union {
                children: self.clone_children(&children),
            },
            NodeKind::Difference { children } => NodeKind::Difference {
                children: self.clone_children(&children),
            },
            NodeKind::Intersection { children } => NodeKind::Intersection {
                children: self.clone_children(&children),
            },
            leaf => leaf,
        };
        Some(self.alloc(CadNode {
            kind,
            transform: node.transform,
            appearance: node.appearance,
        }))
    }

    fn clone_children(&mut self, children: &[ObjectId]) -> Vec<ObjectId> {
        children
            .iter()
            .filter_map(|child| self.clone_subtree(*child))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube_node(size: f64) -> CadNode {
        CadNode {
            kind: NodeKind::Cube {
                size: Vec3::repeat(size),
            },
            transform: Transform::spatial(),
            appearance: Appearance::solid(),
        }
    }

    #[test]
    fn test_alloc_and_get_roundtrip() {
        let mut arena = ObjectArena::new();
        let id = arena.alloc(cube_node(2.0));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.get(id).unwrap().kind.kind_name(), "cube");
    }

    #[test]
    fn test_in_place_mutation_is_visible_through_composites() {
        let mut arena = ObjectArena::new();
        let a = arena.alloc(cube_node(1.0));
        let b = arena.alloc(cube_node(2.0));
        let group = arena.alloc(CadNode {
            kind: NodeKind::Union {
                children: vec![a, b],
            },
            transform: Transform::spatial(),
            appearance: Appearance::solid(),
        });

        arena.get_mut(a).unwrap().transform.translate(&[5.0, 0.0, 0.0]);

        let materialized = arena.materialize(group).unwrap();
        match materialized.kind {
            ObjectKind::Union { children } => {
                let pos = children[0].transform.position3().unwrap();
                assert_relative_eq!(pos.x, 5.0);
            }
            _ => panic!("expected union"),
        }
    }

    #[test]
    fn test_clone_subtree_is_independent() {
        let mut arena = ObjectArena::new();
        let original = arena.alloc(cube_node(1.0));
        let copy = arena.clone_subtree(original).unwrap();
        assert_ne!(original, copy);

        arena
            .get_mut(original)
            .unwrap()
            .transform
            .translate(&[9.0, 0.0, 0.0]);

        let copied = arena.materialize(copy).unwrap();
        assert_relative_eq!(copied.transform.position3().unwrap().x, 0.0);
    }

    #[test]
    fn test_clone_subtree_copies_nested_children() {
        let mut arena = ObjectArena::new();
        let a = arena.alloc(cube_node(1.0));
        let group = arena.alloc(CadNode {
            kind: NodeKind::Union { children: vec![a] },
            transform: Transform::spatial(),
            appearance: Appearance::solid(),
        });

        let before = arena.len();
        let copy = arena.clone_subtree(group).unwrap();
        // Copied group plus copied child
        assert_eq!(arena.len(), before + 2);

        match &arena.get(copy).unwrap().kind {
            NodeKind::Union { children } => assert_ne!(children[0], a),
            _ => panic!("expected union"),
        }
    }

    #[test]
    fn test_depth_tracks_nesting() {
        let mut arena = ObjectArena::new();
        let leaf = arena.alloc(cube_node(1.0));
        assert_eq!(arena.depth(leaf), 1);

        let mut group = arena.alloc(CadNode {
            kind: NodeKind::Union {
                children: vec![leaf],
            },
            transform: Transform::spatial(),
            appearance: Appearance::solid(),
        });
        assert_eq!(arena.depth(group), 2);

        for expected in 3..=10 {
            group = arena.alloc(CadNode {
                kind: NodeKind::Union {
                    children: vec![group, leaf],
                },
                transform: Transform::spatial(),
                appearance: Appearance::solid(),
            });
            assert_eq!(arena.depth(group), expected);
        }

        let copy = arena.clone_subtree(group).unwrap();
        assert_eq!(arena.depth(copy), 10);
    }

    #[test]
    fn test_materialize_unknown_handle_returns_none() {
        let mut first = ObjectArena::new();
        let id = first.alloc(cube_node(1.0));
        let _ = first.alloc(cube_node(2.0));

        let other = ObjectArena::new();
        assert!(other.materialize(id).is_none());
    }
}

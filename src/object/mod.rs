// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Geometry object model
//!
//! Two forms of the same scene: a mutable arena of graph nodes addressed
//! by handles while a script runs, and materialized self-contained
//! records handed to hosts when it finishes.

mod arena;
mod model;

pub use arena::{CadNode, NodeKind, ObjectArena, ObjectId};
pub use model::{
    flatten, Appearance, CadObject, ObjectKind, Transform, Vec2, Vec3, DEFAULT_COLOR_2D,
    DEFAULT_COLOR_3D,
};

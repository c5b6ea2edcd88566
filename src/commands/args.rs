// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Argument coercion for command handlers
//!
//! Commands receive positional [`Value`] lists from whichever engine
//! dispatched them. [`Args`] turns those into typed parameters with
//! uniform error messages; absent optional arguments fall back to the
//! command's documented default, a present argument of the wrong type is
//! always an error.

use crate::error::ScriptError;
use crate::lang::Value;
use crate::object::{ObjectId, Vec2, Vec3};

pub struct Args<'a> {
    command: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(command: &'static str, values: &'a [Value]) -> Self {
        Self { command, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    fn err(&self, message: String) -> ScriptError {
        ScriptError::argument(self.command, message)
    }

    fn type_err(&self, idx: usize, name: &str, expected: &str) -> ScriptError {
        let got = self
            .values
            .get(idx)
            .map(Value::type_name)
            .unwrap_or("nothing");
        self.err(format!("expected {expected} for `{name}`, got {got}"))
    }

    pub fn require_at_most(&self, n: usize) -> Result<(), ScriptError> {
        if self.values.len() > n {
            Err(self.err(format!(
                "expects at most {n} argument{}, got {}",
                if n == 1 { "" } else { "s" },
                self.values.len()
            )))
        } else {
            Ok(())
        }
    }

    pub fn require_at_least(&self, n: usize) -> Result<(), ScriptError> {
        if self.values.len() < n {
            Err(self.err(format!(
                "expects at least {n} argument{}, got {}",
                if n == 1 { "" } else { "s" },
                self.values.len()
            )))
        } else {
            Ok(())
        }
    }

    /// Required number.
    pub fn number(&self, idx: usize, name: &str) -> Result<f64, ScriptError> {
        match self.values.get(idx) {
            Some(Value::Number(n)) => Ok(*n),
            _ => Err(self.type_err(idx, name, "a number")),
        }
    }

    /// Optional number with a default.
    pub fn number_or(&self, idx: usize, name: &str, default: f64) -> Result<f64, ScriptError> {
        match self.values.get(idx) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => Ok(*n),
            Some(other) => Err(self.err(format!(
                "expected a number for `{name}`, got {}",
                other.type_name()
            ))),
        }
    }

    /// Optional non-negative integer with a default.
    pub fn integer_or(&self, idx: usize, name: &str, default: u32) -> Result<u32, ScriptError> {
        let n = self.number_or(idx, name, f64::from(default))?;
        if !n.is_finite() || n < 0.0 || n > f64::from(u32::MAX) {
            return Err(self.err(format!("`{name}` must be a non-negative integer, got {n}")));
        }
        Ok(n.round() as u32)
    }

    /// Optional segment count; at least 3 when given.
    pub fn segments_or(&self, idx: usize, default: u32) -> Result<u32, ScriptError> {
        let segments = self.integer_or(idx, "segments", default)?;
        if segments < 3 {
            return Err(self.err(format!("`segments` must be at least 3, got {segments}")));
        }
        Ok(segments)
    }

    /// Required string.
    pub fn string(&self, idx: usize, name: &str) -> Result<&'a str, ScriptError> {
        match self.values.get(idx) {
            Some(Value::Str(s)) => Ok(s),
            _ => Err(self.type_err(idx, name, "a string")),
        }
    }

    /// Optional boolean with a default.
    pub fn bool_or(&self, idx: usize, name: &str, default: bool) -> Result<bool, ScriptError> {
        match self.values.get(idx) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.err(format!(
                "expected a bool for `{name}`, got {}",
                other.type_name()
            ))),
        }
    }

    /// Required object handle.
    pub fn object(&self, idx: usize, name: &str) -> Result<ObjectId, ScriptError> {
        match self.values.get(idx) {
            Some(Value::Object(id)) => Ok(*id),
            _ => Err(self.type_err(idx, name, "an object")),
        }
    }

    /// Required array of numbers.
    pub fn numbers(&self, idx: usize, name: &str) -> Result<Vec<f64>, ScriptError> {
        match self.values.get(idx) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_number().ok_or_else(|| {
                        self.err(format!(
                            "`{name}` must contain only numbers, found {}",
                            item.type_name()
                        ))
                    })
                })
                .collect(),
            _ => Err(self.type_err(idx, name, "a vector")),
        }
    }

    /// Required size argument: a scalar expands to a uniform 3-vector.
    pub fn size3(&self, idx: usize, name: &str, default: f64) -> Result<Vec3, ScriptError> {
        match self.values.get(idx) {
            None | Some(Value::Null) => Ok(Vec3::repeat(default)),
            Some(Value::Number(n)) => Ok(Vec3::repeat(*n)),
            Some(Value::Array(_)) => {
                let components = self.numbers(idx, name)?;
                if components.len() != 3 {
                    return Err(self.err(format!(
                        "`{name}` must have 3 components, got {}",
                        components.len()
                    )));
                }
                Ok(Vec3::new(components[0], components[1], components[2]))
            }
            Some(other) => Err(self.err(format!(
                "expected a number or vector for `{name}`, got {}",
                other.type_name()
            ))),
        }
    }

    /// Required list of planar points: an array of `[x, y]` pairs.
    pub fn points(&self, idx: usize, name: &str) -> Result<Vec<Vec2>, ScriptError> {
        let items = match self.values.get(idx) {
            Some(Value::Array(items)) => items,
            _ => return Err(self.type_err(idx, name, "an array of points")),
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Array(coords) if coords.len() >= 2 => {
                    let x = coords[0].as_number();
                    let y = coords[1].as_number();
                    match (x, y) {
                        (Some(x), Some(y)) => Ok(Vec2::new(x, y)),
                        _ => Err(self.err(format!("point {i} of `{name}` must be numeric"))),
                    }
                }
                _ => Err(self.err(format!(
                    "point {i} of `{name}` must be an [x, y] pair"
                ))),
            })
            .collect()
    }

    /// Object list for boolean commands: either one array of objects or
    /// each argument an object.
    pub fn object_list(&self) -> Result<Vec<ObjectId>, ScriptError> {
        let collected: Result<Vec<ObjectId>, ScriptError> = match self.values {
            [Value::Array(items)] => items
                .iter()
                .map(|item| {
                    item.as_object().ok_or_else(|| {
                        self.err(format!(
                            "expected objects, found {}",
                            item.type_name()
                        ))
                    })
                })
                .collect(),
            values => values
                .iter()
                .map(|value| {
                    value.as_object().ok_or_else(|| {
                        self.err(format!(
                            "expected objects, found {}",
                            value.type_name()
                        ))
                    })
                })
                .collect(),
        };
        let ids = collected?;
        if ids.is_empty() {
            return Err(self.err("requires at least one object".into()));
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_number_or_defaults_when_absent() {
        let values = vec![];
        let args = Args::new("sphere", &values);
        assert_relative_eq!(args.number_or(0, "radius", 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_number_or_rejects_wrong_type() {
        let values = vec![Value::Str("big".into())];
        let args = Args::new("sphere", &values);
        let err = args.number_or(0, "radius", 1.0).unwrap_err();
        assert!(err.to_string().contains("radius"));
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_size3_expands_scalar() {
        let values = vec![Value::Number(4.0)];
        let args = Args::new("cube", &values);
        let size = args.size3(0, "size", 1.0).unwrap();
        assert_relative_eq!(size.x, 4.0);
        assert_relative_eq!(size.z, 4.0);
    }

    #[test]
    fn test_size3_rejects_two_component_vector() {
        let values = vec![Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])];
        let args = Args::new("cube", &values);
        assert!(args.size3(0, "size", 1.0).is_err());
    }

    #[test]
    fn test_segments_floor_is_enforced() {
        let values = vec![Value::Number(2.0)];
        let args = Args::new("circle", &values);
        assert!(args.segments_or(0, 32).is_err());
    }

    #[test]
    fn test_object_list_accepts_flat_and_array_forms() {
        let mut arena = crate::object::ObjectArena::new();
        let node = crate::object::CadNode {
            kind: crate::object::NodeKind::Cube {
                size: Vec3::repeat(1.0),
            },
            transform: crate::object::Transform::spatial(),
            appearance: crate::object::Appearance::solid(),
        };
        let a = arena.alloc(node.clone());
        let b = arena.alloc(node);

        let flat = vec![Value::Object(a), Value::Object(b)];
        let args = Args::new("union", &flat);
        assert_eq!(args.object_list().unwrap(), vec![a, b]);

        let nested = vec![Value::Array(vec![Value::Object(a), Value::Object(b)])];
        let args = Args::new("union", &nested);
        assert_eq!(args.object_list().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_object_list_rejects_empty() {
        let values: Vec<Value> = vec![];
        let args = Args::new("union", &values);
        assert!(args.object_list().is_err());
    }
}

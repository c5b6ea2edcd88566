// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Built-in command set
//!
//! Handlers coerce positional script values, delegate to the typed
//! library, and keep the workspace accumulator consistent: constructors
//! accumulate their result, booleans take ownership of their children,
//! extrusions and planar modifiers leave the source shape accumulated as
//! a nested descriptor.

use super::args::Args;
use super::library;
use super::registry::{Command, CommandHelp, CommandRegistry, ParameterHelp};
use super::workspace::{ExportFormat, ExportRequest, Workspace};
use crate::error::ScriptError;
use crate::lang::Value;
use crate::object::Vec2;
use std::f64::consts::TAU;

pub(super) fn install(registry: &mut CommandRegistry) {
    registry.register(Command {
        name: "cube",
        help: CommandHelp {
            description: "Create an axis-aligned box",
            syntax: "cube(size)",
            parameters: &[ParameterHelp {
                name: "size",
                kind: "number | vector3",
                description: "Edge lengths; a scalar is uniform (default [1, 1, 1])",
                optional: true,
            }],
            example: "let b = cube([10, 20, 5]);",
        },
        run: cmd_cube,
    });

    registry.register(Command {
        name: "sphere",
        help: CommandHelp {
            description: "Create a sphere",
            syntax: "sphere(radius, segments)",
            parameters: &[
                ParameterHelp {
                    name: "radius",
                    kind: "number",
                    description: "Radius (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "segments",
                    kind: "number",
                    description: "Tessellation hint (default 32)",
                    optional: true,
                },
            ],
            example: "let s = sphere(5);",
        },
        run: cmd_sphere,
    });

    registry.register(Command {
        name: "cylinder",
        help: CommandHelp {
            description: "Create a cylinder along the Z axis",
            syntax: "cylinder(radius, height, segments)",
            parameters: &[
                ParameterHelp {
                    name: "radius",
                    kind: "number",
                    description: "Radius (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "height",
                    kind: "number",
                    description: "Height (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "segments",
                    kind: "number",
                    description: "Tessellation hint (default 32)",
                    optional: true,
                },
            ],
            example: "let c = cylinder(2, 10);",
        },
        run: cmd_cylinder,
    });

    registry.register(Command {
        name: "rectangle",
        help: CommandHelp {
            description: "Create a planar rectangle",
            syntax: "rectangle(width, height)",
            parameters: &[
                ParameterHelp {
                    name: "width",
                    kind: "number",
                    description: "Extent along X (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "height",
                    kind: "number",
                    description: "Extent along Y (default 1)",
                    optional: true,
                },
            ],
            example: "let r = rectangle(4, 2);",
        },
        run: cmd_rectangle,
    });

    registry.register(Command {
        name: "circle",
        help: CommandHelp {
            description: "Create a planar circle",
            syntax: "circle(radius, segments)",
            parameters: &[
                ParameterHelp {
                    name: "radius",
                    kind: "number",
                    description: "Radius (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "segments",
                    kind: "number",
                    description: "Tessellation hint (default 32)",
                    optional: true,
                },
            ],
            example: "let c = circle(3);",
        },
        run: cmd_circle,
    });

    registry.register(Command {
        name: "polygon",
        help: CommandHelp {
            description: "Create a planar polygon from a point list",
            syntax: "polygon(points)",
            parameters: &[ParameterHelp {
                name: "points",
                kind: "array of [x, y]",
                description: "At least 3 vertices, in order",
                optional: false,
            }],
            example: "let p = polygon([[0, 0], [4, 0], [2, 3]]);",
        },
        run: cmd_polygon,
    });

    registry.register(Command {
        name: "arc",
        help: CommandHelp {
            description: "Create a planar arc",
            syntax: "arc(radius, start_angle, end_angle, segments)",
            parameters: &[
                ParameterHelp {
                    name: "radius",
                    kind: "number",
                    description: "Radius (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "start_angle",
                    kind: "number",
                    description: "Start angle in radians (default 0)",
                    optional: true,
                },
                ParameterHelp {
                    name: "end_angle",
                    kind: "number",
                    description: "End angle in radians (default 2*PI)",
                    optional: true,
                },
                ParameterHelp {
                    name: "segments",
                    kind: "number",
                    description: "Tessellation hint (default 32)",
                    optional: true,
                },
            ],
            example: "let a = arc(5, 0, Math.PI / 2);",
        },
        run: cmd_arc,
    });

    registry.register(Command {
        name: "line",
        help: CommandHelp {
            description: "Create a planar line segment",
            syntax: "line(start, end)",
            parameters: &[
                ParameterHelp {
                    name: "start",
                    kind: "[x, y]",
                    description: "Start point",
                    optional: false,
                },
                ParameterHelp {
                    name: "end",
                    kind: "[x, y]",
                    description: "End point",
                    optional: false,
                },
            ],
            example: "let l = line([0, 0], [10, 5]);",
        },
        run: cmd_line,
    });

    registry.register(Command {
        name: "linear_extrude",
        help: CommandHelp {
            description: "Extrude a planar shape into a solid",
            syntax: "linear_extrude(shape, height, twist, slices, center)",
            parameters: &[
                ParameterHelp {
                    name: "shape",
                    kind: "object",
                    description: "Planar source shape",
                    optional: false,
                },
                ParameterHelp {
                    name: "height",
                    kind: "number",
                    description: "Extrusion height (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "twist",
                    kind: "number",
                    description: "Total twist in radians (default 0)",
                    optional: true,
                },
                ParameterHelp {
                    name: "slices",
                    kind: "number",
                    description: "Intermediate slices (default 1)",
                    optional: true,
                },
                ParameterHelp {
                    name: "center",
                    kind: "bool",
                    description: "Center along the extrusion axis (default false)",
                    optional: true,
                },
            ],
            example: "let solid = linear_extrude(circle(4), 10);",
        },
        run: cmd_linear_extrude,
    });

    registry.register(Command {
        name: "rotate_extrude",
        help: CommandHelp {
            description: "Revolve a planar shape around the Z axis",
            syntax: "rotate_extrude(shape, angle, segments)",
            parameters: &[
                ParameterHelp {
                    name: "shape",
                    kind: "object",
                    description: "Planar source shape",
                    optional: false,
                },
                ParameterHelp {
                    name: "angle",
                    kind: "number",
                    description: "Sweep angle in radians (default 2*PI)",
                    optional: true,
                },
                ParameterHelp {
                    name: "segments",
                    kind: "number",
                    description: "Tessellation hint (default 32)",
                    optional: true,
                },
            ],
            example: "let ring = rotate_extrude(translate(circle(1), [4, 0]));",
        },
        run: cmd_rotate_extrude,
    });

    registry.register(Command {
        name: "offset",
        help: CommandHelp {
            description: "Grow or shrink a planar shape outline",
            syntax: "offset(shape, delta)",
            parameters: &[
                ParameterHelp {
                    name: "shape",
                    kind: "object",
                    description: "Planar source shape",
                    optional: false,
                },
                ParameterHelp {
                    name: "delta",
                    kind: "number",
                    description: "Outline displacement; negative shrinks",
                    optional: false,
                },
            ],
            example: "let grown = offset(rectangle(4, 2), 0.5);",
        },
        run: cmd_offset,
    });

    registry.register(Command {
        name: "fillet",
        help: CommandHelp {
            description: "Round the corners of a planar shape",
            syntax: "fillet(shape, radius)",
            parameters: &[
                ParameterHelp {
                    name: "shape",
                    kind: "object",
                    description: "Planar source shape",
                    optional: false,
                },
                ParameterHelp {
                    name: "radius",
                    kind: "number",
                    description: "Corner radius",
                    optional: false,
                },
            ],
            example: "let rounded = fillet(rectangle(10, 6), 1);",
        },
        run: cmd_fillet,
    });

    registry.register(Command {
        name: "chamfer",
        help: CommandHelp {
            description: "Bevel the corners of a planar shape",
            syntax: "chamfer(shape, distance)",
            parameters: &[
                ParameterHelp {
                    name: "shape",
                    kind: "object",
                    description: "Planar source shape",
                    optional: false,
                },
                ParameterHelp {
                    name: "distance",
                    kind: "number",
                    description: "Bevel distance",
                    optional: false,
                },
            ],
            example: "let beveled = chamfer(rectangle(10, 6), 1);",
        },
        run: cmd_chamfer,
    });

    registry.register(Command {
        name: "union",
        help: CommandHelp {
            description: "Group objects into a union",
            syntax: "union(objects...) or union([objects])",
            parameters: &[ParameterHelp {
                name: "objects",
                kind: "object...",
                description: "Objects to combine; they become children of the union",
                optional: false,
            }],
            example: "let joined = union(cube(5), sphere(3));",
        },
        run: cmd_union,
    });

    registry.register(Command {
        name: "difference",
        help: CommandHelp {
            description: "Subtract later objects from the first",
            syntax: "difference(base, cutters...) or difference([objects])",
            parameters: &[ParameterHelp {
                name: "objects",
                kind: "object...",
                description: "Base object followed by objects to remove",
                optional: false,
            }],
            example: "let slotted = difference(cube(10), cylinder(2, 12));",
        },
        run: cmd_difference,
    });

    registry.register(Command {
        name: "intersection",
        help: CommandHelp {
            description: "Keep only the volume common to all objects",
            syntax: "intersection(objects...) or intersection([objects])",
            parameters: &[ParameterHelp {
                name: "objects",
                kind: "object...",
                description: "Objects to intersect",
                optional: false,
            }],
            example: "let core = intersection(cube(8), sphere(5));",
        },
        run: cmd_intersection,
    });

    registry.register(Command {
        name: "translate",
        help: CommandHelp {
            description: "Shift an object in place",
            syntax: "translate(object, offset)",
            parameters: &[
                ParameterHelp {
                    name: "object",
                    kind: "object",
                    description: "Object to move",
                    optional: false,
                },
                ParameterHelp {
                    name: "offset",
                    kind: "vector",
                    description: "[x, y] for planar shapes, [x, y, z] for solids",
                    optional: false,
                },
            ],
            example: "translate(b, [10, 0, 0]);",
        },
        run: cmd_translate,
    });

    registry.register(Command {
        name: "rotate",
        help: CommandHelp {
            description: "Rotate an object in place (radians)",
            syntax: "rotate(object, angle | [x, y, z])",
            parameters: &[
                ParameterHelp {
                    name: "object",
                    kind: "object",
                    description: "Object to rotate",
                    optional: false,
                },
                ParameterHelp {
                    name: "angle",
                    kind: "number | vector3",
                    description: "Scalar rotates planar shapes in-plane and solids around Z",
                    optional: false,
                },
            ],
            example: "rotate(b, [0, 0, Math.PI / 4]);",
        },
        run: cmd_rotate,
    });

    registry.register(Command {
        name: "scale",
        help: CommandHelp {
            description: "Scale an object in place",
            syntax: "scale(object, factor | [x, y, z])",
            parameters: &[
                ParameterHelp {
                    name: "object",
                    kind: "object",
                    description: "Object to scale",
                    optional: false,
                },
                ParameterHelp {
                    name: "factor",
                    kind: "number | vector",
                    description: "Uniform scalar or per-axis factors",
                    optional: false,
                },
            ],
            example: "scale(b, 2);",
        },
        run: cmd_scale,
    });

    registry.register(Command {
        name: "set_color",
        help: CommandHelp {
            description: "Recolor an object in place",
            syntax: "set_color(object, color, opacity)",
            parameters: &[
                ParameterHelp {
                    name: "object",
                    kind: "object",
                    description: "Object to recolor",
                    optional: false,
                },
                ParameterHelp {
                    name: "color",
                    kind: "string | [r, g, b]",
                    description: "Hex string like \"#ff8800\" or components in [0, 1]",
                    optional: false,
                },
                ParameterHelp {
                    name: "opacity",
                    kind: "number",
                    description: "Opacity in [0, 1]; below 1 marks the object transparent",
                    optional: true,
                },
            ],
            example: "set_color(b, \"#ff0000\", 0.5);",
        },
        run: cmd_set_color,
    });

    registry.register(Command {
        name: "clone_object",
        help: CommandHelp {
            description: "Deep-copy an object",
            syntax: "clone_object(object)",
            parameters: &[ParameterHelp {
                name: "object",
                kind: "object",
                description: "Object to copy; the copy is independent",
                optional: false,
            }],
            example: "let second = clone_object(first);",
        },
        run: cmd_clone_object,
    });

    registry.register(Command {
        name: "log",
        help: CommandHelp {
            description: "Append a line to the script log",
            syntax: "log(values...)",
            parameters: &[ParameterHelp {
                name: "values",
                kind: "any...",
                description: "Values to format, joined by spaces",
                optional: true,
            }],
            example: "log(\"radius =\", r);",
        },
        run: cmd_log,
    });

    registry.register(Command {
        name: "export",
        help: CommandHelp {
            description: "Record a file export request for the host",
            syntax: "export(filename, format, overwrite)",
            parameters: &[
                ParameterHelp {
                    name: "filename",
                    kind: "string",
                    description: "Target file name",
                    optional: false,
                },
                ParameterHelp {
                    name: "format",
                    kind: "string",
                    description: "\"stl\" or \"step\"; inferred from the extension when omitted",
                    optional: true,
                },
                ParameterHelp {
                    name: "overwrite",
                    kind: "bool",
                    description: "Allow replacing an existing file (default false)",
                    optional: true,
                },
            ],
            example: "export(\"part.stl\");",
        },
        run: cmd_export,
    });
}

fn cmd_cube(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("cube", values);
    args.require_at_most(1)?;
    let size = args.size3(0, "size", 1.0)?;
    ws.check_object_budget()?;
    let id = library::cube(ws.arena_mut(), size);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_sphere(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("sphere", values);
    args.require_at_most(2)?;
    let radius = args.number_or(0, "radius", 1.0)?;
    let segments = args.segments_or(1, library::DEFAULT_SEGMENTS)?;
    ws.check_object_budget()?;
    let id = library::sphere(ws.arena_mut(), radius, segments);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_cylinder(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("cylinder", values);
    args.require_at_most(3)?;
    let radius = args.number_or(0, "radius", 1.0)?;
    let height = args.number_or(1, "height", 1.0)?;
    let segments = args.segments_or(2, library::DEFAULT_SEGMENTS)?;
    ws.check_object_budget()?;
    let id = library::cylinder(ws.arena_mut(), radius, height, segments);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_rectangle(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("rectangle", values);
    args.require_at_most(2)?;
    let width = args.number_or(0, "width", 1.0)?;
    let height = args.number_or(1, "height", 1.0)?;
    ws.check_object_budget()?;
    let id = library::rectangle(ws.arena_mut(), width, height);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_circle(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("circle", values);
    args.require_at_most(2)?;
    let radius = args.number_or(0, "radius", 1.0)?;
    let segments = args.segments_or(1, library::DEFAULT_SEGMENTS)?;
    ws.check_object_budget()?;
    let id = library::circle(ws.arena_mut(), radius, segments);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_polygon(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("polygon", values);
    args.require_at_least(1)?;
    args.require_at_most(1)?;
    let points = args.points(0, "points")?;
    ws.check_object_budget()?;
    let id = library::polygon(ws.arena_mut(), points)?;
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_arc(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("arc", values);
    args.require_at_most(4)?;
    let radius = args.number_or(0, "radius", 1.0)?;
    let start_angle = args.number_or(1, "start_angle", 0.0)?;
    let end_angle = args.number_or(2, "end_angle", TAU)?;
    let segments = args.segments_or(3, library::DEFAULT_SEGMENTS)?;
    ws.check_object_budget()?;
    let id = library::arc(ws.arena_mut(), radius, start_angle, end_angle, segments);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn point_arg(args: &Args<'_>, idx: usize, name: &str) -> Result<Vec2, ScriptError> {
    let components = args.numbers(idx, name)?;
    if components.len() < 2 {
        return Err(ScriptError::argument(
            "line",
            format!("`{name}` must be an [x, y] pair"),
        ));
    }
    Ok(Vec2::new(components[0], components[1]))
}

fn cmd_line(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("line", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let start = point_arg(&args, 0, "start")?;
    let end = point_arg(&args, 1, "end")?;
    ws.check_object_budget()?;
    let id = library::line(ws.arena_mut(), start, end);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_linear_extrude(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("linear_extrude", values);
    args.require_at_least(1)?;
    args.require_at_most(5)?;
    let shape = args.object(0, "shape")?;
    let height = args.number_or(1, "height", 1.0)?;
    let twist = args.number_or(2, "twist", 0.0)?;
    let slices = args.integer_or(3, "slices", 1)?;
    let center = args.bool_or(4, "center", false)?;
    ws.check_object_budget()?;
    let id = library::linear_extrude(ws.arena_mut(), shape, height, twist, slices, center)?;
    ws.check_depth_budget(id)?;
    // The source shape stays accumulated; the extrusion nests a copy of
    // it at materialization time.
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_rotate_extrude(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("rotate_extrude", values);
    args.require_at_least(1)?;
    args.require_at_most(3)?;
    let shape = args.object(0, "shape")?;
    let angle = args.number_or(1, "angle", TAU)?;
    let segments = args.segments_or(2, library::DEFAULT_SEGMENTS)?;
    ws.check_object_budget()?;
    let id = library::rotate_extrude(ws.arena_mut(), shape, angle, segments)?;
    ws.check_depth_budget(id)?;
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_offset(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("offset", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let shape = args.object(0, "shape")?;
    let delta = args.number(1, "delta")?;
    ws.check_object_budget()?;
    let id = library::offset(ws.arena_mut(), shape, delta)?;
    ws.check_depth_budget(id)?;
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_fillet(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("fillet", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let shape = args.object(0, "shape")?;
    let radius = args.number(1, "radius")?;
    ws.check_object_budget()?;
    let id = library::fillet(ws.arena_mut(), shape, radius)?;
    ws.check_depth_budget(id)?;
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_chamfer(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("chamfer", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let shape = args.object(0, "shape")?;
    let distance = args.number(1, "distance")?;
    ws.check_object_budget()?;
    let id = library::chamfer(ws.arena_mut(), shape, distance)?;
    ws.check_depth_budget(id)?;
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_union(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("union", values);
    let children = args.object_list()?;
    ws.check_object_budget()?;
    let id = library::union(ws.arena_mut(), children.clone())?;
    ws.check_depth_budget(id)?;
    ws.disown(&children);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_difference(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("difference", values);
    let children = args.object_list()?;
    ws.check_object_budget()?;
    let id = library::difference(ws.arena_mut(), children.clone())?;
    ws.check_depth_budget(id)?;
    ws.disown(&children);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_intersection(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("intersection", values);
    let children = args.object_list()?;
    ws.check_object_budget()?;
    let id = library::intersection(ws.arena_mut(), children.clone())?;
    ws.check_depth_budget(id)?;
    ws.disown(&children);
    ws.accumulate(id);
    Ok(Value::Object(id))
}

fn cmd_translate(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("translate", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let id = args.object(0, "object")?;
    let offset = args.numbers(1, "offset")?;
    library::translate(ws.arena_mut(), id, &offset)?;
    Ok(Value::Object(id))
}

fn cmd_rotate(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("rotate", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let id = args.object(0, "object")?;
    let planar = ws
        .arena()
        .get(id)
        .map(|node| node.transform.is_planar())
        .unwrap_or(false);
    let angles = match args.get(1) {
        // A scalar angle spins planar shapes in-plane and solids around Z.
        Some(Value::Number(angle)) => {
            if planar {
                vec![*angle]
            } else {
                vec![0.0, 0.0, *angle]
            }
        }
        Some(Value::Array(_)) => args.numbers(1, "angle")?,
        _ => {
            return Err(ScriptError::argument(
                "rotate",
                "expected an angle or [x, y, z] vector",
            ))
        }
    };
    library::rotate(ws.arena_mut(), id, &angles)?;
    Ok(Value::Object(id))
}

fn cmd_scale(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("scale", values);
    args.require_at_least(2)?;
    args.require_at_most(2)?;
    let id = args.object(0, "object")?;
    let factors = match args.get(1) {
        Some(Value::Number(factor)) => vec![*factor, *factor, *factor],
        Some(Value::Array(_)) => args.numbers(1, "factor")?,
        _ => {
            return Err(ScriptError::argument(
                "scale",
                "expected a factor or per-axis vector",
            ))
        }
    };
    library::scale(ws.arena_mut(), id, &factors)?;
    Ok(Value::Object(id))
}

fn cmd_set_color(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("set_color", values);
    args.require_at_least(2)?;
    args.require_at_most(3)?;
    let id = args.object(0, "object")?;

    let mut vector_alpha = None;
    let color = match args.get(1) {
        Some(Value::Str(color)) => color.clone(),
        Some(Value::Array(_)) => {
            let components = args.numbers(1, "color")?;
            if components.len() < 3 {
                return Err(ScriptError::argument(
                    "set_color",
                    "color vector needs [r, g, b] with optional alpha",
                ));
            }
            vector_alpha = components.get(3).copied();
            rgb_to_hex(components[0], components[1], components[2])
        }
        _ => {
            return Err(ScriptError::argument(
                "set_color",
                "expected a color string or [r, g, b] vector",
            ))
        }
    };

    let opacity = match args.get(2) {
        None | Some(Value::Null) => vector_alpha,
        Some(Value::Number(opacity)) => Some(*opacity),
        Some(other) => {
            return Err(ScriptError::argument(
                "set_color",
                format!("expected a number for `opacity`, got {}", other.type_name()),
            ))
        }
    };

    library::set_color(ws.arena_mut(), id, color, opacity)?;
    Ok(Value::Object(id))
}

fn rgb_to_hex(r: f64, g: f64, b: f64) -> String {
    let byte = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", byte(r), byte(g), byte(b))
}

fn cmd_clone_object(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("clone_object", values);
    args.require_at_least(1)?;
    args.require_at_most(1)?;
    let id = args.object(0, "object")?;
    ws.check_object_budget()?;
    let copy = library::clone_object(ws.arena_mut(), id)?;
    ws.accumulate(copy);
    Ok(Value::Object(copy))
}

fn cmd_log(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let line = values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    ws.push_log(line);
    Ok(Value::Null)
}

fn cmd_export(ws: &mut Workspace, values: &[Value]) -> Result<Value, ScriptError> {
    let args = Args::new("export", values);
    args.require_at_least(1)?;
    args.require_at_most(3)?;
    let filename = args.string(0, "filename")?.to_string();

    let format = match args.get(1) {
        None | Some(Value::Null) => infer_format(&filename).ok_or_else(|| {
            ScriptError::argument(
                "export",
                format!("cannot infer a format from `{filename}`; pass \"stl\" or \"step\""),
            )
        })?,
        Some(Value::Str(format)) => ExportFormat::parse(format).ok_or_else(|| {
            ScriptError::argument(
                "export",
                format!("unsupported format `{format}`; expected \"stl\" or \"step\""),
            )
        })?,
        Some(other) => {
            return Err(ScriptError::argument(
                "export",
                format!("expected a string for `format`, got {}", other.type_name()),
            ))
        }
    };

    let overwrite = args.bool_or(2, "overwrite", false)?;
    ws.push_export(ExportRequest {
        filename,
        format,
        overwrite,
    });
    Ok(Value::Null)
}

fn infer_format(filename: &str) -> Option<ExportFormat> {
    let extension = filename.rsplit_once('.')?.1;
    ExportFormat::parse(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::object::ObjectKind;
    use approx::assert_relative_eq;

    fn workspace() -> Workspace {
        Workspace::new(&EngineConfig::default())
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::standard()
    }

    fn run(ws: &mut Workspace, name: &str, values: Vec<Value>) -> Result<Value, ScriptError> {
        let registry = registry();
        let command = registry.get(name).expect("command registered");
        (command.run)(ws, &values)
    }

    #[test]
    fn test_cube_defaults_to_unit_size() {
        let mut ws = workspace();
        let value = run(&mut ws, "cube", vec![]).unwrap();
        let id = value.as_object().unwrap();
        match &ws.arena().get(id).unwrap().kind {
            crate::object::NodeKind::Cube { size } => {
                assert_relative_eq!(size.x, 1.0);
                assert_relative_eq!(size.y, 1.0);
                assert_relative_eq!(size.z, 1.0);
            }
            other => panic!("expected cube, got {}", other.kind_name()),
        }
        assert_eq!(ws.roots().len(), 1);
    }

    #[test]
    fn test_sphere_defaults() {
        let mut ws = workspace();
        let value = run(&mut ws, "sphere", vec![]).unwrap();
        let id = value.as_object().unwrap();
        match ws.arena().get(id).unwrap().kind {
            crate::object::NodeKind::Sphere { radius, segments } => {
                assert_relative_eq!(radius, 1.0);
                assert_eq!(segments, 32);
            }
            _ => panic!("expected sphere"),
        }
    }

    #[test]
    fn test_union_takes_ownership_of_children() {
        let mut ws = workspace();
        let a = run(&mut ws, "cube", vec![]).unwrap();
        let b = run(&mut ws, "sphere", vec![]).unwrap();
        assert_eq!(ws.roots().len(), 2);

        let u = run(&mut ws, "union", vec![a, b]).unwrap();
        let union_id = u.as_object().unwrap();
        assert_eq!(ws.roots(), &[union_id]);
    }

    #[test]
    fn test_extrude_leaves_source_accumulated() {
        let mut ws = workspace();
        let profile = run(&mut ws, "circle", vec![Value::Number(4.0)]).unwrap();
        let solid = run(&mut ws, "linear_extrude", vec![profile, Value::Number(10.0)]).unwrap();
        assert_eq!(ws.roots().len(), 2);

        let id = solid.as_object().unwrap();
        let materialized = ws.arena().materialize(id).unwrap();
        match materialized.kind {
            ObjectKind::Extruded { height, shape, .. } => {
                assert_relative_eq!(height, 10.0);
                assert_eq!(shape.kind_name(), "circle2d");
            }
            _ => panic!("expected extruded"),
        }
    }

    #[test]
    fn test_rotate_scalar_maps_to_z_for_solids() {
        let mut ws = workspace();
        let b = run(&mut ws, "cube", vec![]).unwrap();
        run(
            &mut ws,
            "rotate",
            vec![b.clone(), Value::Number(std::f64::consts::FRAC_PI_2)],
        )
        .unwrap();

        let id = b.as_object().unwrap();
        match ws.arena().get(id).unwrap().transform {
            crate::object::Transform::Spatial { rotation, .. } => {
                assert_relative_eq!(rotation.x, 0.0);
                assert_relative_eq!(rotation.z, std::f64::consts::FRAC_PI_2);
            }
            _ => panic!("expected spatial transform"),
        }
    }

    #[test]
    fn test_set_color_accepts_component_vector() {
        let mut ws = workspace();
        let b = run(&mut ws, "cube", vec![]).unwrap();
        run(
            &mut ws,
            "set_color",
            vec![
                b.clone(),
                Value::Array(vec![
                    Value::Number(1.0),
                    Value::Number(0.0),
                    Value::Number(0.0),
                    Value::Number(0.25),
                ]),
            ],
        )
        .unwrap();

        let id = b.as_object().unwrap();
        let appearance = &ws.arena().get(id).unwrap().appearance;
        assert_eq!(appearance.color, "#ff0000");
        assert!(appearance.transparent);
        assert_relative_eq!(appearance.opacity, 0.25);
    }

    #[test]
    fn test_export_infers_format_from_extension() {
        let mut ws = workspace();
        run(&mut ws, "export", vec![Value::Str("part.stl".into())]).unwrap();
        let exports = ws.take_exports();
        assert_eq!(exports.len(), 1);
        assert_eq!(exports[0].format, ExportFormat::Stl);
        assert!(!exports[0].overwrite);
    }

    #[test]
    fn test_export_rejects_unknown_format() {
        let mut ws = workspace();
        let err = run(
            &mut ws,
            "export",
            vec![Value::Str("part.obj".into())],
        )
        .unwrap_err();
        assert!(err.to_string().contains("format"));
    }

    #[test]
    fn test_log_joins_values_with_spaces() {
        let mut ws = workspace();
        run(
            &mut ws,
            "log",
            vec![Value::Str("r".into()), Value::Number(2.0)],
        )
        .unwrap();
        assert_eq!(ws.take_logs(), vec!["r 2".to_string()]);
    }
}

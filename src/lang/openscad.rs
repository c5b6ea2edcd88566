// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! OpenSCAD front end
//!
//! A deterministic, order-sensitive textual rewriter that turns
//! OpenSCAD-flavored syntax into native call syntax, then delegates to
//! the shared evaluation core. It is a scanner, not a grammar: the
//! supported patterns (modifier-before-child calls, block-style
//! booleans, named arguments on the primitive calls) rewrite reliably,
//! anything beyond them transpiles on a best-effort basis and surfaces
//! as an ordinary error envelope from the native evaluator.
//!
//! Known limitations, by design: `center = true` on a non-literal size
//! is ignored, `module`/`function` definitions are not supported, and
//! angle conversion wraps non-literal expressions in a degree-to-radian
//! multiplication rather than evaluating them.

use super::core::{AliasTable, NativeCore};
use super::engine::{EngineInfo, ExecutionResult, LanguageEngine, ValidationReport};
use crate::commands::CommandHelp;
use crate::config::EngineConfig;
use crate::error::ScriptError;
use std::collections::HashSet;

const INFO: EngineInfo = EngineInfo {
    id: "openscad",
    name: "OpenSCAD",
    description: "OpenSCAD-syntax front end transpiled onto the native command set",
    extensions: &["scad"],
};

const ALIASES: &[(&str, &str)] = &[
    ("square", "rectangle"),
    ("color", "set_color"),
    ("echo", "log"),
];

pub struct OpenscadEngine {
    core: NativeCore,
}

impl OpenscadEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            core: NativeCore::new(config, AliasTable::new(ALIASES)),
        }
    }

    /// Rewrite OpenSCAD source into native call syntax.
    ///
    /// Exposed for tooling that wants to inspect the rewrite; `execute`
    /// and `validate` call it internally.
    pub fn transpile(source: &str) -> Result<String, ScriptError> {
        Transpiler::new(source).run()
    }
}

impl Default for OpenscadEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl LanguageEngine for OpenscadEngine {
    fn info(&self) -> &EngineInfo {
        &INFO
    }

    fn execute(&mut self, source: &str) -> ExecutionResult {
        tracing::debug!(engine = INFO.id, bytes = source.len(), "execute");
        match Self::transpile(source) {
            Ok(native) => {
                tracing::trace!(%native, "transpiled");
                self.core.execute(&native)
            }
            Err(error) => ExecutionResult::failed(error, Vec::new()),
        }
    }

    fn validate(&self, source: &str) -> ValidationReport {
        match Self::transpile(source) {
            Ok(native) => self.core.validate(&native),
            Err(error) => ValidationReport::invalid(&error),
        }
    }

    fn available_commands(&self) -> Vec<String> {
        self.core.available_commands()
    }

    fn command_help(&self, name: &str) -> Option<&CommandHelp> {
        self.core.command_help(name)
    }
}

/// Cursor-based statement rewriter.
///
/// Emits one native statement per OpenSCAD statement, padding with
/// newlines so the rewritten text keeps source line numbers
/// approximately aligned for `validate` positions.
struct Transpiler {
    chars: Vec<char>,
    pos: usize,
    declared: HashSet<String>,
}

impl Transpiler {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            declared: HashSet::new(),
        }
    }

    fn run(mut self) -> Result<String, ScriptError> {
        let mut out = String::new();
        let mut out_lines = 1usize;
        loop {
            self.skip_trivia();
            match self.peek() {
                None => break,
                Some(';') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }
            let start_line = self.line();
            while out_lines < start_line {
                out.push('\n');
                out_lines += 1;
            }
            let stmt = self.statement()?;
            out.push_str(&stmt);
            out.push(';');
        }
        Ok(out)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn line(&self) -> usize {
        1 + self.chars[..self.pos].iter().filter(|&&c| c == '\n').count()
    }

    fn err(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::parse_at(message, self.line(), None)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        self.pos += 1;
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.pos += 2;
                    while self.peek().is_some() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$') {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                self.pos += 1;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_string(&mut self, quote: char) -> Result<(), ScriptError> {
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\\' {
                self.pos += 1;
            } else if c == quote {
                return Ok(());
            }
        }
        Err(self.err("unterminated string"))
    }

    /// Consume a bracketed span, returning the text between the
    /// brackets. The cursor must sit on `open`.
    fn read_balanced(&mut self, open: char, close: char) -> Result<String, ScriptError> {
        self.pos += 1;
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            if c == '"' || c == '\'' {
                self.skip_string(c)?;
            } else if c == open {
                depth += 1;
                self.pos += 1;
            } else if c == close {
                depth -= 1;
                self.pos += 1;
                if depth == 0 {
                    return Ok(self.chars[start..self.pos - 1].iter().collect());
                }
            } else {
                self.pos += 1;
            }
        }
        Err(self.err(format!("unbalanced `{open}`")))
    }

    fn read_until_semi(&mut self) -> Result<String, ScriptError> {
        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.err("missing `;`")),
                Some(';') => {
                    let text: String = self.chars[start..self.pos].iter().collect();
                    self.pos += 1;
                    return Ok(text.trim().to_string());
                }
                Some(c @ ('"' | '\'')) => self.skip_string(c)?,
                Some('(') => {
                    self.read_balanced('(', ')')?;
                }
                Some('[') => {
                    self.read_balanced('[', ']')?;
                }
                Some('{') => {
                    self.read_balanced('{', '}')?;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn consume_semi(&mut self) {
        self.skip_trivia();
        if self.peek() == Some(';') {
            self.pos += 1;
        }
    }

    fn statement(&mut self) -> Result<String, ScriptError> {
        self.skip_trivia();
        match self.peek() {
            None => Err(self.err("unexpected end of input")),
            Some('{') => {
                let grouped = self.grouped_children()?;
                self.consume_semi();
                Ok(grouped)
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.named_statement(),
            Some(c) => Err(self.err(format!("unexpected character `{c}`"))),
        }
    }

    fn named_statement(&mut self) -> Result<String, ScriptError> {
        let name = self.read_ident();
        self.skip_trivia();
        match self.peek() {
            Some('=') if self.peek_at(1) != Some('=') => {
                self.pos += 1;
                let value = self.read_until_semi()?;
                // Special variables like `$fn` lose their sigil; the
                // first assignment to a name becomes its declaration.
                let target = name.trim_start_matches('$').to_string();
                if self.declared.insert(target.clone()) {
                    Ok(format!("let {target} = {value}"))
                } else {
                    Ok(format!("{target} = {value}"))
                }
            }
            Some('(') => {
                let args = self.read_balanced('(', ')')?;
                self.call_statement(&name, &args)
            }
            _ => Err(self.err(format!("expected `(` or `=` after `{name}`"))),
        }
    }

    fn call_statement(&mut self, name: &str, args: &str) -> Result<String, ScriptError> {
        match name {
            "translate" | "scale" => {
                let vector = strip_named(args, &["v"]);
                let child = self.child()?;
                Ok(format!("{name}({child}, {vector})"))
            }
            "rotate" => {
                let angles = to_radians(&strip_named(args, &["a", "v"]));
                let child = self.child()?;
                Ok(format!("rotate({child}, {angles})"))
            }
            "union" | "difference" | "intersection" => {
                self.skip_trivia();
                if self.peek() == Some('{') {
                    let children = self.block_children()?;
                    self.consume_semi();
                    Ok(format!("{name}([{}])", children.join(", ")))
                } else {
                    self.consume_semi();
                    Ok(format!("{name}({})", plain_args(args)))
                }
            }
            "cube" => {
                let call = self.cube_call(args)?;
                self.consume_semi();
                Ok(call)
            }
            "square" => {
                let call = self.square_call(args)?;
                self.consume_semi();
                Ok(call)
            }
            "sphere" => {
                let call = self.sphere_call(args)?;
                self.consume_semi();
                Ok(call)
            }
            "cylinder" => {
                let call = self.cylinder_call(args)?;
                self.consume_semi();
                Ok(call)
            }
            "linear_extrude" => self.linear_extrude_call(args),
            "rotate_extrude" => self.rotate_extrude_call(args),
            "offset" => {
                let delta = strip_named(args, &["r", "delta"]);
                let child = self.child()?;
                Ok(format!("offset({child}, {delta})"))
            }
            "color" => {
                let rest = plain_args(args);
                let child = self.child()?;
                Ok(format!("set_color({child}, {rest})"))
            }
            _ => {
                self.consume_semi();
                Ok(format!("{name}({})", plain_args(args)))
            }
        }
    }

    /// The object a modifier applies to: a block (several statements
    /// become an implicit union) or a single nested statement.
    fn child(&mut self) -> Result<String, ScriptError> {
        self.skip_trivia();
        if self.peek() == Some('{') {
            let grouped = self.grouped_children()?;
            self.consume_semi();
            Ok(grouped)
        } else {
            self.statement()
        }
    }

    fn grouped_children(&mut self) -> Result<String, ScriptError> {
        let mut children = self.block_children()?;
        if children.len() == 1 {
            Ok(children.remove(0))
        } else {
            Ok(format!("union([{}])", children.join(", ")))
        }
    }

    fn block_children(&mut self) -> Result<Vec<String>, ScriptError> {
        self.pos += 1; // opening brace
        let mut children = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(self.err("unbalanced `{`")),
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(';') => self.pos += 1,
                Some(_) => children.push(self.statement()?),
            }
        }
        if children.is_empty() {
            return Err(self.err("empty block"));
        }
        Ok(children)
    }

    fn cube_call(&self, args: &str) -> Result<String, ScriptError> {
        let mut size: Option<String> = None;
        let mut center = false;
        let mut positional = 0usize;
        for part in split_top_level(args) {
            let (name, value) = named_part(&part);
            match name.as_deref() {
                Some("size") => size = Some(value),
                Some("center") => center = value == "true",
                Some(other) => {
                    return Err(self.err(format!("unsupported cube argument `{other}`")))
                }
                None => {
                    match positional {
                        0 => size = Some(value),
                        1 => center = value == "true",
                        _ => return Err(self.err("too many cube arguments")),
                    }
                    positional += 1;
                }
            }
        }
        let size = match size {
            Some(size) => size,
            None => return Ok("cube()".to_string()),
        };
        if center {
            if let Some(components) = parse_literal_size(&size, 3) {
                let halves: Vec<String> =
                    components.iter().map(|c| fmt_num(c / 2.0)).collect();
                return Ok(format!("translate(cube({size}), [{}])", halves.join(", ")));
            }
            tracing::debug!("cube center=true with a non-literal size, left uncentered");
        }
        Ok(format!("cube({size})"))
    }

    fn square_call(&self, args: &str) -> Result<String, ScriptError> {
        let mut size: Option<String> = None;
        let mut center = false;
        let mut positional = 0usize;
        for part in split_top_level(args) {
            let (name, value) = named_part(&part);
            match name.as_deref() {
                Some("size") => size = Some(value),
                Some("center") => center = value == "true",
                Some(other) => {
                    return Err(self.err(format!("unsupported square argument `{other}`")))
                }
                None => {
                    match positional {
                        0 => size = Some(value),
                        1 => center = value == "true",
                        _ => return Err(self.err("too many square arguments")),
                    }
                    positional += 1;
                }
            }
        }
        let size = match size {
            Some(size) => size,
            None => return Ok("rectangle()".to_string()),
        };
        let call = match parse_literal_size(&size, 2) {
            Some(extents) => {
                let call = format!("rectangle({}, {})", fmt_num(extents[0]), fmt_num(extents[1]));
                if center {
                    let halves: Vec<String> =
                        extents.iter().map(|c| fmt_num(c / 2.0)).collect();
                    return Ok(format!("translate({call}, [{}])", halves.join(", ")));
                }
                call
            }
            None => {
                if center {
                    tracing::debug!("square center=true with a non-literal size, left uncentered");
                }
                format!("rectangle({size})")
            }
        };
        Ok(call)
    }

    fn sphere_call(&self, args: &str) -> Result<String, ScriptError> {
        let mut radius: Option<String> = None;
        let mut segments: Option<String> = None;
        let mut positional = 0usize;
        for part in split_top_level(args) {
            let (name, value) = named_part(&part);
            match name.as_deref() {
                Some("r") => radius = Some(value),
                Some("d") => radius = Some(halved(&value)),
                Some("$fn") => segments = Some(value),
                Some(other) => {
                    return Err(self.err(format!("unsupported sphere argument `{other}`")))
                }
                None => {
                    if positional > 0 {
                        return Err(self.err("too many sphere arguments"));
                    }
                    radius = Some(value);
                    positional += 1;
                }
            }
        }
        Ok(match (radius, segments) {
            (None, None) => "sphere()".to_string(),
            (Some(r), None) => format!("sphere({r})"),
            (r, Some(fn_)) => format!("sphere({}, {fn_})", r.unwrap_or_else(|| "1".to_string())),
        })
    }

    fn cylinder_call(&self, args: &str) -> Result<String, ScriptError> {
        let mut height: Option<String> = None;
        let mut radius: Option<String> = None;
        let mut segments: Option<String> = None;
        let mut positional = 0usize;
        for part in split_top_level(args) {
            let (name, value) = named_part(&part);
            match name.as_deref() {
                Some("h") => height = Some(value),
                Some("r") => radius = Some(value),
                Some("d") => radius = Some(halved(&value)),
                Some("$fn") => segments = Some(value),
                Some(other) => {
                    return Err(self.err(format!("unsupported cylinder argument `{other}`")))
                }
                None => {
                    // Positional order follows OpenSCAD: height first.
                    match positional {
                        0 => height = Some(value),
                        1 => radius = Some(value),
                        _ => return Err(self.err("too many cylinder arguments")),
                    }
                    positional += 1;
                }
            }
        }
        let fill = |slot: Option<String>| slot.unwrap_or_else(|| "1".to_string());
        Ok(match (radius, height, segments) {
            (None, None, None) => "cylinder()".to_string(),
            (r, None, None) => format!("cylinder({})", fill(r)),
            (r, Some(h), None) => format!("cylinder({}, {h})", fill(r)),
            (r, h, Some(fn_)) => format!("cylinder({}, {}, {fn_})", fill(r), fill(h)),
        })
    }

    fn linear_extrude_call(&mut self, args: &str) -> Result<String, ScriptError> {
        let mut height: Option<String> = None;
        let mut twist: Option<String> = None;
        let mut slices: Option<String> = None;
        let mut center: Option<String> = None;
        let mut positional = 0usize;
        for part in split_top_level(args) {
            let (name, value) = named_part(&part);
            match name.as_deref() {
                Some("height" | "h") => height = Some(value),
                // OpenSCAD twist is degrees
                Some("twist") => twist = Some(scalar_radians(&value)),
                Some("slices") => slices = Some(value),
                Some("center") => center = Some(value),
                Some("$fn") => {}
                Some(other) => {
                    return Err(self.err(format!("unsupported linear_extrude argument `{other}`")))
                }
                None => {
                    if positional > 0 {
                        return Err(self.err("too many linear_extrude arguments"));
                    }
                    height = Some(value);
                    positional += 1;
                }
            }
        }
        let child = self.child()?;
        let tail = trim_defaults(vec![
            (height, "1"),
            (twist, "0"),
            (slices, "1"),
            (center, "false"),
        ]);
        Ok(join_call("linear_extrude", child, tail))
    }

    fn rotate_extrude_call(&mut self, args: &str) -> Result<String, ScriptError> {
        let mut angle: Option<String> = None;
        let mut segments: Option<String> = None;
        for part in split_top_level(args) {
            let (name, value) = named_part(&part);
            match name.as_deref() {
                Some("angle" | "a") => angle = Some(scalar_radians(&value)),
                Some("$fn") => segments = Some(value),
                Some(other) => {
                    return Err(self.err(format!("unsupported rotate_extrude argument `{other}`")))
                }
                None => angle = Some(scalar_radians(&value)),
            }
        }
        let child = self.child()?;
        let tail = trim_defaults(vec![(angle, "Math.PI * 2"), (segments, "32")]);
        Ok(join_call("rotate_extrude", child, tail))
    }
}

/// Drop trailing arguments that still hold their default so the emitted
/// call stays as short as the user's.
fn trim_defaults(slots: Vec<(Option<String>, &str)>) -> Vec<String> {
    let last_set = slots.iter().rposition(|(slot, _)| slot.is_some());
    match last_set {
        None => Vec::new(),
        Some(last) => slots
            .into_iter()
            .take(last + 1)
            .map(|(slot, default)| slot.unwrap_or_else(|| default.to_string()))
            .collect(),
    }
}

fn join_call(name: &str, child: String, tail: Vec<String>) -> String {
    if tail.is_empty() {
        format!("{name}({child})")
    } else {
        format!("{name}({child}, {})", tail.join(", "))
    }
}

/// Split an argument list on top-level commas, respecting brackets and
/// string literals.
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            current.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            } else if c == quote {
                in_string = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                in_string = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Split `name = value` if the part is a named argument.
fn named_part(part: &str) -> (Option<String>, String) {
    let trimmed = part.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if matches!(chars.first(), Some(c) if c.is_ascii_alphabetic() || *c == '_' || *c == '$') {
        let mut end = 1;
        while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
            end += 1;
        }
        let mut eq = end;
        while eq < chars.len() && chars[eq].is_whitespace() {
            eq += 1;
        }
        if eq < chars.len() && chars[eq] == '=' && chars.get(eq + 1) != Some(&'=') {
            let name: String = chars[..end].iter().collect();
            let value: String = chars[eq + 1..].iter().collect();
            return (Some(name), value.trim().to_string());
        }
    }
    (None, trimmed.to_string())
}

/// Drop the named prefix from a single-argument call like
/// `translate(v = [1, 0, 0])` when the name is one of `accepted`.
fn strip_named(args: &str, accepted: &[&str]) -> String {
    let trimmed = args.trim();
    let (name, value) = named_part(trimmed);
    match name {
        Some(name) if accepted.contains(&name.as_str()) => value,
        _ => trimmed.to_string(),
    }
}

/// Strip named prefixes from every argument, keeping written order.
fn plain_args(args: &str) -> String {
    split_top_level(args)
        .into_iter()
        .map(|part| named_part(&part).1)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Degree-to-radian conversion for a scalar or bracketed vector.
/// Literals convert at transpile time, expressions convert at runtime.
fn to_radians(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let inner = &trimmed[1..trimmed.len() - 1];
        let components: Vec<String> = split_top_level(inner)
            .iter()
            .map(|component| scalar_radians(component))
            .collect();
        format!("[{}]", components.join(", "))
    } else {
        scalar_radians(trimmed)
    }
}

fn scalar_radians(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(degrees) => fmt_num(degrees.to_radians()),
        Err(_) => format!("({trimmed}) * Math.PI / 180"),
    }
}

fn halved(text: &str) -> String {
    match text.trim().parse::<f64>() {
        Ok(diameter) => fmt_num(diameter / 2.0),
        Err(_) => format!("({}) / 2", text.trim()),
    }
}

/// A literal size: a bare number (uniform) or a bracketed vector of
/// `components` numbers. Anything else is not computable at transpile
/// time.
fn parse_literal_size(text: &str, components: usize) -> Option<Vec<f64>> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return Some(vec![value; components]);
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let parsed: Option<Vec<f64>> = split_top_level(&trimmed[1..trimmed.len() - 1])
            .iter()
            .map(|component| component.trim().parse().ok())
            .collect();
        let parsed = parsed?;
        if parsed.len() == components {
            return Some(parsed);
        }
    }
    None
}

fn fmt_num(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(source: &str) -> String {
        OpenscadEngine::transpile(source).unwrap()
    }

    #[test]
    fn test_centered_cube_becomes_translate() {
        assert_eq!(
            t("cube([10,10,10], center=true);"),
            "translate(cube([10,10,10]), [5, 5, 5]);"
        );
    }

    #[test]
    fn test_uncentered_cube_passes_through() {
        assert_eq!(t("cube([2, 3, 4]);"), "cube([2, 3, 4]);");
        assert_eq!(t("cube();"), "cube();");
    }

    #[test]
    fn test_scalar_cube_center_uses_uniform_half() {
        assert_eq!(t("cube(4, true);"), "translate(cube(4), [2, 2, 2]);");
    }

    #[test]
    fn test_sphere_named_arguments_reorder() {
        assert_eq!(t("sphere(r=5, $fn=64);"), "sphere(5, 64);");
        assert_eq!(t("sphere(5);"), "sphere(5);");
        assert_eq!(t("sphere(d=10);"), "sphere(5);");
        assert_eq!(t("sphere($fn=16);"), "sphere(1, 16);");
    }

    #[test]
    fn test_cylinder_swaps_height_and_radius() {
        assert_eq!(t("cylinder(h=10, r=2, $fn=6);"), "cylinder(2, 10, 6);");
        assert_eq!(t("cylinder(10, 2);"), "cylinder(2, 10);");
        assert_eq!(t("cylinder(h=8, d=6);"), "cylinder(3, 8);");
    }

    #[test]
    fn test_translate_wraps_child() {
        assert_eq!(
            t("translate([1, 2, 3]) cube(5);"),
            "translate(cube(5), [1, 2, 3]);"
        );
    }

    #[test]
    fn test_rotate_converts_degrees_in_literal_vector() {
        assert_eq!(
            t("rotate([0, 0, 90]) cube();"),
            format!("rotate(cube(), [0, 0, {}]);", 90f64.to_radians())
        );
    }

    #[test]
    fn test_rotate_wraps_non_literal_angles() {
        assert_eq!(
            t("rotate(a) cube();"),
            "rotate(cube(), (a) * Math.PI / 180);"
        );
    }

    #[test]
    fn test_block_body_becomes_implicit_union() {
        assert_eq!(
            t("translate([1, 0, 0]) { cube(); sphere(); }"),
            "translate(union([cube(), sphere()]), [1, 0, 0]);"
        );
        assert_eq!(t("scale([2, 2, 2]) { cube(); }"), "scale(cube(), [2, 2, 2]);");
    }

    #[test]
    fn test_boolean_blocks_become_array_calls() {
        assert_eq!(
            t("difference() { cube(10); sphere(6); }"),
            "difference([cube(10), sphere(6)]);"
        );
    }

    #[test]
    fn test_nested_modifiers_chain() {
        assert_eq!(
            t("translate([1, 0, 0]) rotate([0, 0, 180]) cube();"),
            format!(
                "translate(rotate(cube(), [0, 0, {}]), [1, 0, 0]);",
                180f64.to_radians()
            )
        );
    }

    #[test]
    fn test_assignments_declare_then_reassign() {
        assert_eq!(t("x = 5; x = 6;"), "let x = 5;x = 6;");
        assert_eq!(t("$fn = 32;"), "let fn = 32;");
    }

    #[test]
    fn test_square_maps_to_rectangle() {
        assert_eq!(t("square([4, 2]);"), "rectangle(4, 2);");
        assert_eq!(t("square(3);"), "rectangle(3, 3);");
        assert_eq!(
            t("square([4, 2], center=true);"),
            "translate(rectangle(4, 2), [2, 1]);"
        );
    }

    #[test]
    fn test_linear_extrude_with_child() {
        assert_eq!(
            t("linear_extrude(height=10) circle(r=4);"),
            "linear_extrude(circle(4), 10);"
        );
        assert_eq!(
            t("linear_extrude(height=10, twist=90) circle(4);"),
            format!("linear_extrude(circle(4), 10, {});", 90f64.to_radians())
        );
    }

    #[test]
    fn test_rotate_extrude_with_child() {
        assert_eq!(
            t("rotate_extrude(angle=180, $fn=16) circle(1);"),
            format!("rotate_extrude(circle(1), {}, 16);", 180f64.to_radians())
        );
    }

    #[test]
    fn test_color_modifier_maps_to_set_color() {
        assert_eq!(
            t("color(\"red\", 0.5) cube();"),
            "set_color(cube(), \"red\", 0.5);"
        );
    }

    #[test]
    fn test_echo_passes_through_for_alias_dispatch() {
        assert_eq!(t("echo(\"hi\");"), "echo(\"hi\");");
    }

    #[test]
    fn test_line_numbers_are_preserved() {
        let out = t("cube();\n\nsphere();\n");
        assert_eq!(out, "cube();\n\nsphere();");
    }

    #[test]
    fn test_unbalanced_brace_reports_line() {
        let err = OpenscadEngine::transpile("union() {\n cube();\n").unwrap_err();
        assert!(err.to_string().contains("unbalanced"));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(OpenscadEngine::transpile("echo(\"oops);").is_err());
    }
}

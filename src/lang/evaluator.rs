// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Tree-walking interpreter for the native dialect
//!
//! Identifier resolution is bound: script variables, registered commands
//! (through the engine's alias table) and the restricted `Math`
//! namespace are the only names that resolve. Every statement and loop
//! iteration consumes one step from the configured budget so runaway
//! scripts fail with a structured error instead of hanging the host.

use super::ast::{AssignOp, AssignTarget, BinaryOp, Expr, Script, Stmt, UnaryOp};
use super::core::AliasTable;
use super::value::Value;
use crate::commands::{CommandRegistry, Workspace};
use crate::config::EngineConfig;
use crate::error::ScriptError;
use std::collections::HashMap;

/// Loop control signal threaded through statement execution.
enum Flow {
    Normal,
    Break,
    Continue,
}

pub(crate) struct Evaluator<'a> {
    registry: &'a CommandRegistry,
    aliases: &'a AliasTable,
    workspace: &'a mut Workspace,
    scopes: Vec<HashMap<String, Value>>,
    steps: usize,
    max_steps: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        registry: &'a CommandRegistry,
        aliases: &'a AliasTable,
        workspace: &'a mut Workspace,
        config: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            aliases,
            workspace,
            scopes: vec![HashMap::new()],
            steps: 0,
            max_steps: config.max_steps,
        }
    }

    pub fn run(mut self, script: &Script) -> Result<(), ScriptError> {
        for stmt in &script.statements {
            match self.exec(stmt)? {
                Flow::Normal => {}
                Flow::Break => return Err(ScriptError::runtime("`break` outside of a loop")),
                Flow::Continue => {
                    return Err(ScriptError::runtime("`continue` outside of a loop"))
                }
            }
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), ScriptError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ScriptError::StepBudget {
                limit: self.max_steps,
            });
        }
        Ok(())
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, ScriptError> {
        self.tick()?;
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval(value)?;
                self.declare(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, op, value } => {
                self.assign(target, *op, value)?;
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.truthy() {
                    self.run_block(then_branch)
                } else {
                    self.run_block(else_branch)
                }
            }
            Stmt::While { condition, body } => {
                loop {
                    self.tick()?;
                    if !self.eval(condition)?.truthy() {
                        break;
                    }
                    match self.run_block(body)? {
                        Flow::Break => break,
                        Flow::Continue | Flow::Normal => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                // The loop variable lives in its own scope around the body.
                self.scopes.push(HashMap::new());
                let result = self.run_for(init, condition, update, body);
                self.scopes.pop();
                result.map(|_| Flow::Normal)
            }
            Stmt::Block(stmts) => self.run_block(stmts),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
        }
    }

    fn run_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        condition: &Option<Expr>,
        update: &Option<Box<Stmt>>,
        body: &[Stmt],
    ) -> Result<(), ScriptError> {
        if let Some(init) = init {
            self.exec(init)?;
        }
        loop {
            self.tick()?;
            if let Some(condition) = condition {
                if !self.eval(condition)?.truthy() {
                    break;
                }
            }
            match self.run_block(body)? {
                Flow::Break => break,
                // `continue` still runs the update clause.
                Flow::Continue | Flow::Normal => {}
            }
            if let Some(update) = update {
                self.exec(update)?;
            }
        }
        Ok(())
    }

    fn run_block(&mut self, stmts: &[Stmt]) -> Result<Flow, ScriptError> {
        self.scopes.push(HashMap::new());
        let result = self.exec_all(stmts);
        self.scopes.pop();
        result
    }

    fn exec_all(&mut self, stmts: &[Stmt]) -> Result<Flow, ScriptError> {
        for stmt in stmts {
            match self.exec(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn declare(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), value);
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn assign_name(&mut self, name: &str, value: Value) -> Result<(), ScriptError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return Ok(());
            }
        }
        Err(ScriptError::UnknownIdentifier {
            name: name.to_string(),
        })
    }

    fn assign(
        &mut self,
        target: &AssignTarget,
        op: AssignOp,
        value: &Expr,
    ) -> Result<(), ScriptError> {
        let rhs = self.eval(value)?;
        match target {
            AssignTarget::Name(name) => {
                let next = match op {
                    AssignOp::Assign => rhs,
                    _ => {
                        let current = self.lookup(name).cloned().ok_or_else(|| {
                            ScriptError::UnknownIdentifier { name: name.clone() }
                        })?;
                        compound(op, &current, &rhs)?
                    }
                };
                self.assign_name(name, next)
            }
            AssignTarget::Index { name, indices } => {
                let mut resolved = Vec::with_capacity(indices.len());
                for index in indices {
                    let value = self.eval(index)?;
                    resolved.push(to_index(&value)?);
                }
                let slot = self.index_slot(name, &resolved)?;
                let next = match op {
                    AssignOp::Assign => rhs,
                    _ => compound(op, slot, &rhs)?,
                };
                *slot = next;
                Ok(())
            }
        }
    }

    fn index_slot(&mut self, name: &str, indices: &[usize]) -> Result<&mut Value, ScriptError> {
        let mut slot = self.scope_slot(name)?;
        for &index in indices {
            match slot {
                Value::Array(items) => {
                    let len = items.len();
                    slot = items.get_mut(index).ok_or_else(|| {
                        ScriptError::runtime(format!("index {index} out of bounds (length {len})"))
                    })?;
                }
                other => {
                    return Err(ScriptError::runtime(format!(
                        "cannot index into {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(slot)
    }

    fn scope_slot(&mut self, name: &str) -> Result<&mut Value, ScriptError> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                return Ok(slot);
            }
        }
        Err(ScriptError::UnknownIdentifier {
            name: name.to_string(),
        })
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item)?);
                }
                Ok(Value::Array(values))
            }
            Expr::Ident(name) => self
                .lookup(name)
                .cloned()
                .ok_or_else(|| ScriptError::UnknownIdentifier { name: name.clone() }),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Neg => value
                        .as_number()
                        .map(|n| Value::Number(-n))
                        .ok_or_else(|| {
                            ScriptError::runtime(format!("cannot negate {}", value.type_name()))
                        }),
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                }
            }
            Expr::Binary { op, lhs, rhs } => match op {
                // Short-circuit operators return the deciding operand.
                BinaryOp::And => {
                    let left = self.eval(lhs)?;
                    if !left.truthy() {
                        Ok(left)
                    } else {
                        self.eval(rhs)
                    }
                }
                BinaryOp::Or => {
                    let left = self.eval(lhs)?;
                    if left.truthy() {
                        Ok(left)
                    } else {
                        self.eval(rhs)
                    }
                }
                _ => {
                    let left = self.eval(lhs)?;
                    let right = self.eval(rhs)?;
                    binary_values(*op, &left, &right)
                }
            },
            Expr::Member { object, field } => self.eval_member(object, field),
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let index_value = self.eval(index)?;
                let index = to_index(&index_value)?;
                match &target {
                    Value::Array(items) => items.get(index).cloned().ok_or_else(|| {
                        ScriptError::runtime(format!(
                            "index {index} out of bounds (length {})",
                            items.len()
                        ))
                    }),
                    Value::Str(s) => s
                        .chars()
                        .nth(index)
                        .map(|c| Value::Str(c.to_string()))
                        .ok_or_else(|| {
                            ScriptError::runtime(format!(
                                "index {index} out of bounds (length {})",
                                s.chars().count()
                            ))
                        }),
                    other => Err(ScriptError::runtime(format!(
                        "cannot index into {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::Call { callee, args } => self.eval_call(callee, args),
        }
    }

    fn eval_member(&mut self, object: &Expr, field: &str) -> Result<Value, ScriptError> {
        if self.is_math_namespace(object) {
            return math_constant(field);
        }
        let value = self.eval(object)?;
        match (&value, field) {
            (Value::Array(items), "length") => Ok(Value::Number(items.len() as f64)),
            (Value::Str(s), "length") => Ok(Value::Number(s.chars().count() as f64)),
            _ => Err(ScriptError::runtime(format!(
                "unknown property `{field}` on {}",
                value.type_name()
            ))),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, ScriptError> {
        match callee {
            Expr::Member { object, field } => {
                if self.is_math_namespace(object) {
                    let values = self.eval_args(args)?;
                    return math_call(field, &values);
                }
                Err(ScriptError::runtime("expression is not callable"))
            }
            Expr::Ident(name) => {
                let canonical = self.aliases.resolve(name);
                let run = match self.registry.get(canonical) {
                    Some(command) => command.run,
                    None => return Err(ScriptError::UnknownCommand { name: name.clone() }),
                };
                let values = self.eval_args(args)?;
                run(self.workspace, &values)
            }
            _ => Err(ScriptError::runtime("expression is not callable")),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, ScriptError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }
        Ok(values)
    }

    /// `Math` resolves as the builtin namespace unless a script variable
    /// shadows it.
    fn is_math_namespace(&self, object: &Expr) -> bool {
        matches!(object, Expr::Ident(name) if name == "Math" && self.lookup("Math").is_none())
    }
}

fn compound(op: AssignOp, current: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    let binary = match op {
        AssignOp::Assign => return Ok(rhs.clone()),
        AssignOp::Add => BinaryOp::Add,
        AssignOp::Sub => BinaryOp::Sub,
        AssignOp::Mul => BinaryOp::Mul,
        AssignOp::Div => BinaryOp::Div,
    };
    binary_values(binary, current, rhs)
}

fn binary_values(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::Str(format!("{lhs}{rhs}"))),
            _ => Err(ScriptError::runtime(format!(
                "cannot add {} and {}",
                lhs.type_name(),
                rhs.type_name()
            ))),
        },
        BinaryOp::Sub => arithmetic(lhs, rhs, "subtract", |a, b| a - b),
        BinaryOp::Mul => arithmetic(lhs, rhs, "multiply", |a, b| a * b),
        // Division follows IEEE semantics: dividing by zero yields an
        // infinity or NaN, not an error.
        BinaryOp::Div => arithmetic(lhs, rhs, "divide", |a, b| a / b),
        BinaryOp::Mod => arithmetic(lhs, rhs, "take the remainder of", |a, b| a % b),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, lhs, rhs),
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
        // And/Or short-circuit in the evaluator and never reach here.
        BinaryOp::And | BinaryOp::Or => Err(ScriptError::runtime("malformed logical expression")),
    }
}

fn arithmetic(
    lhs: &Value,
    rhs: &Value,
    verb: &str,
    apply: impl Fn(f64, f64) -> f64,
) -> Result<Value, ScriptError> {
    match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => Ok(Value::Number(apply(a, b))),
        _ => Err(ScriptError::runtime(format!(
            "cannot {verb} {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    let result = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        },
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Le => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        },
        _ => {
            return Err(ScriptError::runtime(format!(
                "cannot compare {} with {}",
                lhs.type_name(),
                rhs.type_name()
            )))
        }
    };
    Ok(Value::Bool(result))
}

fn to_index(value: &Value) -> Result<usize, ScriptError> {
    match value.as_number() {
        Some(n) if n.fract() == 0.0 && n >= 0.0 && n.is_finite() => Ok(n as usize),
        _ => Err(ScriptError::runtime(format!(
            "array index must be a non-negative integer, got {value}"
        ))),
    }
}

fn math_constant(field: &str) -> Result<Value, ScriptError> {
    match field {
        "PI" => Ok(Value::Number(std::f64::consts::PI)),
        _ => Err(ScriptError::UnknownIdentifier {
            name: format!("Math.{field}"),
        }),
    }
}

fn math_call(name: &str, args: &[Value]) -> Result<Value, ScriptError> {
    fn number(name: &str, args: &[Value], idx: usize) -> Result<f64, ScriptError> {
        args.get(idx).and_then(Value::as_number).ok_or_else(|| {
            ScriptError::argument(
                format!("Math.{name}"),
                format!("expected a number for argument {}", idx + 1),
            )
        })
    }

    fn expect_arity(name: &str, args: &[Value], expected: usize) -> Result<(), ScriptError> {
        if args.len() != expected {
            return Err(ScriptError::argument(
                format!("Math.{name}"),
                format!("expected {expected} argument(s), got {}", args.len()),
            ));
        }
        Ok(())
    }

    match name {
        "sin" | "cos" | "tan" | "sqrt" | "abs" | "floor" | "ceil" | "round" => {
            expect_arity(name, args, 1)?;
            let x = number(name, args, 0)?;
            let result = match name {
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "sqrt" => x.sqrt(),
                "abs" => x.abs(),
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                _ => x.round(),
            };
            Ok(Value::Number(result))
        }
        "pow" => {
            expect_arity(name, args, 2)?;
            Ok(Value::Number(number(name, args, 0)?.powf(number(name, args, 1)?)))
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(ScriptError::argument(
                    format!("Math.{name}"),
                    "expected at least one number",
                ));
            }
            let mut best = number(name, args, 0)?;
            for idx in 1..args.len() {
                let x = number(name, args, idx)?;
                best = if name == "min" { best.min(x) } else { best.max(x) };
            }
            Ok(Value::Number(best))
        }
        _ => Err(ScriptError::UnknownIdentifier {
            name: format!("Math.{name}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::parser;

    fn eval_with_config(source: &str, config: &EngineConfig) -> Result<Workspace, ScriptError> {
        let script = parser::parse(source)?;
        let registry = CommandRegistry::standard();
        let aliases = AliasTable::new(&[]);
        let mut workspace = Workspace::new(config);
        Evaluator::new(&registry, &aliases, &mut workspace, config).run(&script)?;
        Ok(workspace)
    }

    fn eval_source(source: &str) -> Result<Workspace, ScriptError> {
        eval_with_config(source, &EngineConfig::default())
    }

    fn logs(source: &str) -> Vec<String> {
        eval_source(source).unwrap().take_logs()
    }

    #[test]
    fn test_variables_and_arithmetic() {
        assert_eq!(logs("let a = 2; let b = a * 3 + 1; log(b);"), vec!["7"]);
    }

    #[test]
    fn test_if_else_branching() {
        assert_eq!(
            logs("let x = 5; if (x > 3) { log(\"big\"); } else { log(\"small\"); }"),
            vec!["big"]
        );
    }

    #[test]
    fn test_while_loop_with_break() {
        let source = "let i = 0; while (true) { i += 1; if (i >= 3) { break; } } log(i);";
        assert_eq!(logs(source), vec!["3"]);
    }

    #[test]
    fn test_for_loop_counts() {
        let source = "let total = 0; for (let i = 0; i < 4; i += 1) { total += i; } log(total);";
        assert_eq!(logs(source), vec!["6"]);
    }

    #[test]
    fn test_continue_still_runs_update() {
        let source = "let hits = 0;\n\
                      for (let i = 0; i < 5; i += 1) {\n\
                          if (i % 2 == 0) { continue; }\n\
                          hits += 1;\n\
                      }\n\
                      log(hits);";
        assert_eq!(logs(source), vec!["2"]);
    }

    #[test]
    fn test_step_budget_trips_on_infinite_loop() {
        let config = EngineConfig {
            max_steps: 50,
            ..EngineConfig::default()
        };
        let err = eval_with_config("while (true) {}", &config).unwrap_err();
        assert!(matches!(err, ScriptError::StepBudget { limit: 50 }));
    }

    #[test]
    fn test_undefined_identifier() {
        let err = eval_source("log(missing);").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownIdentifier { name } if name == "missing"));
    }

    #[test]
    fn test_unknown_command() {
        let err = eval_source("frobnicate(1);").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownCommand { name } if name == "frobnicate"));
    }

    #[test]
    fn test_math_namespace() {
        assert_eq!(
            logs("log(Math.max(1, 5, 3)); log(Math.floor(2.7)); log(Math.pow(2, 10));"),
            vec!["5", "2", "1024"]
        );
    }

    #[test]
    fn test_math_rejects_unlisted_members() {
        let err = eval_source("log(Math.random());").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownIdentifier { name } if name == "Math.random"));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(logs("log(\"r=\" + 2);"), vec!["r=2"]);
    }

    #[test]
    fn test_short_circuit_returns_operand_and_skips_rhs() {
        let ws = eval_source("let x = null || 5; log(x); let y = 0 && cube(); log(y);").unwrap();
        assert!(ws.roots().is_empty());
    }

    #[test]
    fn test_array_length_and_index() {
        assert_eq!(logs("let a = [10, 20, 30]; log(a.length); log(a[2]);"), vec!["3", "30"]);
    }

    #[test]
    fn test_indexed_assignment() {
        assert_eq!(logs("let a = [[1, 2], [3, 4]]; a[1][0] = 9; log(a[1][0]);"), vec!["9"]);
    }

    #[test]
    fn test_index_out_of_bounds() {
        let err = eval_source("let a = [1]; log(a[5]);").unwrap_err();
        assert!(err.to_string().contains("out of bounds"));
    }

    #[test]
    fn test_block_scoping() {
        assert_eq!(logs("let x = 1; { let x = 2; } log(x);"), vec!["1"]);
    }

    #[test]
    fn test_inner_block_can_reassign_outer() {
        assert_eq!(logs("let x = 1; { x = 2; } log(x);"), vec!["2"]);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(logs("log([1, 2] == [1, 2]); log(1 == \"1\");"), vec!["true", "false"]);
    }

    #[test]
    fn test_mutators_preserve_object_identity() {
        let source = "let a = cube(); let b = translate(a, [1, 0, 0]); log(a == b);";
        assert_eq!(logs(source), vec!["true"]);
    }

    #[test]
    fn test_break_outside_loop_is_an_error() {
        let err = eval_source("break;").unwrap_err();
        assert!(err.to_string().contains("outside of a loop"));
    }
}

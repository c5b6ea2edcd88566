// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! pest-backed parser for the native dialect
//!
//! Grammar lives in `cadscript.pest`; this module lowers the pair tree
//! into the [`ast`](super::ast) types. All failures are returned as
//! [`ScriptError::Parse`] with the position pest reports.

use super::ast::{AssignOp, AssignTarget, BinaryOp, Expr, Script, Stmt, UnaryOp};
use crate::error::ScriptError;
use pest::error::LineColLocation;
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "lang/cadscript.pest"]
struct CadParser;

/// Parse a source string into a script, rejecting empty input.
pub(crate) fn parse(source: &str) -> Result<Script, ScriptError> {
    let mut pairs = CadParser::parse(Rule::script, source).map_err(from_pest_error)?;
    let script = pairs
        .next()
        .ok_or_else(|| ScriptError::parse("malformed syntax tree"))?;
    let statements = build_stmts(script.into_inner())?;
    if statements.is_empty() {
        return Err(ScriptError::parse("script contains no statements"));
    }
    Ok(Script { statements })
}

fn from_pest_error(error: pest::error::Error<Rule>) -> ScriptError {
    let (line, column) = match error.line_col {
        LineColLocation::Pos((line, column)) => (line, column),
        LineColLocation::Span((line, column), _) => (line, column),
    };
    ScriptError::parse_at(error.variant.message().to_string(), line, Some(column))
}

fn unexpected(rule: Rule) -> ScriptError {
    ScriptError::parse(format!("unexpected syntax node {rule:?}"))
}

fn expect_pair<'a>(pairs: &mut Pairs<'a, Rule>) -> Result<Pair<'a, Rule>, ScriptError> {
    pairs
        .next()
        .ok_or_else(|| ScriptError::parse("malformed syntax tree"))
}

fn build_stmts(pairs: Pairs<Rule>) -> Result<Vec<Stmt>, ScriptError> {
    let mut statements = Vec::new();
    for pair in pairs {
        match pair.as_rule() {
            // Bare semicolons are no-ops and do not reach the AST.
            Rule::EOI | Rule::empty_stmt => {}
            _ => statements.push(build_stmt(pair)?),
        }
    }
    Ok(statements)
}

fn build_stmt(pair: Pair<Rule>) -> Result<Stmt, ScriptError> {
    match pair.as_rule() {
        Rule::let_stmt => build_let(expect_pair(&mut pair.into_inner())?),
        Rule::assign_stmt => build_assign(expect_pair(&mut pair.into_inner())?),
        Rule::if_stmt => build_if(pair),
        Rule::while_stmt => build_while(pair),
        Rule::for_stmt => build_for(pair),
        Rule::break_stmt => Ok(Stmt::Break),
        Rule::continue_stmt => Ok(Stmt::Continue),
        Rule::block => Ok(Stmt::Block(build_stmts(pair.into_inner())?)),
        Rule::expr_stmt => {
            let mut inner = pair.into_inner();
            Ok(Stmt::Expr(build_expr(expect_pair(&mut inner)?)?))
        }
        rule => Err(unexpected(rule)),
    }
}

fn build_let(head: Pair<Rule>) -> Result<Stmt, ScriptError> {
    let mut inner = head.into_inner();
    expect_pair(&mut inner)?; // declaration keyword
    let name = expect_pair(&mut inner)?.as_str().to_string();
    let value = build_expr(expect_pair(&mut inner)?)?;
    Ok(Stmt::Let { name, value })
}

fn build_assign(head: Pair<Rule>) -> Result<Stmt, ScriptError> {
    let mut inner = head.into_inner();
    let target = build_assign_target(expect_pair(&mut inner)?)?;
    let op = match expect_pair(&mut inner)?.as_str() {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Div,
        other => return Err(ScriptError::parse(format!("unknown assignment operator `{other}`"))),
    };
    let value = build_expr(expect_pair(&mut inner)?)?;
    Ok(Stmt::Assign { target, op, value })
}

fn build_assign_target(pair: Pair<Rule>) -> Result<AssignTarget, ScriptError> {
    let mut inner = pair.into_inner();
    let name = expect_pair(&mut inner)?.as_str().to_string();
    let mut indices = Vec::new();
    for suffix in inner {
        let mut index = suffix.into_inner();
        indices.push(build_expr(expect_pair(&mut index)?)?);
    }
    if indices.is_empty() {
        Ok(AssignTarget::Name(name))
    } else {
        Ok(AssignTarget::Index { name, indices })
    }
}

fn build_if(pair: Pair<Rule>) -> Result<Stmt, ScriptError> {
    let mut inner = pair.into_inner();
    expect_pair(&mut inner)?; // if keyword
    let condition = build_expr(expect_pair(&mut inner)?)?;
    let then_branch = build_stmts(expect_pair(&mut inner)?.into_inner())?;
    let else_branch = match inner.next() {
        None => Vec::new(),
        Some(_else_kw) => {
            let target = expect_pair(&mut inner)?;
            match target.as_rule() {
                // `else if` chains nest as a single-statement else branch.
                Rule::if_stmt => vec![build_stmt(target)?],
                Rule::block => build_stmts(target.into_inner())?,
                rule => return Err(unexpected(rule)),
            }
        }
    };
    Ok(Stmt::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn build_while(pair: Pair<Rule>) -> Result<Stmt, ScriptError> {
    let mut inner = pair.into_inner();
    expect_pair(&mut inner)?; // while keyword
    let condition = build_expr(expect_pair(&mut inner)?)?;
    let body = build_stmts(expect_pair(&mut inner)?.into_inner())?;
    Ok(Stmt::While { condition, body })
}

fn build_for(pair: Pair<Rule>) -> Result<Stmt, ScriptError> {
    let mut init = None;
    let mut condition = None;
    let mut update = None;
    let mut body = Vec::new();
    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::for_kw => {}
            Rule::for_init => {
                let head = expect_pair(&mut part.into_inner())?;
                let stmt = match head.as_rule() {
                    Rule::let_head => build_let(head)?,
                    Rule::assign_head => build_assign(head)?,
                    rule => return Err(unexpected(rule)),
                };
                init = Some(Box::new(stmt));
            }
            Rule::logic_or => condition = Some(build_expr(part)?),
            Rule::for_update => {
                let head = expect_pair(&mut part.into_inner())?;
                let stmt = match head.as_rule() {
                    Rule::assign_head => build_assign(head)?,
                    _ => Stmt::Expr(build_expr(head)?),
                };
                update = Some(Box::new(stmt));
            }
            Rule::block => body = build_stmts(part.into_inner())?,
            rule => return Err(unexpected(rule)),
        }
    }
    Ok(Stmt::For {
        init,
        condition,
        update,
        body,
    })
}

fn build_expr(pair: Pair<Rule>) -> Result<Expr, ScriptError> {
    match pair.as_rule() {
        Rule::logic_or
        | Rule::logic_and
        | Rule::equality
        | Rule::comparison
        | Rule::addition
        | Rule::multiplication => build_binary(pair),
        Rule::unary => build_unary(pair),
        Rule::postfix => build_postfix(pair),
        Rule::number => {
            let text = pair.as_str();
            let value = text
                .parse::<f64>()
                .map_err(|_| ScriptError::parse(format!("invalid number literal `{text}`")))?;
            Ok(Expr::Number(value))
        }
        Rule::string => {
            let raw = pair.as_str();
            Ok(Expr::Str(unescape(&raw[1..raw.len() - 1])))
        }
        Rule::true_lit => Ok(Expr::Bool(true)),
        Rule::false_lit => Ok(Expr::Bool(false)),
        Rule::null_lit => Ok(Expr::Null),
        Rule::array => {
            let items = pair
                .into_inner()
                .map(build_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Array(items))
        }
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),
        rule => Err(unexpected(rule)),
    }
}

/// Fold a left-associative binary chain: `a op b op c` becomes
/// `(a op b) op c`.
fn build_binary(pair: Pair<Rule>) -> Result<Expr, ScriptError> {
    let mut inner = pair.into_inner();
    let mut lhs = build_expr(expect_pair(&mut inner)?)?;
    while let Some(op) = inner.next() {
        let op = binary_op(op.as_str())?;
        let rhs = build_expr(expect_pair(&mut inner)?)?;
        lhs = Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }
    Ok(lhs)
}

fn binary_op(token: &str) -> Result<BinaryOp, ScriptError> {
    let op = match token {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Mod,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::Le,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::Ge,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "&&" => BinaryOp::And,
        "||" => BinaryOp::Or,
        other => return Err(ScriptError::parse(format!("unknown operator `{other}`"))),
    };
    Ok(op)
}

fn build_unary(pair: Pair<Rule>) -> Result<Expr, ScriptError> {
    let mut inner = pair.into_inner();
    let first = expect_pair(&mut inner)?;
    match first.as_rule() {
        Rule::neg_op => Ok(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(build_expr(expect_pair(&mut inner)?)?),
        }),
        Rule::not_op => Ok(Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(build_expr(expect_pair(&mut inner)?)?),
        }),
        _ => build_expr(first),
    }
}

fn build_postfix(pair: Pair<Rule>) -> Result<Expr, ScriptError> {
    let mut inner = pair.into_inner();
    let mut expr = build_expr(expect_pair(&mut inner)?)?;
    for op in inner {
        expr = match op.as_rule() {
            Rule::call_args => Expr::Call {
                callee: Box::new(expr),
                args: op
                    .into_inner()
                    .map(build_expr)
                    .collect::<Result<Vec<_>, _>>()?,
            },
            Rule::member => {
                let mut member = op.into_inner();
                Expr::Member {
                    object: Box::new(expr),
                    field: expect_pair(&mut member)?.as_str().to_string(),
                }
            }
            Rule::index_suffix => {
                let mut index = op.into_inner();
                Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(build_expr(expect_pair(&mut index)?)?),
                }
            }
            rule => return Err(unexpected(rule)),
        };
    }
    Ok(expr)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

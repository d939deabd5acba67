/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Expression lowering and operand type checks.

use super::*;
use crate::ast::{BinOp, ExprKind, UnaryOp};
use crate::program::StrLit;
use crate::units::parse_display_number;
use crate::value::WildcardPattern;

/// Recursively lowers an AST expression into an executable node, tracking
/// the operand kind for operator type checks.
pub(super) fn lower(
    expr: &Expr,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, ValueKind), CompileError> {
    match &expr.kind {
        ExprKind::Number { value, unit } => lower_number(*value, unit.as_deref(), &expr.span, ctx),
        ExprKind::Str { text, wildcard } => {
            // Wildcard-capable literals get their matcher compiled here, once.
            let pattern = wildcard.then(|| WildcardPattern::new(text));
            Ok((
                Node::Str(StrLit {
                    text: text.clone(),
                    pattern,
                }),
                ValueKind::Text,
            ))
        }
        ExprKind::VarRef { base, field } => {
            vars::lower_var(base, field.as_deref(), &expr.span, ctx)
        }
        ExprKind::Unary { op, expr: inner } => lower_unary(*op, inner, ctx),
        ExprKind::Binary { op, left, right } => lower_binary(*op, left, right, &expr.span, ctx),
        ExprKind::Call { name, args } => calls::lower_call(name, args, &expr.span, ctx),
    }
}

/// Applies the active unit resolver to a suffixed literal.
///
/// Conversion to the canonical internal scale happens here, at compile time;
/// runtime numbers carry no unit tag.
fn lower_number(
    value: f64,
    unit: Option<&str>,
    span: &SourceSpan,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, ValueKind), CompileError> {
    let value = match unit {
        None => value,
        Some(suffix) => match ctx.units.scale(suffix) {
            Some(scale) => value * scale,
            None => {
                let supported = ctx.units.supported_units();
                let message = if supported.is_empty() {
                    format!("Unsupported unit suffix '{suffix}': this host accepts plain numbers only")
                } else {
                    format!(
                        "Unsupported unit suffix '{suffix}'; supported units are {}",
                        supported.join(", ")
                    )
                };
                return Err(ctx.error_at(message, span));
            }
        },
    };
    Ok((Node::Number(value), ValueKind::Numeric))
}

fn lower_unary(
    op: UnaryOp,
    inner: &Expr,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, ValueKind), CompileError> {
    let (node, kind) = lower(inner, ctx)?;
    let node = match op {
        // `!` reads its operand as a condition, so any kind is acceptable.
        UnaryOp::Not => node,
        UnaryOp::Neg => require_numeric(node, kind, inner, "-", ctx)?,
    };
    Ok((
        Node::Unary {
            op,
            expr: Box::new(node),
        },
        ValueKind::Numeric,
    ))
}

fn lower_binary(
    op: BinOp,
    left_ast: &Expr,
    right_ast: &Expr,
    span: &SourceSpan,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, ValueKind), CompileError> {
    let (left, left_kind) = lower(left_ast, ctx)?;
    let (right, right_kind) = lower(right_ast, ctx)?;

    let (left, right) = if op.is_logical() {
        // `&&`/`||` read both sides as conditions; no operand check.
        (left, right)
    } else if op.is_equality() {
        check_equality(op, left, left_kind, left_ast, right, right_kind, right_ast, span, ctx)?
    } else {
        // Arithmetic and relational operators read both sides numerically.
        (
            require_numeric(left, left_kind, left_ast, op.symbol(), ctx)?,
            require_numeric(right, right_kind, right_ast, op.symbol(), ctx)?,
        )
    };

    Ok((
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        ValueKind::Numeric,
    ))
}

/// Checks `==`/`!=` operand pairing.
///
/// Same-kind and opaque pairings pass unchanged. A numeric/text mismatch is
/// permitted only when the text side is a string literal, which is then read
/// as a display quantity (`"4mm"`); any other mismatch is rejected.
#[allow(clippy::too_many_arguments)]
fn check_equality(
    op: BinOp,
    left: Node,
    left_kind: ValueKind,
    left_ast: &Expr,
    right: Node,
    right_kind: ValueKind,
    right_ast: &Expr,
    span: &SourceSpan,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, Node), CompileError> {
    if left_kind == right_kind
        || left_kind == ValueKind::Any
        || right_kind == ValueKind::Any
    {
        return Ok((left, right));
    }

    match (left_kind, right_kind) {
        (ValueKind::Numeric, ValueKind::Text) if is_str_literal(right_ast) => {
            Ok((left, coerce_quantity_literal(right_ast, ctx)?))
        }
        (ValueKind::Text, ValueKind::Numeric) if is_str_literal(left_ast) => {
            Ok((coerce_quantity_literal(left_ast, ctx)?, right))
        }
        _ => Err(ctx.error_at(
            format!(
                "Operator '{}' cannot compare {} and {} operands",
                op.symbol(),
                left_kind.name(),
                right_kind.name()
            ),
            span,
        )),
    }
}

/// Admits a node where a numeric operand is required.
///
/// String literals are admitted through the display-quantity fallback; any
/// other text operand is an error.
fn require_numeric(
    node: Node,
    kind: ValueKind,
    ast: &Expr,
    op_symbol: &str,
    ctx: &CompilerContext<'_>,
) -> Result<Node, CompileError> {
    match kind {
        ValueKind::Numeric | ValueKind::Any => Ok(node),
        ValueKind::Text if is_str_literal(ast) => coerce_quantity_literal(ast, ctx),
        ValueKind::Text => Err(ctx.error_at(
            format!("Operator '{op_symbol}' requires numeric operands, found {}", kind.name()),
            &ast.span,
        )),
    }
}

fn is_str_literal(expr: &Expr) -> bool {
    matches!(expr.kind, ExprKind::Str { .. })
}

/// Reads a string literal as a display quantity (`"4mm"`, `"0.2"`) for
/// comparison against a numeric field, warning through the sink.
fn coerce_quantity_literal(
    expr: &Expr,
    ctx: &CompilerContext<'_>,
) -> Result<Node, CompileError> {
    let ExprKind::Str { text, .. } = &expr.kind else {
        unreachable!("caller checked the literal kind");
    };
    match parse_display_number(text, ctx.units) {
        Some(value) => {
            ctx.warn_at(
                format!("String '{text}' compared against a numeric field; reading it as a quantity"),
                &expr.span,
            );
            Ok(Node::Number(value))
        }
        None => Err(ctx.error_at(
            format!("String '{text}' cannot be read as a quantity for numeric comparison"),
            &expr.span,
        )),
    }
}

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

//! Expression parser: precedence-climbing over the rule grammar.
//!
//! Precedence, loosest to tightest: `||`, `&&`, `== !=`, `< <= > >=`,
//! `+ -`, `* /`, unary `! -`. All binary levels are left-associative.

use crate::ast::{BinOp, Expr, ExprKind, SourceSpan, Span, UnaryOp};
use nom::Parser;
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    combinator::{map_res, opt},
    error::context,
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, preceded},
};

use super::PResult;
use super::utils::{identifier, is_unit_char, string_literal, ws0, ws_char, ws_tag};

/// Top-level expression parser.
pub(super) fn expr(input: Span<'_>) -> PResult<'_, Expr> {
    parse_or(input)
}

/// Builds one left-associative binary level from an operand parser and an
/// operator-token parser.
fn binary_level<'a>(
    input: Span<'a>,
    mut operand: impl FnMut(Span<'a>) -> PResult<'a, Expr>,
    mut operator: impl FnMut(Span<'a>) -> PResult<'a, Option<BinOp>>,
) -> PResult<'a, Expr> {
    let (mut input, mut left) = operand(input)?;
    loop {
        let (next, op) = operator(input)?;
        let Some(op) = op else {
            break;
        };

        // Left-associative fold: `a-b-c` becomes `(a-b)-c`.
        let (next, right) = operand(next)?;
        let span = left.span.merge(&right.span);
        left = Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        };
        input = next;
    }
    Ok((input, left))
}

/// Parses left-associative `||`.
fn parse_or(input: Span<'_>) -> PResult<'_, Expr> {
    binary_level(input, parse_and, |i| {
        opt(ws_tag("||")).parse(i).map(|(i, o)| (i, o.map(|_| BinOp::Or)))
    })
}

/// Parses left-associative `&&`.
fn parse_and(input: Span<'_>) -> PResult<'_, Expr> {
    binary_level(input, parse_equality, |i| {
        opt(ws_tag("&&")).parse(i).map(|(i, o)| (i, o.map(|_| BinOp::And)))
    })
}

/// Parses left-associative `==` / `!=`.
fn parse_equality(input: Span<'_>) -> PResult<'_, Expr> {
    binary_level(input, parse_relational, |i| {
        let (i, op) = opt(alt((ws_tag("=="), ws_tag("!=")))).parse(i)?;
        let op = op.map(|tok| match *tok.fragment() {
            "==" => BinOp::Eq,
            _ => BinOp::Ne,
        });
        Ok((i, op))
    })
}

/// Parses left-associative `<` / `<=` / `>` / `>=`.
fn parse_relational(input: Span<'_>) -> PResult<'_, Expr> {
    binary_level(input, parse_add_sub, |i| {
        // Two-character forms first so `<=` never parses as `<` then `=`.
        let (i, op) = opt(alt((
            ws_tag("<="),
            ws_tag(">="),
            ws_tag("<"),
            ws_tag(">"),
        )))
        .parse(i)?;
        let op = op.map(|tok| match *tok.fragment() {
            "<=" => BinOp::Le,
            ">=" => BinOp::Ge,
            "<" => BinOp::Lt,
            _ => BinOp::Gt,
        });
        Ok((i, op))
    })
}

/// Parses left-associative `+` / `-`.
fn parse_add_sub(input: Span<'_>) -> PResult<'_, Expr> {
    binary_level(input, parse_mul_div, |i| {
        let (i, op) = opt(alt((ws_char('+'), ws_char('-')))).parse(i)?;
        let op = op.map(|c| if c == '+' { BinOp::Add } else { BinOp::Sub });
        Ok((i, op))
    })
}

/// Parses left-associative `*` / `/`.
fn parse_mul_div(input: Span<'_>) -> PResult<'_, Expr> {
    binary_level(input, parse_unary, |i| {
        let (i, op) = opt(alt((ws_char('*'), ws_char('/')))).parse(i)?;
        let op = op.map(|c| if c == '*' { BinOp::Mul } else { BinOp::Div });
        Ok((i, op))
    })
}

/// Parses unary operators, recursively to support chains like `!!x`.
fn parse_unary(input: Span<'_>) -> PResult<'_, Expr> {
    let (after_ws, _) = ws0(input)?;
    let start = after_ws;
    for (token, op) in [('!', UnaryOp::Not), ('-', UnaryOp::Neg)] {
        if let Ok((rest, _)) = ws_char(token).parse(after_ws) {
            let (rest, inner) = parse_unary(rest)?;
            let span = SourceSpan::from_bounds(start, rest);
            return Ok((
                rest,
                Expr {
                    kind: ExprKind::Unary {
                        op,
                        expr: Box::new(inner),
                    },
                    span,
                },
            ));
        }
    }
    parse_primary(after_ws)
}

/// Parses expression atoms.
fn parse_primary(input: Span<'_>) -> PResult<'_, Expr> {
    alt((
        parse_parenthesized,
        parse_number,
        parse_string,
        parse_ident_expr,
    ))
    .parse(input)
}

/// Parses parenthesized expressions.
fn parse_parenthesized(input: Span<'_>) -> PResult<'_, Expr> {
    let start = input;
    let (input, inner) =
        delimited(ws_char('('), expr, context("')'", ws_char(')'))).parse(input)?;
    let mut inner = inner;
    // Preserve the outer range for diagnostics around parenthesized terms.
    inner.span = SourceSpan::from_bounds(start, input);
    Ok((input, inner))
}

/// Parses numeric literals with an optional trailing unit suffix.
///
/// The suffix is any run of letters glued to the number (`1.5mm`, `10mil`).
/// Whether it names a real unit is the compiler's concern; here it is just
/// part of the token.
fn parse_number(input: Span<'_>) -> PResult<'_, Expr> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, value) = map_res(recognize_float, |s: Span<'_>| {
        s.fragment().parse::<f64>()
    })
    .parse(input)?;
    let (input, suffix) = opt(take_while1(is_unit_char)).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    let (input, _) = ws0(input)?;

    let unit = suffix.map(|s: Span<'_>| s.fragment().to_string());
    Ok((
        input,
        Expr {
            kind: ExprKind::Number { value, unit },
            span,
        },
    ))
}

/// Parses string literals, flagging wildcard-capable ones.
fn parse_string(input: Span<'_>) -> PResult<'_, Expr> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, (text, wildcard)) = string_literal(input)?;
    let span = SourceSpan::from_bounds(start, input);
    let (input, _) = ws0(input)?;

    Ok((
        input,
        Expr {
            kind: ExprKind::Str { text, wildcard },
            span,
        },
    ))
}

/// Parses variable references and function calls.
///
/// `Ident . Ident` is one dotted reference; `Ident ( args )` is a call; a
/// bare `Ident` references the object itself. Whether the base name is valid
/// is decided at compile time, because validity depends on the field suffix.
fn parse_ident_expr(input: Span<'_>) -> PResult<'_, Expr> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, base) = identifier(input)?;

    let (input, field) = opt(preceded(ws_char('.'), take_while1(is_field_char))).parse(input)?;
    if let Some(field) = field {
        let span = SourceSpan::from_bounds(start, input);
        let (input, _) = ws0(input)?;
        return Ok((
            input,
            Expr {
                kind: ExprKind::VarRef {
                    base,
                    field: Some(field.fragment().to_string()),
                },
                span,
            },
        ));
    }

    let (input, args) = opt(delimited(
        ws_char('('),
        separated_list0(ws_char(','), expr),
        context("')'", ws_char(')')),
    ))
    .parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    let (input, _) = ws0(input)?;

    // A name followed by `(...)` is a call, otherwise a whole-object reference.
    let kind = match args {
        Some(args) => ExprKind::Call { name: base, args },
        None => ExprKind::VarRef { base, field: None },
    };
    Ok((input, Expr { kind, span }))
}

/// Returns whether a char can appear in a field name.
fn is_field_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

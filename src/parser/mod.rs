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

//! `nom` parser for rule expressions.
//!
//! The grammar is a single expression:
//! - numeric literals with optional unit suffix (`0.2mm`, `10mil`)
//! - string literals in single or double quotes, with `*`/`?` wildcards
//! - variable references (`A.NetClass`, `B.Width`, `L`, bare `A`)
//! - function calls (`min(A.Width, B.Width)`)
//! - unary `!` / `-`, binary `* /`, `+ -`, `< <= > >=`, `== !=`, `&&`, `||`

mod expr;
mod utils;

use crate::ast::{Expr, SourceSpan, Span};
use crate::diagnostics::{CompileError, ErrorKind};
use nom::{
    IResult,
    combinator::all_consuming,
    error::{VerboseError, VerboseErrorKind},
    sequence::delimited,
};

use self::utils::ws0;

type PResult<'a, O> = IResult<Span<'a>, O, VerboseError<Span<'a>>>;

/// Parses one rule expression into a spanned AST.
pub fn parse_expression(source: &str) -> Result<Expr, CompileError> {
    let input = Span::new(source);
    // `all_consuming` ensures trailing garbage is treated as a syntax error.
    match all_consuming(delimited(ws0, expr::expr, ws0))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(err) => Err(parse_error_to_compile_error(err, source)),
    }
}

/// Converts a `nom` verbose error to crate-level compile diagnostics.
fn parse_error_to_compile_error(
    err: nom::Err<VerboseError<Span<'_>>>,
    source: &str,
) -> CompileError {
    match err {
        nom::Err::Incomplete(_) => {
            CompileError::message_only(ErrorKind::Syntax, "Incomplete input")
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            // Use the deepest recorded parser error as the diagnostic anchor.
            if let Some((span, kind)) = e.errors.last() {
                let span = SourceSpan::from_bounds(*span, *span);
                let (error_kind, detail) = match kind {
                    VerboseErrorKind::Context("unterminated string") => {
                        (ErrorKind::Lex, "Unterminated string literal".to_string())
                    }
                    VerboseErrorKind::Context(ctx) => {
                        (ErrorKind::Syntax, format!("Syntax error: expected {ctx}"))
                    }
                    VerboseErrorKind::Char(c) => {
                        (ErrorKind::Syntax, format!("Syntax error: expected '{c}'"))
                    }
                    VerboseErrorKind::Nom(kind) => {
                        (ErrorKind::Syntax, format!("Syntax error near {kind:?}"))
                    }
                };
                CompileError::from_span(error_kind, detail, source, &span)
            } else {
                CompileError::message_only(ErrorKind::Syntax, "Syntax error")
            }
        }
    }
}

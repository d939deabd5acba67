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

//! Lowering from parsed AST into a resolved, executable program.
//!
//! The compiler walks the AST once: every variable reference binds to an
//! accessor, every call to its callable, every unit-suffixed literal folds
//! its conversion. Nothing is looked up by name after this pass. No
//! constants are folded; expressions are short and the program stays simple.

mod calls;
mod expr;
mod vars;

use crate::ast::{Expr, SourceSpan};
use crate::diagnostics::{CompileError, CompileWarning, ErrorKind};
use crate::funcs::FunctionRegistry;
use crate::program::Node;
use crate::props::PropertyRegistry;
use crate::units::UnitResolver;
use std::cell::RefCell;

/// Operand kind tracked during lowering, for operator type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueKind {
    /// Numbers, booleans, quantities.
    Numeric,
    /// Strings, enums, class and layer references.
    Text,
    /// Function results; checked at evaluation time only.
    Any,
}

impl ValueKind {
    fn name(self) -> &'static str {
        match self {
            ValueKind::Numeric => "numeric",
            ValueKind::Text => "text",
            ValueKind::Any => "opaque",
        }
    }
}

/// Compilation state for one expression.
pub(crate) struct CompilerContext<'c> {
    pub(crate) source: &'c str,
    pub(crate) props: &'c PropertyRegistry,
    pub(crate) funcs: &'c FunctionRegistry,
    pub(crate) units: &'c dyn UnitResolver,
    warnings: RefCell<Vec<CompileWarning>>,
}

impl<'c> CompilerContext<'c> {
    pub(crate) fn new(
        source: &'c str,
        props: &'c PropertyRegistry,
        funcs: &'c FunctionRegistry,
        units: &'c dyn UnitResolver,
    ) -> Self {
        Self {
            source,
            props,
            funcs,
            units,
            warnings: RefCell::new(Vec::new()),
        }
    }

    /// Creates a source-mapped compile error.
    pub(crate) fn error_at(&self, message: impl Into<String>, span: &SourceSpan) -> CompileError {
        CompileError::from_span(ErrorKind::Compile, message, self.source, span)
    }

    /// Records a non-fatal finding for the warning sink.
    pub(crate) fn warn_at(&self, message: impl Into<String>, span: &SourceSpan) {
        self.warnings
            .borrow_mut()
            .push(CompileWarning::at_span(message, span));
    }

    /// Drains accumulated warnings in source order.
    pub(crate) fn take_warnings(&self) -> Vec<CompileWarning> {
        std::mem::take(&mut self.warnings.borrow_mut())
    }
}

/// Lowers a parsed expression into an executable node tree.
pub(crate) fn compile_expression(
    expr: &Expr,
    ctx: &CompilerContext<'_>,
) -> Result<Node, CompileError> {
    let (node, _) = expr::lower(expr, ctx)?;
    Ok(node)
}

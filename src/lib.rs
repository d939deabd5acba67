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

//! Compiled rule-expression DSL for design-rule checking.
//!
//! This crate provides:
//! - A parser for boolean/numeric predicates over pairs of design objects
//!   (`A.NetClass == 'Power' && B.Type == 'via'`).
//! - Compile-time resolution of variables, functions, and unit suffixes, so
//!   no name lookup happens at evaluation time.
//! - Domain-aware comparison semantics: wildcards, net/component class
//!   constituent matching, layer-name groups, pin-type vocabularies, net
//!   identity by code.
//! - Total evaluation: absent objects and numeric edge cases degrade to null
//!   or NaN values, never errors.
//! - Rich compile diagnostics with line/column/caret output.
//!
//! # Pipeline
//!
//! 1. Parse rule text into AST with source spans.
//! 2. Lower into a [`Program`]: bind variables to accessors, calls to
//!    callables, convert unit-suffixed literals to canonical scale.
//! 3. Evaluate the program against per-pair [`Context`]s, many times.
//!
//! A [`Program`] is immutable and `Send + Sync`; the host caches it for the
//! life of a rule set and shares it across checker threads, each evaluating
//! with its own [`Context`].
//!
//! ```
//! use rules_dsl::{Context, LayerCache, PropertyRegistry, RuleEngine};
//!
//! let engine = RuleEngine::new(PropertyRegistry::new());
//! let program = engine.compile("1mm < 2mm && 'ABC' == 'A*'").unwrap();
//!
//! let layers = LayerCache::empty();
//! let ctx = Context::new(&layers);
//! assert!(program.run(&ctx).as_bool());
//! ```

mod ast;
mod board;
mod compiler;
mod context;
mod diagnostics;
mod funcs;
mod parser;
mod program;
mod props;
mod units;
mod value;

#[cfg(test)]
mod tests;

pub use ast::{BinOp, Expr, ExprKind, SourceSpan, UnaryOp};
pub use board::{BoardItem, EffectiveClass, LayerId, NetCode, TypeTag};
pub use context::{Context, LayerCache, LayerDef};
pub use diagnostics::{CompileError, CompileWarning, ErrorKind};
pub use funcs::{FunctionDef, FunctionRegistry};
pub use program::Program;
pub use props::{PrimitiveKind, PropValue, PropertyRegistry};
pub use units::{BoardUnits, NoUnits, UnitResolver};
pub use value::{StrRef, Value, WildcardPattern};

use compiler::{CompilerContext, compile_expression};
use tracing::debug;

/// Parses one rule expression into a spanned AST without compiling it.
///
/// Hosts use this for syntax-only validation while the user is typing;
/// field and function resolution needs a full [`RuleEngine::compile`].
pub fn parse_rule(source: &str) -> Result<Expr, CompileError> {
    parser::parse_expression(source)
}

/// Compilation front end: owns the property registry, function registry,
/// and unit resolver a host configures once, and turns rule text into
/// reusable [`Program`]s.
pub struct RuleEngine {
    props: PropertyRegistry,
    funcs: FunctionRegistry,
    units: Box<dyn UnitResolver>,
}

impl RuleEngine {
    /// Creates an engine over the host's property registry, with the numeric
    /// builtins registered and board units active.
    pub fn new(props: PropertyRegistry) -> Self {
        Self {
            props,
            funcs: FunctionRegistry::with_builtins(),
            units: Box::new(BoardUnits),
        }
    }

    /// Replaces the unit resolver.
    pub fn with_units(mut self, units: impl UnitResolver + 'static) -> Self {
        self.units = Box::new(units);
        self
    }

    /// Returns the property registry the engine resolves fields against.
    pub fn properties(&self) -> &PropertyRegistry {
        &self.props
    }

    /// Returns the function registry, for host-specific registrations.
    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.funcs
    }

    /// Compiles one rule expression, discarding warnings.
    pub fn compile(&self, source: &str) -> Result<Program, CompileError> {
        self.compile_with_warnings(source, &mut |_| {})
    }

    /// Compiles one rule expression, delivering non-fatal findings to `sink`.
    ///
    /// Warnings (deprecated field names, display-quantity fallbacks) never
    /// alter the compiled result and are delivered even when compilation
    /// subsequently fails.
    pub fn compile_with_warnings(
        &self,
        source: &str,
        sink: &mut dyn FnMut(CompileWarning),
    ) -> Result<Program, CompileError> {
        let expr = parser::parse_expression(source)?;
        let cctx = CompilerContext::new(source, &self.props, &self.funcs, self.units.as_ref());
        let result = compile_expression(&expr, &cctx);
        for warning in cctx.take_warnings() {
            sink(warning);
        }
        let root = result?;
        debug!(rule = source, "compiled rule expression");
        Ok(Program::new(root))
    }
}

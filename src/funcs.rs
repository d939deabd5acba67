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

//! Built-in and host-registered expression functions.
//!
//! Functions resolve at compile time by lowercase name; the compiled call
//! node holds the bound callable directly, so no table lookup happens at
//! evaluation time. Callables receive the evaluation context (for the
//! constraint-kind tag and bound objects) and their already-evaluated
//! arguments, and must be total: absent inputs produce a null value, never
//! an error.

use crate::context::Context;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

type RuleFn = dyn Fn(&Context<'_>, &[Value<'_>]) -> Value<'static> + Send + Sync;

/// A resolved expression function.
pub struct FunctionDef {
    name: String,
    signature: String,
    arity: Option<usize>,
    func: Box<RuleFn>,
}

impl FunctionDef {
    /// Returns the lowercase registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable signature shown in diagnostics.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Returns the fixed argument count, when the function declares one.
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub(crate) fn invoke<'a>(&self, ctx: &Context<'a>, args: &[Value<'a>]) -> Value<'static> {
        (self.func)(ctx, args)
    }
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Name-to-callable table consulted once per call site at compile time.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    funcs: HashMap<String, Arc<FunctionDef>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry preloaded with the numeric builtins.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("min", "min(a, b)", Some(2), |_ctx, args| {
            numeric_2(args, f64::min)
        });
        registry.register("max", "max(a, b)", Some(2), |_ctx, args| {
            numeric_2(args, f64::max)
        });
        registry.register("abs", "abs(x)", Some(1), |_ctx, args| {
            match args.first().and_then(Value::as_number) {
                Some(x) => Value::Number(x.abs()),
                None => Value::Null,
            }
        });
        registry
    }

    /// Registers a function under a case-insensitive name.
    ///
    /// `arity` of `None` accepts any argument count; re-registering a name
    /// replaces the previous definition.
    pub fn register(
        &mut self,
        name: &str,
        signature: &str,
        arity: Option<usize>,
        func: impl Fn(&Context<'_>, &[Value<'_>]) -> Value<'static> + Send + Sync + 'static,
    ) {
        let name = name.to_lowercase();
        self.funcs.insert(
            name.clone(),
            Arc::new(FunctionDef {
                name,
                signature: signature.to_string(),
                arity,
                func: Box::new(func),
            }),
        );
    }

    /// Looks a function up by its spelling in rule text.
    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<FunctionDef>> {
        self.funcs.get(&name.to_lowercase()).cloned()
    }

    /// Returns every known signature, sorted, for unknown-function errors.
    pub(crate) fn signature_list(&self) -> String {
        let mut signatures: Vec<&str> = self
            .funcs
            .values()
            .map(|def| def.signature.as_str())
            .collect();
        signatures.sort_unstable();
        signatures.join(", ")
    }
}

fn numeric_2(args: &[Value<'_>], op: fn(f64, f64) -> f64) -> Value<'static> {
    match (
        args.first().and_then(Value::as_number),
        args.get(1).and_then(Value::as_number),
    ) {
        (Some(a), Some(b)) => Value::Number(op(a, b)),
        _ => Value::Null,
    }
}

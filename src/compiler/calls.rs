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

//! Call-site resolution against the function registry.

use super::*;

pub(super) fn lower_call(
    name: &str,
    args: &[Expr],
    span: &SourceSpan,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, ValueKind), CompileError> {
    let Some(func) = ctx.funcs.lookup(name) else {
        let known = ctx.funcs.signature_list();
        let message = if known.is_empty() {
            format!("Unknown function '{name}': no functions are registered")
        } else {
            format!("Unknown function '{name}'; known functions: {known}")
        };
        return Err(ctx.error_at(message, span));
    };

    if let Some(arity) = func.arity() {
        if args.len() != arity {
            return Err(ctx.error_at(
                format!(
                    "Function '{}' expects {arity} arguments, found {}",
                    func.signature(),
                    args.len()
                ),
                span,
            ));
        }
    }

    let mut lowered = Vec::with_capacity(args.len());
    for arg in args {
        let (node, _) = expr::lower(arg, ctx)?;
        lowered.push(node);
    }

    // Function results are opaque to the type checker; comparisons involving
    // them are resolved by the runtime dispatch.
    Ok((
        Node::Call {
            func,
            args: lowered,
        },
        ValueKind::Any,
    ))
}

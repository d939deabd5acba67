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

//! Variable-reference resolution.
//!
//! The base identifier maps to an object slot; the field suffix binds either
//! a hard-wired specialized accessor or a set of reflective accessors, one
//! per concrete type the field exists on. After this pass no name lookup
//! happens again.

use super::*;
use crate::context::Slot;
use crate::program::VarAccess;

pub(super) fn lower_var(
    base: &str,
    field: Option<&str>,
    span: &SourceSpan,
    ctx: &CompilerContext<'_>,
) -> Result<(Node, ValueKind), CompileError> {
    if base.eq_ignore_ascii_case("L") {
        // The layer pseudo-slot is a value by itself, not an object.
        if let Some(field) = field {
            return Err(ctx.error_at(
                format!("The layer reference 'L' takes no field (found '.{field}')"),
                span,
            ));
        }
        return Ok((Node::Var(VarAccess::Layer), ValueKind::Text));
    }

    let slot = if base.eq_ignore_ascii_case("A") || base.eq_ignore_ascii_case("AB") {
        Slot::A
    } else if base.eq_ignore_ascii_case("B") {
        Slot::B
    } else {
        return Err(ctx.error_at(
            format!("Unknown variable '{base}': rule expressions reference 'A', 'B', 'AB' or 'L'"),
            span,
        ));
    };

    let Some(field) = field else {
        // A bare object reference compares by type name (`A == 'via'`).
        return Ok((Node::Var(VarAccess::TypeName(slot)), ValueKind::Text));
    };

    // Four field names bind specialized accessors bypassing reflection: they
    // carry their own comparison semantics and sit on the hot path.
    if field.eq_ignore_ascii_case("Type") {
        return Ok((Node::Var(VarAccess::TypeName(slot)), ValueKind::Text));
    }
    if field.eq_ignore_ascii_case("NetClass") {
        return Ok((Node::Var(VarAccess::NetClass(slot)), ValueKind::Text));
    }
    if field.eq_ignore_ascii_case("ComponentClass") {
        return Ok((Node::Var(VarAccess::ComponentClass(slot)), ValueKind::Text));
    }
    if field.eq_ignore_ascii_case("NetName") {
        return Ok((Node::Var(VarAccess::NetName(slot)), ValueKind::Text));
    }

    let matches = ctx.props.resolve(field);
    if matches.is_empty() {
        return Err(ctx.error_at(
            format!("Unknown field '{field}': no registered item type has this property"),
            span,
        ));
    }

    // The same field name may exist on several unrelated types, but it must
    // read consistently: numeric on one type and text on another would make
    // operator type checks meaningless.
    let numeric = matches[0].def.kind.is_numeric();
    if let Some(conflict) = matches.iter().find(|m| m.def.kind.is_numeric() != numeric) {
        let first = type_label(ctx, matches[0].tag);
        let second = type_label(ctx, conflict.tag);
        let (first_kind, second_kind) = if numeric {
            ("numeric", "text")
        } else {
            ("text", "numeric")
        };
        return Err(ctx.error_at(
            format!(
                "Field '{field}' resolves inconsistently: {first_kind} on {first}, {second_kind} on {second}"
            ),
            span,
        ));
    }

    if let Some(canonical) = matches.iter().find_map(|m| m.via_alias.as_deref()) {
        ctx.warn_at(
            format!("Field '{field}' is deprecated; use '{canonical}'"),
            span,
        );
    }

    let accessors = matches.into_iter().map(|m| (m.tag, m.def)).collect();
    let kind = if numeric {
        ValueKind::Numeric
    } else {
        ValueKind::Text
    };
    Ok((Node::Var(VarAccess::Property { slot, accessors }), kind))
}

fn type_label(ctx: &CompilerContext<'_>, tag: crate::board::TypeTag) -> String {
    ctx.props
        .type_name(tag)
        .unwrap_or("unnamed type")
        .to_string()
}

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

//! Compiled programs and the tree-walk runtime.
//!
//! A [`Program`] is the immutable result of compiling one expression string:
//! every variable is bound to an accessor, every function to its callable,
//! every unit-suffixed literal already converted. It is safe to share across
//! threads and run concurrently, each call with its own [`Context`].
//!
//! Evaluation is total. Absent objects, absent fields, and numeric edge
//! cases degrade to null or NaN values; a constraint checker invoking a
//! program millions of times never sees an error path.

use crate::ast::{BinOp, UnaryOp};
use crate::board::TypeTag;
use crate::context::{Context, Slot};
use crate::funcs::FunctionDef;
use crate::props::{PrimitiveKind, PropValue, PropertyDef};
use crate::value::{StrRef, Value, WildcardPattern};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

/// String literal with its precompiled wildcard matcher, if any.
#[derive(Debug)]
pub(crate) struct StrLit {
    pub(crate) text: String,
    pub(crate) pattern: Option<WildcardPattern>,
}

impl StrLit {
    fn value(&self) -> Value<'_> {
        Value::Str(StrRef {
            text: Cow::Borrowed(&self.text),
            pattern: self.pattern.as_ref(),
        })
    }
}

/// Compile-time-bound variable accessor.
///
/// The four specialized kinds bypass reflection entirely; `Property` carries
/// one resolved accessor per concrete type the field exists on, dispatched
/// by type tag at evaluation time.
#[derive(Debug)]
pub(crate) enum VarAccess {
    /// The context's active layer (`L`).
    Layer,
    /// The object's type name (`A.Type`, bare `A`).
    TypeName(Slot),
    /// The object's effective net class (`A.NetClass`).
    NetClass(Slot),
    /// The object's effective component class (`A.ComponentClass`).
    ComponentClass(Slot),
    /// The object's net identity (`A.NetName`).
    NetName(Slot),
    /// A reflected field, one accessor per matching concrete type.
    Property {
        slot: Slot,
        accessors: Vec<(TypeTag, Arc<PropertyDef>)>,
    },
}

impl VarAccess {
    /// Reads the referenced value out of the context.
    ///
    /// An unbound slot, a type with no accessor for the field, or an unset
    /// optional field all produce a null value rather than an error.
    fn read<'e>(&'e self, ctx: &Context<'e>) -> Value<'e> {
        match self {
            VarAccess::Layer => match ctx.layer {
                Some(id) => Value::Layer {
                    id,
                    cache: ctx.layers,
                },
                None => Value::Null,
            },
            VarAccess::TypeName(slot) => match ctx.slot(*slot) {
                Some(item) => Value::string(item.type_name().to_string()),
                None => Value::Null,
            },
            VarAccess::NetClass(slot) => match ctx.slot(*slot) {
                Some(item) => Value::NetClass(item),
                None => Value::Null,
            },
            VarAccess::ComponentClass(slot) => match ctx.slot(*slot) {
                Some(item) => Value::ComponentClass(item),
                None => Value::Null,
            },
            VarAccess::NetName(slot) => match ctx.slot(*slot) {
                Some(item) => Value::NetName(item),
                None => Value::Null,
            },
            VarAccess::Property { slot, accessors } => {
                let Some(item) = ctx.slot(*slot) else {
                    return Value::Null;
                };
                let tag = item.type_tag();
                let Some((_, def)) = accessors.iter().find(|(t, _)| *t == tag) else {
                    return Value::Null;
                };
                prop_to_value(def.kind, def.read(item))
            }
        }
    }
}

/// Converts a getter payload into a runtime value per the field's kind.
fn prop_to_value(kind: PrimitiveKind, prop: PropValue) -> Value<'static> {
    match prop {
        PropValue::Null => Value::Null,
        PropValue::Bool(b) => Value::from_bool(b),
        PropValue::Int(i) => Value::Number(i as f64),
        PropValue::Double(d) => Value::Number(d),
        PropValue::Str(s) => match kind {
            PrimitiveKind::PinType => Value::PinType(Cow::Owned(s)),
            _ => Value::string(s),
        },
    }
}

/// One resolved node of a compiled program.
#[derive(Debug)]
pub(crate) enum Node {
    Number(f64),
    Str(StrLit),
    Var(VarAccess),
    Unary {
        op: UnaryOp,
        expr: Box<Node>,
    },
    Binary {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Call {
        func: Arc<FunctionDef>,
        args: Vec<Node>,
    },
}

/// The compiled, immutable, shareable result of compiling one expression.
///
/// Created once per distinct expression string and cached by the host for
/// the life of a rule set; repeated `run` calls against the same context are
/// pure and return equal values.
#[derive(Debug)]
pub struct Program {
    root: Node,
}

impl Program {
    pub(crate) fn new(root: Node) -> Self {
        Self { root }
    }

    /// Evaluates the program against one context.
    pub fn run<'e>(&'e self, ctx: &Context<'e>) -> Value<'e> {
        eval(&self.root, ctx)
    }
}

fn eval<'e>(node: &'e Node, ctx: &Context<'e>) -> Value<'e> {
    match node {
        Node::Number(n) => Value::Number(*n),
        Node::Str(lit) => lit.value(),
        Node::Var(access) => access.read(ctx),
        Node::Unary { op, expr } => match op {
            UnaryOp::Not => Value::from_bool(!eval(expr, ctx).as_bool()),
            UnaryOp::Neg => match eval(expr, ctx).as_number() {
                Some(n) => Value::Number(-n),
                None => Value::Null,
            },
        },
        Node::Binary { op, left, right } => match op {
            // Short-circuit: the right operand is not evaluated when the
            // left already determines the result.
            BinOp::And => {
                if !eval(left, ctx).as_bool() {
                    Value::from_bool(false)
                } else {
                    Value::from_bool(eval(right, ctx).as_bool())
                }
            }
            BinOp::Or => {
                if eval(left, ctx).as_bool() {
                    Value::from_bool(true)
                } else {
                    Value::from_bool(eval(right, ctx).as_bool())
                }
            }
            BinOp::Eq => Value::from_bool(eval(left, ctx).eq_value(&eval(right, ctx))),
            BinOp::Ne => Value::from_bool(!eval(left, ctx).eq_value(&eval(right, ctx))),
            BinOp::Lt => relational(left, right, ctx, |ord| ord == Ordering::Less),
            BinOp::Le => relational(left, right, ctx, |ord| ord != Ordering::Greater),
            BinOp::Gt => relational(left, right, ctx, |ord| ord == Ordering::Greater),
            BinOp::Ge => relational(left, right, ctx, |ord| ord != Ordering::Less),
            BinOp::Add => arithmetic(left, right, ctx, |a, b| a + b),
            BinOp::Sub => arithmetic(left, right, ctx, |a, b| a - b),
            BinOp::Mul => arithmetic(left, right, ctx, |a, b| a * b),
            // IEEE754 semantics: x/0 is infinity, 0/0 is NaN, never an error.
            BinOp::Div => arithmetic(left, right, ctx, |a, b| a / b),
        },
        Node::Call { func, args } => {
            let args: Vec<Value<'e>> = args.iter().map(|arg| eval(arg, ctx)).collect();
            func.invoke(ctx, &args)
        }
    }
}

/// Relational comparison; incomparable operands (null, NaN) are false.
fn relational<'e>(
    left: &'e Node,
    right: &'e Node,
    ctx: &Context<'e>,
    accept: fn(Ordering) -> bool,
) -> Value<'e> {
    let left = eval(left, ctx);
    let right = eval(right, ctx);
    Value::from_bool(left.cmp_value(&right).is_some_and(accept))
}

/// Arithmetic over numeric readings; a null operand yields a null result.
fn arithmetic<'e>(
    left: &'e Node,
    right: &'e Node,
    ctx: &Context<'e>,
    op: fn(f64, f64) -> f64,
) -> Value<'e> {
    let left = eval(left, ctx);
    let right = eval(right, ctx);
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Value::Number(op(a, b)),
        _ => Value::Null,
    }
}

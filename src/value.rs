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

//! Runtime values and domain-specific comparison semantics.
//!
//! A value is a closed tagged union: plain null/numeric/text variants plus
//! specialized variants bound to live board objects. Specialized variants
//! hold non-owning references whose lifetime is bounded by the enclosing
//! [`crate::Context`], and recompute their display form on demand from the
//! bound object. Comparison is a single exhaustive dispatch over both
//! operands, with specialized arms for net class, component class, layer,
//! net name, and pin type.

use crate::board::{BoardItem, EffectiveClass, LayerId};
use crate::context::LayerCache;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Compiled glob pattern (`*` = any run, `?` = any single character).
///
/// Built once at compile time from a wildcard-capable string literal and
/// reused for every evaluation; matching is case-insensitive and anchored.
#[derive(Debug)]
pub struct WildcardPattern {
    regex: Regex,
}

impl WildcardPattern {
    /// Translates a glob into an anchored case-insensitive matcher.
    pub fn new(raw: &str) -> Self {
        let mut translated = String::with_capacity(raw.len() + 8);
        translated.push('^');
        for ch in raw.chars() {
            match ch {
                '*' => translated.push_str(".*"),
                '?' => translated.push('.'),
                ch => {
                    let mut buf = [0u8; 4];
                    translated.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
                }
            }
        }
        translated.push('$');
        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .build()
            .expect("escaped glob always translates to a valid regex");
        Self { regex }
    }

    /// Returns whether a string contains wildcard metacharacters.
    pub fn is_wildcard(text: &str) -> bool {
        text.contains(['*', '?'])
    }

    /// Tests a candidate against the glob.
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

/// Text payload with an optional precompiled wildcard matcher.
#[derive(Debug, Clone)]
pub struct StrRef<'a> {
    /// The text itself.
    pub text: Cow<'a, str>,
    /// Matcher compiled from a wildcard-capable literal, if any.
    pub pattern: Option<&'a WildcardPattern>,
}

impl<'a> StrRef<'a> {
    pub(crate) fn plain(text: impl Into<Cow<'a, str>>) -> Self {
        Self {
            text: text.into(),
            pattern: None,
        }
    }
}

/// Runtime value produced by evaluating a rule expression.
///
/// Plain variants own or borrow their payload; specialized variants borrow
/// the live domain object they were read from and never outlive the
/// evaluation's `Context` unless the caller keeps them deliberately.
#[derive(Debug, Clone)]
pub enum Value<'a> {
    /// Absent object, unset field, or failed lookup.
    Null,
    /// Numeric payload; booleans are numeric 0/1.
    Number(f64),
    /// Text payload.
    Str(StrRef<'a>),
    /// Active-layer value; equality tests membership in a named layer group.
    Layer {
        /// Layer under test.
        id: LayerId,
        /// Board cache used for name-group resolution and display.
        cache: &'a LayerCache,
    },
    /// Net-class value bound to a connected item.
    NetClass(&'a dyn BoardItem),
    /// Component-class value bound to an item.
    ComponentClass(&'a dyn BoardItem),
    /// Net identity value bound to a connected item.
    NetName(&'a dyn BoardItem),
    /// Pin-type token with two-vocabulary alias matching.
    PinType(Cow<'a, str>),
}

impl<'a> Value<'a> {
    /// Creates a plain text value.
    pub fn string(text: impl Into<Cow<'a, str>>) -> Self {
        Value::Str(StrRef::plain(text))
    }

    /// Creates a numeric value from a boolean.
    pub fn from_bool(value: bool) -> Self {
        Value::Number(if value { 1.0 } else { 0.0 })
    }

    /// Interprets the value as a condition result.
    ///
    /// Null is false; numbers are true when nonzero and not NaN; text is
    /// true when non-empty; bound values are true when their object carries
    /// the referenced attribute.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.text.is_empty(),
            Value::Layer { .. } => true,
            Value::NetClass(item) => item.effective_net_class().is_some(),
            Value::ComponentClass(item) => item.effective_component_class().is_some(),
            Value::NetName(item) => item.net_code().is_some(),
            Value::PinType(text) => !text.is_empty(),
        }
    }

    /// Interprets the value numerically, when it has a numeric reading.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Str(s) => s.text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the display form of the value.
    ///
    /// Specialized values materialize their string form here and only here;
    /// comparisons never go through this path when an identity comparison is
    /// available.
    pub fn as_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.text.to_string(),
            Value::Layer { id, cache } => cache.canonical_name(*id).unwrap_or_default(),
            Value::NetClass(item) => item
                .effective_net_class()
                .map(|class| class.name().to_string())
                .unwrap_or_default(),
            Value::ComponentClass(item) => item
                .effective_component_class()
                .map(|class| class.name().to_string())
                .unwrap_or_default(),
            Value::NetName(item) => item.net_name().unwrap_or_default(),
            Value::PinType(text) => text.to_string(),
        }
    }

    /// Type-aware equality with wildcard and domain-specific overrides.
    pub fn eq_value(&self, other: &Value<'_>) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Null, _) | (_, Null) => false,

            (Number(a), Number(b)) => a == b,
            // Mixed numeric/text reaches the runtime only through opaque
            // function results; read the text numerically.
            (Number(a), text @ Str(_)) | (text @ Str(_), Number(a)) => {
                text.as_number().is_some_and(|b| a == &b)
            }

            (Str(a), Str(b)) => str_eq(a, b),

            (Layer { id, cache }, Str(s)) | (Str(s), Layer { id, cache }) => {
                cache.resolve(&s.text, s.pattern).contains(id)
            }
            (Layer { id: a, .. }, Layer { id: b, .. }) => a == b,

            (NetClass(a), NetClass(b)) => {
                match (a.effective_net_class(), b.effective_net_class()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (NetClass(item), Str(s)) | (Str(s), NetClass(item)) => item
                .effective_net_class()
                .is_some_and(|class| class_matches(&class, s)),

            (ComponentClass(a), ComponentClass(b)) => {
                match (
                    a.effective_component_class(),
                    b.effective_component_class(),
                ) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (ComponentClass(item), Str(s)) | (Str(s), ComponentClass(item)) => item
                .effective_component_class()
                .is_some_and(|class| class_matches(&class, s)),

            // Net identity compares by code; the display string is never
            // consulted between two bound nets.
            (NetName(a), NetName(b)) => match (a.net_code(), b.net_code()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            (NetName(item), Str(s)) | (Str(s), NetName(item)) => item
                .net_name()
                .is_some_and(|name| str_text_eq(&name, s)),

            (PinType(a), PinType(b)) => pin_type_eq(a, b, None),
            (PinType(text), Str(s)) | (Str(s), PinType(text)) => {
                pin_type_eq(text, &s.text, s.pattern)
            }

            _ => false,
        }
    }

    /// Numeric ordering; `None` when either side has no numeric reading or
    /// is NaN, in which case every relational operator is false.
    pub fn cmp_value(&self, other: &Value<'_>) -> Option<Ordering> {
        let a = self.as_number()?;
        let b = other.as_number()?;
        a.partial_cmp(&b)
    }
}

/// Formats a number the way hosts display plain quantities.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Case-insensitive equality with an ASCII fast path.
fn eq_ci(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Text-vs-text equality honoring either side's wildcard pattern.
fn str_eq(a: &StrRef<'_>, b: &StrRef<'_>) -> bool {
    if let Some(pattern) = a.pattern {
        return pattern.matches(&b.text);
    }
    if let Some(pattern) = b.pattern {
        return pattern.matches(&a.text);
    }
    eq_ci(&a.text, &b.text)
}

/// Plain-text candidate against a possibly-wildcard text value.
fn str_text_eq(candidate: &str, s: &StrRef<'_>) -> bool {
    match s.pattern {
        Some(pattern) => pattern.matches(candidate),
        None => eq_ci(candidate, &s.text),
    }
}

/// Two-tier class comparison: the query matches the full composite name, or
/// any one constituent class exactly or by wildcard. A rule written against
/// a single class name still matches items whose effective class is a union.
fn class_matches(class: &EffectiveClass, s: &StrRef<'_>) -> bool {
    if str_text_eq(class.name(), s) {
        return true;
    }
    class
        .constituents()
        .iter()
        .any(|constituent| str_text_eq(constituent, s))
}

/// Fixed translation between the two historical pin-type vocabularies:
/// internal tokens on the left, display strings on the right.
const PIN_TYPE_ALIASES: &[(&str, &str)] = &[
    ("input", "Input"),
    ("output", "Output"),
    ("bidirectional", "Bidirectional"),
    ("tri_state", "Tri-state"),
    ("passive", "Passive"),
    ("free", "Free"),
    ("unspecified", "Unspecified"),
    ("power_in", "Power input"),
    ("power_out", "Power output"),
    ("open_collector", "Open collector"),
    ("open_emitter", "Open emitter"),
    ("no_connect", "Unconnected"),
];

/// Maps a pin-type spelling from either vocabulary to its internal token.
fn normalize_pin_type(text: &str) -> Option<&'static str> {
    PIN_TYPE_ALIASES
        .iter()
        .find(|(token, display)| eq_ci(text, token) || eq_ci(text, display))
        .map(|(token, _)| *token)
}

/// Pin-type equality: alias-normalized match first, then case-insensitive or
/// wildcard text match against either vocabulary's spelling.
fn pin_type_eq(value: &str, query: &str, pattern: Option<&WildcardPattern>) -> bool {
    if let Some(pattern) = pattern {
        if pattern.matches(value) {
            return true;
        }
        // A glob written in the other vocabulary still matches: test the
        // value's translated spelling too.
        return PIN_TYPE_ALIASES
            .iter()
            .filter(|(token, display)| eq_ci(value, token) || eq_ci(value, display))
            .any(|(token, display)| pattern.matches(token) || pattern.matches(display));
    }

    match (normalize_pin_type(value), normalize_pin_type(query)) {
        (Some(a), Some(b)) => a == b,
        _ => eq_ci(value, query),
    }
}

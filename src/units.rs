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

//! Pluggable unit-suffix resolution for numeric literals.
//!
//! Literal suffixes (`1.5mm`, `10mil`) convert to the canonical internal
//! scale at compile time, never at evaluation time. Hosts swap the resolver:
//! a board editor measures in integer nanometers, a netlist tool may accept
//! no units at all.

/// Maps numeric-literal unit suffixes to a canonical internal scale.
pub trait UnitResolver: Send + Sync {
    /// Returns the accepted suffixes, for the unsupported-unit diagnostic.
    fn supported_units(&self) -> &[&'static str];

    /// Returns the multiplier from one suffixed unit to canonical scale, or
    /// `None` when the suffix is not recognized. Matching is
    /// case-insensitive.
    fn scale(&self, suffix: &str) -> Option<f64>;
}

/// Board-editor resolver: canonical scale is nanometers, angles in degrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoardUnits;

const BOARD_UNITS: &[&str] = &["mm", "um", "mil", "in", "deg"];

impl UnitResolver for BoardUnits {
    fn supported_units(&self) -> &[&'static str] {
        BOARD_UNITS
    }

    fn scale(&self, suffix: &str) -> Option<f64> {
        if suffix.eq_ignore_ascii_case("mm") {
            Some(1_000_000.0)
        } else if suffix.eq_ignore_ascii_case("um") {
            Some(1_000.0)
        } else if suffix.eq_ignore_ascii_case("mil") {
            Some(25_400.0)
        } else if suffix.eq_ignore_ascii_case("in") {
            Some(25_400_000.0)
        } else if suffix.eq_ignore_ascii_case("deg") {
            // Angles are already canonical in degrees.
            Some(1.0)
        } else {
            None
        }
    }
}

/// Resolver for unit-less hosts: every suffix is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUnits;

impl UnitResolver for NoUnits {
    fn supported_units(&self) -> &[&'static str] {
        &[]
    }

    fn scale(&self, _suffix: &str) -> Option<f64> {
        None
    }
}

/// Parses a number out of its display form (`"4mm"`, `" 0.2 "`, `"3"`).
///
/// Used by the compiler's fallback path when a string literal is compared
/// against a numeric field: the literal is read the way the field's value
/// would be displayed. Returns `None` when no leading number exists or the
/// trailing suffix is not accepted by `resolver`.
pub(crate) fn parse_display_number(text: &str, resolver: &dyn UnitResolver) -> Option<f64> {
    let text = text.trim();
    let numeric_end = text
        .char_indices()
        .take_while(|(i, c)| {
            c.is_ascii_digit()
                || *c == '.'
                || ((*c == '+' || *c == '-') && *i == 0)
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()?;

    let value: f64 = text[..numeric_end].parse().ok()?;
    let suffix = text[numeric_end..].trim();
    if suffix.is_empty() {
        return Some(value);
    }
    resolver.scale(suffix).map(|scale| value * scale)
}

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

//! Domain-object collaborator surface.
//!
//! The engine never owns board data. Hosts implement [`BoardItem`] on their
//! item types and hand the engine borrowed references through
//! [`crate::Context`]; these entry points are the only domain-specific calls
//! the runtime makes.

use std::any::Any;
use std::sync::Arc;

/// Discriminant for a concrete domain type (track, via, pad, zone, ...).
///
/// Tags are assigned by the host when registering types with the
/// [`crate::PropertyRegistry`]; compiled field accessors dispatch on them
/// without any string lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(pub u16);

/// Integer net identity assigned by the host's netlist.
///
/// Two items are on the same net iff their codes are equal; the display name
/// plays no part in comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetCode(pub i32);

/// Board layer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u16);

/// Resolved, possibly-composite classification of an item.
///
/// An effective class merges every rule that assigns the item a class, so it
/// may represent a union of several named classes. Identity is the full
/// constituent set, not the display name: a board-wide cache keys effective
/// classes by their constituents, and two unions with the same members are
/// the same class whatever order they were merged in.
#[derive(Debug, Clone)]
pub struct EffectiveClass {
    name: String,
    constituents: Vec<String>,
}

impl EffectiveClass {
    /// Creates an effective class from its constituent class names.
    ///
    /// The full name is the comma-joined constituent list, matching how hosts
    /// render composite classes.
    pub fn new(constituents: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let constituents: Vec<String> = constituents.into_iter().map(Into::into).collect();
        let name = constituents.join(",");
        Self { name, constituents }
    }

    /// Creates an effective class with an explicit display name.
    pub fn named(
        name: impl Into<String>,
        constituents: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            constituents: constituents.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the full (possibly composite) display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the individual class names making up this effective class.
    pub fn constituents(&self) -> &[String] {
        &self.constituents
    }
}

impl PartialEq for EffectiveClass {
    fn eq(&self, other: &Self) -> bool {
        // Constituent-set identity: order of merging is irrelevant.
        self.constituents.len() == other.constituents.len()
            && self
                .constituents
                .iter()
                .all(|c| other.constituents.iter().any(|o| o.eq_ignore_ascii_case(c)))
    }
}

impl Eq for EffectiveClass {}

/// A live domain object a rule expression can reference.
///
/// Implementations are read-only views; the engine never mutates items. All
/// methods except [`BoardItem::type_tag`] have absent defaults so hosts only
/// implement what their item kinds actually carry: a graphic line has no
/// net, a via has no component class.
pub trait BoardItem: std::fmt::Debug {
    /// Returns the concrete-type discriminant used for accessor dispatch.
    fn type_tag(&self) -> TypeTag;

    /// Returns the user-facing type name (`"via"`, `"track"`, ...).
    fn type_name(&self) -> &str;

    /// Upcast for property getters, which downcast to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the item's resolved net class, when connected.
    fn effective_net_class(&self) -> Option<Arc<EffectiveClass>> {
        None
    }

    /// Returns the owning component's resolved class, when any.
    fn effective_component_class(&self) -> Option<Arc<EffectiveClass>> {
        None
    }

    /// Returns the integer net identity, when connected.
    fn net_code(&self) -> Option<NetCode> {
        None
    }

    /// Returns the display form of the net name, when connected.
    fn net_name(&self) -> Option<String> {
        None
    }
}

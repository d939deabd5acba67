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

//! Reflective property registry bridging field names to typed accessors.
//!
//! The host registers every rule-visible domain type once, with a getter per
//! field. The compiler consults the registry a single time per variable
//! reference, recording an accessor for every type the field exists on;
//! after compilation no name lookup happens again. Getters are read-only;
//! rule expressions never mutate objects.

use crate::board::{BoardItem, TypeTag};
use std::collections::HashMap;
use std::sync::Arc;

/// Primitive kind a field's getter yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Boolean flag, surfaced as numeric 0/1.
    Bool,
    /// Integer quantity in canonical internal scale.
    Int,
    /// Floating quantity in canonical internal scale.
    Double,
    /// Free-form text.
    Str,
    /// Enumerated token compared as text.
    Enum,
    /// Pin-type token with two-vocabulary alias matching.
    PinType,
}

impl PrimitiveKind {
    /// Returns whether values of this kind compare numerically.
    pub(crate) fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Bool | PrimitiveKind::Int | PrimitiveKind::Double
        )
    }
}

/// Value produced by a property getter.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Field unset on this particular object (optional fields).
    Null,
    /// Boolean payload.
    Bool(bool),
    /// Integer payload.
    Int(i64),
    /// Floating payload.
    Double(f64),
    /// Text payload (also enum and pin-type tokens).
    Str(String),
}

type Getter = dyn Fn(&dyn BoardItem) -> PropValue + Send + Sync;

/// Resolved accessor for one field on one concrete type.
pub struct PropertyDef {
    pub(crate) kind: PrimitiveKind,
    pub(crate) optional: bool,
    getter: Box<Getter>,
}

impl PropertyDef {
    pub(crate) fn read(&self, item: &dyn BoardItem) -> PropValue {
        (self.getter)(item)
    }
}

impl std::fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDef")
            .field("kind", &self.kind)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct TypeEntry {
    tag: TypeTag,
    name: String,
    // Keys are lowercased field names; rule text is case-insensitive.
    props: HashMap<String, Arc<PropertyDef>>,
    // old lowercased name -> canonical registered name
    aliases: HashMap<String, String>,
}

/// One field match found during variable resolution.
pub(crate) struct ResolvedProperty {
    pub(crate) tag: TypeTag,
    pub(crate) def: Arc<PropertyDef>,
    /// `Some(canonical)` when the field was reached through a deprecated alias.
    pub(crate) via_alias: Option<String>,
}

/// Registry of rule-visible domain types and their fields.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    types: Vec<TypeEntry>,
}

impl PropertyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a domain type under its dispatch tag.
    ///
    /// Re-registering a tag replaces the previous entry.
    pub fn register_type(&mut self, tag: TypeTag, name: impl Into<String>) {
        let name = name.into();
        if let Some(entry) = self.types.iter_mut().find(|t| t.tag == tag) {
            entry.name = name;
            return;
        }
        self.types.push(TypeEntry {
            tag,
            name,
            props: HashMap::new(),
            aliases: HashMap::new(),
        });
    }

    /// Registers a required field on a previously registered type.
    pub fn register_property(
        &mut self,
        tag: TypeTag,
        name: &str,
        kind: PrimitiveKind,
        getter: impl Fn(&dyn BoardItem) -> PropValue + Send + Sync + 'static,
    ) {
        self.insert_property(tag, name, kind, false, Box::new(getter));
    }

    /// Registers a field whose value may be unset on some objects.
    ///
    /// The getter returns [`PropValue::Null`] for unset objects, and the
    /// reference degrades to a null value at evaluation time.
    pub fn register_optional_property(
        &mut self,
        tag: TypeTag,
        name: &str,
        kind: PrimitiveKind,
        getter: impl Fn(&dyn BoardItem) -> PropValue + Send + Sync + 'static,
    ) {
        self.insert_property(tag, name, kind, true, Box::new(getter));
    }

    /// Maps a retired field name to its replacement on one type.
    ///
    /// Rules written against the old name keep compiling, with a deprecation
    /// warning through the compile warning sink.
    pub fn register_deprecated_alias(&mut self, tag: TypeTag, old_name: &str, new_name: &str) {
        if let Some(entry) = self.types.iter_mut().find(|t| t.tag == tag) {
            entry
                .aliases
                .insert(old_name.to_lowercase(), new_name.to_string());
        }
    }

    fn insert_property(
        &mut self,
        tag: TypeTag,
        name: &str,
        kind: PrimitiveKind,
        optional: bool,
        getter: Box<Getter>,
    ) {
        let Some(entry) = self.types.iter_mut().find(|t| t.tag == tag) else {
            return;
        };
        entry.props.insert(
            name.to_lowercase(),
            Arc::new(PropertyDef {
                kind,
                optional,
                getter,
            }),
        );
    }

    /// Returns the registered display name for a tag, for diagnostics.
    pub fn type_name(&self, tag: TypeTag) -> Option<&str> {
        self.types
            .iter()
            .find(|t| t.tag == tag)
            .map(|t| t.name.as_str())
    }

    /// Resolves a field name against every registered type.
    ///
    /// Tries the direct name first, then each type's deprecated aliases. The
    /// compiler keeps every match because the same field name may be backed
    /// by a different accessor depending on the object's runtime type.
    pub(crate) fn resolve(&self, field: &str) -> Vec<ResolvedProperty> {
        let key = field.to_lowercase();
        let mut matches = Vec::new();
        for entry in &self.types {
            if let Some(def) = entry.props.get(&key) {
                matches.push(ResolvedProperty {
                    tag: entry.tag,
                    def: def.clone(),
                    via_alias: None,
                });
            } else if let Some(canonical) = entry.aliases.get(&key) {
                if let Some(def) = entry.props.get(&canonical.to_lowercase()) {
                    matches.push(ResolvedProperty {
                        tag: entry.tag,
                        def: def.clone(),
                        via_alias: Some(canonical.clone()),
                    });
                }
            }
        }
        matches
    }
}

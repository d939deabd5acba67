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

//! Per-evaluation context and the host-owned layer-name cache.
//!
//! A [`Context`] is supplied fresh by the caller for every `run` call and is
//! never retained by the engine. Caches live with the host (one per board),
//! not in module statics, so batch and test scenarios with several boards do
//! not share state.

use crate::board::{BoardItem, LayerId};
use crate::value::WildcardPattern;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Object slot an expression variable is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// First object (`A`, also the `AB` alias).
    A,
    /// Second object (`B`); may be unset in the context.
    B,
}

/// One board layer with its canonical and optional user-facing name.
#[derive(Debug, Clone)]
pub struct LayerDef {
    /// Layer identity.
    pub id: LayerId,
    /// Canonical name from the stackup enumeration (`"F.Cu"`).
    pub canonical: String,
    /// User rename, when the board renames the layer (`"Top"`).
    pub user: Option<String>,
}

impl LayerDef {
    /// Creates a layer definition with no user rename.
    pub fn new(id: LayerId, canonical: impl Into<String>) -> Self {
        Self {
            id,
            canonical: canonical.into(),
            user: None,
        }
    }

    /// Creates a layer definition carrying a user rename.
    pub fn renamed(
        id: LayerId,
        canonical: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            id,
            canonical: canonical.into(),
            user: Some(user.into()),
        }
    }
}

/// Set of layers a queried name resolves to.
pub(crate) type LayerSet = Vec<LayerId>;

/// Read-mostly memo of layer-name lookups, owned by the host per board.
///
/// `L == "name"` is evaluated per-rule-per-item, so resolving a name must
/// not re-scan the layer table each time. Lookups take the shared lock; the
/// rare rebuild path takes the exclusive lock. The host invalidates the
/// cache whenever the board's layer configuration changes.
#[derive(Debug, Default)]
pub struct LayerCache {
    defs: RwLock<Vec<LayerDef>>,
    lookups: RwLock<HashMap<String, Arc<LayerSet>>>,
}

impl LayerCache {
    /// Creates a cache over the board's layer table.
    pub fn new(defs: Vec<LayerDef>) -> Self {
        Self {
            defs: RwLock::new(defs),
            lookups: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a cache with no layers (layer comparisons all resolve false).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces the layer table and drops every memoized lookup.
    pub fn set_layers(&self, defs: Vec<LayerDef>) {
        let mut table = self.defs.write().unwrap_or_else(PoisonError::into_inner);
        *table = defs;
        drop(table);
        self.invalidate();
    }

    /// Drops memoized lookups without touching the layer table.
    pub fn invalidate(&self) {
        self.lookups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Resolves a queried name to the set of matching layers, memoized.
    ///
    /// Canonical names are tried first, then user renames; a wildcard-capable
    /// query matches either form by pattern.
    pub(crate) fn resolve(
        &self,
        name: &str,
        pattern: Option<&WildcardPattern>,
    ) -> Arc<LayerSet> {
        let key = name.to_lowercase();
        if let Some(hit) = self
            .lookups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        let mut set = LayerSet::new();
        {
            let defs = self.defs.read().unwrap_or_else(PoisonError::into_inner);
            for def in defs.iter() {
                if Self::name_matches(&def.canonical, name, pattern) {
                    set.push(def.id);
                    continue;
                }
                if let Some(user) = &def.user {
                    if Self::name_matches(user, name, pattern) {
                        set.push(def.id);
                    }
                }
            }
        }
        trace!(layer = name, matches = set.len(), "layer lookup memoized");

        let set = Arc::new(set);
        self.lookups
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, set.clone());
        set
    }

    /// Returns a layer's canonical name, for display conversion.
    pub(crate) fn canonical_name(&self, id: LayerId) -> Option<String> {
        self.defs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|def| def.id == id)
            .map(|def| def.canonical.clone())
    }

    fn name_matches(candidate: &str, query: &str, pattern: Option<&WildcardPattern>) -> bool {
        match pattern {
            Some(pattern) => pattern.matches(candidate),
            None => candidate.eq_ignore_ascii_case(query),
        }
    }
}

/// Per-evaluation input: up to two objects, the active layer, and the
/// constraint-kind tag of the rule set being checked.
///
/// Built fresh by the caller for each `run`; borrows never outlive the call
/// except through values the caller chooses to keep.
pub struct Context<'a> {
    pub(crate) a: Option<&'a dyn BoardItem>,
    pub(crate) b: Option<&'a dyn BoardItem>,
    pub(crate) layer: Option<LayerId>,
    pub(crate) constraint_kind: i32,
    pub(crate) layers: &'a LayerCache,
}

impl<'a> Context<'a> {
    /// Creates an empty context over the board's layer cache.
    pub fn new(layers: &'a LayerCache) -> Self {
        Self {
            a: None,
            b: None,
            layer: None,
            constraint_kind: 0,
            layers,
        }
    }

    /// Binds the first object slot.
    pub fn with_item_a(mut self, item: &'a dyn BoardItem) -> Self {
        self.a = Some(item);
        self
    }

    /// Binds the second object slot.
    pub fn with_item_b(mut self, item: &'a dyn BoardItem) -> Self {
        self.b = Some(item);
        self
    }

    /// Sets the active layer.
    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Sets the opaque constraint-kind tag.
    ///
    /// The engine never interprets the tag; host functions use it to
    /// disambiguate which rule set is being evaluated.
    pub fn with_constraint_kind(mut self, kind: i32) -> Self {
        self.constraint_kind = kind;
        self
    }

    /// Returns the first object, when bound.
    pub fn item_a(&self) -> Option<&'a dyn BoardItem> {
        self.a
    }

    /// Returns the second object, when bound.
    pub fn item_b(&self) -> Option<&'a dyn BoardItem> {
        self.b
    }

    /// Returns the active layer, when set.
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// Returns the constraint-kind tag.
    pub fn constraint_kind(&self) -> i32 {
        self.constraint_kind
    }

    /// Returns the board's layer cache.
    pub fn layers(&self) -> &'a LayerCache {
        self.layers
    }

    pub(crate) fn slot(&self, slot: Slot) -> Option<&'a dyn BoardItem> {
        match slot {
            Slot::A => self.a,
            Slot::B => self.b,
        }
    }
}

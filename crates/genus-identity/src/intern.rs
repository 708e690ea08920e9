// intern.rs
//
// String interning for identifiers and type names.

use std::hash::BuildHasher;

use crate::{PrimitiveType, Symbol};
use rustc_hash::FxBuildHasher;

/// Interns strings to unique Symbol IDs
#[derive(Debug, Clone)]
pub struct Interner {
    map: hashbrown::HashMap<String, Symbol, FxBuildHasher>,
    strings: Vec<String>,
}

impl Default for Interner {
    fn default() -> Self {
        Self {
            map: hashbrown::HashMap::with_hasher(FxBuildHasher),
            strings: Vec::new(),
        }
    }
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interner pre-seeded with every primitive type name, so that
    /// `lookup("int")` succeeds before any source is seen.
    pub fn with_primitives() -> Self {
        let mut interner = Self::new();
        for prim in PrimitiveType::ALL {
            interner.intern(prim.as_str());
        }
        interner
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        use hashbrown::hash_map::RawEntryMut;

        let hash = self.map.hasher().hash_one(s);
        match self.map.raw_entry_mut().from_hash(hash, |k| k == s) {
            RawEntryMut::Occupied(e) => *e.get(),
            RawEntryMut::Vacant(e) => {
                let sym = Symbol::new(self.strings.len() as u32);
                let owned = s.to_string();
                self.strings.push(owned.clone());
                e.insert_hashed_nocheck(hash, owned, sym);
                sym
            }
        }
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings
            .get(sym.index() as usize)
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("List");
        let b = interner.intern("List");
        let c = interner.intern("Map");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(c), "Map");
    }

    #[test]
    fn primitives_are_seeded() {
        let interner = Interner::with_primitives();
        assert!(interner.lookup("float32").is_some());
        assert!(interner.lookup("complex128").is_some());
        assert!(interner.lookup("List").is_none());
    }

    #[test]
    fn resolve_out_of_range_does_not_panic() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Symbol::new_for_test(42)), "<unknown>");
    }
}

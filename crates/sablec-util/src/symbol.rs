//! Interned strings.
//!
//! A [`Symbol`] is a `u32` handle into a global string table: equality and
//! hashing are integer operations, and `as_str` hands back a `&'static str`
//! because interned strings live for the whole compilation.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Handle to an interned string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Intern `string`, returning the canonical handle for it.
    pub fn intern(string: &str) -> Self {
        with_table(|table| table.intern(string))
    }

    /// The interned string. O(1); the reference is valid for the process
    /// lifetime.
    pub fn as_str(self) -> &'static str {
        with_table(|table| table.strings[self.0 as usize])
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct StringTable {
    strings: Vec<&'static str>,
    lookup: FxHashMap<&'static str, u32>,
}

impl StringTable {
    fn intern(&mut self, string: &str) -> Symbol {
        if let Some(&index) = self.lookup.get(string) {
            return Symbol(index);
        }
        let index = u32::try_from(self.strings.len()).expect("string table overflow");
        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        self.strings.push(leaked);
        self.lookup.insert(leaked, index);
        Symbol(index)
    }
}

fn with_table<R>(f: impl FnOnce(&mut StringTable) -> R) -> R {
    static TABLE: RwLock<Option<StringTable>> = RwLock::new(None);
    let mut guard = TABLE.write();
    let table = guard.get_or_insert_with(|| StringTable {
        strings: Vec::new(),
        lookup: FxHashMap::default(),
    });
    f(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let a = Symbol::intern("hello");
        let b = Symbol::intern("hello");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "hello");
    }

    #[test]
    fn distinct_strings_distinct_symbols() {
        let a = Symbol::intern("alpha");
        let b = Symbol::intern("beta");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "alpha");
        assert_eq!(b.as_str(), "beta");
    }

    #[test]
    fn display_matches_source() {
        let s = Symbol::intern("make_pair");
        assert_eq!(format!("{s}"), "make_pair");
    }
}

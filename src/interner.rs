//! String interning for span names and leak paths.
//!
//! Every distinct string gets the next unused positive integer on first insertion, so
//! insertion order is also enumeration order. Id `0` is reserved and means "absent".
//! Individual entries are never removed; the only way to forget names is [`Interner::clear`].

use crate::error::ProfilerError;
use crate::hashing::IndexSet;

/// Interned string id. `0` never denotes a real string.
pub type NameId = u32;

/// Separator used when joining span names into a leak path.
pub const PATH_SEPARATOR: char = ' ';

#[derive(Debug, Default)]
pub struct Interner {
    strings: IndexSet<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, assigning a new one if the name has not been seen before.
    ///
    /// Span names must be non-empty and must not contain whitespace, because whitespace is
    /// the separator of leak paths.
    pub fn intern(&mut self, name: &str) -> Result<NameId, ProfilerError> {
        if !is_valid_name(name) {
            return Err(ProfilerError::InvalidName(name.to_string()));
        }
        Ok(self.put(name))
    }

    /// Interns the path formed by joining the names of `ids` with [`PATH_SEPARATOR`]. Paths
    /// are not validated; their segments already were. Unknown ids are skipped.
    pub fn intern_path(&mut self, ids: impl IntoIterator<Item = NameId>) -> NameId {
        let mut path = String::new();
        for name in ids.into_iter().filter_map(|id| self.name_of(id)) {
            if !path.is_empty() {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(name);
        }
        self.put(&path)
    }

    /// Pure read: the id of `name`, or `0` if it was never interned.
    pub fn lookup(&self, name: &str) -> NameId {
        self.strings
            .get_index_of(name)
            .map_or(0, to_id)
    }

    /// Reverse lookup. `None` for `0` and for ids that were never assigned.
    pub fn name_of(&self, id: NameId) -> Option<&str> {
        let index = (id as usize).checked_sub(1)?;
        self.strings.get_index(index).map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn clear(&mut self) {
        self.strings.clear();
    }

    fn put(&mut self, string: &str) -> NameId {
        if let Some(index) = self.strings.get_index_of(string) {
            return to_id(index);
        }
        let (index, _) = self.strings.insert_full(string.into());
        to_id(index)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(char::is_whitespace)
}

#[allow(clippy::cast_possible_truncation)]
fn to_id(index: usize) -> NameId {
    index as NameId + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_interner() {
        let interner = Interner::new();
        assert_eq!(interner.name_of(0), None);
        assert_eq!(interner.name_of(1), None);
        assert_eq!(interner.lookup("a"), 0);
        assert!(interner.is_empty());
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut interner = Interner::new();
        assert_eq!(interner.intern("a").unwrap(), 1);
        assert_eq!(interner.intern("b").unwrap(), 2);
        assert_eq!(interner.intern("a").unwrap(), 1);
        assert_eq!(interner.len(), 2);

        assert_eq!(interner.name_of(1), Some("a"));
        assert_eq!(interner.name_of(2), Some("b"));
        assert_eq!(interner.name_of(3), None);
        assert_eq!(interner.lookup("b"), 2);
    }

    #[test]
    fn rejects_malformed_names() {
        let mut interner = Interner::new();
        assert_eq!(
            interner.intern(""),
            Err(ProfilerError::InvalidName(String::new()))
        );
        assert!(interner.intern("a b").is_err());
        assert!(interner.intern("tab\tbed").is_err());
        assert!(interner.intern("line\n").is_err());
        assert!(interner.is_empty());
    }

    #[test]
    fn paths_share_the_id_space() {
        let mut interner = Interner::new();
        interner.intern("a").unwrap();
        interner.intern("b").unwrap();
        let path = interner.intern_path([1, 2]);
        assert_eq!(path, 3);
        assert_eq!(interner.name_of(path), Some("a b"));
        assert_eq!(interner.intern_path([1, 2]), 3);
        assert_eq!(interner.intern_path([1]), 1);
        assert_eq!(interner.intern_path([2, 0, 9, 1]), 4);
        assert_eq!(interner.name_of(4), Some("b a"));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut interner = Interner::new();
        interner.intern("a").unwrap();
        interner.clear();
        assert_eq!(interner.lookup("a"), 0);
        assert_eq!(interner.intern("z").unwrap(), 1);
    }
}

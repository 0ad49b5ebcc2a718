//! Interned module and target names.
//!
//! Declarations reference each other by name constantly, so names are
//! interned once into a global table and passed around as small copyable
//! handles with O(1) equality.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Global name table. Strings are leaked on first interning so handles
/// can hand out `&'static str` without holding the lock.
static TABLE: LazyLock<RwLock<NameTable>> = LazyLock::new(|| RwLock::new(NameTable::default()));

#[derive(Default)]
struct NameTable {
    lookup: HashMap<&'static str, u32>,
    entries: Vec<&'static str>,
}

impl NameTable {
    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.lookup.get(s) {
            return idx;
        }
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = self.entries.len() as u32;
        self.entries.push(leaked);
        self.lookup.insert(leaked, idx);
        idx
    }
}

/// An interned identifier (module, target, plugin, or sanitizer name).
///
/// Equal names always share the same table slot, so equality and hashing
/// work on the index alone. Ordering compares the underlying strings so
/// sorted collections come out alphabetical, not in interning order.
#[derive(Clone, Copy)]
pub struct Name {
    index: u32,
}

impl Name {
    /// Intern a string, returning its handle.
    pub fn new(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();

        if let Some(&index) = TABLE.read().unwrap().lookup.get(s) {
            return Name { index };
        }

        let index = TABLE.write().unwrap().intern(s);
        Name { index }
    }

    /// The underlying string.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        TABLE.read().unwrap().entries[self.index as usize]
    }

    /// Check if the name is empty.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq for Name {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.index == other.index {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for Name {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_str(), f)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::new(s)
    }
}

impl From<&String> for Name {
    fn from(s: &String) -> Self {
        Name::new(s)
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Name::new(s))
    }
}

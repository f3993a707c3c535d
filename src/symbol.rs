//! Interned name symbols.
//!
//! Identifiers, function names and property names are interned once and
//! referred to by a small copyable [`Symbol`] everywhere else. The interner is
//! global and append-only, so a [`Symbol`] can hand out a `&'static str` view
//! of its text.

use std::fmt;
use std::sync::{LazyLock, Mutex};
use hashbrown::HashMap;

/// An interned string.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
  /// Convert the symbol into an index usable with dense symbol maps.
  #[must_use] pub fn into_usize(self) -> usize { self.0 as usize }

  /// Get the string for this symbol.
  #[must_use] pub fn as_str(self) -> &'static str {
    INTERNER.lock().expect("interner poisoned").get(self)
  }
}

/// The string interner backing [`Symbol`].
#[derive(Default, Debug)]
pub struct Interner {
  names: Vec<&'static str>,
  map: HashMap<&'static str, Symbol>,
}

impl Interner {
  /// Intern a string, returning the existing symbol if it was seen before.
  pub fn intern(&mut self, s: &str) -> Symbol {
    if let Some(&sym) = self.map.get(s) { return sym }
    let s: &'static str = Box::leak(s.into());
    let sym = Symbol(u32::try_from(self.names.len()).expect("interner overflow"));
    self.names.push(s);
    self.map.insert(s, sym);
    sym
  }

  fn get(&self, sym: Symbol) -> &'static str { self.names[sym.into_usize()] }
}

static INTERNER: LazyLock<Mutex<Interner>> = LazyLock::new(Mutex::default);

/// Intern a string into the global symbol table.
#[must_use] pub fn intern(s: &str) -> Symbol {
  INTERNER.lock().expect("interner poisoned").intern(s)
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.as_str().fmt(f) }
}

impl fmt::Debug for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.as_str())
  }
}

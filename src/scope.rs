//! The lexical scope stack.
//!
//! Every block pushes a frame and pops it on exit, on error paths included;
//! callers go through [`crate::Analyzer`]'s `with_scope` so the stack at the
//! end of an analysis run is always the stack it started with. Lookup walks
//! innermost-first, so a name may shadow any outer binding; a collision is
//! only rejected within a single frame.

use hashbrown::HashMap;
use crate::Symbol;
use crate::types::ty::Type;

/// What kind of construct owns a scope frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
  /// A function body; holds the parameters.
  Function,
  /// A statement or expression block.
  Block,
  /// One branch of a conditional.
  Branch,
}

/// One name binding: a `val`/`mut` variable or a parameter.
#[derive(Clone, Debug)]
pub struct VarInfo {
  /// The resolved type of the binding.
  pub ty: Type,
  /// True for `mut`.
  pub mutable: bool,
  /// False only for a `mut` declared `undef` that has not been assigned yet.
  pub initialized: bool,
  /// True for function parameters.
  pub is_param: bool,
}

#[derive(Debug)]
struct Frame {
  kind: ScopeKind,
  vars: HashMap<Symbol, VarInfo>,
}

/// The scope stack.
#[derive(Debug, Default)]
pub struct ScopeStack {
  frames: Vec<Frame>,
}

impl ScopeStack {
  /// Push a fresh frame.
  pub fn enter_scope(&mut self, kind: ScopeKind) {
    self.frames.push(Frame { kind, vars: HashMap::new() })
  }

  /// Pop the innermost frame, discarding its bindings.
  pub fn exit_scope(&mut self) {
    self.frames.pop().expect("scope stack underflow");
  }

  /// The current nesting depth.
  #[must_use] pub fn depth(&self) -> usize { self.frames.len() }

  /// Bind a name in the innermost frame. Fails if the frame already binds
  /// the name; shadowing an outer frame is fine.
  pub fn declare(&mut self, name: Symbol, info: VarInfo) -> Result<(), ()> {
    let frame = self.frames.last_mut().expect("declaration outside any scope");
    if frame.vars.contains_key(&name) { return Err(()) }
    frame.vars.insert(name, info);
    Ok(())
  }

  /// Innermost-first search for a binding.
  #[must_use] pub fn lookup(&self, name: Symbol) -> Option<&VarInfo> {
    self.frames.iter().rev().find_map(|fr| fr.vars.get(&name))
  }

  /// Flip the `initialized` bit of the nearest binding of `name`. The caller
  /// has already verified the binding exists and is `mut`.
  pub fn mark_initialized(&mut self, name: Symbol) {
    let info = self.frames.iter_mut().rev()
      .find_map(|fr| fr.vars.get_mut(&name))
      .expect("mark_initialized on unbound name");
    debug_assert!(info.mutable || !info.initialized);
    info.initialized = true;
  }
}

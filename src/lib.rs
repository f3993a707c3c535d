//! Semantic analyzer for the Hexen programming language.
//!
//! Hexen is a statically-typed systems language built around one principle:
//! **ergonomic literals, transparent costs**. Literals carry comptime types
//! (`comptime_int`, `comptime_float`) that adapt freely to the context they
//! meet, while every conversion between concrete types that could lose
//! information must be spelled out as `value:T`. This crate is the phase that
//! enforces those rules: it consumes the AST produced by an external parser
//! and yields a fully type-annotated program plus an ordered diagnostic list.
//!
//! The analysis is a single pass over each function body, preceded by a
//! signature pre-pass so call sites may come before their callee. It never
//! fails fast: a rule violation becomes a [`Diagnostic`] and analysis
//! continues with the sentinel [`ty::Type::Error`], which is compatible with
//! everything so one mistake is reported once.
//!
//! ```
//! use hexen_sema::{analyze, types::ast};
//!
//! let program = ast::Program { functions: Box::new([]) };
//! let analysis = analyze(&program);
//! assert!(analysis.diags.is_empty());
//! ```

mod arrays;
mod block;
mod conv;
pub mod diag;
mod func;
mod infer;
mod ranges;
mod scope;
pub mod symbol;
pub mod types;

use hashbrown::HashMap;
use log::debug;
use diag::{Diagnostic, Diagnostics};
use scope::ScopeStack;
use types::entity::Entity;
use types::ty::Type;
use types::{ast, hir};

pub use diag::ErrorKind;
pub use symbol::{Symbol, intern};
pub use types::ty;
pub use types::{Span, Spanned};

/// Analyzer configuration.
#[derive(Copy, Clone, Debug)]
pub struct Config {
  /// The width of the target's `usize` in bits (32 or 64). Only literal
  /// range checking depends on it.
  pub usize_bits: u32,
}

impl Default for Config {
  fn default() -> Self { Self { usize_bits: 64 } }
}

/// The outcome of analyzing one program: the typed representation and every
/// diagnostic, in source order.
#[derive(Clone, Debug)]
pub struct Analysis {
  /// The type-annotated program.
  pub program: hir::Program,
  /// The accumulated diagnostics; empty means the program is valid.
  pub diags: Vec<Diagnostic>,
}

/// One analyzer instance per compilation unit. All state (the signature
/// registry, the scope stack, the diagnostic list) is owned here; nothing
/// is process-global except the string interner.
pub struct Analyzer {
  pub(crate) cfg: Config,
  pub(crate) names: HashMap<Symbol, Entity>,
  pub(crate) scopes: ScopeStack,
  pub(crate) diags: Diagnostics,
  pub(crate) cur_ret: Type,
  pub(crate) cur_fn: Symbol,
  pub(crate) runtime_touched: bool,
}

impl Analyzer {
  /// Create an analyzer with the given configuration.
  #[must_use] pub fn new(cfg: Config) -> Self {
    Self {
      cfg,
      names: HashMap::new(),
      scopes: ScopeStack::default(),
      diags: Diagnostics::default(),
      cur_ret: Type::Void,
      cur_fn: intern("<program>"),
      runtime_touched: false,
    }
  }

  /// Analyze a whole program: register every signature, then analyze each
  /// body in declaration order.
  pub fn analyze(mut self, p: &ast::Program) -> Analysis {
    debug!("registering {} function signature(s)", p.functions.len());
    let sigs = self.register_signatures(p);
    let mut functions = Vec::with_capacity(p.functions.len());
    for (f, sig) in p.functions.iter().zip(sigs) {
      functions.push(self.analyze_function(f, sig));
    }
    debug_assert_eq!(self.scopes.depth(), 0, "scope stack must balance");
    debug!("analysis finished with {} diagnostic(s)", self.diags.as_slice().len());
    Analysis {
      program: hir::Program { functions: functions.into() },
      diags: self.diags.into_vec(),
    }
  }
}

/// Analyze a program under the default configuration.
#[must_use] pub fn analyze(p: &ast::Program) -> Analysis {
  Analyzer::new(Config::default()).analyze(p)
}

//! Program-level entities: the registered function signatures.
//!
//! A pre-pass walks every declaration and records its signature here before
//! any body is analyzed, so call sites may precede declarations textually.
//! Signatures live for the whole analysis run.

use super::Spanned;
use super::ty::Type;
use crate::Symbol;

/// A registered function signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FnSig {
  /// The function name.
  pub name: Symbol,
  /// The parameters, in declaration order.
  pub params: Box<[ParamSig]>,
  /// The declared return type.
  pub ret: Type,
}

/// One parameter of a registered signature.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSig {
  /// The parameter name.
  pub name: Symbol,
  /// The resolved parameter type.
  pub ty: Type,
  /// True if the parameter was declared `mut`.
  pub mutable: bool,
}

/// A signature with the span of its declaration, as stored in the registry.
pub type Entity = Spanned<FnSig>;

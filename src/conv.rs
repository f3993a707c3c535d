//! The scalar conversion engine.
//!
//! For any (source, target) pair of scalar types this module answers whether
//! the conversion happens silently, needs the explicit `value:T` form, or is
//! refused outright. Comptime sources adapt freely within their tables;
//! between two *different* concrete numeric types nothing is ever implicit.
//! Composite types (arrays, ranges) layer their own shape rules on top of
//! this matrix in `arrays` and `ranges`.

use crate::types::ty::Type;

/// What an implicit conversion between two distinct concrete numeric types
/// would cost. Even a `Free` conversion still needs explicit syntax; the loss
/// class only picks the diagnostic wording.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Loss {
  /// The target cannot represent part of the source's value range.
  Truncation,
  /// The target cannot represent the source exactly.
  Precision,
  /// A pure widening; nothing is lost, the syntax is still required.
  Free,
}

/// Why a conversion is refused even with explicit syntax.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Refusal {
  /// A numeric/bool crossing; the fix is an explicit comparison.
  Comparison,
  /// string → numeric; the fix is a parsing function.
  Parse,
  /// numeric → string; the fix is a formatting function.
  Format,
  /// float → usize, forbidden in every form.
  FloatToUsize,
  /// No meaningful relation between the types.
  Incompatible,
}

impl Refusal {
  /// The suggested alternative, phrased for a diagnostic.
  #[must_use] pub fn suggestion(self) -> Option<&'static str> {
    match self {
      Refusal::Comparison => Some("use an explicit comparison instead (e.g. 'value != 0')"),
      Refusal::Parse => Some("use parsing functions instead"),
      Refusal::Format => Some("use formatting functions instead"),
      Refusal::FloatToUsize | Refusal::Incompatible => None,
    }
  }
}

/// The verdict for one (source, target) pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fit {
  /// Allowed implicitly.
  Ok,
  /// Allowed only as `value:T`.
  Explicit(Loss),
  /// Never allowed.
  Forbidden(Refusal),
}

/// Classify a scalar conversion. Either side being [`Type::Error`] fits
/// anything, so a construct that already failed stays quiet downstream.
#[must_use] pub fn fit_scalar(src: &Type, tgt: &Type) -> Fit {
  use Type::*;
  if src == tgt || matches!(src, Error) || matches!(tgt, Error) { return Fit::Ok }
  match (src, tgt) {
    (ComptimeInt, I32 | I64 | Usize | F32 | F64) => Fit::Ok,
    (ComptimeFloat, F32 | F64) => Fit::Ok,
    (ComptimeFloat, I32 | I64) => Fit::Explicit(Loss::Truncation),
    (ComptimeFloat | F32 | F64, Usize) => Fit::Forbidden(Refusal::FloatToUsize),
    (Str, _) => Fit::Forbidden(Refusal::Parse),
    (_, Str) => Fit::Forbidden(Refusal::Format),
    (Bool, _) | (_, Bool) => Fit::Forbidden(Refusal::Comparison),
    (_, _) if src.is_numeric() && tgt.is_numeric() => Fit::Explicit(concrete_loss(src, tgt)),
    _ => Fit::Forbidden(Refusal::Incompatible),
  }
}

/// The loss class for a concrete numeric → concrete numeric conversion.
/// `usize` is judged at its widest (64-bit) configuration; the literal range
/// checks use the configured width.
fn concrete_loss(src: &Type, tgt: &Type) -> Loss {
  use Type::*;
  match (src, tgt) {
    // Widenings that preserve every value.
    (I32, I64 | F64) | (F32, F64) => Loss::Free,
    // Signedness or width crossings that can drop values.
    (I32 | I64, Usize) | (Usize, I32 | I64) | (I64, I32) => Loss::Truncation,
    (F32 | F64, I32 | I64) => Loss::Truncation,
    // Integer → float where the mantissa cannot hold every value.
    (I32 | I64 | Usize, F32) | (I64 | Usize, F64) => Loss::Precision,
    (F64, F32) => Loss::Precision,
    _ => Loss::Free,
  }
}

/// The standard rewrite hint for an explicit-conversion requirement.
#[must_use] pub fn suggest(tgt: &Type) -> String {
  format!("Use explicit conversion: 'value:{tgt}'")
}

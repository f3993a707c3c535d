//! Diagnostic accumulation.
//!
//! The analyzer never fails fast: every rule violation becomes a
//! [`Diagnostic`] appended to an ordered list and analysis continues with a
//! best-effort placeholder type. Diagnostics appear in source order within a
//! function, and functions are processed in declaration order; downstream
//! tests assert on message sequences, so no reordering happens anywhere.

use std::fmt;
use crate::types::Span;

/// The stable diagnostic kinds. The names are part of the analyzer's
/// contract with its test suite and with downstream tooling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  /// A value of one type appeared where an incompatible type was expected.
  TypeMismatch,
  /// A narrowing conversion was attempted implicitly.
  PotentialTruncation,
  /// A precision-losing conversion was attempted implicitly.
  PotentialPrecisionLoss,
  /// A conversion that is disallowed even with explicit syntax.
  ForbiddenConversion,
  /// A binary operation over two different concrete types with no target
  /// type to resolve it.
  MixedConcreteRequiresContext,
  /// A literal does not fit the representable range of its target type.
  LiteralOverflow,
  /// A `mut` variable declared `undef` was read before its first assignment.
  UseOfUninitialized,
  /// An assignment to a `val` binding or `val` parameter.
  AssignToImmutable,
  /// A `val` declaration with an `undef` initializer.
  ValWithUndef,
  /// Two declarations share one name in the same scope frame.
  DuplicateVariable,
  /// Two function declarations share one name.
  DuplicateFunction,
  /// Two parameters of one function share one name.
  DuplicateParameter,
  /// A parameter declared with type `void`.
  ForbiddenVoidParameter,
  /// A reference to a name with no visible binding.
  UndefinedVariable,
  /// A call to a function that was never declared.
  UndefinedFunction,
  /// A call with the wrong number of arguments.
  ArityMismatch,
  /// A conditional whose condition is not `bool`.
  ConditionNotBool,
  /// Conditional-expression branches with mixed concrete types and no
  /// target type to unify them.
  ConditionalRequiresContext,
  /// A concrete array variable passed to a function without `[..]`.
  MissingExplicitCopy,
  /// Nested array literals whose inner shapes disagree.
  InconsistentArrayDimensions,
  /// An array whose element count does not match its target shape.
  ArraySizeMismatch,
  /// An empty array literal with no target type to supply a shape.
  EmptyArrayRequiresContext,
  /// An array literal mixing concrete and comptime elements with no target.
  MixedArrayRequiresContext,
  /// An index expression of a non-integer type.
  InvalidArrayIndex,
  /// A property access other than `.length` on an array.
  PropertyNotFound,
  /// A float range without an explicit step.
  FloatRangeMissingStep,
  /// A float range used to index an array.
  FloatRangeNotIndex,
  /// Materialization of a range missing a start or end bound.
  UnboundedRangeNotMaterializable,
  /// `return expr` inside a `void` function.
  ReturnInVoidFunction,
  /// A bare `return` (or a fall-through path) in a value-returning function.
  ReturnMissingValue,
  /// An expression block that does not end with `-> value` or `return`.
  ExpressionBlockMissingTerminator,
  /// An expression block containing runtime values assigned without an
  /// explicit target type.
  RuntimeBlockRequiresContext,
  /// An analyzer invariant violation; reported, never a crash.
  InternalError,
}

impl ErrorKind {
  /// The stable identifier for the kind.
  #[must_use] pub fn code(self) -> &'static str {
    match self {
      ErrorKind::TypeMismatch => "TypeMismatch",
      ErrorKind::PotentialTruncation => "PotentialTruncation",
      ErrorKind::PotentialPrecisionLoss => "PotentialPrecisionLoss",
      ErrorKind::ForbiddenConversion => "ForbiddenConversion",
      ErrorKind::MixedConcreteRequiresContext => "MixedConcreteRequiresContext",
      ErrorKind::LiteralOverflow => "LiteralOverflow",
      ErrorKind::UseOfUninitialized => "UseOfUninitialized",
      ErrorKind::AssignToImmutable => "AssignToImmutable",
      ErrorKind::ValWithUndef => "ValWithUndef",
      ErrorKind::DuplicateVariable => "DuplicateVariable",
      ErrorKind::DuplicateFunction => "DuplicateFunction",
      ErrorKind::DuplicateParameter => "DuplicateParameter",
      ErrorKind::ForbiddenVoidParameter => "ForbiddenVoidParameter",
      ErrorKind::UndefinedVariable => "UndefinedVariable",
      ErrorKind::UndefinedFunction => "UndefinedFunction",
      ErrorKind::ArityMismatch => "ArityMismatch",
      ErrorKind::ConditionNotBool => "ConditionNotBool",
      ErrorKind::ConditionalRequiresContext => "ConditionalRequiresContext",
      ErrorKind::MissingExplicitCopy => "MissingExplicitCopy",
      ErrorKind::InconsistentArrayDimensions => "InconsistentArrayDimensions",
      ErrorKind::ArraySizeMismatch => "ArraySizeMismatch",
      ErrorKind::EmptyArrayRequiresContext => "EmptyArrayRequiresContext",
      ErrorKind::MixedArrayRequiresContext => "MixedArrayRequiresContext",
      ErrorKind::InvalidArrayIndex => "InvalidArrayIndex",
      ErrorKind::PropertyNotFound => "PropertyNotFound",
      ErrorKind::FloatRangeMissingStep => "FloatRangeMissingStep",
      ErrorKind::FloatRangeNotIndex => "FloatRangeNotIndex",
      ErrorKind::UnboundedRangeNotMaterializable => "UnboundedRangeNotMaterializable",
      ErrorKind::ReturnInVoidFunction => "ReturnInVoidFunction",
      ErrorKind::ReturnMissingValue => "ReturnMissingValue",
      ErrorKind::ExpressionBlockMissingTerminator => "ExpressionBlockMissingTerminator",
      ErrorKind::RuntimeBlockRequiresContext => "RuntimeBlockRequiresContext",
      ErrorKind::InternalError => "InternalError",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

/// One reported problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
  /// The kind, stable across releases.
  pub kind: ErrorKind,
  /// The user-facing message: the offending construct and the rule violated.
  pub message: String,
  /// A mechanical fix, when one exists (e.g. `value:i32`).
  pub hint: Option<String>,
  /// The span of the offending construct.
  pub span: Span,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.kind, self.message)?;
    if let Some(hint) = &self.hint { write!(f, " ({hint})")? }
    Ok(())
  }
}

/// The ordered diagnostic accumulator.
#[derive(Debug, Default)]
pub struct Diagnostics {
  list: Vec<Diagnostic>,
}

impl Diagnostics {
  /// Append a diagnostic without a hint.
  pub fn emit(&mut self, span: Span, kind: ErrorKind, message: impl Into<String>) {
    self.list.push(Diagnostic { kind, message: message.into(), hint: None, span })
  }

  /// Append a diagnostic with a mechanical-fix hint.
  pub fn emit_hint(
    &mut self, span: Span, kind: ErrorKind,
    message: impl Into<String>, hint: impl Into<String>,
  ) {
    self.list.push(Diagnostic { kind, message: message.into(), hint: Some(hint.into()), span })
  }

  /// The number of diagnostics so far. Used as a watermark to detect (and
  /// later rewrite) errors produced by a sub-analysis.
  #[must_use] pub fn mark(&self) -> usize { self.list.len() }

  /// Prefix every message emitted since `mark` with `prefix`, preserving
  /// order. Used to attribute call-argument errors to their argument.
  pub fn prefix_since(&mut self, mark: usize, prefix: &str) {
    for d in &mut self.list[mark..] {
      d.message.insert_str(0, prefix);
    }
  }

  /// True if nothing was reported.
  #[must_use] pub fn is_empty(&self) -> bool { self.list.is_empty() }

  /// The diagnostics reported so far.
  #[must_use] pub fn as_slice(&self) -> &[Diagnostic] { &self.list }

  /// Consume the accumulator.
  #[must_use] pub fn into_vec(self) -> Vec<Diagnostic> { self.list }
}

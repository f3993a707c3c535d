//! The typed program representation produced by analysis.
//!
//! This mirrors the input AST with a resolved [`Type`] on every expression
//! and declaration. Integer literals carry their exact mathematical value (a
//! [`BigInt`]), float literals their `f64` value; literal negation is folded
//! so `-2147483648` is a single literal node. Constructs that failed analysis
//! appear with [`Type::Error`] so the consumer can still walk the whole tree.

use num::BigInt;
use super::{Span, Spanned};
use super::ast::{Binop, Unop};
use super::entity::FnSig;
use super::ty::Type;
use crate::Symbol;

/// A fully analyzed program.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
  /// The analyzed functions, in declaration order.
  pub functions: Box<[Func]>,
}

/// An analyzed function.
#[derive(Clone, Debug, PartialEq)]
pub struct Func {
  /// The function name.
  pub name: Symbol,
  /// The registered signature.
  pub sig: FnSig,
  /// The analyzed body.
  pub body: Block,
}

/// An analyzed block. In expression role `ty` is the produced value's type;
/// in statement and function-body roles it is [`Type::Void`].
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
  /// The analyzed statements.
  pub stmts: Box<[Stmt]>,
  /// The block's type in its role.
  pub ty: Type,
}

/// An analyzed statement with its span.
pub type Stmt = Spanned<StmtKind>;

/// The analyzed statement kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
  /// A `val`/`mut` declaration with its resolved binding type.
  Let {
    /// True for `mut`.
    mutable: bool,
    /// The declared name.
    name: Symbol,
    /// The resolved type of the binding.
    ty: Type,
    /// The analyzed initializer; `None` for `undef`.
    init: Option<Expr>,
  },
  /// An assignment to a `mut` binding.
  Assign {
    /// The target name.
    name: Symbol,
    /// The analyzed value.
    value: Expr,
  },
  /// A return from the enclosing function.
  Return(Option<Expr>),
  /// A conditional statement.
  If(IfChain),
  /// An expression evaluated for effect.
  Expr(Expr),
  /// A bare block.
  Bare(Block),
  /// The `-> value` terminator of an expression block.
  Yield(Expr),
}

/// An analyzed conditional: statement or expression role.
#[derive(Clone, Debug, PartialEq)]
pub struct IfChain {
  /// The first condition.
  pub cond: Box<Expr>,
  /// The block taken when `cond` holds.
  pub then: Block,
  /// The `else if` arms.
  pub elifs: Box<[(Expr, Block)]>,
  /// The `else` block, if present.
  pub els: Option<Block>,
}

/// An analyzed expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
  /// The span of the source construct.
  pub span: Span,
  /// The resolved type.
  pub ty: Type,
  /// The expression itself.
  pub k: ExprKind,
}

impl Expr {
  /// An error placeholder at `span`.
  #[must_use] pub fn error(span: Span) -> Self {
    Self { span, ty: Type::Error, k: ExprKind::Error }
  }

  /// The exact value, if this is an integer literal.
  #[must_use] pub fn const_int(&self) -> Option<&BigInt> {
    if let ExprKind::Int(n) = &self.k { Some(n) } else { None }
  }

  /// The value, if this is a float literal.
  #[must_use] pub fn const_float(&self) -> Option<f64> {
    if let ExprKind::Float(v) = &self.k { Some(*v) } else { None }
  }
}

/// The analyzed expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
  /// An integer literal (negation folded).
  Int(BigInt),
  /// A float literal (negation folded).
  Float(f64),
  /// A boolean literal.
  Bool(bool),
  /// A string literal.
  Str(Box<str>),
  /// A variable reference.
  Var(Symbol),
  /// A unary operation.
  Unop(Unop, Box<Expr>),
  /// A binary operation.
  Binop(Binop, Box<Expr>, Box<Expr>),
  /// A function call.
  Call {
    /// The callee.
    f: Symbol,
    /// The analyzed arguments.
    args: Box<[Expr]>,
  },
  /// An element access `a[i]` with an integer index.
  Index {
    /// The indexed array.
    arr: Box<Expr>,
    /// The index.
    index: Box<Expr>,
  },
  /// A sub-array copy `a[range]`, `a[..]` included.
  Slice {
    /// The indexed array.
    arr: Box<Expr>,
    /// The analyzed range.
    range: Box<Expr>,
  },
  /// A range value.
  Range {
    /// The start bound.
    start: Option<Box<Expr>>,
    /// The end bound.
    end: Option<Box<Expr>>,
    /// The step.
    step: Option<Box<Expr>>,
    /// True for `..=`.
    inclusive: bool,
  },
  /// An array literal.
  Array(Box<[Expr]>),
  /// A range materialized into an array.
  Materialize(Box<Expr>),
  /// An explicit conversion; the target is the node's `ty`.
  Convert(Box<Expr>),
  /// A block in expression role.
  Block(Block),
  /// A conditional in expression role.
  If(IfChain),
  /// A `.length` read.
  Length(Box<Expr>),
  /// A construct that failed analysis.
  Error,
}

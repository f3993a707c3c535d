//! The Hexen type lattice.
//!
//! Types come in two flavors. *Concrete* types have a fixed machine
//! representation (`i32`, `f64`, `[3]i32`, `range[usize]`, ...). *Comptime*
//! types are carried by literals and purely-literal expressions; they have no
//! representation of their own and adapt to the context they meet
//! (`comptime_int`, `comptime_float`, and comptime arrays). A comptime type
//! never survives past a typing boundary: explicitly typed declarations,
//! assignments, parameters, returns and operators with a concrete operand
//! all force resolution. An untyped `val` keeps its initializer flexible.

use std::fmt;
use std::rc::Rc;
use num::BigInt;
use smallvec::SmallVec;

/// One dimension of an array type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dim {
  /// A fixed size.
  Fixed(u64),
  /// An inferred size (`_`), satisfied by any source size.
  Infer,
}

impl Dim {
  /// The size, if this dimension is fixed.
  #[must_use] pub fn fixed(self) -> Option<u64> {
    match self { Dim::Fixed(n) => Some(n), Dim::Infer => None }
  }
}

impl fmt::Display for Dim {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Dim::Fixed(n) => write!(f, "[{n}]"),
      Dim::Infer => write!(f, "[_]"),
    }
  }
}

/// The shape of an array type: the dimension list, outermost first.
pub type Dims = SmallVec<[Dim; 4]>;

/// A concrete array type in flattened form: a scalar element type and the
/// full dimension list, so `[2][3]i32` has `dims = [2, 3]` and `elem = i32`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayTy {
  /// The scalar element type (never itself an array).
  pub elem: Rc<Type>,
  /// The dimensions, outermost first; never empty.
  pub dims: Dims,
}

impl ArrayTy {
  /// Build an array type. The element must be scalar.
  pub fn new(elem: Type, dims: Dims) -> Self {
    debug_assert!(!matches!(elem, Type::Array(_) | Type::ComptimeArray(_)));
    Self { elem: Rc::new(elem), dims }
  }

  /// The total element count, if every dimension is fixed.
  #[must_use] pub fn total(&self) -> Option<u64> {
    self.dims.iter().try_fold(1u64, |n, d| Some(n.checked_mul(d.fixed()?)?))
  }

  /// The type obtained by removing the outermost dimension.
  #[must_use] pub fn peeled(&self) -> Type {
    if self.dims.len() == 1 {
      (*self.elem).clone()
    } else {
      Type::Array(ArrayTy { elem: self.elem.clone(), dims: self.dims[1..].into() })
    }
  }
}

/// The element flavor of a comptime array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CtElem {
  /// All elements are comptime ints.
  Int,
  /// At least one element is a comptime float.
  Float,
}

impl CtElem {
  /// The scalar comptime type of the elements.
  #[must_use] pub fn scalar(self) -> Type {
    match self { CtElem::Int => Type::ComptimeInt, CtElem::Float => Type::ComptimeFloat }
  }
}

/// A comptime array type. The shape is always known exactly, since it comes
/// from the literal (or materialized range) that produced the value.
#[derive(Clone, Debug, PartialEq)]
pub struct CtArrayTy {
  /// The comptime element flavor.
  pub elem: CtElem,
  /// The exact dimensions, outermost first.
  pub dims: SmallVec<[u64; 4]>,
}

impl CtArrayTy {
  /// The total element count.
  #[must_use] pub fn total(&self) -> u64 {
    self.dims.iter().product()
  }

  /// The type obtained by removing the outermost dimension.
  #[must_use] pub fn peeled(&self) -> Type {
    if self.dims.len() == 1 {
      self.elem.scalar()
    } else {
      Type::ComptimeArray(CtArrayTy { elem: self.elem, dims: self.dims[1..].into() })
    }
  }
}

/// A range type. The element type and the bound/step shape are both part of
/// the type; `range[T]` annotations constrain only the element.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeTy {
  /// The element type: a numeric concrete type or a comptime numeric.
  pub elem: Rc<Type>,
  /// True if the range has a start bound.
  pub has_start: bool,
  /// True if the range has an end bound.
  pub has_end: bool,
  /// True if the range has an explicit step.
  pub has_step: bool,
  /// True if the end bound is included (`..=`).
  pub inclusive: bool,
}

impl RangeTy {
  /// The canonical shape produced by a `range[T]` annotation: bounded, no
  /// step. Compatibility checks only look at the element type.
  pub fn annotated(elem: Type) -> Self {
    Self { elem: Rc::new(elem), has_start: true, has_end: true, has_step: false, inclusive: false }
  }

  /// This range with a different element type, same shape.
  #[must_use] pub fn with_elem(&self, elem: Type) -> Self {
    Self { elem: Rc::new(elem), ..*self }
  }

  /// True if both bounds are present, i.e. the range can be materialized.
  #[must_use] pub fn is_bounded(&self) -> bool { self.has_start && self.has_end }
}

/// A resolved Hexen type.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
  /// 32-bit signed integer.
  I32,
  /// 64-bit signed integer.
  I64,
  /// 32-bit float.
  F32,
  /// 64-bit float.
  F64,
  /// The platform index type: unsigned, width configured on the analyzer.
  Usize,
  /// Boolean.
  Bool,
  /// String.
  Str,
  /// The empty type of `void` functions.
  Void,
  /// The type of integer literals before context resolves them.
  ComptimeInt,
  /// The type of float literals before context resolves them.
  ComptimeFloat,
  /// A concrete array.
  Array(ArrayTy),
  /// A comptime array.
  ComptimeArray(CtArrayTy),
  /// A range.
  Range(RangeTy),
  /// The sentinel type of constructs that already produced a diagnostic.
  /// It is compatible with everything so one error does not cascade.
  Error,
}

impl Type {
  /// True for the scalar numeric types, comptime included.
  #[must_use] pub fn is_numeric(&self) -> bool {
    matches!(self,
      Type::I32 | Type::I64 | Type::F32 | Type::F64 | Type::Usize |
      Type::ComptimeInt | Type::ComptimeFloat)
  }

  /// True for integer types, comptime included.
  #[must_use] pub fn is_integer(&self) -> bool {
    matches!(self, Type::I32 | Type::I64 | Type::Usize | Type::ComptimeInt)
  }

  /// True for float types, comptime included.
  #[must_use] pub fn is_float(&self) -> bool {
    matches!(self, Type::F32 | Type::F64 | Type::ComptimeFloat)
  }

  /// True for comptime types, including comptime arrays and ranges with a
  /// comptime element.
  #[must_use] pub fn is_comptime(&self) -> bool {
    match self {
      Type::ComptimeInt | Type::ComptimeFloat | Type::ComptimeArray(_) => true,
      Type::Range(r) => r.elem.is_comptime(),
      _ => false,
    }
  }

  /// True for types with a machine representation. `Error` is neither
  /// concrete nor comptime.
  #[must_use] pub fn is_concrete(&self) -> bool {
    !self.is_comptime() && !matches!(self, Type::Error)
  }

  /// True for array types of either flavor.
  #[must_use] pub fn is_array(&self) -> bool {
    matches!(self, Type::Array(_) | Type::ComptimeArray(_))
  }

  /// The concrete type a comptime type resolves to absent any context:
  /// `comptime_int` defaults to `i32` and `comptime_float` to `f64`.
  #[must_use] pub fn defaulted(&self) -> Type {
    match self {
      Type::ComptimeInt => Type::I32,
      Type::ComptimeFloat => Type::F64,
      Type::ComptimeArray(a) => Type::Array(ArrayTy::new(
        a.elem.scalar().defaulted(),
        a.dims.iter().map(|&n| Dim::Fixed(n)).collect(),
      )),
      Type::Range(r) if r.elem.is_comptime() =>
        Type::Range(r.with_elem(r.elem.defaulted())),
      _ => self.clone(),
    }
  }

  /// The representable range of an integer type, given the configured
  /// `usize` width in bits.
  #[must_use] pub fn int_bounds(&self, usize_bits: u32) -> Option<(BigInt, BigInt)> {
    match self {
      Type::I32 => Some((BigInt::from(i32::MIN), BigInt::from(i32::MAX))),
      Type::I64 => Some((BigInt::from(i64::MIN), BigInt::from(i64::MAX))),
      Type::Usize => {
        let max = (BigInt::from(1) << usize_bits) - 1;
        Some((BigInt::from(0), max))
      }
      _ => None,
    }
  }

  /// A human-readable description of an integer type's range, for overflow
  /// diagnostics.
  #[must_use] pub fn range_description(&self, usize_bits: u32) -> Option<String> {
    match self {
      Type::F32 => Some("approximately ±3.4028235e+38".into()),
      Type::F64 => Some("approximately ±1.7976931348623157e+308".into()),
      _ => {
        let (lo, hi) = self.int_bounds(usize_bits)?;
        Some(format!("{lo} to {hi}"))
      }
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Type::I32 => write!(f, "i32"),
      Type::I64 => write!(f, "i64"),
      Type::F32 => write!(f, "f32"),
      Type::F64 => write!(f, "f64"),
      Type::Usize => write!(f, "usize"),
      Type::Bool => write!(f, "bool"),
      Type::Str => write!(f, "string"),
      Type::Void => write!(f, "void"),
      Type::ComptimeInt => write!(f, "comptime_int"),
      Type::ComptimeFloat => write!(f, "comptime_float"),
      Type::Array(a) => {
        for d in &a.dims { d.fmt(f)? }
        a.elem.fmt(f)
      }
      Type::ComptimeArray(a) => {
        for n in &a.dims { write!(f, "[{n}]")? }
        a.elem.scalar().fmt(f)
      }
      Type::Range(r) => write!(f, "range[{}]", r.elem),
      Type::Error => write!(f, "<error>"),
    }
  }
}

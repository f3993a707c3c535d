//! Range analysis: literal typing, element unification, conversions,
//! indexing discipline and materialization into arrays.
//!
//! Ranges come in two social classes. *User* ranges carry ordinary numeric
//! elements and are data like any other. *Index* ranges have element type
//! `usize`; only those may slice an array. Comptime integer ranges adapt to
//! either role; `range[i32]`/`range[i64]` must be converted explicitly, and
//! float ranges can never index. A float range must always carry a step.

use num::BigInt;
use num::traits::{Signed, ToPrimitive};
use crate::Analyzer;
use crate::conv::{self, Fit, Refusal};
use crate::diag::ErrorKind;
use crate::types::Span;
use crate::types::ast;
use crate::types::hir;
use crate::types::ty::{ArrayTy, CtArrayTy, CtElem, Dim, RangeTy, Type};

impl Analyzer {
  /// Analyze a range expression under an optional target type. Only a range
  /// target contributes context (its element type flows into the bounds).
  pub(crate) fn infer_range(&mut self, e: &ast::Expr, tgt: Option<&Type>) -> hir::Expr {
    let span = e.span;
    let ast::ExprKind::Range { start, end, step, inclusive } = &e.k else {
      unreachable!("infer_range on a non-range node")
    };
    let elem_ctx = match tgt {
      Some(Type::Range(rt)) if rt.elem.is_concrete() => Some((*rt.elem).clone()),
      _ => None,
    };
    let mut part = |this: &mut Self, b: &Option<Box<ast::Expr>>| {
      b.as_deref().map(|b| this.infer_expr(b, elem_ctx.as_ref()))
    };
    let s = part(self, start);
    let en = part(self, end);
    let st = part(self, step);

    let elem = self.unify_range_elem(span, [&s, &en, &st]);
    if elem == Type::Error {
      return hir::Expr::error(span)
    }
    if elem.is_float() && st.is_none() {
      self.diags.emit_hint(span, ErrorKind::FloatRangeMissingStep,
        format!("Float ranges require an explicit step: a range[{elem}] cannot \
                 enumerate its values without one"),
        "start..end:step");
    }
    if let Some(st) = &st {
      let zero = st.const_int().map_or(st.const_float() == Some(0.0), |v| v.bits() == 0);
      if zero {
        self.diags.emit(st.span, ErrorKind::TypeMismatch, "Range step cannot be zero");
      }
    }
    let ty = Type::Range(RangeTy {
      elem: elem.into(),
      has_start: s.is_some(),
      has_end: en.is_some(),
      has_step: st.is_some(),
      inclusive: *inclusive,
    });
    let bx = |v: Option<hir::Expr>| v.map(Box::new);
    hir::Expr {
      span, ty,
      k: hir::ExprKind::Range { start: bx(s), end: bx(en), step: bx(st), inclusive: *inclusive },
    }
  }

  /// The common element type of the present bounds and step.
  fn unify_range_elem(&mut self, span: Span, parts: [&Option<hir::Expr>; 3]) -> Type {
    let mut elem = Type::ComptimeInt;
    let mut concrete: Option<Type> = None;
    for p in parts.into_iter().flatten() {
      match &p.ty {
        Type::Error => return Type::Error,
        t if !t.is_numeric() => {
          self.diags.emit(p.span, ErrorKind::TypeMismatch,
            format!("Range bounds must be numeric, got {t}"));
          return Type::Error
        }
        Type::ComptimeFloat => if elem == Type::ComptimeInt { elem = Type::ComptimeFloat },
        Type::ComptimeInt => {}
        t => if let Some(c) = &concrete {
          if c != t {
            self.diags.emit(span, ErrorKind::TypeMismatch,
              format!("Range bounds must share one type, got {c} and {t}"));
            return Type::Error
          }
        } else {
          concrete = Some(t.clone());
        },
      }
    }
    match concrete {
      // A lone concrete participant resolves the comptime ones.
      Some(c) => {
        if elem == Type::ComptimeFloat && !c.is_float() {
          self.diags.emit_hint(span, ErrorKind::PotentialTruncation,
            format!("Potential truncation: comptime_float range bound may not fit in {c}. {}",
              conv::suggest(&c)),
            format!("value:{c}"));
        }
        c
      }
      None => elem,
    }
  }

  /// Implicitly adapt a value to a range target. Only the element matters;
  /// the bound/step shape travels with the value.
  pub(crate) fn adapt_range(&mut self, e: hir::Expr, tgt: &RangeTy) -> hir::Expr {
    let Type::Range(src) = &e.ty else {
      if e.ty != Type::Error {
        self.diags.emit(e.span, ErrorKind::TypeMismatch,
          format!("Type mismatch: expected range[{}], got {}", tgt.elem, e.ty));
      }
      return hir::Expr { ty: Type::Range(tgt.clone()), ..e }
    };
    if src.elem == tgt.elem { return e }
    let adapted = Type::Range(src.with_elem((*tgt.elem).clone()));
    match conv::fit_scalar(&src.elem, &tgt.elem) {
      Fit::Ok => hir::Expr { ty: adapted, ..e },
      Fit::Explicit(_) => {
        self.diags.emit_hint(e.span, ErrorKind::TypeMismatch,
          format!("Type mismatch: expected range[{}], got range[{}]. \
                   Use explicit conversion: 'value:range[{}]'", tgt.elem, src.elem, tgt.elem),
          format!("value:range[{}]", tgt.elem));
        hir::Expr { ty: adapted, ..e }
      }
      Fit::Forbidden(refusal) => {
        let msg = if refusal == Refusal::FloatToUsize {
          format!("Float range range[{}] cannot convert to range[usize]", src.elem)
        } else {
          format!("Type mismatch: expected range[{}], got range[{}]", tgt.elem, src.elem)
        };
        self.diags.emit(e.span, ErrorKind::ForbiddenConversion, msg);
        hir::Expr { ty: adapted, ..e }
      }
    }
  }

  /// Apply an explicit `value:range[T]` conversion.
  pub(crate) fn convert_range(&mut self, span: Span, e: hir::Expr, tgt: Type) -> hir::Expr {
    let (Type::Range(src), Type::Range(rt)) = (&e.ty, &tgt) else {
      unreachable!("convert_range on non-range types")
    };
    match conv::fit_scalar(&src.elem, &rt.elem) {
      Fit::Ok | Fit::Explicit(_) => {}
      Fit::Forbidden(Refusal::FloatToUsize) => {
        self.diags.emit(span, ErrorKind::ForbiddenConversion,
          format!("Conversion from range[{}] to range[usize] is forbidden: \
                   float ranges cannot become index ranges", src.elem));
      }
      Fit::Forbidden(_) => {
        self.diags.emit(span, ErrorKind::ForbiddenConversion,
          format!("Conversion from range[{}] to range[{}] is not allowed", src.elem, rt.elem));
      }
    }
    let ty = Type::Range(src.with_elem((*rt.elem).clone()));
    hir::Expr { span, ty, k: hir::ExprKind::Convert(Box::new(e)) }
  }

  /// Validate a range used as an array index and retype it to
  /// `range[usize]`. Comptime integer ranges adapt; user integer ranges need
  /// an explicit conversion; float ranges are rejected.
  pub(crate) fn check_index_range(&mut self, e: hir::Expr) -> hir::Expr {
    let Type::Range(rt) = &e.ty else { return e };
    let usized = Type::Range(rt.with_elem(Type::Usize));
    match &*rt.elem {
      Type::Usize | Type::Error => e,
      Type::ComptimeInt => hir::Expr { ty: usized, ..e },
      t @ (Type::I32 | Type::I64) => {
        self.diags.emit_hint(e.span, ErrorKind::TypeMismatch,
          format!("Range of type range[{t}] cannot index an array: indexing requires \
                   range[usize]. Use explicit conversion: 'value:range[usize]'"),
          "value:range[usize]");
        hir::Expr { ty: usized, ..e }
      }
      t => {
        self.diags.emit(e.span, ErrorKind::FloatRangeNotIndex,
          format!("Float range range[{t}] cannot be used for array indexing"));
        hir::Expr { ty: usized, ..e }
      }
    }
  }

  /// Materialize `[range]` into an array value.
  pub(crate) fn materialize(
    &mut self, span: Span, range: &ast::Expr, tgt: Option<&Type>,
  ) -> hir::Expr {
    let elem_tgt = match tgt {
      Some(Type::Array(a)) => Some((*a.elem).clone()),
      _ => None,
    };
    let rtgt = elem_tgt.clone().map(|t| Type::Range(RangeTy::annotated(t)));
    let r = self.infer_range(range, rtgt.as_ref());
    let Type::Range(rt) = r.ty.clone() else {
      return hir::Expr { span, ty: Type::Error, k: hir::ExprKind::Materialize(Box::new(r)) }
    };
    if !rt.is_bounded() {
      self.diags.emit(span, ErrorKind::UnboundedRangeNotMaterializable,
        "Cannot materialize unbounded range: both start and end bounds are required \
         to enumerate the elements");
      return hir::Expr { span, ty: Type::Error, k: hir::ExprKind::Materialize(Box::new(r)) }
    }
    let len = static_range_len(&r);
    let dim = len.map_or(Dim::Infer, Dim::Fixed);
    let ty = if let Some(et) = elem_tgt {
      Type::Array(ArrayTy::new(et, [dim].into_iter().collect()))
    } else if rt.elem.is_comptime() {
      match len {
        Some(n) => {
          let elem = if rt.elem.is_float() { CtElem::Float } else { CtElem::Int };
          Type::ComptimeArray(CtArrayTy { elem, dims: [n].into_iter().collect() })
        }
        None => Type::Array(ArrayTy::new(rt.elem.defaulted(), [Dim::Infer].into_iter().collect())),
      }
    } else {
      Type::Array(ArrayTy::new((*rt.elem).clone(), [dim].into_iter().collect()))
    };
    hir::Expr { span, ty, k: hir::ExprKind::Materialize(Box::new(r)) }
  }
}

/// The number of elements a bounded range enumerates, when the bounds and
/// step are literals. `None` means the length is a runtime quantity.
pub(crate) fn static_range_len(r: &hir::Expr) -> Option<u64> {
  let hir::ExprKind::Range { start, end, step, inclusive } = &r.k else { return None };
  let (start, end) = (start.as_deref()?, end.as_deref()?);
  if let (Some(s), Some(e)) = (start.const_int(), end.const_int()) {
    let st = match step.as_deref() {
      Some(st) => st.const_int()?.clone(),
      None => BigInt::from(1),
    };
    return int_range_len(s, e, &st, *inclusive)
  }
  let s = lit_as_float(start)?;
  let e = lit_as_float(end)?;
  let st = match step.as_deref() {
    Some(st) => lit_as_float(st)?,
    None => 1.0,
  };
  float_range_len(s, e, st, *inclusive)
}

fn lit_as_float(e: &hir::Expr) -> Option<f64> {
  e.const_float().or_else(|| e.const_int()?.to_f64())
}

/// Exclusive ranges hold `ceil(|end - start| / |step|)` elements, inclusive
/// ones a final element more; inverted or empty ranges clamp to zero.
fn int_range_len(start: &BigInt, end: &BigInt, step: &BigInt, inclusive: bool) -> Option<u64> {
  if step.bits() == 0 { return None }
  let span = end - start;
  if span.bits() != 0 && span.is_positive() != step.is_positive() {
    return Some(0)
  }
  let (span, step) = (span.abs(), step.abs());
  let n: BigInt = if inclusive { &span / &step + 1 } else { (&span + &step - 1) / &step };
  n.to_u64()
}

fn float_range_len(start: f64, end: f64, step: f64, inclusive: bool) -> Option<u64> {
  if step == 0.0 || !step.is_finite() { return None }
  let span = end - start;
  if span != 0.0 && span.is_sign_positive() != step.is_sign_positive() {
    return Some(0)
  }
  let ratio = (span / step).abs();
  // A small slack absorbs binary rounding in quotients like 1.0 / 0.1.
  let n = if inclusive { (ratio + 1e-9).floor() + 1.0 } else { (ratio - 1e-9).ceil() };
  if n.is_finite() && n >= 0.0 { Some(n as u64) } else { None }
}

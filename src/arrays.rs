//! Array analysis: literal typing, shape checking, indexing, slicing,
//! element conversions with dimensional flattening, and the copy-syntax
//! discipline for array-typed values.
//!
//! Arrays are held in flattened form (`[2][3]i32` is element `i32` with dims
//! `[2, 3]`), so nested literals fold into one shape and an explicit
//! conversion may regroup dimensions as long as the total element count is
//! preserved. Assignment is stricter: dimensions match pairwise, with the
//! `_` wildcard accepting any source size.

use itertools::Itertools;
use smallvec::SmallVec;
use crate::Analyzer;
use crate::conv::{self, Fit, Refusal};
use crate::diag::ErrorKind;
use crate::ranges::static_range_len;
use crate::types::Span;
use crate::types::ast;
use crate::types::hir;
use crate::types::ty::{ArrayTy, CtArrayTy, CtElem, Dim, Dims, Type};

impl Analyzer {
  /// Resolve a (possibly nested) array type annotation into flattened form.
  pub(crate) fn resolve_array_ty(&mut self, ty: &ast::Ty) -> Type {
    let mut dims: Dims = SmallVec::new();
    let mut cur = ty;
    while let ast::TyKind::Array { dim, elem } = &cur.k {
      dims.push(match dim {
        ast::ArrayDim::Fixed(n) => Dim::Fixed(*n),
        ast::ArrayDim::Infer => Dim::Infer,
      });
      cur = elem;
    }
    match self.resolve_ty(cur) {
      Type::Error => Type::Error,
      Type::Void => {
        self.diags.emit(ty.span, ErrorKind::TypeMismatch,
          "Array element type cannot be void");
        Type::Error
      }
      Type::Range(_) => {
        self.diags.emit(ty.span, ErrorKind::TypeMismatch,
          "Arrays of ranges are not supported");
        Type::Error
      }
      elem => Type::Array(ArrayTy::new(elem, dims)),
    }
  }

  /// Analyze an array literal (or a range materialization, which shares the
  /// bracket syntax) under an optional target type.
  pub(crate) fn infer_array(
    &mut self, span: Span, elems: &[ast::Expr], tgt: Option<&Type>,
  ) -> hir::Expr {
    if let [only] = elems {
      if matches!(only.k, ast::ExprKind::Range { .. }) {
        return self.materialize(span, only, tgt)
      }
    }
    match tgt {
      Some(Type::Array(a)) => {
        let a = a.clone();
        self.array_lit_with_target(span, elems, &a)
      }
      Some(Type::Error) => {
        for e in elems { self.infer_expr(e, None); }
        hir::Expr::error(span)
      }
      _ => self.array_lit_untargeted(span, elems),
    }
  }

  /// An array literal whose shape and element type come from the target.
  fn array_lit_with_target(
    &mut self, span: Span, elems: &[ast::Expr], a: &ArrayTy,
  ) -> hir::Expr {
    let n = elems.len() as u64;
    let first = match a.dims[0] {
      Dim::Fixed(d) => {
        if d != n {
          self.diags.emit(span, ErrorKind::ArraySizeMismatch,
            format!("Array size mismatch: expected {d} elements, got {n}"));
        }
        // Trust the target shape so the mismatch is reported once.
        Dim::Fixed(d)
      }
      Dim::Infer => Dim::Fixed(n),
    };
    let elem_tgt = a.peeled();
    let hels: Vec<hir::Expr> =
      elems.iter().map(|e| self.infer_expr(e, Some(&elem_tgt))).collect();
    // Inner wildcard dims adopt the sizes the elements actually have.
    let rest: Dims = match hels.first().map(|e| &e.ty) {
      Some(Type::Array(ia)) => ia.dims.clone(),
      _ => a.dims[1..].into(),
    };
    let mut dims: Dims = SmallVec::new();
    dims.push(first);
    dims.extend(rest);
    let ty = Type::Array(ArrayTy { elem: a.elem.clone(), dims });
    hir::Expr { span, ty, k: hir::ExprKind::Array(hels.into()) }
  }

  /// An array literal typed from its own elements.
  fn array_lit_untargeted(&mut self, span: Span, elems: &[ast::Expr]) -> hir::Expr {
    if elems.is_empty() {
      self.diags.emit(span, ErrorKind::EmptyArrayRequiresContext,
        "Empty array literal requires explicit type context");
      return hir::Expr::error(span)
    }
    let hels: Vec<hir::Expr> = elems.iter().map(|e| self.infer_expr(e, None)).collect();
    let n = elems.len() as u64;
    let ty = self.classify_elements(span, &hels, n);
    hir::Expr { span, ty, k: hir::ExprKind::Array(hels.into()) }
  }

  /// Derive the literal's type from its element types.
  fn classify_elements(&mut self, span: Span, hels: &[hir::Expr], n: u64) -> Type {
    if hels.iter().any(|e| e.ty == Type::Error) { return Type::Error }

    let mut ct: Option<CtElem> = None;
    let mut concrete: Option<Type> = None;
    let mut ct_arr: Option<CtArrayTy> = None;
    let mut conc_arr: Option<ArrayTy> = None;
    let mut scalars = 0usize;
    let mut arrays = 0usize;
    for e in hels {
      match &e.ty {
        Type::ComptimeInt => {
          scalars += 1;
          ct.get_or_insert(CtElem::Int);
        }
        Type::ComptimeFloat => {
          scalars += 1;
          ct = Some(CtElem::Float);
        }
        Type::ComptimeArray(a) => {
          arrays += 1;
          if let Some(prev) = &mut ct_arr {
            if prev.dims != a.dims {
              self.diags.emit(e.span, ErrorKind::InconsistentArrayDimensions,
                format!("Inconsistent inner array dimensions: expected {}, got {}",
                  fmt_ct_dims(&prev.dims), fmt_ct_dims(&a.dims)));
              return Type::Error
            }
            if a.elem == CtElem::Float { prev.elem = CtElem::Float }
          } else {
            ct_arr = Some(a.clone());
          }
        }
        Type::Array(a) => {
          arrays += 1;
          if let Some(prev) = &conc_arr {
            if prev.dims != a.dims {
              self.diags.emit(e.span, ErrorKind::InconsistentArrayDimensions,
                format!("Inconsistent inner array dimensions: expected {}, got {}",
                  Type::Array(prev.clone()), Type::Array(a.clone())));
              return Type::Error
            }
            if prev.elem != a.elem {
              self.diags.emit(e.span, ErrorKind::MixedArrayRequiresContext,
                format!("Mixed element types in array literal: {} and {}. \
                         Provide an explicit array type context", prev.elem, a.elem));
              return Type::Error
            }
          } else {
            conc_arr = Some(a.clone());
          }
        }
        Type::Range(_) => {
          self.diags.emit(e.span, ErrorKind::TypeMismatch,
            "Arrays of ranges are not supported");
          return Type::Error
        }
        t => {
          scalars += 1;
          if let Some(c) = &concrete {
            if c != t {
              self.diags.emit(e.span, ErrorKind::MixedArrayRequiresContext,
                format!("Mixed element types in array literal: {c} and {t}. \
                         Provide an explicit array type context"));
              return Type::Error
            }
          } else {
            concrete = Some(t.clone());
          }
        }
      }
    }

    if scalars > 0 && arrays > 0 {
      self.diags.emit(span, ErrorKind::InconsistentArrayDimensions,
        "Inconsistent array literal: scalar and array elements cannot mix");
      return Type::Error
    }
    if ct_arr.is_some() && conc_arr.is_some() {
      self.diags.emit(span, ErrorKind::MixedArrayRequiresContext,
        "Mixed concrete/comptime element types require explicit array context");
      return Type::Error
    }
    match (ct, concrete) {
      (Some(_), Some(c)) => {
        self.diags.emit(span, ErrorKind::MixedArrayRequiresContext,
          format!("Mixed concrete/comptime element types require explicit array context \
                   (found {c} among comptime elements)"));
        Type::Error
      }
      (Some(elem), None) => {
        let mut dims = SmallVec::new();
        dims.push(n);
        Type::ComptimeArray(CtArrayTy { elem, dims })
      }
      (None, Some(c)) => {
        let mut dims: Dims = SmallVec::new();
        dims.push(Dim::Fixed(n));
        Type::Array(ArrayTy::new(c, dims))
      }
      (None, None) => {
        if let Some(a) = ct_arr {
          let mut dims = SmallVec::new();
          dims.push(n);
          dims.extend(a.dims);
          Type::ComptimeArray(CtArrayTy { elem: a.elem, dims })
        } else if let Some(a) = conc_arr {
          let mut dims: Dims = SmallVec::new();
          dims.push(Dim::Fixed(n));
          dims.extend(a.dims);
          Type::Array(ArrayTy { elem: a.elem, dims })
        } else {
          Type::Error
        }
      }
    }
  }

  /// Implicitly adapt an array value to an array target: dimensions match
  /// pairwise (wildcards accept anything) and comptime elements resolve into
  /// the target element type.
  pub(crate) fn adapt_array(&mut self, e: hir::Expr, tgt: &ArrayTy) -> hir::Expr {
    let tty = Type::Array(tgt.clone());
    match e.ty.clone() {
      Type::ComptimeArray(ca) => {
        if ca.dims.len() != tgt.dims.len() {
          self.diags.emit(e.span, ErrorKind::TypeMismatch,
            format!("Type mismatch: expected {tty}, got {}", e.ty));
          return hir::Expr { ty: tty, ..e }
        }
        for (&s, &t) in ca.dims.iter().zip(tgt.dims.iter()) {
          if let Dim::Fixed(d) = t {
            if d != s {
              self.diags.emit(e.span, ErrorKind::ArraySizeMismatch,
                format!("Array size mismatch: expected {d} elements, got {s}"));
            }
          }
        }
        match (ca.elem, &*tgt.elem) {
          (CtElem::Int, t) if t.is_numeric() => {}
          (CtElem::Float, Type::F32 | Type::F64) => {}
          (CtElem::Float, Type::I32 | Type::I64) => {
            self.diags.emit_hint(e.span, ErrorKind::PotentialTruncation,
              format!("Potential truncation: comptime_float array values may not fit in \
                       {tty}. Use explicit conversion: 'value:{tty}'"),
              format!("value:{tty}"));
          }
          (CtElem::Float, Type::Usize) => {
            self.diags.emit(e.span, ErrorKind::TypeMismatch,
              format!("Type mismatch: float array values cannot convert to {tty}"));
          }
          _ => {
            self.diags.emit(e.span, ErrorKind::TypeMismatch,
              format!("Type mismatch: expected {tty}, got {}", e.ty));
          }
        }
        let dims: Dims = ca.dims.iter().map(|&d| Dim::Fixed(d)).collect();
        hir::Expr { ty: Type::Array(ArrayTy { elem: tgt.elem.clone(), dims }), ..e }
      }
      Type::Array(sa) => {
        if sa.dims.len() != tgt.dims.len() {
          self.diags.emit(e.span, ErrorKind::TypeMismatch,
            format!("Type mismatch: expected {tty}, got {}", e.ty));
          return hir::Expr { ty: tty, ..e }
        }
        if sa.elem != tgt.elem {
          self.diags.emit_hint(e.span, ErrorKind::TypeMismatch,
            format!("Array element type mismatch: expected {tty}, got {}. \
                     Use explicit conversion: 'value:{tty}'", e.ty),
            format!("value:{tty}"));
        }
        let mut dims: Dims = SmallVec::new();
        for (&s, &t) in sa.dims.iter().zip(tgt.dims.iter()) {
          match (s, t) {
            (Dim::Fixed(sn), Dim::Fixed(tn)) if sn != tn => {
              self.diags.emit(e.span, ErrorKind::ArraySizeMismatch,
                format!("Array size mismatch: expected {tn} elements, got {sn}"));
              dims.push(t);
            }
            (Dim::Infer, Dim::Fixed(_)) => dims.push(t),
            (s, _) => dims.push(s),
          }
        }
        hir::Expr { ty: Type::Array(ArrayTy { elem: tgt.elem.clone(), dims }), ..e }
      }
      Type::Error => e,
      _ => {
        self.diags.emit(e.span, ErrorKind::TypeMismatch,
          format!("Type mismatch: expected {tty}, got {}", e.ty));
        hir::Expr { ty: tty, ..e }
      }
    }
  }

  /// Apply an explicit array conversion `value:[dims]T`. Dimensional
  /// flattening is allowed; only the total element count must agree.
  pub(crate) fn convert_array(&mut self, span: Span, e: hir::Expr, tgt: Type) -> hir::Expr {
    let Type::Array(ta) = &tgt else { unreachable!("convert_array to non-array") };
    let (src_elem, src_total) = match &e.ty {
      Type::ComptimeArray(ca) => (ca.elem.scalar(), Some(ca.total())),
      Type::Array(sa) => ((*sa.elem).clone(), sa.total()),
      _ => unreachable!("convert_array from non-array"),
    };
    let tgt_fixed: u64 = ta.dims.iter().filter_map(|d| d.fixed()).product();
    let wildcards = ta.dims.iter().filter(|d| d.fixed().is_none()).count();
    if let Some(s) = src_total {
      let bad = if wildcards == 0 { tgt_fixed != s } else { s % tgt_fixed.max(1) != 0 };
      if bad {
        self.diags.emit(span, ErrorKind::ArraySizeMismatch,
          format!("Array size mismatch in type conversion: expected {tgt_fixed} elements, \
                   got {s}"));
      }
    }
    match conv::fit_scalar(&src_elem, &ta.elem) {
      Fit::Ok | Fit::Explicit(_) => {}
      Fit::Forbidden(Refusal::FloatToUsize) => {
        self.diags.emit(span, ErrorKind::ForbiddenConversion,
          format!("Conversion from {} to {tgt} is forbidden: \
                   float values cannot convert to usize", e.ty));
      }
      Fit::Forbidden(_) => {
        self.diags.emit(span, ErrorKind::ForbiddenConversion,
          format!("Conversion from {} to {tgt} is not allowed", e.ty));
      }
    }
    // A single wildcard dim takes whatever the totals leave for it.
    let mut dims = ta.dims.clone();
    if wildcards == 1 && tgt_fixed > 0 {
      if let Some(s) = src_total {
        for d in &mut dims {
          if d.fixed().is_none() { *d = Dim::Fixed(s / tgt_fixed) }
        }
      }
    }
    let ty = Type::Array(ArrayTy { elem: ta.elem.clone(), dims });
    hir::Expr { span, ty, k: hir::ExprKind::Convert(Box::new(e)) }
  }

  /// Analyze `a[index]`: integer indexing peels a dimension, range indexing
  /// produces a sub-array, and `a[..]` is the idiomatic full copy.
  pub(crate) fn infer_index(
    &mut self, span: Span, arr: &ast::Expr, index: &ast::Expr,
  ) -> hir::Expr {
    let a = self.infer_expr(arr, None);
    if matches!(index.k, ast::ExprKind::Range { .. }) {
      let r = self.infer_range(index, None);
      let r = self.check_index_range(r);
      return self.slice_result(span, a, r)
    }
    let i = self.infer_expr(index, None);
    // A variable holding a range slices like a range literal does.
    if matches!(i.ty, Type::Range(_)) {
      let r = self.check_index_range(i);
      return self.slice_result(span, a, r)
    }
    if !i.ty.is_integer() && i.ty != Type::Error {
      self.diags.emit(i.span, ErrorKind::InvalidArrayIndex,
        format!("Array index must be an integer type, got {}", i.ty));
    }
    let ty = match &a.ty {
      Type::Array(sa) => sa.peeled(),
      Type::ComptimeArray(ca) => ca.peeled(),
      Type::Error => Type::Error,
      t => {
        self.diags.emit(a.span, ErrorKind::TypeMismatch,
          format!("Cannot index non-array type {t}"));
        Type::Error
      }
    };
    hir::Expr { span, ty, k: hir::ExprKind::Index { arr: Box::new(a), index: Box::new(i) } }
  }

  /// The type of `a[range]`. A fully unbounded range copies the whole array;
  /// otherwise the first dimension becomes the range's length, inferred when
  /// the length is a runtime quantity.
  fn slice_result(&mut self, span: Span, a: hir::Expr, r: hir::Expr) -> hir::Expr {
    let full_copy = matches!(&r.k,
      hir::ExprKind::Range { start: None, end: None, step: None, .. });
    let ty = match &a.ty {
      Type::Error => Type::Error,
      Type::Array(sa) => {
        if full_copy {
          a.ty.clone()
        } else {
          let dim = slice_len(sa.dims[0].fixed(), &r).map_or(Dim::Infer, Dim::Fixed);
          let mut dims = sa.dims.clone();
          dims[0] = dim;
          Type::Array(ArrayTy { elem: sa.elem.clone(), dims })
        }
      }
      Type::ComptimeArray(ca) => {
        if full_copy {
          a.ty.clone()
        } else if let Some(n) = slice_len(Some(ca.dims[0]), &r) {
          let mut dims = ca.dims.clone();
          dims[0] = n;
          Type::ComptimeArray(CtArrayTy { elem: ca.elem, dims })
        } else {
          // A runtime-sized slice of a comptime array is a runtime value.
          let mut dims: Dims = ca.dims.iter().map(|&d| Dim::Fixed(d)).collect();
          dims[0] = Dim::Infer;
          Type::Array(ArrayTy::new(ca.elem.scalar().defaulted(), dims))
        }
      }
      t => {
        self.diags.emit(a.span, ErrorKind::TypeMismatch,
          format!("Cannot index non-array type {t}"));
        Type::Error
      }
    };
    hir::Expr { span, ty, k: hir::ExprKind::Slice { arr: Box::new(a), range: Box::new(r) } }
  }

  /// Check the copy-syntax discipline for an array argument: the source must
  /// be fresh (a literal, call, inline block or slice) or written `var[..]`.
  pub(crate) fn check_array_argument(
    &mut self, fname: crate::Symbol, arg: &ast::Expr, param_ty: &Type,
  ) {
    if !param_ty.is_array() { return }
    if let ast::ExprKind::Ident(name) = &arg.k {
      let is_array_var = self.scopes.lookup(*name).is_some_and(|info| info.ty.is_array());
      if is_array_var {
        self.diags.emit_hint(arg.span, ErrorKind::MissingExplicitCopy,
          format!("Missing explicit copy syntax: array argument '{name}' must be copied \
                   explicitly. Use '{fname}({name}[..])'"),
          format!("{fname}({name}[..])"));
      }
    }
  }
}

/// The element count of a partially-bounded index range against a source
/// dimension: missing bounds default to `0` and the array length.
fn slice_len(src_dim: Option<u64>, r: &hir::Expr) -> Option<u64> {
  let hir::ExprKind::Range { start, end, step, inclusive } = &r.k else { return None };
  if start.is_some() && end.is_some() {
    return static_range_len(r)
  }
  // Absent bounds default to 0 and the array length.
  let dim = src_dim?;
  let get = |b: &Option<Box<hir::Expr>>, dflt: u64| -> Option<u64> {
    match b.as_deref() {
      Some(e) => e.const_int()?.try_into().ok(),
      None => Some(dflt),
    }
  };
  let s = get(start, 0)?;
  let e = get(end, dim)?;
  let step_n: u64 = match step.as_deref() {
    Some(st) => st.const_int()?.try_into().ok()?,
    None => 1,
  };
  if step_n == 0 || e < s { return Some(0) }
  let span = e - s;
  Some(if *inclusive && end.is_some() { span / step_n + 1 } else { span.div_ceil(step_n) })
}

fn fmt_ct_dims(dims: &SmallVec<[u64; 4]>) -> String {
  format!("[{}]", dims.iter().format("]["))
}

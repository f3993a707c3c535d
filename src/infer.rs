//! Context-propagating expression analysis.
//!
//! The entry point is [`Analyzer::infer_expr`], which resolves an expression
//! under an optional target type. Literals are born comptime and resolve the
//! moment a concrete target reaches them, which is also where their value is
//! checked against the target's representable range. Targets flow *into*
//! expressions (declaration annotations, assignment targets, parameter types,
//! return types); sub-engines for arrays, ranges, blocks and calls live in
//! their own modules and are dispatched from here.

use num::BigInt;
use num::traits::{FromPrimitive, Pow, ToPrimitive};
use crate::{Analyzer, Symbol, intern};
use crate::conv::{self, Fit, Loss, Refusal};
use crate::diag::ErrorKind;
use crate::types::Span;
use crate::types::ast::{self, Binop, Unop};
use crate::types::hir;
use crate::types::ty::{RangeTy, Type};

impl Analyzer {
  /// Resolve a syntactic type annotation to a semantic type.
  pub(crate) fn resolve_ty(&mut self, ty: &ast::Ty) -> Type {
    match &ty.k {
      ast::TyKind::I32 => Type::I32,
      ast::TyKind::I64 => Type::I64,
      ast::TyKind::F32 => Type::F32,
      ast::TyKind::F64 => Type::F64,
      ast::TyKind::Usize => Type::Usize,
      ast::TyKind::Bool => Type::Bool,
      ast::TyKind::Str => Type::Str,
      ast::TyKind::Void => Type::Void,
      ast::TyKind::Array { .. } => self.resolve_array_ty(ty),
      ast::TyKind::Range(elem) => {
        let elem = self.resolve_ty(elem);
        if elem.is_numeric() && elem.is_concrete() {
          Type::Range(RangeTy::annotated(elem))
        } else {
          if elem != Type::Error {
            self.diags.emit(ty.span, ErrorKind::TypeMismatch,
              format!("Range element type must be numeric, got {elem}"));
          }
          Type::Error
        }
      }
    }
  }

  /// Analyze an expression under an optional target type, adapting the
  /// result to the target.
  pub(crate) fn infer_expr(&mut self, e: &ast::Expr, tgt: Option<&Type>) -> hir::Expr {
    let r = self.infer_expr_raw(e, tgt);
    let r = match tgt {
      Some(t) => self.coerce(r, t),
      None => r,
    };
    // Literals stay compile-time constants even once a target makes them
    // concrete; everything else concrete makes the surrounding block a
    // runtime block.
    let constant = matches!(r.k,
      hir::ExprKind::Int(_) | hir::ExprKind::Float(_) |
      hir::ExprKind::Bool(_) | hir::ExprKind::Str(_));
    if !constant && r.ty.is_concrete() && r.ty != Type::Void {
      self.runtime_touched = true;
    }
    r
  }

  /// Analyze an expression without the final target adaptation. Binary
  /// operands come through here so the operand-unification rules, not the
  /// assignment rules, decide how concrete operands meet the target.
  fn infer_expr_raw(&mut self, e: &ast::Expr, tgt: Option<&Type>) -> hir::Expr {
    let span = e.span;
    match &e.k {
      ast::ExprKind::Int(text) => self.int_literal(span, text, tgt),
      ast::ExprKind::Float(text) => self.float_literal(span, text, tgt),
      ast::ExprKind::Bool(b) =>
        hir::Expr { span, ty: Type::Bool, k: hir::ExprKind::Bool(*b) },
      ast::ExprKind::Str(s) =>
        hir::Expr { span, ty: Type::Str, k: hir::ExprKind::Str(s.clone()) },
      ast::ExprKind::Ident(name) => self.infer_ident(span, *name),
      ast::ExprKind::Unop(op, e) => self.infer_unop(span, *op, e, tgt),
      ast::ExprKind::Binop(op, l, r) => self.infer_binop(span, *op, l, r, tgt),
      ast::ExprKind::Call { f, args } => self.infer_call(span, f, args),
      ast::ExprKind::Index { arr, index } => self.infer_index(span, arr, index),
      ast::ExprKind::Range { .. } => self.infer_range(e, tgt),
      ast::ExprKind::Array(elems) => self.infer_array(span, elems, tgt),
      ast::ExprKind::Convert { e, ty } => self.infer_convert(span, e, ty),
      ast::ExprKind::Block(b) => self.infer_block_expr(span, b, tgt),
      ast::ExprKind::If(chain) => self.infer_if_expr(span, chain, tgt),
      ast::ExprKind::Field { e, name } => self.infer_field(span, e, *name),
    }
  }

  /// Adapt an analyzed expression to a target type, reporting any rule the
  /// adaptation breaks. The result carries the target type even on error, so
  /// one mistake does not cascade.
  pub(crate) fn coerce(&mut self, e: hir::Expr, tgt: &Type) -> hir::Expr {
    if e.ty == *tgt || e.ty == Type::Error || *tgt == Type::Error { return e }
    match tgt {
      Type::Array(a) => return self.adapt_array(e, a),
      Type::Range(r) => return self.adapt_range(e, r),
      _ => {}
    }
    if e.ty.is_array() || matches!(e.ty, Type::Range(_)) {
      self.diags.emit(e.span, ErrorKind::TypeMismatch,
        format!("Type mismatch: expected {tgt}, got {}", e.ty));
      return hir::Expr { ty: tgt.clone(), ..e }
    }
    let src = e.ty.clone();
    match conv::fit_scalar(&src, tgt) {
      Fit::Ok => {
        if let Some(v) = e.const_int() {
          let lit = v.to_string();
          self.check_int_literal(e.span, v, &lit, tgt);
        } else if let Some(v) = e.const_float() {
          self.check_float_literal(e.span, v, &v.to_string(), tgt);
        }
        hir::Expr { ty: tgt.clone(), ..e }
      }
      Fit::Explicit(loss) => {
        let (kind, what) = match loss {
          Loss::Truncation => (ErrorKind::PotentialTruncation, "truncation"),
          Loss::Precision => (ErrorKind::PotentialPrecisionLoss, "precision loss"),
          Loss::Free => (ErrorKind::TypeMismatch, "mismatch"),
        };
        let msg = if loss == Loss::Free {
          format!("Type mismatch: expected {tgt}, got {src}. {}", conv::suggest(tgt))
        } else {
          format!("Potential {what}: {src} value may not fit in {tgt}. {}", conv::suggest(tgt))
        };
        self.diags.emit_hint(e.span, kind, msg, format!("value:{tgt}"));
        hir::Expr { ty: tgt.clone(), ..e }
      }
      Fit::Forbidden(refusal) => {
        let mut msg = format!("Type mismatch: expected {tgt}, got {src}");
        match refusal {
          Refusal::FloatToUsize =>
            msg = format!("Type mismatch: float type {src} cannot convert to usize"),
          r => if let Some(s) = r.suggestion() {
            msg.push_str(". ");
            let mut chars = s.chars();
            if let Some(c) = chars.next() {
              msg.push(c.to_ascii_uppercase());
              msg.push_str(chars.as_str());
            }
          }
        }
        self.diags.emit(e.span, ErrorKind::TypeMismatch, msg);
        hir::Expr { ty: tgt.clone(), ..e }
      }
    }
  }

  fn int_literal(&mut self, span: Span, text: &str, tgt: Option<&Type>) -> hir::Expr {
    let Some(value) = parse_int_text(text) else {
      self.diags.emit(span, ErrorKind::InternalError,
        format!("malformed integer literal '{text}'"));
      return hir::Expr::error(span)
    };
    self.int_literal_node(span, value, text, tgt)
  }

  fn int_literal_node(
    &mut self, span: Span, value: BigInt, text: &str, tgt: Option<&Type>,
  ) -> hir::Expr {
    let ty = match tgt {
      Some(t) if t.is_numeric() && t.is_concrete() => {
        self.check_int_literal(span, &value, text, t);
        t.clone()
      }
      _ => Type::ComptimeInt,
    };
    hir::Expr { span, ty, k: hir::ExprKind::Int(value) }
  }

  fn float_literal(&mut self, span: Span, text: &str, tgt: Option<&Type>) -> hir::Expr {
    let Ok(value) = text.replace('_', "").parse::<f64>() else {
      self.diags.emit(span, ErrorKind::InternalError,
        format!("malformed float literal '{text}'"));
      return hir::Expr::error(span)
    };
    self.float_literal_node(span, value, text, tgt)
  }

  fn float_literal_node(
    &mut self, span: Span, value: f64, text: &str, tgt: Option<&Type>,
  ) -> hir::Expr {
    let ty = match tgt {
      Some(t @ (Type::F32 | Type::F64)) => {
        self.check_float_literal(span, value, text, t);
        t.clone()
      }
      // Integer and usize targets go through the conversion rules, which
      // demand explicit syntax (or refuse outright for usize).
      _ => Type::ComptimeFloat,
    };
    hir::Expr { span, ty, k: hir::ExprKind::Float(value) }
  }

  /// Validate that an integer literal is representable in `tgt`, quoting the
  /// literal as written.
  pub(crate) fn check_int_literal(&mut self, span: Span, value: &BigInt, lit: &str, tgt: &Type) {
    match tgt {
      Type::I32 | Type::I64 | Type::Usize => {
        let (lo, hi) = tgt.int_bounds(self.cfg.usize_bits).expect("integer bounds");
        if *value < lo || *value > hi {
          let range = tgt.range_description(self.cfg.usize_bits).expect("integer range");
          let hint = widened_int_suggestion(value, lit, tgt);
          let msg = format!("Literal {lit} overflows {tgt} range. Expected: {range}");
          match hint {
            Some(hint) => self.diags.emit_hint(span, ErrorKind::LiteralOverflow, msg, hint),
            None => self.diags.emit(span, ErrorKind::LiteralOverflow, msg),
          }
        }
      }
      Type::F32 | Type::F64 => {
        if !int_fits_float_range(value, tgt) {
          let range = tgt.range_description(self.cfg.usize_bits).expect("float range");
          self.diags.emit(span, ErrorKind::LiteralOverflow,
            format!("Literal {lit} overflows {tgt} range. Expected: {range}"));
        } else if !int_fits_float_exactly(value, tgt) {
          self.diags.emit_hint(span, ErrorKind::PotentialPrecisionLoss,
            format!("Potential precision loss: {lit} cannot be represented exactly in {tgt}. {}",
              conv::suggest(tgt)),
            format!("value:{tgt}"));
        }
      }
      _ => {}
    }
  }

  /// Validate that a float literal is in range for `tgt`.
  fn check_float_literal(&mut self, span: Span, value: f64, lit: &str, tgt: &Type) {
    let overflows = match tgt {
      Type::F32 => value.is_finite() && value.abs() > f64::from(f32::MAX),
      Type::F64 => value.is_infinite(),
      _ => return,
    };
    if overflows {
      let range = tgt.range_description(self.cfg.usize_bits).expect("float range");
      self.diags.emit(span, ErrorKind::LiteralOverflow,
        format!("Literal {lit} overflows {tgt} range. Expected: {range}"));
    }
  }

  fn infer_ident(&mut self, span: Span, name: Symbol) -> hir::Expr {
    let Some(info) = self.scopes.lookup(name) else {
      self.diags.emit(span, ErrorKind::UndefinedVariable,
        format!("Undefined variable: '{name}'"));
      return hir::Expr::error(span)
    };
    let ty = info.ty.clone();
    let initialized = info.initialized;
    if !initialized {
      self.diags.emit(span, ErrorKind::UseOfUninitialized,
        format!("Use of uninitialized variable: '{name}'. Assign a value before reading it"));
    }
    hir::Expr { span, ty, k: hir::ExprKind::Var(name) }
  }

  fn infer_unop(
    &mut self, span: Span, op: Unop, operand: &ast::Expr, tgt: Option<&Type>,
  ) -> hir::Expr {
    match op {
      Unop::Neg => {
        // Fold literal negation, so `-2147483648` range-checks as one value.
        match &operand.k {
          ast::ExprKind::Int(text) => if let Some(v) = parse_int_text(text) {
            return self.int_literal_node(span, -v, &format!("-{text}"), tgt)
          },
          ast::ExprKind::Float(text) => if let Ok(v) = text.replace('_', "").parse::<f64>() {
            return self.float_literal_node(span, -v, &format!("-{text}"), tgt)
          },
          _ => {}
        }
        let tnum = tgt.filter(|t| t.is_numeric());
        let e = self.infer_expr_raw(operand, tnum);
        let ty = if e.ty.is_numeric() || e.ty == Type::Error {
          e.ty.clone()
        } else {
          self.diags.emit(span, ErrorKind::TypeMismatch,
            format!("Unary '-' requires a numeric operand, got {}", e.ty));
          Type::Error
        };
        hir::Expr { span, ty, k: hir::ExprKind::Unop(op, Box::new(e)) }
      }
      Unop::Not => {
        let e = self.infer_expr_raw(operand, None);
        let ty = if matches!(e.ty, Type::Bool | Type::Error) {
          Type::Bool
        } else {
          self.diags.emit(span, ErrorKind::TypeMismatch,
            format!("Unary '!' requires a bool operand, got {}", e.ty));
          Type::Error
        };
        hir::Expr { span, ty, k: hir::ExprKind::Unop(op, Box::new(e)) }
      }
    }
  }

  fn infer_binop(
    &mut self, span: Span, op: Binop, lhs: &ast::Expr, rhs: &ast::Expr, tgt: Option<&Type>,
  ) -> hir::Expr {
    if op.is_arith() {
      let tnum = tgt.filter(|t| t.is_numeric() && t.is_concrete());
      let l = self.infer_expr_raw(lhs, tnum);
      let r = self.infer_expr_raw(rhs, tnum);
      let ty = self.unify_arith(span, op, &l.ty, &r.ty, tnum);
      let l = self.adapt_operand(l, &ty);
      let r = self.adapt_operand(r, &ty);
      hir::Expr { span, ty, k: hir::ExprKind::Binop(op, Box::new(l), Box::new(r)) }
    } else if op.is_cmp() {
      let l = self.infer_expr_raw(lhs, None);
      let r = self.infer_expr_raw(rhs, None);
      let operand_ty = self.unify_cmp(span, op, &l.ty, &r.ty);
      let l = self.adapt_operand(l, &operand_ty);
      let r = self.adapt_operand(r, &operand_ty);
      let ty = if operand_ty == Type::Error { Type::Error } else { Type::Bool };
      hir::Expr { span, ty, k: hir::ExprKind::Binop(op, Box::new(l), Box::new(r)) }
    } else {
      let l = self.infer_expr_raw(lhs, None);
      let r = self.infer_expr_raw(rhs, None);
      for e in [&l, &r] {
        if !matches!(e.ty, Type::Bool | Type::Error) {
          self.diags.emit(e.span, ErrorKind::TypeMismatch,
            format!("Logical '{}' requires bool operands, got {}", op.as_str(), e.ty));
        }
      }
      hir::Expr { span, ty: Type::Bool, k: hir::ExprKind::Binop(op, Box::new(l), Box::new(r)) }
    }
  }

  /// Resolve a comptime operand into the operation's result type; concrete
  /// operands keep their own type (the operation, not the operand, carries
  /// the adaptation).
  fn adapt_operand(&mut self, e: hir::Expr, ty: &Type) -> hir::Expr {
    if e.ty.is_comptime() && ty.is_concrete() { self.coerce(e, ty) } else { e }
  }

  /// The result type of an arithmetic operation, §4.3 order: comptime pairs
  /// unify, a lone comptime adapts to its concrete partner, and two distinct
  /// concrete types resolve only through the propagated target.
  fn unify_arith(
    &mut self, span: Span, op: Binop, lt: &Type, rt: &Type, tgt: Option<&Type>,
  ) -> Type {
    if *lt == Type::Error || *rt == Type::Error { return Type::Error }
    if !lt.is_numeric() || !rt.is_numeric() {
      self.diags.emit(span, ErrorKind::TypeMismatch,
        format!("Binary '{}' requires numeric operands, got {lt} and {rt}", op.as_str()));
      return Type::Error
    }
    match (lt.is_comptime(), rt.is_comptime()) {
      (true, true) =>
        if lt.is_float() || rt.is_float() { Type::ComptimeFloat } else { Type::ComptimeInt },
      (true, false) => rt.clone(),
      (false, true) => lt.clone(),
      (false, false) if lt == rt => lt.clone(),
      (false, false) => match tgt {
        Some(t) => t.clone(),
        None => {
          self.diags.emit_hint(span, ErrorKind::MixedConcreteRequiresContext,
            format!("Mixed-type operation requires explicit result type: \
                     {lt} {} {rt}. Annotate the result type or convert an operand explicitly",
              op.as_str()),
            format!("value:{lt}"));
          Type::Error
        }
      },
    }
  }

  /// The common operand type of a comparison. The result is always `bool`;
  /// no outer target reaches the operands.
  fn unify_cmp(&mut self, span: Span, op: Binop, lt: &Type, rt: &Type) -> Type {
    if *lt == Type::Error || *rt == Type::Error { return Type::Error }
    if lt.is_numeric() && rt.is_numeric() {
      return match (lt.is_comptime(), rt.is_comptime()) {
        (true, true) =>
          if lt.is_float() || rt.is_float() { Type::ComptimeFloat } else { Type::ComptimeInt },
        (true, false) => rt.clone(),
        (false, true) => lt.clone(),
        (false, false) if lt == rt => lt.clone(),
        (false, false) => {
          self.diags.emit(span, ErrorKind::MixedConcreteRequiresContext,
            format!("Mixed-type operation: cannot compare {lt} with {rt}. \
                     Convert one operand explicitly"));
          Type::Error
        }
      }
    }
    if op.is_eq() && lt == rt && matches!(lt, Type::Bool | Type::Str) {
      return lt.clone()
    }
    self.diags.emit(span, ErrorKind::TypeMismatch,
      format!("Comparison '{}' cannot relate {lt} and {rt}", op.as_str()));
    Type::Error
  }

  fn infer_convert(&mut self, span: Span, inner: &ast::Expr, ty: &ast::Ty) -> hir::Expr {
    // The inner expression is analyzed without the target as context: the
    // conversion states the intent, the operand keeps its own type.
    let e = self.infer_expr_raw(inner, None);
    let tgt = self.resolve_ty(ty);
    self.apply_explicit(span, e, tgt)
  }

  /// Apply an explicit `value:T` conversion to an analyzed operand.
  pub(crate) fn apply_explicit(&mut self, span: Span, e: hir::Expr, tgt: Type) -> hir::Expr {
    if e.ty == Type::Error || tgt == Type::Error || e.ty == tgt {
      return hir::Expr { span, ty: tgt, k: hir::ExprKind::Convert(Box::new(e)) }
    }
    match (&e.ty, &tgt) {
      (Type::Array(_) | Type::ComptimeArray(_), Type::Array(_)) =>
        return self.convert_array(span, e, tgt),
      (Type::Range(_), Type::Range(_)) =>
        return self.convert_range(span, e, tgt),
      _ => {}
    }
    if e.ty.is_array() || matches!(e.ty, Type::Range(_)) ||
       tgt.is_array() || matches!(tgt, Type::Range(_)) {
      self.diags.emit(span, ErrorKind::ForbiddenConversion,
        format!("Conversion from {} to {tgt} is not allowed", e.ty));
      return hir::Expr { span, ty: tgt, k: hir::ExprKind::Convert(Box::new(e)) }
    }
    match conv::fit_scalar(&e.ty, &tgt) {
      Fit::Ok | Fit::Explicit(_) => {
        // Allowed with explicit syntax; literal values must still fit.
        if let Some(v) = e.const_int() {
          let lit = v.to_string();
          self.check_int_literal(span, v, &lit, &tgt);
        } else if let Some(v) = e.const_float() {
          if matches!(tgt, Type::F32 | Type::F64) {
            self.check_float_literal(span, v, &v.to_string(), &tgt);
          }
        }
      }
      Fit::Forbidden(refusal) => {
        let src = &e.ty;
        let msg = match refusal {
          Refusal::FloatToUsize =>
            format!("Conversion from float type {src} to usize is forbidden"),
          Refusal::Parse =>
            format!("Cannot convert string to {tgt}. Use parsing functions instead"),
          Refusal::Format =>
            format!("Cannot convert {src} to string. Use formatting functions instead"),
          Refusal::Comparison =>
            format!("Cannot convert {src} to {tgt}. \
                     Use an explicit comparison instead (e.g. 'value != 0')"),
          Refusal::Incompatible =>
            format!("Conversion from {src} to {tgt} is not allowed"),
        };
        self.diags.emit(span, ErrorKind::ForbiddenConversion, msg);
      }
    }
    hir::Expr { span, ty: tgt, k: hir::ExprKind::Convert(Box::new(e)) }
  }

  fn infer_field(&mut self, span: Span, base: &ast::Expr, name: Symbol) -> hir::Expr {
    let e = self.infer_expr_raw(base, None);
    if name != intern("length") {
      self.diags.emit(span, ErrorKind::PropertyNotFound,
        format!("Unknown property '{name}': only 'length' is supported"));
      return hir::Expr { span, ty: Type::Error, k: hir::ExprKind::Length(Box::new(e)) }
    }
    let ty = if e.ty.is_array() || e.ty == Type::Error {
      // Adapts to any integer context; for inferred-size parameters the read
      // happens at runtime but types the same way.
      Type::ComptimeInt
    } else {
      self.diags.emit(span, ErrorKind::PropertyNotFound,
        format!("Property 'length' is only available on array types, got {}", e.ty));
      Type::Error
    };
    hir::Expr { span, ty, k: hir::ExprKind::Length(Box::new(e)) }
  }
}

/// Suggest the narrowest wider integer type an overflowing literal fits.
fn widened_int_suggestion(value: &BigInt, lit: &str, tgt: &Type) -> Option<String> {
  let fits_i64 = *value >= BigInt::from(i64::MIN) && *value <= BigInt::from(i64::MAX);
  match tgt {
    Type::I32 if fits_i64 => Some(format!("Use explicit conversion: '{lit}:i64'")),
    _ => None,
  }
}

/// True if the integer is within the finite range of the float type.
fn int_fits_float_range(value: &BigInt, tgt: &Type) -> bool {
  let max = match tgt {
    Type::F32 => BigInt::from_f64(f64::from(f32::MAX)).expect("finite"),
    Type::F64 => BigInt::from_f64(f64::MAX).expect("finite"),
    _ => return true,
  };
  *value >= -max.clone() && *value <= max
}

/// True if the integer round-trips through the float type unchanged.
fn int_fits_float_exactly(value: &BigInt, tgt: &Type) -> bool {
  let Some(approx) = value.to_f64() else { return false };
  let approx = match tgt {
    Type::F32 => f64::from(approx as f32),
    _ => approx,
  };
  BigInt::from_f64(approx) == Some(value.clone())
}

/// Parse an integer literal: decimal, `0x` hex, `0b` binary, or integral
/// scientific notation (`3e10`). Underscore separators are allowed.
pub(crate) fn parse_int_text(text: &str) -> Option<BigInt> {
  let t = text.replace('_', "");
  if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
    return BigInt::parse_bytes(hex.as_bytes(), 16)
  }
  if let Some(bin) = t.strip_prefix("0b").or_else(|| t.strip_prefix("0B")) {
    return BigInt::parse_bytes(bin.as_bytes(), 2)
  }
  if let Some((mantissa, exp)) = t.split_once(['e', 'E']) {
    let mantissa = BigInt::parse_bytes(mantissa.as_bytes(), 10)?;
    let exp: u32 = exp.parse().ok()?;
    return Some(mantissa * BigInt::from(10).pow(exp))
  }
  BigInt::parse_bytes(t.as_bytes(), 10)
}

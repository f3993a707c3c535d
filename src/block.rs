//! The unified block engine and the statements it dispatches.
//!
//! One syntactic construct `{ ... }` serves as function body, statement
//! block and expression block; the role comes from the surrounding context
//! and only changes the terminator rule. Every role pushes a lexical scope
//! and pops it on all exit paths, so the scope stack is balanced no matter
//! what errors turn up inside. An expression block must end with `-> value`
//! (or a `return` that leaves the function), and one that touched runtime
//! values may only appear under an explicit target type.

use std::mem;
use bitflags::bitflags;
use itertools::Itertools;
use crate::Analyzer;
use crate::diag::ErrorKind;
use crate::scope::{ScopeKind, VarInfo};
use crate::types::{Span, Spanned};
use crate::types::ast;
use crate::types::hir;
use crate::types::ty::Type;

bitflags! {
  /// Facts established while analyzing a block.
  #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
  pub(crate) struct BlockFlags: u8 {
    /// Every path through the block returns from the enclosing function.
    const RETURNS = 1 << 0;
    /// The block touched a concrete (runtime) value.
    const RUNTIME = 1 << 1;
  }
}

/// The role a block plays at its use site.
#[derive(Copy, Clone, Debug)]
pub(crate) enum BlockRole<'a> {
  /// A function body; `return` is the only way to produce a value.
  Body,
  /// A block in statement position; produces nothing.
  Stmt,
  /// A block in expression position, analyzed under an optional target.
  Expr(Option<&'a Type>),
}

impl Analyzer {
  /// Run `f` inside a fresh scope frame, popping it on the way out.
  pub(crate) fn with_scope<R>(
    &mut self, kind: ScopeKind, f: impl FnOnce(&mut Self) -> R,
  ) -> R {
    self.scopes.enter_scope(kind);
    let r = f(self);
    self.scopes.exit_scope();
    r
  }

  /// Analyze a block in a role, pushing a scope of the given kind.
  pub(crate) fn analyze_block(
    &mut self, span: Span, b: &ast::Block, role: BlockRole<'_>, kind: ScopeKind,
  ) -> (hir::Block, BlockFlags) {
    let saved = mem::replace(&mut self.runtime_touched, false);
    let (blk, mut flags) = self.with_scope(kind, |this| this.block_body(span, b, role));
    if self.runtime_touched { flags |= BlockFlags::RUNTIME }
    self.runtime_touched |= saved;
    (blk, flags)
  }

  fn block_body(
    &mut self, span: Span, b: &ast::Block, role: BlockRole<'_>,
  ) -> (hir::Block, BlockFlags) {
    let mut flags = BlockFlags::empty();
    let mut stmts = Vec::with_capacity(b.stmts.len());
    let mut ty = Type::Void;
    let mut terminated = false;
    let n = b.stmts.len();
    for (i, s) in b.stmts.iter().enumerate() {
      if let ast::StmtKind::Yield { value } = &s.k {
        let v = match role {
          BlockRole::Expr(target) => {
            if i + 1 == n {
              terminated = true;
              let v = self.infer_expr(value, target);
              ty = v.ty.clone();
              v
            } else {
              self.diags.emit(s.span, ErrorKind::TypeMismatch,
                "'-> value' must be the final statement of an expression block");
              self.infer_expr(value, target)
            }
          }
          BlockRole::Body | BlockRole::Stmt => {
            self.diags.emit(s.span, ErrorKind::TypeMismatch,
              "'-> value' is only valid in an expression block");
            self.infer_expr(value, None)
          }
        };
        stmts.push(Spanned::new(s.span, hir::StmtKind::Yield(v)));
        continue
      }
      let (st, sf) = self.analyze_stmt(s);
      flags |= sf & BlockFlags::RETURNS;
      stmts.push(st);
    }
    if let BlockRole::Expr(_) = role {
      let ends_in_return =
        matches!(b.stmts.last(), Some(s) if matches!(s.k, ast::StmtKind::Return { .. }));
      if !terminated {
        if ends_in_return || flags.contains(BlockFlags::RETURNS) {
          // The block leaves the function instead of producing a value.
          ty = Type::Error;
        } else {
          self.diags.emit(span, ErrorKind::ExpressionBlockMissingTerminator,
            "Expression block must end with '-> value' (or a return statement \
             that exits the function)");
          ty = Type::Error;
        }
      }
    }
    (hir::Block { stmts: stmts.into(), ty }, flags)
  }

  /// A block in expression position. Without a target type, a block that
  /// touched runtime values cannot have its type inferred.
  pub(crate) fn infer_block_expr(
    &mut self, span: Span, b: &ast::Block, tgt: Option<&Type>,
  ) -> hir::Expr {
    let (blk, flags) = self.analyze_block(span, b, BlockRole::Expr(tgt), ScopeKind::Block);
    if tgt.is_none() && flags.contains(BlockFlags::RUNTIME) && blk.ty != Type::Error {
      self.diags.emit(span, ErrorKind::RuntimeBlockRequiresContext,
        "Expression block producing runtime values requires an explicit type on the \
         receiving declaration");
    }
    let ty = blk.ty.clone();
    hir::Expr { span, ty, k: hir::ExprKind::Block(blk) }
  }

  fn analyze_stmt(&mut self, s: &ast::Stmt) -> (hir::Stmt, BlockFlags) {
    let span = s.span;
    match &s.k {
      ast::StmtKind::Let { mutable, name, ty, init } =>
        (Spanned::new(span, self.analyze_let(span, *mutable, name, ty, init)),
         BlockFlags::empty()),
      ast::StmtKind::Assign { name, value } =>
        (Spanned::new(span, self.analyze_assign(name, value)), BlockFlags::empty()),
      ast::StmtKind::Return { value } => {
        let v = self.analyze_return(span, value.as_ref());
        (Spanned::new(span, hir::StmtKind::Return(v)), BlockFlags::RETURNS)
      }
      ast::StmtKind::If(chain) => self.analyze_if_stmt(span, chain),
      ast::StmtKind::Expr(e) => {
        let e = self.infer_expr(e, None);
        (Spanned::new(span, hir::StmtKind::Expr(e)), BlockFlags::empty())
      }
      ast::StmtKind::Bare(b) => {
        let (blk, flags) = self.analyze_block(span, b, BlockRole::Stmt, ScopeKind::Block);
        (Spanned::new(span, hir::StmtKind::Bare(blk)), flags & BlockFlags::RETURNS)
      }
      ast::StmtKind::Yield { .. } => unreachable!("yield handled by the block walker"),
    }
  }

  fn analyze_let(
    &mut self, span: Span, mutable: bool, name: &Spanned<crate::Symbol>,
    ty: &Option<ast::Ty>, init: &Option<ast::Expr>,
  ) -> hir::StmtKind {
    let ann = ty.as_ref().map(|t| self.resolve_ty(t));
    let (sym_ty, init_hir, initialized) = match init {
      // `undef`: deferred initialization, `mut` only, annotation mandatory.
      None => {
        if !mutable {
          self.diags.emit_hint(span, ErrorKind::ValWithUndef,
            format!("val variable '{}' declared with undef is unusable: it cannot be \
                     assigned later. Use 'mut {}' for deferred initialization",
              name.k, name.k),
            format!("mut {}", name.k));
          (ann.unwrap_or(Type::Error), None, true)
        } else {
          let t = match &ann {
            Some(t) => t.clone(),
            None => {
              self.diags.emit(span, ErrorKind::TypeMismatch,
                format!("mut variable '{}' declared with undef requires an explicit type",
                  name.k));
              Type::Error
            }
          };
          (t, None, false)
        }
      }
      Some(e) => {
        let v = self.infer_expr(e, ann.as_ref());
        // `val` without an annotation keeps a comptime initializer flexible;
        // a `mut` cell needs a fixed representation, so it defaults.
        let sym_ty = match &ann {
          Some(_) => v.ty.clone(),
          None if mutable => v.ty.defaulted(),
          None => v.ty.clone(),
        };
        (sym_ty, Some(v), true)
      }
    };
    let info = VarInfo { ty: sym_ty.clone(), mutable, initialized, is_param: false };
    if self.scopes.declare(name.k, info).is_err() {
      self.diags.emit(name.span, ErrorKind::DuplicateVariable,
        format!("Variable '{}' is already declared in this scope", name.k));
    }
    hir::StmtKind::Let { mutable, name: name.k, ty: sym_ty.defaulted(), init: init_hir }
  }

  fn analyze_assign(
    &mut self, name: &Spanned<crate::Symbol>, value: &ast::Expr,
  ) -> hir::StmtKind {
    let Some(info) = self.scopes.lookup(name.k) else {
      self.diags.emit(name.span, ErrorKind::UndefinedVariable,
        format!("Undefined variable: '{}'", name.k));
      let v = self.infer_expr(value, None);
      return hir::StmtKind::Assign { name: name.k, value: v }
    };
    let (ty, mutable, initialized, is_param) =
      (info.ty.clone(), info.mutable, info.initialized, info.is_param);
    if !mutable {
      let noun = if is_param { "parameter" } else { "variable" };
      self.diags.emit(name.span, ErrorKind::AssignToImmutable,
        format!("Cannot assign to immutable {noun} '{}'. \
                 val variables can only be assigned once at declaration", name.k));
    }
    let v = self.infer_expr(value, Some(&ty));
    if mutable && !initialized {
      self.scopes.mark_initialized(name.k);
    }
    hir::StmtKind::Assign { name: name.k, value: v }
  }

  fn analyze_return(&mut self, span: Span, value: Option<&ast::Expr>) -> Option<hir::Expr> {
    let ret = self.cur_ret.clone();
    match (value, ret == Type::Void) {
      (Some(e), true) => {
        self.diags.emit(span, ErrorKind::ReturnInVoidFunction,
          format!("Void function '{}' cannot return a value", self.cur_fn));
        Some(self.infer_expr(e, None))
      }
      (Some(e), false) => Some(self.infer_expr(e, Some(&ret))),
      (None, false) => {
        self.diags.emit(span, ErrorKind::ReturnMissingValue,
          format!("Return statement missing a value: function '{}' returns {ret}",
            self.cur_fn));
        None
      }
      (None, true) => None,
    }
  }

  fn analyze_if_stmt(&mut self, span: Span, chain: &ast::IfChain) -> (hir::Stmt, BlockFlags) {
    let cond = self.check_cond(&chain.cond);
    let (then, tf) = self.analyze_block(span, &chain.then, BlockRole::Stmt, ScopeKind::Branch);
    let mut all_return = tf.contains(BlockFlags::RETURNS);
    let mut elifs = Vec::with_capacity(chain.elifs.len());
    for (c, b) in &chain.elifs {
      let c = self.check_cond(c);
      let (b, f) = self.analyze_block(span, b, BlockRole::Stmt, ScopeKind::Branch);
      all_return &= f.contains(BlockFlags::RETURNS);
      elifs.push((c, b));
    }
    let els = chain.els.as_ref().map(|b| {
      let (b, f) = self.analyze_block(span, b, BlockRole::Stmt, ScopeKind::Branch);
      all_return &= f.contains(BlockFlags::RETURNS);
      b
    });
    let flags = if all_return && els.is_some() { BlockFlags::RETURNS } else { BlockFlags::empty() };
    let k = hir::StmtKind::If(hir::IfChain {
      cond: Box::new(cond), then, elifs: elifs.into(), els,
    });
    (Spanned::new(span, k), flags)
  }

  fn check_cond(&mut self, e: &ast::Expr) -> hir::Expr {
    let c = self.infer_expr(e, None);
    if !matches!(c.ty, Type::Bool | Type::Error) {
      self.diags.emit(c.span, ErrorKind::ConditionNotBool,
        format!("Condition must be of type bool, got {}", c.ty));
    }
    c
  }

  /// A conditional in expression position: every branch is an expression
  /// block whose values unify under the propagated target.
  pub(crate) fn infer_if_expr(
    &mut self, span: Span, chain: &ast::IfChain, tgt: Option<&Type>,
  ) -> hir::Expr {
    let cond = self.check_cond(&chain.cond);
    if chain.els.is_none() {
      self.diags.emit(span, ErrorKind::ConditionalRequiresContext,
        "Conditional expression must have an else branch so every path produces a value");
    }
    let role = BlockRole::Expr(tgt);
    let (then, _) = self.analyze_block(span, &chain.then, role, ScopeKind::Branch);
    let mut blocks_ty = vec![then.ty.clone()];
    let mut elifs = Vec::with_capacity(chain.elifs.len());
    for (c, b) in &chain.elifs {
      let c = self.check_cond(c);
      let (b, _) = self.analyze_block(span, b, role, ScopeKind::Branch);
      blocks_ty.push(b.ty.clone());
      elifs.push((c, b));
    }
    let els = chain.els.as_ref().map(|b| {
      let (b, _) = self.analyze_block(span, b, role, ScopeKind::Branch);
      blocks_ty.push(b.ty.clone());
      b
    });
    let ty = match tgt {
      Some(t) => t.clone(),
      None => self.unify_branches(span, &blocks_ty),
    };
    let k = hir::ExprKind::If(hir::IfChain { cond: Box::new(cond), then, elifs: elifs.into(), els });
    hir::Expr { span, ty, k }
  }

  /// Unify branch value types with no outer target: comptime branches merge,
  /// at most one concrete type may appear, and everything comptime must
  /// adapt to it implicitly.
  fn unify_branches(&mut self, span: Span, tys: &[Type]) -> Type {
    let live: Vec<&Type> = tys.iter().filter(|t| **t != Type::Error).collect();
    if live.is_empty() { return Type::Error }
    let mut concrete: Option<&Type> = None;
    for &t in &live {
      if t.is_comptime() { continue }
      match concrete {
        None => concrete = Some(t),
        Some(c) if c == t => {}
        Some(c) => {
          self.diags.emit(span, ErrorKind::ConditionalRequiresContext,
            format!("Mixed types across conditional branches require explicit target \
                     type context (found {c} and {t})"));
          return Type::Error
        }
      }
    }
    match concrete {
      Some(c) => {
        let c = c.clone();
        for &t in &live {
          if t.is_comptime() && crate::conv::fit_scalar(t, &c) != crate::conv::Fit::Ok {
            self.diags.emit(span, ErrorKind::ConditionalRequiresContext,
              format!("Mixed types across conditional branches require explicit target \
                       type context ({t} does not adapt to {c})"));
            return Type::Error
          }
        }
        c
      }
      None => {
        // All comptime: int unless a float branch promotes the result.
        if live.iter().all(|t| **t == Type::ComptimeInt) {
          Type::ComptimeInt
        } else if live.iter().all(|t| matches!(t, Type::ComptimeInt | Type::ComptimeFloat)) {
          Type::ComptimeFloat
        } else if live.iter().all_equal() {
          (*live[0]).clone()
        } else {
          self.diags.emit(span, ErrorKind::ConditionalRequiresContext,
            "Mixed types across conditional branches require explicit target type context");
          Type::Error
        }
      }
    }
  }
}

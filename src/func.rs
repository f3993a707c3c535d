//! Function declarations, bodies and call sites.
//!
//! Signatures are registered in a pre-pass so call sites may precede their
//! callee textually. Body analysis binds the parameters in a function scope
//! and analyzes the body as a function-body block with the declared return
//! type as the return target; value-returning functions must return on every
//! path. Call sites check arity, analyze every argument under its parameter
//! type, enforce the array copy-syntax discipline, and attribute each
//! argument's diagnostics to the argument.

use hashbrown::HashSet;
use if_chain::if_chain;
use log::trace;
use crate::{Analyzer, Symbol};
use crate::block::{BlockFlags, BlockRole};
use crate::diag::ErrorKind;
use crate::scope::{ScopeKind, VarInfo};
use crate::types::{Span, Spanned};
use crate::types::ast;
use crate::types::entity::{FnSig, ParamSig};
use crate::types::hir;
use crate::types::ty::Type;

impl Analyzer {
  /// The pre-pass: lower every declaration's signature and register it under
  /// its name. Returns the lowered signatures in declaration order so body
  /// analysis does not resolve (and re-diagnose) the types twice.
  pub(crate) fn register_signatures(&mut self, p: &ast::Program) -> Vec<FnSig> {
    let mut sigs = Vec::with_capacity(p.functions.len());
    for f in &p.functions {
      let sig = self.lower_signature(f);
      match self.names.entry(f.name.k) {
        hashbrown::hash_map::Entry::Occupied(_) => {
          self.diags.emit(f.name.span, ErrorKind::DuplicateFunction,
            format!("Duplicate function declaration: '{}'", f.name.k));
        }
        hashbrown::hash_map::Entry::Vacant(e) => {
          e.insert(Spanned::new(f.name.span, sig.clone()));
        }
      }
      sigs.push(sig);
    }
    sigs
  }

  fn lower_signature(&mut self, f: &ast::FuncDecl) -> FnSig {
    let mut seen: HashSet<Symbol> = HashSet::with_capacity(f.params.len());
    let mut params = Vec::with_capacity(f.params.len());
    for p in &f.params {
      if !seen.insert(p.name.k) {
        self.diags.emit(p.name.span, ErrorKind::DuplicateParameter,
          format!("Duplicate parameter name '{}' in function '{}'", p.name.k, f.name.k));
      }
      let ty = self.resolve_ty(&p.ty);
      if ty == Type::Void {
        self.diags.emit(p.ty.span, ErrorKind::ForbiddenVoidParameter,
          format!("Parameter '{}' of function '{}' cannot have type void",
            p.name.k, f.name.k));
      }
      params.push(ParamSig { name: p.name.k, ty, mutable: p.mutable });
    }
    let ret = self.resolve_ty(&f.ret);
    FnSig { name: f.name.k, params: params.into(), ret }
  }

  /// Analyze one function body against its pre-registered signature.
  pub(crate) fn analyze_function(&mut self, f: &ast::FuncDecl, sig: FnSig) -> hir::Func {
    trace!("analyzing function '{}'", f.name.k);
    self.cur_ret = sig.ret.clone();
    self.cur_fn = f.name.k;
    let body = self.with_scope(ScopeKind::Function, |this| {
      for p in &sig.params {
        let info = VarInfo {
          ty: p.ty.clone(), mutable: p.mutable, initialized: true, is_param: true,
        };
        // A duplicate parameter was already reported in the pre-pass; the
        // first binding wins.
        let _ = this.scopes.declare(p.name, info);
      }
      let (body, flags) =
        this.analyze_block(f.name.span, &f.body, BlockRole::Body, ScopeKind::Block);
      if sig.ret != Type::Void && !flags.contains(BlockFlags::RETURNS) {
        this.diags.emit(f.name.span, ErrorKind::ReturnMissingValue,
          format!("Missing return: function '{}' must return a value of type {}",
            f.name.k, sig.ret));
      }
      body
    });
    hir::Func { name: f.name.k, sig, body }
  }

  /// Analyze a call expression. The callee's return type is the call's type
  /// and flows outward into the surrounding expression.
  pub(crate) fn infer_call(
    &mut self, span: Span, f: &Spanned<Symbol>, args: &[ast::Expr],
  ) -> hir::Expr {
    // Calling anything is runtime activity for the enclosing block.
    self.runtime_touched = true;
    let Some(ent) = self.names.get(&f.k) else {
      self.diags.emit(f.span, ErrorKind::UndefinedFunction,
        format!("Undefined function: '{}'", f.k));
      let args: Vec<_> = args.iter().map(|a| self.infer_expr(a, None)).collect();
      return hir::Expr { span, ty: Type::Error, k: hir::ExprKind::Call { f: f.k, args: args.into() } }
    };
    let sig = ent.k.clone();
    if args.len() != sig.params.len() {
      self.diags.emit(span, ErrorKind::ArityMismatch,
        format!("Function '{}' expects {} arguments, but {} provided",
          f.k, sig.params.len(), args.len()));
    }
    let mut hargs = Vec::with_capacity(args.len());
    for (i, a) in args.iter().enumerate() {
      let mark = self.diags.mark();
      let v = match sig.params.get(i) {
        Some(p) => {
          let v = self.infer_expr(a, Some(&p.ty));
          self.check_array_argument(f.k, a, &p.ty);
          v
        }
        None => self.infer_expr(a, None),
      };
      if_chain! {
        if self.diags.mark() > mark;
        let prefix = format!("Function '{}' argument {}: ", f.k, i + 1);
        then { self.diags.prefix_since(mark, &prefix) }
      }
      hargs.push(v);
    }
    hir::Expr { span, ty: sig.ret, k: hir::ExprKind::Call { f: f.k, args: hargs.into() } }
  }
}

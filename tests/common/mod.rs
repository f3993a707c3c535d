//! AST builders and assertion helpers shared by the integration tests.
//!
//! The parser is out of scope, so tests construct the AST directly; these
//! helpers keep the construction close to the surface syntax it stands for.

#![allow(dead_code)]

use hexen_sema::types::ast::*;
use hexen_sema::types::{Span, Spanned};
use hexen_sema::{Analysis, ErrorKind, analyze, intern};

pub fn sp<T>(k: T) -> Spanned<T> { Spanned::new(Span::default(), k) }

// ---- expressions ----

pub fn int(text: &str) -> Expr { sp(ExprKind::Int(text.into())) }
pub fn float(text: &str) -> Expr { sp(ExprKind::Float(text.into())) }
pub fn boolean(b: bool) -> Expr { sp(ExprKind::Bool(b)) }
pub fn string(s: &str) -> Expr { sp(ExprKind::Str(s.into())) }
pub fn var(name: &str) -> Expr { sp(ExprKind::Ident(intern(name))) }

pub fn neg(e: Expr) -> Expr { sp(ExprKind::Unop(Unop::Neg, Box::new(e))) }
pub fn not(e: Expr) -> Expr { sp(ExprKind::Unop(Unop::Not, Box::new(e))) }

pub fn bin(op: Binop, l: Expr, r: Expr) -> Expr {
  sp(ExprKind::Binop(op, Box::new(l), Box::new(r)))
}
pub fn add(l: Expr, r: Expr) -> Expr { bin(Binop::Add, l, r) }
pub fn sub(l: Expr, r: Expr) -> Expr { bin(Binop::Sub, l, r) }
pub fn mul(l: Expr, r: Expr) -> Expr { bin(Binop::Mul, l, r) }
pub fn gt(l: Expr, r: Expr) -> Expr { bin(Binop::Gt, l, r) }
pub fn lt(l: Expr, r: Expr) -> Expr { bin(Binop::Lt, l, r) }
pub fn eq(l: Expr, r: Expr) -> Expr { bin(Binop::Eq, l, r) }

pub fn call(f: &str, args: Vec<Expr>) -> Expr {
  sp(ExprKind::Call { f: sp(intern(f)), args: args.into() })
}

pub fn index(arr: Expr, i: Expr) -> Expr {
  sp(ExprKind::Index { arr: Box::new(arr), index: Box::new(i) })
}

pub fn range(start: Option<Expr>, end: Option<Expr>) -> Expr {
  range_full(start, end, None, false)
}
pub fn range_incl(start: Expr, end: Expr) -> Expr {
  range_full(Some(start), Some(end), None, true)
}
pub fn range_step(start: Expr, end: Expr, step: Expr) -> Expr {
  range_full(Some(start), Some(end), Some(step), false)
}
pub fn range_full(
  start: Option<Expr>, end: Option<Expr>, step: Option<Expr>, inclusive: bool,
) -> Expr {
  sp(ExprKind::Range {
    start: start.map(Box::new),
    end: end.map(Box::new),
    step: step.map(Box::new),
    inclusive,
  })
}

/// `e[..]`, the explicit array copy.
pub fn copy(e: Expr) -> Expr { index(e, range(None, None)) }

pub fn array(elems: Vec<Expr>) -> Expr { sp(ExprKind::Array(elems.into())) }

/// `[range]`, a range materialization.
pub fn materialize(r: Expr) -> Expr { array(vec![r]) }

pub fn convert(e: Expr, ty: Ty) -> Expr {
  sp(ExprKind::Convert { e: Box::new(e), ty })
}

pub fn block_expr(stmts: Vec<Stmt>) -> Expr { sp(ExprKind::Block(blk(stmts))) }

pub fn if_expr(cond: Expr, then: Vec<Stmt>, els: Vec<Stmt>) -> Expr {
  sp(ExprKind::If(IfChain {
    cond: Box::new(cond),
    then: blk(then),
    elifs: Box::new([]),
    els: Some(blk(els)),
  }))
}

pub fn if_expr_no_else(cond: Expr, then: Vec<Stmt>) -> Expr {
  sp(ExprKind::If(IfChain {
    cond: Box::new(cond),
    then: blk(then),
    elifs: Box::new([]),
    els: None,
  }))
}

pub fn field(e: Expr, name: &str) -> Expr {
  sp(ExprKind::Field { e: Box::new(e), name: intern(name) })
}

pub fn length(e: Expr) -> Expr { field(e, "length") }

// ---- types ----

pub fn t_i32() -> Ty { sp(TyKind::I32) }
pub fn t_i64() -> Ty { sp(TyKind::I64) }
pub fn t_f32() -> Ty { sp(TyKind::F32) }
pub fn t_f64() -> Ty { sp(TyKind::F64) }
pub fn t_usize() -> Ty { sp(TyKind::Usize) }
pub fn t_bool() -> Ty { sp(TyKind::Bool) }
pub fn t_string() -> Ty { sp(TyKind::Str) }
pub fn t_void() -> Ty { sp(TyKind::Void) }

/// `[d1][d2]...elem`; `None` is the `_` wildcard.
pub fn t_array(dims: &[Option<u64>], elem: Ty) -> Ty {
  dims.iter().rev().fold(elem, |elem, d| sp(TyKind::Array {
    dim: match d { Some(n) => ArrayDim::Fixed(*n), None => ArrayDim::Infer },
    elem: Box::new(elem),
  }))
}

pub fn t_range(elem: Ty) -> Ty { sp(TyKind::Range(Box::new(elem))) }

// ---- statements ----

pub fn blk(stmts: Vec<Stmt>) -> Block { Block { stmts: stmts.into() } }

pub fn val(name: &str, ty: Option<Ty>, init: Expr) -> Stmt {
  sp(StmtKind::Let { mutable: false, name: sp(intern(name)), ty, init: Some(init) })
}

pub fn val_undef(name: &str, ty: Option<Ty>) -> Stmt {
  sp(StmtKind::Let { mutable: false, name: sp(intern(name)), ty, init: None })
}

pub fn mut_(name: &str, ty: Option<Ty>, init: Expr) -> Stmt {
  sp(StmtKind::Let { mutable: true, name: sp(intern(name)), ty, init: Some(init) })
}

pub fn mut_undef(name: &str, ty: Option<Ty>) -> Stmt {
  sp(StmtKind::Let { mutable: true, name: sp(intern(name)), ty, init: None })
}

pub fn assign(name: &str, value: Expr) -> Stmt {
  sp(StmtKind::Assign { name: sp(intern(name)), value })
}

pub fn ret(value: Expr) -> Stmt { sp(StmtKind::Return { value: Some(value) }) }
pub fn ret_void() -> Stmt { sp(StmtKind::Return { value: None }) }

/// `-> value`, the expression-block terminator.
pub fn yield_(value: Expr) -> Stmt { sp(StmtKind::Yield { value }) }

pub fn expr_stmt(e: Expr) -> Stmt { sp(StmtKind::Expr(e)) }

pub fn bare(stmts: Vec<Stmt>) -> Stmt { sp(StmtKind::Bare(blk(stmts))) }

pub fn if_stmt(cond: Expr, then: Vec<Stmt>, els: Option<Vec<Stmt>>) -> Stmt {
  sp(StmtKind::If(IfChain {
    cond: Box::new(cond),
    then: blk(then),
    elifs: Box::new([]),
    els: els.map(blk),
  }))
}

// ---- functions & programs ----

pub fn param(name: &str, ty: Ty) -> Param {
  Param { name: sp(intern(name)), ty, mutable: false }
}

pub fn param_mut(name: &str, ty: Ty) -> Param {
  Param { name: sp(intern(name)), ty, mutable: true }
}

pub fn func(name: &str, params: Vec<Param>, ret: Ty, body: Vec<Stmt>) -> FuncDecl {
  FuncDecl { name: sp(intern(name)), params: params.into(), ret, body: blk(body) }
}

pub fn prog(functions: Vec<FuncDecl>) -> Program {
  Program { functions: functions.into() }
}

/// Analyze a list of functions. Run tests with `RUST_LOG=debug` to see the
/// analyzer's breadcrumbs on failure.
pub fn run(functions: Vec<FuncDecl>) -> Analysis {
  let _ = env_logger::builder().is_test(true).try_init();
  analyze(&prog(functions))
}

/// Analyze a single `func test() : void` with the given body.
pub fn run_void(stmts: Vec<Stmt>) -> Analysis {
  run(vec![func("test", vec![], t_void(), stmts)])
}

/// Analyze a single `func test() : T` with the given body.
pub fn run_ret(ret_ty: Ty, stmts: Vec<Stmt>) -> Analysis {
  run(vec![func("test", vec![], ret_ty, stmts)])
}

// ---- assertions ----

pub fn assert_no_errors(a: &Analysis) {
  assert!(a.diags.is_empty(), "expected no diagnostics, got: {:#?}", a.diags);
}

pub fn assert_kinds(a: &Analysis, kinds: &[ErrorKind]) {
  let got: Vec<ErrorKind> = a.diags.iter().map(|d| d.kind).collect();
  assert_eq!(got, kinds, "diagnostics: {:#?}", a.diags);
}

pub fn assert_error_count(a: &Analysis, n: usize) {
  assert_eq!(a.diags.len(), n, "diagnostics: {:#?}", a.diags);
}

pub fn assert_error_contains(a: &Analysis, needle: &str) {
  assert!(
    a.diags.iter().any(|d| d.to_string().contains(needle)),
    "no diagnostic contains {needle:?}: {:#?}", a.diags,
  );
}

//! Conditional statements and conditional expressions: bool conditions,
//! branch scoping, and branch type unification under context.

mod common;

use common::*;
use hexen_sema::ErrorKind;
use hexen_sema::types::ast::{ExprKind, IfChain, StmtKind};

fn if_chain_stmt(
  cond: hexen_sema::types::ast::Expr,
  then: Vec<hexen_sema::types::ast::Stmt>,
  elifs: Vec<(hexen_sema::types::ast::Expr, Vec<hexen_sema::types::ast::Stmt>)>,
  els: Option<Vec<hexen_sema::types::ast::Stmt>>,
) -> hexen_sema::types::ast::Stmt {
  sp(StmtKind::If(IfChain {
    cond: Box::new(cond),
    then: blk(then),
    elifs: elifs.into_iter().map(|(c, b)| (c, blk(b))).collect(),
    els: els.map(blk),
  }))
}

#[test]
fn if_statement_with_bool_condition() {
  let a = run_void(vec![
    val("flag", Some(t_bool()), boolean(true)),
    if_stmt(var("flag"), vec![val("x", Some(t_i32()), int("1"))], None),
  ]);
  assert_no_errors(&a);
}

#[test]
fn if_else_chain_analyzes_every_arm() {
  let a = run_void(vec![
    val("input", Some(t_i32()), int("5")),
    if_chain_stmt(
      gt(var("input"), int("0")),
      vec![val("a", None, int("1"))],
      vec![(eq(var("input"), int("0")), vec![val("b", None, int("2"))])],
      Some(vec![val("c", None, int("3"))]),
    ),
  ]);
  assert_no_errors(&a);
}

#[test]
fn condition_must_be_bool() {
  let a = run_void(vec![
    val("n", Some(t_i32()), int("1")),
    if_stmt(var("n"), vec![], None),
  ]);
  assert_kinds(&a, &[ErrorKind::ConditionNotBool]);
  assert_error_contains(&a, "Condition must be of type bool, got i32");
}

#[test]
fn condition_rejects_strings_and_floats() {
  let a = run_void(vec![
    val("s", Some(t_string()), string("x")),
    val("f", Some(t_f64()), float("1.0")),
    if_stmt(var("s"), vec![], None),
    if_stmt(var("f"), vec![], None),
  ]);
  assert_kinds(&a, &[ErrorKind::ConditionNotBool, ErrorKind::ConditionNotBool]);
  assert_error_contains(&a, "got string");
  assert_error_contains(&a, "got f64");
}

#[test]
fn branch_scopes_are_isolated() {
  let a = run_void(vec![
    if_stmt(boolean(true), vec![val("inner", None, int("1"))], None),
    val("bad", Some(t_i32()), var("inner")),
  ]);
  assert_kinds(&a, &[ErrorKind::UndefinedVariable]);
}

#[test]
fn statement_branches_need_not_agree_in_type() {
  let a = run_void(vec![
    if_stmt(boolean(true),
      vec![val("x", Some(t_i32()), int("1"))],
      Some(vec![val("y", Some(t_string()), string("two"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn conditional_expression_under_target() {
  let a = run_void(vec![
    val("flag", Some(t_bool()), boolean(true)),
    val("x", Some(t_i32()), if_expr(var("flag"),
      vec![yield_(int("1"))],
      vec![yield_(int("2"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn conditional_expression_branches_adapt_to_target() {
  let a = run_void(vec![
    val("x", Some(t_f64()), if_expr(boolean(true),
      vec![yield_(int("1"))],
      vec![yield_(float("2.5"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn comptime_branches_unify_without_target() {
  let a = run_void(vec![
    val("x", None, if_expr(boolean(true),
      vec![yield_(int("1"))],
      vec![yield_(int("2"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn comptime_int_and_float_branches_promote() {
  let a = run_void(vec![
    val("x", None, if_expr(boolean(true),
      vec![yield_(int("1"))],
      vec![yield_(float("2.5"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn mixed_concrete_branches_require_context() {
  let a = run_void(vec![
    val("i", Some(t_i32()), int("1")),
    val("j", Some(t_i64()), int("2")),
    val("x", None, if_expr(boolean(true),
      vec![yield_(var("i"))],
      vec![yield_(var("j"))])),
  ]);
  assert_kinds(&a, &[ErrorKind::ConditionalRequiresContext]);
  assert_error_contains(&a, "Mixed types across conditional branches");
}

#[test]
fn agreeing_concrete_branches_need_no_context() {
  let a = run_void(vec![
    val("i", Some(t_i32()), int("1")),
    val("j", Some(t_i32()), int("2")),
    val("x", None, if_expr(boolean(true),
      vec![yield_(var("i"))],
      vec![yield_(var("j"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn conditional_expression_requires_else() {
  let a = run_void(vec![
    val("x", Some(t_i32()), if_expr_no_else(boolean(true), vec![yield_(int("1"))])),
  ]);
  assert_kinds(&a, &[ErrorKind::ConditionalRequiresContext]);
  assert_error_contains(&a, "else branch");
}

#[test]
fn conditional_branch_may_return_instead_of_yield() {
  let a = run_ret(t_i32(), vec![
    val("x", Some(t_i32()), if_expr(boolean(true),
      vec![ret(int("0"))],
      vec![yield_(int("2"))])),
    ret(var("x")),
  ]);
  assert_no_errors(&a);
}

#[test]
fn all_branches_returning_satisfies_the_function() {
  let a = run_ret(t_i32(), vec![
    if_stmt(boolean(true),
      vec![ret(int("1"))],
      Some(vec![ret(int("2"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn if_without_else_does_not_guarantee_return() {
  let a = run_ret(t_i32(), vec![
    if_stmt(boolean(true), vec![ret(int("1"))], None),
  ]);
  assert_kinds(&a, &[ErrorKind::ReturnMissingValue]);
}

#[test]
fn conditional_expression_as_call_argument() {
  let a = run(vec![
    func("consume", vec![param("v", t_i64())], t_void(), vec![]),
    func("main", vec![], t_void(), vec![
      expr_stmt(call("consume", vec![if_expr(boolean(true),
        vec![yield_(int("1"))],
        vec![yield_(int("2"))])])),
    ]),
  ]);
  assert_no_errors(&a);
}

#[test]
fn nested_conditionals_in_expressions() {
  let a = run_void(vec![
    val("x", Some(t_i32()), if_expr(boolean(true),
      vec![yield_(if_expr(boolean(false),
        vec![yield_(int("1"))],
        vec![yield_(int("2"))]))],
      vec![yield_(int("3"))])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn raw_if_chain_builder_matches_stmt_shape() {
  // The builder above and the plain helper agree on the AST shape.
  let s = if_chain_stmt(boolean(true), vec![], vec![], None);
  assert!(matches!(s.k, StmtKind::If(_)));
  let e = if_expr(boolean(true), vec![yield_(int("1"))], vec![yield_(int("2"))]);
  assert!(matches!(e.k, ExprKind::If(_)));
}

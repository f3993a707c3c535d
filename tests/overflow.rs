//! Literal overflow and precision checking: exact ranges for the integer
//! types, float range limits, and exact-representability for int-to-float
//! adaptation.

mod common;

use common::*;
use hexen_sema::ErrorKind;

#[test]
fn max_values_fit_their_types() {
  let a = run_void(vec![
    val("max32", Some(t_i32()), int("2147483647")),
    val("min32", Some(t_i32()), neg(int("2147483648"))),
    val("max64", Some(t_i64()), int("9223372036854775807")),
    val("big_float", Some(t_f64()), int("1000000000000")),
  ]);
  assert_no_errors(&a);
}

#[test]
fn i32_overflow_reports_the_range() {
  let a = run_void(vec![val("x", Some(t_i32()), int("4294967296"))]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
  assert_error_contains(&a, "Literal 4294967296 overflows i32 range");
  assert_error_contains(&a, "Expected: -2147483648 to 2147483647");
}

#[test]
fn overflow_suggests_a_wider_type() {
  let a = run_void(vec![val("x", Some(t_i32()), int("2147483648"))]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
  assert_error_contains(&a, "2147483648:i64");
}

#[test]
fn hex_literals_keep_their_textual_form() {
  let a = run_void(vec![val("x", Some(t_i32()), int("0x100000000"))]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
  assert_error_contains(&a, "Literal 0x100000000 overflows i32 range");
}

#[test]
fn scientific_integer_literals_are_checked() {
  let a = run_void(vec![val("x", Some(t_i32()), int("3e10"))]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
  assert_error_contains(&a, "Literal 3e10 overflows i32 range");
}

#[test]
fn binary_literals_parse_and_fit() {
  let a = run_void(vec![val("x", Some(t_i32()), int("0b101010"))]);
  assert_no_errors(&a);
}

#[test]
fn f32_range_overflow() {
  let a = run_void(vec![val("x", Some(t_f32()), float("3.5e38"))]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
  assert_error_contains(&a, "overflows f32 range");
  assert_error_contains(&a, "Expected: approximately ±3.4028235e+38");
}

#[test]
fn f32_sized_values_are_fine() {
  let a = run_void(vec![
    val("x", Some(t_f32()), float("3.4e38")),
    val("y", Some(t_f32()), float("0.000001")),
  ]);
  assert_no_errors(&a);
}

#[test]
fn int_literal_exactness_in_f32() {
  let ok = run_void(vec![
    val("exact", Some(t_f32()), int("16777216")),
    val("small", Some(t_f32()), int("1000000")),
  ]);
  assert_no_errors(&ok);
  let lossy = run_void(vec![val("inexact", Some(t_f32()), int("16777217"))]);
  assert_kinds(&lossy, &[ErrorKind::PotentialPrecisionLoss]);
  assert_error_contains(&lossy, "cannot be represented exactly in f32");
}

#[test]
fn int_literal_exactness_in_f64() {
  let ok = run_void(vec![val("exact", Some(t_f64()), int("9007199254740992"))]);
  assert_no_errors(&ok);
  let lossy = run_void(vec![val("inexact", Some(t_f64()), int("9007199254740993"))]);
  assert_kinds(&lossy, &[ErrorKind::PotentialPrecisionLoss]);
}

#[test]
fn overflow_is_checked_in_operand_position() {
  let a = run_void(vec![
    val("x", Some(t_i32()), add(int("4294967296"), int("1"))),
  ]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
}

#[test]
fn explicit_conversion_does_not_bypass_range_checks() {
  let a = run_void(vec![
    val("x", Some(t_i64()), convert(int("4294967296"), t_i64())),
    val("y", Some(t_i32()), convert(int("4294967296"), t_i32())),
  ]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
}

#[test]
fn overflow_in_array_elements_is_per_element() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[Some(2)], t_i32())),
      array(vec![int("1"), int("4294967296")])),
  ]);
  assert_kinds(&a, &[ErrorKind::LiteralOverflow]);
}

#[test]
fn usize_width_is_configurable() {
  use hexen_sema::{Analyzer, Config};
  let p = prog(vec![func("test", vec![], t_void(), vec![
    val("x", Some(t_usize()), int("4294967296")),
  ])]);
  let wide = Analyzer::new(Config { usize_bits: 64 }).analyze(&p);
  assert_no_errors(&wide);
  let narrow = Analyzer::new(Config { usize_bits: 32 }).analyze(&p);
  assert_kinds(&narrow, &[ErrorKind::LiteralOverflow]);
}

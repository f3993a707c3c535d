//! Array literals, shapes, indexing, `.length`, and element conversions
//! with dimensional flattening.

mod common;

use common::*;
use hexen_sema::ErrorKind;

#[test]
fn comptime_int_array_inference() {
  let a = run_void(vec![val("arr", None, array(vec![int("1"), int("2"), int("3")]))]);
  assert_no_errors(&a);
}

#[test]
fn comptime_float_array_from_mixed_numeric_literals() {
  let a = run_void(vec![
    val("arr", None, array(vec![int("1"), float("2.5"), int("3")])),
    val("as_f32", Some(t_array(&[None], t_f32())), var("arr")),
  ]);
  assert_no_errors(&a);
}

#[test]
fn array_literal_adapts_to_target_shape() {
  let a = run_void(vec![
    val("a", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("b", Some(t_array(&[Some(3)], t_f64())), array(vec![int("1"), int("2"), int("3")])),
    val("c", Some(t_array(&[None], t_i64())), array(vec![int("1"), int("2")])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn array_size_mismatch_is_reported_once() {
  let a = run_void(vec![
    val("a", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2")])),
  ]);
  assert_kinds(&a, &[ErrorKind::ArraySizeMismatch]);
  assert_error_contains(&a, "Array size mismatch: expected 3 elements, got 2");
}

#[test]
fn empty_array_needs_context() {
  let a = run_void(vec![val("e", None, array(vec![]))]);
  assert_kinds(&a, &[ErrorKind::EmptyArrayRequiresContext]);
  assert_error_contains(&a, "Empty array literal requires explicit type context");
}

#[test]
fn empty_array_with_context_is_fine() {
  let a = run_void(vec![
    val("e", Some(t_array(&[None], t_i32())), array(vec![])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn mixed_concrete_and_comptime_elements_need_context() {
  let a = run_void(vec![
    val("c", Some(t_i32()), int("5")),
    val("bad", None, array(vec![var("c"), int("1")])),
  ]);
  assert_kinds(&a, &[ErrorKind::MixedArrayRequiresContext]);
  assert_error_contains(&a, "explicit array context");
}

#[test]
fn mixed_concrete_elements_with_target_are_fine() {
  let a = run_void(vec![
    val("c", Some(t_i32()), int("5")),
    val("ok", Some(t_array(&[Some(2)], t_i32())), array(vec![var("c"), int("1")])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn same_concrete_elements_infer_a_concrete_array() {
  let a = run_void(vec![
    val("x", Some(t_i32()), int("1")),
    val("y", Some(t_i32()), int("2")),
    val("arr", None, array(vec![var("x"), var("y")])),
    val("again", Some(t_array(&[Some(2)], t_i32())), copy(var("arr"))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn string_arrays_work() {
  let a = run_void(vec![
    val("names", Some(t_array(&[None], t_string())),
      array(vec![string("a"), string("b"), string("c")])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn nested_literals_build_multidimensional_arrays() {
  let a = run_void(vec![
    val("matrix", Some(t_array(&[Some(2), Some(3)], t_i32())),
      array(vec![
        array(vec![int("1"), int("2"), int("3")]),
        array(vec![int("4"), int("5"), int("6")]),
      ])),
    val("flexible", None, array(vec![
      array(vec![int("1"), int("2")]),
      array(vec![int("3"), int("4")]),
    ])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn irregular_nested_literals_are_rejected() {
  let a = run_void(vec![
    val("irregular", None, array(vec![
      array(vec![int("1"), int("2")]),
      array(vec![int("3"), int("4"), int("5")]),
    ])),
  ]);
  assert_kinds(&a, &[ErrorKind::InconsistentArrayDimensions]);
  assert_error_contains(&a, "Inconsistent inner array dimensions");
}

#[test]
fn deep_nesting_is_checked_recursively() {
  let a = run_void(vec![
    val("tensor", None, array(vec![
      array(vec![array(vec![int("1"), int("2")]), array(vec![int("3"), int("4")])]),
      array(vec![array(vec![int("5"), int("6")]), array(vec![int("7"), int("8")])]),
    ])),
  ]);
  assert_no_errors(&a);
}

#[test]
fn integer_indexing_peels_one_dimension() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("first", Some(t_i32()), index(var("arr"), int("0"))),
    val("idx", Some(t_usize()), int("2")),
    val("last", Some(t_i32()), index(var("arr"), var("idx"))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn multidim_indexing_peels_outermost_first() {
  let a = run_void(vec![
    val("m", Some(t_array(&[Some(2), Some(3)], t_i32())),
      array(vec![
        array(vec![int("1"), int("2"), int("3")]),
        array(vec![int("4"), int("5"), int("6")]),
      ])),
    val("row", Some(t_array(&[Some(3)], t_i32())), copy(index(var("m"), int("0")))),
    val("cell", Some(t_i32()), index(index(var("m"), int("1")), int("2"))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn non_integer_index_is_rejected() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[Some(2)], t_i32())), array(vec![int("1"), int("2")])),
    val("bad", Some(t_i32()), index(var("arr"), float("1.5"))),
  ]);
  assert_kinds(&a, &[ErrorKind::InvalidArrayIndex]);
  assert_error_contains(&a, "Array index must be an integer type");
}

#[test]
fn indexing_a_non_array_is_rejected() {
  let a = run_void(vec![
    val("n", Some(t_i32()), int("7")),
    val("bad", None, index(var("n"), int("0"))),
  ]);
  assert_kinds(&a, &[ErrorKind::TypeMismatch]);
  assert_error_contains(&a, "Cannot index non-array type i32");
}

#[test]
fn length_adapts_to_any_integer_context() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("n32", Some(t_i32()), length(var("arr"))),
    val("n64", Some(t_i64()), length(var("arr"))),
    val("nus", Some(t_usize()), length(var("arr"))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn length_on_non_array_is_rejected() {
  let a = run_void(vec![
    val("n", Some(t_i32()), int("7")),
    val("bad", None, length(var("n"))),
  ]);
  assert_kinds(&a, &[ErrorKind::PropertyNotFound]);
  assert_error_contains(&a, "Property 'length' is only available on array types");
}

#[test]
fn unknown_properties_are_rejected() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[Some(2)], t_i32())), array(vec![int("1"), int("2")])),
    val("bad", None, field(var("arr"), "size")),
  ]);
  assert_kinds(&a, &[ErrorKind::PropertyNotFound]);
}

#[test]
fn element_conversion_between_element_types() {
  let a = run_void(vec![
    val("ints", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("floats", Some(t_array(&[Some(3)], t_f64())),
      convert(var("ints"), t_array(&[Some(3)], t_f64()))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn assignment_between_element_types_needs_conversion() {
  let a = run_void(vec![
    val("ints", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("floats", Some(t_array(&[Some(3)], t_f64())), copy(var("ints"))),
  ]);
  assert_kinds(&a, &[ErrorKind::TypeMismatch]);
  assert_error_contains(&a, "element type mismatch");
  assert_error_contains(&a, "[3]f64");
  assert_error_contains(&a, "[3]i32");
}

#[test]
fn conversion_may_flatten_dimensions() {
  let a = run_void(vec![
    val("m", Some(t_array(&[Some(2), Some(3)], t_i32())),
      array(vec![
        array(vec![int("1"), int("2"), int("3")]),
        array(vec![int("4"), int("5"), int("6")]),
      ])),
    val("flat", Some(t_array(&[Some(6)], t_i32())),
      convert(var("m"), t_array(&[Some(6)], t_i32()))),
    val("wild", Some(t_array(&[None], t_i32())),
      convert(var("m"), t_array(&[None], t_i32()))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn conversion_size_mismatch_quotes_both_totals() {
  let a = run_void(vec![
    val("m", Some(t_array(&[Some(2), Some(3)], t_i32())),
      array(vec![
        array(vec![int("1"), int("2"), int("3")]),
        array(vec![int("4"), int("5"), int("6")]),
      ])),
    val("bad", Some(t_array(&[Some(5)], t_i32())),
      convert(var("m"), t_array(&[Some(5)], t_i32()))),
  ]);
  assert_kinds(&a, &[ErrorKind::ArraySizeMismatch]);
  assert_error_contains(&a, "Array size mismatch in type conversion");
  assert_error_contains(&a, "expected 5 elements, got 6");
}

#[test]
fn float_elements_cannot_convert_to_usize() {
  let a = run_void(vec![
    val("fs", Some(t_array(&[Some(2)], t_f32())), array(vec![float("1.0"), float("2.0")])),
    val("bad", Some(t_array(&[Some(2)], t_usize())),
      convert(var("fs"), t_array(&[Some(2)], t_usize()))),
  ]);
  assert_kinds(&a, &[ErrorKind::ForbiddenConversion]);
}

#[test]
fn comptime_float_array_to_int_target_needs_conversion() {
  let a = run_void(vec![
    val("bad", Some(t_array(&[Some(2)], t_i32())), array(vec![float("1.5"), float("2.5")])),
  ]);
  assert_kinds(&a, &[ErrorKind::PotentialTruncation, ErrorKind::PotentialTruncation]);
}

#[test]
fn wildcard_dimension_adopts_source_size() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[None], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("again", Some(t_array(&[Some(3)], t_i32())), copy(var("arr"))),
  ]);
  assert_no_errors(&a);
}

#[test]
fn rank_mismatch_is_a_type_mismatch() {
  let a = run_void(vec![
    val("arr", Some(t_array(&[Some(3)], t_i32())), array(vec![int("1"), int("2"), int("3")])),
    val("bad", Some(t_array(&[Some(1), Some(3)], t_i32())), copy(var("arr"))),
  ]);
  assert_kinds(&a, &[ErrorKind::TypeMismatch]);
  assert_error_contains(&a, "[1][3]i32");
}

//! Property-based test generators using proptest.

use proptest::prelude::*;
use types::{AttrType, CompOp};

/// Strategy for generating comparison operators.
pub fn arb_comp_op() -> impl Strategy<Value = CompOp> {
    prop_oneof![
        Just(CompOp::Eq),
        Just(CompOp::Ne),
        Just(CompOp::Lt),
        Just(CompOp::Lte),
        Just(CompOp::Gt),
        Just(CompOp::Gte),
    ]
}

/// Strategy for generating attribute types.
pub fn arb_attr_type() -> impl Strategy<Value = AttrType> {
    prop_oneof![
        Just(AttrType::Integer),
        Just(AttrType::Float),
        Just(AttrType::String),
    ]
}

/// Strategy for generating `emp` tuples as `(id, name, salary)`.
///
/// Names fit the 12-byte attribute and salaries are exact in `f32`.
///
/// # Example
///
/// ```
/// use proptest::prelude::*;
/// use testsupport::proptest_generators::arb_emp;
///
/// proptest! {
///     #[test]
///     fn names_fit(emp in arb_emp()) {
///         assert!(emp.1.len() <= 12);
///     }
/// }
/// ```
pub fn arb_emp() -> impl Strategy<Value = (i32, String, f32)> {
    (
        -1000i32..1000,
        "[a-z]{1,12}",
        (-4000i32..4000).prop_map(|quarters| quarters as f32 / 4.0),
    )
}

/// Strategy for integer filter text, optionally followed by non-numeric junk
/// that prefix parsing ignores.
pub fn arb_int_text() -> impl Strategy<Value = (i32, String)> {
    (-1000i32..1000, prop_oneof![Just(""), Just("abc"), Just(" 9"), Just(".5")])
        .prop_map(|(value, junk)| (value, format!("{value}{junk}")))
}

/// Whether `lhs op rhs` holds for integers.
pub fn compare_ints(lhs: i32, op: CompOp, rhs: i32) -> bool {
    op.matches(lhs.cmp(&rhs))
}

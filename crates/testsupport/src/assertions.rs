//! Custom assertion helpers for testing.

use common::{DbResult, Status};
use database::Database;
use pretty_assertions::assert_eq;
use types::Value;

/// Assert that an operation finished with a specific status.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use common::{DbError, Status};
///
/// let result: Result<(), DbError> = Err(DbError::BadType("x".into()));
/// assert_status(&result, Status::BadType);
/// ```
pub fn assert_status<T: std::fmt::Debug>(result: &DbResult<T>, expected: Status) {
    assert_eq!(
        Status::of(result),
        expected,
        "unexpected outcome: {result:?}"
    );
}

/// Assert that an operation returns an error containing a specific substring.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let result: Result<(), common::DbError> = Err(common::DbError::Executor("projection list is empty".into()));
/// assert_error_contains(result, "empty");
/// ```
pub fn assert_error_contains<T>(result: DbResult<T>, expected_msg: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{expected_msg}', but got Ok"),
        Err(e) => {
            let error_string = e.to_string();
            assert!(
                error_string.contains(expected_msg),
                "Expected error to contain '{expected_msg}', but got: {error_string}"
            );
        }
    }
}

/// Assert a relation holds exactly `expected`, in storage order.
pub fn assert_relation_eq(db: &Database, relation: &str, expected: &[Vec<Value>]) {
    let actual = db
        .decode(relation)
        .unwrap_or_else(|e| panic!("decoding '{relation}' failed: {e}"));
    assert_eq!(actual, expected, "contents of '{relation}'");
}

/// Assert a relation holds `expected` tuples.
pub fn assert_relation_len(db: &Database, relation: &str, expected: usize) {
    let actual = db
        .relation_len(relation)
        .unwrap_or_else(|e| panic!("scanning '{relation}' failed: {e}"));
    assert_eq!(actual, expected, "tuple count of '{relation}'");
}

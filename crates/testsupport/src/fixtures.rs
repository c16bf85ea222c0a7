//! Common test fixtures: sample schemas and request builders.

use catalog::AttrSpec;
use executor::{AttrRef, AttrValue};
use types::Value;

/// `emp(id INTEGER, name STRING(12), salary FLOAT)`.
pub fn emp_schema() -> Vec<AttrSpec> {
    vec![
        AttrSpec::integer("id"),
        AttrSpec::string("name", 12),
        AttrSpec::float("salary"),
    ]
}

/// `ids(id INTEGER)`.
pub fn ids_schema() -> Vec<AttrSpec> {
    vec![AttrSpec::integer("id")]
}

/// Attribute values for one `emp` tuple, in schema order.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let values = emp_values("7", "ann", "1.5");
/// assert_eq!(values.len(), 3);
/// ```
pub fn emp_values(id: &str, name: &str, salary: &str) -> Vec<AttrValue> {
    vec![
        AttrValue::integer("id", id),
        AttrValue::string("name", name),
        AttrValue::float("salary", salary),
    ]
}

/// The decoded form of an `emp` tuple.
pub fn emp_decoded(id: i64, name: &str, salary: f64) -> Vec<Value> {
    vec![Value::Int(id), Value::text(name), Value::Float(salary)]
}

/// Projection list naming `attrs` of `relation`, in order.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let projection = project("emp", &["salary", "id"]);
/// assert_eq!(projection[0].attribute, "salary");
/// ```
pub fn project(relation: &str, attrs: &[&str]) -> Vec<AttrRef> {
    attrs.iter().map(|attr| AttrRef::new(relation, *attr)).collect()
}

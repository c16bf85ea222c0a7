pub mod helpers;

use super::*;
use common::{DbError, Status};
use helpers::{emp_catalog, emp_row, int_bytes, MemoryStore};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn emp_values(id: &str, name: &str, salary: &str) -> Vec<AttrValue> {
    vec![
        AttrValue::integer("id", id),
        AttrValue::string("name", name),
        AttrValue::float("salary", salary),
    ]
}

fn setup() -> (catalog::Catalog, MemoryStore) {
    let catalog = emp_catalog();
    let store = MemoryStore::new();
    store.add_relation("emp", Vec::new());
    store.add_relation("ids", Vec::new());
    store.add_relation("out", Vec::new());
    (catalog, store)
}

#[test]
fn insert_then_select_every_attribute_round_trips() {
    let (mut catalog, store) = setup();
    catalog
        .create_relation(
            "copy",
            &[
                catalog::AttrSpec::integer("id"),
                catalog::AttrSpec::string("name", 12),
                catalog::AttrSpec::float("salary"),
            ],
        )
        .unwrap();
    store.add_relation("copy", Vec::new());
    let ctx = ExecutionContext::new(&catalog, &store);

    insert(&ctx, "emp", &emp_values("42", "hello", "3.5")).unwrap();
    let projection = [
        AttrRef::new("emp", "id"),
        AttrRef::new("emp", "name"),
        AttrRef::new("emp", "salary"),
    ];
    let copied = select(&ctx, "copy", &projection, None, CompOp::Eq, b"").unwrap();

    assert_eq!(copied, 1);
    assert_eq!(store.live_records("copy"), vec![emp_row(42, "hello", 3.5)]);
}

#[test]
fn projection_follows_requested_order() {
    let (mut catalog, store) = setup();
    catalog
        .create_relation(
            "swapped",
            &[catalog::AttrSpec::float("salary"), catalog::AttrSpec::integer("id")],
        )
        .unwrap();
    store.add_relation("swapped", Vec::new());
    let ctx = ExecutionContext::new(&catalog, &store);

    insert(&ctx, "emp", &emp_values("7", "x", "2.0")).unwrap();
    let projection = [AttrRef::new("emp", "salary"), AttrRef::new("emp", "id")];
    select(&ctx, "swapped", &projection, None, CompOp::Eq, b"").unwrap();

    let mut expected = 2.0f32.to_le_bytes().to_vec();
    expected.extend_from_slice(&7i32.to_le_bytes());
    assert_eq!(store.live_records("swapped"), vec![expected]);
}

#[test]
fn select_without_registered_result_writes_projected_bytes() {
    let (catalog, store) = setup();
    let ctx = ExecutionContext::new(&catalog, &store);
    insert(&ctx, "emp", &emp_values("1", "ann", "1")).unwrap();
    insert(&ctx, "emp", &emp_values("2", "bob", "2")).unwrap();

    let sel = AttrRef::new("emp", "name");
    let copied = select(&ctx, "out", &[AttrRef::new("emp", "id")], Some(&sel), CompOp::Eq, b"bob")
        .unwrap();
    assert_eq!(copied, 1);
    assert_eq!(store.live_records("out"), vec![int_bytes(2)]);
}

#[test]
fn unconditional_delete_empties_relation() {
    for n in [0, 1, 5] {
        let (catalog, store) = setup();
        let ctx = ExecutionContext::new(&catalog, &store);
        for i in 0..n {
            insert(&ctx, "emp", &emp_values(&i.to_string(), "n", "0")).unwrap();
        }

        let deleted = delete(&ctx, "emp", "", CompOp::Eq, AttrType::Integer, b"").unwrap();
        assert_eq!(deleted, n as u64);

        let copied = select(&ctx, "ids", &[AttrRef::new("emp", "id")], None, CompOp::Eq, b"")
            .unwrap();
        assert_eq!(copied, 0);
        assert_eq!(store.scans_opened(), store.scans_closed());
    }
}

#[test]
fn attribute_count_mismatch_writes_nothing() {
    let (catalog, store) = setup();
    let ctx = ExecutionContext::new(&catalog, &store);

    let result = insert(&ctx, "emp", &[AttrValue::integer("id", "1")]);
    assert_eq!(Status::of(&result), Status::InvalidRecordLength);
    assert!(store.live_records("emp").is_empty());
}

#[test]
fn unknown_attributes_are_reported_by_every_entry_point() {
    let (catalog, store) = setup();
    let ctx = ExecutionContext::new(&catalog, &store);
    insert(&ctx, "emp", &emp_values("1", "a", "1")).unwrap();

    let mut values = emp_values("1", "a", "1");
    values[2] = AttrValue::float("wage", "1");
    let result = insert(&ctx, "emp", &values);
    assert_eq!(Status::of(&result), Status::AttributeNotFound);
    assert_eq!(store.live_records("emp").len(), 1);

    let result = delete(&ctx, "emp", "wage", CompOp::Eq, AttrType::Float, b"1");
    assert_eq!(Status::of(&result), Status::AttributeNotFound);

    let result = select(&ctx, "out", &[AttrRef::new("emp", "wage")], None, CompOp::Eq, b"");
    assert_eq!(Status::of(&result), Status::AttributeNotFound);

    let sel = AttrRef::new("emp", "wage");
    let result = select(&ctx, "out", &[AttrRef::new("emp", "id")], Some(&sel), CompOp::Eq, b"1");
    assert_eq!(Status::of(&result), Status::AttributeNotFound);
    assert_eq!(store.scans_opened(), 0);
}

#[test]
fn unknown_relation_is_schema_lookup_error() {
    let (catalog, store) = setup();
    let ctx = ExecutionContext::new(&catalog, &store);

    let result = insert(&ctx, "ghost", &[AttrValue::integer("id", "1")]);
    assert_eq!(Status::of(&result), Status::SchemaLookupError);

    let result = delete(&ctx, "ghost", "id", CompOp::Eq, AttrType::Integer, b"1");
    assert_eq!(Status::of(&result), Status::SchemaLookupError);
}

#[test]
fn delete_with_wrong_declared_type_is_bad_type() {
    let (catalog, store) = setup();
    let ctx = ExecutionContext::new(&catalog, &store);
    insert(&ctx, "emp", &emp_values("1", "a", "1")).unwrap();

    let result = delete(&ctx, "emp", "id", CompOp::Eq, AttrType::String, b"1");
    assert!(matches!(result, Err(DbError::BadType(_))));
    assert_eq!(store.live_records("emp").len(), 1);
}

#[test]
fn delete_scan_open_failure_is_passed_through() {
    let catalog = emp_catalog();
    let store = MemoryStore::new();
    let ctx = ExecutionContext::new(&catalog, &store);

    let result = delete(&ctx, "emp", "", CompOp::Eq, AttrType::Integer, b"");
    assert_eq!(Status::of(&result), Status::StorageError);
}

#[test]
fn select_scan_failure_keeps_partial_output_and_releases() {
    let (catalog, store) = setup();
    let ctx = ExecutionContext::new(&catalog, &store);
    for i in 0..4 {
        insert(&ctx, "emp", &emp_values(&i.to_string(), "n", "0")).unwrap();
    }
    store.fail_scan_after(2);

    let result = select(&ctx, "ids", &[AttrRef::new("emp", "id")], None, CompOp::Eq, b"");
    assert!(matches!(result, Err(DbError::Storage(_))));
    assert_eq!(store.live_records("ids"), vec![int_bytes(0), int_bytes(1)]);
    assert_eq!((store.scans_opened(), store.scans_closed()), (1, 1));
    assert_eq!(store.writers_opened(), store.writers_closed());
}

proptest! {
    #[test]
    fn delete_gt_removes_exactly_larger_values(
        ids in proptest::collection::vec(-50i32..50, 0..40),
        bound in -50i32..50,
    ) {
        let (catalog, store) = setup();
        let ctx = ExecutionContext::new(&catalog, &store);
        for id in &ids {
            insert(&ctx, "emp", &emp_values(&id.to_string(), "p", "0")).unwrap();
        }

        let deleted = delete(
            &ctx,
            "emp",
            "id",
            CompOp::Gt,
            AttrType::Integer,
            bound.to_string().as_bytes(),
        )
        .unwrap();

        let expected: Vec<Vec<u8>> = ids
            .iter()
            .filter(|id| **id <= bound)
            .map(|id| emp_row(*id, "p", 0.0))
            .collect();
        prop_assert_eq!(deleted as usize, ids.len() - expected.len());
        prop_assert_eq!(store.live_records("emp"), expected);
    }
}

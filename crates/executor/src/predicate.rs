//! Predicate construction shared by DELETE and SELECT.

use catalog::SchemaResolver;
use common::{DbError, DbResult};
use storage::ScanPredicate;

use crate::Selection;

/// Turn an optional selection clause into a scan predicate.
///
/// `None` means "match every tuple". Otherwise the attribute is resolved,
/// the filter text is coerced by the attribute's catalog type, and the
/// predicate covers the attribute's byte range.
pub fn build_predicate(
    resolver: &dyn SchemaResolver,
    selection: Option<&Selection>,
) -> DbResult<Option<ScanPredicate>> {
    let Some(selection) = selection else {
        return Ok(None);
    };
    let desc = resolver.get_info(&selection.relation, &selection.attribute)?;
    if let Some(declared) = selection.declared_type {
        if declared != desc.attr_type {
            return Err(DbError::BadType(format!(
                "filter on '{}.{}' declared {declared}, attribute is {}",
                desc.relation, desc.name, desc.attr_type
            )));
        }
    }
    let value = desc.attr_type.parse_text(&selection.value, desc.len)?;
    let predicate = ScanPredicate::new(desc.offset, desc.len, desc.attr_type, value, selection.op)?;
    Ok(Some(predicate))
}

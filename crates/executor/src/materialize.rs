//! Tuple materialization: named textual attribute values into a packed tuple.

use catalog::SchemaResolver;
use common::{DbError, DbResult, Tuple};

use crate::AttrValue;

/// Build the packed tuple for `relation` from one value per attribute.
///
/// The request must name every attribute of the relation exactly once, in any
/// order. Each value is coerced by its descriptor's type and written at the
/// descriptor's offset using exactly the descriptor's width.
pub fn materialize(
    resolver: &dyn SchemaResolver,
    relation: &str,
    values: &[AttrValue],
) -> DbResult<Tuple> {
    let attrs = resolver.get_rel_info(relation)?;
    if values.len() != attrs.len() {
        return Err(DbError::InvalidRecordLength {
            expected: attrs.len(),
            actual: values.len(),
        });
    }

    let record_len = attrs.iter().map(|a| a.len).sum();
    let mut tuple = Tuple::zeroed(record_len);
    let mut covered = vec![false; attrs.len()];

    for value in values {
        let (idx, desc) = attrs
            .iter()
            .enumerate()
            .find(|(_, desc)| desc.name == value.name)
            .ok_or_else(|| DbError::attribute_not_found(relation, &value.name))?;
        if desc.attr_type != value.attr_type {
            return Err(DbError::BadType(format!(
                "attribute '{}' of '{relation}' is {}, not {}",
                desc.name, desc.attr_type, value.attr_type
            )));
        }
        let out = tuple.field_mut(desc.offset, desc.len).ok_or_else(|| {
            DbError::Catalog(format!(
                "attribute '{}' lies outside the {record_len}-byte tuple of '{relation}'",
                desc.name
            ))
        })?;
        desc.attr_type.coerce_into(&value.value, out)?;
        covered[idx] = true;
    }

    // A repeated attribute satisfies the count check but leaves another one unset.
    if let Some((missing, _)) = attrs.iter().zip(&covered).find(|(_, done)| !**done) {
        return Err(DbError::attribute_not_found(relation, &missing.name));
    }
    Ok(tuple)
}

use common::{DbError, DbResult};
use types::{AttrType, CompOp, Value};

/// Single-attribute comparison evaluated against each scanned record.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanPredicate {
    pub offset: usize,
    pub len: usize,
    pub attr_type: AttrType,
    pub value: Value,
    pub op: CompOp,
}

impl ScanPredicate {
    pub fn new(
        offset: usize,
        len: usize,
        attr_type: AttrType,
        value: Value,
        op: CompOp,
    ) -> DbResult<Self> {
        attr_type.check_width(len)?;
        let value_fits = matches!(
            (attr_type, &value),
            (AttrType::Integer, Value::Int(_))
                | (AttrType::Float, Value::Float(_))
                | (AttrType::String, Value::Text(_))
        );
        if !value_fits {
            return Err(DbError::BadType(format!(
                "{attr_type} predicate cannot compare against {value:?}"
            )));
        }
        Ok(Self {
            offset,
            len,
            attr_type,
            value,
            op,
        })
    }

    /// Whether `record` satisfies the predicate. Unordered floats (NaN) never match.
    pub fn matches(&self, record: &[u8]) -> DbResult<bool> {
        let field = self
            .offset
            .checked_add(self.len)
            .and_then(|end| record.get(self.offset..end))
            .ok_or_else(|| {
                DbError::Storage(format!(
                    "predicate range {}..{} exceeds record of {} bytes",
                    self.offset,
                    self.offset + self.len,
                    record.len()
                ))
            })?;
        let actual = self.attr_type.decode(field)?;
        Ok(actual
            .cmp_same_type(&self.value)
            .is_some_and(|ordering| self.op.matches(ordering)))
    }
}

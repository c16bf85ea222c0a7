use std::{fs, path::Path};

use ahash::RandomState;
use common::{DbError, DbResult};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use storage::MAX_RECORD_LEN;
use types::AttrType;

type Map<K, V> = HashMap<K, V, RandomState>;

/// Resolves attribute names to physical byte ranges.
///
/// Executors only ever see the catalog through this trait, so tests can hand
/// them a fake schema without a persisted catalog.
pub trait SchemaResolver {
    /// Descriptor for one attribute of a relation.
    ///
    /// Fails with `SchemaLookup` for an unknown relation and
    /// `AttributeNotFound` for an unknown attribute.
    fn get_info(&self, relation: &str, attribute: &str) -> DbResult<AttrDesc>;

    /// Every descriptor of a relation in tuple-layout order.
    fn get_rel_info(&self, relation: &str) -> DbResult<Vec<AttrDesc>>;
}

/// Location and type of one attribute inside a relation's tuples.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttrDesc {
    pub relation: String,
    pub name: String,
    pub attr_type: AttrType,
    pub offset: usize,
    pub len: usize,
}

impl AttrDesc {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Attribute declaration used when creating a relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrSpec {
    pub name: String,
    pub attr_type: AttrType,
    pub len: usize,
}

impl AttrSpec {
    pub fn new(name: impl Into<String>, attr_type: AttrType, len: usize) -> Self {
        Self {
            name: name.into(),
            attr_type,
            len,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, AttrType::Integer, AttrType::Integer.default_width())
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, AttrType::Float, AttrType::Float.default_width())
    }

    pub fn string(name: impl Into<String>, len: usize) -> Self {
        Self::new(name, AttrType::String, len)
    }
}

/// Metadata describing a registered relation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationMeta {
    pub name: String,
    pub attrs: Vec<AttrDesc>,
    #[serde(skip)]
    #[serde(default)]
    attr_lookup: Map<String, usize>,
}

impl RelationMeta {
    fn try_new(name: &str, specs: &[AttrSpec]) -> DbResult<Self> {
        // Relation names become heap file names.
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DbError::Catalog(format!(
                "relation name '{name}' must be non-empty ASCII letters, digits or '_'"
            )));
        }
        if specs.is_empty() {
            return Err(DbError::Catalog(format!(
                "relation '{name}' must contain at least one attribute"
            )));
        }
        let mut attrs = Vec::with_capacity(specs.len());
        let mut offset = 0;
        for spec in specs {
            spec.attr_type.check_width(spec.len).map_err(|err| {
                DbError::Catalog(format!("attribute '{}' on '{name}': {err}", spec.name))
            })?;
            attrs.push(AttrDesc {
                relation: name.to_string(),
                name: spec.name.clone(),
                attr_type: spec.attr_type,
                offset,
                len: spec.len,
            });
            offset += spec.len;
        }
        if offset > MAX_RECORD_LEN {
            return Err(DbError::Catalog(format!(
                "relation '{name}' records are {offset} bytes, a page holds at most {MAX_RECORD_LEN}"
            )));
        }
        let mut meta = Self {
            name: name.to_string(),
            attrs,
            attr_lookup: Map::default(),
        };
        meta.rebuild_lookup();
        if meta.attr_lookup.len() != meta.attrs.len() {
            return Err(DbError::Catalog(format!(
                "duplicate attribute found while building relation '{name}'"
            )));
        }
        Ok(meta)
    }

    /// Lookup an attribute by exact (case-sensitive) name.
    pub fn attr(&self, name: &str) -> Option<&AttrDesc> {
        self.attr_lookup.get(name).and_then(|idx| self.attrs.get(*idx))
    }

    /// Fixed tuple length: the sum of every attribute's width.
    pub fn record_len(&self) -> usize {
        self.attrs.iter().map(|a| a.len).sum()
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    fn rebuild_lookup(&mut self) {
        self.attr_lookup.clear();
        for (idx, attr) in self.attrs.iter().enumerate() {
            self.attr_lookup.insert(attr.name.clone(), idx);
        }
    }
}

/// Persistent catalog of relation schemas.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    relations: Vec<RelationMeta>,
    #[serde(skip)]
    #[serde(default)]
    name_index: Map<String, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from disk, returning an empty catalog if the file does not exist.
    pub fn load(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let data = fs::read_to_string(path)?;
        let mut catalog: Catalog = serde_json::from_str(&data)
            .map_err(|err| DbError::Catalog(format!("invalid catalog file: {err}")))?;
        catalog.rebuild_indexes();
        Ok(catalog)
    }

    /// Persist the catalog contents as pretty JSON.
    pub fn save(&self, path: &Path) -> DbResult<()> {
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| DbError::Catalog(format!("serialize failed: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Returns a relation by name.
    pub fn relation(&self, name: &str) -> DbResult<&RelationMeta> {
        self.name_index
            .get(name)
            .and_then(|idx| self.relations.get(*idx))
            .ok_or_else(|| DbError::SchemaLookup(format!("unknown relation '{name}'")))
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Register a relation, laying its attributes out back to back in declaration order.
    pub fn create_relation(&mut self, name: &str, attrs: &[AttrSpec]) -> DbResult<()> {
        if self.name_index.contains_key(name) {
            return Err(DbError::Catalog(format!("relation '{name}' already exists")));
        }
        let meta = RelationMeta::try_new(name, attrs)?;
        self.relations.push(meta);
        self.rebuild_indexes();
        Ok(())
    }

    /// Remove a relation's schema.
    pub fn destroy_relation(&mut self, name: &str) -> DbResult<()> {
        let idx = self
            .name_index
            .get(name)
            .copied()
            .ok_or_else(|| DbError::SchemaLookup(format!("unknown relation '{name}'")))?;
        self.relations.remove(idx);
        self.rebuild_indexes();
        Ok(())
    }

    /// Immutable iterator over all relations.
    pub fn relations(&self) -> impl Iterator<Item = &RelationMeta> {
        self.relations.iter()
    }

    fn rebuild_indexes(&mut self) {
        self.name_index.clear();
        for (idx, relation) in self.relations.iter_mut().enumerate() {
            self.name_index.insert(relation.name.clone(), idx);
            relation.rebuild_lookup();
        }
    }
}

impl SchemaResolver for Catalog {
    fn get_info(&self, relation: &str, attribute: &str) -> DbResult<AttrDesc> {
        self.relation(relation)?
            .attr(attribute)
            .cloned()
            .ok_or_else(|| DbError::attribute_not_found(relation, attribute))
    }

    fn get_rel_info(&self, relation: &str) -> DbResult<Vec<AttrDesc>> {
        Ok(self.relation(relation)?.attrs.clone())
    }
}

//! Database facade: owns the catalog and the heap-file store under one data
//! directory and exposes relation DDL plus the INSERT / DELETE / SELECT entry
//! points.

use anyhow::{Context, Result};
use catalog::{AttrSpec, Catalog, SchemaResolver};
use common::{
    pretty::{self, TableStyleKind},
    Config, DbError, DbResult, RecordId, Tuple,
};
use executor::{AttrRef, AttrValue, ExecutionContext, Executor, SeqScanExec};
use std::{fs, path::Path};
use storage::{FileStore, RelationStore};
use tracing::{debug, info, warn};
use types::{AttrType, CompOp, Value};

/// Single-threaded database handle.
///
/// DDL takes `&mut self`; the data-manipulation entry points only need `&self`
/// since every operator opens its own scans and writers.
pub struct Database {
    config: Config,
    catalog: Catalog,
    store: FileStore,
}

impl Database {
    /// Open (or create) a database under `config.data_dir`.
    ///
    /// Creates the data directory if it doesn't exist and loads the catalog.
    pub fn open(config: &Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.data_dir.display()
            )
        })?;

        let catalog_path = config.catalog_path();
        let catalog = Catalog::load(&catalog_path)
            .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
        let store = FileStore::new(&config.data_dir, config.sync_writes);

        info!(
            data_dir = %config.data_dir.display(),
            relations = catalog.relations().count(),
            "database opened"
        );
        Ok(Self {
            config: config.clone(),
            catalog,
            store,
        })
    }

    fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.catalog, &self.store)
    }

    fn save_catalog(&self) -> DbResult<()> {
        self.catalog.save(&self.config.catalog_path())
    }

    /// Register a relation and create its empty heap file.
    pub fn create_relation(&mut self, name: &str, attrs: &[AttrSpec]) -> DbResult<()> {
        self.catalog.create_relation(name, attrs)?;
        if let Err(err) = self.store.create(name) {
            self.catalog.destroy_relation(name)?;
            return Err(err);
        }
        self.save_catalog()?;
        info!(relation = name, attrs = attrs.len(), "relation created");
        Ok(())
    }

    /// Remove a relation from the catalog and delete its heap file.
    pub fn destroy_relation(&mut self, name: &str) -> DbResult<()> {
        self.catalog.destroy_relation(name)?;
        self.save_catalog()?;
        if self.store.exists(name) {
            self.store.destroy(name)?;
        } else {
            warn!(relation = name, "relation had no heap file");
        }
        info!(relation = name, "relation destroyed");
        Ok(())
    }

    /// Insert one tuple. See [`executor::insert`].
    pub fn insert(&self, relation: &str, values: &[AttrValue]) -> DbResult<RecordId> {
        executor::insert(&self.context(), relation, values)
    }

    /// Delete matching tuples. An empty `attribute` deletes every tuple.
    pub fn delete(
        &self,
        relation: &str,
        attribute: &str,
        op: CompOp,
        attr_type: AttrType,
        value: &[u8],
    ) -> DbResult<u64> {
        executor::delete(&self.context(), relation, attribute, op, attr_type, value)
    }

    /// Project matching tuples into `result`. See [`executor::select`].
    pub fn select(
        &self,
        result: &str,
        projection: &[AttrRef],
        selection: Option<&AttrRef>,
        op: CompOp,
        value: &[u8],
    ) -> DbResult<u64> {
        executor::select(&self.context(), result, projection, selection, op, value)
    }

    /// Every live packed tuple of a registered relation, in storage order.
    pub fn scan(&self, relation: &str) -> DbResult<Vec<Tuple>> {
        self.catalog.relation(relation)?;
        let ctx = self.context();
        let mut scan = SeqScanExec::new(relation, None);
        scan.open(&ctx)?;

        let mut tuples = Vec::new();
        let outcome = loop {
            match scan.next() {
                Ok(Some(bytes)) => tuples.push(Tuple::from(bytes.to_vec())),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        let closed = scan.close();
        outcome?;
        closed?;
        debug!(relation, tuples = tuples.len(), "relation scanned");
        Ok(tuples)
    }

    /// Every live tuple of a relation decoded attribute by attribute.
    pub fn decode(&self, relation: &str) -> DbResult<Vec<Vec<Value>>> {
        let attrs = self.catalog.get_rel_info(relation)?;
        let tuples = self.scan(relation)?;
        tuples
            .iter()
            .map(|tuple| {
                attrs
                    .iter()
                    .map(|desc| -> DbResult<Value> {
                        let field = tuple.field(desc.offset, desc.len).ok_or(
                            DbError::InvalidRecordLength {
                                expected: desc.end(),
                                actual: tuple.len(),
                            },
                        )?;
                        Ok(desc.attr_type.decode(field)?)
                    })
                    .collect::<DbResult<Vec<_>>>()
            })
            .collect()
    }

    /// Number of live tuples in a relation.
    pub fn relation_len(&self, relation: &str) -> DbResult<usize> {
        Ok(self.scan(relation)?.len())
    }

    /// Render a relation as a table with one column per attribute.
    pub fn print_relation(&self, relation: &str, style: TableStyleKind) -> DbResult<String> {
        let headers = self
            .catalog
            .relation(relation)?
            .attrs
            .iter()
            .map(|desc| desc.name.clone())
            .collect::<Vec<_>>();
        let rows = self.decode(relation)?;
        Ok(pretty::render_tuples(&headers, &rows, style))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        self.store.data_dir()
    }
}

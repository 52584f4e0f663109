//! Generic Data Access Object over any [`Entity`] shape.
//!
//! # Responsibility
//! - Combine the predicate compiler, the entity row mapper and the raw
//!   executor into `save/get_by_id/find/search/update/delete/list_all`.
//!
//! # Invariants
//! - Write paths call `Entity::validate()` before SQL mutations.
//! - `get_by_id` returns `NotFound` for zero rows and `Consistency` for
//!   more than one; it never picks an arbitrary row.
//! - Read paths hydrate nested references after row mapping, reusing the
//!   schema catalog loaded when the DAO was built.

use crate::db::SchemaCatalog;
use crate::model::entity::{Entity, EntityId};
use crate::query::compiler::compile;
use crate::query::filter::{Filter, MatchMode};
use crate::query::page::PageRequest;
use crate::repo::error::{at_most_one, RepoError, RepoResult};
use crate::repo::executor::SqliteExecutor;
use log::{debug, warn};
use rusqlite::Connection;
use std::marker::PhantomData;
use std::time::Instant;

/// CRUD and query-by-example contract shared by every entity.
pub trait Dao<E: Entity> {
    /// Inserts `entity`, assigns its generated identity and returns it.
    fn save(&self, entity: &mut E) -> RepoResult<EntityId>;
    fn get_by_id(&self, id: EntityId) -> RepoResult<E>;
    /// Exact match on every constrained template field.
    fn find(&self, template: &E::Template, page: Option<&PageRequest>) -> RepoResult<Vec<E>>;
    /// Case-insensitive substring match on text fields, exact elsewhere.
    fn search(&self, template: &E::Template, page: Option<&PageRequest>) -> RepoResult<Vec<E>>;
    fn update(&self, entity: &E) -> RepoResult<()>;
    fn delete(&self, id: EntityId) -> RepoResult<()>;
    /// Same rows as `find` with an empty template.
    fn list_all(&self, page: Option<&PageRequest>) -> RepoResult<Vec<E>>;
    fn count(&self, template: &E::Template, mode: MatchMode) -> RepoResult<u64>;
}

/// Loads referenced entities while hydrating a read.
///
/// Borrows the connection and schema catalog of the DAO that issued the
/// read; nested loads run one identity query each and never reload schema.
pub struct Hydrator<'a> {
    conn: &'a Connection,
    catalog: &'a SchemaCatalog,
}

impl<'a> Hydrator<'a> {
    pub fn new(conn: &'a Connection, catalog: &'a SchemaCatalog) -> Self {
        Self { conn, catalog }
    }

    /// Loads one entity by identity and hydrates its own references.
    ///
    /// `NotFound` for zero rows, `Consistency` for more than one.
    pub fn load<E: Entity>(&self, id: EntityId) -> RepoResult<E> {
        if !self.catalog.has_table(E::TABLE) {
            return Err(RepoError::MissingRequiredTable(E::TABLE));
        }

        let filter = compile::<E>(&E::id_template(id), MatchMode::Find, self.catalog);
        let rows = SqliteExecutor::new(self.conn, self.catalog).run_query(
            E::TABLE,
            &filter,
            None,
            E::from_row,
        )?;
        let mut entity = at_most_one(rows, E::NAME, || format!("id = {id}"))?.ok_or(
            RepoError::NotFound {
                entity: E::NAME,
                id,
            },
        )?;
        entity.hydrate(self)?;
        Ok(entity)
    }
}

/// SQLite-backed generic DAO.
pub struct SqliteDao<'conn, E> {
    conn: &'conn Connection,
    catalog: SchemaCatalog,
    _entity: PhantomData<E>,
}

impl<'conn, E: Entity> SqliteDao<'conn, E> {
    /// Constructs a DAO from a migrated connection.
    ///
    /// Fails with `MissingRequiredTable` when the entity table is absent.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let catalog = SchemaCatalog::load(conn)?;
        if !catalog.has_table(E::TABLE) {
            return Err(RepoError::MissingRequiredTable(E::TABLE));
        }

        Ok(Self {
            conn,
            catalog,
            _entity: PhantomData,
        })
    }

    pub fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Compiles `template` without running it.
    pub fn compile(&self, template: &E::Template, mode: MatchMode) -> Filter {
        compile::<E>(template, mode, &self.catalog)
    }

    /// Runs an already compiled filter and maps, then hydrates, each row.
    pub fn query_filter(&self, filter: &Filter, page: Option<&PageRequest>) -> RepoResult<Vec<E>> {
        let started_at = Instant::now();
        let mut entities = self.executor().run_query(E::TABLE, filter, page, E::from_row)?;
        let hydrator = self.hydrator();
        for entity in &mut entities {
            entity.hydrate(&hydrator)?;
        }

        debug!(
            "event=dao_query module=repo entity={} predicates={} rows={} duration_ms={}",
            E::NAME,
            filter.predicates().len(),
            entities.len(),
            started_at.elapsed().as_millis()
        );
        Ok(entities)
    }

    fn query(
        &self,
        template: &E::Template,
        mode: MatchMode,
        page: Option<&PageRequest>,
    ) -> RepoResult<Vec<E>> {
        let filter = self.compile(template, mode);
        self.query_filter(&filter, page)
    }

    fn hydrator(&self) -> Hydrator<'_> {
        Hydrator::new(self.conn, &self.catalog)
    }

    fn executor(&self) -> SqliteExecutor<'_> {
        SqliteExecutor::new(self.conn, &self.catalog)
    }

    fn require_id(entity: &E) -> RepoResult<EntityId> {
        entity.id().ok_or_else(|| {
            RepoError::InvalidData(format!("{} has no identity; save it first", E::NAME))
        })
    }
}

impl<E: Entity> Dao<E> for SqliteDao<'_, E> {
    fn save(&self, entity: &mut E) -> RepoResult<EntityId> {
        entity.validate()?;

        let values = entity.column_values()?;
        let id = self.executor().run_insert(E::TABLE, &values)?;
        entity.set_id(id);

        debug!(
            "event=dao_save module=repo entity={} status=ok id={}",
            E::NAME,
            id
        );
        Ok(id)
    }

    fn get_by_id(&self, id: EntityId) -> RepoResult<E> {
        self.hydrator().load(id).map_err(|err| {
            if matches!(err, RepoError::Consistency { .. }) {
                warn!(
                    "event=dao_get module=repo entity={} status=error error_code=consistency id={}",
                    E::NAME,
                    id
                );
            }
            err
        })
    }

    fn find(&self, template: &E::Template, page: Option<&PageRequest>) -> RepoResult<Vec<E>> {
        self.query(template, MatchMode::Find, page)
    }

    fn search(&self, template: &E::Template, page: Option<&PageRequest>) -> RepoResult<Vec<E>> {
        self.query(template, MatchMode::Search, page)
    }

    fn update(&self, entity: &E) -> RepoResult<()> {
        entity.validate()?;

        let id = Self::require_id(entity)?;
        let values = entity.column_values()?;
        let changed = self.executor().run_update(E::TABLE, id, &values)?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: E::NAME,
                id,
            });
        }

        Ok(())
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let changed = self.executor().run_delete(E::TABLE, id)?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: E::NAME,
                id,
            });
        }

        Ok(())
    }

    fn list_all(&self, page: Option<&PageRequest>) -> RepoResult<Vec<E>> {
        self.query(&E::Template::default(), MatchMode::Find, page)
    }

    fn count(&self, template: &E::Template, mode: MatchMode) -> RepoResult<u64> {
        let filter = self.compile(template, mode);
        self.executor().run_count(E::TABLE, &filter)
    }
}

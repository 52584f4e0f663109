//! Raw relational executor over SQLite.
//!
//! # Responsibility
//! - Run compiled filters, single-row inserts, updates and deletes.
//! - Apply caller sort/paging requests without interpreting them.
//!
//! # Invariants
//! - One statement per call; no transaction spans calls.
//! - Sort fields must name an existing column of the queried table; they are
//!   never spliced into SQL otherwise.
//! - Without an explicit sort, rows come back by ascending identity.

use crate::db::SchemaCatalog;
use crate::model::entity::{EntityId, ID_COLUMN};
use crate::query::filter::Filter;
use crate::query::page::PageRequest;
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

pub struct SqliteExecutor<'a> {
    conn: &'a Connection,
    catalog: &'a SchemaCatalog,
}

impl<'a> SqliteExecutor<'a> {
    pub fn new(conn: &'a Connection, catalog: &'a SchemaCatalog) -> Self {
        Self { conn, catalog }
    }

    pub fn run_query<T, F>(
        &self,
        table: &str,
        filter: &Filter,
        page: Option<&PageRequest>,
        mut map_row: F,
    ) -> RepoResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> RepoResult<T>,
    {
        let (where_sql, mut bind_values) = filter.to_sql();
        let mut sql = format!("SELECT * FROM {table} WHERE {where_sql}");
        sql.push_str(&self.order_clause(table, page)?);
        push_paging(&mut sql, &mut bind_values, page);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(map_row(row)?);
        }

        Ok(items)
    }

    pub fn run_count(&self, table: &str, filter: &Filter) -> RepoResult<u64> {
        let (where_sql, bind_values) = filter.to_sql();
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {where_sql}"),
            params_from_iter(bind_values),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
    }

    /// Inserts one row and returns its generated identity.
    pub fn run_insert(&self, table: &str, values: &[(&'static str, Value)]) -> RepoResult<EntityId> {
        let columns = values
            .iter()
            .map(|(column, _)| *column)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; values.len()].join(", ");

        self.conn.execute(
            &format!("INSERT INTO {table} ({columns}) VALUES ({placeholders});"),
            params_from_iter(values.iter().map(|(_, value)| value)),
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Updates one row by identity and returns the number of changed rows.
    pub fn run_update(
        &self,
        table: &str,
        id: EntityId,
        values: &[(&'static str, Value)],
    ) -> RepoResult<usize> {
        let assignments = values
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let binds = values
            .iter()
            .map(|(_, value)| value.clone())
            .chain(std::iter::once(Value::Integer(id)));

        let changed = self.conn.execute(
            &format!("UPDATE {table} SET {assignments} WHERE {ID_COLUMN} = ?;"),
            params_from_iter(binds),
        )?;
        Ok(changed)
    }

    /// Hard-deletes one row by identity and returns the number of removed rows.
    pub fn run_delete(&self, table: &str, id: EntityId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE {ID_COLUMN} = ?1;"),
            [id],
        )?;
        Ok(changed)
    }

    fn order_clause(&self, table: &str, page: Option<&PageRequest>) -> RepoResult<String> {
        let sort = page.map(|page| page.sort.as_slice()).unwrap_or_default();
        if sort.is_empty() {
            return Ok(format!(" ORDER BY {ID_COLUMN} ASC"));
        }

        let mut terms = Vec::with_capacity(sort.len());
        for order in sort {
            if !self.catalog.has_column(table, &order.field) {
                return Err(RepoError::InvalidSort(order.field.clone()));
            }
            terms.push(format!("{} {}", order.field, order.direction.as_sql()));
        }
        Ok(format!(" ORDER BY {}", terms.join(", ")))
    }
}

fn push_paging(sql: &mut String, bind_values: &mut Vec<Value>, page: Option<&PageRequest>) {
    let Some(page) = page else {
        return;
    };

    if let Some(limit) = page.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if page.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(page.offset)));
        }
    } else if page.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(page.offset)));
    }
}

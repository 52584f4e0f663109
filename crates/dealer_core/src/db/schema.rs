//! Snapshot of the stored table/column layout.
//!
//! The predicate compiler consults this snapshot to drop template fields
//! that have no matching column instead of failing the query.

use super::DbResult;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl SchemaCatalog {
    /// Reads every user table and its columns from `sqlite_master`.
    pub fn load(conn: &Connection) -> DbResult<Self> {
        let mut stmt = conn.prepare(
            "SELECT name
             FROM sqlite_master
             WHERE type = 'table'
               AND name NOT LIKE 'sqlite_%'
             ORDER BY name;",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = BTreeMap::new();
        for name in names {
            let columns = table_columns(conn, &name)?;
            tables.insert(name, columns);
        }

        Ok(Self { tables })
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|columns| columns.contains(column))
    }

    pub fn columns(&self, table: &str) -> Option<&BTreeSet<String>> {
        self.tables.get(table)
    }
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\");"))?;
    let mut rows = stmt.query([])?;
    let mut columns = BTreeSet::new();
    while let Some(row) = rows.next()? {
        columns.insert(row.get::<_, String>(1)?);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::SchemaCatalog;
    use rusqlite::Connection;

    #[test]
    fn load_lists_tables_and_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE banks (id INTEGER PRIMARY KEY, name TEXT);")
            .unwrap();

        let catalog = SchemaCatalog::load(&conn).unwrap();
        assert!(catalog.has_table("banks"));
        assert!(catalog.has_column("banks", "name"));
        assert!(!catalog.has_column("banks", "code"));
        assert!(!catalog.has_column("persons", "name"));
    }
}

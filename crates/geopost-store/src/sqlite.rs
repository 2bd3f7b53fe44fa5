use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;
use tracing::{error, info};

use crate::audit::{AuditStore, Mutation, SetCell};
use crate::error::{StoreError, StoreResult};

/// [`AuditStore`] that keeps wide-column cells in a SQLite table.
///
/// Each row mutation is applied in one transaction, so a batch lands whole or
/// not at all. Cell versions are keyed by timestamp; rewriting the same
/// version replaces it.
#[derive(Clone)]
pub struct SqliteAuditStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAuditStore {
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        run_migrations(&conn)?;

        info!("Audit DB opened at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Internal(format!("Audit DB lock poisoned: {}", e)))?;
        f(&mut conn)
    }

    /// Latest version of every cell in a row, ordered by family then column.
    pub fn read_row(&self, table: &str, row_key: &str) -> StoreResult<Vec<SetCell>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT family, qualifier, timestamp_micros, value
                 FROM cells c
                 WHERE table_name = ?1 AND row_key = ?2
                   AND timestamp_micros = (
                       SELECT MAX(timestamp_micros) FROM cells
                       WHERE table_name = c.table_name AND row_key = c.row_key
                         AND family = c.family AND qualifier = c.qualifier
                   )
                 ORDER BY family, qualifier",
            )?;

            let cells = stmt
                .query_map([table, row_key], |row| {
                    Ok(SetCell {
                        family: row.get(0)?,
                        column: row.get(1)?,
                        timestamp_micros: row.get(2)?,
                        value: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(cells)
        })
    }
}

fn run_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS cells (
            table_name          TEXT NOT NULL,
            row_key             TEXT NOT NULL,
            family              TEXT NOT NULL,
            qualifier           TEXT NOT NULL,
            timestamp_micros    INTEGER NOT NULL,
            value               BLOB NOT NULL,
            PRIMARY KEY (table_name, row_key, family, qualifier, timestamp_micros)
        );
        ",
    )?;

    info!("Audit DB migrations complete");
    Ok(())
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    async fn apply_mutation(&self, table: &str, row_key: &str, mutation: &Mutation) -> StoreResult<()> {
        let store = self.clone();
        let table = table.to_string();
        let row_key = row_key.to_string();
        let mutation = mutation.clone();

        tokio::task::spawn_blocking(move || {
            store.with_conn(|conn| {
                let tx = conn.transaction()?;
                for cell in mutation.cells() {
                    tx.execute(
                        "INSERT OR REPLACE INTO cells
                            (table_name, row_key, family, qualifier, timestamp_micros, value)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        rusqlite::params![
                            &table,
                            &row_key,
                            &cell.family,
                            &cell.column,
                            cell.timestamp_micros,
                            &cell.value,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
        })
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StoreError::Internal(e.to_string())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn applies_batch_and_reads_latest_versions() {
        let store = SqliteAuditStore::open_in_memory().unwrap();

        let mut first = Mutation::new();
        first
            .set("post", "user", 10, "alice")
            .set("post", "message", 10, "hello")
            .set("location", "lat", 10, "37.7")
            .set("location", "lon", 10, "-122.4");
        store.apply_mutation("post", "row-1", &first).await.unwrap();

        let mut second = Mutation::new();
        second.set("post", "message", 20, "edited");
        store.apply_mutation("post", "row-1", &second).await.unwrap();

        let cells = store.read_row("post", "row-1").unwrap();
        let flat: Vec<(&str, &str, &[u8])> = cells
            .iter()
            .map(|c| (c.family.as_str(), c.column.as_str(), c.value.as_slice()))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("location", "lat", b"37.7".as_slice()),
                ("location", "lon", b"-122.4".as_slice()),
                ("post", "message", b"edited".as_slice()),
                ("post", "user", b"alice".as_slice()),
            ]
        );
    }

    #[tokio::test]
    async fn rows_are_isolated_by_table_and_key() {
        let store = SqliteAuditStore::open_in_memory().unwrap();
        let mut m = Mutation::new();
        m.set("post", "user", 1, "bob");
        store.apply_mutation("post", "row-a", &m).await.unwrap();

        assert!(store.read_row("post", "row-b").unwrap().is_empty());
        assert!(store.read_row("other", "row-a").unwrap().is_empty());
        assert_eq!(store.read_row("post", "row-a").unwrap().len(), 1);
    }
}

//! SQLite-backed store of normalized World Bank indicator records.

use std::path::Path;

use rusqlite::{params, Connection};
use stability_core::error::{Result, StabilityError};
use stability_core::models::IndicatorRecord;
use tracing::{debug, info};

fn db_err(e: rusqlite::Error) -> StabilityError {
    StabilityError::Database(e.to_string())
}

fn insert_all(conn: &Connection, records: &[IndicatorRecord]) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO world_bank (country_id, indicator_id, year, value)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(db_err)?;
    for record in records {
        stmt.execute(params![
            record.country_id,
            record.indicator_id,
            record.year,
            record.value
        ])
        .map_err(db_err)?;
    }
    Ok(())
}

/// The `world_bank` table and the queries the scorer runs against it.
pub struct WorldBankStore {
    conn: Connection,
}

impl WorldBankStore {
    /// Open (or create) the database file at `path`, creating parent
    /// directories and the schema as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StabilityError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::init_schema(&conn)?;
        debug!("Opened indicator store at {}", path.display());
        Ok(Self { conn })
    }

    /// A throwaway store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS world_bank (
                country_id   TEXT NOT NULL,
                indicator_id TEXT NOT NULL,
                year         INTEGER NOT NULL,
                value        REAL
            );
            CREATE INDEX IF NOT EXISTS idx_world_bank_country_year
                ON world_bank (country_id, year);",
        )
        .map_err(db_err)
    }

    /// Insert `records` in a single transaction. Returns the number inserted.
    pub fn insert_records(&mut self, records: &[IndicatorRecord]) -> Result<usize> {
        let tx = self.conn.transaction().map_err(db_err)?;
        insert_all(&tx, records)?;
        tx.commit().map_err(db_err)?;
        info!("Stored {} indicator records", records.len());
        Ok(records.len())
    }

    /// Swap the table contents for `records` in a single transaction.
    ///
    /// On any failure the previous rows are kept.
    pub fn replace_records(&mut self, records: &[IndicatorRecord]) -> Result<usize> {
        let tx = self.conn.transaction().map_err(db_err)?;
        tx.execute("DELETE FROM world_bank", []).map_err(db_err)?;
        insert_all(&tx, records)?;
        tx.commit().map_err(db_err)?;
        info!("Replaced indicator store with {} records", records.len());
        Ok(records.len())
    }

    /// All indicator rows for one country-year, in insertion order.
    pub fn records_for(&self, country_id: &str, year: i32) -> Result<Vec<IndicatorRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT country_id, indicator_id, year, value
                 FROM world_bank
                 WHERE country_id = ?1 AND year = ?2
                 ORDER BY rowid",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![country_id, year], |row| {
                Ok(IndicatorRecord {
                    country_id: row.get(0)?,
                    indicator_id: row.get(1)?,
                    year: row.get(2)?,
                    value: row.get(3)?,
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Distinct (country, year) pairs present in the table, sorted.
    pub fn country_years(&self) -> Result<Vec<(String, i32)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT country_id, year FROM world_bank
                 ORDER BY country_id, year",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Number of rows in the table.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM world_bank", [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

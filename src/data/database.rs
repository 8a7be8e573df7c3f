//! SQLite storage for performance records

use crate::data::repository::{PerformanceRepository, PerformanceSource};
use crate::{PerformanceRecord, PlayerStats, RecordId, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SELECT_COLUMNS: &str = "SELECT id, average, strike_rate, bowling_average, economy_rate,
            fielding_stats, label
     FROM performances";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS performances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                average REAL NOT NULL,
                strike_rate REAL NOT NULL,
                bowling_average REAL NOT NULL,
                economy_rate REAL NOT NULL,
                fielding_stats INTEGER NOT NULL,
                label INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<PerformanceRecord> {
        Ok(PerformanceRecord {
            id: RecordId(row.get(0)?),
            stats: PlayerStats {
                average: row.get(1)?,
                strike_rate: row.get(2)?,
                bowling_average: row.get(3)?,
                economy_rate: row.get(4)?,
                fielding_stats: row.get(5)?,
                label: row.get(6)?,
            },
        })
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let (record_count, suitable_count): (i64, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(label = 1) FROM performances",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DatabaseStats {
            record_count: record_count as usize,
            suitable_count: suitable_count.unwrap_or(0) as usize,
        })
    }
}

impl PerformanceSource for Database {
    fn find_all(&self) -> Result<Vec<PerformanceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl PerformanceRepository for Database {
    fn find_by_id(&self, id: RecordId) -> Result<Option<PerformanceRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id.0],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn insert(&self, stats: &PlayerStats) -> Result<PerformanceRecord> {
        self.conn.execute(
            "INSERT INTO performances (average, strike_rate, bowling_average, economy_rate,
                                       fielding_stats, label)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stats.average,
                stats.strike_rate,
                stats.bowling_average,
                stats.economy_rate,
                stats.fielding_stats,
                stats.label,
            ],
        )?;

        let id = RecordId(self.conn.last_insert_rowid());
        Ok(PerformanceRecord::new(id, stats.clone()))
    }

    fn update(&self, id: RecordId, stats: &PlayerStats) -> Result<Option<PerformanceRecord>> {
        let changed = self.conn.execute(
            "UPDATE performances
             SET average = ?1, strike_rate = ?2, bowling_average = ?3, economy_rate = ?4,
                 fielding_stats = ?5, label = ?6
             WHERE id = ?7",
            params![
                stats.average,
                stats.strike_rate,
                stats.bowling_average,
                stats.economy_rate,
                stats.fielding_stats,
                stats.label,
                id.0,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(PerformanceRecord::new(id, stats.clone())))
    }

    fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM performances WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn exists_by_id(&self, id: RecordId) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM performances WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub record_count: usize,
    pub suitable_count: usize,
}

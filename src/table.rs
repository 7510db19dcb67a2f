//! SQLite results table
//!
//! Flattens cached search results into one row per business. Every load
//! drops and recreates the table, so it only ever holds the latest search.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

use crate::cache::JsonCache;
use crate::data::search::{cached_businesses, SearchError};
use crate::data::ResultRow;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to create database directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Search(#[from] SearchError),
}

pub type Result<T> = std::result::Result<T, TableError>;

/// Single-table store of the latest search results
pub struct ResultTable {
    conn: Connection,
}

impl ResultTable {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TableError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    fn recreate(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            DROP TABLE IF EXISTS results;
            CREATE TABLE results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location TEXT NOT NULL,
                rating REAL NOT NULL,
                category TEXT NOT NULL,
                price TEXT NOT NULL,
                name TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Replaces the table contents with the businesses cached under `keys`
    ///
    /// Each row is committed on its own; a failure part way leaves the rows
    /// inserted so far. Keys missing from the cache contribute no rows.
    ///
    /// # Returns
    /// The number of rows inserted
    pub fn load(&mut self, cache: &JsonCache, keys: &[String], location: &str) -> Result<usize> {
        self.recreate()?;

        let businesses = cached_businesses(cache, keys)?;
        for business in &businesses {
            self.insert(&ResultRow::from_business(location, business))?;
        }

        tracing::debug!(rows = businesses.len(), %location, "results table loaded");
        Ok(businesses.len())
    }

    fn insert(&self, row: &ResultRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO results (location, rating, category, price, name) VALUES (?1, ?2, ?3, ?4, ?5)",
            (&row.location, row.rating, &row.category, &row.price, &row.name),
        )?;
        Ok(())
    }

    /// Every row, in insertion order
    pub fn rows(&self) -> Result<Vec<ResultRow>> {
        if !self.exists()? {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT location, rating, category, price, name FROM results ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ResultRow {
                location: row.get(0)?,
                rating: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                name: row.get(4)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn count(&self) -> Result<usize> {
        if !self.exists()? {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn exists(&self) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'results'",
            [],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }
}

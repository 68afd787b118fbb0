//! Currency and rate storage with SQLite

use super::{search_order, InMemoryRateRepository, RateRepository, SearchKind};
use crate::currency::{Currency, RateObservation};
use crate::error::{Result, TrendError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Rate repository with SQLite backend
///
/// The connection sits behind a mutex so the repository can be shared
/// through the `Send + Sync` [`RateRepository`] trait.
pub struct SqliteRateRepository {
    conn: Mutex<Connection>,
}

impl SqliteRateRepository {
    /// Create or open database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .map_err(|e| TrendError::DataError(format!("Failed to open database: {}", e)))?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_tables()?;
        Ok(repo)
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TrendError::DataError(format!("Failed to create in-memory database: {}", e))
        })?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_tables()?;
        Ok(repo)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrendError::DataError("Database connection lock poisoned".to_string()))
    }

    /// Create database tables
    pub fn create_tables(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS currencies (
                id INTEGER PRIMARY KEY,
                symbol TEXT NOT NULL,
                name TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| TrendError::DataError(format!("Failed to create currencies table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS exchange_rates (
                currency_id INTEGER NOT NULL REFERENCES currencies(id),
                date TEXT NOT NULL,
                rate REAL NOT NULL,
                PRIMARY KEY (currency_id, date)
            )",
            [],
        )
        .map_err(|e| {
            TrendError::DataError(format!("Failed to create exchange_rates table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_currency_symbol ON currencies(symbol)",
            [],
        )
        .map_err(|e| TrendError::DataError(format!("Failed to create symbol index: {}", e)))?;

        Ok(())
    }

    /// Insert a new currency
    pub fn insert_currency(&self, currency: &Currency) -> Result<i64> {
        self.conn()?
            .execute(
                "INSERT INTO currencies (id, symbol, name) VALUES (?1, ?2, ?3)",
                params![currency.id, &currency.symbol, &currency.name],
            )
            .map_err(|e| TrendError::DataError(format!("Failed to insert currency: {}", e)))?;

        Ok(currency.id)
    }

    /// Insert or replace the rate of a currency on a date
    pub fn insert_rate(&self, observation: &RateObservation) -> Result<()> {
        observation.validate()?;

        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO exchange_rates (currency_id, date, rate) VALUES (?1, ?2, ?3)",
                params![
                    observation.currency_id,
                    observation.date,
                    observation.rate,
                ],
            )
            .map_err(|e| TrendError::DataError(format!("Failed to insert rate: {}", e)))?;

        Ok(())
    }

    /// Copy every currency and rate from an in-memory repository in one transaction
    pub fn import_from(&self, source: &InMemoryRateRepository) -> Result<(usize, usize)> {
        let currencies = source.currencies()?;
        let observations = source.observations();

        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| TrendError::DataError(format!("Failed to begin transaction: {}", e)))?;

        for currency in &currencies {
            tx.execute(
                "INSERT OR REPLACE INTO currencies (id, symbol, name) VALUES (?1, ?2, ?3)",
                params![currency.id, &currency.symbol, &currency.name],
            )
            .map_err(|e| TrendError::DataError(format!("Failed to import currency: {}", e)))?;
        }

        for obs in &observations {
            tx.execute(
                "INSERT OR REPLACE INTO exchange_rates (currency_id, date, rate) VALUES (?1, ?2, ?3)",
                params![obs.currency_id, obs.date, obs.rate],
            )
            .map_err(|e| TrendError::DataError(format!("Failed to import rate: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| TrendError::DataError(format!("Failed to commit import: {}", e)))?;

        log::info!(
            "Imported {} currencies and {} rates",
            currencies.len(),
            observations.len()
        );
        Ok((currencies.len(), observations.len()))
    }

    fn row_to_currency(row: &Row<'_>) -> rusqlite::Result<Currency> {
        Ok(Currency {
            id: row.get(0)?,
            symbol: row.get(1)?,
            name: row.get(2)?,
        })
    }

    fn row_to_observation(row: &Row<'_>) -> rusqlite::Result<RateObservation> {
        Ok(RateObservation {
            currency_id: row.get(0)?,
            date: row.get(1)?,
            rate: row.get(2)?,
        })
    }
}

impl RateRepository for SqliteRateRepository {
    fn search_currencies(&self, kind: SearchKind, text: &str) -> Result<Vec<Currency>> {
        // No LIKE: `%` and `_` in `text` are plain characters, folded with `fold_case`
        let mut found: Vec<Currency> = self
            .currencies()?
            .into_iter()
            .filter(|c| kind.matches(c, text))
            .collect();
        found.sort_by(search_order(text));
        Ok(found)
    }

    fn rate_history(
        &self,
        currency_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RateObservation>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT currency_id, date, rate FROM exchange_rates
                 WHERE currency_id = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date",
            )
            .map_err(|e| TrendError::DataError(format!("Failed to prepare history query: {}", e)))?;

        let history = stmt
            .query_map(params![currency_id, from, to], Self::row_to_observation)
            .map_err(|e| TrendError::DataError(format!("Failed to query history: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrendError::DataError(format!("Failed to read rate row: {}", e)))?;
        Ok(history)
    }

    fn rates(&self, currency_id: i64) -> Result<Vec<RateObservation>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT currency_id, date, rate FROM exchange_rates
                 WHERE currency_id = ?1 ORDER BY date",
            )
            .map_err(|e| TrendError::DataError(format!("Failed to prepare rates query: {}", e)))?;

        let rates = stmt
            .query_map(params![currency_id], Self::row_to_observation)
            .map_err(|e| TrendError::DataError(format!("Failed to query rates: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrendError::DataError(format!("Failed to read rate row: {}", e)))?;
        Ok(rates)
    }

    fn rate_on(&self, currency_id: i64, date: NaiveDate) -> Result<Option<RateObservation>> {
        self.conn()?
            .query_row(
                "SELECT currency_id, date, rate FROM exchange_rates
                 WHERE currency_id = ?1 AND date = ?2",
                params![currency_id, date],
                Self::row_to_observation,
            )
            .optional()
            .map_err(|e| TrendError::DataError(format!("Failed to get rate: {}", e)))
    }

    fn currency(&self, id: i64) -> Result<Option<Currency>> {
        self.conn()?
            .query_row(
                "SELECT id, symbol, name FROM currencies WHERE id = ?1",
                params![id],
                Self::row_to_currency,
            )
            .optional()
            .map_err(|e| TrendError::DataError(format!("Failed to get currency: {}", e)))
    }

    fn currencies(&self) -> Result<Vec<Currency>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, symbol, name FROM currencies ORDER BY id")
            .map_err(|e| TrendError::DataError(format!("Failed to prepare query: {}", e)))?;

        let all = stmt
            .query_map([], Self::row_to_currency)
            .map_err(|e| TrendError::DataError(format!("Failed to list currencies: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| TrendError::DataError(format!("Failed to read currency row: {}", e)))?;
        Ok(all)
    }

    fn latest_rate(&self, currency_id: i64) -> Result<Option<RateObservation>> {
        self.conn()?
            .query_row(
                "SELECT currency_id, date, rate FROM exchange_rates
                 WHERE currency_id = ?1 ORDER BY date DESC LIMIT 1",
                params![currency_id],
                Self::row_to_observation,
            )
            .optional()
            .map_err(|e| TrendError::DataError(format!("Failed to get latest rate: {}", e)))
    }
}

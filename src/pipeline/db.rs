//! Persistence sink for holders, transfers and per-wallet watermarks
//!
//! Tables:
//! - `holders` - replaced per mint on every discovery pass
//!
//! `transfers.wallet` declares a reference to `holders` but foreign keys are
//! switched off: transfers outlive the holder set they were scanned for.
//! - `transfers` - INSERT only, keyed by signature, never updated
//! - `watermarks` - per-wallet latest ingested timestamp, only moves forward

use super::types::{Holder, TradeDirection, TransferRecord};
use crate::ingest_core::error_handler::IngestError;
use crate::ingest_core::venue::Venue;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

/// Storage operations the ingestion core consumes.
///
/// Implementations must be safe under concurrent callers; locking and
/// transaction discipline belong to the sink.
#[async_trait]
pub trait TransferSink: Send + Sync {
    /// Upsert a discovery result for `mint`
    async fn upsert_holders(&self, holders: &[Holder], mint: &str) -> Result<(), IngestError>;

    /// Insert unless the signature already exists. Returns whether a row was created.
    async fn insert_transfer_if_absent(&self, record: &TransferRecord) -> Result<bool, IngestError>;

    async fn get_watermark(&self, wallet: &str) -> Result<Option<i64>, IngestError>;

    /// Move the watermark to `timestamp` unless it is already later
    async fn advance_watermark(&self, wallet: &str, timestamp: i64) -> Result<(), IngestError>;

    async fn signature_exists(&self, signature: &str) -> Result<bool, IngestError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS holders (
    address TEXT PRIMARY KEY,
    balance REAL NOT NULL,
    mint TEXT NOT NULL,
    last_updated INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_holders_mint_balance ON holders(mint, balance DESC);

CREATE TABLE IF NOT EXISTS transfers (
    signature TEXT PRIMARY KEY,
    wallet TEXT NOT NULL REFERENCES holders(address),
    amount REAL NOT NULL,
    price REAL,
    timestamp INTEGER NOT NULL,
    direction TEXT NOT NULL,
    venue TEXT NOT NULL,
    counter_mint TEXT
);

CREATE INDEX IF NOT EXISTS idx_transfers_wallet_timestamp ON transfers(wallet, timestamp DESC);

CREATE TABLE IF NOT EXISTS watermarks (
    wallet TEXT PRIMARY KEY,
    last_timestamp INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;

/// SQLite implementation of `TransferSink`
///
/// Schema creation runs lazily, exactly once, behind a `OnceCell` barrier that
/// every operation awaits before touching the connection.
pub struct SqliteTransferSink {
    conn: Arc<Mutex<Connection>>,
    ready: OnceCell<()>,
}

impl SqliteTransferSink {
    /// Open (or create) the database file. Parent directories are created.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, IngestError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    IngestError::Storage(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, IngestError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, IngestError> {
        // Bundled SQLite enforces foreign keys by default
        conn.pragma_update(None, "foreign_keys", false)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ready: OnceCell::new(),
        })
    }

    /// Initialisation barrier; safe to call any number of times
    pub async fn ready(&self) -> Result<(), IngestError> {
        self.ready
            .get_or_try_init(|| async {
                let conn = self.lock()?;
                conn.execute_batch(SCHEMA)?;
                log::info!("✅ SQLite schema ready (holders, transfers, watermarks)");
                Ok::<(), IngestError>(())
            })
            .await
            .map(|_| ())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, IngestError> {
        self.conn
            .lock()
            .map_err(|_| IngestError::Storage("connection lock poisoned".to_string()))
    }

    /// Holders from the latest discovery pass of `mint`, by balance descending
    pub async fn current_holders(&self, mint: &str, limit: usize) -> Result<Vec<Holder>, IngestError> {
        self.ready().await?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT address, balance, mint FROM holders
             WHERE mint = ?1
             ORDER BY balance DESC, address ASC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![mint, limit as i64], |row| {
            Ok(Holder {
                address: row.get(0)?,
                balance: row.get(1)?,
                mint: row.get(2)?,
            })
        })?;

        let holders = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(holders)
    }

    /// 1-based rank within the latest discovery pass
    pub async fn holder_at_rank(&self, mint: &str, position: usize) -> Result<Option<Holder>, IngestError> {
        if position == 0 {
            return Err(IngestError::validation("holder position starts at 1"));
        }
        let holders = self.current_holders(mint, position).await?;
        Ok(holders.into_iter().nth(position - 1))
    }

    /// Transfers of `wallet` with `from <= timestamp <= to`, newest first
    pub async fn wallet_transfers(
        &self,
        wallet: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<TransferRecord>, IngestError> {
        self.ready().await?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT signature, wallet, amount, price, timestamp, direction, venue, counter_mint
             FROM transfers
             WHERE wallet = ?1 AND timestamp BETWEEN ?2 AND ?3
             ORDER BY timestamp DESC, signature ASC",
        )?;

        let rows = stmt.query_map(params![wallet, from, to], |row| {
            let direction_text: String = row.get(5)?;
            let direction = TradeDirection::parse(&direction_text).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    format!("unknown direction '{}'", direction_text).into(),
                )
            })?;
            let venue: String = row.get(6)?;
            Ok(TransferRecord {
                signature: row.get(0)?,
                wallet: row.get(1)?,
                amount: row.get(2)?,
                price: row.get(3)?,
                timestamp: row.get(4)?,
                direction,
                venue: Venue::from_name(&venue),
                counter_mint: row.get(7)?,
            })
        })?;

        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub async fn transfer_count(&self, wallet: &str) -> Result<usize, IngestError> {
        self.ready().await?;
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transfers WHERE wallet = ?1",
            params![wallet],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[async_trait]
impl TransferSink for SqliteTransferSink {
    async fn upsert_holders(&self, holders: &[Holder], mint: &str) -> Result<(), IngestError> {
        self.ready().await?;
        let now = chrono::Utc::now().timestamp();
        let mut conn = self.lock()?;

        let write = |conn: &mut Connection| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM holders WHERE mint = ?1", params![mint])?;
            for holder in holders {
                tx.execute(
                    r#"
                    INSERT INTO holders (address, balance, mint, last_updated)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(address) DO UPDATE SET
                        balance = excluded.balance,
                        mint = excluded.mint,
                        last_updated = excluded.last_updated
                    "#,
                    params![holder.address, holder.balance, mint, now],
                )?;
            }
            tx.commit()
        };

        write(&mut *conn).map_err(|e| IngestError::PersistenceWrite(format!("upsert_holders: {}", e)))?;

        log::debug!("✅ Upserted {} holders for {}", holders.len(), mint);
        Ok(())
    }

    async fn insert_transfer_if_absent(&self, record: &TransferRecord) -> Result<bool, IngestError> {
        self.ready().await?;
        let conn = self.lock()?;

        let inserted = conn
            .execute(
                "INSERT INTO transfers
                 (signature, wallet, amount, price, timestamp, direction, venue, counter_mint)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(signature) DO NOTHING",
                params![
                    record.signature,
                    record.wallet,
                    record.amount,
                    record.price,
                    record.timestamp,
                    record.direction.as_str(),
                    record.venue.as_str(),
                    record.counter_mint,
                ],
            )
            .map_err(|e| {
                IngestError::PersistenceWrite(format!("insert transfer {}: {}", record.signature, e))
            })?;

        Ok(inserted > 0)
    }

    async fn get_watermark(&self, wallet: &str) -> Result<Option<i64>, IngestError> {
        self.ready().await?;
        let conn = self.lock()?;

        let watermark = conn
            .query_row(
                "SELECT last_timestamp FROM watermarks WHERE wallet = ?1",
                params![wallet],
                |row| row.get(0),
            )
            .optional()?;

        Ok(watermark)
    }

    async fn advance_watermark(&self, wallet: &str, timestamp: i64) -> Result<(), IngestError> {
        self.ready().await?;
        let now = chrono::Utc::now().timestamp();
        let conn = self.lock()?;

        conn.execute(
            r#"
            INSERT INTO watermarks (wallet, last_timestamp, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(wallet) DO UPDATE SET
                last_timestamp = MAX(watermarks.last_timestamp, excluded.last_timestamp),
                updated_at = excluded.updated_at
            "#,
            params![wallet, timestamp, now],
        )
        .map_err(|e| IngestError::PersistenceWrite(format!("advance watermark {}: {}", wallet, e)))?;

        Ok(())
    }

    async fn signature_exists(&self, signature: &str) -> Result<bool, IngestError> {
        self.ready().await?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT 1 FROM transfers WHERE signature = ?1 LIMIT 1")?;
        let exists = stmt.exists(params![signature])?;
        Ok(exists)
    }
}

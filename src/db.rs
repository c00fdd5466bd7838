use crate::config::{is_in_memory_url, Config};
use crate::error::StoreError;
use crate::signal::{LanguageSignalInfo, SignalKind};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Persistence for language signal counters.
///
/// Rows are keyed by `(language_tag, signal_kind)`. Listings come back in
/// first-write order.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Add `delta` to the row's count, inserting it with `count = delta` if absent.
    /// Returns the committed count.
    async fn upsert_increment(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
        delta: u64,
    ) -> Result<u64, StoreError>;

    /// Look up a single row
    async fn get(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
    ) -> Result<Option<LanguageSignalInfo>, StoreError>;

    /// All rows, first-written first
    async fn get_all(&self) -> Result<Vec<LanguageSignalInfo>, StoreError>;

    /// All rows of one signal kind, first-written first
    async fn get_by_kind(
        &self,
        signal_kind: SignalKind,
    ) -> Result<Vec<LanguageSignalInfo>, StoreError> {
        let mut infos = self.get_all().await?;
        infos.retain(|info| info.signal_kind == signal_kind);
        Ok(infos)
    }
}

// ==================== SQLite ====================

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS language_signal_info (
    language_tag TEXT NOT NULL,
    signal_kind TEXT NOT NULL,
    count INTEGER NOT NULL CHECK (count > 0),
    PRIMARY KEY (language_tag, signal_kind)
)";

// The WHERE clause turns an overflowing update into "no row returned"
// instead of letting SQLite promote the column to REAL.
const UPSERT_INCREMENT_SQL: &str = "
    INSERT INTO language_signal_info (language_tag, signal_kind, count)
    VALUES (?1, ?2, ?3)
    ON CONFLICT (language_tag, signal_kind)
    DO UPDATE SET count = count + excluded.count
    WHERE count <= 9223372036854775807 - excluded.count
    RETURNING count";

/// [`SignalStore`] backed by a SQLite database through `sqlx`.
///
/// Rows are listed by `rowid`, which an upsert's update branch leaves alone,
/// so listing order is the order in which keys were first written.
#[derive(Clone)]
pub struct SqliteSignalStore {
    pool: SqlitePool,
}

impl SqliteSignalStore {
    /// Connect using the configured database URL and create the table.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true);

        let store = if is_in_memory_url(&config.database_url) {
            Self::connect_in_memory_with(options).await?
        } else {
            Self::connect_with(
                options.journal_mode(SqliteJournalMode::Wal),
                config.max_connections,
            )
            .await?
        };

        info!("Signal store ready at {}", config.database_url);
        Ok(store)
    }

    /// Open (or create) a database file.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let store = Self::connect_with(options, Config::default().max_connections).await?;
        info!("Signal store ready at {}", path.display());
        Ok(store)
    }

    /// A private database that lives as long as this store (and its clones).
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect_in_memory_with(options).await
    }

    async fn connect_with(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    // Every connection to `:memory:` is its own database, so the pool is
    // pinned to a single connection that never expires.
    async fn connect_in_memory_with(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE_SQL).execute(pool).await?;
        Ok(())
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection. In-memory data is gone afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

type SignalRow = (String, String, i64);

fn row_to_info(
    (language_tag, signal_kind, count): SignalRow,
) -> Result<LanguageSignalInfo, StoreError> {
    let signal_kind = signal_kind
        .parse::<SignalKind>()
        .map_err(|e| StoreError::unknown_kind(&language_tag, e))?;
    let count = u64::try_from(count).map_err(|_| StoreError::CorruptRow {
        language_tag: language_tag.clone(),
        reason: format!("negative count {}", count),
    })?;

    Ok(LanguageSignalInfo {
        language_tag,
        signal_kind,
        count,
    })
}

fn overflow(language_tag: &str, signal_kind: SignalKind) -> StoreError {
    StoreError::Overflow {
        language_tag: language_tag.to_string(),
        signal_kind: signal_kind.to_string(),
    }
}

#[async_trait]
impl SignalStore for SqliteSignalStore {
    async fn upsert_increment(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
        delta: u64,
    ) -> Result<u64, StoreError> {
        if delta == 0 {
            return Err(StoreError::ZeroDelta);
        }
        let delta = i64::try_from(delta).map_err(|_| overflow(language_tag, signal_kind))?;

        let committed: Option<(i64,)> = sqlx::query_as(UPSERT_INCREMENT_SQL)
            .bind(language_tag)
            .bind(signal_kind.as_str())
            .bind(delta)
            .fetch_optional(&self.pool)
            .await?;

        let (count,) = committed.ok_or_else(|| overflow(language_tag, signal_kind))?;
        debug!("{} ({}) -> {}", language_tag, signal_kind, count);

        u64::try_from(count).map_err(|_| StoreError::CorruptRow {
            language_tag: language_tag.to_string(),
            reason: format!("negative count {}", count),
        })
    }

    async fn get(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
    ) -> Result<Option<LanguageSignalInfo>, StoreError> {
        let row: Option<SignalRow> = sqlx::query_as(
            "SELECT language_tag, signal_kind, count FROM language_signal_info
             WHERE language_tag = ?1 AND signal_kind = ?2",
        )
        .bind(language_tag)
        .bind(signal_kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_info).transpose()
    }

    async fn get_all(&self) -> Result<Vec<LanguageSignalInfo>, StoreError> {
        let rows: Vec<SignalRow> = sqlx::query_as(
            "SELECT language_tag, signal_kind, count FROM language_signal_info ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_info).collect()
    }

    async fn get_by_kind(
        &self,
        signal_kind: SignalKind,
    ) -> Result<Vec<LanguageSignalInfo>, StoreError> {
        let rows: Vec<SignalRow> = sqlx::query_as(
            "SELECT language_tag, signal_kind, count FROM language_signal_info
             WHERE signal_kind = ?1 ORDER BY rowid",
        )
        .bind(signal_kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_info).collect()
    }
}

// ==================== In-memory ====================

type SignalKey = (String, SignalKind);

#[derive(Default)]
struct MemoryRows {
    order: Vec<(SignalKey, Arc<AtomicU64>)>,
    index: HashMap<SignalKey, Arc<AtomicU64>>,
}

/// [`SignalStore`] kept entirely in process memory.
///
/// Each key owns an atomic counter. Increments of existing keys only take the
/// read lock; the write lock is held just long enough to insert a new key.
#[derive(Default, Clone)]
pub struct MemorySignalStore {
    rows: Arc<RwLock<MemoryRows>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn increment(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
        delta: u64,
    ) -> Result<u64, StoreError> {
        if delta == 0 {
            return Err(StoreError::ZeroDelta);
        }
        let key = (language_tag.to_string(), signal_kind);

        let existing = self
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .index
            .get(&key)
            .cloned();

        let counter = match existing {
            Some(counter) => counter,
            None => {
                let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
                match rows.index.get(&key) {
                    // Another writer inserted it between our two locks
                    Some(counter) => Arc::clone(counter),
                    None => {
                        let counter = Arc::new(AtomicU64::new(delta));
                        rows.index.insert(key.clone(), Arc::clone(&counter));
                        rows.order.push((key, counter));
                        return Ok(delta);
                    }
                }
            }
        };

        let previous = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_add(delta)
            })
            .map_err(|_| overflow(language_tag, signal_kind))?;

        Ok(previous + delta)
    }

    fn snapshot(&self) -> Vec<LanguageSignalInfo> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.order
            .iter()
            .map(|((language_tag, signal_kind), counter)| {
                LanguageSignalInfo::new(
                    language_tag.clone(),
                    *signal_kind,
                    counter.load(Ordering::Acquire),
                )
            })
            .collect()
    }

    fn lookup(&self, language_tag: &str, signal_kind: SignalKind) -> Option<LanguageSignalInfo> {
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        rows.index
            .get(&(language_tag.to_string(), signal_kind))
            .map(|counter| {
                LanguageSignalInfo::new(language_tag, signal_kind, counter.load(Ordering::Acquire))
            })
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn upsert_increment(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
        delta: u64,
    ) -> Result<u64, StoreError> {
        self.increment(language_tag, signal_kind, delta)
    }

    async fn get(
        &self,
        language_tag: &str,
        signal_kind: SignalKind,
    ) -> Result<Option<LanguageSignalInfo>, StoreError> {
        Ok(self.lookup(language_tag, signal_kind))
    }

    async fn get_all(&self) -> Result<Vec<LanguageSignalInfo>, StoreError> {
        Ok(self.snapshot())
    }
}

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::Row;
use tokio::sync::RwLock;

use super::score::from_millis;
use super::*;
use crate::config::StoreConfig;

const CREATE_SCORES_TABLE: &str = "CREATE TABLE IF NOT EXISTS scores (
    id VARCHAR(32) PRIMARY KEY,
    name TEXT NOT NULL,
    score DOUBLE PRECISION NOT NULL,
    recorded_at BIGINT NOT NULL
)";

/// Append-only storage of score records.
///
/// The store is created once at startup and shared by every request.
/// When no database could be reached it stays detached, and every operation
/// fails with [`StoreError::Unavailable`] instead of blocking.
pub struct ScoreStore {
    pool: RwLock<Option<DatabasePool>>,
}

impl ScoreStore {
    /// A store without a database behind it.
    pub fn detached() -> Self {
        Self {
            pool: RwLock::new(None),
        }
    }

    /// Connects to the database described by `config` and prepares the schema.
    /// Failures are logged and leave the store detached.
    pub async fn connect(config: &StoreConfig) -> Self {
        let store = Self::detached();

        let database_url = match &config.database_url {
            Some(url) => url,
            None => {
                log::warn!("No database configured, the score store stays disconnected");
                return store;
            }
        };

        log::info!("Connecting to the score database...");
        match Self::open_pool(database_url, config).await {
            Ok(pool) => {
                log::info!("Score database is ready");
                store.attach(pool).await;
            }
            Err(error) => log::error!("Score database connection error: {}", error),
        }

        store
    }

    async fn open_pool(database_url: &str, config: &StoreConfig) -> StoreResult<DatabasePool> {
        sqlx::any::install_default_drivers();

        let connect = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .after_connect(|_connection, _meta| {
                Box::pin(async move {
                    log::info!("Connected to the score database");
                    Ok(())
                })
            })
            .connect(database_url);

        let pool = tokio::time::timeout(config.connect_timeout, connect)
            .await
            .map_err(|_| sqlx::Error::PoolTimedOut)??;

        sqlx::query(CREATE_SCORES_TABLE).execute(&pool).await?;

        Ok(pool)
    }

    pub async fn attach(&self, pool: DatabasePool) {
        *self.pool.write().await = Some(pool);
    }

    /// Removes the database handle, returning it to the caller.
    pub async fn detach(&self) -> Option<DatabasePool> {
        self.pool.write().await.take()
    }

    /// Detaches and closes the pool.
    pub async fn close(&self) {
        if let Some(pool) = self.detach().await {
            pool.close().await;
            log::info!("Score database disconnected");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.pool.read().await.is_some()
    }

    async fn pool(&self) -> StoreResult<DatabasePool> {
        self.pool.read().await.clone().ok_or(StoreError::Unavailable)
    }

    /// Validates `submission` and appends it as a new record.
    pub async fn insert(&self, submission: ScoreSubmission) -> StoreResult<ScoreRecord> {
        let record = submission.into_record()?;
        let pool = self.pool().await?;

        sqlx::query("INSERT INTO scores (id, name, score, recorded_at) VALUES ($1, $2, $3, $4)")
            .bind(record.id.as_str())
            .bind(record.name.as_str())
            .bind(record.score.value())
            .bind(record.recorded_at.timestamp_millis())
            .execute(&pool)
            .await?;

        Ok(record)
    }

    /// Returns the record with the highest score, or `None` if there are no records.
    /// Equal scores are resolved by the earliest `recorded_at`, then the smallest id.
    pub async fn highest(&self) -> StoreResult<Option<ScoreRecord>> {
        let pool = self.pool().await?;

        let row = sqlx::query(
            "SELECT id, name, score, recorded_at FROM scores \
             ORDER BY score DESC, recorded_at ASC, id ASC LIMIT 1",
        )
        .fetch_optional(&pool)
        .await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    #[cfg(test)]
    pub async fn count(&self) -> StoreResult<i64> {
        let pool = self.pool().await?;
        let row = sqlx::query("SELECT COUNT(*) FROM scores")
            .fetch_one(&pool)
            .await?;
        Ok(row.try_get::<i64, usize>(0)?)
    }
}

fn record_from_row(row: &AnyRow) -> StoreResult<ScoreRecord> {
    let id = row.try_get::<String, &str>("id")?;
    let name = row.try_get::<String, &str>("name")?;
    let score = row.try_get::<f64, &str>("score")?;
    let millis = row.try_get::<i64, &str>("recorded_at")?;

    let recorded_at = from_millis(millis).ok_or_else(|| StoreError::CorruptRecord {
        id: id.clone(),
        millis,
    })?;

    Ok(ScoreRecord {
        id: RecordId::from(id),
        name,
        score: Score::from(score),
        recorded_at,
    })
}

//! SQLite persistence for relay configuration and statistics.

use crate::config::{RelayConfig, RelayStats};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Store for the single relay config row and its stats row.
///
/// The host storage serializes concurrent writers; in-process the
/// pool does the same, so last-write-wins is the only semantics here.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to the SQLite database at the given URL, creating it
    /// and running migrations if needed.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS relay_config (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                webhook_url TEXT NOT NULL DEFAULT 'http://localhost:5000/webhook',
                auth_token TEXT NOT NULL DEFAULT '',
                custom_headers TEXT NOT NULL DEFAULT '',
                enabled INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS relay_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_alerts INTEGER NOT NULL DEFAULT 0,
                last_alert TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the relay config, creating the default row on first use.
    pub async fn load_config(&self) -> Result<RelayConfig, StoreError> {
        let existing = sqlx::query_as::<_, (String, String, String, bool)>(
            "SELECT webhook_url, auth_token, custom_headers, enabled FROM relay_config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        if let Some((webhook_url, auth_token, custom_headers, enabled)) = existing {
            return Ok(RelayConfig {
                webhook_url,
                auth_token,
                custom_headers,
                enabled,
            });
        }

        let config = RelayConfig::default();
        self.save_config(&config).await?;
        Ok(config)
    }

    /// Persist the relay config (idempotent upsert of the single row).
    pub async fn save_config(&self, config: &RelayConfig) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO relay_config (id, webhook_url, auth_token, custom_headers, enabled)
            VALUES (1, ?, ?, ?, ?)
            ON CONFLICT(id)
            DO UPDATE SET webhook_url = ?, auth_token = ?, custom_headers = ?, enabled = ?
            "#,
        )
        .bind(&config.webhook_url)
        .bind(&config.auth_token)
        .bind(&config.custom_headers)
        .bind(config.enabled)
        .bind(&config.webhook_url)
        .bind(&config.auth_token)
        .bind(&config.custom_headers)
        .bind(config.enabled)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn load_stats(&self) -> Result<RelayStats, StoreError> {
        let row = sqlx::query_as::<_, (i64, Option<String>)>(
            "SELECT total_alerts, last_alert FROM relay_stats WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some((total_alerts, last_alert)) => RelayStats {
                total_alerts,
                last_alert,
            },
            None => RelayStats::default(),
        })
    }

    /// Record one successful delivery: increments the counter and
    /// stamps the delivery time.
    pub async fn record_forwarded(&self, timestamp: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO relay_stats (id, total_alerts, last_alert)
            VALUES (1, 1, ?)
            ON CONFLICT(id)
            DO UPDATE SET total_alerts = total_alerts + 1, last_alert = ?
            "#,
        )
        .bind(timestamp)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_first_load_creates_defaults() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let config = store.load_config().await.unwrap();
        assert_eq!(config, RelayConfig::default());

        let stats = store.load_stats().await.unwrap();
        assert_eq!(stats.total_alerts, 0);
        assert_eq!(stats.last_alert, None);
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let store = Store::connect("sqlite::memory:").await.unwrap();

        let config = RelayConfig {
            webhook_url: "https://hooks.example.com/alerts".to_string(),
            auth_token: "secret-token".to_string(),
            custom_headers: r#"{"X-Api-Key":"k"}"#.to_string(),
            enabled: false,
        };
        store.save_config(&config).await.unwrap();

        let loaded = store.load_config().await.unwrap();
        assert_eq!(loaded, config);

        // Saving again is idempotent.
        store.save_config(&config).await.unwrap();
        let loaded = store.load_config().await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_record_forwarded() {
        let store = Store::connect("sqlite::memory:").await.unwrap();

        store
            .record_forwarded("2024-05-01T12:00:00.000Z")
            .await
            .unwrap();
        store
            .record_forwarded("2024-05-01T12:01:00.000Z")
            .await
            .unwrap();

        let stats = store.load_stats().await.unwrap();
        assert_eq!(stats.total_alerts, 2);
        assert_eq!(
            stats.last_alert.as_deref(),
            Some("2024-05-01T12:01:00.000Z")
        );
    }
}

use libsql::{Builder, Connection};
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::Result;

use super::schema;

/// An open libSQL database with the key/value schema applied.
///
/// Holds one primary connection so `:memory:` databases keep their contents
/// across calls.
pub struct Database {
    pub(crate) db: Arc<libsql::Database>,
    conn: Connection,
    pub(crate) busy_timeout_ms: u64,
}

impl Database {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let is_remote = config.url.starts_with("libsql://") || config.url.starts_with("https://");

        let db = if is_remote {
            if let Some(ref local_path) = config.local_path {
                Builder::new_remote_replica(
                    local_path,
                    config.url.clone(),
                    config.auth_token.clone().unwrap_or_default(),
                )
                .build()
                .await?
            } else {
                Builder::new_remote(
                    config.url.clone(),
                    config.auth_token.clone().unwrap_or_default(),
                )
                .build()
                .await?
            }
        } else if config.url == ":memory:" {
            Builder::new_local(":memory:").build().await?
        } else {
            let path = config.url.strip_prefix("file:").unwrap_or(&config.url);
            Builder::new_local(path).build().await?
        };

        let conn = db.connect()?;
        let database = Self {
            db: Arc::new(db),
            conn,
            busy_timeout_ms: config.busy_timeout_ms,
        };

        if !is_remote {
            database.configure_database().await;
        }
        schema::init_schema(&database.conn).await?;

        tracing::debug!(url = %config.url, "Database opened");
        Ok(database)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(self.conn.clone())
    }

    async fn configure_database(&self) {
        let busy_timeout_sql = format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms);
        if let Err(error) = self.conn.execute_batch(&busy_timeout_sql).await {
            tracing::warn!(
                busy_timeout_ms = self.busy_timeout_ms,
                error = %error,
                "Failed to set SQLite busy_timeout"
            );
        }
    }

    pub async fn sync(&self) -> Result<()> {
        if let Ok(sync) = self.db.sync().await {
            tracing::info!("Database synced: {:?}", sync);
        }
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            conn: self.conn.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

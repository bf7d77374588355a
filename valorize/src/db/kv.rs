use crate::error::Result;
use chrono::Utc;
use libsql::Connection;

pub struct KvRepository;

impl KvRepository {
    pub async fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        let mut rows = conn
            .query("SELECT value FROM valorize_kv WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    pub async fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO valorize_kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            [key, value, &now],
        )
        .await?;
        Ok(())
    }

    pub async fn remove(conn: &Connection, key: &str) -> Result<bool> {
        let affected = conn
            .execute("DELETE FROM valorize_kv WHERE key = ?", [key])
            .await?;
        Ok(affected > 0)
    }
}

use crate::db::connection::Database;
use crate::db::traits::KeyValueStore;
use crate::db::KvRepository;
use crate::error::Result;
use async_trait::async_trait;

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyValueStore for LibSqlBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.db.connect()?;
        KvRepository::get(&conn, key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.connect()?;
        KvRepository::set(&conn, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.db.connect()?;
        KvRepository::remove(&conn, key).await?;
        Ok(())
    }

    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}

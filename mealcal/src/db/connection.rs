use libsql::{Builder, Connection};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::{MealError, Result};

use super::schema;

pub struct Database {
    pub(crate) db: Arc<libsql::Database>,
    /// In-memory databases live and die with their connection, so every
    /// caller must share the same one.
    shared: Option<Connection>,
    pub(crate) busy_timeout_ms: u64,
}

impl Database {
    /// Open the meal store described by `config`, provisioning the schema
    /// when asked to.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let db = if config.is_remote() {
            let access_key = config.access_key.clone().ok_or_else(|| {
                MealError::Config("Remote store URL requires an access key".to_string())
            })?;
            Builder::new_remote(config.url.clone(), access_key)
                .build()
                .await?
        } else {
            Self::build_local(&config.url).await?
        };

        let database = Self::from_libsql(db, &config.url)?;
        if !config.is_remote() {
            database.configure_local().await;
        }
        if config.provision_schema {
            let conn = database.connect()?;
            schema::init_schema(&conn).await?;
        } else {
            tracing::info!("Schema provisioning disabled, using tables as found");
        }

        Ok(database)
    }

    /// Open a local-only database, e.g. for client preferences.
    pub async fn open_local(url: &str) -> Result<Self> {
        let db = Self::build_local(url).await?;
        let database = Self::from_libsql(db, url)?;
        database.configure_local().await;
        Ok(database)
    }

    async fn build_local(url: &str) -> Result<libsql::Database> {
        let path = url.strip_prefix("file:").unwrap_or(url);
        Ok(Builder::new_local(path).build().await?)
    }

    fn from_libsql(db: libsql::Database, url: &str) -> Result<Self> {
        let in_memory = url.strip_prefix("file:").unwrap_or(url) == ":memory:";
        let shared = if in_memory { Some(db.connect()?) } else { None };
        let busy_timeout_ms = std::env::var("STORE_BUSY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5000);

        Ok(Self {
            db: Arc::new(db),
            shared,
            busy_timeout_ms,
        })
    }

    pub fn connect(&self) -> Result<Connection> {
        match &self.shared {
            Some(conn) => Ok(conn.clone()),
            None => Ok(self.db.connect()?),
        }
    }

    async fn configure_local(&self) {
        let Ok(conn) = self.connect() else {
            return;
        };

        let busy_timeout_sql = format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms);
        if let Err(error) = conn.execute_batch(&busy_timeout_sql).await {
            tracing::warn!(
                busy_timeout_ms = self.busy_timeout_ms,
                error = %error,
                "Failed to set SQLite busy_timeout"
            );
        }
    }

    /// Pull remote frames into an embedded replica.
    ///
    /// Local files and plain remote connections have nothing to pull, which
    /// libSQL reports as `SyncNotSupported`; any other failure is returned.
    pub async fn sync(&self) -> Result<()> {
        sync_outcome(self.db.sync().await.map(|replicated| {
            tracing::info!(frame_no = ?replicated.frame_no(), "Database synced");
        }))
    }
}

fn sync_outcome(result: std::result::Result<(), libsql::Error>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(libsql::Error::SyncNotSupported(mode)) => {
            tracing::debug!(mode = %mode, "Store is not a replica, skipping sync");
            Ok(())
        }
        Err(e) => Err(MealError::Database(e)),
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            shared: self.shared.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

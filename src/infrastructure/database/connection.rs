use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub const IN_MEMORY_PATH: &str = ":memory:";

/// Primary manager for SQLite database operations; provides async-friendly access to the synchronous rusqlite connection using tokio's spawn_blocking.
#[derive(Clone)]
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseManager {
    /// Opens the SQLite database at `db_path` (or an in-memory one for `:memory:`) and configures it.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if db_path == Path::new(IN_MEMORY_PATH) {
            return Self::in_memory();
        }

        let connection = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        let mode: String =
            connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        connection.pragma_update(None, "synchronous", "NORMAL")?;
        debug!(journal_mode = %mode, "Configured SQLite journal");

        Self::from_connection(connection)
    }

    pub fn in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Execute a blocking database operation on tokio's blocking pool.
    /// The closure receives the connection mutably so it can open transactions.
    pub async fn execute_blocking<F, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = connection
                .lock()
                .map_err(|_| anyhow!("Database connection mutex poisoned"))?;
            operation(&mut conn)
        })
        .await
        .context("Failed to execute blocking database operation - task join error")?
    }

    /// Creates all tables by executing the embedded schema.sql.
    pub async fn initialize_database(&self) -> Result<()> {
        let schema = include_str!("schema.sql");

        self.execute_blocking(move |connection| {
            let mut executed = 0;
            for statement in schema.split(';') {
                let sql: String = statement
                    .lines()
                    .filter(|line| !line.trim_start().starts_with("--"))
                    .collect::<Vec<_>>()
                    .join("\n");
                let trimmed = sql.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let preview: String = trimmed.chars().take(50).collect();
                debug!("Executing schema statement {}: {}", executed + 1, preview);

                connection
                    .execute(trimmed, [])
                    .with_context(|| format!("Schema statement failed: {}", trimmed))?;
                executed += 1;
            }
            info!("Database schema ready ({} statements)", executed);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_initializes_twice() {
        let db = DatabaseManager::in_memory().unwrap();
        db.initialize_database().await.unwrap();
        db.initialize_database().await.unwrap();

        let tables: i64 = db
            .execute_blocking(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                     ('events', 'event_participants', 'communities', 'community_members')",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = DatabaseManager::new(IN_MEMORY_PATH).unwrap();
        db.initialize_database().await.unwrap();

        let result = db
            .execute_blocking(|conn| {
                conn.execute(
                    "INSERT INTO event_participants (event_id, user_id, role, joined_at)
                     VALUES (999, 1, 'guest', 0)",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err());
    }
}

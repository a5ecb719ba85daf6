use crate::application::commands::AppContext;
use crate::application::services::{EventService, TimezoneService};
use crate::domain::repositories::EventRepository;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database::DatabaseManager;
use crate::infrastructure::repositories::SqliteEventRepository;
use crate::infrastructure::timezone::TimezoneManager;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Opens the database, applies the schema and wires the services together
pub async fn build_context(config: AppConfig) -> Result<AppContext> {
    let db = DatabaseManager::new(&config.database_path)?;
    db.initialize_database().await?;
    info!(path = %config.database_path.display(), "Database ready");

    let event_repo: Arc<dyn EventRepository> = Arc::new(SqliteEventRepository::new(db));
    let timezone_service = Arc::new(TimezoneService::new(Arc::new(TimezoneManager::new())));
    let event_service = Arc::new(EventService::new(event_repo, timezone_service.clone()));

    Ok(AppContext {
        event_service,
        timezone_service,
        config,
    })
}

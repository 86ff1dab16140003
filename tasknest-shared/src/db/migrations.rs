/// Database migration runner built on sqlx's migration system.
/// Migration files live in `migrations/` at the workspace root.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending migrations, creating the tracking table on first use
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("All database migrations completed");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

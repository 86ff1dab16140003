/// Database layer for TaskNest
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: sqlx migration runner
///
/// Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;

use sqlx::{Executor, PgPool, Row};
use std::fs;
use std::path::Path;
use tracing::{error, info};

const SCHEMA_PATH: &str = "src/db/schema.sql";

/// Initialize the database schema
///
/// The schema file holds several statements, so it runs through the simple
/// query protocol rather than as a prepared statement.
pub async fn init_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Initializing database schema...");

    let schema_sql = fs::read_to_string(Path::new(SCHEMA_PATH)).map_err(|e| {
        error!("Failed to read {}: {}", SCHEMA_PATH, e);
        sqlx::Error::Io(e)
    })?;

    match pool.execute(schema_sql.as_str()).await {
        Ok(_) => {
            info!("Database schema initialized successfully");
            Ok(())
        }
        Err(e) => {
            error!("Failed to initialize database schema: {}", e);
            Err(e)
        }
    }
}

const REQUIRED_TABLES: [&str; 5] = [
    "users",
    "food_items",
    "food_requests",
    "notifications",
    "favorites",
];

/// Check that every marketplace table exists. The schema script is idempotent,
/// so a database missing a newer table is simply initialized again.
pub async fn check_db_initialized(pool: &PgPool) -> bool {
    let result = sqlx::query(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'marketplace' AND table_name::text = ANY($1)",
    )
    .bind(&REQUIRED_TABLES[..])
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => row
            .try_get::<i64, _>(0)
            .map(|found| found == REQUIRED_TABLES.len() as i64)
            .unwrap_or(false),
        Err(_) => false,
    }
}

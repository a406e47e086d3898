//! # EduManage DB
//!
//! Postgres pool initialisation and the embedded schema migrations used by
//! the policy store.
//!
//! # Example
//!
//! ```ignore
//! use edumanage_config::DatabaseConfig;
//! use edumanage_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//! run_migrations(&pool).await?;
//! ```

use edumanage_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

pub use sqlx::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("DATABASE_URL must be set")]
    MissingUrl,

    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("failed to apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Creates a connection pool from the given settings.
///
/// The pool is cheap to clone; create it once at startup.
#[instrument(skip(config), fields(max_connections = config.max_connections))]
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let url = config.url.as_deref().ok_or(DbError::MissingUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(DbError::Connect)?;

    info!("database pool ready");
    Ok(pool)
}

/// Applies the schema migrations bundled with this crate.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

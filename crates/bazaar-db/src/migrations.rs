//! # Database Migrations
//!
//! Embedded SQL migrations for the Bazaar backend.
//!
//! ## How Migrations Work
//! The `sqlx::migrate!()` macro embeds all SQL files from
//! `migrations/sqlite/` (at the workspace root) into the binary at compile
//! time. On startup, pending migrations are compared against the
//! `_sqlx_migrations` bookkeeping table and applied in filename order, each
//! inside its own transaction.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g., `002_add_courier_table.sql`)
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent: safe to run multiple times; already-applied migrations are
/// skipped via their recorded checksums.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns (total embedded migrations, applied migrations).
///
/// Used by diagnostics such as the seed binary.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

//! Version-tracked schema migrations for the enrollment database.
//!
//! `run_migrations()` reads the highest applied version from `_migrations`
//! and applies only the newer steps, in order.

use libsql::Connection;
use tracing::info;

use crate::error::DatabaseError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "enrollments",
    sql: r#"
        CREATE TABLE IF NOT EXISTS enrollments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nome TEXT NOT NULL,
            email TEXT NOT NULL,
            curso TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'registrado',
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_enrollments_email ON enrollments(email);
    "#,
}];

pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = current_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        info!(version = migration.version, name = migration.name, "Applying migration");
        conn.execute_batch(migration.sql).await.map_err(|e| {
            DatabaseError::Migration(format!(
                "Migration V{} ({}) failed: {e}",
                migration.version, migration.name
            ))
        })?;
        conn.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| {
            DatabaseError::Migration(format!("Failed to record V{}: {e}", migration.version))
        })?;
    }

    Ok(())
}

/// Highest applied migration version, or 0 on a fresh database.
pub async fn current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to query migration version: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("Failed to parse migration version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(DatabaseError::Migration(format!(
            "Failed to read migration version: {e}"
        ))),
    }
}

/// Latest version known to this build.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

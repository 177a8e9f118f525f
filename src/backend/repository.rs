//! Enrollment persistence: `EnrollmentRepository` trait and its libSQL
//! implementation (local file or in-memory).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use super::migrations;
use super::model::{Enrollment, NewEnrollment, STATUS_REGISTERED};
use crate::error::DatabaseError;

const ENROLLMENT_COLUMNS: &str = "id, nome, email, curso, status, created_at";

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Store a new enrollment and return it with its assigned id.
    async fn insert(&self, enrollment: &NewEnrollment) -> Result<Enrollment, DatabaseError>;

    async fn get(&self, id: i64) -> Result<Option<Enrollment>, DatabaseError>;

    /// All enrollments, oldest first.
    async fn list(&self) -> Result<Vec<Enrollment>, DatabaseError>;
}

/// libSQL repository. One connection, shared by all requests.
pub struct LibSqlRepository {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlRepository {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let repo = Self::from_database(db).await?;
        info!(path = %path.display(), "Enrollment database opened");
        Ok(repo)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn row_to_enrollment(row: &libsql::Row) -> Result<Enrollment, libsql::Error> {
    let created: String = row.get(5)?;
    Ok(Enrollment {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        course: row.get(3)?,
        status: row.get(4)?,
        created_at: parse_datetime(&created),
    })
}

#[async_trait]
impl EnrollmentRepository for LibSqlRepository {
    async fn insert(&self, enrollment: &NewEnrollment) -> Result<Enrollment, DatabaseError> {
        let created_at = Utc::now();
        let mut rows = self
            .conn
            .query(
                "INSERT INTO enrollments (nome, email, curso, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
                params![
                    enrollment.name.as_str(),
                    enrollment.email.as_str(),
                    enrollment.course.as_str(),
                    STATUS_REGISTERED,
                    created_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert enrollment: {e}")))?;

        let id: i64 = match rows.next().await {
            Ok(Some(row)) => row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("insert enrollment id: {e}")))?,
            Ok(None) => {
                return Err(DatabaseError::Query("insert enrollment returned no id".into()));
            }
            Err(e) => return Err(DatabaseError::Query(format!("insert enrollment: {e}"))),
        };

        debug!(id, "Enrollment row inserted");
        Ok(Enrollment {
            id,
            name: enrollment.name.clone(),
            email: enrollment.email.clone(),
            course: enrollment.course.clone(),
            status: STATUS_REGISTERED.to_string(),
            created_at,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Enrollment>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get enrollment: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row_to_enrollment(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Query(format!("get enrollment row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get enrollment: {e}"))),
        }
    }

    async fn list(&self) -> Result<Vec<Enrollment>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments ORDER BY id"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list enrollments: {e}")))?;

        let mut enrollments = Vec::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => enrollments.push(
                    row_to_enrollment(&row)
                        .map_err(|e| DatabaseError::Query(format!("list row parse: {e}")))?,
                ),
                Ok(None) => break,
                Err(e) => return Err(DatabaseError::Query(format!("list enrollments: {e}"))),
            }
        }
        Ok(enrollments)
    }
}

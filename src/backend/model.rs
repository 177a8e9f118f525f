//! Enrollment records as stored and served by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status given to every enrollment on creation.
pub const STATUS_REGISTERED: &str = "registrado";

/// A stored enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "curso")]
    pub course: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Raw `POST /api/matriculas` body. Fields are optional so that missing
/// ones produce the domain error rather than a parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentRequest {
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub curso: Option<String>,
}

/// A validated enrollment about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEnrollment {
    pub name: String,
    pub email: String,
    pub course: String,
}

impl EnrollmentRequest {
    /// All three fields present and non-blank, trimmed. `None` otherwise.
    pub fn validate(&self) -> Option<NewEnrollment> {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(NewEnrollment {
            name: field(&self.nome)?,
            email: field(&self.email)?,
            course: field(&self.curso)?,
        })
    }
}

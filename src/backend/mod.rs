//! Enrollment backend: stores the enrollments the bot submits.

pub mod migrations;
pub mod model;
pub mod repository;
pub mod routes;

pub use model::{Enrollment, EnrollmentRequest, NewEnrollment};
pub use repository::{EnrollmentRepository, LibSqlRepository};
pub use routes::enrollment_routes;

pub mod assignment;
pub mod auth;
pub mod communication;
pub mod course;
pub mod evaluation;
pub mod grade;
pub mod schedule;

pub use assignment::AssignmentService;
pub use auth::AuthService;
pub use communication::CommunicationService;
pub use course::CourseService;
pub use evaluation::EvaluationService;
pub use grade::GradeService;
pub use schedule::ScheduleService;

use crate::utils::error::AccessError;

/// A live 404 for a single entity reads as "not found", like a fallback miss.
pub(crate) fn missing_as_not_found(message: &'static str) -> impl Fn(AccessError) -> AccessError {
    move |error| match error {
        AccessError::Http { status: 404, .. } => AccessError::not_found(message),
        other => other,
    }
}

//! Application use cases. Orchestrate domain logic via ports.

pub mod auth_service;
pub mod booking_service;
pub mod chat_service;
pub mod doctor_service;
pub mod latch;
pub mod patient_service;
pub mod report_service;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use auth_service::AuthService;
pub use booking_service::BookingService;
pub use chat_service::{ChatMode, ChatService};
pub use doctor_service::{DoctorDashboard, DoctorService};
pub use latch::InFlight;
pub use patient_service::{PatientDashboard, PatientService};
pub use report_service::{ReportService, ReportSubmission, UploadOutcome};
pub use session::Session;

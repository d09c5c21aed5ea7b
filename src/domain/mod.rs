//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod directory;
pub mod drafts;
pub mod entities;
pub mod errors;

pub use directory::{DoctorQuery, DoctorSort, SPECIALIZATIONS};
pub use drafts::{BookingDraft, RegistrationDraft, SignUpRequest, TIME_SLOTS};
pub use entities::{
    AnalysisRequest, AnalysisResult, Appointment, AppointmentStatus, ChatMessage, ChatRole,
    Doctor, NewAppointment, NewReport, Report, ReportAnalysisUpdate, ReportStatus, SessionUser,
    Severity, UploadFile, UserRole,
};
pub use errors::DomainError;

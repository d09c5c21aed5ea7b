//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters: AI providers, the hosted backend (auth, records,
//! object storage). Every method that reaches the backend takes the caller's
//! access token; row-level authorization is the backend's business.

use crate::domain::{
    AnalysisRequest, AnalysisResult, Appointment, ChatMessage, Doctor, DomainError,
    NewAppointment, NewReport, Report, ReportAnalysisUpdate, ReportStatus, SessionUser,
    SignUpRequest,
};
use chrono::{DateTime, Utc};

/// Report interpretation. Provider-specific implementations are interchangeable.
#[async_trait::async_trait]
pub trait AnalysisPort: Send + Sync {
    /// Interpret one report image. Failures are returned, never masked.
    async fn analyze_report(&self, request: &AnalysisRequest)
    -> Result<AnalysisResult, DomainError>;

    /// Patient-friendly summary of already-extracted report text.
    async fn summarize_report(
        &self,
        report_type: &str,
        extracted_text: &str,
    ) -> Result<String, DomainError>;
}

/// Conversational assistant.
#[async_trait::async_trait]
pub trait ChatPort: Send + Sync {
    /// Produce the assistant's next message given the prior transcript and the new user input.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, DomainError>;
}

/// External auth provider.
#[async_trait::async_trait]
pub trait AuthPort: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser, DomainError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), DomainError>;

    async fn sign_out(&self, user: &SessionUser) -> Result<(), DomainError>;
}

/// Record-oriented store: doctors, reports, appointments.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// All doctors joined with their profile.
    async fn list_doctors(&self, token: &str) -> Result<Vec<Doctor>, DomainError>;

    async fn get_doctor(&self, doctor_id: &str, token: &str) -> Result<Doctor, DomainError>;

    async fn insert_report(&self, report: &NewReport, token: &str) -> Result<Report, DomainError>;

    async fn update_report_analysis(
        &self,
        report_id: &str,
        update: &ReportAnalysisUpdate,
        token: &str,
    ) -> Result<(), DomainError>;

    async fn get_report(&self, report_id: &str, token: &str) -> Result<Report, DomainError>;

    /// A patient's reports, newest report date first, at most `limit` when given.
    async fn list_patient_reports(
        &self,
        patient_id: &str,
        limit: Option<usize>,
        token: &str,
    ) -> Result<Vec<Report>, DomainError>;

    /// Reports assigned to a doctor, newest report date first, with patient names joined.
    async fn list_doctor_reports(
        &self,
        doctor_id: &str,
        status: Option<ReportStatus>,
        limit: Option<usize>,
        token: &str,
    ) -> Result<Vec<Report>, DomainError>;

    /// Assign reports to a doctor for review.
    async fn assign_reports(
        &self,
        report_ids: &[String],
        doctor_id: &str,
        token: &str,
    ) -> Result<(), DomainError>;

    async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
        token: &str,
    ) -> Result<Appointment, DomainError>;

    /// A doctor's appointments in `[from, to]`, ascending.
    async fn list_doctor_appointments(
        &self,
        doctor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        token: &str,
    ) -> Result<Vec<Appointment>, DomainError>;

    /// A patient's appointments from `from` onwards (all when `None`), ascending,
    /// with the doctor's name and specialization joined.
    async fn list_patient_appointments(
        &self,
        patient_id: &str,
        from: Option<DateTime<Utc>>,
        limit: Option<usize>,
        token: &str,
    ) -> Result<Vec<Appointment>, DomainError>;

    /// Exact row count; no rows are transferred.
    async fn count_doctor_appointments(
        &self,
        doctor_id: &str,
        token: &str,
    ) -> Result<usize, DomainError>;
}

/// Binary object store for uploaded files.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path` and return the stable reference to persist with the report.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        token: &str,
    ) -> Result<String, DomainError>;
}

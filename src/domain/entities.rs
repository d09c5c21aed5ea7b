//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/backend types here. Adapters map rows and provider payloads into these.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend rows carry `null` for unset columns; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Closed three-value classification of report urgency.
///
/// Deserialization accepts only the exact lowercase names; anything else is a
/// contract violation and fails the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-submitted file to be analyzed. Consumed once by the analysis port.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub payload: Vec<u8>,
    /// MIME type as reported by the caller. `None` falls back to `image/jpeg`.
    pub mime_type: Option<String>,
}

impl AnalysisRequest {
    pub const DEFAULT_MIME: &'static str = "image/jpeg";

    pub fn new(payload: Vec<u8>, mime_type: Option<String>) -> Self {
        Self { payload, mime_type }
    }

    /// MIME type sent to the provider.
    pub fn mime_or_default(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(Self::DEFAULT_MIME)
    }
}

/// Structured interpretation of a medical report, as returned by the AI provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry in the in-memory chat transcript. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Patient,
    Doctor,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Patient => f.write_str("patient"),
            UserRole::Doctor => f.write_str("doctor"),
        }
    }
}

/// Authenticated identity shared through the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Bearer token handed back by the auth provider; forwarded to the record store.
    pub access_token: String,
}

/// Doctor listing, flattened from the `doctors` row and its joined profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub email: Option<String>,
    pub specialization: String,
    pub experience_years: u32,
    pub hospital: String,
    pub consultation_fee: f64,
    pub rating: f64,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Analyzed,
    Reviewed,
}

/// Report metadata as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub patient_id: String,
    #[serde(default)]
    pub doctor_id: Option<String>,
    pub title: String,
    pub category: String,
    pub report_date: NaiveDate,
    pub file_url: String,
    #[serde(default)]
    pub ai_summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_findings: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ReportStatus,
    /// Joined patient name; only populated on doctor-side queries.
    #[serde(default, skip_serializing)]
    pub patient_name: Option<String>,
}

/// Insert payload for a new report record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReport {
    pub patient_id: String,
    pub title: String,
    pub category: String,
    pub report_date: NaiveDate,
    pub file_url: String,
    pub ai_summary: String,
    pub status: ReportStatus,
}

/// Fields written back once analysis succeeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysisUpdate {
    pub ai_summary: String,
    pub key_findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub severity: Severity,
    pub status: ReportStatus,
}

impl From<&AnalysisResult> for ReportAnalysisUpdate {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            ai_summary: result.summary.clone(),
            key_findings: result.key_findings.clone(),
            recommendations: result.recommendations.clone(),
            severity: result.severity,
            status: ReportStatus::Analyzed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: AppointmentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reports_shared: Vec<String>,
    /// Joined patient name; only populated on doctor-side queries.
    #[serde(default, skip_serializing)]
    pub patient_name: Option<String>,
    /// Joined doctor name and specialization; only populated on patient-side queries.
    #[serde(default, skip_serializing)]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing)]
    pub doctor_specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: DateTime<Utc>,
    pub reason: String,
    pub status: AppointmentStatus,
    pub reports_shared: Vec<String>,
}

/// A file picked by the user for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Extension after the last dot, or `bin` when the name has none.
    pub fn extension(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
            _ => "bin",
        }
    }
}

//! Report upload, AI interpretation and report listings.
//!
//! Submission is all-or-nothing for the files: every upload must succeed before
//! the report record is written. Analysis runs after the record exists and can
//! only degrade the result to a warning, never fail the submission.

use super::latch::InFlight;
use crate::domain::{
    AnalysisRequest, DomainError, NewReport, Report, ReportAnalysisUpdate, ReportStatus,
    SessionUser, UploadFile, UserRole,
};
use crate::ports::{AnalysisPort, ObjectStore, RecordStore};
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const REPORT_TYPES: [&str; 6] = [
    "Blood Test",
    "X-Ray",
    "MRI / CT Scan",
    "Prescription",
    "Lab Report",
    "Other",
];

pub const MAX_FILES: usize = 5;

pub const PROCESSING_SUMMARY: &str = "Processing report with AI...";
pub const ANALYSIS_UNAVAILABLE: &str = "AI analysis unavailable";

pub const SUMMARY_NOT_CONFIGURED: &str =
    "AI analysis is currently unavailable. Please configure your API key.";
pub const SUMMARY_FAILED: &str =
    "Unable to generate summary. Please review the full report details.";
pub const SUMMARY_EMPTY: &str = "Unable to generate summary.";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Everything the upload form collects.
#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub report_type: String,
    pub hospital: String,
    pub report_date: NaiveDate,
    pub files: Vec<UploadFile>,
}

impl ReportSubmission {
    fn validate(&self) -> Result<(), DomainError> {
        if !REPORT_TYPES.contains(&self.report_type.as_str()) {
            return Err(DomainError::Validation(format!(
                "unknown report type '{}'",
                self.report_type
            )));
        }
        if self.files.is_empty() {
            return Err(DomainError::Validation(
                "select at least one file".to_string(),
            ));
        }
        if self.files.len() > MAX_FILES {
            return Err(DomainError::Validation(format!(
                "at most {} files per report",
                MAX_FILES
            )));
        }
        Ok(())
    }

    fn title(&self) -> String {
        let hospital = self.hospital.trim();
        let hospital = if hospital.is_empty() { "Report" } else { hospital };
        format!("{} - {}", self.report_type, hospital)
    }
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub report: Report,
    /// Set when the record was saved but AI analysis could not be completed.
    pub warning: Option<String>,
}

/// `<user_id>/<uuid>-<unix_millis>.<ext>`
pub fn object_path(user_id: &str, file: &UploadFile) -> String {
    format!(
        "{}/{}-{}.{}",
        user_id,
        Uuid::new_v4(),
        Utc::now().timestamp_millis(),
        file.extension()
    )
}

pub struct ReportService {
    records: Arc<dyn RecordStore>,
    storage: Arc<dyn ObjectStore>,
    analysis: Arc<dyn AnalysisPort>,
    latch: InFlight,
}

impl ReportService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        storage: Arc<dyn ObjectStore>,
        analysis: Arc<dyn AnalysisPort>,
    ) -> Self {
        Self {
            records,
            storage,
            analysis,
            latch: InFlight::new(),
        }
    }

    /// Upload the files, create the report record, then try to analyze the first file.
    pub async fn submit(
        &self,
        user: &SessionUser,
        submission: ReportSubmission,
    ) -> Result<UploadOutcome, DomainError> {
        submission.validate()?;
        let _permit = self.latch.try_begin()?;

        let paths = self.upload_all(user, &submission.files).await?;
        let first_path = paths.first().cloned().unwrap_or_default();

        let new_report = NewReport {
            patient_id: user.id.clone(),
            title: submission.title(),
            category: submission.report_type.clone(),
            report_date: submission.report_date,
            file_url: first_path,
            ai_summary: PROCESSING_SUMMARY.to_string(),
            status: ReportStatus::Pending,
        };
        let mut report = self
            .records
            .insert_report(&new_report, &user.access_token)
            .await?;
        info!(report_id = %report.id, files = paths.len(), "report saved");

        let warning = match self.analyze_first(user, &report, &submission.files).await {
            Ok(update) => {
                report.ai_summary = Some(update.ai_summary);
                report.key_findings = update.key_findings;
                report.recommendations = update.recommendations;
                report.severity = Some(update.severity);
                report.status = update.status;
                None
            }
            Err(e) => {
                warn!(report_id = %report.id, error = %e, "report analysis skipped");
                Some(ANALYSIS_UNAVAILABLE.to_string())
            }
        };

        Ok(UploadOutcome { report, warning })
    }

    /// One concurrent write per file; the first failure aborts the batch.
    async fn upload_all(
        &self,
        user: &SessionUser,
        files: &[UploadFile],
    ) -> Result<Vec<String>, DomainError> {
        let uploads = files.iter().map(|file| {
            let path = object_path(&user.id, file);
            let content_type = file
                .mime_type
                .clone()
                .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
            let storage = Arc::clone(&self.storage);
            let token = user.access_token.clone();
            let bytes = file.bytes.clone();
            async move {
                storage
                    .upload(&path, bytes, &content_type, &token)
                    .await
                    .map_err(|e| match e {
                        DomainError::Storage(_) => e,
                        other => DomainError::Storage(other.to_string()),
                    })
            }
        });
        try_join_all(uploads).await
    }

    async fn analyze_first(
        &self,
        user: &SessionUser,
        report: &Report,
        files: &[UploadFile],
    ) -> Result<ReportAnalysisUpdate, DomainError> {
        let first = files
            .first()
            .ok_or_else(|| DomainError::Validation("no file to analyze".to_string()))?;
        let request = AnalysisRequest::new(first.bytes.clone(), first.mime_type.clone());
        let result = self.analysis.analyze_report(&request).await?;

        let update = ReportAnalysisUpdate::from(&result);
        self.records
            .update_report_analysis(&report.id, &update, &user.access_token)
            .await?;
        info!(report_id = %report.id, severity = %update.severity, "report analyzed");
        Ok(update)
    }

    /// Patient-friendly summary of extracted report text. Never fails.
    ///
    /// A provider that answered without usable text (error status, empty or
    /// unparseable body) gets the short fallback; only a request that never got
    /// an answer gets the longer one.
    pub async fn summarize(&self, report_type: &str, extracted_text: &str) -> String {
        match self
            .analysis
            .summarize_report(report_type, extracted_text)
            .await
        {
            Ok(summary) if summary.trim().is_empty() => SUMMARY_EMPTY.to_string(),
            Ok(summary) => summary,
            Err(DomainError::NotConfigured(_)) => SUMMARY_NOT_CONFIGURED.to_string(),
            Err(e @ (DomainError::MalformedResponse(_) | DomainError::ProviderStatus { .. })) => {
                warn!(error = %e, "provider returned no summary");
                SUMMARY_EMPTY.to_string()
            }
            Err(e) => {
                warn!(error = %e, "summary generation failed");
                SUMMARY_FAILED.to_string()
            }
        }
    }

    /// The signed-in patient's reports, newest first.
    pub async fn my_reports(&self, user: &SessionUser) -> Result<Vec<Report>, DomainError> {
        self.records
            .list_patient_reports(&user.id, None, &user.access_token)
            .await
    }

    /// Reload one report, e.g. to pick up analysis results written after listing.
    pub async fn report(&self, user: &SessionUser, report_id: &str) -> Result<Report, DomainError> {
        self.records.get_report(report_id, &user.access_token).await
    }

    /// Reports shared with the signed-in doctor, filtered by title or patient name.
    pub async fn assigned_reports(
        &self,
        user: &SessionUser,
        search: &str,
    ) -> Result<Vec<Report>, DomainError> {
        require_doctor(user)?;
        let reports = self
            .records
            .list_doctor_reports(&user.id, None, None, &user.access_token)
            .await?;
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(reports);
        }
        Ok(reports
            .into_iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&needle)
                    || r
                        .patient_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .collect())
    }
}

pub(crate) fn require_doctor(user: &SessionUser) -> Result<(), DomainError> {
    if user.role == UserRole::Doctor {
        Ok(())
    } else {
        Err(DomainError::Auth("doctor account required".to_string()))
    }
}

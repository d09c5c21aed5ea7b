//! In-memory port fakes shared by the use-case tests.

use crate::domain::{
    AnalysisRequest, AnalysisResult, Appointment, ChatMessage, Doctor, DomainError,
    NewAppointment, NewReport, Report, ReportAnalysisUpdate, ReportStatus, SessionUser,
    SignUpRequest, UserRole,
};
use crate::ports::{AnalysisPort, AuthPort, ChatPort, ObjectStore, RecordStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub fn patient() -> SessionUser {
    SessionUser {
        id: "p1".into(),
        name: "Pat".into(),
        email: "pat@x.io".into(),
        role: UserRole::Patient,
        access_token: "tok".into(),
    }
}

pub fn doctor_user() -> SessionUser {
    SessionUser {
        id: "d1".into(),
        name: "Dr. Who".into(),
        email: "dr@x.io".into(),
        role: UserRole::Doctor,
        access_token: "tok".into(),
    }
}

pub fn doctor(id: &str, name: &str, spec: &str, rating: f64) -> Doctor {
    Doctor {
        id: id.into(),
        name: name.into(),
        avatar: None,
        email: None,
        specialization: spec.into(),
        experience_years: 5,
        hospital: "Private Practice".into(),
        consultation_fee: 100.0,
        rating,
        is_verified: true,
    }
}

#[derive(Default)]
pub struct FakeAuth {
    reject: bool,
    sign_outs: AtomicUsize,
    pub sign_ups: Mutex<Vec<SignUpRequest>>,
}

impl FakeAuth {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AuthPort for FakeAuth {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<SessionUser, DomainError> {
        if self.reject {
            return Err(DomainError::Auth("Invalid login credentials".into()));
        }
        Ok(SessionUser {
            email: email.into(),
            ..patient()
        })
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), DomainError> {
        if self.reject {
            return Err(DomainError::Auth("User already registered".into()));
        }
        self.sign_ups.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn sign_out(&self, _user: &SessionUser) -> Result<(), DomainError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRecords {
    pub doctors: Mutex<Vec<Doctor>>,
    pub reports: Mutex<Vec<Report>>,
    pub appointments: Mutex<Vec<Appointment>>,
    pub updates: Mutex<Vec<(String, ReportAnalysisUpdate)>>,
    pub assigned: Mutex<Vec<(Vec<String>, String)>>,
}

impl FakeRecords {
    pub fn with_doctors(doctors: Vec<Doctor>) -> Self {
        let records = Self::default();
        *records.doctors.lock().unwrap() = doctors;
        records
    }

    pub fn report_count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl RecordStore for FakeRecords {
    async fn list_doctors(&self, _token: &str) -> Result<Vec<Doctor>, DomainError> {
        Ok(self.doctors.lock().unwrap().clone())
    }

    async fn get_doctor(&self, doctor_id: &str, _token: &str) -> Result<Doctor, DomainError> {
        self.doctors
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == doctor_id)
            .cloned()
            .ok_or_else(|| DomainError::Backend("doctor not found".into()))
    }

    async fn insert_report(&self, report: &NewReport, _token: &str) -> Result<Report, DomainError> {
        let mut reports = self.reports.lock().unwrap();
        let created = Report {
            id: format!("r{}", reports.len() + 1),
            patient_id: report.patient_id.clone(),
            doctor_id: None,
            title: report.title.clone(),
            category: report.category.clone(),
            report_date: report.report_date,
            file_url: report.file_url.clone(),
            ai_summary: Some(report.ai_summary.clone()),
            key_findings: vec![],
            recommendations: vec![],
            severity: None,
            status: report.status,
            patient_name: None,
        };
        reports.push(created.clone());
        Ok(created)
    }

    async fn update_report_analysis(
        &self,
        report_id: &str,
        update: &ReportAnalysisUpdate,
        _token: &str,
    ) -> Result<(), DomainError> {
        self.updates
            .lock()
            .unwrap()
            .push((report_id.to_string(), update.clone()));
        Ok(())
    }

    async fn get_report(&self, report_id: &str, _token: &str) -> Result<Report, DomainError> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == report_id)
            .cloned()
            .ok_or_else(|| DomainError::Backend("report not found".into()))
    }

    async fn list_patient_reports(
        &self,
        patient_id: &str,
        limit: Option<usize>,
        _token: &str,
    ) -> Result<Vec<Report>, DomainError> {
        let mut list: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        list.truncate(limit.unwrap_or(usize::MAX));
        Ok(list)
    }

    async fn list_doctor_reports(
        &self,
        doctor_id: &str,
        status: Option<ReportStatus>,
        limit: Option<usize>,
        _token: &str,
    ) -> Result<Vec<Report>, DomainError> {
        let reports: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.doctor_id.as_deref() == Some(doctor_id))
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        Ok(reports
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn assign_reports(
        &self,
        report_ids: &[String],
        doctor_id: &str,
        _token: &str,
    ) -> Result<(), DomainError> {
        self.assigned
            .lock()
            .unwrap()
            .push((report_ids.to_vec(), doctor_id.to_string()));
        Ok(())
    }

    async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
        _token: &str,
    ) -> Result<Appointment, DomainError> {
        let mut appointments = self.appointments.lock().unwrap();
        let created = Appointment {
            id: format!("a{}", appointments.len() + 1),
            patient_id: appointment.patient_id.clone(),
            doctor_id: appointment.doctor_id.clone(),
            appointment_date: appointment.appointment_date,
            reason: appointment.reason.clone(),
            status: appointment.status,
            reports_shared: appointment.reports_shared.clone(),
            patient_name: None,
            doctor_name: None,
            doctor_specialization: None,
        };
        appointments.push(created.clone());
        Ok(created)
    }

    async fn list_doctor_appointments(
        &self,
        doctor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        _token: &str,
    ) -> Result<Vec<Appointment>, DomainError> {
        let mut list: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .filter(|a| a.appointment_date >= from && a.appointment_date <= to)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.appointment_date);
        Ok(list)
    }

    async fn list_patient_appointments(
        &self,
        patient_id: &str,
        from: Option<DateTime<Utc>>,
        limit: Option<usize>,
        _token: &str,
    ) -> Result<Vec<Appointment>, DomainError> {
        let doctors = self.doctors.lock().unwrap().clone();
        let mut list: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .filter(|a| from.is_none_or(|from| a.appointment_date >= from))
            .cloned()
            .map(|mut a| {
                if let Some(d) = doctors.iter().find(|d| d.id == a.doctor_id) {
                    a.doctor_name = Some(d.name.clone());
                    a.doctor_specialization = Some(d.specialization.clone());
                }
                a
            })
            .collect();
        list.sort_by_key(|a| a.appointment_date);
        list.truncate(limit.unwrap_or(usize::MAX));
        Ok(list)
    }

    async fn count_doctor_appointments(
        &self,
        doctor_id: &str,
        _token: &str,
    ) -> Result<usize, DomainError> {
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .count())
    }
}

/// Object store that fails any upload whose bytes equal `fail_payload`.
#[derive(Default)]
pub struct FakeStorage {
    fail_payload: Option<Vec<u8>>,
    pub uploaded: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn failing_on(payload: &[u8]) -> Self {
        Self {
            fail_payload: Some(payload.to_vec()),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for FakeStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        _token: &str,
    ) -> Result<String, DomainError> {
        if self.fail_payload.as_deref() == Some(bytes.as_slice()) {
            return Err(DomainError::Storage(format!("{}: quota exceeded", path)));
        }
        self.uploaded.lock().unwrap().push(path.to_string());
        Ok(path.to_string())
    }
}

/// Analysis port with a scripted outcome.
pub struct FakeAnalysis {
    result: Option<AnalysisResult>,
    failure: fn() -> DomainError,
    pub calls: AtomicUsize,
}

impl FakeAnalysis {
    pub fn succeeding(result: AnalysisResult) -> Self {
        Self {
            result: Some(result),
            failure: || DomainError::Transport("unused".into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(failure: fn() -> DomainError) -> Self {
        Self {
            result: None,
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    fn outcome(&self) -> Result<AnalysisResult, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or_else(self.failure)
    }
}

#[async_trait::async_trait]
impl AnalysisPort for FakeAnalysis {
    async fn analyze_report(
        &self,
        _request: &AnalysisRequest,
    ) -> Result<AnalysisResult, DomainError> {
        self.outcome()
    }

    async fn summarize_report(
        &self,
        _report_type: &str,
        _extracted_text: &str,
    ) -> Result<String, DomainError> {
        self.outcome().map(|r| r.summary)
    }
}

/// Chat port with a scripted reply, optionally held until `gate` is notified.
pub struct FakeChat {
    reply: fn(&str) -> Result<String, DomainError>,
    gate: Option<Arc<Notify>>,
    pub history_lens: Mutex<Vec<usize>>,
}

impl FakeChat {
    pub fn new(reply: fn(&str) -> Result<String, DomainError>) -> Self {
        Self {
            reply,
            gate: None,
            history_lens: Mutex::new(vec![]),
        }
    }

    pub fn gated(reply: fn(&str) -> Result<String, DomainError>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(reply)
        }
    }
}

#[async_trait::async_trait]
impl ChatPort for FakeChat {
    async fn reply(&self, history: &[ChatMessage], message: &str) -> Result<String, DomainError> {
        self.history_lens.lock().unwrap().push(history.len());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.reply)(message)
    }
}

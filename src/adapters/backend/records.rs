//! PostgREST implementation of [`RecordStore`] over `doctors`, `reports`
//! and `appointments`.
//!
//! Doctor rows are joined with `profiles` for name/avatar/email; doctor-side
//! report and appointment queries join the patient's `full_name`, patient-side
//! appointment queries join the doctor's name and specialization.

use super::client::{Payload, SupabaseClient};
use crate::domain::{
    Appointment, Doctor, DomainError, NewAppointment, NewReport, Report, ReportAnalysisUpdate,
    ReportStatus,
};
use crate::ports::RecordStore;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

const DOCTOR_SELECT: &str = "*,profiles:id(full_name,avatar_url,email)";
const WITH_PATIENT: &str = "*,patient:patient_id(full_name)";
const WITH_DOCTOR: &str = "*,doctor:doctor_id(id,specialization,profiles:id(full_name,avatar_url))";

const RETURN_REPRESENTATION: (&str, &str) = ("prefer", "return=representation");
const RETURN_MINIMAL: (&str, &str) = ("prefer", "return=minimal");
const COUNT_EXACT: (&str, &str) = ("prefer", "count=exact");

pub struct SupabaseRecords {
    client: Arc<SupabaseClient>,
}

impl SupabaseRecords {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, DomainError> {
        self.client
            .request(Method::GET, path, Some(token), None)
            .await
    }

    async fn insert_one<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        body: Value,
        token: &str,
    ) -> Result<T, DomainError> {
        let rows: Vec<T> = self
            .client
            .request_with_headers(
                Method::POST,
                &format!("/rest/v1/{}", table),
                Some(token),
                &[RETURN_REPRESENTATION],
                Some(body),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DomainError::Backend(format!("insert into {} returned no row", table)))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProfileJoin {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoctorRow {
    id: String,
    #[serde(default)]
    specialization: Option<String>,
    #[serde(default)]
    experience_years: Option<u32>,
    #[serde(default)]
    hospital_clinic: Option<String>,
    #[serde(default)]
    consultation_fee: Option<f64>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    is_verified: Option<bool>,
    #[serde(default)]
    profiles: Option<ProfileJoin>,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        let profile = row.profiles.unwrap_or_default();
        Doctor {
            id: row.id,
            name: profile.full_name.unwrap_or_else(|| "Doctor".to_string()),
            avatar: profile.avatar_url,
            email: profile.email,
            specialization: row
                .specialization
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "General Medicine".to_string()),
            experience_years: row.experience_years.unwrap_or(0),
            hospital: row
                .hospital_clinic
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Private Practice".to_string()),
            consultation_fee: row.consultation_fee.unwrap_or(0.0),
            rating: row.rating.unwrap_or(0.0),
            is_verified: row.is_verified.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NameJoin {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportRow {
    #[serde(flatten)]
    report: Report,
    #[serde(default)]
    patient: Option<NameJoin>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            patient_name: row.patient.and_then(|p| p.full_name),
            ..row.report
        }
    }
}

#[derive(Debug, Deserialize)]
struct DoctorJoin {
    #[serde(default)]
    specialization: Option<String>,
    #[serde(default)]
    profiles: Option<ProfileJoin>,
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    #[serde(flatten)]
    appointment: Appointment,
    #[serde(default)]
    patient: Option<NameJoin>,
    #[serde(default)]
    doctor: Option<DoctorJoin>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        let (doctor_name, doctor_specialization) = match row.doctor {
            Some(doctor) => (
                doctor.profiles.and_then(|p| p.full_name),
                doctor.specialization,
            ),
            None => (None, None),
        };
        Appointment {
            patient_name: row.patient.and_then(|p| p.full_name),
            doctor_name,
            doctor_specialization,
            ..row.appointment
        }
    }
}

/// Total from a PostgREST `Content-Range` value such as `0-24/42` or `*/0`.
fn content_range_total(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn timestamp(at: DateTime<Utc>) -> String {
    // `Z` suffix keeps the value free of `+` inside the query string.
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::Backend(format!("failed to encode record: {}", e)))
}

#[async_trait::async_trait]
impl RecordStore for SupabaseRecords {
    async fn list_doctors(&self, token: &str) -> Result<Vec<Doctor>, DomainError> {
        let rows: Vec<DoctorRow> = self
            .get(&format!("/rest/v1/doctors?select={}", DOCTOR_SELECT), token)
            .await?;
        debug!(count = rows.len(), "loaded doctors");
        Ok(rows.into_iter().map(Doctor::from).collect())
    }

    async fn get_doctor(&self, doctor_id: &str, token: &str) -> Result<Doctor, DomainError> {
        let rows: Vec<DoctorRow> = self
            .get(
                &format!("/rest/v1/doctors?select={}&id=eq.{}", DOCTOR_SELECT, doctor_id),
                token,
            )
            .await?;
        rows.into_iter()
            .next()
            .map(Doctor::from)
            .ok_or_else(|| DomainError::Backend(format!("doctor {} not found", doctor_id)))
    }

    async fn insert_report(&self, report: &NewReport, token: &str) -> Result<Report, DomainError> {
        let created: Report = self.insert_one("reports", to_json(report)?, token).await?;
        info!(report_id = %created.id, "report record created");
        Ok(created)
    }

    async fn update_report_analysis(
        &self,
        report_id: &str,
        update: &ReportAnalysisUpdate,
        token: &str,
    ) -> Result<(), DomainError> {
        self.client
            .execute(
                Method::PATCH,
                &format!("/rest/v1/reports?id=eq.{}", report_id),
                Some(token),
                &[RETURN_MINIMAL],
                Some(to_json(update)?),
            )
            .await
    }

    async fn get_report(&self, report_id: &str, token: &str) -> Result<Report, DomainError> {
        let rows: Vec<Report> = self
            .get(&format!("/rest/v1/reports?id=eq.{}", report_id), token)
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DomainError::Backend(format!("report {} not found", report_id)))
    }

    async fn list_patient_reports(
        &self,
        patient_id: &str,
        limit: Option<usize>,
        token: &str,
    ) -> Result<Vec<Report>, DomainError> {
        let mut path = format!(
            "/rest/v1/reports?patient_id=eq.{}&order=report_date.desc",
            patient_id
        );
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }
        self.get(&path, token).await
    }

    async fn list_doctor_reports(
        &self,
        doctor_id: &str,
        status: Option<ReportStatus>,
        limit: Option<usize>,
        token: &str,
    ) -> Result<Vec<Report>, DomainError> {
        let mut path = format!(
            "/rest/v1/reports?select={}&doctor_id=eq.{}&order=report_date.desc",
            WITH_PATIENT, doctor_id
        );
        if let Some(status) = status {
            let status = serde_json::to_value(status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            path.push_str(&format!("&status=eq.{}", status));
        }
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }
        let rows: Vec<ReportRow> = self.get(&path, token).await?;
        Ok(rows.into_iter().map(Report::from).collect())
    }

    async fn assign_reports(
        &self,
        report_ids: &[String],
        doctor_id: &str,
        token: &str,
    ) -> Result<(), DomainError> {
        if report_ids.is_empty() {
            return Ok(());
        }
        self.client
            .execute(
                Method::PATCH,
                &format!("/rest/v1/reports?id=in.({})", report_ids.join(",")),
                Some(token),
                &[RETURN_MINIMAL],
                Some(json!({ "doctor_id": doctor_id })),
            )
            .await?;
        info!(count = report_ids.len(), doctor_id, "reports shared with doctor");
        Ok(())
    }

    async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
        token: &str,
    ) -> Result<Appointment, DomainError> {
        let created: Appointment = self
            .insert_one("appointments", to_json(appointment)?, token)
            .await?;
        info!(appointment_id = %created.id, "appointment created");
        Ok(created)
    }

    async fn list_doctor_appointments(
        &self,
        doctor_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        token: &str,
    ) -> Result<Vec<Appointment>, DomainError> {
        let path = format!(
            "/rest/v1/appointments?select={}&doctor_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&order=appointment_date.asc",
            WITH_PATIENT,
            doctor_id,
            timestamp(from),
            timestamp(to)
        );
        let rows: Vec<AppointmentRow> = self.get(&path, token).await?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn list_patient_appointments(
        &self,
        patient_id: &str,
        from: Option<DateTime<Utc>>,
        limit: Option<usize>,
        token: &str,
    ) -> Result<Vec<Appointment>, DomainError> {
        let mut path = format!(
            "/rest/v1/appointments?select={}&patient_id=eq.{}&order=appointment_date.asc",
            WITH_DOCTOR, patient_id
        );
        if let Some(from) = from {
            path.push_str(&format!("&appointment_date=gte.{}", timestamp(from)));
        }
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={}", limit));
        }
        let rows: Vec<AppointmentRow> = self.get(&path, token).await?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn count_doctor_appointments(
        &self,
        doctor_id: &str,
        token: &str,
    ) -> Result<usize, DomainError> {
        let response = self
            .client
            .send(
                Method::HEAD,
                &format!("/rest/v1/appointments?select=id&doctor_id=eq.{}", doctor_id),
                Some(token),
                &[COUNT_EXACT],
                Payload::Empty,
            )
            .await?;
        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total)
            .ok_or_else(|| DomainError::Backend("appointment count missing from response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn records(server: &MockServer) -> SupabaseRecords {
        SupabaseRecords::new(Arc::new(SupabaseClient::new(server.uri(), "anon")))
    }

    fn report_json(id: &str) -> Value {
        json!({
            "id": id, "patient_id": "p1", "doctor_id": "d1", "title": "X-Ray - City Hospital",
            "category": "X-Ray", "report_date": "2024-05-02", "file_url": "p1/a.png",
            "ai_summary": null, "key_findings": null, "recommendations": null,
            "severity": null, "status": "pending",
            "patient": {"full_name": "Pat Smith"}
        })
    }

    #[tokio::test]
    async fn doctors_get_defaults_for_missing_columns() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/doctors"))
            .and(query_param("select", DOCTOR_SELECT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "d1", "specialization": "Cardiology", "experience_years": 12,
                    "hospital_clinic": "Heart Center", "consultation_fee": 150.0,
                    "rating": 4.8, "is_verified": true,
                    "profiles": {"full_name": "Dr. Heart", "avatar_url": null, "email": "h@x.io"}
                },
                {"id": "d2", "specialization": null, "profiles": null}
            ])))
            .mount(&server)
            .await;

        let doctors = records(&server).list_doctors("tok").await.unwrap();
        assert_eq!(doctors[0].name, "Dr. Heart");
        assert_eq!(doctors[0].hospital, "Heart Center");
        assert_eq!(doctors[1].specialization, "General Medicine");
        assert_eq!(doctors[1].hospital, "Private Practice");
        assert_eq!(doctors[1].consultation_fee, 0.0);
    }

    #[tokio::test]
    async fn insert_report_returns_created_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/reports"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!({"status": "pending", "file_url": "p1/a.png"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([report_json("r9")])))
            .expect(1)
            .mount(&server)
            .await;

        let new_report = NewReport {
            patient_id: "p1".into(),
            title: "X-Ray - City Hospital".into(),
            category: "X-Ray".into(),
            report_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            file_url: "p1/a.png".into(),
            ai_summary: "Processing report with AI...".into(),
            status: ReportStatus::Pending,
        };
        let created = records(&server).insert_report(&new_report, "tok").await.unwrap();
        assert_eq!(created.id, "r9");
    }

    #[tokio::test]
    async fn doctor_reports_join_patient_name_and_filter_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/reports"))
            .and(query_param("doctor_id", "eq.d1"))
            .and(query_param("status", "eq.pending"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([report_json("r1")])))
            .expect(1)
            .mount(&server)
            .await;

        let reports = records(&server)
            .list_doctor_reports("d1", Some(ReportStatus::Pending), Some(5), "tok")
            .await
            .unwrap();
        assert_eq!(reports[0].patient_name.as_deref(), Some("Pat Smith"));
    }

    #[tokio::test]
    async fn assign_reports_patches_id_list() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/reports"))
            .and(query_param("id", "in.(r1,r2)"))
            .and(body_partial_json(json!({"doctor_id": "d1"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = records(&server);
        store
            .assign_reports(&["r1".into(), "r2".into()], "d1", "tok")
            .await
            .unwrap();
        // Nothing to share means no request at all.
        store.assign_reports(&[], "d1", "tok").await.unwrap();
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(content_range_total("0-24/42"), Some(42));
        assert_eq!(content_range_total("*/0"), Some(0));
        assert_eq!(content_range_total("0-24/*"), None);
    }

    #[tokio::test]
    async fn appointment_count_reads_content_range() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("doctor_id", "eq.d1"))
            .and(header("prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/42"))
            .expect(1)
            .mount(&server)
            .await;

        let total = records(&server)
            .count_doctor_appointments("d1", "tok")
            .await
            .unwrap();
        assert_eq!(total, 42);
    }

    #[tokio::test]
    async fn upcoming_patient_appointments_join_doctor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("select", WITH_DOCTOR))
            .and(query_param("patient_id", "eq.p1"))
            .and(query_param("appointment_date", "gte.2024-05-01T08:00:00Z"))
            .and(query_param("limit", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "a1", "patient_id": "p1", "doctor_id": "d1",
                "appointment_date": "2024-05-02T09:00:00Z", "reason": "checkup",
                "status": "scheduled", "reports_shared": [],
                "doctor": {
                    "id": "d1", "specialization": "Cardiology",
                    "profiles": {"full_name": "Dr. Heart", "avatar_url": null}
                }
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let from = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let list = records(&server)
            .list_patient_appointments("p1", Some(from), Some(3), "tok")
            .await
            .unwrap();
        assert_eq!(list[0].doctor_name.as_deref(), Some("Dr. Heart"));
        assert_eq!(list[0].doctor_specialization.as_deref(), Some("Cardiology"));
        assert_eq!(list[0].patient_name, None);
    }

    #[tokio::test]
    async fn appointment_window_uses_utc_timestamps() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("order", "appointment_date.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "a1", "patient_id": "p1", "doctor_id": "d1",
                "appointment_date": "2024-05-02T09:00:00Z", "reason": null,
                "status": "scheduled", "reports_shared": null,
                "patient": {"full_name": "Pat Smith"}
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let from = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 5, 31, 23, 59, 59).unwrap();
        let list = records(&server)
            .list_doctor_appointments("d1", from, to, "tok")
            .await
            .unwrap();
        assert_eq!(list[0].patient_name.as_deref(), Some("Pat Smith"));
        assert!(list[0].reason.is_empty());

        let received = server.received_requests().await.unwrap();
        let query = received[0].url.query().unwrap_or_default().to_string();
        assert!(query.contains("appointment_date=gte.2024-05-01T00:00:00Z"));
    }
}

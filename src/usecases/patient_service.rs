//! Patient home screen: latest reports and the next few visits.

use crate::domain::{Appointment, DomainError, Report, SessionUser};
use crate::ports::RecordStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Rows shown in each dashboard section.
const DASHBOARD_ROWS: usize = 3;

#[derive(Debug, Clone)]
pub struct PatientDashboard {
    /// Newest report date first.
    pub recent_reports: Vec<Report>,
    /// Soonest first, with the doctor's name and specialization.
    pub upcoming: Vec<Appointment>,
}

pub struct PatientService {
    records: Arc<dyn RecordStore>,
}

impl PatientService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    pub async fn dashboard(&self, user: &SessionUser) -> Result<PatientDashboard, DomainError> {
        self.dashboard_at(user, Utc::now()).await
    }

    /// Dashboard as seen at `now`; appointments before it are left out.
    pub async fn dashboard_at(
        &self,
        user: &SessionUser,
        now: DateTime<Utc>,
    ) -> Result<PatientDashboard, DomainError> {
        let token = &user.access_token;
        let (recent_reports, upcoming) = tokio::try_join!(
            self.records
                .list_patient_reports(&user.id, Some(DASHBOARD_ROWS), token),
            self.records.list_patient_appointments(
                &user.id,
                Some(now),
                Some(DASHBOARD_ROWS),
                token
            ),
        )?;
        debug!(
            reports = recent_reports.len(),
            upcoming = upcoming.len(),
            "patient dashboard loaded"
        );
        Ok(PatientDashboard {
            recent_reports,
            upcoming,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppointmentStatus, ReportStatus};
    use crate::usecases::testing::{FakeRecords, doctor, patient};
    use chrono::{Duration, NaiveDate, TimeZone};

    fn report(id: &str, day: u32) -> Report {
        Report {
            id: id.into(),
            patient_id: "p1".into(),
            doctor_id: None,
            title: format!("Lab Report - {}", id),
            category: "Lab Report".into(),
            report_date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            file_url: "p1/x.pdf".into(),
            ai_summary: None,
            key_findings: vec![],
            recommendations: vec![],
            severity: None,
            status: ReportStatus::Pending,
            patient_name: None,
        }
    }

    fn visit(id: &str, at: DateTime<Utc>) -> Appointment {
        Appointment {
            id: id.into(),
            patient_id: "p1".into(),
            doctor_id: "d1".into(),
            appointment_date: at,
            reason: String::new(),
            status: AppointmentStatus::Scheduled,
            reports_shared: vec![],
            patient_name: None,
            doctor_name: None,
            doctor_specialization: None,
        }
    }

    #[tokio::test]
    async fn dashboard_shows_three_latest_reports_and_next_visits() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let records = Arc::new(FakeRecords::with_doctors(vec![doctor(
            "d1",
            "Dr. Heart",
            "Cardiology",
            4.8,
        )]));
        records.reports.lock().unwrap().extend(
            [("r1", 1), ("r2", 20), ("r3", 5), ("r4", 12)].map(|(id, day)| report(id, day)),
        );
        records.appointments.lock().unwrap().extend([
            visit("past", now - Duration::days(1)),
            visit("later", now + Duration::days(9)),
            visit("soon", now + Duration::hours(2)),
            visit("next", now + Duration::days(3)),
            visit("far", now + Duration::days(30)),
        ]);
        let svc = PatientService::new(records);

        let dash = svc.dashboard_at(&patient(), now).await.unwrap();
        let reports: Vec<&str> = dash.recent_reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(reports, ["r2", "r4", "r3"]);
        let visits: Vec<&str> = dash.upcoming.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(visits, ["soon", "next", "later"]);
        assert_eq!(dash.upcoming[0].doctor_name.as_deref(), Some("Dr. Heart"));
        assert_eq!(
            dash.upcoming[0].doctor_specialization.as_deref(),
            Some("Cardiology")
        );
    }

    #[tokio::test]
    async fn empty_dashboard_for_new_patient() {
        let svc = PatientService::new(Arc::new(FakeRecords::default()));
        let dash = svc.dashboard(&patient()).await.unwrap();
        assert!(dash.recent_reports.is_empty());
        assert!(dash.upcoming.is_empty());
    }
}

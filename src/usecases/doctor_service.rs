//! Doctor discovery for patients, dashboard and schedule for doctors.

use super::report_service::require_doctor;
use crate::domain::{
    Appointment, Doctor, DoctorQuery, DomainError, Report, ReportStatus, SessionUser,
};
use crate::ports::RecordStore;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::debug;

/// Pending reports shown on the dashboard.
const DASHBOARD_PENDING_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct DoctorDashboard {
    pub today: Vec<Appointment>,
    pub pending_reports: Vec<Report>,
    pub total_appointments: usize,
}

pub struct DoctorService {
    records: Arc<dyn RecordStore>,
}

impl DoctorService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    pub async fn search(
        &self,
        user: &SessionUser,
        query: &DoctorQuery,
    ) -> Result<Vec<Doctor>, DomainError> {
        let doctors = self.records.list_doctors(&user.access_token).await?;
        let total = doctors.len();
        let found = query.apply(doctors);
        debug!(total, matched = found.len(), "doctor search");
        Ok(found)
    }

    /// The signed-in doctor's own listing, as patients see it.
    pub async fn profile(&self, user: &SessionUser) -> Result<Doctor, DomainError> {
        require_doctor(user)?;
        self.records
            .get_doctor(&user.id, &user.access_token)
            .await
    }

    pub async fn dashboard(&self, user: &SessionUser) -> Result<DoctorDashboard, DomainError> {
        self.dashboard_for(user, Local::now().date_naive()).await
    }

    /// Dashboard as seen on `day` (local calendar date).
    pub async fn dashboard_for(
        &self,
        user: &SessionUser,
        day: NaiveDate,
    ) -> Result<DoctorDashboard, DomainError> {
        require_doctor(user)?;
        let (from, to) = local_span(day, day)?;
        let token = &user.access_token;

        let (today, pending_reports, total_appointments) = tokio::try_join!(
            self.records.list_doctor_appointments(&user.id, from, to, token),
            self.records.list_doctor_reports(
                &user.id,
                Some(ReportStatus::Pending),
                Some(DASHBOARD_PENDING_LIMIT),
                token
            ),
            self.records.count_doctor_appointments(&user.id, token),
        )?;

        Ok(DoctorDashboard {
            today,
            pending_reports,
            total_appointments,
        })
    }

    /// Appointments from the first to the last day of a month, ascending.
    pub async fn month_schedule(
        &self,
        user: &SessionUser,
        year: i32,
        month: u32,
    ) -> Result<Vec<Appointment>, DomainError> {
        require_doctor(user)?;
        let (first, last) = month_bounds(year, month)?;
        let (from, to) = local_span(first, last)?;
        self.records
            .list_doctor_appointments(&user.id, from, to, &user.access_token)
            .await
    }
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), DomainError> {
    let invalid = || DomainError::Validation(format!("invalid month {}-{}", year, month));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    let last = next.pred_opt().ok_or_else(invalid)?;
    Ok((first, last))
}

/// Start of `first` through the end of `last`, local time, as UTC instants.
fn local_span(
    first: NaiveDate,
    last: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DomainError> {
    let to_utc = |date: NaiveDate, time: NaiveTime| {
        Local
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| DomainError::Validation(format!("{} has no local midnight", date)))
    };
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Ok((to_utc(first, NaiveTime::MIN)?, to_utc(last, end_of_day)?))
}

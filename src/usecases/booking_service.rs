//! Appointment booking for patients.

use super::latch::InFlight;
use crate::domain::{
    Appointment, AppointmentStatus, BookingDraft, DomainError, NewAppointment, SessionUser,
};
use crate::ports::RecordStore;
use std::sync::Arc;
use tracing::info;

pub struct BookingService {
    records: Arc<dyn RecordStore>,
    latch: InFlight,
}

impl BookingService {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            latch: InFlight::new(),
        }
    }

    /// Book the drafted visit. When `share_reports` is set, every report of the
    /// patient is assigned to the doctor before the appointment is created.
    pub async fn book(
        &self,
        user: &SessionUser,
        draft: &BookingDraft,
    ) -> Result<Appointment, DomainError> {
        let appointment_date = draft.scheduled_at()?;
        let _permit = self.latch.try_begin()?;
        let token = &user.access_token;

        let reports_shared = if draft.share_reports {
            let ids: Vec<String> = self
                .records
                .list_patient_reports(&user.id, None, token)
                .await?
                .into_iter()
                .map(|r| r.id)
                .collect();
            self.records
                .assign_reports(&ids, &draft.doctor_id, token)
                .await?;
            ids
        } else {
            Vec::new()
        };

        let appointment = NewAppointment {
            patient_id: user.id.clone(),
            doctor_id: draft.doctor_id.clone(),
            appointment_date,
            reason: draft.reason.trim().to_string(),
            status: AppointmentStatus::Scheduled,
            reports_shared,
        };
        let created = self.records.insert_appointment(&appointment, token).await?;
        info!(
            appointment_id = %created.id,
            doctor_id = %created.doctor_id,
            shared = created.reports_shared.len(),
            "appointment booked"
        );
        Ok(created)
    }

    /// The signed-in patient's appointments.
    pub async fn my_appointments(
        &self,
        user: &SessionUser,
    ) -> Result<Vec<Appointment>, DomainError> {
        self.records
            .list_patient_appointments(&user.id, None, None, &user.access_token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewReport, ReportStatus};
    use crate::usecases::testing::{FakeRecords, patient};
    use chrono::{Local, NaiveDate, Timelike};

    fn draft() -> BookingDraft {
        let mut draft = BookingDraft::new("d1");
        draft.date = NaiveDate::from_ymd_opt(2024, 7, 3);
        draft.time_slot = Some("02:30 PM".into());
        draft.reason = "  follow-up ".into();
        draft
    }

    async fn seed_report(records: &FakeRecords) {
        let new_report = NewReport {
            patient_id: "p1".into(),
            title: "Blood Test - Report".into(),
            category: "Blood Test".into(),
            report_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            file_url: "p1/x.png".into(),
            ai_summary: "Processing report with AI...".into(),
            status: ReportStatus::Pending,
        };
        records.insert_report(&new_report, "tok").await.unwrap();
    }

    #[tokio::test]
    async fn booking_shares_reports_and_schedules() {
        let records = Arc::new(FakeRecords::default());
        seed_report(&records).await;
        let svc = BookingService::new(records.clone());

        let created = svc.book(&patient(), &draft()).await.unwrap();
        assert_eq!(created.status, AppointmentStatus::Scheduled);
        assert_eq!(created.reports_shared, vec!["r1".to_string()]);
        assert_eq!(created.reason, "follow-up");

        let local = created.appointment_date.with_timezone(&Local);
        assert_eq!((local.hour(), local.minute()), (14, 30));
        assert_eq!(
            *records.assigned.lock().unwrap(),
            vec![(vec!["r1".to_string()], "d1".to_string())]
        );
    }

    #[tokio::test]
    async fn sharing_can_be_turned_off() {
        let records = Arc::new(FakeRecords::default());
        seed_report(&records).await;
        let svc = BookingService::new(records.clone());

        let mut d = draft();
        d.share_reports = false;
        let created = svc.book(&patient(), &d).await.unwrap();
        assert!(created.reports_shared.is_empty());
        assert!(records.assigned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn incomplete_draft_is_rejected() {
        let records = Arc::new(FakeRecords::default());
        let svc = BookingService::new(records.clone());
        let mut d = draft();
        d.time_slot = None;
        assert!(matches!(
            svc.book(&patient(), &d).await,
            Err(DomainError::Validation(_))
        ));
        assert!(records.appointments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn patient_sees_own_appointments() {
        let records = Arc::new(FakeRecords::default());
        let svc = BookingService::new(records);
        svc.book(&patient(), &draft()).await.unwrap();
        let mine = svc.my_appointments(&patient()).await.unwrap();
        assert_eq!(mine.len(), 1);
    }
}

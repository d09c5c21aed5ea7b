//! Transient form state: registration wizard and appointment booking.
//!
//! Drafts are mutated field by field, validated per step and submitted once.

use crate::domain::{DomainError, UserRole};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// Number of wizard steps for both roles.
pub const REGISTRATION_STEPS: u8 = 3;

const MIN_PASSWORD_LEN: usize = 6;

/// Multi-step sign-up state.
///
/// Patient steps: account, personal details, emergency contact.
/// Doctor steps: account, professional details, clinic.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    role: Option<UserRole>,
    step: u8,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_group: String,
    pub allergies: String,
    pub emergency_name: String,
    pub emergency_phone: String,
    pub specialization: String,
    pub license: String,
    pub experience: String,
    pub education: String,
    pub clinic_name: String,
    pub clinic_address: String,
    pub consultation_fee: String,
}

/// Everything the auth provider needs to create an account.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Stored as user metadata; always carries `full_name` and `role`.
    pub metadata: Map<String, Value>,
}

impl RegistrationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the account type. Resets the wizard to step 1.
    pub fn choose_role(&mut self, role: UserRole) {
        self.role = Some(role);
        self.step = 1;
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role
    }

    /// Current step (1-based). 0 until a role is chosen.
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn is_last_step(&self) -> bool {
        self.step == REGISTRATION_STEPS
    }

    pub fn step_label(&self) -> &'static str {
        match (self.role, self.step) {
            (_, 1) => "Account",
            (Some(UserRole::Patient), 2) => "Personal",
            (Some(UserRole::Patient), 3) => "Emergency",
            (Some(UserRole::Doctor), 2) => "Professional",
            (Some(UserRole::Doctor), 3) => "Clinic",
            _ => "Role",
        }
    }

    /// Validate the current step and advance. Stays put on failure.
    pub fn next_step(&mut self) -> Result<u8, DomainError> {
        self.validate_step()?;
        if self.step < REGISTRATION_STEPS {
            self.step += 1;
        }
        Ok(self.step)
    }

    pub fn prev_step(&mut self) -> u8 {
        if self.step > 1 {
            self.step -= 1;
        }
        self.step
    }

    /// Check the required fields of the current step.
    pub fn validate_step(&self) -> Result<(), DomainError> {
        self.validate(self.step)
    }

    fn validate(&self, step: u8) -> Result<(), DomainError> {
        let role = self
            .role
            .ok_or_else(|| DomainError::Validation("choose patient or doctor first".into()))?;
        match (role, step) {
            (_, 1) => {
                require(&self.full_name, "full name")?;
                require(&self.email, "email")?;
                if !self.email.contains('@') {
                    return Err(DomainError::Validation("email must contain '@'".into()));
                }
                if self.password.chars().count() < MIN_PASSWORD_LEN {
                    return Err(DomainError::Validation(format!(
                        "password must be at least {} characters",
                        MIN_PASSWORD_LEN
                    )));
                }
                Ok(())
            }
            (UserRole::Patient, 2) => {
                require(&self.date_of_birth, "date of birth")?;
                NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").map_err(|_| {
                    DomainError::Validation("date of birth must be YYYY-MM-DD".into())
                })?;
                require(&self.gender, "gender")
            }
            (UserRole::Patient, 3) => {
                require(&self.emergency_name, "emergency contact name")?;
                require(&self.emergency_phone, "emergency contact phone")
            }
            (UserRole::Doctor, 2) => {
                require(&self.specialization, "specialization")?;
                require(&self.license, "license number")?;
                require(&self.experience, "years of experience")?;
                self.experience.trim().parse::<u32>().map_err(|_| {
                    DomainError::Validation("years of experience must be a whole number".into())
                })?;
                Ok(())
            }
            (UserRole::Doctor, 3) => {
                require(&self.clinic_name, "clinic name")?;
                require(&self.clinic_address, "clinic address")
            }
            _ => Err(DomainError::Validation(format!(
                "invalid wizard step {}",
                step
            ))),
        }
    }

    /// Build the sign-up payload. Only allowed from the final step; every step
    /// is checked again since fields stay editable after moving on.
    pub fn submit(&self) -> Result<SignUpRequest, DomainError> {
        if !self.is_last_step() {
            return Err(DomainError::Validation(format!(
                "registration is on step {} of {}",
                self.step, REGISTRATION_STEPS
            )));
        }
        for step in 1..=REGISTRATION_STEPS {
            self.validate(step)?;
        }
        let role = self.role.unwrap_or_default();

        let mut metadata = Map::new();
        metadata.insert("full_name".into(), Value::String(self.full_name.trim().into()));
        metadata.insert("role".into(), Value::String(role.to_string()));

        let optional: Vec<(&str, &str)> = match role {
            UserRole::Patient => vec![
                ("phone", self.phone.as_str()),
                ("date_of_birth", self.date_of_birth.as_str()),
                ("gender", self.gender.as_str()),
                ("blood_group", self.blood_group.as_str()),
                ("allergies", self.allergies.as_str()),
                ("emergency_contact_name", self.emergency_name.as_str()),
                ("emergency_contact_phone", self.emergency_phone.as_str()),
            ],
            UserRole::Doctor => vec![
                ("phone", self.phone.as_str()),
                ("specialization", self.specialization.as_str()),
                ("license_number", self.license.as_str()),
                ("experience_years", self.experience.as_str()),
                ("education", self.education.as_str()),
                ("hospital_clinic", self.clinic_name.as_str()),
                ("clinic_address", self.clinic_address.as_str()),
                ("consultation_fee", self.consultation_fee.as_str()),
            ],
        };
        for (key, value) in optional {
            let v = value.trim();
            if !v.is_empty() {
                metadata.insert(key.to_string(), Value::String(v.into()));
            }
        }

        Ok(SignUpRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            metadata,
        })
    }
}

fn require(value: &str, field: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// Bookable half-hour slots, in display order.
pub const TIME_SLOTS: [&str; 12] = [
    "09:00 AM", "09:30 AM", "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM", "02:00 PM", "02:30 PM",
    "03:00 PM", "03:30 PM", "04:00 PM", "04:30 PM",
];

/// Convert a `hh:mm AM|PM` slot label to a 24-hour time.
///
/// `12` is treated as hour zero before the PM shift, so `12:30 PM` is 12:30
/// and `12:30 AM` is 00:30.
pub fn slot_to_24h(slot: &str) -> Result<NaiveTime, DomainError> {
    let invalid = || DomainError::Validation(format!("invalid time slot '{}'", slot));
    let (time, modifier) = slot.trim().split_once(' ').ok_or_else(invalid)?;
    let (hours, minutes) = time.split_once(':').ok_or_else(invalid)?;
    let mut hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours == 12 {
        hours = 0;
    }
    match modifier {
        "AM" => {}
        "PM" => hours += 12,
        _ => return Err(invalid()),
    }
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// Appointment form state.
#[derive(Debug, Clone)]
pub struct BookingDraft {
    pub doctor_id: String,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub reason: String,
    /// Share all of the patient's reports with the doctor. On by default.
    pub share_reports: bool,
}

impl BookingDraft {
    pub fn new(doctor_id: impl Into<String>) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            date: None,
            time_slot: None,
            reason: String::new(),
            share_reports: true,
        }
    }

    /// Local wall-clock date and time of the visit.
    pub fn scheduled_naive(&self) -> Result<NaiveDateTime, DomainError> {
        if self.doctor_id.trim().is_empty() {
            return Err(DomainError::Validation("doctor is required".into()));
        }
        let date = self
            .date
            .ok_or_else(|| DomainError::Validation("date is required".into()))?;
        let slot = self
            .time_slot
            .as_deref()
            .ok_or_else(|| DomainError::Validation("time slot is required".into()))?;
        if !TIME_SLOTS.contains(&slot) {
            return Err(DomainError::Validation(format!(
                "'{}' is not an available slot",
                slot
            )));
        }
        Ok(date.and_time(slot_to_24h(slot)?))
    }

    /// Visit instant, interpreting the slot in the local time zone.
    pub fn scheduled_at(&self) -> Result<DateTime<Utc>, DomainError> {
        let naive = self.scheduled_naive()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| DomainError::Validation(format!("{} does not exist locally", naive)))
    }
}

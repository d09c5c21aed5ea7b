//! Implements InputPort. Inquire-based interactive client.
//!
//! A thin driver: every action is a use-case call. Menus depend on who is
//! signed in (guest, patient, doctor).

use super::banner::{BLUE, TEAL};
use super::progress::with_spinner;
use crate::domain::{
    Appointment, BookingDraft, Doctor, DoctorQuery, DoctorSort, DomainError, Report,
    RegistrationDraft, SPECIALIZATIONS, SessionUser, TIME_SLOTS, UploadFile, UserRole,
};
use crate::ports::InputPort;
use crate::usecases::report_service::REPORT_TYPES;
use crate::usecases::{
    AuthService, BookingService, ChatService, DoctorService, PatientService, ReportService,
    ReportSubmission, Session,
};
use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};
use crossterm::style::Stylize;
use inquire::error::InquireResult;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Select, Text};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Applies the teal/blue theme to every inquire prompt.
pub fn apply_theme() {
    let teal = Color::Rgb {
        r: TEAL.0,
        g: TEAL.1,
        b: TEAL.2,
    };
    let blue = Color::Rgb {
        r: BLUE.0,
        g: BLUE.1,
        b: BLUE.2,
    };
    let mut config = RenderConfig::default_colored();
    config.prompt_prefix = Styled::new("✚").with_fg(teal);
    config.highlighted_option_prefix = Styled::new("➤").with_fg(blue);
    config.answer = StyleSheet::new().with_fg(teal);
    inquire::set_global_render_config(config);
}

enum Flow {
    Continue,
    Quit,
}

/// `Ok(None)` when the user backed out of a prompt (Esc / Ctrl-C).
fn ask<T>(result: InquireResult<T>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

/// Unwrap a prompt answer or leave the current action.
macro_rules! answer {
    ($prompt:expr) => {
        match ask($prompt)? {
            Some(value) => value,
            None => return Ok(Flow::Continue),
        }
    };
}

fn guess_mime(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

fn split_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_date(input: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::Validation(format!("'{}' is not a YYYY-MM-DD date", input)))
}

fn parse_month(input: &str) -> Result<(i32, u32), DomainError> {
    let invalid = || DomainError::Validation(format!("'{}' is not a YYYY-MM month", input));
    let (year, month) = input.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

fn doctor_line(d: &Doctor) -> String {
    let verified = if d.is_verified { " ✓" } else { "" };
    format!(
        "{}{} · {} · {} · {} yrs · ${:.0} · ★ {:.1}",
        d.name, verified, d.specialization, d.hospital, d.experience_years, d.consultation_fee, d.rating
    )
}

fn report_line(r: &Report) -> String {
    let patient = r
        .patient_name
        .as_deref()
        .map(|n| format!(" · {}", n))
        .unwrap_or_default();
    format!(
        "{} · {}{} [{:?}]",
        r.report_date, r.title, patient, r.status
    )
}

/// `when · Dr. Name (Specialty) · reason` for patient-side lists.
fn visit_line(a: &Appointment) -> String {
    let doctor = match (&a.doctor_name, &a.doctor_specialization) {
        (Some(name), Some(spec)) => format!(" · {} ({})", name, spec),
        (Some(name), None) => format!(" · {}", name),
        _ => String::new(),
    };
    let reason = if a.reason.is_empty() {
        String::new()
    } else {
        format!(" · {}", a.reason)
    };
    format!(
        "{}{} [{:?}]{}",
        a.appointment_date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        doctor,
        a.status,
        reason
    )
}

fn print_doctor_profile(d: &Doctor) {
    let verified = if d.is_verified { " ✓ verified" } else { "" };
    println!("\n{}{}", d.name.as_str().bold(), verified);
    println!("  Specialization: {}", d.specialization);
    println!("  Clinic: {}", d.hospital);
    println!("  Experience: {} yrs", d.experience_years);
    println!("  Consultation fee: ${:.0}", d.consultation_fee);
    println!("  Rating: ★ {:.1}", d.rating);
    if let Some(email) = &d.email {
        println!("  Email: {}", email);
    }
    println!();
}

fn print_report(r: &Report) {
    println!("\n{}", r.title.as_str().bold());
    println!("  Date: {}   Category: {}   Status: {:?}", r.report_date, r.category, r.status);
    if let Some(severity) = r.severity {
        println!("  Severity: {}", severity);
    }
    if let Some(summary) = &r.ai_summary {
        println!("  Summary: {}", summary);
    }
    if !r.key_findings.is_empty() {
        println!("  Key findings:");
        for finding in &r.key_findings {
            println!("    • {}", finding);
        }
    }
    if !r.recommendations.is_empty() {
        println!("  Recommendations:");
        for rec in &r.recommendations {
            println!("    • {}", rec);
        }
    }
    println!();
}

fn print_error(err: &DomainError) {
    println!("{}", format!("✖ {}", err).red());
}

fn print_ok(message: &str) {
    println!("{}", format!("✔ {}", message).green());
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    session: Arc<Session>,
    auth: Arc<AuthService>,
    chat: Arc<ChatService>,
    reports: Arc<ReportService>,
    patients: Arc<PatientService>,
    doctors: Arc<DoctorService>,
    booking: Arc<BookingService>,
}

impl TuiInputPort {
    pub fn new(
        session: Arc<Session>,
        auth: Arc<AuthService>,
        chat: Arc<ChatService>,
        reports: Arc<ReportService>,
        patients: Arc<PatientService>,
        doctors: Arc<DoctorService>,
        booking: Arc<BookingService>,
    ) -> Self {
        Self {
            session,
            auth,
            chat,
            reports,
            patients,
            doctors,
            booking,
        }
    }

    async fn guest_menu(&self) -> Result<Flow, DomainError> {
        let options = vec!["Sign in", "Create account", "Chat with IASO AI", "Quit"];
        let choice = answer!(Select::new("IASO Med", options).prompt());
        match choice {
            "Sign in" => self.sign_in().await,
            "Create account" => self.register().await,
            "Chat with IASO AI" => self.chat_loop().await,
            _ => Ok(Flow::Quit),
        }
    }

    async fn patient_menu(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let options = vec![
            "Dashboard",
            "Chat with IASO AI",
            "Upload a report",
            "My reports",
            "Summarize report text",
            "Find doctors",
            "Book an appointment",
            "My appointments",
            "My profile",
            "Log out",
            "Quit",
        ];
        let title = format!("Hello, {}", user.name);
        let choice = answer!(Select::new(&title, options).prompt());
        match choice {
            "Dashboard" => self.patient_dashboard(user).await,
            "Chat with IASO AI" => self.chat_loop().await,
            "Upload a report" => self.upload_report(user).await,
            "My reports" => self.my_reports(user).await,
            "Summarize report text" => self.summarize_text().await,
            "Find doctors" => self.find_doctors(user).await,
            "Book an appointment" => self.find_doctors(user).await,
            "My appointments" => self.my_appointments(user).await,
            "My profile" => self.patient_profile(user),
            "Log out" => self.logout().await,
            _ => Ok(Flow::Quit),
        }
    }

    async fn doctor_menu(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let options = vec![
            "Dashboard",
            "Monthly schedule",
            "Patient reports",
            "Chat with IASO AI",
            "My profile",
            "Log out",
            "Quit",
        ];
        let title = format!("Welcome, {}", user.name);
        let choice = answer!(Select::new(&title, options).prompt());
        match choice {
            "Dashboard" => self.dashboard(user).await,
            "Monthly schedule" => self.schedule(user).await,
            "Patient reports" => self.patient_reports(user).await,
            "Chat with IASO AI" => self.chat_loop().await,
            "My profile" => self.doctor_profile(user).await,
            "Log out" => self.logout().await,
            _ => Ok(Flow::Quit),
        }
    }

    async fn sign_in(&self) -> Result<Flow, DomainError> {
        let email = answer!(Text::new("Email:").prompt());
        let password = answer!(
            Password::new("Password:")
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .prompt()
        );
        let user = with_spinner("Signing in...", self.auth.sign_in(&email, &password)).await?;
        print_ok(&format!("Signed in as {} ({})", user.name, user.role));
        Ok(Flow::Continue)
    }

    async fn register(&self) -> Result<Flow, DomainError> {
        let role = answer!(Select::new("I am a", vec!["Patient", "Doctor"]).prompt());
        let mut draft = RegistrationDraft::new();
        draft.choose_role(if role == "Doctor" {
            UserRole::Doctor
        } else {
            UserRole::Patient
        });

        loop {
            println!(
                "{}",
                format!("Step {} of 3: {}", draft.step(), draft.step_label()).bold()
            );
            if !Self::fill_step(&mut draft)? {
                // Esc goes back one step; on the first step it leaves the wizard.
                if draft.step() > 1 {
                    draft.prev_step();
                    continue;
                }
                return Ok(Flow::Continue);
            }
            if draft.is_last_step() {
                if let Err(e) = draft.validate_step() {
                    print_error(&e);
                    continue;
                }
                break;
            }
            if let Err(e) = draft.next_step() {
                print_error(&e);
            }
        }

        with_spinner("Creating account...", self.auth.register(&draft)).await?;
        print_ok("Account created. Confirm your email if asked, then sign in.");
        Ok(Flow::Continue)
    }

    /// Prompt the fields of the current wizard step. `false` when cancelled.
    fn fill_step(draft: &mut RegistrationDraft) -> Result<bool, DomainError> {
        fn field(label: &str, current: &str) -> Result<Option<String>, DomainError> {
            ask(Text::new(label).with_initial_value(current).prompt())
        }
        macro_rules! fill {
            ($label:expr, $field:expr) => {
                match field($label, &$field)? {
                    Some(value) => $field = value,
                    None => return Ok(false),
                }
            };
        }

        match (draft.role(), draft.step()) {
            (_, 1) => {
                fill!("Full name:", draft.full_name);
                fill!("Email:", draft.email);
                match ask(
                    Password::new("Password (min 6 characters):")
                        .with_display_mode(PasswordDisplayMode::Masked)
                        .prompt(),
                )? {
                    Some(value) => draft.password = value,
                    None => return Ok(false),
                }
                fill!("Phone (optional):", draft.phone);
            }
            (Some(UserRole::Patient), 2) => {
                fill!("Date of birth (YYYY-MM-DD):", draft.date_of_birth);
                match ask(Select::new("Gender:", vec!["Male", "Female", "Other"]).prompt())? {
                    Some(value) => draft.gender = value.to_string(),
                    None => return Ok(false),
                }
                fill!("Blood group (optional):", draft.blood_group);
                fill!("Allergies (optional):", draft.allergies);
            }
            (Some(UserRole::Patient), _) => {
                fill!("Emergency contact name:", draft.emergency_name);
                fill!("Emergency contact phone:", draft.emergency_phone);
            }
            (Some(UserRole::Doctor), 2) => {
                match ask(Select::new("Specialization:", SPECIALIZATIONS[1..].to_vec()).prompt())? {
                    Some(value) => draft.specialization = value.to_string(),
                    None => return Ok(false),
                }
                fill!("License number:", draft.license);
                fill!("Years of experience:", draft.experience);
                fill!("Education (optional):", draft.education);
            }
            (Some(UserRole::Doctor), _) => {
                fill!("Clinic / hospital name:", draft.clinic_name);
                fill!("Clinic address:", draft.clinic_address);
                fill!("Consultation fee (optional):", draft.consultation_fee);
            }
            (None, _) => return Ok(false),
        }
        Ok(true)
    }

    async fn logout(&self) -> Result<Flow, DomainError> {
        self.chat.reset().await;
        self.auth.logout().await?;
        print_ok("Signed out.");
        Ok(Flow::Continue)
    }

    async fn chat_loop(&self) -> Result<Flow, DomainError> {
        if let Some(last) = self.chat.history().await.last() {
            println!("{} {}", "IASO AI:".cyan().bold(), last.content);
        }
        println!("{}", "(empty line to go back)".dark_grey());

        loop {
            let Some(input) = ask(Text::new("You:").prompt())? else {
                return Ok(Flow::Continue);
            };
            if input.trim().is_empty() {
                return Ok(Flow::Continue);
            }
            match with_spinner("IASO AI is thinking...", self.chat.send(&input)).await {
                Ok(Some(reply)) => println!("{} {}", "IASO AI:".cyan().bold(), reply.content),
                Ok(None) => {}
                Err(e) => print_error(&e),
            }
        }
    }

    async fn upload_report(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let report_type = answer!(Select::new("Report type:", REPORT_TYPES.to_vec()).prompt());
        let hospital = answer!(Text::new("Hospital / lab (optional):").prompt());
        let today = Local::now().date_naive().to_string();
        let date = answer!(Text::new("Report date:").with_default(&today).prompt());
        let report_date = parse_date(&date)?;
        let paths = answer!(
            Text::new("File paths (comma-separated, up to 5):")
                .with_help_message("PNG, JPEG, WEBP or PDF")
                .prompt()
        );

        let mut files = Vec::new();
        for path in split_paths(&paths) {
            files.push(read_upload(&path).await?);
        }

        let submission = ReportSubmission {
            report_type: report_type.to_string(),
            hospital,
            report_date,
            files,
        };
        let outcome = with_spinner(
            "Uploading and analyzing report...",
            self.reports.submit(user, submission),
        )
        .await?;

        print_ok("Report uploaded.");
        if let Some(warning) = &outcome.warning {
            println!("{}", format!("⚠ {}", warning).yellow());
        }
        print_report(&outcome.report);
        Ok(Flow::Continue)
    }

    /// List reports and open one, reloaded so late analysis results show up.
    async fn pick_report(
        &self,
        user: &SessionUser,
        reports: Vec<Report>,
    ) -> Result<Flow, DomainError> {
        if reports.is_empty() {
            println!("No reports yet.");
            return Ok(Flow::Continue);
        }
        let labels: Vec<String> = reports.iter().map(report_line).collect();
        let picked = answer!(Select::new("Open a report:", labels).raw_prompt());
        if let Some(listed) = reports.get(picked.index) {
            let report =
                with_spinner("Opening report...", self.reports.report(user, &listed.id)).await?;
            print_report(&Report {
                patient_name: report.patient_name.or_else(|| listed.patient_name.clone()),
                ..report
            });
        }
        Ok(Flow::Continue)
    }

    async fn my_reports(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let reports = with_spinner("Loading reports...", self.reports.my_reports(user)).await?;
        self.pick_report(user, reports).await
    }

    async fn patient_dashboard(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let dash = with_spinner("Loading dashboard...", self.patients.dashboard(user)).await?;
        println!("\n{}", "Recent reports".bold());
        if dash.recent_reports.is_empty() {
            println!("  none yet, upload one from the menu");
        }
        for r in &dash.recent_reports {
            println!("  {}", report_line(r));
        }
        println!("{}", "Upcoming appointments".bold());
        if dash.upcoming.is_empty() {
            println!("  none scheduled");
        }
        for a in &dash.upcoming {
            println!("  {}", visit_line(a));
        }
        println!();
        Ok(Flow::Continue)
    }

    fn patient_profile(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        println!("\n{}", user.name.as_str().bold());
        println!("  Email: {}", user.email);
        println!("  Account: {}\n", user.role);
        Ok(Flow::Continue)
    }

    async fn doctor_profile(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let me = with_spinner("Loading profile...", self.doctors.profile(user)).await?;
        print_doctor_profile(&me);
        Ok(Flow::Continue)
    }

    async fn summarize_text(&self) -> Result<Flow, DomainError> {
        let report_type = answer!(Select::new("Report type:", REPORT_TYPES.to_vec()).prompt());
        let text = answer!(Text::new("Paste the report text:").prompt());
        let summary = with_spinner(
            "Summarizing...",
            self.reports.summarize(report_type, &text),
        )
        .await;
        println!("\n{}\n", summary);
        Ok(Flow::Continue)
    }

    async fn find_doctors(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let text = answer!(Text::new("Search by name or specialty (optional):").prompt());
        let specialization =
            answer!(Select::new("Specialization:", SPECIALIZATIONS.to_vec()).prompt());
        let sort = answer!(Select::new("Sort by:", vec!["Rating", "Fee", "Experience"]).prompt());
        let query = DoctorQuery {
            text,
            specialization: Some(specialization.to_string()),
            sort: match sort {
                "Fee" => DoctorSort::Fee,
                "Experience" => DoctorSort::Experience,
                _ => DoctorSort::Rating,
            },
        };

        let doctors = with_spinner("Searching...", self.doctors.search(user, &query)).await?;
        if doctors.is_empty() {
            println!("No doctors match your search.");
            return Ok(Flow::Continue);
        }
        let labels: Vec<String> = doctors.iter().map(doctor_line).collect();
        let picked = answer!(Select::new("Book with:", labels).raw_prompt());
        match doctors.get(picked.index) {
            Some(doctor) => self.book_with(user, doctor).await,
            None => Ok(Flow::Continue),
        }
    }

    async fn book_with(&self, user: &SessionUser, doctor: &Doctor) -> Result<Flow, DomainError> {
        let mut draft = BookingDraft::new(doctor.id.clone());
        let tomorrow = Local::now()
            .date_naive()
            .succ_opt()
            .map(|d| d.to_string())
            .unwrap_or_default();
        let date = answer!(Text::new("Date:").with_default(&tomorrow).prompt());
        draft.date = Some(parse_date(&date)?);
        let slot = answer!(Select::new("Time:", TIME_SLOTS.to_vec()).prompt());
        draft.time_slot = Some(slot.to_string());
        draft.reason = answer!(Text::new("Reason for visit:").prompt());
        draft.share_reports = answer!(
            Confirm::new("Share your reports with the doctor?")
                .with_default(true)
                .prompt()
        );

        let appointment = with_spinner("Booking...", self.booking.book(user, &draft)).await?;
        print_ok(&format!(
            "Booked with {} on {}",
            doctor.name,
            appointment
                .appointment_date
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
        ));
        Ok(Flow::Continue)
    }

    async fn my_appointments(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let list = with_spinner("Loading...", self.booking.my_appointments(user)).await?;
        if list.is_empty() {
            println!("No appointments yet.");
        }
        for a in &list {
            println!("  {}", visit_line(a));
        }
        Ok(Flow::Continue)
    }

    async fn dashboard(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let dash = with_spinner("Loading dashboard...", self.doctors.dashboard(user)).await?;
        println!("\n{}", "Today's appointments".bold());
        if dash.today.is_empty() {
            println!("  none");
        }
        for a in &dash.today {
            println!(
                "  {} · {} · {}",
                a.appointment_date.with_timezone(&Local).format("%H:%M"),
                a.patient_name.as_deref().unwrap_or("Patient"),
                a.reason
            );
        }
        println!("{}", "Pending reports".bold());
        if dash.pending_reports.is_empty() {
            println!("  none");
        }
        for r in &dash.pending_reports {
            println!("  {}", report_line(r));
        }
        println!("Total appointments: {}\n", dash.total_appointments);
        Ok(Flow::Continue)
    }

    async fn schedule(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let now = Local::now();
        let current = format!("{}-{:02}", now.year(), now.month());
        let month = answer!(Text::new("Month (YYYY-MM):").with_default(&current).prompt());
        let (year, month) = parse_month(&month)?;
        let list = with_spinner(
            "Loading schedule...",
            self.doctors.month_schedule(user, year, month),
        )
        .await?;
        if list.is_empty() {
            println!("No appointments this month.");
        }
        for a in list {
            println!(
                "  {} · {} · {}",
                a.appointment_date.with_timezone(&Local).format("%a %d %H:%M"),
                a.patient_name.as_deref().unwrap_or("Patient"),
                a.reason
            );
        }
        Ok(Flow::Continue)
    }

    async fn patient_reports(&self, user: &SessionUser) -> Result<Flow, DomainError> {
        let search = answer!(Text::new("Search by title or patient (optional):").prompt());
        let reports = with_spinner(
            "Loading reports...",
            self.reports.assigned_reports(user, &search),
        )
        .await?;
        self.pick_report(user, reports).await
    }
}

async fn read_upload(path: &Path) -> Result<UploadFile, DomainError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DomainError::Validation(format!("cannot read {}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    debug!(file = %name, size = bytes.len(), "file read for upload");
    Ok(UploadFile {
        mime_type: guess_mime(&name).map(str::to_string),
        name,
        bytes,
    })
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let flow = match self.session.current() {
                None => self.guest_menu().await,
                Some(user) if user.role == UserRole::Doctor => self.doctor_menu(&user).await,
                Some(user) => self.patient_menu(&user).await,
            };
            match flow {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(e @ DomainError::Ui(_)) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "action failed");
                    print_error(&e);
                }
            }
        }
    }
}

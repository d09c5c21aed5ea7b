//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; the live/demo decision is just which adapter gets wired.

use anyhow::Context;
use dotenv::dotenv;
use iaso_med::adapters::ai::{DemoAdapter, GeminiAdapter, OpenAiAdapter};
use iaso_med::adapters::backend::{SupabaseAuth, SupabaseClient, SupabaseRecords, SupabaseStorage};
use iaso_med::adapters::ui::tui::TuiInputPort;
use iaso_med::ports::{AnalysisPort, AuthPort, ChatPort, InputPort, ObjectStore, RecordStore};
use iaso_med::shared::config::{AiProvider, AppConfig};
use iaso_med::usecases::{
    AuthService, BookingService, ChatService, DoctorService, PatientService, ReportService,
    Session,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Live chat and analysis ports, or `None` when no API key is configured.
fn live_ai(cfg: &AppConfig) -> Option<(Arc<dyn ChatPort>, Arc<dyn AnalysisPort>)> {
    let key = cfg.ai_api_key()?;
    match cfg.ai_provider_or_default() {
        AiProvider::Gemini => {
            let adapter = Arc::new(GeminiAdapter::new(
                cfg.ai_api_url_or_default(),
                key,
                cfg.ai_model_or_default(),
                cfg.ai_vision_model_or_default(),
            ));
            let chat: Arc<dyn ChatPort> = adapter.clone();
            let analysis: Arc<dyn AnalysisPort> = adapter;
            Some((chat, analysis))
        }
        AiProvider::OpenAi => {
            let adapter = Arc::new(OpenAiAdapter::new(
                cfg.ai_api_url_or_default(),
                key,
                cfg.ai_vision_model_or_default(),
            ));
            let chat: Arc<dyn ChatPort> = adapter.clone();
            let analysis: Arc<dyn AnalysisPort> = adapter;
            Some((chat, analysis))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    // Only a structural problem (unreadable IASO_CONFIG file, bad enum value) fails here.
    let cfg = AppConfig::load().context("failed to load configuration")?;

    // --- AI: live provider when a key is present, demo responder otherwise ---
    let demo = Arc::new(DemoAdapter::with_delay(cfg.demo_delay_ms_or_default()));
    let (live_chat, analysis): (Option<Arc<dyn ChatPort>>, Arc<dyn AnalysisPort>) =
        match live_ai(&cfg) {
            Some((chat, analysis)) => {
                info!(provider = ?cfg.ai_provider_or_default(), model = %cfg.ai_model_or_default(), "AI: live");
                (Some(chat), analysis)
            }
            None => {
                info!("AI: demo mode (no API key configured)");
                let analysis: Arc<dyn AnalysisPort> = demo.clone();
                (None, analysis)
            }
        };
    let ai_mode = if live_chat.is_some() { "live" } else { "demo" };

    iaso_med::adapters::ui::init_ui(ai_mode);

    // --- Backend ---
    let (Some(url), Some(anon_key)) = (cfg.supabase_url(), cfg.supabase_anon_key()) else {
        anyhow::bail!("Set IASO_SUPABASE_URL and IASO_SUPABASE_ANON_KEY (env or .env)");
    };
    let client = Arc::new(SupabaseClient::new(url, anon_key));
    info!(url = %client.base_url(), bucket = %cfg.storage_bucket_or_default(), "backend configured");

    let auth: Arc<dyn AuthPort> = Arc::new(SupabaseAuth::new(Arc::clone(&client)));
    let records: Arc<dyn RecordStore> = Arc::new(SupabaseRecords::new(Arc::clone(&client)));
    let storage: Arc<dyn ObjectStore> = Arc::new(SupabaseStorage::new(
        Arc::clone(&client),
        cfg.storage_bucket_or_default(),
    ));

    // --- Use cases ---
    let session = Arc::new(Session::new(Arc::clone(&auth)));
    let auth_service = Arc::new(AuthService::new(auth, Arc::clone(&session)));
    let chat_service = Arc::new(ChatService::new(live_chat, demo));
    let report_service = Arc::new(ReportService::new(
        Arc::clone(&records),
        storage,
        analysis,
    ));
    let patient_service = Arc::new(PatientService::new(Arc::clone(&records)));
    let doctor_service = Arc::new(DoctorService::new(Arc::clone(&records)));
    let booking_service = Arc::new(BookingService::new(records));

    let tui = TuiInputPort::new(
        session,
        auth_service,
        chat_service,
        report_service,
        patient_service,
        doctor_service,
        booking_service,
    );
    tui.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    info!("bye");
    Ok(())
}

pub mod directory;
pub mod error;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod scraper;
pub mod settings;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use handlers::{
    get_group_schedule, get_teacher_schedule, healthz_live, healthz_ready, root, search_directory,
};
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::directory::Directory;
use crate::openapi::ApiDoc;
use crate::scraper::ScheduleScraper;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub scraper: Arc<ScheduleScraper>,
    pub directory: Arc<Directory>,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let directory = Directory::load(
        Path::new(&settings.groups_file),
        Path::new(&settings.staff_file),
    );
    let state = AppState {
        scraper: Arc::new(ScheduleScraper::new(
            settings.scraper_base_url.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )),
        directory: Arc::new(directory),
        settings,
    };

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting SSAU Timetable API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/api/schedule/group/{group_id}", get(get_group_schedule))
        .route("/api/schedule/teacher/{staff_id}", get(get_teacher_schedule))
        .route("/api/search", get(search_directory))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    // The browser frontend is served from another origin.
    router.layer(CorsLayer::permissive()).layer(trace_layer)
}

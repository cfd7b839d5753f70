use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

use doodh_daily_backend::db::Db;
use doodh_daily_backend::domain::clock::SystemClock;
use doodh_daily_backend::domain::holiday::CalendarificClient;
use doodh_daily_backend::domain::reminder::TracingNotifier;
use doodh_daily_backend::domain::{
    CalendarService, CostService, HolidayService, MarkingService, ReminderScheduler,
};
use doodh_daily_backend::rest::{self, AppState};
use doodh_daily_backend::store::LocalStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up database");
    let db = Db::init().await?;
    let store = LocalStore::new(db);

    let state = AppState {
        store: store.clone(),
        calendar: CalendarService::new(),
        marking: MarkingService::new(store.clone()),
        cost: CostService::new(store.clone()),
        holidays: HolidayService::new(
            store.clone(),
            Arc::new(CalendarificClient::from_env()),
            Arc::new(SystemClock),
        ),
        scheduler: ReminderScheduler::new(
            store.clone(),
            Arc::new(TracingNotifier::new(store.clone())),
        ),
    };

    // Re-arm the reminder loop if it was enabled before the last shutdown
    if store.notification_settings().await?.enabled {
        info!("Reminders enabled, arming the daily loop");
        state.scheduler.start();
    }

    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", rest::router(state))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

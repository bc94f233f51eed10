use std::net::SocketAddr;
use std::time::Duration;
use tokio::task;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seat_selection::{app, config::Config, AppState};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    if config.app.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!("Starting seat selection API, backend at {}", config.backend.base_url);

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port).parse()?;
    let app_state = AppState::new(config)?;

    // --- Start background tasks ---

    // Раз в минуту выбрасываем брошенные сессии выбора
    let selections = app_state.selections.clone();
    task::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            selections.purge_idle(chrono::Utc::now()).await;
        }
    });

    // --- Start the web server ---

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app(app_state).into_make_service()).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

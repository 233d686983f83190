use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weather_dashboard::config::Config;
use weather_dashboard::forecast::{metno::MetNoClient, ForecastProxy};
use weather_dashboard::geocode::{google::GoogleGeocoder, GeocodeProxy};
use weather_dashboard::routes::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Upstream clients
    let forecast = Arc::new(ForecastProxy::new(MetNoClient::new(&config)?));
    let geocode = Arc::new(GeocodeProxy::new(GoogleGeocoder::new(&config)?));

    let state = AppState { forecast, geocode };

    let app = create_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

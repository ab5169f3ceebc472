use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use folio::application::services::portfolio_service::PortfolioService;
use folio::config::ServiceConfig;
use folio::domain::errors::PortfolioError;
use folio::infrastructure::adapters::acquisition_publisher::{
    AcquisitionPublisher, HttpNotificationSink,
};
use folio::infrastructure::adapters::quote_feed::{QuoteCache, QuoteFeedActor};
use folio::infrastructure::persistence::query_store::QueryStoreProvider;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();
    info!("Portfolio service starting...");

    // Quote cache fed by the market-data websocket
    let quotes = Arc::new(QuoteCache::new());
    let feed_shutdown = QuoteFeedActor::spawn(
        config.feed_url.clone(),
        config.feed_symbols.clone(),
        quotes.clone(),
    );

    // Fire-and-forget notification of completed purchases
    let sink = Arc::new(HttpNotificationSink::new(config.notice_endpoint.clone()));
    let publisher = AcquisitionPublisher::spawn(sink, config.publisher_capacity);

    // Read-model store and projector
    let provider = QueryStoreProvider::new(config.projection_capacity);
    let (queries, projection_tx) = provider.initialize().await;

    let service = Arc::new(PortfolioService::new(
        quotes,
        publisher,
        queries,
        projection_tx,
    ));

    let app = Router::new()
        .route("/ready", get(ready))
        .route("/portfolio", post(create_portfolio))
        .route("/portfolio/:id", get(get_portfolio).post(acquire_stock))
        .route("/stocks", get(get_stocks))
        .route("/stocks/:symbol", get(get_stock))
        .layer(TraceLayer::new_for_http())
        .with_state(service.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    let shutdown_signal = async {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutting down gracefully...");
    let _ = feed_shutdown.send(());
    service.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

#[derive(Debug, Deserialize)]
struct CreatePortfolioRequest {
    owner: String,
}

#[derive(Debug, Deserialize)]
struct AcquireStockRequest {
    symbol: String,
    amount: f64,
}

fn error_response(error: PortfolioError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &error {
        PortfolioError::PortfolioNotFound(_) | PortfolioError::QuoteUnavailable { .. } => {
            StatusCode::NOT_FOUND
        }
        PortfolioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": error })))
}

/// Readiness probe
async fn ready() -> StatusCode {
    StatusCode::OK
}

/// Create a new portfolio; the Location header points at the new resource
async fn create_portfolio(
    State(service): State<Arc<PortfolioService>>,
    Json(body): Json<CreatePortfolioRequest>,
) -> impl IntoResponse {
    match service.create_portfolio(&body.owner).await {
        Ok(snapshot) => {
            let location = format!("/portfolio/{}", snapshot.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(serde_json::json!(snapshot)),
            )
                .into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

/// Retrieve the current read-model view of a portfolio
async fn get_portfolio(
    State(service): State<Arc<PortfolioService>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match service.portfolio_of(&id).await {
        Ok(snapshot) => Json(serde_json::json!(snapshot)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Buy stock into an existing portfolio at the currently cached quote
async fn acquire_stock(
    State(service): State<Arc<PortfolioService>>,
    Path(id): Path<String>,
    Json(body): Json<AcquireStockRequest>,
) -> impl IntoResponse {
    match service.acquire_stock(&id, &body.symbol, body.amount).await {
        Ok(snapshot) => Json(serde_json::json!(snapshot)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Latest cached quote for one symbol
async fn get_stock(
    State(service): State<Arc<PortfolioService>>,
    Path(symbol): Path<String>,
) -> impl IntoResponse {
    match service.quote(&symbol).await {
        Ok(quote) => Json(serde_json::json!(quote)).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// All currently cached quotes
async fn get_stocks(State(service): State<Arc<PortfolioService>>) -> impl IntoResponse {
    Json(serde_json::json!(service.quotes().await))
}

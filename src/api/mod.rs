//! HTTP surface for the reader frontend plus the background refresh
//! loop that keeps the article store warm while serving.

pub mod handlers;

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::NewsflowResult;
use crate::services::{DraftExportService, FeedService, ImportExportService};

/// Shared handler state. Clones all point at the same registry and
/// article store.
#[derive(Clone)]
pub struct AppState {
    pub service: FeedService,
    pub importer: ImportExportService,
    pub drafts: DraftExportService,
}

impl AppState {
    pub fn new(service: FeedService) -> Self {
        let importer = ImportExportService::new(service.clone());
        Self {
            service,
            importer,
            drafts: DraftExportService::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/articles", get(handlers::list_articles))
        .route(
            "/api/sources",
            get(handlers::list_sources)
                .post(handlers::add_source)
                .delete(handlers::remove_source),
        )
        .route("/api/sources/validate", post(handlers::validate_source))
        .route("/api/sources/import-opml", post(handlers::import_opml))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/drafts/export", post(handlers::export_draft))
        .layer(cors)
        .with_state(state)
}

/// Binds the listener and serves until shutdown. The refresh loop's
/// first tick fires immediately, so startup also populates the store.
pub async fn serve(config: Config, state: AppState) -> NewsflowResult<()> {
    spawn_refresh_loop(state.service.clone(), config.fetch_interval_secs);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Serving API");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn spawn_refresh_loop(service: FeedService, interval_secs: u64) {
    tokio::spawn(async move {
        // interval panics on a zero period
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let worker = service.clone();
            match tokio::task::spawn_blocking(move || worker.fetch_all_feeds()).await {
                Ok(results) => {
                    let saved: usize = results.iter().map(|(_, count)| count).sum();
                    info!(new_articles = saved, "Background refresh finished");
                }
                Err(err) => warn!(error = %err, "Background refresh task failed"),
            }
        }
    });
}

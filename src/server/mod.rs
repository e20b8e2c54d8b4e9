//! HTTP surface: one route group per provider.
//!
//! - `GET /` lists the provider names
//! - `GET /<provider>/` lists fund slugs
//! - `GET /<provider>/{fund_name}?page=N` lists quotes

pub mod error;

use crate::core::Quote;
use crate::providers::SharedProvider;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use error::ApiError;
use serde::Deserialize;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
pub struct QuotesQuery {
    pub page: Option<i64>,
}

pub fn router(providers: &[SharedProvider]) -> Router {
    let names: Vec<&'static str> = providers.iter().map(|p| p.name()).collect();
    let mut app = Router::new().route("/", get(move || async move { Json(names) }));

    for provider in providers {
        let name = provider.name();
        let group = Router::new()
            .route(&format!("/{name}"), get(list_funds))
            .route(&format!("/{name}/"), get(list_funds))
            .route(&format!("/{name}/{{fund_name}}"), get(list_quotes))
            .with_state(provider.clone());
        app = app.merge(group);
    }

    app.layer(TraceLayer::new_for_http())
}

async fn list_funds(State(provider): State<SharedProvider>) -> Result<Json<Vec<String>>, ApiError> {
    let funds = provider.list_funds().await?;
    Ok(Json(funds.into_iter().map(|f| f.name).collect()))
}

async fn list_quotes(
    State(provider): State<SharedProvider>,
    Path(fund_name): Path<String>,
    Query(query): Query<QuotesQuery>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    debug!(provider = provider.name(), fund = %fund_name, page = ?query.page, "Listing quotes");
    let quotes = provider.list_quotes(&fund_name, query.page).await?;
    Ok(Json(quotes))
}

pub async fn serve(addr: SocketAddr, providers: Vec<SharedProvider>) -> Result<()> {
    let app = router(&providers);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

//! HTTP surface: `GET /` ranked stashpoint search and `GET /health`.

mod error;
mod params;

pub use error::{ApiError, ValidationError};
pub use params::{SearchParams, parse_iso_datetime};

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::engine;
use crate::model::SearchResult;
use crate::observability::SEARCHES_TOTAL;
use crate::store::{InMemoryStore, ReservationProvider, ResourceProvider};

#[derive(Clone)]
pub struct AppState {
    pub resources: Arc<dyn ResourceProvider>,
    pub reservations: Arc<dyn ReservationProvider>,
}

impl AppState {
    pub fn new(resources: Arc<dyn ResourceProvider>, reservations: Arc<dyn ReservationProvider>) -> Self {
        Self {
            resources,
            reservations,
        }
    }

    /// One store serving both provider roles.
    pub fn from_store(store: Arc<InMemoryStore>) -> Self {
        Self::new(store.clone(), store)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(search_stashpoints))
        .route("/health", get(health))
        .with_state(state)
}

async fn search_stashpoints(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let request = match SearchParams::from_pairs(pairs).into_request() {
        Ok(request) => request,
        Err(e) => {
            metrics::counter!(SEARCHES_TOTAL, "status" => "invalid").increment(1);
            return Err(e.into());
        }
    };

    match engine::search(&request, state.resources.as_ref(), state.reservations.as_ref()).await {
        Ok(results) => {
            metrics::counter!(SEARCHES_TOTAL, "status" => "ok").increment(1);
            Ok(Json(results))
        }
        Err(e) => {
            metrics::counter!(SEARCHES_TOTAL, "status" => "error").increment(1);
            Err(e.into())
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

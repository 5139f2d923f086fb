//! HTTP surface for the review scraper.
//!
//! Two routes: `GET /` returns a static welcome payload, `POST /scrape`
//! runs one full browser session for the requested game and merges the
//! results into the JSON stores before responding.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use vaporview_scraper::{ReviewScraper, ScrapeError};
use vaporview_store::ReviewStore;

/// Shared application state behind every handler.
///
/// The store sits behind a mutex so concurrent requests serialize their
/// read-modify-write of the JSON files.
pub struct AppState {
    pub scraper: Arc<dyn ReviewScraper>,
    pub store: Mutex<ReviewStore>,
}

/// Build the service router over the given state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/scrape", post(scrape))
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the storefront review scraper API. \
                    Use POST /scrape with a JSON body containing 'game_name'."
    }))
}

#[derive(Debug, Deserialize)]
struct ScrapeRequest {
    game_name: String,
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Response {
    // Any malformed or incomplete body is the caller's problem, reported
    // uniformly; axum's default 422 does not match this API's contract.
    let Ok(Json(request)) = payload else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Missing 'game_name' in JSON body".to_string(),
        );
    };

    info!(target: "api.scrape", game = %request.game_name, "scrape requested");
    let outcome = match state.scraper.scrape(&request.game_name).await {
        Ok(outcome) => outcome,
        Err(err) => return scrape_failure(err),
    };

    // A failed session has already returned; only full results are persisted.
    {
        let store = state.store.lock().await;
        if let Err(err) = store.merge_reviews(&request.game_name, &outcome.reviews) {
            error!(target: "api.scrape", error = %err, "catalog update failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Exception occurred: {err}"),
            );
        }
        if let Some(url) = &outcome.image_url {
            if let Err(err) = store.record_image(url) {
                error!(target: "api.scrape", error = %err, "image registry update failed");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Exception occurred: {err}"),
                );
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "game_name": request.game_name,
            "image_url": outcome.image_url,
            "reviews": outcome.reviews,
        })),
    )
        .into_response()
}

fn scrape_failure(err: ScrapeError) -> Response {
    match err {
        ScrapeError::ReviewSectionMissing | ScrapeError::BrowseAllMissing => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        ScrapeError::Session(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Exception occurred: {e}"),
        ),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

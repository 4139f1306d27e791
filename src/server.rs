//! HTTP Server - Serves race comparisons via REST API
//!
//! Endpoints:
//! - GET /api/health                   → "ok"
//! - GET /api/events                   → Event names (fresh scan)
//! - GET /api/events/:event/variants   → Variants of one event
//! - GET /api/compare?event_a=..&variant_a=..&event_b=..&variant_b=..&metric=..
//!                                     → Joined rows, deltas and tornado layout

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::compare::{Comparison, Metric, Selection};
use crate::error::{CompareError, Notice, Side};
use crate::state::AppState;
use crate::tornado::TornadoChart;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    tracing::debug!("CORS layer configured: allow_origin=Any");

    let api = Router::new()
        .route("/health", get(health))
        .route("/events", get(list_events))
        .route("/events/:event/variants", get(list_variants))
        .route("/compare", get(compare))
        .with_state(state);

    Router::new().nest("/api", api).layer(cors)
}

/// Start the HTTP server
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    tracing::info!("Initializing HTTP server on port {}", port);
    let data_dir = state.data_dir().to_path_buf();
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting server on http://localhost:{}", port);
    tracing::info!("  API: http://localhost:{}/api/events", port);
    tracing::info!("  Data root: {:?}", data_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server bound to {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error body for failed requests
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    side: Option<Side>,
}

/// Comparison failure mapped to a status code and JSON body
struct ApiError(CompareError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CompareError::DataLoad { .. } if self.0.is_missing_file() => StatusCode::NOT_FOUND,
            CompareError::DataLoad { .. }
            | CompareError::Schema { .. }
            | CompareError::DuplicateBin { .. }
            | CompareError::InvalidSelection { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        tracing::warn!(status = %status, "Comparison failed: {}", self.0);
        let body = ErrorResponse {
            error: self.0.user_message(),
            side: Some(self.0.side()),
        };
        (status, Json(body)).into_response()
    }
}

fn internal_error(e: tokio::task::JoinError) -> Response {
    tracing::error!("Blocking task failed: {}", e);
    let body = ErrorResponse {
        error: "internal error".to_string(),
        side: None,
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    "ok"
}

#[derive(Serialize)]
struct EventsResponse {
    events: Vec<String>,
    scanned_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

/// GET /api/events - Fresh scan of the data root
async fn list_events(State(state): State<AppState>) -> Response {
    tracing::info!("GET /api/events");
    let catalog = match tokio::task::spawn_blocking(move || state.catalog()).await {
        Ok(catalog) => catalog,
        Err(e) => return internal_error(e),
    };

    let notice = catalog.is_empty().then(|| {
        tracing::info!("Catalog is empty");
        Notice::CatalogEmpty.message().to_string()
    });
    tracing::debug!("Returning {} events", catalog.len());
    Json(EventsResponse {
        events: catalog.list_events(),
        scanned_at: Utc::now(),
        notice,
    })
    .into_response()
}

#[derive(Serialize)]
struct VariantsResponse {
    event: String,
    variants: Vec<String>,
}

/// GET /api/events/:event/variants
async fn list_variants(State(state): State<AppState>, Path(event): Path<String>) -> Response {
    tracing::info!("GET /api/events/{}/variants", event);
    let lookup = event.clone();
    let variants = match tokio::task::spawn_blocking(move || state.list_variants(&lookup)).await {
        Ok(variants) => variants,
        Err(e) => return internal_error(e),
    };

    if variants.is_empty() {
        tracing::warn!("Event '{}' not found", event);
        let body = ErrorResponse {
            error: format!("no race data for event '{}'", event),
            side: None,
        };
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }
    Json(VariantsResponse { event, variants }).into_response()
}

/// Query params for the compare endpoint
#[derive(Deserialize)]
struct CompareQuery {
    event_a: String,
    variant_a: String,
    event_b: String,
    variant_b: String,
    #[serde(default)]
    metric: Metric,
}

#[derive(Serialize)]
struct CompareResponse {
    comparison: Comparison,
    chart: TornadoChart,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

/// GET /api/compare
async fn compare(State(state): State<AppState>, Query(params): Query<CompareQuery>) -> Response {
    tracing::info!(
        "GET /api/compare {}/{} vs {}/{} metric={:?}",
        params.event_a,
        params.variant_a,
        params.event_b,
        params.variant_b,
        params.metric
    );

    let a = Selection::new(params.event_a, params.variant_a);
    let b = Selection::new(params.event_b, params.variant_b);
    let metric = params.metric;
    let config = state.config.clone();

    let result = match tokio::task::spawn_blocking(move || state.compare(&a, &b, metric)).await {
        Ok(result) => result,
        Err(e) => return internal_error(e),
    };
    let comparison = match result {
        Ok(comparison) => comparison,
        Err(e) => return ApiError(e).into_response(),
    };

    let chart = TornadoChart::build(&comparison, &config);
    let notice = comparison.notice().map(|n| n.message().to_string());
    tracing::info!("Compared {} bins", comparison.rows.len());
    Json(CompareResponse {
        comparison,
        chart,
        notice,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn fixture() -> (TempDir, Router) {
        let dir = tempdir().unwrap();
        let files = [
            ("lavaredo/2024.csv", "Bin,sort,Distance_km,Percentage\n0-5%,1,10.0,40\n5-10%,2,15.0,60\n"),
            ("utmb/2023.csv", "Bin,sort,Distance_km,Percentage\n0-5%,1,12.5,45\n5-10%,2,15.3,55\n"),
            ("utmb/broken.csv", "Bin,Distance_km\n0-5%,1\n"),
        ];
        for (rel, body) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        let state = AppState::new(Config::default(), dir.path().to_path_buf());
        (dir, router(state))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_events_and_variants() {
        let (_dir, app) = fixture();
        let (status, json) = get_json(app.clone(), "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["events"], serde_json::json!(["lavaredo", "utmb"]));
        assert!(json.get("notice").is_none());

        let (status, json) = get_json(app.clone(), "/api/events/utmb/variants").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["variants"], serde_json::json!(["2023", "broken"]));

        let (status, _) = get_json(app, "/api/events/nope/variants").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_catalog_notice() {
        let dir = tempdir().unwrap();
        let app = router(AppState::new(Config::default(), dir.path().join("missing")));
        let (status, json) = get_json(app, "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["events"], serde_json::json!([]));
        assert!(json["notice"].is_string());
    }

    #[tokio::test]
    async fn test_compare_endpoint() {
        let (_dir, app) = fixture();
        let uri = "/api/compare?event_a=lavaredo&variant_a=2024&event_b=utmb&variant_b=2023&metric=percentage";
        let (status, json) = get_json(app, uri).await;
        assert_eq!(status, StatusCode::OK);

        let rows = json["comparison"]["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["bin"], "0-5%");
        assert_eq!(rows[0]["delta"], 5.0);
        assert_eq!(json["chart"]["deltas"][0]["text"], "+5.0%");
        assert_eq!(json["chart"]["deltas"][1]["tone"], "a_exceeds");
    }

    #[tokio::test]
    async fn test_compare_errors() {
        let (_dir, app) = fixture();
        let (status, json) = get_json(
            app.clone(),
            "/api/compare?event_a=lavaredo&variant_a=2024&event_b=utmb&variant_b=2022",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["side"], "B");
        assert!(json["error"].as_str().unwrap().contains("2022.csv"));

        let (status, json) = get_json(
            app,
            "/api/compare?event_a=utmb&variant_a=broken&event_b=utmb&variant_b=2023",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["side"], "A");
    }
}

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use hyper::StatusCode;
use hyper::header;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use super::AppState;
use super::middleware;
use crate::langflow::ExtractedAnswer;
use crate::prompts::{MacroForm, PlanForm, ValidationError};

pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route(
        "/",
        get(|| async {
            Json(json!({
                "status": "ok",
            }))
        }),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .nest("/health", health_routes)
        .nest("/api", api_router())
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::strip_trailing_slash))
        .layer(axum::middleware::from_fn(
            middleware::enrich_current_span_middleware,
        ))
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/macros", post(recommend_macros))
        .route("/plan", post(personalized_plan))
}

async fn not_found(req: axum::extract::Request) -> impl IntoResponse {
    tracing::warn!("unhandled path: {}", req.uri());
    (StatusCode::NOT_FOUND, "Not Found")
}

/// POST /api/macros — diet macro recommendation panel.
#[tracing::instrument(skip_all)]
pub(crate) async fn recommend_macros(
    State(state): State<AppState>,
    Json(form): Json<MacroForm>,
) -> impl IntoResponse {
    answer_response(state.coach.recommend_macros(&form).await)
}

/// POST /api/plan — personalized workout and diet plan panel.
#[tracing::instrument(skip_all)]
pub(crate) async fn personalized_plan(
    State(state): State<AppState>,
    Json(form): Json<PlanForm>,
) -> impl IntoResponse {
    answer_response(state.coach.personalized_plan(&form).await)
}

/// Extraction errors are answers too and go out with 200; only a blank
/// form is rejected.
fn answer_response(result: Result<ExtractedAnswer, ValidationError>) -> axum::response::Response {
    match result {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => {
            tracing::info!(error = %e, "rejected form");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

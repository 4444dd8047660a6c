use crate::errors::AppError;
use crate::services::MemberService;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Member operations over the local mirror and MailChimp.
    pub members: MemberService,
}

/// Request body as a loose mapping. A missing or unparseable body is treated
/// as an empty payload, so it fails validation instead of extraction.
type Payload = Option<Json<Map<String, Value>>>;

fn into_map(payload: Payload) -> Map<String, Value> {
    payload.map(|Json(map)| map).unwrap_or_default()
}

/// Builds the application router (without rate limiting or CORS).
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/mailchimp", member_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub fn member_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/lists/:list_id/members",
            post(create_member).get(show_all_members),
        )
        .route(
            "/lists/:list_id/members/:member_id",
            get(show_member).put(update_member).delete(remove_member),
        )
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "mailchimp-member-sync",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /mailchimp/lists/:list_id/members
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<String>,
    payload: Payload,
) -> Result<Json<Value>, AppError> {
    let member = state.members.create(&list_id, &into_map(payload)).await?;
    Ok(Json(member))
}

/// PUT /mailchimp/lists/:list_id/members/:member_id
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path((list_id, member_id)): Path<(String, String)>,
    payload: Payload,
) -> Result<Json<Value>, AppError> {
    let member = state
        .members
        .update(&list_id, &member_id, &into_map(payload))
        .await?;
    Ok(Json(member))
}

/// GET /mailchimp/lists/:list_id/members/:member_id
///
/// Responds with MailChimp's representation, not the local mirror.
pub async fn show_member(
    State(state): State<Arc<AppState>>,
    Path((list_id, member_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.members.show(&list_id, &member_id).await?))
}

/// GET /mailchimp/lists/:list_id/members
pub async fn show_all_members(
    State(state): State<Arc<AppState>>,
    Path(list_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.members.show_all(&list_id).await?))
}

/// DELETE /mailchimp/lists/:list_id/members/:member_id
pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((list_id, member_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    state.members.remove(&list_id, &member_id).await?;
    Ok(Json(json!({})))
}

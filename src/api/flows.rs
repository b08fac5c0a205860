/// Flow lifecycle REST API endpoints
///
/// Listing, creating, opening and deleting named flows. Opening or creating a
/// flow replaces the session's open document.

use crate::api::{error_status, AppState};
use crate::session::{OpenDocument, SessionStatus};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Request body for flow creation
#[derive(Debug, Deserialize)]
pub struct CreateFlowRequest {
    pub name: String,
}

/// Response for flow create/delete operations
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub name: String,
    pub message: String,
}

pub fn create_flow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flows", get(list_flows))
        .route("/api/flows", post(create_flow))
        .route("/api/flows/{name}/open", post(open_flow))
        .route("/api/flows/{name}", delete(delete_flow))
        .route("/api/session/status", get(session_status))
}

/// List stored flows
///
/// GET /api/flows
/// Returns: { "flows": ["checkout", "onboarding"] }
async fn list_flows(State(state): State<AppState>) -> Json<Value> {
    let flows = state.session.refresh_list().await;
    Json(json!({ "flows": flows.as_slice() }))
}

/// Create an empty flow and make it current
///
/// POST /api/flows
/// Body: { "name": "My Flow" }  (stored as "my-flow")
async fn create_flow(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlowRequest>,
) -> Result<(StatusCode, Json<FlowResponse>), StatusCode> {
    let name = state
        .session
        .create_flow(&payload.name)
        .await
        .map_err(|e| error_status("Create flow", &e))?;

    Ok((
        StatusCode::CREATED,
        Json(FlowResponse {
            message: format!("Flow '{}' created", name),
            name,
        }),
    ))
}

/// Load a stored flow as the open document
///
/// POST /api/flows/{name}/open
/// 404 when the store has no such flow, 422 when it does not decode
async fn open_flow(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<OpenDocument>, StatusCode> {
    state
        .session
        .load_flow(&name)
        .await
        .map(Json)
        .map_err(|e| error_status("Open flow", &e))
}

/// Delete a stored flow; closes it if it is open
///
/// DELETE /api/flows/{name}
async fn delete_flow(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<FlowResponse> {
    state.session.delete_flow(&name).await;
    Json(FlowResponse {
        message: format!("Flow '{}' deleted", name),
        name,
    })
}

/// GET /api/session/status
async fn session_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.session.status().await)
}

/// Document REST API endpoints
///
/// Every mutation is applied to the session's open flow and then picked up by
/// autosave. Edits require an open flow (409 otherwise).

use crate::api::{error_status, AppState};
use crate::flow::{
    index::{filter_by_category, module_categories},
    Connection, Edge, EdgePatch, LinkedSubModule, ModuleView, Node, NodeKind, NodePatch,
    Position, SubModule, SubModulePatch, View,
};
use crate::session::OpenDocument;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ArrangeRequest {
    pub view: View,
}

/// Request body for dropping a node onto the canvas
#[derive(Debug, Deserialize)]
pub struct AddNodeRequest {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

impl CategoryQuery {
    /// The requested category; `?category=` with a blank value means no filter
    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
    }
}

pub fn create_document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/document", get(get_document))
        .route("/api/document/arrange", post(arrange))
        .route("/api/document/nodes", post(add_node))
        .route("/api/document/nodes/{id}/position", put(move_node))
        .route(
            "/api/document/nodes/{id}",
            axum::routing::patch(update_node).delete(delete_node),
        )
        .route("/api/document/edges", post(connect))
        .route(
            "/api/document/edges/{id}",
            axum::routing::patch(update_edge).delete(delete_edge),
        )
        .route("/api/document/modules", get(list_modules))
        .route("/api/document/modules/{id}/submodules", post(add_submodule))
        .route("/api/document/submodules", get(list_submodules))
        .route(
            "/api/document/submodules/{id}",
            axum::routing::patch(update_submodule).delete(delete_submodule),
        )
        .route("/api/document/submodules/{id}/steps", post(add_step))
        .route(
            "/api/document/submodules/{id}/steps/{index}",
            put(update_step),
        )
        .route("/api/document/actions/{id}/link", get(action_link))
}

/// GET /api/document
async fn get_document(State(state): State<AppState>) -> Json<OpenDocument> {
    Json(state.session.document().await)
}

/// Re-lay out one view
///
/// POST /api/document/arrange
/// Body: { "view": "process" }
/// Returns: { "view": "process", "direction": "vertical" }  (direction null for modules)
async fn arrange(
    State(state): State<AppState>,
    Json(payload): Json<ArrangeRequest>,
) -> Result<Json<Value>, StatusCode> {
    let direction = state
        .session
        .arrange(payload.view)
        .await
        .map_err(|e| error_status("Arrange", &e))?;

    tracing::info!("Arranged {:?} view", payload.view);
    Ok(Json(json!({ "view": payload.view, "direction": direction })))
}

/// POST /api/document/nodes
/// Body: { "type": "action", "position": { "x": 10, "y": 20 } }
async fn add_node(
    State(state): State<AppState>,
    Json(payload): Json<AddNodeRequest>,
) -> Result<(StatusCode, Json<Node>), StatusCode> {
    let node = state
        .session
        .edit(|editor| editor.add_node(payload.kind, payload.position))
        .await
        .map_err(|e| error_status("Add node", &e))?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// PUT /api/document/nodes/{id}/position
/// Body: { "x": 0, "y": 0 }
async fn move_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(position): Json<Position>,
) -> Result<StatusCode, StatusCode> {
    state
        .session
        .edit(|editor| editor.move_node(&id, position))
        .await
        .map_err(|e| error_status("Move node", &e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/document/nodes/{id}
/// Body: any of { label, description, category, status, deprecated, subModuleId }
async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<NodePatch>,
) -> Result<Json<Node>, StatusCode> {
    state
        .session
        .edit(|editor| editor.update_node(&id, patch))
        .await
        .map(Json)
        .map_err(|e| error_status("Update node", &e))
}

/// DELETE /api/document/nodes/{id}
async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Node>, StatusCode> {
    state
        .session
        .edit(|editor| editor.delete_node(&id))
        .await
        .map(Json)
        .map_err(|e| error_status("Delete node", &e))
}

/// POST /api/document/edges
/// Body: { "source": "node-1", "target": "node-2", "sourceHandle": "bottom", "targetHandle": "top" }
async fn connect(
    State(state): State<AppState>,
    Json(connection): Json<Connection>,
) -> Result<Json<Edge>, StatusCode> {
    state
        .session
        .edit(|editor| editor.connect(connection))
        .await
        .map(Json)
        .map_err(|e| error_status("Connect", &e))
}

/// PATCH /api/document/edges/{id}
/// Body: any of { label, status }
async fn update_edge(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EdgePatch>,
) -> Result<Json<Edge>, StatusCode> {
    state
        .session
        .edit(|editor| editor.update_edge(&id, patch))
        .await
        .map(Json)
        .map_err(|e| error_status("Update edge", &e))
}

/// DELETE /api/document/edges/{id}
async fn delete_edge(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Edge>, StatusCode> {
    state
        .session
        .edit(|editor| editor.delete_edge(&id))
        .await
        .map(Json)
        .map_err(|e| error_status("Delete edge", &e))
}

/// Modules with computed status, optionally filtered by category
///
/// GET /api/document/modules?category=billing
/// Returns: { "categories": [...], "modules": [...] }
async fn list_modules(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Json<Value> {
    let body = state
        .session
        .inspect(|editor| {
            let modules = &editor.document().modules.nodes;
            let views: Vec<ModuleView> = filter_by_category(modules, query.category())
                .into_iter()
                .map(ModuleView::from)
                .collect();
            json!({
                "categories": module_categories(modules),
                "modules": views,
            })
        })
        .await;
    Json(body)
}

/// POST /api/document/modules/{id}/submodules
async fn add_submodule(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> Result<(StatusCode, Json<SubModule>), StatusCode> {
    let submodule = state
        .session
        .edit(|editor| editor.add_submodule(&module_id))
        .await
        .map_err(|e| error_status("Add sub-module", &e))?;
    Ok((StatusCode::CREATED, Json(submodule)))
}

/// Every sub-module with its parent module
///
/// GET /api/document/submodules
async fn list_submodules(State(state): State<AppState>) -> Json<Vec<LinkedSubModule>> {
    Json(state.session.submodule_index().entries().to_vec())
}

/// PATCH /api/document/submodules/{id}
/// Body: any of { label, description, status }
async fn update_submodule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<SubModulePatch>,
) -> Result<Json<SubModule>, StatusCode> {
    state
        .session
        .edit(|editor| editor.update_submodule(&id, patch))
        .await
        .map(Json)
        .map_err(|e| error_status("Update sub-module", &e))
}

/// DELETE /api/document/submodules/{id}
async fn delete_submodule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SubModule>, StatusCode> {
    state
        .session
        .edit(|editor| editor.delete_submodule(&id))
        .await
        .map(Json)
        .map_err(|e| error_status("Delete sub-module", &e))
}

/// POST /api/document/submodules/{id}/steps
/// Body: { "text": "Validate card" }
async fn add_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StepRequest>,
) -> Result<Json<SubModule>, StatusCode> {
    state
        .session
        .edit(|editor| editor.add_step(&id, &payload.text))
        .await
        .map(Json)
        .map_err(|e| error_status("Add step", &e))
}

/// PUT /api/document/submodules/{id}/steps/{index}
/// Body: { "text": "..." }  (empty text removes the step)
async fn update_step(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    Json(payload): Json<StepRequest>,
) -> Result<Json<SubModule>, StatusCode> {
    state
        .session
        .edit(|editor| editor.update_step(&id, index, &payload.text))
        .await
        .map(Json)
        .map_err(|e| error_status("Update step", &e))
}

/// Resolve an action node's sub-module link
///
/// GET /api/document/actions/{id}/link
/// Returns the linked sub-module, or null when unlinked or dangling
async fn action_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<LinkedSubModule>>, StatusCode> {
    let link = state
        .session
        .inspect(|editor| {
            editor
                .document()
                .all_nodes()
                .find(|n| n.id == id)
                .map(|n| (n.kind.clone(), n.data.sub_module_id.clone()))
        })
        .await;

    match link {
        None => Err(StatusCode::NOT_FOUND),
        Some((kind, _)) if kind != NodeKind::Action => Err(StatusCode::BAD_REQUEST),
        Some((_, target)) => Ok(Json(
            state
                .session
                .submodule_index()
                .resolve(target.as_deref())
                .cloned(),
        )),
    }
}

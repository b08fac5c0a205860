/// HTTP API Layer
///
/// This module provides the REST API the canvas client talks to:
/// - Flow lifecycle (list, create, open, delete) and session status
/// - Document reads and edits on the open flow
/// - Module catalog and sub-module link queries

// Flow lifecycle and session status endpoints
pub mod flows;

// Document editing and query endpoints
pub mod document;

pub use document::create_document_routes;
pub use flows::create_flow_routes;

use crate::flow::EditError;
use crate::session::{FlowSession, SessionError};
use crate::storage::FlowBackend;
use axum::http::StatusCode;
use std::sync::Arc;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// The single open-document session
    pub session: Arc<FlowSession<FlowBackend>>,
}

/// Map a session failure onto a response status, logging it on the way
pub(crate) fn error_status(context: &str, error: &SessionError) -> StatusCode {
    let status = match error {
        SessionError::Unreadable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::NoCurrentFlow | SessionError::FlowExists(_) => StatusCode::CONFLICT,
        SessionError::InvalidName(_) => StatusCode::BAD_REQUEST,
        SessionError::Edit(edit) => edit_status(edit),
    };

    if status.is_server_error() || status == StatusCode::UNPROCESSABLE_ENTITY {
        tracing::error!("{} failed: {}", context, error);
    } else {
        tracing::warn!("{} rejected: {}", context, error);
    }
    status
}

fn edit_status(error: &EditError) -> StatusCode {
    match error {
        EditError::NodeNotFound(_)
        | EditError::EdgeNotFound(_)
        | EditError::SubModuleNotFound(_) => StatusCode::NOT_FOUND,
        EditError::WrongKind { .. }
        | EditError::UnsupportedKind(_)
        | EditError::EmptyLabel
        | EditError::EmptyStep
        | EditError::StepOutOfRange { .. } => StatusCode::BAD_REQUEST,
        EditError::IdsExhausted(_) => StatusCode::CONFLICT,
    }
}

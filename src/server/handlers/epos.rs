//! ePOS-Print service endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::job::Outcome;
use crate::server::state::AppState;
use crate::soap::response::CONTENT_TYPE;

/// Run one SOAP print request.
///
/// If the client disconnects, this future is dropped. Jobs still waiting
/// for the printer are abandoned; a write already in progress finishes.
pub async fn print(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let reply = state.service.process(body.to_vec()).await;

    let status = match reply.outcome {
        Outcome::Printed => StatusCode::OK,
        Outcome::Rejected => StatusCode::BAD_REQUEST,
        Outcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], reply.body).into_response()
}

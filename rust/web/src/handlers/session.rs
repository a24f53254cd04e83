use super::{service_error, success_response};
use crate::service::GameService;
use athena_model::{SessionStart, SessionUpdate};
use chrono::Utc;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;

/// Lists every session with its active flag computed for the current time.
///
/// # HTTP Method and Path
/// - **Method**: GET
/// - **Path**: `/api/session`
///
/// # Response Format
/// - **Success (200 OK)**: JSON array of sessions. `isActive` is recomputed on
///   every call from `startDate` and `durationActive` (minutes) and is not
///   written back to the store.
pub async fn list_sessions(service: Arc<GameService>) -> Response {
    match service.list_sessions(Utc::now()).await {
        Ok(sessions) => success_response(StatusCode::OK, sessions),
        Err(err) => service_error(err),
    }
}

/// Starts a new session of a stored ruleset.
///
/// # HTTP Method and Path
/// - **Method**: POST
/// - **Path**: `/api/startsession`
///
/// # Request Format
/// ```json
/// { "ruleset": "<ruleset id>", "players": ["atla", "claudia"] }
/// ```
///
/// # Response Format
/// - **Success (200 OK)**: the new session, one player per name seeded with
///   the ruleset's stat defaults
/// - **Error (400 Bad Request)**: `ruleset_not_found`, nothing is written
/// - **Error (500)**: `storage_error`; a session whose usage increment failed
///   is removed again before this is returned
pub async fn start_session(service: Arc<GameService>, request: SessionStart) -> Response {
    match service.start_session(request, Utc::now()).await {
        Ok(session) => success_response(StatusCode::OK, session),
        Err(err) => service_error(err),
    }
}

/// Merges player stats into a stored session.
///
/// # HTTP Method and Path
/// - **Method**: PATCH
/// - **Path**: `/api/session/{id}`
///
/// # Request Format
/// ```json
/// { "players": [{ "name": "atla", "stats": { "playerLevel": 4 } }] }
/// ```
/// A full session body is accepted too; only `players` is read.
///
/// # Response Format
/// - **Success (200 OK)**: the JSON string `"session"`
/// - **Error (400 Bad Request)**: `session_not_found`, or `invalid_stats` when
///   a stat is unknown to the player or has the wrong type
pub async fn update_session(
    service: Arc<GameService>,
    session_id: String,
    update: SessionUpdate,
) -> Response {
    match service.update_session(&session_id, &update).await {
        Ok(_) => success_response(StatusCode::OK, "session"),
        Err(err) => service_error(err),
    }
}

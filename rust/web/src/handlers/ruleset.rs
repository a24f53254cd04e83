use super::{service_error, success_response};
use crate::service::GameService;
use athena_model::RulesetDraft;
use chrono::Utc;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;

/// Lists every stored ruleset.
///
/// # HTTP Method and Path
/// - **Method**: GET
/// - **Path**: `/api/ruleset`
///
/// # Response Format
/// - **Success (200 OK)**: JSON array of rulesets
/// - **Error (500)**: `storage_error` when the store query fails
pub async fn list_rulesets(service: Arc<GameService>) -> Response {
    match service.list_rulesets().await {
        Ok(rulesets) => success_response(StatusCode::OK, rulesets),
        Err(err) => service_error(err),
    }
}

/// Creates a ruleset from a client draft.
///
/// # HTTP Method and Path
/// - **Method**: POST
/// - **Path**: `/api/ruleset`
///
/// # Request Format
/// ```json
/// {
///   "game": "Munchkin",
///   "ruleset": "Classic",
///   "stats": [{ "name": "playerLevel", "label": "Player Level", "statType": "int", "defaultValue": 1 }],
///   "ranking": "{playerLevel} descending",
///   "winCondition": "{playerLevel} > 9"
/// }
/// ```
/// `statType` may be omitted when `defaultValue` is given and vice versa.
/// Any `id`, `dateCreated` or `usedInGames` in the body is ignored.
///
/// # Response Format
/// - **Success (200 OK)**: the stored ruleset including its generated id and creation time
/// - **Error (400 Bad Request)**: `invalid_stats` for duplicate names or mistyped defaults
/// - **Error (500)**: `storage_error` when the insert fails
pub async fn create_ruleset(service: Arc<GameService>, draft: RulesetDraft) -> Response {
    match service.create_ruleset(draft, Utc::now()).await {
        Ok(ruleset) => success_response(StatusCode::OK, ruleset),
        Err(err) => service_error(err),
    }
}

/// GET `/api/ruleset/{id}`. Malformed and unknown ids both answer 400
/// `ruleset_not_found` with message "no such ruleset id".
pub async fn get_ruleset(service: Arc<GameService>, ruleset_id: String) -> Response {
    match service.ruleset(&ruleset_id).await {
        Ok(ruleset) => success_response(StatusCode::OK, ruleset),
        Err(err) => service_error(err),
    }
}

pub mod ruleset;
pub mod session;

use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

pub use ruleset::{create_ruleset, get_ruleset, list_rulesets};
pub use session::{list_sessions, start_session, update_session};

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn service_error(err: crate::service::ServiceError) -> Response {
    use crate::errors::IntoErrorResponse;
    err.into_http_response()
}

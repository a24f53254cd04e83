use warp::http::StatusCode;
use warp::log::{Info, Log};

/// Request logging wrapper for the whole route tree.
///
/// Records method, path, status and processing time of every request,
/// including requests answered by rejection recovery.
pub fn request_logging() -> Log<impl Fn(Info<'_>) + Clone + Send + Sync + 'static> {
    warp::log::custom(|info: Info<'_>| {
        log_response(
            info.status(),
            info.path(),
            info.method().as_str(),
            info.elapsed().as_millis(),
        );
    })
}

/// Log response with status code
pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u128) {
    if status.is_client_error() {
        tracing::warn!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "client error"
        );
    } else if status.is_server_error() {
        tracing::error!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "server error"
        );
    } else {
        tracing::info!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "response sent"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;
    use warp::Filter;

    #[tokio::test]
    async fn test_request_logging_wrapper() {
        let subscriber = TestLogSubscriber::new();
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);

        let _guard = tracing::subscriber::set_default(registry);

        let route = warp::path!("api" / "ruleset")
            .and(warp::get())
            .map(|| warp::reply::json(&"success"))
            .with(request_logging());

        let response = warp::test::request()
            .method("GET")
            .path("/api/ruleset")
            .reply(&route)
            .await;

        assert_eq!(response.status(), StatusCode::OK);

        let entries = subscriber.entries();
        let entry = entries
            .iter()
            .find(|e| e.message.contains("response sent"))
            .expect("request logged");
        assert_eq!(entry.level, Level::INFO);
        assert_eq!(entry.field("path"), Some("/api/ruleset"));
        assert_eq!(entry.field("method"), Some("GET"));
        assert!(entry.field("duration_ms").is_some());
    }

    #[test]
    fn test_log_response_success() {
        let subscriber = TestLogSubscriber::new();
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);

        tracing::subscriber::with_default(registry, || {
            log_response(StatusCode::OK, "/api/session", "GET", 100);
        });

        let entries = subscriber.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::INFO);
        assert!(entries[0].message.contains("response sent"));
        assert_eq!(entries[0].field("status"), Some("200"));
    }

    #[test]
    fn test_log_response_client_error() {
        let subscriber = TestLogSubscriber::new();
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);

        tracing::subscriber::with_default(registry, || {
            log_response(StatusCode::BAD_REQUEST, "/api/ruleset/zzz", "GET", 50);
        });

        let entries = subscriber.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::WARN);
        assert!(entries[0].message.contains("client error"));
        assert_eq!(entries[0].field("status"), Some("400"));
    }

    #[test]
    fn test_log_response_server_error() {
        let subscriber = TestLogSubscriber::new();
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);

        tracing::subscriber::with_default(registry, || {
            log_response(StatusCode::INTERNAL_SERVER_ERROR, "/api/startsession", "POST", 200);
        });

        let entries = subscriber.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::ERROR);
        assert!(entries[0].message.contains("server error"));
        assert_eq!(entries[0].field("status"), Some("500"));
    }
}

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use mime_guess::{mime, MimeGuess};
use tokio::fs;
use warp::http::{header::HeaderValue, Response, StatusCode};
use warp::hyper::Body;

#[derive(Debug, thiserror::Error)]
pub enum StaticError {
    #[error("asset not found")]
    NotFound,
    #[error("asset io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves the web client from a local directory under `/app`.
#[derive(Debug, Clone)]
pub struct StaticHandler {
    root: Arc<PathBuf>,
    cache_header: HeaderValue,
}

impl StaticHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            cache_header: HeaderValue::from_static("public, max-age=86400"),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Serves `path` relative to the root; the empty path is `index.html`.
    pub async fn serve(&self, path: &str) -> Result<warp::reply::Response, StaticError> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            self.serve_relative("index.html").await
        } else {
            self.serve_relative(path).await
        }
    }

    pub fn error_response(&self, error: StaticError) -> warp::reply::Response {
        match error {
            StaticError::NotFound => Self::plain_response(StatusCode::NOT_FOUND, "Not Found"),
            StaticError::Io(err) => {
                tracing::error!(root = %self.root.display(), error = %err, "static asset read failed");
                Self::plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    fn plain_response(status: StatusCode, text: &'static str) -> warp::reply::Response {
        let mut response = Response::new(Body::from(text));
        *response.status_mut() = status;
        response.headers_mut().insert(
            warp::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        );
        response
    }

    async fn serve_relative(&self, relative: &str) -> Result<warp::reply::Response, StaticError> {
        let resolved = self.resolve(relative)?;
        let bytes = match fs::read(&resolved).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StaticError::NotFound)
            }
            // Directories and similar non-files
            Err(err) if resolved.is_dir() => {
                tracing::debug!(path = %resolved.display(), error = %err, "not a file");
                return Err(StaticError::NotFound);
            }
            Err(err) => return Err(StaticError::Io(err)),
        };

        let mime = MimeGuess::from_path(&resolved).first_or_octet_stream();
        Ok(self.build_response(bytes, mime))
    }

    fn build_response(&self, bytes: Vec<u8>, mime: mime::Mime) -> warp::reply::Response {
        let mut response = Response::new(Body::from(bytes));
        let mut content_type = mime.essence_str().to_string();
        if mime.type_() == mime::TEXT {
            content_type.push_str("; charset=utf-8");
        }

        response.headers_mut().insert(
            warp::http::header::CONTENT_TYPE,
            HeaderValue::from_str(&content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );
        response
            .headers_mut()
            .insert(warp::http::header::CACHE_CONTROL, self.cache_header.clone());
        response
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StaticError> {
        let mut buf = PathBuf::new();
        for comp in Path::new(path).components() {
            match comp {
                Component::Normal(seg) => buf.push(seg),
                Component::CurDir | Component::RootDir => {}
                Component::Prefix(_) | Component::ParentDir => return Err(StaticError::NotFound),
            }
        }

        if buf.as_os_str().is_empty() {
            return Err(StaticError::NotFound);
        }

        Ok(self.root.join(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_index_for_empty_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<h1>athena</h1>").expect("write index");
        let handler = StaticHandler::new(dir.path());

        let response = handler.serve("").await.expect("index");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[warp::http::header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn serves_nested_assets_with_guessed_type() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("js")).expect("mkdir");
        std::fs::write(dir.path().join("js/app.js"), "console.log(1)").expect("write js");
        let handler = StaticHandler::new(dir.path());

        let response = handler.serve("js/app.js").await.expect("asset");
        let content_type = response.headers()[warp::http::header::CONTENT_TYPE]
            .to_str()
            .expect("header")
            .to_string();
        assert!(content_type.contains("javascript"), "{content_type}");
    }

    #[tokio::test]
    async fn rejects_parent_traversal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handler = StaticHandler::new(dir.path());

        let result = handler.serve("../secret.txt").await;
        assert!(matches!(result, Err(StaticError::NotFound)));
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handler = StaticHandler::new(dir.path());

        let error = handler.serve("nope.css").await.expect_err("missing");
        let response = handler.error_response(error);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

use crate::errors;
use crate::handlers;
use crate::service::GameService;
use crate::static_handler::StaticHandler;
use crate::store::{MemoryStore, Store, StoreError};
use athena_model::{RulesetDraft, SessionStart, SessionUpdate};
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use warp::http::{Method, StatusCode};
use warp::reply::Response;
use warp::Filter;

/// Largest accepted JSON request body
const MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    static_dir: PathBuf,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: host.into(),
            port,
            static_dir: static_dir.into(),
        }
    }

    pub fn for_tests() -> Self {
        let dir = std::env::temp_dir().join("athena_web_static");
        Self::new("127.0.0.1", 0, dir)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }
}

/// Shared state handed to every route.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    service: Arc<GameService>,
    static_handler: Arc<StaticHandler>,
}

impl AppContext {
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        if !config.static_dir().exists() {
            tracing::warn!(
                static_dir = %config.static_dir().display(),
                "static directory missing, /app will answer 404"
            );
        }

        let static_handler = Arc::new(StaticHandler::new(config.static_dir().to_path_buf()));
        let service = Arc::new(GameService::new(store));

        Self {
            config,
            service,
            static_handler,
        }
    }

    /// Context over an empty in-memory store.
    pub fn new_for_tests() -> Self {
        Self::new(ServerConfig::for_tests(), Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<GameService> {
        Arc::clone(&self.service)
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.service.store()
    }

    pub fn static_handler(&self) -> Arc<StaticHandler> {
        Arc::clone(&self.static_handler)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        Self {
            context: AppContext::new(config, store),
        }
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let config = context.config().clone();
        let bind_addr = Self::bind_addr(&config)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context).with(crate::middleware::request_logging());
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        info!(address = %addr, "web server listening");

        let task = tokio::spawn(async move {
            server_future.await;
            Ok(())
        });

        Ok(ServerHandle::new(addr, shutdown_tx, task, context))
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        // The io error sits below hyper's own error in the chain
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
            source = cause.source();
        }

        ServerError::ConfigError(err.to_string())
    }

    /// The complete route tree: JSON API, web client, CORS preflight.
    ///
    /// Rejections are turned into responses here, so every response,
    /// errors included, carries `Access-Control-Allow-Origin: *`.
    pub fn routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let preflight = Self::preflight_route();
        let api_routes = Self::api_routes(context);
        let static_routes = Self::static_routes(context);

        preflight
            .or(api_routes)
            .unify()
            .or(static_routes)
            .unify()
            .recover(errors::handle_rejection)
            .unify()
            .map(allow_any_origin)
            .boxed()
    }

    fn preflight_route() -> BoxedFilter<(Response,)> {
        // Matching on the method by hand keeps unknown paths at 404 instead
        // of the 405 that `warp::options()` would contribute.
        warp::method()
            .and_then(|method: Method| async move {
                if method == Method::OPTIONS {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            })
            .untuple_one()
            .map(|| {
                let mut response = Response::default();
                *response.status_mut() = StatusCode::NO_CONTENT;
                let headers = response.headers_mut();
                headers.insert(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static("GET, POST, PATCH, OPTIONS"),
                );
                headers.insert(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("content-type"),
                );
                response
            })
            .boxed()
    }

    fn static_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let handler = context.static_handler();

        warp::path("app")
            .and(warp::path::tail())
            .and(warp::get())
            .and(Self::with_static_handler(handler))
            .and_then(
                |tail: warp::path::Tail, handler: Arc<StaticHandler>| async move {
                    let response = handler
                        .serve(tail.as_str())
                        .await
                        .unwrap_or_else(|err| handler.error_response(err));
                    Ok::<_, Infallible>(response)
                },
            )
            .boxed()
    }

    fn api_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let service = context.service();

        let list_rulesets = warp::path!("api" / "ruleset")
            .and(warp::get())
            .and(Self::with_service(service.clone()))
            .and_then(|service: Arc<GameService>| async move {
                Ok::<_, Infallible>(handlers::list_rulesets(service).await)
            });

        let create_ruleset = warp::path!("api" / "ruleset")
            .and(warp::post())
            .and(Self::with_service(service.clone()))
            .and(Self::json_body::<RulesetDraft>())
            .and_then(|service: Arc<GameService>, draft: RulesetDraft| async move {
                Ok::<_, Infallible>(handlers::create_ruleset(service, draft).await)
            });

        let get_ruleset = warp::path!("api" / "ruleset" / String)
            .and(warp::get())
            .and(Self::with_service(service.clone()))
            .and_then(|ruleset_id: String, service: Arc<GameService>| async move {
                Ok::<_, Infallible>(handlers::get_ruleset(service, ruleset_id).await)
            });

        let list_sessions = warp::path!("api" / "session")
            .and(warp::get())
            .and(Self::with_service(service.clone()))
            .and_then(|service: Arc<GameService>| async move {
                Ok::<_, Infallible>(handlers::list_sessions(service).await)
            });

        let start_session = warp::path!("api" / "startsession")
            .and(warp::post())
            .and(Self::with_service(service.clone()))
            .and(Self::json_body::<SessionStart>())
            .and_then(|service: Arc<GameService>, request: SessionStart| async move {
                Ok::<_, Infallible>(handlers::start_session(service, request).await)
            });

        let update_session = warp::path!("api" / "session" / String)
            .and(warp::patch())
            .and(Self::with_service(service))
            .and(Self::json_body::<SessionUpdate>())
            .and_then(
                |session_id: String, service: Arc<GameService>, update: SessionUpdate| async move {
                    Ok::<_, Infallible>(handlers::update_session(service, session_id, update).await)
                },
            );

        list_rulesets
            .or(create_ruleset)
            .unify()
            .or(get_ruleset)
            .unify()
            .or(list_sessions)
            .unify()
            .or(start_session)
            .unify()
            .or(update_session)
            .unify()
            .boxed()
    }

    fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
    where
        T: serde::de::DeserializeOwned + Send,
    {
        warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
    }

    fn with_static_handler(
        handler: Arc<StaticHandler>,
    ) -> impl Filter<Extract = (Arc<StaticHandler>,), Error = Infallible> + Clone {
        warp::any().map(move || handler.clone())
    }

    fn with_service(
        service: Arc<GameService>,
    ) -> impl Filter<Extract = (Arc<GameService>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&service))
    }
}

fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        info!(address = %self.addr, "web server stopped");
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

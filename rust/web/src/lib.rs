pub mod config;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod seed;
pub mod server;
pub mod service;
pub mod static_handler;
pub mod store;

pub use config::ServerArgs;
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use logging::{init_logging, LogEntry, TestLogSubscriber};
pub use middleware::{log_response, request_logging};
pub use seed::reset_and_seed;
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use service::{GameService, ServiceError};
pub use static_handler::{StaticError, StaticHandler};
pub use store::{MemoryStore, MongoStore, Store, StoreError, StoreKind};

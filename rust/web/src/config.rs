use crate::server::ServerConfig;
use crate::store::StoreKind;
use clap::Parser;
use std::path::PathBuf;

/// Command-line and environment settings of the server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "athena-server", about = "Athena game ruleset and session tracker")]
pub struct ServerArgs {
    /// Host to bind to
    #[arg(long, short = 'H', env = "ATHENA_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(long, short, env = "ATHENA_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Directory served under /app
    #[arg(long, short = 'd', env = "ATHENA_STATIC_DIR", default_value = "dist")]
    pub static_dir: PathBuf,

    /// Storage backend
    #[arg(long, value_enum, env = "ATHENA_STORE", default_value = "mongo")]
    pub store: StoreKind,

    /// MongoDB connection string
    #[arg(long, env = "ATHENA_MONGO_URI", default_value = "mongodb://athenadb:27017")]
    pub mongo_uri: String,

    /// MongoDB database name
    #[arg(long, env = "ATHENA_DATABASE", default_value = "athenadb")]
    pub database: String,

    /// Keep existing data instead of resetting and seeding sample records
    #[arg(long, env = "ATHENA_NO_SEED")]
    pub no_seed: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "ATHENA_LOG_JSON")]
    pub log_json: bool,
}

impl ServerArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port, self.static_dir.clone())
    }
}

//! Athena server binary
//!
//! Usage: cargo run -p athena_web --bin athena-server -- --help

use athena_web::{reset_and_seed, store, ServerArgs, WebServer};
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();

    if let Err(err) = athena_web::init_logging(args.log_json) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.server_config();

    tracing::info!(
        host = %config.host(),
        port = config.port(),
        static_dir = %config.static_dir().display(),
        store = ?args.store,
        database = %args.database,
        "starting athena server"
    );

    let store = store::connect(args.store, &args.mongo_uri, &args.database).await?;

    if args.no_seed {
        tracing::info!("keeping existing data");
    } else {
        reset_and_seed(store.as_ref(), chrono::Utc::now()).await?;
    }

    let handle = WebServer::new(config, store).start().await?;
    tracing::info!(address = %handle.address(), "press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    handle.shutdown().await?;
    Ok(())
}

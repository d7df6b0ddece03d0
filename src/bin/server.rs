use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledger_rs::{AppState, StaticCredentials, build_router, graceful_shutdown, logging_middleware};

/// The web server for the ledger: an HTML UI and a JSON API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database, created if it does not exist.
    #[arg(long, env = "LEDGER_DB_PATH")]
    db_path: PathBuf,

    /// File path to the JSON file with the users and API tokens.
    #[arg(long, env = "LEDGER_CREDENTIALS_PATH")]
    credentials_path: PathBuf,

    /// The address to listen on.
    #[arg(long, env = "LEDGER_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the app from.
    #[arg(short, long, env = "LEDGER_PORT", default_value_t = 3000)]
    port: u16,

    /// Log request and response bodies.
    #[arg(long, env = "LEDGER_LOG_BODIES")]
    log_bodies: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    let credentials = match StaticCredentials::load(&args.credentials_path) {
        Ok(credentials) => credentials,
        Err(error) => {
            tracing::error!(
                "Could not load credentials from {}: {error}",
                args.credentials_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let connection = match Connection::open(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!(
                "Could not open database at {}: {error}",
                args.db_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection, Arc::new(credentials)) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize database: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let mut router = add_tracing_layer(build_router(state));

    if args.log_bodies {
        router = router.layer(middleware::from_fn(logging_middleware));
    }

    let addr = SocketAddr::new(args.host, args.port);
    tracing::info!("HTTP server listening on {}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are already logged where they happen.
        .on_failure(());

    router.layer(tracing_layer)
}

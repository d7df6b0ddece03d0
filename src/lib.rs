//! Ledger is a small personal finance ledger.
//!
//! Entries (a name, a non-negative amount and an optional category) are kept in
//! a SQLite database and can be managed through a web UI served as HTML, a JSON
//! API, or the `ledger` command line tool. Entries can be exported to and
//! imported from CSV files.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod entry;
mod error;
mod error_pages;
mod home;
mod html;
mod logging;
mod navigation;
mod routing;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    CredentialVerifier, CredentialsFile, PasswordHash, Principal, Role, StaticCredentials,
    TokenCredential, UserCredential, ValidatedPassword,
};
pub use db::initialize as initialize_db;
pub use entry::{
    Amount, CSV_HEADER, Category, Entry, EntryId, EntryName, EntryPatch, EntryService,
    ImportRowError, ImportSummary, NewEntry,
};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

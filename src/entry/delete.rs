//! Entry deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    entry::{EntryId, EntryService},
};

/// The state needed for deleting an entry.
#[derive(Debug, Clone)]
pub struct DeleteEntryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteEntryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle entry deletion. Returns success alert or error.
pub async fn delete_entry_endpoint(
    Path(entry_id): Path<EntryId>,
    State(state): State<DeleteEntryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match EntryService::new(&connection).delete_entry(entry_id) {
        Ok(_) => {
            tracing::info!("Deleted entry {entry_id}");

            Alert::SuccessSimple {
                message: "Entry deleted successfully".to_owned(),
            }
            .into_response()
        }
        Err(Error::NotFound) => Error::NotFound.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while deleting entry {entry_id}: {error}");
            error.into_alert_response()
        }
    }
}

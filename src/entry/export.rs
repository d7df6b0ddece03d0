//! CSV download of all entries.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, entry::EntryService};

/// The file name offered by the web UI download.
pub const EXPORT_FILE_NAME: &str = "exported_data.csv";

/// The state needed for exporting entries.
#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Respond with `csv` as a file download named `file_name`.
fn csv_attachment(csv: String, file_name: &str) -> Response {
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

/// Render every entry as CSV and return it as a download.
pub(super) fn export_response(
    db_connection: &Mutex<Connection>,
    file_name: &str,
) -> Result<Response, Error> {
    let connection = db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let csv = EntryService::new(&connection)
        .export_csv()
        .inspect_err(|error| tracing::error!("Failed to export entries: {error}"))?;

    Ok(csv_attachment(csv, file_name))
}

/// Route handler for downloading all entries as `exported_data.csv`.
pub async fn export_entries(State(state): State<ExportState>) -> Result<Response, Error> {
    export_response(&state.db_connection, EXPORT_FILE_NAME)
}

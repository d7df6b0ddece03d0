//! JSON API handlers for entries.
//!
//! Every error is returned as `{"error": "..."}` with a matching status code.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    entry::{
        EntryId, EntryService, ImportSummary,
        export::export_response,
        import::read_csv_files,
    },
};

/// The file name of CSV downloads from the API.
pub const API_EXPORT_FILE_NAME: &str = "entries.csv";

/// The state needed for the entry API.
#[derive(Debug, Clone)]
pub struct EntryApiState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EntryApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or replacing an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryBody {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
}

/// Lock the database, run `operation` and turn the outcome into a response.
fn with_service<T: IntoResponse>(
    state: &EntryApiState,
    operation: impl FnOnce(EntryService<'_>) -> Result<T, Error>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_json_response();
        }
    };

    match operation(EntryService::new(&connection)) {
        Ok(response) => response.into_response(),
        Err(error) => error.into_json_response(),
    }
}

fn parse_body(body: Result<Json<EntryBody>, JsonRejection>) -> Result<EntryBody, Error> {
    body.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("Rejected JSON body: {rejection}");
        Error::InvalidRequestBody(rejection.body_text())
    })
}

/// `GET /api/entries`: every entry in insertion order.
pub async fn list_entries_api(State(state): State<EntryApiState>) -> Response {
    with_service(&state, |service| service.list_entries().map(Json))
}

/// `POST /api/entries`: create an entry and respond with 201 and the new entry.
pub async fn create_entry_api(
    State(state): State<EntryApiState>,
    body: Result<Json<EntryBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(error) => return error.into_json_response(),
    };

    with_service(&state, |service| {
        service
            .create_entry(&body.name, body.amount, body.category.as_deref())
            .map(|entry| (StatusCode::CREATED, Json(entry)))
    })
}

/// `GET /api/entries/{entry_id}`
pub async fn get_entry_api(
    State(state): State<EntryApiState>,
    Path(entry_id): Path<String>,
) -> Response {
    with_service(&state, |service| {
        let entry_id: EntryId = entry_id.parse()?;
        service.get_entry(entry_id).map(Json)
    })
}

/// `PUT /api/entries/{entry_id}`: overwrite every field, a missing or null
/// category clears it.
pub async fn update_entry_api(
    State(state): State<EntryApiState>,
    Path(entry_id): Path<String>,
    body: Result<Json<EntryBody>, JsonRejection>,
) -> Response {
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(error) => return error.into_json_response(),
    };

    with_service(&state, |service| {
        let entry_id: EntryId = entry_id.parse()?;
        service.update_entry(entry_id, &body.name, body.amount, body.category.as_deref())?;
        service.get_entry(entry_id).map(Json)
    })
}

/// `DELETE /api/entries/{entry_id}`: responds with 204 on success.
pub async fn delete_entry_api(
    State(state): State<EntryApiState>,
    Path(entry_id): Path<String>,
) -> Response {
    with_service(&state, |service| {
        let entry_id: EntryId = entry_id.parse()?;
        service
            .delete_entry(entry_id)
            .map(|_| StatusCode::NO_CONTENT)
    })
}

/// `GET /api/export`: all entries as a CSV attachment.
pub async fn export_entries_api(State(state): State<EntryApiState>) -> Response {
    export_response(&state.db_connection, API_EXPORT_FILE_NAME)
        .unwrap_or_else(Error::into_json_response)
}

/// `POST /api/import`: import one or more uploaded CSV files.
///
/// The summaries of the files are merged, with row numbers relative to
/// their own file. If any file cannot be parsed, no entries are imported.
pub async fn import_entries_api(
    State(state): State<EntryApiState>,
    multipart: Multipart,
) -> Response {
    let files = match read_csv_files(multipart).await {
        Ok(files) => files,
        Err(error) => return error.into_json_response(),
    };

    with_service(&state, |service| {
        let mut total = ImportSummary {
            imported: 0,
            skipped: Vec::new(),
        };

        for summary in service.import_csv_files(files.iter().map(|file| &file.data[..]))? {
            total.imported += summary.imported;
            total.skipped.extend(summary.skipped);
        }

        Ok(Json(total))
    })
}

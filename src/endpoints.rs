//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/entries/{entry_id}', use [format_endpoint].

use std::fmt::Display;

/// The home page with links to every action.
pub const ROOT: &str = "/";
/// The page listing all entries.
pub const ENTRIES_VIEW: &str = "/entries";
/// The page for creating a new entry.
pub const NEW_ENTRY_VIEW: &str = "/entries/new";
/// The page for looking up a single entry by its ID.
pub const SEARCH_ENTRY_VIEW: &str = "/entries/search";
/// The page for editing an existing entry.
pub const EDIT_ENTRY_VIEW: &str = "/entries/{entry_id}/edit";
/// The page for importing entries from a CSV file.
pub const IMPORT_VIEW: &str = "/import";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route the entry forms submit new entries to.
pub const POST_ENTRY: &str = "/entries";
/// The route the edit form submits updates to.
pub const PUT_ENTRY: &str = "/entries/{entry_id}";
/// The route for deleting an entry from the web UI.
pub const DELETE_ENTRY: &str = "/entries/{entry_id}";
/// The route the import form uploads CSV files to.
pub const IMPORT: &str = "/import";
/// The route for downloading all entries as a CSV file.
pub const EXPORT: &str = "/export";

/// The JSON API route for the collection of entries.
pub const API_ENTRIES: &str = "/api/entries";
/// The JSON API route for a single entry.
pub const API_ENTRY: &str = "/api/entries/{entry_id}";
/// The JSON API route for downloading all entries as a CSV file.
pub const API_EXPORT: &str = "/api/export";
/// The JSON API route for uploading a CSV file of entries.
pub const API_IMPORT: &str = "/api/import";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/entries/{entry_id}', '{entry_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let param_start = match endpoint_path.find('{') {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|end| param_start + end + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

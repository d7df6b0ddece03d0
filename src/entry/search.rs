//! Page for looking up a single entry by its ID.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, endpoints,
    entry::{Entry, EntryId, EntryService, list::entries_table},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
        form_error_message,
    },
    navigation::NavBar,
};

/// The state needed for the search page.
#[derive(Debug, Clone)]
pub struct SearchEntryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SearchEntryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the search page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// Render the search form, and the matching entry if an `id` was given.
pub async fn get_search_entry_page(
    State(state): State<SearchEntryPageState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, Error> {
    let raw_id = query.id.unwrap_or_default();
    let raw_id = raw_id.trim();

    if raw_id.is_empty() {
        return Ok(search_view("", None, "").into_response());
    }

    let entry_id = match raw_id.parse::<EntryId>() {
        Ok(entry_id) => entry_id,
        Err(error) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                search_view(raw_id, None, &error.to_string()),
            )
                .into_response());
        }
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match EntryService::new(&connection).get_entry(entry_id) {
        Ok(entry) => Ok(search_view(raw_id, Some(&entry), "").into_response()),
        Err(Error::NotFound) => Ok((
            StatusCode::NOT_FOUND,
            search_view(raw_id, None, &format!("No entry has the ID {entry_id}")),
        )
            .into_response()),
        Err(error) => {
            tracing::error!("Failed to retrieve entry {entry_id}: {error}");
            Err(error)
        }
    }
}

fn search_view(raw_id: &str, entry: Option<&Entry>, error_message: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::SEARCH_ENTRY_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Find Entry" }

                form
                    method="get"
                    action=(endpoints::SEARCH_ENTRY_VIEW)
                    class="w-full max-w-md space-y-4"
                {
                    div
                    {
                        label for="id" class=(FORM_LABEL_STYLE) { "Entry ID" }

                        input
                            id="id"
                            type="text"
                            name="id"
                            placeholder="3f2b8e1c-..."
                            value=(raw_id)
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    (form_error_message(error_message))

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Search" }
                }

                @if let Some(entry) = entry {
                    div class="overflow-x-auto dark:bg-gray-800"
                    {
                        (entries_table(std::slice::from_ref(entry), html!()))
                    }
                }
            }
        }
    };

    base("Find Entry", &content)
}

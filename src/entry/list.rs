//! Entries listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    entry::{Entry, EntryService, count_entries},
    html::{
        CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links, format_amount,
    },
    navigation::NavBar,
};

/// The state needed for the entries listing page.
#[derive(Debug, Clone)]
pub struct EntriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EntriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the table of all entries.
pub async fn get_entries_page(State(state): State<EntriesPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entries = EntryService::new(&connection)
        .list_entries()
        .inspect_err(|error| tracing::error!("Failed to retrieve entries: {error}"))?;
    let entry_count = count_entries(&connection)?;

    Ok(entries_view(&entries, entry_count).into_response())
}

/// A table row for one entry, shared with the search page.
pub(super) fn entry_table_row(entry: &Entry) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_ENTRY_VIEW, entry.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_ENTRY, entry.id);
    let confirm_message = format!("Are you sure you want to delete '{}'?", entry.name);

    html!(
        tr class=(TABLE_ROW_STYLE) data-entry-id=(entry.id)
        {
            td class=(TABLE_CELL_STYLE) { (entry.name) }

            td class={(TABLE_CELL_STYLE) " text-right tabular-nums"}
            {
                (format_amount(entry.amount.value()))
            }

            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category) = &entry.category {
                    span class=(CATEGORY_BADGE_STYLE) { (category) }
                }
            }

            td class={(TABLE_CELL_STYLE) " font-mono text-xs"} { (entry.id) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest tr",
                        "delete",
                    ))
                }
            }
        }
    )
}

/// The table header and body for `entries`.
pub(super) fn entries_table(entries: &[Entry], empty_message: Markup) -> Markup {
    html!(
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                    th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "ID" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                }
            }

            tbody
            {
                @for entry in entries {
                    (entry_table_row(entry))
                }

                @if entries.is_empty() {
                    tr
                    {
                        td
                            colspan="5"
                            class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                        {
                            (empty_message)
                        }
                    }
                }
            }
        }
    )
}

fn entries_view(entries: &[Entry], entry_count: usize) -> Markup {
    let new_entry_route = endpoints::NEW_ENTRY_VIEW;
    let nav_bar = NavBar::new(endpoints::ENTRIES_VIEW).into_html();
    let total: f64 = entries.iter().map(|entry| entry.amount.value()).sum();

    let empty_message = html!(
        "No entries yet. "
        a href=(new_entry_route) class=(LINK_STYLE) { "Create your first entry" }
        " or "
        a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "import a CSV file" }
        "."
    );

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Entries" }

                    a href=(new_entry_route) class=(LINK_STYLE) { "Create Entry" }
                }

                p id="entries-summary" class="text-sm"
                {
                    (entry_count) " entries totalling " (format_amount(total))
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    (entries_table(entries, empty_message))
                }
            }
        }
    );

    base("Entries", &content)
}

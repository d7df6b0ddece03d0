//! Entry editing page and endpoint.
//!
//! The edit form performs a partial update: fields left blank keep the
//! entry's current value.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, endpoints,
    entry::{Amount, Entry, EntryId, EntryPatch, EntryService, create::entry_form_fields},
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, form_error_message},
    navigation::NavBar,
};

/// The state needed for the edit entry page and endpoint.
#[derive(Debug, Clone)]
pub struct EditEntryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditEntryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Form data for a partial update. Blank fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EditEntryFormData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub category: String,
}

impl EditEntryFormData {
    fn from_entry(entry: &Entry) -> Self {
        Self {
            name: entry.name.to_string(),
            amount: entry.amount.to_string(),
            category: entry
                .category
                .as_ref()
                .map(|category| category.to_string())
                .unwrap_or_default(),
        }
    }

    fn to_patch(&self) -> Result<EntryPatch, Error> {
        let amount = match self.amount.trim() {
            "" => None,
            amount => Some(Amount::parse(amount)?.value()),
        };

        Ok(EntryPatch {
            name: Some(self.name.clone()),
            amount,
            category: Some(self.category.clone()),
        })
    }
}

/// Render the entry editing page.
pub async fn get_edit_entry_page(
    Path(entry_id): Path<EntryId>,
    State(state): State<EditEntryState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match EntryService::new(&connection).get_entry(entry_id) {
        Ok(entry) => Ok(edit_entry_view(
            entry_id,
            &EditEntryFormData::from_entry(&entry),
            "",
        )
        .into_response()),
        Err(Error::NotFound) => Ok((
            StatusCode::NOT_FOUND,
            edit_entry_view(entry_id, &EditEntryFormData::default(), "Entry not found"),
        )
            .into_response()),
        Err(error) => {
            tracing::error!("Failed to retrieve entry {entry_id}: {error}");
            Err(error)
        }
    }
}

/// Handle entry update form submission.
pub async fn update_entry_endpoint(
    Path(entry_id): Path<EntryId>,
    State(state): State<EditEntryState>,
    Form(form): Form<EditEntryFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_ENTRY, entry_id);

    let patch = match form.to_patch() {
        Ok(patch) => patch,
        Err(error) => {
            return edit_entry_form_view(&update_endpoint, &form, &format!("Error: {error}"))
                .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match EntryService::new(&connection).patch_entry(entry_id, patch) {
        Ok(entry) => {
            tracing::info!("Updated entry {} '{}'", entry.id, entry.name);

            (
                HxRedirect(endpoints::ENTRIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::Validation(_)) => {
            edit_entry_form_view(&update_endpoint, &form, &format!("Error: {error}"))
                .into_response()
        }
        Err(Error::NotFound) => Error::NotFound.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating entry {entry_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_entry_view(entry_id: EntryId, form: &EditEntryFormData, error_message: &str) -> Markup {
    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_ENTRY_VIEW, entry_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_ENTRY, entry_id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();
    let form = edit_entry_form_view(&update_endpoint, form, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Entry" }
            (form)
        }
    };

    base("Edit Entry", &content)
}

fn edit_entry_form_view(update_endpoint: &str, form: &EditEntryFormData, error_message: &str) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (entry_form_fields(&form.name, &form.amount, &form.category, false))

            (form_error_message(error_message))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Entry" }
        }
    }
}

#[cfg(test)]
mod edit_entry_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::{ElementRef, Selector};

    use crate::{
        endpoints,
        entry::{
            Entry, EntryId, NewEntry, create_entry, create_entry_table,
            edit::{EditEntryFormData, EditEntryState},
            get_edit_entry_page, get_entry, update_entry_endpoint,
        },
        test_utils::{
            assert_content_type, assert_form_error_message, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, must_get_form,
            parse_html_document, parse_html_fragment,
        },
    };

    fn get_state() -> EditEntryState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_entry_table(&connection).expect("Could not create entry table");

        EditEntryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn create_rent(state: &EditEntryState) -> Entry {
        create_entry(
            NewEntry::new("Rent", 1200.0, Some("Housing")).unwrap(),
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test entry")
    }

    #[track_caller]
    fn assert_input_value(form: &ElementRef<'_>, name: &str, want: &str) {
        let selector = Selector::parse(&format!("input[name={name}]")).unwrap();
        let input = form
            .select(&selector)
            .next()
            .unwrap_or_else(|| panic!("No input named {name}"));

        assert_eq!(input.value().attr("value"), Some(want));
    }

    #[tokio::test]
    async fn get_edit_entry_page_shows_current_values() {
        let state = get_state();
        let entry = create_rent(&state);

        let response = get_edit_entry_page(Path(entry.id), State(state))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_ENTRY, entry.id),
            "hx-put",
        );
        assert_input_value(&form, "name", "Rent");
        assert_input_value(&form, "amount", "1200");
        assert_input_value(&form, "category", "Housing");
        assert_form_submit_button_with_text(&form, "Update Entry");
    }

    #[tokio::test]
    async fn get_edit_entry_page_for_unknown_entry() {
        let response = get_edit_entry_page(Path(EntryId::new()), State(get_state()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Entry not found");
    }

    #[tokio::test]
    async fn update_keeps_blank_fields() {
        let state = get_state();
        let entry = create_rent(&state);
        let form = EditEntryFormData {
            name: String::new(),
            amount: "1250".to_owned(),
            category: String::new(),
        };

        let response = update_entry_endpoint(Path(entry.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ENTRIES_VIEW);
        let got = get_entry(entry.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.name, entry.name);
        assert_eq!(got.amount.value(), 1250.0);
        assert_eq!(got.category, entry.category);
    }

    #[tokio::test]
    async fn update_replaces_given_fields() {
        let state = get_state();
        let entry = create_rent(&state);
        let form = EditEntryFormData {
            name: "Mortgage".to_owned(),
            amount: String::new(),
            category: "Home".to_owned(),
        };

        update_entry_endpoint(Path(entry.id), State(state.clone()), Form(form))
            .await
            .into_response();

        let got = get_entry(entry.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(got.name.as_ref(), "Mortgage");
        assert_eq!(got.amount, entry.amount);
        assert_eq!(
            got.category.as_ref().map(|category| category.as_ref()),
            Some("Home")
        );
    }

    #[tokio::test]
    async fn update_with_invalid_amount_shows_error() {
        let state = get_state();
        let entry = create_rent(&state);
        let form = EditEntryFormData {
            amount: "lots".to_owned(),
            ..Default::default()
        };

        let response = update_entry_endpoint(Path(entry.id), State(state.clone()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: amount: \"lots\" is not a number");
        assert_eq!(
            get_entry(entry.id, &state.db_connection.lock().unwrap()),
            Ok(entry)
        );
    }

    #[tokio::test]
    async fn update_unknown_entry_returns_not_found_alert() {
        let form = EditEntryFormData {
            name: "Mortgage".to_owned(),
            ..Default::default()
        };

        let response = update_entry_endpoint(Path(EntryId::new()), State(get_state()), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

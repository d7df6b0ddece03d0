//! Entry creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    entry::{Amount, EntryService, domain::EntryFormData},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        form_error_message,
    },
    navigation::NavBar,
};

/// The state needed for creating an entry.
#[derive(Debug, Clone)]
pub struct CreateEntryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateEntryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the entry creation page.
pub async fn get_new_entry_page() -> Response {
    new_entry_view().into_response()
}

/// Handle entry creation form submission.
///
/// Validation errors re-render the form with the submitted values and the
/// error message.
pub async fn create_entry_endpoint(
    State(state): State<CreateEntryEndpointState>,
    Form(form): Form<EntryFormData>,
) -> Response {
    let amount = match Amount::parse(&form.amount) {
        Ok(amount) => amount,
        Err(error) => {
            return new_entry_form_view(&form, &format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match EntryService::new(&connection).create_entry(
        &form.name,
        amount.value(),
        form.category.as_deref(),
    ) {
        Ok(entry) => {
            tracing::info!("Created entry {} '{}'", entry.id, entry.name);

            (
                HxRedirect(endpoints::ENTRIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::Validation(_)) => {
            new_entry_form_view(&form, &format!("Error: {error}")).into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an entry: {error}");

            error.into_alert_response()
        }
    }
}

fn new_entry_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ENTRY_VIEW).into_html();
    let form = new_entry_form_view(
        &EntryFormData {
            name: String::new(),
            amount: String::new(),
            category: None,
        },
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Entry", &content)
}

/// The name, amount and category inputs shared by the create and edit forms.
pub(super) fn entry_form_fields(
    name: &str,
    amount: &str,
    category: &str,
    required: bool,
) -> Markup {
    html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Name" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Rent"
                value=(name)
                minlength="2"
                maxlength="50"
                required[required]
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            input
                id="amount"
                type="number"
                name="amount"
                placeholder="0.00"
                value=(amount)
                min="0"
                step="0.01"
                required[required]
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category (optional)" }

            input
                id="category"
                type="text"
                name="category"
                placeholder="Housing"
                value=(category)
                maxlength="50"
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn new_entry_form_view(form: &EntryFormData, error_message: &str) -> Markup {
    let create_entry_endpoint = endpoints::POST_ENTRY;

    html! {
        form
            hx-post=(create_entry_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (entry_form_fields(
                &form.name,
                &form.amount,
                form.category.as_deref().unwrap_or_default(),
                true,
            ))

            (form_error_message(error_message))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Entry" }
        }
    }
}

#[cfg(test)]
mod new_entry_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        entry::get_new_entry_page,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_entry_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_ENTRY, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_submit_button(&form);
    }
}

//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that htmx swaps into the
//! `#alert-container` element of the base page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A message to display to the user after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    Success { message: String, details: String },
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message with extra details, e.g. how to fix the error.
    Error { message: String, details: String },
    /// An error message on its own.
    ErrorSimple { message: String },
}

impl Alert {
    fn into_markup(self) -> Markup {
        let (is_error, message, details) = match self {
            Alert::Success { message, details } => (false, message, details),
            Alert::SuccessSimple { message } => (false, message, String::new()),
            Alert::Error { message, details } => (true, message, details),
            Alert::ErrorSimple { message } => (true, message, String::new()),
        };

        let container_style = if is_error {
            "p-4 mb-4 text-sm rounded-lg border text-red-800 border-red-300 \
            bg-red-50 dark:bg-gray-800 dark:text-red-400 dark:border-red-800"
        } else {
            "p-4 mb-4 text-sm rounded-lg border text-green-800 border-green-300 \
            bg-green-50 dark:bg-gray-800 dark:text-green-400 dark:border-green-800"
        };

        html! {
            div
                role="alert"
                class=(container_style)
                data-alert-kind=(if is_error { "error" } else { "success" })
            {
                div class="flex items-start justify-between gap-4"
                {
                    div
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        class="font-bold"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use scraper::Selector;

    use crate::{
        alert::Alert,
        test_utils::{assert_valid_html, parse_html_fragment},
    };

    #[tokio::test]
    async fn renders_message_and_details() {
        let alert = Alert::Error {
            message: "Import failed".to_owned(),
            details: "Try again".to_owned(),
        };

        let response = alert.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(paragraphs, vec!["Import failed", "Try again"]);
    }

    #[tokio::test]
    async fn simple_alert_omits_details() {
        let response = Alert::SuccessSimple {
            message: "Entry deleted".to_owned(),
        }
        .into_response();

        let html = parse_html_fragment(response).await;
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        assert_eq!(alert.value().attr("data-alert-kind"), Some("success"));
        assert_eq!(html.select(&Selector::parse("p").unwrap()).count(), 1);
    }
}

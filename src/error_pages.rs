//! Full page responses for the 403, 404 and 500 errors.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

fn error_page(status_code: StatusCode, title: &str, description: &str, fix: &str) -> Response {
    let header = status_code.as_str();
    let page = error_view(title, header, description, fix).into_string();

    (status_code, Html(page)).into_response()
}

/// Renders the 404 page.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        error_page(
            StatusCode::NOT_FOUND,
            "Not Found",
            "Something's missing.",
            "Sorry, we can't find that page. Check the address or go back to the homepage.",
        )
    }
}

/// Renders the 403 page for callers without the required role.
pub struct ForbiddenError;

impl IntoResponse for ForbiddenError {
    fn into_response(self) -> Response {
        error_page(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "You do not have access to this page.",
            "Ask an administrator to give your account the admin role.",
        )
    }
}

/// Renders the 500 page.
pub struct InternalServerError<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            self.description,
            self.fix,
        )
    }
}

/// Fallback route handler for paths that do not match any route.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}

/// Route handler for the internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

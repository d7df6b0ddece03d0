//! Defines the app level error type and conversions to rendered HTML pages, alerts and JSON.
use axum::{
    Json,
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    alert::Alert,
    entry::ValidationError,
    error_pages::{ForbiddenError, InternalServerError, NotFoundError},
};

/// The realm sent with `WWW-Authenticate` challenges.
pub const AUTH_REALM: &str = "ledger";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A field of an entry failed validation.
    ///
    /// The client should correct the offending field and try again.
    #[error("{0}")]
    Validation(ValidationError),

    /// A string could not be parsed as an entry ID.
    #[error("\"{0}\" is not a valid entry ID, expected a UUID")]
    InvalidEntryId(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A JSON request body was missing, malformed or had the wrong shape.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The multipart form could not be parsed as a CSV file.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The CSV as a whole could not be parsed, e.g. the header is missing a
    /// required column.
    ///
    /// Problems with individual rows do not produce this error, those rows
    /// are skipped instead.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The request did not carry valid credentials.
    #[error("invalid or missing credentials")]
    InvalidCredentials,

    /// The authenticated caller does not have the role needed for the request.
    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Reading or writing a file failed.
    #[error("an I/O error occurred: {0}")]
    Io(String),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not (de)serialize JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<ValidationError> for Error {
    fn from(value: ValidationError) -> Self {
        Error::Validation(value)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidCredentials => basic_auth_challenge(),
            Error::Forbidden => ForbiddenError.into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// The status code to respond with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::InvalidEntryId(_)
            | Error::InvalidRequestBody(_)
            | Error::MultipartError(_)
            | Error::NotCSV
            | Error::InvalidCSV(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let status_code = self.status_code();
        let alert = match self {
            Error::Validation(error) => Alert::Error {
                message: "Invalid entry".to_owned(),
                details: error.to_string(),
            },
            Error::InvalidEntryId(id) => Alert::Error {
                message: "Invalid entry ID".to_owned(),
                details: format!("\"{id}\" is not a valid entry ID. Entry IDs are UUIDs."),
            },
            Error::NotFound => Alert::Error {
                message: "Could not find entry".to_owned(),
                details: "The entry could not be found. \
                    Try refreshing the page to see if the entry has already been deleted."
                    .to_owned(),
            },
            Error::NotCSV => Alert::ErrorSimple {
                message: "File type must be CSV.".to_owned(),
            },
            Error::InvalidCSV(reason) => Alert::Error {
                message: "Failed to parse CSV".to_owned(),
                details: reason,
            },
            Error::MultipartError(reason) => Alert::Error {
                message: "Could not read the uploaded file".to_owned(),
                details: reason,
            },
            Error::Forbidden => Alert::Error {
                message: "Access denied".to_owned(),
                details: "You need the admin role to do this.".to_owned(),
            },
            error => {
                tracing::error!("An unexpected error occurred: {}", error);

                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                }
            }
        };

        (status_code, alert.into_html()).into_response()
    }

    /// Convert the error into an HTTP response with a JSON body of the form
    /// `{"error": "..."}`.
    ///
    /// Storage and other internal errors are logged and replaced with a
    /// generic message.
    pub fn into_json_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred".to_owned()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));

        if status_code == StatusCode::UNAUTHORIZED {
            return (status_code, [(WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status_code, body).into_response()
    }
}

/// A 401 response asking the browser for HTTP Basic credentials.
pub fn basic_auth_challenge() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, format!("Basic realm=\"{AUTH_REALM}\""))],
        "Unauthorized",
    )
        .into_response()
}

#[cfg(test)]
mod error_response_tests {
    use axum::{
        body::to_bytes,
        http::{StatusCode, header::WWW_AUTHENTICATE},
        response::IntoResponse,
    };
    use serde_json::Value;

    use crate::{
        Error,
        entry::{Field, ValidationError},
        test_utils::get_header,
    };

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Could not read response body");

        serde_json::from_slice(&body).expect("Response body is not JSON")
    }

    #[tokio::test]
    async fn validation_error_is_bad_request_json() {
        let error = Error::Validation(ValidationError::new(
            Field::Amount,
            "amount must not be negative",
        ));

        let response = error.into_json_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "amount: amount must not be negative");
    }

    #[tokio::test]
    async fn sql_error_hides_details() {
        let error = Error::SqlError(rusqlite::Error::InvalidQuery);

        let response = error.into_json_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn invalid_credentials_challenges_for_basic_auth() {
        let response = Error::InvalidCredentials.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_header(&response, WWW_AUTHENTICATE.as_str()),
            "Basic realm=\"ledger\""
        );
    }

    #[test]
    fn query_returned_no_rows_is_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }
}

//! Middleware that authenticates requests and checks roles.
//!
//! The guards place the authenticated [Principal] into the request extensions,
//! so handlers and later layers can use `Extension(principal): Extension<Principal>`.

use std::sync::Arc;

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{
        Authorization,
        authorization::{Basic, Bearer},
    },
};

use crate::{
    AppState, Error,
    auth::{CredentialVerifier, Principal},
    error_pages::InternalServerError,
};

/// The state needed for the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            verifier: state.verifier.clone(),
        }
    }
}

/// Middleware for the web UI that requires valid HTTP Basic credentials.
///
/// Missing or wrong credentials get a 401 response with a `WWW-Authenticate`
/// challenge, so the browser prompts for a user name and password.
pub async fn basic_auth_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let credentials = match parts.extract::<TypedHeader<Authorization<Basic>>>().await {
        Ok(TypedHeader(Authorization(basic))) => basic,
        Err(_) => {
            tracing::debug!("No basic auth credentials for {}", parts.uri.path());
            return Error::InvalidCredentials.into_response();
        }
    };

    let username = credentials.username().to_owned();
    let password = credentials.password().to_owned();
    let verifier = state.verifier.clone();

    // bcrypt is deliberately slow, keep it off the async worker threads.
    let verified = tokio::task::spawn_blocking(move || verifier.verify_basic(&username, &password))
        .await;

    let principal = match verified {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            tracing::warn!(
                "Rejected basic auth credentials for user '{}'",
                credentials.username()
            );
            return Error::InvalidCredentials.into_response();
        }
        Err(error) => {
            tracing::error!("Password verification task failed: {error}");
            return InternalServerError::default().into_response();
        }
    };

    parts.extensions.insert(principal);
    next.run(Request::from_parts(parts, body)).await
}

/// Middleware for the JSON API that requires a valid bearer token.
///
/// Missing or unknown tokens get a 401 JSON error.
pub async fn bearer_auth_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let token = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => {
            tracing::debug!("No bearer token for {}", parts.uri.path());
            return Error::InvalidCredentials.into_json_response();
        }
    };

    let principal = match state.verifier.verify_token(token.token()) {
        Some(principal) => principal,
        None => {
            tracing::warn!("Rejected unknown bearer token for {}", parts.uri.path());
            return Error::InvalidCredentials.into_json_response();
        }
    };

    parts.extensions.insert(principal);
    next.run(Request::from_parts(parts, body)).await
}

/// Middleware that only lets admins through.
///
/// Must be layered inside [basic_auth_guard] or [bearer_auth_guard]. API
/// routes (paths starting with `/api`) get JSON errors, everything else gets
/// the HTML 403 page.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api");
    let error_response = |error: Error| {
        if is_api {
            error.into_json_response()
        } else {
            error.into_response()
        }
    };

    match request.extensions().get::<Principal>() {
        Some(principal) if principal.is_admin() => next.run(request).await,
        Some(principal) => {
            tracing::warn!(
                "Denied {} {} to '{}' with role {}",
                request.method(),
                request.uri().path(),
                principal.name,
                principal.role
            );
            error_response(Error::Forbidden)
        }
        None => {
            tracing::error!(
                "require_admin ran without an auth guard on {}",
                request.uri().path()
            );
            error_response(Error::InvalidCredentials)
        }
    }
}

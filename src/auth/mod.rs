//! Authentication and authorization for the web UI and the JSON API.
//!
//! Request handlers never check passwords or tokens themselves. The guards in
//! this module ask the [CredentialVerifier] held in the app state and attach
//! the resulting [Principal] to the request.

mod credentials;
mod middleware;
mod password;

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

pub use credentials::{CredentialsFile, StaticCredentials, TokenCredential, UserCredential};
pub use middleware::{AuthState, basic_auth_guard, bearer_auth_guard, require_admin};
pub use password::{PasswordHash, ValidatedPassword};

/// What an authenticated caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full read and write access.
    Admin,
    /// May only export entries.
    User,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The user name, or the label of the API token.
    pub name: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Checks credentials presented with a request.
///
/// Implementations must be cheap to share between threads, the server holds
/// one behind an `Arc` for its whole lifetime.
pub trait CredentialVerifier: Debug + Send + Sync {
    /// Check a user name and password from an HTTP Basic `Authorization` header.
    fn verify_basic(&self, username: &str, password: &str) -> Option<Principal>;

    /// Check a token from an HTTP Bearer `Authorization` header.
    fn verify_token(&self, token: &str) -> Option<Principal>;
}

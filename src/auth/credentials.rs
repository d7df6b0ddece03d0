//! Credentials loaded from a JSON file.
//!
//! The file looks like:
//!
//! ```json
//! {
//!     "users": [
//!         {"username": "admin", "password_hash": "$2b$12$...", "role": "admin"}
//!     ],
//!     "tokens": [
//!         {"token": "3c0ffee...", "role": "user", "name": "reporting"}
//!     ]
//! }
//! ```
//!
//! Password hashes can be generated with `ledger hash-password`.

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::{
    Error,
    auth::{CredentialVerifier, PasswordHash, Principal, Role},
};

/// A user that signs in to the web UI with HTTP Basic auth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    pub password_hash: PasswordHash,
    pub role: Role,
}

/// A bearer token for the JSON API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCredential {
    pub token: String,
    pub role: Role,
    /// A label for the token used in logs, defaults to "api-token".
    #[serde(default)]
    pub name: Option<String>,
}

/// The contents of the credentials file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialsFile {
    #[serde(default)]
    pub users: Vec<UserCredential>,
    #[serde(default)]
    pub tokens: Vec<TokenCredential>,
}

/// A [CredentialVerifier] backed by a fixed set of users and tokens.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, (PasswordHash, Role)>,
    /// Keyed by the SHA-512 digest of the token.
    tokens: HashMap<Vec<u8>, Principal>,
}

fn token_digest(token: &str) -> Vec<u8> {
    Sha512::digest(token.as_bytes()).to_vec()
}

impl StaticCredentials {
    pub fn new(credentials: CredentialsFile) -> Self {
        let users = credentials
            .users
            .into_iter()
            .map(|user| (user.username, (user.password_hash, user.role)))
            .collect();

        let tokens = credentials
            .tokens
            .into_iter()
            .map(|token| {
                let principal = Principal {
                    name: token.name.unwrap_or_else(|| "api-token".to_owned()),
                    role: token.role,
                };

                (token_digest(&token.token), principal)
            })
            .collect();

        Self { users, tokens }
    }

    /// Parse credentials from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [Error::JSONSerializationError] if `json` is not a valid
    /// credentials file.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let credentials: CredentialsFile = serde_json::from_str(json)?;

        Ok(Self::new(credentials))
    }

    /// Read credentials from the JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path)?;
        let credentials = Self::from_json(&json)?;

        tracing::info!(
            "Loaded {} users and {} API tokens from {}",
            credentials.users.len(),
            credentials.tokens.len(),
            path.display()
        );

        Ok(credentials)
    }
}

// Keep hashes and tokens out of logs.
impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("users", &self.users.keys().collect::<Vec<_>>())
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify_basic(&self, username: &str, password: &str) -> Option<Principal> {
        let (password_hash, role) = self.users.get(username)?;

        password_hash.verify(password).then(|| Principal {
            name: username.to_owned(),
            role: *role,
        })
    }

    fn verify_token(&self, token: &str) -> Option<Principal> {
        self.tokens.get(&token_digest(token)).cloned()
    }
}

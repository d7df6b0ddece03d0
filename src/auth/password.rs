//! Password strength checks and bcrypt hashing for the credentials file.

use std::fmt::Display;

use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A password that is strong enough to be hashed, but is not hashed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password`.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] with suggestions for a stronger password if
    /// `raw_password` is easy to guess.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &[]);

        match analysis.score() {
            Score::Three | Score::Four => Ok(Self(raw_password.to_owned())),
            _ => Err(Error::TooWeak(
                analysis
                    .feedback()
                    .unwrap_or(&Feedback::default())
                    .to_string(),
            )),
        }
    }
}

impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "********")
    }
}

/// A salted bcrypt hash, as stored in the credentials file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The bcrypt cost used for new hashes.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash `password` with `cost` rounds.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if bcrypt fails, e.g. `cost` is out of range.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap an existing hash string, e.g. one read from a file.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check `raw_password` against the hash.
    ///
    /// A malformed hash never matches.
    pub fn verify(&self, raw_password: &str) -> bool {
        verify(raw_password, &self.0).unwrap_or_else(|error| {
            tracing::error!("Could not verify password against stored hash: {error}");
            false
        })
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod validated_password_tests {
    use crate::{Error, auth::ValidatedPassword};

    #[test]
    fn new_fails_on_empty() {
        assert!(matches!(ValidatedPassword::new(""), Err(Error::TooWeak(_))));
    }

    #[test]
    fn new_fails_on_common_password() {
        assert!(matches!(
            ValidatedPassword::new("password1"),
            Err(Error::TooWeak(_))
        ));
    }

    #[test]
    fn new_succeeds_on_long_password() {
        assert!(ValidatedPassword::new("correct horse battery staple ledger").is_ok());
    }

    #[test]
    fn display_hides_password() {
        let password = ValidatedPassword::new("correct horse battery staple ledger").unwrap();

        assert_eq!(password.to_string(), "********");
    }
}

#[cfg(test)]
mod password_hash_tests {
    use crate::auth::{PasswordHash, ValidatedPassword};

    #[test]
    fn hash_then_verify() {
        let raw_password = "correct horse battery staple ledger";
        let password = ValidatedPassword::new(raw_password).unwrap();

        let hash = PasswordHash::new(password, 4).expect("Could not hash password");

        assert!(hash.verify(raw_password));
        assert!(!hash.verify("wrong password"));
    }

    #[test]
    fn malformed_hash_never_matches() {
        let hash = PasswordHash::new_unchecked("not a bcrypt hash");

        assert!(!hash.verify("anything"));
    }
}

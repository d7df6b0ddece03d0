//! Core entry domain types and field validation.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::Error;

/// The fewest characters allowed in an entry name.
pub const NAME_MIN_LENGTH: usize = 2;
/// The most characters allowed in an entry name.
pub const NAME_MAX_LENGTH: usize = 50;
/// The most characters allowed in a category.
pub const CATEGORY_MAX_LENGTH: usize = 50;

/// The entry field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Amount,
    Category,
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Amount => "amount",
            Field::Category => "category",
        };

        write!(f, "{name}")
    }
}

/// A field value that does not meet the entry constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// The offending field.
    pub field: Field,
    /// A description of the constraint that was broken.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: &str) -> Self {
        Self {
            field,
            message: message.to_owned(),
        }
    }
}

/// The unique identifier of an entry, a random (v4) UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generate a new random ID.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for EntryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Parses both the hyphenated and the simple (32 hex digits) UUID forms.
impl FromStr for EntryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| Error::InvalidEntryId(s.to_owned()))
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl ToSql for EntryId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for EntryId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        Uuid::parse_str(text)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A validated entry name, 2 to 50 characters long after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct EntryName(String);

impl EntryName {
    /// Create an entry name.
    ///
    /// Length is counted in user-perceived characters (grapheme clusters), so
    /// "🇳🇿" counts as one character.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `name` is empty or
    /// its length is out of bounds.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        let length = name.graphemes(true).count();

        if length == 0 {
            Err(ValidationError::new(Field::Name, "name cannot be empty").into())
        } else if length < NAME_MIN_LENGTH {
            Err(ValidationError::new(
                Field::Name,
                &format!("name must be at least {NAME_MIN_LENGTH} characters long"),
            )
            .into())
        } else if length > NAME_MAX_LENGTH {
            Err(ValidationError::new(
                Field::Name,
                &format!("name must be at most {NAME_MAX_LENGTH} characters long"),
            )
            .into())
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create an entry name without validation.
    ///
    /// The caller should ensure that the string meets the length constraints.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for EntryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for EntryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, finite, non-negative amount of money.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(f64);

impl Amount {
    /// Create an amount.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `amount` is
    /// negative, NaN or infinite.
    pub fn new(amount: f64) -> Result<Self, Error> {
        if !amount.is_finite() {
            Err(ValidationError::new(Field::Amount, "amount must be a finite number").into())
        } else if amount < 0.0 {
            Err(ValidationError::new(Field::Amount, "amount must not be negative").into())
        } else {
            // Normalise -0.0 so it round trips as "0".
            Ok(Self(amount.abs()))
        }
    }

    /// Parse an amount from text, e.g. a CSV field or a CLI argument.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if `text` is not a
    /// number or the number is not a valid amount.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text = text.trim();

        if text.is_empty() {
            return Err(ValidationError::new(Field::Amount, "amount is required").into());
        }

        let amount = text.parse::<f64>().map_err(|_| {
            ValidationError::new(Field::Amount, &format!("\"{text}\" is not a number"))
        })?;

        Self::new(amount)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated category, at most 50 characters long after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Create a category from optional text.
    ///
    /// Returns `Ok(None)` for absent, empty or whitespace-only text.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::Validation] if the category is
    /// too long.
    pub fn new(category: Option<&str>) -> Result<Option<Self>, Error> {
        let category = match category.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(category) => category,
        };

        if category.graphemes(true).count() > CATEGORY_MAX_LENGTH {
            return Err(ValidationError::new(
                Field::Category,
                &format!("category must be at most {CATEGORY_MAX_LENGTH} characters long"),
            )
            .into());
        }

        Ok(Some(Self(category.to_string())))
    }

    /// Create a category without validation.
    pub fn new_unchecked(category: &str) -> Self {
        Self(category.to_string())
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub name: EntryName,
    pub amount: Amount,
    pub category: Option<Category>,
}

/// The validated, user supplied fields of an entry.
///
/// Used for both creating and overwriting entries. The ID is always assigned
/// by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub name: EntryName,
    pub amount: Amount,
    pub category: Option<Category>,
}

impl NewEntry {
    /// Validate raw field values.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] for the first field that is invalid.
    pub fn new(name: &str, amount: f64, category: Option<&str>) -> Result<Self, Error> {
        Ok(Self {
            name: EntryName::new(name)?,
            amount: Amount::new(amount)?,
            category: Category::new(category)?,
        })
    }
}

/// A partial update: fields that are `None` keep the entry's current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
}

impl EntryPatch {
    /// Fill in the missing fields from `current` and validate the result.
    ///
    /// Empty strings count as missing, so a category cannot be cleared with a
    /// patch. Use a full update for that.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if a provided field is invalid.
    pub fn apply(self, current: &Entry) -> Result<NewEntry, Error> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => EntryName::new(name)?,
            _ => current.name.clone(),
        };

        let amount = match self.amount {
            Some(amount) => Amount::new(amount)?,
            None => current.amount,
        };

        let category = match Category::new(self.category.as_deref())? {
            Some(category) => Some(category),
            None => current.category.clone(),
        };

        Ok(NewEntry {
            name,
            amount,
            category,
        })
    }
}

/// Form data for entry creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryFormData {
    pub name: String,
    pub amount: String,
    #[serde(default)]
    pub category: Option<String>,
}



#[cfg(test)]
mod category_tests {
    use crate::{
        Error,
        entry::{Category, Field},
    };

    #[test]
    fn absent_and_blank_are_none() {
        assert_eq!(Category::new(None), Ok(None));
        assert_eq!(Category::new(Some("")), Ok(None));
        assert_eq!(Category::new(Some("   ")), Ok(None));
    }

    #[test]
    fn accepts_fifty_characters() {
        let category = "c".repeat(50);

        assert_eq!(
            Category::new(Some(&category)),
            Ok(Some(Category::new_unchecked(&category)))
        );
    }

    #[test]
    fn rejects_fifty_one_characters() {
        match Category::new(Some(&"c".repeat(51))) {
            Err(Error::Validation(error)) => assert_eq!(error.field, Field::Category),
            other => panic!("want category validation error, got {other:?}"),
        }
    }
}

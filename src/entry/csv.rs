//! Conversion between entries and CSV text.
//!
//! Exported files have the header `name,amount,category`. Imports locate
//! columns by header name, so files with reordered or extra columns (e.g. an
//! `id` column) are accepted.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    entry::{Entry, NewEntry, create_entry, domain::Amount},
};

/// The header row written to exported CSV files.
pub const CSV_HEADER: [&str; 3] = ["name", "amount", "category"];

/// A data row that was skipped during an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRowError {
    /// The line number of the row in the file, the header being line 1.
    pub row: usize,
    /// Why the row was skipped.
    pub reason: String,
}

/// The valid entries and the rejected rows found in a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub entries: Vec<NewEntry>,
    pub skipped: Vec<ImportRowError>,
}

/// The outcome of importing a CSV file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    /// How many entries were created.
    pub imported: usize,
    /// The rows that were not imported.
    pub skipped: Vec<ImportRowError>,
}

/// Render `entries` as CSV text with the header `name,amount,category`.
///
/// An absent category is written as an empty field.
pub fn export_entries_csv(entries: &[Entry]) -> Result<String, Error> {
    let mut writer = Writer::from_writer(Vec::new());

    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::Io(error.to_string()))?;

    for entry in entries {
        let amount = entry.amount.to_string();
        let category = entry
            .category
            .as_ref()
            .map(|category| category.as_ref())
            .unwrap_or_default();

        writer
            .write_record([entry.name.as_ref(), amount.as_str(), category])
            .map_err(|error| Error::Io(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Io(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::Io(error.to_string()))
}

/// The positions of the known columns in a CSV header.
#[derive(Debug, Clone, Copy)]
struct ColumnMapping {
    name: usize,
    amount: usize,
    category: Option<usize>,
}

impl ColumnMapping {
    fn from_headers(headers: &StringRecord) -> Result<Self, Error> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(column))
        };

        let name = find("name").ok_or_else(|| {
            Error::InvalidCSV("the header is missing the \"name\" column".to_owned())
        })?;
        let amount = find("amount").ok_or_else(|| {
            Error::InvalidCSV("the header is missing the \"amount\" column".to_owned())
        })?;

        Ok(Self {
            name,
            amount,
            category: find("category"),
        })
    }
}

/// Parse CSV text into validated entries.
///
/// Rows with invalid fields are collected in [ParsedCsv::skipped] rather than
/// failing the parse.
///
/// # Errors
///
/// Returns [Error::InvalidCSV] if the input is not UTF-8 or the header lacks a
/// `name` or `amount` column.
pub fn parse_entries_csv(mut reader: impl Read) -> Result<ParsedCsv, Error> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|error| Error::InvalidCSV(format!("could not read the file as UTF-8: {error}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut csv_reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = csv_reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?
        .clone();
    let mapping = ColumnMapping::from_headers(&headers)?;

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (index, result) in csv_reader.records().enumerate() {
        // Header is line 1.
        let fallback_row = index + 2;

        let record = match result {
            Ok(record) => record,
            Err(error) => {
                let row = error
                    .position()
                    .map(|position| position.line() as usize)
                    .unwrap_or(fallback_row);
                skipped.push(ImportRowError {
                    row,
                    reason: error.to_string(),
                });
                continue;
            }
        };

        let row = record
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(fallback_row);

        match parse_record(&record, mapping) {
            Ok(entry) => entries.push(entry),
            Err(error) => skipped.push(ImportRowError {
                row,
                reason: error.to_string(),
            }),
        }
    }

    Ok(ParsedCsv { entries, skipped })
}

fn parse_record(record: &StringRecord, mapping: ColumnMapping) -> Result<NewEntry, Error> {
    let name = record.get(mapping.name).unwrap_or_default();
    let amount = Amount::parse(record.get(mapping.amount).unwrap_or_default())?;
    let category = mapping.category.and_then(|column| record.get(column));

    NewEntry::new(name, amount.value(), category)
}

/// Parse CSV text and create one entry per valid row.
///
/// Rows are created one at a time, so an error part way through leaves the
/// earlier rows in place. Skipped rows are logged and returned in the summary.
pub fn import_entries_csv(
    reader: impl Read,
    connection: &Connection,
) -> Result<ImportSummary, Error> {
    let parsed = parse_entries_csv(reader)?;

    store_parsed_csv(parsed, connection)
}

/// Create the entries of an already parsed CSV file.
pub fn store_parsed_csv(
    parsed: ParsedCsv,
    connection: &Connection,
) -> Result<ImportSummary, Error> {
    let ParsedCsv { entries, skipped } = parsed;

    for row_error in &skipped {
        tracing::warn!(
            "Skipping CSV row {}: {}",
            row_error.row,
            row_error.reason
        );
    }

    let mut imported = 0;

    for entry in entries {
        create_entry(entry, connection)?;
        imported += 1;
    }

    tracing::info!(
        "Imported {imported} entries from CSV, skipped {} rows",
        skipped.len()
    );

    Ok(ImportSummary { imported, skipped })
}

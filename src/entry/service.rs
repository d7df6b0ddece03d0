//! A single entry point over the entry store and the CSV transcoder.

use std::io::Read;

use rusqlite::Connection;

use crate::{
    Error,
    entry::{
        Entry, EntryId, EntryPatch, ImportSummary, NewEntry, create_entry, delete_entry,
        export_entries_csv, get_all_entries, get_entry, import_entries_csv, parse_entries_csv,
        store_parsed_csv, update_entry,
    },
};

/// Validates raw field values and delegates to the store and the CSV transcoder.
///
/// Borrows the connection for as long as the service is alive, so in the
/// server a service is created per request while the database lock is held.
#[derive(Debug, Clone, Copy)]
pub struct EntryService<'a> {
    connection: &'a Connection,
}

impl<'a> EntryService<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    /// Validate the fields and store a new entry.
    pub fn create_entry(
        &self,
        name: &str,
        amount: f64,
        category: Option<&str>,
    ) -> Result<Entry, Error> {
        let new_entry = NewEntry::new(name, amount, category)?;
        let entry = create_entry(new_entry, self.connection)?;

        tracing::debug!("Created entry {}", entry.id);

        Ok(entry)
    }

    pub fn get_entry(&self, id: EntryId) -> Result<Entry, Error> {
        get_entry(id, self.connection)
    }

    pub fn list_entries(&self) -> Result<Vec<Entry>, Error> {
        get_all_entries(self.connection)
    }

    /// Overwrite all the fields of an entry. A `None` category clears it.
    pub fn update_entry(
        &self,
        id: EntryId,
        name: &str,
        amount: f64,
        category: Option<&str>,
    ) -> Result<(), Error> {
        let new_entry = NewEntry::new(name, amount, category)?;
        update_entry(id, new_entry, self.connection)
    }

    /// Update the fields given in `patch`, keeping the current values of the rest.
    ///
    /// Returns the updated entry.
    pub fn patch_entry(&self, id: EntryId, patch: EntryPatch) -> Result<Entry, Error> {
        let current = get_entry(id, self.connection)?;
        let new_entry = patch.apply(&current)?;

        update_entry(id, new_entry.clone(), self.connection)?;

        Ok(Entry {
            id,
            name: new_entry.name,
            amount: new_entry.amount,
            category: new_entry.category,
        })
    }

    pub fn delete_entry(&self, id: EntryId) -> Result<(), Error> {
        delete_entry(id, self.connection)
    }

    /// All entries as CSV text with the header `name,amount,category`.
    pub fn export_csv(&self) -> Result<String, Error> {
        let entries = get_all_entries(self.connection)?;
        export_entries_csv(&entries)
    }

    /// Create an entry for each valid row of the CSV in `reader`.
    pub fn import_csv(&self, reader: impl Read) -> Result<ImportSummary, Error> {
        import_entries_csv(reader, self.connection)
    }

    /// Import several CSV files as a unit.
    ///
    /// Every file is parsed before any row is stored, and the rows are
    /// created in one transaction. If any file cannot be parsed, or a row
    /// cannot be stored, nothing is imported. Returns one summary per file,
    /// in the order given.
    pub fn import_csv_files<R: Read>(
        &self,
        readers: impl IntoIterator<Item = R>,
    ) -> Result<Vec<ImportSummary>, Error> {
        let parsed_files = readers
            .into_iter()
            .map(parse_entries_csv)
            .collect::<Result<Vec<_>, _>>()?;

        let transaction = self.connection.unchecked_transaction()?;
        let summaries = parsed_files
            .into_iter()
            .map(|parsed| store_parsed_csv(parsed, &transaction))
            .collect::<Result<Vec<_>, _>>()?;
        transaction.commit()?;

        Ok(summaries)
    }
}

//! Database setup shared by the server and the CLI.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, entry::create_entry_table};

/// Create the tables for the app's domain models if they do not exist yet.
///
/// Safe to call on a database that was already initialized.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_entry_table(&transaction)?;

    transaction.commit()?;

    tracing::debug!("Database initialized");

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        entry::{EntryService, count_entries},
    };

    #[test]
    fn creates_entry_table() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");

        assert_eq!(count_entries(&connection), Ok(0));
    }

    #[test]
    fn can_run_twice_without_losing_data() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        EntryService::new(&connection)
            .create_entry("Rent", 1200.0, Some("Housing"))
            .unwrap();

        initialize(&connection).expect("Could not initialize database twice");

        assert_eq!(count_entries(&connection), Ok(1));
    }
}

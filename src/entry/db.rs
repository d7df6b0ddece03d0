//! Database operations for entries.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    entry::{Amount, Category, Entry, EntryId, EntryName, NewEntry},
};

/// Create an entry with a freshly generated ID and return it.
pub fn create_entry(new_entry: NewEntry, connection: &Connection) -> Result<Entry, Error> {
    let id = EntryId::new();

    connection.execute(
        "INSERT INTO entry (id, name, amount, category) VALUES (?1, ?2, ?3, ?4);",
        (
            id,
            new_entry.name.as_ref(),
            new_entry.amount.value(),
            new_entry.category.as_ref().map(AsRef::<str>::as_ref),
        ),
    )?;

    Ok(Entry {
        id,
        name: new_entry.name,
        amount: new_entry.amount,
        category: new_entry.category,
    })
}

/// Retrieve a single entry by ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if no entry has the ID `entry_id`.
pub fn get_entry(entry_id: EntryId, connection: &Connection) -> Result<Entry, Error> {
    connection
        .prepare("SELECT id, name, amount, category FROM entry WHERE id = :id;")?
        .query_row(&[(":id", &entry_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all entries in insertion order.
pub fn get_all_entries(connection: &Connection) -> Result<Vec<Entry>, Error> {
    connection
        .prepare("SELECT id, name, amount, category FROM entry ORDER BY rowid ASC;")?
        .query_map([], map_row)?
        .map(|maybe_entry| maybe_entry.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the name, amount and category of an entry.
///
/// # Errors
///
/// Returns [Error::NotFound] if no entry has the ID `entry_id`.
pub fn update_entry(
    entry_id: EntryId,
    new_entry: NewEntry,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE entry SET name = ?1, amount = ?2, category = ?3 WHERE id = ?4",
        (
            new_entry.name.as_ref(),
            new_entry.amount.value(),
            new_entry.category.as_ref().map(AsRef::<str>::as_ref),
            entry_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete an entry by ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if no entry has the ID `entry_id`.
pub fn delete_entry(entry_id: EntryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM entry WHERE id = ?1", [entry_id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Count the stored entries.
pub fn count_entries(connection: &Connection) -> Result<usize, Error> {
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM entry;", [], |row| row.get(0))?;

    usize::try_from(count).map_err(|error| {
        tracing::error!("Could not convert entry count {count} to usize: {error}");
        Error::SqlError(rusqlite::Error::IntegralValueOutOfRange(0, count))
    })
}

/// Initialize the entry table.
pub fn create_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS entry (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Entry, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_amount: f64 = row.get(2)?;
    let raw_category: Option<String> = row.get(3)?;

    Ok(Entry {
        id,
        name: EntryName::new_unchecked(&raw_name),
        amount: Amount::new(raw_amount).map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Real,
                Box::new(error),
            )
        })?,
        category: raw_category.as_deref().map(Category::new_unchecked),
    })
}

#[cfg(test)]
mod entry_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        entry::{
            EntryId, NewEntry, count_entries, create_entry, delete_entry, get_all_entries,
            get_entry, update_entry,
        },
    };

    use super::create_entry_table;

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_entry_table(&connection).expect("Could not create entry table");
        connection
    }

    fn rent() -> NewEntry {
        NewEntry::new("Rent", 1200.0, Some("Housing")).unwrap()
    }

    #[test]
    fn create_entry_succeeds() {
        let connection = get_test_db_connection();

        let entry = create_entry(rent(), &connection).expect("Could not create entry");

        assert_eq!(entry.name.as_ref(), "Rent");
        assert_eq!(entry.amount.value(), 1200.0);
        assert_eq!(
            entry.category.as_ref().map(|category| category.as_ref()),
            Some("Housing")
        );
        assert_eq!(get_entry(entry.id, &connection), Ok(entry));
    }

    #[test]
    fn create_entry_without_category_stores_null() {
        let connection = get_test_db_connection();
        let new_entry = NewEntry::new("Coffee", 4.5, None).unwrap();

        let entry = create_entry(new_entry, &connection).expect("Could not create entry");

        let category: Option<String> = connection
            .query_row(
                "SELECT category FROM entry WHERE id = ?1",
                [entry.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(category, None);
        assert_eq!(get_entry(entry.id, &connection).unwrap().category, None);
    }

    #[test]
    fn create_entry_generates_distinct_ids() {
        let connection = get_test_db_connection();

        let first = create_entry(rent(), &connection).unwrap();
        let second = create_entry(rent(), &connection).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(count_entries(&connection), Ok(2));
    }

    #[test]
    fn get_entry_with_unknown_id_returns_not_found() {
        let connection = get_test_db_connection();
        create_entry(rent(), &connection).unwrap();

        assert_eq!(get_entry(EntryId::new(), &connection), Err(Error::NotFound));
    }

    #[test]
    fn get_all_entries_preserves_insertion_order() {
        let connection = get_test_db_connection();
        let names = ["Rent", "Coffee", "Tea", "Bus fare"];
        for name in names {
            create_entry(NewEntry::new(name, 1.0, None).unwrap(), &connection).unwrap();
        }

        let got = get_all_entries(&connection).expect("Could not get entries");

        let got_names: Vec<&str> = got.iter().map(|entry| entry.name.as_ref()).collect();
        assert_eq!(got_names, names);
    }

    #[test]
    fn get_all_entries_on_empty_table() {
        let connection = get_test_db_connection();

        assert_eq!(get_all_entries(&connection), Ok(vec![]));
    }

    #[test]
    fn update_entry_overwrites_fields() {
        let connection = get_test_db_connection();
        let entry = create_entry(rent(), &connection).unwrap();
        let replacement = NewEntry::new("Rent (new flat)", 1350.0, None).unwrap();

        update_entry(entry.id, replacement.clone(), &connection).expect("Could not update entry");

        let got = get_entry(entry.id, &connection).unwrap();
        assert_eq!(got.id, entry.id);
        assert_eq!(got.name, replacement.name);
        assert_eq!(got.amount, replacement.amount);
        assert_eq!(got.category, None);
    }

    #[test]
    fn update_missing_entry_returns_not_found() {
        let connection = get_test_db_connection();

        assert_eq!(
            update_entry(EntryId::new(), rent(), &connection),
            Err(Error::NotFound)
        );
        assert_eq!(count_entries(&connection), Ok(0));
    }

    #[test]
    fn delete_entry_removes_only_that_entry() {
        let connection = get_test_db_connection();
        let keep = create_entry(rent(), &connection).unwrap();
        let remove = create_entry(NewEntry::new("Coffee", 4.5, None).unwrap(), &connection).unwrap();

        delete_entry(remove.id, &connection).expect("Could not delete entry");

        assert_eq!(get_entry(remove.id, &connection), Err(Error::NotFound));
        assert_eq!(get_all_entries(&connection), Ok(vec![keep]));
    }

    #[test]
    fn delete_missing_entry_returns_not_found() {
        let connection = get_test_db_connection();
        create_entry(rent(), &connection).unwrap();

        assert_eq!(
            delete_entry(EntryId::new(), &connection),
            Err(Error::NotFound)
        );
        assert_eq!(count_entries(&connection), Ok(1));
    }

    #[test]
    fn create_table_is_idempotent() {
        let connection = get_test_db_connection();
        create_entry(rent(), &connection).unwrap();

        create_entry_table(&connection).expect("Could not recreate entry table");

        assert_eq!(count_entries(&connection), Ok(1));
    }

    #[test]
    fn count_entries_tracks_creates_and_deletes() {
        let connection = get_test_db_connection();
        assert_eq!(count_entries(&connection), Ok(0));

        let entry = create_entry(rent(), &connection).unwrap();
        create_entry(rent(), &connection).unwrap();
        assert_eq!(count_entries(&connection), Ok(2));

        delete_entry(entry.id, &connection).unwrap();
        assert_eq!(count_entries(&connection), Ok(1));
    }
}

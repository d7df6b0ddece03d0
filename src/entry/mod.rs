//! Ledger entries: the domain types, the SQLite store, CSV import/export, the
//! [EntryService] facade and the web UI and JSON API handlers built on top.

mod api;
mod create;
mod csv;
mod db;
mod delete;
mod domain;
mod edit;
mod export;
mod import;
mod list;
mod search;
mod service;

pub use api::{
    create_entry_api, delete_entry_api, export_entries_api, get_entry_api, import_entries_api,
    list_entries_api, update_entry_api,
};
pub use create::{create_entry_endpoint, get_new_entry_page};
pub use csv::{
    CSV_HEADER, ImportRowError, ImportSummary, ParsedCsv, export_entries_csv, import_entries_csv,
    parse_entries_csv, store_parsed_csv,
};
pub use db::{
    count_entries, create_entry, create_entry_table, delete_entry, get_all_entries, get_entry,
    update_entry,
};
pub use delete::delete_entry_endpoint;
pub use domain::{
    Amount, CATEGORY_MAX_LENGTH, Category, Entry, EntryId, EntryName, EntryPatch, Field,
    NAME_MAX_LENGTH, NAME_MIN_LENGTH, NewEntry, ValidationError,
};
pub use edit::{get_edit_entry_page, update_entry_endpoint};
pub use export::export_entries;
pub use import::{get_import_page, import_entries};
pub use list::get_entries_page;
pub use search::get_search_entry_page;
pub use service::EntryService;

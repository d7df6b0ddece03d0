use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use ledger_rs::{
    Entry, EntryId, EntryPatch, EntryService, Error, PasswordHash, ValidatedPassword,
    initialize_db,
};

/// Manage ledger entries from the command line.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "LEDGER_DB_PATH", default_value = "ledger.db")]
    db_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database tables.
    InitDb,

    /// Print every entry.
    GetEntries,

    /// Print a single entry.
    GetEntry {
        #[arg(long)]
        id: EntryId,
    },

    /// Create a new entry.
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, allow_negative_numbers = true)]
        amount: f64,

        #[arg(short, long)]
        category: Option<String>,
    },

    /// Change some fields of an entry, the others keep their current values.
    Update {
        #[arg(long)]
        id: EntryId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        amount: Option<f64>,

        #[arg(long)]
        category: Option<String>,
    },

    /// Delete an entry.
    Delete {
        #[arg(long)]
        id: EntryId,
    },

    /// Write every entry to a CSV file.
    ExportCsv {
        #[arg(short, long, default_value = "exported_data.csv")]
        output: PathBuf,
    },

    /// Create entries from the rows of a CSV file.
    ImportCsv { file: PathBuf },

    /// Hash a password for the credentials file.
    HashPassword,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            print_error(error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let command = match args.command {
        Command::HashPassword => return hash_password(),
        command => command,
    };

    let connection = open_database(&args.db_path)?;
    let service = EntryService::new(&connection);

    match command {
        Command::InitDb => {
            println!("Initialized database at {}", args.db_path.display());
        }
        Command::GetEntries => {
            for entry in service.list_entries()? {
                print_entry(&entry);
            }
        }
        Command::GetEntry { id } => print_entry(&service.get_entry(id)?),
        Command::Create {
            name,
            amount,
            category,
        } => {
            let entry = service.create_entry(&name, amount, category.as_deref())?;
            println!("Created entry {}", entry.id);
        }
        Command::Update {
            id,
            name,
            amount,
            category,
        } => {
            let entry = service.patch_entry(
                id,
                EntryPatch {
                    name,
                    amount,
                    category,
                },
            )?;
            print_entry(&entry);
        }
        Command::Delete { id } => {
            service.delete_entry(id)?;
            println!("Deleted entry {id}");
        }
        Command::ExportCsv { output } => {
            let csv = service.export_csv()?;
            fs::write(&output, csv)?;
            println!("Exported entries to {}", output.display());
        }
        Command::ImportCsv { file } => {
            let summary = service.import_csv(File::open(&file)?)?;

            for row_error in &summary.skipped {
                eprintln!("Skipped row {}: {}", row_error.row, row_error.reason);
            }

            println!(
                "Imported {} entries, skipped {} rows",
                summary.imported,
                summary.skipped.len()
            );
        }
        Command::HashPassword => hash_password()?,
    }

    Ok(())
}

fn open_database(db_path: &Path) -> Result<Connection, Error> {
    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    Ok(connection)
}

fn print_entry(entry: &Entry) {
    let category = entry
        .category
        .as_ref()
        .map(|category| category.as_ref())
        .unwrap_or("-");

    println!(
        "{}\t{}\t{}\t{}",
        entry.id, entry.name, entry.amount, category
    );
}

fn hash_password() -> Result<(), Error> {
    loop {
        let password = match rpassword::prompt_password("Enter a password: ") {
            Ok(password) => password,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        let password = match ValidatedPassword::new(&password) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;
        println!("{hash}");

        return Ok(());
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string());
}

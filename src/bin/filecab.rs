//! filecab CLI
//!
//! Interactive console over a cabinet service. Commands are dispatched
//! through a single name → handler table; every handler receives the
//! service explicitly, so there is no global service state anywhere.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use chrono::NaiveDate;
use filecab::record::apply_field;
use filecab::{CabinetError, CabinetService, Config, Money, Record, Snapshot};

/// filecab interactive console
#[derive(Parser, Debug)]
#[command(name = "filecab")]
#[command(about = "File-cabinet record store console", version = filecab::VERSION)]
struct Args {
    /// Path of the cabinet file
    #[arg(long, default_value = "cabinet-records.db")]
    db: PathBuf,

    /// Storage backend
    #[arg(long, value_enum, default_value = "file")]
    storage: StorageArg,

    /// Validation rule preset
    #[arg(long, value_enum, default_value = "default")]
    validation: ValidationArg,

    /// Log every service call with its duration
    #[arg(long)]
    log_calls: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StorageArg {
    File,
    Memory,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ValidationArg {
    Default,
    Custom,
}

/// One REPL command: parses its argument tail and runs against the service
type Handler = fn(&mut dyn CabinetService, &str) -> filecab::Result<String>;

/// The dispatch table: command name, usage line, handler
const COMMANDS: &[(&str, &str, Handler)] = &[
    ("create", "create <id> field=value ...", cmd_create),
    ("edit", "edit <id> field=value ...", cmd_edit),
    ("delete", "delete <id>", cmd_delete),
    ("find", "find <firstname|lastname|dateofbirth> <value>", cmd_find),
    ("list", "list", cmd_list),
    ("stat", "stat", cmd_stat),
    ("purge", "purge", cmd_purge),
    ("export", "export <csv|xml> <path>", cmd_export),
    ("import", "import <csv|xml> <path>", cmd_import),
];

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .db_path(&args.db)
        .storage(match args.storage {
            StorageArg::File => filecab::StorageKind::File,
            StorageArg::Memory => filecab::StorageKind::Memory,
        })
        .validation(match args.validation {
            ValidationArg::Default => filecab::ValidationPreset::Default,
            ValidationArg::Custom => filecab::ValidationPreset::Custom,
        })
        .log_calls(args.log_calls)
        .build();

    let mut service = match filecab::open(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("failed to open cabinet: {}", e);
            std::process::exit(1);
        }
    };

    println!("filecab {} - type 'help' for commands, 'exit' to quit", filecab::VERSION);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((head, tail)) => (head, tail.trim()),
            None => (line, ""),
        };

        match command {
            "exit" | "quit" => break,
            "help" => print_help(),
            _ => match COMMANDS.iter().find(|(name, _, _)| *name == command) {
                Some((_, _, handler)) => match handler(service.as_mut(), rest) {
                    Ok(output) => println!("{}", output),
                    Err(e) => println!("error: {}", e),
                },
                None => println!("unknown command '{}', try 'help'", command),
            },
        }
    }

    Ok(())
}

fn print_help() {
    println!("commands:");
    for (_, usage, _) in COMMANDS {
        println!("  {}", usage);
    }
    println!("  help");
    println!("  exit");
    let fields: Vec<&str> = filecab::record::field_names().collect();
    println!("fields: {}", fields.join(", "));
}

// =============================================================================
// Argument Parsing Helpers
// =============================================================================

fn usage(message: &str) -> CabinetError {
    CabinetError::Validation(message.to_string())
}

fn parse_id(token: &str) -> filecab::Result<i32> {
    token
        .parse()
        .map_err(|_| usage("expected a numeric record id"))
}

/// A record with neutral defaults, to be filled by field=value pairs
fn blank_record(id: i32) -> Record {
    Record {
        id,
        first_name: String::new(),
        last_name: String::new(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        height: 0,
        money: Money::ZERO,
        gender: 'N',
    }
}

/// Apply whitespace-separated `field=value` pairs through the binding table
fn apply_pairs(record: &mut Record, rest: &str) -> filecab::Result<()> {
    for pair in rest.split_whitespace() {
        let (field, value) = pair
            .split_once('=')
            .ok_or_else(|| usage("expected field=value pairs"))?;
        apply_field(record, field, value)?;
    }
    Ok(())
}

// =============================================================================
// Command Handlers
// =============================================================================

fn cmd_create(service: &mut dyn CabinetService, rest: &str) -> filecab::Result<String> {
    let (id_token, pairs) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| usage("usage: create <id> field=value ..."))?;

    let mut record = blank_record(parse_id(id_token)?);
    apply_pairs(&mut record, pairs)?;
    service.add_record(&record)?;
    Ok(format!("record #{} created", record.id))
}

fn cmd_edit(service: &mut dyn CabinetService, rest: &str) -> filecab::Result<String> {
    let (id_token, pairs) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| usage("usage: edit <id> field=value ..."))?;
    let id = parse_id(id_token)?;

    // Start from the current values so untouched fields survive the edit
    let mut record = service
        .list()?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or(CabinetError::NotFound(id))?;
    apply_pairs(&mut record, pairs)?;
    service.edit_record(&record)?;
    Ok(format!("record #{} updated", id))
}

fn cmd_delete(service: &mut dyn CabinetService, rest: &str) -> filecab::Result<String> {
    let id = parse_id(rest.trim())?;
    service.remove_record(id)?;
    Ok(format!("record #{} removed", id))
}

fn cmd_find(service: &mut dyn CabinetService, rest: &str) -> filecab::Result<String> {
    let (field, value) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| usage("usage: find <firstname|lastname|dateofbirth> <value>"))?;
    let value = value.trim();

    let records = match field.to_ascii_lowercase().as_str() {
        "firstname" => service.find_by_first_name(value)?,
        "lastname" => service.find_by_last_name(value)?,
        "dateofbirth" => {
            let date: NaiveDate = value
                .parse()
                .map_err(|_| usage("expected a YYYY-MM-DD date"))?;
            service.find_by_date_of_birth(date)?
        }
        other => return Err(usage(&format!("cannot search by '{}'", other))),
    };

    Ok(render(&records))
}

fn cmd_list(service: &mut dyn CabinetService, _rest: &str) -> filecab::Result<String> {
    Ok(render(&service.list()?))
}

fn cmd_stat(service: &mut dyn CabinetService, _rest: &str) -> filecab::Result<String> {
    Ok(service.stat()?.to_string())
}

fn cmd_purge(service: &mut dyn CabinetService, _rest: &str) -> filecab::Result<String> {
    Ok(service.purge()?.to_string())
}

fn cmd_export(service: &mut dyn CabinetService, rest: &str) -> filecab::Result<String> {
    let (format, path) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| usage("usage: export <csv|xml> <path>"))?;

    let snapshot = service.make_snapshot()?;
    let mut file = File::create(path.trim())?;
    match format.to_ascii_lowercase().as_str() {
        "csv" => snapshot.to_csv(&mut file)?,
        "xml" => snapshot.to_xml(&mut file)?,
        other => return Err(usage(&format!("unknown export format '{}'", other))),
    }
    Ok(format!("{} records exported to {}", snapshot.len(), path.trim()))
}

fn cmd_import(service: &mut dyn CabinetService, rest: &str) -> filecab::Result<String> {
    let (format, path) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| usage("usage: import <csv|xml> <path>"))?;

    let snapshot = match format.to_ascii_lowercase().as_str() {
        "csv" => Snapshot::from_csv(BufReader::new(File::open(path.trim())?))?,
        "xml" => Snapshot::from_xml(&std::fs::read_to_string(path.trim())?)?,
        other => return Err(usage(&format!("unknown import format '{}'", other))),
    };

    let affected = service.restore(&snapshot)?;
    Ok(format!("{} records imported from {}", affected, path.trim()))
}

fn render(records: &[Record]) -> String {
    if records.is_empty() {
        return "no records".to_string();
    }
    records
        .iter()
        .map(Record::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

use alpr::application::engine::ReconciliationEngine;
use alpr::config::EngineConfig;
use alpr::domain::employee::Employee;
use alpr::domain::ports::{Directories, EmployeeDirectoryBox, Stores};
use alpr::infrastructure::in_memory::{
    InMemoryAttendanceStore, InMemoryEmployeeDirectory, InMemoryLeaveStore,
    InMemoryLocationDirectory, InMemoryPayslipStore, InMemorySiteAssignments,
};
use alpr::interfaces::csv::directory_reader::DirectoryReader;
use alpr::interfaces::journal::command_reader::CommandReader;
use alpr::interfaces::journal::outcome_writer::OutcomeWriter;
use alpr::interfaces::journal::runner::JournalRunner;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command journal (JSON lines)
    journal: PathBuf,

    /// Employee directory CSV file
    #[arg(long)]
    employees: PathBuf,

    /// Work locations CSV file, in matching order
    #[arg(long)]
    locations: Option<PathBuf>,

    /// Per-day site assignments CSV file
    #[arg(long)]
    assignments: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "ALPR_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Geofence radius in meters for locations without their own
    #[arg(long, env = "ALPR_DEFAULT_RADIUS", default_value_t = 100.0)]
    default_radius: f64,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn read_employees(path: &Path) -> Result<Vec<Employee>> {
    let file = File::open(path).into_diagnostic()?;
    let mut employees = Vec::new();
    for row in DirectoryReader::new(file).employees() {
        match row {
            Ok(employee) => employees.push(employee),
            Err(e) => warn!(error = %e, "Skipping employee row"),
        }
    }
    Ok(employees)
}

#[cfg(feature = "storage-rocksdb")]
async fn open_storage(
    db_path: Option<PathBuf>,
    employees: Vec<Employee>,
) -> Result<(Stores, EmployeeDirectoryBox)> {
    use alpr::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = db_path {
        let store = RocksDBStore::open(&db_path).into_diagnostic()?;
        for employee in &employees {
            // Persisted balances win over the seed file.
            store.register_employee(employee).await.into_diagnostic()?;
        }
        info!(path = %db_path.display(), "Using RocksDB storage");
        let stores = Stores {
            attendance: Box::new(store.clone()),
            leaves: Box::new(store.clone()),
            payslips: Box::new(store.clone()),
        };
        return Ok((stores, Box::new(store)));
    }
    in_memory_storage(employees)
}

#[cfg(not(feature = "storage-rocksdb"))]
async fn open_storage(
    db_path: Option<PathBuf>,
    employees: Vec<Employee>,
) -> Result<(Stores, EmployeeDirectoryBox)> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not \
             enabled. Falling back to in-memory storage."
        );
    }
    in_memory_storage(employees)
}

fn in_memory_storage(employees: Vec<Employee>) -> Result<(Stores, EmployeeDirectoryBox)> {
    let directory = InMemoryEmployeeDirectory::from_employees(employees);
    let stores = Stores {
        attendance: Box::new(InMemoryAttendanceStore::new()),
        leaves: Box::new(InMemoryLeaveStore::new()),
        payslips: Box::new(InMemoryPayslipStore::new()),
    };
    Ok((stores, Box::new(directory)))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = EngineConfig::with_default_radius(cli.default_radius).into_diagnostic()?;

    let employees = read_employees(&cli.employees)?;

    let locations = match &cli.locations {
        Some(path) => {
            let file = File::open(path).into_diagnostic()?;
            let mut locations = Vec::new();
            for row in DirectoryReader::new(file).locations() {
                match row {
                    Ok(location) => locations.push(location),
                    Err(e) => warn!(error = %e, "Skipping location row"),
                }
            }
            locations
        }
        None => Vec::new(),
    };

    let assignments = InMemorySiteAssignments::new();
    if let Some(path) = &cli.assignments {
        let file = File::open(path).into_diagnostic()?;
        for row in DirectoryReader::new(file).assignments() {
            match row {
                Ok(a) => assignments.assign(a.employee_id, a.date, a.location_id).await,
                Err(e) => warn!(error = %e, "Skipping assignment row"),
            }
        }
    }

    info!(
        employees = employees.len(),
        locations = locations.len(),
        "Directories loaded"
    );

    let (stores, employee_directory) = open_storage(cli.db_path, employees).await?;
    let engine = ReconciliationEngine::new(
        stores,
        Directories {
            employees: employee_directory,
            locations: Box::new(InMemoryLocationDirectory::new(locations)),
            assignments: Box::new(assignments),
        },
        config,
    );

    let journal = File::open(&cli.journal).into_diagnostic()?;
    let mut runner = JournalRunner::new(&engine);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    for (line, command) in CommandReader::new(BufReader::new(journal)).commands() {
        let command = match command {
            Ok(command) => command,
            Err(e) => {
                warn!(line, error = %e, "Error reading command");
                continue;
            }
        };
        let op = command.op();
        match runner.execute(command).await {
            Ok(value) => writer.write_ok(line, op, &value).into_diagnostic()?,
            Err(e) => {
                warn!(line, op, error = %e, "Error processing command");
                writer.write_err(line, op, &e).into_diagnostic()?;
            }
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}

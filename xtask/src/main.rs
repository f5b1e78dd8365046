use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

const MIGRATIONS_DIR: &str = "crates/valyan-store-sqlite/migrations";

#[derive(Error, Debug)]
enum XtaskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Environment variable not set: {0}")]
    VarError(#[from] std::env::VarError),
    #[error("Failed to read migrations directory: {0}")]
    ReadMigrations(String),
    #[error("No migration files found in {0}")]
    NoMigrations(String),
    #[error("Failed to read migration {0}: {1}")]
    ReadMigration(String, std::io::Error),
    #[error("Bad migration file name {0}: expected <14-digit version>_<name>.sql")]
    BadMigrationName(String),
    #[error("Duplicate migration version {0}")]
    DuplicateVersion(String),
    #[error("Failed to run sqlite3. Is it installed?")]
    Sqlite3NotFound,
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
    #[error("Failed to get parent directory")]
    NoParentDir,
}

type Result<T> = std::result::Result<T, XtaskError>;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for the valyan workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a development SQLite database from the migrations
    SetupDb {
        /// Database file to (re)create
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Check migration file names and versions
    CheckMigrations,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_root = project_root()?;
    let migration_dir = project_root.join(MIGRATIONS_DIR);

    match cli.command {
        Commands::SetupDb { path } => {
            let db_path = path.unwrap_or_else(|| project_root.join("valyan-dev.db"));
            setup_sqlite(&migration_dir, &db_path)
        }
        Commands::CheckMigrations => {
            let migrations = list_migrations(&migration_dir)?;
            println!("✓ {} migration(s) look fine", migrations.len());
            Ok(())
        }
    }
}

/// `.sql` files of `dir` in apply order, validated.
fn list_migrations(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut migrations: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| XtaskError::ReadMigrations(e.to_string()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    migrations.sort();

    if migrations.is_empty() {
        return Err(XtaskError::NoMigrations(dir.display().to_string()));
    }

    let mut versions = BTreeSet::new();
    for path in &migrations {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let version = migration_version(&name)
            .ok_or_else(|| XtaskError::BadMigrationName(name.clone()))?;
        if !versions.insert(version.to_string()) {
            return Err(XtaskError::DuplicateVersion(version.to_string()));
        }
    }

    Ok(migrations)
}

fn migration_version(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".sql")?;
    let (version, name) = stem.split_once('_')?;
    let valid = version.len() == 14
        && version.chars().all(|c| c.is_ascii_digit())
        && !name.is_empty();
    valid.then_some(version)
}

fn setup_sqlite(migration_dir: &Path, db_path: &Path) -> Result<()> {
    println!("🔧 Setting up SQLite development database...");

    let migrations = list_migrations(migration_dir)?;

    if db_path.exists() {
        std::fs::remove_file(db_path)?;
    }

    for path in migrations {
        println!(
            "  Applying: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        let sql = std::fs::read_to_string(&path)
            .map_err(|e| XtaskError::ReadMigration(path.display().to_string(), e))?;

        let status = Command::new("sqlite3")
            .arg(db_path)
            .arg(&sql)
            .status()
            .map_err(|_| XtaskError::Sqlite3NotFound)?;

        if !status.success() {
            return Err(XtaskError::MigrationFailed(path.display().to_string()));
        }
    }

    println!("✓ SQLite database created at: {}", db_path.display());
    println!();
    println!("Next steps:");
    println!(
        "  valyan-admin --database-url sqlite://{} role seed",
        db_path.display()
    );

    Ok(())
}

fn project_root() -> Result<PathBuf> {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")?;
    let xtask_dir = PathBuf::from(manifest_dir);
    let parent = xtask_dir.parent().ok_or(XtaskError::NoParentDir)?;
    Ok(parent.to_path_buf())
}

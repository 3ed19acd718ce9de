use clap::{Parser, Subcommand, ValueEnum};
use proctor_audit::Auditor;
use proctor_core::{from_yaml, to_json_pretty, validate_catalog, Catalog, SessionId};
use proctor_scheduler::{Scheduler, SchedulerConfig, SchedulingResult};
use proctor_storage::{AssignmentStore, CatalogProvider, RedbBackend, Repository};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "proctor", about = "Exam session scheduler and conflict auditor")]
struct Cli {
    /// Path to the redb database file
    #[arg(long, env = "PROCTOR_DATA", default_value = "./proctor.redb", global = true)]
    db_path: PathBuf,

    /// Log output format
    #[arg(long, env = "PROCTOR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a YAML or JSON catalog and write it to the database
    Import {
        /// Catalog file with sessions, rooms, professors and exam units
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Plan the pending exam units of one or every session
    Schedule {
        /// Session to plan
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        session: Option<u32>,
        /// Plan every session, in parallel
        #[arg(long)]
        all: bool,
        /// Stop trying new units after this many milliseconds
        #[arg(long, env = "PROCTOR_DEADLINE_MS")]
        deadline_ms: Option<u64>,
    },
    /// Audit the committed assignments of a session
    Audit {
        #[arg(long)]
        session: u32,
    },
    /// Print the committed assignments of a session
    Assignments {
        #[arg(long)]
        session: u32,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON results
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    let repo = open_repository(&cli.db_path)?;

    match cli.command {
        Commands::Import { catalog } => run_import(&repo, &catalog),
        Commands::Schedule {
            session,
            all,
            deadline_ms,
        } => {
            let config = SchedulerConfig {
                deadline: deadline_ms.map(Duration::from_millis),
            };
            let scheduler = Arc::new(Scheduler::new(repo.clone(), config));
            match session {
                Some(id) if !all => {
                    let result = scheduler.schedule(SessionId(id))?;
                    print_json(&result)
                }
                _ => run_schedule_all(&repo, scheduler).await,
            }
        }
        Commands::Audit { session } => {
            let conflicts = Auditor::new(repo).audit(SessionId(session))?;
            print_json(&conflicts)
        }
        Commands::Assignments { session } => {
            let mut assignments = repo.assignments(SessionId(session))?;
            assignments.sort_by_key(|a| (a.slot, a.exam.key()));
            print_json(&assignments)
        }
    }
}

/// Open the database and wrap it in a repository
fn open_repository(db_path: &Path) -> miette::Result<Arc<Repository>> {
    let kv = RedbBackend::new(db_path).map_err(|e| {
        miette::miette!("Failed to open storage at '{}': {}", db_path.display(), e)
    })?;
    Ok(Arc::new(Repository::new(Arc::new(kv))))
}

fn run_import(repo: &Repository, path: &Path) -> miette::Result<()> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read catalog '{}': {}", path.display(), e))?;
    let catalog: Catalog = from_yaml(&data)?;
    validate_catalog(&catalog)?;

    let summary = repo.import_catalog(&catalog)?;
    print_json(&summary)
}

/// Plan every session on its own blocking task
async fn run_schedule_all(
    repo: &Repository,
    scheduler: Arc<Scheduler<Repository>>,
) -> miette::Result<()> {
    let sessions = repo.sessions()?;
    info!("Scheduling {} sessions", sessions.len());

    let handles: Vec<_> = sessions
        .into_iter()
        .map(|session| {
            let scheduler = scheduler.clone();
            tokio::task::spawn_blocking(move || scheduler.schedule(session.id))
        })
        .collect();

    let mut results: Vec<SchedulingResult> = Vec::with_capacity(handles.len());
    let mut failed = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(result)) => results.push(result),
            Ok(Err(e)) => {
                error!("Scheduling failed: {}", e);
                failed += 1;
            }
            Err(e) => {
                error!("Scheduling task panicked: {}", e);
                failed += 1;
            }
        }
    }

    print_json(&results)?;
    if failed > 0 {
        return Err(miette::miette!("{} session(s) failed to schedule", failed));
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> miette::Result<()> {
    println!("{}", to_json_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_is_global() {
        let cli = Cli::try_parse_from([
            "proctor",
            "audit",
            "--session",
            "3",
            "--db-path",
            "/tmp/exams.redb",
        ])
        .unwrap();
        assert_eq!(cli.db_path, PathBuf::from("/tmp/exams.redb"));
        assert!(matches!(cli.command, Commands::Audit { session: 3 }));
    }

    #[test]
    fn test_schedule_needs_session_or_all() {
        assert!(Cli::try_parse_from(["proctor", "schedule"]).is_err());
        assert!(Cli::try_parse_from(["proctor", "schedule", "--all", "--session", "1"]).is_err());
        assert!(Cli::try_parse_from(["proctor", "schedule", "--all"]).is_ok());
    }
}

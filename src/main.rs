use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "server")]
use chatflow::config::ServerConfig;
use chatflow::console::{self, ChatOptions};
use chatflow::database::{
    establish_connection, get_database_url, migrate_database, migrations::Migrator, seed_data,
    MigrateDirection, DEFAULT_DATABASE_PATH,
};
use chatflow::services::{DocumentFormat, ImportMode, ScenarioDocument, ScenarioService};

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scenario API.
    #[cfg(feature = "server")]
    Serve {
        #[clap(short, long)]
        port: Option<u16>,
        #[clap(short, long)]
        database: Option<String>,
        #[clap(long)]
        cors_origin: Option<String>,
        /// Load the bundled support scenarios when the store has no start scenario.
        #[clap(long)]
        seed: bool,
    },
    Db {
        #[clap(subcommand)]
        command: DbCommands,
    },
    Scenarios {
        #[clap(subcommand)]
        command: ScenarioCommands,
    },
    /// Walk the stored scenarios in the terminal.
    Chat(ChatOptions),
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    Init {
        #[clap(short, long, default_value = DEFAULT_DATABASE_PATH)]
        database: String,
    },
    Migrate {
        #[clap(subcommand)]
        direction: MigrateDirection,
        #[clap(short, long, default_value = DEFAULT_DATABASE_PATH)]
        database: String,
    },
    Seed {
        #[clap(short, long, default_value = DEFAULT_DATABASE_PATH)]
        database: String,
        /// Scenario document to load instead of the bundled one.
        #[clap(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ScenarioCommands {
    Export {
        #[clap(short, long, default_value = DEFAULT_DATABASE_PATH)]
        database: String,
        /// yaml or json; defaults to the output extension, else yaml.
        #[clap(short, long)]
        format: Option<String>,
        /// Written to stdout when omitted.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    Import {
        file: PathBuf,
        #[clap(short, long, default_value = DEFAULT_DATABASE_PATH)]
        database: String,
        /// Remove every stored scenario first.
        #[clap(long)]
        replace: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        #[cfg(feature = "server")]
        Commands::Serve {
            port,
            database,
            cors_origin,
            seed,
        } => {
            let config = ServerConfig::from_env().with_overrides(port, database, cors_origin, seed);
            info!("Starting server on port {}", config.port);
            chatflow::server::start_server(&config).await?;
        }
        Commands::Db { command } => match command {
            DbCommands::Init { database } => {
                info!("Initializing database: {}", database);
                migrate_database(&database, MigrateDirection::Up).await?;
            }
            DbCommands::Migrate {
                direction,
                database,
            } => {
                info!("Running database migration: {:?}", direction);
                migrate_database(&database, direction).await?;
            }
            DbCommands::Seed { database, file } => {
                let service = open_service(&database).await?;
                match file {
                    Some(path) => {
                        seed_data::seed_from_file(service.db(), &path).await?;
                    }
                    None => {
                        seed_data::seed_support_scenarios(service.db()).await?;
                    }
                }
            }
        },
        Commands::Scenarios { command } => match command {
            ScenarioCommands::Export {
                database,
                format,
                output,
            } => {
                let format = match (&format, &output) {
                    (Some(format), _) => format.parse::<DocumentFormat>()?,
                    (None, Some(path)) => DocumentFormat::from_path(path),
                    (None, None) => DocumentFormat::default(),
                };
                let service = open_service(&database).await?;
                let rendered = service.export_document().await?.render(format)?;
                match output {
                    Some(path) => {
                        tokio::fs::write(&path, rendered)
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        info!("Exported scenarios to {}", path.display());
                    }
                    None => print!("{}", rendered),
                }
            }
            ScenarioCommands::Import {
                file,
                database,
                replace,
            } => {
                let document = read_document(&file).await?;
                let mode = if replace {
                    ImportMode::Replace
                } else {
                    ImportMode::Merge
                };
                let service = open_service(&database).await?;
                let summary = service.import_document(&document, mode).await?;
                println!(
                    "Imported {} scenarios ({} new, {} updated) with {} options",
                    summary.created + summary.updated,
                    summary.created,
                    summary.updated,
                    summary.options
                );
            }
        },
        Commands::Chat(options) => {
            console::run_chat(options).await?;
        }
    }

    Ok(())
}

async fn open_service(database: &str) -> Result<ScenarioService> {
    let db = establish_connection(&get_database_url(Some(database))).await?;
    Migrator::up(&db, None).await?;
    Ok(ScenarioService::new(db))
}

async fn read_document(path: &Path) -> Result<ScenarioDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ScenarioDocument::parse(
        &content,
        DocumentFormat::from_path(path),
    )?)
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("sea_orm_migration=warn,{}", log_level)))
        .without_time()
        .init();
}

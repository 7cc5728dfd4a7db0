//! Terminal chat client: walks the stored scenario graph the same way the web
//! widget does, one numbered choice at a time.

mod render;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use sea_orm_migration::MigratorTrait;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::info;

use crate::database::{
    connection::{establish_connection, get_database_url},
    migrations::Migrator,
};
use crate::services::ScenarioService;
use crate::traversal::{ChatSession, DanglingPolicy, ScenarioGraph, Step};

pub use render::{format_entry, html_to_text};

/// CLI options for the `chat` subcommand.
#[derive(Debug, Clone, Args)]
pub struct ChatOptions {
    /// Path to the sqlite database. Defaults to `chatflow.db`.
    #[arg(long)]
    pub database: Option<String>,

    /// Message shown when an option leads to a missing scenario.
    #[arg(long)]
    pub fallback: Option<String>,
}

pub async fn run_chat(options: ChatOptions) -> Result<()> {
    let database_url = get_database_url(options.database.as_deref());
    let db = establish_connection(&database_url).await?;
    Migrator::up(&db, None).await?;

    let graph = ScenarioGraph::load(&ScenarioService::new(db)).await?;
    info!("Chat client loaded {} scenarios", graph.len());

    let policy = options
        .fallback
        .map(DanglingPolicy::Fallback)
        .unwrap_or_default();
    let mut session = ChatSession::with_policy(policy);
    session.start(&graph)?;

    println!(
        "{}",
        "Type a number to choose, 'r' to restart, or an empty line to quit.".dimmed()
    );
    let mut printed = print_new_entries(&session, 0);

    let stdin = BufReader::new(io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" | "q" | "quit" => break,
            "r" | "restart" => {
                session.restart(&graph)?;
                printed = print_new_entries(&session, 0);
                continue;
            }
            _ => {}
        }

        let Ok(position) = input.parse::<usize>() else {
            println!("{}", format!("'{}' is not a choice number", input).red());
            continue;
        };

        match session.choose_position(&graph, position) {
            Ok(step) => {
                printed = print_new_entries(&session, printed);
                if let Step::Stalled { missing_id } = step {
                    println!(
                        "{}",
                        format!("(scenario '{}' does not exist)", missing_id).dimmed()
                    );
                }
            }
            Err(err) => println!("{}", err.to_string().red()),
        }

        if session.is_finished() {
            println!(
                "{}",
                "End of conversation. Type 'r' to start over or press Enter to quit.".dimmed()
            );
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Prints entries from `from` onward; returns the new printed count.
fn print_new_entries(session: &ChatSession, from: usize) -> usize {
    let transcript = session.transcript();
    let last = transcript.len().saturating_sub(1);
    for (index, entry) in transcript.iter().enumerate().skip(from) {
        print!("{}", format_entry(entry, index == last));
    }
    transcript.len()
}

//! Traversal tests
//!
//! Walks graphs loaded from a real store, including the bundled seed data

use anyhow::Result;
use chatflow::database::connection::{establish_connection, setup_database};
use chatflow::database::seed_data::seed_support_scenarios;
use chatflow::services::{OptionInput, ScenarioFields, ScenarioService};
use chatflow::traversal::{ChatSession, ScenarioGraph, Speaker, Step, TraversalError};
use sea_orm::DatabaseConnection;
use tempfile::NamedTempFile;

async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = establish_connection(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

#[tokio::test]
async fn test_two_step_walk() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db);

    service.create("b", ScenarioFields::new("Bye")).await?;
    service
        .create_with_options(
            "start",
            ScenarioFields::new("Hi"),
            vec![OptionInput::new("go", "b")],
        )
        .await?;

    let graph = ScenarioGraph::load(&service).await?;
    let mut session = ChatSession::new();
    session.start(&graph)?;

    let step = session.choose_position(&graph, 1)?;
    assert_eq!(
        step,
        Step::Advanced {
            scenario_id: "b".to_string()
        }
    );

    let bot_messages: Vec<&str> = session
        .transcript()
        .iter()
        .filter(|entry| entry.speaker == Speaker::Bot)
        .map(|entry| entry.text.as_str())
        .collect();
    assert_eq!(bot_messages, vec!["Hi", "Bye"]);
    assert!(session.available_options().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_empty_store_has_no_start() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let graph = ScenarioGraph::load(&ScenarioService::new(db)).await?;

    let mut session = ChatSession::new();
    assert_eq!(session.start(&graph).unwrap_err(), TraversalError::MissingStart);

    Ok(())
}

#[tokio::test]
async fn test_seed_data_only_ends_at_leaves() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    seed_support_scenarios(&db).await?;

    let graph = ScenarioGraph::load(&ScenarioService::new(db)).await?;
    assert!(graph.dangling_options().is_empty());

    // Every first-level branch, then its first child, then back to start.
    let branches = graph.get("start").map(|s| s.options.len()).unwrap_or(0);
    assert_eq!(branches, 4);

    for branch in 1..=branches {
        let mut session = ChatSession::new();
        session.start(&graph)?;
        session.choose_position(&graph, branch)?;
        session.choose_position(&graph, 1)?;
        assert!(!session.is_finished());

        let step = session.choose_position(&graph, 1)?;
        assert_eq!(
            step,
            Step::Advanced {
                scenario_id: "start".to_string()
            }
        );
        assert_eq!(session.transcript().len(), 7);
    }

    Ok(())
}

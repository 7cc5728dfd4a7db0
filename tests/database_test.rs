//! Database functionality tests
//!
//! Tests for migrations, the scenario access layer and data integrity

use anyhow::Result;
use chatflow::database::connection::{establish_connection, setup_database};
use chatflow::database::entities::*;
use chatflow::errors::{CoreError, CoreErrorKind, ScenarioError};
use chatflow::services::{OptionInput, ScenarioFields, ScenarioService};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tempfile::NamedTempFile;

/// Create a test database connection with migrations
async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = establish_connection(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

#[tokio::test]
async fn test_database_migrations() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    let scenarios = Scenarios::find().all(&db).await?;
    assert_eq!(scenarios.len(), 0);

    let options = ScenarioOptions::find().all(&db).await?;
    assert_eq!(options.len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_store_rejects_options_to_unknown_scenarios() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    scenarios::ActiveModel {
        message: Set("Hi".to_string()),
        ..scenarios::ActiveModel::new("a".to_string())
    }
    .insert(&db)
    .await?;

    let result = scenario_options::ActiveModel {
        scenario_id: Set("a".to_string()),
        text: Set("go".to_string()),
        next_scenario_id: Set("nowhere".to_string()),
        order_index: Set(0),
        ..Default::default()
    }
    .insert(&db)
    .await;

    let err = CoreError::from(ScenarioError::from(result.unwrap_err()));
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    Ok(())
}

#[tokio::test]
async fn test_listing_order() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db);

    service
        .create("later", ScenarioFields::new("Later").with_order(2))
        .await?;
    service
        .create("first", ScenarioFields::new("First").with_order(1))
        .await?;
    service
        .create("also_first", ScenarioFields::new("Also first").with_order(1))
        .await?;

    let ids: Vec<String> = service.get_all().await?.into_iter().map(|s| s.id).collect();
    assert_eq!(ids[2], "later");
    assert!(ids[..2].contains(&"first".to_string()));
    assert!(ids[..2].contains(&"also_first".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_options_read_back_in_order() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db);

    service.create("b", ScenarioFields::new("B")).await?;
    let created = service
        .create_with_options(
            "a",
            ScenarioFields::new("A"),
            vec![
                OptionInput::new("third", "b").with_order(9),
                OptionInput::new("first", "b"),
                OptionInput::new("second", "b"),
                OptionInput::new("tie", "b").with_order(1),
            ],
        )
        .await?;

    let texts: Vec<&str> = created.options.iter().map(|o| o.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "tie", "second", "third"]);

    let single = service
        .create_option("a", OptionInput::new("appended", "b").with_order(9))
        .await?;
    let fetched = service.get_by_id("a").await?.unwrap();
    assert_eq!(fetched.options.last().map(|o| o.id), Some(single.id));

    Ok(())
}

#[tokio::test]
async fn test_update_with_options_is_idempotent() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db);

    service.create("b", ScenarioFields::new("B")).await?;
    service.create("c", ScenarioFields::new("C")).await?;
    service
        .create_with_options(
            "a",
            ScenarioFields::new("A"),
            vec![OptionInput::new("old", "b")],
        )
        .await?;

    let replacement = vec![OptionInput::new("to b", "b"), OptionInput::new("to c", "c")];
    let first = service
        .update_with_options("a", ScenarioFields::new("A"), Some(replacement.clone()))
        .await?
        .unwrap();
    let second = service
        .update_with_options("a", ScenarioFields::new("A"), Some(replacement))
        .await?
        .unwrap();

    let shape = |options: &[chatflow::services::ScenarioOption]| {
        options
            .iter()
            .map(|o| (o.text.clone(), o.next_scenario_id.clone(), o.order_index))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first.options), shape(&second.options));
    assert_eq!(
        shape(&second.options),
        vec![
            ("to b".to_string(), "b".to_string(), 0),
            ("to c".to_string(), "c".to_string(), 1)
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_failed_replacement_keeps_previous_options() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db);

    service.create("b", ScenarioFields::new("B")).await?;
    service
        .create_with_options(
            "a",
            ScenarioFields::new("A"),
            vec![OptionInput::new("keep", "b")],
        )
        .await?;

    let err = service
        .replace_options(
            "a",
            vec![OptionInput::new("fine", "b"), OptionInput::new("broken", "ghost")],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownReference { .. }));

    let fetched = service.get_by_id("a").await?.unwrap();
    assert_eq!(fetched.options.len(), 1);
    assert_eq!(fetched.options[0].text, "keep");

    let err = service.replace_options("ghost", Vec::new()).await.unwrap_err();
    assert!(matches!(err, ScenarioError::NotFound(ref id) if id == "ghost"));

    Ok(())
}

#[tokio::test]
async fn test_delete_cascades_to_options_in_both_directions() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db.clone());

    service.create("b", ScenarioFields::new("Bye")).await?;
    service
        .create_with_options(
            "a",
            ScenarioFields::new("Hi"),
            vec![OptionInput::new("go", "b")],
        )
        .await?;
    service
        .create_with_options(
            "c",
            ScenarioFields::new("Back"),
            vec![OptionInput::new("to a", "a")],
        )
        .await?;

    assert!(service.delete("a").await?);

    let ids: Vec<String> = service.get_all().await?.into_iter().map(|s| s.id).collect();
    assert!(!ids.contains(&"a".to_string()));

    let dangling = scenario_options::Entity::find()
        .filter(
            scenario_options::Column::ScenarioId
                .eq("a")
                .or(scenario_options::Column::NextScenarioId.eq("a")),
        )
        .all(&db)
        .await?;
    assert!(dangling.is_empty());

    let c = service.get_by_id("c").await?.unwrap();
    assert!(c.options.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_options_by_scenario_counts() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let service = ScenarioService::new(db);

    service.create("b", ScenarioFields::new("B")).await?;
    service
        .create_with_options(
            "a",
            ScenarioFields::new("A"),
            vec![OptionInput::new("one", "b"), OptionInput::new("two", "b")],
        )
        .await?;

    assert_eq!(service.delete_options_by_scenario("a").await?, 2);
    assert_eq!(service.delete_options_by_scenario("a").await?, 0);

    Ok(())
}

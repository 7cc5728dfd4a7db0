use std::path::Path;

use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::info;

use crate::database::entities::scenarios;
use crate::services::{DocumentFormat, ImportMode, ImportSummary, ScenarioDocument, ScenarioService};

const SUPPORT_SCENARIOS: &str = include_str!("seed/support_scenarios.yaml");

/// Loads the bundled support-desk dialogue unless a `start` scenario is
/// already stored.
pub async fn seed_support_scenarios(db: &DatabaseConnection) -> Result<Option<ImportSummary>> {
    let existing_start = scenarios::Entity::find_by_id("start".to_string())
        .one(db)
        .await?;

    if existing_start.is_some() {
        info!("Start scenario already exists, skipping seed data creation");
        return Ok(None);
    }

    info!("Creating example support scenarios");
    let document = ScenarioDocument::parse(SUPPORT_SCENARIOS, DocumentFormat::Yaml)
        .context("Bundled seed document is invalid")?;

    let summary = ScenarioService::new(db.clone())
        .import_document(&document, ImportMode::Merge)
        .await?;

    info!(
        "Successfully created {} scenarios with {} options",
        summary.created, summary.options
    );
    Ok(Some(summary))
}

/// Seeds from a document on disk instead of the bundled one. Existing ids are
/// overwritten.
pub async fn seed_from_file(db: &DatabaseConnection, path: &Path) -> Result<ImportSummary> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;

    let document = ScenarioDocument::parse(&content, DocumentFormat::from_path(path))?;
    let summary = ScenarioService::new(db.clone())
        .import_document(&document, ImportMode::Merge)
        .await?;

    info!(
        "Seeded {} scenarios from {}",
        summary.created + summary.updated,
        path.display()
    );
    Ok(summary)
}

//! Scenario documents: the YAML/JSON file format used for export, import
//! and the bundled seed data.

use std::path::Path;
use std::str::FromStr;

use sea_orm::{EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::scenario_service::{
    clear_options, insert_options, insert_scenario, validate_fields, validate_options,
    write_fields, OptionInput, ScenarioFields, ScenarioService, ScenarioWithOptions,
};
use super::ValidationService;
use crate::database::entities::{scenario_options, scenarios};
use crate::errors::{ScenarioError, ScenarioResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Picks the format from a file extension, YAML unless it ends in `.json`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = ScenarioError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            other => Err(ScenarioError::InvalidDocument(format!(
                "unsupported format '{}', expected yaml or json",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Existing ids are overwritten, other scenarios are kept.
    #[default]
    Merge,
    /// Every stored scenario is removed before the document is applied.
    Replace,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub options: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDocument {
    #[serde(default)]
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(default)]
    pub options: Vec<OptionInput>,
}

impl ScenarioEntry {
    fn fields(&self) -> ScenarioFields {
        ScenarioFields {
            message: self.message.clone(),
            html_content: self.html_content.clone(),
            parent_id: self.parent_id.clone(),
            order_index: self.order_index,
        }
    }
}

impl From<ScenarioWithOptions> for ScenarioEntry {
    fn from(scenario: ScenarioWithOptions) -> Self {
        Self {
            id: scenario.id,
            message: scenario.message,
            html_content: scenario.html_content,
            parent_id: scenario.parent_id,
            order_index: Some(scenario.order_index),
            options: scenario
                .options
                .into_iter()
                .map(|option| {
                    OptionInput::new(option.text, option.next_scenario_id)
                        .with_order(option.order_index)
                })
                .collect(),
        }
    }
}

impl ScenarioDocument {
    pub fn parse(content: &str, format: DocumentFormat) -> ScenarioResult<Self> {
        let document: ScenarioDocument = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| ScenarioError::InvalidDocument(e.to_string()))?,
            DocumentFormat::Json => serde_json::from_str(content)
                .map_err(|e| ScenarioError::InvalidDocument(e.to_string()))?,
        };
        document.validate()?;
        Ok(document)
    }

    pub fn render(&self, format: DocumentFormat) -> ScenarioResult<String> {
        match format {
            DocumentFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|e| ScenarioError::InvalidDocument(e.to_string())),
            DocumentFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ScenarioError::InvalidDocument(e.to_string())),
        }
    }

    /// Field checks plus duplicate ids within the document. References to
    /// scenarios outside the document are resolved against the store on import.
    pub fn validate(&self) -> ScenarioResult<()> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.scenarios {
            ValidationService::validate_scenario_id("id", &entry.id)?;
            validate_fields(&entry.fields())?;
            validate_options(&entry.options)?;
            if !seen.insert(entry.id.as_str()) {
                return Err(ScenarioError::InvalidDocument(format!(
                    "scenario '{}' appears more than once",
                    entry.id
                )));
            }
        }
        Ok(())
    }
}

impl ScenarioService {
    pub async fn export_document(&self) -> ScenarioResult<ScenarioDocument> {
        let scenarios = self.get_all().await?;
        Ok(ScenarioDocument {
            scenarios: scenarios.into_iter().map(ScenarioEntry::from).collect(),
        })
    }

    /// Applies a whole document in one transaction. Scenario rows are written
    /// before any option so that options may point forward in the document.
    pub async fn import_document(
        &self,
        document: &ScenarioDocument,
        mode: ImportMode,
    ) -> ScenarioResult<ImportSummary> {
        document.validate()?;

        let mut summary = ImportSummary::default();
        let txn = self.db().begin().await?;

        if mode == ImportMode::Replace {
            scenario_options::Entity::delete_many().exec(&txn).await?;
            summary.removed = scenarios::Entity::delete_many()
                .exec(&txn)
                .await?
                .rows_affected as usize;
            debug!("Cleared {} scenarios before import", summary.removed);
        }

        for entry in &document.scenarios {
            let fields = entry.fields();
            match scenarios::Entity::find_by_id(entry.id.clone())
                .one(&txn)
                .await?
            {
                Some(existing) => {
                    write_fields(&txn, existing, &fields).await?;
                    clear_options(&txn, &entry.id).await?;
                    summary.updated += 1;
                }
                None => {
                    insert_scenario(&txn, &entry.id, &fields).await?;
                    summary.created += 1;
                }
            }
        }

        for entry in &document.scenarios {
            insert_options(&txn, &entry.id, &entry.options).await?;
            summary.options += entry.options.len();
        }

        txn.commit().await?;

        info!(
            "Imported scenarios: {} created, {} updated, {} removed, {} options",
            summary.created, summary.updated, summary.removed, summary.options
        );
        Ok(summary)
    }
}

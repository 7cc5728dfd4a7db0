use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "server")]
use utoipa::ToSchema;

use super::ValidationService;
use crate::database::entities::{scenario_options, scenarios};
use crate::errors::{ScenarioError, ScenarioResult};

/// An outgoing option as returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ScenarioOption {
    pub id: i32,
    pub scenario_id: String,
    pub text: String,
    pub next_scenario_id: String,
    pub order_index: i32,
}

impl From<scenario_options::Model> for ScenarioOption {
    fn from(model: scenario_options::Model) -> Self {
        Self {
            id: model.id,
            scenario_id: model.scenario_id,
            text: model.text,
            next_scenario_id: model.next_scenario_id,
            order_index: model.order_index,
        }
    }
}

/// A scenario row together with its options in display order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ScenarioWithOptions {
    pub id: String,
    pub message: String,
    pub html_content: Option<String>,
    pub parent_id: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: Vec<ScenarioOption>,
}

impl ScenarioWithOptions {
    fn from_parts(model: scenarios::Model, options: Vec<ScenarioOption>) -> Self {
        Self {
            id: model.id,
            message: model.message,
            html_content: model.html_content,
            parent_id: model.parent_id,
            order_index: model.order_index,
            created_at: model.created_at,
            updated_at: model.updated_at,
            options,
        }
    }

    /// A scenario without options offers nothing further to select.
    pub fn is_leaf(&self) -> bool {
        self.options.is_empty()
    }
}

/// Editable scenario columns. Absent values are stored as NULL / 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioFields {
    pub message: String,
    pub html_content: Option<String>,
    pub parent_id: Option<String>,
    pub order_index: Option<i32>,
}

impl ScenarioFields {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_html(mut self, html_content: impl Into<String>) -> Self {
        self.html_content = Some(html_content.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order_index: i32) -> Self {
        self.order_index = Some(order_index);
        self
    }
}

/// An option as submitted by an editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInput {
    pub text: String,
    pub next_scenario_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
}

impl OptionInput {
    pub fn new(text: impl Into<String>, next_scenario_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_scenario_id: next_scenario_id.into(),
            order_index: None,
        }
    }

    pub fn with_order(mut self, order_index: i32) -> Self {
        self.order_index = Some(order_index);
        self
    }
}

/// Read/write access to the scenario graph. The only component that touches
/// the `scenarios` and `scenario_options` tables.
#[derive(Clone)]
pub struct ScenarioService {
    db: DatabaseConnection,
}

impl ScenarioService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    // ----- Scenario reads ---------------------------------------------------

    /// Every scenario with its options, in listing order.
    pub async fn get_all(&self) -> ScenarioResult<Vec<ScenarioWithOptions>> {
        let txn = self.db.begin().await?;

        let rows = scenarios::Entity::find()
            .order_by_asc(scenarios::Column::OrderIndex)
            .order_by_asc(scenarios::Column::CreatedAt)
            .order_by_asc(scenarios::Column::Id)
            .all(&txn)
            .await?;

        let options = scenario_options::Entity::find()
            .order_by_asc(scenario_options::Column::OrderIndex)
            .order_by_asc(scenario_options::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;

        let mut options_by_scenario: HashMap<String, Vec<ScenarioOption>> = HashMap::new();
        for option in options {
            options_by_scenario
                .entry(option.scenario_id.clone())
                .or_default()
                .push(option.into());
        }

        debug!("Loaded {} scenarios", rows.len());

        Ok(rows
            .into_iter()
            .map(|row| {
                let options = options_by_scenario.remove(&row.id).unwrap_or_default();
                ScenarioWithOptions::from_parts(row, options)
            })
            .collect())
    }

    pub async fn get_by_id(&self, id: &str) -> ScenarioResult<Option<ScenarioWithOptions>> {
        load_scenario(&self.db, id).await
    }

    // ----- Scenario writes --------------------------------------------------

    /// Inserts a scenario with no options.
    pub async fn create(
        &self,
        id: &str,
        fields: ScenarioFields,
    ) -> ScenarioResult<ScenarioWithOptions> {
        self.create_with_options(id, fields, Vec::new()).await
    }

    /// Inserts a scenario and its full option list in one transaction.
    pub async fn create_with_options(
        &self,
        id: &str,
        fields: ScenarioFields,
        options: Vec<OptionInput>,
    ) -> ScenarioResult<ScenarioWithOptions> {
        ValidationService::validate_scenario_id("id", id)?;
        validate_fields(&fields)?;
        validate_options(&options)?;

        let txn = self.db.begin().await?;

        if scenarios::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ScenarioError::AlreadyExists(id.to_string()));
        }

        insert_scenario(&txn, id, &fields).await?;
        insert_options(&txn, id, &options).await?;

        let created = load_scenario(&txn, id)
            .await?
            .ok_or_else(|| ScenarioError::NotFound(id.to_string()))?;

        txn.commit().await?;

        info!(
            "Created scenario '{}' with {} options",
            id,
            created.options.len()
        );
        Ok(created)
    }

    /// Overwrites the editable columns, leaving options untouched.
    pub async fn update(
        &self,
        id: &str,
        fields: ScenarioFields,
    ) -> ScenarioResult<Option<ScenarioWithOptions>> {
        self.update_with_options(id, fields, None).await
    }

    /// Overwrites the editable columns and, when `options` is given, replaces
    /// the whole option list. Both happen in one transaction.
    pub async fn update_with_options(
        &self,
        id: &str,
        fields: ScenarioFields,
        options: Option<Vec<OptionInput>>,
    ) -> ScenarioResult<Option<ScenarioWithOptions>> {
        validate_fields(&fields)?;
        if let Some(options) = &options {
            validate_options(options)?;
        }

        let txn = self.db.begin().await?;

        let Some(existing) = scenarios::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
        else {
            return Ok(None);
        };

        write_fields(&txn, existing, &fields).await?;

        if let Some(options) = &options {
            clear_options(&txn, id).await?;
            insert_options(&txn, id, options).await?;
        }

        let updated = load_scenario(&txn, id)
            .await?
            .ok_or_else(|| ScenarioError::NotFound(id.to_string()))?;

        txn.commit().await?;

        info!("Updated scenario '{}'", id);
        Ok(Some(updated))
    }

    /// Removes a scenario and every option that starts or ends at it.
    /// Returns false when no scenario had this id.
    pub async fn delete(&self, id: &str) -> ScenarioResult<bool> {
        let txn = self.db.begin().await?;

        let options_removed = scenario_options::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(scenario_options::Column::ScenarioId.eq(id))
                    .add(scenario_options::Column::NextScenarioId.eq(id)),
            )
            .exec(&txn)
            .await?
            .rows_affected;

        let removed = scenarios::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await?
            .rows_affected
            > 0;

        txn.commit().await?;

        if removed {
            info!(
                "Deleted scenario '{}' and {} attached options",
                id, options_removed
            );
        }
        Ok(removed)
    }

    // ----- Option writes ----------------------------------------------------

    pub async fn create_option(
        &self,
        scenario_id: &str,
        input: OptionInput,
    ) -> ScenarioResult<ScenarioOption> {
        ValidationService::validate_scenario_id("scenario_id", scenario_id)?;
        validate_option(&input)?;

        let txn = self.db.begin().await?;
        ensure_scenario_exists(&txn, "scenario_id", scenario_id).await?;
        ensure_scenario_exists(&txn, "next_scenario_id", &input.next_scenario_id).await?;

        let option = scenario_options::ActiveModel {
            scenario_id: Set(scenario_id.to_string()),
            text: Set(input.text),
            next_scenario_id: Set(input.next_scenario_id),
            order_index: Set(input.order_index.unwrap_or(0)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        debug!(
            "Created option {} ({} -> {})",
            option.id, option.scenario_id, option.next_scenario_id
        );
        Ok(option.into())
    }

    /// Overwrites text, target and order of an option. `None` when the id is unknown.
    pub async fn update_option(
        &self,
        id: i32,
        input: OptionInput,
    ) -> ScenarioResult<Option<ScenarioOption>> {
        validate_option(&input)?;

        let txn = self.db.begin().await?;

        let Some(existing) = scenario_options::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(None);
        };

        ensure_scenario_exists(&txn, "next_scenario_id", &input.next_scenario_id).await?;

        let mut active: scenario_options::ActiveModel = existing.into();
        active.text = Set(input.text);
        active.next_scenario_id = Set(input.next_scenario_id);
        active.order_index = Set(input.order_index.unwrap_or(0));
        let option = active.update(&txn).await?;

        txn.commit().await?;

        debug!("Updated option {}", id);
        Ok(Some(option.into()))
    }

    pub async fn delete_option(&self, id: i32) -> ScenarioResult<bool> {
        let result = scenario_options::Entity::delete_by_id(id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Removes every option owned by a scenario; zero is a normal outcome.
    pub async fn delete_options_by_scenario(&self, scenario_id: &str) -> ScenarioResult<u64> {
        let removed = clear_options(&self.db, scenario_id).await?;
        debug!("Removed {} options from '{}'", removed, scenario_id);
        Ok(removed)
    }

    /// Atomically swaps a scenario's option list for `options`.
    pub async fn replace_options(
        &self,
        scenario_id: &str,
        options: Vec<OptionInput>,
    ) -> ScenarioResult<Vec<ScenarioOption>> {
        validate_options(&options)?;

        let txn = self.db.begin().await?;

        if scenarios::Entity::find_by_id(scenario_id.to_string())
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ScenarioError::NotFound(scenario_id.to_string()));
        }

        clear_options(&txn, scenario_id).await?;
        insert_options(&txn, scenario_id, &options).await?;
        let scenario = load_scenario(&txn, scenario_id)
            .await?
            .ok_or_else(|| ScenarioError::NotFound(scenario_id.to_string()))?;

        txn.commit().await?;

        Ok(scenario.options)
    }
}

// ----- Helpers shared by the service and the document importer -------------

pub(crate) fn validate_fields(fields: &ScenarioFields) -> ScenarioResult<()> {
    ValidationService::validate_required_text("message", &fields.message)
}

pub(crate) fn validate_option(option: &OptionInput) -> ScenarioResult<()> {
    ValidationService::validate_required_text("text", &option.text)?;
    ValidationService::validate_scenario_id("next_scenario_id", &option.next_scenario_id)
}

pub(crate) fn validate_options(options: &[OptionInput]) -> ScenarioResult<()> {
    options.iter().try_for_each(validate_option)
}

/// Empty strings from forms are stored as NULL.
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|value| !value.is_empty()).cloned()
}

pub(crate) async fn load_scenario<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> ScenarioResult<Option<ScenarioWithOptions>> {
    let Some(model) = scenarios::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let options = model
        .find_related(scenario_options::Entity)
        .order_by_asc(scenario_options::Column::OrderIndex)
        .order_by_asc(scenario_options::Column::Id)
        .all(conn)
        .await?;

    Ok(Some(ScenarioWithOptions::from_parts(
        model,
        options.into_iter().map(ScenarioOption::from).collect(),
    )))
}

pub(crate) async fn insert_scenario<C: ConnectionTrait>(
    conn: &C,
    id: &str,
    fields: &ScenarioFields,
) -> ScenarioResult<scenarios::Model> {
    let mut active = scenarios::ActiveModel::new(id.to_string());
    active.message = Set(fields.message.clone());
    active.html_content = Set(non_empty(&fields.html_content));
    active.parent_id = Set(non_empty(&fields.parent_id));
    active.order_index = Set(fields.order_index.unwrap_or(0));

    Ok(active.insert(conn).await?)
}

pub(crate) async fn write_fields<C: ConnectionTrait>(
    conn: &C,
    existing: scenarios::Model,
    fields: &ScenarioFields,
) -> ScenarioResult<scenarios::Model> {
    let mut active: scenarios::ActiveModel = existing.into();
    active.message = Set(fields.message.clone());
    active.html_content = Set(non_empty(&fields.html_content));
    active.parent_id = Set(non_empty(&fields.parent_id));
    active.order_index = Set(fields.order_index.unwrap_or(0));

    Ok(active.set_updated_at().update(conn).await?)
}

/// Options without an explicit order take their position in the submitted list.
pub(crate) async fn insert_options<C: ConnectionTrait>(
    conn: &C,
    scenario_id: &str,
    options: &[OptionInput],
) -> ScenarioResult<()> {
    for (index, option) in options.iter().enumerate() {
        ensure_scenario_exists(conn, "next_scenario_id", &option.next_scenario_id).await?;

        scenario_options::ActiveModel {
            scenario_id: Set(scenario_id.to_string()),
            text: Set(option.text.clone()),
            next_scenario_id: Set(option.next_scenario_id.clone()),
            order_index: Set(option.order_index.unwrap_or(index as i32)),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

pub(crate) async fn clear_options<C: ConnectionTrait>(
    conn: &C,
    scenario_id: &str,
) -> ScenarioResult<u64> {
    let result = scenario_options::Entity::delete_many()
        .filter(scenario_options::Column::ScenarioId.eq(scenario_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

async fn ensure_scenario_exists<C: ConnectionTrait>(
    conn: &C,
    field: &str,
    id: &str,
) -> ScenarioResult<()> {
    let exists = scenarios::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .is_some();

    if exists {
        Ok(())
    } else {
        Err(ScenarioError::unknown_reference(field, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    async fn service() -> ScenarioService {
        ScenarioService::new(setup_test_db().await)
    }

    #[tokio::test]
    async fn create_then_read_back_has_no_options() {
        let service = service().await;
        let fields = ScenarioFields::new("Hi")
            .with_html("<p>hello</p>")
            .with_parent("root")
            .with_order(3);

        let created = service.create("a", fields).await.unwrap();
        let fetched = service.get_by_id("a").await.unwrap().unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.message, "Hi");
        assert_eq!(fetched.html_content.as_deref(), Some("<p>hello</p>"));
        assert_eq!(fetched.parent_id.as_deref(), Some("root"));
        assert_eq!(fetched.order_index, 3);
        assert!(fetched.options.is_empty());
    }

    #[tokio::test]
    async fn omitted_fields_take_defaults() {
        let service = service().await;
        let created = service
            .create(
                "a",
                ScenarioFields {
                    message: "Hi".to_string(),
                    html_content: Some(String::new()),
                    parent_id: None,
                    order_index: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(created.html_content, None);
        assert_eq!(created.parent_id, None);
        assert_eq!(created.order_index, 0);
    }

    #[tokio::test]
    async fn duplicate_ids_are_conflicts() {
        let service = service().await;
        service.create("a", ScenarioFields::new("Hi")).await.unwrap();

        let err = service
            .create("a", ScenarioFields::new("Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScenarioError::AlreadyExists(id) if id == "a"));
    }

    #[tokio::test]
    async fn missing_message_is_rejected_before_the_store() {
        let service = service().await;
        let err = service
            .create("a", ScenarioFields::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ScenarioError::MissingField(field) if field == "message"));
        assert!(service.get_by_id("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_ids_read_as_none() {
        let service = service().await;
        assert!(service.get_by_id("nope").await.unwrap().is_none());
        assert!(service
            .update("nope", ScenarioFields::new("x"))
            .await
            .unwrap()
            .is_none());
        assert!(!service.delete("nope").await.unwrap());
        assert!(!service.delete_option(999).await.unwrap());
        assert_eq!(service.delete_options_by_scenario("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn options_with_unknown_targets_roll_back_the_scenario() {
        let service = service().await;
        let err = service
            .create_with_options(
                "a",
                ScenarioFields::new("Hi"),
                vec![OptionInput::new("go", "missing")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ScenarioError::UnknownReference { ref id, .. } if id == "missing"));
        assert!(service.get_by_id("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn options_may_point_back_at_their_own_scenario() {
        let service = service().await;
        let created = service
            .create_with_options(
                "loop",
                ScenarioFields::new("Again?"),
                vec![OptionInput::new("again", "loop")],
            )
            .await
            .unwrap();
        assert_eq!(created.options[0].next_scenario_id, "loop");
    }

    #[tokio::test]
    async fn update_option_reports_unknown_ids() {
        let service = service().await;
        service.create("a", ScenarioFields::new("Hi")).await.unwrap();
        let updated = service
            .update_option(42, OptionInput::new("go", "a"))
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}

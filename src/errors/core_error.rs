use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use tracing::error;

use super::ScenarioError;
use crate::common::db_errors::{format_db_error, DbErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unavailable,
    Internal,
}

/// Surface-neutral error handed to the HTTP layer and the CLI.
#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let entity = entity.into();
        let id = id.into();
        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity.clone());
        fields.insert("id".to_string(), id.clone());

        Self {
            kind: CoreErrorKind::NotFound,
            message: format!("{} not found", entity),
            fields: Some(fields),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ScenarioError> for CoreError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::NotFound(id) => CoreError::not_found("Scenario", id),
            ScenarioError::AlreadyExists(ref id) => {
                let message = err.to_string();
                CoreError::conflict(message).with_field("id", id.clone())
            }
            ScenarioError::MissingField(ref field) => {
                let message = err.to_string();
                CoreError::validation(message).with_field("field", field.clone())
            }
            ScenarioError::UnknownReference { ref field, .. } => {
                let message = err.to_string();
                CoreError::validation(message).with_field("field", field.clone())
            }
            ScenarioError::Validation(_) | ScenarioError::InvalidDocument(_) => {
                CoreError::validation(err.to_string())
            }
            ScenarioError::Database(db_err) => {
                let (kind, message) = format_db_error("scenario store", &db_err);
                error!("{}", message);
                let core = match kind {
                    DbErrorKind::NotFound => CoreError::new(CoreErrorKind::NotFound, "Resource not found"),
                    DbErrorKind::UniqueViolation => CoreError::conflict("Resource already exists"),
                    DbErrorKind::ForeignKeyViolation => {
                        CoreError::validation("Referenced scenario does not exist")
                    }
                    DbErrorKind::ConnectionError | DbErrorKind::Timeout => {
                        CoreError::unavailable("Scenario store unavailable")
                    }
                    DbErrorKind::Unknown => CoreError::internal("Scenario store failure"),
                };
                core.with_source(db_err)
            }
        }
    }
}

//! Scenario graph error types
//!
//! Errors raised by the scenario access layer. "Does not exist" outcomes of
//! plain reads are not errors (they come back as `None` / `false`); the
//! not-found variants here are only used where a write needs an existing row.
//!
//! # Examples
//!
//! ```rust
//! use chatflow::errors::{CoreError, CoreErrorKind, ScenarioError};
//!
//! let err = ScenarioError::AlreadyExists("start".to_string());
//! assert_eq!(err.to_string(), "Scenario 'start' already exists");
//! assert_eq!(CoreError::from(err).kind(), CoreErrorKind::Conflict);
//! ```

use thiserror::Error;

/// Scenario and option errors
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Scenario not found by id
    #[error("Scenario '{0}' not found")]
    NotFound(String),

    /// A scenario with this id is already stored
    #[error("Scenario '{0}' already exists")]
    AlreadyExists(String),

    /// Required field absent or blank
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A field is present but unusable
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An option names a scenario that is not stored
    #[error("{field} '{id}' does not reference an existing scenario")]
    UnknownReference {
        /// Offending field name
        field: String,
        /// Referenced scenario id
        id: String,
    },

    /// Scenario document could not be read or written
    #[error("Invalid scenario document: {0}")]
    InvalidDocument(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl ScenarioError {
    pub fn missing(field: impl Into<String>) -> Self {
        ScenarioError::MissingField(field.into())
    }

    pub fn unknown_reference(field: impl Into<String>, id: impl Into<String>) -> Self {
        ScenarioError::UnknownReference {
            field: field.into(),
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbErr, RuntimeErr};

    #[test]
    fn test_not_found() {
        let err = ScenarioError::NotFound("login".to_string());
        assert_eq!(err.to_string(), "Scenario 'login' not found");
    }

    #[test]
    fn test_unknown_reference() {
        let err = ScenarioError::unknown_reference("next_scenario_id", "nowhere");
        assert_eq!(
            err.to_string(),
            "next_scenario_id 'nowhere' does not reference an existing scenario"
        );
        assert!(matches!(
            err,
            ScenarioError::UnknownReference { ref field, ref id }
                if field == "next_scenario_id" && id == "nowhere"
        ));
    }

    #[test]
    fn test_missing_field() {
        let err = ScenarioError::missing("message");
        assert_eq!(err.to_string(), "Missing required field: message");
    }

    #[test]
    fn test_database_errors_convert() {
        let err: ScenarioError =
            DbErr::Conn(RuntimeErr::Internal("Connection refused".to_string())).into();
        assert!(matches!(err, ScenarioError::Database(DbErr::Conn(_))));
    }
}

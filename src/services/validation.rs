use crate::errors::{ScenarioError, ScenarioResult};

const MAX_SCENARIO_ID_LENGTH: usize = 128;

/// Checks applied to caller input before any store access.
pub struct ValidationService;

impl ValidationService {
    /// Scenario ids are caller-assigned and used verbatim as references.
    pub fn validate_scenario_id(field: &str, id: &str) -> ScenarioResult<()> {
        if id.trim().is_empty() {
            return Err(ScenarioError::missing(field));
        }

        if id.len() > MAX_SCENARIO_ID_LENGTH {
            return Err(ScenarioError::Validation(format!(
                "{} is too long (max {} characters)",
                field, MAX_SCENARIO_ID_LENGTH
            )));
        }

        if id.chars().any(|c| c.is_control()) {
            return Err(ScenarioError::Validation(format!(
                "{} cannot contain control characters",
                field
            )));
        }

        Ok(())
    }

    pub fn validate_required_text(field: &str, value: &str) -> ScenarioResult<()> {
        if value.trim().is_empty() {
            return Err(ScenarioError::missing(field));
        }
        Ok(())
    }

    /// Unwraps a field that may be absent from a request body.
    pub fn require<T>(field: &str, value: Option<T>) -> ScenarioResult<T> {
        value.ok_or_else(|| ScenarioError::missing(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_missing() {
        let err = ValidationService::validate_scenario_id("id", "   ").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingField(field) if field == "id"));
    }

    #[test]
    fn ids_keep_arbitrary_printable_text() {
        assert!(ValidationService::validate_scenario_id("id", "login_password").is_ok());
        assert!(ValidationService::validate_scenario_id("id", "faq-2.billing").is_ok());
    }

    #[test]
    fn overlong_and_control_ids_are_rejected() {
        let long = "x".repeat(MAX_SCENARIO_ID_LENGTH + 1);
        assert!(ValidationService::validate_scenario_id("id", &long).is_err());
        assert!(ValidationService::validate_scenario_id("id", "bad\nid").is_err());
    }

    #[test]
    fn require_reports_field_name() {
        let err = ValidationService::require::<String>("message", None).unwrap_err();
        assert_eq!(err.to_string(), "Missing required field: message");
    }
}

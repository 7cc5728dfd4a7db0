//! Error types for the scenario store and the surfaces built on it
//!
//! - **ScenarioError**: raised by the access layer (validation, conflicts, store failures)
//! - **CoreError**: surface-neutral classification consumed by the HTTP API and the CLI
//! - **TraversalError**: raised while walking a loaded scenario graph

pub mod core_error;
pub mod scenario;

pub use core_error::{CoreError, CoreErrorKind};
pub use scenario::ScenarioError;
pub use crate::traversal::TraversalError;

/// Result type alias for scenario access operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_result_alias() {
        let result: ScenarioResult<()> = Err(ScenarioError::missing("message"));
        assert!(result.is_err());
    }
}

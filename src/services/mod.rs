pub mod scenario_document;
pub mod scenario_service;
pub mod validation;

pub use scenario_document::{
    DocumentFormat, ImportMode, ImportSummary, ScenarioDocument, ScenarioEntry,
};
pub use scenario_service::{
    OptionInput, ScenarioFields, ScenarioOption, ScenarioService, ScenarioWithOptions,
};
pub use validation::ValidationService;

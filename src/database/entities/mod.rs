pub mod scenario_options;
pub mod scenarios;

pub use scenario_options::Entity as ScenarioOptions;
pub use scenarios::Entity as Scenarios;

//! Walking a loaded scenario graph the way the chat client does.
//!
//! A [`ChatSession`] starts at the `start` scenario, appends every bot message
//! and user choice to an append-only transcript, and only ever offers the
//! options of the most recent bot message. Scenarios without options end the
//! conversation. Options pointing at ids missing from the graph are handled by
//! the session's [`DanglingPolicy`].

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::ScenarioResult;
use crate::services::{ScenarioOption, ScenarioService, ScenarioWithOptions};

pub const START_SCENARIO_ID: &str = "start";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraversalError {
    #[error("No 'start' scenario is stored")]
    MissingStart,

    #[error("Option {0} is not offered by the current message")]
    UnknownOption(i32),

    #[error("Choice {position} is out of range ({available} options offered)")]
    ChoiceOutOfRange { position: usize, available: usize },
}

/// What to do when a chosen option points at a scenario that is not in the graph.
///
/// Under either policy the session's current scenario id moves to the missing
/// target, so `current_scenario_id` names the id the visitor asked for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DanglingPolicy {
    /// Append nothing; the conversation silently stops.
    #[default]
    Stall,
    /// Append a bot message with this text and no options.
    Fallback(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    Bot,
    User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    /// Scenario rendered by a bot entry. `None` for user entries and fallbacks.
    pub scenario_id: Option<String>,
    pub text: String,
    pub html_content: Option<String>,
    pub options: Vec<ScenarioOption>,
}

impl TranscriptEntry {
    fn bot(scenario: &ScenarioWithOptions) -> Self {
        Self {
            speaker: Speaker::Bot,
            scenario_id: Some(scenario.id.clone()),
            text: scenario.message.clone(),
            html_content: scenario.html_content.clone(),
            options: scenario.options.clone(),
        }
    }

    fn fallback(text: &str) -> Self {
        Self {
            speaker: Speaker::Bot,
            scenario_id: None,
            text: text.to_string(),
            html_content: None,
            options: Vec::new(),
        }
    }

    fn user(text: &str) -> Self {
        Self {
            speaker: Speaker::User,
            scenario_id: None,
            text: text.to_string(),
            html_content: None,
            options: Vec::new(),
        }
    }
}

/// Outcome of choosing an option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Advanced { scenario_id: String },
    Stalled { missing_id: String },
}

/// The whole scenario graph, indexed by id.
#[derive(Clone, Debug, Default)]
pub struct ScenarioGraph {
    scenarios: HashMap<String, ScenarioWithOptions>,
}

impl ScenarioGraph {
    pub fn from_scenarios(scenarios: impl IntoIterator<Item = ScenarioWithOptions>) -> Self {
        Self {
            scenarios: scenarios
                .into_iter()
                .map(|scenario| (scenario.id.clone(), scenario))
                .collect(),
        }
    }

    pub async fn load(service: &ScenarioService) -> ScenarioResult<Self> {
        let scenarios = service.get_all().await?;
        debug!("Loaded scenario graph with {} scenarios", scenarios.len());
        Ok(Self::from_scenarios(scenarios))
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioWithOptions> {
        self.scenarios.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenarios.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Options whose target is not in the graph, as (owner, option) pairs.
    pub fn dangling_options(&self) -> Vec<(&str, &ScenarioOption)> {
        let graph = self;
        let mut dangling: Vec<_> = self
            .scenarios
            .values()
            .flat_map(move |scenario| {
                scenario
                    .options
                    .iter()
                    .filter(move |option| !graph.contains(&option.next_scenario_id))
                    .map(move |option| (scenario.id.as_str(), option))
            })
            .collect();
        dangling.sort_by_key(|(_, option)| option.id);
        dangling
    }
}

#[derive(Clone, Debug)]
pub struct ChatSession {
    current_scenario_id: String,
    transcript: Vec<TranscriptEntry>,
    policy: DanglingPolicy,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_policy(DanglingPolicy::default())
    }

    pub fn with_policy(policy: DanglingPolicy) -> Self {
        Self {
            current_scenario_id: START_SCENARIO_ID.to_string(),
            transcript: Vec::new(),
            policy,
        }
    }

    pub fn current_scenario_id(&self) -> &str {
        &self.current_scenario_id
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn policy(&self) -> &DanglingPolicy {
        &self.policy
    }

    /// Renders the `start` scenario as a bot message.
    pub fn start(&mut self, graph: &ScenarioGraph) -> Result<&TranscriptEntry, TraversalError> {
        let start = graph
            .get(START_SCENARIO_ID)
            .ok_or(TraversalError::MissingStart)?;

        self.current_scenario_id = START_SCENARIO_ID.to_string();
        self.transcript.push(TranscriptEntry::bot(start));
        Ok(&self.transcript[self.transcript.len() - 1])
    }

    /// Clears the transcript and starts over.
    pub fn restart(&mut self, graph: &ScenarioGraph) -> Result<&TranscriptEntry, TraversalError> {
        self.transcript.clear();
        self.start(graph)
    }

    /// Options of the last entry when it is a bot message; earlier messages
    /// keep their options in the transcript but can no longer be chosen.
    pub fn available_options(&self) -> &[ScenarioOption] {
        match self.transcript.last() {
            Some(entry) if entry.speaker == Speaker::Bot => &entry.options,
            _ => &[],
        }
    }

    /// True once nothing further can be chosen.
    pub fn is_finished(&self) -> bool {
        self.available_options().is_empty()
    }

    /// Chooses an offered option by its id.
    pub fn choose_option(
        &mut self,
        graph: &ScenarioGraph,
        option_id: i32,
    ) -> Result<Step, TraversalError> {
        let option = self
            .available_options()
            .iter()
            .find(|option| option.id == option_id)
            .cloned()
            .ok_or(TraversalError::UnknownOption(option_id))?;

        Ok(self.follow(graph, &option))
    }

    /// Chooses an offered option by its 1-based position.
    pub fn choose_position(
        &mut self,
        graph: &ScenarioGraph,
        position: usize,
    ) -> Result<Step, TraversalError> {
        let available = self.available_options();
        let option = position
            .checked_sub(1)
            .and_then(|index| available.get(index))
            .cloned()
            .ok_or(TraversalError::ChoiceOutOfRange {
                position,
                available: available.len(),
            })?;

        Ok(self.follow(graph, &option))
    }

    fn follow(&mut self, graph: &ScenarioGraph, option: &ScenarioOption) -> Step {
        self.transcript.push(TranscriptEntry::user(&option.text));
        // Moves even when the target is missing.
        self.current_scenario_id = option.next_scenario_id.clone();

        match graph.get(&option.next_scenario_id) {
            Some(next) => {
                self.transcript.push(TranscriptEntry::bot(next));
                Step::Advanced {
                    scenario_id: next.id.clone(),
                }
            }
            None => {
                warn!(
                    "Option {} points at missing scenario '{}'",
                    option.id, option.next_scenario_id
                );
                if let DanglingPolicy::Fallback(text) = &self.policy {
                    self.transcript.push(TranscriptEntry::fallback(text));
                }
                Step::Stalled {
                    missing_id: option.next_scenario_id.clone(),
                }
            }
        }
    }
}

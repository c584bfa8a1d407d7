//! Scenario selection and custom merge state.
//!
//! [`ScenarioState`] is an explicit value: every mutation borrows the
//! current state and returns the next one, so the caller holds exactly
//! one current value and replaces it wholesale after each action.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A committed merge group: names of at least two municipalities.
pub type Group = Vec<String>;

/// Minimum number of selected municipalities required to merge.
pub const MIN_MERGE_SIZE: usize = 2;

/// Reorganization scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioId {
    /// The current seven regions.
    #[default]
    Current,
    /// One region absorbed into its neighbour.
    Scenario1,
    /// Two regions absorbed into their neighbours.
    Scenario2,
    /// User-defined municipality merges.
    Custom,
}

impl ScenarioId {
    /// All scenarios in presentation order.
    pub const ALL: [ScenarioId; 4] = [
        ScenarioId::Current,
        ScenarioId::Scenario1,
        ScenarioId::Scenario2,
        ScenarioId::Custom,
    ];

    /// Short identifier used on the command line and in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::Current => "current",
            ScenarioId::Scenario1 => "scenario1",
            ScenarioId::Scenario2 => "scenario2",
            ScenarioId::Custom => "custom",
        }
    }

    /// Human-readable title.
    pub fn title(&self) -> &'static str {
        match self {
            ScenarioId::Current => "Current (7 regions)",
            ScenarioId::Scenario1 => "6-region proposal",
            ScenarioId::Scenario2 => "5-region proposal",
            ScenarioId::Custom => "Custom merge",
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScenarioId {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" | "baseline" => Ok(ScenarioId::Current),
            "scenario1" | "merge-a" => Ok(ScenarioId::Scenario1),
            "scenario2" | "merge-b" => Ok(ScenarioId::Scenario2),
            "custom" => Ok(ScenarioId::Custom),
            other => Err(ActionParseError::UnknownScenario(other.to_string())),
        }
    }
}

/// Why a mutation left the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{0} is already part of a merged group")]
    AlreadyMerged(String),
    #[error("at least 2 municipalities must be selected to merge (selected: {0})")]
    TooFewSelected(usize),
}

/// Errors parsing an [`Action`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("invalid action '{0}' (expected scenario:<id>, toggle:<name>, merge or reset)")]
    Invalid(String),
    #[error("unknown scenario '{0}' (expected current, scenario1, scenario2 or custom)")]
    UnknownScenario(String),
}

/// A discrete user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Switch the active scenario.
    Scenario(ScenarioId),
    /// Select or deselect a municipality.
    Toggle(String),
    /// Commit the current selection as a merge group.
    Merge,
    /// Drop all custom groups and the selection.
    Reset,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Scenario(id) => write!(f, "scenario:{}", id),
            Action::Toggle(name) => write!(f, "toggle:{}", name),
            Action::Merge => write!(f, "merge"),
            Action::Reset => write!(f, "reset"),
        }
    }
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once(':') {
            Some(("scenario", id)) => Ok(Action::Scenario(id.parse()?)),
            Some(("toggle", name)) if !name.trim().is_empty() => {
                Ok(Action::Toggle(name.trim().to_string()))
            }
            None if trimmed == "merge" => Ok(Action::Merge),
            None if trimmed == "reset" => Ok(Action::Reset),
            _ => Err(ActionParseError::Invalid(trimmed.to_string())),
        }
    }
}

/// Session state owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioState {
    /// Active scenario.
    pub scenario: ScenarioId,
    /// Municipalities selected for the next merge.
    pub selection: BTreeSet<String>,
    /// Committed merge groups, in commit order.
    pub groups: Vec<Group>,
}

impl ScenarioState {
    /// Whether a municipality belongs to a committed group.
    pub fn is_merged(&self, name: &str) -> bool {
        is_in_groups(&self.groups, name)
    }

    /// Whether the selection is large enough to merge.
    pub fn can_merge(&self) -> bool {
        self.selection.len() >= MIN_MERGE_SIZE
    }

    /// Select or deselect a municipality.
    pub fn toggle(&self, name: &str) -> Result<Self, Rejection> {
        if !self.selection.contains(name) && self.is_merged(name) {
            return Err(Rejection::AlreadyMerged(name.to_string()));
        }
        Ok(Self {
            selection: toggle_selection(&self.selection, &self.groups, name),
            ..self.clone()
        })
    }

    /// Commit the selection as a new group and clear it.
    pub fn commit_merge(&self) -> Result<Self, Rejection> {
        if !self.can_merge() {
            return Err(Rejection::TooFewSelected(self.selection.len()));
        }
        let (groups, selection) = commit_merge(&self.selection, &self.groups);
        Ok(Self {
            scenario: self.scenario,
            selection,
            groups,
        })
    }

    /// Drop every committed group and the selection.
    pub fn reset_custom(&self) -> Self {
        let (groups, selection) = reset_custom();
        Self {
            scenario: self.scenario,
            selection,
            groups,
        }
    }

    /// Switch scenario; custom groups survive the switch.
    pub fn select_scenario(&self, scenario: ScenarioId) -> Self {
        Self {
            scenario,
            ..self.clone()
        }
    }

    /// Apply one action.
    pub fn apply(&self, action: &Action) -> Result<Self, Rejection> {
        debug!("Applying action {}", action);
        match action {
            Action::Scenario(id) => Ok(self.select_scenario(*id)),
            Action::Toggle(name) => self.toggle(name),
            Action::Merge => self.commit_merge(),
            Action::Reset => Ok(self.reset_custom()),
        }
    }
}

fn is_in_groups(groups: &[Group], name: &str) -> bool {
    groups.iter().any(|g| g.iter().any(|m| m == name))
}

/// Toggle a municipality; a merged municipality leaves the selection unchanged.
pub fn toggle_selection(
    selection: &BTreeSet<String>,
    groups: &[Group],
    name: &str,
) -> BTreeSet<String> {
    let mut next = selection.clone();
    if next.remove(name) {
        return next;
    }
    if is_in_groups(groups, name) {
        debug!("Toggle ignored: {} is already merged", name);
        return next;
    }
    next.insert(name.to_string());
    next
}

/// Commit the selection; fewer than two selected is a no-op.
pub fn commit_merge(
    selection: &BTreeSet<String>,
    groups: &[Group],
) -> (Vec<Group>, BTreeSet<String>) {
    if selection.len() < MIN_MERGE_SIZE {
        debug!("Merge ignored: {} selected", selection.len());
        return (groups.to_vec(), selection.clone());
    }
    let mut next = groups.to_vec();
    next.push(selection.iter().cloned().collect());
    (next, BTreeSet::new())
}

/// Empty groups and selection.
pub fn reset_custom() -> (Vec<Group>, BTreeSet<String>) {
    (Vec::new(), BTreeSet::new())
}

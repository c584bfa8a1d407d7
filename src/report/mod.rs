//! Report generation modules.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report};

use crate::engine::{AggregationResult, PrefectureSummary, RegionProfile, ScenarioState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Dataset file, or `bundled`.
    pub dataset_source: String,
    /// Number of regions in the dataset.
    pub regions: usize,
    /// Number of municipalities in the dataset.
    pub municipalities: usize,
    /// Version of the tool.
    pub tool_version: String,
}

/// The complete simulation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub metadata: ReportMetadata,
    /// Prefecture-wide overview.
    pub prefecture: PrefectureSummary,
    /// Session state the result was computed from.
    pub state: ScenarioState,
    /// Result of the active scenario.
    pub result: AggregationResult,
    /// Results of all scenarios, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comparison: Vec<AggregationResult>,
    /// Region profiles, when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionProfile>,
}

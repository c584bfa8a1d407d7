//! Scenario engine.
//!
//! State transitions for the custom merge session, the aggregation of
//! each scenario, and per-region profiles.

pub mod aggregate;
pub mod profile;
pub mod state;

pub use aggregate::{compare_all, compute_aggregate, AggregationResult, GroupStats, Rating};
pub use profile::{prefecture_summary, region_profiles, PrefectureSummary, RegionProfile};
pub use state::{Action, Rejection, ScenarioId, ScenarioState};

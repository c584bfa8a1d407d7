//! Scenario aggregation.
//!
//! Recomputes population, bed, transport and arrival statistics for a
//! scenario from scratch on every call. Nothing is cached: the result
//! depends only on the dataset and the scenario state passed in.

use super::state::{Group, ScenarioId, ScenarioState};
use crate::dataset::Dataset;
use crate::models::{PresetMerge, FALLBACK_ARRIVAL_MINUTES};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Transport time used for a municipality without a known region (minutes).
pub const FALLBACK_TRANSPORT_MINUTES: f64 = 45.0;

const SCENARIO1_TRANSPORT_PENALTY: f64 = 2.0;
const SCENARIO1_ARRIVAL_PENALTY: f64 = 1.0;
const SCENARIO2_TRANSPORT_PENALTY: f64 = 5.0;
const SCENARIO2_ARRIVAL_PENALTY: f64 = 2.5;

/// Added per extra municipality in a custom group.
pub const CUSTOM_TRANSPORT_PENALTY_PER_UNIT: f64 = 2.0;
pub const CUSTOM_ARRIVAL_PENALTY_PER_UNIT: f64 = 1.0;

const TRANSPORT_GOOD_BELOW: f64 = 46.0;
const TRANSPORT_WARNING_BELOW: f64 = 50.0;
const ARRIVAL_GOOD_BELOW: f64 = 9.5;
const ARRIVAL_WARNING_BELOW: f64 = 11.0;
const BALANCE_GOOD_ABOVE: f64 = 100.0;

/// Qualitative rating of a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Warning,
    Bad,
}

impl Rating {
    /// Rate an average transport time.
    pub fn transport(minutes: f64) -> Self {
        if minutes < TRANSPORT_GOOD_BELOW {
            Rating::Good
        } else if minutes < TRANSPORT_WARNING_BELOW {
            Rating::Warning
        } else {
            Rating::Bad
        }
    }

    /// Rate an average arrival time.
    pub fn arrival(minutes: f64) -> Self {
        if minutes < ARRIVAL_GOOD_BELOW {
            Rating::Good
        } else if minutes < ARRIVAL_WARNING_BELOW {
            Rating::Warning
        } else {
            Rating::Bad
        }
    }

    /// Rate beds per 10,000 inhabitants. Never `Bad`.
    pub fn balance(beds_per_10k: f64) -> Self {
        if beds_per_10k > BALANCE_GOOD_ABOVE {
            Rating::Good
        } else {
            Rating::Warning
        }
    }

    /// Returns an emoji representation of the rating.
    pub fn emoji(&self) -> &'static str {
        match self {
            Rating::Good => "🟢",
            Rating::Warning => "🟡",
            Rating::Bad => "🔴",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Good => write!(f, "Good"),
            Rating::Warning => write!(f, "Warning"),
            Rating::Bad => write!(f, "Bad"),
        }
    }
}

/// The three ratings shown for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub transport: Rating,
    pub balance: Rating,
    pub arrival: Rating,
}

impl Ratings {
    /// The worst of the three.
    pub fn worst(&self) -> Rating {
        self.transport.max(self.balance).max(self.arrival)
    }
}

/// Statistics of one member of the scenario partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Display label (region name, municipality, or joined group).
    pub label: String,
    /// Municipalities (custom) or the region id (region-based scenarios).
    pub members: Vec<String>,
    /// Population in 2040.
    pub population_2040: u64,
    /// Beds attributed to the member.
    pub beds: u64,
    /// Transport time including any merge penalty (minutes).
    pub transport: f64,
    /// Arrival time including any merge penalty (minutes).
    pub arrival: f64,
    /// Region absorbed by a preset; counted in totals, not in averages.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub absorbed: bool,
}

/// Output of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub scenario: ScenarioId,
    /// Number of regions after reorganization.
    pub group_count: usize,
    pub total_population_2040: u64,
    pub total_beds: u64,
    /// Unweighted mean transport time (minutes).
    pub avg_transport: f64,
    /// Unweighted mean arrival time (minutes).
    pub avg_arrival: f64,
    pub beds_per_group: f64,
    pub population_per_group: f64,
    /// Beds per group per 10,000 inhabitants per group.
    pub beds_per_10k: f64,
    pub ratings: Ratings,
    /// Per-member breakdown.
    pub groups: Vec<GroupStats>,
}

/// Aggregate the active scenario of a session.
///
/// The pending selection does not influence the result; only committed
/// groups shape the custom partition.
pub fn compute_aggregate(dataset: &Dataset, state: &ScenarioState) -> AggregationResult {
    compute_scenario(dataset, state.scenario, &state.groups)
}

/// Aggregate every scenario with the same custom groups.
pub fn compare_all(dataset: &Dataset, state: &ScenarioState) -> Vec<AggregationResult> {
    ScenarioId::ALL
        .iter()
        .map(|id| compute_scenario(dataset, *id, &state.groups))
        .collect()
}

/// Aggregate one scenario.
pub fn compute_scenario(
    dataset: &Dataset,
    scenario: ScenarioId,
    groups: &[Group],
) -> AggregationResult {
    let result = match scenario {
        ScenarioId::Current => region_based(dataset, scenario, &PresetMerge::default(), 0.0, 0.0),
        ScenarioId::Scenario1 => region_based(
            dataset,
            scenario,
            &dataset.presets.merge_a,
            SCENARIO1_TRANSPORT_PENALTY,
            SCENARIO1_ARRIVAL_PENALTY,
        ),
        ScenarioId::Scenario2 => region_based(
            dataset,
            scenario,
            &dataset.presets.merge_b,
            SCENARIO2_TRANSPORT_PENALTY,
            SCENARIO2_ARRIVAL_PENALTY,
        ),
        ScenarioId::Custom => custom(dataset, groups),
    };

    debug!(
        "Scenario {}: {} groups, transport {:.2}, arrival {:.2}",
        result.scenario, result.group_count, result.avg_transport, result.avg_arrival
    );

    result
}

/// Current or preset scenario: every region counts toward the totals,
/// absorbed regions are left out of the averages.
fn region_based(
    dataset: &Dataset,
    scenario: ScenarioId,
    preset: &PresetMerge,
    transport_penalty: f64,
    arrival_penalty: f64,
) -> AggregationResult {
    let rows: Vec<GroupStats> = dataset
        .regions
        .iter()
        .map(|r| GroupStats {
            label: r.name.clone(),
            members: vec![r.id.clone()],
            population_2040: r.population.y2040,
            beds: r.beds.total,
            transport: r.avg_transport_time,
            arrival: r.arrival_time(),
            absorbed: preset.absorbed.contains(&r.id),
        })
        .collect();

    let remaining: Vec<&GroupStats> = rows.iter().filter(|g| !g.absorbed).collect();
    let group_count = remaining.len();

    let avg_transport = mean(remaining.iter().map(|g| g.transport)) + transport_penalty;
    let avg_arrival = mean(remaining.iter().map(|g| g.arrival)) + arrival_penalty;

    finish(scenario, group_count, avg_transport, avg_arrival, rows)
}

/// Custom scenario: committed groups plus every unmerged municipality.
fn custom(dataset: &Dataset, groups: &[Group]) -> AggregationResult {
    let merged: HashSet<&str> = groups.iter().flatten().map(String::as_str).collect();

    let mut rows: Vec<GroupStats> = dataset
        .sub_units
        .iter()
        .filter(|s| !merged.contains(s.name.as_str()))
        .map(|s| group_stats(dataset, std::slice::from_ref(&s.name)))
        .collect();
    rows.extend(groups.iter().map(|g| group_stats(dataset, g)));

    let group_count = rows.len();
    let avg_transport = mean(rows.iter().map(|g| g.transport));
    let avg_arrival = mean(rows.iter().map(|g| g.arrival));

    finish(ScenarioId::Custom, group_count, avg_transport, avg_arrival, rows)
}

/// Statistics for a set of municipalities treated as one region.
///
/// Beds come from hospitals whose address contains a member's name. A
/// hospital matching two members of the same group is counted twice.
pub fn group_stats(dataset: &Dataset, members: &[String]) -> GroupStats {
    let mut population_2040 = 0;
    let mut beds = 0;

    for name in members {
        population_2040 += dataset.sub_unit(name).map_or(0, |s| s.population_2040);
        beds += dataset
            .hospitals()
            .filter(|h| h.located_in(name))
            .map(|h| h.beds)
            .sum::<u64>();
    }

    let base_transport = mean(members.iter().map(|name| {
        dataset
            .region_of(name)
            .map_or(FALLBACK_TRANSPORT_MINUTES, |r| r.avg_transport_time)
    }));
    let base_arrival = mean(members.iter().map(|name| {
        dataset
            .region_of(name)
            .map_or(FALLBACK_ARRIVAL_MINUTES, |r| r.arrival_time())
    }));

    // Zero for a single municipality.
    let extra_units = members.len().saturating_sub(1) as f64;

    GroupStats {
        label: members.join(" + "),
        members: members.to_vec(),
        population_2040,
        beds,
        transport: base_transport + CUSTOM_TRANSPORT_PENALTY_PER_UNIT * extra_units,
        arrival: base_arrival + CUSTOM_ARRIVAL_PENALTY_PER_UNIT * extra_units,
        absorbed: false,
    }
}

fn finish(
    scenario: ScenarioId,
    group_count: usize,
    avg_transport: f64,
    avg_arrival: f64,
    groups: Vec<GroupStats>,
) -> AggregationResult {
    let total_population_2040: u64 = groups.iter().map(|g| g.population_2040).sum();
    let total_beds: u64 = groups.iter().map(|g| g.beds).sum();

    let (beds_per_group, population_per_group) = if group_count > 0 {
        (
            total_beds as f64 / group_count as f64,
            total_population_2040 as f64 / group_count as f64,
        )
    } else {
        (0.0, 0.0)
    };

    let beds_per_10k = if population_per_group > 0.0 {
        beds_per_group / (population_per_group / 10_000.0)
    } else {
        0.0
    };

    AggregationResult {
        scenario,
        group_count,
        total_population_2040,
        total_beds,
        avg_transport,
        avg_arrival,
        beds_per_group,
        population_per_group,
        beds_per_10k,
        ratings: Ratings {
            transport: Rating::transport(avg_transport),
            balance: Rating::balance(beds_per_10k),
            arrival: Rating::arrival(avg_arrival),
        },
        groups,
    }
}

/// Arithmetic mean; 0 for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;
    use crate::models::{Hospital, SubUnit};

    const EPS: f64 = 1e-9;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn custom_state(groups: &[&[&str]]) -> ScenarioState {
        ScenarioState {
            scenario: ScenarioId::Custom,
            selection: Default::default(),
            groups: groups
                .iter()
                .map(|g| g.iter().map(|n| n.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_baseline() {
        let dataset = fixtures::sample();
        let result = compute_aggregate(&dataset, &ScenarioState::default());

        assert_eq!(result.scenario, ScenarioId::Current);
        assert_eq!(result.group_count, 7);
        assert_eq!(result.total_population_2040, 1_420_000);
        assert_eq!(result.total_beds, 18_700);
        assert_close(result.avg_transport, 46.0);
        // r4 has no arrival time and falls back to 9.4.
        assert_close(result.avg_arrival, 66.4 / 7.0);
        assert_eq!(result.groups.len(), 7);
        assert!(result.groups.iter().all(|g| !g.absorbed));
    }

    #[test]
    fn test_scenario1() {
        let dataset = fixtures::sample();
        let result = compute_scenario(&dataset, ScenarioId::Scenario1, &[]);

        assert_eq!(result.group_count, 6);
        // Absorbed region still counts toward the totals.
        assert_eq!(result.total_population_2040, 1_420_000);
        assert_eq!(result.total_beds, 18_700);
        assert_close(result.avg_transport, 280.0 / 6.0 + 2.0);
        assert_close(result.avg_arrival, 57.9 / 6.0 + 1.0);
        assert_eq!(result.groups.iter().filter(|g| g.absorbed).count(), 1);
    }

    #[test]
    fn test_scenario2() {
        let dataset = fixtures::sample();
        let result = compute_scenario(&dataset, ScenarioId::Scenario2, &[]);

        assert_eq!(result.group_count, 5);
        assert_eq!(result.total_population_2040, 1_420_000);
        assert_close(result.avg_transport, 228.0 / 5.0 + 5.0);
        assert_close(result.avg_arrival, 46.9 / 5.0 + 2.5);
        assert_eq!(result.ratings.transport, Rating::Bad);
        assert_eq!(result.ratings.arrival, Rating::Bad);
    }

    #[test]
    fn test_custom_empty_is_all_independent() {
        let dataset = fixtures::sample();
        let result = compute_aggregate(&dataset, &custom_state(&[]));

        assert_eq!(result.group_count, dataset.sub_units.len());
        assert_eq!(result.total_population_2040, 1_420_000);
        assert_eq!(result.total_beds, 3_300);
        assert_close(result.avg_transport, 362.0 / 8.0);
    }

    #[test]
    fn test_custom_merge() {
        let dataset = fixtures::sample();
        let result = compute_aggregate(&dataset, &custom_state(&[&["A-city", "C-city"]]));

        assert_eq!(result.group_count, 7);
        assert_eq!(result.total_population_2040, 1_420_000);
        assert_eq!(result.total_beds, 3_300);

        let merged = result.groups.last().unwrap();
        assert_eq!(merged.label, "A-city + C-city");
        assert_eq!(merged.population_2040, 500_000);
        assert_eq!(merged.beds, 1_100);
        assert_close(merged.transport, 41.0 + 2.0);
        assert_close(merged.arrival, 8.25 + 1.0);

        assert_close(result.avg_transport, (280.0 + 43.0) / 7.0);
    }

    #[test]
    fn test_pending_selection_is_ignored() {
        let dataset = fixtures::sample();
        let mut state = custom_state(&[&["A-city", "C-city"]]);
        let before = compute_aggregate(&dataset, &state);
        state.selection.insert("D-city".to_string());
        state.selection.insert("E-city".to_string());
        assert_eq!(compute_aggregate(&dataset, &state), before);
    }

    #[test]
    fn test_merge_penalty_grows_by_two_per_unit() {
        let mut dataset = fixtures::sample();
        for name in ["A2-village", "A3-village"] {
            dataset.sub_units.push(SubUnit {
                name: name.to_string(),
                population_2040: 1_000,
                region: "r1".to_string(),
            });
        }

        let members: Vec<String> = ["A-city", "B-town", "A2-village", "A3-village"]
            .iter()
            .map(|n| n.to_string())
            .collect();

        for k in 1..members.len() {
            let smaller = group_stats(&dataset, &members[..k]);
            let larger = group_stats(&dataset, &members[..k + 1]);
            assert_close(larger.transport - smaller.transport, 2.0);
            assert_close(larger.arrival - smaller.arrival, 1.0);
        }
    }

    #[test]
    fn test_unknown_municipality_uses_fallbacks() {
        let dataset = fixtures::sample();
        let stats = group_stats(&dataset, &["Nowhere".to_string()]);
        assert_eq!(stats.population_2040, 0);
        assert_eq!(stats.beds, 0);
        assert_close(stats.transport, FALLBACK_TRANSPORT_MINUTES);
        assert_close(stats.arrival, FALLBACK_ARRIVAL_MINUTES);

        let result = compute_aggregate(&dataset, &custom_state(&[&["Nowhere", "Elsewhere"]]));
        assert_eq!(result.group_count, 9);
        assert_close(result.groups[8].transport, 45.0 + 2.0);
    }

    #[test]
    fn test_hospital_double_counted_within_group() {
        let mut dataset = fixtures::sample();
        dataset.regions[0].hospitals.push(Hospital {
            name: "Border".to_string(),
            beds: 90,
            address: "A-city / B-town boundary".to_string(),
            kind: None,
            departments: vec![],
        });

        let stats = group_stats(&dataset, &["A-city".to_string(), "B-town".to_string()]);
        assert_eq!(stats.beds, 700 + 300 + 90 * 2);
    }

    #[test]
    fn test_reset_matches_pristine() {
        let dataset = fixtures::sample();
        let pristine = compute_aggregate(&dataset, &custom_state(&[]));

        let state = ScenarioState::default()
            .select_scenario(ScenarioId::Custom)
            .toggle("A-city")
            .and_then(|s| s.toggle("B-town"))
            .and_then(|s| s.commit_merge())
            .and_then(|s| s.toggle("G-city"))
            .and_then(|s| s.toggle("H-city"))
            .and_then(|s| s.commit_merge())
            .unwrap();
        assert_ne!(compute_aggregate(&dataset, &state), pristine);

        let reset = state.reset_custom();
        assert_eq!(compute_aggregate(&dataset, &reset), pristine);
    }

    #[test]
    fn test_invariants_hold_for_all_scenarios() {
        let dataset = fixtures::sample();
        let state = custom_state(&[&["D-city", "E-city", "F-town"]]);
        for result in compare_all(&dataset, &state) {
            assert!(result.group_count >= 1);
            assert!(result.avg_transport > 0.0);
            assert!(result.beds_per_10k > 0.0);
        }
    }

    #[test]
    fn test_empty_partition_has_zero_averages() {
        let mut dataset = fixtures::sample();
        dataset.sub_units.clear();
        let result = compute_aggregate(&dataset, &custom_state(&[]));
        assert_eq!(result.group_count, 0);
        assert_eq!(result.avg_transport, 0.0);
        assert_eq!(result.beds_per_group, 0.0);
        assert_eq!(result.beds_per_10k, 0.0);
    }

    #[test]
    fn test_ratings() {
        assert_eq!(Rating::transport(45.9), Rating::Good);
        assert_eq!(Rating::transport(46.0), Rating::Warning);
        assert_eq!(Rating::transport(50.0), Rating::Bad);
        assert_eq!(Rating::arrival(9.4), Rating::Good);
        assert_eq!(Rating::arrival(10.9), Rating::Warning);
        assert_eq!(Rating::arrival(11.0), Rating::Bad);
        assert_eq!(Rating::balance(100.0), Rating::Warning);
        assert_eq!(Rating::balance(100.1), Rating::Good);

        let ratings = Ratings {
            transport: Rating::Good,
            balance: Rating::Warning,
            arrival: Rating::Good,
        };
        assert_eq!(ratings.worst(), Rating::Warning);
    }

    #[test]
    fn test_bundled_baseline() {
        let dataset = Dataset::bundled().unwrap();
        let result = compute_scenario(&dataset, ScenarioId::Current, &[]);
        assert_eq!(result.group_count, 7);
        assert_eq!(result.total_population_2040, 2_197_000);
        assert_eq!(result.total_beds, 30_345);
        assert_close(result.avg_transport, 334.0 / 7.0);
        assert_close(result.avg_arrival, 9.4);

        let merged = compute_scenario(&dataset, ScenarioId::Scenario1, &[]);
        assert_eq!(merged.group_count, 6);
        assert_close(merged.avg_transport, 286.0 / 6.0 + 2.0);
    }
}

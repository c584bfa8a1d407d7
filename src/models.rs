//! Reference data models for the region simulator.
//!
//! This module contains the static structures loaded once at startup:
//! secondary medical regions, their hospitals, and the municipalities
//! (sub-units) that can be merged in a custom scenario.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Arrival time used when a region carries no measured value (minutes).
pub const FALLBACK_ARRIVAL_MINUTES: f64 = 9.4;

/// Projection year of a population figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Year {
    #[serde(rename = "2020")]
    Y2020,
    #[serde(rename = "2025")]
    Y2025,
    #[serde(rename = "2030")]
    Y2030,
    #[serde(rename = "2035")]
    Y2035,
    #[serde(rename = "2040")]
    Y2040,
}

impl Year {
    /// All projection years in chronological order.
    pub const ALL: [Year; 5] = [
        Year::Y2020,
        Year::Y2025,
        Year::Y2030,
        Year::Y2035,
        Year::Y2040,
    ];

    /// Returns the calendar year.
    pub fn value(&self) -> u16 {
        match self {
            Year::Y2020 => 2020,
            Year::Y2025 => 2025,
            Year::Y2030 => 2030,
            Year::Y2035 => 2035,
            Year::Y2040 => 2040,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Population projection keyed by year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    #[serde(rename = "2020")]
    pub y2020: u64,
    #[serde(rename = "2025")]
    pub y2025: u64,
    #[serde(rename = "2030")]
    pub y2030: u64,
    #[serde(rename = "2035")]
    pub y2035: u64,
    #[serde(rename = "2040")]
    pub y2040: u64,
}

impl Population {
    /// Returns the projected population for a year.
    pub fn get(&self, year: Year) -> u64 {
        match year {
            Year::Y2020 => self.y2020,
            Year::Y2025 => self.y2025,
            Year::Y2030 => self.y2030,
            Year::Y2035 => self.y2035,
            Year::Y2040 => self.y2040,
        }
    }

    /// Returns `(year, population)` pairs in chronological order.
    pub fn series(&self) -> Vec<(Year, u64)> {
        Year::ALL.iter().map(|y| (*y, self.get(*y))).collect()
    }
}

/// Bed counts of a region, split by functional category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedBreakdown {
    /// Total licensed beds.
    pub total: u64,
    /// High-acute care beds.
    pub high_acute: u64,
    /// Acute care beds.
    pub acute: u64,
    /// Recovery-phase beds.
    pub recovery: u64,
    /// Chronic care beds.
    pub chronic: u64,
}

impl BedBreakdown {
    /// Sum of the four functional categories.
    pub fn category_sum(&self) -> u64 {
        self.high_acute + self.acute + self.recovery + self.chronic
    }

    /// Whether the categories add up to the total.
    pub fn is_consistent(&self) -> bool {
        self.category_sum() == self.total
    }
}

/// A hospital inside a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    /// Hospital name.
    pub name: String,
    /// Number of beds.
    pub beds: u64,
    /// Postal address. Used to attribute the hospital to a municipality.
    pub address: String,
    /// Designation (e.g. regional support hospital).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Main departments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub departments: Vec<String>,
}

impl Hospital {
    /// Whether the address mentions the given municipality name.
    ///
    /// Plain substring match: nested names (a ward inside a city) both match.
    pub fn located_in(&self, sub_unit: &str) -> bool {
        self.address.contains(sub_unit)
    }
}

/// A secondary medical region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRegion {
    /// Stable identifier (e.g. `hiroshimaNishi`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Display color (hex).
    #[serde(default)]
    pub color: String,
    /// Names of member municipalities.
    #[serde(default)]
    pub members: Vec<String>,
    /// Population projection.
    pub population: Population,
    /// Bed counts.
    pub beds: BedBreakdown,
    /// Average transport time to hospital (minutes).
    pub avg_transport_time: f64,
    /// Average time for an ambulance to reach the scene (minutes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_arrival_time: Option<f64>,
    /// Hospitals in the region.
    #[serde(default)]
    pub hospitals: Vec<Hospital>,
}

impl ReferenceRegion {
    /// Arrival time, falling back to [`FALLBACK_ARRIVAL_MINUTES`].
    ///
    /// A recorded zero (or NaN) counts as missing.
    pub fn arrival_time(&self) -> f64 {
        self.avg_arrival_time
            .filter(|minutes| *minutes != 0.0 && !minutes.is_nan())
            .unwrap_or(FALLBACK_ARRIVAL_MINUTES)
    }

    /// Total beds across listed hospitals.
    pub fn hospital_beds(&self) -> u64 {
        self.hospitals.iter().map(|h| h.beds).sum()
    }
}

/// A municipality that can take part in a custom merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubUnit {
    /// Municipality name (unique key).
    pub name: String,
    /// Projected population in 2040.
    pub population_2040: u64,
    /// Identifier of the owning region.
    pub region: String,
}

/// Regions absorbed into a neighbour by a preset scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetMerge {
    /// Identifiers of the absorbed regions.
    #[serde(default)]
    pub absorbed: Vec<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The two preset reorganization proposals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presets {
    /// Six-region proposal.
    #[serde(default = "default_merge_a")]
    pub merge_a: PresetMerge,
    /// Five-region proposal.
    #[serde(default = "default_merge_b")]
    pub merge_b: PresetMerge,
}

impl Default for Presets {
    fn default() -> Self {
        Self {
            merge_a: default_merge_a(),
            merge_b: default_merge_b(),
        }
    }
}

fn default_merge_a() -> PresetMerge {
    PresetMerge {
        absorbed: vec!["hiroshimaNishi".to_string()],
        description: None,
    }
}

fn default_merge_b() -> PresetMerge {
    PresetMerge {
        absorbed: vec!["hiroshimaNishi".to_string(), "bihoku".to_string()],
        description: None,
    }
}

/// Prefecture-wide reference statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrefectureStats {
    pub total_population_2020: u64,
    pub total_population_2040: u64,
    pub total_beds_2023: u64,
    pub avg_transport_time_2022: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_without_arrival() -> ReferenceRegion {
        ReferenceRegion {
            id: "r1".to_string(),
            name: "Region 1".to_string(),
            color: "#000000".to_string(),
            members: vec!["A".to_string()],
            population: Population {
                y2020: 100,
                y2025: 90,
                y2030: 80,
                y2035: 70,
                y2040: 60,
            },
            beds: BedBreakdown {
                total: 10,
                high_acute: 1,
                acute: 4,
                recovery: 3,
                chronic: 2,
            },
            avg_transport_time: 44.0,
            avg_arrival_time: None,
            hospitals: vec![Hospital {
                name: "General".to_string(),
                beds: 7,
                address: "A 1-2".to_string(),
                kind: None,
                departments: vec![],
            }],
        }
    }

    #[test]
    fn test_year_ordering() {
        assert!(Year::Y2020 < Year::Y2040);
        assert_eq!(Year::Y2035.value(), 2035);
        assert_eq!(Year::Y2025.to_string(), "2025");
    }

    #[test]
    fn test_population_series() {
        let region = region_without_arrival();
        let series = region.population.series();
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (Year::Y2020, 100));
        assert_eq!(series[4], (Year::Y2040, 60));
        assert_eq!(region.population.get(Year::Y2030), 80);
    }

    #[test]
    fn test_bed_consistency() {
        let mut beds = region_without_arrival().beds;
        assert!(beds.is_consistent());
        beds.chronic += 1;
        assert!(!beds.is_consistent());
        assert_eq!(beds.category_sum(), 11);
    }

    #[test]
    fn test_arrival_fallback() {
        let mut region = region_without_arrival();
        assert_eq!(region.arrival_time(), FALLBACK_ARRIVAL_MINUTES);
        region.avg_arrival_time = Some(8.1);
        assert_eq!(region.arrival_time(), 8.1);
        region.avg_arrival_time = Some(0.0);
        assert_eq!(region.arrival_time(), FALLBACK_ARRIVAL_MINUTES);
        region.avg_arrival_time = Some(f64::NAN);
        assert_eq!(region.arrival_time(), FALLBACK_ARRIVAL_MINUTES);
    }

    #[test]
    fn test_hospital_located_in() {
        let region = region_without_arrival();
        assert!(region.hospitals[0].located_in("A"));
        assert!(!region.hospitals[0].located_in("B"));
        assert_eq!(region.hospital_beds(), 7);
    }

    #[test]
    fn test_population_year_keys() {
        let json = r#"{"2020":5,"2025":4,"2030":3,"2035":2,"2040":1}"#;
        let population: Population = serde_json::from_str(json).unwrap();
        assert_eq!(population.get(Year::Y2040), 1);
    }
}

//! Region profiles and prefecture overview.

use crate::dataset::Dataset;
use crate::models::{BedBreakdown, ReferenceRegion, Year};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport time class of a single region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportClass {
    Fast,
    Medium,
    Slow,
}

impl TransportClass {
    pub fn from_minutes(minutes: f64) -> Self {
        if minutes < 45.0 {
            TransportClass::Fast
        } else if minutes < 50.0 {
            TransportClass::Medium
        } else {
            TransportClass::Slow
        }
    }
}

impl fmt::Display for TransportClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportClass::Fast => write!(f, "Fast"),
            TransportClass::Medium => write!(f, "Medium"),
            TransportClass::Slow => write!(f, "Slow"),
        }
    }
}

/// Summary card of one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Municipalities of the region known to the dataset.
    pub municipalities: Vec<String>,
    pub population: Vec<(Year, u64)>,
    /// Change from 2020 to 2040 in percent.
    pub population_change_pct: f64,
    pub beds: BedBreakdown,
    pub hospital_count: usize,
    pub hospital_beds: u64,
    pub avg_transport_time: f64,
    pub avg_arrival_time: f64,
    pub transport_class: TransportClass,
}

/// Prefecture-wide figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefectureSummary {
    pub total_population_2020: u64,
    pub total_population_2040: u64,
    pub population_change_pct: f64,
    pub total_beds: u64,
    pub avg_transport_time: f64,
    /// True when computed from regions because the dataset has no prefecture section.
    pub derived: bool,
}

/// Build the profile of one region.
pub fn region_profile(dataset: &Dataset, region: &ReferenceRegion) -> RegionProfile {
    RegionProfile {
        id: region.id.clone(),
        name: region.name.clone(),
        color: region.color.clone(),
        municipalities: dataset
            .sub_units_of(&region.id)
            .map(|s| s.name.clone())
            .collect(),
        population: region.population.series(),
        population_change_pct: change_pct(region.population.y2020, region.population.y2040),
        beds: region.beds,
        hospital_count: region.hospitals.len(),
        hospital_beds: region.hospital_beds(),
        avg_transport_time: region.avg_transport_time,
        avg_arrival_time: region.arrival_time(),
        transport_class: TransportClass::from_minutes(region.avg_transport_time),
    }
}

/// Profiles of every region in dataset order.
pub fn region_profiles(dataset: &Dataset) -> Vec<RegionProfile> {
    dataset
        .regions
        .iter()
        .map(|r| region_profile(dataset, r))
        .collect()
}

/// Prefecture overview, falling back to region sums.
pub fn prefecture_summary(dataset: &Dataset) -> PrefectureSummary {
    if let Some(stats) = dataset.prefecture {
        return PrefectureSummary {
            total_population_2020: stats.total_population_2020,
            total_population_2040: stats.total_population_2040,
            population_change_pct: change_pct(
                stats.total_population_2020,
                stats.total_population_2040,
            ),
            total_beds: stats.total_beds_2023,
            avg_transport_time: stats.avg_transport_time_2022,
            derived: false,
        };
    }

    let total_population_2020 = dataset.regions.iter().map(|r| r.population.y2020).sum();
    let total_population_2040 = dataset.regions.iter().map(|r| r.population.y2040).sum();
    let transport_sum: f64 = dataset.regions.iter().map(|r| r.avg_transport_time).sum();

    PrefectureSummary {
        total_population_2020,
        total_population_2040,
        population_change_pct: change_pct(total_population_2020, total_population_2040),
        total_beds: dataset.regions.iter().map(|r| r.beds.total).sum(),
        avg_transport_time: if dataset.regions.is_empty() {
            0.0
        } else {
            transport_sum / dataset.regions.len() as f64
        },
        derived: true,
    }
}

fn change_pct(from: u64, to: u64) -> f64 {
    if from == 0 {
        return 0.0;
    }
    (to as f64 - from as f64) / from as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;

    #[test]
    fn test_transport_class() {
        assert_eq!(TransportClass::from_minutes(44.0), TransportClass::Fast);
        assert_eq!(TransportClass::from_minutes(45.0), TransportClass::Medium);
        assert_eq!(TransportClass::from_minutes(49.9), TransportClass::Medium);
        assert_eq!(TransportClass::from_minutes(58.0), TransportClass::Slow);
    }

    #[test]
    fn test_region_profile() {
        let dataset = fixtures::sample();
        let profile = region_profile(&dataset, &dataset.regions[0]);

        assert_eq!(profile.id, "r1");
        assert_eq!(profile.municipalities, vec!["A-city", "B-town"]);
        assert_eq!(profile.population.len(), 5);
        assert!((profile.population_change_pct - (-20_000.0 / 520_000.0 * 100.0)).abs() < 1e-9);
        assert_eq!(profile.hospital_count, 2);
        assert_eq!(profile.hospital_beds, 1_000);
        assert_eq!(profile.transport_class, TransportClass::Fast);
    }

    #[test]
    fn test_profile_arrival_fallback() {
        let dataset = fixtures::sample();
        let profiles = region_profiles(&dataset);
        assert_eq!(profiles.len(), 7);
        assert_eq!(profiles[3].avg_arrival_time, 9.4);
    }

    #[test]
    fn test_prefecture_summary_from_dataset() {
        let dataset = Dataset::bundled().unwrap();
        let summary = prefecture_summary(&dataset);
        assert!(!summary.derived);
        assert_eq!(summary.total_population_2020, 2_800_000);
        assert_eq!(summary.total_beds, 30_294);
        assert!((summary.population_change_pct - (-13.285714285714286)).abs() < 1e-9);
    }

    #[test]
    fn test_prefecture_summary_derived() {
        let dataset = fixtures::sample();
        let summary = prefecture_summary(&dataset);
        assert!(summary.derived);
        assert_eq!(summary.total_population_2040, 1_420_000);
        assert_eq!(summary.total_population_2020, 1_560_000);
        assert_eq!(summary.total_beds, 18_700);
        assert!((summary.avg_transport_time - 46.0).abs() < 1e-9);
    }

    #[test]
    fn test_change_pct_zero_base() {
        assert_eq!(change_pct(0, 100), 0.0);
    }
}

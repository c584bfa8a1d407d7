//! Reference dataset container and loading.
//!
//! The dataset is loaded once at startup and treated as immutable
//! afterwards; every engine call borrows it.

pub mod loader;

use crate::models::{Hospital, PrefectureStats, Presets, ReferenceRegion, SubUnit};
use serde::{Deserialize, Serialize};

/// All static reference data consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Secondary medical regions, in display order.
    pub regions: Vec<ReferenceRegion>,
    /// Municipalities, in display order.
    pub sub_units: Vec<SubUnit>,
    /// Preset reorganization proposals.
    #[serde(default)]
    pub presets: Presets,
    /// Prefecture-wide statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefecture: Option<PrefectureStats>,
}

impl Dataset {
    /// Look up a region by identifier.
    pub fn region(&self, id: &str) -> Option<&ReferenceRegion> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Look up a municipality by name.
    pub fn sub_unit(&self, name: &str) -> Option<&SubUnit> {
        self.sub_units.iter().find(|s| s.name == name)
    }

    /// The region owning a municipality, if both are known.
    pub fn region_of(&self, sub_unit: &str) -> Option<&ReferenceRegion> {
        self.sub_unit(sub_unit)
            .and_then(|s| self.region(&s.region))
    }

    /// Every hospital of every region.
    pub fn hospitals(&self) -> impl Iterator<Item = &Hospital> {
        self.regions.iter().flat_map(|r| r.hospitals.iter())
    }

    /// Municipalities belonging to a region.
    pub fn sub_units_of<'a>(&'a self, region_id: &'a str) -> impl Iterator<Item = &'a SubUnit> {
        self.sub_units.iter().filter(move |s| s.region == region_id)
    }
}

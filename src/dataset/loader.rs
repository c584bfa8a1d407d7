//! Dataset loading and validation.
//!
//! Datasets are read from TOML or JSON files. A Hiroshima prefecture
//! dataset is compiled into the binary and used when no file is given.

use super::Dataset;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The dataset compiled into the binary.
pub const BUNDLED_DATASET: &str = include_str!("../../data/hiroshima.toml");

/// Number of regions the preset scenarios were designed for.
const EXPECTED_REGION_COUNT: usize = 7;

/// Errors raised while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML dataset: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported dataset format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),
    #[error("dataset contains no regions")]
    NoRegions,
    #[error("dataset contains no municipalities")]
    NoSubUnits,
    #[error("duplicate region id: {0}")]
    DuplicateRegion(String),
    #[error("duplicate municipality: {0}")]
    DuplicateSubUnit(String),
}

impl Dataset {
    /// Parse and validate the bundled dataset.
    pub fn bundled() -> Result<Self, DatasetError> {
        Self::from_toml_str(BUNDLED_DATASET)
    }

    /// Load a dataset file, choosing the parser from the extension.
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        debug!("Parsing dataset {} as {}", path.display(), ext);

        match ext.as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(DatasetError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Parse and validate a TOML dataset.
    pub fn from_toml_str(content: &str) -> Result<Self, DatasetError> {
        let dataset: Dataset = toml::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Parse and validate a JSON dataset.
    pub fn from_json_str(content: &str) -> Result<Self, DatasetError> {
        let dataset: Dataset = serde_json::from_str(content)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Reject structurally broken datasets and log soft anomalies.
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.regions.is_empty() {
            return Err(DatasetError::NoRegions);
        }
        if self.sub_units.is_empty() {
            return Err(DatasetError::NoSubUnits);
        }

        let mut region_ids = HashSet::new();
        for region in &self.regions {
            if !region_ids.insert(region.id.as_str()) {
                return Err(DatasetError::DuplicateRegion(region.id.clone()));
            }
        }

        let mut names = HashSet::new();
        for sub_unit in &self.sub_units {
            if !names.insert(sub_unit.name.as_str()) {
                return Err(DatasetError::DuplicateSubUnit(sub_unit.name.clone()));
            }
        }

        for warning in self.warnings() {
            warn!("Dataset: {}", warning);
        }

        debug!(
            "Dataset validated: {} regions, {} municipalities, {} hospitals",
            self.regions.len(),
            self.sub_units.len(),
            self.hospitals().count()
        );

        Ok(())
    }

    /// Anomalies that do not prevent simulation.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.regions.len() != EXPECTED_REGION_COUNT {
            warnings.push(format!(
                "expected {} regions, found {}",
                EXPECTED_REGION_COUNT,
                self.regions.len()
            ));
        }

        for region in &self.regions {
            if !region.beds.is_consistent() {
                warnings.push(format!(
                    "region {}: bed categories sum to {} but total is {}",
                    region.id,
                    region.beds.category_sum(),
                    region.beds.total
                ));
            }
        }

        for sub_unit in &self.sub_units {
            if self.region(&sub_unit.region).is_none() {
                warnings.push(format!(
                    "municipality {} refers to unknown region {}",
                    sub_unit.name, sub_unit.region
                ));
            }
        }

        for (label, preset) in [
            ("merge_a", &self.presets.merge_a),
            ("merge_b", &self.presets.merge_b),
        ] {
            for id in &preset.absorbed {
                if self.region(id).is_none() {
                    warnings.push(format!("preset {} absorbs unknown region {}", label, id));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures;
    use std::io::Write;

    #[test]
    fn test_bundled_dataset() {
        let dataset = Dataset::bundled().unwrap();
        assert_eq!(dataset.regions.len(), 7);
        assert_eq!(dataset.sub_units.len(), 30);
        assert!(dataset.prefecture.is_some());
        assert!(dataset.warnings().is_empty(), "{:?}", dataset.warnings());
    }

    #[test]
    fn test_bundled_sub_units_match_region_totals() {
        let dataset = Dataset::bundled().unwrap();
        for region in &dataset.regions {
            let sum: u64 = dataset
                .sub_units_of(&region.id)
                .map(|s| s.population_2040)
                .sum();
            assert_eq!(sum, region.population.y2040, "region {}", region.id);
        }
    }

    #[test]
    fn test_load_json_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample_dataset.json");
        let dataset = Dataset::load(&path).unwrap();
        assert_eq!(dataset.regions.len(), 2);
        assert_eq!(dataset.sub_units.len(), 3);
        assert_eq!(dataset.presets.merge_a.absorbed, vec!["south"]);
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(BUNDLED_DATASET.as_bytes()).unwrap();

        let dataset = Dataset::load(file.path()).unwrap();
        assert_eq!(dataset, Dataset::bundled().unwrap());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat(ext) if ext == "csv"));
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/dataset.toml")).unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
    }

    #[test]
    fn test_structural_errors() {
        let mut dataset = fixtures::sample();
        dataset.sub_units.push(dataset.sub_units[0].clone());
        assert!(matches!(
            dataset.validate(),
            Err(DatasetError::DuplicateSubUnit(name)) if name == "A-city"
        ));

        let mut dataset = fixtures::sample();
        dataset.regions.push(dataset.regions[3].clone());
        assert!(matches!(dataset.validate(), Err(DatasetError::DuplicateRegion(_))));

        let mut dataset = fixtures::sample();
        dataset.sub_units.clear();
        assert!(matches!(dataset.validate(), Err(DatasetError::NoSubUnits)));

        let mut dataset = fixtures::sample();
        dataset.regions.clear();
        assert!(matches!(dataset.validate(), Err(DatasetError::NoRegions)));
    }

    #[test]
    fn test_soft_warnings() {
        let mut dataset = fixtures::sample();
        assert!(dataset.warnings().is_empty());

        dataset.regions[0].beds.total += 5;
        dataset.sub_units[0].region = "ghost".to_string();
        dataset.presets.merge_b.absorbed.push("phantom".to_string());

        let warnings = dataset.warnings();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("bed categories"));
        assert!(warnings[1].contains("ghost"));
        assert!(warnings[2].contains("phantom"));
        assert!(dataset.validate().is_ok());
    }
}

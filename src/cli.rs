//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::engine::{Action, Rating, ScenarioId};
use clap::Parser;
use std::path::PathBuf;

/// MedRegion - secondary medical region reorganization simulator
///
/// Compare the current medical regions with preset reorganization
/// proposals, or merge municipalities into custom regions, and report
/// population, bed and emergency transport statistics.
///
/// Examples:
///   medregion
///   medregion --scenario scenario2 --format json
///   medregion --merge 三次市,庄原市 --merge 呉市,江田島市
///   medregion --action scenario:custom --action toggle:呉市 --action toggle:竹原市 --action merge
///   medregion --compare --fail-on bad
///   medregion --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Scenario to evaluate
    ///
    /// Defaults to `custom` when --merge or --select is given, otherwise `current`.
    #[arg(short, long, value_name = "SCENARIO")]
    pub scenario: Option<ScenarioArg>,

    /// Merge municipalities into one region (comma-separated, repeatable)
    ///
    /// Example: --merge 三次市,庄原市
    #[arg(short, long, value_name = "NAMES")]
    pub merge: Vec<String>,

    /// Select a municipality without merging it (repeatable)
    #[arg(long, value_name = "NAME")]
    pub select: Vec<String>,

    /// Raw session action, applied after --merge and --select (repeatable)
    ///
    /// Values: scenario:<id>, toggle:<name>, merge, reset
    #[arg(short, long, value_name = "ACTION")]
    pub action: Vec<Action>,

    /// Reference dataset file (TOML or JSON)
    ///
    /// Uses the bundled dataset when not specified.
    #[arg(short, long, value_name = "FILE", env = "MEDREGION_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Output file path for the report, `-` for stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .medregion.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Include a comparison of every scenario
    #[arg(long)]
    pub compare: bool,

    /// List the municipalities of the dataset and exit
    #[arg(long)]
    pub list_units: bool,

    /// Fail if any rating is at or above this level
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is met.
    /// Values: warning, bad
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .medregion.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Scenario names accepted by --scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioArg {
    /// Current seven regions
    Current,
    /// Preset merge A
    Scenario1,
    /// Preset merge B
    Scenario2,
    /// Custom municipality merges
    Custom,
}

impl From<ScenarioArg> for ScenarioId {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Current => ScenarioId::Current,
            ScenarioArg::Scenario1 => ScenarioId::Scenario1,
            ScenarioArg::Scenario2 => ScenarioId::Scenario2,
            ScenarioArg::Custom => ScenarioId::Custom,
        }
    }
}

/// Rating level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Warning,
    Bad,
}

impl FailOnLevel {
    /// The lowest rating that trips the threshold.
    pub fn rating(&self) -> Rating {
        match self {
            FailOnLevel::Warning => Rating::Warning,
            FailOnLevel::Bad => Rating::Bad,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The scenario to start from.
    pub fn effective_scenario(&self) -> ScenarioId {
        match self.scenario {
            Some(arg) => arg.into(),
            None if !self.merge.is_empty() || !self.select.is_empty() => ScenarioId::Custom,
            None => ScenarioId::Current,
        }
    }

    /// Municipality groups given with --merge.
    pub fn merge_groups(&self) -> Vec<Vec<String>> {
        self.merge
            .iter()
            .map(|group| {
                group
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from)
                    .collect()
            })
            .collect()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for (raw, group) in self.merge.iter().zip(self.merge_groups()) {
            if group.len() < 2 {
                return Err(format!(
                    "--merge needs at least two comma-separated municipalities: '{}'",
                    raw
                ));
            }
        }

        if let Some(ref dataset) = self.dataset {
            if !dataset.is_file() {
                return Err(format!("Dataset file does not exist: {}", dataset.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

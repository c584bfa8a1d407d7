//! MedRegion - secondary medical region reorganization simulator
//!
//! A CLI tool that loads a prefecture's medical region reference data,
//! applies a reorganization scenario (preset or custom municipality
//! merges) and reports the resulting population, bed and emergency
//! transport statistics.
//!
//! Exit codes:
//!   0 - Success (no rating at or above threshold, or no --fail-on set)
//!   1 - Runtime error (dataset, config, report writing, etc.)
//!   2 - A rating at or above the --fail-on threshold

mod cli;
mod config;
mod dataset;
mod engine;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::Dataset;
use engine::{Action, Rejection, ScenarioState};
use report::{ReportMetadata, SimulationReport};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("MedRegion v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_simulation(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Simulation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .medregion.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to choose a dataset, output format and report sections.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete simulation workflow. Returns exit code (0 or 2).
fn run_simulation(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the reference data
    let (dataset, source) = load_dataset(&config)?;
    info!(
        "Dataset {}: {} regions, {} municipalities",
        source,
        dataset.regions.len(),
        dataset.sub_units.len()
    );

    if args.list_units {
        return handle_list_units(&dataset);
    }

    // Step 2: Replay the session
    let state = build_state(&args, &dataset);
    debug!(
        "Session: scenario {}, {} groups, {} selected",
        state.scenario,
        state.groups.len(),
        state.selection.len()
    );
    if !state.selection.is_empty() {
        let hint = if state.can_merge() {
            " (add --action merge to commit it)"
        } else {
            ""
        };
        warn!(
            "{} selected municipalities are not merged and do not affect the result{}",
            state.selection.len(),
            hint
        );
    }

    // Step 3: Aggregate
    let mut result = engine::compute_aggregate(&dataset, &state);
    let comparison = if config.report.include_comparison {
        engine::compare_all(&dataset, &state)
    } else {
        Vec::new()
    };
    let regions = if config.report.include_regions {
        engine::region_profiles(&dataset)
    } else {
        Vec::new()
    };
    let ratings = result.ratings;
    let summary = result.clone();
    if !config.report.include_groups {
        result.groups.clear();
    }

    // Step 4: Build and write the report
    let report = SimulationReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            dataset_source: source,
            regions: dataset.regions.len(),
            municipalities: dataset.sub_units.len(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        prefecture: engine::prefecture_summary(&dataset),
        state,
        result,
        comparison,
        regions,
    };

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let to_stdout = config.general.output == "-";
    if to_stdout {
        println!("{}", output);
    } else {
        std::fs::write(&config.general.output, &output)
            .with_context(|| format!("Failed to write report to {}", config.general.output))?;

        // Print summary
        println!("\n📊 {}:", summary.scenario.title());
        println!("   Regions: {}", summary.group_count);
        println!(
            "   Population per region (2040): {:.0}",
            summary.population_per_group
        );
        println!("   Beds per region: {:.0}", summary.beds_per_group);
        println!(
            "   {} Transport: {:.1} min | {} Arrival: {:.1} min | {} Beds/10k: {:.1}",
            ratings.transport.emoji(),
            summary.avg_transport,
            ratings.arrival.emoji(),
            summary.avg_arrival,
            ratings.balance.emoji(),
            summary.beds_per_10k
        );
        println!(
            "\n✅ Simulation complete! Report saved to: {}",
            config.general.output
        );
    }

    // Check --fail-on threshold
    if let Some(fail_level) = args.fail_on {
        if ratings.worst() >= fail_level.rating() {
            eprintln!(
                "\n⛔ Rating at or above {:?} ({}). Failing (exit code 2).",
                fail_level,
                ratings.worst()
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Replay --merge, --select and --action against a fresh session.
///
/// Each --merge group is committed whole or not at all. Rejected actions
/// are logged and skipped.
fn build_state(args: &Args, dataset: &Dataset) -> ScenarioState {
    let mut state = ScenarioState::default().select_scenario(args.effective_scenario());

    for group in args.merge_groups() {
        warn_unknown(dataset, &group);
        if let Some(name) = group.iter().find(|name| state.is_merged(name)) {
            warn!(
                "Skipping --merge {}: {} is already part of a merged group",
                group.join(","),
                name
            );
            continue;
        }
        match merge_group(&state, &group) {
            Ok(next) => state = next,
            Err(rejection) => warn!("Skipping --merge {}: {}", group.join(","), rejection),
        }
    }

    let actions = args
        .select
        .iter()
        .cloned()
        .map(Action::Toggle)
        .chain(args.action.iter().cloned());

    for action in actions {
        if let Action::Toggle(ref name) = action {
            warn_unknown(dataset, std::slice::from_ref(name));
        }
        match state.apply(&action) {
            Ok(next) => state = next,
            Err(rejection) => warn!("Ignoring '{}': {}", action, rejection),
        }
    }

    state
}

/// Select every member of a group and commit it, leaving `state` untouched on rejection.
fn merge_group(state: &ScenarioState, group: &[String]) -> Result<ScenarioState, Rejection> {
    group
        .iter()
        .try_fold(state.clone(), |next, name| next.toggle(name))?
        .commit_merge()
}

fn warn_unknown(dataset: &Dataset, names: &[String]) {
    for name in names {
        if dataset.sub_unit(name).is_none() {
            warn!("Unknown municipality '{}' contributes no population or beds", name);
        }
    }
}

/// Handle --list-units: print municipalities by region, exit.
fn handle_list_units(dataset: &Dataset) -> Result<i32> {
    for region in &dataset.regions {
        println!("\n🏥 {} ({})", region.name, region.id);
        for unit in dataset.sub_units_of(&region.id) {
            println!("     {} ({} in 2040)", unit.name, unit.population_2040);
        }
    }

    let orphans: Vec<_> = dataset
        .sub_units
        .iter()
        .filter(|s| dataset.region(&s.region).is_none())
        .collect();
    if !orphans.is_empty() {
        println!("\n❓ Without a known region");
        for unit in orphans {
            println!("     {} ({} in 2040)", unit.name, unit.population_2040);
        }
    }

    println!("\n   Total: {} municipalities", dataset.sub_units.len());
    Ok(0)
}

/// Load the configured dataset, or the bundled one. Returns it with a source label.
fn load_dataset(config: &Config) -> Result<(Dataset, String)> {
    match config.dataset.path {
        Some(ref path) => {
            info!("Loading dataset from: {}", path);
            let dataset = Dataset::load(Path::new(path))
                .with_context(|| format!("Failed to load dataset: {}", path))?;
            Ok((dataset, path.clone()))
        }
        None => {
            let dataset = Dataset::bundled().context("Failed to load bundled dataset")?;
            Ok((dataset, "bundled".to_string()))
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

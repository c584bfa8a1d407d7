//! Markdown and JSON report generation.
//!
//! This module renders a [`SimulationReport`] for humans (Markdown) or
//! for other tools (JSON). It only formats; every figure comes from the
//! engine.

use super::{ReportMetadata, SimulationReport};
use crate::engine::{
    AggregationResult, GroupStats, PrefectureSummary, RegionProfile, ScenarioId, ScenarioState,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SimulationReport) -> String {
    let mut output = String::new();

    output.push_str("# Medical Region Simulation Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_prefecture_section(&report.prefecture));
    output.push_str(&generate_result_section(&report.result));

    if report.result.scenario == ScenarioId::Custom {
        output.push_str(&generate_session_section(&report.state));
    }

    output.push_str(&generate_breakdown_section(&report.result.groups));
    output.push_str(&generate_comparison_section(&report.comparison));
    output.push_str(&generate_regions_section(&report.regions));
    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SimulationReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Population in units of 10,000 with one decimal.
fn ten_thousands(population: f64) -> String {
    format!("{:.1}", population / 10_000.0)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset_source));
    section.push_str(&format!("- **Regions:** {}\n", metadata.regions));
    section.push_str(&format!("- **Municipalities:** {}\n", metadata.municipalities));
    section.push_str(&format!("- **Version:** {}\n", metadata.tool_version));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &SimulationReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Prefecture Overview](#prefecture-overview)\n");
    toc.push_str("- [Simulation Result](#simulation-result)\n");

    if report.result.scenario == ScenarioId::Custom {
        toc.push_str("- [Custom Session](#custom-session)\n");
    }
    if !report.result.groups.is_empty() {
        toc.push_str("- [Breakdown](#breakdown)\n");
    }
    if !report.comparison.is_empty() {
        toc.push_str("- [Scenario Comparison](#scenario-comparison)\n");
    }
    if !report.regions.is_empty() {
        toc.push_str("- [Region Profiles](#region-profiles)\n");
        for region in &report.regions {
            toc.push_str(&format!("  - [{}](#region-{})\n", region.name, region.id.to_lowercase()));
        }
    }

    toc.push('\n');

    toc
}

fn generate_prefecture_section(summary: &PrefectureSummary) -> String {
    let mut section = String::new();

    section.push_str("## Prefecture Overview\n\n");
    if summary.derived {
        section.push_str("*Derived from region figures.*\n\n");
    }
    section.push_str("| Population 2020 (10k) | Population 2040 (10k) | Change | Beds | Avg Transport |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {:+.1}% | {} | {:.1} min |\n\n",
        ten_thousands(summary.total_population_2020 as f64),
        ten_thousands(summary.total_population_2040 as f64),
        summary.population_change_pct,
        summary.total_beds,
        summary.avg_transport_time
    ));

    section
}

fn generate_result_section(result: &AggregationResult) -> String {
    let mut section = String::new();

    section.push_str("## Simulation Result\n\n");
    section.push_str(&format!(
        "**Scenario:** {} (`{}`)\n\n",
        result.scenario.title(),
        result.scenario
    ));

    section.push_str("| Metric | Value | Rating |\n");
    section.push_str("|:---|:---:|:---:|\n");
    section.push_str(&format!("| Regions | {} | |\n", result.group_count));
    section.push_str(&format!(
        "| Population per region, 2040 (10k) | {} | |\n",
        ten_thousands(result.population_per_group)
    ));
    section.push_str(&format!(
        "| Beds per region | {:.0} | {} {} |\n",
        result.beds_per_group,
        result.ratings.balance.emoji(),
        result.ratings.balance
    ));
    section.push_str(&format!(
        "| Avg transport to hospital | {:.1} min | {} {} |\n",
        result.avg_transport,
        result.ratings.transport.emoji(),
        result.ratings.transport
    ));
    section.push_str(&format!(
        "| Avg arrival on scene | {:.1} min | {} {} |\n",
        result.avg_arrival,
        result.ratings.arrival.emoji(),
        result.ratings.arrival
    ));
    section.push_str(&format!(
        "| Beds per 10k population | {:.1} | {} {} |\n",
        result.beds_per_10k,
        result.ratings.balance.emoji(),
        result.ratings.balance
    ));
    section.push_str(&format!(
        "| Total population 2040 | {} | |\n",
        result.total_population_2040
    ));
    section.push_str(&format!("| Total beds | {} | |\n\n", result.total_beds));

    section
}

fn generate_session_section(state: &ScenarioState) -> String {
    let mut section = String::new();

    section.push_str("## Custom Session\n\n");

    if state.groups.is_empty() {
        section.push_str("No merged groups; every municipality is its own region.\n\n");
    } else {
        section.push_str("Merged groups:\n\n");
        for (i, group) in state.groups.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, group.join(" + ")));
        }
        section.push('\n');
    }

    if !state.selection.is_empty() {
        let pending: Vec<&str> = state.selection.iter().map(String::as_str).collect();
        section.push_str(&format!(
            "> Pending selection (not merged): {}\n\n",
            pending.join(", ")
        ));
    }

    section
}

fn generate_breakdown_section(groups: &[GroupStats]) -> String {
    if groups.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Breakdown\n\n");
    section.push_str("| Region | Population 2040 | Beds | Transport | Arrival |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    for group in groups {
        let label = if group.absorbed {
            format!("~~{}~~ (absorbed)", group.label)
        } else {
            group.label.clone()
        };
        section.push_str(&format!(
            "| {} | {} | {} | {:.1} | {:.1} |\n",
            label, group.population_2040, group.beds, group.transport, group.arrival
        ));
    }
    section.push('\n');

    section
}

fn generate_comparison_section(results: &[AggregationResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Scenario Comparison\n\n");
    section.push_str("| Scenario | Regions | Pop/Region (10k) | Beds/Region | Transport | Arrival | Beds/10k |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for result in results {
        section.push_str(&format!(
            "| {} | {} | {} | {:.0} | {} {:.1} | {} {:.1} | {} {:.1} |\n",
            result.scenario.title(),
            result.group_count,
            ten_thousands(result.population_per_group),
            result.beds_per_group,
            result.ratings.transport.emoji(),
            result.avg_transport,
            result.ratings.arrival.emoji(),
            result.avg_arrival,
            result.ratings.balance.emoji(),
            result.beds_per_10k
        ));
    }
    section.push('\n');

    section
}

fn generate_regions_section(regions: &[RegionProfile]) -> String {
    if regions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Region Profiles\n\n");
    for region in regions {
        section.push_str(&generate_region_block(region));
    }

    section
}

fn generate_region_block(region: &RegionProfile) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} {{#region-{}}}\n\n",
        region.name,
        region.id.to_lowercase()
    ));

    if !region.municipalities.is_empty() {
        block.push_str(&format!(
            "*Municipalities: {}*\n\n",
            region.municipalities.join(", ")
        ));
    }

    let years: Vec<String> = region.population.iter().map(|(y, _)| y.to_string()).collect();
    let values: Vec<String> = region
        .population
        .iter()
        .map(|(_, p)| ten_thousands(*p as f64))
        .collect();
    block.push_str(&format!("| {} |\n", years.join(" | ")));
    block.push_str(&format!("|{}\n", ":---:|".repeat(years.len())));
    block.push_str(&format!("| {} |\n\n", values.join(" | ")));

    block.push_str(&format!(
        "- **Population change 2020-2040:** {:+.1}%\n",
        region.population_change_pct
    ));
    block.push_str(&format!(
        "- **Beds:** {} (high-acute {}, acute {}, recovery {}, chronic {})\n",
        region.beds.total,
        region.beds.high_acute,
        region.beds.acute,
        region.beds.recovery,
        region.beds.chronic
    ));
    block.push_str(&format!(
        "- **Listed hospitals:** {} ({} beds)\n",
        region.hospital_count, region.hospital_beds
    ));
    block.push_str(&format!(
        "- **Transport:** {:.1} min ({}) | **Arrival:** {:.1} min\n\n",
        region.avg_transport_time, region.transport_class, region.avg_arrival_time
    ));

    block
}

fn generate_footer() -> String {
    "---\n\n*Report generated by medregion. Transport and arrival penalties for merged regions are modelling assumptions.*\n".to_string()
}

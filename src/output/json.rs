//! JSON output formatting
//!
//! One report per invocation: the experiment parameters, then every method
//! with its per-trial results (final counts included) and trial summary.

use crate::config::{Config, ExperimentConfig};
use crate::simulation::runner::{MethodRun, TrialSummary};
use crate::simulation::ExperimentResult;
use crate::stats::SummaryStats;
use crate::util::time::{calculate_rate, format_duration};
use crate::Result;
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: d.as_micros() as u64,
            human: format_duration(d),
        }
    }
}

/// Top-level report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    /// RFC 3339 UTC timestamp of report creation
    pub timestamp: String,
    pub experiment: ExperimentConfig,
    pub methods: Vec<JsonMethodReport>,
}

/// Report for one method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMethodReport {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    pub summary: TrialSummary,
    pub trials: Vec<JsonTrial>,
}

/// One trial of one method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTrial {
    pub seed: u64,
    pub stats: SummaryStats,
    pub spread: u64,
    pub runtime: JsonDuration,
    pub placements_per_sec: f64,
    pub counts: Vec<u64>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl JsonTrial {
    pub fn from_result(result: &ExperimentResult) -> Self {
        Self {
            seed: result.seed,
            stats: result.stats,
            spread: result.stats.spread(),
            runtime: JsonDuration::from_duration(result.runtime),
            placements_per_sec: calculate_rate(result.spec.balls, result.runtime),
            counts: result.counts.clone(),
            meta: result.meta.clone(),
        }
    }
}

impl JsonMethodReport {
    pub fn from_run(run: &MethodRun) -> Self {
        Self {
            method: run.method.method.to_string(),
            beta: run.method.method.uses_beta().then_some(run.method.beta),
            summary: run.summary.clone(),
            trials: run.results.iter().map(JsonTrial::from_result).collect(),
        }
    }
}

/// Build the report for a finished invocation
pub fn build_report(config: &Config, runs: &[MethodRun]) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        experiment: config.experiment,
        methods: runs.iter().map(JsonMethodReport::from_run).collect(),
    }
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }
    writer.flush()?;

    Ok(())
}

//! Human-readable text output

use crate::config::Config;
use crate::simulation::common_x_range;
use crate::simulation::runner::MethodRun;
use crate::simulation::ExperimentResult;
use crate::stats::bin_counts;
use crate::stats::histogram::LoadHistogram;
use crate::util::time::{calculate_rate, format_duration, format_rate};
use crate::Result;
use std::fmt::Write as _;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Print the experiment banner
pub fn print_header(config: &Config) {
    let e = &config.experiment;
    println!("{}", RULE);
    println!("                 PLACEMENT EXPERIMENT");
    println!("{}", RULE);
    println!("Buckets: {}", format_number(e.buckets as u64));
    println!("Balls:   {} ({:.2} per bucket)", format_number(e.balls), e.balls as f64 / e.buckets.max(1) as f64);
    println!("Servers: {}", e.servers);
    println!("Seed:    {}", e.seed);
    if e.trials > 1 {
        println!("Trials:  {} (seeds {}..{})", e.trials, e.seed, e.seed + e.trials - 1);
    }
    let names: Vec<String> = config.methods.iter().map(method_label).collect();
    println!("Methods: {}", names.join(", "));
    println!();
}

/// Print results of every method
///
/// Histograms of final counts share one x-range so methods compare by eye.
/// With several trials only the base-seed trial is plotted; the trial
/// summary covers the rest.
pub fn print_results(runs: &[MethodRun], config: &Config) -> Result<()> {
    let firsts: Vec<ExperimentResult> = runs.iter().map(|r| r.first().clone()).collect();
    let (xmin, xmax) = common_x_range(&firsts)?;

    println!("{}", RULE);
    println!("                       RESULTS");
    println!("{}", RULE);
    println!();

    for run in runs {
        let result = run.first();
        println!("{}", format_stats_line(&method_label(&run.method), result));

        let rate = calculate_rate(result.spec.balls, result.runtime);
        println!(
            "  Runtime: {} ({} placements/s)",
            format_duration(result.runtime),
            format_rate(rate)
        );

        if let Some(line) = format_load_line(&result.counts)? {
            println!("{}", line);
        }

        if run.summary.trials > 1 {
            println!(
                "  Trials:  {} runs, spread mean={:.2} max={}, std mean={:.3}",
                run.summary.trials, run.summary.mean_spread, run.summary.max_spread, run.summary.mean_std
            );
        }

        print!(
            "{}",
            render_histogram(&result.counts, config.output.bins, xmin, xmax, config.output.bar_width)
        );
        println!();
    }

    println!("{}", RULE);
    Ok(())
}

/// Method name, with beta for the methods that read it
pub fn method_label(method: &crate::simulation::methods::MethodConfig) -> String {
    if method.method.uses_beta() {
        format!("{} (beta={})", method.method, method.beta)
    } else {
        method.method.to_string()
    }
}

/// Bucket load range and percentiles; `None` for no buckets
pub fn format_load_line(counts: &[u64]) -> Result<Option<String>> {
    let loads = LoadHistogram::from_counts(counts)?;
    let line = match (loads.min(), loads.percentile(50.0), loads.percentile(99.0), loads.max()) {
        (Some(min), Some(p50), Some(p99), Some(max)) => {
            Some(format!("  Load:    min={} p50={} p99={} max={}", min, p50, p99, max))
        }
        _ => None,
    };
    Ok(line)
}

/// One-line summary of a result
pub fn format_stats_line(label: &str, result: &ExperimentResult) -> String {
    let s = &result.stats;
    format!(
        "{:<28} min={} max={} spread={} mean={:.2} std={:.3}",
        label,
        s.min,
        s.max,
        s.spread(),
        s.mean,
        s.std
    )
}

/// ASCII histogram of `counts` over `[xmin, xmax]`
///
/// The bin count is capped at the number of distinct integer values in the
/// range. Bars scale so the fullest bin spans `bar_width` characters.
pub fn render_histogram(counts: &[u64], bins: usize, xmin: u64, xmax: u64, bar_width: usize) -> String {
    let span = usize::try_from(xmax.saturating_sub(xmin)).unwrap_or(usize::MAX);
    let bins = bins.min(span.saturating_add(1)).max(1);
    let hist = bin_counts(counts, bins, xmin, xmax);
    let peak = hist.iter().copied().max().unwrap_or(0);
    let width = (xmax - xmin) as f64 / bins as f64;
    let label_width = xmax.to_string().len();

    let mut out = String::new();
    for (i, &n) in hist.iter().enumerate() {
        let lo = xmin as f64 + i as f64 * width;
        let bar = if peak == 0 {
            0
        } else {
            ((n as f64 / peak as f64) * bar_width as f64).round() as usize
        };
        let _ = writeln!(
            out,
            "  {:>w$.0} | {:<bw$} {}",
            lo,
            "#".repeat(bar),
            n,
            w = label_width,
            bw = bar_width
        );
    }
    out
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::methods::{Method, MethodConfig};
    use crate::simulation::ExperimentSpec;
    use std::time::Duration;

    fn result_with(counts: Vec<u64>) -> ExperimentResult {
        let spec = ExperimentSpec::new(counts.len(), counts.iter().sum(), 1).unwrap();
        ExperimentResult::new(Method::Iid, spec, 0, counts, Duration::ZERO, Default::default()).unwrap()
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_method_label() {
        assert_eq!(method_label(&MethodConfig::new(Method::Bo2, 1.0)), "bo2");
        assert_eq!(
            method_label(&MethodConfig::new(Method::UniformOutcomes, 0.5)),
            "uniform-outcomes (beta=0.5)"
        );
    }

    #[test]
    fn test_format_stats_line() {
        let line = format_stats_line("iid", &result_with(vec![3, 5, 4]));
        assert!(line.starts_with("iid "));
        assert!(line.contains("min=3 max=5 spread=2 mean=4.00"));
    }

    #[test]
    fn test_format_load_line() {
        let counts: Vec<u64> = (1..=100).collect();
        let line = format_load_line(&counts).unwrap().unwrap();
        assert_eq!(line, "  Load:    min=1 p50=50 p99=99 max=100");
        assert_eq!(format_load_line(&[]).unwrap(), None);
    }

    #[test]
    fn test_render_histogram() {
        let out = render_histogram(&[10, 10, 10, 12], 60, 10, 12, 20);
        let lines: Vec<&str> = out.lines().collect();
        // Capped to the three distinct values 10, 11, 12
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(&"#".repeat(20)));
        assert!(lines[0].ends_with(" 3"));
        assert!(lines[1].ends_with(" 0"));
        assert!(lines[2].ends_with(" 1"));
    }

    #[test]
    fn test_render_histogram_single_value() {
        let out = render_histogram(&[5, 5, 5], 10, 5, 5, 8);
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("########"));
    }
}

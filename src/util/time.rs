//! Timing helpers for experiment runs
//!
//! Experiments report their wall-clock runtime and placement rate in both
//! the text and JSON reports.

use std::time::{Duration, Instant};

/// Wall-clock stopwatch started at construction
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    #[inline]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

/// Scale `value` by the largest unit it reaches, two decimals
///
/// `units` is sorted by ascending factor; below the first factor the raw
/// value is printed without decimals and with `base_suffix`.
fn scaled(value: f64, base_suffix: &str, units: &[(f64, &str)]) -> String {
    match units.iter().rev().find(|(factor, _)| value >= *factor) {
        Some((factor, suffix)) => format!("{:.2}{}", value / factor, suffix),
        None => format!("{:.0}{}", value, base_suffix),
    }
}

/// Runtime as `500ns`, `1.50us`, `2.50ms` or `5.00s`; minutes past 60 s
///
/// ```
/// use std::time::Duration;
/// use uniform_outcomes::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50us");
/// assert_eq!(format_duration(Duration::from_secs(5)), "5.00s");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        return format!("{}m{:02}s", secs / 60, secs % 60);
    }
    scaled(
        duration.as_nanos() as f64,
        "ns",
        &[(1e3, "us"), (1e6, "ms"), (1e9, "s")],
    )
}

/// Placement rate with a K/M/G suffix
///
/// ```
/// use uniform_outcomes::util::time::format_rate;
///
/// assert_eq!(format_rate(950.0), "950");
/// assert_eq!(format_rate(2_500_000.0), "2.50M");
/// ```
pub fn format_rate(rate: f64) -> String {
    scaled(rate, "", &[(1e3, "K"), (1e6, "M"), (1e9, "G")])
}

/// Placements per second over `duration`; 0 for an empty duration
pub fn calculate_rate(placements: u64, duration: Duration) -> f64 {
    match duration.as_secs_f64() {
        s if s > 0.0 => placements as f64 / s,
        _ => 0.0,
    }
}

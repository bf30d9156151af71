//! Report output
//!
//! - [`text`]: console report with same-axis histograms of final counts
//! - [`json`]: machine-readable report written to a file

pub mod json;
pub mod text;

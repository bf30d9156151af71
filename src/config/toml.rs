//! TOML experiment file parsing
//!
//! ```toml
//! [experiment]
//! buckets = 100
//! balls = 1000000
//! servers = 4
//! seed = 42
//! trials = 1
//!
//! [[methods]]
//! name = "iid"
//!
//! [[methods]]
//! name = "uniform-outcomes"
//! beta = 1.0
//!
//! [output]
//! bins = 60
//! json = "results.json"
//!
//! [runtime]
//! threads = 8
//! ```

use super::cli::Cli;
use super::cli_convert::{apply_cli_overrides, config_from_cli, methods_from_cli};
use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
///
/// `-m` flags replace the file's method list. `--beta` applies to every
/// method, whether it came from the file or the command line.
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    let methods = methods_from_cli(cli);
    if !methods.is_empty() {
        config.methods = methods;
    } else if let Some(beta) = cli.beta {
        for m in &mut config.methods {
            m.beta = beta;
        }
    }

    apply_cli_overrides(cli, &mut config)?;
    Ok(config)
}

/// Build the run configuration from the command line and optional file
pub fn build_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => merge_cli_with_config(cli, parse_toml_file(path)?),
        None => config_from_cli(cli),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::methods::{Method, MethodConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
        [experiment]
        buckets = 100
        balls = 1000000
        servers = 4
        seed = 7
        trials = 3

        [[methods]]
        name = "iid"

        [[methods]]
        name = "uniform-outcomes"
        beta = 2.0

        [output]
        bins = 30
        json = "out.json"

        [runtime]
        threads = 2
    "#;

    #[test]
    fn test_parse_full() {
        let config = parse_toml_string(FULL).unwrap();
        assert_eq!(config.experiment.buckets, 100);
        assert_eq!(config.experiment.balls, 1_000_000);
        assert_eq!(config.experiment.servers, 4);
        assert_eq!(config.experiment.seed, 7);
        assert_eq!(config.experiment.trials, 3);
        assert_eq!(
            config.methods,
            vec![MethodConfig::new(Method::Iid, 1.0), MethodConfig::new(Method::UniformOutcomes, 2.0)]
        );
        assert_eq!(config.output.bins, 30);
        assert_eq!(config.output.json.as_deref(), Some(Path::new("out.json")));
        assert_eq!(config.runtime.threads, 2);
    }

    #[test]
    fn test_parse_minimal_uses_defaults() {
        let config = parse_toml_string("[experiment]\nbuckets = 10\nballs = 50\n").unwrap();
        assert_eq!(config.experiment.servers, 1);
        assert_eq!(config.experiment.seed, crate::config::DEFAULT_SEED);
        assert_eq!(config.methods, vec![MethodConfig::new(Method::UniformOutcomes, 1.0)]);
        assert_eq!(config.output.bins, 60);
    }

    #[test]
    fn test_parse_errors() {
        // Missing experiment table
        assert!(parse_toml_string("[output]\nbins = 3\n").is_err());
        // Unknown method
        assert!(parse_toml_string("[experiment]\nbuckets = 1\nballs = 1\n[[methods]]\nname = \"rr\"\n").is_err());
        // Negative counts are not representable
        assert!(parse_toml_string("[experiment]\nbuckets = -1\nballs = 1\n").is_err());
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = parse_toml_file(file.path()).unwrap();
        assert_eq!(config.experiment.buckets, 100);

        let err = parse_toml_file(Path::new("/nonexistent/experiment.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_merge_cli_precedence() {
        let config = parse_toml_string(FULL).unwrap();
        let cli = Cli {
            balls: Some("2k".into()),
            seed: Some(99),
            bins: Some(10),
            ..Default::default()
        };
        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.experiment.balls, 2000);
        assert_eq!(merged.experiment.seed, 99);
        assert_eq!(merged.experiment.buckets, 100);
        assert_eq!(merged.output.bins, 10);
        assert_eq!(merged.methods.len(), 2);
    }

    #[test]
    fn test_merge_cli_methods_replace_file_methods() {
        let config = parse_toml_string(FULL).unwrap();
        let cli = Cli {
            methods: vec![Method::Reference],
            beta: Some(0.5),
            ..Default::default()
        };
        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert_eq!(merged.methods, vec![MethodConfig::new(Method::Reference, 0.5)]);
    }

    #[test]
    fn test_merge_cli_beta_overrides_file() {
        let config = parse_toml_string(FULL).unwrap();
        let cli = Cli {
            beta: Some(3.0),
            ..Default::default()
        };
        let merged = merge_cli_with_config(&cli, config).unwrap();
        assert!(merged.methods.iter().all(|m| m.beta == 3.0));
    }

    #[test]
    fn test_build_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            trials: Some(1),
            ..Default::default()
        };
        let config = build_config(&cli).unwrap();
        assert_eq!(config.experiment.trials, 1);
        assert_eq!(config.experiment.buckets, 100);

        let cli = Cli {
            buckets: Some(5),
            balls: Some("5".into()),
            ..Default::default()
        };
        assert_eq!(build_config(&cli).unwrap().experiment.buckets, 5);
    }
}

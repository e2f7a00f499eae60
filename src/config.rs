//! Configuration management for pcb-offset
//!
//! This module handles CLI argument parsing and application settings.

use crate::format::Unit;
use crate::patterns::KindFilter;
use crate::offset::OffsetSpec;
use anyhow::{anyhow, Result};
use clap::builder::styling;
use clap::{value_parser, Arg, ArgMatches, ColorChoice, Command};
use std::path::PathBuf;
use tracing::info;

/// Name of the directory created inside the input directory for results
pub const OUTPUT_DIR_NAME: &str = "output";

/// Build the CLI command
pub fn build_cli() -> Command {
    let styles = styling::Styles::styled()
        .header(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .usage(styling::AnsiColor::Green.on_default() | styling::Effects::BOLD)
        .literal(styling::AnsiColor::Blue.on_default() | styling::Effects::BOLD)
        .placeholder(styling::AnsiColor::Cyan.on_default());

    Command::new("pcb-offset")
        .about("pcb-offset - Shift Gerber and Excellon coordinates by a constant offset")
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("offset_x")
                .help("X offset (in --input-unit, default millimetres)")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .required(true),
        )
        .arg(
            Arg::new("offset_y")
                .help("Y offset (in --input-unit, default millimetres)")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true)
                .required(true),
        )
        .arg(
            Arg::new("input_dir")
                .short('i')
                .long("input-dir")
                .help("Directory containing the Gerber and drill files")
                .value_parser(value_parser!(String))
                .default_value("."),
        )
        .arg(
            Arg::new("input_unit")
                .short('u')
                .long("input-unit")
                .help("Unit of the offset values (MM, IN)")
                .value_parser(["MM", "IN"])
                .ignore_case(true)
                .default_value("MM"),
        )
        .arg(
            Arg::new("kind")
                .short('k')
                .long("kind")
                .help("Which files to process (all, gerber, drill)")
                .value_parser(["all", "gerber", "drill"])
                .default_value("all"),
        )
        .arg(
            Arg::new("analyze")
                .short('a')
                .long("analyze")
                .help("Only report the detected file formats, write nothing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no_progress")
                .long("no-progress")
                .help("Disable progress indicators")
                .action(clap::ArgAction::SetTrue),
        )
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Offset along X, in `input_unit`
    pub offset_x: f64,

    /// Offset along Y, in `input_unit`
    pub offset_y: f64,

    /// Unit the offsets are given in
    pub input_unit: Unit,

    /// Directory scanned for input files
    pub input_dir: PathBuf,

    /// File kinds to process
    pub kind: String,

    /// Report formats only
    pub analyze: bool,

    /// Enable verbose logging
    pub verbose: bool,

    /// Disable progress bars
    pub no_progress: bool,
}

impl Config {
    /// Parse arguments and apply initial configuration
    pub fn from_args() -> Result<Self> {
        let matches = build_cli().get_matches();
        let config = Self::from_matches(&matches)?;

        // Set up tracing with environment variable support
        // RUST_LOG takes precedence over verbose flag
        let default_level = if config.verbose { "info" } else { "warn" };
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

        tracing_subscriber::fmt().with_env_filter(env_filter).init();

        if config.verbose {
            info!("Configuration: {:?}", config);
        }

        Ok(config)
    }

    /// Build a configuration from already-parsed matches
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let offset_x = *matches
            .get_one::<f64>("offset_x")
            .ok_or_else(|| anyhow!("X offset is required"))?;
        let offset_y = *matches
            .get_one::<f64>("offset_y")
            .ok_or_else(|| anyhow!("Y offset is required"))?;

        let input_unit = matches
            .get_one::<String>("input_unit")
            .map(|unit| unit.parse::<Unit>())
            .transpose()?
            .unwrap_or_default();

        let input_dir = matches
            .get_one::<String>("input_dir")
            .cloned()
            .unwrap_or_else(|| ".".to_string());

        let kind = matches
            .get_one::<String>("kind")
            .cloned()
            .unwrap_or_else(|| "all".to_string());

        Ok(Config {
            offset_x,
            offset_y,
            input_unit,
            input_dir: PathBuf::from(input_dir),
            kind,
            analyze: matches.get_flag("analyze"),
            verbose: matches.get_flag("verbose"),
            no_progress: matches.get_flag("no_progress"),
        })
    }

    /// Get normalized file kind filter
    pub fn get_kind_filter(&self) -> KindFilter {
        KindFilter::from_name(&self.kind)
    }

    pub fn offset(&self) -> OffsetSpec {
        OffsetSpec::new(self.offset_x, self.offset_y, self.input_unit)
    }

    /// Directory results are written into
    pub fn output_dir(&self) -> PathBuf {
        self.input_dir.join(OUTPUT_DIR_NAME)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            return Err(anyhow!(
                "Input directory does not exist: {}",
                self.input_dir.display()
            ));
        }

        if !self.offset_x.is_finite() || !self.offset_y.is_finite() {
            return Err(anyhow!(
                "Offsets must be finite numbers, got {} and {}",
                self.offset_x,
                self.offset_y
            ));
        }

        info!("Configuration validation completed successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let matches = build_cli()
            .try_get_matches_from(args)
            .expect("arguments should parse");
        Config::from_matches(&matches).expect("config should build")
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["pcb-offset", "1.5", "2"]);
        assert_eq!(config.offset_x, 1.5);
        assert_eq!(config.offset_y, 2.0);
        assert_eq!(config.input_unit, Unit::Metric);
        assert_eq!(config.input_dir, PathBuf::from("."));
        assert_eq!(config.get_kind_filter(), KindFilter::All);
        assert_eq!(config.output_dir(), PathBuf::from(".").join("output"));
        assert!(!config.analyze);
    }

    #[test]
    fn test_negative_offsets_and_inch_unit() {
        let config = parse(&["pcb-offset", "-1", "-0.25", "-u", "in", "-k", "drill", "-a"]);
        assert_eq!(config.offset_x, -1.0);
        assert_eq!(config.offset_y, -0.25);
        assert_eq!(config.input_unit, Unit::Imperial);
        assert_eq!(config.get_kind_filter(), KindFilter::Drill);
        assert!(config.analyze);
        assert_eq!(config.offset(), OffsetSpec::new(-1.0, -0.25, Unit::Imperial));
    }

    #[test]
    fn test_missing_offset_is_rejected() {
        assert!(build_cli().try_get_matches_from(["pcb-offset", "1"]).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let mut config = parse(&["pcb-offset", "1", "1"]);
        config.input_dir = PathBuf::from("/definitely/not/here");
        assert!(config.validate().is_err());
    }
}

//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use confwarden_core::types::{DeviceType, RiskLevel};

/// Default configuration file, used only when it exists.
pub const DEFAULT_CONFIG_PATH: &str = "confwarden.toml";

/// confwarden -- CIS compliance auditor for network device configurations.
///
/// Use `confwarden <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "confwarden", version, about, long_about = None)]
pub struct Cli {
    /// Path to the confwarden.toml configuration file (default: ./confwarden.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit a device configuration against the bundled benchmarks.
    Audit(AuditArgs),

    /// Detect the device type of a configuration without auditing it.
    Classify(ClassifyArgs),

    /// Inspect benchmark controls.
    Rules(RulesArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- audit ----

/// Audit a device configuration file.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Device configuration file (running-config export, JunOS-style braced config, ...).
    pub file: PathBuf,

    /// Skip classification and audit as this device type (router, layer2_switch, layer3_switch).
    #[arg(long, value_parser = parse_known_device_type)]
    pub device_type: Option<DeviceType>,

    /// Override the benchmark document directory.
    #[arg(long)]
    pub rules_dir: Option<PathBuf>,

    /// Override the number of controls evaluated concurrently.
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Exit with status 1 when a failed control has at least this risk level.
    #[arg(long, value_parser = parse_risk_level)]
    pub fail_on: Option<RiskLevel>,
}

// ---- classify ----

/// Classify a device configuration file.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Device configuration file.
    pub file: PathBuf,
}

// ---- rules ----

/// Inspect benchmark controls.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List loaded controls.
    List {
        /// Only controls applicable to this device type.
        #[arg(long, value_parser = parse_device_type)]
        device_type: Option<DeviceType>,

        /// Override the benchmark document directory.
        #[arg(long)]
        rules_dir: Option<PathBuf>,
    },
    /// Check every benchmark document and control definition without running an audit.
    Validate {
        /// Override the benchmark document directory.
        #[arg(long)]
        rules_dir: Option<PathBuf>,
    },
}

// ---- config ----

/// Manage confwarden configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, audit).
        #[arg(long)]
        section: Option<String>,
    },
}

fn parse_device_type(s: &str) -> Result<DeviceType, String> {
    DeviceType::from_str_loose(s).ok_or_else(|| {
        format!("unknown device type '{s}' (expected: router, layer2_switch, layer3_switch, unknown)")
    })
}

fn parse_known_device_type(s: &str) -> Result<DeviceType, String> {
    match parse_device_type(s)? {
        DeviceType::Unknown => Err("'unknown' cannot be used as a device type override".to_owned()),
        device => Ok(device),
    }
}

fn parse_risk_level(s: &str) -> Result<RiskLevel, String> {
    RiskLevel::from_str_loose(s).ok_or_else(|| {
        format!("unknown risk level '{s}' (expected: info, low, medium, high, critical)")
    })
}

//! Command handlers -- one module per subcommand

pub mod audit;
pub mod classify;
pub mod config;
pub mod rules;

use std::path::{Path, PathBuf};

use tracing::debug;

use confwarden_audit_engine::AuditConfig;
use confwarden_core::config::ConfwardenConfig;

use crate::cli::DEFAULT_CONFIG_PATH;
use crate::error::CliError;

/// Load the effective configuration.
///
/// An explicit `--config` path must exist. Without one, `./confwarden.toml` is used
/// when present, otherwise defaults plus environment overrides.
pub async fn load_config(explicit: Option<&Path>) -> Result<ConfwardenConfig, CliError> {
    if let Some(path) = explicit {
        return Ok(ConfwardenConfig::load(path).await?);
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if tokio::fs::try_exists(default_path).await.unwrap_or(false) {
        return Ok(ConfwardenConfig::load(default_path).await?);
    }

    debug!("no configuration file, using defaults");
    let mut config = ConfwardenConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Human-readable name of the configuration source.
pub fn config_source(explicit: Option<&Path>) -> String {
    match explicit {
        Some(path) => path.display().to_string(),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => DEFAULT_CONFIG_PATH.to_owned(),
        None => "(defaults)".to_owned(),
    }
}

/// Build the engine configuration, applying command-line overrides on top of the file.
pub fn engine_config(
    config: &ConfwardenConfig,
    rules_dir: Option<&PathBuf>,
    parallelism: Option<usize>,
) -> Result<AuditConfig, CliError> {
    let mut engine = AuditConfig::from_core(&config.audit)?;
    if let Some(dir) = rules_dir {
        engine.rules_dir = dir.display().to_string();
    }
    if let Some(parallelism) = parallelism {
        engine.parallelism = parallelism;
    }
    engine.validate()?;
    Ok(engine)
}

/// Read a device configuration file.
pub async fn read_device_config(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read '{}': {e}", path.display()),
        ))
    })
}

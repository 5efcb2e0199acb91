//! `confwarden rules` command handler

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use confwarden_audit_engine::rule::DocumentFormat;
use confwarden_audit_engine::{CompiledControl, ControlDefinition, RuleLoader, RuleRepository};
use confwarden_core::config::ConfwardenConfig;
use confwarden_core::types::DeviceType;

use crate::cli::{RulesAction, RulesArgs};
use crate::commands::engine_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render, risk_label};

/// Execute the `rules` command.
pub async fn execute(
    args: RulesArgs,
    config: &ConfwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        RulesAction::List {
            device_type,
            rules_dir,
        } => {
            let dir = resolve_rules_dir(config, rules_dir)?;
            let report = list_rules(&dir, device_type).await?;
            writer.render(&report)?;
            Ok(())
        }
        RulesAction::Validate { rules_dir } => {
            let dir = resolve_rules_dir(config, rules_dir)?;
            let report = validate_rules(&dir).await?;
            writer.render(&report)?;
            if report.has_errors() {
                return Err(CliError::Rules(format!(
                    "{} problems in '{}'",
                    report.errors.len(),
                    report.path
                )));
            }
            Ok(())
        }
    }
}

fn resolve_rules_dir(
    config: &ConfwardenConfig,
    rules_dir: Option<PathBuf>,
) -> Result<PathBuf, CliError> {
    let engine = engine_config(config, rules_dir.as_ref(), None)?;
    Ok(PathBuf::from(engine.rules_dir))
}

async fn list_rules(dir: &Path, device_type: Option<DeviceType>) -> Result<RuleListReport, CliError> {
    info!(rules_dir = %dir.display(), "loading benchmark controls");
    let repository = RuleRepository::load(dir).await?;

    let controls = match device_type {
        Some(device) => repository.controls_for(device),
        None => repository.controls().to_vec(),
    };

    Ok(RuleListReport {
        rules_dir: dir.display().to_string(),
        version: repository.version().to_owned(),
        device_type,
        total: controls.len(),
        rules: controls
            .iter()
            .map(|c| RuleEntry {
                id: c.id.clone(),
                title: c.title.clone(),
                section: c.section.clone(),
                risk: c.risk,
                strategy: c.strategy.to_string(),
                device_types: c.device_types.iter().map(|d| d.as_str().to_owned()).collect(),
            })
            .collect(),
    })
}

/// Load every document on its own and compile every control.
///
/// Unlike the repository loader, which skips bad documents with a warning,
/// this reports each problem.
async fn validate_rules(dir: &Path) -> Result<RuleValidationReport, CliError> {
    info!(path = %dir.display(), "validating benchmark documents");

    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        CliError::Rules(format!("failed to read directory '{}': {e}", dir.display()))
    })?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if DocumentFormat::from_path(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = RuleValidationReport {
        path: dir.display().to_string(),
        total_files: paths.len(),
        valid_files: 0,
        controls: 0,
        errors: Vec::new(),
    };
    let mut seen: HashMap<String, Vec<(ControlDefinition, String)>> = HashMap::new();

    for path in &paths {
        let file = path.display().to_string();
        let document = match RuleLoader::load_file(path).await {
            Ok(document) => document,
            Err(e) => {
                report.errors.push(RuleIssue {
                    file,
                    control_id: None,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let before = report.errors.len();
        for control in &document.controls {
            report.controls += 1;
            let same_id = seen.entry(control.id.clone()).or_default();
            if let Some((_, first)) = same_id.iter().find(|(other, _)| other.shares_devices(control)) {
                report.errors.push(RuleIssue {
                    file: file.clone(),
                    control_id: Some(control.id.clone()),
                    error: format!("duplicate control id (first defined in {first})"),
                });
                continue;
            }
            same_id.push((control.clone(), file.clone()));

            if let Err(e) = CompiledControl::compile(control) {
                report.errors.push(RuleIssue {
                    file: file.clone(),
                    control_id: Some(control.id.clone()),
                    error: e.reason,
                });
            }
        }
        if report.errors.len() == before {
            report.valid_files += 1;
        }
    }

    Ok(report)
}

#[derive(Serialize)]
pub struct RuleListReport {
    pub rules_dir: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceType>,
    pub total: usize,
    pub rules: Vec<RuleEntry>,
}

#[derive(Serialize)]
pub struct RuleEntry {
    pub id: String,
    pub title: String,
    pub section: String,
    pub risk: confwarden_core::types::RiskLevel,
    pub strategy: String,
    pub device_types: Vec<String>,
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match self.device_type {
            Some(device) => writeln!(
                w,
                "Benchmark Controls for {} ({} total)",
                device,
                self.total.to_string().bold()
            )?,
            None => writeln!(
                w,
                "Benchmark Controls ({} total)",
                self.total.to_string().bold()
            )?,
        }
        writeln!(w, "  Source:  {}", self.rules_dir)?;
        writeln!(w, "  Version: {}", self.version)?;
        writeln!(w)?;
        writeln!(
            w,
            "{:<14} {:<13} {:<26} {:<30} Title",
            "ID", "Risk", "Strategy", "Devices"
        )?;
        writeln!(w, "{}", "-".repeat(110))?;

        for r in &self.rules {
            let devices = if r.device_types.is_empty() {
                "all".to_owned()
            } else {
                r.device_types.join(", ")
            };
            writeln!(
                w,
                "{:<14} {} {:<26} {:<30} {}",
                r.id,
                risk_label(r.risk),
                r.strategy,
                devices,
                r.title
            )?;
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct RuleValidationReport {
    pub path: String,
    pub total_files: usize,
    pub valid_files: usize,
    pub controls: usize,
    pub errors: Vec<RuleIssue>,
}

impl RuleValidationReport {
    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct RuleIssue {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_id: Option<String>,
    pub error: String,
}

impl Render for RuleValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Validation: {}", self.path.bold())?;
        let invalid = self.total_files - self.valid_files;
        writeln!(
            w,
            "  Files: {} total, {} valid, {} invalid",
            self.total_files,
            self.valid_files.to_string().green(),
            if invalid > 0 {
                invalid.to_string().red()
            } else {
                invalid.to_string().normal()
            }
        )?;
        writeln!(w, "  Controls: {}", self.controls)?;
        writeln!(
            w,
            "  Result: {}",
            if self.has_errors() {
                "INVALID".red().bold()
            } else {
                "VALID".green().bold()
            }
        )?;

        if self.has_errors() {
            writeln!(w)?;
            writeln!(w, "Errors:")?;
            for e in &self.errors {
                match e.control_id {
                    Some(ref id) => writeln!(w, "  {} [{}]: {}", e.file.red(), id, e.error)?,
                    None => writeln!(w, "  {}: {}", e.file.red(), e.error)?,
                }
            }
        }

        Ok(())
    }
}

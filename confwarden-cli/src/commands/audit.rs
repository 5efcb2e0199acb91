//! `confwarden audit` command handler

use std::io::Write;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use confwarden_audit_engine::{
    AuditResult, AuditRunner, CancellationToken, RuleRepository, RunOptions, RunStatus,
};
use confwarden_core::config::ConfwardenConfig;
use confwarden_core::types::Verdict;

use crate::cli::AuditArgs;
use crate::commands::{engine_config, read_device_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render, risk_label, verdict_badge};

/// Evidence lines shown per finding in text output.
const TEXT_EVIDENCE_LINES: usize = 5;

/// Execute the `audit` command.
///
/// Ctrl-C cancels the run; the partial result is still rendered and the
/// command exits with the audit error code.
pub async fn execute(
    args: AuditArgs,
    config: &ConfwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine = engine_config(config, args.rules_dir.as_ref(), args.parallelism)?;
    let text = read_device_config(&args.file).await?;

    info!(rules_dir = %engine.rules_dir, "loading benchmark controls");
    let repository = RuleRepository::load(&engine.rules_dir).await?;
    if repository.is_empty() {
        return Err(CliError::Rules(format!(
            "no controls found in '{}'",
            engine.rules_dir
        )));
    }

    let runner = AuditRunner::builder()
        .config(engine)
        .repository(repository)
        .build()?;

    let cancel = CancellationToken::new();
    let signal_task = spawn_ctrl_c_handler(cancel.clone());

    let options = RunOptions::new()
        .device_override(args.device_type)
        .cancel_token(cancel);
    let result = runner.run(&text, options).await;
    signal_task.abort();
    let result = result?;

    let report = AuditReport {
        source: args.file.display().to_string(),
        result,
    };
    writer.render(&report)?;

    check_outcome(&report.result, &args)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling audit");
            cancel.cancel();
        }
    })
}

/// Exit status for a rendered result: incomplete runs first, then the `--fail-on` threshold.
fn check_outcome(result: &AuditResult, args: &AuditArgs) -> Result<(), CliError> {
    if let RunStatus::Incomplete { evaluated, skipped } = result.status {
        return Err(CliError::Audit(format!(
            "audit incomplete: {evaluated} controls evaluated, {skipped} skipped"
        )));
    }

    if let Some(threshold) = args.fail_on {
        if let Some(highest) = result.highest_failed_risk() {
            if highest >= threshold {
                let count = result
                    .findings
                    .iter()
                    .filter(|f| f.verdict == Verdict::Fail && f.risk >= threshold)
                    .count();
                return Err(CliError::NonCompliant(format!(
                    "{count} failed controls at or above {threshold} risk"
                )));
            }
        }
    }

    Ok(())
}

/// Audit report: the engine result plus the audited file name.
#[derive(Serialize)]
pub struct AuditReport {
    /// Audited file
    pub source: String,
    /// Engine result
    #[serde(flatten)]
    pub result: AuditResult,
}

impl Render for AuditReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let r = &self.result;
        writeln!(w, "Audit: {}", self.source.bold())?;
        writeln!(
            w,
            "  Device:     {} (confidence {}, {})",
            r.device_type.to_string().bold(),
            r.classification.confidence,
            r.classification.decided_by
        )?;
        if let Some(ref hostname) = r.metadata.hostname {
            writeln!(w, "  Hostname:   {hostname}")?;
        }
        if let Some(ref version) = r.metadata.software_version {
            writeln!(w, "  Software:   {version}")?;
        }
        writeln!(w, "  Dialect:    {}", r.dialect.as_str())?;
        writeln!(w, "  Rule set:   {}", r.rule_set_version)?;
        writeln!(w, "  Benchmark:  {}", r.benchmark_url)?;
        match r.status {
            RunStatus::Complete => writeln!(w, "  Status:     {}", "complete".green())?,
            RunStatus::Incomplete { evaluated, skipped } => writeln!(
                w,
                "  Status:     {} ({evaluated} evaluated, {skipped} skipped)",
                "INCOMPLETE".red().bold()
            )?,
        }

        if !r.caveats.is_empty() {
            writeln!(w)?;
            writeln!(w, "Caveats:")?;
            for caveat in &r.caveats {
                writeln!(w, "  - {}", caveat.to_string().yellow())?;
            }
        }

        writeln!(w)?;
        writeln!(w, "{:<8} {:<14} {:<13} Title", "Verdict", "Control", "Risk")?;
        writeln!(w, "{}", "-".repeat(90))?;
        for f in &r.findings {
            writeln!(
                w,
                "{} {:<14} {} {}",
                verdict_badge(f.verdict),
                f.control_id,
                risk_label(f.risk),
                f.title
            )?;
            if f.verdict == Verdict::Pass {
                continue;
            }
            for line in f.evidence.iter().take(TEXT_EVIDENCE_LINES) {
                writeln!(w, "{:>14} {}", format!("line {}:", line.line_number), line.text.dimmed())?;
            }
            if f.evidence.len() > TEXT_EVIDENCE_LINES {
                writeln!(
                    w,
                    "{:>14} ... {} more",
                    "",
                    f.evidence.len() - TEXT_EVIDENCE_LINES
                )?;
            }
            if let Some(ref note) = f.note {
                writeln!(w, "{:>14} {}", "note:", note)?;
            }
            if f.verdict == Verdict::Fail && !f.remediation.is_empty() {
                writeln!(w, "{:>14} {}", "fix:", f.remediation)?;
            }
        }

        if !r.errors.is_empty() {
            writeln!(w)?;
            writeln!(w, "Controls not evaluated:")?;
            for e in &r.errors {
                writeln!(w, "  {}: {}", e.control_id.red(), e.reason)?;
            }
        }

        let s = &r.summary;
        writeln!(w)?;
        writeln!(
            w,
            "Summary: {} controls, {} pass, {} fail, {} manual, {} errors",
            s.total,
            s.pass.to_string().green(),
            if s.fail > 0 {
                s.fail.to_string().red()
            } else {
                s.fail.to_string().normal()
            },
            s.manual.to_string().yellow(),
            s.errors
        )?;
        match s.compliance_score() {
            Some(score) => writeln!(w, "Compliance: {score:.1}%")?,
            None => writeln!(w, "Compliance: n/a")?,
        }

        Ok(())
    }
}

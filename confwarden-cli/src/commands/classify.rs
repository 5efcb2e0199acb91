//! `confwarden classify` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use confwarden_audit_engine::AuditConfig;
use confwarden_config_model::{
    Classification, ConfigModelBuilder, DeviceClassifier, DeviceMetadata, cis_benchmark_url,
};
use confwarden_core::config::ConfwardenConfig;

use crate::cli::ClassifyArgs;
use crate::commands::{engine_config, read_device_config};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `classify` command.
pub async fn execute(
    args: ClassifyArgs,
    config: &ConfwardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let engine = engine_config(config, None, None)?;
    let text = read_device_config(&args.file).await?;

    info!(path = %args.file.display(), "classifying device configuration");
    let report = classify_text(args.file.display().to_string(), &text, &engine)?;
    writer.render(&report)?;
    Ok(())
}

fn classify_text(source: String, text: &str, engine: &AuditConfig) -> Result<ClassifyReport, CliError> {
    let model = ConfigModelBuilder::new()
        .max_size(engine.max_config_size)
        .max_depth(engine.max_nesting_depth)
        .dialect(engine.dialect)
        .build(text)?;
    let classification = DeviceClassifier::new().classify(&model);

    Ok(ClassifyReport {
        source,
        dialect: model.dialect().as_str().to_owned(),
        lines: model.line_count(),
        blocks: model.blocks().len(),
        benchmark_url: cis_benchmark_url(classification.device_type).to_owned(),
        metadata: DeviceMetadata::extract(&model),
        classification,
    })
}

/// Device classification report.
#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    /// Classified file
    pub source: String,
    /// Detected dialect
    pub dialect: String,
    /// Configuration lines (statements and comments)
    pub lines: usize,
    /// Blocks in the model
    pub blocks: usize,
    /// Classifier decision
    pub classification: Classification,
    /// Hostname and software version
    pub metadata: DeviceMetadata,
    /// Benchmark page for the detected device type
    pub benchmark_url: String,
}

impl Render for ClassifyReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let c = &self.classification;
        writeln!(w, "Classification: {}", self.source.bold())?;
        let device = c.device_type.to_string();
        writeln!(
            w,
            "  Device type: {}",
            if c.is_ambiguous() {
                device.yellow().bold()
            } else {
                device.green().bold()
            }
        )?;
        writeln!(w, "  Confidence:  {}", c.confidence)?;
        writeln!(w, "  Decided by:  {}", c.decided_by)?;
        writeln!(
            w,
            "  Scores:      router={} switch={} l3={}",
            c.scores.router, c.scores.switch, c.scores.l3
        )?;
        writeln!(w, "  Dialect:     {}", self.dialect)?;
        writeln!(w, "  Lines:       {} ({} blocks)", self.lines, self.blocks)?;
        if let Some(ref hostname) = self.metadata.hostname {
            writeln!(w, "  Hostname:    {hostname}")?;
        }
        if let Some(ref version) = self.metadata.software_version {
            writeln!(w, "  Software:    {version}")?;
        }
        writeln!(w, "  Benchmark:   {}", self.benchmark_url)?;

        if !c.indicators.is_empty() {
            writeln!(w)?;
            writeln!(w, "Indicators:")?;
            for indicator in &c.indicators {
                writeln!(w, "  - {indicator}")?;
            }
        }

        Ok(())
    }
}

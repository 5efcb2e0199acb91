//! CLI-specific error types and exit code mapping

use confwarden_audit_engine::AuditEngineError;
use confwarden_config_model::ConfigModelError;
use confwarden_core::error::ConfwardenError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Device configuration text could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Benchmark documents could not be loaded or contain malformed controls.
    #[error("rule error: {0}")]
    Rules(String),

    /// The audit run failed or did not complete.
    #[error("audit error: {0}")]
    Audit(String),

    /// Failed controls at or above the `--fail-on` threshold.
    #[error("compliance check failed: {0}")]
    NonCompliant(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                  |
    /// |------|------------------------------------------|
    /// | 0    | Success                                  |
    /// | 1    | Command error or `--fail-on` threshold   |
    /// | 2    | Configuration error                      |
    /// | 3    | Device configuration parse error         |
    /// | 4    | Rule document / control error            |
    /// | 5    | Audit run failed or incomplete           |
    /// | 6    | IO error                                 |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Parse(_) => 3,
            Self::Rules(_) => 4,
            Self::Audit(_) => 5,
            Self::Io(_) => 6,
            Self::NonCompliant(_) | Self::Command(_) | Self::JsonSerialize(_) => 1,
        }
    }
}

impl From<ConfwardenError> for CliError {
    fn from(e: ConfwardenError) -> Self {
        match e {
            ConfwardenError::Config(inner) => Self::Config(inner.to_string()),
            ConfwardenError::Parse(inner) => Self::Parse(inner.to_string()),
            ConfwardenError::Rule(inner) => Self::Rules(inner.to_string()),
            ConfwardenError::Audit(inner) => Self::Audit(inner.to_string()),
            ConfwardenError::Io(inner) => Self::Io(inner),
        }
    }
}

impl From<AuditEngineError> for CliError {
    fn from(e: AuditEngineError) -> Self {
        ConfwardenError::from(e).into()
    }
}

impl From<ConfigModelError> for CliError {
    fn from(e: ConfigModelError) -> Self {
        Self::Parse(e.to_string())
    }
}

//! 감사 엔진 에러 타입
//!
//! [`AuditEngineError`]는 룰 로딩과 감사 실행 중 발생하는 에러를 표현합니다.
//! 개별 컨트롤 정의 오류는 [`RuleDefinitionError`]로 보고되며 실행을 중단하지 않습니다.
//! `From<AuditEngineError> for ConfwardenError` 변환으로 상위 레이어에서 `?`로 전파할 수 있습니다.

use confwarden_config_model::ConfigModelError;
use confwarden_core::error::{AuditError, ConfigError, ConfwardenError, RuleError};

/// 잘못된 컨트롤 정의
///
/// 매처가 컨트롤을 컴파일할 때 반환합니다. 감사 실행은 이 컨트롤만 건너뛰고 계속됩니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("control '{control_id}' is malformed: {reason}")]
pub struct RuleDefinitionError {
    /// 문제가 된 컨트롤 ID
    pub control_id: String,
    /// 사유
    pub reason: String,
}

impl RuleDefinitionError {
    pub(crate) fn new(control_id: &str, reason: impl Into<String>) -> Self {
        Self {
            control_id: control_id.to_owned(),
            reason: reason.into(),
        }
    }
}

/// 감사 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AuditEngineError {
    /// 장비 설정 파싱 실패 (평가 시작 전 실행 중단)
    #[error("configuration parse failed: {0}")]
    Parse(#[from] ConfigModelError),

    /// 룰 파일/디렉토리 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 파일 또는 디렉토리 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 컨트롤 정의 오류
    #[error(transparent)]
    RuleDefinition(#[from] RuleDefinitionError),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 잘못된 실행 옵션
    #[error("invalid run option: {0}")]
    InvalidOption(String),

    /// 평가 태스크 실패
    #[error("evaluation task failed: {0}")]
    TaskFailed(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AuditEngineError> for ConfwardenError {
    fn from(err: AuditEngineError) -> Self {
        match err {
            AuditEngineError::Parse(e) => e.into(),
            AuditEngineError::RuleLoad { path, reason } => RuleError::Load { path, reason }.into(),
            AuditEngineError::RuleDefinition(e) => RuleError::Definition {
                control_id: e.control_id,
                reason: e.reason,
            }
            .into(),
            AuditEngineError::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
            AuditEngineError::InvalidOption(msg) => AuditError::InvalidOption(msg).into(),
            AuditEngineError::TaskFailed(msg) => AuditError::TaskFailed(msg).into(),
            AuditEngineError::Io(e) => ConfwardenError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confwarden_core::error::ParseError;

    #[test]
    fn rule_definition_error_display() {
        let err = RuleDefinitionError::new("1.1.1", "no patterns");
        assert_eq!(err.to_string(), "control '1.1.1' is malformed: no patterns");
        let wrapped = AuditEngineError::from(err);
        assert_eq!(wrapped.to_string(), "control '1.1.1' is malformed: no patterns");
    }

    #[test]
    fn parse_error_maps_to_core_parse() {
        let err = AuditEngineError::from(ConfigModelError::Empty);
        let core: ConfwardenError = err.into();
        assert!(matches!(core, ConfwardenError::Parse(ParseError::Empty)));
    }

    #[test]
    fn rule_load_maps_to_core_rule() {
        let err = AuditEngineError::RuleLoad {
            path: "/rules".to_owned(),
            reason: "missing".to_owned(),
        };
        let core: ConfwardenError = err.into();
        assert!(matches!(core, ConfwardenError::Rule(RuleError::Load { .. })));
        assert!(core.to_string().contains("/rules"));
    }

    #[test]
    fn definition_maps_to_core_rule_definition() {
        let core: ConfwardenError =
            AuditEngineError::from(RuleDefinitionError::new("2.1", "bad regex")).into();
        match core {
            ConfwardenError::Rule(RuleError::Definition { control_id, reason }) => {
                assert_eq!(control_id, "2.1");
                assert_eq!(reason, "bad regex");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn config_and_option_errors_map() {
        let core: ConfwardenError = AuditEngineError::Config {
            field: "parallelism".to_owned(),
            reason: "must be 1-256".to_owned(),
        }
        .into();
        assert!(matches!(core, ConfwardenError::Config(ConfigError::InvalidValue { .. })));

        let core: ConfwardenError = AuditEngineError::InvalidOption("x".to_owned()).into();
        assert!(matches!(core, ConfwardenError::Audit(AuditError::InvalidOption(_))));
    }
}

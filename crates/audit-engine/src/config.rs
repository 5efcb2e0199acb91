//! 감사 엔진 설정
//!
//! [`AuditConfig`]는 core의 [`AuditSection`]을 엔진이 바로 쓸 수 있는 타입으로 바꾼 것입니다.
//! 문자열 설정(`dialect`, `unknown_device_fallback`)은 여기서 열거형으로 해석됩니다.
//!
//! # 사용 예시
//! ```
//! use confwarden_core::config::ConfwardenConfig;
//! use confwarden_audit_engine::config::AuditConfig;
//!
//! let core = ConfwardenConfig::default();
//! let config = AuditConfig::from_core(&core.audit).unwrap();
//! assert_eq!(config.parallelism, 4);
//! ```

use confwarden_config_model::Dialect;
use confwarden_config_model::parser::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE};
use confwarden_core::config::{
    AuditSection, MAX_CONFIG_SIZE, MAX_EVIDENCE_LIMIT, MAX_NESTING_DEPTH, MAX_PARALLELISM,
};
use confwarden_core::types::DeviceType;

use crate::error::AuditEngineError;

/// 감사 엔진 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// 컨트롤 문서 디렉토리
    pub rules_dir: String,
    /// 동시에 평가할 최대 컨트롤 수
    pub parallelism: usize,
    /// finding 당 최대 증거 라인 수
    pub evidence_limit: usize,
    /// 최대 설정 텍스트 크기 (바이트)
    pub max_config_size: usize,
    /// 최대 블록 중첩 깊이
    pub max_nesting_depth: usize,
    /// 고정 방언 (`None`이면 자동 판별)
    pub dialect: Option<Dialect>,
    /// 장비 유형을 판별하지 못했을 때 추가로 적용할 컨트롤 세트
    pub unknown_device_fallback: Option<DeviceType>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            rules_dir: "rules".to_owned(),
            parallelism: 4,
            evidence_limit: 50,
            max_config_size: DEFAULT_MAX_SIZE,
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            dialect: None,
            unknown_device_fallback: None,
        }
    }
}

impl AuditConfig {
    /// core 설정 섹션에서 엔진 설정을 생성합니다.
    ///
    /// # Errors
    /// 방언이나 폴백 장비 유형 문자열을 해석할 수 없으면 `Config` 에러를 반환합니다.
    pub fn from_core(section: &AuditSection) -> Result<Self, AuditEngineError> {
        let config = Self {
            rules_dir: section.rules_dir.clone(),
            parallelism: section.parallelism,
            evidence_limit: section.evidence_limit,
            max_config_size: section.max_config_size,
            max_nesting_depth: section.max_nesting_depth,
            dialect: parse_dialect(&section.dialect)?,
            unknown_device_fallback: parse_fallback(&section.unknown_device_fallback)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AuditEngineError> {
        if self.rules_dir.trim().is_empty() {
            return Err(config_err("rules_dir", "must not be empty".to_owned()));
        }
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(config_err("parallelism", format!("must be 1-{MAX_PARALLELISM}")));
        }
        if self.evidence_limit == 0 || self.evidence_limit > MAX_EVIDENCE_LIMIT {
            return Err(config_err(
                "evidence_limit",
                format!("must be 1-{MAX_EVIDENCE_LIMIT}"),
            ));
        }
        if self.max_config_size == 0 || self.max_config_size > MAX_CONFIG_SIZE {
            return Err(config_err(
                "max_config_size",
                format!("must be 1-{MAX_CONFIG_SIZE}"),
            ));
        }
        if self.max_nesting_depth == 0 || self.max_nesting_depth > MAX_NESTING_DEPTH {
            return Err(config_err(
                "max_nesting_depth",
                format!("must be 1-{MAX_NESTING_DEPTH}"),
            ));
        }
        if self.unknown_device_fallback == Some(DeviceType::Unknown) {
            return Err(config_err(
                "unknown_device_fallback",
                "must be a known device type".to_owned(),
            ));
        }
        Ok(())
    }
}

fn config_err(field: &str, reason: String) -> AuditEngineError {
    AuditEngineError::Config {
        field: field.to_owned(),
        reason,
    }
}

fn parse_dialect(value: &str) -> Result<Option<Dialect>, AuditEngineError> {
    if value.trim().eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    Dialect::from_str_loose(value)
        .map(Some)
        .ok_or_else(|| config_err("dialect", format!("unknown dialect '{value}'")))
}

fn parse_fallback(value: &str) -> Result<Option<DeviceType>, AuditEngineError> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match DeviceType::from_str_loose(value) {
        Some(DeviceType::Unknown) | None => Err(config_err(
            "unknown_device_fallback",
            format!("unknown device type '{value}'"),
        )),
        Some(device) => Ok(Some(device)),
    }
}

/// 감사 엔진 설정 빌더
#[derive(Default)]
pub struct AuditConfigBuilder {
    config: AuditConfig,
}

impl AuditConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 컨트롤 디렉토리를 설정합니다.
    pub fn rules_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.rules_dir = dir.into();
        self
    }

    /// 병렬도를 설정합니다.
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.config.parallelism = parallelism;
        self
    }

    /// 증거 라인 상한을 설정합니다.
    pub fn evidence_limit(mut self, limit: usize) -> Self {
        self.config.evidence_limit = limit;
        self
    }

    /// 최대 설정 크기를 설정합니다.
    pub fn max_config_size(mut self, size: usize) -> Self {
        self.config.max_config_size = size;
        self
    }

    /// 최대 중첩 깊이를 설정합니다.
    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.config.max_nesting_depth = depth;
        self
    }

    /// 방언을 고정합니다.
    pub fn dialect(mut self, dialect: Option<Dialect>) -> Self {
        self.config.dialect = dialect;
        self
    }

    /// Unknown 장비에 추가 적용할 컨트롤 세트를 설정합니다.
    pub fn unknown_device_fallback(mut self, device: Option<DeviceType>) -> Self {
        self.config.unknown_device_fallback = device;
        self
    }

    /// 설정을 검증하고 `AuditConfig`를 생성합니다.
    pub fn build(self) -> Result<AuditConfig, AuditEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! 설정 관리 — confwarden.toml 파싱 및 런타임 설정
//!
//! [`ConfwardenConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CONFWARDEN_AUDIT_PARALLELISM=8` 형식)
//! 3. 설정 파일 (`confwarden.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), confwarden_core::error::ConfwardenError> {
//! use confwarden_core::config::ConfwardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ConfwardenConfig::load("confwarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ConfwardenConfig::parse("[audit]\nparallelism = 8")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ConfwardenError};

/// 허용되는 로그 레벨
pub const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 허용되는 로그 형식
pub const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// 허용되는 설정 방언
pub const VALID_DIALECTS: [&str; 3] = ["auto", "ios", "braced"];

/// 허용되는 Unknown 장비 폴백 값
pub const VALID_FALLBACKS: [&str; 4] = ["none", "router", "layer2_switch", "layer3_switch"];

/// 동시 평가 태스크 최대값
pub const MAX_PARALLELISM: usize = 256;

/// 컨트롤당 증거 라인 최대값
pub const MAX_EVIDENCE_LIMIT: usize = 1000;

/// 장비 설정 파일 최대 크기 (64 MiB)
pub const MAX_CONFIG_SIZE: usize = 64 * 1024 * 1024;

/// 블록 중첩 깊이 최대값
pub const MAX_NESTING_DEPTH: usize = 128;

/// confwarden 통합 설정
///
/// `confwarden.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfwardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 감사 엔진 설정
    #[serde(default)]
    pub audit: AuditSection,
}

impl ConfwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ConfwardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ConfwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            ConfwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CONFWARDEN_{SECTION}_{FIELD}`
    /// 예: `CONFWARDEN_AUDIT_RULES_DIR=/etc/confwarden/rules`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CONFWARDEN_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "CONFWARDEN_GENERAL_LOG_FORMAT",
        );

        // Audit
        override_string(&mut self.audit.rules_dir, "CONFWARDEN_AUDIT_RULES_DIR");
        override_usize(&mut self.audit.parallelism, "CONFWARDEN_AUDIT_PARALLELISM");
        override_usize(
            &mut self.audit.evidence_limit,
            "CONFWARDEN_AUDIT_EVIDENCE_LIMIT",
        );
        override_usize(
            &mut self.audit.max_config_size,
            "CONFWARDEN_AUDIT_MAX_CONFIG_SIZE",
        );
        override_usize(
            &mut self.audit.max_nesting_depth,
            "CONFWARDEN_AUDIT_MAX_NESTING_DEPTH",
        );
        override_string(&mut self.audit.dialect, "CONFWARDEN_AUDIT_DIALECT");
        override_string(
            &mut self.audit.unknown_device_fallback,
            "CONFWARDEN_AUDIT_UNKNOWN_DEVICE_FALLBACK",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfwardenError> {
        check_one_of(
            "general.log_level",
            &self.general.log_level,
            &VALID_LOG_LEVELS,
        )?;
        check_one_of(
            "general.log_format",
            &self.general.log_format,
            &VALID_LOG_FORMATS,
        )?;

        if self.audit.rules_dir.trim().is_empty() {
            return Err(invalid("audit.rules_dir", "must not be empty"));
        }
        check_range(
            "audit.parallelism",
            self.audit.parallelism,
            1,
            MAX_PARALLELISM,
        )?;
        check_range(
            "audit.evidence_limit",
            self.audit.evidence_limit,
            1,
            MAX_EVIDENCE_LIMIT,
        )?;
        check_range(
            "audit.max_config_size",
            self.audit.max_config_size,
            1,
            MAX_CONFIG_SIZE,
        )?;
        check_range(
            "audit.max_nesting_depth",
            self.audit.max_nesting_depth,
            1,
            MAX_NESTING_DEPTH,
        )?;
        check_one_of("audit.dialect", &self.audit.dialect, &VALID_DIALECTS)?;
        check_one_of(
            "audit.unknown_device_fallback",
            &self.audit.unknown_device_fallback,
            &VALID_FALLBACKS,
        )?;

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 감사 엔진 설정 (`[audit]` 섹션)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    /// 벤치마크 룰 문서 디렉토리
    pub rules_dir: String,
    /// 동시에 평가할 컨트롤 수
    pub parallelism: usize,
    /// 컨트롤당 증거 라인 최대 개수
    pub evidence_limit: usize,
    /// 장비 설정 파일 최대 크기 (바이트)
    pub max_config_size: usize,
    /// 블록 중첩 최대 깊이
    pub max_nesting_depth: usize,
    /// 설정 방언 (auto, ios, braced)
    pub dialect: String,
    /// Unknown 장비에 추가로 적용할 룰 세트 (none, router, layer2_switch, layer3_switch)
    pub unknown_device_fallback: String,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            rules_dir: "rules".to_owned(),
            parallelism: 4,
            evidence_limit: 50,
            max_config_size: 8 * 1024 * 1024, // 8 MiB
            max_nesting_depth: 32,
            dialect: "auto".to_owned(),
            unknown_device_fallback: "none".to_owned(),
        }
    }
}

// --- 검증 헬퍼 ---

fn invalid(field: &str, reason: impl Into<String>) -> ConfwardenError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

fn check_one_of(field: &str, value: &str, valid: &[&str]) -> Result<(), ConfwardenError> {
    if valid.contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("must be one of: {}", valid.join(", ")),
        ))
    }
}

fn check_range(field: &str, value: usize, min: usize, max: usize) -> Result<(), ConfwardenError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

//! confwarden-core — 감사 엔진 전반에서 공유하는 타입, 에러, 설정
//!
//! 네트워크 장비 설정 컴플라이언스 감사기의 모든 크레이트가 이 크레이트에 의존합니다.
//! 도메인 열거형([`DeviceType`], [`RiskLevel`], [`Verdict`]), 최상위 에러
//! ([`ConfwardenError`]), `confwarden.toml` 설정([`ConfwardenConfig`]),
//! 메트릭 이름 상수([`metrics`])를 제공합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AuditError, ConfigError, ConfwardenError, ParseError, RuleError};

// 설정
pub use config::{AuditSection, ConfwardenConfig, GeneralConfig};

// 도메인 타입
pub use types::{DeviceType, RiskLevel, Verdict};

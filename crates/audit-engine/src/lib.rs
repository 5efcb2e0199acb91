//! confwarden-audit-engine — 컨트롤 평가와 감사 실행
//!
//! # 모듈 구성
//!
//! - [`rule`]: 컨트롤 정의, JSON/YAML 문서 로더, 불변 룰 저장소
//! - [`matcher`]: 매칭 전략별 평가와 증거 수집
//! - [`verdict`]: 매칭 결과를 PASS / FAIL / MANUAL finding으로 변환
//! - [`audit`]: 감사 실행 오케스트레이션 (병렬 평가, 취소, 부분 결과)
//! - [`config`]: 엔진 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! raw text -> ConfigModel -> DeviceClassifier -> RuleRepository::controls_for
//!                                                      |
//!                              RuleMatcher (x parallelism) -> classify -> AuditResult
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod matcher;
pub mod rule;
pub mod verdict;

// --- 주요 타입 re-export ---

// 실행
pub use audit::{
    AuditResult, AuditRunner, AuditRunnerBuilder, AuditSummary, Caveat, EvaluationError,
    RunOptions, RunStatus, VerdictCounts,
};

// 설정
pub use config::{AuditConfig, AuditConfigBuilder};

// 에러
pub use error::{AuditEngineError, RuleDefinitionError};

// 매처
pub use matcher::{CompiledControl, EvidenceLine, MatchResult, RuleMatcher};

// 룰
pub use rule::{
    Aggregation, BlockScope, ControlDefinition, MatchStrategy, RuleDocument, RuleLoader,
    RuleRepository,
};

// 판정
pub use verdict::{Finding, classify};

// 취소 토큰 (RunOptions에 사용)
pub use tokio_util::sync::CancellationToken;

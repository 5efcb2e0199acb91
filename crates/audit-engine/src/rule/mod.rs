//! 벤치마크 컨트롤 -- 정의, 문서 로더, 불변 저장소
//!
//! # 아키텍처
//! - [`types`]: 컨트롤 정의와 매칭 전략
//! - [`loader`]: JSON/YAML 문서 로딩과 항목 단위 검증
//! - [`repository`]: 자연 ID 순서의 버전 스냅샷, 장비 유형별 조회

pub mod loader;
pub mod repository;
pub mod types;

pub use loader::{DocumentFormat, RuleLoader};
pub use repository::RuleRepository;
pub use types::{
    Aggregation, BlockScope, ControlDefinition, MatchStrategy, RuleDocument, control_id_cmp,
};

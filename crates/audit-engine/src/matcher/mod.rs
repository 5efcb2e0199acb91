//! 룰 매처 -- 컨트롤 하나를 설정 모델에 대해 평가
//!
//! [`RuleMatcher`]는 컨트롤의 매칭 전략에 따라 [`MatchResult`]를 돌려줍니다.
//! 모델은 읽기만 하며, 증거 라인은 입력 원문 그대로입니다.
//!
//! # 사용 예시
//! ```
//! use confwarden_audit_engine::matcher::RuleMatcher;
//! use confwarden_audit_engine::rule::{ControlDefinition, MatchStrategy};
//! use confwarden_config_model::ConfigModelBuilder;
//!
//! let model = ConfigModelBuilder::new().build("hostname r1\nservice password-encryption\n").unwrap();
//! let control = ControlDefinition {
//!     patterns: vec!["^service password-encryption".to_owned()],
//!     ..ControlDefinition::new("2.1.1", MatchStrategy::LinePresence)
//! };
//! let result = RuleMatcher::default().evaluate(&control, &model).unwrap();
//! assert!(result.matched);
//! assert_eq!(result.evidence[0].line_number, 2);
//! ```

pub mod compiled;
mod strategy;

pub use compiled::{CompiledControl, CompiledReference, CompiledScope};

use confwarden_config_model::{ConfigLine, ConfigModel};
use serde::{Deserialize, Serialize};

use crate::error::RuleDefinitionError;
use crate::rule::types::ControlDefinition;

/// 기본 증거 라인 상한
pub const DEFAULT_EVIDENCE_LIMIT: usize = 50;

/// 증거 라인 (원문 텍스트와 위치)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceLine {
    /// 라인 번호 (1부터)
    pub line_number: usize,
    /// 입력 원문 그대로의 텍스트
    pub text: String,
    /// 라인을 감싸는 블록 헤더
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_header: Option<String>,
}

impl EvidenceLine {
    /// 모델의 라인에서 증거를 만듭니다.
    pub fn from_line(model: &ConfigModel, line: &ConfigLine) -> Self {
        Self {
            line_number: line.number,
            text: line.text.clone(),
            block_header: line
                .block
                .and_then(|id| model.block(id))
                .map(|block| block.header_text().to_owned()),
        }
    }
}

/// 전략별 매칭 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 전략이 찾는 조건이 성립했는지 여부
    pub matched: bool,
    /// 증거 라인 (소스 순서)
    pub evidence: Vec<EvidenceLine>,
    /// 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 룰 매처
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher {
    evidence_limit: usize,
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EVIDENCE_LIMIT)
    }
}

impl RuleMatcher {
    /// 증거 상한을 지정해 매처를 생성합니다. 0은 1로 취급합니다.
    pub fn new(evidence_limit: usize) -> Self {
        Self {
            evidence_limit: evidence_limit.max(1),
        }
    }

    /// finding 당 최대 증거 라인 수
    pub fn evidence_limit(&self) -> usize {
        self.evidence_limit
    }

    /// 컨트롤을 컴파일합니다.
    pub fn compile(&self, control: &ControlDefinition) -> Result<CompiledControl, RuleDefinitionError> {
        CompiledControl::compile(control)
    }

    /// 컨트롤을 컴파일해 평가합니다.
    ///
    /// # Errors
    /// 컨트롤 정의가 잘못되었으면 [`RuleDefinitionError`]를 반환합니다.
    pub fn evaluate(
        &self,
        control: &ControlDefinition,
        model: &ConfigModel,
    ) -> Result<MatchResult, RuleDefinitionError> {
        let compiled = self.compile(control)?;
        Ok(self.evaluate_compiled(&compiled, model))
    }

    /// 컴파일된 컨트롤을 평가합니다.
    pub fn evaluate_compiled(&self, control: &CompiledControl, model: &ConfigModel) -> MatchResult {
        let outcome = strategy::evaluate(control, model);

        let mut lines = outcome.lines;
        lines.sort_by_key(|line| line.number);
        lines.dedup_by_key(|line| line.number);

        let mut notes = outcome.notes;
        let total = lines.len();
        if total > self.evidence_limit {
            lines.truncate(self.evidence_limit);
            notes.push(format!(
                "evidence truncated to {} of {total} lines",
                self.evidence_limit
            ));
        }

        tracing::trace!(
            control_id = %control.control_id,
            strategy = %control.strategy,
            matched = outcome.matched,
            evidence = lines.len(),
            "control evaluated"
        );

        MatchResult {
            matched: outcome.matched,
            evidence: lines
                .into_iter()
                .map(|line| EvidenceLine::from_line(model, line))
                .collect(),
            note: (!notes.is_empty()).then(|| notes.join("; ")),
        }
    }
}

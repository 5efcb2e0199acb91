#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use confwarden_audit_engine::{
    Aggregation, BlockScope, ControlDefinition, MatchStrategy, RuleMatcher,
};
use confwarden_config_model::ConfigModelBuilder;
use confwarden_config_model::parser::split_lines;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 장비 설정 텍스트
    config: String,
    strategy: FuzzStrategy,
    /// 패턴 목록 (최대 4개로 제한)
    patterns: Vec<String>,
    scope_header: Option<String>,
    all_blocks: bool,
    reference: Option<String>,
    target: Option<String>,
    case_sensitive: bool,
    evidence_limit: u8,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzStrategy {
    LinePresence,
    LineAbsence,
    BlockScopedPresence,
    BlockScopedAbsence,
    CrossBlockConsistency,
    ManualOnly,
}

impl From<FuzzStrategy> for MatchStrategy {
    fn from(s: FuzzStrategy) -> Self {
        match s {
            FuzzStrategy::LinePresence => MatchStrategy::LinePresence,
            FuzzStrategy::LineAbsence => MatchStrategy::LineAbsence,
            FuzzStrategy::BlockScopedPresence => MatchStrategy::BlockScopedPresence,
            FuzzStrategy::BlockScopedAbsence => MatchStrategy::BlockScopedAbsence,
            FuzzStrategy::CrossBlockConsistency => MatchStrategy::CrossBlockConsistency,
            FuzzStrategy::ManualOnly => MatchStrategy::ManualOnly,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let Ok(model) = ConfigModelBuilder::new().max_size(64 * 1024).build(&input.config) else {
        return;
    };

    let control = ControlDefinition {
        patterns: input.patterns.into_iter().take(4).collect(),
        case_sensitive: input.case_sensitive,
        scope: input.scope_header.map(BlockScope::header),
        aggregation: if input.all_blocks {
            Aggregation::All
        } else {
            Aggregation::Any
        },
        reference: input.reference,
        target: input.target,
        ..ControlDefinition::new("FUZZ-1", input.strategy.into())
    };

    let matcher = RuleMatcher::new(usize::from(input.evidence_limit));

    // 잘못된 정의는 Err, 평가는 크래시 없이 끝나야 함
    let Ok(result) = matcher.evaluate(&control, &model) else {
        return;
    };

    // 증거는 원본 라인 그대로
    let source = split_lines(&input.config);
    assert!(result.evidence.len() <= usize::from(input.evidence_limit).max(1));
    for line in &result.evidence {
        assert_eq!(source[line.line_number - 1], line.text);
    }
});

//! 컨트롤 컴파일 -- 정규식 사전 컴파일과 정의 검증
//!
//! 컨트롤당 한 번 [`CompiledControl`]을 만들어 평가 시 재컴파일을 피합니다.
//! 정의가 잘못된 컨트롤은 여기서 [`RuleDefinitionError`]로 걸러집니다.

use regex::{Regex, RegexBuilder};

use crate::error::RuleDefinitionError;
use crate::rule::types::{Aggregation, ControlDefinition, MatchStrategy};

/// 컴파일된 정규식 하나의 최대 크기 (바이트)
pub const MAX_REGEX_SIZE: usize = 1024 * 1024;

/// 교차 참조 대상 템플릿의 자리표시자
pub const REF_PLACEHOLDER: &str = "{ref}";

/// 컴파일된 블록 범위
#[derive(Debug, Clone)]
pub struct CompiledScope {
    /// 블록 헤더
    pub header: Regex,
    /// 본문에 있어야 하는 패턴
    pub require: Option<Regex>,
    /// 본문에 없어야 하는 패턴
    pub exclude: Option<Regex>,
    /// 범위에 맞는 블록이 없으면 실패
    pub missing_fails: bool,
}

/// 컴파일된 교차 참조
#[derive(Debug, Clone)]
pub struct CompiledReference {
    /// 참조 이름을 잡는 정규식
    pub reference: Regex,
    /// `{ref}` 자리표시자가 있는 대상 템플릿
    pub target: String,
    /// 대상을 찾을 블록 헤더 (없으면 최상위 문장)
    pub target_scope: Option<Regex>,
    case_sensitive: bool,
}

impl CompiledReference {
    /// 참조 이름을 대상 정규식으로 만듭니다. 이름은 리터럴로 이스케이프됩니다.
    pub fn target_for(&self, name: &str) -> Option<Regex> {
        let pattern = self.target.replace(REF_PLACEHOLDER, &regex::escape(name));
        build(&pattern, self.case_sensitive).ok()
    }

    /// 참조 정규식 캡처에서 이름을 꺼냅니다 (`ref` 그룹 우선, 없으면 첫 그룹).
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.reference.captures(text)?;
        caps.name("ref")
            .or_else(|| caps.get(1))
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// 평가 준비가 끝난 컨트롤
#[derive(Debug, Clone)]
pub struct CompiledControl {
    /// 컨트롤 ID
    pub control_id: String,
    /// 매칭 전략
    pub strategy: MatchStrategy,
    /// 블록 집계 방식
    pub aggregation: Aggregation,
    /// 패턴 (정의 순서)
    pub patterns: Vec<Regex>,
    /// 패턴 원문 (노트 출력용)
    pub pattern_sources: Vec<String>,
    /// 증거 선택 패턴
    pub evidence: Option<Regex>,
    /// 블록 범위
    pub scope: Option<CompiledScope>,
    /// 교차 참조
    pub reference: Option<CompiledReference>,
}

impl CompiledControl {
    /// 컨트롤 정의를 검증하고 정규식을 컴파일합니다.
    ///
    /// # Errors
    /// 로딩 중 기록된 결함, 필수 필드 누락, 잘못된 정규식이 있으면 에러를 반환합니다.
    pub fn compile(control: &ControlDefinition) -> Result<Self, RuleDefinitionError> {
        let id = control.id.as_str();
        if let Some(defect) = &control.defect {
            return Err(RuleDefinitionError::new(id, defect.clone()));
        }

        let cs = control.case_sensitive;
        let strategy = control.strategy;

        let needs_patterns = !matches!(
            strategy,
            MatchStrategy::ManualOnly | MatchStrategy::CrossBlockConsistency
        );
        if needs_patterns && control.patterns.is_empty() {
            return Err(RuleDefinitionError::new(
                id,
                format!("strategy '{strategy}' requires at least one pattern"),
            ));
        }

        let patterns = control
            .patterns
            .iter()
            .map(|p| compile_field(id, "pattern", p, cs))
            .collect::<Result<Vec<_>, _>>()?;

        let evidence = control
            .evidence_pattern
            .as_deref()
            .map(|p| compile_field(id, "evidence_pattern", p, cs))
            .transpose()?;

        let scope = match &control.scope {
            Some(scope) => Some(CompiledScope {
                header: compile_field(id, "scope.header", &scope.header, cs)?,
                require: scope
                    .require
                    .as_deref()
                    .map(|p| compile_field(id, "scope.require", p, cs))
                    .transpose()?,
                exclude: scope
                    .exclude
                    .as_deref()
                    .map(|p| compile_field(id, "scope.exclude", p, cs))
                    .transpose()?,
                missing_fails: scope.missing_fails,
            }),
            None if strategy.is_block_scoped() => {
                return Err(RuleDefinitionError::new(
                    id,
                    format!("strategy '{strategy}' requires a block scope"),
                ));
            }
            None => None,
        };

        let reference = if strategy == MatchStrategy::CrossBlockConsistency {
            Some(compile_reference(control)?)
        } else {
            None
        };

        Ok(Self {
            control_id: control.id.clone(),
            strategy,
            aggregation: control.aggregation,
            patterns,
            pattern_sources: control.patterns.clone(),
            evidence,
            scope,
            reference,
        })
    }
}

fn compile_reference(control: &ControlDefinition) -> Result<CompiledReference, RuleDefinitionError> {
    let id = control.id.as_str();
    let cs = control.case_sensitive;

    let Some(reference) = control.reference.as_deref() else {
        return Err(RuleDefinitionError::new(id, "cross-block check requires 'reference'"));
    };
    let Some(target) = control.target.as_deref() else {
        return Err(RuleDefinitionError::new(id, "cross-block check requires 'target'"));
    };

    let reference = compile_field(id, "reference", reference, cs)?;
    if reference.captures_len() < 2 {
        return Err(RuleDefinitionError::new(
            id,
            "'reference' must contain a capture group",
        ));
    }
    if !target.contains(REF_PLACEHOLDER) {
        return Err(RuleDefinitionError::new(
            id,
            format!("'target' must contain the {REF_PLACEHOLDER} placeholder"),
        ));
    }
    compile_field(id, "target", &target.replace(REF_PLACEHOLDER, "REF"), cs)?;

    let target_scope = control
        .target_scope
        .as_deref()
        .map(|p| compile_field(id, "target_scope", p, cs))
        .transpose()?;

    Ok(CompiledReference {
        reference,
        target: target.to_owned(),
        target_scope,
        case_sensitive: cs,
    })
}

fn build(pattern: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .size_limit(MAX_REGEX_SIZE)
        .build()
}

fn compile_field(
    control_id: &str,
    field: &str,
    pattern: &str,
    case_sensitive: bool,
) -> Result<Regex, RuleDefinitionError> {
    build(pattern, case_sensitive).map_err(|e| {
        RuleDefinitionError::new(control_id, format!("invalid regex in {field} '{pattern}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::types::BlockScope;

    fn control(strategy: MatchStrategy, patterns: &[&str]) -> ControlDefinition {
        ControlDefinition {
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
            ..ControlDefinition::new("1.1", strategy)
        }
    }

    fn cross(reference: Option<&str>, target: Option<&str>) -> ControlDefinition {
        ControlDefinition {
            reference: reference.map(str::to_owned),
            target: target.map(str::to_owned),
            ..ControlDefinition::new("3.1", MatchStrategy::CrossBlockConsistency)
        }
    }

    #[test]
    fn compiles_line_presence() {
        let compiled =
            CompiledControl::compile(&control(MatchStrategy::LinePresence, &["^aaa new-model"]))
                .unwrap();
        assert_eq!(compiled.patterns.len(), 1);
        // 기본은 대소문자 무시
        assert!(compiled.patterns[0].is_match("AAA NEW-MODEL"));
    }

    #[test]
    fn case_sensitive_patterns() {
        let mut def = control(MatchStrategy::LinePresence, &["^hostname"]);
        def.case_sensitive = true;
        let compiled = CompiledControl::compile(&def).unwrap();
        assert!(!compiled.patterns[0].is_match("HOSTNAME r1"));
    }

    #[test]
    fn missing_patterns_is_error() {
        let err = CompiledControl::compile(&control(MatchStrategy::LineAbsence, &[])).unwrap_err();
        assert_eq!(err.control_id, "1.1");
        assert!(err.reason.contains("line_absence"));
    }

    #[test]
    fn manual_without_patterns_is_fine() {
        CompiledControl::compile(&control(MatchStrategy::ManualOnly, &[])).unwrap();
    }

    #[test]
    fn invalid_regex_is_error() {
        let err =
            CompiledControl::compile(&control(MatchStrategy::LinePresence, &["(unclosed"]))
                .unwrap_err();
        assert!(err.reason.contains("invalid regex in pattern"));
    }

    #[test]
    fn block_strategy_requires_scope() {
        let err = CompiledControl::compile(&control(MatchStrategy::BlockScopedPresence, &["x"]))
            .unwrap_err();
        assert!(err.reason.contains("block scope"));

        let mut def = control(MatchStrategy::BlockScopedPresence, &["x"]);
        def.scope = Some(BlockScope {
            require: Some("[".to_owned()),
            ..BlockScope::header("^interface")
        });
        let err = CompiledControl::compile(&def).unwrap_err();
        assert!(err.reason.contains("scope.require"));
    }

    #[test]
    fn defect_is_reported() {
        let err = CompiledControl::compile(&ControlDefinition::defective("9.9", "bad shape"))
            .unwrap_err();
        assert_eq!(err.control_id, "9.9");
        assert_eq!(err.reason, "bad shape");
    }

    #[test]
    fn cross_block_validation() {
        assert!(CompiledControl::compile(&cross(None, Some("^x {ref}"))).is_err());
        assert!(CompiledControl::compile(&cross(Some(r"group (\S+)"), None)).is_err());
        // 캡처 그룹 없음
        assert!(CompiledControl::compile(&cross(Some(r"group \S+"), Some("{ref}"))).is_err());
        // 자리표시자 없음
        assert!(CompiledControl::compile(&cross(Some(r"group (\S+)"), Some("^acl"))).is_err());
        // 자리표시자 치환 후에도 잘못된 정규식
        assert!(CompiledControl::compile(&cross(Some(r"group (\S+)"), Some("({ref}"))).is_err());

        let compiled =
            CompiledControl::compile(&cross(Some(r"access-group (?P<ref>\S+)"), Some(r"^acl {ref}$")))
                .unwrap();
        assert!(compiled.patterns.is_empty());
        assert!(compiled.reference.is_some());
    }

    #[test]
    fn reference_capture_and_target() {
        let compiled =
            CompiledControl::compile(&cross(Some(r"access-group (\S+) in"), Some(r"^ip access-list \S+ {ref}$")))
                .unwrap();
        let reference = compiled.reference.unwrap();
        assert_eq!(reference.capture(" ip access-group WAN.IN in"), Some("WAN.IN"));
        assert_eq!(reference.capture("hostname r1"), None);

        let target = reference.target_for("WAN.IN").unwrap();
        assert!(target.is_match("ip access-list extended WAN.IN"));
        // 이름은 리터럴로 취급
        assert!(!target.is_match("ip access-list extended WANXIN"));
    }
}

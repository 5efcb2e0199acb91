//! 판정 -- 매칭 결과를 PASS / FAIL / MANUAL finding으로 변환
//!
//! [`classify`]는 순수 함수입니다. 같은 컨트롤과 매칭 결과에는 항상 같은 finding을 돌려줍니다.

use confwarden_core::types::{RiskLevel, Verdict};
use serde::{Deserialize, Serialize};

use crate::matcher::{EvidenceLine, MatchResult};
use crate::rule::types::{ControlDefinition, MatchStrategy};

/// 컨트롤 하나에 대한 감사 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// 컨트롤 ID
    pub control_id: String,
    /// 제목
    pub title: String,
    /// 벤치마크 섹션
    pub section: String,
    /// CIS 참조
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cis_reference: Option<String>,
    /// 판정
    pub verdict: Verdict,
    /// 위험도
    pub risk: RiskLevel,
    /// 증거 라인
    pub evidence: Vec<EvidenceLine>,
    /// 조치 방법
    pub remediation: String,
    /// 매처 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// 전략과 매칭 여부로 판정을 결정합니다.
pub fn verdict_for(strategy: MatchStrategy, matched: bool) -> Verdict {
    match strategy {
        MatchStrategy::LinePresence
        | MatchStrategy::BlockScopedPresence
        | MatchStrategy::CrossBlockConsistency => {
            if matched {
                Verdict::Pass
            } else {
                Verdict::Fail
            }
        }
        MatchStrategy::LineAbsence | MatchStrategy::BlockScopedAbsence => {
            if matched {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        }
        MatchStrategy::ManualOnly => Verdict::Manual,
    }
}

/// 매칭 결과를 finding으로 변환합니다.
///
/// 위험도와 조치 방법은 컨트롤 정의에서 그대로 복사됩니다.
pub fn classify(control: &ControlDefinition, result: &MatchResult) -> Finding {
    Finding {
        control_id: control.id.clone(),
        title: control.title.clone(),
        section: control.section.clone(),
        cis_reference: control.cis_reference.clone(),
        verdict: verdict_for(control.strategy, result.matched),
        risk: control.risk,
        evidence: result.evidence.clone(),
        remediation: control.remediation.clone(),
        note: result.note.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(matched: bool) -> MatchResult {
        MatchResult {
            matched,
            evidence: vec![EvidenceLine {
                line_number: 7,
                text: " transport input telnet".to_owned(),
                block_header: Some("line vty 0 4".to_owned()),
            }],
            note: Some("n".to_owned()),
        }
    }

    #[test]
    fn mapping_is_total() {
        use MatchStrategy::*;
        let table = [
            (LinePresence, true, Verdict::Pass),
            (LinePresence, false, Verdict::Fail),
            (BlockScopedPresence, true, Verdict::Pass),
            (BlockScopedPresence, false, Verdict::Fail),
            (LineAbsence, true, Verdict::Fail),
            (LineAbsence, false, Verdict::Pass),
            (BlockScopedAbsence, true, Verdict::Fail),
            (BlockScopedAbsence, false, Verdict::Pass),
            (CrossBlockConsistency, true, Verdict::Pass),
            (CrossBlockConsistency, false, Verdict::Fail),
            (ManualOnly, true, Verdict::Manual),
            (ManualOnly, false, Verdict::Manual),
        ];
        for (strategy, matched, expected) in table {
            assert_eq!(verdict_for(strategy, matched), expected, "{strategy} {matched}");
        }
    }

    #[test]
    fn classify_copies_control_fields() {
        let control = ControlDefinition {
            title: "Disable telnet".to_owned(),
            section: "Management Plane".to_owned(),
            cis_reference: Some("1.1.4".to_owned()),
            risk: RiskLevel::High,
            remediation: "transport input ssh".to_owned(),
            ..ControlDefinition::new("1.1.4", MatchStrategy::LineAbsence)
        };
        let finding = classify(&control, &result(true));
        assert_eq!(finding.verdict, Verdict::Fail);
        assert_eq!(finding.risk, RiskLevel::High);
        assert_eq!(finding.remediation, "transport input ssh");
        assert_eq!(finding.cis_reference.as_deref(), Some("1.1.4"));
        assert_eq!(finding.evidence[0].text, " transport input telnet");
        assert_eq!(finding.note.as_deref(), Some("n"));
    }

    #[test]
    fn classify_is_pure() {
        let control = ControlDefinition::new("x", MatchStrategy::LinePresence);
        assert_eq!(classify(&control, &result(false)), classify(&control, &result(false)));
    }
}

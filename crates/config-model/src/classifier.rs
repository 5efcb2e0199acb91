//! 장비 유형 분류기
//!
//! 설정 모델에서 장비 역할을 나타내는 지표를 찾아 [`DeviceType`]을 추정합니다.
//! 분류는 최선 노력(best-effort) 휴리스틱이며 실패하지 않습니다. 판단할 근거가
//! 부족하면 `Unknown`을 돌려주고, 호출자는 그래도 평가를 계속합니다.
//!
//! # 점수 규칙
//! 지표는 [`INDICATORS`] 순서대로 한 번씩 평가되고 각자 `router`, `switch`, `l3`
//! 점수에 가중치를 더합니다.
//!
//! # 결정 규칙 (처음 성립하는 규칙이 이김)
//! 1. `l3 >= 12 && switch >= 10` → L3 스위치
//! 2. `router >= switch + 4 && router >= 10` → 라우터
//! 3. `switch >= router + 4 && switch >= 10` → L2 스위치
//! 4. `switchport` 있음, `router` 블록 없음, `l3 == 0` → L2 스위치
//! 5. `router` 블록 있음, 스위치 전용 지표 없음 → 라우터
//! 6. 스위치 지표와 L3 지표가 함께 있으나 임계치 미달 → L3 스위치 (더 많은 컨트롤을 적용하는 쪽)
//! 7. 그 외 → Unknown

use std::fmt;
use std::sync::LazyLock;

use confwarden_core::metrics as m;
use confwarden_core::types::DeviceType;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::model::{BlockKind, ConfigModel};

/// 결과에 남기는 지표 설명 최대 개수
pub const MAX_INDICATORS: usize = 15;

/// 지표 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorClass {
    /// 라우터 지표
    Router,
    /// 스위치 전용 지표
    Switch,
    /// 스위치와 L3 양쪽에 기여하는 지표
    Layer3,
}

/// 지표가 검사하는 텍스트 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorScope {
    /// 설정 문장(헤더 포함)
    Statements,
    /// 설정 문장과 주석
    AnyText,
}

/// 가중 지표 정의
#[derive(Debug, Clone, Copy)]
pub struct Indicator {
    /// 결과에 남기는 설명
    pub description: &'static str,
    /// 대소문자 무시 정규식
    pub pattern: &'static str,
    /// 검사 범위
    pub scope: IndicatorScope,
    /// 분류
    pub class: IndicatorClass,
    /// 라우터 점수 가중치
    pub router: u32,
    /// 스위치 점수 가중치
    pub switch: u32,
    /// L3 점수 가중치
    pub l3: u32,
}

const fn indicator(
    description: &'static str,
    pattern: &'static str,
    scope: IndicatorScope,
    class: IndicatorClass,
    weights: (u32, u32, u32),
) -> Indicator {
    Indicator {
        description,
        pattern,
        scope,
        class,
        router: weights.0,
        switch: weights.1,
        l3: weights.2,
    }
}

use IndicatorClass as C;
use IndicatorScope as S;

/// 평가 순서대로 나열한 지표 테이블
pub const INDICATORS: [Indicator; 15] = [
    indicator(
        "Router hardware model signature found",
        r"\bisr\b|\basr\b|\bcisco\s*(?:19|29|39)\d{2}\b",
        S::AnyText,
        C::Router,
        (8, 0, 0),
    ),
    indicator(
        "Switch hardware model signature found",
        r"\bws-c\d{4}|\bcatalyst\b|\bc\d{4}\b|\bnexus\b",
        S::AnyText,
        C::Switch,
        (0, 8, 0),
    ),
    indicator("Switchport found", r"^\s*switchport\b", S::Statements, C::Switch, (0, 6, 0)),
    indicator("Spanning-tree found", r"^\s*spanning-tree\b", S::Statements, C::Switch, (0, 6, 0)),
    indicator("VLAN config found", r"^\s*vlan\s+\d+\b", S::Statements, C::Switch, (0, 4, 0)),
    indicator(
        "Port-channel config found",
        r"^\s*channel-group\b",
        S::Statements,
        C::Switch,
        (0, 3, 0),
    ),
    indicator(
        "DHCP snooping found",
        r"^\s*ip dhcp snooping\b",
        S::Statements,
        C::Switch,
        (0, 5, 0),
    ),
    indicator("NAT found", r"^\s*ip nat\b", S::Statements, C::Router, (6, 0, 0)),
    indicator(
        "VPN/Crypto found",
        r"^\s*crypto (?:isakmp|ikev2|ipsec)\b",
        S::Statements,
        C::Router,
        (6, 0, 0),
    ),
    indicator(
        "WAN interface found",
        r"^\s*interface\s+(?:Serial|Tunnel|Dialer|Cellular)\d+",
        S::Statements,
        C::Router,
        (6, 0, 0),
    ),
    indicator(
        "Routing protocol found",
        r"^\s*router\s+(?:bgp|eigrp|rip|isis)\b",
        S::Statements,
        C::Router,
        (5, 0, 0),
    ),
    indicator(
        "SVI found (interface VlanX)",
        r"^\s*interface\s+Vlan\d+\b",
        S::Statements,
        C::Layer3,
        (0, 5, 8),
    ),
    indicator("ip routing enabled", r"^\s*ip routing\b", S::Statements, C::Layer3, (0, 4, 8)),
    indicator(
        "Static route found (ip route)",
        r"^\s*ip route\b",
        S::Statements,
        C::Layer3,
        (0, 3, 6),
    ),
    indicator(
        "Routed port found (no switchport)",
        r"^\s*no switchport\b",
        S::Statements,
        C::Layer3,
        (0, 3, 6),
    ),
];

/// `Switchport found` 지표의 테이블 인덱스
const SWITCHPORT_INDICATOR: usize = 2;

static COMPILED: LazyLock<Vec<Option<Regex>>> = LazyLock::new(|| {
    INDICATORS
        .iter()
        .map(|ind| Regex::new(&format!("(?i){}", ind.pattern)).ok())
        .collect()
});

/// 분류 신뢰도
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Confidence {
    /// 낮음
    Low,
    /// 중간
    Medium,
    /// 높음
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// 누적 점수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scores {
    /// 라우터 점수
    pub router: u32,
    /// 스위치 점수
    pub switch: u32,
    /// L3 점수
    pub l3: u32,
}

impl Scores {
    /// 가장 높은 점수
    pub fn max(&self) -> u32 {
        self.router.max(self.switch).max(self.l3)
    }
}

/// 분류를 결정한 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// 규칙 1
    Layer3Threshold,
    /// 규칙 2
    RouterThreshold,
    /// 규칙 3
    SwitchThreshold,
    /// 규칙 4
    AccessPortsWithoutRouting,
    /// 규칙 5
    RoutingWithoutSwitching,
    /// 규칙 6
    MixedSignalsTieBreak,
    /// 규칙 7
    NoDecisiveIndicator,
}

impl fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Layer3Threshold => "layer-3 score threshold",
            Self::RouterThreshold => "router score threshold",
            Self::SwitchThreshold => "switch score threshold",
            Self::AccessPortsWithoutRouting => "switchports without routing",
            Self::RoutingWithoutSwitching => "routing process without switching",
            Self::MixedSignalsTieBreak => "mixed switch/layer-3 signals",
            Self::NoDecisiveIndicator => "no decisive indicator",
        };
        f.write_str(text)
    }
}

/// 분류 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// 추정된 장비 유형
    pub device_type: DeviceType,
    /// 신뢰도
    pub confidence: Confidence,
    /// 누적 점수
    pub scores: Scores,
    /// 일치한 지표 설명 (최대 [`MAX_INDICATORS`]개)
    pub indicators: Vec<String>,
    /// 결정 규칙
    pub decided_by: DecisionRule,
}

impl Classification {
    /// 지표가 충돌하거나 없어 판별하지 못했는지 여부
    pub fn is_ambiguous(&self) -> bool {
        self.device_type == DeviceType::Unknown
    }
}

/// 장비 유형 분류기
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceClassifier;

impl DeviceClassifier {
    /// 새 분류기를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    /// 모델을 분류합니다. 같은 모델에는 항상 같은 결과를 돌려줍니다.
    pub fn classify(&self, model: &ConfigModel) -> Classification {
        let statements = model.statements();
        let mut scores = Scores::default();
        let mut indicators = Vec::new();
        let mut matched = [false; INDICATORS.len()];

        for (idx, (ind, re)) in INDICATORS.iter().zip(COMPILED.iter()).enumerate() {
            let Some(re) = re else { continue };
            let in_statements = statements.iter().any(|line| re.is_match(&line.text));
            let hit = match ind.scope {
                S::Statements => in_statements,
                S::AnyText => {
                    in_statements || model.comments().iter().any(|line| re.is_match(&line.text))
                }
            };
            if hit {
                matched[idx] = true;
                scores.router += ind.router;
                scores.switch += ind.switch;
                scores.l3 += ind.l3;
                indicators.push(ind.description.to_owned());
            }
        }
        indicators.truncate(MAX_INDICATORS);

        let has_router_block = model.blocks().iter().any(|b| b.kind == BlockKind::Router);
        let has_switch_signal = INDICATORS
            .iter()
            .zip(matched)
            .any(|(ind, hit)| hit && ind.class == C::Switch);
        let (device_type, decided_by) = decide(
            &scores,
            matched[SWITCHPORT_INDICATOR],
            has_switch_signal,
            has_router_block,
        );

        let confidence = if device_type == DeviceType::Unknown {
            Confidence::Low
        } else {
            match scores.max() {
                s if s >= 22 => Confidence::High,
                s if s >= 14 => Confidence::Medium,
                _ => Confidence::Low,
            }
        };

        metrics::counter!(m::CLASSIFIER_DECISIONS_TOTAL, m::LABEL_DEVICE_TYPE => device_type.as_str())
            .increment(1);
        debug!(
            device_type = device_type.as_str(),
            router = scores.router,
            switch = scores.switch,
            l3 = scores.l3,
            rule = %decided_by,
            "device classified"
        );

        Classification {
            device_type,
            confidence,
            scores,
            indicators,
            decided_by,
        }
    }
}

fn decide(
    scores: &Scores,
    has_switchport: bool,
    has_switch_signal: bool,
    has_router_block: bool,
) -> (DeviceType, DecisionRule) {
    let Scores { router, switch, l3 } = *scores;
    if l3 >= 12 && switch >= 10 {
        (DeviceType::Layer3Switch, DecisionRule::Layer3Threshold)
    } else if router >= switch + 4 && router >= 10 {
        (DeviceType::Router, DecisionRule::RouterThreshold)
    } else if switch >= router + 4 && switch >= 10 {
        (DeviceType::Layer2Switch, DecisionRule::SwitchThreshold)
    } else if has_switchport && !has_router_block && l3 == 0 {
        (DeviceType::Layer2Switch, DecisionRule::AccessPortsWithoutRouting)
    } else if has_router_block && !has_switch_signal {
        (DeviceType::Router, DecisionRule::RoutingWithoutSwitching)
    } else if has_switch_signal && l3 > 0 {
        (DeviceType::Layer3Switch, DecisionRule::MixedSignalsTieBreak)
    } else {
        (DeviceType::Unknown, DecisionRule::NoDecisiveIndicator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ConfigModelBuilder;

    fn classify(text: &str) -> Classification {
        let model = ConfigModelBuilder::new().build(text).unwrap();
        DeviceClassifier::new().classify(&model)
    }

    #[test]
    fn indicator_table_compiles_completely() {
        assert!(COMPILED.iter().all(Option::is_some));
        assert_eq!(INDICATORS[SWITCHPORT_INDICATOR].description, "Switchport found");
    }

    #[test]
    fn access_switch_without_routing_is_layer2() {
        let c = classify("hostname sw1\ninterface Gi0/1\n switchport mode access\n!\n");
        assert_eq!(c.device_type, DeviceType::Layer2Switch);
        assert_eq!(c.decided_by, DecisionRule::AccessPortsWithoutRouting);
        assert_eq!(c.scores.switch, 6);
        assert_eq!(c.confidence, Confidence::Low);
    }

    #[test]
    fn strong_switch_signals_reach_threshold() {
        let text = "\
spanning-tree mode rapid-pvst
vlan 10
 name USERS
interface Gi0/1
 switchport access vlan 10
 channel-group 1 mode active
";
        let c = classify(text);
        assert_eq!(c.device_type, DeviceType::Layer2Switch);
        assert_eq!(c.decided_by, DecisionRule::SwitchThreshold);
        assert_eq!(c.scores.switch, 19);
        assert_eq!(c.confidence, Confidence::Medium);
    }

    #[test]
    fn routed_svi_switch_is_layer3() {
        let text = "\
ip routing
interface Vlan10
 ip address 10.0.10.1 255.255.255.0
interface Gi0/1
 switchport mode trunk
";
        let c = classify(text);
        assert_eq!(c.device_type, DeviceType::Layer3Switch);
        assert_eq!(c.decided_by, DecisionRule::Layer3Threshold);
        assert_eq!(c.scores, Scores { router: 0, switch: 15, l3: 16 });
    }

    #[test]
    fn wan_router_is_router() {
        let text = "\
! Cisco ISR 4331
interface Serial0/0/0
 ip nat outside
router bgp 65000
 neighbor 192.0.2.1 remote-as 65001
";
        let c = classify(text);
        assert_eq!(c.device_type, DeviceType::Router);
        assert_eq!(c.decided_by, DecisionRule::RouterThreshold);
        assert_eq!(c.scores.router, 25);
        assert_eq!(c.confidence, Confidence::High);
        assert!(c
            .indicators
            .contains(&"Router hardware model signature found".to_owned()));
    }

    #[test]
    fn ospf_only_router_uses_structural_rule() {
        let c = classify("router ospf 1\n network 10.0.0.0 0.0.0.255 area 0\n");
        assert_eq!(c.device_type, DeviceType::Router);
        assert_eq!(c.decided_by, DecisionRule::RoutingWithoutSwitching);
    }

    #[test]
    fn weak_mixed_signals_break_tie_toward_layer3() {
        let c = classify("interface Gi0/1\n switchport mode access\nip route 0.0.0.0 0.0.0.0 10.0.0.1\n");
        assert_eq!(c.scores, Scores { router: 0, switch: 9, l3: 6 });
        assert_eq!(c.device_type, DeviceType::Layer3Switch);
        assert_eq!(c.decided_by, DecisionRule::MixedSignalsTieBreak);
    }

    #[test]
    fn no_indicators_is_unknown() {
        let c = classify("hostname box\nservice password-encryption\n");
        assert_eq!(c.device_type, DeviceType::Unknown);
        assert_eq!(c.confidence, Confidence::Low);
        assert!(c.is_ambiguous());
        assert!(c.indicators.is_empty());
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "ip routing\ninterface Vlan1\n no shutdown\nspanning-tree mode mst\n";
        let model = ConfigModelBuilder::new().build(text).unwrap();
        let classifier = DeviceClassifier::new();
        let first = classifier.classify(&model);
        for _ in 0..10 {
            assert_eq!(classifier.classify(&model), first);
        }
    }
}

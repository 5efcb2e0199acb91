//! 도메인 타입 — 감사 파이프라인 전역에서 사용되는 공통 열거형
//!
//! 설정 모델, 분류기, 룰 엔진, CLI가 모두 이 타입들로 결과를 주고받습니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 컨트롤 위험도
///
/// `Ord` 구현으로 위험도 비교가 가능합니다
/// (`Informational < Low < Medium < High < Critical`).
/// 역직렬화는 대소문자와 약어(`info`, `med`, `crit`)를 허용합니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String")]
pub enum RiskLevel {
    /// 정보성
    Informational,
    /// 낮음
    Low,
    /// 중간 (컨트롤에 위험도가 없을 때의 기본값)
    #[default]
    Medium,
    /// 높음
    High,
    /// 치명적
    Critical,
}

impl RiskLevel {
    /// 모든 위험도 (낮은 순)
    pub const ALL: [Self; 5] = [
        Self::Informational,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Critical,
    ];

    /// 문자열에서 위험도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Informational),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_loose(&value).ok_or_else(|| format!("unknown risk level '{value}'"))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Informational => write!(f, "Informational"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 장비 유형
///
/// 분류기가 결정하며 적용할 벤치마크 룰 세트를 고릅니다.
/// `Unknown`은 정상적인 최종 분류 결과입니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum DeviceType {
    /// 라우터
    Router,
    /// L2 스위치
    #[serde(rename = "layer2_switch")]
    Layer2Switch,
    /// L3 스위치
    #[serde(rename = "layer3_switch")]
    Layer3Switch,
    /// 판별 불가
    #[default]
    Unknown,
}

impl DeviceType {
    /// 알려진(Unknown이 아닌) 장비 유형
    pub const KNOWN: [Self; 3] = [Self::Router, Self::Layer2Switch, Self::Layer3Switch];

    /// 문자열에서 장비 유형을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않으며 `switch_l2`, `l2`, `l3-switch` 같은 별칭을 허용합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "router" | "rtr" => Some(Self::Router),
            "layer2_switch" | "layer2switch" | "switch_l2" | "l2_switch" | "l2" | "switch" => {
                Some(Self::Layer2Switch)
            }
            "layer3_switch" | "layer3switch" | "switch_l3" | "l3_switch" | "l3" => {
                Some(Self::Layer3Switch)
            }
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// 설정 파일/JSON 출력에 쓰이는 식별자
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Layer2Switch => "layer2_switch",
            Self::Layer3Switch => "layer3_switch",
            Self::Unknown => "unknown",
        }
    }
}

impl TryFrom<String> for DeviceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_loose(&value).ok_or_else(|| format!("unknown device type '{value}'"))
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Router => write!(f, "Router"),
            Self::Layer2Switch => write!(f, "Layer-2 Switch"),
            Self::Layer3Switch => write!(f, "Layer-3 Switch"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// 컨트롤 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// 준수
    Pass,
    /// 미준수
    Fail,
    /// 사람의 판단 필요
    Manual,
}

impl Verdict {
    /// 메트릭 레이블 값
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Manual => write!(f, "MANUAL"),
        }
    }
}

//! 컨트롤 정의 데이터 타입
//!
//! JSON/YAML 벤치마크 문서에서 역직렬화되는 구조체들을 정의합니다.
//!
//! # 문서 스키마
//! ```json
//! {
//!   "benchmark": "CIS Cisco IOS 17.x",
//!   "version": "2.0.0",
//!   "device_types": ["router"],
//!   "controls": [
//!     {
//!       "id": "1.1.2",
//!       "title": "Enable password encryption",
//!       "risk": "High",
//!       "strategy": "line_presence",
//!       "pattern": "^service password-encryption",
//!       "remediation": "service password-encryption"
//!     }
//!   ]
//! }
//! ```
//!
//! 컨트롤 배열만 있는 문서도 허용합니다. 이전 형식의 `type`/`expect`/`block`
//! 필드(`regex`, `block_present`, `banner` 등)는 대응하는 [`MatchStrategy`]로 변환됩니다.

use std::cmp::Ordering;
use std::fmt;

use confwarden_core::types::{DeviceType, RiskLevel};
use serde::{Deserialize, Deserializer, Serialize};

/// 매칭 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// 패턴이 설정 어딘가에 있어야 함
    LinePresence,
    /// 패턴이 어디에도 없어야 함
    LineAbsence,
    /// 범위 내 블록마다 패턴이 있어야 함
    BlockScopedPresence,
    /// 범위 내 블록에 패턴이 없어야 함
    BlockScopedAbsence,
    /// 참조된 이름이 대상 위치에 정의되어 있어야 함
    CrossBlockConsistency,
    /// 사람이 판단
    #[serde(alias = "manual")]
    ManualOnly,
}

impl MatchStrategy {
    /// 식별자 (메트릭 레이블)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinePresence => "line_presence",
            Self::LineAbsence => "line_absence",
            Self::BlockScopedPresence => "block_scoped_presence",
            Self::BlockScopedAbsence => "block_scoped_absence",
            Self::CrossBlockConsistency => "cross_block_consistency",
            Self::ManualOnly => "manual_only",
        }
    }

    /// 블록 범위가 필요한 전략인지 여부
    pub fn is_block_scoped(&self) -> bool {
        matches!(self, Self::BlockScopedPresence | Self::BlockScopedAbsence)
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 블록 범위 지정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockScope {
    /// 블록 헤더 정규식 (`^interface\s+Gi`)
    pub header: String,
    /// 본문에 이 패턴이 있는 블록만 포함
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<String>,
    /// 본문에 이 패턴이 있는 블록은 제외
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    /// 범위에 맞는 블록이 없을 때 실패로 판정
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing_fails: bool,
}

impl BlockScope {
    /// 헤더만 지정한 범위
    pub fn header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            require: None,
            exclude: None,
            missing_fails: false,
        }
    }
}

/// 블록 단위 결과 집계 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// 한 블록이라도 실패하면 전체 실패 (기본값)
    #[default]
    #[serde(alias = "strict")]
    Any,
    /// 모든 블록이 실패해야 전체 실패
    #[serde(alias = "consensus")]
    All,
}

/// 벤치마크 컨트롤 정의
///
/// 로더가 소유하며 엔진에는 읽기 전용입니다. 구조가 깨졌지만 `id`로 식별 가능한 항목은
/// `defect`에 사유를 담은 채 유지되고, 매처가 [`RuleDefinitionError`](crate::RuleDefinitionError)로 보고합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawControl")]
pub struct ControlDefinition {
    /// 안정적인 컨트롤 ID (`1.2.3`)
    pub id: String,
    /// 제목
    pub title: String,
    /// 벤치마크 섹션
    pub section: String,
    /// CIS 참조
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cis_reference: Option<String>,
    /// 적용 장비 유형 (비어 있으면 모든 장비)
    pub device_types: Vec<DeviceType>,
    /// 위험도
    pub risk: RiskLevel,
    /// 매칭 전략
    pub strategy: MatchStrategy,
    /// 패턴 목록
    pub patterns: Vec<String>,
    /// 대소문자 구분 여부
    pub case_sensitive: bool,
    /// 블록 범위
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<BlockScope>,
    /// 블록 집계 방식
    pub aggregation: Aggregation,
    /// 증거 라인 선택 패턴 (없으면 매칭 패턴 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_pattern: Option<String>,
    /// 참조 이름을 잡는 정규식 (`ref` 이름 그룹 또는 첫 그룹)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// 참조 대상 정규식 템플릿 (`{ref}` 자리표시자)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// 참조 대상을 찾을 블록 헤더 정규식 (없으면 최상위 문장)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_scope: Option<String>,
    /// 조치 방법
    pub remediation: String,
    /// 로딩 중 발견된 정의 오류
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect: Option<String>,
}

impl ControlDefinition {
    /// 최소 필드로 컨트롤을 생성합니다.
    pub fn new(id: impl Into<String>, strategy: MatchStrategy) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            section: String::new(),
            cis_reference: None,
            device_types: Vec::new(),
            risk: RiskLevel::default(),
            strategy,
            patterns: Vec::new(),
            case_sensitive: false,
            scope: None,
            aggregation: Aggregation::default(),
            evidence_pattern: None,
            reference: None,
            target: None,
            target_scope: None,
            remediation: String::new(),
            defect: None,
        }
    }

    /// 역직렬화에 실패했지만 ID는 알 수 있는 항목
    pub fn defective(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            defect: Some(reason.into()),
            ..Self::new(id, MatchStrategy::ManualOnly)
        }
    }

    /// 장비 유형 제한이 없는 컨트롤인지 여부
    pub fn is_generic(&self) -> bool {
        self.device_types.is_empty()
    }

    /// 주어진 장비 유형에 적용되는지 여부
    pub fn applies_to(&self, device: DeviceType) -> bool {
        self.is_generic() || self.device_types.contains(&device)
    }

    /// 같은 ID의 다른 컨트롤과 적용 장비가 겹치는지 여부
    pub fn shares_devices(&self, other: &Self) -> bool {
        devices_overlap(&self.device_types, &other.device_types)
    }
}

/// 두 장비 유형 집합이 겹치는지 여부 (빈 집합은 모든 장비)
pub fn devices_overlap(a: &[DeviceType], b: &[DeviceType]) -> bool {
    a.is_empty() || b.is_empty() || a.iter().any(|d| b.contains(d))
}

/// 컨트롤 ID 자연 순서 비교 (`1.2.9` < `1.2.10`)
///
/// `.`/`-`로 나눈 조각을 숫자면 숫자로, 아니면 문자열로 비교합니다.
pub fn control_id_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.split(['.', '-']);
    let mut right = b.split(['.', '-']);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// 벤치마크 문서
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleDocument {
    /// 출처 (파일 경로 등)
    pub source: String,
    /// 벤치마크 이름
    pub benchmark: Option<String>,
    /// 벤치마크 버전
    pub version: Option<String>,
    /// 문서 기본 적용 장비 유형
    pub device_types: Vec<DeviceType>,
    /// 컨트롤 목록
    pub controls: Vec<ControlDefinition>,
}

// ─── 역직렬화 중간 표현 ────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawControl {
    id: String,
    title: String,
    section: String,
    #[serde(alias = "cis")]
    cis_reference: Option<String>,
    device_types: Vec<DeviceType>,
    risk: RiskLevel,
    strategy: Option<MatchStrategy>,
    #[serde(rename = "type")]
    legacy_type: Option<String>,
    expect: Option<String>,
    block: Option<String>,
    banner_type: Option<String>,
    #[serde(alias = "pattern", deserialize_with = "one_or_many")]
    patterns: Vec<String>,
    case_sensitive: bool,
    scope: Option<BlockScope>,
    aggregation: Aggregation,
    evidence_pattern: Option<String>,
    reference: Option<String>,
    target: Option<String>,
    target_scope: Option<String>,
    #[serde(alias = "recommendation")]
    remediation: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    };
    Ok(values.into_iter().filter(|p| !p.is_empty()).collect())
}

/// 전략, 범위, 집계, 패턴 해석 결과
struct Resolved {
    strategy: MatchStrategy,
    scope: Option<BlockScope>,
    aggregation: Aggregation,
    patterns: Vec<String>,
}

impl From<RawControl> for ControlDefinition {
    fn from(raw: RawControl) -> Self {
        let resolved = match (raw.strategy, raw.legacy_type.as_deref()) {
            (Some(strategy), _) => Ok(Resolved {
                strategy,
                scope: raw.scope.clone(),
                aggregation: raw.aggregation,
                patterns: raw.patterns.clone(),
            }),
            (None, Some(kind)) => resolve_legacy(&raw, kind),
            (None, None) => Err("no strategy given".to_owned()),
        };

        let (resolved, defect) = match resolved {
            Ok(resolved) => (resolved, None),
            Err(reason) => (
                Resolved {
                    strategy: MatchStrategy::ManualOnly,
                    scope: raw.scope.clone(),
                    aggregation: raw.aggregation,
                    patterns: raw.patterns.clone(),
                },
                Some(reason),
            ),
        };

        Self {
            id: raw.id,
            title: raw.title,
            section: raw.section,
            cis_reference: raw.cis_reference,
            device_types: raw.device_types,
            risk: raw.risk,
            strategy: resolved.strategy,
            patterns: resolved.patterns,
            case_sensitive: raw.case_sensitive,
            scope: resolved.scope,
            aggregation: resolved.aggregation,
            evidence_pattern: raw.evidence_pattern,
            reference: raw.reference,
            target: raw.target,
            target_scope: raw.target_scope,
            remediation: raw.remediation,
            defect,
        }
    }
}

/// 이전 형식(`type` + `expect`)을 전략으로 변환합니다.
fn resolve_legacy(raw: &RawControl, kind: &str) -> Result<Resolved, String> {
    let kind = kind.trim().to_lowercase();
    let default_expect = if kind == "block_absent" { "absent" } else { "present" };
    let expect = raw
        .expect
        .as_deref()
        .unwrap_or(default_expect)
        .trim()
        .to_lowercase();
    let line_scoped = |strategy| Resolved {
        strategy,
        scope: None,
        aggregation: Aggregation::Any,
        patterns: raw.patterns.clone(),
    };
    let block_header = || -> Result<String, String> {
        match raw.block.as_deref().map(str::trim) {
            Some(block) if !block.is_empty() => Ok(format!("^{}", regex::escape(block))),
            _ => Err(format!("check type '{kind}' requires a block header")),
        }
    };
    let invalid_expect = || Err(format!("invalid expect value '{expect}' for check type '{kind}'"));

    match kind.as_str() {
        "manual" => Ok(line_scoped(MatchStrategy::ManualOnly)),
        "regex" | "regex_capture" | "regex_capture_all" => match expect.as_str() {
            "present" => Ok(line_scoped(MatchStrategy::LinePresence)),
            "absent" => Ok(line_scoped(MatchStrategy::LineAbsence)),
            "manual" => Ok(line_scoped(MatchStrategy::ManualOnly)),
            _ => invalid_expect(),
        },
        "banner" => {
            let banner = raw.banner_type.as_deref().unwrap_or("login").trim().to_lowercase();
            let strategy = match expect.as_str() {
                "present" => MatchStrategy::BlockScopedPresence,
                "absent" => MatchStrategy::BlockScopedAbsence,
                _ => return invalid_expect(),
            };
            Ok(Resolved {
                strategy,
                scope: Some(BlockScope::header(format!(r"^banner\s+{}\b", regex::escape(&banner)))),
                aggregation: Aggregation::Any,
                patterns: vec![r"\S".to_owned()],
            })
        }
        "block_present" => {
            let strategy = match expect.as_str() {
                "present" => MatchStrategy::BlockScopedPresence,
                "manual" => MatchStrategy::ManualOnly,
                _ => return invalid_expect(),
            };
            Ok(Resolved {
                strategy,
                scope: Some(BlockScope::header(block_header()?)),
                aggregation: Aggregation::All,
                patterns: raw.patterns.clone(),
            })
        }
        "block_absent" => {
            if expect != "absent" {
                return invalid_expect();
            }
            Ok(Resolved {
                strategy: MatchStrategy::BlockScopedAbsence,
                scope: Some(BlockScope {
                    missing_fails: true,
                    ..BlockScope::header(block_header()?)
                }),
                aggregation: Aggregation::Any,
                patterns: raw.patterns.clone(),
            })
        }
        other => Err(format!("unsupported check type '{other}'")),
    }
}

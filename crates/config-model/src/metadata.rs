//! 장비 메타데이터 추출 -- 소프트웨어 버전, 호스트명, 벤치마크 링크

use std::sync::LazyLock;

use confwarden_core::types::DeviceType;
use regex::Regex;
use serde::Serialize;

use crate::model::{ConfigLine, ConfigModel};

static VERSION_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*version\s+([0-9A-Za-z().]+)\s*$").ok());
static VERSION_ANYWHERE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bversion\s+([0-9A-Za-z().]+)").ok());
static SOFTWARE_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*[!#]?\s*(Cisco IOS Software.*)$").ok());
static HOSTNAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:hostname|host-name)\s+([^\s;]+)").ok());

/// CIS 벤치마크 목록 페이지 (장비 유형을 모를 때)
pub const CIS_BENCHMARKS_URL: &str = "https://www.cisecurity.org/cis-benchmarks";

/// 설정에서 추출한 장비 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceMetadata {
    /// `version 15.2` 형태의 소프트웨어 버전
    pub software_version: Option<String>,
    /// `Cisco IOS Software, ...` 배너 라인
    pub software_line: Option<String>,
    /// 호스트명
    pub hostname: Option<String>,
}

impl DeviceMetadata {
    /// 모델에서 메타데이터를 추출합니다.
    ///
    /// 설정 문장과 주석을 라인 순서대로 살펴 처음 일치한 값을 씁니다.
    pub fn extract(model: &ConfigModel) -> Self {
        let mut all: Vec<&ConfigLine> = model.statements();
        all.extend(model.comments());
        all.sort_by_key(|line| line.number);

        let software_version = first_capture(&all, &VERSION_LINE)
            .or_else(|| first_capture(&all, &VERSION_ANYWHERE));
        let software_line = first_capture(&all, &SOFTWARE_LINE);
        let hostname = first_capture(&model.top_level(), &HOSTNAME)
            .or_else(|| first_capture(&all, &HOSTNAME));

        Self {
            software_version,
            software_line,
            hostname,
        }
    }
}

/// 장비 유형에 맞는 CIS 벤치마크 페이지
pub fn cis_benchmark_url(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::Router => "https://www.cisecurity.org/benchmark/cisco_ios",
        DeviceType::Layer2Switch | DeviceType::Layer3Switch => {
            "https://www.cisecurity.org/benchmark/cisco"
        }
        DeviceType::Unknown => CIS_BENCHMARKS_URL,
    }
}

fn first_capture(lines: &[&ConfigLine], re: &LazyLock<Option<Regex>>) -> Option<String> {
    let re = re.as_ref()?;
    lines.iter().find_map(|line| {
        re.captures(&line.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
    })
}

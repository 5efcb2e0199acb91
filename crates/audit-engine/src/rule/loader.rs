//! 벤치마크 문서 로더 -- JSON/YAML 컨트롤 문서를 디스크에서 로드합니다.
//!
//! 디렉토리 내의 `.json`/`.yaml`/`.yml` 파일을 이름 순서로 스캔하고 파싱합니다.
//! 개별 파일 파싱 실패와 중복 컨트롤 ID는 경고 로그를 남기고 건너뜁니다.
//! 같은 ID라도 적용 장비 유형이 겹치지 않으면 중복이 아닙니다.

use std::collections::HashMap;
use std::path::Path;

use confwarden_core::metrics as m;
use confwarden_core::types::DeviceType;
use serde::Deserialize;
use serde_json::Value;

use super::types::{ControlDefinition, RuleDocument, devices_overlap};
use crate::error::AuditEngineError;

/// 문서 파일 최대 크기
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
/// 로드할 수 있는 최대 컨트롤 수
const MAX_RULES_COUNT: usize = 10_000;

/// 문서 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON
    Json,
    /// YAML
    Yaml,
}

impl DocumentFormat {
    /// 확장자로 형식을 판별합니다.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Controls(Vec<Value>),
    Wrapped(WrappedDocument),
}

#[derive(Deserialize)]
struct WrappedDocument {
    #[serde(default)]
    benchmark: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    device_types: Vec<DeviceType>,
    controls: Vec<Value>,
}

/// 벤치마크 문서 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 디렉토리에서 모든 벤치마크 문서를 로드합니다.
    ///
    /// 파일은 이름 순서로 처리되며, 앞선 문서의 컨트롤 ID가 우선합니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 컨트롤 수가 `MAX_RULES_COUNT`를 초과하는 경우
    pub async fn load_directory(
        dir: impl AsRef<Path>,
    ) -> Result<Vec<RuleDocument>, AuditEngineError> {
        let dir = dir.as_ref();

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AuditEngineError::RuleLoad {
                path: dir.display().to_string(),
                reason: format!("failed to read directory: {e}"),
            })?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AuditEngineError::RuleLoad {
                path: dir.display().to_string(),
                reason: format!("failed to read directory entry: {e}"),
            })?
        {
            let path = entry.path();
            if DocumentFormat::from_path(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut documents = Vec::new();
        let mut seen_ids: HashMap<String, Vec<Vec<DeviceType>>> = HashMap::new();
        let mut total = 0;

        for path in paths {
            let mut document = match Self::load_file(&path).await {
                Ok(document) => document,
                Err(e) => {
                    metrics::counter!(m::RULES_REJECTED_TOTAL).increment(1);
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load rule document, skipping"
                    );
                    continue;
                }
            };

            document.controls.retain(|control| {
                let scopes = seen_ids.entry(control.id.clone()).or_default();
                let duplicate = scopes
                    .iter()
                    .any(|devices| devices_overlap(devices, &control.device_types));
                if !duplicate {
                    scopes.push(control.device_types.clone());
                    true
                } else {
                    metrics::counter!(m::RULES_REJECTED_TOTAL).increment(1);
                    tracing::warn!(
                        control_id = %control.id,
                        path = %path.display(),
                        "duplicate control id, skipping"
                    );
                    false
                }
            });

            total += document.controls.len();
            if total > MAX_RULES_COUNT {
                return Err(AuditEngineError::RuleLoad {
                    path: dir.display().to_string(),
                    reason: format!("too many controls: max {MAX_RULES_COUNT}"),
                });
            }
            documents.push(document);
        }

        tracing::info!(
            dir = %dir.display(),
            documents = documents.len(),
            controls = total,
            "loaded benchmark documents"
        );

        Ok(documents)
    }

    /// 단일 문서 파일을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<RuleDocument, AuditEngineError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let format = DocumentFormat::from_path(path).ok_or_else(|| AuditEngineError::RuleLoad {
            path: source.clone(),
            reason: "unsupported file extension (expected .json, .yaml or .yml)".to_owned(),
        })?;

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AuditEngineError::RuleLoad {
                path: source.clone(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(AuditEngineError::RuleLoad {
                path: source,
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuditEngineError::RuleLoad {
                path: source.clone(),
                reason: format!("failed to read file: {e}"),
            })?;

        match format {
            DocumentFormat::Json => Self::parse_json(&content, &source),
            DocumentFormat::Yaml => Self::parse_yaml(&content, &source),
        }
    }

    /// JSON 문자열에서 문서를 파싱합니다.
    pub fn parse_json(json_str: &str, source: &str) -> Result<RuleDocument, AuditEngineError> {
        let raw: RawDocument =
            serde_json::from_str(json_str).map_err(|e| AuditEngineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("JSON parse error: {e}"),
            })?;
        Ok(Self::build_document(raw, source))
    }

    /// YAML 문자열에서 문서를 파싱합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<RuleDocument, AuditEngineError> {
        let raw: RawDocument =
            serde_yaml::from_str(yaml_str).map_err(|e| AuditEngineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;
        Ok(Self::build_document(raw, source))
    }

    fn build_document(raw: RawDocument, source: &str) -> RuleDocument {
        let (benchmark, version, device_types, entries) = match raw {
            RawDocument::Controls(entries) => (None, None, Vec::new(), entries),
            RawDocument::Wrapped(doc) => (doc.benchmark, doc.version, doc.device_types, doc.controls),
        };

        let mut controls = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let Some(mut control) = Self::build_control(entry, source, index) else {
                continue;
            };
            if control.device_types.is_empty() {
                control.device_types = device_types.clone();
            }
            controls.push(control);
        }

        RuleDocument {
            source: source.to_owned(),
            benchmark,
            version,
            device_types,
            controls,
        }
    }

    /// 항목 하나를 컨트롤로 변환합니다. ID가 없으면 거부합니다.
    fn build_control(mut entry: Value, source: &str, index: usize) -> Option<ControlDefinition> {
        let id = entry
            .get("id")
            .and_then(|id| match id {
                Value::String(s) => Some(s.trim().to_owned()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|id| !id.is_empty());

        let Some(id) = id else {
            metrics::counter!(m::RULES_REJECTED_TOTAL).increment(1);
            tracing::warn!(source, index, "control entry without id, skipping");
            return None;
        };

        if let Some(fields) = entry.as_object_mut() {
            fields.insert("id".to_owned(), Value::String(id.clone()));
        }

        match serde_json::from_value::<ControlDefinition>(entry) {
            Ok(control) => Some(control),
            Err(e) => {
                tracing::warn!(
                    source,
                    control_id = %id,
                    error = %e,
                    "malformed control definition kept for error reporting"
                );
                Some(ControlDefinition::defective(id, e.to_string()))
            }
        }
    }
}

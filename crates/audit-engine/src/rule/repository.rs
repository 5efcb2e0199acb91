//! 룰 저장소 -- 불변 컨트롤 스냅샷
//!
//! [`RuleRepository`]는 로드된 컨트롤을 자연 ID 순서로 보관하는 불변 스냅샷입니다.
//! 복제 비용이 `Arc` 하나이므로 감사 실행마다 넘겨주고, 실행 간에 공유해도 안전합니다.
//! 컨트롤을 바꾸려면 새 스냅샷을 만듭니다.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use confwarden_core::metrics as m;
use confwarden_core::types::DeviceType;

use super::loader::RuleLoader;
use super::types::{ControlDefinition, RuleDocument, control_id_cmp};
use crate::error::AuditEngineError;

#[derive(Debug)]
struct Snapshot {
    version: String,
    controls: Vec<Arc<ControlDefinition>>,
    fallback: Option<DeviceType>,
}

/// 버전이 붙은 불변 컨트롤 스냅샷
#[derive(Debug, Clone)]
pub struct RuleRepository {
    inner: Arc<Snapshot>,
}

impl RuleRepository {
    /// 컨트롤 목록으로 스냅샷을 만듭니다.
    ///
    /// 같은 ID에 적용 장비가 겹치는 컨트롤이 여러 개면 처음 것만 남깁니다.
    pub fn new(controls: Vec<ControlDefinition>, version: impl Into<String>) -> Self {
        let mut seen: HashMap<String, Vec<Arc<ControlDefinition>>> = HashMap::new();
        let mut kept = Vec::with_capacity(controls.len());
        for control in controls {
            let same_id = seen.entry(control.id.clone()).or_default();
            if same_id.iter().any(|other| other.shares_devices(&control)) {
                tracing::warn!(control_id = %control.id, "duplicate control id, skipping");
                continue;
            }
            let control = Arc::new(control);
            same_id.push(Arc::clone(&control));
            kept.push(control);
        }
        let mut controls = kept;
        controls.sort_by(|a, b| control_id_cmp(&a.id, &b.id));

        metrics::gauge!(m::RULES_LOADED).set(controls.len() as f64);

        Self {
            inner: Arc::new(Snapshot {
                version: version.into(),
                controls,
                fallback: None,
            }),
        }
    }

    /// 빈 저장소
    pub fn empty() -> Self {
        Self::new(Vec::new(), "empty")
    }

    /// 문서 목록으로 스냅샷을 만듭니다.
    ///
    /// 버전 문자열은 문서의 `benchmark`/`version` 필드로 구성합니다.
    pub fn from_documents(documents: Vec<RuleDocument>) -> Self {
        let labels: Vec<String> = documents
            .iter()
            .filter_map(|doc| match (&doc.benchmark, &doc.version) {
                (Some(name), Some(version)) => Some(format!("{name} {version}")),
                (Some(name), None) => Some(name.clone()),
                (None, Some(version)) => Some(format!("{} {version}", doc.source)),
                (None, None) => None,
            })
            .collect();
        let controls: Vec<ControlDefinition> =
            documents.into_iter().flat_map(|doc| doc.controls).collect();
        let version = if labels.is_empty() {
            format!("unversioned ({} controls)", controls.len())
        } else {
            labels.join("; ")
        };
        Self::new(controls, version)
    }

    /// 디렉토리에서 문서를 로드해 스냅샷을 만듭니다.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self, AuditEngineError> {
        let documents = RuleLoader::load_directory(dir).await?;
        Ok(Self::from_documents(documents))
    }

    /// 장비 유형을 판별하지 못했을 때 추가로 적용할 세트를 지정합니다.
    pub fn with_fallback(self, fallback: Option<DeviceType>) -> Self {
        Self {
            inner: Arc::new(Snapshot {
                version: self.inner.version.clone(),
                controls: self.inner.controls.clone(),
                fallback: fallback.filter(|d| *d != DeviceType::Unknown),
            }),
        }
    }

    /// 스냅샷 버전
    pub fn version(&self) -> &str {
        &self.inner.version
    }

    /// Unknown 장비용 폴백 장비 유형
    pub fn fallback(&self) -> Option<DeviceType> {
        self.inner.fallback
    }

    /// 컨트롤 수
    pub fn len(&self) -> usize {
        self.inner.controls.len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.inner.controls.is_empty()
    }

    /// 모든 컨트롤 (자연 ID 순서)
    pub fn controls(&self) -> &[Arc<ControlDefinition>] {
        &self.inner.controls
    }

    /// ID로 컨트롤을 조회합니다. 장비별로 같은 ID가 있으면 정렬상 첫 번째입니다.
    pub fn get(&self, id: &str) -> Option<&Arc<ControlDefinition>> {
        self.inner.controls.iter().find(|c| c.id == id)
    }

    /// 장비 유형에 적용할 컨트롤 (자연 ID 순서)
    ///
    /// Unknown 장비에는 장비 제한이 없는 컨트롤과, 폴백이 지정되어 있으면 폴백 장비의 컨트롤을 적용합니다.
    pub fn controls_for(&self, device: DeviceType) -> Vec<Arc<ControlDefinition>> {
        let fallback = match device {
            DeviceType::Unknown => self.inner.fallback,
            _ => None,
        };
        self.inner
            .controls
            .iter()
            .filter(|c| c.applies_to(device) || fallback.is_some_and(|f| c.applies_to(f)))
            .cloned()
            .collect()
    }
}

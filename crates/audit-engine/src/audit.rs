//! 감사 실행 오케스트레이터
//!
//! [`AuditRunner`]는 원시 설정 텍스트 하나를 받아 모델 생성, 장비 분류, 컨트롤 선택,
//! 컨트롤별 평가와 판정을 거쳐 [`AuditResult`]를 만듭니다.
//!
//! # 동시성
//! 컨트롤 평가는 서로 독립이므로 `JoinSet` + `Semaphore`로 최대 `parallelism`개까지 동시에
//! 실행합니다. 결과는 컨트롤 순서대로 미리 만든 슬롯에 기록되므로, 병렬도와 무관하게
//! finding 순서는 [`RuleRepository::controls_for`] 순서와 같습니다.
//!
//! # 취소
//! [`RunOptions::cancel`] 토큰이 취소되면 새 평가를 시작하지 않습니다. 이미 시작된 평가는
//! 끝까지 진행되고, 결과는 [`RunStatus::Incomplete`]로 표시됩니다. 취소는 에러가 아닙니다.
//! 평가 태스크가 비정상 종료되면 해당 컨트롤은 [`EvaluationError`]로 기록되며 취소로 보지 않습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use confwarden_config_model::{
    Classification, ConfigModel, ConfigModelBuilder, DeviceClassifier, DeviceMetadata, Dialect,
    Scores, cis_benchmark_url,
};
use confwarden_core::metrics as m;
use confwarden_core::types::{DeviceType, RiskLevel, Verdict};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AuditConfig;
use crate::error::AuditEngineError;
use crate::matcher::RuleMatcher;
use crate::rule::repository::RuleRepository;
use crate::rule::types::ControlDefinition;
use crate::verdict::{Finding, classify};

// ─── 실행 옵션 ─────────────────────────────────────────────────────

/// 실행별 옵션
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 분류 결과 대신 사용할 장비 유형
    pub device_override: Option<DeviceType>,
    /// 취소 토큰
    pub cancel: CancellationToken,
}

impl RunOptions {
    /// 기본 옵션
    pub fn new() -> Self {
        Self::default()
    }

    /// 장비 유형을 지정합니다.
    pub fn device_override(mut self, device: Option<DeviceType>) -> Self {
        self.device_override = device;
        self
    }

    /// 취소 토큰을 지정합니다.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

// ─── 결과 타입 ─────────────────────────────────────────────────────

/// 평가하지 못한 컨트롤
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationError {
    /// 컨트롤 ID
    pub control_id: String,
    /// 제목
    pub title: String,
    /// 사유
    pub reason: String,
}

/// 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    /// 모든 컨트롤을 평가함
    Complete,
    /// 취소로 일부 컨트롤을 건너뜀
    Incomplete {
        /// 평가된 컨트롤 수 (정의 오류 포함)
        evaluated: usize,
        /// 건너뛴 컨트롤 수
        skipped: usize,
    },
}

/// 결과 해석 시 주의할 점
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caveat {
    /// 분류 지표가 충돌하거나 없음
    ClassificationAmbiguous {
        /// 분류 점수
        scores: Scores,
    },
    /// 호출자가 장비 유형을 지정함
    DeviceTypeOverridden {
        /// 분류기가 추정한 유형
        detected: DeviceType,
    },
    /// Unknown 장비에 폴백 컨트롤 세트를 적용함
    FallbackRuleSet {
        /// 폴백 장비 유형
        device_type: DeviceType,
    },
    /// 적용할 컨트롤이 없음
    NoApplicableControls,
}

impl fmt::Display for Caveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassificationAmbiguous { scores } => write!(
                f,
                "device type could not be determined (router={}, switch={}, l3={})",
                scores.router, scores.switch, scores.l3
            ),
            Self::DeviceTypeOverridden { detected } => {
                write!(f, "device type overridden (detected: {detected})")
            }
            Self::FallbackRuleSet { device_type } => {
                write!(f, "{device_type} controls applied as fallback")
            }
            Self::NoApplicableControls => write!(f, "no controls apply to this device"),
        }
    }
}

/// 판정별 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    /// PASS
    pub pass: usize,
    /// FAIL
    pub fail: usize,
    /// MANUAL
    pub manual: usize,
}

impl VerdictCounts {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Pass => self.pass += 1,
            Verdict::Fail => self.fail += 1,
            Verdict::Manual => self.manual += 1,
        }
    }
}

/// 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditSummary {
    /// finding 수
    pub total: usize,
    /// PASS 수
    pub pass: usize,
    /// FAIL 수
    pub fail: usize,
    /// MANUAL 수
    pub manual: usize,
    /// 정의 오류 수
    pub errors: usize,
    /// 위험도별 판정 수
    pub by_risk: BTreeMap<RiskLevel, VerdictCounts>,
}

impl AuditSummary {
    /// finding과 오류 수로 요약을 만듭니다.
    pub fn from_findings(findings: &[Finding], errors: usize) -> Self {
        let mut totals = VerdictCounts::default();
        let mut by_risk: BTreeMap<RiskLevel, VerdictCounts> = BTreeMap::new();
        for finding in findings {
            totals.record(finding.verdict);
            by_risk.entry(finding.risk).or_default().record(finding.verdict);
        }
        Self {
            total: findings.len(),
            pass: totals.pass,
            fail: totals.fail,
            manual: totals.manual,
            errors,
            by_risk,
        }
    }

    /// 준수율 (PASS / (PASS + FAIL) * 100). 자동 판정된 컨트롤이 없으면 `None`.
    pub fn compliance_score(&self) -> Option<f64> {
        let decided = self.pass + self.fail;
        (decided > 0).then(|| self.pass as f64 / decided as f64 * 100.0)
    }
}

/// 감사 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct AuditResult {
    /// 실행 ID (UUID v4)
    pub run_id: String,
    /// 시작 시각
    pub started_at: DateTime<Utc>,
    /// 종료 시각
    pub finished_at: DateTime<Utc>,
    /// 적용된 장비 유형
    pub device_type: DeviceType,
    /// 분류기 결과
    pub classification: Classification,
    /// 설정 방언
    pub dialect: Dialect,
    /// 장비 메타데이터
    pub metadata: DeviceMetadata,
    /// 장비 유형별 CIS 벤치마크 페이지
    pub benchmark_url: String,
    /// 컨트롤 스냅샷 버전
    pub rule_set_version: String,
    /// finding (컨트롤 순서)
    pub findings: Vec<Finding>,
    /// 정의 오류로 평가하지 못한 컨트롤
    pub errors: Vec<EvaluationError>,
    /// 요약
    pub summary: AuditSummary,
    /// 실행 상태
    pub status: RunStatus,
    /// 주의 사항
    pub caveats: Vec<Caveat>,
}

impl AuditResult {
    /// 모든 컨트롤을 평가했는지 여부
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// FAIL finding 중 가장 높은 위험도
    pub fn highest_failed_risk(&self) -> Option<RiskLevel> {
        self.findings
            .iter()
            .filter(|f| f.verdict == Verdict::Fail)
            .map(|f| f.risk)
            .max()
    }

    /// ID로 finding을 찾습니다.
    pub fn finding(&self, control_id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.control_id == control_id)
    }
}

// ─── 러너 ──────────────────────────────────────────────────────────

/// 컨트롤 하나의 평가 결과
#[derive(Debug)]
enum Outcome {
    Finding(Finding),
    Error(EvaluationError),
}

fn evaluate_control(matcher: &RuleMatcher, control: &ControlDefinition, model: &ConfigModel) -> Outcome {
    match matcher.evaluate(control, model) {
        Ok(result) => Outcome::Finding(classify(control, &result)),
        Err(e) => {
            warn!(control_id = %control.id, error = %e, "control skipped: malformed definition");
            Outcome::Error(EvaluationError {
                control_id: control.id.clone(),
                title: control.title.clone(),
                reason: e.reason,
            })
        }
    }
}

/// 디스패치됐지만 결과가 없는 슬롯을 평가 오류로 채웁니다.
///
/// 디스패치는 컨트롤 순서대로 진행되므로 `dispatched` 이후의 빈 슬롯만 취소로 건너뛴 것입니다.
fn record_task_failures(
    controls: &[Arc<ControlDefinition>],
    slots: &mut [Option<Outcome>],
    dispatched: usize,
) {
    for (control, slot) in controls.iter().zip(slots.iter_mut()).take(dispatched) {
        if slot.is_none() {
            *slot = Some(Outcome::Error(EvaluationError {
                control_id: control.id.clone(),
                title: control.title.clone(),
                reason: "evaluation task failed".to_owned(),
            }));
        }
    }
}

/// 평가 전 단계의 산출물
struct Prepared {
    started_at: DateTime<Utc>,
    started: Instant,
    model: Arc<ConfigModel>,
    classification: Classification,
    device_type: DeviceType,
    controls: Vec<Arc<ControlDefinition>>,
    caveats: Vec<Caveat>,
}

/// 감사 실행기
///
/// 실행 간 상태를 갖지 않으므로 여러 실행을 동시에 돌려도 됩니다.
#[derive(Debug, Clone)]
pub struct AuditRunner {
    config: AuditConfig,
    repository: RuleRepository,
    model_builder: ConfigModelBuilder,
    classifier: DeviceClassifier,
    matcher: RuleMatcher,
}

impl AuditRunner {
    /// 빌더를 생성합니다.
    pub fn builder() -> AuditRunnerBuilder {
        AuditRunnerBuilder::new()
    }

    /// 엔진 설정
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// 컨트롤 저장소
    pub fn repository(&self) -> &RuleRepository {
        &self.repository
    }

    /// 설정 텍스트를 감사합니다.
    ///
    /// 컨트롤은 최대 `parallelism`개까지 동시에 평가됩니다.
    ///
    /// # Errors
    /// 설정을 파싱할 수 없거나 옵션이 잘못되었으면 평가 전에 에러를 반환합니다.
    pub async fn run(&self, raw: &str, options: RunOptions) -> Result<AuditResult, AuditEngineError> {
        let prepared = self.prepare(raw, &options)?;
        let total = prepared.controls.len();
        let mut slots: Vec<Option<Outcome>> = (0..total).map(|_| None).collect();

        let semaphore = Arc::new(Semaphore::new(self.config.parallelism));
        let mut tasks = JoinSet::new();
        let mut dispatched = 0usize;

        for (idx, control) in prepared.controls.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = options.cancel.cancelled() => {
                    info!(dispatched = idx, total, "audit cancelled, no further controls dispatched");
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let control = Arc::clone(control);
            let model = Arc::clone(&prepared.model);
            let matcher = self.matcher;
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (idx, evaluate_control(&matcher, &control, &model))
            });
            dispatched += 1;
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    if let Some(slot) = slots.get_mut(idx) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => {
                    metrics::counter!(m::AUDIT_TASK_FAILURES_TOTAL).increment(1);
                    warn!(error = %e, "evaluation task failed");
                }
            }
        }
        record_task_failures(&prepared.controls, &mut slots, dispatched);

        Ok(self.finish(prepared, slots))
    }

    /// 설정 텍스트를 현재 스레드에서 순차적으로 감사합니다.
    ///
    /// 결과는 [`run`](Self::run)과 같습니다.
    pub fn run_blocking(&self, raw: &str, options: RunOptions) -> Result<AuditResult, AuditEngineError> {
        let prepared = self.prepare(raw, &options)?;
        let mut slots: Vec<Option<Outcome>> = Vec::with_capacity(prepared.controls.len());

        for control in &prepared.controls {
            if options.cancel.is_cancelled() {
                info!(
                    dispatched = slots.len(),
                    total = prepared.controls.len(),
                    "audit cancelled, no further controls evaluated"
                );
                break;
            }
            slots.push(Some(evaluate_control(&self.matcher, control, &prepared.model)));
        }
        slots.resize_with(prepared.controls.len(), || None);

        Ok(self.finish(prepared, slots))
    }

    fn prepare(&self, raw: &str, options: &RunOptions) -> Result<Prepared, AuditEngineError> {
        if options.device_override == Some(DeviceType::Unknown) {
            return Err(AuditEngineError::InvalidOption(
                "device type override must be a known device type".to_owned(),
            ));
        }

        let started_at = Utc::now();
        let started = Instant::now();

        let model = self.model_builder.build(raw)?;
        let classification = self.classifier.classify(&model);
        let detected = classification.device_type;

        let mut caveats = Vec::new();
        let device_type = match options.device_override {
            Some(device) => {
                if device != detected {
                    caveats.push(Caveat::DeviceTypeOverridden { detected });
                }
                device
            }
            None => {
                if classification.is_ambiguous() {
                    caveats.push(Caveat::ClassificationAmbiguous {
                        scores: classification.scores,
                    });
                }
                detected
            }
        };

        if device_type == DeviceType::Unknown {
            if let Some(fallback) = self.repository.fallback() {
                caveats.push(Caveat::FallbackRuleSet {
                    device_type: fallback,
                });
            }
        }

        let controls = self.repository.controls_for(device_type);
        if controls.is_empty() {
            caveats.push(Caveat::NoApplicableControls);
        }

        debug!(
            device_type = device_type.as_str(),
            detected = detected.as_str(),
            dialect = model.dialect().as_str(),
            controls = controls.len(),
            "audit prepared"
        );

        Ok(Prepared {
            started_at,
            started,
            model: Arc::new(model),
            classification,
            device_type,
            controls,
            caveats,
        })
    }

    fn finish(&self, prepared: Prepared, slots: Vec<Option<Outcome>>) -> AuditResult {
        let mut findings = Vec::new();
        let mut errors = Vec::new();
        let mut skipped = 0usize;

        for (control, slot) in prepared.controls.iter().zip(slots) {
            match slot {
                Some(Outcome::Finding(finding)) => {
                    metrics::counter!(
                        m::AUDIT_CONTROLS_EVALUATED_TOTAL,
                        m::LABEL_STRATEGY => control.strategy.as_str()
                    )
                    .increment(1);
                    metrics::counter!(m::AUDIT_FINDINGS_TOTAL, m::LABEL_VERDICT => finding.verdict.as_label())
                        .increment(1);
                    findings.push(finding);
                }
                Some(Outcome::Error(error)) => {
                    metrics::counter!(m::AUDIT_RULE_ERRORS_TOTAL).increment(1);
                    errors.push(error);
                }
                None => skipped += 1,
            }
        }

        let status = if skipped == 0 {
            RunStatus::Complete
        } else {
            metrics::counter!(m::AUDIT_RUNS_CANCELLED_TOTAL).increment(1);
            RunStatus::Incomplete {
                evaluated: findings.len() + errors.len(),
                skipped,
            }
        };

        let summary = AuditSummary::from_findings(&findings, errors.len());
        let device_label = prepared.device_type.as_str();
        metrics::counter!(m::AUDIT_RUNS_TOTAL, m::LABEL_DEVICE_TYPE => device_label).increment(1);
        metrics::histogram!(m::AUDIT_DURATION_SECONDS)
            .record(prepared.started.elapsed().as_secs_f64());

        let run_id = uuid::Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            device_type = device_label,
            pass = summary.pass,
            fail = summary.fail,
            manual = summary.manual,
            errors = summary.errors,
            complete = skipped == 0,
            "audit finished"
        );

        let metadata = DeviceMetadata::extract(&prepared.model);
        AuditResult {
            run_id,
            started_at: prepared.started_at,
            finished_at: Utc::now(),
            device_type: prepared.device_type,
            benchmark_url: cis_benchmark_url(prepared.device_type).to_owned(),
            classification: prepared.classification,
            dialect: prepared.model.dialect(),
            metadata,
            rule_set_version: self.repository.version().to_owned(),
            findings,
            errors,
            summary,
            status,
            caveats: prepared.caveats,
        }
    }
}

/// 감사 실행기 빌더
#[derive(Debug, Default)]
pub struct AuditRunnerBuilder {
    config: AuditConfig,
    repository: Option<RuleRepository>,
}

impl AuditRunnerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// 컨트롤 저장소를 지정합니다.
    pub fn repository(mut self, repository: RuleRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// 설정을 검증하고 실행기를 생성합니다.
    ///
    /// # Errors
    /// 설정이 잘못되었거나 저장소가 없으면 `Config` 에러를 반환합니다.
    pub fn build(self) -> Result<AuditRunner, AuditEngineError> {
        self.config.validate()?;
        let repository = self.repository.ok_or_else(|| AuditEngineError::Config {
            field: "repository".to_owned(),
            reason: "a rule repository is required".to_owned(),
        })?;
        let repository = match self.config.unknown_device_fallback {
            Some(fallback) => repository.with_fallback(Some(fallback)),
            None => repository,
        };

        let model_builder = ConfigModelBuilder::new()
            .max_size(self.config.max_config_size)
            .max_depth(self.config.max_nesting_depth)
            .dialect(self.config.dialect);

        Ok(AuditRunner {
            matcher: RuleMatcher::new(self.config.evidence_limit),
            config: self.config,
            repository,
            model_builder,
            classifier: DeviceClassifier::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::types::MatchStrategy;

    const ROUTER: &str = "\
hostname r1
service password-encryption
interface Serial0/0/0
 ip address 192.0.2.1 255.255.255.252
router bgp 65000
 neighbor 192.0.2.2 remote-as 65001
ip nat inside source list 1 interface Serial0/0/0 overload
";

    fn control(id: &str, strategy: MatchStrategy, patterns: &[&str], risk: RiskLevel) -> ControlDefinition {
        ControlDefinition {
            title: format!("control {id}"),
            risk,
            patterns: patterns.iter().map(|p| (*p).to_owned()).collect(),
            ..ControlDefinition::new(id, strategy)
        }
    }

    fn runner(controls: Vec<ControlDefinition>) -> AuditRunner {
        AuditRunner::builder()
            .repository(RuleRepository::new(controls, "test"))
            .build()
            .unwrap()
    }

    fn default_controls() -> Vec<ControlDefinition> {
        vec![
            control("1.10", MatchStrategy::LineAbsence, &["^ip http server"], RiskLevel::High),
            control("1.2", MatchStrategy::LinePresence, &["^service password-encryption"], RiskLevel::Medium),
            control("1.3", MatchStrategy::LinePresence, &["^aaa new-model"], RiskLevel::Critical),
            control("1.4", MatchStrategy::ManualOnly, &[], RiskLevel::Low),
            control("1.5", MatchStrategy::LinePresence, &[], RiskLevel::Low),
        ]
    }

    #[test]
    fn builder_requires_repository() {
        assert!(AuditRunner::builder().build().is_err());
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let config = AuditConfig {
            parallelism: 0,
            ..AuditConfig::default()
        };
        assert!(
            AuditRunner::builder()
                .config(config)
                .repository(RuleRepository::empty())
                .build()
                .is_err()
        );
    }

    #[test]
    fn run_blocking_produces_ordered_findings() {
        let result = runner(default_controls())
            .run_blocking(ROUTER, RunOptions::new())
            .unwrap();

        assert_eq!(result.device_type, DeviceType::Router);
        let ids: Vec<&str> = result.findings.iter().map(|f| f.control_id.as_str()).collect();
        assert_eq!(ids, vec!["1.2", "1.3", "1.4", "1.10"]);
        assert_eq!(result.finding("1.2").unwrap().verdict, Verdict::Pass);
        assert_eq!(result.finding("1.3").unwrap().verdict, Verdict::Fail);
        assert_eq!(result.finding("1.4").unwrap().verdict, Verdict::Manual);
        assert_eq!(result.finding("1.10").unwrap().verdict, Verdict::Pass);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].control_id, "1.5");
        assert!(result.is_complete());
        assert_eq!(result.summary.errors, 1);
        assert_eq!(result.highest_failed_risk(), Some(RiskLevel::Critical));
        assert_eq!(result.rule_set_version, "test");
    }

    #[tokio::test]
    async fn parallel_run_matches_sequential() {
        let runner = runner(default_controls());
        let sequential = runner.run_blocking(ROUTER, RunOptions::new()).unwrap();
        let parallel = runner.run(ROUTER, RunOptions::new()).await.unwrap();
        assert_eq!(sequential.findings, parallel.findings);
        assert_eq!(sequential.errors, parallel.errors);
        assert_eq!(sequential.summary, parallel.summary);
        assert_ne!(sequential.run_id, parallel.run_id);
    }

    #[tokio::test]
    async fn cancelled_run_is_incomplete() {
        let token = CancellationToken::new();
        token.cancel();
        let result = runner(default_controls())
            .run(ROUTER, RunOptions::new().cancel_token(token))
            .await
            .unwrap();
        assert!(result.findings.is_empty());
        assert_eq!(
            result.status,
            RunStatus::Incomplete {
                evaluated: 0,
                skipped: 5
            }
        );
        assert!(!result.is_complete());
    }

    #[test]
    fn failed_task_is_recorded_as_error_not_skip() {
        // Given: 두 컨트롤이 디스패치됐지만 두 번째 태스크는 결과 없이 끝남
        let runner = runner(default_controls());
        let prepared = runner.prepare(ROUTER, &RunOptions::new()).unwrap();
        let first = evaluate_control(&runner.matcher, &prepared.controls[0], &prepared.model);
        let mut slots = vec![Some(first), None, None, None, None];

        // When
        record_task_failures(&prepared.controls, &mut slots, 2);
        let result = runner.finish(prepared, slots);

        // Then: 실패한 태스크는 평가 오류, 디스패치 전 컨트롤만 건너뜀
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].control_id, "1.3");
        assert_eq!(result.errors[0].reason, "evaluation task failed");
        assert_eq!(
            result.status,
            RunStatus::Incomplete {
                evaluated: 2,
                skipped: 3
            }
        );
    }

    #[test]
    fn failed_task_alone_keeps_run_complete() {
        let runner = runner(default_controls());
        let prepared = runner.prepare(ROUTER, &RunOptions::new()).unwrap();
        let mut slots: Vec<Option<Outcome>> = prepared
            .controls
            .iter()
            .map(|c| Some(evaluate_control(&runner.matcher, c, &prepared.model)))
            .collect();
        slots[2] = None;

        record_task_failures(&prepared.controls, &mut slots, 5);
        let result = runner.finish(prepared, slots);

        assert!(result.is_complete());
        assert!(result.errors.iter().any(|e| e.control_id == "1.4"));
        assert_eq!(result.summary.errors, 2);
    }

    #[test]
    fn parse_failure_is_error() {
        let err = runner(default_controls())
            .run_blocking("   \n", RunOptions::new())
            .unwrap_err();
        assert!(matches!(err, AuditEngineError::Parse(_)));
    }

    #[test]
    fn unknown_override_is_rejected() {
        let err = runner(default_controls())
            .run_blocking(ROUTER, RunOptions::new().device_override(Some(DeviceType::Unknown)))
            .unwrap_err();
        assert!(matches!(err, AuditEngineError::InvalidOption(_)));
    }

    #[test]
    fn override_records_caveat() {
        let result = runner(default_controls())
            .run_blocking(
                ROUTER,
                RunOptions::new().device_override(Some(DeviceType::Layer2Switch)),
            )
            .unwrap();
        assert_eq!(result.device_type, DeviceType::Layer2Switch);
        assert_eq!(
            result.caveats,
            vec![Caveat::DeviceTypeOverridden {
                detected: DeviceType::Router
            }]
        );
    }

    #[test]
    fn no_applicable_controls() {
        let mut only_switch = control("9.1", MatchStrategy::ManualOnly, &[], RiskLevel::Low);
        only_switch.device_types = vec![DeviceType::Layer2Switch];
        let result = runner(vec![only_switch]).run_blocking(ROUTER, RunOptions::new()).unwrap();
        assert!(result.findings.is_empty());
        assert!(result.caveats.contains(&Caveat::NoApplicableControls));
        assert!(result.is_complete());
    }

    #[test]
    fn summary_and_score() {
        let result = runner(default_controls()).run_blocking(ROUTER, RunOptions::new()).unwrap();
        let summary = &result.summary;
        assert_eq!((summary.total, summary.pass, summary.fail, summary.manual), (4, 2, 1, 1));
        assert_eq!(summary.by_risk[&RiskLevel::Critical].fail, 1);
        let score = summary.compliance_score().unwrap();
        assert!((score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(AuditSummary::default().compliance_score(), None);
    }

    #[test]
    fn caveat_display() {
        let caveat = Caveat::FallbackRuleSet {
            device_type: DeviceType::Layer2Switch,
        };
        assert_eq!(caveat.to_string(), "Layer-2 Switch controls applied as fallback");
    }
}

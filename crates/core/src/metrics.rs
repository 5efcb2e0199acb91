//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 레코더(익스포터) 설치는
//! 임베딩 애플리케이션의 몫이며, 레코더가 없으면 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `confwarden_`
//! - 영역: `model_`, `classifier_`, `rules_`, `audit_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(confwarden_core::metrics::AUDIT_RUNS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 판정 레이블 키 (pass, fail, manual)
pub const LABEL_VERDICT: &str = "verdict";

/// 장비 유형 레이블 키 (router, layer2_switch, layer3_switch, unknown)
pub const LABEL_DEVICE_TYPE: &str = "device_type";

/// 설정 방언 레이블 키 (ios, braced)
pub const LABEL_DIALECT: &str = "dialect";

/// 매칭 전략 레이블 키
pub const LABEL_STRATEGY: &str = "strategy";

// ─── Config Model 메트릭 ───────────────────────────────────────────

/// Model: 파싱된 설정 라인 수 (counter)
pub const MODEL_LINES_PARSED_TOTAL: &str = "confwarden_model_lines_parsed_total";

/// Model: 파싱 실패 수 (counter)
pub const MODEL_PARSE_FAILURES_TOTAL: &str = "confwarden_model_parse_failures_total";

/// Model: 파싱 소요 시간 (histogram, 초, label: dialect)
pub const MODEL_PARSE_DURATION_SECONDS: &str = "confwarden_model_parse_duration_seconds";

// ─── Classifier 메트릭 ─────────────────────────────────────────────

/// Classifier: 장비 유형별 분류 수 (counter, label: device_type)
pub const CLASSIFIER_DECISIONS_TOTAL: &str = "confwarden_classifier_decisions_total";

// ─── Rule Repository 메트릭 ────────────────────────────────────────

/// Rules: 로드된 컨트롤 수 (gauge)
pub const RULES_LOADED: &str = "confwarden_rules_loaded";

/// Rules: 로딩 중 거부된 항목 수 (counter)
pub const RULES_REJECTED_TOTAL: &str = "confwarden_rules_rejected_total";

// ─── Audit 메트릭 ──────────────────────────────────────────────────

/// Audit: 시작된 감사 실행 수 (counter)
pub const AUDIT_RUNS_TOTAL: &str = "confwarden_audit_runs_total";

/// Audit: 취소되어 부분 결과로 끝난 실행 수 (counter)
pub const AUDIT_RUNS_CANCELLED_TOTAL: &str = "confwarden_audit_runs_cancelled_total";

/// Audit: 평가된 컨트롤 수 (counter, label: strategy)
pub const AUDIT_CONTROLS_EVALUATED_TOTAL: &str = "confwarden_audit_controls_evaluated_total";

/// Audit: 판정별 finding 수 (counter, label: verdict)
pub const AUDIT_FINDINGS_TOTAL: &str = "confwarden_audit_findings_total";

/// Audit: 잘못된 컨트롤 정의로 평가 실패한 수 (counter)
pub const AUDIT_RULE_ERRORS_TOTAL: &str = "confwarden_audit_rule_errors_total";

/// Audit: 평가 태스크가 비정상 종료된 수 (counter)
pub const AUDIT_TASK_FAILURES_TOTAL: &str = "confwarden_audit_task_failures_total";

/// Audit: 감사 1회 소요 시간 (histogram, 초)
pub const AUDIT_DURATION_SECONDS: &str = "confwarden_audit_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 파싱 소요 시간 히스토그램 버킷 (초)
///
/// 10us ~ 1s 범위
pub const PARSE_DURATION_BUCKETS: [f64; 9] = [
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.1, 1.0,
];

/// 감사 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 30s 범위
pub const AUDIT_DURATION_BUCKETS: [f64; 9] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Config Model
    describe_counter!(
        MODEL_LINES_PARSED_TOTAL,
        "Total number of configuration lines attached to a model"
    );
    describe_counter!(
        MODEL_PARSE_FAILURES_TOTAL,
        "Total number of configuration texts rejected by the model builder"
    );
    describe_histogram!(
        MODEL_PARSE_DURATION_SECONDS,
        "Time to build a configuration model in seconds"
    );

    // Classifier
    describe_counter!(
        CLASSIFIER_DECISIONS_TOTAL,
        "Device classifications per resulting device type"
    );

    // Rules
    describe_gauge!(RULES_LOADED, "Number of controls in the loaded rule set");
    describe_counter!(
        RULES_REJECTED_TOTAL,
        "Rule documents or entries skipped while loading"
    );

    // Audit
    describe_counter!(AUDIT_RUNS_TOTAL, "Total number of audit runs started");
    describe_counter!(
        AUDIT_RUNS_CANCELLED_TOTAL,
        "Audit runs that ended early with an incomplete result"
    );
    describe_counter!(
        AUDIT_CONTROLS_EVALUATED_TOTAL,
        "Controls evaluated per matching strategy"
    );
    describe_counter!(AUDIT_FINDINGS_TOTAL, "Findings produced per verdict");
    describe_counter!(
        AUDIT_RULE_ERRORS_TOTAL,
        "Controls that could not be evaluated because their definition is malformed"
    );
    describe_counter!(
        AUDIT_TASK_FAILURES_TOTAL,
        "Control evaluation tasks that panicked or were aborted"
    );
    describe_histogram!(
        AUDIT_DURATION_SECONDS,
        "Time to complete a single audit run in seconds"
    );
}

//! 에러 타입 — 도메인별 에러 정의

/// confwarden 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ConfwardenError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 장비 설정 텍스트 파싱 에러 (감사 실행 전체를 중단)
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 룰(컨트롤) 정의/로딩 에러
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    /// 감사 실행 에러
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 장비 설정 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 빈 입력
    #[error("configuration text is empty")]
    Empty,

    /// 입력 데이터 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },

    /// 구조 파싱 실패
    #[error("parse failed at line {line}: {reason}")]
    Failed { line: usize, reason: String },
}

/// 룰 에러
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// 룰 파일 로딩 실패
    #[error("failed to load rules from '{path}': {reason}")]
    Load { path: String, reason: String },

    /// 개별 컨트롤 정의 오류
    #[error("control '{control_id}' is malformed: {reason}")]
    Definition { control_id: String, reason: String },
}

/// 감사 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// 평가 태스크 실패 (panic 등)
    #[error("evaluation task failed: {0}")]
    TaskFailed(String),

    /// 잘못된 실행 옵션
    #[error("invalid run option: {0}")]
    InvalidOption(String),
}

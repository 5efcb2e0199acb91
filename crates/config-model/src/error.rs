//! 설정 모델 에러 타입
//!
//! [`ConfigModelError`]는 장비 설정 텍스트를 구조화 모델로 만들 수 없을 때 발생합니다.
//! 감사 실행에서는 치명적 에러로 취급되어 컨트롤 평가 전에 호출자에게 전달됩니다.
//! `From<ConfigModelError> for ConfwardenError` 변환이 구현되어 있습니다.

use confwarden_core::error::{ConfwardenError, ParseError};

/// 설정 모델 빌드 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigModelError {
    /// 빈 입력 (공백만 있는 경우 포함)
    #[error("configuration text is empty")]
    Empty,

    /// 입력 크기 초과
    #[error("configuration too large: {size} bytes (max: {max})")]
    TooLarge {
        /// 입력 크기 (바이트)
        size: usize,
        /// 허용 최대 크기
        max: usize,
    },

    /// 닫히지 않은 블록 (배너 구분자 누락, 중괄호 미닫힘 등)
    #[error("unterminated {kind} block opened at line {line}: '{header}'")]
    UnterminatedBlock {
        /// 블록 종류
        kind: String,
        /// 블록 헤더 원문
        header: String,
        /// 헤더 라인 번호 (1부터)
        line: usize,
    },

    /// 열린 블록이 없는데 종료 표식이 나타남
    #[error("unexpected block terminator at line {line}: '{text}'")]
    UnexpectedTerminator {
        /// 라인 번호 (1부터)
        line: usize,
        /// 라인 원문
        text: String,
    },

    /// 블록 중첩 한도 초과
    #[error("block nesting exceeds {max} levels at line {line}")]
    NestingTooDeep {
        /// 라인 번호 (1부터)
        line: usize,
        /// 허용 최대 깊이
        max: usize,
    },
}

impl ConfigModelError {
    /// 에러가 발생한 라인 번호 (있을 경우)
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnterminatedBlock { line, .. }
            | Self::UnexpectedTerminator { line, .. }
            | Self::NestingTooDeep { line, .. } => Some(*line),
            Self::Empty | Self::TooLarge { .. } => None,
        }
    }
}

impl From<ConfigModelError> for ConfwardenError {
    fn from(err: ConfigModelError) -> Self {
        let parse = match err {
            ConfigModelError::Empty => ParseError::Empty,
            ConfigModelError::TooLarge { size, max } => ParseError::TooLarge { size, max },
            other => ParseError::Failed {
                line: other.line().unwrap_or(0),
                reason: other.to_string(),
            },
        };
        ConfwardenError::Parse(parse)
    }
}

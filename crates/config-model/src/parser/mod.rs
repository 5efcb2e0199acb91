//! 설정 파싱 모듈 -- 방언별 파서와 모델 빌더
//!
//! [`ConfigModelBuilder`]는 입력 크기/빈 입력을 검사하고 방언을 판별한 뒤
//! 해당 [`DialectParser`]로 [`ConfigModel`]을 만듭니다.
//!
//! # 지원 방언
//! - IOS 계열 들여쓰기 + 선택적 종료 표식 ([`IosParser`])
//! - 중괄호 블록 ([`BracedParser`])
//!
//! # 사용 예시
//! ```
//! use confwarden_config_model::parser::ConfigModelBuilder;
//!
//! let model = ConfigModelBuilder::new()
//!     .build("hostname r1\ninterface Gi0/1\n shutdown\n!\n")
//!     .unwrap();
//! assert_eq!(model.line_count(), 2);
//! assert_eq!(model.blocks().len(), 1);
//! ```

pub mod braced;
pub mod ios;

pub use braced::BracedParser;
pub use ios::IosParser;

use std::fmt;
use std::sync::LazyLock;
use std::time::Instant;

use confwarden_core::metrics as m;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::ConfigModelError;
use crate::model::{BlockId, BlockKind, ConfigBlock, ConfigLine, ConfigModel, Node};

/// 기본 최대 입력 크기 (8 MiB)
pub const DEFAULT_MAX_SIZE: usize = 8 * 1024 * 1024;

/// 기본 최대 블록 중첩 깊이
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// 설정 방언
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// 들여쓰기로 계층을 표현하고 `!`/`exit`/`end`로 닫는 방언
    #[default]
    Ios,
    /// `{`/`}`로 블록을 여닫는 방언
    Braced,
}

impl Dialect {
    /// 식별자
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Braced => "braced",
        }
    }

    /// 문자열에서 방언을 파싱합니다. `auto`는 `None`입니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ios" | "cisco" | "ios-xe" | "nx-os" => Some(Self::Ios),
            "braced" | "junos" | "curly" => Some(Self::Braced),
            _ => None,
        }
    }

    /// 텍스트 모양으로 방언을 추정합니다.
    ///
    /// `{`로 끝나는 라인과 `}`만 있는 라인이 모두 있으면 중괄호 방언, 아니면 IOS입니다.
    pub fn detect(text: &str) -> Self {
        let mut opens = false;
        let mut closes = false;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.ends_with('{') {
                opens = true;
            } else if trimmed == "}" || trimmed == "};" {
                closes = true;
            }
            if opens && closes {
                return Self::Braced;
            }
        }
        Self::Ios
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파싱 한도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// 최대 입력 크기 (바이트)
    pub max_size: usize,
    /// 최대 블록 중첩 깊이
    pub max_depth: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// 방언별 파서 trait
///
/// 입력 검증(크기, 빈 입력)은 [`ConfigModelBuilder`]가 먼저 수행합니다.
pub trait DialectParser: Send + Sync {
    /// 이 파서가 처리하는 방언
    fn dialect(&self) -> Dialect;

    /// 라인 목록을 모델로 변환합니다.
    fn parse(&self, lines: &[&str], limits: &ParseLimits)
    -> Result<ConfigModel, ConfigModelError>;
}

/// 설정 모델 빌더
///
/// 방언을 고정하지 않으면 [`Dialect::detect`]로 판별합니다.
#[derive(Debug, Clone, Default)]
pub struct ConfigModelBuilder {
    limits: ParseLimits,
    dialect: Option<Dialect>,
}

impl ConfigModelBuilder {
    /// 기본 한도와 방언 자동 판별로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.limits.max_size = max_size;
        self
    }

    /// 최대 블록 중첩 깊이를 설정합니다.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth;
        self
    }

    /// 방언을 고정합니다. `None`이면 자동 판별합니다.
    pub fn dialect(mut self, dialect: Option<Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// 현재 한도
    pub fn limits(&self) -> ParseLimits {
        self.limits
    }

    /// 원시 설정 텍스트로 모델을 만듭니다.
    pub fn build(&self, text: &str) -> Result<ConfigModel, ConfigModelError> {
        let started = Instant::now();
        let result = self.build_inner(text);
        match &result {
            Ok(model) => {
                let dialect = model.dialect().as_str();
                metrics::histogram!(m::MODEL_PARSE_DURATION_SECONDS, m::LABEL_DIALECT => dialect)
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!(m::MODEL_LINES_PARSED_TOTAL).increment(model.line_count() as u64);
                debug!(
                    dialect,
                    lines = model.line_count(),
                    blocks = model.blocks().len(),
                    source_lines = model.source_line_count(),
                    "config model built"
                );
            }
            Err(e) => {
                metrics::counter!(m::MODEL_PARSE_FAILURES_TOTAL).increment(1);
                debug!(error = %e, "config model build failed");
            }
        }
        result
    }

    fn build_inner(&self, text: &str) -> Result<ConfigModel, ConfigModelError> {
        if text.len() > self.limits.max_size {
            return Err(ConfigModelError::TooLarge {
                size: text.len(),
                max: self.limits.max_size,
            });
        }
        if text.trim().is_empty() {
            return Err(ConfigModelError::Empty);
        }

        let lines = split_lines(text);
        let dialect = self.dialect.unwrap_or_else(|| Dialect::detect(text));
        match dialect {
            Dialect::Ios => IosParser.parse(&lines, &self.limits),
            Dialect::Braced => BracedParser.parse(&lines, &self.limits),
        }
    }
}

/// 텍스트를 라인으로 나눕니다.
///
/// `\n`, `\r\n`, 단독 `\r`을 모두 줄 끝으로 취급합니다. 마지막 줄바꿈 뒤의 빈 조각은 버립니다.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    for piece in text.split('\n') {
        let piece = piece.strip_suffix('\r').unwrap_or(piece);
        out.extend(piece.split('\r'));
    }
    if text.ends_with('\n') || text.ends_with('\r') {
        out.pop();
    }
    out
}

/// 선행 공백 폭
pub(crate) fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// 주석 라인 여부 (`!`, `#`로 시작)
pub(crate) fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('!') || trimmed.starts_with('#')
}

// ─── 블록 오프너 ───────────────────────────────────────────────────

/// 키워드 기반 블록 오프너. 각 패턴은 `name` 그룹으로 블록 이름을 잡습니다.
const OPENER_SPECS: [(BlockKind, &str); 10] = [
    (BlockKind::Interface, r"(?i)^interface\s+(?P<name>\S.*)$"),
    (BlockKind::Line, r"(?i)^line\s+(?P<name>\S.*)$"),
    (BlockKind::Router, r"(?i)^router\s+(?P<name>\S.*)$"),
    (
        BlockKind::AccessList,
        r"(?i)^(?:ip|ipv6|mac)\s+access-list\s+(?P<name>\S.*)$",
    ),
    (BlockKind::Vlan, r"(?i)^vlan\s+(?P<name>\d[\d,\-\s]*)$"),
    (
        BlockKind::AddressFamily,
        r"(?i)^address-family\s+(?P<name>\S.*)$",
    ),
    (BlockKind::PolicyMap, r"(?i)^policy-map\s+(?P<name>\S.*)$"),
    (BlockKind::ClassMap, r"(?i)^class-map\s+(?P<name>\S.*)$"),
    (BlockKind::KeyChain, r"(?i)^key\s+chain\s+(?P<name>\S.*)$"),
    (
        BlockKind::Crypto,
        r"(?i)^crypto\s+(?P<name>(?:isakmp\s+policy|map|keyring|pki\s+trustpoint|pki\s+certificate\s+chain|ipsec\s+profile|ikev2\s+(?:proposal|policy|profile|keyring))\b.*)$",
    ),
];

static OPENERS: LazyLock<Vec<(BlockKind, Regex)>> = LazyLock::new(|| {
    OPENER_SPECS
        .iter()
        .filter_map(|(kind, pattern)| Regex::new(pattern).ok().map(|re| (*kind, re)))
        .collect()
});

/// 키워드 테이블로 헤더의 블록 종류와 이름을 판별합니다.
pub(crate) fn classify_header(trimmed: &str) -> Option<(BlockKind, String)> {
    OPENERS.iter().find_map(|(kind, re)| {
        re.captures(trimmed).map(|caps| {
            let name = caps
                .name("name")
                .map(|m| m.as_str().trim().to_owned())
                .unwrap_or_default();
            (*kind, name)
        })
    })
}

// ─── 모델 조립기 ───────────────────────────────────────────────────

/// 파서가 공유하는 블록 스택 기반 모델 조립기
pub(crate) struct ModelAssembler {
    dialect: Dialect,
    max_depth: usize,
    source_lines: usize,
    lines: Vec<ConfigLine>,
    blocks: Vec<ConfigBlock>,
    roots: Vec<Node>,
    comments: Vec<ConfigLine>,
    stack: Vec<BlockId>,
}

impl ModelAssembler {
    pub(crate) fn new(dialect: Dialect, limits: &ParseLimits, source_lines: usize) -> Self {
        Self {
            dialect,
            max_depth: limits.max_depth,
            source_lines,
            lines: Vec::with_capacity(source_lines),
            blocks: Vec::new(),
            roots: Vec::new(),
            comments: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// 열린 블록 중 가장 안쪽 블록
    pub(crate) fn top(&self) -> Option<&ConfigBlock> {
        self.stack.last().and_then(|id| self.blocks.get(id.0))
    }

    pub(crate) fn is_open(&self) -> bool {
        !self.stack.is_empty()
    }

    pub(crate) fn open_block(
        &mut self,
        kind: BlockKind,
        name: String,
        number: usize,
        text: &str,
        indent: usize,
    ) -> Result<BlockId, ConfigModelError> {
        if self.stack.len() >= self.max_depth {
            return Err(ConfigModelError::NestingTooDeep {
                line: number,
                max: self.max_depth,
            });
        }
        let parent = self.stack.last().copied();
        let id = BlockId(self.blocks.len());
        self.blocks.push(ConfigBlock {
            id,
            kind,
            header: ConfigLine {
                number,
                text: text.to_owned(),
                block: parent,
            },
            name,
            indent,
            children: Vec::new(),
            parent,
        });
        self.attach(parent, Node::Block(id));
        self.stack.push(id);
        Ok(id)
    }

    pub(crate) fn close_top(&mut self) -> Option<BlockId> {
        self.stack.pop()
    }

    /// 조건을 만족하는 동안 가장 안쪽 블록부터 닫습니다.
    pub(crate) fn close_while(&mut self, pred: impl Fn(&ConfigBlock) -> bool) {
        while self.top().is_some_and(&pred) {
            self.stack.pop();
        }
    }

    pub(crate) fn close_all(&mut self) {
        self.stack.clear();
    }

    pub(crate) fn push_line(&mut self, number: usize, text: &str) {
        let block = self.stack.last().copied();
        let idx = self.lines.len();
        self.lines.push(ConfigLine {
            number,
            text: text.to_owned(),
            block,
        });
        self.attach(block, Node::Line(idx));
    }

    pub(crate) fn push_comment(&mut self, number: usize, text: &str) {
        self.comments.push(ConfigLine {
            number,
            text: text.to_owned(),
            block: self.stack.last().copied(),
        });
    }

    pub(crate) fn finish(mut self) -> ConfigModel {
        self.stack.clear();
        ConfigModel {
            dialect: self.dialect,
            lines: self.lines,
            blocks: self.blocks,
            roots: self.roots,
            comments: self.comments,
            source_lines: self.source_lines,
        }
    }

    fn attach(&mut self, parent: Option<BlockId>, node: Node) {
        match parent.and_then(|id| self.blocks.get_mut(id.0)) {
            Some(block) => block.children.push(node),
            None => self.roots.push(node),
        }
    }
}

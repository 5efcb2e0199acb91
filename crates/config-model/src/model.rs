//! 구조화 설정 모델
//!
//! 원시 장비 설정을 블록(인터페이스, line, 라우팅 프로토콜 등)과 라인의 트리로 표현합니다.
//! 블록은 [`ConfigModel`] 내부 아레나에 저장되고 [`BlockId`]로 참조됩니다.
//! 부모 참조는 조회 전용 ID이며 자식 소유권은 부모 블록에 있습니다.
//!
//! 모델은 생성 후 불변입니다. 저장된 라인 텍스트는 입력 원문 그대로(줄바꿈 문자만 제외)이며
//! 매칭을 위한 대소문자 정규화는 매칭 시점에만 일어납니다.

use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::parser::Dialect;

/// 아레나 내 블록 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// 아레나 인덱스
    pub fn index(&self) -> usize {
        self.0
    }
}

/// 설정 라인 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigLine {
    /// 라인 번호 (1부터)
    pub number: usize,
    /// 원문 텍스트 (줄바꿈 제외, 들여쓰기/후행 공백 보존)
    pub text: String,
    /// 소속 블록 (최상위 라인이면 None)
    pub block: Option<BlockId>,
}

impl ConfigLine {
    /// 들여쓰기와 후행 공백을 제거한 텍스트
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// 블록 종류 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// `interface X`
    Interface,
    /// `line vty 0 4`, `line con 0`
    Line,
    /// `router ospf 1`, `router bgp 65000`
    Router,
    /// `ip access-list extended NAME`
    AccessList,
    /// `vlan 10`
    Vlan,
    /// `banner motd ^C ... ^C`
    Banner,
    /// `address-family ipv4`
    AddressFamily,
    /// `policy-map NAME`
    PolicyMap,
    /// `class-map NAME`
    ClassMap,
    /// `key chain NAME`
    KeyChain,
    /// `crypto isakmp policy 10`, `crypto map NAME 10 ...`
    Crypto,
    /// 그 밖의 하위 설정을 가진 컨텍스트 (들여쓰기 또는 중괄호로 판별)
    Section,
}

impl BlockKind {
    /// 소문자 식별자
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Line => "line",
            Self::Router => "router",
            Self::AccessList => "access_list",
            Self::Vlan => "vlan",
            Self::Banner => "banner",
            Self::AddressFamily => "address_family",
            Self::PolicyMap => "policy_map",
            Self::ClassMap => "class_map",
            Self::KeyChain => "key_chain",
            Self::Crypto => "crypto",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 블록의 자식 노드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// `ConfigModel::lines()`의 인덱스
    Line(usize),
    /// 하위 블록
    Block(BlockId),
}

/// 설정 블록 (컨텍스트)
#[derive(Debug, Clone)]
pub struct ConfigBlock {
    /// 식별자
    pub id: BlockId,
    /// 블록 종류
    pub kind: BlockKind,
    /// 헤더 라인 (헤더의 `block`은 부모 블록)
    pub header: ConfigLine,
    /// 블록 이름 (`interface Gi0/1` → `Gi0/1`)
    pub name: String,
    /// 헤더의 들여쓰기 폭
    pub indent: usize,
    /// 소스 순서의 자식 노드
    pub children: Vec<Node>,
    /// 부모 블록
    pub parent: Option<BlockId>,
}

impl ConfigBlock {
    /// 헤더 원문의 앞뒤 공백을 제거한 텍스트
    pub fn header_text(&self) -> &str {
        self.header.trimmed()
    }
}

/// 구조화 설정 모델 (불변)
#[derive(Debug, Clone)]
pub struct ConfigModel {
    pub(crate) dialect: Dialect,
    pub(crate) lines: Vec<ConfigLine>,
    pub(crate) blocks: Vec<ConfigBlock>,
    pub(crate) roots: Vec<Node>,
    pub(crate) comments: Vec<ConfigLine>,
    pub(crate) source_lines: usize,
}

impl ConfigModel {
    /// 모델을 만든 방언
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// 헤더를 제외한 모든 설정 라인 (소스 순서)
    pub fn lines(&self) -> &[ConfigLine] {
        &self.lines
    }

    /// 설정 라인 수 (블록 헤더, 종료 표식, 빈 줄, 주석 제외)
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 입력 텍스트의 전체 라인 수
    pub fn source_line_count(&self) -> usize {
        self.source_lines
    }

    /// 모델에 라인으로 남지 않은 입력 라인 수
    pub fn consumed_line_count(&self) -> usize {
        self.source_lines - self.lines.len()
    }

    /// 주석 라인 (`!`, `#`)
    pub fn comments(&self) -> &[ConfigLine] {
        &self.comments
    }

    /// 모든 블록 (헤더 라인 순서)
    pub fn blocks(&self) -> &[ConfigBlock] {
        &self.blocks
    }

    /// 최상위 노드 (소스 순서)
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// ID로 블록을 조회합니다.
    pub fn block(&self, id: BlockId) -> Option<&ConfigBlock> {
        self.blocks.get(id.0)
    }

    /// 블록의 부모를 조회합니다.
    pub fn parent(&self, id: BlockId) -> Option<&ConfigBlock> {
        self.block(id)
            .and_then(|block| block.parent)
            .and_then(|parent| self.block(parent))
    }

    /// 가장 가까운 부모부터 최상위까지의 조상 블록
    pub fn ancestors(&self, id: BlockId) -> Vec<&ConfigBlock> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(block) = current {
            out.push(block);
            current = block.parent.and_then(|p| self.block(p));
        }
        out
    }

    /// 라인이 속한 블록의 헤더 원문
    pub fn enclosing_header(&self, line: &ConfigLine) -> Option<&str> {
        line.block
            .and_then(|id| self.block(id))
            .map(|block| block.header.text.as_str())
    }

    /// 헤더와 라인을 모두 포함한 문장 목록 (라인 번호 순서)
    pub fn statements(&self) -> Vec<&ConfigLine> {
        let mut out = Vec::with_capacity(self.lines.len() + self.blocks.len());
        let mut lines = self.lines.iter().peekable();
        let mut headers = self.blocks.iter().map(|b| &b.header).peekable();
        loop {
            match (lines.peek(), headers.peek()) {
                (Some(line), Some(header)) => {
                    if line.number < header.number {
                        out.extend(lines.next());
                    } else {
                        out.extend(headers.next());
                    }
                }
                (Some(_), None) => out.extend(lines.next()),
                (None, Some(_)) => out.extend(headers.next()),
                (None, None) => break,
            }
        }
        out
    }

    /// 최상위(전역) 문장: 최상위 라인과 최상위 블록 헤더
    pub fn top_level(&self) -> Vec<&ConfigLine> {
        self.roots
            .iter()
            .filter_map(|node| self.node_line(*node))
            .collect()
    }

    /// 헤더가 정규식과 일치하는 블록 (헤더 원문 전체에 대해 매칭)
    pub fn blocks_matching(&self, header: &Regex) -> Vec<&ConfigBlock> {
        self.blocks
            .iter()
            .filter(|block| header.is_match(block.header_text()))
            .collect()
    }

    /// 블록 본문의 모든 문장 (하위 블록 헤더와 그 본문 포함, 소스 순서)
    pub fn block_lines(&self, id: BlockId) -> Vec<&ConfigLine> {
        let mut out = Vec::new();
        if let Some(block) = self.block(id) {
            self.collect_body(block, &mut out);
        }
        out
    }

    fn collect_body<'a>(&'a self, block: &'a ConfigBlock, out: &mut Vec<&'a ConfigLine>) {
        for node in &block.children {
            match node {
                Node::Line(idx) => out.extend(self.lines.get(*idx)),
                Node::Block(child) => {
                    if let Some(child) = self.block(*child) {
                        out.push(&child.header);
                        self.collect_body(child, out);
                    }
                }
            }
        }
    }

    fn node_line(&self, node: Node) -> Option<&ConfigLine> {
        match node {
            Node::Line(idx) => self.lines.get(idx),
            Node::Block(id) => self.block(id).map(|b| &b.header),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ConfigModelBuilder;

    const SAMPLE: &str = "\
hostname edge-1
!
interface GigabitEthernet0/1
 description uplink
 ip address 10.0.0.1 255.255.255.0
!
router bgp 65000
 neighbor 10.0.0.2 remote-as 65001
 address-family ipv4
  network 10.0.0.0 mask 255.255.255.0
 exit-address-family
!
end
";

    fn model() -> super::ConfigModel {
        ConfigModelBuilder::new().build(SAMPLE).unwrap()
    }

    #[test]
    fn statements_are_in_source_order() {
        let model = model();
        let numbers: Vec<usize> = model.statements().iter().map(|l| l.number).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        assert_eq!(numbers, sorted);
        assert_eq!(numbers.len(), model.line_count() + model.blocks().len());
    }

    #[test]
    fn top_level_contains_globals_and_headers() {
        let model = model();
        let top: Vec<&str> = model.top_level().iter().map(|l| l.trimmed()).collect();
        assert_eq!(
            top,
            vec![
                "hostname edge-1",
                "interface GigabitEthernet0/1",
                "router bgp 65000"
            ]
        );
    }

    #[test]
    fn block_lines_include_nested_blocks() {
        let model = model();
        let bgp = model
            .blocks()
            .iter()
            .find(|b| b.header_text() == "router bgp 65000")
            .unwrap();
        let body: Vec<&str> = model
            .block_lines(bgp.id)
            .iter()
            .map(|l| l.trimmed())
            .collect();
        assert_eq!(
            body,
            vec![
                "neighbor 10.0.0.2 remote-as 65001",
                "address-family ipv4",
                "network 10.0.0.0 mask 255.255.255.0",
            ]
        );
    }

    #[test]
    fn ancestors_walk_to_root() {
        let model = model();
        let af = model
            .blocks()
            .iter()
            .find(|b| b.header_text() == "address-family ipv4")
            .unwrap();
        let chain: Vec<&str> = model
            .ancestors(af.id)
            .iter()
            .map(|b| b.header_text())
            .collect();
        assert_eq!(chain, vec!["router bgp 65000"]);
        assert_eq!(model.parent(af.id).unwrap().name, "bgp 65000");
    }

    #[test]
    fn enclosing_header_is_verbatim() {
        let model = model();
        let line = model
            .lines()
            .iter()
            .find(|l| l.trimmed().starts_with("description"))
            .unwrap();
        assert_eq!(
            model.enclosing_header(line),
            Some("interface GigabitEthernet0/1")
        );
        assert_eq!(line.text, " description uplink");
    }

    #[test]
    fn blocks_matching_uses_header_regex() {
        let model = model();
        let re = regex::Regex::new(r"(?i)^interface\s+gigabit").unwrap();
        assert_eq!(model.blocks_matching(&re).len(), 1);
    }
}

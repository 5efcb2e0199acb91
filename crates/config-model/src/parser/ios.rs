//! IOS 계열 방언 파서
//!
//! 들여쓰기로 계층을 표현하는 설정(Cisco IOS, IOS-XE, NX-OS 등)을 파싱합니다.
//!
//! # 블록 규칙
//! - 키워드 오프너(`interface`, `line`, `router`, ...)는 항상 블록을 엽니다.
//! - 그 밖의 라인은 다음 유효 라인이 더 깊게 들여쓰기되어 있으면 `Section` 블록을 엽니다.
//! - 들여쓰기 `k`인 라인은 헤더 들여쓰기가 `k` 이상인 열린 블록을 모두 닫습니다.
//! - `exit`/`exit-*`는 자기보다 깊은 블록과 가장 안쪽 블록 하나를 닫고, `end`는 전부 닫습니다.
//! - 0열의 `!`는 열린 블록을 모두 닫습니다. 들여쓴 `!`는 주석일 뿐입니다.
//! - `banner <type> <delim>`은 구분자가 다시 나타날 때까지를 본문으로 삼습니다.
//!   구분자가 끝내 나타나지 않으면 [`ConfigModelError::UnterminatedBlock`]입니다.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    Dialect, DialectParser, ModelAssembler, ParseLimits, classify_header, indent_of, is_comment,
};
use crate::error::ConfigModelError;
use crate::model::{BlockKind, ConfigModel};

static BANNER_OPENER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^banner\s+(?P<kind>[\w-]+)\s+(?P<rest>\S.*)$").ok()
});

/// IOS 계열 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct IosParser;

/// 열린 배너 상태
struct OpenBanner {
    delimiter: String,
    header: String,
    line: usize,
}

impl DialectParser for IosParser {
    fn dialect(&self) -> Dialect {
        Dialect::Ios
    }

    fn parse(
        &self,
        lines: &[&str],
        limits: &ParseLimits,
    ) -> Result<ConfigModel, ConfigModelError> {
        let next_indent = next_significant_indents(lines);
        let mut asm = ModelAssembler::new(Dialect::Ios, limits, lines.len());
        let mut banner: Option<OpenBanner> = None;

        for (idx, text) in lines.iter().enumerate() {
            let number = idx + 1;

            if let Some(open) = &banner {
                if text.contains(open.delimiter.as_str()) {
                    if text.trim() != open.delimiter {
                        asm.push_line(number, text);
                    }
                    asm.close_top();
                    banner = None;
                } else {
                    asm.push_line(number, text);
                }
                continue;
            }

            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            let indent = indent_of(text);
            if is_comment(trimmed) {
                if indent == 0 && trimmed.starts_with('!') {
                    asm.close_all();
                }
                asm.push_comment(number, text);
                continue;
            }

            let keyword = trimmed.to_lowercase();
            if keyword == "end" {
                asm.close_all();
                continue;
            }
            if keyword == "exit" || keyword.starts_with("exit-") {
                asm.close_while(|top| top.indent > indent);
                asm.close_top();
                continue;
            }

            asm.close_while(|top| top.indent >= indent);

            if let Some((delimiter, single_line)) = banner_delimiter(trimmed) {
                let name = banner_kind(trimmed);
                asm.open_block(BlockKind::Banner, name, number, text, indent)?;
                if single_line {
                    asm.close_top();
                } else {
                    banner = Some(OpenBanner {
                        delimiter,
                        header: text.to_string(),
                        line: number,
                    });
                }
                continue;
            }

            if let Some((kind, name)) = classify_header(trimmed) {
                asm.open_block(kind, name, number, text, indent)?;
            } else if next_indent[idx].is_some_and(|next| next > indent) {
                asm.open_block(BlockKind::Section, trimmed.to_owned(), number, text, indent)?;
            } else {
                asm.push_line(number, text);
            }
        }

        if let Some(open) = banner {
            return Err(ConfigModelError::UnterminatedBlock {
                kind: BlockKind::Banner.to_string(),
                header: open.header,
                line: open.line,
            });
        }

        Ok(asm.finish())
    }
}

/// 각 라인 뒤에 오는 첫 유효 라인의 들여쓰기.
///
/// 빈 줄과 들여쓴 주석은 건너뛰고, 0열 주석은 들여쓰기 0으로 봅니다.
fn next_significant_indents(lines: &[&str]) -> Vec<Option<usize>> {
    let mut out = vec![None; lines.len()];
    let mut next = None;
    for idx in (0..lines.len()).rev() {
        out[idx] = next;
        let text = lines[idx];
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let indent = indent_of(text);
        if is_comment(trimmed) && indent > 0 {
            continue;
        }
        next = Some(indent);
    }
    out
}

/// 배너 헤더라면 (구분자, 한 줄 배너 여부)를 돌려줍니다.
///
/// 구분자는 `^C`처럼 캐럿 표기면 두 글자, 아니면 첫 글자입니다.
fn banner_delimiter(trimmed: &str) -> Option<(String, bool)> {
    let re = BANNER_OPENER.as_ref()?;
    let caps = re.captures(trimmed)?;
    let rest = caps.name("rest")?.as_str();

    let mut chars = rest.chars();
    let first = chars.next()?;
    let delimiter = match (first, chars.next()) {
        ('^', Some(second)) => format!("^{second}"),
        _ => first.to_string(),
    };
    let after = &rest[delimiter.len()..];
    let single_line = after.contains(delimiter.as_str());
    Some((delimiter, single_line))
}

fn banner_kind(trimmed: &str) -> String {
    BANNER_OPENER
        .as_ref()
        .and_then(|re| re.captures(trimmed))
        .and_then(|caps| caps.name("kind"))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn parse(text: &str) -> Result<ConfigModel, ConfigModelError> {
        let lines = super::super::split_lines(text);
        IosParser.parse(&lines, &ParseLimits::default())
    }

    #[test]
    fn banner_regex_compiles() {
        assert!(BANNER_OPENER.is_some());
    }

    #[test]
    fn interface_block_collects_indented_lines() {
        let model = parse(
            "interface GigabitEthernet0/1\n description users\n switchport mode access\n!\nhostname sw1\n",
        )
        .unwrap();
        assert_eq!(model.blocks().len(), 1);
        let block = &model.blocks()[0];
        assert_eq!(block.kind, BlockKind::Interface);
        assert_eq!(block.name, "GigabitEthernet0/1");
        assert_eq!(block.children.len(), 2);
        let hostname = model.lines().iter().find(|l| l.trimmed() == "hostname sw1").unwrap();
        assert_eq!(hostname.block, None);
    }

    #[test]
    fn sibling_header_closes_previous_block() {
        let model = parse(
            "interface Gi0/1\n shutdown\ninterface Gi0/2\n no shutdown\n",
        )
        .unwrap();
        assert_eq!(model.blocks().len(), 2);
        assert_eq!(model.roots().len(), 2);
        assert!(model.blocks().iter().all(|b| b.parent.is_none()));
        assert_eq!(model.blocks()[1].children, vec![Node::Line(1)]);
    }

    #[test]
    fn keyword_opener_without_body_is_empty_block() {
        let model = parse("interface Loopback0\n!\nip routing\n").unwrap();
        assert_eq!(model.blocks().len(), 1);
        assert!(model.blocks()[0].children.is_empty());
        assert_eq!(model.line_count(), 1);
    }

    #[test]
    fn generic_section_from_indentation() {
        let model = parse("control-plane host\n management-interface Gi0/0 allow ssh\n").unwrap();
        assert_eq!(model.blocks().len(), 1);
        assert_eq!(model.blocks()[0].kind, BlockKind::Section);
        assert_eq!(model.blocks()[0].name, "control-plane host");
    }

    #[test]
    fn nested_policy_map_class() {
        let text = "\
policy-map COPP
 class SSH
  police 8000 conform-action transmit
 class class-default
  police 1000
!
";
        let model = parse(text).unwrap();
        let kinds: Vec<BlockKind> = model.blocks().iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::PolicyMap, BlockKind::Section, BlockKind::Section]
        );
        assert_eq!(model.blocks()[1].parent, Some(model.blocks()[0].id));
        assert_eq!(model.blocks()[2].parent, Some(model.blocks()[0].id));
    }

    #[test]
    fn exit_address_family_returns_to_router() {
        let text = "\
router bgp 65000
 address-family ipv4
  network 10.0.0.0
 exit-address-family
 neighbor 10.0.0.2 remote-as 65001
";
        let model = parse(text).unwrap();
        let neighbor = model
            .lines()
            .iter()
            .find(|l| l.trimmed().starts_with("neighbor"))
            .unwrap();
        assert_eq!(neighbor.block, Some(model.blocks()[0].id));
        // 헤더 2개, exit 1개가 소비됨
        assert_eq!(model.line_count(), 2);
        assert_eq!(model.consumed_line_count(), 3);
    }

    #[test]
    fn indented_bang_does_not_close_block() {
        let model = parse("line vty 0 4\n !\n transport input ssh\n").unwrap();
        assert_eq!(model.blocks()[0].children.len(), 1);
        assert_eq!(model.comments().len(), 1);
    }

    #[test]
    fn multi_line_banner_keeps_body_verbatim() {
        let text = "banner motd ^C\nAuthorized access only!\n  Violators prosecuted\n^C\nhostname r1\n";
        let model = parse(text).unwrap();
        let banner = &model.blocks()[0];
        assert_eq!(banner.kind, BlockKind::Banner);
        assert_eq!(banner.name, "motd");
        let body: Vec<&str> = model
            .block_lines(banner.id)
            .iter()
            .map(|l| l.text.as_str())
            .collect();
        assert_eq!(body, vec!["Authorized access only!", "  Violators prosecuted"]);
        let hostname = model.lines().iter().find(|l| l.trimmed() == "hostname r1").unwrap();
        assert_eq!(hostname.block, None);
    }

    #[test]
    fn banner_closing_line_with_text_is_kept() {
        let text = "banner login #\nNo unauthorized use#\nhostname r1\n";
        let model = parse(text).unwrap();
        assert_eq!(model.block_lines(model.blocks()[0].id).len(), 1);
        assert_eq!(model.line_count(), 2);
    }

    #[test]
    fn single_line_banner_closes_immediately() {
        let model = parse("banner exec ^CWelcome^C\nhostname r1\n").unwrap();
        assert_eq!(model.blocks().len(), 1);
        assert!(model.blocks()[0].children.is_empty());
        assert_eq!(model.lines()[0].block, None);
    }

    #[test]
    fn unterminated_banner_is_error() {
        let err = parse("hostname r1\nbanner motd ^C\nnever closed\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigModelError::UnterminatedBlock { line: 2, ref kind, .. } if kind == "banner"
        ));
    }

    #[test]
    fn end_closes_everything() {
        let model = parse("interface Gi0/1\n shutdown\nend\n").unwrap();
        assert_eq!(model.line_count(), 1);
        assert_eq!(model.consumed_line_count(), 2);
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let text = "a\n b\n  c\n   d\n";
        let lines = super::super::split_lines(text);
        let limits = ParseLimits {
            max_depth: 2,
            ..ParseLimits::default()
        };
        let err = IosParser.parse(&lines, &limits).unwrap_err();
        assert_eq!(err, ConfigModelError::NestingTooDeep { line: 3, max: 2 });
    }

    #[test]
    fn stored_text_keeps_case_and_trailing_space() {
        let model = parse("Interface Gi0/1\n  IP Address 10.0.0.1 255.0.0.0   \n").unwrap();
        assert_eq!(model.blocks()[0].kind, BlockKind::Interface);
        assert_eq!(model.lines()[0].text, "  IP Address 10.0.0.1 255.0.0.0   ");
    }

    #[test]
    fn stray_exit_at_top_level_is_consumed() {
        let model = parse("hostname r1\nexit\n").unwrap();
        assert_eq!(model.line_count(), 1);
    }
}

//! 중괄호 방언 파서
//!
//! `{`로 끝나는 라인이 블록을 열고 `}`가 닫는 설정(Junos 스타일 등)을 파싱합니다.
//! 닫히지 않은 블록과 짝 없는 `}`는 모두 에러입니다.

use super::{
    Dialect, DialectParser, ModelAssembler, ParseLimits, classify_header, indent_of, is_comment,
};
use crate::error::ConfigModelError;
use crate::model::{BlockKind, ConfigModel};

/// 중괄호 방언 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct BracedParser;

impl DialectParser for BracedParser {
    fn dialect(&self) -> Dialect {
        Dialect::Braced
    }

    fn parse(
        &self,
        lines: &[&str],
        limits: &ParseLimits,
    ) -> Result<ConfigModel, ConfigModelError> {
        let mut asm = ModelAssembler::new(Dialect::Braced, limits, lines.len());

        for (idx, text) in lines.iter().enumerate() {
            let number = idx + 1;
            let trimmed = text.trim();

            if trimmed.is_empty() {
                continue;
            }
            if is_comment(trimmed) || trimmed.starts_with("/*") || trimmed.starts_with("//") {
                asm.push_comment(number, text);
                continue;
            }
            if trimmed == "}" || trimmed == "};" {
                if asm.close_top().is_none() {
                    return Err(ConfigModelError::UnexpectedTerminator {
                        line: number,
                        text: text.to_string(),
                    });
                }
                continue;
            }
            if let Some(head) = trimmed.strip_suffix('{') {
                let head = head.trim_end();
                let (kind, name) =
                    classify_header(head).unwrap_or_else(|| (BlockKind::Section, head.to_owned()));
                asm.open_block(kind, name, number, text, indent_of(text))?;
                continue;
            }
            asm.push_line(number, text);
        }

        if let Some(open) = asm.top() {
            return Err(ConfigModelError::UnterminatedBlock {
                kind: open.kind.to_string(),
                header: open.header.text.clone(),
                line: open.header.number,
            });
        }

        Ok(asm.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigModel, ConfigModelError> {
        let lines = super::super::split_lines(text);
        BracedParser.parse(&lines, &ParseLimits::default())
    }

    const JUNOS: &str = "\
## Last commit: 2024-01-01
system {
    host-name edge-1;
    services {
        ssh;
        telnet;
    }
}
interfaces {
    ge-0/0/0 {
        description uplink;
    }
}
";

    #[test]
    fn nested_braced_blocks() {
        let model = parse(JUNOS).unwrap();
        let headers: Vec<&str> = model.blocks().iter().map(|b| b.header_text()).collect();
        assert_eq!(
            headers,
            vec!["system {", "services {", "interfaces {", "ge-0/0/0 {"]
        );
        assert_eq!(model.blocks()[1].parent, Some(model.blocks()[0].id));
        assert_eq!(model.blocks()[0].name, "system");
        assert_eq!(model.line_count(), 4);
        assert_eq!(model.comments().len(), 1);
    }

    #[test]
    fn keyword_headers_are_classified() {
        let model = parse("interface eth0 {\n    mtu 9000;\n}\n").unwrap();
        assert_eq!(model.blocks()[0].kind, BlockKind::Interface);
        assert_eq!(model.blocks()[0].name, "eth0");
    }

    #[test]
    fn stray_closing_brace_is_error() {
        let err = parse("system {\n}\n}\n").unwrap_err();
        assert_eq!(
            err,
            ConfigModelError::UnexpectedTerminator {
                line: 3,
                text: "}".to_owned()
            }
        );
    }

    #[test]
    fn unclosed_block_at_eof_is_error() {
        let err = parse("system {\n    services {\n        ssh;\n    }\n").unwrap_err();
        assert_eq!(
            err,
            ConfigModelError::UnterminatedBlock {
                kind: "section".to_owned(),
                header: "system {".to_owned(),
                line: 1,
            }
        );
    }

    #[test]
    fn closing_lines_are_consumed() {
        let model = parse(JUNOS).unwrap();
        // 주석 1 + 헤더 4 + 닫는 괄호 4
        assert_eq!(model.source_line_count(), 13);
        assert_eq!(model.consumed_line_count(), 9);
    }
}

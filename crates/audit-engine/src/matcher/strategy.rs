//! 전략별 평가 -- 설정 모델에서 매칭 여부와 증거 라인을 계산
//!
//! 각 함수는 모델을 읽기만 하며, 증거 정렬/중복 제거/상한 적용은 호출자가 합니다.

use std::iter;

use confwarden_config_model::{ConfigBlock, ConfigLine, ConfigModel};

use super::compiled::{CompiledControl, CompiledScope};
use crate::rule::types::{Aggregation, MatchStrategy};

/// 전략 평가의 중간 결과
#[derive(Debug)]
pub(crate) struct Outcome<'a> {
    pub matched: bool,
    pub lines: Vec<&'a ConfigLine>,
    pub notes: Vec<String>,
}

impl<'a> Outcome<'a> {
    fn new(matched: bool, lines: Vec<&'a ConfigLine>) -> Self {
        Self {
            matched,
            lines,
            notes: Vec::new(),
        }
    }

    fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

pub(crate) fn evaluate<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    match control.strategy {
        MatchStrategy::LinePresence => line_presence(control, model),
        MatchStrategy::LineAbsence => line_absence(control, model),
        MatchStrategy::BlockScopedPresence => block_presence(control, model),
        MatchStrategy::BlockScopedAbsence => block_absence(control, model),
        MatchStrategy::CrossBlockConsistency => cross_block(control, model),
        MatchStrategy::ManualOnly => manual(control, model),
    }
}

// --- 공통 ---

/// 헤더가 일치하고 require/exclude 조건을 만족하는 블록
fn in_scope<'a>(scope: &CompiledScope, model: &'a ConfigModel) -> Vec<&'a ConfigBlock> {
    model
        .blocks_matching(&scope.header)
        .into_iter()
        .filter(|block| {
            let body = model.block_lines(block.id);
            let required = scope
                .require
                .as_ref()
                .is_none_or(|re| body.iter().any(|l| re.is_match(&l.text)));
            let excluded = scope
                .exclude
                .as_ref()
                .is_some_and(|re| body.iter().any(|l| re.is_match(&l.text)));
            required && !excluded
        })
        .collect()
}

/// 평가 대상 라인: 범위가 있으면 범위 내 블록 본문, 없으면 전체 문장
fn candidates<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Vec<&'a ConfigLine> {
    match &control.scope {
        Some(scope) => in_scope(scope, model)
            .into_iter()
            .flat_map(|block| model.block_lines(block.id))
            .collect(),
        None => model.statements(),
    }
}

fn matches_any(control: &CompiledControl, line: &ConfigLine) -> bool {
    control.patterns.iter().any(|re| re.is_match(&line.text))
}

/// 증거 라인 선택: `evidence_pattern`이 있으면 그것으로, 없으면 매칭 패턴으로
fn select_evidence<'a>(control: &CompiledControl, lines: &[&'a ConfigLine]) -> Vec<&'a ConfigLine> {
    lines
        .iter()
        .copied()
        .filter(|line| match &control.evidence {
            Some(re) => re.is_match(&line.text),
            None => matches_any(control, line),
        })
        .collect()
}

fn no_blocks_note(scope: &CompiledScope) -> String {
    format!("no blocks matched scope '{}'", scope.header.as_str())
}

fn quoted(items: &[&str]) -> String {
    items
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

// --- 전략 ---

fn line_presence<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    if let Some(scope) = &control.scope {
        if in_scope(scope, model).is_empty() {
            return Outcome::new(false, Vec::new()).note(no_blocks_note(scope));
        }
    }

    let lines = candidates(control, model);
    let missing: Vec<&str> = control
        .patterns
        .iter()
        .zip(&control.pattern_sources)
        .filter(|(re, _)| !lines.iter().any(|l| re.is_match(&l.text)))
        .map(|(_, source)| source.as_str())
        .collect();

    if missing.is_empty() {
        Outcome::new(true, select_evidence(control, &lines))
    } else {
        Outcome::new(false, Vec::new())
            .note(format!("no line matches required pattern {}", quoted(&missing)))
    }
}

fn line_absence<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    let offending: Vec<&ConfigLine> = candidates(control, model)
        .into_iter()
        .filter(|line| matches_any(control, line))
        .collect();

    if offending.is_empty() {
        Outcome::new(false, Vec::new()).note("no line matches the disallowed pattern")
    } else {
        Outcome::new(true, offending)
    }
}

fn block_presence<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    let Some(scope) = &control.scope else {
        return Outcome::new(false, Vec::new()).note("no block scope");
    };
    let blocks = in_scope(scope, model);
    if blocks.is_empty() {
        return Outcome::new(false, Vec::new()).note(no_blocks_note(scope));
    }

    let mut compliant = Vec::new();
    let mut failing = Vec::new();
    for block in &blocks {
        let body = model.block_lines(block.id);
        let complies = control
            .patterns
            .iter()
            .all(|re| body.iter().any(|l| re.is_match(&l.text)));
        if complies {
            compliant.extend(select_evidence(control, &body));
        } else {
            failing.push(&block.header);
        }
    }

    let matched = match control.aggregation {
        Aggregation::Any => failing.is_empty(),
        Aggregation::All => failing.len() < blocks.len(),
    };

    if matched {
        Outcome::new(true, compliant)
    } else {
        let note = format!("{} of {} in-scope blocks non-compliant", failing.len(), blocks.len());
        Outcome::new(false, failing).note(note)
    }
}

fn block_absence<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    let Some(scope) = &control.scope else {
        return Outcome::new(false, Vec::new()).note("no block scope");
    };
    let blocks = in_scope(scope, model);
    if blocks.is_empty() {
        return Outcome::new(scope.missing_fails, Vec::new()).note(no_blocks_note(scope));
    }

    let mut offending = Vec::new();
    let mut offending_blocks = 0usize;
    for block in &blocks {
        let hits: Vec<&ConfigLine> = model
            .block_lines(block.id)
            .into_iter()
            .filter(|line| matches_any(control, line))
            .collect();
        if !hits.is_empty() {
            offending_blocks += 1;
            offending.extend(hits);
        }
    }

    let matched = match control.aggregation {
        Aggregation::Any => offending_blocks > 0,
        Aggregation::All => offending_blocks == blocks.len(),
    };

    let outcome = Outcome::new(matched, offending);
    if offending_blocks == 0 {
        outcome.note("no in-scope block contains the disallowed pattern")
    } else {
        let note = format!(
            "{offending_blocks} of {} in-scope blocks contain the disallowed pattern",
            blocks.len()
        );
        outcome.note(note)
    }
}

fn cross_block<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    let Some(reference) = &control.reference else {
        return Outcome::new(false, Vec::new()).note("no reference definition");
    };

    let mut refs: Vec<(&str, &ConfigLine)> = Vec::new();
    for line in candidates(control, model) {
        if let Some(name) = reference.capture(&line.text) {
            refs.push((name, line));
        }
    }
    if refs.is_empty() {
        return Outcome::new(true, Vec::new()).note("no references found");
    }

    let targets: Vec<&ConfigLine> = match &reference.target_scope {
        Some(scope) => model
            .blocks_matching(scope)
            .into_iter()
            .flat_map(|block| iter::once(&block.header).chain(model.block_lines(block.id)))
            .collect(),
        None => model.top_level(),
    };

    let mut names: Vec<&str> = Vec::new();
    for (name, _) in &refs {
        if !names.contains(name) {
            names.push(name);
        }
    }

    let mut missing = Vec::new();
    let mut resolved = Vec::new();
    for name in names {
        let found = reference
            .target_for(name)
            .and_then(|re| targets.iter().copied().find(|t| re.is_match(&t.text)));
        match found {
            Some(target) => resolved.push(target),
            None => missing.push(name),
        }
    }

    if missing.is_empty() {
        let mut lines: Vec<&ConfigLine> = refs.into_iter().map(|(_, line)| line).collect();
        lines.extend(resolved);
        Outcome::new(true, lines)
    } else {
        let lines = refs
            .into_iter()
            .filter(|(name, _)| missing.contains(name))
            .map(|(_, line)| line)
            .collect();
        Outcome::new(false, lines).note(format!("undefined reference {}", quoted(&missing)))
    }
}

fn manual<'a>(control: &CompiledControl, model: &'a ConfigModel) -> Outcome<'a> {
    let context = if control.patterns.is_empty() && control.evidence.is_none() {
        Vec::new()
    } else {
        select_evidence(control, &candidates(control, model))
    };
    Outcome::new(false, context).note("manual verification required")
}

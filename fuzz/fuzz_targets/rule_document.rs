#![no_main]

use confwarden_audit_engine::{CompiledControl, RuleLoader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 문서 파서는 &str을 받으므로 UTF-8 변환 필요
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let documents = [
        RuleLoader::parse_json(text, "fuzz-input.json"),
        RuleLoader::parse_yaml(text, "fuzz-input.yaml"),
    ];

    // 정의 오류는 Err로 보고되어야 하며 크래시는 안 됨
    for document in documents.into_iter().flatten() {
        for control in document.controls.iter().take(64) {
            let _ = CompiledControl::compile(control);
        }
    }
});

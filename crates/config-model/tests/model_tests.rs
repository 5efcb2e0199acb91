//! 통합 테스트 -- 실제 장비 설정 샘플로 모델/분류기/메타데이터 검증
//!
//! 샘플은 워크스페이스 루트의 `testdata/`에 있습니다.

use confwarden_config_model::{
    BlockKind, ConfigModelBuilder, ConfigModelError, DecisionRule, DeviceClassifier,
    DeviceMetadata, Dialect, cis_benchmark_url,
};
use confwarden_core::DeviceType;
use regex::Regex;

const ROUTER: &str = include_str!("../../../testdata/router.cfg");
const SWITCH_L2: &str = include_str!("../../../testdata/switch_l2.cfg");
const SWITCH_L3: &str = include_str!("../../../testdata/switch_l3.cfg");
const JUNOS: &str = include_str!("../../../testdata/junos.conf");

fn build(text: &str) -> confwarden_config_model::ConfigModel {
    ConfigModelBuilder::new()
        .build(text)
        .expect("sample config should parse")
}

// --- 모델 구조 ---

#[test]
fn router_sample_builds_expected_blocks() {
    // Given: 라우터 샘플
    let model = build(ROUTER);

    // Then: IOS 방언, 인터페이스 3개
    assert_eq!(model.dialect(), Dialect::Ios);
    let interfaces: Vec<&str> = model
        .blocks()
        .iter()
        .filter(|b| b.kind == BlockKind::Interface)
        .map(|b| b.name.as_str())
        .collect();
    assert_eq!(
        interfaces,
        vec!["GigabitEthernet0/0/0", "GigabitEthernet0/0/1", "Serial0/1/0"]
    );

    // line 블록 3개, vty 본문 3줄
    let vty = Regex::new(r"^line vty").unwrap();
    let vty_blocks = model.blocks_matching(&vty);
    assert_eq!(vty_blocks.len(), 1);
    let body: Vec<&str> = model
        .block_lines(vty_blocks[0].id)
        .iter()
        .map(|l| l.trimmed())
        .collect();
    assert_eq!(
        body,
        vec!["access-class 10 in", "exec-timeout 10 0", "transport input ssh"]
    );
    assert_eq!(
        model.blocks().iter().filter(|b| b.kind == BlockKind::Line).count(),
        3
    );
}

#[test]
fn router_sample_nests_address_family_under_bgp() {
    let model = build(ROUTER);

    let af = model
        .blocks()
        .iter()
        .find(|b| b.kind == BlockKind::AddressFamily)
        .expect("address-family block");
    let parent = model.parent(af.id).expect("parent block");
    assert_eq!(parent.kind, BlockKind::Router);
    assert_eq!(parent.name, "bgp 65010");

    // exit-address-family는 라인으로 남지 않음
    assert!(model.lines().iter().all(|l| l.trimmed() != "exit-address-family"));

    // 주소 패밀리 본문의 라인은 헤더를 그대로 돌려줌
    let network = model
        .lines()
        .iter()
        .find(|l| l.trimmed().starts_with("network 10.10.0.0"))
        .unwrap();
    assert_eq!(model.enclosing_header(network), Some(" address-family ipv4"));
    assert_eq!(model.ancestors(af.id).len(), 1);
}

#[test]
fn router_sample_banner_body_is_captured() {
    let model = build(ROUTER);

    let banner = model
        .blocks()
        .iter()
        .find(|b| b.kind == BlockKind::Banner)
        .expect("banner block");
    assert_eq!(banner.name, "login");
    let body = model.block_lines(banner.id);
    assert_eq!(body.len(), 1);
    assert!(body[0].text.starts_with("Authorized access only."));
}

#[test]
fn every_line_is_verbatim_source_text() {
    for sample in [ROUTER, SWITCH_L2, SWITCH_L3, JUNOS] {
        let model = build(sample);
        let source: Vec<&str> = sample.lines().collect();
        for line in model.statements() {
            assert_eq!(line.text, source[line.number - 1]);
        }
        for line in model.comments() {
            assert_eq!(line.text, source[line.number - 1]);
        }
        assert_eq!(model.source_line_count(), source.len());
        assert_eq!(
            model.line_count() + model.consumed_line_count(),
            model.source_line_count()
        );
    }
}

#[test]
fn junos_sample_uses_braced_dialect() {
    // Given: 중괄호 방언 샘플
    let model = build(JUNOS);

    // Then: 자동 판별, 중첩 블록
    assert_eq!(model.dialect(), Dialect::Braced);
    let ssh = model
        .blocks()
        .iter()
        .find(|b| b.header_text() == "ssh {")
        .expect("ssh block");
    let chain: Vec<&str> = model
        .ancestors(ssh.id)
        .iter()
        .map(|b| b.header_text())
        .collect();
    assert_eq!(chain, vec!["services {", "system {"]);

    let interface = model
        .blocks()
        .iter()
        .find(|b| b.header_text() == "ge-0/0/0 {")
        .expect("interface block");
    assert_eq!(model.block_lines(interface.id).len(), 4);
}

#[test]
fn unterminated_banner_reports_header_line() {
    let text = "hostname r1\nbanner motd ^C\nNo closing delimiter\n";
    let err = ConfigModelBuilder::new().build(text).unwrap_err();
    assert_eq!(
        err,
        ConfigModelError::UnterminatedBlock {
            kind: "banner".to_owned(),
            header: "banner motd ^C".to_owned(),
            line: 2,
        }
    );
}

#[test]
fn nesting_limit_is_enforced() {
    let text = "a {\n b {\n  c {\n   x;\n  }\n }\n}\n";
    let err = ConfigModelBuilder::new().max_depth(2).build(text).unwrap_err();
    assert_eq!(err, ConfigModelError::NestingTooDeep { line: 3, max: 2 });
    assert!(ConfigModelBuilder::new().max_depth(3).build(text).is_ok());
}

// --- 분류기 ---

#[test]
fn samples_classify_as_expected() {
    let cases = [
        (ROUTER, DeviceType::Router, DecisionRule::RouterThreshold),
        (SWITCH_L2, DeviceType::Layer2Switch, DecisionRule::SwitchThreshold),
        (SWITCH_L3, DeviceType::Layer3Switch, DecisionRule::Layer3Threshold),
        (JUNOS, DeviceType::Unknown, DecisionRule::NoDecisiveIndicator),
    ];
    let classifier = DeviceClassifier::new();
    for (sample, expected, rule) in cases {
        let c = classifier.classify(&build(sample));
        assert_eq!(c.device_type, expected, "indicators: {:?}", c.indicators);
        assert_eq!(c.decided_by, rule);
    }
}

#[test]
fn hardware_signature_in_comment_counts() {
    // Given: 주석에만 하드웨어 모델이 있는 L2 스위치
    let c = DeviceClassifier::new().classify(&build(SWITCH_L2));

    // Then: 하드웨어 지표가 스위치 점수에 반영됨
    assert!(
        c.indicators
            .iter()
            .any(|i| i == "Switch hardware model signature found")
    );
    assert!(c.scores.switch >= 30);
}

// --- 메타데이터 ---

#[test]
fn router_metadata_is_extracted() {
    let meta = DeviceMetadata::extract(&build(ROUTER));
    assert_eq!(meta.hostname.as_deref(), Some("edge-rtr1"));
    assert_eq!(meta.software_version.as_deref(), Some("16.9"));
    assert!(
        meta.software_line
            .as_deref()
            .is_some_and(|s| s.starts_with("Cisco IOS Software"))
    );
}

#[test]
fn junos_metadata_is_extracted() {
    let meta = DeviceMetadata::extract(&build(JUNOS));
    assert_eq!(meta.hostname.as_deref(), Some("edge-mx1"));
    assert_eq!(meta.software_version.as_deref(), Some("21.4R3"));
    assert_eq!(meta.software_line, None);
}

#[test]
fn benchmark_url_follows_device_type() {
    assert!(cis_benchmark_url(DeviceType::Router).ends_with("cisco_ios"));
    assert_eq!(
        cis_benchmark_url(DeviceType::Layer2Switch),
        cis_benchmark_url(DeviceType::Layer3Switch)
    );
}

// --- 속성 기반 테스트 ---

mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// 생성기 항목: 전역 라인, 본문이 있는 인터페이스, 주석, 빈 줄
    #[derive(Debug, Clone)]
    enum Entry {
        Global(String),
        Interface(u8, Vec<String>),
        Comment(String),
        Blank,
    }

    fn entry() -> impl Strategy<Value = Entry> {
        prop_oneof![
            "[a-z]{2,8} [a-z0-9.]{1,10}".prop_map(|s| Entry::Global(format!("set-{s}"))),
            (any::<u8>(), prop::collection::vec("[a-z]{2,8} [a-z0-9]{1,6}", 0..5)).prop_map(
                |(port, body)| Entry::Interface(
                    port,
                    body.into_iter().map(|s| format!(" opt-{s}")).collect()
                )
            ),
            "[a-z ]{0,20}".prop_map(|s| Entry::Comment(format!("! {s}"))),
            Just(Entry::Blank),
        ]
    }

    /// 텍스트와 모델에 남아야 할 라인 수
    fn render(entries: &[Entry]) -> (String, usize) {
        let mut text = String::from("hostname prop\n");
        let mut expected = 1;
        for entry in entries {
            match entry {
                Entry::Global(line) => {
                    text.push_str(line);
                    text.push('\n');
                    expected += 1;
                }
                Entry::Interface(port, body) => {
                    text.push_str(&format!("interface Ethernet{port}\n"));
                    for line in body {
                        text.push_str(line);
                        text.push('\n');
                    }
                    expected += body.len();
                }
                Entry::Comment(line) => {
                    text.push_str(line);
                    text.push('\n');
                }
                Entry::Blank => text.push('\n'),
            }
        }
        (text, expected)
    }

    proptest! {
        #[test]
        fn line_count_excludes_headers_and_comments(
            entries in prop::collection::vec(entry(), 0..40)
        ) {
            let (text, expected) = render(&entries);
            let model = ConfigModelBuilder::new().build(&text).unwrap();
            prop_assert_eq!(model.line_count(), expected);

            let interfaces = entries
                .iter()
                .filter(|e| matches!(e, Entry::Interface(..)))
                .count();
            prop_assert_eq!(model.blocks().len(), interfaces);
        }

        #[test]
        fn model_lines_match_source(
            entries in prop::collection::vec(entry(), 0..40)
        ) {
            let (text, _) = render(&entries);
            let model = ConfigModelBuilder::new().build(&text).unwrap();
            let source: Vec<&str> = text.lines().collect();
            for line in model.lines() {
                prop_assert_eq!(line.text.as_str(), source[line.number - 1]);
                if line.text.starts_with(' ') {
                    prop_assert!(line.block.is_some());
                } else {
                    prop_assert!(line.block.is_none());
                }
            }
        }

        #[test]
        fn arbitrary_input_never_panics(text in "\\PC{0,400}") {
            let _ = ConfigModelBuilder::new().build(&text);
        }

        #[test]
        fn arbitrary_braced_input_never_panics(text in "[a-z{};\\n !#]{0,200}") {
            let _ = ConfigModelBuilder::new()
                .dialect(Some(Dialect::Braced))
                .build(&text);
        }
    }
}

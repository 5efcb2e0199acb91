//! confwarden.toml 통합 설정 테스트
//!
//! - confwarden.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use confwarden_core::config::ConfwardenConfig;
use confwarden_core::error::{ConfigError, ConfwardenError};

// =============================================================================
// confwarden.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../confwarden.toml.example");
    let config = ConfwardenConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.audit.rules_dir, "rules");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../confwarden.toml.example");
    let config = ConfwardenConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../confwarden.toml.example");
    let example = ConfwardenConfig::parse(content).expect("should parse");
    let defaults = ConfwardenConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.general.log_format, defaults.general.log_format);
    assert_eq!(example.audit.rules_dir, defaults.audit.rules_dir);
    assert_eq!(example.audit.parallelism, defaults.audit.parallelism);
    assert_eq!(example.audit.evidence_limit, defaults.audit.evidence_limit);
    assert_eq!(example.audit.max_config_size, defaults.audit.max_config_size);
    assert_eq!(
        example.audit.max_nesting_depth,
        defaults.audit.max_nesting_depth
    );
    assert_eq!(example.audit.dialect, defaults.audit.dialect);
    assert_eq!(
        example.audit.unknown_device_fallback,
        defaults.audit.unknown_device_fallback
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_general_only() {
    let toml = r#"
[general]
log_level = "debug"
"#;
    let config = ConfwardenConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.general.log_level, "debug");
    // 생략된 섹션은 기본값
    assert_eq!(config.audit.parallelism, 4);
}

#[test]
fn partial_config_audit_only() {
    let toml = r#"
[audit]
rules_dir = "/opt/benchmarks"
unknown_device_fallback = "layer2_switch"
"#;
    let config = ConfwardenConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.audit.rules_dir, "/opt/benchmarks");
    assert_eq!(config.audit.unknown_device_fallback, "layer2_switch");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
fn wrong_type_is_parse_error() {
    let toml = r#"
[audit]
parallelism = "lots"
"#;
    let err = ConfwardenConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        ConfwardenError::Config(ConfigError::ParseFailed { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[audit]
parallelism = 2
"#;

    let original = std::env::var("CONFWARDEN_AUDIT_PARALLELISM").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("CONFWARDEN_AUDIT_PARALLELISM", "12");
    }

    let mut config = ConfwardenConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.audit.parallelism;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("CONFWARDEN_AUDIT_PARALLELISM", val),
            None => std::env::remove_var("CONFWARDEN_AUDIT_PARALLELISM"),
        }
    }

    assert_eq!(result, 12);
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_defaults() {
    let original = std::env::var("CONFWARDEN_AUDIT_DIALECT").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("CONFWARDEN_AUDIT_DIALECT", "braced");
    }

    let mut config = ConfwardenConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.audit.dialect.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("CONFWARDEN_AUDIT_DIALECT", val),
            None => std::env::remove_var("CONFWARDEN_AUDIT_DIALECT"),
        }
    }

    assert_eq!(result, "braced");
}

#[test]
#[serial_test::serial]
fn env_override_with_invalid_value_fails_validation() {
    let original = std::env::var("CONFWARDEN_GENERAL_LOG_FORMAT").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("CONFWARDEN_GENERAL_LOG_FORMAT", "xml");
    }

    let mut config = ConfwardenConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.validate();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("CONFWARDEN_GENERAL_LOG_FORMAT", val),
            None => std::env::remove_var("CONFWARDEN_GENERAL_LOG_FORMAT"),
        }
    }

    let err = result.unwrap_err();
    assert!(err.to_string().contains("log_format"));
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let result = ConfwardenConfig::from_file("/tmp/confwarden_test_nonexistent_12345.toml").await;
    assert!(matches!(
        result.unwrap_err(),
        ConfwardenError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
#[serial_test::serial]
async fn load_from_temp_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("confwarden.toml");
    std::fs::write(
        &path,
        "[audit]\nparallelism = 6\nevidence_limit = 10\n[general]\nlog_level = \"warn\"\n",
    )
    .expect("write config");

    let config = ConfwardenConfig::load(&path).await.expect("should load");
    assert_eq!(config.audit.parallelism, 6);
    assert_eq!(config.audit.evidence_limit, 10);
    assert_eq!(config.general.log_level, "warn");
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("confwarden.toml");
    std::fs::write(&path, "[audit]\nparallelism = 0\n").expect("write config");

    let err = ConfwardenConfig::from_file(&path).await.unwrap_err();
    assert!(matches!(
        err,
        ConfwardenError::Config(ConfigError::InvalidValue { .. })
    ));
}

//! confwarden-config-model — 장비 설정 파서와 구조화 모델
//!
//! 원시 장비 설정 텍스트를 블록/라인 트리([`ConfigModel`])로 만들고,
//! 모델에서 장비 유형([`Classification`])과 메타데이터([`DeviceMetadata`])를 추출합니다.
//!
//! # 구성
//! - [`parser`]: 방언 판별과 방언별 파서, [`ConfigModelBuilder`]
//! - [`model`]: 불변 설정 모델과 조회 API
//! - [`classifier`]: 가중 지표 기반 장비 유형 분류기
//! - [`metadata`]: 소프트웨어 버전, 호스트명 추출
//!
//! # 사용 예시
//! ```
//! use confwarden_config_model::{ConfigModelBuilder, DeviceClassifier};
//! use confwarden_core::DeviceType;
//!
//! let text = "hostname sw1\ninterface Gi0/1\n switchport mode access\n!\n";
//! let model = ConfigModelBuilder::new().build(text).unwrap();
//! let classification = DeviceClassifier::new().classify(&model);
//! assert_eq!(classification.device_type, DeviceType::Layer2Switch);
//! ```

pub mod classifier;
pub mod error;
pub mod metadata;
pub mod model;
pub mod parser;

pub use classifier::{Classification, Confidence, DecisionRule, DeviceClassifier, Scores};
pub use error::ConfigModelError;
pub use metadata::{DeviceMetadata, cis_benchmark_url};
pub use model::{BlockId, BlockKind, ConfigBlock, ConfigLine, ConfigModel, Node};
pub use parser::{ConfigModelBuilder, Dialect, DialectParser, ParseLimits};

#![no_main]

use confwarden_config_model::parser::split_lines;
use confwarden_config_model::{ConfigModelBuilder, DeviceClassifier, DeviceMetadata, Dialect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    for dialect in [None, Some(Dialect::Ios), Some(Dialect::Braced)] {
        let builder = ConfigModelBuilder::new().max_depth(16).dialect(dialect);
        let Ok(model) = builder.build(text) else {
            continue;
        };

        // 라인 텍스트는 원본 그대로
        let source = split_lines(text);
        assert_eq!(model.source_line_count(), source.len());
        assert_eq!(
            model.line_count() + model.consumed_line_count(),
            model.source_line_count()
        );
        for line in model.lines() {
            assert_eq!(source[line.number - 1], line.text);
        }

        let first = DeviceClassifier::new().classify(&model);
        let second = DeviceClassifier::new().classify(&model);
        assert_eq!(first, second);

        let _ = DeviceMetadata::extract(&model);
    }
});

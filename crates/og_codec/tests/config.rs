#![cfg(feature = "serde")]

use og_codec::{Codec, CodecOptions, ReuseStrategy};
use og_model::derive::Graph;

#[derive(Graph, Default, Debug, PartialEq)]
struct Setting {
    key: String,
    value: i32,
}

#[test]
fn options_from_ron() {
    let options: CodecOptions = ron::from_str(
        "(
            strategy: WideCircularSafe,
            max_depth: 32,
            max_references: 1000,
            specialize: false,
        )",
    )
    .unwrap();
    assert_eq!(
        options,
        CodecOptions {
            strategy: ReuseStrategy::WideCircularSafe,
            max_depth: 32,
            max_references: 1000,
            specialize: false,
        }
    );

    let text = ron::to_string(&options).unwrap();
    assert_eq!(ron::from_str::<CodecOptions>(&text).unwrap(), options);
}

#[test]
fn missing_keys_take_defaults() {
    let options: CodecOptions = serde_json::from_str(r#"{ "strategy": "NoTrackingFast" }"#).unwrap();
    assert_eq!(options.strategy, ReuseStrategy::NoTrackingFast);
    assert_eq!(options.max_depth, CodecOptions::DEFAULT_MAX_DEPTH);
    assert_eq!(options.max_references, CodecOptions::DEFAULT_MAX_REFERENCES);
    assert!(options.specialize);

    let empty: CodecOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, CodecOptions::default());

    assert!(serde_json::from_str::<CodecOptions>(r#"{ "strategy": "Sometimes" }"#).is_err());
}

#[test]
fn loaded_options_drive_the_codec() {
    let options: CodecOptions = serde_json::from_str(r#"{ "strategy": "NoTrackingFast", "max_depth": 8 }"#).unwrap();
    let codec = Codec::builder().options(options).build();
    assert_eq!(codec.options().max_depth, 8);

    let setting = Setting {
        key: String::from("volume"),
        value: 11,
    };
    let bytes = codec.encode(&setting).unwrap();
    assert_eq!(bytes, codec.encode_with(&setting, ReuseStrategy::NoTrackingFast).unwrap());
    assert_eq!(codec.decode::<Setting>(&bytes).unwrap(), setting);
}

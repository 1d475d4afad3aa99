use og_codec::{Codec, CodecError, DecodeTransform, ReuseStrategy};
use og_model::Graph;
use og_model::derive::Graph;
use og_model::info::{TypeInfo, Typed};

#[derive(Graph, Default, Debug, PartialEq)]
#[graph(name = "Reading")]
struct ReadingV1 {
    sensor: String,
    temperature: String,
}

#[derive(Graph, Default, Debug, PartialEq)]
#[graph(name = "Reading")]
struct ReadingV2 {
    sensor: String,
    temperature: f64,
}

#[derive(Graph, Default, Debug, PartialEq)]
struct Password {
    text: String,
}

#[derive(Graph, Default, Debug, PartialEq)]
struct Login {
    user: String,
    password: Password,
    backup: Option<Password>,
}

/// Reads `f64` members that were written as decimal text.
struct ParseFloat;

impl DecodeTransform for ParseFloat {
    fn source_type(&self, target: &'static TypeInfo) -> Option<&'static TypeInfo> {
        target.is::<f64>().then(String::type_info)
    }

    fn transform(
        &self,
        value: Box<dyn Graph>,
        _target: &'static TypeInfo,
    ) -> Result<Box<dyn Graph>, Box<dyn Graph>> {
        let text = value.take::<String>()?;
        match text.parse::<f64>() {
            Ok(n) => Ok(Box::new(n)),
            Err(_) => Err(Box::new(text)),
        }
    }
}

/// Maps the text `"n/a"` to absolute zero.
struct NotAvailable;

impl DecodeTransform for NotAvailable {
    fn source_type(&self, target: &'static TypeInfo) -> Option<&'static TypeInfo> {
        target.is::<f64>().then(String::type_info)
    }

    fn transform(
        &self,
        value: Box<dyn Graph>,
        _target: &'static TypeInfo,
    ) -> Result<Box<dyn Graph>, Box<dyn Graph>> {
        let text = value.take::<String>()?;
        if text == "n/a" {
            Ok(Box::new(-273.15_f64))
        } else {
            Err(Box::new(text))
        }
    }
}

fn reading(temperature: &str) -> ReadingV1 {
    ReadingV1 {
        sensor: String::from("roof"),
        temperature: String::from(temperature),
    }
}

#[test]
fn decode_transforms_convert_old_member_types() {
    let writer = Codec::new();
    let reader = Codec::builder().decode_transform(ParseFloat).build();

    for strategy in [ReuseStrategy::TreeWithReuse, ReuseStrategy::NoTrackingFast] {
        let bytes = writer.encode_with(&reading("21.5"), strategy).unwrap();
        assert_eq!(
            reader.decode::<ReadingV2>(&bytes).unwrap(),
            ReadingV2 {
                sensor: String::from("roof"),
                temperature: 21.5,
            }
        );
        assert!(matches!(
            writer.decode::<ReadingV2>(&bytes).unwrap_err(),
            CodecError::TypeMismatch { .. }
        ));
    }
}

#[test]
fn rejected_values_reach_the_next_transform() {
    let bytes = Codec::new().encode(&reading("n/a")).unwrap();

    let lenient = Codec::builder()
        .decode_transform(ParseFloat)
        .decode_transform(NotAvailable)
        .build();
    assert_eq!(lenient.decode::<ReadingV2>(&bytes).unwrap().temperature, -273.15);

    let strict = Codec::builder().decode_transform(ParseFloat).build();
    let err = strict.decode::<ReadingV2>(&bytes).unwrap_err();
    assert!(matches!(
        err,
        CodecError::TypeMismatch { expected, found } if expected == "f64" && found == "String"
    ));
}

#[test]
fn encode_transforms_replace_values() {
    let codec = Codec::builder()
        .encode_transform(|value: &dyn Graph| {
            value.downcast_ref::<Password>().map(|_| {
                Box::new(Password {
                    text: String::from("***"),
                }) as Box<dyn Graph>
            })
        })
        .build();
    let login = Login {
        user: String::from("root"),
        password: Password {
            text: String::from("hunter2"),
        },
        backup: Some(Password {
            text: String::from("letmein"),
        }),
    };

    for strategy in [
        ReuseStrategy::NoReuse,
        ReuseStrategy::TreeWithReuse,
        ReuseStrategy::WideCircularSafe,
        ReuseStrategy::NoTrackingFast,
    ] {
        let bytes = codec.encode_with(&login, strategy).unwrap();
        let decoded = codec.decode::<Login>(&bytes).unwrap();
        assert_eq!(decoded.user, "root");
        assert_eq!(decoded.password.text, "***", "{strategy:?}");
        assert_eq!(decoded.backup.unwrap().text, "***", "{strategy:?}");
    }
}

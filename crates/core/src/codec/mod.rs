//! Typed value codec.
//!
//! Bidirectional mapping between native [`Value`]s and self-describing
//! [`TaggedValue`]s. JSON cannot carry binary data or tell numeric subtypes
//! apart, so the tag states both explicitly instead of leaving them to
//! structural guessing on the other side of the transport.
//!
//! Both directions are pure and deterministic; for well-formed input
//! `decode(encode(v)) == v`.

pub mod array;
pub mod raster;
pub mod value;
pub mod wire;

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize as _;
use serde_json::{Map, Number};

use crate::error::CodecError;

pub use array::{DType, Element, NdArray};
pub use value::Value;
pub use wire::{Kind, TaggedValue};

/// Encode a native value into its tagged wire form.
///
/// Fails with [`CodecError::UnsupportedKind`] for values outside the closed
/// kind set.
pub fn encode(value: &Value) -> Result<TaggedValue, CodecError> {
    let tagged = match value {
        Value::String(s) => TaggedValue::new(Kind::String, s.clone().into()),
        Value::Int(i) => TaggedValue::new(Kind::Int, (*i).into()),
        Value::Float(f) => {
            let number = Number::from_f64(*f).ok_or_else(|| {
                CodecError::malformed("float", format!("{f} has no JSON representation"))
            })?;
            TaggedValue::new(Kind::Float, serde_json::Value::Number(number))
        }
        Value::Bool(b) => TaggedValue::new(Kind::Bool, (*b).into()),
        Value::Null => TaggedValue::new(Kind::Null, serde_json::Value::Null),
        Value::Bytes(bytes) => TaggedValue::new(Kind::Bytes, BASE64.encode(bytes).into()),
        Value::Array(array) => TaggedValue {
            kind: Kind::Array.tag().to_string(),
            data: BASE64.encode(array.as_bytes()).into(),
            shape: Some(array.shape().to_vec()),
            dtype: Some(array.dtype().name().to_string()),
        },
        Value::Image(img) => {
            let png = raster::encode_png(img)?;
            TaggedValue::new(Kind::Image, BASE64.encode(png).into())
        }
        Value::List(items) => TaggedValue::new(Kind::List, encode_sequence(items)?),
        Value::Tuple(items) => TaggedValue::new(Kind::Tuple, encode_sequence(items)?),
        Value::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, item) in entries {
                object.insert(key.clone(), serde_json::to_value(encode(item)?).map_err(json_err)?);
            }
            TaggedValue::new(Kind::Map, serde_json::Value::Object(object))
        }
        Value::Raw(_) => {
            return Err(CodecError::UnsupportedKind(
                "untyped payload of an unrecognized kind".to_string(),
            ))
        }
    };
    Ok(tagged)
}

/// Decode a tagged wire value into a native value.
///
/// Unrecognized tags are tolerated: the raw `data` payload is returned
/// unchanged as [`Value::Raw`]. A malformed payload for a recognized kind
/// is an error.
pub fn decode(tagged: &TaggedValue) -> Result<Value, CodecError> {
    let Some(kind) = tagged.known_kind() else {
        return Ok(Value::Raw(tagged.data.clone()));
    };
    let data = &tagged.data;

    let value = match kind {
        Kind::String => Value::String(
            data.as_str()
                .ok_or_else(|| CodecError::malformed("string", "expected a JSON string"))?
                .to_string(),
        ),
        Kind::Int => Value::Int(
            data.as_i64()
                .ok_or_else(|| CodecError::malformed("int", "expected a signed 64-bit integer"))?,
        ),
        Kind::Float => Value::Float(
            data.as_f64()
                .ok_or_else(|| CodecError::malformed("float", "expected a JSON number"))?,
        ),
        Kind::Bool => Value::Bool(
            data.as_bool()
                .ok_or_else(|| CodecError::malformed("bool", "expected true or false"))?,
        ),
        Kind::Null => {
            if !data.is_null() {
                return Err(CodecError::malformed("null", "expected null"));
            }
            Value::Null
        }
        Kind::Bytes => Value::Bytes(decode_base64("bytes", data)?),
        Kind::Array => Value::Array(decode_array(tagged)?),
        Kind::Image => {
            let encoded = data
                .as_str()
                .ok_or_else(|| CodecError::ImageDecode("expected a base64 string".to_string()))?;
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| CodecError::ImageDecode(format!("invalid base64: {e}")))?;
            Value::Image(raster::decode_rgb(&bytes)?)
        }
        Kind::List => Value::List(decode_sequence("list", data)?),
        Kind::Tuple => Value::Tuple(decode_sequence("tuple", data)?),
        Kind::Map => {
            let object = data
                .as_object()
                .ok_or_else(|| CodecError::malformed("dict", "expected a JSON object"))?;
            let mut entries = BTreeMap::new();
            for (key, item) in object {
                entries.insert(key.clone(), decode(&parse_nested("dict", item)?)?);
            }
            Value::Map(entries)
        }
    };
    Ok(value)
}

/// Decode positional arguments in order.
pub fn decode_args(args: &[TaggedValue]) -> Result<Vec<Value>, CodecError> {
    args.iter().map(decode).collect()
}

/// Decode keyword arguments.
pub fn decode_kwargs(
    kwargs: &BTreeMap<String, TaggedValue>,
) -> Result<BTreeMap<String, Value>, CodecError> {
    kwargs
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode(value)?)))
        .collect()
}

/// Encode positional arguments in order.
pub fn encode_args(args: &[Value]) -> Result<Vec<TaggedValue>, CodecError> {
    args.iter().map(encode).collect()
}

/// Encode keyword arguments.
pub fn encode_kwargs(
    kwargs: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, TaggedValue>, CodecError> {
    kwargs
        .iter()
        .map(|(key, value)| Ok((key.clone(), encode(value)?)))
        .collect()
}

fn encode_sequence(items: &[Value]) -> Result<serde_json::Value, CodecError> {
    let encoded = items
        .iter()
        .map(|item| serde_json::to_value(encode(item)?).map_err(json_err))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::Value::Array(encoded))
}

fn decode_sequence(kind: &'static str, data: &serde_json::Value) -> Result<Vec<Value>, CodecError> {
    data.as_array()
        .ok_or_else(|| CodecError::malformed(kind, "expected a JSON array"))?
        .iter()
        .map(|item| decode(&parse_nested(kind, item)?))
        .collect()
}

fn parse_nested(kind: &'static str, item: &serde_json::Value) -> Result<TaggedValue, CodecError> {
    TaggedValue::deserialize(item)
        .map_err(|e| CodecError::malformed(kind, format!("nested item is not a tagged value: {e}")))
}

fn decode_array(tagged: &TaggedValue) -> Result<NdArray, CodecError> {
    let shape = tagged
        .shape
        .clone()
        .ok_or_else(|| CodecError::malformed("ndarray", "missing shape"))?;
    let dtype_name = tagged
        .dtype
        .as_deref()
        .ok_or_else(|| CodecError::malformed("ndarray", "missing dtype"))?;
    let dtype = DType::parse(dtype_name)
        .ok_or_else(|| CodecError::malformed("ndarray", format!("unknown dtype '{dtype_name}'")))?;
    let bytes = decode_base64("ndarray", &tagged.data)?;
    NdArray::new(shape, dtype, bytes)
}

fn decode_base64(kind: &'static str, data: &serde_json::Value) -> Result<Vec<u8>, CodecError> {
    let encoded = data
        .as_str()
        .ok_or_else(|| CodecError::malformed(kind, "expected a base64 string"))?;
    BASE64
        .decode(encoded)
        .map_err(|e| CodecError::malformed(kind, format!("invalid base64: {e}")))
}

fn json_err(e: serde_json::Error) -> CodecError {
    CodecError::UnsupportedKind(format!("value is not JSON-serializable: {e}"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{Rgb, RgbImage};
    use serde_json::json;

    use super::*;

    fn round_trip(value: Value) {
        let tagged = encode(&value).unwrap();
        // Go through a JSON string to prove the form survives the transport.
        let text = serde_json::to_string(&tagged).unwrap();
        let parsed: TaggedValue = serde_json::from_str(&text).unwrap();
        assert_eq!(decode(&parsed).unwrap(), value);
    }

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(5, 4, |x, y| Rgb([x as u8 * 50, y as u8 * 60, 17]))
    }

    #[test]
    fn scalars_round_trip() {
        round_trip(Value::from("héllo"));
        round_trip(Value::Int(i64::MIN));
        round_trip(Value::Float(-0.125));
        round_trip(Value::Bool(true));
        round_trip(Value::Null);
        round_trip(Value::Bytes(vec![0, 255, 1, 254]));
    }

    #[test]
    fn image_round_trip_is_pixel_exact() {
        round_trip(Value::Image(sample_image()));
    }

    #[test]
    fn nested_containers_round_trip() {
        let mut map = BTreeMap::new();
        map.insert("size".to_string(), Value::Tuple(vec![Value::Int(3), Value::Int(4)]));
        map.insert(
            "tags".to_string(),
            Value::List(vec![Value::from("a"), Value::Null, Value::Float(1.5)]),
        );
        map.insert(
            "pixels".to_string(),
            Value::Array(NdArray::from_elements(vec![2], &[1u8, 2]).unwrap()),
        );
        round_trip(Value::List(vec![Value::Map(map), Value::Tuple(Vec::new())]));
    }

    #[test]
    fn int16_array_preserves_shape_dtype_and_values() {
        let values = [1i16, -2, 300, -32768, 32767, 0];
        let array = NdArray::from_elements(vec![2, 3], &values).unwrap();
        let tagged = encode(&Value::Array(array)).unwrap();

        assert_eq!(tagged.kind, "ndarray");
        assert_eq!(tagged.shape.as_deref(), Some(&[2usize, 3][..]));
        assert_eq!(tagged.dtype.as_deref(), Some("int16"));

        let Value::Array(decoded) = decode(&tagged).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(decoded.shape(), &[2, 3]);
        assert_eq!(decoded.dtype(), DType::Int16);
        assert_eq!(decoded.to_vec::<i16>().unwrap(), values.to_vec());
    }

    #[test]
    fn truncated_array_buffer_is_shape_mismatch() {
        let tagged = TaggedValue {
            kind: "ndarray".into(),
            data: BASE64.encode([0u8; 11]).into(),
            shape: Some(vec![2, 3]),
            dtype: Some("int16".into()),
        };
        assert_matches!(decode(&tagged), Err(CodecError::ShapeMismatch(_)));
    }

    #[test]
    fn array_typestr_dtype_is_accepted_and_canonicalized() {
        let tagged = TaggedValue {
            kind: "ndarray".into(),
            data: BASE64.encode(7i16.to_le_bytes()).into(),
            shape: Some(vec![1]),
            dtype: Some("<i2".into()),
        };
        let value = decode(&tagged).unwrap();
        assert_eq!(encode(&value).unwrap().dtype.as_deref(), Some("int16"));
    }

    #[test]
    fn unknown_kind_returns_raw_payload() {
        let tagged: TaggedValue = serde_json::from_value(json!({"type": "mystery", "data": 42})).unwrap();
        assert_eq!(decode(&tagged).unwrap(), Value::Raw(json!(42)));
    }

    #[test]
    fn raw_value_cannot_be_encoded() {
        assert_matches!(
            encode(&Value::Raw(json!({"a": 1}))),
            Err(CodecError::UnsupportedKind(_))
        );
    }

    #[test]
    fn non_finite_float_is_rejected() {
        assert!(encode(&Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn malformed_payloads_for_known_kinds_raise() {
        let cases = [
            json!({"type": "int", "data": "seven"}),
            json!({"type": "int", "data": 1.5}),
            json!({"type": "bool", "data": 1}),
            json!({"type": "string", "data": 3}),
            json!({"type": "null", "data": 0}),
            json!({"type": "bytes", "data": "!!not base64!!"}),
            json!({"type": "list", "data": {"a": 1}}),
            json!({"type": "list", "data": [1, 2]}),
            json!({"type": "dict", "data": [1]}),
            json!({"type": "ndarray", "data": "AAAA", "dtype": "int8"}),
            json!({"type": "ndarray", "data": "AAAA", "shape": [3], "dtype": "quad"}),
        ];
        for case in cases {
            let tagged: TaggedValue = serde_json::from_value(case.clone()).unwrap();
            assert_matches!(
                decode(&tagged),
                Err(CodecError::MalformedPayload { .. }),
                "case {case}"
            );
        }
    }

    #[test]
    fn bad_image_bytes_fail_with_image_decode() {
        let not_base64: TaggedValue =
            serde_json::from_value(json!({"type": "image_bytes", "data": "%%%"})).unwrap();
        assert_matches!(decode(&not_base64), Err(CodecError::ImageDecode(_)));

        let not_an_image: TaggedValue = serde_json::from_value(
            json!({"type": "image_bytes", "data": BASE64.encode(b"plain text")}),
        )
        .unwrap();
        assert_matches!(decode(&not_an_image), Err(CodecError::ImageDecode(_)));
    }

    #[test]
    fn encode_of_decode_reproduces_well_formed_input() {
        let inputs = [
            json!({"type": "string", "data": "x"}),
            json!({"type": "int", "data": -4}),
            json!({"type": "float", "data": 2.5}),
            json!({"type": "bytes", "data": BASE64.encode([9u8, 8, 7])}),
            json!({"type": "tuple", "data": [{"type": "bool", "data": false}]}),
            json!({"type": "dict", "data": {"k": {"type": "null", "data": null}}}),
        ];
        for input in inputs {
            let tagged: TaggedValue = serde_json::from_value(input).unwrap();
            assert_eq!(encode(&decode(&tagged).unwrap()).unwrap(), tagged);
        }
    }

    #[test]
    fn alias_tags_decode_to_canonical_kinds() {
        let tagged: TaggedValue =
            serde_json::from_value(json!({"type": "map", "data": {}})).unwrap();
        let value = decode(&tagged).unwrap();
        assert_eq!(encode(&value).unwrap().kind, "dict");
    }

    #[test]
    fn kwargs_helpers_preserve_keys() {
        let mut kwargs = BTreeMap::new();
        kwargs.insert("width".to_string(), Value::Int(10));
        let encoded = encode_kwargs(&kwargs).unwrap();
        assert_eq!(decode_kwargs(&encoded).unwrap(), kwargs);
    }
}

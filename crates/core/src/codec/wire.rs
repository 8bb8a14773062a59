//! Wire form of a tagged value.
//!
//! Every argument and result crosses the transport as
//! `{"type": <tag>, "data": <payload>}`; arrays additionally carry
//! `"shape"` and `"dtype"`.

use serde::{Deserialize, Serialize};

/// Closed set of value kinds the codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int,
    Float,
    Bool,
    Null,
    Bytes,
    Array,
    Image,
    List,
    Tuple,
    Map,
}

impl Kind {
    pub const ALL: [Kind; 11] = [
        Kind::String,
        Kind::Int,
        Kind::Float,
        Kind::Bool,
        Kind::Null,
        Kind::Bytes,
        Kind::Array,
        Kind::Image,
        Kind::List,
        Kind::Tuple,
        Kind::Map,
    ];

    /// Canonical wire tag written by the encoder.
    pub fn tag(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
            Kind::Null => "null",
            Kind::Bytes => "bytes",
            Kind::Array => "ndarray",
            Kind::Image => "image_bytes",
            Kind::List => "list",
            Kind::Tuple => "tuple",
            Kind::Map => "dict",
        }
    }

    /// Resolve a wire tag, including the accepted aliases.
    ///
    /// Returns `None` for tags outside the closed set; the decoder passes
    /// such payloads through untouched.
    pub fn from_tag(tag: &str) -> Option<Kind> {
        let kind = match tag {
            "string" => Kind::String,
            "int" => Kind::Int,
            "float" => Kind::Float,
            "bool" => Kind::Bool,
            "null" => Kind::Null,
            "bytes" => Kind::Bytes,
            "ndarray" | "array" => Kind::Array,
            "image_bytes" | "image" => Kind::Image,
            "list" => Kind::List,
            "tuple" => Kind::Tuple,
            "dict" | "map" => Kind::Map,
            _ => return None,
        };
        Some(kind)
    }
}

/// Self-describing, JSON-safe value envelope.
///
/// `kind` is kept as a raw string so that tags from newer producers survive
/// deserialization and can be handed back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedValue {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<String>,
}

impl TaggedValue {
    pub fn new(kind: Kind, data: serde_json::Value) -> Self {
        Self {
            kind: kind.tag().to_string(),
            data,
            shape: None,
            dtype: None,
        }
    }

    /// The recognized kind of this value, if any.
    pub fn known_kind(&self) -> Option<Kind> {
        Kind::from_tag(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_canonical_tag_resolves_to_its_kind() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_tag(kind.tag()), Some(kind));
        }
    }

    #[test]
    fn aliases_resolve() {
        assert_eq!(Kind::from_tag("array"), Some(Kind::Array));
        assert_eq!(Kind::from_tag("image"), Some(Kind::Image));
        assert_eq!(Kind::from_tag("map"), Some(Kind::Map));
        assert_eq!(Kind::from_tag("mystery"), None);
    }

    #[test]
    fn array_fields_are_omitted_for_scalars() {
        let value = TaggedValue::new(Kind::Int, serde_json::json!(7));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!({"type": "int", "data": 7}));
    }

    #[test]
    fn missing_data_defaults_to_null() {
        let value: TaggedValue = serde_json::from_str(r#"{"type":"null"}"#).unwrap();
        assert!(value.data.is_null());
    }
}

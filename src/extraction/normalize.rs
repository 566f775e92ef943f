use serde_json::Value;

/// Shape of an extracted field before it is flattened to form text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// `null` is treated as absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(Self::List(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(scalar_text)
                    .collect(),
            )),
            other => Some(Self::Scalar(scalar_text(other))),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Scalar(text) => text,
            Self::List(items) => items.join(", "),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten one optional extracted field to the text a form field holds.
///
/// Lists join with `", "`, absent fields become empty, everything else is
/// stringified. Feeding the output back in yields the same text.
pub fn normalize_field(value: Option<&Value>) -> String {
    value
        .and_then(FieldValue::from_json)
        .map(FieldValue::into_text)
        .unwrap_or_default()
}

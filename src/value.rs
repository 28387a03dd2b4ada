use serde_json::Value;

/// A value read back from the store.
///
/// Entries written through the store are JSON and come back as `Json`. Entries
/// written by other systems that do not parse as JSON are returned unchanged,
/// as text when responses are decoded and the bytes are UTF-8, raw otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Json(Value),
    Text(String),
    Bytes(Vec<u8>),
}

impl StoredValue {
    /// Decode a raw backend entry, falling back to the untouched payload.
    pub fn decode(raw: Vec<u8>, decode_responses: bool) -> Self {
        if let Ok(value) = serde_json::from_slice::<Value>(&raw) {
            return StoredValue::Json(value);
        }

        if !decode_responses {
            return StoredValue::Bytes(raw);
        }

        match String::from_utf8(raw) {
            Ok(text) => StoredValue::Text(text),
            Err(err) => StoredValue::Bytes(err.into_bytes()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            StoredValue::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Text content: a legacy text entry or a JSON string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Json(Value::String(s)) => Some(s),
            StoredValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// True for entries that did not parse as JSON.
    pub fn is_raw(&self) -> bool {
        !matches!(self, StoredValue::Json(_))
    }

    /// View the entry as JSON; legacy text becomes a JSON string.
    /// Raw non-UTF-8 bytes have no JSON form.
    pub fn into_json(self) -> Option<Value> {
        match self {
            StoredValue::Json(value) => Some(value),
            StoredValue::Text(text) => Some(Value::String(text)),
            StoredValue::Bytes(_) => None,
        }
    }
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        StoredValue::Json(value)
    }
}

impl PartialEq<Value> for StoredValue {
    fn eq(&self, other: &Value) -> bool {
        matches!(self, StoredValue::Json(value) if value == other)
    }
}

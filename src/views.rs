//! Unit Data Views
//!
//! Dictionary-like views over one unit's relation data. [`UnitDataView`] holds
//! raw strings; [`JsonDataView`] wraps it and transparently encodes values as
//! JSON on write and decodes them on read. Both behave like a map that answers
//! missing keys with an absent value and that rejects writes unless it was
//! built writeable.

use crate::error::EndpointError;
use crate::types::RawData;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use std::io;
use tracing::trace;

/// Common surface of raw and JSON-decoding data views.
pub trait DataView {
    type Value;

    /// Value for `key`, or `None` when the peer never set it.
    fn get(&self, key: &str) -> Option<Self::Value>;

    /// Store `value` under `key` and mark the view modified.
    fn set(&mut self, key: &str, value: Self::Value) -> Result<(), EndpointError>;

    fn contains_key(&self, key: &str) -> bool;

    fn keys(&self) -> Vec<String>;

    /// Whether any key has been assigned since construction.
    fn modified(&self) -> bool;

    /// Whether assignments are permitted.
    fn writeable(&self) -> bool;

    /// Value for `key`, or `default` when absent.
    fn get_or(&self, key: &str, default: Self::Value) -> Self::Value {
        self.get(key).unwrap_or(default)
    }
}

/// Raw string view of a unit's data.
#[derive(Debug, Clone, Default)]
pub struct UnitDataView {
    data: RawData,
    writeable: bool,
    modified: bool,
}

impl UnitDataView {
    /// Read-only view, as used for data received from remote units.
    pub fn new(data: RawData) -> Self {
        Self {
            data,
            writeable: false,
            modified: false,
        }
    }

    /// Writeable view, as used for the local unit's published data.
    pub fn writeable(data: RawData) -> Self {
        Self {
            data,
            writeable: true,
            modified: false,
        }
    }

    /// Underlying mapping.
    pub fn data(&self) -> &RawData {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl DataView for UnitDataView {
    type Value = String;

    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), EndpointError> {
        if !self.writeable {
            return Err(EndpointError::WriteNotPermitted(key.to_string()));
        }
        self.modified = true;
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn modified(&self) -> bool {
        self.modified
    }

    fn writeable(&self) -> bool {
        self.writeable
    }
}

/// JSON-decoding view over a [`UnitDataView`].
///
/// Reads decode the stored text as JSON. Empty values are returned as-is, and
/// text that is not valid JSON (written by peers that predate JSON encoding)
/// comes back as a plain string. Writes serialize with object keys sorted, so
/// the stored text only changes when the logical value does.
#[derive(Debug, Clone, Default)]
pub struct JsonDataView {
    raw: UnitDataView,
}

impl JsonDataView {
    pub fn new(raw: UnitDataView) -> Self {
        Self { raw }
    }

    /// The data without automatic encoding / decoding.
    pub fn raw_data(&self) -> &UnitDataView {
        &self.raw
    }

    pub fn raw_data_mut(&mut self) -> &mut UnitDataView {
        &mut self.raw
    }

    /// Decoded key/value pairs in key order.
    pub fn items(&self) -> Vec<(String, Value)> {
        self.raw
            .iter()
            .map(|(key, raw)| (key.clone(), decode(raw)))
            .collect()
    }

    /// Decode `key` into a concrete type.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, EndpointError> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize any value and store it under `key`.
    pub fn set_serialized<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), EndpointError> {
        let value = serde_json::to_value(value)?;
        self.set(key, value)
    }
}

impl From<UnitDataView> for JsonDataView {
    fn from(raw: UnitDataView) -> Self {
        Self::new(raw)
    }
}

impl DataView for JsonDataView {
    type Value = Value;

    fn get(&self, key: &str) -> Option<Value> {
        self.raw.data.get(key).map(|raw| decode(raw))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), EndpointError> {
        let encoded = encode(&value)?;
        self.raw.set(key, encoded)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.raw.keys()
    }

    fn modified(&self) -> bool {
        self.raw.modified()
    }

    fn writeable(&self) -> bool {
        self.raw.writeable()
    }
}

/// Decode stored text, falling back to the text itself.
pub(crate) fn decode(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            trace!(error = %err, "Relation value is not JSON; passing through raw text");
            Value::String(raw.to_string())
        }
    }
}

/// Encode a value with object keys sorted, at every nesting level.
///
/// Output uses spaced separators and ASCII-only escapes, the form existing
/// peers already publish, so republishing an unchanged value leaves the
/// stored text unchanged.
pub(crate) fn encode(value: &Value) -> Result<String, EndpointError> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, WireFormatter);
    sorted(value).serialize(&mut serializer)?;
    String::from_utf8(out)
        .map_err(|err| <serde_json::Error as serde::ser::Error>::custom(err).into())
}

/// `", "` and `": "` separators, everything outside printable ASCII
/// escaped as `\uXXXX` (UTF-16 surrogate pairs above the BMP).
struct WireFormatter;

impl Formatter for WireFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

// Rebuilt explicitly so the output stays sorted even if serde_json's
// `preserve_order` feature gets unified in by another dependency.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

//! Strict JSON request decoding and classification of decode failures into HTTP responses.

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::value::StrDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::error::Category;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const UNKNOWN_FIELD_PREFIX: &str = "unknown field ";

/// Why a request body could not become a model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed JSON at byte {offset}")]
    Malformed { offset: usize },
    #[error("invalid value for {field:?} at byte {offset}")]
    TypeMismatch { field: String, offset: usize },
    #[error("truncated JSON")]
    Truncated,
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("empty body")]
    Empty,
    #[error("body exceeds {MAX_BODY_BYTES} bytes")]
    TooLarge,
    #[error("decode: {0}")]
    Other(String),
}

impl DecodeError {
    pub fn status(&self) -> StatusCode {
        match self {
            DecodeError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            DecodeError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing text.
    pub fn message(&self) -> String {
        match self {
            DecodeError::Malformed { offset } => {
                format!("Request body contains badly-formed JSON (at position {})", offset)
            }
            DecodeError::TypeMismatch { field, offset } => format!(
                "Request body contains an invalid value for the {:?} field (at position {})",
                field, offset
            ),
            DecodeError::Truncated => "Request body contains badly-formed JSON".to_string(),
            DecodeError::UnknownField(name) => format!("Request body contains unknown field {:?}", name),
            DecodeError::Empty => "Request body must not be empty".to_string(),
            DecodeError::TooLarge => "Request body must not be larger than 1MB".to_string(),
            DecodeError::Other(_) => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for DecodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "error decoding the object from the request");
        } else {
            tracing::warn!(error = %self, "error decoding the object from the request");
        }
        (status, self.message()).into_response()
    }
}

/// Raw failure before classification.
#[derive(Debug)]
enum Failure {
    Json(serde_json::Error),
    UnknownField(String),
    TooLarge,
    Read(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Json(e) => write!(f, "{}", e),
            Failure::UnknownField(name) => write!(f, "{}`{}`", UNKNOWN_FIELD_PREFIX, name),
            Failure::TooLarge => write!(f, "request body too large"),
            Failure::Read(e) => write!(f, "read body: {}", e),
        }
    }
}

/// Read `body` (at most [`MAX_BODY_BYTES`]) and decode it strictly into `T`.
pub async fn decode<T: DeserializeOwned>(body: Body) -> Result<T, DecodeError> {
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let failure = if e.downcast_ref::<LengthLimitError>().is_some() {
                Failure::TooLarge
            } else {
                Failure::Read(e.to_string())
            };
            return Err(classify(&failure, &[]));
        }
    };
    decode_slice(&bytes)
}

/// Decode `body` strictly into `T`: every object key, at any depth, must be a field of the
/// struct it lands in.
///
/// The whole value is syntax-checked before any field is mapped, so a syntax error anywhere
/// wins over a type or field error earlier in the body. Between an unknown field and a typed
/// decode failure, the one earlier in the body is reported; an unknown field also wins over
/// failures that carry no position, such as a missing field.
pub fn decode_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice::<de::IgnoredAny>(body).map_err(|e| classify(&Failure::Json(e), body))?;
    let unknown = first_unknown_field::<T>(body);
    match serde_json::from_slice::<T>(body) {
        Ok(value) => match unknown {
            Some((name, _)) => Err(classify(&Failure::UnknownField(name), body)),
            None => Ok(value),
        },
        Err(e) => {
            let typed = classify(&Failure::Json(e), body);
            let unknown_first = match (&unknown, &typed) {
                (Some((_, at)), DecodeError::TypeMismatch { offset, .. }) => at < offset,
                (Some(_), DecodeError::Other(_)) => true,
                _ => false,
            };
            match unknown {
                Some((name, _)) if unknown_first => Err(classify(&Failure::UnknownField(name), body)),
                _ => Err(typed),
            }
        }
    }
}

/// Map a raw failure to exactly one classification. Checks run in a fixed order and the first
/// match wins: syntax, type mismatch, truncation, unknown field, empty, oversize, other.
fn classify(failure: &Failure, body: &[u8]) -> DecodeError {
    let json = match failure {
        Failure::Json(e) => Some(e),
        _ => None,
    };

    if let Some(e) = json.filter(|e| e.classify() == Category::Syntax) {
        return DecodeError::Malformed {
            offset: byte_offset(body, e.line(), e.column()),
        };
    }
    if let Some(e) = json.filter(|e| is_type_mismatch(e)) {
        let offset = byte_offset(body, e.line(), e.column());
        return DecodeError::TypeMismatch {
            field: field_path_at(body, offset),
            offset,
        };
    }
    let eof = json.is_some_and(serde_json::Error::is_eof);
    if eof && !is_blank(body) {
        return DecodeError::Truncated;
    }
    let text = failure.to_string();
    if let Some(rest) = text.strip_prefix(UNKNOWN_FIELD_PREFIX) {
        return DecodeError::UnknownField(backticked(rest));
    }
    if eof {
        return DecodeError::Empty;
    }
    if matches!(failure, Failure::TooLarge) {
        return DecodeError::TooLarge;
    }
    DecodeError::Other(text)
}

fn is_type_mismatch(e: &serde_json::Error) -> bool {
    if e.classify() != Category::Data {
        return false;
    }
    let msg = e.to_string();
    ["invalid type", "invalid value", "invalid length"]
        .iter()
        .any(|p| msg.starts_with(p))
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// "`extra`, expected one of ..." -> "extra".
fn backticked(rest: &str) -> String {
    rest.strip_prefix('`')
        .and_then(|r| r.split('`').next())
        .unwrap_or(rest)
        .to_string()
}

/// Byte offset of a 1-based line and 0-based byte column.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = body
        .split(|&b| b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    (line_start + column).min(body.len())
}

enum Frame {
    Object(Option<String>),
    Array,
}

/// Scan `body[..end]` tracking the object keys that enclose each byte. `on_key` is called with
/// the offset of every key's opening quote and the stack with that key recorded; returning
/// `true` stops the scan. Returns the stack at the stopping point.
fn scan_keys(body: &[u8], end: usize, mut on_key: impl FnMut(usize, &[Frame]) -> bool) -> Vec<Frame> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut expect_key = false;
    let end = end.min(body.len());
    let mut i = 0;
    while i < end {
        match body[i] {
            b'{' => {
                stack.push(Frame::Object(None));
                expect_key = true;
            }
            b'[' => {
                stack.push(Frame::Array);
                expect_key = false;
            }
            b'}' | b']' => {
                stack.pop();
                expect_key = false;
            }
            b',' => expect_key = matches!(stack.last(), Some(Frame::Object(_))),
            b'"' => {
                let quote = i;
                let start = i + 1;
                i = start;
                while i < body.len() && body[i] != b'"' {
                    if body[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if expect_key {
                    if let Some(Frame::Object(key)) = stack.last_mut() {
                        let raw = &body[start..i.min(body.len())];
                        *key = Some(String::from_utf8_lossy(raw).into_owned());
                    }
                    expect_key = false;
                    if on_key(quote, &stack) {
                        return stack;
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }
    stack
}

fn keys_of(stack: &[Frame]) -> impl Iterator<Item = &str> {
    stack.iter().filter_map(|f| match f {
        Frame::Object(Some(k)) => Some(k.as_str()),
        _ => None,
    })
}

/// Dotted path of the object keys enclosing byte `offset`, e.g. "owner.name".
fn field_path_at(body: &[u8], offset: usize) -> String {
    let stack = scan_keys(body, offset, |_, _| false);
    keys_of(&stack).collect::<Vec<_>>().join(".")
}

/// Offset of the first key whose enclosing key path is `path`.
fn key_offset(body: &[u8], path: &[String]) -> Option<usize> {
    let mut found = None;
    scan_keys(body, body.len(), |at, stack| {
        if keys_of(stack).eq(path.iter().map(String::as_str)) {
            found = Some(at);
            true
        } else {
            false
        }
    });
    found
}

/// Unknown key of `body` that comes first in the body, with its offset. Objects are checked
/// against the struct `T` places them in; maps, enums and flattened structs accept any key.
fn first_unknown_field<T: DeserializeOwned>(body: &[u8]) -> Option<(String, usize)> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let mut found = Vec::new();
    collect_unknown::<T>(&value, &mut Vec::new(), &mut Vec::new(), &mut found);
    found
        .into_iter()
        .filter_map(|keys| {
            let at = key_offset(body, &keys).unwrap_or(body.len());
            keys.last().map(|name| (name.clone(), at))
        })
        .min_by_key(|(_, at)| *at)
}

/// `path` holds field indices from `T` down to `value`, `keys` the matching body keys.
fn collect_unknown<T: DeserializeOwned>(
    value: &Value,
    path: &mut Vec<usize>,
    keys: &mut Vec<String>,
    found: &mut Vec<Vec<String>>,
) {
    match value {
        Value::Object(map) => {
            let Some(fields) = declared_fields::<T>(path) else {
                return;
            };
            for (key, child) in map {
                keys.push(key.clone());
                match fields.iter().position(|f| *f == key.as_str()) {
                    Some(index) => {
                        path.push(index);
                        collect_unknown::<T>(child, path, keys, found);
                        path.pop();
                    }
                    None => found.push(keys.clone()),
                }
                keys.pop();
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_unknown::<T>(item, path, keys, found);
            }
        }
        _ => {}
    }
}

/// Field names of the struct reached from `T` by following `path` (field indices through
/// structs, options, newtypes and sequences). `None` when that spot is not a plain struct.
fn declared_fields<T: DeserializeOwned>(path: &[usize]) -> Option<&'static [&'static str]> {
    match T::deserialize(FieldProbe { path }) {
        Err(Probed(fields)) => fields,
        Ok(_) => None,
    }
}

/// Deserializer that feeds a derived visitor just enough input to reach the struct at `path`,
/// then fails carrying that struct's field list.
struct FieldProbe<'p> {
    path: &'p [usize],
}

#[derive(Debug)]
struct Probed(Option<&'static [&'static str]>);

impl fmt::Display for Probed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("field probe")
    }
}

impl std::error::Error for Probed {}

impl de::Error for Probed {
    fn custom<M: fmt::Display>(_msg: M) -> Self {
        Probed(None)
    }
}

impl<'de, 'p> de::Deserializer<'de> for FieldProbe<'p> {
    type Error = Probed;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Probed> {
        Err(Probed(None))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Probed> {
        match self.path.split_first() {
            None => Err(Probed(Some(fields))),
            Some((&index, rest)) => {
                let key = fields.get(index).copied().ok_or(Probed(None))?;
                visitor.visit_map(ProbeField { key: Some(key), rest })
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Probed> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Probed> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Probed> {
        visitor.visit_seq(ProbeElement { probe: Some(self) })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct map enum identifier ignored_any
    }
}

/// One struct field whose value is probed further down the path.
struct ProbeField<'p> {
    key: Option<&'static str>,
    rest: &'p [usize],
}

impl<'de, 'p> de::MapAccess<'de> for ProbeField<'p> {
    type Error = Probed;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Probed> {
        match self.key.take() {
            Some(key) => {
                let key: StrDeserializer<'_, Probed> = key.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Probed> {
        seed.deserialize(FieldProbe { path: self.rest })
    }
}

/// A single sequence element, probed with the same path.
struct ProbeElement<'p> {
    probe: Option<FieldProbe<'p>>,
}

impl<'de, 'p> de::SeqAccess<'de> for ProbeElement<'p> {
    type Error = Probed;

    fn next_element_seed<E: de::DeserializeSeed<'de>>(&mut self, seed: E) -> Result<Option<E::Value>, Probed> {
        match self.probe.take() {
            Some(probe) => seed.deserialize(probe).map(Some),
            None => Ok(None),
        }
    }
}

//! # Server-Sent Events (SSE) Parsing Library
//!
//! Transport-agnostic SSE parsing built as a linear pull chain of stages:
//!
//! - `decoder`: chunked bytes to UTF-8 text fragments
//! - `splitter`: text fragments to delimiter-bounded parts
//! - `parser`: parts to `SseRecord` key/value maps
//! - `pipeline`: configuration and assembly of the stages
//! - `stream`: `EventStream`, the cancellable consumer-facing sequence

use crate::core::error::SdkError;
use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;

/// Delimiter between events.
pub const DEFAULT_STREAM_SEPARATOR: &str = "\n\n";
/// Delimiter between fields within an event.
pub const DEFAULT_PART_SEPARATOR: &str = "\n";
/// Delimiter between a field name and its value.
pub const DEFAULT_KV_SEPARATOR: &str = ":";

/// Boxed stage output; every stage speaks this shape.
pub type BoxedStream<T> = Pin<Box<dyn Stream<Item = Result<T, SdkError>> + Send>>;
/// Raw chunked bytes from the transport.
pub type ByteStream = BoxedStream<Bytes>;
/// Decoded text fragments with arbitrary boundaries.
pub type TextStream = BoxedStream<String>;
/// Parsed records.
pub type RecordStream = BoxedStream<SseRecord>;

/// Parsed key/value result of one part.
///
/// Any field name found in the input is kept; `data`, `event`, `id` and
/// `retry` get typed accessors. Duplicate keys resolve last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SseRecord {
    fields: BTreeMap<String, String>,
}

impl SseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any earlier value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn data(&self) -> Option<&str> {
        self.get("data")
    }

    pub fn event(&self) -> Option<&str> {
        self.get("event")
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    /// Retry hint in milliseconds; values are not validated, so anything
    /// that is not an unsigned integer reads as `None`.
    pub fn retry(&self) -> Option<u64> {
        self.get("retry").and_then(|v| v.parse().ok())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render the record as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SseRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = SseRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

pub mod decoder;
pub mod parser;
pub mod pipeline;
pub mod splitter;
pub mod stream;

pub use decoder::{decode_text, Utf8Decoder};
pub use parser::{parse_parts, PartParser};
pub use pipeline::{sse_records, PipelineBuilder, Separators};
pub use splitter::{split_parts, PartSplitter};
#[cfg(feature = "stream")]
pub use stream::SseStreamExt;
pub use stream::{EventStream, StreamState};

#[cfg(test)]
#[path = "../tests/decoder_tests.rs"]
mod decoder_tests;

#[cfg(test)]
#[path = "../tests/splitter_tests.rs"]
mod splitter_tests;

#[cfg(test)]
#[path = "../tests/parser_tests.rs"]
mod parser_tests;

#[cfg(test)]
#[path = "../tests/pipeline_tests.rs"]
mod pipeline_tests;

#[cfg(test)]
#[path = "../tests/stream_tests.rs"]
mod stream_tests;

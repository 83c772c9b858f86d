//! Parsing of complete parts into `SseRecord`s.

use crate::core::SdkError;
use crate::streaming_sse::{SseRecord, DEFAULT_KV_SEPARATOR, DEFAULT_PART_SEPARATOR};
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::trace;

/// Stateless `field<kv>value` line parser.
#[derive(Debug, Clone)]
pub struct PartParser {
    field_delimiter: String,
    kv_delimiter: String,
}

impl PartParser {
    /// Create a parser, rejecting empty delimiters.
    pub fn try_new(
        field_delimiter: impl Into<String>,
        kv_delimiter: impl Into<String>,
    ) -> Result<Self, SdkError> {
        let field_delimiter = field_delimiter.into();
        let kv_delimiter = kv_delimiter.into();
        if field_delimiter.is_empty() {
            return Err(SdkError::invalid_option("part_separator", "must not be empty"));
        }
        if kv_delimiter.is_empty() {
            return Err(SdkError::invalid_option("kv_separator", "must not be empty"));
        }
        Ok(Self {
            field_delimiter,
            kv_delimiter,
        })
    }

    /// Parse one part.
    ///
    /// Lines without the key/value delimiter, or whose key is blank, are
    /// skipped. The key is kept verbatim; the value is trimmed. Returns
    /// `None` when no line yields a field.
    pub fn parse(&self, part: &str) -> Option<SseRecord> {
        let mut record = SseRecord::new();
        for line in part.split(self.field_delimiter.as_str()) {
            let Some((key, value)) = line.split_once(self.kv_delimiter.as_str()) else {
                continue;
            };
            if key.trim().is_empty() {
                continue;
            }
            record.insert(key, value.trim());
        }

        if record.is_empty() {
            None
        } else {
            Some(record)
        }
    }
}

impl Default for PartParser {
    fn default() -> Self {
        Self {
            field_delimiter: DEFAULT_PART_SEPARATOR.to_string(),
            kv_delimiter: DEFAULT_KV_SEPARATOR.to_string(),
        }
    }
}

/// Parse a stream of complete parts; parts without fields produce nothing.
pub fn parse_parts<S>(
    parts: S,
    field_delimiter: String,
    kv_delimiter: String,
) -> impl Stream<Item = Result<SseRecord, SdkError>> + Send
where
    S: Stream<Item = Result<String, SdkError>> + Send + 'static,
{
    async_stream::try_stream! {
        let parser = PartParser::try_new(field_delimiter, kv_delimiter)?;
        futures_util::pin_mut!(parts);

        while let Some(part) = parts.next().await {
            let part = part?;
            match parser.parse(&part) {
                Some(record) => {
                    trace!(target: "sse_pipeline::parser", fields = record.len(), "record");
                    yield record;
                }
                None => {
                    trace!(target: "sse_pipeline::parser", len = part.len(), "part without fields skipped");
                }
            }
        }
    }
}

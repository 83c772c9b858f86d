//! Re-splitting of text fragments into delimiter-bounded parts.

use crate::core::SdkError;
use crate::streaming_sse::DEFAULT_STREAM_SEPARATOR;
use futures_core::Stream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Incremental splitter that handles delimiters cut by chunk boundaries.
///
/// Parts that are empty or whitespace-only are dropped. Emitted parts are
/// otherwise passed through untouched, including surrounding whitespace.
#[derive(Debug)]
pub struct PartSplitter {
    delimiter: String,
    /// Text after the last delimiter seen so far
    buffer: String,
    /// Queue of completed parts ready to be yielded
    ready: VecDeque<String>,
}

impl PartSplitter {
    /// Create a splitter, rejecting an empty delimiter.
    pub fn try_new(delimiter: impl Into<String>) -> Result<Self, SdkError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(SdkError::invalid_option(
                "stream_separator",
                "must not be empty",
            ));
        }
        Ok(Self {
            delimiter,
            buffer: String::new(),
            ready: VecDeque::new(),
        })
    }

    /// Create a splitter; an empty delimiter falls back to the default.
    pub fn new(delimiter: impl Into<String>) -> Self {
        match Self::try_new(delimiter) {
            Ok(splitter) => splitter,
            Err(err) => {
                debug!(
                    target: "sse_pipeline::splitter",
                    error = %err,
                    "falling back to default stream separator"
                );
                Self {
                    delimiter: DEFAULT_STREAM_SEPARATOR.to_string(),
                    buffer: String::new(),
                    ready: VecDeque::new(),
                }
            }
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Push a text fragment and get any parts it completes.
    pub fn push(&mut self, fragment: &str) -> impl Iterator<Item = String> + '_ {
        // The buffered remainder holds no full delimiter, so only its tail
        // can begin one that this fragment completes.
        let mut from = self
            .buffer
            .len()
            .saturating_sub(self.delimiter.len() - 1);
        while !self.buffer.is_char_boundary(from) {
            from -= 1;
        }
        self.buffer.push_str(fragment);

        let mut start = 0;
        while let Some(pos) = self.buffer[from..].find(self.delimiter.as_str()) {
            let end = from + pos;
            let part = &self.buffer[start..end];
            if !part.trim().is_empty() {
                self.ready.push_back(part.to_string());
            }
            start = end + self.delimiter.len();
            from = start;
        }
        self.buffer.drain(..start);
        self.ready.drain(..)
    }

    /// Flush the remainder at end of input.
    ///
    /// A remainder with any non-whitespace content is emitted as-is, trailing
    /// whitespace included; an all-whitespace remainder is dropped.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Check if text is waiting for a delimiter
    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.is_empty()
    }
}

impl Default for PartSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_SEPARATOR)
    }
}

/// Split a text stream into parts on `delimiter`, in arrival order.
pub fn split_parts<S>(text: S, delimiter: String) -> impl Stream<Item = Result<String, SdkError>> + Send
where
    S: Stream<Item = Result<String, SdkError>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut splitter = PartSplitter::try_new(delimiter)?;
        futures_util::pin_mut!(text);

        while let Some(fragment) = text.next().await {
            let fragment = fragment?;
            for part in splitter.push(&fragment) {
                trace!(target: "sse_pipeline::splitter", len = part.len(), "part");
                yield part;
            }
        }

        if let Some(part) = splitter.finish() {
            trace!(target: "sse_pipeline::splitter", len = part.len(), "flushed trailing part");
            yield part;
        }
    }
}

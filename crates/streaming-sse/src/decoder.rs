//! Incremental byte-to-text decoding.

use crate::core::SdkError;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::{trace, warn};

/// Incremental UTF-8 decoder that handles chunk boundaries correctly.
///
/// A multi-byte sequence cut by a chunk boundary is held back until the
/// rest of it arrives. Invalid bytes decode to U+FFFD instead of failing.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Trailing bytes of an incomplete sequence (at most 3)
    pending: Vec<u8>,
    /// Number of replacement characters emitted so far
    replaced: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk and get the text that is decodable so far.
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut offset = 0;
        while offset < self.pending.len() {
            match std::str::from_utf8(&self.pending[offset..]) {
                Ok(text) => {
                    out.push_str(text);
                    offset = self.pending.len();
                }
                Err(err) => {
                    let valid_end = offset + err.valid_up_to();
                    // The prefix up to `valid_up_to` is valid, so this never replaces.
                    out.push_str(&String::from_utf8_lossy(&self.pending[offset..valid_end]));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.replaced += 1;
                            offset = valid_end + len;
                        }
                        None => {
                            // Incomplete sequence at the end: keep it for the next chunk.
                            offset = valid_end;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..offset);
        out
    }

    /// Flush at end of input. A dangling incomplete sequence becomes one U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        self.replaced += 1;
        char::REPLACEMENT_CHARACTER.to_string()
    }

    /// Check if the decoder holds bytes of an incomplete sequence
    pub fn has_buffered_data(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Total replacement characters produced by this decoder.
    pub fn replaced(&self) -> usize {
        self.replaced
    }
}

/// Decode a byte stream into text fragments.
///
/// Fragment boundaries follow the input chunks, minus any bytes held back
/// for an incomplete sequence. Empty fragments are not emitted.
pub fn decode_text<S>(bytes: S) -> impl Stream<Item = Result<String, SdkError>> + Send
where
    S: Stream<Item = Result<Bytes, SdkError>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut decoder = Utf8Decoder::new();
        futures_util::pin_mut!(bytes);

        while let Some(chunk_result) = bytes.next().await {
            let chunk = chunk_result?;
            let before = decoder.replaced();
            let text = decoder.push(&chunk);
            if decoder.replaced() > before {
                warn!(
                    target: "sse_pipeline::decoder",
                    replaced = decoder.replaced() - before,
                    "invalid UTF-8 in byte stream replaced with U+FFFD"
                );
            }
            trace!(
                target: "sse_pipeline::decoder",
                bytes = chunk.len(),
                text_len = text.len(),
                "decoded chunk"
            );
            if !text.is_empty() {
                yield text;
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            warn!(target: "sse_pipeline::decoder", "byte stream ended inside a UTF-8 sequence");
            yield tail;
        }
    }
}

//! Pipeline configuration and assembly
//!
//! This module wires a raw byte stream through the stages:
//! 1. Decode bytes to text with `decode_text`
//! 2. Either a caller-supplied transform, or `split_parts` then `parse_parts`
//! 3. Wrap the result in an `EventStream` carrying hooks and the abort signal

use crate::core::{AbortSignal, SdkError};
use crate::streaming_sse::stream::{EventStream, LifecycleHooks};
use crate::streaming_sse::{
    decode_text, parse_parts, split_parts, BoxedStream, ByteStream, RecordStream, SseRecord,
    TextStream,
    DEFAULT_KV_SEPARATOR, DEFAULT_PART_SEPARATOR, DEFAULT_STREAM_SEPARATOR,
};
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::debug;

type TransformFn<T> =
    Box<dyn FnOnce(TextStream, &Separators) -> BoxedStream<T> + Send + 'static>;

/// Delimiters used by the default splitter/parser stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separators {
    /// Between events
    pub stream: String,
    /// Between fields within an event
    pub part: String,
    /// Between a field name and its value
    pub kv: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            stream: DEFAULT_STREAM_SEPARATOR.to_string(),
            part: DEFAULT_PART_SEPARATOR.to_string(),
            kv: DEFAULT_KV_SEPARATOR.to_string(),
        }
    }
}

impl Separators {
    fn validate(&self) -> Result<(), SdkError> {
        for (option, value) in [
            ("stream_separator", &self.stream),
            ("part_separator", &self.part),
            ("kv_separator", &self.kv),
        ] {
            if value.is_empty() {
                return Err(SdkError::invalid_option(option, "must not be empty"));
            }
        }
        Ok(())
    }
}

fn default_stages(text: TextStream, separators: &Separators) -> RecordStream {
    let parts = split_parts(text, separators.stream.clone());
    Box::pin(parse_parts(
        parts,
        separators.part.clone(),
        separators.kv.clone(),
    ))
}

/// Configuration for one pipeline instance.
///
/// Every option except `source` has a default:
///
/// | option | default |
/// |---|---|
/// | `transform` | splitter then parser, yielding `SseRecord` |
/// | `stream_separator` | `"\n\n"` |
/// | `part_separator` | `"\n"` |
/// | `kv_separator` | `":"` |
/// | `on_start`, `on_output`, `on_complete`, `on_abort`, `on_error` | no-op |
/// | `signal` | never aborts |
///
/// # Example
/// ```ignore
/// let events = PipelineBuilder::new()
///     .source(response.bytes_stream())
///     .on_output(|record: &SseRecord| tracing::info!(?record))
///     .signal(token.clone())
///     .build()?;
/// ```
pub struct PipelineBuilder<T = SseRecord> {
    source: Option<ByteStream>,
    separators: Separators,
    transform: TransformFn<T>,
    custom_transform: bool,
    signal: Option<Box<dyn AbortSignal>>,
    hooks: LifecycleHooks<T>,
}

impl PipelineBuilder<SseRecord> {
    /// Create a builder for the default splitter/parser pipeline
    pub fn new() -> Self {
        Self {
            source: None,
            separators: Separators::default(),
            transform: Box::new(default_stages),
            custom_transform: false,
            signal: None,
            hooks: LifecycleHooks::default(),
        }
    }
}

impl Default for PipelineBuilder<SseRecord> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> PipelineBuilder<T> {
    /// Set the byte stream to read from (required)
    pub fn source<S, E>(mut self, source: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<SdkError> + 'static,
    {
        self.source = Some(Box::pin(
            source.map(|chunk| chunk.map_err(Into::<SdkError>::into)),
        ));
        self
    }

    /// Delimiter between events
    pub fn stream_separator(mut self, separator: impl Into<String>) -> Self {
        self.separators.stream = separator.into();
        self
    }

    /// Delimiter between fields within an event
    pub fn part_separator(mut self, separator: impl Into<String>) -> Self {
        self.separators.part = separator.into();
        self
    }

    /// Delimiter between a field name and its value
    pub fn kv_separator(mut self, separator: impl Into<String>) -> Self {
        self.separators.kv = separator.into();
        self
    }

    /// Replace the splitter and parser with a custom text transform.
    ///
    /// The output type changes to the transform's item type, so an
    /// `on_output` hook registered earlier is discarded. Register it after
    /// calling this.
    pub fn transform<U, S, F>(self, transform: F) -> PipelineBuilder<U>
    where
        U: 'static,
        F: FnOnce(TextStream) -> S + Send + 'static,
        S: Stream<Item = Result<U, SdkError>> + Send + 'static,
    {
        if self.hooks.on_output.is_some() {
            debug!(target: "sse_pipeline::pipeline", "on_output hook discarded by transform()");
        }
        let LifecycleHooks {
            on_start,
            on_complete,
            on_abort,
            on_error,
            ..
        } = self.hooks;
        PipelineBuilder {
            source: self.source,
            separators: self.separators,
            transform: Box::new(move |text: TextStream, _: &Separators| -> BoxedStream<U> {
                Box::pin(transform(text))
            }),
            custom_transform: true,
            signal: self.signal,
            hooks: LifecycleHooks {
                on_start,
                on_output: None,
                on_complete,
                on_abort,
                on_error,
            },
        }
    }

    /// Fired once, on the first poll
    pub fn on_start(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.hooks.on_start = Some(Box::new(hook));
        self
    }

    /// Fired for every value, before it is yielded
    pub fn on_output(mut self, hook: impl FnMut(&T) + Send + 'static) -> Self {
        self.hooks.on_output = Some(Box::new(hook));
        self
    }

    /// Fired once when the upstream ends normally
    pub fn on_complete(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.hooks.on_complete = Some(Box::new(hook));
        self
    }

    /// Fired once when the abort signal stops the stream
    pub fn on_abort(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.hooks.on_abort = Some(Box::new(hook));
        self
    }

    /// Fired once with the upstream error, before it reaches the consumer
    pub fn on_error(mut self, hook: impl FnMut(&SdkError) + Send + 'static) -> Self {
        self.hooks.on_error = Some(Box::new(hook));
        self
    }

    /// Abort signal checked before each pull
    pub fn signal(mut self, signal: impl AbortSignal + 'static) -> Self {
        self.signal = Some(Box::new(signal));
        self
    }

    /// Assemble the pipeline.
    ///
    /// Fails with `SdkError::InvalidArgument` if no source was set or a
    /// separator is empty. Nothing is read until the stream is first polled.
    pub fn build(self) -> Result<EventStream<T>, SdkError> {
        let source = self.source.ok_or_else(|| {
            SdkError::invalid_option("source", "is required and must be a byte stream")
        })?;
        self.separators.validate()?;

        debug!(
            target: "sse_pipeline::pipeline",
            custom_transform = self.custom_transform,
            stream_separator = ?self.separators.stream,
            part_separator = ?self.separators.part,
            kv_separator = ?self.separators.kv,
            "building pipeline"
        );

        let text: TextStream = Box::pin(decode_text(source));
        let output = (self.transform)(text, &self.separators);

        let mut stream = EventStream::from_boxed(output);
        if let Some(signal) = self.signal {
            stream = stream.with_signal(signal);
        }
        stream.hooks = self.hooks;
        Ok(stream)
    }
}

/// Run a byte stream through the default pipeline with no hooks or signal.
pub fn sse_records<S, E>(bytes: S) -> EventStream<SseRecord>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<SdkError> + 'static,
{
    let text = decode_text(bytes.map(|chunk| chunk.map_err(Into::<SdkError>::into)));
    let parts = split_parts(text, DEFAULT_STREAM_SEPARATOR.to_string());
    EventStream::new(parse_parts(
        parts,
        DEFAULT_PART_SEPARATOR.to_string(),
        DEFAULT_KV_SEPARATOR.to_string(),
    ))
}

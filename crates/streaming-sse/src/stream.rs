//! Cancellable event stream with lifecycle callbacks

use crate::core::{AbortSignal, NeverAbort, SdkError};
use crate::streaming_sse::BoxedStream;
use futures_core::stream::FusedStream;
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

pub(crate) type HookFn = Box<dyn FnMut() + Send>;
pub(crate) type OutputFn<T> = Box<dyn FnMut(&T) + Send>;
pub(crate) type ErrorFn = Box<dyn FnMut(&SdkError) + Send>;

/// Optional lifecycle callbacks; unset hooks are no-ops.
pub(crate) struct LifecycleHooks<T> {
    pub on_start: Option<HookFn>,
    pub on_output: Option<OutputFn<T>>,
    pub on_complete: Option<HookFn>,
    pub on_abort: Option<HookFn>,
    pub on_error: Option<ErrorFn>,
}

impl<T> Default for LifecycleHooks<T> {
    fn default() -> Self {
        Self {
            on_start: None,
            on_output: None,
            on_complete: None,
            on_abort: None,
            on_error: None,
        }
    }
}

fn fire(hook: &mut Option<HookFn>) {
    if let Some(hook) = hook.as_mut() {
        hook();
    }
}

/// Iteration state of an `EventStream`. The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    Running,
    Completed,
    Aborted,
    Errored,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StreamState::Completed | StreamState::Aborted | StreamState::Errored
        )
    }
}

/// Exclusive claim on the upstream stage for one iteration session.
///
/// Releasing drops the upstream chain, which is how a Rust stream is asked
/// to stop and free its transport. Release happens at most once.
struct SourceClaim<T> {
    inner: Option<BoxedStream<T>>,
}

impl<T> SourceClaim<T> {
    fn poll_next(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<T, SdkError>>> {
        match self.inner.as_mut() {
            Some(inner) => inner.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }

    fn release(&mut self) -> bool {
        self.inner.take().is_some()
    }
}

/// Consumer-facing sequence produced by the pipeline.
///
/// Implements `Stream`: each poll either yields the next value or `None`
/// once the session reaches a terminal state. The start hook fires on the
/// first poll. The abort signal is checked before every new pull; a pull
/// that returned `Pending` is left to resolve before the next check.
/// Exactly one of the complete, abort and error hooks fires per session,
/// and the upstream claim is released on each of those paths.
pub struct EventStream<T> {
    claim: SourceClaim<T>,
    state: StreamState,
    in_flight: bool,
    signal: Box<dyn AbortSignal>,
    pub(crate) hooks: LifecycleHooks<T>,
}

impl<T> EventStream<T> {
    /// Wrap an upstream stream with no hooks and no abort signal.
    pub fn new<S>(upstream: S) -> Self
    where
        S: Stream<Item = Result<T, SdkError>> + Send + 'static,
    {
        Self::from_boxed(Box::pin(upstream))
    }

    pub(crate) fn from_boxed(upstream: BoxedStream<T>) -> Self {
        Self {
            claim: SourceClaim {
                inner: Some(upstream),
            },
            state: StreamState::NotStarted,
            in_flight: false,
            signal: Box::new(NeverAbort),
            hooks: LifecycleHooks::default(),
        }
    }

    pub(crate) fn with_signal(mut self, signal: Box<dyn AbortSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    fn enter(&mut self, state: StreamState) {
        debug!(target: "sse_pipeline::stream", from = ?self.state, to = ?state, "state change");
        self.state = state;
        self.in_flight = false;
        if self.claim.release() {
            debug!(target: "sse_pipeline::stream", "upstream released");
        }
    }
}

impl<T> Stream for EventStream<T> {
    type Item = Result<T, SdkError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        match this.state {
            StreamState::NotStarted => {
                debug!(target: "sse_pipeline::stream", "stream started");
                this.state = StreamState::Running;
                fire(&mut this.hooks.on_start);
            }
            StreamState::Running => {}
            StreamState::Completed | StreamState::Aborted | StreamState::Errored => {
                return Poll::Ready(None);
            }
        }

        if !this.in_flight && this.signal.is_aborted() {
            this.enter(StreamState::Aborted);
            fire(&mut this.hooks.on_abort);
            return Poll::Ready(None);
        }

        match this.claim.poll_next(cx) {
            Poll::Pending => {
                this.in_flight = true;
                Poll::Pending
            }
            Poll::Ready(Some(Ok(value))) => {
                this.in_flight = false;
                if let Some(on_output) = this.hooks.on_output.as_mut() {
                    on_output(&value);
                }
                Poll::Ready(Some(Ok(value)))
            }
            Poll::Ready(Some(Err(err))) => {
                debug!(target: "sse_pipeline::stream", error = %err.format_details(), "upstream error");
                if let Some(on_error) = this.hooks.on_error.as_mut() {
                    on_error(&err);
                }
                this.enter(StreamState::Errored);
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.enter(StreamState::Completed);
                fire(&mut this.hooks.on_complete);
                Poll::Ready(None)
            }
        }
    }
}

impl<T> FusedStream for EventStream<T> {
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}

impl<T> Drop for EventStream<T> {
    fn drop(&mut self) {
        if self.claim.release() {
            debug!(target: "sse_pipeline::stream", state = ?self.state, "upstream released on drop");
        }
    }
}

/// Extension trait for byte streams to easily convert to SSE record streams
#[cfg(feature = "stream")]
pub trait SseStreamExt: Stream {
    /// Run this byte stream through the default pipeline
    fn into_sse_records<E>(self) -> EventStream<crate::streaming_sse::SseRecord>
    where
        Self: Stream<Item = Result<bytes::Bytes, E>> + Sized + Send + 'static,
        E: Into<SdkError> + 'static,
    {
        crate::streaming_sse::pipeline::sse_records(self)
    }
}

#[cfg(feature = "stream")]
impl<S: Stream> SseStreamExt for S {}

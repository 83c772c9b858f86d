#[path = "../crates/core/src/lib.rs"]
pub mod core;
#[path = "../crates/streaming-sse/src/lib.rs"]
pub mod streaming_sse;

pub use crate::core::{AbortSignal, NeverAbort, SdkError, TransportError};
pub use crate::streaming_sse::{
    sse_records, EventStream, PipelineBuilder, SseRecord, StreamState,
};
#[cfg(feature = "stream")]
pub use crate::streaming_sse::SseStreamExt;

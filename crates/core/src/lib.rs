pub mod error;
pub mod signal;

pub use crate::core::error::{SdkError, TransportError};
pub use crate::core::signal::{AbortSignal, NeverAbort};

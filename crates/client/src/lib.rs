//! `grc-client`: REST consumption layer shared by every policy component.
//!
//! Provides the HTTP client for the GRC backend, the error taxonomy and
//! user-facing message normalization, the retry-aware mutation wrapper and
//! the toast surface errors are reported through.

pub mod api;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod toast;

pub use api::{ApiClient, ApiClientConfig};
pub use error::{ClientError, TransportKind};
pub use normalize::{FALLBACK_MESSAGE, extract_error_message};
pub use retry::{
    RetryClassify, RetryConfig, RetryError, RetryMutation, RetryPhase, RetryRefusal, RetryState,
};
pub use toast::{MemorySink, Toast, ToastKind, ToastSink, Toaster, TracingSink};

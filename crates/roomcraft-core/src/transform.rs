//! Image transformation contract.
//!
//! Defines the interface the workflow uses to talk to a generative-image
//! provider, the structured failure it gets back, and the progress channel
//! the provider reports coarse phases through.

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use strum::Display;
use tokio::sync::mpsc;

use crate::credential::Credential;
use crate::design::SelectedItem;
use crate::image::EncodedImage;

/// Outcome of a single transformation call.
pub type TransformResult = std::result::Result<EncodedImage, TransformFailure>;

/// A non-success outcome of a transformation call.
///
/// `message` is what the caller shows the user: the provider's own
/// diagnostic when one could be decoded, the raw response body otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformFailure {
    pub message: String,
    /// HTTP status, when the provider answered at all.
    pub status_code: Option<u16>,
    /// Whether re-issuing the same request may succeed.
    pub is_retryable: bool,
    /// Delay requested by the provider before retrying.
    pub retry_after: Option<Duration>,
}

impl TransformFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            is_retryable: false,
            retry_after: None,
        }
    }

    /// Failure for a non-success HTTP response, decoding `body` with
    /// [`decode_error_body`].
    pub fn from_response(status_code: u16, body: &str) -> Self {
        Self {
            message: decode_error_body(body),
            status_code: Some(status_code),
            is_retryable: matches!(status_code, 429 | 500 | 502 | 503 | 504),
            retry_after: None,
        }
    }

    pub fn retryable(mut self, is_retryable: bool) -> Self {
        self.is_retryable = is_retryable;
        self
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransformFailure {}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Two-tier decode of an error response body.
///
/// A body shaped like `{"error": {"message": "..."}}` yields exactly the
/// nested message. Anything else yields the body unmodified.
pub fn decode_error_body(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Renders selected items as the numbered placement block sent to the
/// provider, one `"<n>. a <name>: <instruction>"` line per item.
pub fn render_placement_instructions(items: &[SelectedItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("{}. a {}: {}", index + 1, item.name, item.prompt.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Coarse phases of a transformation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProgressPhase {
    #[strum(serialize = "uploading")]
    Uploading,
    #[strum(serialize = "waiting for generation")]
    AwaitingGeneration,
    #[strum(serialize = "downloading result")]
    Downloading,
}

/// Receives progress phases while a transformation call runs.
///
/// Purely advisory: implementations must not fail and the call behaves the
/// same whether anyone listens or not.
pub trait ProgressSink: Send + Sync {
    fn report(&self, phase: ProgressPhase);
}

/// Sink that drops every phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _phase: ProgressPhase) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressPhase) + Send + Sync,
{
    fn report(&self, phase: ProgressPhase) {
        self(phase)
    }
}

/// Forwards phases into a tokio channel, e.g. towards a UI task.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressPhase>,
}

impl ChannelProgress {
    pub fn new(sender: mpsc::UnboundedSender<ProgressPhase>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, phase: ProgressPhase) {
        // Non-blocking send - if the receiver is dropped, we just skip
        let _ = self.sender.send(phase);
    }
}

/// A generative-image provider.
///
/// Each call performs exactly one request; retrying is left to the caller.
#[async_trait]
pub trait ImageTransformer: Send + Sync {
    /// Removes all furniture and clutter, keeping the framing of the photo.
    async fn clean_room(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        progress: &dyn ProgressSink,
    ) -> TransformResult;

    /// Adds every listed item to the (cleaned) room in one pass.
    async fn furnish_room(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        items: &[SelectedItem],
        progress: &dyn ProgressSink,
    ) -> TransformResult;
}

#[async_trait]
impl<T: ImageTransformer + ?Sized> ImageTransformer for std::sync::Arc<T> {
    async fn clean_room(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        progress: &dyn ProgressSink,
    ) -> TransformResult {
        (**self).clean_room(credential, image, progress).await
    }

    async fn furnish_room(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        items: &[SelectedItem],
        progress: &dyn ProgressSink,
    ) -> TransformResult {
        (**self).furnish_room(credential, image, items, progress).await
    }
}

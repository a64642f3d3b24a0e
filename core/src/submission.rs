//! Asynchronous form submission.
//!
//! # Design
//! A submission runs as one spawned task that walks
//! `Pending -> Resolving -> Streaming` and then settles exactly once as
//! `Completed`, `Failed` or `Cancelled`.
//!
//! - Resolving re-fetches the resource every time. The form definition
//!   (action, method, enctype) always comes from that fresh document, never
//!   from the caller.
//! - Streaming connects two spawned activities through an in-process pipe:
//!   the transmitter sends the request whose body is the pipe's read end, and
//!   the encoder writes multipart parts into the write end and shuts it down
//!   when done. The engine races their results and the cancellation token;
//!   the first definitive signal wins. A response head ends the race, so an
//!   encoder failure after it is ignored.
//! - The status lives in a `watch` cell. Every write goes through
//!   `Shared::advance`, which refuses to replace a terminal status. That is
//!   what makes the outcome single-assignment, whichever of the engine or a
//!   `cancel()` call gets there first.
//! - Cancelling fires a token shared by reference with both activities.
//!   Either one blocked on the pipe wakes up, and the in-flight request
//!   future is dropped, which aborts the exchange.

use std::sync::Arc;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::error::{ApiError, SubmissionError};
use crate::form::FormRequest;
use crate::http::HttpResponse;
use crate::media_type::MediaType;
use crate::multipart;

/// Bytes the encoder may run ahead of the transmitter.
const PIPE_CAPACITY: usize = 16 * 1024;

/// Observable state of a submission.
#[derive(Debug, Clone)]
pub enum SubmissionStatus {
    Pending,
    Resolving,
    Streaming,
    Completed(HttpResponse),
    Failed(Arc<ApiError>),
    Cancelled,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Completed(_) | SubmissionStatus::Failed(_) | SubmissionStatus::Cancelled
        )
    }

    /// The settled result, or `None` while still in flight.
    pub fn outcome(self) -> Option<Result<HttpResponse, SubmissionError>> {
        match self {
            SubmissionStatus::Completed(response) => Some(Ok(response)),
            SubmissionStatus::Failed(err) => Some(Err(SubmissionError::Failed(err))),
            SubmissionStatus::Cancelled => Some(Err(SubmissionError::Cancelled)),
            SubmissionStatus::Pending | SubmissionStatus::Resolving | SubmissionStatus::Streaming => None,
        }
    }
}

#[derive(Debug)]
struct Shared {
    status: watch::Sender<SubmissionStatus>,
    cancel: CancellationToken,
}

impl Shared {
    /// Move to `next` unless already terminal. Returns whether it moved.
    fn advance(&self, next: SubmissionStatus) -> bool {
        self.status.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = next;
            true
        })
    }
}

/// Handle to an in-flight or settled form submission.
///
/// Clones observe the same submission.
#[derive(Debug, Clone)]
pub struct FormSubmission {
    shared: Arc<Shared>,
}

impl FormSubmission {
    pub(crate) fn start(request: FormRequest, parent: Option<&CancellationToken>) -> Self {
        let cancel = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
        let (status, _) = watch::channel(SubmissionStatus::Pending);
        let shared = Arc::new(Shared { status, cancel });

        match Handle::try_current() {
            Ok(handle) => {
                let span = tracing::debug_span!(
                    "form_submission",
                    resource = %request.resource_path(),
                    form = %request.name()
                );
                handle.spawn(run(request, Arc::clone(&shared)).instrument(span));
            }
            Err(err) => {
                shared.advance(SubmissionStatus::Failed(Arc::new(ApiError::Runtime(err.to_string()))));
            }
        }

        Self { shared }
    }

    pub fn status(&self) -> SubmissionStatus {
        self.shared.status.borrow().clone()
    }

    pub fn is_done(&self) -> bool {
        self.shared.status.borrow().is_terminal()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.shared.status.borrow(), SubmissionStatus::Cancelled)
    }

    /// The response, once completed.
    pub fn response(&self) -> Option<HttpResponse> {
        match &*self.shared.status.borrow() {
            SubmissionStatus::Completed(response) => Some(response.clone()),
            _ => None,
        }
    }

    /// The failure, once failed. Cancellation is not a failure.
    pub fn err(&self) -> Option<Arc<ApiError>> {
        match &*self.shared.status.borrow() {
            SubmissionStatus::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    /// Request cancellation. A no-op once the submission has settled.
    pub fn cancel(&self) {
        if self.shared.advance(SubmissionStatus::Cancelled) {
            debug!("form submission cancelled");
        }
        self.shared.cancel.cancel();
    }

    /// Wait until the submission settles.
    pub async fn done(&self) {
        let mut rx = self.shared.status.subscribe();
        // The sender lives in `self.shared`, so the channel cannot close here.
        let _ = rx.wait_for(SubmissionStatus::is_terminal).await;
    }

    /// Wait until the submission settles and return its outcome.
    pub async fn wait(&self) -> Result<HttpResponse, SubmissionError> {
        self.done().await;
        self.status().outcome().unwrap_or(Err(SubmissionError::Cancelled))
    }
}

/// Why the engine stopped short of a response.
enum Interrupted {
    Cancelled,
    Failed(ApiError),
}

impl From<ApiError> for Interrupted {
    fn from(err: ApiError) -> Self {
        Interrupted::Failed(err)
    }
}

async fn run(request: FormRequest, shared: Arc<Shared>) {
    let settled = match drive(request, &shared).await {
        Ok(response) => SubmissionStatus::Completed(response),
        Err(Interrupted::Cancelled) => SubmissionStatus::Cancelled,
        Err(Interrupted::Failed(err)) => SubmissionStatus::Failed(Arc::new(err)),
    };
    if shared.advance(settled.clone()) {
        match &settled {
            SubmissionStatus::Completed(response) => debug!(status = response.status, "form submission completed"),
            SubmissionStatus::Failed(err) => debug!(error = %err, "form submission failed"),
            _ => debug!("form submission cancelled"),
        }
    }
}

async fn drive(request: FormRequest, shared: &Shared) -> Result<HttpResponse, Interrupted> {
    let FormRequest { name, resource, fields } = request;
    let cancel = &shared.cancel;

    if !shared.advance(SubmissionStatus::Resolving) {
        return Err(Interrupted::Cancelled);
    }
    let mut document = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Interrupted::Cancelled),
        fetched = resource.get() => fetched?,
    };
    let form = document.forms.remove(&name).ok_or_else(|| ApiError::FormNotFound {
        form: name.clone(),
        resource: resource.path().to_string(),
    })?;

    let enctype = form.enctype.clone().unwrap_or_else(|| MediaType::new(""));
    if enctype != MediaType::MULTIPART_FORM_DATA {
        return Err(ApiError::UnsupportedMediaType(enctype).into());
    }

    let client = resource.client().clone();
    let boundary = client.config().boundary.boundary();
    let mut http_request = client.build_request(form.method, &form.action)?;
    let content_type = HeaderValue::from_str(&multipart::content_type(&boundary))
        .map_err(|e| ApiError::InvalidRequest(format!("content type: {e}")))?;
    http_request.headers_mut().insert(CONTENT_TYPE, content_type);

    let (body_reader, body_writer) = tokio::io::duplex(PIPE_CAPACITY);
    *http_request.body_mut() = Some(reqwest::Body::wrap_stream(ReaderStream::new(body_reader)));

    if !shared.advance(SubmissionStatus::Streaming) {
        return Err(Interrupted::Cancelled);
    }
    debug!(method = form.method.as_str(), action = %form.action, fields = fields.len(), "streaming form body");

    // Both activities watch this scope; it is cancelled as soon as the race is decided.
    let scope = cancel.child_token();

    let mut transmitter = tokio::spawn({
        let scope = scope.clone();
        async move {
            tokio::select! {
                biased;
                _ = scope.cancelled() => Err(Interrupted::Cancelled),
                sent = client.execute(http_request) => sent.map_err(Interrupted::from),
            }
        }
        .in_current_span()
    });
    let mut encoder = tokio::spawn({
        let scope = scope.clone();
        async move { multipart::encode_fields(fields, body_writer, &boundary, &scope).await }.in_current_span()
    });

    let mut encoding = true;
    let head = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break Err(Interrupted::Cancelled),
            encoded = &mut encoder, if encoding => match encoded {
                Ok(Ok(state)) => {
                    debug!(?state, "form body encoder finished");
                    encoding = false;
                }
                Ok(Err(err)) => break Err(err.into()),
                Err(join) => break Err(ApiError::Task(join.to_string()).into()),
            },
            sent = &mut transmitter => match sent {
                Ok(result) => break result,
                Err(join) => break Err(ApiError::Task(join.to_string()).into()),
            },
        }
    };
    scope.cancel();
    transmitter.abort();
    encoder.abort();
    let head = head?;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        read = HttpResponse::read(head) => read.map_err(|e| ApiError::Network(e).into()),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn shared() -> Shared {
        let (status, _) = watch::channel(SubmissionStatus::Pending);
        Shared {
            status,
            cancel: CancellationToken::new(),
        }
    }

    fn completed() -> SubmissionStatus {
        SubmissionStatus::Completed(HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: Bytes::from_static(b"response"),
        })
    }

    #[test]
    fn advance_moves_through_phases() {
        let shared = shared();
        assert!(shared.advance(SubmissionStatus::Resolving));
        assert!(shared.advance(SubmissionStatus::Streaming));
        assert!(shared.advance(completed()));
        assert!(matches!(*shared.status.borrow(), SubmissionStatus::Completed(_)));
    }

    #[test]
    fn terminal_status_is_never_overwritten() {
        let shared = shared();
        assert!(shared.advance(completed()));
        assert!(!shared.advance(SubmissionStatus::Failed(Arc::new(ApiError::Task("late".into())))));
        assert!(!shared.advance(SubmissionStatus::Cancelled));
        assert!(!shared.advance(SubmissionStatus::Streaming));
        assert!(matches!(*shared.status.borrow(), SubmissionStatus::Completed(_)));
    }

    #[test]
    fn cancelled_is_terminal_too() {
        let shared = shared();
        assert!(shared.advance(SubmissionStatus::Cancelled));
        assert!(!shared.advance(completed()));
        assert!(matches!(*shared.status.borrow(), SubmissionStatus::Cancelled));
    }

    #[test]
    fn outcome_only_for_terminal_states() {
        assert!(SubmissionStatus::Pending.outcome().is_none());
        assert!(SubmissionStatus::Streaming.outcome().is_none());
        assert_eq!(completed().outcome().unwrap().unwrap().body, "response");
        assert!(matches!(
            SubmissionStatus::Cancelled.outcome(),
            Some(Err(SubmissionError::Cancelled))
        ));
    }

    #[test]
    fn submit_outside_runtime_fails_immediately() {
        let client = crate::Client::new(crate::ClientConfig::default()).unwrap();
        let submission = client.resource("/resource").form("test").submit();
        assert!(submission.is_done());
        assert!(matches!(submission.err().as_deref(), Some(ApiError::Runtime(_))));

        submission.cancel();
        assert!(!submission.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_before_resolution_settles_cancelled() {
        // Port 9 (discard) is never contacted: cancellation wins first.
        let client = crate::Client::new(crate::ClientConfig::default().with_port(9)).unwrap();
        let submission = client.resource("/resource").form("test").submit();
        submission.cancel();
        submission.cancel();

        assert!(matches!(submission.wait().await, Err(SubmissionError::Cancelled)));
        assert!(submission.is_cancelled());
        assert!(submission.err().is_none());
        assert!(submission.response().is_none());
    }
}

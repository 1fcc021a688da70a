//! Test doubles for `Provider`. Gated behind the `test-utils`
//! feature so the dependency surface stays small for real deployments.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::provider::{Provider, ProviderError};
use crate::types::ProviderRequest;
use crate::types::ProviderResponse;

/// Replays a fixed queue of responses, one per call. Panics if asked
/// for more responses than were queued.
pub struct MockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    /// Queue `responses` to be returned in order, one per `complete` call.
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Number of times `complete` has been called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Provider for MockProvider {
    fn complete(
        &self,
        _request: ProviderRequest,
    ) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockProvider: no more responses queued");
        async move { Ok(response) }
    }
}

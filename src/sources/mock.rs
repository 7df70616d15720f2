//! Mock transport for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::sources::{RawResponse, SourceError, Transport};

/// A transport that replays scripted responses per URL.
///
/// Unscripted URLs answer `404`. Every request is recorded so tests can check
/// how many attempts were made.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<RawResponse, String>>>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn push(&self, url: &str, response: RawResponse) -> &Self {
        self.lock_responses()
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(response));
        self
    }

    /// Queue a transport-level failure for `url`.
    pub fn push_network_error(&self, url: &str, message: &str) -> &Self {
        self.lock_responses()
            .entry(url.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of requests made for `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Result<RawResponse, String>>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, SourceError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        let next = self
            .lock_responses()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(SourceError::Network(message)),
            None => Ok(RawResponse::status(404)),
        }
    }
}

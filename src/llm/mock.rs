//! Scripted completion client for tests.

use super::LlmClient;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&str, u32) -> Result<String> + Send + Sync>;

/// Records every request and answers through a caller-supplied closure.
pub(crate) struct MockLlm {
    responder: Responder,
    calls: Mutex<Vec<(String, u32)>>,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    jitter: bool,
}

impl MockLlm {
    pub fn new(responder: impl Fn(&str, u32) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            jitter: false,
        }
    }

    /// Deterministic client that wraps the prompt it was given.
    pub fn echo() -> Self {
        Self::new(|prompt, _| Ok(format!("<{}>", prompt)))
    }

    /// Make early requests finish last, so completion order differs from
    /// submission order.
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Highest number of requests that were in progress at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of requests made with the given output-token ceiling.
    pub fn calls_with_budget(&self, max_output_tokens: u32) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, tokens)| *tokens == max_output_tokens)
            .count()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let n = self.started.fetch_add(1, Ordering::SeqCst);
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_output_tokens));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        if self.jitter {
            let delay = 25u64.saturating_sub((n as u64 * 3) % 25);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.responder)(prompt, max_output_tokens)
    }

    fn model(&self) -> &str {
        "mock"
    }
}

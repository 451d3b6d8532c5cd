// Copyright 2025 Chapterdiff (https://github.com/chapterdiff)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Diff computation actor.
//!
//! ## Architecture
//!
//! ```text
//! callers ──handle.compute()──► mpsc ──► DiffComputeActor ──► spawn_blocking(diff)
//!    ▲                                                              │
//!    └───────────────── oneshot per request ◄──────────────────────┘
//! ```
//!
//! A cancelled or timed-out request resolves with an empty token list,
//! never an error. An empty list is therefore ambiguous between "no
//! differences" and "aborted": callers must not persist or apply an empty
//! result for a chapter with nonzero content.

use chapterdiff_core::{compute_word_diff, DiffOptions, DiffToken};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for the diff computation actor.
#[derive(Debug, Clone)]
pub struct ComputeConfig {
    /// Budget for a single request, covering queue time and computation.
    pub request_timeout: Duration,
    /// Request channel capacity (backpressure control).
    pub channel_capacity: usize,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            channel_capacity: 64,
        }
    }
}

/// A completed (or aborted) computation, tagged for correlation.
#[derive(Debug, Clone)]
pub struct DiffResponse {
    pub request_id: u64,
    /// Echo of the generation the caller submitted with. Callers compare
    /// this against their current generation and drop stale responses
    /// before touching any state.
    pub generation: u64,
    pub tokens: Vec<DiffToken>,
}

struct ComputeMessage {
    request_id: u64,
    original: String,
    cleaned: String,
    options: DiffOptions,
    cancel: CancellationToken,
    response: oneshot::Sender<Vec<DiffToken>>,
}

/// The computation actor. Spawn it once per engine and keep the handle.
pub struct DiffComputeActor {
    config: ComputeConfig,
}

impl DiffComputeActor {
    pub fn new(config: ComputeConfig) -> Self {
        Self { config }
    }

    /// Spawn the actor task and return a handle for submitting requests.
    pub fn spawn(self) -> DiffComputeHandle {
        let (sender, receiver) = mpsc::channel(self.config.channel_capacity);
        let root = CancellationToken::new();

        tokio::spawn(run(receiver, root.clone()));

        DiffComputeHandle {
            sender,
            pending: Arc::new(DashMap::new()),
            next_request_id: Arc::new(AtomicU64::new(1)),
            root,
            request_timeout: self.config.request_timeout,
        }
    }
}

/// Handle for submitting diff requests to the actor.
#[derive(Clone)]
pub struct DiffComputeHandle {
    sender: mpsc::Sender<ComputeMessage>,
    pending: Arc<DashMap<u64, CancellationToken>>,
    next_request_id: Arc<AtomicU64>,
    root: CancellationToken,
    request_timeout: Duration,
}

impl DiffComputeHandle {
    /// Reserve a request id. Useful when the caller wants to be able to
    /// cancel the request from another task while it is in flight.
    pub fn allocate_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Submit a diff request and wait for its result.
    pub async fn compute(
        &self,
        generation: u64,
        original: String,
        cleaned: String,
        options: DiffOptions,
    ) -> DiffResponse {
        let request_id = self.allocate_request_id();
        self.compute_request(request_id, generation, original, cleaned, options).await
    }

    /// Submit a diff request under a previously reserved id.
    pub async fn compute_request(
        &self,
        request_id: u64,
        generation: u64,
        original: String,
        cleaned: String,
        options: DiffOptions,
    ) -> DiffResponse {
        let cancel = self.root.child_token();
        self.pending.insert(request_id, cancel.clone());

        let (response_tx, response_rx) = oneshot::channel();
        let message = ComputeMessage {
            request_id,
            original,
            cleaned,
            options,
            cancel: cancel.clone(),
            response: response_tx,
        };

        if self.sender.send(message).await.is_err() {
            // Actor is gone (shut down). Resolve empty, same as a cancel.
            self.pending.remove(&request_id);
            return DiffResponse { request_id, generation, tokens: Vec::new() };
        }

        let tokens = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(request_id, "diff request cancelled");
                Vec::new()
            }
            result = tokio::time::timeout(self.request_timeout, response_rx) => match result {
                Ok(Ok(tokens)) => tokens,
                Ok(Err(_)) => {
                    warn!(request_id, "diff actor dropped the response channel");
                    Vec::new()
                }
                Err(_) => {
                    warn!(request_id, "diff request timed out");
                    cancel.cancel();
                    Vec::new()
                }
            },
        };

        self.pending.remove(&request_id);
        DiffResponse { request_id, generation, tokens }
    }

    /// Cancel a single in-flight request. The waiting caller resolves
    /// with an empty token list.
    pub fn cancel(&self, request_id: u64) {
        if let Some((_, token)) = self.pending.remove(&request_id) {
            token.cancel();
        }
    }

    /// Cancel every in-flight request without stopping the actor. All
    /// waiting callers resolve with empty token lists.
    pub fn cancel_all(&self) {
        for entry in self.pending.iter() {
            entry.value().cancel();
        }
        self.pending.clear();
    }

    /// Number of requests currently awaiting a result.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Hard stop: cancel every in-flight request, purge the pending
    /// bookkeeping, and terminate the actor task. All waiting callers
    /// resolve with empty token lists.
    pub fn shutdown(&self) {
        self.root.cancel();
        self.cancel_all();
    }
}

/// Actor loop: pull requests off the channel and run each diff on the
/// blocking pool, one task per request.
async fn run(mut receiver: mpsc::Receiver<ComputeMessage>, root: CancellationToken) {
    info!("diff compute actor started");

    loop {
        let message = tokio::select! {
            biased;
            _ = root.cancelled() => {
                info!("diff compute actor shutting down");
                return;
            }
            message = receiver.recv() => match message {
                Some(message) => message,
                None => {
                    info!("diff compute actor channel closed");
                    return;
                }
            },
        };

        // Abort check before dispatch: skip work that was cancelled while
        // queued.
        if message.cancel.is_cancelled() {
            let _ = message.response.send(Vec::new());
            continue;
        }

        tokio::spawn(async move {
            let ComputeMessage { request_id, original, cleaned, options, cancel, response } =
                message;

            let result = tokio::task::spawn_blocking(move || {
                compute_word_diff(&original, &cleaned, &options)
            })
            .await;

            let tokens = match result {
                Ok(tokens) => tokens,
                Err(error) => {
                    warn!(request_id, %error, "diff computation task failed");
                    Vec::new()
                }
            };

            // The response may arrive after cancellation; the waiting
            // caller has already resolved empty in that case and the send
            // lands on a closed channel, which is fine.
            if cancel.is_cancelled() {
                let _ = response.send(Vec::new());
            } else {
                let _ = response.send(tokens);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterdiff_core::DiffKind;

    fn spawn_default() -> DiffComputeHandle {
        DiffComputeActor::new(ComputeConfig::default()).spawn()
    }

    /// A pair of inputs large enough that the DP takes real time.
    fn slow_inputs() -> (String, String) {
        let original: String =
            (0..2000).map(|i| format!("word{} ", i)).collect();
        let cleaned: String =
            (0..2000).map(|i| format!("term{} ", i)).collect();
        (original, cleaned)
    }

    #[tokio::test]
    async fn test_basic_compute() {
        let handle = spawn_default();
        let response = handle
            .compute(7, "The cat sat.".into(), "The big cat sat down.".into(), DiffOptions::default())
            .await;

        assert_eq!(response.generation, 7);
        assert_eq!(chapterdiff_core::count_changes(&response.tokens), 2);
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_multiplexed() {
        let handle = spawn_default();
        let mut joins = Vec::new();
        for i in 0..8u64 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move {
                let original = format!("shared prefix value {i}");
                let cleaned = format!("shared prefix other {i}");
                handle.compute(i, original, cleaned, DiffOptions::default()).await
            }));
        }
        for (i, join) in joins.into_iter().enumerate() {
            let response = join.await.unwrap();
            assert_eq!(response.generation, i as u64);
            assert!(response.tokens.iter().any(|t| t.kind == DiffKind::Added));
        }
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_resolves_empty() {
        let handle = spawn_default();
        let (original, cleaned) = slow_inputs();

        let request_id = handle.allocate_request_id();
        let worker = {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle
                    .compute_request(request_id, 1, original, cleaned, DiffOptions::default())
                    .await
            })
        };

        // Let the request get dispatched, then cancel it mid-flight.
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel(request_id);

        let response = worker.await.unwrap();
        assert!(response.tokens.is_empty());
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_resolves_empty() {
        let handle = DiffComputeActor::new(ComputeConfig {
            request_timeout: Duration::from_millis(1),
            channel_capacity: 4,
        })
        .spawn();
        let (original, cleaned) = slow_inputs();

        let response = handle.compute(1, original, cleaned, DiffOptions::default()).await;
        assert!(response.tokens.is_empty());
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_resolves_pending_empty() {
        let handle = spawn_default();
        let (original, cleaned) = slow_inputs();

        let worker = {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle.compute(1, original, cleaned, DiffOptions::default()).await
            })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.shutdown();

        let response = worker.await.unwrap();
        assert!(response.tokens.is_empty());
        assert_eq!(handle.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_compute_after_shutdown_resolves_empty() {
        let handle = spawn_default();
        handle.shutdown();
        // Give the actor task a moment to observe the cancellation.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let response = handle
            .compute(1, "a".into(), "b".into(), DiffOptions::default())
            .await;
        assert!(response.tokens.is_empty());
    }
}

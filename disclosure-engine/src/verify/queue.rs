//! Verification queue.
//!
//! One consumer drains the pending identifiers in order, one fetch at a
//! time, sleeping a fixed delay after every fetch whatever its outcome. The
//! dedup guard remembers every identifier ever enqueued this session, so
//! nothing is verified twice and failures are never retried.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::verifier::{DisclosureVerifier, Verification};
use crate::types::EntryId;

/// Receives identifiers confirmed positive by the queue.
#[async_trait]
pub trait ResolutionSink: Send + Sync {
    async fn resolved_positive(&self, id: &EntryId);
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<EntryId>,
    guard: HashSet<EntryId>,
    draining: bool,
}

pub struct VerificationQueue {
    state: Mutex<QueueState>,
    verifier: Arc<dyn DisclosureVerifier>,
    delay: Duration,
}

impl VerificationQueue {
    pub fn new(verifier: Arc<dyn DisclosureVerifier>, delay: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            verifier,
            delay,
        }
    }

    /// Queue an identifier unless it was queued before this session.
    /// Returns `true` if it was added.
    pub async fn enqueue(&self, id: EntryId) -> bool {
        let mut state = self.state.lock().await;
        if !state.guard.insert(id.clone()) {
            return false;
        }
        debug!(%id, "Queued for verification");
        state.pending.push_back(id);
        true
    }

    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_draining(&self) -> bool {
        self.state.lock().await.draining
    }

    /// Whether the identifier was ever enqueued this session.
    pub async fn has_seen(&self, id: &EntryId) -> bool {
        self.state.lock().await.guard.contains(id)
    }

    /// Start the consumer if there is work and none is running.
    ///
    /// Returns the consumer's handle when this call started it.
    pub async fn drain(self: &Arc<Self>, sink: Arc<dyn ResolutionSink>) -> Option<JoinHandle<()>> {
        {
            let mut state = self.state.lock().await;
            if state.draining || state.pending.is_empty() {
                return None;
            }
            state.draining = true;
        }

        let queue = Arc::clone(self);
        Some(tokio::spawn(async move { queue.run(sink).await }))
    }

    async fn run(self: Arc<Self>, sink: Arc<dyn ResolutionSink>) {
        loop {
            let id = {
                let mut state = self.state.lock().await;
                match state.pending.pop_front() {
                    Some(id) => id,
                    None => {
                        state.draining = false;
                        debug!("Verification queue drained");
                        return;
                    }
                }
            };

            match self.verifier.verify(&id).await {
                Verification::Positive => {
                    info!(%id, "Entry verified positive");
                    sink.resolved_positive(&id).await;
                }
                Verification::Inconclusive(reason) => {
                    debug!(%id, ?reason, "Verification inconclusive");
                }
            }

            tokio::time::sleep(self.delay).await;
        }
    }
}

//! Trailing-edge debounce on the tokio clock.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Fires once after triggers stop arriving for a full window.
///
/// Every trigger pushes the deadline out. [`TrailingDebounce::elapsed`] is
/// cancel-safe: dropping it mid-wait keeps the deadline armed.
#[derive(Debug)]
pub struct TrailingDebounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl TrailingDebounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arm, or push an armed deadline out to a full window from now.
    pub fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Resolve when the armed deadline passes; never resolves while idle.
    pub async fn elapsed(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}

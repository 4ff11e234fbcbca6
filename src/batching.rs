// batching.rs - Chunked streaming into external tools
// Purpose: Naive pacing of outbound requests by feeding tools fixed-size batches

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

/// Split `items` into consecutive chunks of `size`.
/// A size of 0 disables chunking and yields exactly one chunk.
pub fn chunked<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Lines as piped to a child's stdin: newline-joined with a trailing newline
pub fn stdin_payload(batch: &[String]) -> String {
    let mut payload = batch.join("\n");
    payload.push('\n');
    payload
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Lines per batch (0 = everything at once)
    pub size: usize,
    /// Pause between consecutive batches
    pub delay: Duration,
}

impl BatchPolicy {
    pub fn new(size: usize, delay: Duration) -> Self {
        Self { size, delay }
    }

    /// Single batch, no pacing
    pub fn unbounded() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_chunking(&self) -> bool {
        self.size > 0
    }

    pub fn split<T: Clone>(&self, items: &[T]) -> Vec<Vec<T>> {
        chunked(items, self.size)
    }

    /// Sleep after batch `index` unless it is the last one
    pub async fn pause_after(&self, index: usize, total: usize, sleeper: &dyn Sleeper) {
        if self.is_chunking() && !self.delay.is_zero() && index + 1 < total {
            sleeper.sleep(self.delay).await;
        }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock pacing
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        sleep(duration).await;
    }
}

//! Completion barrier
//!
//! Pairs a producer's completion signal with a consumer's acknowledgment
//! wait. The render layer (or any presentation consumer) resolves a token
//! once its display of the completed item has stabilized; the phase
//! machine waits on every expected token before moving past the
//! Participants phase, so user-visible placeholders never disappear
//! under a phase transition.
//!
//! Ordering contract: `register` completes synchronously with respect to
//! its caller, so it is observable by any `wait` issued afterward in the
//! same causal chain. Registration is never deferred past the completion
//! signal that triggers the corresponding wait.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

/// Cap on a single acknowledgment wait. A consumer must never hang
/// forever on a producer whose resolve signal was lost.
pub const ACK_WAIT_CAP_MS: u64 = 10_000;

/// Identity of one acknowledgment within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckToken {
    /// Reserved token for the pre-search step
    PreSearch,
    /// Participant by position in the round's trigger order
    Participant(usize),
}

impl std::fmt::Display for AckToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AckToken::PreSearch => write!(f, "pre_search"),
            AckToken::Participant(index) => write!(f, "participant:{index}"),
        }
    }
}

/// Async synchronization primitive for completion acknowledgments
///
/// One instance per thread, reset between rounds by the reset paths.
#[derive(Debug, Default)]
pub struct CompletionBarrier {
    tokens: Mutex<HashMap<AckToken, watch::Sender<bool>>>,
}

impl CompletionBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<AckToken, watch::Sender<bool>>> {
        self.tokens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a pending token. Idempotent: re-registering a token that
    /// is already pending or resolved changes nothing.
    pub fn register(&self, token: AckToken) {
        self.lock()
            .entry(token)
            .or_insert_with(|| watch::channel(false).0);
    }

    /// Resolve a token. Idempotent; resolving an unregistered or
    /// already-resolved token is a no-op.
    pub fn resolve(&self, token: AckToken) {
        if let Some(sender) = self.lock().get(&token) {
            sender.send_replace(true);
        }
    }

    /// Whether any registered token is still unresolved
    pub fn has_pending(&self) -> bool {
        self.lock().values().any(|sender| !*sender.borrow())
    }

    /// Whether one token is registered and unresolved. A token that was
    /// never registered is not pending.
    pub fn is_pending(&self, token: AckToken) -> bool {
        self.lock()
            .get(&token)
            .is_some_and(|sender| !*sender.borrow())
    }

    /// Wait for a token's resolution.
    ///
    /// A token that was never registered resolves immediately: a consumer
    /// must not block for a producer that will never register. A pending
    /// token suspends the caller until `resolve`, until the token is
    /// cleared by a reset, or until the bounded-wait cap expires.
    pub async fn wait(&self, token: AckToken) {
        let mut receiver = {
            let tokens = self.lock();
            match tokens.get(&token) {
                Some(sender) if !*sender.borrow() => sender.subscribe(),
                _ => return,
            }
        };

        let bounded = tokio::time::timeout(
            Duration::from_millis(ACK_WAIT_CAP_MS),
            receiver.wait_for(|resolved| *resolved),
        );
        match bounded.await {
            // Resolved, or the token was cleared by a reset (sender dropped)
            Ok(_) => {}
            Err(_) => {
                warn!("acknowledgment wait for {token} expired after {ACK_WAIT_CAP_MS}ms");
            }
        }
    }

    /// Resolve every outstanding token immediately. The stop path calls
    /// this so a cancelled round cannot leave a dangling suspended
    /// consumer.
    pub fn resolve_all(&self) {
        for sender in self.lock().values() {
            sender.send_replace(true);
        }
    }

    /// Drop all tokens. Outstanding waiters are released. Returns whether
    /// anything was cleared; an already-empty barrier is untouched.
    pub fn clear(&self) -> bool {
        let mut tokens = self.lock();
        if tokens.is_empty() {
            return false;
        }
        tokens.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unregistered_token_resolves_immediately() {
        let barrier = CompletionBarrier::new();
        // Must not suspend at all
        barrier.wait(AckToken::Participant(0)).await;
    }

    #[tokio::test]
    async fn test_wait_suspends_until_resolve() {
        let barrier = Arc::new(CompletionBarrier::new());
        barrier.register(AckToken::Participant(1));

        let waiter = {
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move { barrier.wait(AckToken::Participant(1)).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        assert!(barrier.has_pending());

        barrier.resolve(AckToken::Participant(1));
        waiter.await.unwrap();
        assert!(!barrier.has_pending());
    }

    #[tokio::test]
    async fn test_is_pending_tracks_lifecycle() {
        let barrier = CompletionBarrier::new();
        assert!(!barrier.is_pending(AckToken::Participant(0)));

        barrier.register(AckToken::Participant(0));
        assert!(barrier.is_pending(AckToken::Participant(0)));

        barrier.resolve(AckToken::Participant(0));
        assert!(!barrier.is_pending(AckToken::Participant(0)));
    }

    #[tokio::test]
    async fn test_resolve_before_wait_does_not_suspend() {
        let barrier = CompletionBarrier::new();
        barrier.register(AckToken::PreSearch);
        barrier.resolve(AckToken::PreSearch);
        barrier.wait(AckToken::PreSearch).await;
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let barrier = CompletionBarrier::new();
        barrier.register(AckToken::Participant(0));
        barrier.resolve(AckToken::Participant(0));
        barrier.resolve(AckToken::Participant(0));
        // Resolving something never registered is a no-op, not a panic
        barrier.resolve(AckToken::Participant(7));
        barrier.wait(AckToken::Participant(0)).await;
    }

    #[tokio::test]
    async fn test_resolve_all_releases_every_waiter() {
        let barrier = Arc::new(CompletionBarrier::new());
        barrier.register(AckToken::Participant(0));
        barrier.register(AckToken::Participant(1));

        let waiters: Vec<_> = (0..2)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move { barrier.wait(AckToken::Participant(i)).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        barrier.resolve_all();
        for waiter in waiters {
            waiter.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_clear_releases_waiters_and_reports_change() {
        let barrier = Arc::new(CompletionBarrier::new());
        assert!(!barrier.clear());

        barrier.register(AckToken::Participant(0));
        let waiter = {
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move { barrier.wait(AckToken::Participant(0)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(barrier.clear());
        waiter.await.unwrap();
        assert!(!barrier.clear());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_wait_expires() {
        let barrier = CompletionBarrier::new();
        barrier.register(AckToken::Participant(0));
        // Never resolved; the bounded wait must return on its own
        barrier.wait(AckToken::Participant(0)).await;
    }
}

//! Cancellation token for cooperative cancellation.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::warn;

/// A callback type for cancellation notifications.
pub type CancelCallback = Box<dyn Fn() + Send + Sync>;

/// Cancelled exactly when `reason` is set. Reason and pending callbacks only
/// change together, under one lock.
#[derive(Default)]
struct State {
    reason: Option<String>,
    callbacks: Vec<CancelCallback>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    notify: Notify,
}

/// A token for cooperative cancellation of pipeline runs.
///
/// Clones share state, so a caller can keep one handle and pass another to
/// [`Pipeline::run_with_token`](crate::pipeline::Pipeline::run_with_token).
/// Cancellation is idempotent: only the first reason is kept.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// Callbacks run immediately, outside the lock; a panicking callback is
    /// logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) {
        let callbacks = {
            let mut state = self.inner.state.lock();
            if state.reason.is_some() {
                return;
            }
            state.reason = Some(reason.into());
            std::mem::take(&mut state.callbacks)
        };

        for callback in &callbacks {
            invoke_callback(callback.as_ref());
        }
        self.inner.notify.notify_waiters();
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        {
            let mut state = self.inner.state.lock();
            if state.reason.is_none() {
                state.callbacks.push(Box::new(callback));
                return;
            }
        }
        invoke_callback(&callback);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().reason.is_some()
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.state.lock().reason.clone()
    }

    /// Completes once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

fn invoke_callback(callback: &(dyn Fn() + Send + Sync)) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(callback)) {
        warn!("Cancellation callback panicked: {:?}", e);
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_token_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
    }

    #[test]
    fn test_token_cancel_idempotent() {
        let token = CancellationToken::new();
        token.cancel("First reason");
        token.cancel("Second reason");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("First reason".to_string()));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let handle = token.clone();
        handle.cancel("caller gave up");

        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("caller gave up"));
    }

    #[test]
    fn test_on_cancel_before_and_after() {
        let token = CancellationToken::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        token.on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        token.cancel("test");
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let c = counter.clone();
        token.on_cancel(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callback_panic_suppressed() {
        let token = CancellationToken::new();
        token.on_cancel(|| panic!("Intentional panic"));

        token.cancel("test");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancellationToken::new();
        let handle = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel("later");
        });

        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .expect("waiter should be woken");
        assert_eq!(token.reason().as_deref(), Some("later"));
    }

    #[test]
    fn test_cancelled_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel("done");
        tokio_test::block_on(token.cancelled());
    }

    #[test]
    fn test_reason_visible_whenever_cancelled() {
        for _ in 0..200 {
            let token = CancellationToken::new();
            let observers: Vec<_> = (0..4)
                .map(|_| {
                    let token = token.clone();
                    std::thread::spawn(move || {
                        for _ in 0..1_000 {
                            if token.is_cancelled() {
                                assert_eq!(token.reason().as_deref(), Some("deadline"));
                                return;
                            }
                        }
                    })
                })
                .collect();

            token.cancel("deadline");
            for observer in observers {
                observer.join().unwrap();
            }
        }
    }

    #[test]
    fn test_callbacks_registered_during_cancel_all_run() {
        for _ in 0..50 {
            let token = CancellationToken::new();
            let counter = Arc::new(AtomicUsize::new(0));

            let registrars: Vec<_> = (0..4)
                .map(|_| {
                    let token = token.clone();
                    let counter = counter.clone();
                    std::thread::spawn(move || {
                        for _ in 0..25 {
                            let c = counter.clone();
                            token.on_cancel(move || {
                                c.fetch_add(1, Ordering::SeqCst);
                            });
                        }
                    })
                })
                .collect();

            token.cancel("shutdown");
            for registrar in registrars {
                registrar.join().unwrap();
            }
            assert_eq!(counter.load(Ordering::SeqCst), 100);
        }
    }
}

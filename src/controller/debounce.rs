use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Single-slot debounce timer handle.
///
/// Arming cancels and replaces any pending timer, guaranteeing at most one
/// pending timer per logical channel at any time. The armed action runs
/// after the delay elapses uninterrupted; an in-flight action is not
/// cancelled once the sleep completes.
#[derive(Debug, Default)]
pub(crate) struct DebounceSlot {
    handle: Option<JoinHandle<()>>,
}

impl DebounceSlot {
    pub(crate) fn idle() -> Self {
        Self::default()
    }

    /// Cancel any pending timer and start a new one.
    ///
    /// Must be called within a tokio runtime.
    pub(crate) fn arm<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Cancel the pending timer without running its action.
    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_the_pending_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = DebounceSlot::idle();
        for _ in 0..3 {
            let fired = Arc::clone(&fired);
            slot.arm(Duration::from_millis(100), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_the_action() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = DebounceSlot::idle();
        {
            let fired = Arc::clone(&fired);
            slot.arm(Duration::from_millis(100), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(slot.is_armed());
        slot.cancel();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

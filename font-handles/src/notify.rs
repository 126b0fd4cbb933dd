//! teardown notification glue

/// Runs a caller-supplied notification exactly once.
///
/// The closure's captures stand in for the opaque user data that C APIs
/// thread through destroy callbacks; dropping the guard is the release
/// path, so the notification cannot fire twice and cannot be skipped.
pub(crate) struct Teardown(Option<Box<dyn FnOnce() + Send + Sync>>);

impl Teardown {
    pub(crate) fn new<F>(notify: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Teardown(Some(Box::new(notify)))
    }

    pub(crate) const fn none() -> Self {
        Teardown(None)
    }

    /// Consume the guard, firing the notification immediately.
    ///
    /// Used when construction short-circuits (zero-length input) and no
    /// object exists to carry the guard to a later drop.
    pub(crate) fn fire_now(mut self) {
        if let Some(notify) = self.0.take() {
            notify();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        if let Some(notify) = self.0.take() {
            notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fires_on_drop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let guard = Teardown::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fire_now_does_not_double_fire() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let guard = Teardown::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        guard.fire_now();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn none_is_silent() {
        drop(Teardown::none());
    }
}

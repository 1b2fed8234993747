// smoothflow_core/src/estimation/control.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation of a running filter. Clones share one flag, so a
/// clone handed to another thread can stop a filter call in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Receives progress of a filter call as a fraction in `[0, 1]`. Called from
/// worker threads, in no particular order.
pub trait FilterObserver: Sync {
    fn notify_progress(&self, fraction: f64);
}

impl<F> FilterObserver for F
where
    F: Fn(f64) + Sync,
{
    fn notify_progress(&self, fraction: f64) {
        self(fraction)
    }
}

/// Optional hooks for one filter call.
#[derive(Clone, Copy, Default)]
pub struct FilterOptions<'a> {
    pub cancel: Option<&'a CancellationToken>,
    pub observer: Option<&'a dyn FilterObserver>,
}

impl<'a> FilterOptions<'a> {
    pub fn with_cancel(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_observer(mut self, observer: &'a dyn FilterObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn report(&self, fraction: f64) {
        if let Some(observer) = self.observer {
            observer.notify_progress(fraction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());
        remote.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn options_forward_progress() {
        let seen = Mutex::new(Vec::new());
        let observer = |f: f64| seen.lock().unwrap().push(f);
        let options = FilterOptions::default().with_observer(&observer);
        options.report(0.5);
        options.report(1.0);
        assert_eq!(*seen.lock().unwrap(), vec![0.5, 1.0]);
        assert!(!options.is_cancelled());
    }
}

//! Cooperative cancellation for long-running poll loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply clonable cancellation flag. The query executor checks it on
/// every poll iteration; once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_visible_through_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());

        token.cancel();
        assert!(observer.is_cancelled());
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide token-store availability flag.
///
/// Starts closed (store available) and trips at most once. There is no reset:
/// only a process restart brings the store back into use.
#[derive(Debug, Default)]
pub struct StoreBreaker {
    tripped: AtomicBool,
}

impl StoreBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A breaker that is already open, e.g. when the backend was unreachable at startup.
    pub fn new_tripped() -> Self {
        StoreBreaker {
            tripped: AtomicBool::new(true),
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Returns `true` only for the single caller that performed the transition.
    pub fn trip(&self) -> bool {
        self.tripped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

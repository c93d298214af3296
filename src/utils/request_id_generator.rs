use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request id source, one per transport client.
///
/// Ids start at 1 so that 0 never appears on the wire as a live request.
/// Wrapping after 2^64 ids is accepted.
#[derive(Debug)]
pub struct RequestIdGenerator {
    next: AtomicU64,
}

impl Default for RequestIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

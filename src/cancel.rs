//! A cooperative cancellation flag passed down through rendering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared between a caller and an in-flight render. Cloning a token shares
/// the same underlying flag; cancelling any clone cancels all of them.
/// Checked by the executor before each resolver call and before each `for`
/// iteration, and always propagates as [`crate::error::Error::Cancelled`]
/// regardless of the tag's error strategy.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

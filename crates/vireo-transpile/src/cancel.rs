//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{TranspileError, TranspileResult};

/// A caller-provided cancellation token.
///
/// Cloning is cheap; all clones observe the same flag. The transpilation
/// pipeline checks the token between stages and on every emitted operation
/// inside the router loop, returning [`TranspileError::Cancelled`] with no
/// partial result once the flag is set. Timeouts are the caller's business:
/// arm a timer that calls [`CancelToken::cancel`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Bail out with [`TranspileError::Cancelled`] if requested.
    #[inline]
    pub fn check(&self) -> TranspileResult<()> {
        if self.is_cancelled() {
            Err(TranspileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(TranspileError::Cancelled)));
    }
}

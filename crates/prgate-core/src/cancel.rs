//! Run cancellation.
//!
//! A run is cancelled when newer pull-request state supersedes it. Workers
//! already evaluating are left to finish; the signal only stops new side
//! effects from being initiated.

use tokio::sync::watch;

use crate::error::{EvalError, EvalResult};

/// Create a linked handle/signal pair.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Owner side: fires the cancellation.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Stores the flag even with no live receivers, so later signals see it.
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side, cloned into every worker.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Gate in front of a side effect.
    pub fn ensure_active(&self) -> EvalResult<()> {
        if self.is_cancelled() {
            Err(EvalError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_stays_active() {
        let signal = CancelSignal::never();
        assert!(!signal.is_cancelled());
        assert!(signal.ensure_active().is_ok());
    }

    #[test]
    fn cancel_reaches_every_signal() {
        let (handle, first) = cancellation();
        let second = handle.signal();
        handle.cancel();
        assert!(first.is_cancelled());
        assert_eq!(second.ensure_active(), Err(EvalError::Cancelled));
    }
}

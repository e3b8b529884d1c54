//! Deletion confirmation polling
//!
//! After a delete is issued the object may linger while it terminates. The
//! poll checks immediately, then keeps checking until the remote handle
//! reports not-found or the timeout elapses. Blocking, no cancellation.

use crate::context::WaitObserver;
use crate::error::{Error, Result};
use crate::resource::ResourceDescriptor;
use crate::types::{DeletionWaitState, WaitConfig};
use std::thread;
use std::time::{Duration, Instant};

/// Confirmation state machine for one descriptor.
///
/// `Pending -> ConfirmedDeleted` on not-found, `Pending -> Errored` on any
/// other get failure, `Pending -> TimedOut` when the deadline passes.
#[derive(Debug)]
pub struct DeletionWatch<'a> {
    descriptor: &'a ResourceDescriptor,
    state: DeletionWaitState,
}

impl<'a> DeletionWatch<'a> {
    pub fn new(descriptor: &'a ResourceDescriptor) -> Self {
        Self {
            descriptor,
            state: DeletionWaitState::Pending,
        }
    }

    pub fn state(&self) -> DeletionWaitState {
        self.state
    }

    /// Issue one get and advance the state.
    ///
    /// Returns the error that moved the watch to `Errored`.
    pub fn probe(&mut self) -> Result<DeletionWaitState> {
        match self.descriptor.get() {
            Ok(_) => {}
            Err(e) if e.is_not_found() => self.state = DeletionWaitState::ConfirmedDeleted,
            Err(e) => {
                self.state = DeletionWaitState::Errored;
                return Err(e);
            }
        }
        Ok(self.state)
    }

    /// Mark the watch as timed out
    pub fn expire(&mut self) {
        self.state = DeletionWaitState::TimedOut;
    }
}

/// Poll until the descriptor's object is gone.
///
/// Returns `DeletionTimeout` if absence is not observed within `timeout`,
/// and any non-not-found get error as-is.
pub fn poll_until_absent(
    descriptor: &ResourceDescriptor,
    config: &WaitConfig,
    timeout: Duration,
    observer: &mut dyn WaitObserver,
) -> Result<()> {
    let reference = descriptor.reference();
    let deadline = Instant::now() + timeout;
    let mut watch = DeletionWatch::new(descriptor);
    let mut attempt: u32 = 0;

    observer.on_wait_start(&reference);

    loop {
        observer.on_poll(&reference, attempt);
        match watch.probe() {
            Ok(DeletionWaitState::ConfirmedDeleted) => {
                log::debug!("{reference} confirmed deleted after {} polls", attempt + 1);
                observer.on_wait_complete(&reference, watch.state());
                return Ok(());
            }
            Ok(_) => {}
            Err(e) => {
                log::debug!("{reference} poll failed: {e}");
                observer.on_wait_complete(&reference, watch.state());
                return Err(e);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            watch.expire();
            observer.on_wait_complete(&reference, watch.state());
            return Err(Error::DeletionTimeout {
                reference,
                origin: descriptor.source.clone(),
                timeout,
            });
        }

        let delay = config.delay_for_attempt(attempt).min(deadline - now);
        log::trace!("{reference} still present, next poll in {delay:?}");
        thread::sleep(delay);
        attempt = attempt.saturating_add(1);
    }
}

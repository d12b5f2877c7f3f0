use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use crossbeam_utils::sync::WaitGroup;
use parking_lot::Mutex;

/// One-way `Open → Closed` state shared by a handle and its observers.
///
/// The close signal is a channel that never carries a value: its only sender
/// is dropped on the closed transition, which wakes every receiver. A permit
/// taken from the embedder's [`WaitGroup`] is released at the same moment.
#[derive(Debug)]
pub struct Lifecycle {
    state: Mutex<State>,
    signal: Receiver<()>,
}

#[derive(Debug)]
struct State {
    closed: bool,
    notify: Option<Sender<()>>,
    permit: Option<WaitGroup>,
}

impl Lifecycle {
    pub fn new(wait_group: Option<&WaitGroup>) -> Self {
        let (notify, signal) = bounded(0);
        Self {
            state: Mutex::new(State {
                closed: false,
                notify: Some(notify),
                permit: wait_group.cloned(),
            }),
            signal,
        }
    }

    /// Runs `close` once, under the state lock, then marks the lifecycle closed.
    ///
    /// The transition, the signal and the permit release happen whatever
    /// `close` returns. Later calls return `Ok` without running anything.
    pub fn close_with<F, E>(&self, close: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<(), E>,
    {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }

        let result = close();

        state.closed = true;
        state.notify.take();
        state.permit.take();
        result
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Blocks until the lifecycle is closed.
    pub fn wait(&self) {
        // Nothing is ever sent, so this only returns once the sender is gone.
        let _ = self.signal.recv();
    }

    /// Returns `true` if the lifecycle closed within `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.signal.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    pub fn signal(&self) -> Receiver<()> {
        self.signal.clone()
    }
}

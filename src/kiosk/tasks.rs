use super::types::{Signal, TimerKind};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Duration;

/// Timers and background operations belonging to the current screen.
/// Everything registered here is aborted when the screen is left.
pub(crate) struct ScreenTasks {
    signals: mpsc::UnboundedSender<Signal>,
    handles: Vec<AbortHandle>,
}

impl ScreenTasks {
    pub(crate) const fn new(signals: mpsc::UnboundedSender<Signal>) -> Self {
        Self {
            signals,
            handles: Vec::new(),
        }
    }

    /// Deliver `timer` tagged with `epoch` after `delay`
    pub(crate) fn schedule(&mut self, epoch: u64, delay: Duration, timer: TimerKind) {
        let signals = self.signals.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signals.send(Signal::Timer { epoch, timer });
        });
        self.track(&handle);
    }

    /// Run `op` in the background and forward its signal. A panic inside
    /// `op` is reported as [`Signal::TaskFailed`] instead of being lost.
    pub(crate) fn spawn_op<F>(&mut self, task: &'static str, op: F)
    where
        F: Future<Output = Signal> + Send + 'static,
    {
        let signals = self.signals.clone();
        let inner = tokio::spawn(op);
        self.handles.push(inner.abort_handle());

        let watcher = tokio::spawn(async move {
            match inner.await {
                Ok(signal) => {
                    let _ = signals.send(signal);
                }
                Err(e) if e.is_panic() => {
                    let _ = signals.send(Signal::TaskFailed {
                        task,
                        message: e.to_string(),
                    });
                }
                // Cancelled together with its screen
                Err(_) => {}
            }
        });
        self.track(&watcher);
    }

    fn track<T>(&mut self, handle: &JoinHandle<T>) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle.abort_handle());
    }

    pub(crate) fn cancel_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }
}

impl Drop for ScreenTasks {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

//! Shared call log for mock providers.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::watch;

use crate::job::Stage;

/// One recorded stage call.
#[derive(Debug, Clone)]
pub struct StageCall {
    pub stage: Stage,
    /// What the provider was called with (URL, job id, path or text).
    pub input: String,
    pub started_at: Instant,
    /// Unset while the call is still running.
    pub finished_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct RecorderState {
    calls: Vec<StageCall>,
    running: usize,
    max_running: usize,
}

/// Records every stage call made through the mocks that share it, and how
/// many calls were ever in flight at once.
#[derive(Debug, Clone, Default)]
pub struct StageRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl StageRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a call as started. The call ends when the guard is dropped.
    pub fn begin(&self, stage: Stage, input: impl Into<String>) -> StageGuard {
        let mut state = self.lock();
        state.calls.push(StageCall {
            stage,
            input: input.into(),
            started_at: Instant::now(),
            finished_at: None,
        });
        state.running += 1;
        state.max_running = state.max_running.max(state.running);

        StageGuard {
            recorder: self.clone(),
            index: state.calls.len() - 1,
        }
    }

    pub fn calls(&self) -> Vec<StageCall> {
        self.lock().calls.clone()
    }

    /// Inputs passed to `stage`, in call order.
    pub fn inputs(&self, stage: Stage) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.stage == stage)
            .map(|c| c.input.clone())
            .collect()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.lock().calls.iter().filter(|c| c.stage == stage).count()
    }

    /// Highest number of calls that were running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.lock().max_running
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.calls.clear();
        state.max_running = state.running;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Ends a recorded call on drop, including when the call panics.
#[derive(Debug)]
pub struct StageGuard {
    recorder: StageRecorder,
    index: usize,
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let mut state = self.recorder.lock();
        state.running = state.running.saturating_sub(1);
        if let Some(call) = state.calls.get_mut(self.index) {
            call.finished_at = Some(Instant::now());
        }
    }
}

/// Open/closed gate a mock waits on before answering.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    /// Creates an open gate.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    pub fn close(&self) {
        self.tx.send_replace(false);
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    /// Waits until the gate is open.
    pub async fn pass(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

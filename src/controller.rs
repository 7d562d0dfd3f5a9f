//! Start/stop state machine driving the rotation-prediction loop.
//!
//! The loop is cooperative: a stop request is only looked at between
//! iterations, so an iteration that has begun always trains and tests
//! before the controller goes back to [`LoopState::Stopped`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::error::DemoError;
use crate::session::{RotationSession, Trial};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Cloneable handle for requesting a stop, e.g. from another thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub enum IterationOutcome {
    Completed(Trial),
    /// The iteration was abandoned; stats are untouched.
    Aborted(DemoError),
}

/// Totals from a blocking [`LoopController::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: u64,
    pub aborted: u64,
}

#[derive(Debug)]
pub struct LoopController {
    state: LoopState,
    stop: StopHandle,
    last_iteration: Option<Instant>,
}

impl Default for LoopController {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopController {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
            stop: StopHandle::default(),
            last_iteration: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Move to `Running`. Needs at least one image and a ready embedder;
    /// a no-op when already running.
    pub fn start(&mut self, session: &RotationSession) -> Result<(), DemoError> {
        if self.is_running() {
            return Ok(());
        }
        if session.images().is_empty() {
            return Err(DemoError::NoImages);
        }
        if !session.embedder_ready() {
            return Err(DemoError::ModelNotReady);
        }
        self.stop.clear();
        self.last_iteration = None;
        self.state = LoopState::Running;
        tracing::info!("Rotation loop started with {} image(s)", session.images().len());
        Ok(())
    }

    /// Request a stop at the next iteration boundary.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Run one iteration now, ignoring the delay.
    ///
    /// Returns `None` when stopped. This is the only place a stop request is
    /// honoured.
    pub fn step(&mut self, session: &mut RotationSession) -> Option<IterationOutcome> {
        if !self.is_running() {
            return None;
        }
        if self.stop.is_stop_requested() {
            self.state = LoopState::Stopped;
            tracing::info!("Rotation loop stopped; {}", session.stats());
            return None;
        }

        let outcome = match session.run_iteration() {
            Ok(trial) => IterationOutcome::Completed(trial),
            Err(err) => {
                tracing::warn!("Rotation iteration aborted: {err}");
                if matches!(err, DemoError::NoImages | DemoError::ModelNotReady) {
                    // Nothing to iterate on until the user intervenes.
                    self.state = LoopState::Stopped;
                }
                IterationOutcome::Aborted(err)
            }
        };
        self.last_iteration = Some(Instant::now());
        Some(outcome)
    }

    /// Non-blocking driver for event loops: steps only once the session's
    /// delay has passed since the previous iteration. Pending stops are
    /// honoured immediately.
    pub fn tick(&mut self, session: &mut RotationSession) -> Option<IterationOutcome> {
        if !self.is_running() {
            return None;
        }
        let waiting = self
            .last_iteration
            .is_some_and(|last| last.elapsed() < session.settings().delay());
        if waiting && !self.stop.is_stop_requested() {
            return None;
        }
        self.step(session)
    }

    /// Blocking driver: iterate until stopped, sleeping the configured delay
    /// between iterations. With a `limit`, requests its own stop after that
    /// many iterations (completed or aborted).
    pub fn run(&mut self, session: &mut RotationSession, limit: Option<u64>) -> RunSummary {
        self.run_with(session, limit, |_| {})
    }

    /// [`run`](Self::run), handing every outcome to `on_outcome` as it arrives.
    pub fn run_with<F>(
        &mut self,
        session: &mut RotationSession,
        limit: Option<u64>,
        mut on_outcome: F,
    ) -> RunSummary
    where
        F: FnMut(&IterationOutcome),
    {
        let mut summary = RunSummary::default();
        if limit == Some(0) {
            self.stop();
        }
        while let Some(outcome) = self.step(session) {
            on_outcome(&outcome);
            match outcome {
                IterationOutcome::Completed(_) => summary.completed += 1,
                IterationOutcome::Aborted(_) => summary.aborted += 1,
            }
            if limit.is_some_and(|limit| summary.completed + summary.aborted >= limit) {
                self.stop();
            }
            let delay = session.settings().delay();
            if !delay.is_zero() && !self.stop.is_stop_requested() {
                std::thread::sleep(delay);
            }
        }
        summary
    }
}

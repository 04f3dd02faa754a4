//! Remote training lifecycle.
//!
//! Backends that train asynchronously expose their status through a
//! [`TrainingProbe`]. The [`TrainingPoller`] walks the probe through
//! `Submitted → Training → Ready | Failed`, sleeping a fixed interval between
//! polls. The sleeper is injected so tests never wait on a real clock.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::error::{BenchError, Result};

/// Observed state of a remote training job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingState {
    /// Training was requested but has not started.
    Submitted,
    /// Training is in progress.
    Training,
    /// The model is ready to serve predictions.
    Ready,
    /// The backend reported a failure.
    Failed(String),
}

impl TrainingState {
    /// Whether polling can stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainingState::Ready | TrainingState::Failed(_))
    }
}

/// Source of training status updates.
pub trait TrainingProbe {
    /// Query the current training state.
    fn poll(&mut self) -> Result<TrainingState>;
}

impl<F> TrainingProbe for F
where
    F: FnMut() -> Result<TrainingState>,
{
    fn poll(&mut self) -> Result<TrainingState> {
        self()
    }
}

/// Blocking wait between polls.
pub trait Sleeper: Send + Sync {
    /// Block the current thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// How often, and how many times, to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between two polls.
    pub interval: Duration,
    /// Maximum number of polls; `None` waits for as long as the backend takes.
    pub max_polls: Option<usize>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            interval: Duration::from_secs(1),
            max_polls: None,
        }
    }
}

/// Drives a [`TrainingProbe`] until it reaches a terminal state.
#[derive(Clone)]
pub struct TrainingPoller {
    policy: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for TrainingPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingPoller")
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for TrainingPoller {
    fn default() -> Self {
        Self::new(PollPolicy::default(), Arc::new(ThreadSleeper))
    }
}

impl TrainingPoller {
    /// Create a poller with an explicit policy and sleeper.
    pub fn new(policy: PollPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        TrainingPoller { policy, sleeper }
    }

    /// Poll policy in use.
    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Sleep for an arbitrary duration through the injected sleeper.
    pub fn pause(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    /// Poll until the model is ready; returns the number of polls made.
    pub fn wait(&self, backend: &str, probe: &mut dyn TrainingProbe) -> Result<usize> {
        let mut polls = 0;
        loop {
            let state = probe.poll()?;
            polls += 1;
            debug!("[{backend}] training poll {polls}: {state:?}");

            match state {
                TrainingState::Ready => return Ok(polls),
                TrainingState::Failed(reason) => {
                    return Err(BenchError::training(backend, reason));
                }
                TrainingState::Submitted | TrainingState::Training => {
                    if let Some(max_polls) = self.policy.max_polls {
                        if polls >= max_polls {
                            return Err(BenchError::training(
                                backend,
                                format!("model not ready after {polls} polls"),
                            ));
                        }
                    }
                    self.sleeper.sleep(self.policy.interval);
                }
            }
        }
    }
}

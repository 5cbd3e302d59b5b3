//! Analysis update coalescing.
//!
//! The engine may report progress far more often than a large graph can be
//! re-laid out. `UpdateScheduler` reduces the stream of "still analyzing?"
//! answers, whether polled on a timer or pushed as notifications, to two
//! edges: `Started` (show the indicator, freeze the last good frame) and
//! `Finished` (hide it, render once). Everything in between is `Steady`.
//!
//! A pass opened by an engine notification is closed only by an engine
//! notification. The polled status may lag the pushed one, and a poll
//! reporting "idle" in the middle of a pushed pass would otherwise split it
//! into two renders.

use crate::core::location::FunctionRef;
use crate::view::event::{PaneSide, ViewEvent};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

/// Edge detected by one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTransition {
    /// No change since the last observation
    Steady,
    /// not-updating → updating
    Started,
    /// updating → not-updating
    Finished,
}

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    /// Periodic `is_update_in_progress` query
    Poll,
    /// `AnalysisProgress` / `AnalysisComplete` pushed by the engine
    Notification,
}

/// Per-pane update tracker.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    function: Option<FunctionRef>,
    updating: bool,
    /// Current pass was opened by a notification
    pushed: bool,
    observations: u64,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one status observation for the pane's bound function.
    ///
    /// Rebinding to a different function resets the tracker, so a pass that
    /// was running on the old function never produces `Finished` for the new
    /// one. A poll never finishes a pass opened by a notification.
    pub fn observe(
        &mut self,
        function: Option<&FunctionRef>,
        in_progress: bool,
        source: UpdateSource,
    ) -> UpdateTransition {
        self.observations += 1;
        if self.function.as_ref() != function {
            trace!(function = ?function.map(|f| f.start), "update tracker rebound");
            self.function = function.cloned();
            self.updating = false;
            self.pushed = false;
        }
        if self.function.is_none() {
            return UpdateTransition::Steady;
        }
        if in_progress && source == UpdateSource::Notification {
            self.pushed = true;
        }

        match (self.updating, in_progress) {
            (false, true) => {
                self.updating = true;
                debug!(function = ?function.map(|f| f.start), ?source, "analysis update started");
                UpdateTransition::Started
            }
            (true, false) if self.pushed && source == UpdateSource::Poll => {
                trace!(function = ?function.map(|f| f.start), "idle poll ignored during pushed pass");
                UpdateTransition::Steady
            }
            (true, false) => {
                self.updating = false;
                self.pushed = false;
                debug!(function = ?function.map(|f| f.start), ?source, "analysis update finished");
                UpdateTransition::Finished
            }
            _ => UpdateTransition::Steady,
        }
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn observations(&self) -> u64 {
        self.observations
    }
}

/// Timer posting `ViewEvent::Tick` onto the UI queue at a fixed period.
///
/// The task is aborted when the handle is dropped, so it never outlives the
/// pane that owns it. Missed ticks are skipped rather than bunched.
#[derive(Debug)]
pub struct PeriodicTask {
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn on the current tokio runtime.
    pub fn spawn(period: Duration, side: PaneSide, queue: UnboundedSender<ViewEvent>) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if queue.send(ViewEvent::Tick(side)).is_err() {
                    break;
                }
            }
        });
        debug!(side = side.value(), period_ms = period.as_millis() as u64, "update poll started");
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

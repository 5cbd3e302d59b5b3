//! Events flowing between panes, the coordinator, and the host.
//!
//! `PaneEvent`s are produced synchronously by a pane when its committed state
//! changes; the owner drains and routes them. `ViewEvent`s arrive
//! asynchronously on the UI queue (timer ticks and engine notifications).

use crate::core::highlight::HighlightTokenState;
use crate::core::il_tier::IlTier;
use crate::core::location::{FunctionRef, ViewLocation};
use std::fmt;

/// Which pane of a reflection pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaneSide {
    Primary,
    Mirror,
}

impl PaneSide {
    pub fn other(self) -> PaneSide {
        match self {
            PaneSide::Primary => PaneSide::Mirror,
            PaneSide::Mirror => PaneSide::Primary,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            PaneSide::Primary => "primary",
            PaneSide::Mirror => "mirror",
        }
    }
}

impl fmt::Display for PaneSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Committed state change of one pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneEvent {
    LocationChanged(ViewLocation),
    TierChanged { from: IlTier, to: IlTier },
    HighlightChanged(HighlightTokenState),
}

impl PaneEvent {
    /// Hand this event to an observer as coming from `source`.
    pub fn deliver(&self, source: PaneSide, observer: &mut dyn ViewObserver) {
        match self {
            PaneEvent::LocationChanged(location) => observer.on_location_changed(source, location),
            PaneEvent::TierChanged { to, .. } => observer.on_tier_changed(source, *to),
            PaneEvent::HighlightChanged(state) => observer.on_highlight_changed(source, state),
        }
    }
}

/// Observer of pane state changes.
///
/// Any toolkit's native event hookup can implement this; every method has an
/// empty default.
pub trait ViewObserver {
    fn on_location_changed(&mut self, _source: PaneSide, _location: &ViewLocation) {}
    fn on_tier_changed(&mut self, _source: PaneSide, _tier: IlTier) {}
    fn on_highlight_changed(&mut self, _source: PaneSide, _state: &HighlightTokenState) {}
}

/// Asynchronous event delivered onto the UI thread's queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Periodic update poll for one pane
    Tick(PaneSide),
    /// Engine progress notification: `function` is being re-analyzed
    AnalysisProgress(FunctionRef),
    /// Engine notification: an analysis pass over `function` finished
    AnalysisComplete(FunctionRef),
    /// Engine notification: content of `function` changed outside a full pass
    FunctionChanged(FunctionRef),
    /// Pane state change reported late by the host toolkit
    Pane { side: PaneSide, event: PaneEvent },
}

//! Reflection: a primary pane paired with a mirror pane.
//!
//! Navigation and tier changes made by the user in one pane are replayed in
//! the other, with the tier translated through a `TierMapping`. Each user
//! gesture produces at most one propagation step:
//!
//! ```text
//!   Idle --user gesture on primary--> PropagatingFromPrimary --mirror committed--> Idle
//!   Idle --user gesture on mirror---> PropagatingFromMirror  --primary committed--> Idle
//! ```
//!
//! Only `Idle` accepts user gestures. Whatever the target pane reports while
//! a step is in flight is the effect of that step and is never propagated
//! back. Reports that arrive later through the UI queue are checked against
//! the memo of the last step (`last_source_tier`/`last_target_tier`) and
//! dropped as echoes when they match.

use crate::config::{ReflectionConfig, ViewConfig};
use crate::core::highlight::HighlightTokenState;
use crate::core::history::HistoryEntry;
use crate::core::il_tier::IlTier;
use crate::core::location::{FunctionRef, ViewLocation};
use crate::core::options::DisplayOptions;
use crate::engine::AnalysisEngine;
use crate::render::Renderer;
use crate::span_trace;
use crate::view::container::PaneContainer;
use crate::view::event::{PaneEvent, PaneSide, ViewEvent, ViewObserver};
use std::collections::BTreeMap;
use std::rc::Rc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, trace, warn};

/// Primary tier → mirror tier. Keys and values are both unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierMapping {
    forward: BTreeMap<IlTier, IlTier>,
}

impl TierMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (IlTier, IlTier)>) -> Self {
        let mut mapping = Self::new();
        for (from, to) in pairs {
            mapping.insert(from, to);
        }
        mapping
    }

    /// Map `from` to `to`, dropping any other tier that mapped to `to`.
    /// Returns the previous counterpart of `from`.
    pub fn insert(&mut self, from: IlTier, to: IlTier) -> Option<IlTier> {
        self.forward.retain(|k, v| *k == from || *v != to);
        self.forward.insert(from, to)
    }

    pub fn remove(&mut self, from: IlTier) -> Option<IlTier> {
        self.forward.remove(&from)
    }

    /// Mirror tier for a primary tier.
    pub fn get(&self, from: IlTier) -> Option<IlTier> {
        self.forward.get(&from).copied()
    }

    /// Primary tier for a mirror tier.
    pub fn reverse(&self, to: IlTier) -> Option<IlTier> {
        self.forward
            .iter()
            .find(|(_, v)| **v == to)
            .map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IlTier, IlTier)> + '_ {
        self.forward.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    PropagatingFromPrimary,
    PropagatingFromMirror,
}

impl SyncPhase {
    fn from_source(side: PaneSide) -> Self {
        match side {
            PaneSide::Primary => SyncPhase::PropagatingFromPrimary,
            PaneSide::Mirror => SyncPhase::PropagatingFromMirror,
        }
    }
}

/// Synchronization state, mutated only by the coordinator.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub il_sync_enabled: bool,
    pub location_sync_enabled: bool,
    /// Source pane tier of the last propagation step
    pub last_source_tier: IlTier,
    /// Tier applied to the target pane by the last propagation step
    pub last_target_tier: IlTier,
    last_source: Option<PaneSide>,
    last_target_location: Option<ViewLocation>,
    phase: SyncPhase,
}

impl SyncState {
    fn new(config: &ReflectionConfig) -> Self {
        Self {
            il_sync_enabled: config.il_sync,
            location_sync_enabled: config.location_sync,
            last_source_tier: IlTier::Normal,
            last_target_tier: IlTier::Normal,
            last_source: None,
            last_target_location: None,
            phase: SyncPhase::Idle,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    /// True only while one propagation step is in flight.
    pub fn override_active(&self) -> bool {
        self.phase != SyncPhase::Idle
    }

    /// Pane the last propagation step started from.
    pub fn last_source(&self) -> Option<PaneSide> {
        self.last_source
    }
}

/// Committed changes of one gesture on its source pane.
#[derive(Debug, Default)]
struct Gesture {
    location: Option<ViewLocation>,
    tier: Option<IlTier>,
}

impl Gesture {
    fn is_empty(&self) -> bool {
        self.location.is_none() && self.tier.is_none()
    }
}

impl ViewObserver for Gesture {
    fn on_location_changed(&mut self, _source: PaneSide, location: &ViewLocation) {
        self.location = Some(location.clone());
    }

    fn on_tier_changed(&mut self, _source: PaneSide, tier: IlTier) {
        self.tier = Some(tier);
    }
}

pub struct ReflectionCoordinator {
    primary: PaneContainer,
    mirror: PaneContainer,
    mapping: TierMapping,
    state: SyncState,
    mirror_visible: bool,
    /// Mirror missed propagation while hidden
    resync_pending: bool,
    observers: Vec<Box<dyn ViewObserver>>,
    propagations: u64,
}

impl ReflectionCoordinator {
    pub fn new(
        engine: Rc<dyn AnalysisEngine>,
        renderer: Rc<dyn Renderer>,
        config: &ViewConfig,
    ) -> Self {
        let primary = PaneContainer::new(engine.clone(), renderer.clone(), config.pane.clone());
        let mirror_config = config
            .pane
            .clone()
            .with_default_tier(config.reflection.mirror_tier);
        let mirror = PaneContainer::new(engine, renderer, mirror_config);
        Self::with_panes(primary, mirror, &config.reflection)
    }

    /// Pair two already constructed panes (e.g. with per-pane config overrides).
    pub fn with_panes(primary: PaneContainer, mirror: PaneContainer, config: &ReflectionConfig) -> Self {
        Self {
            primary,
            mirror,
            mapping: TierMapping::from_pairs(config.tier_map.iter().copied()),
            state: SyncState::new(config),
            mirror_visible: true,
            resync_pending: false,
            observers: Vec::new(),
            propagations: 0,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ViewObserver>) {
        self.observers.push(observer);
    }

    // -- user gestures --------------------------------------------------

    pub fn navigate(&mut self, side: PaneSide, location: ViewLocation) -> bool {
        self.gesture(side, |pane| pane.navigate(location))
    }

    pub fn navigate_to_address(&mut self, side: PaneSide, address: u64) -> bool {
        self.gesture(side, |pane| pane.navigate_to_address(address))
    }

    pub fn set_current_function(&mut self, side: PaneSide, function: Option<FunctionRef>) -> bool {
        self.gesture(side, |pane| pane.set_current_function(function))
    }

    pub fn set_il_tier(&mut self, side: PaneSide, tier: IlTier) -> bool {
        self.gesture(side, |pane| pane.set_il_tier(tier))
    }

    pub fn cycle_il_tier(&mut self, side: PaneSide, forward: bool) -> bool {
        self.gesture(side, |pane| pane.cycle_il_tier(forward))
    }

    pub fn navigate_to_history_entry(&mut self, side: PaneSide, entry: &HistoryEntry) -> bool {
        self.gesture(side, |pane| pane.navigate_to_history_entry(entry))
    }

    pub fn select_token(&mut self, side: PaneSide, state: HighlightTokenState) {
        self.gesture(side, |pane| {
            pane.select_graph_token(state);
            true
        });
    }

    pub fn header_click(&mut self, side: PaneSide, line: usize, column: usize) -> bool {
        self.gesture(side, |pane| pane.header_click(line, column))
    }

    pub fn header_double_click(&mut self, side: PaneSide, line: usize, column: usize) -> bool {
        self.gesture(side, |pane| pane.header_double_click(line, column))
    }

    /// Display options are per pane and never propagate.
    pub fn set_option(&mut self, side: PaneSide, option: DisplayOptions, enabled: bool) -> bool {
        self.pane_mut(side).set_option(option, enabled)
    }

    pub fn toggle_option(&mut self, side: PaneSide, option: DisplayOptions) -> bool {
        self.pane_mut(side).toggle_option(option)
    }

    fn gesture(&mut self, side: PaneSide, op: impl FnOnce(&mut PaneContainer) -> bool) -> bool {
        if self.state.override_active() {
            warn!(side = side.value(), phase = ?self.state.phase, "gesture rejected during propagation");
            return false;
        }
        let span = span_trace!("gesture", side = side.value());
        let _guard = span.enter();

        let ok = op(self.pane_mut(side));
        // The source has committed; only now may the other pane follow.
        let events = self.pane_mut(side).take_events();
        self.notify_observers(side, &events);
        let gesture = Self::collect(side, &events);
        if !gesture.is_empty() {
            self.propagate(side, &gesture);
        }
        ok
    }

    fn collect(side: PaneSide, events: &[PaneEvent]) -> Gesture {
        let mut gesture = Gesture::default();
        for event in events {
            event.deliver(side, &mut gesture);
        }
        gesture
    }

    // -- propagation ----------------------------------------------------

    fn mapped_tier(&self, source: PaneSide, tier: IlTier) -> Option<IlTier> {
        match source {
            PaneSide::Primary => self.mapping.get(tier),
            PaneSide::Mirror => self.mapping.reverse(tier),
        }
    }

    /// Apply one gesture's effect to the other pane. Returns whether a step ran.
    fn propagate(&mut self, source: PaneSide, gesture: &Gesture) -> bool {
        let target = source.other();
        let location_step = self.state.location_sync_enabled && gesture.location.is_some();
        let tier_step = self.state.il_sync_enabled && !gesture.is_empty();
        if !location_step && !tier_step {
            return false;
        }
        if !self.mirror_visible {
            trace!(source = source.value(), "mirror hidden, propagation deferred");
            self.resync_pending = true;
            return false;
        }

        let source_tier = self.pane(source).tier();
        let target_tier = self.pane(target).tier();
        let mapped = if tier_step {
            self.mapped_tier(source, source_tier).unwrap_or(target_tier)
        } else {
            target_tier
        };

        self.state.phase = SyncPhase::from_source(source);
        self.state.last_source = Some(source);
        self.state.last_source_tier = source_tier;
        self.state.last_target_tier = mapped;
        debug!(
            source = source.value(),
            from = source_tier.value(),
            to = mapped.value(),
            location = location_step,
            "propagating"
        );

        if location_step {
            let source_location = self.pane(source).location().clone();
            let target_location = match &source_location.function {
                Some(function) => {
                    let address = self
                        .pane(source)
                        .graph()
                        .engine()
                        .map_address(function, source_tier, mapped, source_location.address)
                        .unwrap_or(source_location.address);
                    Some(ViewLocation::new(function.clone(), address, mapped))
                }
                None => None,
            };
            let pane = self.pane_mut(target);
            match target_location {
                Some(location) => {
                    if !pane.navigate(location) {
                        debug!(pane = target.value(), "target could not follow navigation");
                    }
                }
                None => {
                    pane.set_current_function(None);
                }
            }
        } else if mapped != target_tier {
            if !self.pane_mut(target).set_il_tier(mapped) {
                debug!(pane = target.value(), tier = mapped.value(), "target kept its tier");
            }
        }

        self.state.last_target_location = Some(self.pane(target).location().clone());

        // Effects of this step: reported to the host, never propagated back.
        let effects = self.pane_mut(target).take_events();
        self.notify_observers(target, &effects);

        self.state.phase = SyncPhase::Idle;
        self.propagations += 1;
        true
    }

    /// Whether a late report from `side` is the echo of the last step.
    fn is_echo(&self, side: PaneSide, gesture: &Gesture) -> bool {
        if self.state.last_source != Some(side.other()) {
            return false;
        }
        if self.pane(side.other()).tier() != self.state.last_source_tier {
            return false;
        }
        let tier_matches = gesture
            .tier
            .map_or(true, |t| t == self.state.last_target_tier);
        let location_matches = gesture.location.as_ref().map_or(true, |l| {
            self.state
                .last_target_location
                .as_ref()
                .is_some_and(|m| m.same_place(l))
        });
        tier_matches && location_matches
    }

    /// Run one step copying the primary onto the mirror, regardless of what
    /// changed. Used when the mirror comes back into view.
    pub fn resync_mirror(&mut self) -> bool {
        if self.state.override_active() {
            return false;
        }
        let gesture = Gesture {
            location: Some(self.primary.location().clone()),
            tier: Some(self.primary.tier()),
        };
        self.resync_pending = false;
        self.propagate(PaneSide::Primary, &gesture)
    }

    // -- sync controls --------------------------------------------------

    pub fn toggle_il_sync(&mut self) -> bool {
        self.set_il_sync(!self.state.il_sync_enabled);
        self.state.il_sync_enabled
    }

    pub fn toggle_location_sync(&mut self) -> bool {
        self.set_location_sync(!self.state.location_sync_enabled);
        self.state.location_sync_enabled
    }

    /// Takes effect for subsequent gestures; displayed state is left alone.
    pub fn set_il_sync(&mut self, enabled: bool) {
        if self.state.il_sync_enabled != enabled {
            info!(enabled, "IL sync");
            self.state.il_sync_enabled = enabled;
        }
    }

    pub fn set_location_sync(&mut self, enabled: bool) {
        if self.state.location_sync_enabled != enabled {
            info!(enabled, "location sync");
            self.state.location_sync_enabled = enabled;
        }
    }

    /// Hidden mirrors do not follow; becoming visible resynchronizes once.
    pub fn set_mirror_visible(&mut self, visible: bool) {
        if self.mirror_visible == visible {
            return;
        }
        self.mirror_visible = visible;
        debug!(visible, "mirror visibility changed");
        if visible && self.resync_pending {
            self.resync_mirror();
        }
    }

    pub fn is_mirror_visible(&self) -> bool {
        self.mirror_visible
    }

    pub fn set_mapping(&mut self, from: IlTier, to: IlTier) -> Option<IlTier> {
        self.mapping.insert(from, to)
    }

    pub fn remove_mapping(&mut self, from: IlTier) -> Option<IlTier> {
        self.mapping.remove(from)
    }

    pub fn mapping(&self) -> &TierMapping {
        &self.mapping
    }

    // -- UI queue -------------------------------------------------------

    /// Handle one event from the UI queue.
    pub fn handle_event(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Tick(side) => {
                self.pane_mut(side).tick();
                self.flush_passive(side);
            }
            ViewEvent::AnalysisProgress(function) => {
                for side in [PaneSide::Primary, PaneSide::Mirror] {
                    self.pane_mut(side).notify_analysis_progress(&function);
                }
            }
            ViewEvent::AnalysisComplete(function) => {
                for side in [PaneSide::Primary, PaneSide::Mirror] {
                    self.pane_mut(side).notify_analysis_complete(&function);
                    self.flush_passive(side);
                }
            }
            ViewEvent::FunctionChanged(function) => {
                for side in [PaneSide::Primary, PaneSide::Mirror] {
                    self.pane_mut(side).notify_function_changed(&function);
                }
            }
            ViewEvent::Pane { side, event } => self.handle_late_report(side, event),
        }
    }

    fn handle_late_report(&mut self, side: PaneSide, event: PaneEvent) {
        if self.state.override_active() {
            trace!(side = side.value(), "late report during propagation ignored");
            return;
        }
        let gesture = Self::collect(side, std::slice::from_ref(&event));
        if gesture.is_empty() {
            return;
        }
        if self.is_echo(side, &gesture) {
            debug!(side = side.value(), "echo suppressed");
            return;
        }
        self.propagate(side, &gesture);
    }

    /// Report events produced by updates (not gestures) to observers only.
    fn flush_passive(&mut self, side: PaneSide) {
        let events = self.pane_mut(side).take_events();
        self.notify_observers(side, &events);
    }

    /// Handle everything currently queued. Returns the number of events.
    pub fn drain_queue(&mut self, queue: &mut UnboundedReceiver<ViewEvent>) -> usize {
        let mut handled = 0;
        while let Ok(event) = queue.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Handle events until every sender is gone.
    pub async fn run(&mut self, mut queue: UnboundedReceiver<ViewEvent>) {
        while let Some(event) = queue.recv().await {
            self.handle_event(event);
        }
    }

    /// Start the periodic update poll of both panes.
    pub fn start_polling(&mut self, queue: UnboundedSender<ViewEvent>) {
        self.primary.start_polling(PaneSide::Primary, queue.clone());
        self.mirror.start_polling(PaneSide::Mirror, queue);
    }

    fn notify_observers(&mut self, side: PaneSide, events: &[PaneEvent]) {
        for observer in &mut self.observers {
            for event in events {
                event.deliver(side, observer.as_mut());
            }
        }
    }

    // -- accessors ------------------------------------------------------

    pub fn pane(&self, side: PaneSide) -> &PaneContainer {
        match side {
            PaneSide::Primary => &self.primary,
            PaneSide::Mirror => &self.mirror,
        }
    }

    fn pane_mut(&mut self, side: PaneSide) -> &mut PaneContainer {
        match side {
            PaneSide::Primary => &mut self.primary,
            PaneSide::Mirror => &mut self.mirror,
        }
    }

    pub fn primary(&self) -> &PaneContainer {
        &self.primary
    }

    pub fn mirror(&self) -> &PaneContainer {
        &self.mirror
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Propagation steps run so far.
    pub fn propagation_count(&self) -> u64 {
        self.propagations
    }
}

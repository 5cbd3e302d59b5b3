//! Flow graph pane: one function at one IL tier.
//!
//! The pane owns its display options and the last good frame. It is the unit
//! that re-renders when analysis changes the function, and it is the unit
//! that stays quiet (paint-suppressed) while the function is mid-reanalysis.
//!
//! Every public operation absorbs its failures. Callers only ever see `false`
//! for "nothing visible changed".

use crate::config::PaneConfig;
use crate::core::graph::IlGraph;
use crate::core::highlight::HighlightTokenState;
use crate::core::history::{HistoryEntry, ScrollPosition};
use crate::core::il_tier::IlTier;
use crate::core::location::{FunctionRef, ViewLocation};
use crate::core::options::DisplayOptions;
use crate::engine::AnalysisEngine;
use crate::error::{Result, ViewError};
use crate::render::{RenderableFrame, Renderer};
use crate::view::event::PaneEvent;
use std::rc::Rc;
use tracing::{debug, trace, warn};

pub struct GraphPane {
    engine: Rc<dyn AnalysisEngine>,
    renderer: Rc<dyn Renderer>,
    config: PaneConfig,
    location: ViewLocation,
    options: DisplayOptions,
    graph: Option<IlGraph>,
    frame: Option<RenderableFrame>,
    highlight: Option<HighlightTokenState>,
    scroll: ScrollPosition,
    /// Function is mid-reanalysis: keep showing the last good frame
    paint_suppressed: bool,
    /// A render is owed once data arrives or suppression lifts
    pending_render: bool,
    /// Content changed outside an analysis pass
    stale: bool,
    /// Engine content version the current graph was fetched at
    fetched_version: Option<u64>,
    layouts: usize,
    paints: usize,
    events: Vec<PaneEvent>,
}

impl GraphPane {
    pub fn new(
        engine: Rc<dyn AnalysisEngine>,
        renderer: Rc<dyn Renderer>,
        config: PaneConfig,
    ) -> Self {
        Self {
            engine,
            renderer,
            location: ViewLocation::empty(config.default_tier),
            options: config.default_options,
            config,
            graph: None,
            frame: None,
            highlight: None,
            scroll: ScrollPosition::default(),
            paint_suppressed: false,
            pending_render: false,
            stale: false,
            fetched_version: None,
            layouts: 0,
            paints: 0,
            events: Vec::new(),
        }
    }

    /// Show `location`. Returns `false`, with nothing changed, when the
    /// function cannot be resolved.
    pub fn navigate(&mut self, location: ViewLocation) -> bool {
        match self.try_navigate(location) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "navigation ignored");
                false
            }
        }
    }

    /// Navigate to an address in the current tier.
    pub fn navigate_to_address(&mut self, address: u64) -> bool {
        self.navigate(ViewLocation::at_address(address, self.tier()))
    }

    fn try_navigate(&mut self, location: ViewLocation) -> Result<()> {
        let function = self.resolve(&location)?;
        let available = self.engine.available_tiers(&function);
        let tier = self.choose_tier(location.il_tier, &available);
        if tier != location.il_tier {
            let err = ViewError::TierUnavailable {
                tier: location.il_tier,
                function: function.start,
            };
            debug!(error = %err, fallback = tier.value(), "falling back to another tier");
        }

        let previous = self.location.clone();
        let same_function = previous.function.as_ref() == Some(&function);
        if !same_function {
            self.highlight = None;
            self.scroll = ScrollPosition::default();
            self.paint_suppressed = false;
            self.stale = false;
        }

        self.location = ViewLocation {
            function: Some(function),
            address: location.address,
            il_tier: tier,
            instruction_index: location.instruction_index,
        };
        self.load_graph();
        self.sync_instruction_index();

        if previous.il_tier != tier {
            self.events.push(PaneEvent::TierChanged {
                from: previous.il_tier,
                to: tier,
            });
        }
        if previous != self.location {
            self.events
                .push(PaneEvent::LocationChanged(self.location.clone()));
        }
        debug!(location = %self.location, "navigated");
        Ok(())
    }

    fn resolve(&self, location: &ViewLocation) -> Result<FunctionRef> {
        let address = location
            .function_start()
            .unwrap_or(location.address);
        self.engine
            .resolve_function(address)
            .ok_or(ViewError::UnresolvedFunction { address })
    }

    fn choose_tier(&self, requested: IlTier, available: &[IlTier]) -> IlTier {
        if available.is_empty() || available.contains(&requested) {
            return requested;
        }
        [self.location.il_tier, self.config.default_tier]
            .into_iter()
            .find(|t| available.contains(t))
            .or_else(|| available.first().copied())
            .unwrap_or(requested)
    }

    /// Switch the bound function to another IL tier.
    ///
    /// A tier with no data leaves the pane as it was and returns `false`.
    /// Without a bound function the tier is recorded for the next navigation.
    pub fn set_il_tier(&mut self, tier: IlTier) -> bool {
        let from = self.location.il_tier;
        if tier == from {
            return true;
        }
        let Some(function) = self.location.function.clone() else {
            self.location.il_tier = tier;
            self.events.push(PaneEvent::TierChanged { from, to: tier });
            return true;
        };
        if !self.engine.available_tiers(&function).contains(&tier) {
            let err = ViewError::TierUnavailable {
                tier,
                function: function.start,
            };
            warn!(error = %err, "tier change ignored");
            return false;
        }

        if let Some(mapped) = self
            .engine
            .map_address(&function, from, tier, self.location.address)
        {
            self.location.address = mapped;
        }
        self.location.il_tier = tier;
        self.location.instruction_index = None;
        self.load_graph();
        self.sync_instruction_index();
        self.events.push(PaneEvent::TierChanged { from, to: tier });
        debug!(from = from.value(), to = tier.value(), "tier changed");
        true
    }

    /// Step to the next (or previous) tier the bound function offers.
    pub fn cycle_il_tier(&mut self, forward: bool) -> bool {
        let Some(function) = &self.location.function else {
            return false;
        };
        let available = self.engine.available_tiers(function);
        match self.location.il_tier.cycle(&available, forward) {
            Some(next) => self.set_il_tier(next),
            None => false,
        }
    }

    /// Set one display flag. Returns whether anything changed.
    pub fn set_option(&mut self, option: DisplayOptions, enabled: bool) -> bool {
        if self.options.contains(option) == enabled {
            return false;
        }
        self.options.set(option, enabled);
        self.pending_render = true;
        self.render_if_allowed();
        true
    }

    pub fn toggle_option(&mut self, option: DisplayOptions) -> bool {
        let enabled = !self.options.contains(option);
        self.set_option(option, enabled)
    }

    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry::new(&self.location, self.scroll, self.highlight.clone())
    }

    /// Replay a history entry.
    ///
    /// If the entry's function no longer exists the pane ends up empty and
    /// `false` is returned. A tier without data drops to the configured
    /// default tier.
    pub fn navigate_to_history_entry(&mut self, entry: &HistoryEntry) -> bool {
        let function = entry
            .function_start()
            .and_then(|start| self.engine.resolve_function(start));
        let Some(function) = function else {
            debug!(
                function = ?entry.function_start(),
                "history entry no longer resolves, clearing pane"
            );
            self.clear();
            return false;
        };

        let available = self.engine.available_tiers(&function);
        let mut location = entry.location_with(Some(function));
        if !available.is_empty() && !available.contains(&location.il_tier) {
            let err = ViewError::DeserializationMismatch(format!(
                "tier {} has no data",
                location.il_tier.value()
            ));
            warn!(
                error = %err,
                fallback = self.config.default_tier.value(),
                "history tier unavailable"
            );
            location.il_tier = self.config.default_tier;
            location.instruction_index = None;
        }

        if !self.navigate(location) {
            return false;
        }
        self.scroll = entry.scroll();
        match entry.navigation.highlight.clone() {
            Some(state) => self.select_token(state),
            None => self.on_highlight_changed(None),
        }
        true
    }

    /// Unbind the function and drop every cached frame.
    pub fn clear(&mut self) {
        let was_empty = self.location.is_empty();
        self.location = ViewLocation::empty(self.location.il_tier);
        self.graph = None;
        self.frame = None;
        self.highlight = None;
        self.scroll = ScrollPosition::default();
        self.paint_suppressed = false;
        self.pending_render = false;
        self.stale = false;
        self.fetched_version = None;
        if !was_empty {
            self.events
                .push(PaneEvent::LocationChanged(self.location.clone()));
        }
    }

    /// The bound function is mid-reanalysis. Returns whether this pane is
    /// affected.
    pub fn notify_update_in_progress(&mut self, function: &FunctionRef) -> bool {
        if !self.is_bound_to(function) {
            return false;
        }
        if !self.paint_suppressed {
            debug!(function = %function, "paint suppressed during update");
            self.paint_suppressed = true;
        }
        true
    }

    /// Analysis of the bound function finished: lift suppression and render
    /// once from fresh data.
    pub fn finish_update(&mut self, function: &FunctionRef) -> bool {
        if !self.is_bound_to(function) {
            return false;
        }
        self.paint_suppressed = false;
        self.refresh();
        true
    }

    /// Content changed outside an analysis pass; the next tick re-renders.
    pub fn mark_stale(&mut self, function: &FunctionRef) -> bool {
        if !self.is_bound_to(function) {
            return false;
        }
        self.stale = true;
        true
    }

    /// Re-render if marked stale and not suppressed. Returns whether it did.
    pub fn refresh_if_stale(&mut self) -> bool {
        if !self.stale || self.paint_suppressed {
            return false;
        }
        self.refresh();
        true
    }

    /// Re-render if the engine's content moved past what was fetched.
    pub fn refresh_if_outdated(&mut self) -> bool {
        if self.paint_suppressed {
            return false;
        }
        let Some(function) = &self.location.function else {
            return false;
        };
        if self.fetched_version == Some(self.engine.content_version(function)) {
            return false;
        }
        self.refresh();
        true
    }

    /// Re-fetch the graph and render it.
    pub fn refresh(&mut self) {
        self.stale = false;
        if self.location.function.is_some() {
            self.load_graph();
        }
    }

    /// External highlight update (e.g. from the header): repaint only.
    pub fn on_highlight_changed(&mut self, state: Option<HighlightTokenState>) {
        if self.highlight == state {
            return;
        }
        self.highlight = state;
        self.repaint();
    }

    /// User selected a token in the graph.
    pub fn select_token(&mut self, state: HighlightTokenState) {
        if self.highlight.as_ref() == Some(&state) {
            return;
        }
        self.highlight = Some(state.clone());
        self.repaint();
        self.events.push(PaneEvent::HighlightChanged(state));
    }

    pub fn set_scroll(&mut self, x: i64, y: i64) {
        self.scroll = ScrollPosition::new(x, y);
    }

    fn load_graph(&mut self) {
        if self.paint_suppressed {
            self.pending_render = true;
            return;
        }
        let Some(function) = &self.location.function else {
            return;
        };
        self.graph = self
            .engine
            .il_representation(function, self.location.il_tier);
        self.fetched_version = Some(self.engine.content_version(function));
        if self.graph.is_none() {
            // Not analyzed yet: the banner explains, the next update renders.
            trace!(location = %self.location, "graph not ready");
            self.frame = None;
        }
        self.pending_render = true;
        self.render_if_allowed();
    }

    /// Reconcile address and instruction index against the current graph.
    ///
    /// The address wins: indices shift when analysis inserts or drops IL
    /// statements, addresses do not. The index only moves the address when
    /// the address no longer lands on any line.
    fn sync_instruction_index(&mut self) {
        let Some(graph) = &self.graph else {
            return;
        };
        let stored = self.location.instruction_index;
        if let Some(index) = stored {
            if graph.address_of_instruction(index) == Some(self.location.address) {
                return;
            }
        }
        match graph.instruction_at(self.location.address) {
            Some(index) => self.location.instruction_index = Some(index),
            None => match stored.and_then(|i| graph.address_of_instruction(i)) {
                Some(address) => {
                    debug!(
                        from = self.location.address,
                        to = address,
                        "address gone, following instruction index"
                    );
                    self.location.address = address;
                }
                None => self.location.instruction_index = None,
            },
        }
    }

    fn render_if_allowed(&mut self) {
        if self.paint_suppressed || !self.pending_render {
            return;
        }
        let Some(graph) = &self.graph else {
            return;
        };
        let frame = self.renderer.layout(graph, self.options);
        self.layouts += 1;
        self.renderer.paint(&frame, self.highlight.as_ref());
        self.paints += 1;
        self.frame = Some(frame);
        self.pending_render = false;
    }

    fn repaint(&mut self) {
        if self.paint_suppressed {
            return;
        }
        if let Some(frame) = &self.frame {
            self.renderer.paint(frame, self.highlight.as_ref());
            self.paints += 1;
        }
    }

    fn is_bound_to(&self, function: &FunctionRef) -> bool {
        self.location.function.as_ref() == Some(function)
    }

    /// Drain committed state changes since the last call.
    pub fn take_events(&mut self) -> Vec<PaneEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn location(&self) -> &ViewLocation {
        &self.location
    }

    pub fn function(&self) -> Option<&FunctionRef> {
        self.location.function.as_ref()
    }

    pub fn tier(&self) -> IlTier {
        self.location.il_tier
    }

    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    pub fn highlight(&self) -> Option<&HighlightTokenState> {
        self.highlight.as_ref()
    }

    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    pub fn frame(&self) -> Option<&RenderableFrame> {
        self.frame.as_ref()
    }

    pub fn is_paint_suppressed(&self) -> bool {
        self.paint_suppressed
    }

    pub fn has_pending_render(&self) -> bool {
        self.pending_render
    }

    pub fn config(&self) -> &PaneConfig {
        &self.config
    }

    pub fn engine(&self) -> &Rc<dyn AnalysisEngine> {
        &self.engine
    }

    pub fn layout_count(&self) -> usize {
        self.layouts
    }

    pub fn paint_count(&self) -> usize {
        self.paints
    }
}

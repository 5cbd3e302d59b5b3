//! Pane container: function header + graph + analysis warning banner.
//!
//! The container is pure composition and routing. Changes are forwarded to
//! the header first and the graph second, so a freshly drawn graph never sits
//! under stale header text. Highlights picked in one child are mirrored into
//! the other.

use crate::config::PaneConfig;
use crate::core::highlight::HighlightTokenState;
use crate::core::history::HistoryEntry;
use crate::core::il_tier::IlTier;
use crate::core::location::{FunctionRef, ViewLocation};
use crate::core::options::DisplayOptions;
use crate::engine::AnalysisEngine;
use crate::render::Renderer;
use crate::view::event::{PaneEvent, PaneSide, ViewEvent};
use crate::view::graph_pane::GraphPane;
use crate::view::header::FunctionHeaderPanel;
use crate::view::scheduler::{PeriodicTask, UpdateScheduler, UpdateSource, UpdateTransition};
use std::rc::Rc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Banner shown while the bound function's analysis is incomplete.
///
/// Purely informational: it never blocks interaction with the pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisWarning {
    pub function: FunctionRef,
    pub message: String,
    /// Set when the engine skipped the function; the banner then offers a link to analyze it
    pub skip_reason: Option<String>,
}

impl AnalysisWarning {
    fn new(function: FunctionRef, skip_reason: Option<String>) -> Self {
        let message = match &skip_reason {
            Some(reason) => format!(
                "Analysis of {} was skipped ({}). Click to analyze.",
                function.name, reason
            ),
            None => format!(
                "Analysis of {} is not finished yet. Some data may be missing.",
                function.name
            ),
        };
        Self {
            function,
            message,
            skip_reason,
        }
    }

    pub fn has_link(&self) -> bool {
        self.skip_reason.is_some()
    }
}

pub struct PaneContainer {
    engine: Rc<dyn AnalysisEngine>,
    header: FunctionHeaderPanel,
    graph: GraphPane,
    scheduler: UpdateScheduler,
    warning: Option<AnalysisWarning>,
    task: Option<PeriodicTask>,
    events: Vec<PaneEvent>,
}

impl PaneContainer {
    pub fn new(
        engine: Rc<dyn AnalysisEngine>,
        renderer: Rc<dyn Renderer>,
        config: PaneConfig,
    ) -> Self {
        let header = FunctionHeaderPanel::new(engine.clone(), config.default_tier);
        let graph = GraphPane::new(engine.clone(), renderer, config);
        Self {
            engine,
            header,
            graph,
            scheduler: UpdateScheduler::new(),
            warning: None,
            task: None,
            events: Vec::new(),
        }
    }

    pub fn navigate(&mut self, location: ViewLocation) -> bool {
        let address = location.function_start().unwrap_or(location.address);
        let Some(function) = self.engine.resolve_function(address) else {
            debug!(address, "container navigation to unknown function ignored");
            return false;
        };
        self.header.set_current_function(Some(function));
        let ok = self.graph.navigate(location);
        self.sync_children();
        ok
    }

    pub fn navigate_to_address(&mut self, address: u64) -> bool {
        let tier = self.graph.tier();
        self.navigate(ViewLocation::at_address(address, tier))
    }

    /// Bind a function (at its entry) or, with `None`, empty the pane.
    pub fn set_current_function(&mut self, function: Option<FunctionRef>) -> bool {
        self.header.set_current_function(function.clone());
        let ok = match function {
            Some(f) => {
                let start = f.start;
                let tier = self.graph.tier();
                self.graph.navigate(ViewLocation::new(f, start, tier))
            }
            None => {
                self.graph.clear();
                true
            }
        };
        self.sync_children();
        ok
    }

    pub fn set_il_tier(&mut self, tier: IlTier) -> bool {
        if let Some(function) = self.graph.function() {
            if tier != self.graph.tier() && !self.engine.available_tiers(function).contains(&tier) {
                debug!(tier = tier.value(), "tier not offered for bound function");
                return false;
            }
        }
        self.header.set_il_tier(tier);
        let ok = self.graph.set_il_tier(tier);
        self.sync_children();
        ok
    }

    pub fn cycle_il_tier(&mut self, forward: bool) -> bool {
        let ok = self.graph.cycle_il_tier(forward);
        self.sync_children();
        ok
    }

    pub fn set_option(&mut self, option: DisplayOptions, enabled: bool) -> bool {
        self.graph.set_option(option, enabled)
    }

    pub fn toggle_option(&mut self, option: DisplayOptions) -> bool {
        self.graph.toggle_option(option)
    }

    /// Push a highlight into both children without emitting an event.
    pub fn set_header_highlight_token(&mut self, state: Option<HighlightTokenState>) {
        self.header.set_highlight_token(state.clone());
        self.graph.on_highlight_changed(state);
    }

    /// User selected a token in the graph.
    pub fn select_graph_token(&mut self, state: HighlightTokenState) {
        self.graph.select_token(state);
        self.sync_children();
    }

    /// Click in the header: highlight the token under the cursor in both children.
    pub fn header_click(&mut self, line: usize, column: usize) -> bool {
        let Some(state) = self.header.click(line, column) else {
            return false;
        };
        self.set_header_highlight_token(Some(state.clone()));
        self.events.push(PaneEvent::HighlightChanged(state));
        true
    }

    /// Double click in the header: navigate the graph to the address under the cursor.
    pub fn header_double_click(&mut self, line: usize, column: usize) -> bool {
        match self.header.address_at(line, column) {
            Some(address) => self.navigate_to_address(address),
            None => false,
        }
    }

    pub fn set_scroll(&mut self, x: i64, y: i64) {
        self.graph.set_scroll(x, y);
    }

    pub fn history_entry(&self) -> HistoryEntry {
        self.graph.history_entry()
    }

    pub fn navigate_to_history_entry(&mut self, entry: &HistoryEntry) -> bool {
        let function = entry
            .function_start()
            .and_then(|start| self.engine.resolve_function(start));
        self.header.set_current_function(function);
        let ok = self.graph.navigate_to_history_entry(entry);
        self.sync_children();
        // A replayed entry without a highlight clears the header's as well.
        self.header.set_highlight_token(self.graph.highlight().cloned());
        ok
    }

    /// One poll of the update scheduler against the engine.
    pub fn tick(&mut self) -> UpdateTransition {
        let in_progress = self
            .graph
            .function()
            .map(|f| self.engine.is_update_in_progress(f))
            .unwrap_or(false);
        self.apply_update_status(in_progress, UpdateSource::Poll)
    }

    /// Engine says `function` is being re-analyzed.
    pub fn notify_analysis_progress(&mut self, function: &FunctionRef) -> UpdateTransition {
        if self.graph.function() != Some(function) {
            return UpdateTransition::Steady;
        }
        self.apply_update_status(true, UpdateSource::Notification)
    }

    /// Engine says an analysis pass over `function` finished.
    pub fn notify_analysis_complete(&mut self, function: &FunctionRef) -> UpdateTransition {
        if self.graph.function() != Some(function) {
            return UpdateTransition::Steady;
        }
        let transition = self.apply_update_status(false, UpdateSource::Notification);
        if transition == UpdateTransition::Steady {
            // No progress seen for this pass; render only if the content moved.
            self.graph.refresh_if_outdated();
        }
        transition
    }

    /// Engine says `function` changed outside a full pass.
    pub fn notify_function_changed(&mut self, function: &FunctionRef) -> bool {
        self.graph.mark_stale(function)
    }

    fn apply_update_status(&mut self, in_progress: bool, source: UpdateSource) -> UpdateTransition {
        let function = self.graph.function().cloned();
        let transition = self.scheduler.observe(function.as_ref(), in_progress, source);
        match (transition, function) {
            (UpdateTransition::Started, Some(f)) => {
                self.header.set_update_indicator(true);
                self.graph.notify_update_in_progress(&f);
            }
            (UpdateTransition::Finished, Some(f)) => {
                self.header.set_update_indicator(false);
                self.header.refresh();
                self.graph.finish_update(&f);
            }
            _ => {
                self.header.poll();
                self.graph.refresh_if_stale();
            }
        }
        self.update_warning();
        transition
    }

    /// Start the periodic update poll, posting ticks for `side` onto `queue`.
    /// Must be called inside a tokio runtime.
    pub fn start_polling(&mut self, side: PaneSide, queue: UnboundedSender<ViewEvent>) {
        let period = self.graph.config().update_interval();
        self.task = Some(PeriodicTask::spawn(period, side, queue));
    }

    pub fn stop_polling(&mut self) {
        self.task = None;
    }

    pub fn is_polling(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Engine link in the banner: ask for the skipped function to be analyzed.
    pub fn activate_warning_link(&mut self) -> bool {
        let Some(warning) = &self.warning else {
            return false;
        };
        if !warning.has_link() {
            return false;
        }
        self.engine.request_analysis(&warning.function);
        self.update_warning();
        true
    }

    pub fn analysis_warning(&self) -> Option<&AnalysisWarning> {
        self.warning.as_ref()
    }

    /// Status bar text: tier and enabled display options.
    pub fn status_line(&self) -> String {
        let options = self.graph.options().enabled_labels();
        if options.is_empty() {
            self.graph.tier().display_name().to_string()
        } else {
            format!("{} | {}", self.graph.tier().display_name(), options.join(", "))
        }
    }

    /// Drain committed events. Graph highlights are copied into the header
    /// on the way out.
    pub fn take_events(&mut self) -> Vec<PaneEvent> {
        self.sync_children();
        std::mem::take(&mut self.events)
    }

    fn sync_children(&mut self) {
        self.header
            .set_current_function(self.graph.function().cloned());
        self.header.set_il_tier(self.graph.tier());
        for event in self.graph.take_events() {
            if let PaneEvent::HighlightChanged(state) = &event {
                self.header.set_highlight_token(Some(state.clone()));
            }
            self.events.push(event);
        }
        self.update_warning();
    }

    fn update_warning(&mut self) {
        let show = self.graph.config().show_analysis_warning;
        self.warning = match self.graph.function() {
            Some(f) if show && !self.engine.is_analysis_complete(f) => {
                Some(AnalysisWarning::new(f.clone(), self.engine.skip_reason(f)))
            }
            _ => None,
        };
    }

    pub fn header(&self) -> &FunctionHeaderPanel {
        &self.header
    }

    pub fn graph(&self) -> &GraphPane {
        &self.graph
    }

    pub fn location(&self) -> &ViewLocation {
        self.graph.location()
    }

    pub fn tier(&self) -> IlTier {
        self.graph.tier()
    }

    pub fn function(&self) -> Option<&FunctionRef> {
        self.graph.function()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{IlBlock, IlGraph, TextLine, Token};
    use crate::core::highlight::TokenKind;
    use crate::engine::InMemoryEngine;
    use crate::render::HeadlessRenderer;

    fn setup() -> (Rc<InMemoryEngine>, Rc<HeadlessRenderer>, PaneContainer) {
        let engine = Rc::new(InMemoryEngine::new());
        engine.add_function(FunctionRef::new(0x1000, "main"), 0x100);
        engine.add_function(FunctionRef::new(0x3000, "helper"), 0x10);
        for tier in [IlTier::Normal, IlTier::MediumLevelIl] {
            let mut g = IlGraph::new(0x1000, tier);
            g.add_block(IlBlock::new(
                0x1000,
                vec![TextLine::new(0x1000, vec![Token::new("ret", TokenKind::Instruction)])],
            ));
            engine.set_graph(g);
        }
        engine.set_header_lines(
            0x1000,
            vec![TextLine::new(
                0x1000,
                vec![
                    Token::new("void main() calls ", TokenKind::Text),
                    Token::with_target("helper", TokenKind::CodeSymbol, 0x3000),
                ],
            )],
        );
        let mut g = IlGraph::new(0x3000, IlTier::Normal);
        g.add_block(IlBlock::new(0x3000, vec![]));
        engine.set_graph(g);
        let renderer = Rc::new(HeadlessRenderer::new());
        let container =
            PaneContainer::new(engine.clone(), renderer.clone(), PaneConfig::default());
        (engine, renderer, container)
    }

    #[test]
    fn test_navigate_binds_header_and_graph() {
        let (_e, _r, mut c) = setup();
        assert!(c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal)));
        assert_eq!(c.header().function().unwrap().start, 0x1000);
        assert_eq!(c.header().lines().len(), 1);
        assert!(c.analysis_warning().is_none());
        assert!(!c.navigate(ViewLocation::at_address(0x8000, IlTier::Normal)));
        assert_eq!(c.function().unwrap().start, 0x1000);
    }

    #[test]
    fn test_tier_change_reaches_header() {
        let (_e, _r, mut c) = setup();
        c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal));
        assert!(c.set_il_tier(IlTier::MediumLevelIl));
        assert_eq!(c.header().tier(), IlTier::MediumLevelIl);
        assert_eq!(c.header().graph_type_label(), "Medium Level IL");
        assert!(!c.set_il_tier(IlTier::HighLevelIl));
        assert_eq!(c.header().tier(), IlTier::MediumLevelIl);
    }

    #[test]
    fn test_incomplete_analysis_banner() {
        let (engine, _r, mut c) = setup();
        engine.set_analysis_complete(0x3000, false);
        c.navigate(ViewLocation::at_address(0x3000, IlTier::Normal));
        let warning = c.analysis_warning().unwrap();
        assert!(!warning.has_link());
        assert!(warning.message.contains("helper"));
        // Banner does not block interaction
        assert!(c.toggle_option(DisplayOptions::SHOW_OPCODE));
        engine.set_analysis_complete(0x3000, true);
        c.tick();
        assert!(c.analysis_warning().is_none());
    }

    #[test]
    fn test_skipped_analysis_link() {
        let (engine, _r, mut c) = setup();
        engine.set_analysis_complete(0x3000, false);
        engine.set_skip_reason(0x3000, Some("exceeds size limit".into()));
        c.navigate(ViewLocation::at_address(0x3000, IlTier::Normal));
        assert!(c.analysis_warning().unwrap().has_link());
        assert!(c.activate_warning_link());
        assert_eq!(engine.analysis_requests(), vec![0x3000]);
        assert!(!c.analysis_warning().unwrap().has_link());
        assert!(!c.activate_warning_link());
    }

    #[test]
    fn test_header_click_highlights_both() {
        let (_e, renderer, mut c) = setup();
        c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal));
        c.take_events();
        assert!(c.header_click(0, 20));
        assert_eq!(c.graph().highlight().unwrap().text, "helper");
        assert_eq!(c.header().highlight().unwrap().text, "helper");
        assert_eq!(renderer.last_highlight().unwrap().text, "helper");
        let events = c.take_events();
        assert!(matches!(events.as_slice(), [PaneEvent::HighlightChanged(_)]));
    }

    #[test]
    fn test_graph_selection_reaches_header() {
        let (_e, _r, mut c) = setup();
        c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal));
        c.select_graph_token(HighlightTokenState::new(0x1000, 0, "ret", TokenKind::Instruction));
        assert_eq!(c.header().highlight().unwrap().text, "ret");
    }

    #[test]
    fn test_header_double_click_navigates() {
        let (_e, _r, mut c) = setup();
        c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal));
        assert!(c.header_double_click(0, 20));
        assert_eq!(c.function().unwrap().name, "helper");
        assert_eq!(c.header().function().unwrap().name, "helper");
    }

    #[test]
    fn test_status_line() {
        let (_e, _r, mut c) = setup();
        c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal));
        assert_eq!(
            c.status_line(),
            "Disassembly | Show Address, Show Variables At Top, Show Function Header"
        );
        for (flag, _) in DisplayOptions::LABELED {
            c.set_option(flag, false);
        }
        assert_eq!(c.status_line(), "Disassembly");
    }

    #[test]
    fn test_set_current_function_none_empties() {
        let (_e, _r, mut c) = setup();
        c.navigate(ViewLocation::at_address(0x1000, IlTier::Normal));
        assert!(c.set_current_function(None));
        assert!(c.location().is_empty());
        assert!(c.header().lines().is_empty());
    }
}

//! Function header panel: prologue/signature lines above the graph.
//!
//! The header keeps its own copy of the lines and the content version they
//! were built from. Rebuilding it is cheap, so it refreshes on every version
//! change it sees while polling instead of waiting for the (debounced) graph
//! re-layout.

use crate::core::graph::TextLine;
use crate::core::highlight::HighlightTokenState;
use crate::core::il_tier::IlTier;
use crate::core::location::FunctionRef;
use crate::engine::AnalysisEngine;
use std::rc::Rc;
use tracing::trace;

pub struct FunctionHeaderPanel {
    engine: Rc<dyn AnalysisEngine>,
    function: Option<FunctionRef>,
    tier: IlTier,
    lines: Vec<TextLine>,
    cached_version: Option<u64>,
    dirty: bool,
    width: usize,
    height: usize,
    highlight: Option<HighlightTokenState>,
    update_indicator: bool,
    refreshes: usize,
}

impl FunctionHeaderPanel {
    pub fn new(engine: Rc<dyn AnalysisEngine>, tier: IlTier) -> Self {
        Self {
            engine,
            function: None,
            tier,
            lines: Vec::new(),
            cached_version: None,
            dirty: false,
            width: 0,
            height: 0,
            highlight: None,
            update_indicator: false,
            refreshes: 0,
        }
    }

    pub fn set_current_function(&mut self, function: Option<FunctionRef>) {
        if self.function == function && !self.dirty {
            return;
        }
        self.function = function;
        self.highlight = None;
        self.dirty = true;
        self.refresh();
    }

    pub fn set_il_tier(&mut self, tier: IlTier) {
        if self.tier == tier {
            return;
        }
        self.tier = tier;
        self.dirty = true;
        self.refresh();
    }

    pub fn set_highlight_token(&mut self, state: Option<HighlightTokenState>) {
        self.highlight = state;
    }

    /// Timer hook: rebuild if the function's content version moved.
    /// Returns whether the lines were rebuilt.
    pub fn poll(&mut self) -> bool {
        let Some(function) = &self.function else {
            return false;
        };
        let version = self.engine.content_version(function);
        if self.dirty || self.cached_version != Some(version) {
            self.dirty = true;
            self.refresh();
            return true;
        }
        false
    }

    /// Rebuild lines and size from the engine now.
    pub fn refresh(&mut self) {
        match &self.function {
            Some(function) => {
                self.lines = self.engine.header_lines(function, self.tier);
                self.cached_version = Some(self.engine.content_version(function));
            }
            None => {
                self.lines.clear();
                self.cached_version = None;
            }
        }
        self.adjust_size();
        self.dirty = false;
        self.refreshes += 1;
        trace!(lines = self.lines.len(), tier = self.tier.value(), "header refreshed");
    }

    fn adjust_size(&mut self) {
        self.height = self.lines.len();
        self.width = self.lines.iter().map(TextLine::width).max().unwrap_or(0);
    }

    /// Highlight for a click at `line`/`column`, if a token is there.
    pub fn click(&self, line: usize, column: usize) -> Option<HighlightTokenState> {
        let text_line = self.lines.get(line)?;
        let (index, token) = text_line.token_at_column(column)?;
        Some(HighlightTokenState::new(
            text_line.address,
            index,
            token.text.clone(),
            token.kind,
        ))
    }

    /// Navigable address under `line`/`column`: the token's target if it has
    /// one, otherwise the line's own address.
    pub fn address_at(&self, line: usize, column: usize) -> Option<u64> {
        let text_line = self.lines.get(line)?;
        let target = text_line
            .token_at_column(column)
            .and_then(|(_, token)| token.target);
        Some(target.unwrap_or(text_line.address))
    }

    pub fn set_update_indicator(&mut self, visible: bool) {
        self.update_indicator = visible;
    }

    pub fn update_indicator_visible(&self) -> bool {
        self.update_indicator
    }

    /// Text of the graph type label.
    pub fn graph_type_label(&self) -> &'static str {
        self.tier.display_name()
    }

    pub fn function(&self) -> Option<&FunctionRef> {
        self.function.as_ref()
    }

    pub fn tier(&self) -> IlTier {
        self.tier
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn highlight(&self) -> Option<&HighlightTokenState> {
        self.highlight.as_ref()
    }

    /// (width in characters, height in lines)
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::Token;
    use crate::core::highlight::TokenKind;
    use crate::engine::InMemoryEngine;

    fn setup() -> (Rc<InMemoryEngine>, FunctionHeaderPanel) {
        let engine = Rc::new(InMemoryEngine::new());
        engine.add_function(FunctionRef::new(0x1000, "main"), 0x100);
        engine.set_header_lines(
            0x1000,
            vec![
                TextLine::new(
                    0x1000,
                    vec![
                        Token::new("int32_t ", TokenKind::Type),
                        Token::with_target("main", TokenKind::CodeSymbol, 0x1000),
                        Token::new("(int32_t argc)", TokenKind::Text),
                    ],
                ),
                TextLine::new(0x1000, vec![Token::new("; stack", TokenKind::Comment)]),
            ],
        );
        let header = FunctionHeaderPanel::new(engine.clone(), IlTier::Normal);
        (engine, header)
    }

    #[test]
    fn test_binding_fetches_lines_and_sizes() {
        let (_engine, mut header) = setup();
        header.set_current_function(Some(FunctionRef::unnamed(0x1000)));
        assert_eq!(header.lines().len(), 2);
        assert_eq!(header.size(), (26, 2));
        assert_eq!(header.refresh_count(), 1);
    }

    #[test]
    fn test_poll_refreshes_only_on_version_change() {
        let (engine, mut header) = setup();
        header.set_current_function(Some(FunctionRef::unnamed(0x1000)));
        assert!(!header.poll());
        assert!(!header.poll());
        engine.set_header_lines(0x1000, vec![TextLine::new(0x1000, vec![])]);
        assert!(header.poll());
        assert_eq!(header.lines().len(), 1);
        assert!(!header.poll());
        assert_eq!(header.refresh_count(), 2);
    }

    #[test]
    fn test_click_translation() {
        let (_engine, mut header) = setup();
        header.set_current_function(Some(FunctionRef::unnamed(0x1000)));
        let h = header.click(0, 9).unwrap();
        assert_eq!(h.text, "main");
        assert_eq!(h.token_index, 1);
        assert_eq!(header.address_at(0, 9), Some(0x1000));
        assert_eq!(header.address_at(1, 0), Some(0x1000));
        assert!(header.click(0, 200).is_none());
        assert!(header.address_at(5, 0).is_none());
    }

    #[test]
    fn test_unbinding_clears() {
        let (_engine, mut header) = setup();
        header.set_current_function(Some(FunctionRef::unnamed(0x1000)));
        header.set_current_function(None);
        assert!(header.lines().is_empty());
        assert_eq!(header.size(), (0, 0));
        assert!(!header.poll());
    }

    #[test]
    fn test_graph_type_label_follows_tier() {
        let (_engine, mut header) = setup();
        header.set_il_tier(IlTier::MediumLevelIlSsa);
        assert_eq!(header.graph_type_label(), "Medium Level IL (SSA Form)");
    }
}

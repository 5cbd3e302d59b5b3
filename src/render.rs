//! Interface to the layout/paint collaborator.
//!
//! Layout is expensive (it places every block of a possibly huge graph) and
//! paint is cheap. Panes call `layout` only when the graph or the display
//! options change, and `paint` alone for highlight changes.

use crate::core::graph::IlGraph;
use crate::core::highlight::HighlightTokenState;
use crate::core::il_tier::IlTier;
use crate::core::options::DisplayOptions;
use std::cell::{Cell, RefCell};

/// Laid-out graph, ready to paint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableFrame {
    pub function_start: u64,
    pub tier: IlTier,
    pub options: DisplayOptions,
    pub width: usize,
    pub height: usize,
    pub block_count: usize,
    pub edge_count: usize,
    /// Rendered text of every line, block by block
    pub lines: Vec<String>,
}

/// Layout and paint backend.
pub trait Renderer {
    fn layout(&self, graph: &IlGraph, options: DisplayOptions) -> RenderableFrame;
    fn paint(&self, frame: &RenderableFrame, highlight: Option<&HighlightTokenState>);
}

/// Renderer that lays graphs out as plain text and keeps counters.
///
/// Blocks are stacked vertically with one blank row between them; width is
/// the longest rendered line. Nothing is drawn.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    layouts: Cell<usize>,
    paints: Cell<usize>,
    last_frame: RefCell<Option<RenderableFrame>>,
    last_highlight: RefCell<Option<HighlightTokenState>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layouts(&self) -> usize {
        self.layouts.get()
    }

    pub fn paints(&self) -> usize {
        self.paints.get()
    }

    /// Most recently painted frame.
    pub fn last_frame(&self) -> Option<RenderableFrame> {
        self.last_frame.borrow().clone()
    }

    pub fn last_highlight(&self) -> Option<HighlightTokenState> {
        self.last_highlight.borrow().clone()
    }
}

impl Renderer for HeadlessRenderer {
    fn layout(&self, graph: &IlGraph, options: DisplayOptions) -> RenderableFrame {
        self.layouts.set(self.layouts.get() + 1);

        let mut lines = Vec::with_capacity(graph.line_count());
        for block in &graph.blocks {
            for line in &block.lines {
                let mut text = String::new();
                if options.contains(DisplayOptions::SHOW_ADDRESS) {
                    text.push_str(&format!("{:08x}  ", line.address));
                }
                text.push_str(&line.text());
                lines.push(text);
            }
        }
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let height = lines.len() + graph.blocks.len().saturating_sub(1);

        RenderableFrame {
            function_start: graph.function_start,
            tier: graph.tier,
            options,
            width,
            height,
            block_count: graph.blocks.len(),
            edge_count: graph.edges.len(),
            lines,
        }
    }

    fn paint(&self, frame: &RenderableFrame, highlight: Option<&HighlightTokenState>) {
        self.paints.set(self.paints.get() + 1);
        *self.last_frame.borrow_mut() = Some(frame.clone());
        *self.last_highlight.borrow_mut() = highlight.cloned();
    }
}

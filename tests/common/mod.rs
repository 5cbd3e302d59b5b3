//! Common fixtures for the integration tests.
//!
//! `fixture_engine` builds a small two-function program with every common IL
//! tier populated. `Recorder` captures what a host observer would see.
#![allow(dead_code)]

pub mod test_utils;

use ilview::core::graph::{IlBlock, IlEdgeKind, IlGraph, TextLine, Token};
use ilview::core::highlight::TokenKind;
use ilview::view::event::{PaneSide, ViewObserver};
use ilview::{
    FunctionRef, HeadlessRenderer, IlTier, InMemoryEngine, ReflectionCoordinator, ViewConfig,
    ViewLocation,
};
use ilview::core::highlight::HighlightTokenState;
use std::cell::RefCell;
use std::rc::Rc;

pub const MAIN: u64 = 0x1000;
pub const MAIN_SIZE: u64 = 0x100;
pub const HELPER: u64 = 0x2000;

pub const TIERS: [IlTier; 4] = [
    IlTier::Normal,
    IlTier::LowLevelIl,
    IlTier::MediumLevelIl,
    IlTier::HighLevelIl,
];

/// Two-block graph: an entry block branching to a return block.
pub fn diamond(start: u64, tier: IlTier) -> IlGraph {
    let mut graph = IlGraph::new(start, tier);
    graph.add_block(IlBlock::new(
        start,
        vec![
            TextLine::new(
                start,
                vec![
                    Token::new("push", TokenKind::Instruction),
                    Token::new(" ", TokenKind::Text),
                    Token::new("rbp", TokenKind::Register),
                ],
            )
            .with_instruction_index(0),
            TextLine::new(
                start + 0x4,
                vec![
                    Token::new("call", TokenKind::Instruction),
                    Token::new(" ", TokenKind::Text),
                    Token::with_target("helper", TokenKind::CodeSymbol, HELPER),
                ],
            )
            .with_instruction_index(1),
        ],
    ));
    graph.add_block(IlBlock::new(
        start + 0x10,
        vec![TextLine::new(start + 0x10, vec![Token::new("ret", TokenKind::Instruction)])
            .with_instruction_index(2)],
    ));
    graph.add_edge(start, start + 0x10, IlEdgeKind::Unconditional);
    graph
}

pub fn fixture_engine() -> Rc<InMemoryEngine> {
    let engine = Rc::new(InMemoryEngine::new());
    engine.add_function(FunctionRef::new(MAIN, "main"), MAIN_SIZE);
    engine.add_function(FunctionRef::new(HELPER, "helper"), 0x20);
    for tier in TIERS {
        engine.set_graph(diamond(MAIN, tier));
        engine.set_graph(diamond(HELPER, tier));
    }
    engine.set_header_lines(
        MAIN,
        vec![TextLine::new(
            MAIN,
            vec![
                Token::new("int32_t", TokenKind::Type),
                Token::new(" main(int32_t argc)", TokenKind::Text),
            ],
        )],
    );
    engine
}

pub fn coordinator_with(
    engine: Rc<InMemoryEngine>,
    config: &ViewConfig,
) -> (Rc<HeadlessRenderer>, ReflectionCoordinator) {
    ilview::logging::init_tracing();
    let renderer = Rc::new(HeadlessRenderer::new());
    let coordinator = ReflectionCoordinator::new(engine, renderer.clone(), config);
    (renderer, coordinator)
}

pub fn at(address: u64, tier: IlTier) -> ViewLocation {
    ViewLocation::at_address(address, tier)
}

/// Host observer recording every notification as a short string.
#[derive(Clone, Default)]
pub struct Recorder {
    pub log: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn entries(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl ViewObserver for Recorder {
    fn on_location_changed(&mut self, source: PaneSide, location: &ViewLocation) {
        self.log
            .borrow_mut()
            .push(format!("{source}:location:{:#x}", location.address));
    }

    fn on_tier_changed(&mut self, source: PaneSide, tier: IlTier) {
        self.log
            .borrow_mut()
            .push(format!("{source}:tier:{}", tier.value()));
    }

    fn on_highlight_changed(&mut self, source: PaneSide, state: &HighlightTokenState) {
        self.log
            .borrow_mut()
            .push(format!("{source}:highlight:{}", state.text));
    }
}

//! History entries written by one pane and replayed in another.

mod common;

use common::*;
use ilview::core::highlight::{HighlightTokenState, TokenKind};
use ilview::core::history::{HistoryEntry, ScrollPosition, GRAPH_TYPE_KEY};
use ilview::view::event::PaneSide;
use ilview::{IlTier, PaneContainer, PaneConfig, ViewConfig};
use ilview::HeadlessRenderer;
use serde_json::Value;
use std::rc::Rc;

fn container(engine: Rc<ilview::InMemoryEngine>) -> PaneContainer {
    PaneContainer::new(engine, Rc::new(HeadlessRenderer::new()), PaneConfig::default())
}

#[test]
fn test_replay_through_json_document() {
    let engine = fixture_engine();
    let mut source = container(engine.clone());
    source.navigate(at(MAIN + 0x4, IlTier::MediumLevelIl));
    source.set_scroll(40, -12);
    source.select_graph_token(HighlightTokenState::new(
        MAIN + 0x4,
        2,
        "helper",
        TokenKind::CodeSymbol,
    ));

    let json = source.history_entry().to_json().unwrap();
    let doc: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(doc[GRAPH_TYPE_KEY], "mlil");
    assert_eq!(doc["function"], MAIN);
    let keys: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.last(), Some(&GRAPH_TYPE_KEY));

    let entry = HistoryEntry::from_json(&json).unwrap();
    let mut replay = container(engine);
    assert!(replay.navigate_to_history_entry(&entry));
    assert_eq!(replay.location(), source.location());
    assert_eq!(replay.tier(), IlTier::MediumLevelIl);
    assert_eq!(replay.graph().scroll(), ScrollPosition::new(40, -12));
    assert_eq!(replay.graph().highlight().unwrap().text, "helper");
    assert_eq!(replay.header().highlight().unwrap().text, "helper");
    assert_eq!(replay.header().function().unwrap().start, MAIN);
}

#[test]
fn test_removed_function_leaves_empty_pane() {
    let engine = fixture_engine();
    let mut source = container(engine.clone());
    source.navigate(at(HELPER, IlTier::Normal));
    let json = source.history_entry().to_json().unwrap();

    engine.remove_function(HELPER);
    let entry = HistoryEntry::from_json(&json).expect("decoding never needs the function");

    let mut replay = container(engine.clone());
    replay.navigate(at(MAIN, IlTier::Normal));
    assert!(!replay.navigate_to_history_entry(&entry));
    assert!(replay.location().is_empty());
    assert!(replay.function().is_none());
    assert!(replay.header().function().is_none());
    assert!(replay.graph().frame().is_none());
}

#[test]
fn test_removed_function_empties_mirror_too() {
    let engine = fixture_engine();
    let (_r, mut c) = coordinator_with(engine.clone(), &ViewConfig::default());
    c.navigate(PaneSide::Primary, at(HELPER, IlTier::Normal));
    let entry = c.primary().history_entry();
    c.navigate(PaneSide::Primary, at(MAIN, IlTier::Normal));

    engine.remove_function(HELPER);
    assert!(!c.navigate_to_history_entry(PaneSide::Primary, &entry));
    assert!(c.primary().location().is_empty());
    assert!(c.mirror().location().is_empty());
}

#[test]
fn test_unavailable_tier_uses_pane_default() {
    let engine = fixture_engine();
    let mut source = container(engine.clone());
    source.navigate(at(MAIN, IlTier::HighLevelIl));
    let entry = source.history_entry();

    engine.remove_tier(MAIN, IlTier::HighLevelIl);
    let mut replay = PaneContainer::new(
        engine,
        Rc::new(HeadlessRenderer::new()),
        PaneConfig::default().with_default_tier(IlTier::LowLevelIl),
    );
    assert!(replay.navigate_to_history_entry(&entry));
    assert_eq!(replay.tier(), IlTier::LowLevelIl);
    assert_eq!(replay.location().address, MAIN);
}

#[test]
fn test_legacy_document_without_graph_type() {
    let doc = serde_json::json!({
        "function": MAIN,
        "address": MAIN + 0x10,
        "scrollX": 3,
        "scrollY": 4,
    });
    let entry = HistoryEntry::from_document(&doc).unwrap();
    assert_eq!(entry.il_tier, IlTier::Normal);
    assert_eq!(entry.scroll(), ScrollPosition::new(3, 4));

    let mut replay = container(fixture_engine());
    assert!(replay.navigate_to_history_entry(&entry));
    assert_eq!(replay.location().address, MAIN + 0x10);
}

#[test]
fn test_replay_on_same_function_restores_selection_state() {
    let engine = fixture_engine();
    let mut c = container(engine);
    c.navigate(at(MAIN, IlTier::Normal));
    let entry = c.history_entry();

    c.select_graph_token(HighlightTokenState::new(MAIN, 2, "rbp", TokenKind::Register));
    c.set_scroll(0, 300);
    assert_eq!(c.header().highlight().unwrap().text, "rbp");

    assert!(c.navigate_to_history_entry(&entry));
    assert!(c.graph().highlight().is_none());
    assert!(c.header().highlight().is_none());
    assert_eq!(c.graph().scroll(), ScrollPosition::default());
    assert_eq!(c.history_entry(), entry);
}

#[test]
fn test_replay_after_reanalysis_keeps_address() {
    let engine = fixture_engine();
    let mut c = container(engine.clone());
    c.navigate(at(MAIN + 0x4, IlTier::MediumLevelIl));
    let json = c.history_entry().to_json().unwrap();
    assert_eq!(c.location().instruction_index, Some(1));

    // Reanalysis inserts a statement ahead of the saved one
    let mut graph = ilview::IlGraph::new(MAIN, IlTier::MediumLevelIl);
    graph.add_block(ilview::core::graph::IlBlock::new(
        MAIN,
        vec![
            ilview::core::graph::TextLine::new(MAIN, vec![]).with_instruction_index(0),
            ilview::core::graph::TextLine::new(MAIN + 0x2, vec![]).with_instruction_index(1),
            ilview::core::graph::TextLine::new(MAIN + 0x4, vec![]).with_instruction_index(2),
        ],
    ));
    engine.set_graph(graph);
    c.navigate(at(HELPER, IlTier::Normal));

    let entry = HistoryEntry::from_json(&json).unwrap();
    assert!(c.navigate_to_history_entry(&entry));
    assert_eq!(c.function().unwrap().start, MAIN);
    assert_eq!(c.tier(), IlTier::MediumLevelIl);
    assert_eq!(c.location().address, MAIN + 0x4);
    assert_eq!(c.location().instruction_index, Some(2));
}

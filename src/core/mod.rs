//! Core value types for ilview.
//!
//! These are plain data: IL tiers, locations, highlight state, display
//! options, IL graphs and history snapshots. None of them talks to the
//! analysis engine or the renderer.

pub mod graph;
pub mod highlight;
pub mod history;
pub mod il_tier;
pub mod location;
pub mod options;

pub use graph::{IlBlock, IlEdge, IlEdgeKind, IlGraph, TextLine, Token};
pub use highlight::{HighlightTokenState, TokenKind};
pub use history::{HistoryEntry, NavigationEntry, ScrollPosition};
pub use il_tier::IlTier;
pub use location::{FunctionRef, ViewLocation};
pub use options::DisplayOptions;

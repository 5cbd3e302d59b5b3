//! ilview: presentation core for viewing a function's intermediate language.
//!
//! A `GraphPane` renders one function at one IL tier, a `FunctionHeaderPanel`
//! shows its prototype, and a `PaneContainer` composes the two with an
//! analysis banner. `ReflectionCoordinator` pairs two containers and keeps
//! their tier and location in step without feedback loops.
//!
//! The analysis engine and the renderer are collaborators behind the
//! `AnalysisEngine` and `Renderer` traits; `InMemoryEngine` and
//! `HeadlessRenderer` stand in for them in headless use and tests.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;
pub mod render;
pub mod view;

pub use config::{PaneConfig, ReflectionConfig, ViewConfig};
pub use core::{DisplayOptions, FunctionRef, HistoryEntry, IlGraph, IlTier, ViewLocation};
pub use engine::{AnalysisEngine, InMemoryEngine};
pub use error::{Result, ViewError};
pub use render::{HeadlessRenderer, RenderableFrame, Renderer};
pub use view::{PaneContainer, PaneSide, ReflectionCoordinator, ViewEvent};

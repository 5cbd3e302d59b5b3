//! Pane-level presentation: header, graph pane, container, reflection.
//!
//! Everything here runs on the UI thread. Panes are owned by their container,
//! containers by the reflection coordinator; state changes travel upward as
//! `PaneEvent`s and timer or engine notifications arrive as `ViewEvent`s.

pub mod actions;
pub mod container;
pub mod event;
pub mod graph_pane;
pub mod header;
pub mod reflection;
pub mod scheduler;

pub use actions::{ActionExecution, ActionRegistry, ViewAction};
pub use container::{AnalysisWarning, PaneContainer};
pub use event::{PaneEvent, PaneSide, ViewEvent, ViewObserver};
pub use graph_pane::GraphPane;
pub use header::FunctionHeaderPanel;
pub use reflection::{ReflectionCoordinator, SyncPhase, SyncState, TierMapping};
pub use scheduler::{PeriodicTask, UpdateScheduler, UpdateSource, UpdateTransition};

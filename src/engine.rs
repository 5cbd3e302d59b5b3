//! Interface to the analysis engine.
//!
//! The engine computes IL and runs on its own threads. Panes only ever ask
//! it questions from the UI thread; change notifications come back as
//! `ViewEvent`s on the UI queue. Implementations must answer quickly and
//! never block on analysis.

use crate::core::graph::{IlGraph, TextLine};
use crate::core::il_tier::IlTier;
use crate::core::location::FunctionRef;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Queries the presentation core makes against the analysis engine.
pub trait AnalysisEngine {
    /// Function starting at, or containing, `address`.
    fn resolve_function(&self, address: u64) -> Option<FunctionRef>;

    /// Whether analysis of `function` has run to completion.
    fn is_analysis_complete(&self, function: &FunctionRef) -> bool;

    /// Whether `function` is being re-analyzed right now.
    fn is_update_in_progress(&self, function: &FunctionRef) -> bool;

    /// IL tiers this function can be shown in.
    fn available_tiers(&self, function: &FunctionRef) -> Vec<IlTier>;

    /// Graph of `function` at `tier`; `None` while the tier is not produced yet.
    fn il_representation(&self, function: &FunctionRef, tier: IlTier) -> Option<IlGraph>;

    /// Monotonic content version, bumped whenever the function changes.
    fn content_version(&self, function: &FunctionRef) -> u64;

    /// Prologue/signature lines shown above the graph.
    fn header_lines(&self, function: &FunctionRef, tier: IlTier) -> Vec<TextLine>;

    /// Why analysis of this function was skipped, if it was.
    fn skip_reason(&self, _function: &FunctionRef) -> Option<String> {
        None
    }

    /// Ask the engine to (re-)analyze a function.
    fn request_analysis(&self, _function: &FunctionRef) {}

    /// IL correspondence: address in `to` matching `address` in `from`.
    fn map_address(&self, _function: &FunctionRef, _from: IlTier, _to: IlTier, address: u64) -> Option<u64> {
        Some(address)
    }
}

#[derive(Debug, Clone)]
struct FunctionRecord {
    function: FunctionRef,
    size: u64,
    /// `None` marks a tier that exists but has not been produced yet
    tiers: BTreeMap<IlTier, Option<IlGraph>>,
    header: Vec<TextLine>,
    complete: bool,
    updating: bool,
    version: u64,
    skip_reason: Option<String>,
    address_map: HashMap<(IlTier, IlTier, u64), u64>,
}

impl FunctionRecord {
    fn contains(&self, address: u64) -> bool {
        let start = self.function.start;
        address == start || (address > start && address < start.saturating_add(self.size))
    }
}

/// Engine backed by snapshots the host pushes in.
///
/// Useful for headless replay of recorded sessions and as a stand-in while
/// the real engine is not attached. All mutators take `&self` so the engine
/// can be shared through `Rc` with every pane on the UI thread.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    functions: RefCell<BTreeMap<u64, FunctionRecord>>,
    analysis_requests: RefCell<Vec<u64>>,
    graph_fetches: Cell<usize>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function covering `[start, start + size)`.
    pub fn add_function(&self, function: FunctionRef, size: u64) {
        let start = function.start;
        self.functions.borrow_mut().insert(
            start,
            FunctionRecord {
                function,
                size,
                tiers: BTreeMap::new(),
                header: Vec::new(),
                complete: true,
                updating: false,
                version: 1,
                skip_reason: None,
                address_map: HashMap::new(),
            },
        );
        debug!(function = start, "function added");
    }

    pub fn remove_function(&self, start: u64) -> bool {
        let removed = self.functions.borrow_mut().remove(&start).is_some();
        debug!(function = start, removed, "function removed");
        removed
    }

    /// Install or replace the graph for `graph.tier` and bump the version.
    pub fn set_graph(&self, graph: IlGraph) {
        self.with_record(graph.function_start, |r| {
            r.tiers.insert(graph.tier, Some(graph));
            r.version += 1;
        });
    }

    /// Declare a tier that analysis has not produced yet.
    pub fn declare_tier(&self, start: u64, tier: IlTier) {
        self.with_record(start, |r| {
            r.tiers.entry(tier).or_insert(None);
        });
    }

    pub fn remove_tier(&self, start: u64, tier: IlTier) {
        self.with_record(start, |r| {
            r.tiers.remove(&tier);
            r.version += 1;
        });
    }

    pub fn set_header_lines(&self, start: u64, lines: Vec<TextLine>) {
        self.with_record(start, |r| {
            r.header = lines;
            r.version += 1;
        });
    }

    pub fn set_analysis_complete(&self, start: u64, complete: bool) {
        self.with_record(start, |r| r.complete = complete);
    }

    pub fn set_update_in_progress(&self, start: u64, updating: bool) {
        self.with_record(start, |r| r.updating = updating);
    }

    pub fn set_skip_reason(&self, start: u64, reason: Option<String>) {
        self.with_record(start, |r| r.skip_reason = reason);
    }

    /// Bump the content version without changing any data.
    pub fn touch(&self, start: u64) {
        self.with_record(start, |r| r.version += 1);
    }

    pub fn set_address_mapping(&self, start: u64, from: IlTier, to: IlTier, address: u64, mapped: u64) {
        self.with_record(start, |r| {
            r.address_map.insert((from, to, address), mapped);
        });
    }

    /// Functions the host was asked to analyze, oldest first.
    pub fn analysis_requests(&self) -> Vec<u64> {
        self.analysis_requests.borrow().clone()
    }

    /// Number of `il_representation` calls answered so far.
    pub fn graph_fetches(&self) -> usize {
        self.graph_fetches.get()
    }

    fn with_record(&self, start: u64, f: impl FnOnce(&mut FunctionRecord)) {
        if let Some(record) = self.functions.borrow_mut().get_mut(&start) {
            f(record);
        }
    }

    fn read<T>(&self, function: &FunctionRef, f: impl FnOnce(&FunctionRecord) -> T) -> Option<T> {
        self.functions.borrow().get(&function.start).map(f)
    }
}

impl AnalysisEngine for InMemoryEngine {
    fn resolve_function(&self, address: u64) -> Option<FunctionRef> {
        let functions = self.functions.borrow();
        if let Some(record) = functions.get(&address) {
            return Some(record.function.clone());
        }
        functions
            .range(..=address)
            .next_back()
            .filter(|(_, r)| r.contains(address))
            .map(|(_, r)| r.function.clone())
    }

    fn is_analysis_complete(&self, function: &FunctionRef) -> bool {
        self.read(function, |r| r.complete).unwrap_or(false)
    }

    fn is_update_in_progress(&self, function: &FunctionRef) -> bool {
        self.read(function, |r| r.updating).unwrap_or(false)
    }

    fn available_tiers(&self, function: &FunctionRef) -> Vec<IlTier> {
        self.read(function, |r| r.tiers.keys().copied().collect())
            .unwrap_or_default()
    }

    fn il_representation(&self, function: &FunctionRef, tier: IlTier) -> Option<IlGraph> {
        self.graph_fetches.set(self.graph_fetches.get() + 1);
        self.read(function, |r| r.tiers.get(&tier).cloned().flatten())
            .flatten()
    }

    fn content_version(&self, function: &FunctionRef) -> u64 {
        self.read(function, |r| r.version).unwrap_or(0)
    }

    fn header_lines(&self, function: &FunctionRef, _tier: IlTier) -> Vec<TextLine> {
        self.read(function, |r| r.header.clone()).unwrap_or_default()
    }

    fn skip_reason(&self, function: &FunctionRef) -> Option<String> {
        self.read(function, |r| r.skip_reason.clone()).flatten()
    }

    fn request_analysis(&self, function: &FunctionRef) {
        self.analysis_requests.borrow_mut().push(function.start);
        self.with_record(function.start, |r| r.skip_reason = None);
    }

    fn map_address(&self, function: &FunctionRef, from: IlTier, to: IlTier, address: u64) -> Option<u64> {
        self.read(function, |r| {
            r.address_map
                .get(&(from, to, address))
                .copied()
                .unwrap_or(address)
        })
    }
}

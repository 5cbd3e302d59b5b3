//! Navigation history snapshots.
//!
//! A `HistoryEntry` is everything needed to replay a graph pane: function,
//! address, IL instruction, scroll position, highlighted token and IL tier.
//! The back/forward stack lives outside this crate and stores entries as
//! ordered JSON documents: the base navigation fields followed by
//! `graphType`.
//!
//! Decoding never needs the function to be loaded. Re-resolving the function
//! is the pane's job, and a function that no longer exists leaves the pane
//! empty rather than failing.

use crate::core::highlight::HighlightTokenState;
use crate::core::il_tier::IlTier;
use crate::core::location::{FunctionRef, ViewLocation};
use crate::error::{Result, ViewError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Key the IL tier is stored under, merged into the base document.
pub const GRAPH_TYPE_KEY: &str = "graphType";

/// Scroll offset of the graph viewport, in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: i64,
    pub y: i64,
}

impl ScrollPosition {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Base navigation state shared by every flow graph view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    /// Start of the bound function; `None` when the pane showed nothing
    pub function: Option<u64>,
    pub address: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_index: Option<usize>,
    #[serde(default)]
    pub scroll_x: i64,
    #[serde(default)]
    pub scroll_y: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<HighlightTokenState>,
}

/// Snapshot of a graph pane's navigation state, extended with its IL tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub navigation: NavigationEntry,
    pub il_tier: IlTier,
}

impl HistoryEntry {
    pub fn new(
        location: &ViewLocation,
        scroll: ScrollPosition,
        highlight: Option<HighlightTokenState>,
    ) -> Self {
        Self {
            navigation: NavigationEntry {
                function: location.function_start(),
                address: location.address,
                instruction_index: location.instruction_index,
                scroll_x: scroll.x,
                scroll_y: scroll.y,
                highlight,
            },
            il_tier: location.il_tier,
        }
    }

    pub fn function_start(&self) -> Option<u64> {
        self.navigation.function
    }

    pub fn scroll(&self) -> ScrollPosition {
        ScrollPosition::new(self.navigation.scroll_x, self.navigation.scroll_y)
    }

    /// Location this entry points at, with `function` as the re-resolved handle.
    pub fn location_with(&self, function: Option<FunctionRef>) -> ViewLocation {
        ViewLocation {
            function,
            address: self.navigation.address,
            il_tier: self.il_tier,
            instruction_index: self.navigation.instruction_index,
        }
    }

    /// Encode as an ordered key/value document.
    pub fn to_document(&self) -> Result<Map<String, Value>> {
        let mut doc = match serde_json::to_value(&self.navigation)? {
            Value::Object(map) => map,
            other => {
                return Err(ViewError::DeserializationMismatch(format!(
                    "navigation entry encoded as {}",
                    other
                )))
            }
        };
        doc.insert(
            GRAPH_TYPE_KEY.to_string(),
            Value::String(self.il_tier.value().to_string()),
        );
        Ok(doc)
    }

    /// Decode a document; an unknown or missing `graphType` falls back to
    /// `IlTier::default()`.
    pub fn from_document(doc: &Value) -> Result<Self> {
        Self::from_document_or(doc, IlTier::default())
    }

    /// Decode a document, falling back to `default_tier` when the stored
    /// tier is missing or not recognised.
    pub fn from_document_or(doc: &Value, default_tier: IlTier) -> Result<Self> {
        let obj = doc.as_object().ok_or_else(|| {
            ViewError::DeserializationMismatch("history entry is not an object".to_string())
        })?;
        if !obj.contains_key("address") {
            return Err(ViewError::DeserializationMismatch(
                "history entry has no address".to_string(),
            ));
        }
        let navigation: NavigationEntry = serde_json::from_value(doc.clone())
            .map_err(|e| ViewError::DeserializationMismatch(e.to_string()))?;

        let il_tier = match obj.get(GRAPH_TYPE_KEY).and_then(Value::as_str) {
            Some(id) => id.parse().unwrap_or_else(|e| {
                warn!(error = %e, fallback = default_tier.value(), "unknown graph type in history entry");
                default_tier
            }),
            None => default_tier,
        };

        Ok(Self {
            navigation,
            il_tier,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&Value::Object(self.to_document()?))?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_document(&value)
    }
}

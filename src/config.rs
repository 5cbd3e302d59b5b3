//! Configuration for panes and the reflection coordinator.
//!
//! There is no process-wide "last view type". Every pane receives a
//! `PaneConfig` at construction, and the host may override it per pane.
//! Persisting settings is the host's business; these types only derive serde
//! so the host can store them wherever it likes.

use crate::core::il_tier::IlTier;
use crate::core::options::DisplayOptions;
use crate::error::{Result, ViewError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default poll interval for analysis updates.
pub const FUNCTION_UPDATE_CHECK_INTERVAL_MS: u64 = 100;

/// Master configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Defaults applied to every new pane.
    pub pane: PaneConfig,
    /// Reflection pairing defaults.
    pub reflection: ReflectionConfig,
}

impl ViewConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ViewConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.pane.validate()?;
        self.reflection.validate()
    }
}

/// Per-pane defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaneConfig {
    /// Tier a new pane starts in, and the tier history entries fall back to.
    pub default_tier: IlTier,
    /// Display options a new pane starts with.
    pub default_options: DisplayOptions,
    /// Period of the analysis update poll in milliseconds.
    pub update_interval_ms: u64,
    /// Show the "analysis incomplete" banner.
    pub show_analysis_warning: bool,
}

impl Default for PaneConfig {
    fn default() -> Self {
        Self {
            default_tier: IlTier::Normal,
            default_options: DisplayOptions::default(),
            update_interval_ms: FUNCTION_UPDATE_CHECK_INTERVAL_MS,
            show_analysis_warning: true,
        }
    }
}

impl PaneConfig {
    /// Copy with a different starting tier.
    pub fn with_default_tier(mut self, tier: IlTier) -> Self {
        self.default_tier = tier;
        self
    }

    pub fn with_options(mut self, options: DisplayOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn update_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.update_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.update_interval_ms == 0 {
            return Err(ViewError::InvalidConfig(
                "update_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reflection pairing defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Mirror tier changes between the panes.
    pub il_sync: bool,
    /// Mirror navigation between the panes.
    pub location_sync: bool,
    /// Starting tier of the mirror pane.
    pub mirror_tier: IlTier,
    /// Primary tier → mirror tier pairs.
    pub tier_map: Vec<(IlTier, IlTier)>,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            il_sync: true,
            location_sync: true,
            mirror_tier: IlTier::LowLevelIl,
            tier_map: vec![
                (IlTier::Normal, IlTier::LowLevelIl),
                (IlTier::LowLevelIl, IlTier::Normal),
                (IlTier::MediumLevelIl, IlTier::HighLevelIl),
                (IlTier::HighLevelIl, IlTier::MediumLevelIl),
            ],
        }
    }
}

impl ReflectionConfig {
    /// Keys and values of `tier_map` must both be unique.
    pub fn validate(&self) -> Result<()> {
        let mut keys = HashSet::new();
        let mut values = HashSet::new();
        for (from, to) in &self.tier_map {
            if !keys.insert(*from) {
                return Err(ViewError::InvalidConfig(format!(
                    "tier {} mapped twice",
                    from.value()
                )));
            }
            if !values.insert(*to) {
                return Err(ViewError::InvalidConfig(format!(
                    "tier {} is the target of two mappings",
                    to.value()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert_eq!(config.pane.default_tier, IlTier::Normal);
        assert_eq!(config.pane.update_interval_ms, 100);
        assert!(config.pane.show_analysis_warning);
        assert!(config.reflection.il_sync);
        assert!(config.reflection.location_sync);
        assert_eq!(config.reflection.tier_map.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = ViewConfig::from_json(
            r#"{"pane": {"default_tier": "hlil"}, "reflection": {"location_sync": false}}"#,
        )
        .unwrap();
        assert_eq!(config.pane.default_tier, IlTier::HighLevelIl);
        assert_eq!(config.pane.update_interval_ms, 100);
        assert!(!config.reflection.location_sync);
        assert!(config.reflection.il_sync);
    }

    #[test]
    fn test_rejects_duplicate_mapping_target() {
        let err = ViewConfig::from_json(
            r#"{"reflection": {"tier_map": [["disassembly", "mlil"], ["llil", "mlil"]]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ViewError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = ViewConfig::from_json(r#"{"pane": {"update_interval_ms": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("update_interval_ms"));
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = ViewConfig::default();
        config.pane.default_options |= DisplayOptions::SHOW_OPCODE;
        let back = ViewConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}

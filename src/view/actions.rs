//! Host-facing actions.
//!
//! Menus, toolbars and key bindings of the host window execute these by id
//! against the pane that currently has focus.

use crate::core::il_tier::IlTier;
use crate::core::options::DisplayOptions;
use crate::view::event::PaneSide;
use crate::view::reflection::ReflectionCoordinator;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const ACTION_TOGGLE_IL_SYNC: &str = "reflection.toggle_il_sync";
pub const ACTION_TOGGLE_LOCATION_SYNC: &str = "reflection.toggle_location_sync";
pub const ACTION_NEXT_IL_VIEW: &str = "view.il.next";
pub const ACTION_PREV_IL_VIEW: &str = "view.il.previous";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    SwitchIlTier(IlTier),
    ToggleOption(DisplayOptions),
    ToggleIlSync,
    ToggleLocationSync,
    CycleIlView { forward: bool },
}

impl ViewAction {
    pub fn id(&self) -> String {
        match self {
            ViewAction::SwitchIlTier(tier) => format!("view.il.{}", tier.value()),
            ViewAction::ToggleOption(option) => {
                let name = option
                    .iter_names()
                    .next()
                    .map(|(name, _)| name.to_ascii_lowercase())
                    .unwrap_or_else(|| format!("{:x}", option.bits()));
                format!("view.option.{name}")
            }
            ViewAction::ToggleIlSync => ACTION_TOGGLE_IL_SYNC.to_string(),
            ViewAction::ToggleLocationSync => ACTION_TOGGLE_LOCATION_SYNC.to_string(),
            ViewAction::CycleIlView { forward: true } => ACTION_NEXT_IL_VIEW.to_string(),
            ViewAction::CycleIlView { forward: false } => ACTION_PREV_IL_VIEW.to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ViewAction::SwitchIlTier(tier) => tier.display_name().to_string(),
            ViewAction::ToggleOption(option) => option.label().to_string(),
            ViewAction::ToggleIlSync => "Sync IL View".to_string(),
            ViewAction::ToggleLocationSync => "Sync Location".to_string(),
            ViewAction::CycleIlView { forward: true } => "Next IL View".to_string(),
            ViewAction::CycleIlView { forward: false } => "Previous IL View".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionExecution {
    pub action_id: String,
    pub succeeded: bool,
}

pub struct ActionRegistry {
    actions: HashMap<String, ViewAction>,
    order: Vec<String>,
}

impl ActionRegistry {
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register under the action's own id; re-registering replaces it.
    pub fn register(&mut self, action: ViewAction) {
        let id = action.id().to_ascii_lowercase();
        if self.actions.insert(id.clone(), action).is_none() {
            self.order.push(id);
        }
    }

    /// Registered actions in registration order.
    pub fn actions(&self) -> impl Iterator<Item = (&str, &ViewAction)> {
        self.order
            .iter()
            .filter_map(|id| self.actions.get(id).map(|a| (id.as_str(), a)))
    }

    pub fn get(&self, action_id: &str) -> Option<&ViewAction> {
        self.actions.get(&action_id.to_ascii_lowercase())
    }

    pub fn execute(
        &self,
        action_id: &str,
        coordinator: &mut ReflectionCoordinator,
        side: PaneSide,
    ) -> ActionExecution {
        let normalized_action_id = action_id.to_ascii_lowercase();
        let Some(action) = self.actions.get(&normalized_action_id) else {
            warn!(action = %normalized_action_id, "unknown action");
            return ActionExecution {
                action_id: normalized_action_id,
                succeeded: false,
            };
        };

        let succeeded = match *action {
            ViewAction::SwitchIlTier(tier) => coordinator.set_il_tier(side, tier),
            ViewAction::ToggleOption(option) => coordinator.toggle_option(side, option),
            ViewAction::ToggleIlSync => {
                coordinator.toggle_il_sync();
                true
            }
            ViewAction::ToggleLocationSync => {
                coordinator.toggle_location_sync();
                true
            }
            ViewAction::CycleIlView { forward } => coordinator.cycle_il_tier(side, forward),
        };
        debug!(action = %normalized_action_id, side = side.value(), succeeded, "action executed");

        ActionExecution {
            action_id: normalized_action_id,
            succeeded,
        }
    }

    /// Check mark state for menu rendering. `None` for plain commands.
    pub fn is_checked(
        &self,
        action_id: &str,
        coordinator: &ReflectionCoordinator,
        side: PaneSide,
    ) -> Option<bool> {
        let pane = coordinator.pane(side);
        match self.get(action_id)? {
            ViewAction::SwitchIlTier(tier) => Some(pane.tier() == *tier),
            ViewAction::ToggleOption(option) => Some(pane.graph().options().contains(*option)),
            ViewAction::ToggleIlSync => Some(coordinator.state().il_sync_enabled),
            ViewAction::ToggleLocationSync => Some(coordinator.state().location_sync_enabled),
            ViewAction::CycleIlView { .. } => None,
        }
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for tier in IlTier::ALL {
            registry.register(ViewAction::SwitchIlTier(tier));
        }
        registry.register(ViewAction::CycleIlView { forward: true });
        registry.register(ViewAction::CycleIlView { forward: false });
        for (option, _) in DisplayOptions::LABELED {
            registry.register(ViewAction::ToggleOption(option));
        }
        registry.register(ViewAction::ToggleIlSync);
        registry.register(ViewAction::ToggleLocationSync);
        registry
    }
}

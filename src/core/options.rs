//! Per-pane display flags.
//!
//! Options only change presentation. Toggling one re-lays out the cached
//! graph; it never re-fetches IL from the engine.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Independent boolean display options of a graph pane.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DisplayOptions: u32 {
        const SHOW_ADDRESS = 1 << 0;
        const SHOW_OPCODE = 1 << 1;
        const EXPAND_LONG_OPCODE = 1 << 2;
        const SHOW_VARIABLES_AT_TOP = 1 << 3;
        const SHOW_VARIABLE_TYPES = 1 << 4;
        const SHOW_CALL_PARAMETER_NAMES = 1 << 5;
        const SHOW_REGISTER_HIGHLIGHT = 1 << 6;
        const SHOW_FUNCTION_ADDRESS = 1 << 7;
        const SHOW_FUNCTION_HEADER = 1 << 8;
    }
}

impl DisplayOptions {
    /// Every single flag with its menu label, in flag order.
    pub const LABELED: [(DisplayOptions, &'static str); 9] = [
        (DisplayOptions::SHOW_ADDRESS, "Show Address"),
        (DisplayOptions::SHOW_OPCODE, "Show Opcode Bytes"),
        (DisplayOptions::EXPAND_LONG_OPCODE, "Expand Long Opcode"),
        (DisplayOptions::SHOW_VARIABLES_AT_TOP, "Show Variables At Top"),
        (DisplayOptions::SHOW_VARIABLE_TYPES, "Show Variable Types"),
        (
            DisplayOptions::SHOW_CALL_PARAMETER_NAMES,
            "Show Call Parameter Names",
        ),
        (DisplayOptions::SHOW_REGISTER_HIGHLIGHT, "Show Register Highlight"),
        (DisplayOptions::SHOW_FUNCTION_ADDRESS, "Show Function Address"),
        (DisplayOptions::SHOW_FUNCTION_HEADER, "Show Function Header"),
    ];

    /// Human readable label for a single flag, used by menus and the status line.
    pub fn label(self) -> &'static str {
        Self::LABELED
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, label)| *label)
            .unwrap_or("Multiple Options")
    }

    /// Short labels of every enabled flag, in flag order.
    pub fn enabled_labels(self) -> Vec<&'static str> {
        self.iter().map(|flag| flag.label()).collect()
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions::SHOW_ADDRESS
            | DisplayOptions::SHOW_FUNCTION_HEADER
            | DisplayOptions::SHOW_VARIABLES_AT_TOP
    }
}

//! Function handles and view locations.

use crate::core::il_tier::IlTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque handle to a function owned by the analysis engine.
///
/// Two handles are equal when they start at the same address; the name is
/// display-only and may change as analysis renames the function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRef {
    /// Entry point address
    pub start: u64,
    /// Display name
    pub name: String,
}

impl FunctionRef {
    pub fn new(start: u64, name: impl Into<String>) -> Self {
        Self {
            start,
            name: name.into(),
        }
    }

    /// Handle with the conventional `sub_<addr>` name.
    pub fn unnamed(start: u64) -> Self {
        Self::new(start, format!("sub_{:x}", start))
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
    }
}

impl Eq for FunctionRef {}

impl Hash for FunctionRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.name, self.start)
    }
}

/// Where a view is looking.
///
/// When `function` is `None` the location means "no selection" and the
/// address and instruction index carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewLocation {
    pub function: Option<FunctionRef>,
    pub address: u64,
    pub il_tier: IlTier,
    pub instruction_index: Option<usize>,
}

impl ViewLocation {
    pub fn new(function: FunctionRef, address: u64, il_tier: IlTier) -> Self {
        Self {
            function: Some(function),
            address,
            il_tier,
            instruction_index: None,
        }
    }

    /// Location for an address whose function is not known yet. The pane
    /// resolves it through the engine.
    pub fn at_address(address: u64, il_tier: IlTier) -> Self {
        Self {
            function: None,
            address,
            il_tier,
            instruction_index: None,
        }
    }

    /// "No selection" in the given tier.
    pub fn empty(il_tier: IlTier) -> Self {
        Self {
            il_tier,
            ..Self::default()
        }
    }

    pub fn with_instruction_index(mut self, index: usize) -> Self {
        self.instruction_index = Some(index);
        self
    }

    pub fn with_tier(mut self, il_tier: IlTier) -> Self {
        self.il_tier = il_tier;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.function.is_none()
    }

    pub fn function_start(&self) -> Option<u64> {
        self.function.as_ref().map(|f| f.start)
    }

    /// Same function and address, ignoring tier and instruction index.
    pub fn same_place(&self, other: &ViewLocation) -> bool {
        match (&self.function, &other.function) {
            (Some(a), Some(b)) => a == b && self.address == other.address,
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ViewLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(func) => write!(f, "{} {:#x} [{}]", func, self.address, self.il_tier.value()),
            None => write!(f, "<none> [{}]", self.il_tier.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_identity_ignores_name() {
        let a = FunctionRef::new(0x1000, "main");
        let b = FunctionRef::unnamed(0x1000);
        assert_eq!(a, b);
        assert_eq!(b.name, "sub_1000");
    }

    #[test]
    fn test_empty_location() {
        let loc = ViewLocation::empty(IlTier::HighLevelIl);
        assert!(loc.is_empty());
        assert_eq!(loc.function_start(), None);
        assert_eq!(loc.to_string(), "<none> [hlil]");
    }

    #[test]
    fn test_same_place() {
        let f = FunctionRef::unnamed(0x1000);
        let a = ViewLocation::new(f.clone(), 0x1004, IlTier::Normal);
        let b = ViewLocation::new(f.clone(), 0x1004, IlTier::MediumLevelIl)
            .with_instruction_index(3);
        let c = ViewLocation::new(f, 0x1008, IlTier::Normal);
        assert!(a.same_place(&b));
        assert!(!a.same_place(&c));
        assert!(!a.same_place(&ViewLocation::empty(IlTier::Normal)));
    }
}

//! Highlighted token shared between a graph and its function header.

use serde::{Deserialize, Serialize};

/// Lexical class of a rendered token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    Text,
    Instruction,
    Register,
    Integer,
    /// Reference to code (function or label)
    CodeSymbol,
    /// Reference to data
    DataSymbol,
    LocalVariable,
    Keyword,
    Type,
    Comment,
}

impl TokenKind {
    pub fn value(&self) -> &str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Instruction => "instruction",
            TokenKind::Register => "register",
            TokenKind::Integer => "integer",
            TokenKind::CodeSymbol => "code_symbol",
            TokenKind::DataSymbol => "data_symbol",
            TokenKind::LocalVariable => "local_variable",
            TokenKind::Keyword => "keyword",
            TokenKind::Type => "type",
            TokenKind::Comment => "comment",
        }
    }
}

/// The token currently highlighted by a selection gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightTokenState {
    /// Address of the line the token sits on
    pub address: u64,
    /// Index of the token within its line
    pub token_index: usize,
    /// Token text; other tokens with the same text and kind are highlighted too
    pub text: String,
    pub kind: TokenKind,
}

impl HighlightTokenState {
    pub fn new(address: u64, token_index: usize, text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            address,
            token_index,
            text: text.into(),
            kind,
        }
    }

    /// Whether another token should render highlighted alongside this one.
    pub fn matches(&self, text: &str, kind: TokenKind) -> bool {
        self.kind == kind && self.text == text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_same_text_and_kind() {
        let h = HighlightTokenState::new(0x1000, 1, "rax", TokenKind::Register);
        assert!(h.matches("rax", TokenKind::Register));
        assert!(!h.matches("rax", TokenKind::Text));
        assert!(!h.matches("rbx", TokenKind::Register));
    }
}

//! IL graph data handed over by the analysis engine.
//!
//! An `IlGraph` is a snapshot of one function at one IL tier: basic blocks of
//! token lines plus the edges between them. Panes cache it so that option
//! toggles and highlight changes can re-render without asking the engine
//! again.

use crate::core::highlight::TokenKind;
use crate::core::il_tier::IlTier;
use serde::{Deserialize, Serialize};

/// One lexical token of a rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    /// Navigable target, for code/data references and integers that look like addresses
    pub target: Option<u64>,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
            target: None,
        }
    }

    pub fn with_target(text: impl Into<String>, kind: TokenKind, target: u64) -> Self {
        Self {
            text: text.into(),
            kind,
            target: Some(target),
        }
    }
}

/// One rendered line: an instruction, IL statement, or header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    pub address: u64,
    /// IL instruction index; `None` for disassembly and header lines
    pub instruction_index: Option<usize>,
    pub tokens: Vec<Token>,
}

impl TextLine {
    pub fn new(address: u64, tokens: Vec<Token>) -> Self {
        Self {
            address,
            instruction_index: None,
            tokens,
        }
    }

    pub fn with_instruction_index(mut self, index: usize) -> Self {
        self.instruction_index = Some(index);
        self
    }

    /// Width in characters, tokens concatenated.
    pub fn width(&self) -> usize {
        self.tokens.iter().map(|t| t.text.chars().count()).sum()
    }

    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    /// Token covering character `column`, with its index.
    pub fn token_at_column(&self, column: usize) -> Option<(usize, &Token)> {
        let mut start = 0;
        for (index, token) in self.tokens.iter().enumerate() {
            let end = start + token.text.chars().count();
            if column >= start && column < end {
                return Some((index, token));
            }
            start = end;
        }
        None
    }
}

/// Edge kind between IL blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IlEdgeKind {
    Unconditional,
    TrueBranch,
    FalseBranch,
    Fallthrough,
    IndirectBranch,
}

impl IlEdgeKind {
    pub fn value(&self) -> &str {
        match self {
            IlEdgeKind::Unconditional => "unconditional",
            IlEdgeKind::TrueBranch => "true",
            IlEdgeKind::FalseBranch => "false",
            IlEdgeKind::Fallthrough => "fallthrough",
            IlEdgeKind::IndirectBranch => "indirect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlEdge {
    /// Start address of the source block
    pub from: u64,
    /// Start address of the target block
    pub to: u64,
    pub kind: IlEdgeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlBlock {
    pub start: u64,
    pub lines: Vec<TextLine>,
}

impl IlBlock {
    pub fn new(start: u64, lines: Vec<TextLine>) -> Self {
        Self { start, lines }
    }
}

/// Graph of one function at one IL tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IlGraph {
    pub function_start: u64,
    pub tier: IlTier,
    pub blocks: Vec<IlBlock>,
    pub edges: Vec<IlEdge>,
}

impl IlGraph {
    pub fn new(function_start: u64, tier: IlTier) -> Self {
        Self {
            function_start,
            tier,
            blocks: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_block(&mut self, block: IlBlock) {
        if !self.blocks.iter().any(|b| b.start == block.start) {
            self.blocks.push(block);
        }
    }

    pub fn add_edge(&mut self, from: u64, to: u64, kind: IlEdgeKind) {
        self.edges.push(IlEdge { from, to, kind });
    }

    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|b| b.lines.iter())
    }

    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|b| b.lines.len()).sum()
    }

    /// Whether some line of the graph sits at `address`.
    pub fn contains_address(&self, address: u64) -> bool {
        self.lines().any(|l| l.address == address)
    }

    /// Address of the line carrying IL instruction `index`.
    pub fn address_of_instruction(&self, index: usize) -> Option<u64> {
        self.lines()
            .find(|l| l.instruction_index == Some(index))
            .map(|l| l.address)
    }

    /// First IL instruction index at `address`.
    pub fn instruction_at(&self, address: u64) -> Option<usize> {
        self.lines()
            .filter(|l| l.address == address)
            .find_map(|l| l.instruction_index)
    }

    pub fn successors(&self, block_start: u64) -> Vec<u64> {
        self.edges
            .iter()
            .filter(|e| e.from == block_start)
            .map(|e| e.to)
            .collect()
    }

    pub fn predecessors(&self, block_start: u64) -> Vec<u64> {
        self.edges
            .iter()
            .filter(|e| e.to == block_start)
            .map(|e| e.from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IlGraph {
        let mut g = IlGraph::new(0x1000, IlTier::MediumLevelIl);
        g.add_block(IlBlock::new(
            0x1000,
            vec![
                TextLine::new(0x1000, vec![Token::new("x = 1", TokenKind::Text)])
                    .with_instruction_index(0),
                TextLine::new(
                    0x1004,
                    vec![
                        Token::new("if ", TokenKind::Keyword),
                        Token::with_target("0x1010", TokenKind::CodeSymbol, 0x1010),
                    ],
                )
                .with_instruction_index(1),
            ],
        ));
        g.add_block(IlBlock::new(0x1010, vec![TextLine::new(0x1010, vec![])]));
        g.add_edge(0x1000, 0x1010, IlEdgeKind::TrueBranch);
        g
    }

    #[test]
    fn test_instruction_lookup() {
        let g = sample();
        assert_eq!(g.address_of_instruction(1), Some(0x1004));
        assert_eq!(g.instruction_at(0x1000), Some(0));
        assert_eq!(g.instruction_at(0x1010), None);
        assert!(g.contains_address(0x1010));
        assert!(!g.contains_address(0x2000));
        assert_eq!(g.line_count(), 3);
    }

    #[test]
    fn test_edges() {
        let g = sample();
        assert_eq!(g.successors(0x1000), vec![0x1010]);
        assert_eq!(g.predecessors(0x1010), vec![0x1000]);
        assert!(g.successors(0x1010).is_empty());
    }

    #[test]
    fn test_duplicate_block_ignored() {
        let mut g = sample();
        g.add_block(IlBlock::new(0x1000, vec![]));
        assert_eq!(g.blocks.len(), 2);
    }

    #[test]
    fn test_token_at_column() {
        let g = sample();
        let line = g.lines().nth(1).unwrap();
        assert_eq!(line.width(), 9);
        let (index, token) = line.token_at_column(4).unwrap();
        assert_eq!(index, 1);
        assert_eq!(token.target, Some(0x1010));
        assert!(line.token_at_column(9).is_none());
    }
}

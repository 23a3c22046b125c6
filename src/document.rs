use std::sync::OnceLock;

use crate::semantic::SemanticModel;
use crate::syntax::parser::parse_unit;
use crate::syntax::{GreenNode, SyntaxError, SyntaxNode, line_column, offset_of};

/// An immutable snapshot of one source file.
///
/// Rewrites never mutate a document; they build a new one that shares the
/// untouched subtrees. The semantic model is computed on first use and
/// belongs to this snapshot only.
#[derive(Debug)]
pub(crate) struct Document {
    name: String,
    text: String,
    root: SyntaxNode,
    semantic: OnceLock<SemanticModel>,
    skipped_members: Vec<SyntaxError>,
}

impl Document {
    pub(crate) fn parse(name: impl Into<String>, text: &str) -> Result<Self, SyntaxError> {
        let unit = parse_unit(text)?;
        Ok(Self::from_green(name.into(), unit.green, unit.skipped_members))
    }

    fn from_green(name: String, green: GreenNode, skipped_members: Vec<SyntaxError>) -> Self {
        Self {
            name,
            text: green.text(),
            root: SyntaxNode::new_root(green),
            semantic: OnceLock::new(),
            skipped_members,
        }
    }

    /// A new snapshot of the same file with a different tree. Skipped-member
    /// positions belong to the parsed text and are not carried over.
    pub(crate) fn with_root(&self, green: GreenNode) -> Self {
        Self::from_green(self.name.clone(), green, Vec::new())
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub(crate) fn semantic_model(&self) -> &SemanticModel {
        self.semantic.get_or_init(|| SemanticModel::new(&self.root))
    }

    /// Smallest node covering the caret at `offset`.
    pub(crate) fn covering_node(&self, offset: usize) -> SyntaxNode {
        self.root.covering_node(offset)
    }

    pub(crate) fn line_column(&self, offset: usize) -> (usize, usize) {
        line_column(&self.text, offset)
    }

    pub(crate) fn offset_at(&self, line: usize, column: usize) -> Option<usize> {
        offset_of(&self.text, line, column)
    }

    /// Members the parser could not model. They stay in the tree as opaque
    /// text and are invisible to the rules.
    pub(crate) fn skipped_members(&self) -> &[SyntaxError] {
        &self.skipped_members
    }
}

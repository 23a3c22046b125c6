//! Immutable green tree with parent-aware red cursors.
//!
//! Green nodes own their text and are shared between tree versions; red
//! nodes add absolute offsets and parent links for navigation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::Arc;

use super::SyntaxKind;

#[derive(Debug, PartialEq, Eq, Hash)]
struct GreenTokenData {
    kind: SyntaxKind,
    leading: String,
    text: String,
    trailing: String,
}

/// Token together with the trivia attached to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct GreenToken(Arc<GreenTokenData>);

impl GreenToken {
    pub(crate) fn new(
        kind: SyntaxKind,
        leading: impl Into<String>,
        text: impl Into<String>,
        trailing: impl Into<String>,
    ) -> Self {
        Self(Arc::new(GreenTokenData {
            kind,
            leading: leading.into(),
            text: text.into(),
            trailing: trailing.into(),
        }))
    }

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub(crate) fn text(&self) -> &str {
        &self.0.text
    }

    pub(crate) fn leading(&self) -> &str {
        &self.0.leading
    }

    pub(crate) fn trailing(&self) -> &str {
        &self.0.trailing
    }

    pub(crate) fn full_len(&self) -> usize {
        self.0.leading.len() + self.0.text.len() + self.0.trailing.len()
    }

    pub(crate) fn with_leading(&self, leading: impl Into<String>) -> Self {
        Self::new(self.kind(), leading, self.text(), self.trailing())
    }

    pub(crate) fn with_trailing(&self, trailing: impl Into<String>) -> Self {
        Self::new(self.kind(), self.leading(), self.text(), trailing)
    }

    pub(crate) fn is_punct(&self, text: &str) -> bool {
        self.kind() == SyntaxKind::Punct && self.text() == text
    }

    pub(crate) fn is_keyword(&self, text: &str) -> bool {
        self.kind() == SyntaxKind::Ident && self.text() == text
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.0.leading);
        out.push_str(&self.0.text);
        out.push_str(&self.0.trailing);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum GreenElement {
    Node(GreenNode),
    Token(GreenToken),
}

impl GreenElement {
    pub(crate) fn full_len(&self) -> usize {
        match self {
            GreenElement::Node(node) => node.full_len(),
            GreenElement::Token(token) => token.full_len(),
        }
    }
}

impl From<GreenNode> for GreenElement {
    fn from(node: GreenNode) -> Self {
        GreenElement::Node(node)
    }
}

impl From<GreenToken> for GreenElement {
    fn from(token: GreenToken) -> Self {
        GreenElement::Token(token)
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct GreenNodeData {
    kind: SyntaxKind,
    children: Vec<GreenElement>,
    full_len: usize,
}

/// Position independent node; cheap to clone and share.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct GreenNode(Arc<GreenNodeData>);

impl GreenNode {
    pub(crate) fn new(kind: SyntaxKind, children: Vec<GreenElement>) -> Self {
        let full_len = children.iter().map(GreenElement::full_len).sum();
        Self(Arc::new(GreenNodeData {
            kind,
            children,
            full_len,
        }))
    }

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.0.kind
    }

    pub(crate) fn children(&self) -> &[GreenElement] {
        &self.0.children
    }

    pub(crate) fn full_len(&self) -> usize {
        self.0.full_len
    }

    pub(crate) fn text(&self) -> String {
        let mut out = String::with_capacity(self.full_len());
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        for child in self.children() {
            match child {
                GreenElement::Node(node) => node.write_to(out),
                GreenElement::Token(token) => token.write_to(out),
            }
        }
    }

    pub(crate) fn first_token(&self) -> Option<&GreenToken> {
        self.children().iter().find_map(|child| match child {
            GreenElement::Token(token) => Some(token),
            GreenElement::Node(node) => node.first_token(),
        })
    }

    pub(crate) fn last_token(&self) -> Option<&GreenToken> {
        self.children().iter().rev().find_map(|child| match child {
            GreenElement::Token(token) => Some(token),
            GreenElement::Node(node) => node.last_token(),
        })
    }

    /// Text without the leading trivia of the first token and the trailing
    /// trivia of the last one.
    pub(crate) fn trimmed_text(&self) -> String {
        let text = self.text();
        let start = self.first_token().map(|t| t.leading().len()).unwrap_or(0);
        let end = text.len() - self.last_token().map(|t| t.trailing().len()).unwrap_or(0);
        if start >= end {
            return String::new();
        }
        text[start..end].to_string()
    }

    pub(crate) fn replace_child(&self, index: usize, child: GreenElement) -> GreenNode {
        let mut children = self.children().to_vec();
        children[index] = child;
        GreenNode::new(self.kind(), children)
    }

    pub(crate) fn insert_child(&self, index: usize, child: GreenElement) -> GreenNode {
        let mut children = self.children().to_vec();
        children.insert(index, child);
        GreenNode::new(self.kind(), children)
    }

    pub(crate) fn with_leading_trivia(&self, leading: &str) -> GreenNode {
        self.map_edge_token(true, &|token| token.with_leading(leading))
    }

    pub(crate) fn with_trailing_trivia(&self, trailing: &str) -> GreenNode {
        self.map_edge_token(false, &|token| token.with_trailing(trailing))
    }

    fn map_edge_token(&self, first: bool, map: &dyn Fn(&GreenToken) -> GreenToken) -> GreenNode {
        let positions: Vec<usize> = if first {
            (0..self.children().len()).collect()
        } else {
            (0..self.children().len()).rev().collect()
        };
        for index in positions {
            match &self.children()[index] {
                GreenElement::Token(token) => {
                    return self.replace_child(index, map(token).into());
                }
                GreenElement::Node(node) if node.first_token().is_some() => {
                    return self.replace_child(index, node.map_edge_token(first, map).into());
                }
                GreenElement::Node(_) => {}
            }
        }
        self.clone()
    }
}

struct NodeData {
    green: GreenNode,
    parent: Option<SyntaxNode>,
    index: usize,
    offset: usize,
}

/// Cursor over a green node that knows its absolute offset and parent.
#[derive(Clone)]
pub(crate) struct SyntaxNode(Arc<NodeData>);

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.green.0, &other.0.green.0) && self.0.offset == other.0.offset
    }
}

impl Eq for SyntaxNode {}

impl Hash for SyntaxNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0.green.0) as usize).hash(state);
        self.0.offset.hash(state);
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.text_range())
    }
}

impl SyntaxNode {
    pub(crate) fn new_root(green: GreenNode) -> Self {
        Self(Arc::new(NodeData {
            green,
            parent: None,
            index: 0,
            offset: 0,
        }))
    }

    pub(crate) fn kind(&self) -> SyntaxKind {
        self.0.green.kind()
    }

    pub(crate) fn green(&self) -> &GreenNode {
        &self.0.green
    }

    pub(crate) fn parent(&self) -> Option<SyntaxNode> {
        self.0.parent.clone()
    }

    pub(crate) fn index(&self) -> usize {
        self.0.index
    }

    pub(crate) fn offset(&self) -> usize {
        self.0.offset
    }

    pub(crate) fn full_range(&self) -> Range<usize> {
        self.offset()..self.offset() + self.green().full_len()
    }

    /// Span of the node without surrounding trivia.
    pub(crate) fn text_range(&self) -> Range<usize> {
        let full = self.full_range();
        let leading = self.green().first_token().map(|t| t.leading().len()).unwrap_or(0);
        let trailing = self.green().last_token().map(|t| t.trailing().len()).unwrap_or(0);
        let start = full.start + leading;
        let end = full.end.saturating_sub(trailing).max(start);
        start..end
    }

    pub(crate) fn text(&self) -> String {
        self.green().text()
    }

    pub(crate) fn trimmed_text(&self) -> String {
        self.green().trimmed_text()
    }

    pub(crate) fn children_with_tokens(&self) -> Vec<SyntaxElement> {
        let mut offset = self.offset();
        let mut elements = Vec::with_capacity(self.green().children().len());
        for (index, child) in self.green().children().iter().enumerate() {
            match child {
                GreenElement::Node(node) => {
                    elements.push(SyntaxElement::Node(SyntaxNode(Arc::new(NodeData {
                        green: node.clone(),
                        parent: Some(self.clone()),
                        index,
                        offset,
                    }))));
                }
                GreenElement::Token(token) => {
                    elements.push(SyntaxElement::Token(SyntaxToken {
                        green: token.clone(),
                        index,
                        offset,
                    }));
                }
            }
            offset += child.full_len();
        }
        elements
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        self.children_with_tokens()
            .into_iter()
            .filter_map(SyntaxElement::into_node)
    }

    pub(crate) fn child_tokens(&self) -> impl Iterator<Item = SyntaxToken> + use<> {
        self.children_with_tokens()
            .into_iter()
            .filter_map(SyntaxElement::into_token)
    }

    pub(crate) fn first_child_of(&self, kind: SyntaxKind) -> Option<SyntaxNode> {
        self.children().find(|child| child.kind() == kind)
    }

    /// Preorder walk including the node itself.
    pub(crate) fn descendants(&self) -> Descendants {
        Descendants {
            stack: vec![self.clone()],
        }
    }

    /// The node itself followed by its parents up to the root.
    pub(crate) fn ancestors(&self) -> impl Iterator<Item = SyntaxNode> + use<> {
        std::iter::successors(Some(self.clone()), SyntaxNode::parent)
    }

    pub(crate) fn first_token(&self) -> Option<SyntaxToken> {
        for element in self.children_with_tokens() {
            match element {
                SyntaxElement::Token(token) => return Some(token),
                SyntaxElement::Node(node) => {
                    if let Some(token) = node.first_token() {
                        return Some(token);
                    }
                }
            }
        }
        None
    }

    pub(crate) fn last_token(&self) -> Option<SyntaxToken> {
        for element in self.children_with_tokens().into_iter().rev() {
            match element {
                SyntaxElement::Token(token) => return Some(token),
                SyntaxElement::Node(node) => {
                    if let Some(token) = node.last_token() {
                        return Some(token);
                    }
                }
            }
        }
        None
    }

    /// Smallest node whose full span contains `[offset, offset + 1)`.
    pub(crate) fn covering_node(&self, offset: usize) -> SyntaxNode {
        let mut current = self.clone();
        'descend: loop {
            for child in current.children() {
                let range = child.full_range();
                if range.start <= offset && offset < range.end {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Builds a new subtree of this node with every listed descendant swapped
    /// for its replacement. Untouched subtrees are shared with the old tree.
    pub(crate) fn replace_descendants(&self, replacements: &[(SyntaxNode, GreenNode)]) -> GreenNode {
        if let Some((_, green)) = replacements.iter().find(|(node, _)| node == self) {
            return green.clone();
        }
        let own = self.full_range();
        let affected = replacements.iter().any(|(node, _)| {
            let range = node.full_range();
            own.start <= range.start && range.end <= own.end && node.ancestors().any(|a| &a == self)
        });
        if !affected {
            return self.green().clone();
        }
        let children = self
            .children_with_tokens()
            .into_iter()
            .map(|element| match element {
                SyntaxElement::Node(node) => node.replace_descendants(replacements).into(),
                SyntaxElement::Token(token) => token.green.into(),
            })
            .collect();
        GreenNode::new(self.kind(), children)
    }
}

pub(crate) struct Descendants {
    stack: Vec<SyntaxNode>,
}

impl Iterator for Descendants {
    type Item = SyntaxNode;

    fn next(&mut self) -> Option<SyntaxNode> {
        let node = self.stack.pop()?;
        let mut children: Vec<SyntaxNode> = node.children().collect();
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

#[derive(Clone)]
pub(crate) struct SyntaxToken {
    green: GreenToken,
    index: usize,
    offset: usize,
}

impl fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})@{:?}", self.kind(), self.text(), self.text_range())
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.green.0, &other.green.0) && self.offset == other.offset
    }
}

impl Eq for SyntaxToken {}

impl SyntaxToken {
    pub(crate) fn kind(&self) -> SyntaxKind {
        self.green.kind()
    }

    pub(crate) fn text(&self) -> &str {
        self.green.text()
    }

    pub(crate) fn green(&self) -> &GreenToken {
        &self.green
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn text_range(&self) -> Range<usize> {
        let start = self.offset + self.green.leading().len();
        start..start + self.green.text().len()
    }

    pub(crate) fn is_punct(&self, text: &str) -> bool {
        self.green.is_punct(text)
    }

    pub(crate) fn is_keyword(&self, text: &str) -> bool {
        self.green.is_keyword(text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

impl SyntaxElement {
    pub(crate) fn into_node(self) -> Option<SyntaxNode> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub(crate) fn into_token(self) -> Option<SyntaxToken> {
        match self {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        }
    }
}

//! Arena-based parse tree
//!
//! Nodes live in an arena and are addressed by stable [`NodeId`]s, so tree
//! membership and external references (for example a literal node also held
//! as a lookup key during embedded-code resolution) never alias through
//! parent pointers. The mutation surface is exactly `append_child`, `graft`
//! and `detach_child`; everything else is read-only navigation.
//!
//! A rule node's span is the union of its children's spans. A node is a
//! *wrapper* iff it has exactly one rule child whose span equals its own;
//! wrappers exist only for grammar composability and the navigation in
//! [`query`] abstracts over them.

pub mod query;

use crate::islands::tokens::Token;
use serde::Serialize;

/// Stable index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub(crate) usize);

/// Shape tag of a rule node, one variant per grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    File,
    /// Generic island statement.
    Statement,
    /// `do` statement.
    AnonymousBlock,
    FunctionDefinition,
    ProcedureDefinition,
    /// `as ...` / `language ...` option of a function or procedure.
    RoutineOption,
    Expression,
    SqlName,
    Literal,
    EmbeddedSqlBody,
    EmbeddedProceduralBody,
}

/// Alternative-label tag of a rule node.
///
/// Labels identify the matched alternative of a rule; lookup of the label
/// name is a table lookup, not name parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AltLabel {
    // literal notations
    SimpleString,
    ConcatenatedString,
    NationalString,
    ConcatenatedNationalString,
    EscapedString,
    UnicodeString,
    BitString,
    QuoteDelimiterString,
    NationalQuoteDelimiterString,
    DollarString,
    DollarIdentifierString,
    // routine options
    BodyOption,
    LanguageOption,
    // statement recovery
    ErrorStatement,
}

impl AltLabel {
    /// Label name as written in the grammar.
    pub fn name(self) -> &'static str {
        match self {
            AltLabel::SimpleString => "simpleString",
            AltLabel::ConcatenatedString => "concatenatedString",
            AltLabel::NationalString => "nationalString",
            AltLabel::ConcatenatedNationalString => "concatenatedNationalString",
            AltLabel::EscapedString => "escapedString",
            AltLabel::UnicodeString => "unicodeString",
            AltLabel::BitString => "bitString",
            AltLabel::QuoteDelimiterString => "quoteDelimiterString",
            AltLabel::NationalQuoteDelimiterString => "nationalQuoteDelimiterString",
            AltLabel::DollarString => "dollarString",
            AltLabel::DollarIdentifierString => "dollarIdentifierString",
            AltLabel::BodyOption => "bodyOption",
            AltLabel::LanguageOption => "languageOption",
            AltLabel::ErrorStatement => "errorStatement",
        }
    }
}

/// Byte span of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
}

#[derive(Debug, Clone)]
enum NodeData {
    Rule {
        kind: RuleKind,
        label: Option<AltLabel>,
        parent: Option<NodeId>,
        children: Vec<NodeId>,
    },
    Terminal {
        parent: Option<NodeId>,
        token: Token,
    },
}

/// Rooted parse tree over an arena of nodes.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl ParseTree {
    /// Create a tree holding a single rule node as root.
    pub(crate) fn with_root(kind: RuleKind) -> ParseTree {
        ParseTree {
            nodes: vec![NodeData::Rule {
                kind,
                label: None,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a rule node as the last child of `parent`.
    pub(crate) fn push_rule(
        &mut self,
        parent: NodeId,
        kind: RuleKind,
        label: Option<AltLabel>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::Rule {
            kind,
            label,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.child_list_mut(parent).push(id);
        id
    }

    /// Add a terminal node as the last child of `parent`.
    pub(crate) fn push_terminal(&mut self, parent: NodeId, token: Token) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::Terminal {
            parent: Some(parent),
            token,
        });
        self.child_list_mut(parent).push(id);
        id
    }

    pub(crate) fn set_label(&mut self, id: NodeId, new_label: AltLabel) {
        if let Some(NodeData::Rule { label, .. }) = self.nodes.get_mut(id.0) {
            *label = Some(new_label);
        }
    }

    fn child_list_mut(&mut self, id: NodeId) -> &mut Vec<NodeId> {
        match &mut self.nodes[id.0] {
            NodeData::Rule { children, .. } => children,
            NodeData::Terminal { .. } => unreachable!("terminal nodes have no children"),
        }
    }

    /// Shape tag of a rule node; `None` for terminals.
    pub fn kind(&self, id: NodeId) -> Option<RuleKind> {
        match self.nodes.get(id.0)? {
            NodeData::Rule { kind, .. } => Some(*kind),
            NodeData::Terminal { .. } => None,
        }
    }

    /// Alternative-label tag of a rule node, if its alternative is named.
    pub fn label(&self, id: NodeId) -> Option<AltLabel> {
        match self.nodes.get(id.0)? {
            NodeData::Rule { label, .. } => *label,
            NodeData::Terminal { .. } => None,
        }
    }

    /// Token of a terminal node; `None` for rule nodes.
    pub fn token(&self, id: NodeId) -> Option<&Token> {
        match self.nodes.get(id.0)? {
            NodeData::Terminal { token, .. } => Some(token),
            NodeData::Rule { .. } => None,
        }
    }

    pub fn is_rule(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(NodeData::Rule { .. }))
    }

    pub fn is_terminal(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(NodeData::Terminal { .. }))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        match self.nodes.get(id.0)? {
            NodeData::Rule { parent, .. } => *parent,
            NodeData::Terminal { parent, .. } => *parent,
        }
    }

    /// Ordered children of a rule node; empty for terminals.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes.get(id.0) {
            Some(NodeData::Rule { children, .. }) => children,
            _ => &[],
        }
    }

    /// Byte span of a node: the token span for terminals, the union of the
    /// children's spans for rule nodes. `None` for rule nodes without any
    /// terminal beneath them.
    pub fn span(&self, id: NodeId) -> Option<Span> {
        match self.nodes.get(id.0)? {
            NodeData::Terminal { token, .. } => Some(Span {
                start: token.start,
                stop: token.stop,
            }),
            NodeData::Rule { children, .. } => {
                let mut result: Option<Span> = None;
                for child in children {
                    if let Some(span) = self.span(*child) {
                        result = Some(match result {
                            None => span,
                            Some(acc) => Span {
                                start: acc.start.min(span.start),
                                stop: acc.stop.max(span.stop),
                            },
                        });
                    }
                }
                result
            }
        }
    }

    /// Leftmost terminal token beneath a node (the node's own token for
    /// terminals).
    pub fn first_token(&self, id: NodeId) -> Option<&Token> {
        match self.nodes.get(id.0)? {
            NodeData::Terminal { token, .. } => Some(token),
            NodeData::Rule { children, .. } => {
                children.iter().find_map(|child| self.first_token(*child))
            }
        }
    }

    /// Concatenated text of all terminals beneath a node, in document order.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0] {
            NodeData::Terminal { token, .. } => out.push_str(&token.text),
            NodeData::Rule { children, .. } => {
                for child in children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Attach a parentless node as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none(), "child must be detached");
        match &mut self.nodes[child.0] {
            NodeData::Rule { parent: p, .. } => *p = Some(parent),
            NodeData::Terminal { parent: p, .. } => *p = Some(parent),
        }
        self.child_list_mut(parent).push(child);
    }

    /// Detach `child` (by identity) from `parent`'s children.
    ///
    /// The node stays in the arena but becomes unreachable from its former
    /// parent. Returns false if `child` is not a direct child of `parent`.
    pub(crate) fn detach_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = match &mut self.nodes[parent.0] {
            NodeData::Rule { children, .. } => children,
            NodeData::Terminal { .. } => return false,
        };
        let Some(pos) = children.iter().position(|c| *c == child) else {
            return false;
        };
        children.remove(pos);
        match &mut self.nodes[child.0] {
            NodeData::Rule { parent: p, .. } => *p = None,
            NodeData::Terminal { parent: p, .. } => *p = None,
        }
        true
    }

    /// Copy another tree's nodes into this arena and attach its root as the
    /// last child of `onto`. Returns the id of the copied root.
    pub(crate) fn graft(&mut self, other: ParseTree, onto: NodeId) -> NodeId {
        let base = self.nodes.len();
        let other_root = other.root;
        for node in other.nodes {
            let remapped = match node {
                NodeData::Rule {
                    kind,
                    label,
                    parent,
                    children,
                } => NodeData::Rule {
                    kind,
                    label,
                    parent: parent.map(|p| NodeId(p.0 + base)),
                    children: children.into_iter().map(|c| NodeId(c.0 + base)).collect(),
                },
                NodeData::Terminal { parent, token } => NodeData::Terminal {
                    parent: parent.map(|p| NodeId(p.0 + base)),
                    token,
                },
            };
            self.nodes.push(remapped);
        }
        let new_root = NodeId(other_root.0 + base);
        self.append_child(onto, new_root);
        new_root
    }

    /// Approximate heap residency of the arena, used for metrics only.
    pub(crate) fn storage_bytes(&self) -> usize {
        self.nodes.len() * std::mem::size_of::<NodeData>()
            + self
                .nodes
                .iter()
                .map(|n| match n {
                    NodeData::Rule { children, .. } => {
                        children.len() * std::mem::size_of::<NodeId>()
                    }
                    NodeData::Terminal { token, .. } => token.text.len(),
                })
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::tokens::{Channel, TokenKind};

    fn token(text: &str, start: usize) -> Token {
        Token {
            kind: TokenKind::Identifier,
            text: text.to_string(),
            start,
            stop: start + text.len(),
            line: 1,
            column: start,
            channel: Channel::Default,
        }
    }

    #[test]
    fn test_span_is_union_of_children() {
        let mut tree = ParseTree::with_root(RuleKind::File);
        let stmt = tree.push_rule(tree.root(), RuleKind::Statement, None);
        tree.push_terminal(stmt, token("select", 0));
        tree.push_terminal(stmt, token("dual", 10));
        assert_eq!(tree.span(stmt), Some(Span { start: 0, stop: 14 }));
        assert_eq!(tree.span(tree.root()), Some(Span { start: 0, stop: 14 }));
    }

    #[test]
    fn test_detach_by_identity() {
        let mut tree = ParseTree::with_root(RuleKind::File);
        let stmt = tree.push_rule(tree.root(), RuleKind::Statement, None);
        let lit = tree.push_rule(stmt, RuleKind::Literal, Some(AltLabel::SimpleString));
        tree.push_terminal(lit, token("'x'", 0));
        assert!(tree.detach_child(stmt, lit));
        assert!(tree.children(stmt).is_empty());
        assert_eq!(tree.parent(lit), None);
        // a second detach of the same node is a no-op
        assert!(!tree.detach_child(stmt, lit));
    }

    #[test]
    fn test_graft_remaps_and_attaches() {
        let mut host = ParseTree::with_root(RuleKind::File);
        let stmt = host.push_rule(host.root(), RuleKind::Statement, None);
        host.push_terminal(stmt, token("do", 0));

        let mut sub = ParseTree::with_root(RuleKind::EmbeddedSqlBody);
        let inner = sub.push_rule(sub.root(), RuleKind::Statement, None);
        sub.push_terminal(inner, token("select", 5));

        let new_root = host.graft(sub, stmt);
        assert_eq!(host.kind(new_root), Some(RuleKind::EmbeddedSqlBody));
        assert_eq!(host.parent(new_root), Some(stmt));
        let grafted_stmt = host.children(new_root)[0];
        assert_eq!(host.kind(grafted_stmt), Some(RuleKind::Statement));
        assert_eq!(host.text(grafted_stmt), "select");
    }

    #[test]
    fn test_label_lookup() {
        assert_eq!(AltLabel::DollarIdentifierString.name(), "dollarIdentifierString");
        assert_eq!(AltLabel::BodyOption.name(), "bodyOption");
    }
}

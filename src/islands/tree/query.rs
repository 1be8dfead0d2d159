//! Abstraction-aware navigation over parse trees
//!
//! Grammar composability produces wrapper nodes: rule nodes with exactly one
//! rule child covering the identical span. The operations here treat those
//! wrappers as non-existent, so callers navigate between the nodes that
//! actually carry structure. All operations are pure traversals over a
//! finite acyclic tree; the only "failure" is a not-found result.

use crate::islands::tree::{NodeId, ParseTree, RuleKind};

/// All descendants of `from` whose shape is in `kinds`, in document order.
///
/// The start node itself is not part of the result, matching the search
/// semantics used during embedded-code discovery.
pub fn find_all(tree: &ParseTree, from: NodeId, kinds: &[RuleKind]) -> Vec<NodeId> {
    let mut result = Vec::new();
    for child in tree.children(from) {
        collect(tree, *child, kinds, &mut result);
    }
    result
}

fn collect(tree: &ParseTree, id: NodeId, kinds: &[RuleKind], result: &mut Vec<NodeId>) {
    if let Some(kind) = tree.kind(id) {
        if kinds.contains(&kind) {
            result.push(id);
        }
    }
    for child in tree.children(id) {
        collect(tree, *child, kinds, result);
    }
}

/// Whether a node is a wrapper: a rule node with exactly one rule child
/// covering the identical span.
pub fn is_wrapper(tree: &ParseTree, id: NodeId) -> bool {
    if !tree.is_rule(id) {
        return false;
    }
    let children = tree.children(id);
    if children.len() != 1 {
        return false;
    }
    let child = children[0];
    tree.is_rule(child) && tree.span(child) == tree.span(id)
}

/// Climb to the highest ancestor that covers the same tokens as `id`.
pub fn most_abstract(tree: &ParseTree, id: NodeId) -> NodeId {
    if !tree.is_rule(id) {
        return id;
    }
    let mut current = id;
    while let Some(parent) = tree.parent(current) {
        if is_wrapper(tree, parent) {
            current = parent;
        } else {
            break;
        }
    }
    current
}

/// Descend through wrapper chains to the first node that carries structure.
pub fn most_concrete(tree: &ParseTree, id: NodeId) -> NodeId {
    let mut current = id;
    while is_wrapper(tree, current) {
        current = tree.children(current)[0];
    }
    current
}

/// Previous sibling of `id`, with wrappers treated as non-existent.
///
/// Returns the most concrete form of the sibling; `None` if `id` is the
/// first child or has no parent.
pub fn previous_sibling(tree: &ParseTree, id: NodeId) -> Option<NodeId> {
    let node = most_abstract(tree, id);
    let parent = tree.parent(node)?;
    let mut previous = None;
    for child in tree.children(parent) {
        if *child == node {
            return previous.map(|p| most_concrete(tree, p));
        }
        previous = Some(*child);
    }
    None
}

/// Next sibling of `id`, with wrappers treated as non-existent.
///
/// Returns the most concrete form of the sibling; `None` if `id` is the
/// last child or has no parent.
pub fn next_sibling(tree: &ParseTree, id: NodeId) -> Option<NodeId> {
    let node = most_abstract(tree, id);
    let parent = tree.parent(node)?;
    let mut next = None;
    for child in tree.children(parent).iter().rev() {
        if *child == node {
            return next.map(|n| most_concrete(tree, n));
        }
        next = Some(*child);
    }
    None
}

/// All concrete siblings of `id` with the given shape, in document order,
/// the start node included when it matches.
pub fn siblings_of_kind(tree: &ParseTree, id: NodeId, kind: RuleKind) -> Vec<NodeId> {
    let node = most_abstract(tree, id);
    let Some(parent) = tree.parent(node) else {
        return Vec::new();
    };
    tree.children(parent)
        .iter()
        .map(|child| most_concrete(tree, *child))
        .filter(|child| tree.kind(*child) == Some(kind))
        .collect()
}

/// Nearest strict ancestor of `id` with the given shape.
pub fn container_of_kind(tree: &ParseTree, id: NodeId, kind: RuleKind) -> Option<NodeId> {
    let mut current = tree.parent(id);
    while let Some(node) = current {
        if tree.kind(node) == Some(kind) {
            return Some(node);
        }
        current = tree.parent(node);
    }
    None
}

/// Label name of the node's alternative, if its alternative is named.
pub fn label_of(tree: &ParseTree, id: NodeId) -> Option<&'static str> {
    tree.label(id).map(|label| label.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::tokens::{Channel, Token, TokenKind};
    use crate::islands::tree::AltLabel;

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

    /// file
    ///   statement
    ///     expression (wrapper)
    ///       sqlName
    ///         "a"
    ///     literal:simpleString
    ///       "'x'"
    fn sample_tree() -> (ParseTree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = ParseTree::with_root(RuleKind::File);
        let stmt = tree.push_rule(tree.root(), RuleKind::Statement, None);
        let expr = tree.push_rule(stmt, RuleKind::Expression, None);
        let name = tree.push_rule(expr, RuleKind::SqlName, None);
        tree.push_terminal(name, token("a", 0));
        let lit = tree.push_rule(stmt, RuleKind::Literal, Some(AltLabel::SimpleString));
        tree.push_terminal(lit, token("'x'", 2));
        (tree, stmt, expr, name, lit)
    }

    #[test]
    fn test_wrapper_detection() {
        let (tree, stmt, expr, name, _) = sample_tree();
        assert!(is_wrapper(&tree, expr));
        assert!(!is_wrapper(&tree, name)); // child is a terminal
        assert!(!is_wrapper(&tree, stmt)); // two children
    }

    #[test]
    fn test_most_abstract_and_concrete() {
        let (tree, _, expr, name, _) = sample_tree();
        assert_eq!(most_abstract(&tree, name), expr);
        assert_eq!(most_concrete(&tree, expr), name);
        // round trip law
        assert_eq!(
            most_concrete(&tree, most_abstract(&tree, name)),
            most_concrete(&tree, name)
        );
    }

    #[test]
    fn test_siblings_skip_wrappers() {
        let (tree, _, expr, name, lit) = sample_tree();
        // navigating from the wrapped name reaches the literal directly
        assert_eq!(next_sibling(&tree, name), Some(lit));
        assert_eq!(previous_sibling(&tree, lit), Some(name));
        assert_eq!(previous_sibling(&tree, name), None);
        assert_eq!(next_sibling(&tree, lit), None);
        assert_eq!(siblings_of_kind(&tree, name, RuleKind::Literal), vec![lit]);
        // the wrapper itself is never returned
        assert_ne!(previous_sibling(&tree, lit), Some(expr));
    }

    #[test]
    fn test_container_and_find_all() {
        let (tree, stmt, _, name, lit) = sample_tree();
        assert_eq!(container_of_kind(&tree, name, RuleKind::Statement), Some(stmt));
        assert_eq!(container_of_kind(&tree, stmt, RuleKind::Statement), None);
        assert_eq!(find_all(&tree, tree.root(), &[RuleKind::Literal]), vec![lit]);
        // start node is excluded from its own result
        assert_eq!(find_all(&tree, lit, &[RuleKind::Literal]), Vec::new());
    }

    #[test]
    fn test_label_of() {
        let (tree, stmt, _, _, lit) = sample_tree();
        assert_eq!(label_of(&tree, lit), Some("simpleString"));
        assert_eq!(label_of(&tree, stmt), None);
    }
}

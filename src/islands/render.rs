//! Plain-text tree rendering for debugging and CLI output.

use crate::islands::tree::{NodeId, ParseTree, RuleKind};

fn rule_name(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::File => "file",
        RuleKind::Statement => "statement",
        RuleKind::AnonymousBlock => "anonymousBlock",
        RuleKind::FunctionDefinition => "functionDefinition",
        RuleKind::ProcedureDefinition => "procedureDefinition",
        RuleKind::RoutineOption => "routineOption",
        RuleKind::Expression => "expression",
        RuleKind::SqlName => "sqlName",
        RuleKind::Literal => "literal",
        RuleKind::EmbeddedSqlBody => "embeddedSqlBody",
        RuleKind::EmbeddedProceduralBody => "embeddedProceduralBody",
    }
}

/// Indented dump of a tree, one node per line.
///
/// Rule nodes print as `name` or `name:label`, terminals as the token text
/// with its kind. The EOF sentinel prints as `<EOF>`.
pub fn tree_text(tree: &ParseTree) -> String {
    let mut out = String::new();
    render(tree, tree.root(), 0, &mut out);
    out
}

fn render(tree: &ParseTree, id: NodeId, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    if let Some(kind) = tree.kind(id) {
        out.push_str(rule_name(kind));
        if let Some(label) = tree.label(id) {
            out.push(':');
            out.push_str(label.name());
        }
        out.push('\n');
        for child in tree.children(id) {
            render(tree, *child, depth + 1, out);
        }
    } else if let Some(token) = tree.token(id) {
        if token.is_eof() {
            out.push_str("<EOF>\n");
        } else {
            out.push_str(&format!("{} [{:?}]\n", token.text, token.kind));
        }
    }
}

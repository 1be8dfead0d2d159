//! Embedded code resolution
//!
//! `do` blocks and routine definitions carry their body as a string literal.
//! Resolution decodes the literal, re-lexes it pinned to the literal's
//! source position and parses it with the start symbol of the named
//! language, then grafts the resulting subtree as an additional child of the
//! site node, the block or routine definition carrying the literal. One
//! level only: grafted subtrees are not searched for further embedded code.
//!
//! Resolution is per-site: a site that does not match the expected shape, or
//! names a language without a start symbol, is skipped silently and the
//! remaining sites are still resolved.

use crate::islands::dialect::Dialect;
use crate::islands::document::DocumentOptions;
use crate::islands::engine::{GrammarEngine, Pin, StartSymbol};
use crate::islands::error::SyntaxErrorEntry;
use crate::islands::literal::{content_start_offset, decoded_text, language_name};
use crate::islands::tree::{query, NodeId, ParseTree, RuleKind};

/// Resolve all embedded-code sites of a freshly parsed tree in place.
///
/// Syntax faults inside embedded bodies are recorded into `errors` with the
/// embedded token positions, which are pinned to the host source.
pub(crate) fn resolve_embedded_code(
    tree: &mut ParseTree,
    engine: &GrammarEngine,
    options: &DocumentOptions,
    errors: &mut Vec<SyntaxErrorEntry>,
) {
    let sites = query::find_all(
        tree,
        tree.root(),
        &[
            RuleKind::AnonymousBlock,
            RuleKind::FunctionDefinition,
            RuleKind::ProcedureDefinition,
        ],
    );
    for site in sites {
        resolve_site(tree, engine, options, site, errors);
    }
}

/// The literal holding the body and the expression naming the language,
/// when the site has the expected shape.
fn site_parts(tree: &ParseTree, site: NodeId) -> Option<(NodeId, Option<NodeId>)> {
    match tree.kind(site)? {
        RuleKind::AnonymousBlock => {
            let literals: Vec<NodeId> = tree
                .children(site)
                .iter()
                .copied()
                .filter(|c| tree.kind(*c) == Some(RuleKind::Literal))
                .collect();
            // exactly one direct body literal, anything else is not a
            // resolvable block
            if literals.len() != 1 {
                return None;
            }
            let language = tree
                .children(site)
                .iter()
                .copied()
                .find(|c| tree.kind(*c) == Some(RuleKind::Expression));
            Some((literals[0], language))
        }
        RuleKind::FunctionDefinition | RuleKind::ProcedureDefinition => {
            let options = query::find_all(tree, site, &[RuleKind::RoutineOption]);
            let body = options.iter().find_map(|option| {
                tree.children(*option)
                    .iter()
                    .copied()
                    .map(|c| query::most_concrete(tree, c))
                    .find(|c| tree.kind(*c) == Some(RuleKind::Literal))
            })?;
            let language = options.iter().find_map(|option| {
                tree.children(*option)
                    .iter()
                    .copied()
                    .find(|c| tree.kind(*c) == Some(RuleKind::Expression))
            });
            Some((body, language))
        }
        _ => None,
    }
}

fn start_symbol_for(language: &str) -> Option<StartSymbol> {
    match language {
        "sql" => Some(StartSymbol::EmbeddedSqlBody),
        "plpgsql" => Some(StartSymbol::EmbeddedProceduralBody),
        _ => None,
    }
}

fn resolve_site(
    tree: &mut ParseTree,
    engine: &GrammarEngine,
    options: &DocumentOptions,
    site: NodeId,
    errors: &mut Vec<SyntaxErrorEntry>,
) -> Option<()> {
    let (literal, language_expr) = site_parts(tree, site)?;
    let start = start_symbol_for(&language_name(tree, language_expr))?;
    let body = decoded_text(tree, literal);
    let offset = content_start_offset(tree, literal);
    let first = tree.first_token(literal)?;
    let pin = Pin {
        line: first.line,
        column: first.column + offset,
        offset: first.start + offset,
    };
    let stream = engine.tokenize_pinned(&body, pin, errors);
    let (subtree, _) = engine.parse(&stream, start, false, errors);
    // an empty body parses to the EOF sentinel alone; nothing to graft
    if tree.children(subtree.root()).len() <= 1 {
        return Some(());
    }
    let grafted = tree.graft(subtree, site);
    // the sentinel is an artifact of the embedded parse, not host content
    if let Some(last) = tree.children(grafted).last().copied() {
        if tree.token(last).is_some_and(|t| t.is_eof()) {
            tree.detach_child(grafted, last);
        }
    }
    if options.remove_embedded_literal {
        if let Some(parent) = tree.parent(literal) {
            tree.detach_child(parent, literal);
        }
    }
    Some(())
}

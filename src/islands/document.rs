//! Document assembly
//!
//! A document is the result of running the whole pipeline over one source
//! text: dialect detection, lexing, scope classification, parsing and
//! embedded-code resolution. Assembly is infallible; everything that can go
//! wrong ends up in the document's fault list instead of an error return, so
//! a document with positions, tokens and a tree always comes back.

use crate::islands::dialect::Dialect;
use crate::islands::embed;
use crate::islands::engine::{GrammarEngine, StartSymbol};
use crate::islands::error::SyntaxErrorEntry;
use crate::islands::metrics::{LexerMetrics, ParserMetrics};
use crate::islands::scope;
use crate::islands::tokens::TokenStream;
use crate::islands::tree::{query, NodeId, ParseTree, RuleKind};
use std::time::Instant;

/// Pipeline options, fixed for the lifetime of a document.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Classify scope and hide out-of-scope tokens before parsing.
    pub hide_out_of_scope_tokens: bool,
    /// Dialect override; auto-detected from the text when absent.
    pub dialect: Option<Dialect>,
    /// Gather per-rule profiling rows during the parse.
    pub profile: bool,
    /// Resolve embedded code into grafted subtrees.
    pub embed_subtrees: bool,
    /// Detach the body literal of successfully resolved embedded code.
    pub remove_embedded_literal: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            hide_out_of_scope_tokens: true,
            dialect: None,
            profile: false,
            embed_subtrees: true,
            remove_embedded_literal: false,
        }
    }
}

/// A fully processed source text.
pub struct Document {
    dialect: Dialect,
    tokens: TokenStream,
    tree: ParseTree,
    syntax_errors: Vec<SyntaxErrorEntry>,
    lexer_metrics: Option<LexerMetrics>,
    parser_metrics: ParserMetrics,
}

impl Document {
    /// Run the pipeline over `sql` with default options.
    pub fn parse(sql: &str) -> Document {
        Document::build(sql, &DocumentOptions::default())
    }

    /// Run the pipeline over `sql`.
    pub fn build(sql: &str, options: &DocumentOptions) -> Document {
        let dialect = options.dialect.unwrap_or_else(|| Dialect::detect(sql));
        let engine = GrammarEngine::new(dialect);
        let mut syntax_errors = Vec::new();

        let lex_started = Instant::now();
        let mut tokens = engine.tokenize(sql, &mut syntax_errors);
        let lex_time = lex_started.elapsed();
        let lex_memory = tokens.storage_bytes();

        let lexer_metrics = if options.hide_out_of_scope_tokens {
            let (scope_time, scope_memory) =
                scope::hide_out_of_scope_tokens(&mut tokens, sql, dialect, &mut syntax_errors);
            Some(LexerMetrics {
                scope_time,
                scope_memory,
                time: lex_time,
                memory: lex_memory,
            })
        } else {
            Some(LexerMetrics {
                scope_time: Default::default(),
                scope_memory: 0,
                time: lex_time,
                memory: lex_memory,
            })
        };

        let parse_started = Instant::now();
        let (mut tree, profile) = engine.parse(
            &tokens,
            StartSymbol::File,
            options.profile,
            &mut syntax_errors,
        );
        if options.embed_subtrees && dialect.supports_embedding() {
            embed::resolve_embedded_code(&mut tree, &engine, options, &mut syntax_errors);
        }
        let parser_metrics = ParserMetrics {
            time: parse_started.elapsed(),
            memory: tree.storage_bytes(),
            profile,
        };

        Document {
            dialect,
            tokens,
            tree,
            syntax_errors,
            lexer_metrics,
            parser_metrics,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The classified token stream, hidden tokens and EOF sentinel included.
    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn tree(&self) -> &ParseTree {
        &self.tree
    }

    /// All faults gathered across the pipeline phases, in discovery order.
    pub fn syntax_errors(&self) -> &[SyntaxErrorEntry] {
        &self.syntax_errors
    }

    pub fn lexer_metrics(&self) -> Option<&LexerMetrics> {
        self.lexer_metrics.as_ref()
    }

    pub fn parser_metrics(&self) -> &ParserMetrics {
        &self.parser_metrics
    }

    /// All nodes of the given shapes beneath the root, in document order.
    pub fn find_all(&self, kinds: &[RuleKind]) -> Vec<NodeId> {
        query::find_all(&self.tree, self.tree.root(), kinds)
    }
}

//! Reference grammar engine
//!
//! This module implements the engine contract the rest of the pipeline is
//! written against: `tokenize` turns a character stream into a channel-tagged
//! token stream, `parse` turns a token stream and a start symbol into a parse
//! tree. The island grammar is deliberately permissive: it recognizes the
//! statement shapes the pipeline cares about (`do`, `create function`,
//! `create procedure`, generic statements) and recovers from anything else by
//! consuming up to the statement terminator, so a well-formed tree is always
//! produced.
//!
//! Nothing outside this module depends on how the engine is implemented;
//! the scope classifier, literal decoder, resolver and document assembler
//! consume only tokens, trees and error entries.

pub mod lexer;
pub mod parser;

pub use lexer::Pin;
pub use parser::StartSymbol;

use crate::islands::dialect::Dialect;
use crate::islands::error::SyntaxErrorEntry;
use crate::islands::metrics::ParseProfile;
use crate::islands::tokens::TokenStream;
use crate::islands::tree::ParseTree;

/// A lexer/parser pair for one dialect.
///
/// One engine instance is reused sequentially during embedded-code
/// resolution (stream swapped, not parallelized); it must not be shared
/// across concurrent builds without external locking.
pub struct GrammarEngine {
    dialect: Dialect,
}

impl GrammarEngine {
    pub fn new(dialect: Dialect) -> GrammarEngine {
        GrammarEngine { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Tokenize a character stream. Faults are recorded into `errors` and
    /// lexing continues fail-open; the result always covers the whole input
    /// and ends with an EOF sentinel.
    pub fn tokenize(&self, text: &str, errors: &mut Vec<SyntaxErrorEntry>) -> TokenStream {
        lexer::tokenize(text, Pin::default(), errors)
    }

    /// Tokenize with the stream's starting line/column/offset pinned, so
    /// every token of re-lexed embedded code carries source-accurate
    /// coordinates.
    pub fn tokenize_pinned(
        &self,
        text: &str,
        pin: Pin,
        errors: &mut Vec<SyntaxErrorEntry>,
    ) -> TokenStream {
        lexer::tokenize(text, pin, errors)
    }

    /// Parse the default-channel tokens of a stream from a start symbol.
    ///
    /// Never fails: unrecognized input is consumed into error-labeled
    /// statement nodes and reported into `errors`.
    pub fn parse(
        &self,
        stream: &TokenStream,
        start: StartSymbol,
        profile: bool,
        errors: &mut Vec<SyntaxErrorEntry>,
    ) -> (ParseTree, Option<ParseProfile>) {
        parser::parse(stream, start, self.dialect, profile, errors)
    }
}

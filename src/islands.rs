//! Core modules for island-SQL extraction and parsing
//!
//! The pipeline runs in one direction:
//! text → dialect selection → main tokenization → (optional) scope
//! classification → parse → (optional, dialect-gated) embedded-code
//! resolution → immutable [`document::Document`].
//!
//! ## Modules
//!
//! - `dialect` - dialect enum and content-based detection
//! - `tokens` - channel-tagged tokens and the token stream
//! - `engine` - reference grammar engine (logos lexer + statement parser)
//! - `scope` - dual-pass scope classifier and scope projection
//! - `tree` - arena parse tree and wrapper-aware navigation
//! - `literal` - literal decoding and body-language resolution
//! - `embed` - embedded-code discovery, re-parse and splice
//! - `document` - document assembly and configuration
//! - `error` - phase-tagged syntax error entries
//! - `metrics` - lexer/parser metrics and the profile report
//! - `cache` - flush controls for shared memoization
//! - `render` - hierarchical parse-tree text dump

pub mod cache;
pub mod dialect;
pub mod document;
pub mod embed;
pub mod engine;
pub mod error;
pub mod literal;
pub mod metrics;
pub mod render;
pub mod scope;
pub mod tokens;
pub mod tree;

// Re-export commonly used types at module root
pub use dialect::Dialect;
pub use document::{Document, DocumentOptions};
pub use error::{ErrorPhase, SyntaxErrorEntry};
pub use metrics::{LexerMetrics, ParserMetrics};
pub use tokens::{Channel, Token, TokenKind, TokenStream};
pub use tree::{AltLabel, NodeId, ParseTree, RuleKind};

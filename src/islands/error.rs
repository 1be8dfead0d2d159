//! Phase-tagged syntax error entries
//!
//! Building a document never fails for malformed input; faults from the
//! scanning passes and recoverable errors from the parser are collected into
//! an ordered list instead. The phase tag identifies which pass produced an
//! entry, which is what makes lexer issues diagnosable at all once the
//! parser's own recovery kicks in downstream.

use serde::Serialize;
use std::fmt;

/// The pass that produced a syntax error entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorPhase {
    /// The dedicated scope scanning pass.
    ScopeLexer,
    /// The main lexer.
    Lexer,
    /// The statement parser.
    Parser,
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPhase::ScopeLexer => write!(f, "scope-lexer"),
            ErrorPhase::Lexer => write!(f, "lexer"),
            ErrorPhase::Parser => write!(f, "parser"),
        }
    }
}

/// One recorded syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxErrorEntry {
    /// 1-based line of the offending position.
    pub line: usize,
    /// 0-based character position within the line.
    pub column: usize,
    /// Human-readable message.
    pub message: String,
    /// Pass that produced the entry.
    pub phase: ErrorPhase,
}

impl SyntaxErrorEntry {
    pub fn new(line: usize, column: usize, message: impl Into<String>, phase: ErrorPhase) -> Self {
        SyntaxErrorEntry {
            line,
            column,
            message: message.into(),
            phase,
        }
    }
}

impl fmt::Display for SyntaxErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}:{} {} ({})",
            self.line, self.column, self.message, self.phase
        )
    }
}

//! Scope classifier
//!
//! Island text is interleaved with arbitrary host text (client-tool
//! commands, prose, anything) that must be excluded from grammar matching
//! while every character's original line/column stays reconstructable. A
//! dedicated lightweight scanning pass groups the input into island and
//! water spans; the main lexer's tokens are then merged against those spans
//! by a single forward sweep over byte offsets, forcing out-of-scope tokens
//! onto the hidden channel. Hiding is monotonic: a token the main lexer
//! already hid is never un-hidden, and repeated classification is idempotent.
//!
//! Both passes fail open. If the scope scanner cannot reach end-of-input the
//! fault is recorded with its phase tag and classification continues with
//! the spans produced so far; positions beyond the last scanned span are
//! left unclassified for the parser's own recovery to deal with.

use crate::islands::dialect::Dialect;
use crate::islands::engine::lexer::{
    block_comment_len, dollar_quoted_len, quote_delimited_len, quoted_body_len, PositionIndex,
};
use crate::islands::error::{ErrorPhase, SyntaxErrorEntry};
use crate::islands::tokens::{Channel, TokenKind, TokenStream};
use logos::{Lexer, Logos};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Keywords that can start an island statement.
const STARTER_WORDS: &[&str] = &[
    "begin", "call", "create", "declare", "delete", "do", "explain", "insert", "lock", "merge",
    "select", "update", "with",
];

/// Lazily built starter lookup table, shared by all classifier invocations.
/// Flushable via [`crate::islands::cache::flush_classifier_cache`].
static STARTER_TABLE: Lazy<Mutex<Option<Arc<HashSet<&'static str>>>>> =
    Lazy::new(|| Mutex::new(None));

fn starter_table() -> Arc<HashSet<&'static str>> {
    let mut guard = STARTER_TABLE.lock().unwrap_or_else(|e| e.into_inner());
    guard
        .get_or_insert_with(|| Arc::new(STARTER_WORDS.iter().copied().collect()))
        .clone()
}

/// Drop the starter lookup table; it is rebuilt on the next classification.
pub(crate) fn flush_scope_table() {
    let mut guard = STARTER_TABLE.lock().unwrap_or_else(|e| e.into_inner());
    *guard = None;
}

fn scope_block_comment(lex: &mut Lexer<ScopeRaw>) -> bool {
    match block_comment_len(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn scope_dollar_quoted(lex: &mut Lexer<ScopeRaw>) -> bool {
    let closer = lex.slice().to_owned();
    match dollar_quoted_len(&closer, lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn scope_quote_delimited(lex: &mut Lexer<ScopeRaw>) -> bool {
    match quote_delimited_len(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn scope_unicode_quoted(lex: &mut Lexer<ScopeRaw>) -> bool {
    match quoted_body_len(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

/// Coarse token set of the scope scanning pass. Strings and comments are
/// consumed as single units so terminators inside them cannot end an island.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeRaw {
    #[regex(r"[ \t]+")]
    Blank,
    #[regex(r"\r?\n")]
    Newline,
    #[regex(r"--[^\n]*")]
    LineComment,
    #[token("/*", scope_block_comment)]
    BlockComment,
    #[regex(r"[nN][qQ]'", scope_quote_delimited)]
    NationalQuoteDelimited,
    #[regex(r"[qQ]'", scope_quote_delimited)]
    QuoteDelimited,
    #[regex(r"[nN]'([^']|'')*'")]
    NationalQuoted,
    #[regex(r"[eE]'([^'\\]|\\.|'')*'")]
    EscapedQuoted,
    // scanned like the q'...' forms, matching the main lexer's rule
    #[regex(r"[uU]&'", scope_unicode_quoted)]
    UnicodeQuoted,
    #[regex(r"'([^']|'')*'")]
    Quoted,
    #[regex(r"\$([A-Za-z_][A-Za-z0-9_]*)?\$", scope_dollar_quoted)]
    DollarQuoted,
    #[regex(r#""([^"]|"")*""#)]
    QuotedIdentifier,
    #[regex(r"[A-Za-z_][A-Za-z0-9_$#]*")]
    Word,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[regex(r".", priority = 0)]
    Other,
}

/// One classified region of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeSpan {
    pub start: usize,
    pub stop: usize,
    pub channel: Channel,
}

fn is_significant(raw: ScopeRaw) -> bool {
    !matches!(
        raw,
        ScopeRaw::Blank | ScopeRaw::Newline | ScopeRaw::LineComment | ScopeRaw::BlockComment
    )
}

/// `create` starts an island only for routine definitions.
fn create_starts_island(tokens: &[(ScopeRaw, Range<usize>, String)], index: usize) -> bool {
    let mut words = tokens[index + 1..]
        .iter()
        .filter(|(raw, _, _)| is_significant(*raw));
    let Some((ScopeRaw::Word, _, first)) = words.next().map(|t| (t.0, &t.1, t.2.to_lowercase()))
    else {
        return false;
    };
    let target = if first == "or" {
        match words.next().map(|t| (t.0, t.2.to_lowercase())) {
            Some((ScopeRaw::Word, word)) if word == "replace" => {}
            _ => return false,
        }
        match words.next().map(|t| (t.0, t.2.to_lowercase())) {
            Some((ScopeRaw::Word, word)) => word,
            _ => return false,
        }
    } else {
        first
    };
    target == "function" || target == "procedure"
}

fn is_slash_line(tokens: &[(ScopeRaw, Range<usize>, String)], index: usize) -> bool {
    if tokens[index].0 != ScopeRaw::Slash {
        return false;
    }
    let at_line_start = index == 0 || tokens[index - 1].0 == ScopeRaw::Newline;
    let at_line_end = index + 1 >= tokens.len() || tokens[index + 1].0 == ScopeRaw::Newline;
    at_line_start && at_line_end
}

/// Scan the input into island/water spans.
///
/// Returns the spans plus whether the scanner reached end-of-input. On a
/// fault the error is recorded with phase [`ErrorPhase::ScopeLexer`] and the
/// spans produced so far are returned.
pub(crate) fn scan_scope(
    text: &str,
    dialect: Dialect,
    errors: &mut Vec<SyntaxErrorEntry>,
) -> (Vec<ScopeSpan>, bool) {
    let starters = starter_table();
    let index = PositionIndex::new(text);
    let mut tokens: Vec<(ScopeRaw, Range<usize>, String)> = Vec::new();
    let mut reached_eof = true;
    let mut lexer = ScopeRaw::lexer(text);
    while let Some(result) = lexer.next() {
        match result {
            Ok(raw) => tokens.push((raw, lexer.span(), lexer.slice().to_string())),
            Err(()) => {
                let span = lexer.span();
                let (line0, column) = index.position(text, span.start);
                let offending: String = text[span.start..].chars().take(16).collect();
                errors.push(SyntaxErrorEntry::new(
                    line0 + 1,
                    column,
                    format!("token recognition error at: '{offending}'"),
                    ErrorPhase::ScopeLexer,
                ));
                reached_eof = false;
                break;
            }
        }
    }
    let scanned_end = tokens.last().map(|(_, r, _)| r.end).unwrap_or(0);

    let mut spans: Vec<ScopeSpan> = Vec::new();
    let mut cursor = 0;
    let mut i = 0;
    while i < tokens.len() {
        let (raw, range, slice) = &tokens[i];
        let lower = slice.to_lowercase();
        let starts_island = *raw == ScopeRaw::Word
            && starters.contains(lower.as_str())
            && (lower != "create" || create_starts_island(&tokens, i));
        if !starts_island {
            i += 1;
            continue;
        }
        if range.start > cursor {
            spans.push(ScopeSpan {
                start: cursor,
                stop: range.start,
                channel: Channel::Hidden,
            });
        }
        // procedural islands in Oracle scripts run to the slash line, so a
        // semicolon inside the body does not end them
        let procedural = dialect == Dialect::OracleDb
            && matches!(lower.as_str(), "begin" | "declare" | "create");
        let mut end = scanned_end;
        let mut next = tokens.len();
        let mut j = i + 1;
        while j < tokens.len() {
            let terminated = (!procedural && tokens[j].0 == ScopeRaw::Semicolon)
                || (dialect == Dialect::OracleDb && is_slash_line(&tokens, j));
            if terminated {
                end = tokens[j].1.end;
                next = j + 1;
                break;
            }
            j += 1;
        }
        spans.push(ScopeSpan {
            start: range.start,
            stop: end,
            channel: Channel::Default,
        });
        cursor = end;
        i = next;
    }
    if reached_eof && cursor < text.len() {
        spans.push(ScopeSpan {
            start: cursor,
            stop: text.len(),
            channel: Channel::Hidden,
        });
    }
    (spans, reached_eof)
}

/// Put all main-stream tokens that are out of the island scope on the
/// hidden channel.
///
/// Single forward sweep: for each main token, the span cursor advances while
/// the span's end precedes the token's start; the token is hidden if the
/// aligned span is water. When the scope pass faulted before end-of-input,
/// tokens beyond the last span are left unclassified. Returns the scope
/// pass's duration and storage bytes.
pub(crate) fn hide_out_of_scope_tokens(
    stream: &mut TokenStream,
    text: &str,
    dialect: Dialect,
    errors: &mut Vec<SyntaxErrorEntry>,
) -> (Duration, usize) {
    let scope_start = Instant::now();
    let (spans, reached_eof) = scan_scope(text, dialect, errors);
    let scope_memory = spans.len() * std::mem::size_of::<ScopeSpan>();
    let mut i = 0;
    for token in stream.tokens_mut() {
        if token.kind == TokenKind::Eof {
            continue;
        }
        while i < spans.len() && spans[i].stop <= token.start {
            i += 1;
        }
        let hide = match spans.get(i) {
            Some(span) => span.channel == Channel::Hidden,
            // past the last span: water when the scanner saw the whole
            // input, unclassified (left as-is) after a fault
            None => {
                if reached_eof {
                    true
                } else {
                    break;
                }
            }
        };
        if hide && token.channel != Channel::Hidden {
            token.channel = Channel::Hidden;
        }
    }
    (scope_start.elapsed(), scope_memory)
}

/// Render only the in-scope text of a classified stream.
///
/// Default-channel content is copied verbatim; every hidden character is
/// replaced with a blank except tab, carriage return, newline and space, so
/// line numbers and column alignment are preserved for debugging output.
pub fn project_scope(stream: &TokenStream) -> String {
    let mut out = String::new();
    for token in stream.tokens() {
        if token.kind == TokenKind::Eof {
            continue;
        }
        if token.channel == Channel::Default {
            out.push_str(&token.text);
        } else {
            for c in token.text.chars() {
                match c {
                    '\t' | '\r' | '\n' | ' ' => out.push(c),
                    _ => out.push(' '),
                }
            }
        }
    }
    out
}

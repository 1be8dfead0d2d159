//! Main lexer
//!
//! Raw tokenization is handled entirely by logos; delimiter-pair and
//! tag-delimited literals that a regular pattern cannot express are finished
//! by small callbacks scanning for the terminator. The wrapper assigns
//! line/column coordinates (optionally pinned, for embedded re-lexing) and
//! guarantees that the produced tokens jointly cover the input: when a
//! callback cannot find its terminator the remainder of the input becomes a
//! single hidden token and a phase-tagged fault is recorded.

use crate::islands::error::{ErrorPhase, SyntaxErrorEntry};
use crate::islands::tokens::{Channel, Token, TokenKind, TokenStream};
use logos::{Lexer, Logos};

/// Starting coordinates for a token stream.
///
/// The default pin is the beginning of a document. Embedded re-lexing pins
/// the stream to the literal's opening position plus the notation's content
/// offset, so embedded tokens report positions in the host source.
#[derive(Debug, Clone, Copy)]
pub struct Pin {
    /// 1-based line of the first character.
    pub line: usize,
    /// 0-based column of the first character.
    pub column: usize,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Default for Pin {
    fn default() -> Self {
        Pin {
            line: 1,
            column: 0,
            offset: 0,
        }
    }
}

/// Bytes to consume for a `/* ... */` comment body, terminator included.
pub(crate) fn block_comment_len(remainder: &str) -> Option<usize> {
    remainder.find("*/").map(|pos| pos + 2)
}

/// Bytes to consume for a dollar-quoted body given the opening tag,
/// closing tag included.
pub(crate) fn dollar_quoted_len(opener: &str, remainder: &str) -> Option<usize> {
    remainder.find(opener).map(|pos| pos + opener.len())
}

/// Bytes to consume for a `q'...'`-style body: the delimiter char, the
/// content, and the two-character terminator.
pub(crate) fn quote_delimited_len(remainder: &str) -> Option<usize> {
    let open = remainder.chars().next()?;
    // bracket-style delimiters pair up, any other char closes itself
    let close = match open {
        '[' => ']',
        '(' => ')',
        '{' => '}',
        '<' => '>',
        other => other,
    };
    let mut terminator = String::with_capacity(2);
    terminator.push(close);
    terminator.push('\'');
    let rest = &remainder[open.len_utf8()..];
    rest.find(&terminator)
        .map(|pos| open.len_utf8() + pos + terminator.len())
}

/// Bytes to consume for a plainly quoted body where a doubled quote escapes
/// itself, closing quote included.
pub(crate) fn quoted_body_len(remainder: &str) -> Option<usize> {
    let bytes = remainder.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
            } else {
                return Some(i + 1);
            }
        } else {
            i += 1;
        }
    }
    None
}

fn scan_block_comment(lex: &mut Lexer<RawToken>) -> bool {
    match block_comment_len(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn scan_dollar_quoted(lex: &mut Lexer<RawToken>) -> bool {
    // the matched slice is the opening tag; the closer is identical
    let closer = lex.slice().to_owned();
    match dollar_quoted_len(&closer, lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn scan_quote_delimited(lex: &mut Lexer<RawToken>) -> bool {
    match quote_delimited_len(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

fn scan_unicode_body(lex: &mut Lexer<RawToken>) -> bool {
    match quoted_body_len(lex.remainder()) {
        Some(len) => {
            lex.bump(len);
            true
        }
        None => false,
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"--[^\n]*")]
    LineComment,
    #[token("/*", scan_block_comment)]
    BlockComment,
    #[regex(r"[nN][qQ]'", scan_quote_delimited)]
    NationalQuoteDelimiterString,
    #[regex(r"[qQ]'", scan_quote_delimited)]
    QuoteDelimiterString,
    #[regex(r"[nN]'([^']|'')*'")]
    NationalString,
    #[regex(r"[eE]'([^'\\]|\\.|'')*'")]
    EscapedString,
    // a single full-literal pattern misfires on the `&` prefix once
    // compiled, so the body is scanned like the q'...' forms
    #[regex(r"[uU]&'", scan_unicode_body)]
    UnicodeString,
    #[regex(r"[bB]'[01]*'")]
    BitString,
    #[regex(r"[xX]'[0-9A-Fa-f]*'")]
    HexString,
    #[regex(r"'([^']|'')*'")]
    String,
    #[regex(r"\$([A-Za-z_][A-Za-z0-9_]*)?\$", scan_dollar_quoted)]
    DollarQuoted,
    #[regex(r#""([^"]|"")*""#)]
    QuotedIdentifier,
    #[regex(r"[A-Za-z_][A-Za-z0-9_$#]*")]
    Identifier,
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?")]
    Number,
    #[token(";")]
    Semicolon,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(",")]
    Comma,
    #[regex(r"[.+\-*/=<>%^~!?:|&@#\\\[\]{}`]")]
    Operator,
    #[regex(r".", priority = 0)]
    Unknown,
}

fn kind_of(raw: RawToken, slice: &str) -> TokenKind {
    match raw {
        RawToken::Whitespace => TokenKind::Whitespace,
        RawToken::LineComment => TokenKind::LineComment,
        RawToken::BlockComment => TokenKind::BlockComment,
        RawToken::NationalQuoteDelimiterString => TokenKind::NationalQuoteDelimiterString,
        RawToken::QuoteDelimiterString => TokenKind::QuoteDelimiterString,
        RawToken::NationalString => TokenKind::NationalString,
        RawToken::EscapedString => TokenKind::EscapedString,
        RawToken::UnicodeString => TokenKind::UnicodeString,
        RawToken::BitString => TokenKind::BitString,
        RawToken::HexString => TokenKind::HexString,
        RawToken::String => TokenKind::String,
        RawToken::DollarQuoted => {
            if slice.starts_with("$$") {
                TokenKind::DollarString
            } else {
                TokenKind::DollarTagString
            }
        }
        RawToken::QuotedIdentifier => TokenKind::QuotedIdentifier,
        RawToken::Identifier => TokenKind::Identifier,
        RawToken::Number => TokenKind::Number,
        RawToken::Semicolon => TokenKind::Semicolon,
        RawToken::LeftParen => TokenKind::LeftParen,
        RawToken::RightParen => TokenKind::RightParen,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Operator => TokenKind::Operator,
        RawToken::Unknown => TokenKind::Unknown,
    }
}

fn channel_of(kind: TokenKind) -> Channel {
    match kind {
        TokenKind::Whitespace
        | TokenKind::LineComment
        | TokenKind::BlockComment
        | TokenKind::Unterminated => Channel::Hidden,
        _ => Channel::Default,
    }
}

/// Precomputed line starts for byte-offset to line/column conversion.
/// Lookup is a binary search over line start offsets.
pub(crate) struct PositionIndex {
    line_starts: Vec<usize>,
}

impl PositionIndex {
    pub(crate) fn new(text: &str) -> PositionIndex {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        PositionIndex { line_starts }
    }

    /// 0-based (line, column) of a byte offset; column counts characters.
    pub(crate) fn position(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = text[self.line_starts[line]..offset].chars().count();
        (line, column)
    }
}

fn pinned_position(pin: &Pin, line0: usize, column: usize) -> (usize, usize) {
    let line = pin.line + line0;
    let column = if line0 == 0 { pin.column + column } else { column };
    (line, column)
}

/// Tokenize `text` into a covering, channel-tagged token stream.
///
/// On an unrecoverable scan fault (a literal or comment without its
/// terminator) the remainder of the input becomes one hidden token, a fault
/// is recorded with phase [`ErrorPhase::Lexer`], and lexing stops. The
/// stream always ends with an EOF sentinel.
pub(crate) fn tokenize(text: &str, pin: Pin, errors: &mut Vec<SyntaxErrorEntry>) -> TokenStream {
    let index = PositionIndex::new(text);
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(text);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line0, column) = index.position(text, span.start);
        let (line, column) = pinned_position(&pin, line0, column);
        match result {
            Ok(raw) => {
                let kind = kind_of(raw, lexer.slice());
                tokens.push(Token {
                    kind,
                    text: lexer.slice().to_string(),
                    start: pin.offset + span.start,
                    stop: pin.offset + span.end,
                    line,
                    column,
                    channel: channel_of(kind),
                });
            }
            Err(()) => {
                let offending: String = text[span.start..].chars().take(16).collect();
                errors.push(SyntaxErrorEntry::new(
                    line,
                    column,
                    format!("token recognition error at: '{offending}'"),
                    ErrorPhase::Lexer,
                ));
                tokens.push(Token {
                    kind: TokenKind::Unterminated,
                    text: text[span.start..].to_string(),
                    start: pin.offset + span.start,
                    stop: pin.offset + text.len(),
                    line,
                    column,
                    channel: Channel::Hidden,
                });
                break;
            }
        }
    }
    let end = tokens.last().map(|t| t.stop).unwrap_or(pin.offset);
    let (line0, column) = index.position(text, end - pin.offset);
    let (line, column) = pinned_position(&pin, line0, column);
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        start: end,
        stop: end,
        line,
        column,
        channel: Channel::Default,
    });
    TokenStream::new(tokens)
}

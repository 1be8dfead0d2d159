//! Channel-tagged tokens and the token stream
//!
//! Tokens carry byte offsets plus line/column coordinates, so positions stay
//! reconstructable even across the re-lexing boundary of embedded code. The
//! stream always ends with an EOF sentinel; real tokens are totally ordered
//! by offset and jointly cover the whole input, hidden tokens included.

use serde::Serialize;

/// Token classification channel.
///
/// Default-channel tokens are visible to the parser; hidden tokens are
/// excluded from grammar matching but retained for position-accurate
/// reconstruction of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Channel {
    Default,
    Hidden,
}

/// Kind of a token produced by the main lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    Identifier,
    QuotedIdentifier,
    Number,
    /// `'...'`
    String,
    /// `n'...'`
    NationalString,
    /// `e'...'`
    EscapedString,
    /// `u&'...'`
    UnicodeString,
    /// `b'...'`
    BitString,
    /// `x'...'`
    HexString,
    /// `q'[...]'` (any delimiter pair)
    QuoteDelimiterString,
    /// `nq'[...]'` (any delimiter pair)
    NationalQuoteDelimiterString,
    /// `$$...$$`
    DollarString,
    /// `$tag$...$tag$`
    DollarTagString,
    Semicolon,
    LeftParen,
    RightParen,
    Comma,
    Operator,
    /// Any character no other rule claims.
    Unknown,
    /// Fail-open remainder of the input after an unrecoverable scan fault.
    Unterminated,
    /// End-of-stream sentinel.
    Eof,
}

impl TokenKind {
    /// Whether this kind is one of the string-literal notations.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::NationalString
                | TokenKind::EscapedString
                | TokenKind::UnicodeString
                | TokenKind::BitString
                | TokenKind::HexString
                | TokenKind::QuoteDelimiterString
                | TokenKind::NationalQuoteDelimiterString
                | TokenKind::DollarString
                | TokenKind::DollarTagString
        )
    }
}

/// One token with its source coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub stop: usize,
    /// 1-based line of the first character.
    pub line: usize,
    /// 0-based character position of the first character within its line.
    pub column: usize,
    pub channel: Channel,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// The token stream produced by the main lexer.
///
/// Kept in document order. Scope classification mutates channels in place;
/// after assembly the stream is read-only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenStream {
    pub(crate) tokens: Vec<Token>,
}

impl TokenStream {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        TokenStream { tokens }
    }

    /// All tokens in document order, EOF sentinel included.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens visible to the parser, in document order.
    pub fn default_channel(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.channel == Channel::Default)
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    /// Approximate heap residency of the stream, used for metrics only.
    pub(crate) fn storage_bytes(&self) -> usize {
        self.tokens.len() * std::mem::size_of::<Token>()
            + self.tokens.iter().map(|t| t.text.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, text: &str, start: usize, channel: Channel) -> Token {
        Token {
            kind,
            text: text.to_string(),
            start,
            stop: start + text.len(),
            line: 1,
            column: start,
            channel,
        }
    }

    #[test]
    fn test_default_channel_filter() {
        let stream = TokenStream::new(vec![
            token(TokenKind::Identifier, "select", 0, Channel::Default),
            token(TokenKind::Whitespace, " ", 6, Channel::Hidden),
            token(TokenKind::Number, "1", 7, Channel::Default),
            token(TokenKind::Eof, "", 8, Channel::Default),
        ]);
        let visible: Vec<_> = stream.default_channel().map(|t| t.text.as_str()).collect();
        assert_eq!(visible, vec!["select", "1", ""]);
    }

    #[test]
    fn test_string_kinds() {
        assert!(TokenKind::DollarTagString.is_string());
        assert!(TokenKind::NationalQuoteDelimiterString.is_string());
        assert!(!TokenKind::Identifier.is_string());
        assert!(!TokenKind::Eof.is_string());
    }
}

//! String literal decoding
//!
//! Embedded code arrives wrapped in one of roughly ten string literal
//! notations. Before the wrapped text can be re-lexed it has to be decoded
//! (quoting removed, escapes resolved), and the notation's content offset is
//! needed to pin the re-lexed stream to source-accurate positions. Decoding
//! is total: a malformed literal decodes to its raw text rather than
//! failing, so resolution degrades instead of aborting.

use crate::islands::tokens::TokenKind;
use crate::islands::tree::{self, AltLabel, NodeId, ParseTree, RuleKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

/// Compiled unicode-escape patterns, one per escape character.
/// Flushable via [`crate::islands::cache::flush_engine_cache`].
static ESCAPE_PATTERNS: Lazy<Mutex<HashMap<char, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Drop the compiled unicode-escape patterns.
pub(crate) fn flush_escape_patterns() {
    let mut guard = ESCAPE_PATTERNS.lock().unwrap_or_else(|e| e.into_inner());
    guard.clear();
}

fn with_escape_pattern<R>(escape: char, f: impl FnOnce(&Regex) -> R) -> R {
    let mut guard = ESCAPE_PATTERNS.lock().unwrap_or_else(|e| e.into_inner());
    let pattern = guard.entry(escape).or_insert_with(|| {
        let re = format!(r"{}\+?[0-9A-Fa-f]{{4,6}}", regex::escape(&escape.to_string()));
        Regex::new(&re).expect("escape pattern is well-formed")
    });
    f(pattern)
}

/// Strip `prefix_len` leading and `suffix_len` trailing characters.
fn strip(text: &str, prefix_len: usize, suffix_len: usize) -> &str {
    let mut chars = text.char_indices();
    let start = chars.nth(prefix_len).map(|(i, _)| i).unwrap_or(text.len());
    let end = text
        .char_indices()
        .rev()
        .nth(suffix_len - 1)
        .map(|(i, _)| i)
        .unwrap_or(start);
    if end < start {
        return "";
    }
    &text[start..end]
}

fn unescape_doubled_quotes(text: &str) -> String {
    text.replace("''", "'")
}

/// Quoted body of one segment token. The first segment of a concatenation
/// carries the notation prefix; continuation segments are plainly quoted.
fn segment_body(text: &str, kind: TokenKind) -> &str {
    let prefix = match kind {
        TokenKind::NationalString
        | TokenKind::EscapedString
        | TokenKind::BitString
        | TokenKind::HexString => 2,
        TokenKind::UnicodeString => 3,
        _ => 1,
    };
    strip(text, prefix, 1)
}

/// Concatenate adjacent string segments into one decoded value.
fn join_segments(tree: &ParseTree, id: NodeId) -> String {
    let mut out = String::new();
    for child in tree.children(id) {
        if let Some(token) = tree.token(*child) {
            if token.kind.is_string() {
                out.push_str(&unescape_doubled_quotes(segment_body(&token.text, token.kind)));
            }
        }
    }
    out
}

fn decode_backslash_escapes(text: &str) -> String {
    // single left-to-right scan; produced characters are never re-read, so
    // an escaped backslash cannot merge with the character after it
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Resolve `\xxxx` / `\+xxxxxx` escapes of a unicode string body. The escape
/// character defaults to backslash and can be overridden by a trailing
/// `UESCAPE 'c'` clause.
fn decode_unicode_escapes(text: &str, escape: char) -> String {
    with_escape_pattern(escape, |pattern| {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                let m = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                let digits = m
                    .trim_start_matches(escape)
                    .trim_start_matches('+');
                u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| m.to_string())
            })
            .into_owned()
    })
}

/// Expand hex digits to their binary representation, leading zeros stripped.
/// An all-zero value collapses to a single `0`; no digits stay no digits.
fn hex_to_binary(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() * 4);
    for c in digits.chars() {
        if let Some(value) = c.to_digit(16) {
            out.push_str(&format!("{value:04b}"));
        }
    }
    trim_binary(digits, &out)
}

fn trim_binary(digits: &str, bits: &str) -> String {
    if digits.is_empty() {
        return String::new();
    }
    let trimmed = bits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn uescape_char(tree: &ParseTree, id: NodeId) -> char {
    // UESCAPE 'c' trails the literal: identifier then one simple string
    let children = tree.children(id);
    for (i, child) in children.iter().enumerate() {
        let Some(token) = tree.token(*child) else {
            continue;
        };
        if token.text.eq_ignore_ascii_case("uescape") {
            if let Some(value) = children.get(i + 1).and_then(|c| tree.token(*c)) {
                return strip(&value.text, 1, 1).chars().next().unwrap_or('\\');
            }
        }
    }
    '\\'
}

/// The decoded text of a literal node. Unknown or malformed notations fall
/// back to the node's raw text.
pub fn decoded_text(parse_tree: &ParseTree, id: NodeId) -> String {
    let raw = parse_tree.text(id);
    let Some(label) = parse_tree.label(id) else {
        return raw;
    };
    match label {
        AltLabel::SimpleString => unescape_doubled_quotes(strip(&raw, 1, 1)),
        AltLabel::NationalString => unescape_doubled_quotes(strip(&raw, 2, 1)),
        AltLabel::ConcatenatedString | AltLabel::ConcatenatedNationalString => {
            join_segments(parse_tree, id)
        }
        AltLabel::EscapedString => decode_backslash_escapes(&join_segments(parse_tree, id)),
        AltLabel::UnicodeString => {
            // segments end where the UESCAPE clause starts; its value string
            // is not literal content
            let mut body = String::new();
            for child in parse_tree.children(id) {
                let Some(token) = parse_tree.token(*child) else {
                    continue;
                };
                if token.text.eq_ignore_ascii_case("uescape") {
                    break;
                }
                if token.kind.is_string() {
                    body.push_str(&unescape_doubled_quotes(segment_body(
                        &token.text,
                        token.kind,
                    )));
                }
            }
            decode_unicode_escapes(&body, uescape_char(parse_tree, id))
        }
        AltLabel::BitString => {
            // hex segments are identified by the leading token; continuation
            // segments use the same digit base
            let mut digits = String::new();
            let mut hex = false;
            let mut first = true;
            for child in parse_tree.children(id) {
                if let Some(token) = parse_tree.token(*child) {
                    if token.kind.is_string() {
                        if first {
                            hex = token.kind == TokenKind::HexString;
                            first = false;
                        }
                        digits.push_str(segment_body(&token.text, token.kind));
                    }
                }
            }
            // bit digits are joined as written; only the hex form converts,
            // which is where the leading-zero trim comes from
            if hex {
                hex_to_binary(&digits)
            } else {
                digits
            }
        }
        AltLabel::QuoteDelimiterString => strip(&raw, 3, 2).to_string(),
        AltLabel::NationalQuoteDelimiterString => strip(&raw, 4, 2).to_string(),
        AltLabel::DollarString => strip(&raw, 2, 2).to_string(),
        AltLabel::DollarIdentifierString => {
            // the closing tag mirrors the opening one; scan for the second $
            let tag_len = raw[1..].find('$').map(|p| p + 2).unwrap_or(1);
            strip(&raw, tag_len, tag_len).to_string()
        }
        _ => raw,
    }
}

/// Character count from the literal's first character to its content.
///
/// Used to pin re-lexed embedded code: the embedded stream starts at the
/// literal's position plus this offset.
pub fn content_start_offset(parse_tree: &ParseTree, id: NodeId) -> usize {
    let Some(label) = parse_tree.label(id) else {
        return 0;
    };
    match label {
        AltLabel::SimpleString | AltLabel::ConcatenatedString => 1,
        AltLabel::NationalString
        | AltLabel::ConcatenatedNationalString
        | AltLabel::EscapedString
        | AltLabel::BitString
        | AltLabel::DollarString => 2,
        AltLabel::UnicodeString | AltLabel::QuoteDelimiterString => 3,
        AltLabel::NationalQuoteDelimiterString => 4,
        AltLabel::DollarIdentifierString => {
            let raw = parse_tree.text(id);
            raw[1..].find('$').map(|p| p + 2).unwrap_or(2)
        }
        _ => 0,
    }
}

/// The embedded language named by an expression node, lowercased.
///
/// A missing expression defaults to `plpgsql`. A bare name or a simple
/// string yields its text; anything else resolves to `unknown`, which no
/// start symbol accepts.
pub fn language_name(parse_tree: &ParseTree, expression: Option<NodeId>) -> String {
    let Some(expression) = expression else {
        return "plpgsql".to_string();
    };
    let node = tree::query::most_concrete(parse_tree, expression);
    if parse_tree.kind(node) == Some(RuleKind::SqlName) {
        return parse_tree.text(node).to_lowercase();
    }
    let mut names = tree::query::find_all(parse_tree, node, &[RuleKind::SqlName]);
    if names.len() == 1 {
        return parse_tree.text(names.remove(0)).to_lowercase();
    }
    if parse_tree.kind(node) == Some(RuleKind::Literal) {
        if parse_tree.children(node).len() == 1 {
            return decoded_text(parse_tree, node).to_lowercase();
        }
        return "unknown".to_string();
    }
    let mut literals = tree::query::find_all(parse_tree, node, &[RuleKind::Literal]);
    if literals.len() == 1 {
        let literal = literals.remove(0);
        if parse_tree.children(literal).len() == 1 {
            return decoded_text(parse_tree, literal).to_lowercase();
        }
    }
    "unknown".to_string()
}

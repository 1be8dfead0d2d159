//! Decoding of every string literal notation, driven through a full parse.

use rstest::rstest;
use sql_islands::islands::document::Document;
use sql_islands::islands::literal::decoded_text;
use sql_islands::islands::RuleKind;

fn decode_in_statement(literal: &str) -> String {
    let sql = format!("select {literal};");
    let doc = Document::parse(&sql);
    assert!(
        doc.syntax_errors().is_empty(),
        "errors for {literal}: {:?}",
        doc.syntax_errors()
    );
    let literals = doc.find_all(&[RuleKind::Literal]);
    assert_eq!(literals.len(), 1, "one literal expected in {sql}");
    decoded_text(doc.tree(), literals[0])
}

#[rstest]
#[case::simple("'that''s it'", "that's it")]
#[case::national("n'that''s it'", "that's it")]
#[case::concatenated("'that''s' ' it'", "that's it")]
#[case::concatenated_national("n'that''s' ' it'", "that's it")]
#[case::escaped(r"e'tab\there'", "tab\there")]
#[case::escaped_backslash(r"e'a\\b'", r"a\b")]
#[case::escaped_concatenated(r"e'hello' '\n' 'world'", "hello\nworld")]
#[case::unicode(r"u&'d\0061t\+000061'", "data")]
#[case::unicode_concatenated(r"u&'d\0061' 'ta'", "data")]
#[case::bit("b'1010'", "1010")]
#[case::bit_concatenated("b'1010' '0001'", "10100001")]
#[case::bit_leading_zeros("b'0010'", "0010")]
#[case::bit_all_zero("b'0000'", "0000")]
#[case::hex("x'Af'", "10101111")]
#[case::hex_concatenated("x'a' '1'", "10100001")]
#[case::hex_all_zero("x'00'", "0")]
#[case::quote_delimited("q'[that's it]'", "that's it")]
#[case::quote_delimited_braces("q'{that's it}'", "that's it")]
#[case::quote_delimited_self_closing("q'!that's it!'", "that's it")]
#[case::national_quote_delimited("nq'[that's it]'", "that's it")]
#[case::dollar("$$that's it$$", "that's it")]
#[case::dollar_tag("$tag$that's it$tag$", "that's it")]
fn notation_decodes(#[case] literal: &str, #[case] expected: &str) {
    assert_eq!(decode_in_statement(literal), expected);
}

#[test]
fn uescape_clause_overrides_escape_character() {
    let doc = Document::parse("select u&'d!0061ta' uescape '!';");
    assert!(doc.syntax_errors().is_empty());
    let literals = doc.find_all(&[RuleKind::Literal]);
    assert_eq!(literals.len(), 1);
    assert_eq!(decoded_text(doc.tree(), literals[0]), "data");
}

#[test]
fn dollar_quoted_ignores_inner_tags() {
    assert_eq!(
        decode_in_statement("$outer$has $$ inside$outer$"),
        "has $$ inside"
    );
}

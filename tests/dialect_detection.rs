//! Dialect auto-detection and override behavior.

use sql_islands::islands::document::{Document, DocumentOptions};
use sql_islands::islands::Dialect;

#[test]
fn plain_sql_detects_generic() {
    let doc = Document::parse("select 1;\nselect 2;\n");
    assert_eq!(doc.dialect(), Dialect::Generic);
}

#[test]
fn slash_line_detects_oracledb() {
    let doc = Document::parse("begin\n  null;\nend;\n/\n");
    assert_eq!(doc.dialect(), Dialect::OracleDb);
}

#[test]
fn slash_inside_line_stays_generic() {
    // division, not a statement terminator
    let doc = Document::parse("select 4 / 2;\n");
    assert_eq!(doc.dialect(), Dialect::Generic);
}

#[test]
fn explicit_dialect_wins_over_detection() {
    let options = DocumentOptions {
        dialect: Some(Dialect::PostgreSql),
        ..DocumentOptions::default()
    };
    let doc = Document::build("begin\n  null;\nend;\n/\n", &options);
    assert_eq!(doc.dialect(), Dialect::PostgreSql);
}

#[test]
fn embedding_support_is_dialect_gated() {
    assert!(Dialect::Generic.supports_embedding());
    assert!(Dialect::PostgreSql.supports_embedding());
    assert!(!Dialect::OracleDb.supports_embedding());
}

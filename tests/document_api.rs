//! Document assembly surface: infallibility, fault gathering, metrics and
//! cache flushing.

use sql_islands::islands::cache;
use sql_islands::islands::document::{Document, DocumentOptions};
use sql_islands::islands::{ErrorPhase, RuleKind};

#[test]
fn assembly_never_fails() {
    for sql in [
        "",
        "\n\n\n",
        "garbage ( ) [ ] garbage",
        "select $$ never closed",
        "/* never closed",
        "select 1;",
        "😀 unicode water 😀\nselect 1;\n",
    ] {
        let doc = Document::parse(sql);
        // a tree and a stream always come back
        assert!(doc.tokens().len() >= 1, "input: {sql:?}");
        assert_eq!(doc.tree().kind(doc.tree().root()), Some(RuleKind::File));
    }
}

#[test]
fn empty_input_yields_empty_file() {
    let doc = Document::parse("");
    assert!(doc.syntax_errors().is_empty());
    assert!(doc.find_all(&[RuleKind::Statement]).is_empty());
    // only the EOF sentinel
    assert_eq!(doc.tokens().len(), 1);
}

#[test]
fn faults_carry_phase_and_position() {
    let doc = Document::parse("select $$ never closed");
    let lexer_faults: Vec<_> = doc
        .syntax_errors()
        .iter()
        .filter(|e| e.phase == ErrorPhase::Lexer)
        .collect();
    assert!(!lexer_faults.is_empty());
    assert_eq!(lexer_faults[0].line, 1);
    assert_eq!(lexer_faults[0].column, 7);
    assert!(lexer_faults[0]
        .message
        .starts_with("token recognition error at:"));
}

#[test]
fn fault_display_is_position_prefixed() {
    let doc = Document::parse("select $$ never closed");
    let rendered = doc.syntax_errors()[0].to_string();
    assert!(rendered.contains("line 1"), "got: {rendered}");
}

#[test]
fn metrics_reflect_the_enabled_phases() {
    let doc = Document::parse("prompt x\nselect 1;\n");
    let lexer = doc.lexer_metrics().unwrap();
    assert!(lexer.memory > 0);
    assert!(lexer.scope_memory > 0);
    assert!(doc.parser_metrics().memory > 0);
    assert!(doc.parser_metrics().profile.is_none());

    let options = DocumentOptions {
        hide_out_of_scope_tokens: false,
        ..DocumentOptions::default()
    };
    let doc = Document::build("select 1;", &options);
    assert_eq!(doc.lexer_metrics().unwrap().scope_memory, 0);
}

#[test]
fn profile_report_lists_rules() {
    let options = DocumentOptions {
        profile: true,
        ..DocumentOptions::default()
    };
    let doc = Document::build("select 1; select 2;", &options);
    let profile = doc.parser_metrics().profile.as_ref().unwrap();
    let statement = profile
        .decisions
        .iter()
        .find(|d| d.rule == "statement")
        .unwrap();
    assert_eq!(statement.invocations, 2);
    assert_eq!(statement.max_lookahead, 3);
    assert_eq!(statement.ambiguities, 0);
    let report = doc.parser_metrics().profile_report();
    assert!(report.starts_with("Profile\n=======\n"));
}

#[test]
fn flushing_caches_between_documents_changes_nothing() {
    let sql = "do $$select u&'\\0041';$$ language sql;";
    let before = Document::parse(sql);
    cache::flush_all();
    let after = Document::parse(sql);
    assert_eq!(before.syntax_errors().len(), after.syntax_errors().len());
    assert_eq!(
        before.find_all(&[RuleKind::EmbeddedSqlBody]).len(),
        after.find_all(&[RuleKind::EmbeddedSqlBody]).len()
    );
}

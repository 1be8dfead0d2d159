//! Recursive descent parser of the island grammar
//!
//! The grammar is permissive by construction: it recognizes the statement
//! shapes embedded-code resolution cares about and consumes everything else
//! into generic statements, so parsing never fails. Recovery is local to a
//! statement: on unexpected input the parser records a fault, labels the
//! statement as an error alternative and skips to the next terminator.
//!
//! Every start rule appends the EOF sentinel as its last terminal child; the
//! resolver relies on that to recognize non-empty embedded bodies.

use crate::islands::dialect::Dialect;
use crate::islands::error::{ErrorPhase, SyntaxErrorEntry};
use crate::islands::metrics::{DecisionMetrics, ParseProfile};
use crate::islands::tokens::{Token, TokenKind, TokenStream};
use crate::islands::tree::{AltLabel, NodeId, ParseTree, RuleKind};
use std::time::Instant;

/// Grammar entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartSymbol {
    /// A whole document of island statements.
    File,
    /// The body of an embedded `language sql` literal.
    EmbeddedSqlBody,
    /// The body of an embedded `language plpgsql` literal.
    EmbeddedProceduralBody,
}

/// Rule identifiers; the discriminant doubles as the decision id in
/// profiling rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
enum Rule {
    File = 0,
    Statement,
    AnonymousBlock,
    FunctionDefinition,
    ProcedureDefinition,
    RoutineOption,
    Expression,
    SqlName,
    Literal,
    EmbeddedSqlBody,
    EmbeddedProceduralBody,
}

const RULE_NAMES: [&str; 11] = [
    "file",
    "statement",
    "anonymousBlock",
    "functionDefinition",
    "procedureDefinition",
    "routineOption",
    "expression",
    "sqlName",
    "literal",
    "embeddedSqlBody",
    "embeddedProceduralBody",
];

struct Profiler {
    rows: Vec<DecisionMetrics>,
}

impl Profiler {
    fn new() -> Profiler {
        Profiler {
            rows: RULE_NAMES
                .iter()
                .enumerate()
                .map(|(decision, rule)| DecisionMetrics {
                    rule,
                    decision,
                    time: std::time::Duration::ZERO,
                    invocations: 0,
                    total_lookahead: 0,
                    max_lookahead: 0,
                    ambiguities: 0,
                    errors: 0,
                })
                .collect(),
        }
    }

    fn record(&mut self, rule: Rule, elapsed: std::time::Duration, lookahead: u64, errors: u64) {
        let row = &mut self.rows[rule as usize];
        row.time += elapsed;
        row.invocations += 1;
        row.total_lookahead += lookahead;
        row.max_lookahead = row.max_lookahead.max(lookahead);
        row.errors += errors;
    }
}

/// Parse the default-channel tokens of `stream` from `start`.
pub(crate) fn parse(
    stream: &TokenStream,
    start: StartSymbol,
    dialect: Dialect,
    profile: bool,
    errors: &mut Vec<SyntaxErrorEntry>,
) -> (ParseTree, Option<ParseProfile>) {
    let tokens: Vec<&Token> = stream.default_channel().collect();
    let mut parser = Parser {
        tokens,
        pos: 0,
        tree: ParseTree::with_root(match start {
            StartSymbol::File => RuleKind::File,
            StartSymbol::EmbeddedSqlBody => RuleKind::EmbeddedSqlBody,
            StartSymbol::EmbeddedProceduralBody => RuleKind::EmbeddedProceduralBody,
        }),
        dialect,
        errors,
        profiler: profile.then(Profiler::new),
    };
    let rule = match start {
        StartSymbol::File => Rule::File,
        StartSymbol::EmbeddedSqlBody => Rule::EmbeddedSqlBody,
        StartSymbol::EmbeddedProceduralBody => Rule::EmbeddedProceduralBody,
    };
    let root = parser.tree.root();
    parser.profiled(rule, |p| p.statements(root));
    let profile = parser
        .profiler
        .take()
        .map(|profiler| ParseProfile { decisions: profiler.rows });
    (parser.tree, profile)
}

struct Parser<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    tree: ParseTree,
    dialect: Dialect,
    errors: &'a mut Vec<SyntaxErrorEntry>,
    profiler: Option<Profiler>,
}

impl<'a> Parser<'a> {
    fn profiled<R>(&mut self, rule: Rule, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.profiler.is_none() {
            return f(self);
        }
        let started = Instant::now();
        let pos_before = self.pos;
        let errors_before = self.errors.len();
        let result = f(self);
        let elapsed = started.elapsed();
        let lookahead = (self.pos - pos_before) as u64;
        let errors = (self.errors.len() - errors_before) as u64;
        if let Some(profiler) = &mut self.profiler {
            profiler.record(rule, elapsed, lookahead, errors);
        }
        result
    }

    fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    /// Token `n` positions ahead; the EOF sentinel once the stream is
    /// exhausted.
    fn peek_at(&self, n: usize) -> &'a Token {
        let last = self.tokens.len() - 1;
        self.tokens[(self.pos + n).min(last)]
    }

    fn at_eof(&self) -> bool {
        self.peek().is_eof()
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn terminal(&mut self, parent: NodeId) {
        let token = self.advance().clone();
        self.tree.push_terminal(parent, token);
    }

    fn record_error(&mut self, token: &Token, message: String) {
        self.errors.push(SyntaxErrorEntry::new(
            token.line,
            token.column,
            message,
            ErrorPhase::Parser,
        ));
    }

    fn is_word(&self, token: &Token, word: &str) -> bool {
        token.kind == TokenKind::Identifier && token.text.eq_ignore_ascii_case(word)
    }

    /// A `/` alone on its own line ends a statement in Oracle scripts.
    fn at_slash_terminator(&self) -> bool {
        let token = self.peek();
        self.dialect == Dialect::OracleDb
            && token.kind == TokenKind::Operator
            && token.text == "/"
            && token.column == 0
    }

    fn at_terminator(&self) -> bool {
        self.at_eof() || self.peek().kind == TokenKind::Semicolon || self.at_slash_terminator()
    }

    /// Consume the terminator as a terminal of `parent`, if present.
    fn close_statement(&mut self, parent: NodeId) {
        if !self.at_eof() && self.at_terminator() {
            self.terminal(parent);
        }
    }

    /// Sequence of statements up to EOF, the EOF sentinel appended last.
    fn statements(&mut self, parent: NodeId) {
        while !self.at_eof() {
            self.profiled(Rule::Statement, |p| p.statement(parent));
        }
        let eof = self.peek().clone();
        self.tree.push_terminal(parent, eof);
    }

    fn statement(&mut self, parent: NodeId) {
        let stmt = self.tree.push_rule(parent, RuleKind::Statement, None);
        let token = self.peek();
        if self.is_word(token, "do") {
            self.profiled(Rule::AnonymousBlock, |p| p.anonymous_block(stmt));
        } else if self.is_word(token, "create") && self.routine_lookahead().is_some() {
            let kind = self.routine_lookahead().unwrap_or(RuleKind::FunctionDefinition);
            let rule = if kind == RuleKind::FunctionDefinition {
                Rule::FunctionDefinition
            } else {
                Rule::ProcedureDefinition
            };
            self.profiled(rule, |p| p.routine_definition(stmt, kind));
        } else if token.kind == TokenKind::Identifier {
            self.generic_statement(stmt);
        } else {
            let offending = token.clone();
            self.record_error(
                &offending,
                format!("extraneous input '{}' expecting statement", offending.text),
            );
            self.tree.set_label(stmt, AltLabel::ErrorStatement);
            while !self.at_terminator() {
                self.terminal(stmt);
            }
            self.close_statement(stmt);
        }
    }

    /// What `create [or replace]` introduces, without consuming anything.
    fn routine_lookahead(&self) -> Option<RuleKind> {
        let mut n = 1;
        if self.is_word(self.peek_at(1), "or") {
            if !self.is_word(self.peek_at(2), "replace") {
                return None;
            }
            n = 3;
        }
        let target = self.peek_at(n);
        if self.is_word(target, "function") {
            Some(RuleKind::FunctionDefinition)
        } else if self.is_word(target, "procedure") {
            Some(RuleKind::ProcedureDefinition)
        } else {
            None
        }
    }

    /// `do [language name] 'body' ...` in either clause order.
    fn anonymous_block(&mut self, parent: NodeId) {
        let block = self.tree.push_rule(parent, RuleKind::AnonymousBlock, None);
        self.terminal(block); // do
        while !self.at_terminator() {
            let token = self.peek();
            if self.is_word(token, "language") {
                self.terminal(block);
                if self.starts_expression() {
                    self.profiled(Rule::Expression, |p| p.expression(block));
                }
            } else if token.kind.is_string() {
                self.profiled(Rule::Literal, |p| p.literal(block));
            } else {
                self.terminal(block);
            }
        }
        self.close_statement(block);
    }

    /// `create [or replace] function|procedure name ... as 'body'
    /// language name ...`; clauses may appear in any order.
    fn routine_definition(&mut self, parent: NodeId, kind: RuleKind) {
        let routine = self.tree.push_rule(parent, kind, None);
        self.terminal(routine); // create
        if self.is_word(self.peek(), "or") {
            self.terminal(routine);
            self.terminal(routine); // replace
        }
        self.terminal(routine); // function | procedure
        if matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) {
            self.profiled(Rule::SqlName, |p| p.sql_name(routine));
        }
        while !self.at_terminator() {
            let token = self.peek();
            if self.is_word(token, "as") || self.is_word(token, "is") {
                self.profiled(Rule::RoutineOption, |p| {
                    let option =
                        p.tree
                            .push_rule(routine, RuleKind::RoutineOption, Some(AltLabel::BodyOption));
                    p.terminal(option);
                    if p.peek().kind.is_string() {
                        p.profiled(Rule::Literal, |p| p.literal(option));
                    }
                });
            } else if self.is_word(token, "language") {
                self.profiled(Rule::RoutineOption, |p| {
                    let option = p.tree.push_rule(
                        routine,
                        RuleKind::RoutineOption,
                        Some(AltLabel::LanguageOption),
                    );
                    p.terminal(option);
                    if p.starts_expression() {
                        p.profiled(Rule::Expression, |p| p.expression(option));
                    }
                });
            } else if token.kind.is_string() {
                self.profiled(Rule::Literal, |p| p.literal(routine));
            } else {
                self.terminal(routine);
            }
        }
        self.close_statement(routine);
    }

    /// Any other island statement: strings become literal nodes, everything
    /// else terminals, up to the statement terminator.
    fn generic_statement(&mut self, stmt: NodeId) {
        while !self.at_terminator() {
            if self.peek().kind.is_string() {
                self.profiled(Rule::Literal, |p| p.literal(stmt));
            } else {
                self.terminal(stmt);
            }
        }
        self.close_statement(stmt);
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Identifier | TokenKind::QuotedIdentifier
        ) || self.peek().kind.is_string()
    }

    fn expression(&mut self, parent: NodeId) {
        let expr = self.tree.push_rule(parent, RuleKind::Expression, None);
        if self.peek().kind.is_string() {
            self.profiled(Rule::Literal, |p| p.literal(expr));
        } else {
            self.profiled(Rule::SqlName, |p| p.sql_name(expr));
        }
    }

    /// Possibly qualified name: `ident`, `"ident"`, `a.b.c`.
    fn sql_name(&mut self, parent: NodeId) {
        let name = self.tree.push_rule(parent, RuleKind::SqlName, None);
        self.terminal(name);
        while self.peek().kind == TokenKind::Operator
            && self.peek().text == "."
            && matches!(
                self.peek_at(1).kind,
                TokenKind::Identifier | TokenKind::QuotedIdentifier
            )
        {
            self.terminal(name); // .
            self.terminal(name);
        }
    }

    /// One literal of any notation, adjacent continuation segments and a
    /// trailing `UESCAPE 'c'` clause included.
    fn literal(&mut self, parent: NodeId) {
        let lit = self.tree.push_rule(parent, RuleKind::Literal, None);
        let first = self.peek().kind;
        self.terminal(lit);
        let mut segments = 1;
        if matches!(
            first,
            TokenKind::String
                | TokenKind::NationalString
                | TokenKind::EscapedString
                | TokenKind::UnicodeString
                | TokenKind::BitString
                | TokenKind::HexString
        ) {
            while self.peek().kind == TokenKind::String {
                self.terminal(lit);
                segments += 1;
            }
        }
        if first == TokenKind::UnicodeString
            && self.is_word(self.peek(), "uescape")
            && self.peek_at(1).kind == TokenKind::String
        {
            self.terminal(lit); // uescape
            self.terminal(lit);
        }
        let label = match first {
            TokenKind::String if segments == 1 => AltLabel::SimpleString,
            TokenKind::String => AltLabel::ConcatenatedString,
            TokenKind::NationalString if segments == 1 => AltLabel::NationalString,
            TokenKind::NationalString => AltLabel::ConcatenatedNationalString,
            TokenKind::EscapedString => AltLabel::EscapedString,
            TokenKind::UnicodeString => AltLabel::UnicodeString,
            TokenKind::BitString | TokenKind::HexString => AltLabel::BitString,
            TokenKind::QuoteDelimiterString => AltLabel::QuoteDelimiterString,
            TokenKind::NationalQuoteDelimiterString => AltLabel::NationalQuoteDelimiterString,
            TokenKind::DollarString => AltLabel::DollarString,
            TokenKind::DollarTagString => AltLabel::DollarIdentifierString,
            _ => AltLabel::SimpleString,
        };
        self.tree.set_label(lit, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::islands::engine::{GrammarEngine, Pin};
    use crate::islands::tree::query;

    fn parsed(text: &str, start: StartSymbol) -> (ParseTree, Vec<SyntaxErrorEntry>) {
        let mut errors = Vec::new();
        let engine = GrammarEngine::new(Dialect::Generic);
        let stream = engine.tokenize(text, &mut errors);
        let (tree, _) = engine.parse(&stream, start, false, &mut errors);
        (tree, errors)
    }

    #[test]
    fn test_file_splits_statements() {
        let (tree, errors) = parsed("select 1; select 2;", StartSymbol::File);
        assert!(errors.is_empty());
        let statements = query::find_all(&tree, tree.root(), &[RuleKind::Statement]);
        assert_eq!(statements.len(), 2);
        // EOF sentinel is the last child of the start rule
        let last = *tree.children(tree.root()).last().unwrap();
        assert!(tree.token(last).is_some_and(Token::is_eof));
    }

    #[test]
    fn test_anonymous_block_shape() {
        let (tree, errors) = parsed("do $$select 1;$$ language sql;", StartSymbol::File);
        assert!(errors.is_empty());
        let blocks = query::find_all(&tree, tree.root(), &[RuleKind::AnonymousBlock]);
        assert_eq!(blocks.len(), 1);
        let literals = query::find_all(&tree, blocks[0], &[RuleKind::Literal]);
        assert_eq!(literals.len(), 1);
        assert_eq!(tree.label(literals[0]), Some(AltLabel::DollarString));
        let expressions = query::find_all(&tree, blocks[0], &[RuleKind::Expression]);
        assert_eq!(expressions.len(), 1);
        assert_eq!(tree.text(query::most_concrete(&tree, expressions[0])), "sql");
    }

    #[test]
    fn test_function_definition_options() {
        let (tree, errors) = parsed(
            "create or replace function f() returns int as 'select 1' language sql;",
            StartSymbol::File,
        );
        assert!(errors.is_empty());
        let functions = query::find_all(&tree, tree.root(), &[RuleKind::FunctionDefinition]);
        assert_eq!(functions.len(), 1);
        let options = query::find_all(&tree, functions[0], &[RuleKind::RoutineOption]);
        let labels: Vec<_> = options.iter().filter_map(|o| tree.label(*o)).collect();
        assert_eq!(labels, vec![AltLabel::BodyOption, AltLabel::LanguageOption]);
        let names = query::find_all(&tree, functions[0], &[RuleKind::SqlName]);
        assert_eq!(tree.text(names[0]), "f");
    }

    #[test]
    fn test_procedure_definition() {
        let (tree, errors) = parsed(
            "create procedure p() as $$select 1;$$;",
            StartSymbol::File,
        );
        assert!(errors.is_empty());
        let procedures = query::find_all(&tree, tree.root(), &[RuleKind::ProcedureDefinition]);
        assert_eq!(procedures.len(), 1);
    }

    #[test]
    fn test_concatenated_literal_label() {
        let (tree, errors) = parsed("select 'a' 'b';", StartSymbol::File);
        assert!(errors.is_empty());
        let literals = query::find_all(&tree, tree.root(), &[RuleKind::Literal]);
        assert_eq!(tree.label(literals[0]), Some(AltLabel::ConcatenatedString));
        assert_eq!(tree.text(literals[0]), "'a''b'");
    }

    #[test]
    fn test_escaped_literal_concatenation_is_one_literal() {
        let (tree, errors) = parsed(r"select e'hello' '\n' 'world';", StartSymbol::File);
        assert!(errors.is_empty());
        let literals = query::find_all(&tree, tree.root(), &[RuleKind::Literal]);
        assert_eq!(literals.len(), 1);
        assert_eq!(tree.label(literals[0]), Some(AltLabel::EscapedString));
        assert_eq!(tree.children(literals[0]).len(), 3);
    }

    #[test]
    fn test_unicode_literal_continuation_before_uescape() {
        let (tree, errors) = parsed("select u&'d!0061' 'ta' uescape '!';", StartSymbol::File);
        assert!(errors.is_empty());
        let literals = query::find_all(&tree, tree.root(), &[RuleKind::Literal]);
        assert_eq!(literals.len(), 1);
        // two segments plus the uescape clause
        assert_eq!(tree.children(literals[0]).len(), 4);
    }

    #[test]
    fn test_unicode_literal_with_uescape() {
        let (tree, errors) = parsed("select u&'d!0061ta' uescape '!';", StartSymbol::File);
        assert!(errors.is_empty());
        let literals = query::find_all(&tree, tree.root(), &[RuleKind::Literal]);
        assert_eq!(tree.label(literals[0]), Some(AltLabel::UnicodeString));
        assert_eq!(tree.children(literals[0]).len(), 3);
    }

    #[test]
    fn test_error_recovery_is_local() {
        let (tree, errors) = parsed("( oops ); select 1;", StartSymbol::File);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].phase, ErrorPhase::Parser);
        assert!(errors[0].message.starts_with("extraneous input '('"));
        let statements = query::find_all(&tree, tree.root(), &[RuleKind::Statement]);
        assert_eq!(statements.len(), 2);
        assert_eq!(tree.label(statements[0]), Some(AltLabel::ErrorStatement));
        assert_eq!(tree.label(statements[1]), None);
    }

    #[test]
    fn test_slash_terminator_is_oracle_only() {
        let text = "select 1\n/\nselect 2\n/\n";
        let mut errors = Vec::new();
        let engine = GrammarEngine::new(Dialect::OracleDb);
        let stream = engine.tokenize(text, &mut errors);
        let (tree, _) = engine.parse(&stream, StartSymbol::File, false, &mut errors);
        assert!(errors.is_empty());
        let statements = query::find_all(&tree, tree.root(), &[RuleKind::Statement]);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_embedded_start_symbols() {
        let (tree, errors) = parsed("select 1;", StartSymbol::EmbeddedSqlBody);
        assert!(errors.is_empty());
        assert_eq!(tree.kind(tree.root()), Some(RuleKind::EmbeddedSqlBody));
        // statement plus EOF sentinel
        assert_eq!(tree.children(tree.root()).len(), 2);

        let (tree, errors) = parsed("begin null; end", StartSymbol::EmbeddedProceduralBody);
        assert!(errors.is_empty());
        assert_eq!(tree.kind(tree.root()), Some(RuleKind::EmbeddedProceduralBody));
    }

    #[test]
    fn test_profile_rows_are_gathered() {
        let mut errors = Vec::new();
        let engine = GrammarEngine::new(Dialect::Generic);
        let stream = engine.tokenize("select 1;", &mut errors);
        let (_, profile) = engine.parse(&stream, StartSymbol::File, true, &mut errors);
        let profile = profile.expect("profiling requested");
        let file_row = &profile.decisions[Rule::File as usize];
        assert_eq!(file_row.rule, "file");
        assert_eq!(file_row.invocations, 1);
        let stmt_row = &profile.decisions[Rule::Statement as usize];
        assert_eq!(stmt_row.invocations, 1);
        assert_eq!(stmt_row.total_lookahead, 3);
    }

    #[test]
    fn test_pinned_stream_parses_identically() {
        let mut errors = Vec::new();
        let engine = GrammarEngine::new(Dialect::Generic);
        let pin = Pin {
            line: 3,
            column: 8,
            offset: 40,
        };
        let stream = engine.tokenize_pinned("select 1;", pin, &mut errors);
        let (tree, _) = engine.parse(&stream, StartSymbol::EmbeddedSqlBody, false, &mut errors);
        assert!(errors.is_empty());
        let first = tree.first_token(tree.root()).unwrap();
        assert_eq!((first.line, first.column, first.start), (3, 8, 40));
    }
}

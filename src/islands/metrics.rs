//! Lexer and parser metrics
//!
//! Metrics are informational only and never affect control flow. Durations
//! are wall-clock; memory figures are the byte growth of token/arena storage
//! during the measured phase (the reference engine has no runtime heap
//! probe). Profiling rows are gathered per parser rule when requested.

use std::time::Duration;

/// Metrics gathered while building the token stream and classifying scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexerMetrics {
    /// Time spent in the scope scanning pass.
    pub scope_time: Duration,
    /// Bytes of storage produced by the scope scanning pass.
    pub scope_memory: usize,
    /// Time spent in the main lexer.
    pub time: Duration,
    /// Bytes of storage produced by the main lexer.
    pub memory: usize,
}

/// One per-rule profiling row.
#[derive(Debug, Clone)]
pub struct DecisionMetrics {
    /// Rule name as used in the grammar.
    pub rule: &'static str,
    /// Stable decision id of the rule.
    pub decision: usize,
    /// Accumulated time spent in the rule.
    pub time: Duration,
    /// Number of rule invocations.
    pub invocations: u64,
    /// Total tokens of lookahead consulted across invocations.
    pub total_lookahead: u64,
    /// Largest lookahead consulted by a single invocation.
    pub max_lookahead: u64,
    /// Ambiguities detected (always 0 for the reference engine).
    pub ambiguities: u64,
    /// Errors recorded while the rule was active.
    pub errors: u64,
}

/// Profiling rows gathered during one parse.
#[derive(Debug, Clone, Default)]
pub struct ParseProfile {
    pub decisions: Vec<DecisionMetrics>,
}

impl ParseProfile {
    /// Rows with time spent > 0, sorted by time spent in descending order.
    pub fn relevant_decisions(&self) -> Vec<&DecisionMetrics> {
        let mut rows: Vec<&DecisionMetrics> = self
            .decisions
            .iter()
            .filter(|d| !d.time.is_zero())
            .collect();
        rows.sort_by(|a, b| b.time.cmp(&a.time));
        rows
    }
}

/// Metrics gathered while parsing, with optional profiling rows.
#[derive(Debug, Clone, Default)]
pub struct ParserMetrics {
    /// Time spent in the parser, embedded-code resolution included.
    pub time: Duration,
    /// Bytes of parse-tree storage produced.
    pub memory: usize,
    /// Profiling rows, present when profiling was requested.
    pub profile: Option<ParseProfile>,
}

impl ParserMetrics {
    /// Text report based on the gathered statistics.
    pub fn profile_report(&self) -> String {
        let mut out = String::new();
        out.push_str("Profile\n=======\n\n");
        out.push_str(&format!(
            "Total memory used by parser    : {} KB\n",
            self.memory / 1024
        ));
        out.push_str(&format!(
            "Total time spent in parser     : {} ms\n\n",
            self.time.as_millis()
        ));
        out.push_str(
            "Rule Name (Decision)                     Time (ms) Invocations Lookahead Max Lookahead Ambiguities Errors\n",
        );
        out.push_str(
            "---------------------------------------- --------- ----------- --------- ------------- ----------- ------\n",
        );
        if let Some(profile) = &self.profile {
            for row in profile.relevant_decisions() {
                let rule_and_decision = format!("{} ({})", row.rule, row.decision);
                out.push_str(&format!(
                    "{:<40.40}{:>10}{:>12}{:>10}{:>14}{:>12}{:>7}\n",
                    rule_and_decision,
                    row.time.as_millis(),
                    row.invocations,
                    row.total_lookahead,
                    row.max_lookahead,
                    row.ambiguities,
                    row.errors,
                ));
            }
        }
        out
    }
}

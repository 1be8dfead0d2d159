//! Flushable shared caches
//!
//! Two lazily built, process-wide tables exist: the scope classifier's
//! starter lookup and the literal decoder's compiled unicode-escape
//! patterns. Long-running hosts that want to release the memory between
//! workloads can flush them; each is rebuilt transparently on next use.

use crate::islands::literal;
use crate::islands::scope;

/// Drop the scope classifier's starter lookup table.
pub fn flush_classifier_cache() {
    scope::flush_scope_table();
}

/// Drop the literal decoder's compiled escape patterns.
pub fn flush_engine_cache() {
    literal::flush_escape_patterns();
}

/// Drop all shared caches.
pub fn flush_all() {
    flush_classifier_cache();
    flush_engine_cache();
}

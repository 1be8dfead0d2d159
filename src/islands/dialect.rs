//! SQL dialect selection
//!
//! The dialect picks the grammar/scope variant and decides whether embedded
//! code resolution is attempted at all. Detection is deliberately cheap: a
//! slash on its own line is the SQL*Plus / SQLcl convention to terminate a
//! DDL statement containing PL/SQL code, which is a low-false-positive signal
//! for Oracle scripts. Absence is not proof of non-Oracle, so the default is
//! the more permissive generic dialect.

use serde::Serialize;
use std::fmt;

/// Grammar and scope variant used to build a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    Generic,
    OracleDb,
    PostgreSql,
}

impl Dialect {
    /// Guess the dialect based on the script content.
    ///
    /// Selects [`Dialect::OracleDb`] if the text contains a slash on its own
    /// line (newline, `/`, newline), otherwise [`Dialect::Generic`].
    pub fn detect(sql: &str) -> Dialect {
        if sql.contains("\n/\n") {
            Dialect::OracleDb
        } else {
            Dialect::Generic
        }
    }

    /// Whether embedded code resolution is attempted for this dialect.
    ///
    /// Bodies supplied as string literals are a PostgreSQL construct, so only
    /// the generic and PostgreSQL dialects take part.
    pub fn supports_embedding(self) -> bool {
        matches!(self, Dialect::Generic | Dialect::PostgreSql)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Generic => write!(f, "generic"),
            Dialect::OracleDb => write!(f, "oracledb"),
            Dialect::PostgreSql => write!(f, "postgresql"),
        }
    }
}

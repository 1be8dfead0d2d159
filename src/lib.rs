//! # sql-islands
//!
//! A parser for islands of SQL and procedural SQL embedded in heterogeneous
//! scripts: client-tool commands, comments, arbitrary host text, and bodies
//! supplied as string literals inside `create function` / `create procedure` /
//! `do` statements.
//!
//! The entry point is [`islands::document::Document`]:
//!
//! ```rust-example
//! use sql_islands::islands::document::Document;
//!
//! let doc = Document::parse("prompt hello\nselect 1;\n");
//! assert!(doc.syntax_errors().is_empty());
//! ```
//!
//! Out-of-scope host text is kept in the token stream on the hidden channel,
//! so every character of the input stays reconstructable with its original
//! line and column.

pub mod islands;

#![allow(clippy::new_without_default)]

//! `lrpar` compiles a [`Language`](cfgrammar::Language) (named tokens with regular expressions,
//! plus productions over those tokens) into the tables a table driven parser needs:
//!
//!   * a minimal deterministic [`FiniteAutomaton`](lrlex::FiniteAutomaton) which recognises the
//!     language's tokens, with each token reported as its declaration index;
//!   * an LALR(1) [`StateTable`](lrtable::StateTable) for the language's grammar;
//!   * [`Indentation`] metadata for languages which use indentation to delimit blocks.
//!
//! For example, a simple calculator language can be compiled as follows:
//!
//! ```text
//! use cfgrammar::Language;
//! use lrpar::build_parser_tables;
//!
//! let lang = Language::new()
//!     .token("INT", "[0-9]+")
//!     .token("+", "\\+")
//!     .token("*", "\\*")
//!     .production("Expr", &["Sum"])
//!     .production("Sum", &["Sum", "+", "Term"])
//!     .production("Sum", &["Term"])
//!     .production("Term", &["Term", "*", "INT"])
//!     .production("Term", &["INT"]);
//! let tables = build_parser_tables(&lang)?;
//! ```
//!
//! The runtime which scans input through the lexical automaton and drives the state table is
//! not part of this crate: it consumes [`ParserTables`] read-only, so one set of tables can be
//! shared by any number of parsers.

mod builder;
mod indentation;

pub use crate::{
    builder::{BuildError, ParserTables, ParserTablesBuilder, build_parser_tables},
    indentation::{Indentation, IndentationError},
};

//! `lrlex` compiles the regular expressions of a [`cfgrammar::Language`]'s tokens into a single
//! deterministic [`FiniteAutomaton`]: the lexical table which a scanner uses to split input text
//! into tokens. Automata run over a fixed [alphabet](alphabet/index.html) of tab, newline,
//! carriage return, and printable ASCII.
//!
//! The [`fa`](fa/index.html) module contains the automaton algebra (Thompson-style constructors,
//! subset construction, and state merging) from which [`build_dfa`] and [`build_lexer`] are
//! built.

#![allow(clippy::new_without_default)]
#![allow(clippy::upper_case_acronyms)]

use std::{error::Error, fmt};

pub mod alphabet;
pub mod fa;
mod lexer;
pub mod regex;

pub use crate::{
    fa::FiniteAutomaton,
    lexer::{build_dfa, build_lexer},
    regex::{RegexError, RegexErrorKind},
};

/// Any error from building a lexer returns an instance of this struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexBuildError {
    pub kind: LexErrorKind,
    /// The name of the token whose definition is erroneous.
    pub token: String,
}

impl Error for LexBuildError {}

/// The various different possible lexer build errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexErrorKind {
    Regex(RegexError),
}

impl fmt::Display for LexBuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            LexErrorKind::Regex(ref e) => write!(
                f,
                "Invalid regular expression for token '{}': {e}",
                self.token
            ),
        }
    }
}

#![allow(clippy::new_without_default)]
#![allow(clippy::upper_case_acronyms)]

//! A library for manipulating the Context Free Grammars (CFG) from which LALR(1) parser tables are
//! built.
//!
//! CFG terminology is something of a mess, so this library uses some basic terminology guidelines
//! for major concepts:
//!
//!   * A *grammar* is an ordered sequence of *productions*.
//!   * A *production* is an ordered sequence of *symbols*.
//!   * A *rule* maps a name to one or more productions.
//!   * A *token* is the name of a syntactic element.
//!
//! For example, in the following grammar:
//!
//!   R1 ::= "a" "b" | R2
//!   R2 ::= "c"
//!
//! the following statements are true:
//!
//!   * There are 3 productions. 1: ["a", "b"] 2: ["R2"] 3: ["c"]
//!   * There are two rules: R1 and R2. The mapping to productions is {R1: {1, 2}, R2: {3}}
//!   * There are three tokens: a, b, and c.
//!
//! cfgrammar makes the following guarantees about grammars:
//!
//!   * Productions are numbered from `0` to `prods_len() - 1` (inclusive).
//!   * Rules are numbered from `0` to `rules_len() - 1` (inclusive).
//!   * Tokens are numbered from `0` to `tokens_len() - 1` (inclusive).
//!   * Every symbol also has a flat id ([`SymIdx`]): tokens come first, then rules.
//!   * The StorageT type used to store productions, rules, and token indices can be infallibly
//!     converted into usize (see [`TIdx`](struct.TIdx.html) and friends for more details).
//!
//! Grammars are normally built from a [`Language`] with
//! [`Language::build_grammar()`](language/struct.Language.html#method.build_grammar), which also
//! *augments* the grammar with an `EOF` token and an `ACCEPT ::= goal` production.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod firsts;
pub mod grammar;
mod idxnewtype;
pub mod language;
#[cfg(test)]
mod test_utils;

pub use firsts::Firsts;
pub use grammar::{ACCEPT_RULE, EOF_TOKEN, Grammar, GrammarError};
pub use language::{
    DEDENT_TOKEN, INDENT_TOKEN, Language, LanguageError, NEWLINE_TOKEN, ProductionDef, TokenDef,
};

/// A type specifically for rule indices.
pub use crate::idxnewtype::{PIdx, RIdx, SIdx, SymIdx, TIdx};

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Symbol<StorageT> {
    Rule(RIdx<StorageT>),
    Token(TIdx<StorageT>),
}

// Copyright (c) 2018 King's College London
// created by the Software Development Team <http://soft-dev.org/>
//
// The Universal Permissive License (UPL), Version 1.0
//
// Subject to the condition set forth below, permission is hereby granted to any person obtaining a
// copy of this software, associated documentation and/or data (collectively the "Software"), free
// of charge and under any and all copyright rights in the Software, and any and all patent rights
// owned or freely licensable by each licensor hereunder covering either (i) the unmodified
// Software as contributed to or provided by such licensor, or (ii) the Larger Works (as defined
// below), to deal in both
//
// (a) the Software, and
// (b) any piece of software and/or hardware listed in the lrgrwrks.txt file
// if one is included with the Software (each a "Larger Work" to which the Software is contributed
// by such licensors),
//
// without restriction, including without limitation the rights to copy, create derivative works
// of, display, perform, and distribute the Software and make, use, sell, offer for sale, import,
// export, have made, and have sold the Software and the Larger Work(s), and to sublicense the
// foregoing rights on either these or other terms.
//
// This license is subject to the following condition: The above copyright notice and either this
// complete permission notice or at a minimum a reference to the UPL must be included in all copies
// or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::{error::Error, fmt, marker::PhantomData, sync::Arc};

use cfgrammar::{Grammar, Language, LanguageError};
use log::{Level, debug, log_enabled, trace};
use lrlex::{FiniteAutomaton, LexBuildError, build_lexer};
use lrtable::{StateTable, build_lalr1_parser};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::indentation::{Indentation, IndentationError};

/// Everything a table driven runtime needs to lex and parse a language.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParserTables<StorageT = u32> {
    pub syntax_tables: StateTable<StorageT>,
    pub lexical_tables: FiniteAutomaton,
    pub indentation: Indentation<StorageT>,
}

impl<StorageT: 'static + PrimInt + Unsigned> ParserTables<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    pub fn grammar(&self) -> &Grammar<StorageT> {
        self.syntax_tables.grammar()
    }
}

/// Any error from building a language's tables.
#[derive(Debug)]
pub enum BuildError {
    Language(LanguageError),
    Lex(LexBuildError),
    Indentation(IndentationError),
    /// The grammar has conflicts and [`ParserTablesBuilder::error_on_conflicts`] was set.
    Conflicts { shift_reduce: u64, reduce_reduce: u64 },
}

impl Error for BuildError {}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            BuildError::Language(ref e) => e.fmt(f),
            BuildError::Lex(ref e) => e.fmt(f),
            BuildError::Indentation(ref e) => e.fmt(f),
            BuildError::Conflicts {
                shift_reduce,
                reduce_reduce,
            } => write!(
                f,
                "Grammar has {shift_reduce} Shift/Reduce and {reduce_reduce} Reduce/Reduce conflicts"
            ),
        }
    }
}

impl From<LanguageError> for BuildError {
    fn from(err: LanguageError) -> Self {
        BuildError::Language(err)
    }
}

impl From<LexBuildError> for BuildError {
    fn from(err: LexBuildError) -> Self {
        BuildError::Lex(err)
    }
}

impl From<IndentationError> for BuildError {
    fn from(err: IndentationError) -> Self {
        BuildError::Indentation(err)
    }
}

/// A `ParserTablesBuilder` allows one to specify the criteria for building a language's tables.
pub struct ParserTablesBuilder<StorageT = u32> {
    verbose: bool,
    error_on_conflicts: bool,
    phantom: PhantomData<StorageT>,
}

impl ParserTablesBuilder<u32> {
    /// Create a new `ParserTablesBuilder` with `u32` storage.
    ///
    /// # Examples
    ///
    /// ```text
    /// ParserTablesBuilder::new()
    ///     .verbose(true)
    ///     .build(&lang)?;
    /// ```
    pub fn new() -> Self {
        ParserTablesBuilder::<u32>::new_with_storaget()
    }
}

impl<StorageT: 'static + PrimInt + Unsigned> ParserTablesBuilder<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Create a new `ParserTablesBuilder`.
    ///
    /// `StorageT` must be an unsigned integer type (e.g. `u8`, `u16`) which is big enough to index
    /// (separately) all the tokens, rules, and productions in the grammar (including the EOF
    /// token and accept production which are added to every grammar) and less than or equal in
    /// size to `usize`. `StorageT` defaults to `u32` if unspecified.
    pub fn new_with_storaget() -> Self {
        ParserTablesBuilder {
            verbose: false,
            error_on_conflicts: false,
            phantom: PhantomData,
        }
    }

    /// If set to true, each conflict resolved while building the state table is logged as a
    /// warning. Defaults to `false`.
    pub fn verbose(mut self, b: bool) -> Self {
        self.verbose = b;
        self
    }

    /// If set to true, [`build`](#method.build) returns an error if the grammar contains any
    /// Shift/Reduce or Reduce/Reduce conflicts, rather than resolving them. Defaults to `false`.
    pub fn error_on_conflicts(mut self, b: bool) -> Self {
        self.error_on_conflicts = b;
        self
    }

    /// Build the lexical and syntax tables for `lang`.
    ///
    /// # Panics
    ///
    /// If `StorageT` is not big enough to index the grammar's tokens, rules, or productions.
    pub fn build(&self, lang: &Language) -> Result<ParserTables<StorageT>, BuildError> {
        let grm = lang.build_grammar_with_storaget::<StorageT>()?;
        let indentation = Indentation::new(&grm)?;
        let lexical_tables = build_lexer(lang)?;

        let pip = build_lalr1_parser(Arc::clone(&grm), self.verbose);
        if log_enabled!(Level::Trace) {
            trace!("LALR(1) automaton:\n{}", pip.pp());
        }
        let syntax_tables = StateTable::new(&pip);
        if self.error_on_conflicts && !syntax_tables.conflicts().is_empty() {
            return Err(BuildError::Conflicts {
                shift_reduce: syntax_tables.shift_reduce,
                reduce_reduce: syntax_tables.reduce_reduce,
            });
        }
        debug!(
            "Built tables: {} lexical states, {} parser states, {} conflicts resolved",
            lexical_tables.states_len(),
            usize::from(syntax_tables.states_len()),
            syntax_tables.conflicts().len()
        );
        Ok(ParserTables {
            syntax_tables,
            lexical_tables,
            indentation,
        })
    }
}

/// Build the tables for `lang` with the default settings of [`ParserTablesBuilder`].
pub fn build_parser_tables(lang: &Language) -> Result<ParserTables<u32>, BuildError> {
    ParserTablesBuilder::new().build(lang)
}

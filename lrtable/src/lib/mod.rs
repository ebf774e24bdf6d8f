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

//! `lrtable` builds LALR(1) parse tables for a [`cfgrammar::Grammar`]. Tables are built in two
//! steps: [`build_lalr1_parser`] discovers the LR(0) states of a grammar and computes their
//! lookaheads, producing a [`ParserInProgress`]; [`StateTable::new`] then resolves any conflicts
//! and freezes the result into dense action and goto tables. [`from_grammar`] does both.

#![allow(clippy::new_without_default)]

use std::sync::Arc;

use cfgrammar::Grammar;
use num_traits::{AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod graph;
pub mod itemset;
pub mod stategraph;
pub mod statetable;
#[cfg(test)]
mod test_utils;

pub use crate::{
    graph::Graph,
    itemset::{CfgIdx, Config, Configs},
    stategraph::{ActionInProgress, ParserInProgress, StateInProgress, build_lalr1_parser},
    statetable::{Action, Conflict, DriveError, StateTable},
};

type StIdxStorageT = u16;

/// StIdx is a wrapper for a state index. Its API is that of a u32, but it is stored as a u16.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// The biggest grammars we are aware of have just over 1000 states, so a u16 is big enough to
// store state indexes. Nevertheless, we tell the world we deal in u32 so that we can change our
// storage to u32 later transparently.
pub struct StIdx(StIdxStorageT);

impl StIdx {
    /// The largest representable state index, which is never a valid state.
    pub(crate) fn max_value() -> StIdx {
        StIdx(StIdxStorageT::MAX)
    }
}

impl From<u32> for StIdx {
    fn from(v: u32) -> Self {
        if v >= u32::from(StIdxStorageT::MAX) {
            panic!("Overflow");
        }
        StIdx(v as StIdxStorageT)
    }
}

impl From<usize> for StIdx {
    fn from(v: usize) -> Self {
        if v >= usize::from(StIdxStorageT::MAX) {
            panic!("Overflow");
        }
        StIdx(v as StIdxStorageT)
    }
}

impl From<StIdx> for usize {
    fn from(st: StIdx) -> Self {
        usize::from(st.0)
    }
}

impl From<StIdx> for u32 {
    fn from(st: StIdx) -> Self {
        u32::from(st.0)
    }
}

/// Build the LALR(1) state table for the augmented grammar `grm`. If `verbose` is true, each
/// conflict resolved while freezing the table is logged as a warning rather than at debug level.
///
/// # Panics
///
/// If `grm` has not been augmented, or has too many states to fit in a `StIdx`.
pub fn from_grammar<StorageT: 'static + PrimInt + Unsigned>(
    grm: Arc<Grammar<StorageT>>,
    verbose: bool,
) -> StateTable<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    let pip = build_lalr1_parser(grm, verbose);
    StateTable::new(&pip)
}

// Copyright (c) 2017 King's College London
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

use std::{
    error::Error,
    fmt::{self, Debug},
    sync::Arc,
};

use cfgrammar::{Grammar, PIdx, RIdx, Symbol, TIdx};
use log::{Level, log};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
use packedvec::PackedVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    StIdx,
    stategraph::{ActionInProgress, ParserInProgress},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Action<StorageT> {
    /// Shift to state X in the statetable.
    Shift(StIdx),
    /// Reduce production X in the grammar. Reducing the grammar's accept production means that
    /// the input has been accepted.
    Reduce(PIdx<StorageT>),
    /// No valid action: the input is erroneous.
    None,
}

const NONE: usize = 0;
const SHIFT: usize = 1;
const REDUCE: usize = 2;

/// A `(state, token)` cell which was given more than one action while building a `StateTable`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Conflict<StorageT> {
    pub stidx: StIdx,
    pub tidx: TIdx<StorageT>,
    /// The action which ended up in the table.
    pub kept: Action<StorageT>,
    /// The action which was thrown away.
    pub discarded: Action<StorageT>,
}

/// The error returned by [`StateTable::drive`] when a state has no action for the lookahead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DriveError<StorageT> {
    pub stidx: StIdx,
    pub tidx: TIdx<StorageT>,
}

impl<StorageT: PrimInt + Unsigned + Debug> Error for DriveError<StorageT> {}

impl<StorageT: PrimInt + Unsigned> fmt::Display for DriveError<StorageT> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "No action for token {} in state {}",
            usize::from(self.tidx),
            usize::from(self.stidx)
        )
    }
}

/// The frozen LALR(1) tables of a grammar: a dense `(state, token) -> Action` table and a dense
/// `(state, rule) -> state` goto table. Once built, a `StateTable` is never mutated.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateTable<StorageT> {
    grm: Arc<Grammar<StorageT>>,
    // The action table has a row per state and a column per token. Each action is encoded in a
    // usize whose lowest 2 bits are the kind of action and whose remaining bits are the shifted
    // state or reduced production.
    actions: PackedVec<usize>,
    // Empty gotos are `StIdx::max_value()`.
    gotos: Vec<StIdx>,
    states_len: StIdx,
    tokens_len: TIdx<StorageT>,
    rules_len: RIdx<StorageT>,
    conflicts: Vec<Conflict<StorageT>>,
    /// The number of shift/reduce conflicts resolved in favour of the shift.
    pub shift_reduce: u64,
    /// The number of reduce/reduce conflicts resolved in favour of the earlier production.
    pub reduce_reduce: u64,
}

impl<StorageT: 'static + PrimInt + Unsigned> StateTable<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Freeze `pip` into a `StateTable`. A `(state, token)` cell which would receive more than
    /// one action is resolved as Yacc does: a shift beats a reduce and, between two reduces, the
    /// production which comes earlier in the grammar wins.
    pub fn new(pip: &ParserInProgress<StorageT>) -> Self {
        let grm = pip.shared_grammar();
        let states_len = pip.states_len();
        let tokens_len = grm.tokens_len();
        let rules_len = grm.rules_len();
        // We only have usize-2 bits to store state IDs and production indexes.
        assert!(usize::from(grm.prods_len()) < (usize::MAX >> 2));

        let mut actions =
            vec![NONE; usize::from(states_len) * usize::from(tokens_len)];
        let mut gotos =
            vec![StIdx::max_value(); usize::from(states_len) * usize::from(rules_len)];
        let mut conflicts = Vec::new();
        let mut shift_reduce = 0;
        let mut reduce_reduce = 0;
        let level = if pip.verbose() {
            Level::Warn
        } else {
            Level::Debug
        };

        for stidx in pip.iter_stidxs() {
            for action in &pip.state(stidx).actions {
                match *action {
                    ActionInProgress::Shift {
                        symbol: Symbol::Rule(ridx),
                        target,
                    } => {
                        let off = gotos_offset(rules_len, stidx, ridx);
                        debug_assert!(gotos[off] == StIdx::max_value());
                        gotos[off] = target;
                    }
                    ActionInProgress::Shift {
                        symbol: Symbol::Token(tidx),
                        target,
                    } => {
                        let off = actions_offset(tokens_len, stidx, tidx);
                        let shift = Action::Shift(target);
                        match Self::decode(actions[off]) {
                            Action::None => (),
                            Action::Shift(_) => panic!("Internal error"),
                            old @ Action::Reduce(_) => {
                                shift_reduce += 1;
                                conflicts.push(Conflict {
                                    stidx,
                                    tidx,
                                    kept: shift,
                                    discarded: old,
                                });
                            }
                        }
                        actions[off] = Self::encode(shift);
                    }
                    ActionInProgress::Reduce { pidx, ref context } => {
                        for i in context.iter_set_bits(..) {
                            // Contexts are exactly tokens_len bits long, so the cast is safe.
                            let tidx = TIdx(i.as_());
                            let off = actions_offset(tokens_len, stidx, tidx);
                            let reduce = Action::Reduce(pidx);
                            let conflict = match Self::decode(actions[off]) {
                                Action::None => {
                                    actions[off] = Self::encode(reduce);
                                    continue;
                                }
                                shift @ Action::Shift(_) => {
                                    shift_reduce += 1;
                                    Conflict {
                                        stidx,
                                        tidx,
                                        kept: shift,
                                        discarded: reduce,
                                    }
                                }
                                Action::Reduce(old_pidx) => {
                                    reduce_reduce += 1;
                                    let (kept, discarded) = if pidx < old_pidx {
                                        (pidx, old_pidx)
                                    } else {
                                        (old_pidx, pidx)
                                    };
                                    actions[off] = Self::encode(Action::Reduce(kept));
                                    Conflict {
                                        stidx,
                                        tidx,
                                        kept: Action::Reduce(kept),
                                        discarded: Action::Reduce(discarded),
                                    }
                                }
                            };
                            conflicts.push(conflict);
                        }
                    }
                }
            }
        }

        for c in &conflicts {
            // The accept production is alone in its state and reduces only on EOF, which is
            // never shifted.
            debug_assert!(c.discarded != Action::Reduce(grm.accept_prod()));
            log!(
                level,
                "{} conflict in state {} on '{}': kept {}, discarded {}",
                match c.discarded {
                    Action::Reduce(_) if matches!(c.kept, Action::Shift(_)) => "Shift/reduce",
                    _ => "Reduce/reduce",
                },
                usize::from(c.stidx),
                grm.token_name(c.tidx),
                pp_action(&grm, c.kept),
                pp_action(&grm, c.discarded)
            );
        }

        StateTable {
            grm,
            actions: PackedVec::<usize>::new(actions),
            gotos,
            states_len,
            tokens_len,
            rules_len,
            conflicts,
            shift_reduce,
            reduce_reduce,
        }
    }

    fn decode(bits: usize) -> Action<StorageT> {
        let action = bits & 0b11;
        let val = bits >> 2;

        match action {
            // Since val was originally a StIdx, it fits into one.
            SHIFT => Action::Shift(StIdx::from(val)),
            REDUCE => Action::Reduce(PIdx(val.as_())),
            NONE => Action::None,
            _ => unreachable!(),
        }
    }

    fn encode(action: Action<StorageT>) -> usize {
        match action {
            Action::Shift(stidx) => SHIFT | (usize::from(stidx) << 2),
            Action::Reduce(pidx) => REDUCE | (usize::from(pidx) << 2),
            Action::None => NONE,
        }
    }

    pub fn grammar(&self) -> &Grammar<StorageT> {
        &self.grm
    }

    /// How many states does this table have?
    pub fn states_len(&self) -> StIdx {
        self.states_len
    }

    /// The state a parse starts in.
    pub fn start_state(&self) -> StIdx {
        StIdx::from(0u32)
    }

    /// The production whose reduction signals that the input has been accepted.
    pub fn accept_prod(&self) -> PIdx<StorageT> {
        self.grm.accept_prod()
    }

    /// Every conflict resolved while building this table, in the order they were found.
    pub fn conflicts(&self) -> &[Conflict<StorageT>] {
        &self.conflicts
    }

    /// Return the action for `stidx` and `tidx`. Panics if either is out of range.
    pub fn action(&self, stidx: StIdx, tidx: TIdx<StorageT>) -> Action<StorageT> {
        assert!(stidx < self.states_len && usize::from(tidx) < usize::from(self.tokens_len));
        let off = actions_offset(self.tokens_len, stidx, tidx);
        self.actions.get(off).map_or(Action::None, Self::decode)
    }

    /// Return the goto state for `stidx` and `ridx`, or `None` if there isn't any.
    pub fn goto(&self, stidx: StIdx, ridx: RIdx<StorageT>) -> Option<StIdx> {
        let off = gotos_offset(self.rules_len, stidx, ridx);
        match self.gotos[off] {
            x if x == StIdx::max_value() => None,
            x => Some(x),
        }
    }

    /// Execute `action` on the parse `stack` (whose top is the current state), returning the new
    /// current state. A shift pushes its state; a reduce pops one state per symbol of the
    /// production and then pushes the goto of the uncovered state over the production's rule.
    ///
    /// # Panics
    ///
    /// If `action` is `Action::None`, if the stack is too short for a reduction, or if there is
    /// no goto after a reduction (which is always the case for the accept production, whose
    /// reduction ends a parse rather than being executed).
    pub fn execute_action(&self, stack: &mut Vec<StIdx>, action: Action<StorageT>) -> StIdx {
        match action {
            Action::Shift(stidx) => {
                stack.push(stidx);
                stidx
            }
            Action::Reduce(pidx) => {
                let len = usize::from(self.grm.prod_len(pidx));
                assert!(stack.len() > len);
                stack.truncate(stack.len() - len);
                let top = stack[stack.len() - 1];
                let ridx = self.grm.prod_to_rule(pidx);
                match self.goto(top, ridx) {
                    Some(stidx) => {
                        stack.push(stidx);
                        stidx
                    }
                    None => panic!(
                        "No goto from state {} over {}",
                        usize::from(top),
                        self.grm.rule_name(ridx)
                    ),
                }
            }
            Action::None => panic!("Can't execute an empty action"),
        }
    }

    /// Run the tables over `tokens` followed by EOF, returning every action taken. A successful
    /// run ends with the reduction of the accept production. If a state has no action for the
    /// current lookahead, or the lookahead is not a token of this grammar, that state and
    /// lookahead are returned as an error.
    pub fn drive(
        &self,
        tokens: &[TIdx<StorageT>],
    ) -> Result<Vec<Action<StorageT>>, DriveError<StorageT>> {
        let eof = self.grm.eof_token_idx();
        let mut stack = vec![self.start_state()];
        let mut actions = Vec::new();
        let mut i = 0;
        loop {
            let stidx = stack[stack.len() - 1];
            let tidx = tokens.get(i).copied().unwrap_or(eof);
            if usize::from(tidx) >= usize::from(self.tokens_len) {
                return Err(DriveError { stidx, tidx });
            }
            let action = self.action(stidx, tidx);
            actions.push(action);
            match action {
                Action::None => return Err(DriveError { stidx, tidx }),
                Action::Reduce(pidx) if pidx == self.accept_prod() => return Ok(actions),
                Action::Shift(_) => i += 1,
                Action::Reduce(_) => (),
            }
            self.execute_action(&mut stack, action);
        }
    }
}

fn pp_action<StorageT: 'static + PrimInt + Unsigned>(
    grm: &Grammar<StorageT>,
    action: Action<StorageT>,
) -> String
where
    usize: AsPrimitive<StorageT>,
{
    match action {
        Action::Shift(stidx) => format!("shift {}", usize::from(stidx)),
        Action::Reduce(pidx) => format!("reduce {}", grm.pp_prod(pidx)),
        Action::None => "none".to_owned(),
    }
}

fn actions_offset<StorageT: PrimInt + Unsigned>(
    tokens_len: TIdx<StorageT>,
    stidx: StIdx,
    tidx: TIdx<StorageT>,
) -> usize {
    usize::from(stidx) * usize::from(tokens_len) + usize::from(tidx)
}

fn gotos_offset<StorageT: PrimInt + Unsigned>(
    rules_len: RIdx<StorageT>,
    stidx: StIdx,
    ridx: RIdx<StorageT>,
) -> usize {
    usize::from(stidx) * usize::from(rules_len) + usize::from(ridx)
}

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

use cfgrammar::{Grammar, PIdx, SIdx, Symbol};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
use vob::Vob;

/// The index of a [`Config`] in a [`Configs`] list.
pub type CfgIdx = usize;

/// An LR(0) configuration (also known as an "item"): a production `pidx` with a dot before the
/// symbol at offset `dot`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Config<StorageT> {
    pub pidx: PIdx<StorageT>,
    pub dot: SIdx<StorageT>,
}

/// Every configuration of a grammar. The configurations of a production are stored
/// contiguously in order of their dot, so advancing the dot of configuration `c` over a symbol
/// yields configuration `c + 1`.
#[derive(Debug)]
pub struct Configs<StorageT> {
    configs: Vec<Config<StorageT>>,
    /// A mapping from `PIdx` to the `CfgIdx` of the production's dot-0 configuration.
    prod_offs: Vec<CfgIdx>,
}

impl<StorageT: 'static + PrimInt + Unsigned> Configs<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    pub fn new(grm: &Grammar<StorageT>) -> Self {
        let mut configs = Vec::new();
        let mut prod_offs = Vec::with_capacity(usize::from(grm.prods_len()));
        for pidx in grm.iter_pidxs() {
            prod_offs.push(configs.len());
            for dot in 0..=grm.prod(pidx).len() {
                configs.push(Config {
                    pidx,
                    dot: SIdx(dot.as_()),
                });
            }
        }
        Configs { configs, prod_offs }
    }

    /// How many configurations are there?
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Return configuration `cfg`. Panics if `cfg` doesn't exist.
    pub fn get(&self, cfg: CfgIdx) -> Config<StorageT> {
        self.configs[cfg]
    }

    /// Return the index of the configuration `(pidx, dot)`.
    pub fn cfg_idx(&self, pidx: PIdx<StorageT>, dot: SIdx<StorageT>) -> CfgIdx {
        let cfg = self.prod_offs[usize::from(pidx)] + usize::from(dot);
        debug_assert!(self.configs[cfg] == Config { pidx, dot });
        cfg
    }

    /// Return the symbol after the dot of `cfg`, or `None` if the dot is at the end of the
    /// production (i.e. `cfg` is complete).
    pub fn next_symbol(&self, grm: &Grammar<StorageT>, cfg: CfgIdx) -> Option<Symbol<StorageT>> {
        let Config { pidx, dot } = self.configs[cfg];
        grm.prod(pidx).get(usize::from(dot)).copied()
    }

    /// Return the symbols after the symbol after the dot of `cfg` (i.e. `β` in `A -> α . X β`).
    pub fn rest<'a>(&self, grm: &'a Grammar<StorageT>, cfg: CfgIdx) -> &'a [Symbol<StorageT>] {
        let Config { pidx, dot } = self.configs[cfg];
        let prod = grm.prod(pidx);
        &prod[(usize::from(dot) + 1).min(prod.len())..]
    }

    /// Return the configuration reached by moving the dot of `cfg` over one symbol. Panics if
    /// `cfg` is complete.
    pub fn advance(&self, grm: &Grammar<StorageT>, cfg: CfgIdx) -> CfgIdx {
        assert!(self.next_symbol(grm, cfg).is_some());
        cfg + 1
    }

    /// Return the closure of `seed`: the smallest superset of `seed` such that for every member
    /// `A -> α . B β`, the set also contains `B -> . γ` for every production of `B`. The result
    /// is sorted and contains no duplicates, so it can be compared directly with other closures.
    pub fn close(&self, grm: &Grammar<StorageT>, seed: &[CfgIdx]) -> Vec<CfgIdx> {
        let mut members = Vob::from_elem(false, self.configs.len());
        // Once a rule's productions have been added, there's no point looking at it again.
        let mut rules_seen = Vob::from_elem(false, usize::from(grm.rules_len()));
        let mut todo = Vec::with_capacity(seed.len());
        for &cfg in seed {
            if !members[cfg] {
                members.set(cfg, true);
                todo.push(cfg);
            }
        }
        while let Some(cfg) = todo.pop() {
            if let Some(Symbol::Rule(ridx)) = self.next_symbol(grm, cfg) {
                if rules_seen[usize::from(ridx)] {
                    continue;
                }
                rules_seen.set(usize::from(ridx), true);
                for &pidx in grm.rule_to_prods(ridx) {
                    let new = self.prod_offs[usize::from(pidx)];
                    if !members[new] {
                        members.set(new, true);
                        todo.push(new);
                    }
                }
            }
        }
        members.iter_set_bits(..).collect()
    }

    /// Format `cfg` as `lhs -> α . β`.
    pub fn pp(&self, grm: &Grammar<StorageT>, cfg: CfgIdx) -> String {
        let Config { pidx, dot } = self.configs[cfg];
        let mut s = format!("{} ->", grm.rule_name(grm.prod_to_rule(pidx)));
        for (i, sym) in grm.prod(pidx).iter().enumerate() {
            if i == usize::from(dot) {
                s.push_str(" .");
            }
            match *sym {
                Symbol::Token(tidx) => s.push_str(&format!(" '{}'", grm.token_name(tidx))),
                Symbol::Rule(ridx) => s.push_str(&format!(" {}", grm.rule_name(ridx))),
            }
        }
        if usize::from(dot) == grm.prod(pidx).len() {
            s.push_str(" .");
        }
        s
    }
}

use std::marker::PhantomData;

use num_traits::{AsPrimitive, PrimInt, Unsigned};
use vob::Vob;

use crate::{Grammar, RIdx, Symbol};

/// The FIRST set and nullability of every rule in a grammar. For example, given this grammar:
/// ```text
///   S ::= A 'b'
///   A ::= 'a'
///       | <empty>
/// ```
/// FIRST(S) is `{'a', 'b'}`, FIRST(A) is `{'a'}`, and only `A` is nullable.
#[derive(Debug)]
pub struct Firsts<StorageT> {
    firsts: Vec<Vob>,
    epsilons: Vob,
    phantom: PhantomData<StorageT>,
}

impl<StorageT: 'static + PrimInt + Unsigned> Firsts<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Compute the FIRST sets of `grm`'s rules.
    pub fn new(grm: &Grammar<StorageT>) -> Self {
        let mut firsts = Firsts {
            firsts: vec![
                Vob::from_elem(false, usize::from(grm.tokens_len()));
                usize::from(grm.rules_len())
            ],
            epsilons: Vob::from_elem(false, usize::from(grm.rules_len())),
            phantom: PhantomData,
        };

        // Each production contributes FIRST of its whole rhs to its rule. Repeat until nothing
        // grows.
        loop {
            let mut changed = false;
            for pidx in grm.iter_pidxs() {
                let ridx = usize::from(grm.prod_to_rule(pidx));
                let mut first = firsts.firsts[ridx].clone();
                let nullable = firsts.seq_firsts(grm.prod(pidx), &mut first);
                if first != firsts.firsts[ridx] {
                    firsts.firsts[ridx] = first;
                    changed = true;
                }
                if nullable && !firsts.epsilons[ridx] {
                    firsts.epsilons.set(ridx, true);
                    changed = true;
                }
            }
            if !changed {
                return firsts;
            }
        }
    }

    /// Return the tokens which can begin a string derived from `ridx`.
    pub fn firsts(&self, ridx: RIdx<StorageT>) -> &Vob {
        &self.firsts[usize::from(ridx)]
    }

    /// Can `ridx` derive the empty string?
    pub fn is_epsilon_set(&self, ridx: RIdx<StorageT>) -> bool {
        self.epsilons[usize::from(ridx)]
    }

    /// Add FIRST(`seq`) to `ctx` (which must be `tokens_len` bits long), returning true if `seq`
    /// can derive the empty string.
    pub fn seq_firsts(&self, seq: &[Symbol<StorageT>], ctx: &mut Vob) -> bool {
        for sym in seq {
            match *sym {
                Symbol::Token(tidx) => {
                    ctx.set(usize::from(tidx), true);
                    return false;
                }
                Symbol::Rule(ridx) => {
                    ctx.or(self.firsts(ridx));
                    if !self.is_epsilon_set(ridx) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
};

use log::{debug, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::alphabet::{self, SYMBOLS_LEN};

/// A finite automaton over the symbols `0..symbols_len()`, stored as a dense `(state, symbol) ->
/// state` table. State 0 is the start state. Each state may accept a single token id.
///
/// Nondeterministic automata have two extra epsilon columns (`epsilon0` and `epsilon1`) after
/// the symbol columns; a state has at most one outgoing transition per column, so two epsilon
/// columns are enough to express the constructions in this module. Accepting states never have
/// outgoing epsilon transitions.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FiniteAutomaton {
    symbols_len: usize,
    deterministic: bool,
    /// A row-major `states_len() * cols()` table.
    table: Vec<Option<usize>>,
    /// A mapping from state -> accepted token.
    accepted: Vec<Option<usize>>,
}

impl FiniteAutomaton {
    /// Create an automaton with no states.
    pub fn new(symbols_len: usize, deterministic: bool) -> Self {
        FiniteAutomaton {
            symbols_len,
            deterministic,
            table: Vec::new(),
            accepted: Vec::new(),
        }
    }

    pub fn states_len(&self) -> usize {
        self.accepted.len()
    }

    pub fn symbols_len(&self) -> usize {
        self.symbols_len
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// The column of the first epsilon transition. Panics if this automaton is deterministic.
    pub fn epsilon0(&self) -> usize {
        assert!(!self.deterministic);
        self.symbols_len
    }

    /// The column of the second epsilon transition. Panics if this automaton is deterministic.
    pub fn epsilon1(&self) -> usize {
        assert!(!self.deterministic);
        self.symbols_len + 1
    }

    fn cols(&self) -> usize {
        if self.deterministic {
            self.symbols_len
        } else {
            self.symbols_len + 2
        }
    }

    /// Add a state with no transitions which accepts nothing, returning its index.
    pub fn add_state(&mut self) -> usize {
        let state = self.states_len();
        let cols = self.cols();
        self.table.resize(self.table.len() + cols, None);
        self.accepted.push(None);
        state
    }

    /// Add a transition `from -(sym)-> to`. `sym` may be an epsilon column.
    ///
    /// # Panics
    ///
    /// If either state or `sym` is out of range, or if `from` already has a transition on `sym`.
    pub fn add_transition(&mut self, from: usize, sym: usize, to: usize) {
        assert!(to < self.states_len());
        let off = self.offset(from, sym);
        assert!(
            self.table[off].is_none(),
            "state {from} already has a transition on {sym}"
        );
        self.table[off] = Some(to);
    }

    /// Mark `state` as accepting `token`.
    pub fn add_accept(&mut self, state: usize, token: usize) {
        self.accepted[state] = Some(token);
    }

    /// Mark `state` as non-accepting.
    pub fn remove_accept(&mut self, state: usize) {
        self.accepted[state] = None;
    }

    /// Return the state reached from `state` on `sym` (which may be an epsilon column), if any.
    pub fn step(&self, state: usize, sym: usize) -> Option<usize> {
        self.table[self.offset(state, sym)]
    }

    /// Return the token accepted by `state`, if any.
    pub fn accepted(&self, state: usize) -> Option<usize> {
        self.accepted[state]
    }

    fn offset(&self, state: usize, sym: usize) -> usize {
        assert!(state < self.states_len());
        assert!(sym < self.cols());
        state * self.cols() + sym
    }

    fn row(&self, state: usize) -> &[Option<usize>] {
        let cols = self.cols();
        &self.table[state * cols..(state + 1) * cols]
    }

    /// Append a copy of `other`'s states (and their transitions and accepted tokens) to this
    /// automaton, offset by `self.states_len()`.
    pub fn append_states(&mut self, other: &FiniteAutomaton) {
        assert_eq!(self.symbols_len, other.symbols_len);
        assert!(other.deterministic || !self.deterministic);
        let off = self.states_len();
        for state in 0..other.states_len() {
            let new = self.add_state();
            if let Some(token) = other.accepted(state) {
                self.add_accept(new, token);
            }
        }
        for state in 0..other.states_len() {
            for (sym, next) in other.row(state).iter().enumerate() {
                if let Some(next) = *next {
                    self.add_transition(state + off, sym, next + off);
                }
            }
        }
    }

    /// An automaton accepting exactly the one-symbol string `sym`.
    pub fn make_single(symbols_len: usize, sym: usize, token: usize) -> Self {
        Self::make_range(symbols_len, sym, sym, token)
    }

    /// An automaton accepting any one-symbol string in the inclusive range `first..=last`.
    pub fn make_range(symbols_len: usize, first: usize, last: usize, token: usize) -> Self {
        assert!(first <= last && last < symbols_len);
        Self::make_set(symbols_len, first..=last, token)
    }

    /// An automaton accepting any one-symbol string in `syms`.
    pub fn make_set<I>(symbols_len: usize, syms: I, token: usize) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut fa = FiniteAutomaton::new(symbols_len, true);
        let start = fa.add_state();
        let accept = fa.add_state();
        for sym in syms {
            fa.add_transition(start, sym, accept);
        }
        fa.add_accept(accept, token);
        fa
    }

    /// An automaton accepting the union of `a`'s and `b`'s languages. Each string keeps the
    /// token its original automaton accepted it with.
    pub fn unite(a: &FiniteAutomaton, b: &FiniteAutomaton) -> Self {
        let mut fa = FiniteAutomaton::new(a.symbols_len, false);
        let start = fa.add_state();
        let a_off = fa.states_len();
        fa.append_states(a);
        let b_off = fa.states_len();
        fa.append_states(b);
        fa.add_transition(start, fa.epsilon0(), a_off);
        fa.add_transition(start, fa.epsilon1(), b_off);
        fa
    }

    /// An automaton accepting `a`'s language followed by `b`'s, labelled `token`.
    pub fn concat(a: &FiniteAutomaton, b: &FiniteAutomaton, token: usize) -> Self {
        let mut fa = FiniteAutomaton::new(a.symbols_len, false);
        fa.append_states(a);
        let b_off = fa.states_len();
        fa.append_states(b);
        let eps0 = fa.epsilon0();
        for state in 0..a.states_len() {
            if a.accepted(state).is_some() {
                fa.add_transition(state, eps0, b_off);
                fa.remove_accept(state);
            }
        }
        for state in 0..b.states_len() {
            if b.accepted(state).is_some() {
                fa.add_accept(state + b_off, token);
            }
        }
        fa
    }

    /// An automaton accepting one or more repetitions of `a`'s language, labelled `token`.
    pub fn plus(a: &FiniteAutomaton, token: usize) -> Self {
        let mut fa = FiniteAutomaton::new(a.symbols_len, false);
        fa.append_states(a);
        let accept = fa.add_state();
        fa.add_accept(accept, token);
        let (eps0, eps1) = (fa.epsilon0(), fa.epsilon1());
        for state in 0..a.states_len() {
            if a.accepted(state).is_some() {
                fa.add_transition(state, eps0, accept);
                fa.add_transition(state, eps1, 0);
                fa.remove_accept(state);
            }
        }
        fa
    }

    /// An automaton accepting the empty string or `a`'s language, labelled `token`.
    pub fn maybe(a: &FiniteAutomaton, token: usize) -> Self {
        let mut fa = FiniteAutomaton::new(a.symbols_len, false);
        let start = fa.add_state();
        let off = fa.states_len();
        fa.append_states(a);
        let accept = fa.add_state();
        let (eps0, eps1) = (fa.epsilon0(), fa.epsilon1());
        fa.add_transition(start, eps1, off);
        // Thread an eps0 chain from the new start state through each of a's accepting states to
        // the new accepting state.
        let mut last = start;
        for state in 0..a.states_len() {
            if a.accepted(state).is_some() {
                fa.add_transition(last, eps0, state + off);
                fa.remove_accept(state + off);
                last = state + off;
            }
        }
        fa.add_transition(last, eps0, accept);
        fa.add_accept(accept, token);
        fa
    }

    /// An automaton accepting zero or more repetitions of `a`'s language, labelled `token`.
    pub fn star(a: &FiniteAutomaton, token: usize) -> Self {
        Self::maybe(&Self::plus(a, token), token)
    }

    fn epsilon_closure(&self, mut states: BTreeSet<usize>) -> BTreeSet<usize> {
        if self.deterministic {
            return states;
        }
        let mut todo = states.iter().cloned().collect::<Vec<_>>();
        while let Some(state) = todo.pop() {
            for eps in [self.epsilon0(), self.epsilon1()] {
                if let Some(next) = self.step(state, eps) {
                    if states.insert(next) {
                        todo.push(next);
                    }
                }
            }
        }
        states
    }

    fn step_set(&self, states: &BTreeSet<usize>, sym: usize) -> BTreeSet<usize> {
        states.iter().filter_map(|&s| self.step(s, sym)).collect()
    }

    /// The token a set of states accepts: the minimum token id accepted by any of its members.
    fn min_accepted(&self, states: &BTreeSet<usize>) -> Option<usize> {
        states.iter().filter_map(|&s| self.accepted(s)).min()
    }

    /// Convert `nfa` into an equivalent deterministic automaton using the subset construction. A
    /// DFA state which corresponds to several accepting NFA states accepts the minimum of their
    /// token ids, so tokens declared earlier take priority. A deterministic `nfa` is returned
    /// unchanged.
    pub fn make_deterministic(nfa: &FiniteAutomaton) -> Self {
        if nfa.deterministic {
            return nfa.clone();
        }
        let mut dfa = FiniteAutomaton::new(nfa.symbols_len, true);
        let mut sets = Vec::new();
        let mut set_states = BTreeMap::new();
        let start = nfa.epsilon_closure(BTreeSet::from([0]));
        set_states.insert(start.clone(), dfa.add_state());
        sets.push(start);
        let mut todo = VecDeque::from([0]);
        while let Some(state) = todo.pop_front() {
            for sym in 0..nfa.symbols_len {
                let next = nfa.step_set(&sets[state], sym);
                if next.is_empty() {
                    continue;
                }
                let next = nfa.epsilon_closure(next);
                let next_state = match set_states.get(&next) {
                    Some(&s) => s,
                    None => {
                        let s = dfa.add_state();
                        set_states.insert(next.clone(), s);
                        sets.push(next);
                        todo.push_back(s);
                        s
                    }
                };
                dfa.add_transition(state, sym, next_state);
            }
            if let Some(token) = nfa.min_accepted(&sets[state]) {
                dfa.add_accept(state, token);
            }
        }
        debug!(
            "Determinised an NFA of {} states into a DFA of {} states",
            nfa.states_len(),
            dfa.states_len()
        );
        dfa
    }

    /// Merge states with identical accepted tokens and identical transition rows. Each group is
    /// represented by its first (lowest numbered) member, so the start state stays at 0.
    pub fn simplify_once(fa: &FiniteAutomaton) -> Self {
        let mut rows = BTreeMap::new();
        let mut simple_of = Vec::with_capacity(fa.states_len());
        for state in 0..fa.states_len() {
            let n = rows.len();
            let simple = *rows.entry((fa.accepted(state), fa.row(state))).or_insert(n);
            simple_of.push(simple);
        }
        let mut out = FiniteAutomaton::new(fa.symbols_len, fa.deterministic);
        for _ in 0..rows.len() {
            out.add_state();
        }
        let mut done = vec![false; rows.len()];
        for state in 0..fa.states_len() {
            let simple = simple_of[state];
            if done[simple] {
                continue;
            }
            for (sym, next) in fa.row(state).iter().enumerate() {
                if let Some(next) = *next {
                    out.add_transition(simple, sym, simple_of[next]);
                }
            }
            if let Some(token) = fa.accepted(state) {
                out.add_accept(simple, token);
            }
            done[simple] = true;
        }
        out
    }

    /// Repeatedly [`simplify_once`](#method.simplify_once) until no more states are merged.
    pub fn simplify(fa: &FiniteAutomaton) -> Self {
        let (out, passes) = Self::simplify_passes(fa);
        if passes > 2 {
            warn!("Simplifying an automaton of {} states took {passes} passes", fa.states_len());
        }
        out
    }

    /// Simplify `fa`, also returning how many passes of `simplify_once` were run. The last pass
    /// always merges nothing.
    fn simplify_passes(fa: &FiniteAutomaton) -> (Self, usize) {
        let mut out = Self::simplify_once(fa);
        let mut passes = 1;
        let mut prev_len = fa.states_len();
        while out.states_len() < prev_len {
            prev_len = out.states_len();
            out = Self::simplify_once(&out);
            passes += 1;
        }
        (out, passes)
    }

    /// Run this automaton over `syms`, returning the token accepted at the end, if any. For a
    /// nondeterministic automaton this is the minimum token accepted by any reachable state.
    pub fn accepts(&self, syms: &[usize]) -> Option<usize> {
        if self.states_len() == 0 {
            return None;
        }
        let mut states = self.epsilon_closure(BTreeSet::from([0]));
        for &sym in syms {
            if sym >= self.symbols_len {
                return None;
            }
            states = self.epsilon_closure(self.step_set(&states, sym));
            if states.is_empty() {
                return None;
            }
        }
        self.min_accepted(&states)
    }

    /// As [`accepts`](#method.accepts), but over text. Returns `None` if `s` contains a character
    /// outside the alphabet.
    pub fn accepts_str(&self, s: &str) -> Option<usize> {
        assert_eq!(self.symbols_len, SYMBOLS_LEN);
        let syms = s.chars().map(alphabet::symbol).collect::<Option<Vec<_>>>()?;
        self.accepts(&syms)
    }
}

impl fmt::Display for FiniteAutomaton {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = if self.deterministic { "dfa" } else { "nfa" };
        writeln!(
            f,
            "{kind} {} states {} symbols",
            self.states_len(),
            self.symbols_len
        )?;
        for state in 0..self.states_len() {
            for sym in 0..self.symbols_len {
                if let Some(next) = self.step(state, sym) {
                    if self.symbols_len == SYMBOLS_LEN {
                        let c = alphabet::escape(alphabet::char_of(sym));
                        writeln!(f, "({state}, {c}) -> {next}")?;
                    } else {
                        writeln!(f, "({state}, {sym}) -> {next}")?;
                    }
                }
            }
            if !self.deterministic {
                for (i, eps) in [self.epsilon0(), self.epsilon1()].into_iter().enumerate() {
                    if let Some(next) = self.step(state, eps) {
                        writeln!(f, "({state}, eps{i}) -> {next}")?;
                    }
                }
            }
            if let Some(token) = self.accepted(state) {
                writeln!(f, "{state} accepts {token}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::FiniteAutomaton as FA;
    use crate::alphabet::{SYMBOLS_LEN, symbol};

    const A: usize = 0;
    const B: usize = 1;
    const C: usize = 2;
    const NSYMS: usize = 3;

    /// Every string over `0..NSYMS` of length at most `max_len`, paired with the token `fa`
    /// accepts it with.
    fn language(fa: &FA, max_len: usize) -> Vec<(Vec<usize>, usize)> {
        let mut out = Vec::new();
        let mut frontier = vec![vec![]];
        for _ in 0..=max_len {
            let mut next = Vec::new();
            for s in frontier {
                if let Some(tok) = fa.accepts(&s) {
                    out.push((s.clone(), tok));
                }
                for sym in 0..NSYMS {
                    let mut t = s.clone();
                    t.push(sym);
                    next.push(t);
                }
            }
            frontier = next;
        }
        out
    }

    fn strs(lang: &[(Vec<usize>, usize)]) -> Vec<Vec<usize>> {
        lang.iter().map(|(s, _)| s.clone()).collect()
    }

    fn check_equivalent(fa: &FA) {
        let d = FA::make_deterministic(fa);
        let s = FA::simplify(&d);
        assert_eq!(language(fa, 4), language(&d, 4));
        assert_eq!(language(&d, 4), language(&s, 4));
        assert!(s.states_len() <= d.states_len());
        assert_eq!(FA::simplify(&s), s);
    }

    #[test]
    fn test_primitives() {
        let fa = FA::make_single(NSYMS, B, 7);
        assert!(fa.is_deterministic());
        assert_eq!(fa.states_len(), 2);
        assert_eq!(strs(&language(&fa, 3)), vec![vec![B]]);
        assert_eq!(fa.accepts(&[B]), Some(7));

        let fa = FA::make_range(NSYMS, A, B, 0);
        assert_eq!(strs(&language(&fa, 2)), vec![vec![A], vec![B]]);

        let fa = FA::make_set(NSYMS, [A, C], 0);
        assert_eq!(strs(&language(&fa, 2)), vec![vec![A], vec![C]]);
    }

    #[test]
    fn test_concat() {
        let fa = FA::concat(&FA::make_single(NSYMS, A, 0), &FA::make_single(NSYMS, B, 0), 3);
        assert!(!fa.is_deterministic());
        assert_eq!(language(&fa, 4), vec![(vec![A, B], 3)]);
        check_equivalent(&fa);
    }

    #[test]
    fn test_unite() {
        let fa = FA::unite(&FA::make_single(NSYMS, A, 0), &FA::make_single(NSYMS, B, 1));
        assert_eq!(language(&fa, 4), vec![(vec![A], 0), (vec![B], 1)]);
        check_equivalent(&fa);
    }

    #[test]
    fn test_star_plus_maybe() {
        let a = FA::make_single(NSYMS, A, 0);
        let star = FA::star(&a, 0);
        assert_eq!(
            strs(&language(&star, 3)),
            vec![vec![], vec![A], vec![A, A], vec![A, A, A]]
        );
        check_equivalent(&star);

        let plus = FA::plus(&a, 0);
        assert_eq!(
            strs(&language(&plus, 3)),
            vec![vec![A], vec![A, A], vec![A, A, A]]
        );
        check_equivalent(&plus);

        let maybe = FA::maybe(&a, 0);
        assert_eq!(strs(&language(&maybe, 3)), vec![vec![], vec![A]]);
        check_equivalent(&maybe);
    }

    #[test]
    fn test_accepting_states_have_no_epsilons() {
        let ab = FA::concat(&FA::make_single(NSYMS, A, 0), &FA::make_single(NSYMS, B, 0), 0);
        let fa = FA::star(&FA::unite(&ab, &FA::plus(&FA::make_single(NSYMS, C, 0), 0)), 0);
        for state in 0..fa.states_len() {
            if fa.accepted(state).is_some() {
                assert_eq!(fa.step(state, fa.epsilon0()), None);
                assert_eq!(fa.step(state, fa.epsilon1()), None);
            }
        }
        check_equivalent(&fa);
    }

    #[test]
    fn test_make_deterministic_idempotent() {
        let fa = FA::star(
            &FA::unite(&FA::make_single(NSYMS, A, 0), &FA::make_single(NSYMS, B, 0)),
            0,
        );
        let d = FA::make_deterministic(&fa);
        assert!(d.is_deterministic());
        assert_eq!(FA::make_deterministic(&d), d);
    }

    #[test]
    fn test_tie_break() {
        let t0 = FA::make_single(NSYMS, A, 0);
        let t1 = FA::make_single(NSYMS, A, 1);
        for fa in [FA::unite(&t0, &t1), FA::unite(&t1, &t0)] {
            let d = FA::simplify(&FA::make_deterministic(&fa));
            assert_eq!(d.accepts(&[A]), Some(0));
        }
    }

    #[test]
    fn test_simplify_merges() {
        // (a|b)c determinises into a DFA whose `a` and `b` successors are indistinguishable.
        let ab = FA::unite(&FA::make_single(NSYMS, A, 0), &FA::make_single(NSYMS, B, 0));
        let fa = FA::concat(&ab, &FA::make_single(NSYMS, C, 0), 0);
        let d = FA::make_deterministic(&fa);
        assert_eq!(d.states_len(), 4);
        let s = FA::simplify(&d);
        assert_eq!(s.states_len(), 3);
        assert_eq!(s.step(0, A), s.step(0, B));
        check_equivalent(&fa);
    }

    #[test]
    fn test_simplify_chains() {
        // ab(a) | bb(a): the two tails are only found to be equal one state per pass, starting
        // from their accepting ends.
        let mut fa = FA::new(NSYMS, true);
        for _ in 0..7 {
            fa.add_state();
        }
        fa.add_transition(0, A, 1);
        fa.add_transition(1, B, 2);
        fa.add_transition(2, A, 3);
        fa.add_transition(0, B, 4);
        fa.add_transition(4, B, 5);
        fa.add_transition(5, A, 6);
        fa.add_accept(3, 0);
        fa.add_accept(6, 0);

        assert_eq!(FA::simplify_once(&fa).states_len(), 6);
        let (s, passes) = FA::simplify_passes(&fa);
        assert_eq!(passes, 4);
        assert_eq!(s.states_len(), 4);
        assert_eq!(s.step(0, A), s.step(0, B));
        assert_eq!(strs(&language(&s, 4)), vec![vec![A, B, A], vec![B, B, A]]);
        assert_eq!(FA::simplify(&fa), s);
    }

    #[test]
    fn test_accepts_str() {
        let x = symbol('x').unwrap();
        let fa = FA::plus(&FA::make_single(SYMBOLS_LEN, x, 2), 2);
        assert_eq!(fa.accepts_str("xxx"), Some(2));
        assert_eq!(fa.accepts_str(""), None);
        assert_eq!(fa.accepts_str("xy"), None);
        assert_eq!(fa.accepts_str("xé"), None);
    }

    #[test]
    fn test_display() {
        let fa = FA::concat(
            &FA::make_single(SYMBOLS_LEN, symbol('\n').unwrap(), 0),
            &FA::make_single(SYMBOLS_LEN, symbol('a').unwrap(), 0),
            1,
        );
        assert_eq!(
            fa.to_string(),
            "nfa 4 states 98 symbols
(0, \\n) -> 1
(1, eps0) -> 2
(2, a) -> 3
3 accepts 1
"
        );
        let d = FA::simplify(&FA::make_deterministic(&fa));
        assert_eq!(
            d.to_string(),
            "dfa 3 states 98 symbols
(0, \\n) -> 1
(1, a) -> 2
2 accepts 1
"
        );
    }

    #[test]
    #[should_panic]
    fn test_duplicate_transition() {
        let mut fa = FA::make_single(NSYMS, A, 0);
        fa.add_transition(0, A, 0);
    }
}

use std::{error::Error, fmt};

use num_traits::{self, AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vob::Vob;

use crate::{PIdx, RIdx, SIdx, SymIdx, Symbol, TIdx, firsts::Firsts};

/// The name given to the token inserted by [`Grammar::add_end_terminal`].
pub const EOF_TOKEN: &str = "EOF";
/// The name given to the rule inserted by [`Grammar::add_accept_production`].
pub const ACCEPT_RULE: &str = "ACCEPT";

/// Representation of a `Grammar`. See the [top-level documentation](../index.html) for the
/// guarantees this struct makes about rules, tokens, productions, and symbols.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Grammar<StorageT = u32> {
    /// A mapping from `SymIdx` -> name: token names come first, followed by rule names.
    symbol_names: Vec<String>,
    /// How many tokens does this grammar have?
    tokens_len: TIdx<StorageT>,
    /// How many rules does this grammar have?
    rules_len: RIdx<StorageT>,
    /// A list of all productions.
    prods: Vec<Vec<Symbol<StorageT>>>,
    /// A mapping from `PIdx` -> `RIdx`.
    prods_rules: Vec<RIdx<StorageT>>,
    /// A mapping from `RIdx` -> `Vec<PIdx>`.
    rules_prods: Vec<Vec<PIdx<StorageT>>>,
    /// The offset of the EOF token, once it has been added.
    eof_token_idx: Option<TIdx<StorageT>>,
    /// The offset of the `ACCEPT -> goal` production, once it has been added.
    accept_prod: Option<PIdx<StorageT>>,
}

impl<StorageT: 'static + PrimInt + Unsigned> Grammar<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Create a raw (i.e. unaugmented) grammar. The first `tokens_len` entries of `symbol_names`
    /// name tokens and the rest name rules. Each production is a pair `(lhs, rhs)` of flat symbol
    /// ids (i.e. offsets into `symbol_names`), and `lhs` must be a rule.
    ///
    /// # Panics
    ///
    /// If a symbol id is out of range, if a production's lhs is a token, or if `StorageT` is not
    /// big enough to index the grammar (with room for the EOF token and accept production).
    pub fn new(
        tokens_len: usize,
        symbol_names: Vec<String>,
        prods: Vec<(usize, Vec<usize>)>,
    ) -> Self {
        assert!(tokens_len <= symbol_names.len());
        let max: usize = num_traits::cast(StorageT::max_value()).unwrap();
        // The EOF token and the accept rule are added later, so two extra symbols must fit.
        if symbol_names.len() + 2 > max {
            panic!("StorageT is not big enough to store this grammar's symbols.");
        }
        if prods.len() + 1 > max {
            panic!("StorageT is not big enough to store this grammar's productions.");
        }
        if prods.iter().any(|(_, rhs)| rhs.len() >= max) {
            panic!("StorageT is not big enough to store the symbols of one of this grammar's productions.");
        }

        let symbols_len = symbol_names.len();
        let classify = |s: usize| {
            assert!(s < symbols_len, "symbol {s} out of range");
            if s < tokens_len {
                Symbol::Token(TIdx(s.as_()))
            } else {
                Symbol::Rule(RIdx((s - tokens_len).as_()))
            }
        };

        let mut rules_prods = vec![Vec::new(); symbols_len - tokens_len];
        let mut prods_rules = Vec::with_capacity(prods.len());
        let mut prod_syms = Vec::with_capacity(prods.len());
        for (i, (lhs, rhs)) in prods.into_iter().enumerate() {
            let ridx = match classify(lhs) {
                Symbol::Rule(ridx) => ridx,
                Symbol::Token(_) => panic!("the lhs of production {i} is a token"),
            };
            rules_prods[usize::from(ridx)].push(PIdx(i.as_()));
            prods_rules.push(ridx);
            prod_syms.push(rhs.into_iter().map(classify).collect());
        }

        Grammar {
            symbol_names,
            tokens_len: TIdx(tokens_len.as_()),
            rules_len: RIdx((symbols_len - tokens_len).as_()),
            prods: prod_syms,
            prods_rules,
            rules_prods,
            eof_token_idx: None,
            accept_prod: None,
        }
    }

    /// Find the goal symbol: the unique rule which is not referenced by any production. Fails if
    /// there is no such rule, or if there is more than one.
    pub fn find_goal_symbol(&self) -> Result<RIdx<StorageT>, GrammarError> {
        let mut referenced = Vob::from_elem(false, usize::from(self.rules_len));
        for sym in self.prods.iter().flatten() {
            if let Symbol::Rule(ridx) = *sym {
                referenced.set(usize::from(ridx), true);
            }
        }
        let mut goal = None;
        for ridx in self.iter_rules() {
            if referenced[usize::from(ridx)] {
                continue;
            }
            if let Some(first) = goal {
                return Err(GrammarError::MultipleGoalSymbols(
                    self.rule_name(first).to_owned(),
                    self.rule_name(ridx).to_owned(),
                ));
            }
            goal = Some(ridx);
        }
        goal.ok_or(GrammarError::NoGoalSymbol)
    }

    /// Insert the EOF token immediately after the existing tokens. Rules are stored relative to
    /// the first rule, so this shifts the flat `SymIdx` of every rule up by one while leaving
    /// every `RIdx` untouched.
    ///
    /// # Panics
    ///
    /// If called more than once, or after [`add_accept_production`](#method.add_accept_production).
    pub fn add_end_terminal(&mut self) {
        assert!(
            self.eof_token_idx.is_none(),
            "add_end_terminal must only be called once"
        );
        assert!(
            self.accept_prod.is_none(),
            "add_end_terminal must be called before add_accept_production"
        );
        let eof = self.tokens_len;
        self.symbol_names
            .insert(usize::from(eof), EOF_TOKEN.to_owned());
        self.tokens_len = TIdx((usize::from(eof) + 1).as_());
        self.eof_token_idx = Some(eof);
    }

    /// Append the production `ACCEPT -> goal` (and the `ACCEPT` rule) to the grammar, returning
    /// the new production's index. Reducing this production signals a completed parse.
    ///
    /// # Panics
    ///
    /// If called more than once, or before [`add_end_terminal`](#method.add_end_terminal).
    pub fn add_accept_production(&mut self) -> Result<PIdx<StorageT>, GrammarError> {
        assert!(
            self.eof_token_idx.is_some(),
            "add_end_terminal must be called before add_accept_production"
        );
        assert!(
            self.accept_prod.is_none(),
            "add_accept_production must only be called once"
        );
        let goal = self.find_goal_symbol()?;
        let ridx = self.rules_len;
        let pidx = PIdx(self.prods.len().as_());
        self.symbol_names.push(ACCEPT_RULE.to_owned());
        self.rules_len = RIdx((usize::from(ridx) + 1).as_());
        self.prods.push(vec![Symbol::Rule(goal)]);
        self.prods_rules.push(ridx);
        self.rules_prods.push(vec![pidx]);
        self.accept_prod = Some(pidx);
        Ok(pidx)
    }

    /// Augment this grammar with the EOF token and the accept production. The goal symbol is
    /// checked before anything is modified, so on error `self` is left untouched.
    pub fn augment(&mut self) -> Result<(), GrammarError> {
        self.find_goal_symbol()?;
        self.add_end_terminal();
        self.add_accept_production()?;
        Ok(())
    }

    /// Has this grammar had both the EOF token and the accept production added?
    pub fn is_augmented(&self) -> bool {
        self.accept_prod.is_some()
    }

    /// How many symbols (tokens and rules) does this grammar have?
    pub fn symbols_len(&self) -> SymIdx<StorageT> {
        SymIdx((usize::from(self.tokens_len) + usize::from(self.rules_len)).as_())
    }

    /// Classify the flat symbol id `symidx`. Panics if `symidx` doesn't exist.
    pub fn symbol(&self, symidx: SymIdx<StorageT>) -> Symbol<StorageT> {
        let i = usize::from(symidx);
        assert!(i < self.symbol_names.len());
        let tokens_len = usize::from(self.tokens_len);
        if i < tokens_len {
            Symbol::Token(TIdx(symidx.as_storaget()))
        } else {
            Symbol::Rule(RIdx((i - tokens_len).as_()))
        }
    }

    /// Return the flat symbol id of `sym`.
    pub fn symbol_idx(&self, sym: Symbol<StorageT>) -> SymIdx<StorageT> {
        match sym {
            Symbol::Token(tidx) => SymIdx(tidx.as_storaget()),
            Symbol::Rule(ridx) => {
                SymIdx((usize::from(self.tokens_len) + usize::from(ridx)).as_())
            }
        }
    }

    /// Return the name of the symbol `symidx`. Panics if `symidx` doesn't exist.
    pub fn symbol_name(&self, symidx: SymIdx<StorageT>) -> &str {
        &self.symbol_names[usize::from(symidx)]
    }

    /// Return the name of `sym`.
    pub fn sym_name(&self, sym: Symbol<StorageT>) -> &str {
        match sym {
            Symbol::Token(tidx) => self.token_name(tidx),
            Symbol::Rule(ridx) => self.rule_name(ridx),
        }
    }

    /// How many productions does this grammar have?
    pub fn prods_len(&self) -> PIdx<StorageT> {
        // The constructor guarantees this, and the accept production, fit into StorageT.
        PIdx(self.prods.len().as_())
    }

    /// Return an iterator which produces (in order from `0..self.prods_len()`) all this
    /// grammar's valid `PIdx`s.
    pub fn iter_pidxs(&self) -> impl Iterator<Item = PIdx<StorageT>> + use<StorageT> {
        (0..self.prods.len()).map(|x| PIdx(x.as_()))
    }

    /// Get the sequence of symbols for production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod(&self, pidx: PIdx<StorageT>) -> &[Symbol<StorageT>] {
        &self.prods[usize::from(pidx)]
    }

    /// How many symbols does production `pidx` have? Panics if `pidx` doesn't exist.
    pub fn prod_len(&self, pidx: PIdx<StorageT>) -> SIdx<StorageT> {
        SIdx(self.prods[usize::from(pidx)].len().as_())
    }

    /// Return the rule index of the production `pidx`. Panics if `pidx` doesn't exist.
    pub fn prod_to_rule(&self, pidx: PIdx<StorageT>) -> RIdx<StorageT> {
        self.prods_rules[usize::from(pidx)]
    }

    /// How many rules does this grammar have?
    pub fn rules_len(&self) -> RIdx<StorageT> {
        self.rules_len
    }

    /// Return an iterator which produces (in order from `0..self.rules_len()`) all this
    /// grammar's valid `RIdx`s.
    pub fn iter_rules(&self) -> impl Iterator<Item = RIdx<StorageT>> + use<StorageT> {
        (0..usize::from(self.rules_len)).map(|x| RIdx(x.as_()))
    }

    /// Return the productions for rule `ridx`. Panics if `ridx` doesn't exist.
    pub fn rule_to_prods(&self, ridx: RIdx<StorageT>) -> &[PIdx<StorageT>] {
        &self.rules_prods[usize::from(ridx)]
    }

    /// Return the name of rule `ridx`. Panics if `ridx` doesn't exist.
    pub fn rule_name(&self, ridx: RIdx<StorageT>) -> &str {
        &self.symbol_names[usize::from(self.tokens_len) + usize::from(ridx)]
    }

    /// Return the index of the rule named `n` or `None` if it doesn't exist.
    pub fn rule_idx(&self, n: &str) -> Option<RIdx<StorageT>> {
        let tokens_len = usize::from(self.tokens_len);
        self.symbol_names[tokens_len..]
            .iter()
            .position(|x| x == n)
            .map(|x| RIdx(x.as_()))
    }

    /// How many tokens does this grammar have?
    pub fn tokens_len(&self) -> TIdx<StorageT> {
        self.tokens_len
    }

    /// Return an iterator which produces (in order from `0..self.tokens_len()`) all this
    /// grammar's valid `TIdx`s.
    pub fn iter_tidxs(&self) -> impl Iterator<Item = TIdx<StorageT>> + use<StorageT> {
        (0..usize::from(self.tokens_len)).map(|x| TIdx(x.as_()))
    }

    /// Return the name of token `tidx`. Panics if `tidx` doesn't exist.
    pub fn token_name(&self, tidx: TIdx<StorageT>) -> &str {
        assert!(tidx < self.tokens_len);
        &self.symbol_names[usize::from(tidx)]
    }

    /// Return the index of the token named `n` or `None` if it doesn't exist.
    pub fn token_idx(&self, n: &str) -> Option<TIdx<StorageT>> {
        self.symbol_names[..usize::from(self.tokens_len)]
            .iter()
            .position(|x| x == n)
            .map(|x| TIdx(x.as_()))
    }

    /// Return the index of the EOF token. Panics if the grammar has not had
    /// [`add_end_terminal`](#method.add_end_terminal) called on it.
    pub fn eof_token_idx(&self) -> TIdx<StorageT> {
        match self.eof_token_idx {
            Some(tidx) => tidx,
            None => panic!("Grammar has no EOF token"),
        }
    }

    /// Return the index of the `ACCEPT -> goal` production. Panics if the grammar has not been
    /// augmented.
    pub fn accept_prod(&self) -> PIdx<StorageT> {
        match self.accept_prod {
            Some(pidx) => pidx,
            None => panic!("Grammar has no accept production"),
        }
    }

    /// Return the index of the `ACCEPT` rule. Panics if the grammar has not been augmented.
    pub fn accept_rule_idx(&self) -> RIdx<StorageT> {
        self.prod_to_rule(self.accept_prod())
    }

    /// Returns the string representation of a given production `pidx`.
    pub fn pp_prod(&self, pidx: PIdx<StorageT>) -> String {
        let mut sprod = String::new();
        sprod.push_str(self.rule_name(self.prod_to_rule(pidx)));
        sprod.push(':');
        for sym in self.prod(pidx) {
            match *sym {
                Symbol::Token(tidx) => sprod.push_str(&format!(" '{}'", self.token_name(tidx))),
                Symbol::Rule(ridx) => sprod.push_str(&format!(" {}", self.rule_name(ridx))),
            }
        }
        sprod
    }

    /// Return a `Firsts` struct for this grammar.
    pub fn firsts(&self) -> Firsts<StorageT> {
        Firsts::new(self)
    }
}

/// Dumps the symbol table followed by each production as flat symbol ids.
impl<StorageT: 'static + PrimInt + Unsigned> fmt::Display for Grammar<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "symbols:")?;
        for (i, name) in self.symbol_names.iter().enumerate() {
            writeln!(f, "{i}: {name}")?;
        }
        writeln!(f, "productions:")?;
        for pidx in self.iter_pidxs() {
            let lhs = self.symbol_idx(Symbol::Rule(self.prod_to_rule(pidx)));
            write!(f, "{}: {} ::=", usize::from(pidx), usize::from(lhs))?;
            for sym in self.prod(pidx) {
                write!(f, " {}", usize::from(self.symbol_idx(*sym)))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The ways in which a grammar can fail to have a well-defined goal symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarError {
    /// Every rule is referenced by some production.
    NoGoalSymbol,
    /// More than one rule is unreferenced: the first two found are recorded.
    MultipleGoalSymbols(String, String),
}

impl Error for GrammarError {}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GrammarError::NoGoalSymbol => {
                write!(f, "The goal symbol is unclear: every rule is referenced")
            }
            GrammarError::MultipleGoalSymbols(ref a, ref b) => write!(
                f,
                "There is more than one goal symbol ('{a}' and '{b}') in this grammar"
            ),
        }
    }
}

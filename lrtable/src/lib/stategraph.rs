use std::{collections::BTreeMap, sync::Arc};

use cfgrammar::{Grammar, PIdx, SIdx, SymIdx, Symbol, TIdx};
use fnv::FnvHashMap;
use log::{debug, trace};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
use petgraph::{dot::Dot, graph::DiGraph};
use vob::Vob;

use crate::{
    StIdx,
    graph::Graph,
    itemset::{CfgIdx, Configs},
};

/// An action of a state which is still being built.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionInProgress<StorageT> {
    /// A transition over `symbol` to `target`: a shift if `symbol` is a token, a goto if it is a
    /// rule.
    Shift {
        symbol: Symbol<StorageT>,
        target: StIdx,
    },
    /// Reduce production `pidx` if the lookahead is in `context`.
    Reduce { pidx: PIdx<StorageT>, context: Vob },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StateInProgress<StorageT> {
    /// The closed configurations of this state, in ascending order.
    pub configs: Vec<CfgIdx>,
    /// Transitions in ascending symbol order, followed by reductions.
    pub actions: Vec<ActionInProgress<StorageT>>,
}

/// The LALR(1) automaton of a grammar, before conflicts are resolved.
#[derive(Debug)]
pub struct ParserInProgress<StorageT> {
    grm: Arc<Grammar<StorageT>>,
    configs: Configs<StorageT>,
    states: Vec<StateInProgress<StorageT>>,
    /// Every `(state, configuration)` pair: these are the nodes of the lookahead propagation
    /// graph. The pairs of a state are contiguous and in the same order as its `configs`.
    state_configs: Vec<(StIdx, CfgIdx)>,
    /// A mapping from a state to the offset of its first pair in `state_configs`.
    states2state_configs: Vec<usize>,
    /// The lookahead set of each pair in `state_configs`.
    contexts: Vec<Vob>,
    verbose: bool,
}

/// Build the LALR(1) automaton for the augmented grammar `grm`.
///
/// States are the distinct LR(0) closures reachable from the closure of `ACCEPT -> . goal`.
/// Lookaheads are then computed for every (state, configuration) pair: a configuration
/// `A -> α . B β` spontaneously generates FIRST(β) for every `B -> . γ` in the same state, and
/// propagates its own lookaheads to them if β is nullable; every configuration propagates its
/// lookaheads to the configuration its transition leads to. The propagation graph may contain
/// cycles, so it is solved one strongly connected component at a time in topological order.
///
/// # Panics
///
/// If `grm` has not been augmented, or has too many states to fit in a `StIdx`.
pub fn build_lalr1_parser<StorageT: 'static + PrimInt + Unsigned>(
    grm: Arc<Grammar<StorageT>>,
    verbose: bool,
) -> ParserInProgress<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    let configs = Configs::new(&grm);
    let states = discover_states(&grm, &configs);
    let mut pip = ParserInProgress {
        grm,
        configs,
        states,
        state_configs: Vec::new(),
        states2state_configs: Vec::new(),
        contexts: Vec::new(),
        verbose,
    };
    pip.compute_contexts();
    pip.add_reductions();
    pip
}

/// Breadth first discovery of the LR(0) states and their transitions.
fn discover_states<StorageT: 'static + PrimInt + Unsigned>(
    grm: &Grammar<StorageT>,
    configs: &Configs<StorageT>,
) -> Vec<StateInProgress<StorageT>>
where
    usize: AsPrimitive<StorageT>,
{
    let accept = configs.cfg_idx(grm.accept_prod(), SIdx(0usize.as_()));
    let start = configs.close(grm, &[accept]);
    let mut seen = FnvHashMap::default();
    seen.insert(start.clone(), StIdx::from(0usize));
    let mut states = vec![StateInProgress {
        configs: start,
        actions: Vec::new(),
    }];
    let mut todo = 0;
    while todo < states.len() {
        // Group the advanced configurations by the symbol they advance over.
        let mut kernels: BTreeMap<SymIdx<StorageT>, Vec<CfgIdx>> = BTreeMap::new();
        for &cfg in &states[todo].configs {
            if let Some(sym) = configs.next_symbol(grm, cfg) {
                kernels
                    .entry(grm.symbol_idx(sym))
                    .or_default()
                    .push(configs.advance(grm, cfg));
            }
        }
        for (symidx, kernel) in kernels {
            let closed = configs.close(grm, &kernel);
            let target = match seen.get(&closed) {
                Some(&stidx) => stidx,
                None => {
                    let stidx = StIdx::from(states.len());
                    trace!(
                        "State {} reached from state {todo} on {}",
                        usize::from(stidx),
                        grm.symbol_name(symidx)
                    );
                    seen.insert(closed.clone(), stidx);
                    states.push(StateInProgress {
                        configs: closed,
                        actions: Vec::new(),
                    });
                    stidx
                }
            };
            states[todo].actions.push(ActionInProgress::Shift {
                symbol: grm.symbol(symidx),
                target,
            });
        }
        todo += 1;
    }
    states
}

impl<StorageT: 'static + PrimInt + Unsigned> ParserInProgress<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    pub fn grammar(&self) -> &Grammar<StorageT> {
        &self.grm
    }

    pub(crate) fn shared_grammar(&self) -> Arc<Grammar<StorageT>> {
        Arc::clone(&self.grm)
    }

    pub fn configs(&self) -> &Configs<StorageT> {
        &self.configs
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// How many states does this automaton have?
    pub fn states_len(&self) -> StIdx {
        StIdx::from(self.states.len())
    }

    /// Return an iterator which produces (in order from `0..self.states_len()`) all this
    /// automaton's valid `StIdx`s.
    pub fn iter_stidxs(&self) -> impl Iterator<Item = StIdx> + use<StorageT> {
        (0..self.states.len()).map(StIdx::from)
    }

    /// Return state `stidx`. Panics if `stidx` doesn't exist.
    pub fn state(&self, stidx: StIdx) -> &StateInProgress<StorageT> {
        &self.states[usize::from(stidx)]
    }

    /// Return the state reached from `stidx` over `sym`, if there is one.
    pub fn goto_state(&self, stidx: StIdx, sym: Symbol<StorageT>) -> Option<StIdx> {
        self.state(stidx).actions.iter().find_map(|a| match *a {
            ActionInProgress::Shift { symbol, target } if symbol == sym => Some(target),
            _ => None,
        })
    }

    /// Return the lookahead set of configuration `cfg` in state `stidx`, or `None` if `cfg` is
    /// not in that state.
    pub fn context(&self, stidx: StIdx, cfg: CfgIdx) -> Option<&Vob> {
        self.find_state_config(stidx, cfg)
            .and_then(|n| self.contexts.get(n))
    }

    fn find_state_config(&self, stidx: StIdx, cfg: CfgIdx) -> Option<usize> {
        let i = self.state(stidx).configs.binary_search(&cfg).ok()?;
        Some(self.states2state_configs[usize::from(stidx)] + i)
    }

    fn state_config(&self, stidx: StIdx, cfg: CfgIdx) -> usize {
        match self.find_state_config(stidx, cfg) {
            Some(n) => n,
            None => panic!(
                "Configuration {} missing from state {}",
                self.configs.pp(&self.grm, cfg),
                usize::from(stidx)
            ),
        }
    }

    fn compute_contexts(&mut self) {
        let grm = Arc::clone(&self.grm);
        let tokens_len = usize::from(grm.tokens_len());
        for (i, state) in self.states.iter().enumerate() {
            self.states2state_configs.push(self.state_configs.len());
            for &cfg in &state.configs {
                self.state_configs.push((StIdx::from(i), cfg));
            }
        }

        let nnodes = self.state_configs.len();
        let mut contexts = vec![Vob::from_elem(false, tokens_len); nnodes];
        let mut prop = Graph::new(nnodes);
        let accept = self.configs.cfg_idx(grm.accept_prod(), SIdx(0usize.as_()));
        let start = self.state_config(StIdx::from(0usize), accept);
        contexts[start].set(usize::from(grm.eof_token_idx()), true);

        let firsts = grm.firsts();
        let mut first = Vob::from_elem(false, tokens_len);
        for node in 0..nnodes {
            let (stidx, cfg) = self.state_configs[node];
            let sym = match self.configs.next_symbol(&grm, cfg) {
                Some(sym) => sym,
                None => continue,
            };
            if let Symbol::Rule(ridx) = sym {
                first.set_all(false);
                let nullable = firsts.seq_firsts(self.configs.rest(&grm, cfg), &mut first);
                for &pidx in grm.rule_to_prods(ridx) {
                    let dst =
                        self.state_config(stidx, self.configs.cfg_idx(pidx, SIdx(0usize.as_())));
                    contexts[dst].or(&first);
                    if nullable {
                        prop.add_edge(node, dst);
                    }
                }
            }
            let target = match self.goto_state(stidx, sym) {
                Some(target) => target,
                None => panic!(
                    "No transition from state {} over {}",
                    usize::from(stidx),
                    grm.sym_name(sym)
                ),
            };
            prop.add_edge(node, self.state_config(target, self.configs.advance(&grm, cfg)));
        }

        let sccs = prop.sccs();
        for scc in &sccs {
            let mut ctx = Vob::from_elem(false, tokens_len);
            for &n in scc {
                ctx.or(&contexts[n]);
            }
            for &n in scc {
                contexts[n].or(&ctx);
                for &succ in prop.edges(n) {
                    contexts[succ].or(&ctx);
                }
            }
        }
        debug!(
            "Propagated lookaheads over {nnodes} state configurations, {} edges, {} components",
            prop.nedges(),
            sccs.len()
        );
        self.contexts = contexts;
    }

    fn add_reductions(&mut self) {
        for (node, &(stidx, cfg)) in self.state_configs.iter().enumerate() {
            if self.configs.next_symbol(&self.grm, cfg).is_none() {
                self.states[usize::from(stidx)]
                    .actions
                    .push(ActionInProgress::Reduce {
                        pidx: self.configs.get(cfg).pidx,
                        context: self.contexts[node].clone(),
                    });
            }
        }
        debug!(
            "Built an LALR(1) automaton of {} states for {} productions",
            self.states.len(),
            usize::from(self.grm.prods_len())
        );
    }

    fn fmt_sym(&self, sym: Symbol<StorageT>) -> String {
        match sym {
            Symbol::Rule(ridx) => self.grm.rule_name(ridx).to_string(),
            Symbol::Token(tidx) => format!("'{}'", self.grm.token_name(tidx)),
        }
    }

    fn fmt_ctx(&self, ctx: &Vob) -> String {
        ctx.iter_set_bits(..)
            .map(|i| format!("'{}'", self.grm.token_name(TIdx(i.as_()))))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Pretty print this automaton as a `String`: each state's configurations with their
    /// lookaheads, then its transitions and reductions.
    pub fn pp(&self) -> String {
        let mut o = String::new();
        for (i, state) in self.states.iter().enumerate() {
            o.push_str(&format!("{i}:\n"));
            let off = self.states2state_configs[i];
            for (j, &cfg) in state.configs.iter().enumerate() {
                o.push_str(&format!(
                    "  [{}, {{{}}}]\n",
                    self.configs.pp(&self.grm, cfg),
                    self.fmt_ctx(&self.contexts[off + j])
                ));
            }
            for action in &state.actions {
                match *action {
                    ActionInProgress::Shift { symbol, target } => o.push_str(&format!(
                        "  {} -> {}\n",
                        self.fmt_sym(symbol),
                        usize::from(target)
                    )),
                    ActionInProgress::Reduce { pidx, ref context } => o.push_str(&format!(
                        "  reduce {} on {{{}}}\n",
                        self.grm.pp_prod(pidx),
                        self.fmt_ctx(context)
                    )),
                }
            }
        }
        o
    }

    /// Render the states and transitions of this automaton in Graphviz's dot format.
    pub fn to_dot(&self) -> String {
        let mut g = DiGraph::<String, String>::new();
        let nodes = self
            .states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let mut label = i.to_string();
                for &cfg in &state.configs {
                    label.push('\n');
                    label.push_str(&self.configs.pp(&self.grm, cfg));
                }
                g.add_node(label)
            })
            .collect::<Vec<_>>();
        for (i, state) in self.states.iter().enumerate() {
            for action in &state.actions {
                if let ActionInProgress::Shift { symbol, target } = *action {
                    g.add_edge(nodes[i], nodes[usize::from(target)], self.fmt_sym(symbol));
                }
            }
        }
        format!("{}", Dot::new(&g))
    }
}

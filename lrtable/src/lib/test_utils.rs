use std::sync::Arc;

use cfgrammar::{Grammar, Language, PIdx, SIdx};
use vob::Vob;

use crate::{StIdx, stategraph::ParserInProgress};

/// Build an augmented grammar from token names and `(lhs, rhs)` productions.
pub(crate) fn grammar(tokens: &[&str], prods: &[(&str, &[&str])]) -> Arc<Grammar> {
    let mut lang = Language::new();
    for t in tokens {
        lang = lang.token(t, "x");
    }
    for (lhs, rhs) in prods {
        lang = lang.production(lhs, rhs);
    }
    lang.build_grammar().unwrap()
}

/// Return the `prod_off`th production of rule `rn`.
pub(crate) fn pidx(grm: &Grammar, rn: &str, prod_off: usize) -> PIdx<u32> {
    grm.rule_to_prods(grm.rule_idx(rn).unwrap())[prod_off]
}

fn ctx_names(grm: &Grammar, ctx: &Vob) -> Vec<String> {
    let mut names = ctx
        .iter_set_bits(..)
        .map(|i| grm.token_name(cfgrammar::TIdx(i as u32)).to_owned())
        .collect::<Vec<_>>();
    names.sort();
    names
}

/// Check that state `stidx` contains the configuration `(rn[prod_off], dot)` and that its
/// lookahead set is exactly `la`.
pub(crate) fn state_exists(
    pip: &ParserInProgress<u32>,
    stidx: StIdx,
    rn: &str,
    prod_off: usize,
    dot: u32,
    la: &[&str],
) {
    let grm = pip.grammar();
    let cfg = pip.configs().cfg_idx(pidx(grm, rn, prod_off), SIdx(dot));
    let ctx = match pip.context(stidx, cfg) {
        Some(ctx) => ctx,
        None => panic!(
            "{} is not in state {}",
            pip.configs().pp(grm, cfg),
            usize::from(stidx)
        ),
    };
    let mut expected = la.iter().map(|x| x.to_string()).collect::<Vec<_>>();
    expected.sort();
    assert_eq!(
        ctx_names(grm, ctx),
        expected,
        "lookaheads of {} in state {}",
        pip.configs().pp(grm, cfg),
        usize::from(stidx)
    );
}

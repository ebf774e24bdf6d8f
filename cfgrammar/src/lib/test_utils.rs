use indexmap::IndexMap;

use crate::Grammar;

/// Build an unaugmented grammar from token names and `(lhs, rhs)` productions. Rules are
/// numbered in order of their first appearance as an lhs.
pub(crate) fn raw_grammar(tokens: &[&str], prods: &[(&str, &[&str])]) -> Grammar {
    let mut rules = IndexMap::new();
    for (lhs, _) in prods {
        let n = rules.len();
        rules.entry(*lhs).or_insert(n);
    }
    let sym = |n: &str| match tokens.iter().position(|t| *t == n) {
        Some(i) => i,
        None => tokens.len() + rules[n],
    };
    let names = tokens
        .iter()
        .chain(rules.keys())
        .map(|x| x.to_string())
        .collect();
    let prods = prods
        .iter()
        .map(|(lhs, rhs)| (sym(*lhs), rhs.iter().map(|x| sym(*x)).collect()))
        .collect();
    Grammar::new(tokens.len(), names, prods)
}

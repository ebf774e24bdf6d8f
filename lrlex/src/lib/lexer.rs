use cfgrammar::Language;
use log::debug;

use crate::{
    LexBuildError, LexErrorKind,
    alphabet::SYMBOLS_LEN,
    fa::FiniteAutomaton,
    regex,
};

/// Compile the regular expression `re` of the token `name` into a minimal DFA whose accepting
/// states accept `token`.
pub fn build_dfa(name: &str, re: &str, token: usize) -> Result<FiniteAutomaton, LexBuildError> {
    let nfa = regex::compile(re, token).map_err(|e| LexBuildError {
        kind: LexErrorKind::Regex(e),
        token: name.to_owned(),
    })?;
    Ok(FiniteAutomaton::simplify(
        &FiniteAutomaton::make_deterministic(&nfa),
    ))
}

/// Build the lexical DFA for `lang`. Each token's id is its declaration index; when a string
/// matches several tokens, the earliest declared wins. Every token's regular expression is
/// compiled, including those of the `INDENT` and `DEDENT` tokens of an indentation sensitive
/// language.
///
/// A language with no tokens produces a single state DFA which accepts nothing.
pub fn build_lexer(lang: &Language) -> Result<FiniteAutomaton, LexBuildError> {
    let mut lexer: Option<FiniteAutomaton> = None;
    for (tok, def) in lang.tokens.iter().enumerate() {
        let dfa = build_dfa(&def.name, &def.regex, tok)?;
        lexer = Some(match lexer {
            None => dfa,
            Some(l) => FiniteAutomaton::unite(&l, &dfa),
        });
    }
    let dfa = match lexer {
        Some(nfa) => FiniteAutomaton::simplify(&FiniteAutomaton::make_deterministic(&nfa)),
        None => {
            let mut fa = FiniteAutomaton::new(SYMBOLS_LEN, true);
            fa.add_state();
            fa
        }
    };
    debug!("Built a lexer of {} states", dfa.states_len());
    Ok(dfa)
}

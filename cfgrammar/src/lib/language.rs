use std::{error::Error, fmt, sync::Arc};

use indexmap::{IndexMap, map::Entry};
use log::debug;
use num_traits::{AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grammar::{ACCEPT_RULE, EOF_TOKEN, Grammar, GrammarError};

/// If a language declares a token with this name, it is indentation sensitive.
pub const INDENT_TOKEN: &str = "INDENT";
/// The token emitted when an indentation level is closed.
pub const DEDENT_TOKEN: &str = "DEDENT";
/// The token emitted at the end of each logical line.
pub const NEWLINE_TOKEN: &str = "NEWLINE";

/// A named token and the regular expression which matches it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenDef {
    pub name: String,
    pub regex: String,
}

/// A production `lhs ::= rhs...`, where each name in `rhs` is either a token or a rule (i.e.
/// the `lhs` of some production).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProductionDef {
    pub lhs: String,
    pub rhs: Vec<String>,
}

/// A language description: an ordered list of tokens and an ordered list of productions. Token
/// `i` (counting from zero in declaration order) becomes `TIdx(i)` in the grammar built from
/// this language, and lexical automata report the same ids.
///
/// ```text
///   let lang = Language::new()
///       .token("a", "a")
///       .token("b", "b")
///       .production("Start", &["S"])
///       .production("S", &["a", "S", "b"])
///       .production("S", &[]);
///   let grm = lang.build_grammar()?;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Language {
    pub tokens: Vec<TokenDef>,
    pub productions: Vec<ProductionDef>,
}

impl Language {
    pub fn new() -> Self {
        Language::default()
    }

    /// Append the token `name` matched by `regex`.
    pub fn token(mut self, name: &str, regex: &str) -> Self {
        self.tokens.push(TokenDef {
            name: name.to_owned(),
            regex: regex.to_owned(),
        });
        self
    }

    /// Append the production `lhs ::= rhs`.
    pub fn production(mut self, lhs: &str, rhs: &[&str]) -> Self {
        self.productions.push(ProductionDef {
            lhs: lhs.to_owned(),
            rhs: rhs.iter().map(|x| (*x).to_owned()).collect(),
        });
        self
    }

    /// Return the declaration index of the token `name`, if it exists.
    pub fn token_offset(&self, name: &str) -> Option<usize> {
        self.tokens.iter().position(|t| t.name == name)
    }

    /// Is this language indentation sensitive (i.e. does it declare an `INDENT` token)?
    pub fn is_indent_sensitive(&self) -> bool {
        self.token_offset(INDENT_TOKEN).is_some()
    }

    /// Build an augmented grammar from this language using `u32` storage.
    pub fn build_grammar(&self) -> Result<Arc<Grammar<u32>>, LanguageError> {
        self.build_grammar_with_storaget()
    }

    /// Build an augmented grammar from this language. Tokens take their declaration order;
    /// rules are numbered in the order they first appear as the lhs of a production. The
    /// grammar's goal symbol is checked before the EOF token and accept production are added.
    ///
    /// # Panics
    ///
    /// If `StorageT` is not big enough to index the grammar.
    pub fn build_grammar_with_storaget<StorageT: 'static + PrimInt + Unsigned>(
        &self,
    ) -> Result<Arc<Grammar<StorageT>>, LanguageError>
    where
        usize: AsPrimitive<StorageT>,
    {
        let mut names = IndexMap::with_capacity(self.tokens.len());
        for tok in &self.tokens {
            check_reserved(&tok.name)?;
            let n = names.len();
            match names.entry(tok.name.as_str()) {
                Entry::Occupied(_) => return Err(LanguageError::DuplicateToken(tok.name.clone())),
                Entry::Vacant(e) => {
                    e.insert(n);
                }
            }
        }
        let tokens_len = names.len();

        for prod in &self.productions {
            check_reserved(&prod.lhs)?;
            if let Some(&i) = names.get(prod.lhs.as_str()) {
                if i < tokens_len {
                    return Err(LanguageError::TokenUsedAsRule(prod.lhs.clone()));
                }
            }
            let n = names.len();
            names.entry(prod.lhs.as_str()).or_insert(n);
        }

        let mut prods = Vec::with_capacity(self.productions.len());
        for prod in &self.productions {
            let mut rhs = Vec::with_capacity(prod.rhs.len());
            for sym in &prod.rhs {
                match names.get(sym.as_str()) {
                    Some(&i) => rhs.push(i),
                    None => {
                        return Err(LanguageError::UnknownSymbol {
                            name: sym.clone(),
                            rule: prod.lhs.clone(),
                        });
                    }
                }
            }
            prods.push((names[prod.lhs.as_str()], rhs));
        }

        let symbol_names = names.keys().map(|x| (*x).to_owned()).collect();
        let mut grm = Grammar::new(tokens_len, symbol_names, prods);
        grm.augment()?;
        debug!(
            "Built grammar: {} tokens, {} rules, {} productions",
            usize::from(grm.tokens_len()),
            usize::from(grm.rules_len()),
            usize::from(grm.prods_len())
        );
        Ok(Arc::new(grm))
    }
}

/// Dumps each token with its regular expression, then each production by name.
impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "tokens:")?;
        for tok in &self.tokens {
            writeln!(f, "{}: {}", tok.name, tok.regex)?;
        }
        writeln!(f, "productions:")?;
        for prod in &self.productions {
            write!(f, "{} ::=", prod.lhs)?;
            for sym in &prod.rhs {
                write!(f, " {sym}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn check_reserved(name: &str) -> Result<(), LanguageError> {
    if name == EOF_TOKEN || name == ACCEPT_RULE {
        Err(LanguageError::ReservedName(name.to_owned()))
    } else {
        Ok(())
    }
}

/// Any error from building a grammar from a language description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LanguageError {
    /// The same token name was declared twice.
    DuplicateToken(String),
    /// A token name was used as the lhs of a production.
    TokenUsedAsRule(String),
    /// A name clashes with a symbol the grammar inserts itself.
    ReservedName(String),
    /// A production of `rule` refers to `name`, which is neither a token nor a rule.
    UnknownSymbol { name: String, rule: String },
    Grammar(GrammarError),
}

impl Error for LanguageError {}

impl From<GrammarError> for LanguageError {
    fn from(err: GrammarError) -> LanguageError {
        LanguageError::Grammar(err)
    }
}

impl fmt::Display for LanguageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LanguageError::DuplicateToken(ref n) => write!(f, "Token '{n}' is declared twice"),
            LanguageError::TokenUsedAsRule(ref n) => {
                write!(f, "Token '{n}' is used as the lhs of a production")
            }
            LanguageError::ReservedName(ref n) => write!(f, "'{n}' is a reserved name"),
            LanguageError::UnknownSymbol { ref name, ref rule } => {
                write!(f, "Unknown symbol '{name}' in a production of '{rule}'")
            }
            LanguageError::Grammar(ref e) => e.fmt(f),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Language, LanguageError};
    use crate::{PIdx, RIdx, Symbol, TIdx, grammar::GrammarError};

    fn anbn() -> Language {
        Language::new()
            .token("a", "a")
            .token("b", "b")
            .production("S", &["a", "S", "b"])
            .production("S", &[])
            .production("Start", &["S"])
    }

    #[test]
    fn test_build_grammar() {
        let grm = anbn().build_grammar().unwrap();
        assert_eq!(grm.token_idx("a"), Some(TIdx(0)));
        assert_eq!(grm.token_idx("b"), Some(TIdx(1)));
        assert_eq!(grm.eof_token_idx(), TIdx(2));
        assert_eq!(grm.rule_idx("S"), Some(RIdx(0)));
        assert_eq!(grm.rule_idx("Start"), Some(RIdx(1)));
        assert_eq!(grm.accept_prod(), PIdx(3));
        assert_eq!(grm.prod(PIdx(1)), &[]);
        assert_eq!(
            grm.prod(grm.accept_prod()),
            &[Symbol::Rule(grm.rule_idx("Start").unwrap())]
        );
    }

    #[test]
    fn test_rule_order_is_first_lhs_appearance() {
        let grm = Language::new()
            .token("x", "x")
            .production("B", &["x"])
            .production("A", &["B"])
            .production("B", &["x", "x"])
            .build_grammar()
            .unwrap();
        assert_eq!(grm.rule_idx("B"), Some(RIdx(0)));
        assert_eq!(grm.rule_idx("A"), Some(RIdx(1)));
        assert_eq!(grm.rule_to_prods(RIdx(0)), &[PIdx(0), PIdx(2)]);
    }

    #[test]
    fn test_errors() {
        let lang = anbn().token("a", "aa");
        assert_eq!(
            lang.build_grammar(),
            Err(LanguageError::DuplicateToken("a".to_owned()))
        );

        let lang = anbn().production("a", &["b"]);
        assert_eq!(
            lang.build_grammar(),
            Err(LanguageError::TokenUsedAsRule("a".to_owned()))
        );

        let lang = anbn().production("S", &["c"]);
        assert_eq!(
            lang.build_grammar(),
            Err(LanguageError::UnknownSymbol {
                name: "c".to_owned(),
                rule: "S".to_owned()
            })
        );

        let lang = anbn().token("EOF", "$");
        assert_eq!(
            lang.build_grammar(),
            Err(LanguageError::ReservedName("EOF".to_owned()))
        );

        let lang = anbn().production("T", &["a"]);
        match lang.build_grammar() {
            Err(LanguageError::Grammar(GrammarError::MultipleGoalSymbols(a, b))) => {
                assert_eq!((a.as_str(), b.as_str()), ("Start", "T"));
            }
            x => panic!("{:?}", x),
        }

        let lang = Language::new().token("a", "a");
        assert_eq!(
            lang.build_grammar(),
            Err(LanguageError::Grammar(GrammarError::NoGoalSymbol))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            anbn().to_string(),
            "tokens:
a: a
b: b
productions:
S ::= a S b
S ::=
Start ::= S
"
        );
    }

    #[test]
    fn test_indent_sensitive() {
        assert!(!anbn().is_indent_sensitive());
        assert!(anbn().token("INDENT", "").is_indent_sensitive());
    }

    #[test]
    fn test_smaller_storage() {
        let grm = anbn().build_grammar_with_storaget::<u8>().unwrap();
        assert_eq!(grm.eof_token_idx(), TIdx(2u8));
    }
}

//! Compile regular expressions into NFAs. The syntax is:
//!
//! ```text
//!   regex     := union
//!   union     := concat ('|' concat)*
//!   concat    := qualified+
//!   qualified := single ('*' | '+' | '?')*
//!   single    := char | '.' | set | '(' union ')'
//!   set       := '[' items ']' | '[' '^' items ']'
//!   items     := (char | char '-' char)+
//! ```
//!
//! where `char` is any character in the alphabet other than the meta characters
//! `. [ ] ( ) | - ^ * + ?`, or `\` followed by any character (including a meta character). `.`
//! matches any symbol in the alphabet and `[^...]` matches any symbol not in the set.

use std::{collections::BTreeSet, error::Error, fmt};

use crate::{
    alphabet::{self, SYMBOLS_LEN},
    fa::FiniteAutomaton,
};

const META_CHARS: &str = ".[]()|-^*+?";

/// An error in a regular expression, at byte `offset`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegexError {
    pub kind: RegexErrorKind,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegexErrorKind {
    /// The regular expression ended in the middle of a construct.
    UnexpectedEnd,
    /// A meta character appeared where it has no meaning.
    UnexpectedChar(char),
    /// A character which is not in the alphabet.
    BadCharacter(char),
    /// A set range whose end comes before its start.
    InvalidRange(char, char),
}

impl Error for RegexError {}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            RegexErrorKind::UnexpectedEnd => write!(f, "Regular expression ends prematurely")?,
            RegexErrorKind::UnexpectedChar(c) => write!(f, "Unexpected '{c}'")?,
            RegexErrorKind::BadCharacter(c) => write!(f, "Character {c:?} can not be matched")?,
            RegexErrorKind::InvalidRange(lo, hi) => write!(f, "Invalid range '{lo}-{hi}'")?,
        }
        write!(f, " at offset {}", self.offset)
    }
}

/// Compile `re` into a (nondeterministic) automaton whose accepting states accept `token`.
pub fn compile(re: &str, token: usize) -> Result<FiniteAutomaton, RegexError> {
    let mut p = RegexParser { src: re, pos: 0, token };
    let fa = p.union()?;
    match p.peek() {
        None => Ok(fa),
        Some(c) => Err(p.error(RegexErrorKind::UnexpectedChar(c))),
    }
}

struct RegexParser<'a> {
    src: &'a str,
    pos: usize,
    token: usize,
}

impl RegexParser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: RegexErrorKind) -> RegexError {
        RegexError {
            kind,
            offset: self.pos,
        }
    }

    fn union(&mut self) -> Result<FiniteAutomaton, RegexError> {
        let mut fa = self.concat()?;
        while self.peek() == Some('|') {
            self.bump();
            let rhs = self.concat()?;
            fa = FiniteAutomaton::unite(&fa, &rhs);
        }
        Ok(fa)
    }

    fn concat(&mut self) -> Result<FiniteAutomaton, RegexError> {
        let mut fa = self.qualified()?;
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let rhs = self.qualified()?;
            fa = FiniteAutomaton::concat(&fa, &rhs, self.token);
        }
        Ok(fa)
    }

    fn qualified(&mut self) -> Result<FiniteAutomaton, RegexError> {
        let mut fa = self.single()?;
        loop {
            fa = match self.peek() {
                Some('*') => FiniteAutomaton::star(&fa, self.token),
                Some('+') => FiniteAutomaton::plus(&fa, self.token),
                Some('?') => FiniteAutomaton::maybe(&fa, self.token),
                _ => return Ok(fa),
            };
            self.bump();
        }
    }

    fn single(&mut self) -> Result<FiniteAutomaton, RegexError> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let fa = self.union()?;
                match self.peek() {
                    Some(')') => {
                        self.bump();
                        Ok(fa)
                    }
                    Some(c) => Err(self.error(RegexErrorKind::UnexpectedChar(c))),
                    None => Err(self.error(RegexErrorKind::UnexpectedEnd)),
                }
            }
            Some('.') => {
                self.bump();
                Ok(FiniteAutomaton::make_range(
                    SYMBOLS_LEN,
                    0,
                    SYMBOLS_LEN - 1,
                    self.token,
                ))
            }
            Some('[') => {
                self.bump();
                let syms = self.set()?;
                Ok(FiniteAutomaton::make_set(SYMBOLS_LEN, syms, self.token))
            }
            _ => {
                let c = self.char()?;
                let sym = self.symbol(c)?;
                Ok(FiniteAutomaton::make_single(SYMBOLS_LEN, sym, self.token))
            }
        }
    }

    /// Parse the remainder of a set after its opening `[`.
    fn set(&mut self) -> Result<BTreeSet<usize>, RegexError> {
        let negated = self.peek() == Some('^');
        if negated {
            self.bump();
        }
        let mut syms = BTreeSet::new();
        loop {
            let start = self.pos;
            let lo = self.char()?;
            if self.peek() == Some('-') {
                self.bump();
                let hi = self.char()?;
                if lo > hi {
                    return Err(RegexError {
                        kind: RegexErrorKind::InvalidRange(lo, hi),
                        offset: start,
                    });
                }
                // Characters outside the alphabet can never be matched, so ranges quietly skip
                // them.
                syms.extend((lo..=hi).filter_map(alphabet::symbol));
            } else {
                syms.insert(self.symbol(lo)?);
            }
            if self.peek() == Some(']') {
                self.bump();
                break;
            }
        }
        if negated {
            syms = (0..SYMBOLS_LEN).filter(|s| !syms.contains(s)).collect();
        }
        Ok(syms)
    }

    /// Parse a literal (possibly escaped) character.
    fn char(&mut self) -> Result<char, RegexError> {
        match self.peek() {
            None => Err(self.error(RegexErrorKind::UnexpectedEnd)),
            Some('\\') => {
                self.bump();
                self.bump()
                    .ok_or_else(|| self.error(RegexErrorKind::UnexpectedEnd))
            }
            Some(c) if META_CHARS.contains(c) => Err(self.error(RegexErrorKind::UnexpectedChar(c))),
            Some(c) => {
                self.bump();
                Ok(c)
            }
        }
    }

    /// Map the character just parsed to its alphabet symbol.
    fn symbol(&self, c: char) -> Result<usize, RegexError> {
        alphabet::symbol(c).ok_or_else(|| RegexError {
            kind: RegexErrorKind::BadCharacter(c),
            offset: self.pos - c.len_utf8(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::{RegexError, RegexErrorKind, compile};
    use crate::fa::FiniteAutomaton;

    fn dfa(re: &str) -> FiniteAutomaton {
        FiniteAutomaton::simplify(&FiniteAutomaton::make_deterministic(&compile(re, 0).unwrap()))
    }

    fn err(re: &str) -> RegexError {
        compile(re, 0).unwrap_err()
    }

    #[test]
    fn test_literals() {
        let fa = dfa("abc");
        assert_eq!(fa.accepts_str("abc"), Some(0));
        assert_eq!(fa.accepts_str("ab"), None);
        assert_eq!(fa.accepts_str("abcd"), None);
    }

    #[test]
    fn test_union_and_qualifiers() {
        let fa = dfa("ab*|c+d?");
        for s in ["a", "ab", "abbb", "c", "cc", "cd", "ccd"] {
            assert_eq!(fa.accepts_str(s), Some(0), "{s}");
        }
        for s in ["", "b", "abc", "d", "cdd", "ac"] {
            assert_eq!(fa.accepts_str(s), None, "{s}");
        }
    }

    #[test]
    fn test_parens() {
        let fa = dfa("(ab)*");
        assert_eq!(fa.accepts_str(""), Some(0));
        assert_eq!(fa.accepts_str("abab"), Some(0));
        assert_eq!(fa.accepts_str("aba"), None);
        let fa = dfa("a(b|c)?");
        assert_eq!(fa.accepts_str("a"), Some(0));
        assert_eq!(fa.accepts_str("ac"), Some(0));
        assert_eq!(fa.accepts_str("abc"), None);
    }

    #[test]
    fn test_sets() {
        let fa = dfa("[a-cx]+");
        assert_eq!(fa.accepts_str("abcx"), Some(0));
        assert_eq!(fa.accepts_str("d"), None);
        let fa = dfa("[^a-z]");
        assert_eq!(fa.accepts_str("A"), Some(0));
        assert_eq!(fa.accepts_str("\n"), Some(0));
        assert_eq!(fa.accepts_str("q"), None);
        let fa = dfa("[\\-\\]]");
        assert_eq!(fa.accepts_str("-"), Some(0));
        assert_eq!(fa.accepts_str("]"), Some(0));
    }

    #[test]
    fn test_dot_and_escapes() {
        let fa = dfa(".");
        assert_eq!(fa.accepts_str("\t"), Some(0));
        assert_eq!(fa.accepts_str("~"), Some(0));
        assert_eq!(fa.accepts_str("ab"), None);
        let fa = dfa("\\.\\*\\\\");
        assert_eq!(fa.accepts_str(".*\\"), Some(0));
        assert_eq!(fa.accepts_str("a*\\"), None);
    }

    #[test]
    fn test_token_threaded() {
        let fa = FiniteAutomaton::make_deterministic(&compile("x(y|z)*", 5).unwrap());
        assert_eq!(fa.accepts_str("xyz"), Some(5));
        assert_eq!(fa.accepts_str("x"), Some(5));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            err("ab("),
            RegexError {
                kind: RegexErrorKind::UnexpectedEnd,
                offset: 3
            }
        );
        assert_eq!(
            err("a)"),
            RegexError {
                kind: RegexErrorKind::UnexpectedChar(')'),
                offset: 1
            }
        );
        assert_eq!(
            err("*a"),
            RegexError {
                kind: RegexErrorKind::UnexpectedChar('*'),
                offset: 0
            }
        );
        assert_eq!(
            err("a|"),
            RegexError {
                kind: RegexErrorKind::UnexpectedEnd,
                offset: 2
            }
        );
        assert_eq!(
            err("[z-a]"),
            RegexError {
                kind: RegexErrorKind::InvalidRange('z', 'a'),
                offset: 1
            }
        );
        assert_eq!(
            err("[]"),
            RegexError {
                kind: RegexErrorKind::UnexpectedChar(']'),
                offset: 1
            }
        );
        assert_eq!(
            err("aé"),
            RegexError {
                kind: RegexErrorKind::BadCharacter('é'),
                offset: 1
            }
        );
        assert_eq!(
            err("a\\"),
            RegexError {
                kind: RegexErrorKind::UnexpectedEnd,
                offset: 2
            }
        );
        assert_eq!(
            err("").kind,
            RegexErrorKind::UnexpectedEnd
        );
        assert_eq!(
            err("a|)").to_string(),
            "Unexpected ')' at offset 2"
        );
    }
}

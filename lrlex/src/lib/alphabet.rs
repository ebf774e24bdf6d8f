//! The alphabet over which lexical automata run. Text characters outside the alphabet can never
//! be matched by any token.

/// How many symbols the alphabet has: `\t`, `\n`, `\r`, and printable ASCII.
pub const SYMBOLS_LEN: usize = 98;

const FIRST_PRINTABLE: usize = 3;

/// Map `c` to its alphabet symbol, or `None` if `c` is not in the alphabet.
pub fn symbol(c: char) -> Option<usize> {
    match c {
        '\t' => Some(0),
        '\n' => Some(1),
        '\r' => Some(2),
        ' '..='~' => Some(c as usize - ' ' as usize + FIRST_PRINTABLE),
        _ => None,
    }
}

/// Map the alphabet symbol `sym` back to its character.
///
/// # Panics
///
/// If `sym >= SYMBOLS_LEN`.
pub fn char_of(sym: usize) -> char {
    assert!(sym < SYMBOLS_LEN, "symbol {sym} is not in the alphabet");
    match sym {
        0 => '\t',
        1 => '\n',
        2 => '\r',
        _ => char::from((sym - FIRST_PRINTABLE) as u8 + b' '),
    }
}

/// Escape the whitespace control characters in the alphabet for dumps.
pub(crate) fn escape(c: char) -> String {
    match c {
        '\t' => "\\t".to_owned(),
        '\n' => "\\n".to_owned(),
        '\r' => "\\r".to_owned(),
        _ => c.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::{SYMBOLS_LEN, char_of, symbol};

    #[test]
    fn test_bijection() {
        for sym in 0..SYMBOLS_LEN {
            assert_eq!(symbol(char_of(sym)), Some(sym));
        }
        assert_eq!(symbol(' '), Some(3));
        assert_eq!(symbol('~'), Some(97));
        assert_eq!(symbol('\u{7f}'), None);
        assert_eq!(symbol('é'), None);
        assert_eq!(symbol('\0'), None);
    }
}

use std::{error::Error, fmt};

use cfgrammar::{DEDENT_TOKEN, Grammar, INDENT_TOKEN, NEWLINE_TOKEN, TIdx};
use num_traits::{AsPrimitive, PrimInt, Unsigned};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The tokens a runtime synthesises for an indentation sensitive language. A language is
/// indentation sensitive if it declares an `INDENT` token, in which case it must also declare
/// `DEDENT` and `NEWLINE` tokens. This crate attaches no behaviour to these ids.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Indentation<StorageT> {
    pub is_sensitive: bool,
    pub indent_token: Option<TIdx<StorageT>>,
    pub dedent_token: Option<TIdx<StorageT>>,
    pub newline_token: Option<TIdx<StorageT>>,
}

/// An indentation sensitive language is missing one of its required tokens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndentationError {
    pub missing: String,
}

impl Error for IndentationError {}

impl fmt::Display for IndentationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Language declares '{INDENT_TOKEN}' but not '{}'",
            self.missing
        )
    }
}

impl<StorageT: 'static + PrimInt + Unsigned> Indentation<StorageT>
where
    usize: AsPrimitive<StorageT>,
{
    /// Find the indentation tokens of `grm`.
    pub fn new(grm: &Grammar<StorageT>) -> Result<Self, IndentationError> {
        let indent_token = grm.token_idx(INDENT_TOKEN);
        if indent_token.is_none() {
            return Ok(Indentation {
                is_sensitive: false,
                indent_token: None,
                dedent_token: None,
                newline_token: None,
            });
        }
        let required = |name: &str| {
            grm.token_idx(name).ok_or_else(|| IndentationError {
                missing: name.to_owned(),
            })
        };
        Ok(Indentation {
            is_sensitive: true,
            indent_token,
            dedent_token: Some(required(DEDENT_TOKEN)?),
            newline_token: Some(required(NEWLINE_TOKEN)?),
        })
    }
}

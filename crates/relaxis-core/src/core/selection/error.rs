use thiserror::Error;

/// Syntax errors raised while parsing an identification string.
///
/// Every variant carries the original string so the caller can report the
/// offending input verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("only one '{delimiter}' character is allowed within the identifier {id:?}")]
    RepeatedDelimiter { delimiter: char, id: String },

    #[error("the '{later}' identifier must come after the '{earlier}' identifier in {id:?}")]
    OutOfOrder {
        later: char,
        earlier: char,
        id: String,
    },

    #[error("the identifier {id:?} is invalid")]
    Invalid { id: String },

    #[error("the identifier token {token:?} does not correspond to a single entity")]
    AmbiguousToken { token: String },
}

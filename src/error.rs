//! Errors produced by the filter codec

/// Holds the result of decode/print/lower operations
///
/// Note that this type is also a `Result`, so usual functions (`map`, `unwrap` etc.) are
/// available.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// A failure while decoding, printing or lowering an LDAP search filter.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum ProtocolError {
    #[error("filter is empty")]
    EmptyFilter,

    #[error("filter is enclosed in apostrophes")]
    EnclosedInApostrophes,

    #[error("mismatched parentheses")]
    MismatchedParentheses,

    #[error("no equal sign found in simple filter")]
    NoEqualSign,

    #[error("invalid character {ch:?} in attribute type {attr:?} at index {index}")]
    InvalidCharInAttrType {
        attr: String,
        ch: char,
        index: usize,
    },

    #[error("invalid escaped byte at position {position}")]
    InvalidEscapedByte { position: usize },

    #[error("compound filter is missing parentheses")]
    CompoundMissingParentheses,

    #[error("no corresponding open parenthesis")]
    NoCorrespondingOpenParenthesis,

    #[error("no corresponding close parenthesis")]
    NoCorrespondingCloseParenthesis,

    #[error("'not' filter requires exactly one child filter")]
    NotRequiresExactlyOne,

    #[error("substring filter has no asterisks")]
    SubstringNoAsterisks,

    #[error("extensible match filter has no colon")]
    ExtensibleMatchNoColon,

    #[error("extensible match filter has neither attribute description nor matching rule")]
    ExtensibleMatchNoAttributeOrRule,

    #[error("filter value has neither attribute description nor matching rule")]
    ValueWithNoAttributeOrMatchingRule,

    #[error("unknown matching rule {0:?}")]
    UnknownMatchingRule(String),

    #[error("inappropriate matching for rule {0:?}")]
    InappropriateMatching(String),

    #[error("uncaught exception while decoding filter {filter:?}: {cause}")]
    UncaughtException { filter: String, cause: String },
}

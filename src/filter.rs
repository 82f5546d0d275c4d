//! Definition for types used in LDAP search filters (RFC 4515)

use std::borrow::Cow;

/// An LDAP search filter, as built by [`crate::decode`] and consumed by [`crate::print`] and
/// [`crate::lower`].
///
/// Each variant carries only the fields relevant to its kind. Octet-valued fields are not
/// guaranteed to be valid UTF-8; attribute descriptions and matching-rule identifiers are ASCII
/// text (see [`AttributeDescription`] and [`MatchingRuleId`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter<'a> {
    And(Vec<Filter<'a>>),
    Or(Vec<Filter<'a>>),
    Not(Box<Filter<'a>>),
    Equality(AttributeValueAssertion<'a>),
    GreaterOrEqual(AttributeValueAssertion<'a>),
    LessOrEqual(AttributeValueAssertion<'a>),
    ApproximateMatch(AttributeValueAssertion<'a>),
    Present(AttributeDescription<'a>),
    Substring(SubstringFilter<'a>),
    ExtensibleMatch(MatchingRuleAssertion<'a>),
}

/// `attr op value`, for the equality/ordering/approximate-match filter kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeValueAssertion<'a> {
    pub attribute_desc: AttributeDescription<'a>,
    pub assertion_value: Cow<'a, [u8]>,
}

/// A validated attribute description (`cn`, `cn;lang-fr`, ...).
///
/// Restricted to the alphabet `{A-Z, a-z, 0-9, '-', '_', ';', '='}` by the decoder; this type
/// itself does not re-validate, it is just a borrow-or-own wrapper around the already-validated
/// text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDescription<'a>(pub Cow<'a, str>);

impl<'a> AttributeDescription<'a> {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A matching-rule identifier (`caseExactMatch`, `2.5.13.5`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingRuleId<'a>(pub Cow<'a, str>);

impl<'a> MatchingRuleId<'a> {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `attr=[initial]*any*[any]*[final]`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstringFilter<'a> {
    pub attribute_desc: AttributeDescription<'a>,
    pub sub_initial: Option<Cow<'a, [u8]>>,
    pub sub_any: Vec<Cow<'a, [u8]>>,
    pub sub_final: Option<Cow<'a, [u8]>>,
}

/// `[attr][:dn][:matchingRule]:=value`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchingRuleAssertion<'a> {
    pub attribute_desc: Option<AttributeDescription<'a>>,
    pub matching_rule: Option<MatchingRuleId<'a>>,
    pub dn_attributes: bool,
    pub assertion_value: Cow<'a, [u8]>,
}

/// Builds a fresh `Present` filter for the given attribute description.
///
/// The source interns a single `(objectclass=*)` filter in process-wide state as a caching
/// optimisation; here a fresh node is built on every call (see DESIGN.md, Open Question 3).
pub fn present_filter(attr: &str) -> Filter<'static> {
    Filter::Present(AttributeDescription(Cow::Owned(attr.to_string())))
}

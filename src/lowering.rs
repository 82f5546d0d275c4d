//! Projects the raw [`Filter`] AST onto a schema-validated filter type (RFC 4515 section 4.4)

use std::borrow::Cow;

use crate::error::{ProtocolError, Result};
use crate::filter::{Filter, MatchingRuleAssertion, SubstringFilter};

/// External collaborator resolving attribute descriptions and matching-rule identifiers against
/// a directory schema.
///
/// Implementations are expected to return `ProtocolError::UnknownMatchingRule` from
/// [`resolve_matching_rule`](SchemaResolver::resolve_matching_rule) when the identifier is not
/// recognised; [`lower`] maps that into the externally visible `ProtocolError::InappropriateMatching`.
pub trait SchemaResolver {
    type AttributeDescription;
    type MatchingRule;

    fn resolve_attribute(&self, desc: &str) -> Result<Self::AttributeDescription>;
    fn resolve_matching_rule(&self, id: &str) -> Result<Self::MatchingRule>;
}

/// A [`Filter`] whose attribute descriptions and matching-rule identifiers have been resolved
/// against a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoweredFilter<'a, A, M> {
    And(Vec<LoweredFilter<'a, A, M>>),
    Or(Vec<LoweredFilter<'a, A, M>>),
    Not(Box<LoweredFilter<'a, A, M>>),
    Equality { attr: A, value: Cow<'a, [u8]> },
    GreaterOrEqual { attr: A, value: Cow<'a, [u8]> },
    LessOrEqual { attr: A, value: Cow<'a, [u8]> },
    ApproximateMatch { attr: A, value: Cow<'a, [u8]> },
    Present { attr: A },
    Substring {
        attr: A,
        sub_initial: Option<Cow<'a, [u8]>>,
        sub_any: Vec<Cow<'a, [u8]>>,
        sub_final: Option<Cow<'a, [u8]>>,
    },
    ExtensibleMatch {
        attr: Option<A>,
        rule: Option<M>,
        dn_attributes: bool,
        value: Cow<'a, [u8]>,
    },
}

/// Lowers `filter` against `resolver`.
///
/// And/Or nodes with exactly one child are simplified to that child (SPEC_FULL.md section 4.4).
pub fn lower<'a, R: SchemaResolver>(
    filter: Filter<'a>,
    resolver: &R,
) -> Result<LoweredFilter<'a, R::AttributeDescription, R::MatchingRule>> {
    match filter {
        Filter::And(children) => lower_compound(children, resolver, LoweredFilter::And),
        Filter::Or(children) => lower_compound(children, resolver, LoweredFilter::Or),
        Filter::Not(child) => Ok(LoweredFilter::Not(Box::new(lower(*child, resolver)?))),
        Filter::Equality(ava) => {
            let attr = resolver.resolve_attribute(ava.attribute_desc.as_str())?;
            Ok(LoweredFilter::Equality {
                attr,
                value: ava.assertion_value,
            })
        }
        Filter::GreaterOrEqual(ava) => {
            let attr = resolver.resolve_attribute(ava.attribute_desc.as_str())?;
            Ok(LoweredFilter::GreaterOrEqual {
                attr,
                value: ava.assertion_value,
            })
        }
        Filter::LessOrEqual(ava) => {
            let attr = resolver.resolve_attribute(ava.attribute_desc.as_str())?;
            Ok(LoweredFilter::LessOrEqual {
                attr,
                value: ava.assertion_value,
            })
        }
        Filter::ApproximateMatch(ava) => {
            let attr = resolver.resolve_attribute(ava.attribute_desc.as_str())?;
            Ok(LoweredFilter::ApproximateMatch {
                attr,
                value: ava.assertion_value,
            })
        }
        Filter::Present(desc) => {
            let attr = resolver.resolve_attribute(desc.as_str())?;
            Ok(LoweredFilter::Present { attr })
        }
        Filter::Substring(sub) => lower_substring(sub, resolver),
        Filter::ExtensibleMatch(mra) => lower_extensible_match(mra, resolver),
    }
}

fn lower_compound<'a, R: SchemaResolver>(
    children: Vec<Filter<'a>>,
    resolver: &R,
    wrap: impl Fn(Vec<LoweredFilter<'a, R::AttributeDescription, R::MatchingRule>>) -> LoweredFilter<'a, R::AttributeDescription, R::MatchingRule>,
) -> Result<LoweredFilter<'a, R::AttributeDescription, R::MatchingRule>> {
    let mut lowered = Vec::with_capacity(children.len());
    for child in children {
        lowered.push(lower(child, resolver)?);
    }
    if lowered.len() == 1 {
        Ok(lowered.pop().unwrap())
    } else {
        Ok(wrap(lowered))
    }
}

fn lower_substring<'a, R: SchemaResolver>(
    sub: SubstringFilter<'a>,
    resolver: &R,
) -> Result<LoweredFilter<'a, R::AttributeDescription, R::MatchingRule>> {
    let attr = resolver.resolve_attribute(sub.attribute_desc.as_str())?;
    Ok(LoweredFilter::Substring {
        attr,
        sub_initial: sub.sub_initial,
        sub_any: sub.sub_any,
        sub_final: sub.sub_final,
    })
}

fn lower_extensible_match<'a, R: SchemaResolver>(
    mra: MatchingRuleAssertion<'a>,
    resolver: &R,
) -> Result<LoweredFilter<'a, R::AttributeDescription, R::MatchingRule>> {
    if mra.attribute_desc.is_none() && mra.matching_rule.is_none() {
        // Unreachable through the decoder (it rejects this shape as
        // ExtensibleMatchNoAttributeOrRule), but Filter values are plain public data that a
        // caller could hand-build, so lowering re-checks the invariant defensively.
        return Err(ProtocolError::ValueWithNoAttributeOrMatchingRule);
    }

    let attr = mra
        .attribute_desc
        .as_ref()
        .map(|d| resolver.resolve_attribute(d.as_str()))
        .transpose()?;

    let rule = match &mra.matching_rule {
        Some(id) => match resolver.resolve_matching_rule(id.as_str()) {
            Ok(rule) => Some(rule),
            Err(_) => {
                log::warn!("matching rule {:?} could not be resolved", id.as_str());
                return Err(ProtocolError::InappropriateMatching(id.as_str().to_string()));
            }
        },
        None => None,
    };

    Ok(LoweredFilter::ExtensibleMatch {
        attr,
        rule,
        dn_attributes: mra.dn_attributes,
        value: mra.assertion_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_str;

    struct TestSchema;

    impl SchemaResolver for TestSchema {
        type AttributeDescription = String;
        type MatchingRule = String;

        fn resolve_attribute(&self, desc: &str) -> Result<String> {
            if desc == "bogus" {
                Err(ProtocolError::InvalidCharInAttrType {
                    attr: desc.to_string(),
                    ch: '?',
                    index: 0,
                })
            } else {
                Ok(desc.to_ascii_lowercase())
            }
        }

        fn resolve_matching_rule(&self, id: &str) -> Result<String> {
            if id == "caseExactMatch" || id == "2.5.13.5" {
                Ok(id.to_string())
            } else {
                Err(ProtocolError::UnknownMatchingRule(id.to_string()))
            }
        }
    }

    #[test]
    fn lowers_equality() {
        let f = decode_str("(cn=Jane Doe)").unwrap();
        let lowered = lower(f, &TestSchema).unwrap();
        assert_eq!(
            lowered,
            LoweredFilter::Equality {
                attr: "cn".to_string(),
                value: Cow::Borrowed(b"Jane Doe"),
            }
        );
    }

    #[test]
    fn simplifies_single_child_and() {
        let f = decode_str("(&(cn=a))").unwrap();
        let lowered = lower(f, &TestSchema).unwrap();
        assert_eq!(
            lowered,
            LoweredFilter::Equality {
                attr: "cn".to_string(),
                value: Cow::Borrowed(b"a"),
            }
        );
    }

    #[test]
    fn keeps_multi_child_and() {
        let f = decode_str("(&(cn=a)(sn=b))").unwrap();
        let lowered = lower(f, &TestSchema).unwrap();
        assert!(matches!(lowered, LoweredFilter::And(children) if children.len() == 2));
    }

    #[test]
    fn keeps_empty_and() {
        let f = decode_str("(&)").unwrap();
        let lowered = lower(f, &TestSchema).unwrap();
        assert_eq!(lowered, LoweredFilter::And(vec![]));
    }

    #[test]
    fn propagates_attribute_resolution_failure() {
        let f = decode_str("(bogus=a)").unwrap();
        assert!(lower(f, &TestSchema).is_err());
    }

    #[test]
    fn unknown_matching_rule_maps_to_inappropriate_matching() {
        let f = decode_str("(cn:noSuchRule:=Foo)").unwrap();
        let err = lower(f, &TestSchema).unwrap_err();
        assert_eq!(err, ProtocolError::InappropriateMatching("noSuchRule".to_string()));
    }

    #[test]
    fn lowers_extensible_match() {
        let f = decode_str("(:dn:2.5.13.5:=Foo)").unwrap();
        let lowered = lower(f, &TestSchema).unwrap();
        assert_eq!(
            lowered,
            LoweredFilter::ExtensibleMatch {
                attr: None,
                rule: Some("2.5.13.5".to_string()),
                dn_attributes: true,
                value: Cow::Borrowed(b"Foo"),
            }
        );
    }

    #[test]
    fn rejects_hand_built_extensible_match_with_neither_attr_nor_rule() {
        let f = Filter::ExtensibleMatch(MatchingRuleAssertion {
            attribute_desc: None,
            matching_rule: None,
            dn_attributes: false,
            assertion_value: Cow::Borrowed(b"x"),
        });
        assert_eq!(
            lower(f, &TestSchema).unwrap_err(),
            ProtocolError::ValueWithNoAttributeOrMatchingRule
        );
    }
}

//! Recursive-descent decoder: filter text -> [`Filter`] AST (RFC 4515)

use std::borrow::Cow;

use crate::error::{ProtocolError, Result};
use crate::escape::decode_escapes;
use crate::filter::{
    AttributeDescription, AttributeValueAssertion, Filter, MatchingRuleAssertion, MatchingRuleId,
    SubstringFilter,
};

const ATTR_CHARS: &[u8] = b"-_;=";

/// Decodes a complete LDAP search filter from its textual form.
///
/// See [`decode_str`] for the `&str`-accepting convenience wrapper.
pub fn decode(input: &[u8]) -> Result<Filter<'_>> {
    if input.is_empty() {
        return Err(ProtocolError::EmptyFilter);
    }
    if input.len() > 1 && input[0] == b'\'' && input[input.len() - 1] == b'\'' {
        return Err(ProtocolError::EnclosedInApostrophes);
    }
    decode_guarded(input)
}

/// Convenience wrapper over [`decode`] for callers holding a `&str`.
pub fn decode_str(input: &str) -> Result<Filter<'_>> {
    decode(input.as_bytes())
}

/// Wraps the recursive decode in `catch_unwind`, mirroring the source's defensive exception
/// handling (see SPEC_FULL.md section 7): any internal panic is logged and turned into
/// `ProtocolError::UncaughtException` rather than propagating to the caller.
fn decode_guarded(input: &[u8]) -> Result<Filter<'_>> {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        decode_range(input, 0, input.len())
    }));
    match result {
        Ok(r) => r,
        Err(payload) => {
            let cause = panic_message(&payload);
            let filter = String::from_utf8_lossy(input).into_owned();
            log::error!("uncaught exception decoding filter {:?}: {}", filter, cause);
            Err(ProtocolError::UncaughtException { filter, cause })
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Clone, Copy)]
enum CompoundKind {
    And,
    Or,
    Not,
}

#[derive(Clone, Copy)]
enum SimpleKind {
    Equality,
    GreaterOrEqual,
    LessOrEqual,
    ApproximateMatch,
}

fn decode_range(bytes: &[u8], start: usize, end: usize) -> Result<Filter<'_>> {
    let (start, end) = strip_parens(bytes, start, end)?;
    if start >= end {
        return Err(ProtocolError::NoEqualSign);
    }
    match bytes[start] {
        b'&' => decode_compound(CompoundKind::And, bytes, start + 1, end),
        b'|' => decode_compound(CompoundKind::Or, bytes, start + 1, end),
        b'!' => decode_compound(CompoundKind::Not, bytes, start + 1, end),
        _ => decode_simple(bytes, start, end),
    }
}

/// Strips one matching pair of enclosing parentheses, if present.
fn strip_parens(bytes: &[u8], start: usize, end: usize) -> Result<(usize, usize)> {
    if start < end && bytes[start] == b'(' {
        if bytes[end - 1] != b')' {
            return Err(ProtocolError::MismatchedParentheses);
        }
        Ok((start + 1, end - 1))
    } else {
        Ok((start, end))
    }
}

fn decode_compound(kind: CompoundKind, bytes: &[u8], start: usize, end: usize) -> Result<Filter<'_>> {
    if start == end {
        return match kind {
            CompoundKind::Not => Err(ProtocolError::NotRequiresExactlyOne),
            CompoundKind::And => Ok(Filter::And(Vec::new())),
            CompoundKind::Or => Ok(Filter::Or(Vec::new())),
        };
    }

    let mut children = Vec::new();
    let mut depth: i32 = 0;
    let mut open_pos: Option<usize> = None;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'(' => {
                if depth == 0 {
                    open_pos = Some(i);
                }
                depth += 1;
            }
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ProtocolError::NoCorrespondingOpenParenthesis);
                }
                if depth == 0 {
                    let open = open_pos.take().expect("depth returned to zero without an open");
                    children.push(decode_range(bytes, open, i + 1)?);
                }
            }
            _ => {
                if depth == 0 {
                    return Err(ProtocolError::CompoundMissingParentheses);
                }
            }
        }
        i += 1;
    }
    if depth != 0 {
        return Err(ProtocolError::NoCorrespondingCloseParenthesis);
    }

    match kind {
        CompoundKind::Not => {
            if children.len() == 1 {
                Ok(Filter::Not(Box::new(children.pop().unwrap())))
            } else {
                Err(ProtocolError::NotRequiresExactlyOne)
            }
        }
        CompoundKind::And => Ok(Filter::And(children)),
        CompoundKind::Or => Ok(Filter::Or(children)),
    }
}

fn decode_simple(bytes: &[u8], start: usize, end: usize) -> Result<Filter<'_>> {
    let rel_eq = bytes[start..end].iter().position(|&b| b == b'=');
    let eq = match rel_eq {
        Some(0) | None => return Err(ProtocolError::NoEqualSign),
        Some(rel) => start + rel,
    };

    let preceding = bytes[eq - 1];
    let (kind, attr_end) = match preceding {
        b'~' => (SimpleKind::ApproximateMatch, eq - 1),
        b'>' => (SimpleKind::GreaterOrEqual, eq - 1),
        b'<' => (SimpleKind::LessOrEqual, eq - 1),
        b':' => return decode_extensible_match(bytes, start, eq, end),
        _ => (SimpleKind::Equality, eq),
    };
    if attr_end == start {
        return Err(ProtocolError::NoEqualSign);
    }

    let attr = validate_attribute_description(bytes, start, attr_end)?;
    let value_start = eq + 1;
    let value_bytes = &bytes[value_start..end];

    if value_bytes.is_empty() {
        return Ok(build_simple(kind, attr, Cow::Borrowed(value_bytes)));
    }
    if value_bytes == b"*" {
        return match kind {
            SimpleKind::Equality => Ok(Filter::Present(attr)),
            SimpleKind::GreaterOrEqual | SimpleKind::LessOrEqual | SimpleKind::ApproximateMatch => {
                Ok(build_simple(kind, attr, Cow::Borrowed(value_bytes)))
            }
        };
    }
    if value_bytes.contains(&b'*') {
        return decode_substring(attr, value_bytes, value_start);
    }

    let value = decode_escapes(value_bytes, value_start)?;
    Ok(build_simple(kind, attr, value))
}

fn build_simple<'a>(
    kind: SimpleKind,
    attribute_desc: AttributeDescription<'a>,
    assertion_value: Cow<'a, [u8]>,
) -> Filter<'a> {
    let ava = AttributeValueAssertion {
        attribute_desc,
        assertion_value,
    };
    match kind {
        SimpleKind::Equality => Filter::Equality(ava),
        SimpleKind::GreaterOrEqual => Filter::GreaterOrEqual(ava),
        SimpleKind::LessOrEqual => Filter::LessOrEqual(ava),
        SimpleKind::ApproximateMatch => Filter::ApproximateMatch(ava),
    }
}

fn validate_attribute_description(bytes: &[u8], start: usize, end: usize) -> Result<AttributeDescription<'_>> {
    for (index, &b) in bytes[start..end].iter().enumerate() {
        if !(b.is_ascii_alphanumeric() || ATTR_CHARS.contains(&b)) {
            let attr = String::from_utf8_lossy(&bytes[start..end]).into_owned();
            return Err(ProtocolError::InvalidCharInAttrType {
                attr,
                ch: b as char,
                index,
            });
        }
    }
    // validated above: every byte is ASCII, so this is always valid UTF-8
    let s = std::str::from_utf8(&bytes[start..end]).expect("validated ASCII attribute description");
    Ok(AttributeDescription(Cow::Borrowed(s)))
}

fn decode_substring<'a>(
    attribute_desc: AttributeDescription<'a>,
    value: &'a [u8],
    base_offset: usize,
) -> Result<Filter<'a>> {
    let stars: Vec<usize> = value
        .iter()
        .enumerate()
        .filter_map(|(i, &b)| if b == b'*' { Some(i) } else { None })
        .collect();
    if stars.is_empty() {
        return Err(ProtocolError::SubstringNoAsterisks);
    }

    let sub_initial = if stars[0] > 0 {
        Some(decode_escapes(&value[..stars[0]], base_offset)?)
    } else {
        None
    };

    let mut sub_any = Vec::with_capacity(stars.len().saturating_sub(1));
    for pair in stars.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let chunk_start = prev + 1;
        sub_any.push(decode_escapes(&value[chunk_start..next], base_offset + chunk_start)?);
    }

    let last = *stars.last().unwrap();
    let sub_final = if last + 1 < value.len() {
        Some(decode_escapes(&value[last + 1..], base_offset + last + 1)?)
    } else {
        None
    };

    Ok(Filter::Substring(SubstringFilter {
        attribute_desc,
        sub_initial,
        sub_any,
        sub_final,
    }))
}

/// Decodes the prefix of an extensible-match simple filter: everything before `equalPos`, given
/// that the byte right before `equalPos` is `:`. See SPEC_FULL.md section 4.2.4.
fn decode_extensible_match(bytes: &[u8], start: usize, eq: usize, end: usize) -> Result<Filter<'_>> {
    // content excludes the ':=' marker's colon, which sits at eq - 1
    let content = &bytes[start..eq - 1];

    let (attribute_desc, matching_rule, dn_attributes) = if content.first() == Some(&b':') {
        let rest = &content[1..];
        let (dn, rule) = split_dn_modifier(rest);
        (None, rule, dn)
    } else {
        match content.iter().position(|&b| b == b':') {
            // no colon left in `content`: the structural colon stripped off above was the only
            // one present, so this is the plain `attrType:=value` form, no `:dn`/matching rule.
            None if content.is_empty() => (None, None, false),
            None => {
                let attr = validate_attribute_description(bytes, start, start + content.len())?;
                (Some(attr), None, false)
            }
            Some(idx) => {
                let attr = validate_attribute_description(bytes, start, start + idx)?;
                let remainder = &content[idx + 1..];
                let (dn, rule) = split_dn_modifier(remainder);
                (Some(attr), rule, dn)
            }
        }
    };

    if attribute_desc.is_none() && matching_rule.is_none() {
        return Err(ProtocolError::ExtensibleMatchNoAttributeOrRule);
    }

    let value_start = eq + 1;
    let assertion_value = decode_escapes(&bytes[value_start..end], value_start)?;

    Ok(Filter::ExtensibleMatch(MatchingRuleAssertion {
        attribute_desc,
        matching_rule,
        dn_attributes,
        assertion_value,
    }))
}

/// Recognizes an optional leading `dn` or `dn:<rule>` modifier (case-insensitively) in `text`,
/// returning whether it was present and whatever matching-rule identifier follows.
fn split_dn_modifier(text: &[u8]) -> (bool, Option<MatchingRuleId<'_>>) {
    let is_dn_prefix = text.len() >= 2 && text[0].eq_ignore_ascii_case(&b'd') && text[1].eq_ignore_ascii_case(&b'n');
    if is_dn_prefix && (text.len() == 2 || text[2] == b':') {
        let rest = if text.len() > 3 { &text[3..] } else { &[][..] };
        let rule = if rest.is_empty() {
            None
        } else {
            Some(MatchingRuleId(Cow::Borrowed(
                std::str::from_utf8(rest).unwrap_or(""),
            )))
        };
        (true, rule)
    } else if text.is_empty() {
        (false, None)
    } else {
        (
            false,
            Some(MatchingRuleId(Cow::Borrowed(
                std::str::from_utf8(text).unwrap_or(""),
            ))),
        )
    }
}

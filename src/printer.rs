//! AST -> filter text printer (the inverse of [`crate::decoder`])

use crate::filter::{Filter, MatchingRuleAssertion, SubstringFilter};

/// Renders `filter` back into its textual form.
///
/// The result is a byte buffer, not a `String`: octets that are not valid UTF-8 are emitted
/// verbatim (see SPEC_FULL.md section 4.3), which a Rust `String` cannot represent.
pub fn print(filter: &Filter<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    print_into(filter, &mut out);
    out
}

fn print_into(filter: &Filter<'_>, out: &mut Vec<u8>) {
    match filter {
        Filter::And(children) => print_compound(b'&', children, out),
        Filter::Or(children) => print_compound(b'|', children, out),
        Filter::Not(child) => {
            out.push(b'(');
            out.push(b'!');
            print_into(child, out);
            out.push(b')');
        }
        Filter::Equality(ava) => print_simple(ava.attribute_desc.as_str(), b"=", &ava.assertion_value, out),
        Filter::GreaterOrEqual(ava) => {
            print_simple(ava.attribute_desc.as_str(), b">=", &ava.assertion_value, out)
        }
        Filter::LessOrEqual(ava) => print_simple(ava.attribute_desc.as_str(), b"<=", &ava.assertion_value, out),
        Filter::ApproximateMatch(ava) => {
            print_simple(ava.attribute_desc.as_str(), b"~=", &ava.assertion_value, out)
        }
        Filter::Present(attr) => {
            out.push(b'(');
            out.extend_from_slice(attr.as_str().as_bytes());
            out.extend_from_slice(b"=*)");
        }
        Filter::Substring(sub) => print_substring(sub, out),
        Filter::ExtensibleMatch(mra) => print_extensible_match(mra, out),
    }
}

fn print_compound(marker: u8, children: &[Filter<'_>], out: &mut Vec<u8>) {
    out.push(b'(');
    out.push(marker);
    for child in children {
        print_into(child, out);
    }
    out.push(b')');
}

fn print_simple(attr: &str, op: &[u8], value: &[u8], out: &mut Vec<u8>) {
    out.push(b'(');
    out.extend_from_slice(attr.as_bytes());
    out.extend_from_slice(op);
    escape_value(value, out);
    out.push(b')');
}

fn print_substring(sub: &SubstringFilter<'_>, out: &mut Vec<u8>) {
    out.push(b'(');
    out.extend_from_slice(sub.attribute_desc.as_str().as_bytes());
    out.push(b'=');
    if let Some(initial) = &sub.sub_initial {
        escape_value(initial, out);
    }
    for any in &sub.sub_any {
        out.push(b'*');
        escape_value(any, out);
    }
    out.push(b'*');
    if let Some(fin) = &sub.sub_final {
        escape_value(fin, out);
    }
    out.push(b')');
}

fn print_extensible_match(mra: &MatchingRuleAssertion<'_>, out: &mut Vec<u8>) {
    out.push(b'(');
    if let Some(attr) = &mra.attribute_desc {
        out.extend_from_slice(attr.as_str().as_bytes());
    }
    if mra.dn_attributes {
        out.extend_from_slice(b":dn");
    }
    if let Some(rule) = &mra.matching_rule {
        out.push(b':');
        out.extend_from_slice(rule.as_str().as_bytes());
    }
    out.extend_from_slice(b":=");
    escape_value(&mra.assertion_value, out);
    out.push(b')');
}

/// Escapes the bytes that would otherwise be misinterpreted by the decoder: `\0`, `(`, `)`, `*`,
/// `\`. Every other byte, including non-UTF-8 octets, is copied verbatim.
fn escape_value(value: &[u8], out: &mut Vec<u8>) {
    for &b in value {
        match b {
            0x00 | b'(' | b')' | b'*' | b'\\' => {
                out.push(b'\\');
                out.extend_from_slice(format!("{:02X}", b).as_bytes());
            }
            _ => out.push(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{decode, decode_str};
    use std::borrow::Cow;

    fn print_str(filter: &Filter<'_>) -> String {
        String::from_utf8(print(filter)).unwrap()
    }

    #[test]
    fn prints_simple_equality() {
        let f = decode_str("(cn=Jane Doe)").unwrap();
        assert_eq!(print_str(&f), "(cn=Jane Doe)");
    }

    #[test]
    fn prints_present() {
        let f = decode_str("(objectclass=*)").unwrap();
        assert_eq!(print_str(&f), "(objectclass=*)");
    }

    #[test]
    fn prints_and_or_not() {
        assert_eq!(print_str(&decode_str("(&(cn=a)(sn=b))").unwrap()), "(&(cn=a)(sn=b))");
        assert_eq!(print_str(&decode_str("(|(cn=a)(sn=b))").unwrap()), "(|(cn=a)(sn=b))");
        assert_eq!(print_str(&decode_str("(!(cn=a))").unwrap()), "(!(cn=a))");
    }

    #[test]
    fn prints_empty_and_or() {
        assert_eq!(print_str(&decode_str("(&)").unwrap()), "(&)");
        assert_eq!(print_str(&decode_str("(|)").unwrap()), "(|)");
    }

    #[test]
    fn prints_substring() {
        assert_eq!(print_str(&decode_str("(cn=Jo*n*)").unwrap()), "(cn=Jo*n*)");
    }

    #[test]
    fn prints_substring_with_all_parts() {
        assert_eq!(
            print_str(&decode_str("(cn=Jo*an*n*e)").unwrap()),
            "(cn=Jo*an*n*e)"
        );
    }

    #[test]
    fn prints_extensible_match_variants() {
        assert_eq!(
            print_str(&decode_str("(cn:caseExactMatch:=Foo)").unwrap()),
            "(cn:caseExactMatch:=Foo)"
        );
        assert_eq!(print_str(&decode_str("(:dn:2.5.13.5:=Foo)").unwrap()), "(:dn:2.5.13.5:=Foo)");
        assert_eq!(print_str(&decode_str("(cn:dn:=Foo)").unwrap()), "(cn:dn:=Foo)");
    }

    #[test]
    fn escapes_special_bytes_in_output() {
        let f = decode_str("(cn=a\\2ab)").unwrap();
        assert_eq!(print_str(&f), "(cn=a\\2Ab)");
    }

    #[test]
    fn escapes_parentheses_and_asterisk_and_backslash_and_nul() {
        use crate::filter::{AttributeDescription, AttributeValueAssertion};
        let f = Filter::Equality(AttributeValueAssertion {
            attribute_desc: AttributeDescription(Cow::Borrowed("cn")),
            assertion_value: Cow::Borrowed(&[b'(', b')', b'*', b'\\', 0x00]),
        });
        assert_eq!(print_str(&f), "(cn=\\28\\29\\2A\\5C\\00)");
    }

    #[test]
    fn non_utf8_bytes_pass_through_verbatim() {
        use crate::filter::{AttributeDescription, AttributeValueAssertion};
        let f = Filter::Equality(AttributeValueAssertion {
            attribute_desc: AttributeDescription(Cow::Borrowed("cn")),
            assertion_value: Cow::Borrowed(&[0xFF, 0xFE]),
        });
        let printed = print(&f);
        assert_eq!(printed, b"(cn=\xFF\xFE)");
    }

    #[test]
    fn round_trip_all_scenarios() {
        let inputs = [
            "(cn=Jane Doe)",
            "(objectclass=*)",
            "(&(cn=a)(sn=b))",
            "(!(cn=a))",
            "(cn=Jo*n*)",
            "(cn:caseExactMatch:=Foo)",
            "(:dn:2.5.13.5:=Foo)",
            "(cn=a\\2ab)",
            "(cn>=*)",
            "(cn=a**b)",
        ];
        for input in inputs {
            let f1 = decode_str(input).unwrap();
            let printed = print(&f1);
            let f2 = decode(&printed).unwrap();
            assert_eq!(f1, f2, "round trip failed for {:?}", input);
            // idempotent printing
            assert_eq!(print(&f2), printed);
        }
    }
}

//! Placeholder substitution.
//!
//! The raw expression is scanned once, left to right. Text between
//! placeholders is copied as-is and each `{:name}` is replaced by the literal
//! form of its value, so substituted text is never scanned again.

use winnow::combinator::{alt, delimited};
use winnow::prelude::*;
use winnow::token::{take_until, take_while};

use super::params::Params;
use crate::error::RenderError;

// Manually define PResult for resilience against winnow version changes
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

#[derive(Debug, PartialEq)]
enum Segment<'s> {
    Text(&'s str),
    Placeholder(&'s str),
}

/// Characters allowed in a placeholder name. Field paths may carry `@`
/// prefixes and `:modifier` suffixes, so only braces, quotes and whitespace
/// are excluded.
pub(crate) fn is_name_char(c: char) -> bool {
    !matches!(c, '{' | '}' | '\'' | '"') && !c.is_whitespace()
}

/// `{:name}`
fn placeholder<'s>(input: &mut &'s str) -> PResult<&'s str> {
    delimited("{:", take_while(1.., is_name_char), '}').parse_next(input)
}

fn segment<'s>(input: &mut &'s str) -> PResult<Segment<'s>> {
    alt((
        placeholder.map(Segment::Placeholder),
        // Text up to the next candidate placeholder
        take_until(1.., "{:").map(Segment::Text),
        // An opener that is not followed by a valid name and brace
        "{:".map(Segment::Text),
    ))
    .parse_next(input)
}

fn substitute(raw: &str, values: &Params, strict: bool) -> Result<String, RenderError> {
    let mut input = raw;
    let mut out = String::with_capacity(raw.len());

    while !input.is_empty() {
        let start = input;
        match segment.parse_next(&mut input) {
            Ok(Segment::Text(text)) => out.push_str(text),
            Ok(Segment::Placeholder(name)) => match values.get(name) {
                Some(value) => out.push_str(&value.to_literal()?),
                None if strict => return Err(RenderError::UnresolvedPlaceholder(name.to_string())),
                None => {
                    tracing::warn!("Render: no value for {{:{}}}, leaving it in place", name);
                    out.push_str("{:");
                    out.push_str(name);
                    out.push('}');
                }
            },
            // No placeholder opener left
            Err(_) => {
                out.push_str(start);
                break;
            }
        }
    }

    Ok(out)
}

/// Replace every `{:name}` in `raw` with the literal form of `values[name]`.
///
/// Fails with [`RenderError::UnresolvedPlaceholder`] when a placeholder has
/// no value.
pub fn render(raw: &str, values: &Params) -> Result<String, RenderError> {
    substitute(raw, values, true)
}

/// Like [`render`], but placeholders without a value are left untouched.
pub fn render_lossy(raw: &str, values: &Params) -> Result<String, RenderError> {
    substitute(raw, values, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::value::FilterValue;
    use serde_json::json;

    fn params(pairs: &[(&str, FilterValue)]) -> Params {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_segments() {
        let mut input = "a={:a1} && b";
        assert_eq!(segment(&mut input).unwrap(), Segment::Text("a="));
        assert_eq!(segment(&mut input).unwrap(), Segment::Placeholder("a1"));
        assert!(segment(&mut input).is_err());
        assert_eq!(input, " && b");
    }

    #[test]
    fn test_scalar_substitution() {
        let values = params(&[
            ("status1", FilterValue::from("active")),
            ("age1", FilterValue::from(18)),
        ]);
        let out = render("status={:status1} && age>{:age1}", &values).unwrap();
        assert_eq!(out, "status='active' && age>18");
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let values = params(&[("a1", FilterValue::from(true))]);
        assert_eq!(render("{:a1} || {:a1}", &values).unwrap(), "true || true");
    }

    #[test]
    fn test_null_and_json() {
        let values = params(&[
            ("x1", FilterValue::Null),
            ("meta1", FilterValue::from(json!({"k": "it's"}))),
        ]);
        assert_eq!(
            render("x={:x1} && meta={:meta1}", &values).unwrap(),
            r#"x=null && meta='{"k":"it\'s"}'"#
        );
    }

    #[test]
    fn test_unresolved_placeholder_is_an_error() {
        let err = render("a={:a1}", &Params::new()).unwrap_err();
        assert!(matches!(err, RenderError::UnresolvedPlaceholder(name) if name == "a1"));
    }

    #[test]
    fn test_non_finite_value_is_an_error() {
        let values = params(&[("a1", FilterValue::from(f64::INFINITY))]);
        let err = render("a={:a1}", &values).unwrap_err();
        assert_eq!(err.to_string(), "Cannot render non-finite number inf");
    }

    #[test]
    fn test_lossy_leaves_unresolved_placeholder() {
        let values = params(&[("b1", FilterValue::from(2))]);
        assert_eq!(
            render_lossy("a={:a1} && b={:b1}", &values).unwrap(),
            "a={:a1} && b=2"
        );
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let values = params(&[
            ("a1", FilterValue::from("{:b1}")),
            ("b1", FilterValue::from(1)),
        ]);
        assert_eq!(render("a={:a1}", &values).unwrap(), "a='{:b1}'");
    }

    #[test]
    fn test_non_placeholder_braces_are_copied() {
        let values = params(&[("a1", FilterValue::from(1))]);
        assert_eq!(
            render("x~'{:' && y~'{: }' && a={:a1} && z='{'", &values).unwrap(),
            "x~'{:' && y~'{: }' && a=1 && z='{'"
        );
    }

    #[test]
    fn test_unused_values_are_ignored() {
        let values = params(&[("a1", FilterValue::from(1))]);
        assert_eq!(render("id!=''", &values).unwrap(), "id!=''");
        assert_eq!(render("", &values).unwrap(), "");
    }

    #[test]
    fn test_modifier_and_request_names() {
        let values = params(&[
            ("title:lower1", FilterValue::from("abc")),
            ("@request.auth.id1", FilterValue::from("u1")),
        ]);
        assert_eq!(
            render(
                "title:lower={:title:lower1} && @request.auth.id={:@request.auth.id1}",
                &values
            )
            .unwrap(),
            "title:lower='abc' && @request.auth.id='u1'"
        );

        let err = render("tags:each={:tags:each1}", &values).unwrap_err();
        assert!(matches!(err, RenderError::UnresolvedPlaceholder(name) if name == "tags:each1"));
    }

    #[test]
    fn test_dotted_names() {
        let values = params(&[("author.name1", FilterValue::from("Ann"))]);
        assert_eq!(
            render("author.name={:author.name1}", &values).unwrap(),
            "author.name='Ann'"
        );
    }
}

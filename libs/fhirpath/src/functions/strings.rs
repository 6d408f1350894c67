//! String functions.
//!
//! Receivers are singleton strings; an empty receiver propagates empty,
//! and positions are counted in characters, not bytes. The regex
//! functions run in single-line mode (dot matches newline) per the
//! FHIRPath regex dialect; patterns are user text and are not rewritten.

use std::sync::Arc;

use regex::Regex;

use crate::error::{Error, Result};
use crate::value::{Collection, Value};

/// The singleton string receiver, or `None` to propagate empty.
fn receiver(input: &Collection, what: &str) -> Result<Option<Arc<str>>> {
    match input.singleton_value(what)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::Type(format!(
            "{what} requires a string input, found {other:?}"
        ))),
    }
}

/// A required string argument; an empty argument propagates empty.
fn string_arg(arg: &Collection, what: &str) -> Result<Option<Arc<str>>> {
    match arg.singleton_value(what)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(Error::Type(format!(
            "{what} must be a string, found {other:?}"
        ))),
    }
}

fn compile(pattern: &str, anchored: bool, what: &str) -> Result<Regex> {
    let source = if anchored {
        format!("(?s)^(?:{pattern})$")
    } else {
        format!("(?s){pattern}")
    };
    Regex::new(&source).map_err(|e| Error::Type(format!("{what}: invalid regex: {e}")))
}

pub fn index_of(input: Collection, search: &Collection) -> Result<Collection> {
    let (Some(s), Some(needle)) = (
        receiver(&input, "indexOf()")?,
        string_arg(search, "indexOf() argument")?,
    ) else {
        return Ok(Collection::empty());
    };
    let index = match s.find(needle.as_ref()) {
        Some(byte_pos) => s[..byte_pos].chars().count() as i32,
        None => -1,
    };
    Ok(Collection::singleton(Value::Integer(index)))
}

pub fn last_index_of(input: Collection, search: &Collection) -> Result<Collection> {
    let (Some(s), Some(needle)) = (
        receiver(&input, "lastIndexOf()")?,
        string_arg(search, "lastIndexOf() argument")?,
    ) else {
        return Ok(Collection::empty());
    };
    let index = match s.rfind(needle.as_ref()) {
        Some(byte_pos) => s[..byte_pos].chars().count() as i32,
        None => -1,
    };
    Ok(Collection::singleton(Value::Integer(index)))
}

pub fn substring(
    input: Collection,
    start: &Collection,
    length: Option<&Collection>,
) -> Result<Collection> {
    let Some(s) = receiver(&input, "substring()")? else {
        return Ok(Collection::empty());
    };
    if start.is_empty() {
        return Ok(Collection::empty());
    }
    let start = start.as_integer("substring() start")?;
    let chars: Vec<char> = s.chars().collect();
    if start < 0 || start as usize >= chars.len() {
        return Ok(Collection::empty());
    }
    let begin = start as usize;
    let end = match length {
        Some(length) if !length.is_empty() => {
            let len = length.as_integer("substring() length")?;
            if len <= 0 {
                return Ok(Collection::empty());
            }
            (begin + len as usize).min(chars.len())
        }
        _ => chars.len(),
    };
    let out: String = chars[begin..end].iter().collect();
    Ok(Collection::singleton(Value::string(out)))
}

pub fn starts_with(input: Collection, prefix: &Collection) -> Result<Collection> {
    let (Some(s), Some(prefix)) = (
        receiver(&input, "startsWith()")?,
        string_arg(prefix, "startsWith() argument")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::Boolean(
        s.starts_with(prefix.as_ref()),
    )))
}

pub fn ends_with(input: Collection, suffix: &Collection) -> Result<Collection> {
    let (Some(s), Some(suffix)) = (
        receiver(&input, "endsWith()")?,
        string_arg(suffix, "endsWith() argument")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::Boolean(
        s.ends_with(suffix.as_ref()),
    )))
}

pub fn contains(input: Collection, needle: &Collection) -> Result<Collection> {
    let (Some(s), Some(needle)) = (
        receiver(&input, "contains()")?,
        string_arg(needle, "contains() argument")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::Boolean(
        s.contains(needle.as_ref()),
    )))
}

pub fn upper(input: Collection) -> Result<Collection> {
    Ok(match receiver(&input, "upper()")? {
        Some(s) => Collection::singleton(Value::string(s.to_uppercase())),
        None => Collection::empty(),
    })
}

pub fn lower(input: Collection) -> Result<Collection> {
    Ok(match receiver(&input, "lower()")? {
        Some(s) => Collection::singleton(Value::string(s.to_lowercase())),
        None => Collection::empty(),
    })
}

pub fn replace(
    input: Collection,
    pattern: &Collection,
    substitution: &Collection,
) -> Result<Collection> {
    let (Some(s), Some(pattern), Some(substitution)) = (
        receiver(&input, "replace()")?,
        string_arg(pattern, "replace() pattern")?,
        string_arg(substitution, "replace() substitution")?,
    ) else {
        return Ok(Collection::empty());
    };
    Ok(Collection::singleton(Value::string(
        s.replace(pattern.as_ref(), substitution.as_ref()),
    )))
}

pub fn matches(input: Collection, pattern: &Collection) -> Result<Collection> {
    let (Some(s), Some(pattern)) = (
        receiver(&input, "matches()")?,
        string_arg(pattern, "matches() pattern")?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile(&pattern, false, "matches()")?;
    Ok(Collection::singleton(Value::Boolean(regex.is_match(&s))))
}

pub fn matches_full(input: Collection, pattern: &Collection) -> Result<Collection> {
    let (Some(s), Some(pattern)) = (
        receiver(&input, "matchesFull()")?,
        string_arg(pattern, "matchesFull() pattern")?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile(&pattern, true, "matchesFull()")?;
    Ok(Collection::singleton(Value::Boolean(regex.is_match(&s))))
}

pub fn replace_matches(
    input: Collection,
    pattern: &Collection,
    substitution: &Collection,
) -> Result<Collection> {
    let (Some(s), Some(pattern), Some(substitution)) = (
        receiver(&input, "replaceMatches()")?,
        string_arg(pattern, "replaceMatches() pattern")?,
        string_arg(substitution, "replaceMatches() substitution")?,
    ) else {
        return Ok(Collection::empty());
    };
    let regex = compile(&pattern, false, "replaceMatches()")?;
    Ok(Collection::singleton(Value::string(
        regex.replace_all(&s, substitution.as_ref()).into_owned(),
    )))
}

pub fn length(input: Collection) -> Result<Collection> {
    Ok(match receiver(&input, "length()")? {
        Some(s) => Collection::singleton(Value::Integer(s.chars().count() as i32)),
        None => Collection::empty(),
    })
}

pub fn to_chars(input: Collection) -> Result<Collection> {
    Ok(match receiver(&input, "toChars()")? {
        Some(s) => s
            .chars()
            .map(|c| Value::string(c.to_string()))
            .collect(),
        None => Collection::empty(),
    })
}

pub fn trim(input: Collection) -> Result<Collection> {
    Ok(match receiver(&input, "trim()")? {
        Some(s) => Collection::singleton(Value::string(s.trim())),
        None => Collection::empty(),
    })
}

pub fn split(input: Collection, separator: &Collection) -> Result<Collection> {
    let (Some(s), Some(separator)) = (
        receiver(&input, "split()")?,
        string_arg(separator, "split() separator")?,
    ) else {
        return Ok(Collection::empty());
    };
    if separator.is_empty() {
        return Ok(s.chars().map(|c| Value::string(c.to_string())).collect());
    }
    Ok(s.split(separator.as_ref())
        .map(Value::string)
        .collect())
}

/// Collection-in: joins all string items with the separator.
pub fn join(input: Collection, separator: Option<&Collection>) -> Result<Collection> {
    let separator = match separator {
        Some(arg) if !arg.is_empty() => arg.as_string("join() separator")?,
        _ => Arc::from(""),
    };
    let mut parts = Vec::with_capacity(input.len());
    for item in input.iter() {
        match item.coerced() {
            Some(Value::String(s)) => parts.push(s.to_string()),
            other => {
                return Err(Error::Type(format!(
                    "join() requires a collection of strings, found {other:?}"
                )));
            }
        }
    }
    Ok(Collection::singleton(Value::string(
        parts.join(separator.as_ref()),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Collection {
        Collection::singleton(Value::string(text))
    }

    #[test]
    fn substring_spans_and_bounds() {
        assert_eq!(
            substring(s("hello"), &Collection::singleton(Value::Integer(1)), Some(&Collection::singleton(Value::Integer(3)))).unwrap(),
            s("ell")
        );
        assert_eq!(
            substring(s("hello"), &Collection::singleton(Value::Integer(2)), None).unwrap(),
            s("llo")
        );
        // Out-of-range start yields empty.
        assert_eq!(
            substring(s("hi"), &Collection::singleton(Value::Integer(5)), None).unwrap(),
            Collection::empty()
        );
        assert_eq!(
            substring(s("hi"), &Collection::singleton(Value::Integer(-1)), None).unwrap(),
            Collection::empty()
        );
    }

    #[test]
    fn character_based_indexing() {
        // Multi-byte characters count as one position.
        assert_eq!(
            index_of(s("caféx"), &s("x")).unwrap(),
            Collection::singleton(Value::Integer(4))
        );
        assert_eq!(
            length(s("café")).unwrap(),
            Collection::singleton(Value::Integer(4))
        );
    }

    #[test]
    fn index_of_missing_is_minus_one() {
        assert_eq!(
            index_of(s("abc"), &s("z")).unwrap(),
            Collection::singleton(Value::Integer(-1))
        );
    }

    #[test]
    fn case_and_trim() {
        assert_eq!(upper(s("ab")).unwrap(), s("AB"));
        assert_eq!(lower(s("AB")).unwrap(), s("ab"));
        assert_eq!(trim(s("  x  ")).unwrap(), s("x"));
    }

    #[test]
    fn replace_literal() {
        assert_eq!(replace(s("abcab"), &s("ab"), &s("x")).unwrap(), s("xcx"));
        // An empty pattern surrounds every character.
        assert_eq!(replace(s("ab"), &s(""), &s("-")).unwrap(), s("-a-b-"));
    }

    #[test]
    fn regex_dot_matches_newline() {
        assert_eq!(
            matches(s("a\nb"), &s("a.b")).unwrap(),
            Collection::singleton(Value::Boolean(true))
        );
    }

    #[test]
    fn matches_full_anchors() {
        assert_eq!(
            matches_full(s("hello"), &s("hel")).unwrap(),
            Collection::singleton(Value::Boolean(false))
        );
        assert_eq!(
            matches_full(s("hello"), &s("hel+o")).unwrap(),
            Collection::singleton(Value::Boolean(true))
        );
    }

    #[test]
    fn replace_matches_uses_regex() {
        assert_eq!(
            replace_matches(s("a1b22c"), &s(r"\d+"), &s("#")).unwrap(),
            s("a#b#c")
        );
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(matches(s("x"), &s("(")).is_err());
    }

    #[test]
    fn split_and_join() {
        let parts = split(s("a,b,,c"), &s(",")).unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(
            join(parts, Some(&s(","))).unwrap(),
            s("a,b,,c")
        );
        assert_eq!(
            join(Collection::from_vec(vec![Value::string("a"), Value::string("b")]), None).unwrap(),
            s("ab")
        );
    }

    #[test]
    fn to_chars_splits_characters() {
        let chars = to_chars(s("abc")).unwrap();
        assert_eq!(chars.len(), 3);
        assert_eq!(chars.first(), Some(&Value::string("a")));
    }

    #[test]
    fn non_string_receiver_is_a_type_error() {
        assert!(upper(Collection::singleton(Value::Integer(1))).is_err());
    }

    #[test]
    fn empty_receiver_propagates() {
        assert_eq!(upper(Collection::empty()).unwrap(), Collection::empty());
        assert_eq!(
            index_of(Collection::empty(), &s("a")).unwrap(),
            Collection::empty()
        );
    }
}

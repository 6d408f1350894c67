//! Parser for UCUM unit strings.
//!
//! Components are separated by `.` (multiply) or `/` (divide); once a `/`
//! has been seen every subsequent component lands in the denominator. Each
//! component is a symbol with an optional signed integer exponent. `1` is
//! the dimensionless unit and contributes nothing.

use crate::error::{Error, Result};
use crate::unit::Unit;

pub fn parse(input: &str) -> Result<Unit> {
    if !input.is_ascii() {
        return Err(Error::Syntax {
            pos: 0,
            message: "unit must be ASCII",
        });
    }
    if input.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(Error::Syntax {
            pos: 0,
            message: "unit must not contain whitespace",
        });
    }
    if input.is_empty() {
        return Err(Error::Syntax {
            pos: 0,
            message: "empty unit expression",
        });
    }

    let bytes = input.as_bytes();
    let mut components = Vec::new();
    let mut pos = 0;
    let mut in_denominator = false;

    // A leading `/` reads as `1/...`.
    if bytes[0] == b'/' {
        in_denominator = true;
        pos = 1;
    }

    loop {
        let (symbol, exponent, next) = read_component(bytes, pos)?;
        let signed = if in_denominator { -exponent } else { exponent };
        if symbol != "1" {
            components.push((symbol, signed));
        }
        pos = next;

        if pos >= bytes.len() {
            break;
        }
        match bytes[pos] {
            b'.' => pos += 1,
            b'/' => {
                in_denominator = true;
                pos += 1;
            }
            _ => {
                return Err(Error::Syntax {
                    pos,
                    message: "expected '.' or '/' between components",
                });
            }
        }
        if pos >= bytes.len() {
            return Err(Error::Syntax {
                pos,
                message: "trailing separator",
            });
        }
    }

    Unit::from_components(components)
}

fn read_component(bytes: &[u8], start: usize) -> Result<(String, i32, usize)> {
    let mut pos = start;

    // The dimensionless literal.
    if bytes.get(pos) == Some(&b'1')
        && !matches!(bytes.get(pos + 1), Some(b) if b.is_ascii_digit())
    {
        return Ok(("1".to_string(), 1, pos + 1));
    }

    while pos < bytes.len() {
        match bytes[pos] {
            b if b.is_ascii_alphabetic() => pos += 1,
            b'%' | b'*' | b'\'' => pos += 1,
            b'[' => {
                // Bracketed symbols ([in_i], m[Hg]) may contain digits and
                // underscores; consume through the closing bracket.
                pos += 1;
                while pos < bytes.len() && bytes[pos] != b']' {
                    pos += 1;
                }
                if pos >= bytes.len() {
                    return Err(Error::Syntax {
                        pos: start,
                        message: "unterminated '[' in unit symbol",
                    });
                }
                pos += 1;
            }
            _ => break,
        }
    }

    if pos == start {
        return Err(Error::Syntax {
            pos: start,
            message: "expected unit symbol",
        });
    }
    let symbol = String::from_utf8_lossy(&bytes[start..pos]).into_owned();

    // Optional signed exponent.
    let exp_start = pos;
    if matches!(bytes.get(pos), Some(b'+') | Some(b'-')) {
        pos += 1;
    }
    let digits_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let exponent = if pos > digits_start {
        let text = std::str::from_utf8(&bytes[exp_start..pos]).map_err(|_| Error::Syntax {
            pos: exp_start,
            message: "invalid exponent",
        })?;
        text.parse::<i32>().map_err(|_| Error::Syntax {
            pos: exp_start,
            message: "exponent out of range",
        })?
    } else if pos > exp_start {
        // A bare sign with no digits.
        return Err(Error::Syntax {
            pos: exp_start,
            message: "expected digits after exponent sign",
        });
    } else {
        1
    };

    Ok((symbol, exponent, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exps(input: &str) -> Vec<(String, i32)> {
        parse(input)
            .unwrap()
            .iter()
            .map(|(s, e)| (s.to_string(), e))
            .collect()
    }

    #[test]
    fn single_symbol() {
        assert_eq!(exps("kg"), vec![("kg".to_string(), 1)]);
    }

    #[test]
    fn multiply_and_divide() {
        assert_eq!(
            exps("kg.m/s2"),
            vec![
                ("kg".to_string(), 1),
                ("m".to_string(), 1),
                ("s".to_string(), -2)
            ]
        );
    }

    #[test]
    fn denominator_is_sticky() {
        // Everything after the first '/' divides.
        assert_eq!(
            exps("m/s.a"),
            vec![("a".to_string(), -1), ("m".to_string(), 1), ("s".to_string(), -1)]
        );
    }

    #[test]
    fn leading_slash() {
        assert_eq!(exps("/min"), vec![("min".to_string(), -1)]);
    }

    #[test]
    fn explicit_exponents() {
        assert_eq!(exps("m2"), vec![("m".to_string(), 2)]);
        assert_eq!(exps("s-1"), vec![("s".to_string(), -1)]);
        assert_eq!(exps("m+3"), vec![("m".to_string(), 3)]);
    }

    #[test]
    fn dimensionless_one() {
        assert!(parse("1").unwrap().is_dimensionless());
        assert_eq!(exps("m.1"), vec![("m".to_string(), 1)]);
    }

    #[test]
    fn bracketed_symbols() {
        assert_eq!(exps("[in_i]"), vec![("[in_i]".to_string(), 1)]);
        assert_eq!(exps("mm[Hg]"), vec![("mm[Hg]".to_string(), 1)]);
    }

    #[test]
    fn duplicate_symbol_is_fatal() {
        assert!(matches!(parse("kg.kg"), Err(Error::DuplicateUnit(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("m..s").is_err());
        assert!(parse("m/").is_err());
        assert!(parse("m s").is_err());
        assert!(parse("µm").is_err());
    }
}

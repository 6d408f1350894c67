//! FHIRPath lexer.
//!
//! Turns an expression string into tokens, covering the lexical rules of
//! the FHIRPath grammar: quoted strings and delimited identifiers with
//! escapes, number and long-number literals, `@`-prefixed temporal
//! literals, `%` external constants, `$`-variables, and both comment
//! forms. Lexical errors are reported with their byte offset.

use crate::error::{Error, Result};
use crate::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.current();
        self.pos += 1;
        c
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            while matches!(self.current(), Some(c) if c.is_whitespace()) {
                self.pos += 1;
            }
            match (self.current(), self.peek()) {
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.current(), self.peek()) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (None, _) => {
                                return Err(Error::Parse(format!(
                                    "unterminated block comment at position {start}"
                                )));
                            }
                            _ => self.pos += 1,
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let pos = self.pos;

        let Some(c) = self.current() else {
            return Ok(Token::eof(pos));
        };

        let simple = |kind, text: &str| Ok(Token::new(kind, text, pos));

        match c {
            '.' => {
                self.pos += 1;
                simple(TokenKind::Dot, ".")
            }
            '[' => {
                self.pos += 1;
                simple(TokenKind::OpenBracket, "[")
            }
            ']' => {
                self.pos += 1;
                simple(TokenKind::CloseBracket, "]")
            }
            '(' => {
                self.pos += 1;
                simple(TokenKind::OpenParen, "(")
            }
            ')' => {
                self.pos += 1;
                simple(TokenKind::CloseParen, ")")
            }
            '{' => {
                self.pos += 1;
                simple(TokenKind::OpenBrace, "{")
            }
            '}' => {
                self.pos += 1;
                simple(TokenKind::CloseBrace, "}")
            }
            ',' => {
                self.pos += 1;
                simple(TokenKind::Comma, ",")
            }
            '+' => {
                self.pos += 1;
                simple(TokenKind::Plus, "+")
            }
            '-' => {
                self.pos += 1;
                simple(TokenKind::Minus, "-")
            }
            '*' => {
                self.pos += 1;
                simple(TokenKind::Star, "*")
            }
            '/' => {
                self.pos += 1;
                simple(TokenKind::Slash, "/")
            }
            '&' => {
                self.pos += 1;
                simple(TokenKind::Ampersand, "&")
            }
            '|' => {
                self.pos += 1;
                simple(TokenKind::Pipe, "|")
            }
            '=' => {
                self.pos += 1;
                simple(TokenKind::Equal, "=")
            }
            '~' => {
                self.pos += 1;
                simple(TokenKind::Equivalent, "~")
            }
            '<' => {
                self.pos += 1;
                if self.current() == Some('=') {
                    self.pos += 1;
                    simple(TokenKind::Lte, "<=")
                } else {
                    simple(TokenKind::Lt, "<")
                }
            }
            '>' => {
                self.pos += 1;
                if self.current() == Some('=') {
                    self.pos += 1;
                    simple(TokenKind::Gte, ">=")
                } else {
                    simple(TokenKind::Gt, ">")
                }
            }
            '!' => {
                self.pos += 1;
                match self.current() {
                    Some('=') => {
                        self.pos += 1;
                        simple(TokenKind::NotEqual, "!=")
                    }
                    Some('~') => {
                        self.pos += 1;
                        simple(TokenKind::NotEquivalent, "!~")
                    }
                    _ => Err(Error::Parse(format!(
                        "unexpected '!' at position {pos}"
                    ))),
                }
            }
            '\'' => {
                let value = self.read_quoted('\'')?;
                Ok(Token::new(TokenKind::Str, value, pos))
            }
            '`' => {
                let value = self.read_quoted('`')?;
                Ok(Token::new(TokenKind::DelimitedIdentifier, value, pos))
            }
            '%' => {
                self.pos += 1;
                let name = match self.current() {
                    Some('\'') => self.read_quoted('\'')?,
                    Some('`') => self.read_quoted('`')?,
                    _ => self.read_identifier(),
                };
                if name.is_empty() {
                    return Err(Error::Parse(format!(
                        "expected name after '%' at position {pos}"
                    )));
                }
                Ok(Token::new(TokenKind::ExternalConstant, name, pos))
            }
            '$' => {
                self.pos += 1;
                let name = self.read_identifier();
                let kind = match name.as_str() {
                    "this" => TokenKind::This,
                    "index" => TokenKind::Index,
                    "total" => TokenKind::Total,
                    _ => {
                        return Err(Error::Parse(format!(
                            "unknown special variable '${name}' at position {pos}"
                        )));
                    }
                };
                Ok(Token::new(kind, format!("${name}"), pos))
            }
            '@' => self.read_temporal(pos),
            c if c.is_ascii_digit() => {
                let (text, long) = self.read_number();
                let kind = if long {
                    TokenKind::LongNumber
                } else {
                    TokenKind::Number
                };
                Ok(Token::new(kind, text, pos))
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                let kind = match ident.as_str() {
                    "true" | "false" => TokenKind::Bool,
                    "as" => TokenKind::As,
                    "is" => TokenKind::Is,
                    "div" => TokenKind::Div,
                    "mod" => TokenKind::Mod,
                    "in" => TokenKind::In,
                    "contains" => TokenKind::Contains,
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "xor" => TokenKind::Xor,
                    "implies" => TokenKind::Implies,
                    _ => TokenKind::Identifier,
                };
                Ok(Token::new(kind, ident, pos))
            }
            other => Err(Error::Parse(format!(
                "unexpected character '{other}' at position {pos}"
            ))),
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.pos;
        while matches!(self.current(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Read a `'...'` string or `` `...` `` delimited identifier, handling
    /// the shared ESC escape rules of the grammar.
    fn read_quoted(&mut self, delimiter: char) -> Result<String> {
        let start = self.pos;
        self.pos += 1; // opening delimiter
        let mut value = String::new();

        loop {
            match self.bump() {
                None => {
                    return Err(Error::Parse(format!(
                        "unterminated quoted text starting at position {start}"
                    )));
                }
                Some(c) if c == delimiter => return Ok(value),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| {
                        Error::Parse(format!(
                            "incomplete escape sequence at position {}",
                            self.pos
                        ))
                    })?;
                    match escaped {
                        '\'' => value.push('\''),
                        '"' => value.push('"'),
                        '`' => value.push('`'),
                        '\\' => value.push('\\'),
                        '/' => value.push('/'),
                        'f' => value.push('\x0C'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'u' => {
                            let mut hex = String::new();
                            for _ in 0..4 {
                                match self.bump() {
                                    Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                                    _ => {
                                        return Err(Error::Parse(format!(
                                            "invalid unicode escape at position {}",
                                            self.pos
                                        )));
                                    }
                                }
                            }
                            let code = u32::from_str_radix(&hex, 16).map_err(|_| {
                                Error::Parse("invalid unicode code point".into())
                            })?;
                            value.push(char::from_u32(code).ok_or_else(|| {
                                Error::Parse("invalid unicode character".into())
                            })?);
                        }
                        other => value.push(other),
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn read_number(&mut self) -> (String, bool) {
        let start = self.pos;
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut has_fraction = false;
        // Only take the dot when digits follow; `1.empty()` keeps its dot.
        if self.current() == Some('.') && matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            has_fraction = true;
            self.pos += 1;
            while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let mut long = false;
        if !has_fraction && self.current() == Some('L') {
            long = true;
            self.pos += 1;
        }
        (self.chars[start..self.pos].iter().collect(), long)
    }

    /// Read a `@`-prefixed date, datetime, or time literal.
    fn read_temporal(&mut self, pos: usize) -> Result<Token> {
        self.pos += 1; // '@'

        if self.current() == Some('T') {
            self.pos += 1;
            let time = self.read_time_digits(pos)?;
            return Ok(Token::new(TokenKind::Time, time, pos));
        }

        let date = self.read_date_digits(pos)?;

        if self.current() != Some('T') {
            return Ok(Token::new(TokenKind::Date, date, pos));
        }
        self.pos += 1;

        // `@2015T` is a valid partial datetime.
        if !matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            return Ok(Token::new(TokenKind::DateTime, format!("{date}T"), pos));
        }

        let time = self.read_time_digits(pos)?;
        let tz = match self.current() {
            Some('Z') => {
                self.pos += 1;
                "Z".to_string()
            }
            Some(sign @ ('+' | '-')) => {
                self.pos += 1;
                let hh = self.read_fixed_digits(2, pos, "timezone hour")?;
                if self.current() != Some(':') {
                    return Err(Error::Parse(format!(
                        "invalid timezone in literal at position {pos}: expected ':'"
                    )));
                }
                self.pos += 1;
                let mm = self.read_fixed_digits(2, pos, "timezone minute")?;
                format!("{sign}{hh}:{mm}")
            }
            _ => String::new(),
        };

        Ok(Token::new(
            TokenKind::DateTime,
            format!("{date}T{time}{tz}"),
            pos,
        ))
    }

    fn read_fixed_digits(&mut self, count: usize, pos: usize, what: &str) -> Result<String> {
        let mut out = String::new();
        for _ in 0..count {
            match self.current() {
                Some(c) if c.is_ascii_digit() => {
                    out.push(c);
                    self.pos += 1;
                }
                _ => {
                    return Err(Error::Parse(format!(
                        "invalid {what} in literal at position {pos}"
                    )));
                }
            }
        }
        Ok(out)
    }

    /// `YYYY(-MM(-DD)?)?`
    fn read_date_digits(&mut self, pos: usize) -> Result<String> {
        let mut value = self.read_fixed_digits(4, pos, "year")?;
        if self.current() == Some('-') {
            self.pos += 1;
            value.push('-');
            value.push_str(&self.read_fixed_digits(2, pos, "month")?);
            if self.current() == Some('-') {
                self.pos += 1;
                value.push('-');
                value.push_str(&self.read_fixed_digits(2, pos, "day")?);
            }
        }
        Ok(value)
    }

    /// `HH(:MM(:SS(.fff)?)?)?`
    fn read_time_digits(&mut self, pos: usize) -> Result<String> {
        let mut value = self.read_fixed_digits(2, pos, "hour")?;
        if self.current() == Some(':') {
            self.pos += 1;
            value.push(':');
            value.push_str(&self.read_fixed_digits(2, pos, "minute")?);
            if self.current() == Some(':') {
                self.pos += 1;
                value.push(':');
                value.push_str(&self.read_fixed_digits(2, pos, "second")?);
                // The dot only belongs to the literal when digits follow
                // (`@T14:34:28.acos()` keeps its dot for the parser).
                if self.current() == Some('.')
                    && matches!(self.peek(), Some(c) if c.is_ascii_digit())
                {
                    self.pos += 1;
                    value.push('.');
                    while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
                        value.push(self.current().unwrap());
                        self.pos += 1;
                    }
                }
            }
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn identifiers_and_keywords() {
        let tokens = tokenize("Patient and _x implies div");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "Patient");
        assert_eq!(tokens[1].kind, TokenKind::And);
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Implies);
        assert_eq!(tokens[4].kind, TokenKind::Div);
    }

    #[test]
    fn string_escapes() {
        let tokens = tokenize(r"'it\'s' 'tab\tend' 'A'");
        assert_eq!(tokens[0].text, "it's");
        assert_eq!(tokens[1].text, "tab\tend");
        assert_eq!(tokens[2].text, "A");
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("123 45.67 99L");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].text, "45.67");
        assert_eq!(tokens[2].kind, TokenKind::LongNumber);
        assert_eq!(tokens[2].text, "99L");
    }

    #[test]
    fn number_followed_by_invocation_keeps_dot() {
        let tokens = tokenize("1.empty()");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].text, "1");
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[2].text, "empty");
    }

    #[test]
    fn temporal_literals() {
        let tokens = tokenize("@2024-01-15 @2024-01 @2024 @T14:30 @2024-01-15T10:00:00Z");
        assert_eq!(tokens[0].kind, TokenKind::Date);
        assert_eq!(tokens[0].text, "2024-01-15");
        assert_eq!(tokens[1].text, "2024-01");
        assert_eq!(tokens[2].text, "2024");
        assert_eq!(tokens[3].kind, TokenKind::Time);
        assert_eq!(tokens[3].text, "14:30");
        assert_eq!(tokens[4].kind, TokenKind::DateTime);
        assert_eq!(tokens[4].text, "2024-01-15T10:00:00Z");
    }

    #[test]
    fn partial_datetime_literal() {
        let tokens = tokenize("@2015T");
        assert_eq!(tokens[0].kind, TokenKind::DateTime);
        assert_eq!(tokens[0].text, "2015T");
    }

    #[test]
    fn datetime_with_offset() {
        let tokens = tokenize("@2024-03-01T08:15:00+05:30");
        assert_eq!(tokens[0].text, "2024-03-01T08:15:00+05:30");
    }

    #[test]
    fn external_constants() {
        let tokens = tokenize("%sct %'vs-administrative-gender'");
        assert_eq!(tokens[0].kind, TokenKind::ExternalConstant);
        assert_eq!(tokens[0].text, "sct");
        assert_eq!(tokens[1].kind, TokenKind::ExternalConstant);
        assert_eq!(tokens[1].text, "vs-administrative-gender");
    }

    #[test]
    fn special_variables() {
        let tokens = tokenize("$this $index $total");
        assert_eq!(tokens[0].kind, TokenKind::This);
        assert_eq!(tokens[1].kind, TokenKind::Index);
        assert_eq!(tokens[2].kind, TokenKind::Total);
        assert!(Lexer::new("$foo").next_token().is_err());
    }

    #[test]
    fn comments_are_trivia() {
        let tokens = tokenize("name // trailing\n.given /* block */ .first()");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["name", ".", "given", ".", "first", "(", ")", ""]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(Lexer::new("'open").next_token().is_err());
        assert!(Lexer::new("/* open").next_token().is_err());
    }

    #[test]
    fn operators() {
        let tokens = tokenize("<= < >= > = ~ != !~ & |");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Lte,
                TokenKind::Lt,
                TokenKind::Gte,
                TokenKind::Gt,
                TokenKind::Equal,
                TokenKind::Equivalent,
                TokenKind::NotEqual,
                TokenKind::NotEquivalent,
                TokenKind::Ampersand,
                TokenKind::Pipe,
                TokenKind::Eof,
            ]
        );
    }
}

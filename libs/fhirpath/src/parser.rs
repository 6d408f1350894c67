//! Recursive-descent parser for FHIRPath.
//!
//! Precedence, lowest to highest:
//! implies → or/xor → and → membership → type (is/as) → equality →
//! inequality → union → additive → multiplicative → polarity →
//! indexer/invocation → term.
//!
//! The parser never accepts a prefix: after the top-level expression the
//! next token must be EOF, otherwise the input "contains extraneous
//! input" and parsing fails.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::temporal::{Date, DateTime, Time};
use crate::token::{Token, TokenKind};

pub struct Parser {
    lexer: Lexer,
    current: Token,
    depth: usize,
}

const MAX_DEPTH: usize = 200;

/// Parse a complete expression.
pub fn parse(input: &str) -> Result<Expr> {
    Parser::new(input)?.parse_all()
}

impl Parser {
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(Error::Parse(format!(
                "expected {:?}, got '{}' at position {}",
                kind, self.current.text, self.current.pos
            )))
        }
    }

    pub fn parse_all(&mut self) -> Result<Expr> {
        let expr = self.parse_expression()?;
        if !self.at(TokenKind::Eof) {
            return Err(Error::Parse(format!(
                "expression contains extraneous input '{}' at position {}",
                self.current.text, self.current.pos
            )));
        }
        Ok(expr)
    }

    fn parse_expression(&mut self) -> Result<Expr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::Parse(format!(
                "expression too deeply nested (max depth {MAX_DEPTH})"
            )));
        }
        let expr = self.parse_implies();
        self.depth -= 1;
        expr
    }

    fn parse_implies(&mut self) -> Result<Expr> {
        let mut left = self.parse_or()?;
        while self.at(TokenKind::Implies) {
            self.advance()?;
            let right = self.parse_or()?;
            left = Expr::Implies {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.at_any(&[TokenKind::Or, TokenKind::Xor]) {
            let exclusive = self.at(TokenKind::Xor);
            self.advance()?;
            let right = self.parse_and()?;
            left = Expr::Or {
                exclusive,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_membership()?;
        while self.at(TokenKind::And) {
            self.advance()?;
            let right = self.parse_membership()?;
            left = Expr::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_membership(&mut self) -> Result<Expr> {
        let mut left = self.parse_type()?;
        while self.at_any(&[TokenKind::In, TokenKind::Contains]) {
            let op = if self.at(TokenKind::In) {
                MembershipOp::In
            } else {
                MembershipOp::Contains
            };
            self.advance()?;
            let right = self.parse_type()?;
            left = Expr::Membership {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `is`/`as` bind after equality so that `(1 | 1) is Integer` and
    /// `a = b is Boolean` group the way the published test suites expect.
    fn parse_type(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.at_any(&[TokenKind::Is, TokenKind::As]) {
            let op = if self.at(TokenKind::Is) {
                TypeOpKind::Is
            } else {
                TypeOpKind::As
            };
            self.advance()?;
            let specifier = self.parse_qualified_name()?;
            left = Expr::TypeOp {
                op,
                operand: Box::new(left),
                specifier,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_inequality()?;
        while self.at_any(&[
            TokenKind::Equal,
            TokenKind::Equivalent,
            TokenKind::NotEqual,
            TokenKind::NotEquivalent,
        ]) {
            let op = match self.current.kind {
                TokenKind::Equal => EqOp::Equal,
                TokenKind::Equivalent => EqOp::Equivalent,
                TokenKind::NotEqual => EqOp::NotEqual,
                _ => EqOp::NotEquivalent,
            };
            self.advance()?;
            let right = self.parse_inequality()?;
            left = Expr::Equality {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_inequality(&mut self) -> Result<Expr> {
        let mut left = self.parse_union()?;
        while self.at_any(&[
            TokenKind::Lt,
            TokenKind::Lte,
            TokenKind::Gt,
            TokenKind::Gte,
        ]) {
            let op = match self.current.kind {
                TokenKind::Lt => CmpOp::Lt,
                TokenKind::Lte => CmpOp::Lte,
                TokenKind::Gt => CmpOp::Gt,
                _ => CmpOp::Gte,
            };
            self.advance()?;
            let right = self.parse_union()?;
            left = Expr::Inequality {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_union(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        while self.at(TokenKind::Pipe) {
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expr::Union {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        while self.at_any(&[TokenKind::Plus, TokenKind::Minus, TokenKind::Ampersand]) {
            let op = match self.current.kind {
                TokenKind::Plus => AddOp::Plus,
                TokenKind::Minus => AddOp::Minus,
                _ => AddOp::Concat,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::Additive {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_polarity()?;
        while self.at_any(&[
            TokenKind::Star,
            TokenKind::Slash,
            TokenKind::Div,
            TokenKind::Mod,
        ]) {
            let op = match self.current.kind {
                TokenKind::Star => MulOp::Multiply,
                TokenKind::Slash => MulOp::Divide,
                TokenKind::Div => MulOp::Div,
                _ => MulOp::Mod,
            };
            self.advance()?;
            let right = self.parse_polarity()?;
            left = Expr::Multiplicative {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_polarity(&mut self) -> Result<Expr> {
        if !self.at_any(&[TokenKind::Plus, TokenKind::Minus]) {
            return self.parse_postfix();
        }
        let negate = self.at(TokenKind::Minus);
        self.advance()?;

        // A minus directly before a number folds into the literal so that
        // `-5 'mg'` and `-120.low()` parse as negative literals.
        if negate && self.at_any(&[TokenKind::Number, TokenKind::LongNumber]) {
            let token = self.advance()?;
            let literal = self.number_literal(&token, true)?;
            let term = self.parse_postfix_from(literal)?;
            return Ok(term);
        }

        let operand = self.parse_polarity()?;
        Ok(Expr::Polarity {
            negate,
            operand: Box::new(operand),
        })
    }

    /// Indexers and dotted invocations, tightest-binding tier.
    fn parse_postfix(&mut self) -> Result<Expr> {
        let term = self.parse_term()?;
        self.parse_postfix_from(term)
    }

    fn parse_postfix_from(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.at(TokenKind::OpenBracket) {
                self.advance()?;
                let index = self.parse_expression()?;
                self.expect(TokenKind::CloseBracket)?;
                expr = Expr::Indexer {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
                continue;
            }
            if self.at(TokenKind::Dot) {
                self.advance()?;
                expr = self.parse_invocation(Some(expr))?;
                continue;
            }
            break;
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        match self.current.kind {
            TokenKind::OpenParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::CloseParen)?;
                Ok(Expr::Parenthesized(Box::new(inner)))
            }
            TokenKind::ExternalConstant => {
                let token = self.advance()?;
                Ok(Expr::ExternalConstant(token.text))
            }
            TokenKind::OpenBrace => {
                self.advance()?;
                self.expect(TokenKind::CloseBrace)?;
                Ok(Expr::Empty)
            }
            TokenKind::Bool => {
                let token = self.advance()?;
                Ok(Expr::Boolean(token.text == "true"))
            }
            TokenKind::Str => {
                let token = self.advance()?;
                Ok(Expr::Str(token.text))
            }
            TokenKind::Number | TokenKind::LongNumber => {
                let token = self.advance()?;
                self.number_literal(&token, false)
            }
            TokenKind::Date => {
                let token = self.advance()?;
                let date = Date::parse(&token.text).ok_or_else(|| {
                    Error::Parse(format!("invalid date literal '@{}'", token.text))
                })?;
                Ok(Expr::Date(date))
            }
            TokenKind::DateTime => {
                let token = self.advance()?;
                let text = token.text.strip_suffix('T').unwrap_or(&token.text);
                let datetime = DateTime::parse(text).ok_or_else(|| {
                    Error::Parse(format!("invalid datetime literal '@{}'", token.text))
                })?;
                Ok(Expr::DateTime(datetime))
            }
            TokenKind::Time => {
                let token = self.advance()?;
                let time = Time::parse(&token.text).ok_or_else(|| {
                    Error::Parse(format!("invalid time literal '@T{}'", token.text))
                })?;
                Ok(Expr::Time(time))
            }
            _ => self.parse_invocation(None),
        }
    }

    /// Member access, function call, or `$`-variable after a dot (or as
    /// the leading term). Operator keywords double as ordinary names here
    /// so `contains()`/`is()`/`as()` remain callable.
    fn parse_invocation(&mut self, base: Option<Expr>) -> Result<Expr> {
        match self.current.kind {
            TokenKind::This => {
                self.advance()?;
                self.wrap_variable(base, Expr::This)
            }
            TokenKind::Index => {
                self.advance()?;
                self.wrap_variable(base, Expr::IndexVar)
            }
            TokenKind::Total => {
                self.advance()?;
                self.wrap_variable(base, Expr::TotalVar)
            }
            TokenKind::Identifier
            | TokenKind::DelimitedIdentifier
            | TokenKind::Contains
            | TokenKind::In
            | TokenKind::As
            | TokenKind::Is
            | TokenKind::Div
            | TokenKind::Mod => {
                let token = self.advance()?;
                let name = token.text;
                if self.at(TokenKind::OpenParen) {
                    self.advance()?;
                    let mut args = Vec::new();
                    if !self.at(TokenKind::CloseParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if self.at(TokenKind::Comma) {
                                self.advance()?;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::CloseParen)?;
                    Ok(Expr::Function {
                        base: base.map(Box::new),
                        name,
                        args,
                    })
                } else {
                    match base {
                        Some(base) => Ok(Expr::Member {
                            base: Box::new(base),
                            name,
                        }),
                        None => Ok(Expr::Identifier(name)),
                    }
                }
            }
            _ => Err(Error::Parse(format!(
                "expected identifier or function, got '{}' at position {}",
                self.current.text, self.current.pos
            ))),
        }
    }

    fn wrap_variable(&self, base: Option<Expr>, var: Expr) -> Result<Expr> {
        match base {
            // `a.$this` is not grammatical.
            Some(_) => Err(Error::Parse(
                "special variables cannot follow '.'".to_string(),
            )),
            None => Ok(var),
        }
    }

    /// A number token plus an optional trailing unit makes a quantity.
    fn number_literal(&mut self, token: &Token, negate: bool) -> Result<Expr> {
        let unit = self.take_unit()?;
        let sign = if negate { "-" } else { "" };

        if token.kind == TokenKind::LongNumber {
            let digits = token.text.trim_end_matches('L');
            let text = format!("{sign}{digits}");
            if let Some(unit) = unit {
                let value = Decimal::from_str(&text)
                    .map_err(|e| Error::Parse(format!("invalid number '{text}': {e}")))?;
                return Ok(Expr::Quantity {
                    value,
                    unit: Some(unit),
                });
            }
            let value = i64::from_str(&text)
                .map_err(|e| Error::Parse(format!("invalid long literal '{text}': {e}")))?;
            return Ok(Expr::Long(value));
        }

        let text = format!("{sign}{}", token.text);
        if let Some(unit) = unit {
            let value = Decimal::from_str(&text)
                .map_err(|e| Error::Parse(format!("invalid number '{text}': {e}")))?;
            return Ok(Expr::Quantity {
                value,
                unit: Some(unit),
            });
        }
        if token.text.contains('.') {
            let value = Decimal::from_str(&text)
                .map_err(|e| Error::Parse(format!("invalid number '{text}': {e}")))?;
            Ok(Expr::Decimal(value))
        } else {
            let value = i32::from_str(&text)
                .map_err(|e| Error::Parse(format!("integer literal '{text}' out of range: {e}")))?;
            Ok(Expr::Integer(value))
        }
    }

    /// Consume a quantity unit if one follows: a quoted UCUM code or a
    /// calendar-duration keyword.
    fn take_unit(&mut self) -> Result<Option<String>> {
        if self.at(TokenKind::Str) {
            let token = self.advance()?;
            return Ok(Some(token.text));
        }
        if self.at(TokenKind::Identifier)
            && crate::temporal::TemporalUnit::from_calendar_word(&self.current.text).is_some()
        {
            let token = self.advance()?;
            return Ok(Some(token.text));
        }
        Ok(None)
    }

    fn parse_qualified_name(&mut self) -> Result<String> {
        let mut parts = Vec::new();
        if !self.at_any(&[TokenKind::Identifier, TokenKind::DelimitedIdentifier]) {
            return Err(Error::Parse(format!(
                "expected type name, got '{}' at position {}",
                self.current.text, self.current.pos
            )));
        }
        parts.push(self.advance()?.text);
        while self.at(TokenKind::Dot) {
            self.advance()?;
            if !self.at_any(&[TokenKind::Identifier, TokenKind::DelimitedIdentifier]) {
                return Err(Error::Parse(
                    "expected identifier after '.' in type name".to_string(),
                ));
            }
            parts.push(self.advance()?.text);
        }
        Ok(parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_identifier() {
        assert_eq!(parse("Patient").unwrap(), Expr::Identifier("Patient".into()));
    }

    #[test]
    fn dotted_navigation() {
        let ast = parse("Patient.name.given").unwrap();
        let Expr::Member { base, name } = ast else {
            panic!("expected member access");
        };
        assert_eq!(name, "given");
        assert!(matches!(*base, Expr::Member { .. }));
    }

    #[test]
    fn literals() {
        assert_eq!(parse("42").unwrap(), Expr::Integer(42));
        assert_eq!(parse("5L").unwrap(), Expr::Long(5));
        assert_eq!(
            parse("3.14").unwrap(),
            Expr::Decimal(Decimal::from_str("3.14").unwrap())
        );
        assert_eq!(parse("'hi'").unwrap(), Expr::Str("hi".into()));
        assert_eq!(parse("{}").unwrap(), Expr::Empty);
        assert_eq!(parse("true").unwrap(), Expr::Boolean(true));
    }

    #[test]
    fn quantity_literals() {
        assert_eq!(
            parse("5 'mg'").unwrap(),
            Expr::Quantity {
                value: Decimal::from(5),
                unit: Some("mg".into())
            }
        );
        assert_eq!(
            parse("3 days").unwrap(),
            Expr::Quantity {
                value: Decimal::from(3),
                unit: Some("days".into())
            }
        );
    }

    #[test]
    fn negative_literals() {
        assert_eq!(parse("-5").unwrap(), Expr::Integer(-5));
        assert_eq!(
            parse("-5.5 'mg'").unwrap(),
            Expr::Quantity {
                value: Decimal::from_str("-5.5").unwrap(),
                unit: Some("mg".into())
            }
        );
        // Negative literals still accept method calls.
        let ast = parse("-120.abs()").unwrap();
        assert!(matches!(ast, Expr::Function { .. }));
    }

    #[test]
    fn precedence_arithmetic_over_comparison() {
        let ast = parse("1 + 2 * 3 < 10").unwrap();
        let Expr::Inequality { op, left, .. } = ast else {
            panic!("expected comparison at the top");
        };
        assert_eq!(op, CmpOp::Lt);
        assert!(matches!(*left, Expr::Additive { .. }));
    }

    #[test]
    fn precedence_union_under_equality() {
        let ast = parse("1 | 2 = 3 | 4").unwrap();
        assert!(matches!(ast, Expr::Equality { .. }));
    }

    #[test]
    fn type_operator_binds_after_equality() {
        let ast = parse("(1 | 1) is Integer").unwrap();
        let Expr::TypeOp { op, specifier, .. } = ast else {
            panic!("expected type op");
        };
        assert_eq!(op, TypeOpKind::Is);
        assert_eq!(specifier, "Integer");
    }

    #[test]
    fn qualified_type_specifier() {
        let ast = parse("5 is System.Integer").unwrap();
        let Expr::TypeOp { specifier, .. } = ast else {
            panic!("expected type op");
        };
        assert_eq!(specifier, "System.Integer");
    }

    #[test]
    fn function_calls() {
        let ast = parse("name.where(use = 'official')").unwrap();
        let Expr::Function { base, name, args } = ast else {
            panic!("expected function");
        };
        assert!(base.is_some());
        assert_eq!(name, "where");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn keywords_as_function_names() {
        let ast = parse("name.contains('x')").unwrap();
        assert!(matches!(ast, Expr::Function { .. }));
        let ast = parse("value.as(Quantity)").unwrap();
        assert!(matches!(ast, Expr::Function { .. }));
    }

    #[test]
    fn indexers_chain_with_members() {
        let ast = parse("name[0].given[1]").unwrap();
        assert!(matches!(ast, Expr::Indexer { .. }));
    }

    #[test]
    fn special_variables() {
        assert_eq!(parse("$this").unwrap(), Expr::This);
        assert_eq!(parse("$index").unwrap(), Expr::IndexVar);
        assert_eq!(parse("$total").unwrap(), Expr::TotalVar);
        assert!(parse("a.$this").is_err());
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = parse("1 + 2 3").unwrap_err();
        let Error::Parse(message) = err else {
            panic!("expected parse error");
        };
        assert!(message.contains("extraneous input"), "{message}");

        assert!(parse("Patient.name)").is_err());
        assert!(parse("1 +").is_err());
    }

    #[test]
    fn temporal_literals() {
        assert!(matches!(parse("@2024-01-15").unwrap(), Expr::Date(_)));
        assert!(matches!(parse("@2015T").unwrap(), Expr::DateTime(_)));
        assert!(matches!(
            parse("@2024-01-15T10:30:00Z").unwrap(),
            Expr::DateTime(_)
        ));
        assert!(matches!(parse("@T14:30").unwrap(), Expr::Time(_)));
    }

    #[test]
    fn deep_nesting_is_capped() {
        let expr = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        assert!(parse(&expr).is_err());
    }

    #[test]
    fn boolean_operator_tree() {
        let ast = parse("a and b or c implies d").unwrap();
        assert!(matches!(ast, Expr::Implies { .. }));
    }
}

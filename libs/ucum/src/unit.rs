//! Unit multisets and the exponent algebra over them.
//!
//! A parsed unit is a map from UCUM symbol to signed exponent; the
//! dimensionless unit is the empty map. Multiplication adds exponents,
//! division subtracts them, and zero exponents are dropped so that
//! `m/s * s` collapses back to `m`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::table;

/// A unit expression as a multiset of `symbol -> exponent`.
///
/// Symbols are kept in their written form (`kg`, `mm[Hg]`, `%`), so
/// formatting round-trips what the user wrote. Canonicalization resolves
/// prefixes and definitions down to base units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unit {
    exponents: BTreeMap<String, i32>,
}

impl Unit {
    /// The dimensionless unit `1`.
    pub fn one() -> Self {
        Self::default()
    }

    pub(crate) fn from_components(components: Vec<(String, i32)>) -> Result<Self> {
        let mut exponents = BTreeMap::new();
        for (symbol, exp) in components {
            if exponents.contains_key(&symbol) {
                return Err(Error::DuplicateUnit(symbol));
            }
            if exp != 0 {
                exponents.insert(symbol, exp);
            }
        }
        Ok(Self { exponents })
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.exponents.iter().map(|(s, e)| (s.as_str(), *e))
    }

    /// Multiply two units by adding exponents.
    pub fn mul(&self, other: &Unit) -> Unit {
        let mut exponents = self.exponents.clone();
        for (symbol, exp) in &other.exponents {
            let entry = exponents.entry(symbol.clone()).or_insert(0);
            *entry += exp;
            if *entry == 0 {
                exponents.remove(symbol);
            }
        }
        Unit { exponents }
    }

    /// Divide two units by subtracting exponents.
    pub fn div(&self, other: &Unit) -> Unit {
        self.mul(&other.pow(-1))
    }

    /// Raise a unit to an integer power.
    pub fn pow(&self, n: i32) -> Unit {
        if n == 0 {
            return Unit::one();
        }
        let exponents = self
            .exponents
            .iter()
            .map(|(s, e)| (s.clone(), e * n))
            .collect();
        Unit { exponents }
    }

    /// Render the unit: symbols sorted lexicographically, joined with `.`,
    /// exponent 1 omitted, dimensionless rendered as `1`.
    pub fn format(&self) -> String {
        if self.exponents.is_empty() {
            return "1".to_string();
        }
        let mut out = String::new();
        for (symbol, exp) in &self.exponents {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(symbol);
            if *exp != 1 {
                out.push_str(&exp.to_string());
            }
        }
        out
    }
}

/// A unit reduced to UCUM base units plus the scale factor that converts a
/// value in the original unit to the base-unit magnitude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    pub unit: Unit,
    pub scalar: Decimal,
}

impl Canonical {
    fn dimensionless() -> Self {
        Self {
            unit: Unit::one(),
            scalar: Decimal::ONE,
        }
    }
}

/// Reduce a unit to base units, accumulating the scale factor.
///
/// Prefixes are stripped (each contributes a power of ten), defined units
/// are substituted recursively, and exponents collected until only base
/// units remain.
pub fn canonicalize(unit: &Unit) -> Result<Canonical> {
    let mut acc = Canonical::dimensionless();
    for (symbol, exp) in unit.iter() {
        let resolved = resolve_symbol(symbol)?;
        let scaled = pow_decimal(resolved.scalar, exp)?;
        acc.scalar = acc.scalar.checked_mul(scaled).ok_or(Error::Overflow)?;
        acc.unit = acc.unit.mul(&resolved.unit.pow(exp));
    }
    Ok(acc)
}

fn resolve_symbol(symbol: &str) -> Result<Canonical> {
    if symbol == "1" {
        return Ok(Canonical::dimensionless());
    }

    if let Some(def) = table::lookup(symbol) {
        return expand(symbol, def);
    }

    // No direct match: try splitting off a metric prefix.
    for (prefix, power) in table::prefixes() {
        let Some(rest) = symbol.strip_prefix(prefix) else {
            continue;
        };
        let Some(def) = table::lookup(rest) else {
            continue;
        };
        if !def.metric {
            continue;
        }
        let mut resolved = expand(rest, def)?;
        let prefix_scalar = power_of_ten(*power)?;
        resolved.scalar = resolved
            .scalar
            .checked_mul(prefix_scalar)
            .ok_or(Error::Overflow)?;
        return Ok(resolved);
    }

    Err(Error::UnknownUnit(symbol.to_string()))
}

fn expand(symbol: &str, def: &table::UnitDef) -> Result<Canonical> {
    let Some((expression, factor)) = def.expansion else {
        // Base unit: canonical form is itself with scalar 1.
        return Ok(Canonical {
            unit: Unit {
                exponents: BTreeMap::from([(symbol.to_string(), 1)]),
            },
            scalar: Decimal::ONE,
        });
    };

    let inner = crate::parser::parse(expression)?;
    let mut resolved = canonicalize(&inner)?;
    resolved.scalar = resolved
        .scalar
        .checked_mul(factor)
        .ok_or(Error::Overflow)?;
    Ok(resolved)
}

fn pow_decimal(base: Decimal, exp: i32) -> Result<Decimal> {
    if exp == 0 {
        return Ok(Decimal::ONE);
    }
    let mut out = Decimal::ONE;
    for _ in 0..exp.unsigned_abs() {
        out = out.checked_mul(base).ok_or(Error::Overflow)?;
    }
    if exp < 0 {
        if out.is_zero() {
            return Err(Error::Overflow);
        }
        out = Decimal::ONE.checked_div(out).ok_or(Error::Overflow)?;
    }
    Ok(out)
}

fn power_of_ten(power: i32) -> Result<Decimal> {
    pow_decimal(Decimal::TEN, power)
}

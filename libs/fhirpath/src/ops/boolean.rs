//! Three-valued boolean logic.
//!
//! Operands are `Option<bool>` where `None` is the empty collection.
//! Truth tables:
//! - `and`: (T,T)=T; any F → F; else empty.
//! - `or`:  (F,F)=F; any T → T; else empty.
//! - `xor`: empty if either operand is empty; else XOR.
//! - `implies`: (T,x)=x; (F,_)=T; (empty,T)=T; else empty.
//! - `not`: empty stays empty.

pub fn and(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

pub fn or(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

pub fn xor(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(a), Some(b)) => Some(a != b),
        _ => None,
    }
}

pub fn implies(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) => Some(true),
        (Some(true), r) => r,
        (None, Some(true)) => Some(true),
        (None, _) => None,
    }
}

pub fn not(operand: Option<bool>) -> Option<bool> {
    operand.map(|b| !b)
}

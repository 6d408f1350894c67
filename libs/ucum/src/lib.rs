//! UCUM unit expressions for quantity arithmetic and comparison.
//!
//! The crate covers the slice of UCUM that FHIRPath quantities need:
//! parsing unit strings into exponent multisets, multiplying/dividing
//! units, canonicalizing to base units with a decimal scale factor, and
//! mapping FHIRPath calendar-duration keywords onto definite UCUM codes.

#![forbid(unsafe_code)]

mod error;
mod parser;
mod table;
mod unit;

pub use error::{Error, Result};
pub use parser::parse;
pub use table::{calendar_to_ucum, CalendarMapping};
pub use unit::{canonicalize, Canonical, Unit};

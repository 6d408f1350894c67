//! First-order function implementations, grouped by chapter.
//!
//! Higher-order functions (`where`, `select`, `repeat`, `all`, `exists`
//! with criteria, `iif`, `aggregate`, `trace` with projection) live in
//! the evaluator — they re-evaluate argument ASTs per element. Type
//! functions (`is`, `as`, `ofType`) receive resolved type names from the
//! evaluator since their argument is a specifier, not an expression.

pub mod boundary;
pub mod combining;
pub mod conversion;
pub mod existence;
pub mod math;
pub mod navigation;
pub mod strings;
pub mod subsetting;
pub mod type_ops;
pub mod utility;

use crate::context::Clock;
use crate::error::{Error, Result};
use crate::model::ModelNavigator;
use crate::value::Collection;

/// Engine facilities the function library draws on.
pub struct FnContext<'a> {
    pub navigator: &'a dyn ModelNavigator,
    pub clock: &'a Clock,
}

/// Dispatch a first-order function by name.
pub fn call(
    name: &str,
    input: Collection,
    args: &[Collection],
    cx: &FnContext<'_>,
) -> Result<Collection> {
    match name {
        // Existence
        "empty" => existence::empty(input),
        "exists" => existence::exists(input),
        "allTrue" => existence::all_true(input),
        "anyTrue" => existence::any_true(input),
        "allFalse" => existence::all_false(input),
        "anyFalse" => existence::any_false(input),
        "subsetOf" => existence::subset_of(input, &args[0]),
        "supersetOf" => existence::superset_of(input, &args[0]),
        "count" => existence::count(input),
        "distinct" => existence::distinct(input),
        "isDistinct" => existence::is_distinct(input),

        // Subsetting
        "single" => subsetting::single(input),
        "first" => subsetting::first(input),
        "last" => subsetting::last(input),
        "tail" => subsetting::tail(input),
        "skip" => subsetting::skip(input, &args[0]),
        "take" => subsetting::take(input, &args[0]),
        "intersect" => subsetting::intersect(input, &args[0]),
        "exclude" => subsetting::exclude(input, &args[0]),

        // Combining
        "union" => combining::union(input, &args[0]),
        "combine" => combining::combine(input, &args[0]),

        // Conversion
        "toBoolean" => conversion::to_boolean(input),
        "convertsToBoolean" => conversion::converts_to_boolean(input),
        "toInteger" => conversion::to_integer(input),
        "convertsToInteger" => conversion::converts_to_integer(input),
        "toDecimal" => conversion::to_decimal(input),
        "convertsToDecimal" => conversion::converts_to_decimal(input),
        "toString" => conversion::to_string(input),
        "convertsToString" => conversion::converts_to_string(input),
        "toDate" => conversion::to_date(input),
        "convertsToDate" => conversion::converts_to_date(input),
        "toDateTime" => conversion::to_datetime(input),
        "convertsToDateTime" => conversion::converts_to_datetime(input),
        "toTime" => conversion::to_time(input),
        "convertsToTime" => conversion::converts_to_time(input),
        "toQuantity" => conversion::to_quantity(input, args.first()),
        "convertsToQuantity" => conversion::converts_to_quantity(input, args.first()),

        // Strings
        "indexOf" => strings::index_of(input, &args[0]),
        "lastIndexOf" => strings::last_index_of(input, &args[0]),
        "substring" => strings::substring(input, &args[0], args.get(1)),
        "startsWith" => strings::starts_with(input, &args[0]),
        "endsWith" => strings::ends_with(input, &args[0]),
        "contains" => strings::contains(input, &args[0]),
        "upper" => strings::upper(input),
        "lower" => strings::lower(input),
        "replace" => strings::replace(input, &args[0], &args[1]),
        "matches" => strings::matches(input, &args[0]),
        "matchesFull" => strings::matches_full(input, &args[0]),
        "replaceMatches" => strings::replace_matches(input, &args[0], &args[1]),
        "length" => strings::length(input),
        "toChars" => strings::to_chars(input),
        "trim" => strings::trim(input),
        "split" => strings::split(input, &args[0]),
        "join" => strings::join(input, args.first()),

        // Math
        "abs" => math::abs(input),
        "ceiling" => math::ceiling(input),
        "floor" => math::floor(input),
        "truncate" => math::truncate(input),
        "round" => math::round(input, args.first()),
        "sqrt" => math::sqrt(input),
        "ln" => math::ln(input),
        "log" => math::log(input, &args[0]),
        "exp" => math::exp(input),
        "power" => math::power(input, &args[0]),

        // Tree navigation
        "children" => navigation::children(input, cx.navigator),
        "descendants" => navigation::descendants(input, cx.navigator),

        // Utility
        "now" => utility::now(cx.clock),
        "today" => utility::today(cx.clock),
        "timeOfDay" => utility::time_of_day(cx.clock),
        "not" => utility::not(input),

        // Boundaries
        "lowBoundary" => boundary::low_boundary(input, args.first()),
        "highBoundary" => boundary::high_boundary(input, args.first()),
        "precision" => boundary::precision(input),

        // Types
        "type" => type_ops::type_info(input, cx.navigator),

        other => Err(Error::UnknownIdentifier(format!(
            "unknown function '{other}()'"
        ))),
    }
}

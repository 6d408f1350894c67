//! End-to-end evaluator tests: literals, navigation, operators, and the
//! engine entry points.

use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

use lumen_fhirpath::{Collection, Engine, Error, Value, Variables};

fn eval(expr: &str) -> Collection {
    Engine::r4()
        .evaluate(expr, None, &Variables::new())
        .unwrap_or_else(|e| panic!("{expr}: {e}"))
}

fn eval_on(expr: &str, resource: &serde_json::Value) -> Collection {
    Engine::r4()
        .evaluate(expr, Some(resource), &Variables::new())
        .unwrap_or_else(|e| panic!("{expr}: {e}"))
}

fn eval_err(expr: &str) -> Error {
    Engine::r4()
        .evaluate(expr, None, &Variables::new())
        .expect_err(expr)
}

fn boolean(expr: &str) -> Option<bool> {
    let result = eval(expr);
    match result.first() {
        None => None,
        Some(Value::Boolean(b)) => Some(*b),
        other => panic!("{expr}: expected boolean, got {other:?}"),
    }
}

fn strings(col: &Collection) -> Vec<String> {
    col.iter()
        .map(|v| v.as_str().expect("expected string").to_string())
        .collect()
}

fn patient() -> serde_json::Value {
    json!({
        "resourceType": "Patient",
        "active": true,
        "name": [
            {"use": "official", "given": ["Ada", "K."], "family": "Lovelace"},
            {"use": "nickname", "given": ["Addie"]}
        ],
        "birthDate": "1985-06-15",
        "multipleBirthBoolean": false
    })
}

// ============================================
// Literals
// ============================================

#[test]
fn literal_values() {
    assert_eq!(eval("true").first(), Some(&Value::Boolean(true)));
    assert_eq!(eval("42").first(), Some(&Value::Integer(42)));
    assert_eq!(eval("5L").first(), Some(&Value::Long(5)));
    assert_eq!(
        eval("3.14").first(),
        Some(&Value::Decimal(Decimal::from_str("3.14").unwrap()))
    );
    assert_eq!(eval("'hi'").first(), Some(&Value::string("hi")));
    assert!(eval("{}").is_empty());
}

#[test]
fn quantity_literals() {
    let Some(Value::Quantity(q)) = eval("5.5 'mg'").first().cloned() else {
        panic!("expected quantity");
    };
    assert_eq!(q.value, Decimal::from_str("5.5").unwrap());
    assert_eq!(q.unit, "'mg'");

    let Some(Value::Quantity(q)) = eval("3 days").first().cloned() else {
        panic!("expected quantity");
    };
    assert_eq!(q.unit, "days");
}

// ============================================
// Navigation
// ============================================

#[test]
fn path_navigation_flattens() {
    let result = eval_on("Patient.name.given", &patient());
    assert_eq!(strings(&result), vec!["Ada", "K.", "Addie"]);
}

#[test]
fn resource_type_identifier_matches_root() {
    let result = eval_on("Patient.active", &patient());
    assert_eq!(result.first(), Some(&Value::Boolean(true)));
    // A mismatched root type name yields empty.
    assert!(eval_on("Observation.active", &patient()).is_empty());
}

#[test]
fn relative_paths_work_without_type_prefix() {
    let result = eval_on("name.family", &patient());
    assert_eq!(strings(&result), vec!["Lovelace"]);
}

#[test]
fn unknown_property_is_lenient() {
    assert!(eval_on("Patient.nonExistentField", &patient()).is_empty());
    assert!(eval_on("Patient.name.nonExistent.more", &patient()).is_empty());
}

#[test]
fn choice_fields_unwrap() {
    let result = eval_on("Patient.multipleBirth", &patient());
    assert_eq!(result.first(), Some(&Value::Boolean(false)));
}

#[test]
fn indexer_selects_by_position() {
    let result = eval_on("Patient.name[0].given", &patient());
    assert_eq!(strings(&result), vec!["Ada", "K."]);
    assert!(eval_on("Patient.name[5]", &patient()).is_empty());
    assert_eq!(
        eval_on("Patient.name.given[2]", &patient()).first(),
        Some(&Value::string("Addie"))
    );
}

#[test]
fn fhir_primitives_read_as_system_values() {
    let result = eval_on("Patient.birthDate", &patient());
    assert_eq!(result.first(), Some(&Value::string("1985-06-15")));
}

// ============================================
// Environment variables
// ============================================

#[test]
fn terminology_constants() {
    assert_eq!(
        strings(&eval("%sct")),
        vec!["http://snomed.info/sct"]
    );
    assert_eq!(
        strings(&eval("%'vs-administrative-gender'")),
        vec!["http://hl7.org/fhir/ValueSet/administrative-gender"]
    );
    assert_eq!(
        strings(&eval("%'ext-patient-birthTime'")),
        vec!["http://hl7.org/fhir/StructureDefinition/patient-birthTime"]
    );
    assert_eq!(strings(&eval("%ucum")), vec!["http://unitsofmeasure.org"]);
}

#[test]
fn user_variables() {
    let mut vars = Variables::new();
    vars.insert("limit".to_string(), Some(Value::Integer(10)));
    vars.insert("undefined".to_string(), None);

    let engine = Engine::r4();
    let result = engine.evaluate("%limit + 1", None, &vars).unwrap();
    assert_eq!(result.first(), Some(&Value::Integer(11)));

    // Present-but-null resolves to empty; absent is fatal.
    assert!(engine.evaluate("%undefined", None, &vars).unwrap().is_empty());
    assert!(matches!(
        engine.evaluate("%missing", None, &vars),
        Err(Error::UnknownIdentifier(_))
    ));
}

#[test]
fn context_variable_is_the_resource() {
    let result = eval_on("%context.active", &patient());
    assert_eq!(result.first(), Some(&Value::Boolean(true)));
}

// ============================================
// Arithmetic operators
// ============================================

#[test]
fn arithmetic_basics() {
    assert_eq!(eval("1 + 2 * 3").first(), Some(&Value::Integer(7)));
    assert_eq!(eval("(1 + 2) * 3").first(), Some(&Value::Integer(9)));
    assert_eq!(
        eval("1 / 2").first(),
        Some(&Value::Decimal(Decimal::from_str("0.5").unwrap()))
    );
    assert_eq!(eval("7 div 2").first(), Some(&Value::Integer(3)));
    assert_eq!(eval("7 mod 2").first(), Some(&Value::Integer(1)));
    assert_eq!(eval("-5 + 2").first(), Some(&Value::Integer(-3)));
}

#[test]
fn empty_absorption_in_arithmetic() {
    for expr in ["1 + {}", "{} + 1", "{} * 4", "2 - {}", "{} / 2", "{} mod 3"] {
        assert!(eval(expr).is_empty(), "{expr}");
    }
}

#[test]
fn division_by_zero_is_empty() {
    assert!(eval("1 / 0").is_empty());
    assert!(eval("5 div 0").is_empty());
    assert!(eval("5 mod 0").is_empty());
}

#[test]
fn string_concatenation() {
    assert_eq!(eval("'ab' + 'cd'").first(), Some(&Value::string("abcd")));
    // `&` treats empty as ''; `+` propagates it.
    assert_eq!(eval("'ab' & {}").first(), Some(&Value::string("ab")));
    assert_eq!(eval("{} & 'cd'").first(), Some(&Value::string("cd")));
    assert!(eval("'ab' + {}").is_empty());
}

#[test]
fn quantity_arithmetic() {
    let Some(Value::Quantity(q)) = eval("2.5 'kg' * 3 'm'").first().cloned() else {
        panic!("expected quantity");
    };
    assert_eq!(q.value, Decimal::from_str("7.5").unwrap());
    assert_eq!(q.unit, "'kg.m'");

    let Some(Value::Quantity(q)) = eval("10 'm' / 4 's'").first().cloned() else {
        panic!("expected quantity");
    };
    assert_eq!(q.value, Decimal::from_str("2.5").unwrap());
    assert_eq!(q.unit, "'m.s-1'");

    assert!(eval("1 'm' / 0 's'").is_empty());
    assert!(matches!(eval_err("1 'm' + 1 'm'"), Error::Unimplemented(_)));
}

#[test]
fn temporal_arithmetic() {
    let Some(Value::Date(d)) = eval("@2024-01-31 + 1 month").first().cloned() else {
        panic!("expected date");
    };
    assert_eq!(d.format(), "2024-02-29");

    let Some(Value::Date(d)) = eval("@2024-03-01 - 2 'wk'").first().cloned() else {
        panic!("expected date");
    };
    assert_eq!(d.format(), "2024-02-16");

    let Some(Value::DateTime(dt)) = eval("@2024-01-15T10:30:00Z + 90 minutes").first().cloned()
    else {
        panic!("expected datetime");
    };
    assert_eq!(dt.format(), "2024-01-15T12:00:00Z");

    let Some(Value::Time(t)) = eval("@T23:30 + 1 hour").first().cloned() else {
        panic!("expected time");
    };
    assert_eq!(t.format(), "00:30");
}

// ============================================
// Comparison and equality
// ============================================

#[test]
fn comparison_operators() {
    assert_eq!(boolean("1 < 2"), Some(true));
    assert_eq!(boolean("2 <= 2"), Some(true));
    assert_eq!(boolean("3 > 4"), Some(false));
    assert_eq!(boolean("'abc' < 'abd'"), Some(true));
    assert_eq!(boolean("1.5 > 1"), Some(true));
}

#[test]
fn empty_absorption_in_comparison() {
    for expr in ["1 < {}", "{} < 1", "{} >= {}"] {
        assert!(eval(expr).is_empty(), "{expr}");
    }
}

#[test]
fn temporal_comparison_precision() {
    assert_eq!(boolean("@2024-01 < @2024-02"), Some(true));
    assert!(eval("@2024 < @2024-02").is_empty());
    // Order decidable in principle, still undecidable by policy.
    assert!(eval("@2025 > @2024-01").is_empty());
}

#[test]
fn quantity_comparison_converts_units() {
    assert_eq!(boolean("1 'm' > 50 'cm'"), Some(true));
    assert_eq!(boolean("1 'kg' = 1000 'g'"), Some(true));
    assert!(eval("1 'kg' = 1 'm'").is_empty());
    assert_eq!(boolean("1 'kg' ~ 1 'm'"), Some(false));
}

#[test]
fn equality_and_equivalence() {
    assert_eq!(boolean("1 = 1"), Some(true));
    assert_eq!(boolean("1 = 1.0"), Some(true));
    assert_eq!(boolean("1 != 2"), Some(true));
    assert_eq!(boolean("'a' = 'a'"), Some(true));
    assert_eq!(boolean("'a' = 'A'"), Some(false));
    assert_eq!(boolean("'Hello  World' ~ 'hello world'"), Some(true));
    assert_eq!(boolean("1.24 ~ 1.3"), Some(false));
    assert_eq!(boolean("1.27 ~ 1.3"), Some(true));
    assert_eq!(boolean("'a' !~ 'b'"), Some(true));
}

#[test]
fn empty_equality_rules() {
    // `=` with an empty operand is empty.
    assert!(eval("{} = {}").is_empty());
    assert!(eval("1 = {}").is_empty());
    // Equivalence is total: two empties are equivalent.
    assert_eq!(boolean("{} ~ {}"), Some(true));
    assert_eq!(boolean("1 ~ {}"), Some(false));
}

#[test]
fn collection_equality() {
    assert_eq!(boolean("(1 | 2) = (1 | 2)"), Some(true));
    assert_eq!(boolean("(1 | 2) = (2 | 1)"), Some(false));
    assert_eq!(boolean("(1 | 2) ~ (2 | 1)"), Some(true));
    assert_eq!(boolean("(1 | 2) = (1 | 2 | 3)"), Some(false));
}

// ============================================
// Boolean logic (three-valued)
// ============================================

#[test]
fn three_valued_and() {
    assert_eq!(boolean("true and true"), Some(true));
    assert_eq!(boolean("true and false"), Some(false));
    assert_eq!(boolean("false and {}"), Some(false));
    assert_eq!(boolean("{} and false"), Some(false));
    assert!(eval("true and {}").is_empty());
    assert!(eval("{} and {}").is_empty());
}

#[test]
fn three_valued_or() {
    assert_eq!(boolean("false or false"), Some(false));
    assert_eq!(boolean("false or true"), Some(true));
    assert_eq!(boolean("{} or true"), Some(true));
    assert!(eval("false or {}").is_empty());
    assert!(eval("{} or {}").is_empty());
}

#[test]
fn three_valued_xor() {
    assert_eq!(boolean("true xor false"), Some(true));
    assert_eq!(boolean("true xor true"), Some(false));
    assert!(eval("true xor {}").is_empty());
    assert!(eval("{} xor false").is_empty());
}

#[test]
fn three_valued_implies() {
    assert_eq!(boolean("true implies true"), Some(true));
    assert_eq!(boolean("true implies false"), Some(false));
    assert_eq!(boolean("false implies false"), Some(true));
    assert_eq!(boolean("{} implies true"), Some(true));
    assert!(eval("true implies {}").is_empty());
    assert!(eval("{} implies false").is_empty());
}

#[test]
fn not_function() {
    assert_eq!(boolean("true.not()"), Some(false));
    assert_eq!(boolean("false.not()"), Some(true));
    assert!(eval("{}.not()").is_empty());
}

#[test]
fn short_circuit_skips_untaken_branch() {
    // The right side would be a type error if evaluated.
    assert_eq!(boolean("false and ('a' < 1)"), Some(false));
    assert_eq!(boolean("true or ('a' < 1)"), Some(true));
    assert_eq!(boolean("false implies ('a' < 1)"), Some(true));
}

// ============================================
// Membership and union
// ============================================

#[test]
fn membership_operators() {
    assert_eq!(boolean("1 in (1 | 2)"), Some(true));
    assert_eq!(boolean("3 in (1 | 2)"), Some(false));
    assert_eq!(boolean("(1 | 2) contains 2"), Some(true));
    assert!(eval("{} in (1 | 2)").is_empty());
}

#[test]
fn union_deduplicates() {
    assert_eq!(
        eval("(1 | 2 | 2 | 3).count()").first(),
        Some(&Value::Integer(3))
    );
    // Order is first-occurrence.
    let result = eval("2 | 1 | 2");
    assert_eq!(
        result,
        Collection::from_vec(vec![Value::Integer(2), Value::Integer(1)])
    );
}

// ============================================
// Type operators
// ============================================

#[test]
fn type_tests() {
    assert_eq!(boolean("5 is Integer"), Some(true));
    assert_eq!(boolean("5 is System.Integer"), Some(true));
    assert_eq!(boolean("5 is Decimal"), Some(false));
    assert_eq!(boolean("'x' is String"), Some(true));
    assert_eq!(boolean("@2024 is Date"), Some(true));
    assert_eq!(boolean("(1 | 1) is Integer"), Some(true));
}

#[test]
fn type_tests_on_resources() {
    assert_eq!(
        eval_on("Patient is Patient", &patient()).first(),
        Some(&Value::Boolean(true))
    );
    assert_eq!(
        eval_on("Patient.is(FHIR.Patient)", &patient()).first(),
        Some(&Value::Boolean(true))
    );
}

#[test]
fn cast_with_implicit_conversion() {
    assert_eq!(
        eval("5 as Decimal").first(),
        Some(&Value::Decimal(Decimal::from(5)))
    );
    assert_eq!(eval("5 as Integer").first(), Some(&Value::Integer(5)));
    assert!(eval("'x' as Integer").is_empty());
    let Some(Value::Quantity(q)) = eval("5 as Quantity").first().cloned() else {
        panic!("expected quantity");
    };
    assert_eq!(q.unit, "'1'");
}

// ============================================
// Errors
// ============================================

#[test]
fn trailing_input_is_a_parse_error() {
    let Error::Parse(message) = eval_err("1 + 2 3") else {
        panic!("expected parse error");
    };
    assert!(message.contains("extraneous input"), "{message}");
}

#[test]
fn unknown_function_is_fatal() {
    assert!(matches!(eval_err("frobnicate()"), Error::UnknownIdentifier(_)));
}

#[test]
fn cardinality_violations_are_fatal() {
    assert!(matches!(
        eval_err("(1 | 2).toString()"),
        Error::Cardinality(_)
    ));
    assert!(matches!(eval_err("(1 | 2) + 1"), Error::Cardinality(_)));
}

#[test]
fn incompatible_comparison_is_a_type_error() {
    assert!(matches!(eval_err("'a' < 1"), Error::Type(_)));
    assert!(matches!(eval_err("true + 1"), Error::Type(_)));
}

// ============================================
// Result conversion
// ============================================

#[test]
fn fhir_quantity_converts_to_system_quantity() {
    let observation = json!({
        "resourceType": "Observation",
        "valueQuantity": {
            "value": 185,
            "unit": "lbs",
            "system": "http://unitsofmeasure.org",
            "code": "[lb_av]"
        }
    });
    let result = eval_on("Observation.value", &observation);
    let Some(Value::Quantity(q)) = result.first() else {
        panic!("expected quantity, got {:?}", result.first());
    };
    assert_eq!(q.value, Decimal::from(185));
    assert_eq!(q.unit, "'[lb_av]'");
}

#[test]
fn selected_values_match_direct_navigation() {
    let direct = eval_on("Patient.name.given", &patient());
    let selected = eval_on("Patient.name.given.select($this)", &patient());
    assert_eq!(direct, selected);
}

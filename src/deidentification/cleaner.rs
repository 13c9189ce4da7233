//! VR-specific substitutions for the blank, dummy and pseudonymize actions
//!
//! Each function matches exhaustively on [`VrClass`]. Sequence elements are never
//! replaced here: the walker recurses into their items instead.

use crate::deidentification::pseudonym::{Pseudonymizer, MAX_PSEUDONYM_LEN};
use crate::domain::tree::{Element, Value};
use crate::domain::vr::{Vr, VrClass};
use serde_json::Number;

pub const DUMMY_DATE: &str = "19700101";
pub const DUMMY_TIME: &str = "000000.00";
pub const DUMMY_DATETIME: &str = "19700101000000.000000";
pub const DUMMY_TEXT: &str = "ANONYMIZED";
pub const DUMMY_AGE: &str = "000Y";

/// Empty value of the same representation
pub fn blank(vr: Vr) -> Value {
    match vr.class() {
        VrClass::Sequence => Value::Sequence(Vec::new()),
        VrClass::Date
        | VrClass::Time
        | VrClass::DateTime
        | VrClass::Uid
        | VrClass::NumericString
        | VrClass::Numeric
        | VrClass::Binary
        | VrClass::Text => Value::Empty,
    }
}

/// Non-identifying placeholder for a leaf element
///
/// With `keep_pseudonyms`, UID values already in pseudonym form are returned as is.
pub fn dummy(element: &Element, keep_pseudonyms: bool) -> Value {
    match element.vr.class() {
        VrClass::Date => Value::string(DUMMY_DATE),
        VrClass::Time => Value::string(DUMMY_TIME),
        VrClass::DateTime => Value::string(DUMMY_DATETIME),
        VrClass::Uid => pseudonymize_values(&element.value, keep_pseudonyms),
        VrClass::NumericString => match element.value {
            Value::Numbers(_) => Value::Numbers(vec![Number::from(0)]),
            _ => Value::string("0"),
        },
        VrClass::Numeric => Value::Numbers(vec![Number::from(0)]),
        VrClass::Binary => Value::Empty,
        VrClass::Sequence => element.value.clone(),
        VrClass::Text => match element.vr {
            Vr::AS => Value::string(DUMMY_AGE),
            Vr::AT => Value::Empty,
            _ => Value::string(DUMMY_TEXT),
        },
    }
}

/// Pseudonymous replacement for a leaf element
///
/// Text and UID values are replaced value by value with their pseudonym. Dates, times,
/// numeric strings and short-string VRs (AE, CS, SH...) cannot hold a UID and get their
/// dummy placeholder instead; binary and numeric values are blanked.
pub fn pseudonymize(element: &Element, keep_pseudonyms: bool) -> Value {
    match element.vr.class() {
        VrClass::Uid => pseudonymize_values(&element.value, keep_pseudonyms),
        VrClass::Text if holds_pseudonym(element.vr) => {
            pseudonymize_values(&element.value, keep_pseudonyms)
        }
        VrClass::Text
        | VrClass::Date
        | VrClass::Time
        | VrClass::DateTime
        | VrClass::NumericString => dummy(element, keep_pseudonyms),
        VrClass::Numeric | VrClass::Binary => Value::Empty,
        VrClass::Sequence => element.value.clone(),
    }
}

/// Value stored for a forced literal
///
/// Binary numeric VRs keep a number when the literal parses as one.
pub fn forced(vr: Vr, literal: &str) -> Value {
    if vr.class() == VrClass::Numeric {
        if let Ok(number) = serde_json::from_str::<Number>(literal.trim()) {
            return Value::Numbers(vec![number]);
        }
    }
    Value::string(literal)
}

fn holds_pseudonym(vr: Vr) -> bool {
    vr.max_length().map_or(true, |max| max >= MAX_PSEUDONYM_LEN)
}

fn pseudonymize_values(value: &Value, keep_pseudonyms: bool) -> Value {
    let replace = |text: &str| -> String {
        let text = text.trim_matches([' ', '\0']);
        if text.is_empty() || (keep_pseudonyms && Pseudonymizer::is_pseudonym(text)) {
            text.to_string()
        } else {
            Pseudonymizer::pseudonym(text)
        }
    };

    match value {
        Value::Empty => Value::Empty,
        Value::Strings(values) => Value::Strings(values.iter().map(|v| replace(v)).collect()),
        Value::Numbers(values) => {
            Value::Strings(values.iter().map(|n| replace(&n.to_string())).collect())
        }
        Value::Binary(_) | Value::BulkData(_) => Value::Empty,
        Value::Sequence(_) => value.clone(),
    }
}

//! Tests for the data type lattice

use serde_json::{Value, json};

use crate::{DataType, TypingError, common_ancestor, is_convertible, reformat_value};

const ALL_TYPES: [DataType; 5] = [
    DataType::Unknown,
    DataType::Int64,
    DataType::Float64,
    DataType::String,
    DataType::Timestamp,
];

#[test]
fn test_discriminant_values() {
    assert_eq!(DataType::Unknown as u8, 0);
    assert_eq!(DataType::Int64 as u8, 1);
    assert_eq!(DataType::Float64 as u8, 2);
    assert_eq!(DataType::String as u8, 3);
    assert_eq!(DataType::Timestamp as u8, 4);
}

#[test]
fn test_from_str_name() {
    assert_eq!(DataType::from_str_name("string").unwrap(), DataType::String);
    assert_eq!(DataType::from_str_name("double").unwrap(), DataType::Float64);
    assert_eq!(
        DataType::from_str_name("timestamp").unwrap(),
        DataType::Timestamp
    );

    // case-insensitive and whitespace-trimmed
    assert_eq!(
        DataType::from_str_name(" InTeGer ").unwrap(),
        DataType::Int64
    );
}

#[test]
fn test_from_str_name_unknown() {
    for bad in ["", "float", "int64"] {
        let err = DataType::from_str_name(bad).unwrap_err();
        assert!(
            matches!(err, TypingError::UnknownTypeName(_)),
            "expected UnknownTypeName for {bad:?}"
        );
    }
}

#[test]
fn test_as_str_name() {
    assert_eq!(DataType::String.as_str_name().unwrap(), "string");
    assert_eq!(DataType::Int64.as_str_name().unwrap(), "integer");
    assert_eq!(DataType::Float64.as_str_name().unwrap(), "double");
    assert_eq!(DataType::Timestamp.as_str_name().unwrap(), "timestamp");

    assert!(matches!(
        DataType::Unknown.as_str_name(),
        Err(TypingError::NoStringForm(DataType::Unknown))
    ));
}

#[test]
fn test_from_value() {
    assert_eq!(
        DataType::from_value(&json!("abc")).unwrap(),
        DataType::String
    );
    assert_eq!(DataType::from_value(&json!(123)).unwrap(), DataType::Int64);
    assert_eq!(
        DataType::from_value(&json!(-42i64)).unwrap(),
        DataType::Int64
    );
    assert_eq!(
        DataType::from_value(&json!(123.1)).unwrap(),
        DataType::Float64
    );
    assert_eq!(
        DataType::from_value(&json!(123.0000000001)).unwrap(),
        DataType::Float64
    );
}

#[test]
fn test_from_value_unknown() {
    for bad in [json!(null), json!(true), json!([1, 2]), json!({"a": 1})] {
        let err = DataType::from_value(&bad).unwrap_err();
        assert!(
            matches!(err, TypingError::UnknownValueType(_)),
            "expected UnknownValueType for {bad}"
        );
    }
}

#[test]
fn test_reformat_value() {
    // integer literal stays integer
    let v = reformat_value(json!(5));
    assert!(v.is_i64());

    // float literal stays float, even with a zero fraction
    let v: Value = serde_json::from_str("5.0").unwrap();
    assert!(reformat_value(v).is_f64());

    let v: Value = serde_json::from_str("5.5").unwrap();
    assert!(reformat_value(v).is_f64());

    // non-numbers pass through unchanged
    assert_eq!(reformat_value(json!("v")), json!("v"));
    assert_eq!(reformat_value(json!(true)), json!(true));
    assert_eq!(reformat_value(json!(null)), json!(null));
}

#[test]
fn test_is_convertible_widening() {
    assert!(is_convertible(DataType::Int64, DataType::Float64));
    assert!(is_convertible(DataType::Int64, DataType::String));
    assert!(is_convertible(DataType::Float64, DataType::String));
    assert!(is_convertible(DataType::Timestamp, DataType::String));

    // reflexive
    for t in ALL_TYPES {
        assert!(is_convertible(t, t));
    }

    // unknown converts to anything
    for t in ALL_TYPES {
        assert!(is_convertible(DataType::Unknown, t));
    }
}

#[test]
fn test_is_convertible_narrowing_rejected() {
    assert!(!is_convertible(DataType::Float64, DataType::Int64));
    assert!(!is_convertible(DataType::String, DataType::Int64));
    assert!(!is_convertible(DataType::String, DataType::Float64));
    assert!(!is_convertible(DataType::String, DataType::Timestamp));
    assert!(!is_convertible(DataType::Timestamp, DataType::Float64));
    assert!(!is_convertible(DataType::Int64, DataType::Timestamp));
}

#[test]
fn test_common_ancestor() {
    assert_eq!(
        common_ancestor(DataType::Int64, DataType::Float64),
        DataType::Float64
    );
    assert_eq!(
        common_ancestor(DataType::Int64, DataType::String),
        DataType::String
    );
    assert_eq!(
        common_ancestor(DataType::Unknown, DataType::Timestamp),
        DataType::Timestamp
    );

    // incomparable pairs fall back to STRING
    assert_eq!(
        common_ancestor(DataType::Int64, DataType::Timestamp),
        DataType::String
    );
    assert_eq!(
        common_ancestor(DataType::Float64, DataType::Timestamp),
        DataType::String
    );
}

#[test]
fn test_common_ancestor_commutative() {
    for a in ALL_TYPES {
        for b in ALL_TYPES {
            assert_eq!(
                common_ancestor(a, b),
                common_ancestor(b, a),
                "common_ancestor({a}, {b}) not commutative"
            );
        }
    }
}

#[test]
fn test_common_ancestor_associative() {
    for a in ALL_TYPES {
        for b in ALL_TYPES {
            for c in ALL_TYPES {
                let left = common_ancestor(common_ancestor(a, b), c);
                let right = common_ancestor(a, common_ancestor(b, c));
                assert_eq!(left, right, "fold order changed result for ({a}, {b}, {c})");
            }
        }
    }
}

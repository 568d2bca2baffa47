//! Property-based tests for the wire codec.
//!
//! These tests generate random well-formed lines and values and check that
//! decoding is total on them, deterministic, and agrees with the builder.

use proptest::prelude::*;
use sensorlink_core::Error;
use sensorlink_protocol::{FieldValue, MessageBuilder, decode_message};

/// Strategy for field names: no delimiters, no surrounding whitespace.
fn valid_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z_][A-Za-z0-9_]{0,15}")
        .expect("Failed to create field name regex strategy")
}

/// Strategy for text payloads free of parentheses and line breaks.
fn valid_text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^()\\r\\n]{0,24}")
        .expect("Failed to create text regex strategy")
}

/// Strategy for finite numbers, which survive a Display/parse round trip.
fn valid_number() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::ZERO
}

/// Strategy for values nested up to four collections deep.
fn valid_value() -> impl Strategy<Value = FieldValue> {
    let leaf = prop_oneof![
        valid_text().prop_map(FieldValue::Str),
        valid_number().prop_map(FieldValue::Number),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(FieldValue::Collection)
    })
}

proptest! {
    /// Property: every value the builder accepts decodes back to itself.
    #[test]
    fn prop_builder_decode_roundtrip(name in valid_name(), value in valid_value()) {
        let line = MessageBuilder::new()
            .field(name.clone(), value.clone())
            .expect("generated field should be valid")
            .build();

        let message = decode_message(&line).expect("builder output should decode");
        prop_assert_eq!(message.len(), 1);
        prop_assert_eq!(message.get(&name), Some(&value));
    }

    /// Property: decoding the same line twice yields equal messages.
    #[test]
    fn prop_decode_deterministic(
        fields in prop::collection::vec((valid_name(), valid_value()), 1..6)
    ) {
        let mut builder = MessageBuilder::new();
        for (name, value) in fields {
            builder = builder.field(name, value).expect("generated field should be valid");
        }
        let line = builder.build_line();

        let first = decode_message(&line).expect("line should decode");
        let second = decode_message(&line).expect("line should decode");
        prop_assert_eq!(first, second);
    }

    /// Property: padding a number with whitespace never changes its value.
    #[test]
    fn prop_number_whitespace(n in valid_number(), left in " {0,4}", right in " {0,4}") {
        let line = format!("n:number({left}{n}{right})|");
        let message = decode_message(&line).expect("padded number should decode");
        prop_assert_eq!(message.get("n"), Some(&FieldValue::Number(n)));
    }

    /// Property: any tag other than the three known ones is rejected as UnknownType.
    #[test]
    fn prop_unknown_tag_rejected(tag in "[a-z]{1,10}") {
        prop_assume!(tag != "str" && tag != "number" && tag != "collection");
        let line = format!("a:{tag}(1)|");
        let is_unknown_type = matches!(decode_message(&line), Err(Error::UnknownType { .. }));
        prop_assert!(is_unknown_type);
    }

    /// Property: arbitrary input never panics the decoder.
    #[test]
    fn prop_decode_never_panics(input in "\\PC{0,64}") {
        let _ = decode_message(&input);
    }
}

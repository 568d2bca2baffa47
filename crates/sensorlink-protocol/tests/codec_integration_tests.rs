//! Decoding of the lines the school monitoring firmware actually sends.

use sensorlink_core::Error;
use sensorlink_protocol::{
    DecodedMessage, FieldValue, MessageBuilder, decode_message, fields, split_lines,
};

#[test]
fn test_card_scan_line() {
    let message = decode_message("IUD:str(04A2B3C4)|\r\n").unwrap();
    assert_eq!(
        message.get(fields::CARD_ID).and_then(FieldValue::as_str),
        Some("04A2B3C4")
    );
}

#[test]
fn test_safety_line() {
    let message = decode_message("Gas:number(312)|Fire:number(0)|").unwrap();
    assert_eq!(
        message.get(fields::GAS).and_then(FieldValue::as_number),
        Some(312.0)
    );
    assert_eq!(
        message.get(fields::FLAME).and_then(FieldValue::as_number),
        Some(0.0)
    );
}

#[test]
fn test_sonar_sweep_line() {
    let line = MessageBuilder::new()
        .field(fields::SONAR_ANGLES, vec![0.0, 30.0, 60.0])
        .unwrap()
        .field(fields::SONAR_DISTANCES, vec![120.0, 95.0, 80.0])
        .unwrap()
        .build_line();

    assert_eq!(
        line,
        "angles:collection(number(0),number(30),number(60))|distances:collection(number(120),number(95),number(80))|\n"
    );

    let message = decode_message(&line).unwrap();
    let expected: DecodedMessage = [
        (fields::SONAR_ANGLES, FieldValue::from(vec![0.0, 30.0, 60.0])),
        (
            fields::SONAR_DISTANCES,
            FieldValue::from(vec![120.0, 95.0, 80.0]),
        ),
    ]
    .into_iter()
    .collect();
    assert_eq!(message, expected);
}

#[test]
fn test_chunk_with_several_lines() {
    let chunk = "Gas:number(300)|\nGas:number(305)|\n\nFire:number(1)|";
    let decoded: Vec<DecodedMessage> = split_lines(chunk)
        .map(|line| decode_message(line).unwrap())
        .collect();

    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[0].get("Gas"), Some(&FieldValue::Number(300.0)));
    assert_eq!(decoded[1].get("Gas"), Some(&FieldValue::Number(305.0)));
    assert_eq!(decoded[2].get("Fire"), Some(&FieldValue::Number(1.0)));
}

#[test]
fn test_one_bad_field_fails_whole_line() {
    let result = decode_message("Gas:number(300)|Fire:number(hot)|");
    match result {
        Err(Error::MalformedNumber { value }) => assert_eq!(value, "hot"),
        other => panic!("expected MalformedNumber, got {other:?}"),
    }
}

#[test]
fn test_decoded_message_json() {
    let message = decode_message("a:collection(str(x),number(2))|").unwrap();
    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json, serde_json::json!({ "a": ["x", 2.0] }));
}

use super::*;
use serde_json::json;

fn decode_json(value: &serde_json::Value) -> Result<Inbound, ProtocolError> {
    decode(&value.to_string())
}

#[test]
fn init_signal_requests_initial_state() {
    assert_eq!(decode("init"), Ok(Inbound::RequestInitialState));
    assert_eq!(decode("  init\n"), Ok(Inbound::RequestInitialState));
}

#[test]
fn join_decodes_into_typed_command() {
    let inbound = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": " Alice ", "weight": 70, "sex": "Female", "room": "Kitchen", "colour": "rgba(1,2,3,1)"}
    }))
    .unwrap();

    assert_eq!(
        inbound,
        Inbound::Join(Join { name: "Alice".into(), weight: 70.0, sex: Sex::Female, room: "Kitchen".into() })
    );
}

#[test]
fn join_with_unknown_sex_is_rejected() {
    let err = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": "Alice", "weight": 70, "sex": "Other", "room": "Global"}
    }))
    .unwrap_err();

    assert_eq!(err.error_code(), "E_UNKNOWN_SEX");
}

#[test]
fn join_requires_room() {
    let err = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": "Alice", "weight": 70, "sex": "Female"}
    }))
    .unwrap_err();

    assert!(matches!(err, ProtocolError::Malformed(ref msg) if msg.contains("room")));
}

#[test]
fn join_rejects_empty_name_and_bad_weight() {
    let empty = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": "   ", "weight": 70, "sex": "Male", "room": "Global"}
    }));
    assert!(matches!(empty, Err(ProtocolError::InvalidField { field: "name", .. })));

    let long_name = "x".repeat(MAX_NAME_CHARS + 1);
    let long = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": long_name, "weight": 70, "sex": "Male", "room": "Global"}
    }));
    assert!(matches!(long, Err(ProtocolError::InvalidField { field: "name", .. })));

    let zero = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": "Bob", "weight": 0, "sex": "Male", "room": "Global"}
    }));
    assert!(matches!(zero, Err(ProtocolError::InvalidField { field: "weight", .. })));
}

#[test]
fn wrong_field_type_is_malformed_not_a_panic() {
    let err = decode_json(&json!({
        "cmd": "new user",
        "data": {"name": "Bob", "weight": "heavy", "sex": "Male", "room": "Global"}
    }))
    .unwrap_err();

    assert_eq!(err.error_code(), "E_MALFORMED_FRAME");
}

#[test]
fn drink_decodes_into_typed_command() {
    let inbound = decode_json(&json!({
        "cmd": "new drink",
        "data": {"name": "Alice", "weight": 70.0, "sex": "Female", "volume": 350, "strength": 5, "bac": 0}
    }))
    .unwrap();

    assert_eq!(
        inbound,
        Inbound::Drink(Drink {
            name: "Alice".into(),
            weight: 70.0,
            sex: "Female".into(),
            volume: 350.0,
            strength: 5.0,
            bac: 0.0,
        })
    );
}

#[test]
fn drink_rejects_negative_bac() {
    let err = decode_json(&json!({
        "cmd": "new drink",
        "data": {"name": "Alice", "weight": 70.0, "sex": "Female", "volume": 350, "strength": 5, "bac": -0.1}
    }))
    .unwrap_err();

    assert!(matches!(err, ProtocolError::InvalidField { field: "bac", .. }));
}

#[test]
fn drink_missing_data_is_malformed() {
    let err = decode(r#"{"cmd":"new drink"}"#).unwrap_err();
    assert_eq!(err.error_code(), "E_MALFORMED_FRAME");
}

#[test]
fn unknown_command_is_reported() {
    let err = decode(r#"{"cmd":"dance","data":{}}"#).unwrap_err();
    assert_eq!(err, ProtocolError::UnknownCommand("dance".into()));
    assert_eq!(err.error_code(), "E_UNKNOWN_COMMAND");
}

#[test]
fn non_json_text_is_malformed() {
    let err = decode("hello").unwrap_err();
    assert_eq!(err.error_code(), "E_MALFORMED_FRAME");
}

#[test]
fn update_command_serializes_to_wire_shape() {
    let mut balances = BalanceMap::new();
    balances.insert("Alice".into(), 0.5);
    balances.insert("Bob".into(), 0.25);

    let value = serde_json::to_value(Command::UpdateBac(balances)).unwrap();
    assert_eq!(value, json!({"cmd": "updateBAC", "data": {"Alice": 0.5, "Bob": 0.25}}));
}

#[test]
fn batch_serializes_as_array_in_order() {
    let first = Command::UpdateBac(BalanceMap::from([("Alice".to_string(), 0.5)]));
    let second = Command::UpdateBac(BalanceMap::new());

    let value = serde_json::to_value(vec![first, second]).unwrap();
    assert_eq!(
        value,
        json!([
            {"cmd": "updateBAC", "data": {"Alice": 0.5}},
            {"cmd": "updateBAC", "data": {}}
        ])
    );
}

#[test]
fn error_command_carries_code_and_message() {
    let cmd = Command::error_from(&ProtocolError::UnknownCommand("dance".into()));
    let value = serde_json::to_value(&cmd).unwrap();

    assert_eq!(value["cmd"], "error");
    assert_eq!(value["data"]["code"], "E_UNKNOWN_COMMAND");
    assert_eq!(value["data"]["message"], "unknown command: \"dance\"");
}

#[test]
fn drink_weight_below_minimum_is_rejected() {
    let err = decode_json(&json!({
        "cmd": "new drink",
        "data": {"name": "Alice", "weight": 1e-300, "sex": "Male", "volume": 1e10, "strength": 100, "bac": 0}
    }))
    .unwrap_err();

    assert!(matches!(err, ProtocolError::InvalidField { field: "weight", .. }));
    assert_eq!(err.error_code(), "E_INVALID_FIELD");
}

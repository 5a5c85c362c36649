use acbridge::error::AcBridgeError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        AcBridgeError::config("x"),
        AcBridgeError::Config { .. }
    ));
    assert!(matches!(AcBridgeError::uart("x"), AcBridgeError::Uart { .. }));
    assert!(matches!(
        AcBridgeError::protocol("x"),
        AcBridgeError::Protocol { .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    let ser = AcBridgeError::Serialization {
        message: "s".into(),
    };
    assert!(matches!(ser, AcBridgeError::Serialization { .. }));
    assert!(matches!(AcBridgeError::io("x"), AcBridgeError::Io { .. }));
    assert!(matches!(
        AcBridgeError::not_found("device", "x"),
        AcBridgeError::NotFound { .. }
    ));
    assert!(matches!(
        AcBridgeError::checksum(1, 2),
        AcBridgeError::Checksum {
            expected: 1,
            actual: 2
        }
    ));
}

#[test]
fn error_constructors_group_3() {
    assert!(matches!(
        AcBridgeError::validation("f", "m"),
        AcBridgeError::Validation { .. }
    ));
    assert!(matches!(
        AcBridgeError::timeout("x"),
        AcBridgeError::Timeout { .. }
    ));
    assert!(matches!(
        AcBridgeError::generic("x"),
        AcBridgeError::Generic { .. }
    ));
}

#[test]
fn display_messages() {
    let e = AcBridgeError::validation("field", "bad");
    assert!(format!("{}", e).contains("Validation error"));

    let e = AcBridgeError::not_found("sensor", "room_temp");
    assert_eq!(format!("{}", e), "sensor not found: room_temp");
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let e: AcBridgeError = io.into();
    assert!(matches!(e, AcBridgeError::Io { .. }));
    assert!(e.is_connection_error());
}

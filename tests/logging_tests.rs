use acbridge::logging::{
    get_logger, parse_line_level, set_web_log_level, should_emit_to_web,
};
use tracing::Level;

#[test]
fn should_emit_filters_below_runtime_level() {
    set_web_log_level(Level::WARN);
    assert!(!should_emit_to_web("2025-01-01T00:00:00Z  INFO message"));
    assert!(should_emit_to_web("2025-01-01T00:00:00Z ERROR something"));
    assert!(should_emit_to_web("continuation line without level"));
    set_web_log_level(Level::ERROR);
    assert!(!should_emit_to_web(
        "\u{1b}[2m2025-01-01T00:00:00Z\u{1b}[0m \u{1b}[33m WARN\u{1b}[0m noisy warn line"
    ));
    set_web_log_level(Level::INFO);
}

#[test]
fn json_lines_are_classified() {
    let line = r#"{"timestamp":"t","level":"ERROR","fields":{"message":"x"}}"#;
    assert_eq!(parse_line_level(line), Some(Level::ERROR));
}

#[test]
fn logger_keeps_component() {
    let logger = get_logger("components");
    assert_eq!(logger.context().component, "components");
}

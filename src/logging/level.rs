use crate::error::{AcBridgeError, Result};
use tracing::Level;

use super::state::get_web_log_level;

/// Parse a level name; WARNING and CRITICAL are accepted as aliases
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        _ => Err(AcBridgeError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

pub fn level_rank(level: Level) -> u8 {
    match level {
        Level::TRACE => 0,
        Level::DEBUG => 1,
        Level::INFO => 2,
        Level::WARN => 3,
        Level::ERROR => 4,
    }
}

pub fn min_level(a: Level, b: Level) -> Level {
    if level_rank(a) <= level_rank(b) { a } else { b }
}

const LEVELS: [(Level, &str); 5] = [
    (Level::TRACE, "TRACE"),
    (Level::DEBUG, "DEBUG"),
    (Level::INFO, "INFO"),
    (Level::WARN, "WARN"),
    (Level::ERROR, "ERROR"),
];

/// Recover the level of an already formatted log line (JSON or plain)
pub fn parse_line_level(line: &str) -> Option<Level> {
    let line = strip_ansi_codes(line);
    let line = line.as_str();
    LEVELS
        .iter()
        .find(|(_, name)| line.contains(&format!("\"level\":\"{}\"", name)))
        .or_else(|| {
            LEVELS
                .iter()
                .find(|(_, name)| line.contains(&format!(" {} ", name)))
        })
        .map(|(level, _)| *level)
}

/// Whether a line passes the runtime web level. Lines without a level pass.
pub fn should_emit_to_web(line: &str) -> bool {
    let current = get_web_log_level();
    parse_line_level(line).is_none_or(|lvl| level_rank(lvl) >= level_rank(current))
}

/// Remove CSI escape sequences (`ESC [ ... final-byte`) from a line
fn strip_ansi_codes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\u{1b}' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        assert_eq!(strip_ansi_codes("\u{1b}[33m WARN\u{1b}[0m x"), " WARN x");
        assert_eq!(strip_ansi_codes("25 °C"), "25 °C");
    }

    #[test]
    fn test_parse_coloured_line() {
        let line = "\u{1b}[2m2025-01-01T00:00:00.000000Z\u{1b}[0m \u{1b}[33m WARN\u{1b}[0m noisy warn line";
        assert_eq!(parse_line_level(line), Some(Level::WARN));
        let line = "\u{1b}[2m2025-01-01T00:00:00Z\u{1b}[0m \u{1b}[32m INFO\u{1b}[0m started";
        assert_eq!(parse_line_level(line), Some(Level::INFO));
    }
}

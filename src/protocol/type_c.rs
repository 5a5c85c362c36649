//! Sinclair "type C" protocol
//!
//! Frames open with a single `7E`; the command byte at offset 2 fixes the
//! frame length and the last two bytes carry a little-endian CRC-16/MODBUS.

use super::checksum::crc16_modbus;
use super::receiver::SYNC_BYTE;
use super::{AcProtocol, AcState, Framing, UnitReport};
use crate::entities::{ClimateMode, ClimateTraits, FanMode};
use crate::error::{AcBridgeError, Result};
use crate::models::Model;
use tracing::debug;

pub const CMD_STATUS_SHORT: u8 = 0x82;
pub const CMD_STATUS_LONG: u8 = 0x83;
pub const CMD_DIAGNOSTICS: u8 = 0x8F;

const SHORT_CURRENT_TEMP: usize = 14;
const SHORT_MODE: usize = 20;

const CONTROL_HEADER: [u8; 4] = [SYNC_BYTE, SYNC_BYTE, 0x2F, 0x01];

/// Total frame length for a command byte
pub fn expected_length(cmd: u8) -> Option<usize> {
    match cmd {
        CMD_STATUS_SHORT => Some(59),
        CMD_STATUS_LONG => Some(134),
        CMD_DIAGNOSTICS => Some(133),
        _ => None,
    }
}

/// Check the trailing CRC of a frame
pub fn verify_crc(frame: &[u8]) -> Result<()> {
    if frame.len() < 3 {
        return Err(AcBridgeError::protocol("type C frame too short"));
    }
    let split = frame.len() - 2;
    let expected = crc16_modbus(&frame[..split]);
    let actual = u16::from_le_bytes([frame[split], frame[split + 1]]);
    if expected != actual {
        return Err(AcBridgeError::checksum(expected, actual));
    }
    Ok(())
}

/// Append the CRC to a frame body
pub fn seal(mut frame: Vec<u8>) -> Vec<u8> {
    let crc = crc16_modbus(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

#[derive(Debug, Clone, Copy)]
pub struct TypeCProtocol;

impl AcProtocol for TypeCProtocol {
    fn model(&self) -> Model {
        Model::SinclairC
    }

    fn framing(&self) -> Framing {
        Framing::CommandSized(expected_length)
    }

    fn traits(&self) -> ClimateTraits {
        ClimateTraits {
            supported_modes: vec![
                ClimateMode::Off,
                ClimateMode::Heat,
                ClimateMode::Cool,
                ClimateMode::Auto,
            ],
            supported_fan_modes: vec![FanMode::Low, FanMode::Medium, FanMode::High, FanMode::Auto],
            min_temperature: 16.0,
            max_temperature: 30.0,
            temperature_step: 1.0,
            supports_current_temperature: true,
            supports_action: true,
        }
    }

    fn decode(&self, frame: &[u8]) -> Result<Option<UnitReport>> {
        if frame.len() < 5 || frame[0] != SYNC_BYTE {
            return Err(AcBridgeError::protocol("type C frame missing start byte"));
        }
        let cmd = frame[2];
        match expected_length(cmd) {
            Some(len) if len == frame.len() => {}
            Some(len) => {
                return Err(AcBridgeError::protocol(format!(
                    "type C command 0x{:02X} expects {} bytes, got {}",
                    cmd,
                    len,
                    frame.len()
                )));
            }
            None => {
                return Err(AcBridgeError::protocol(format!(
                    "Unknown command: 0x{:02X}",
                    cmd
                )));
            }
        }
        verify_crc(frame)?;

        match cmd {
            CMD_STATUS_SHORT => {
                let mode = match frame[SHORT_MODE] {
                    0x00 => Some(ClimateMode::Off),
                    0x01 => Some(ClimateMode::Cool),
                    0x02 => Some(ClimateMode::Heat),
                    0x03 => Some(ClimateMode::Auto),
                    _ => None,
                };
                Ok(Some(UnitReport {
                    mode,
                    current_temperature: Some(f32::from(frame[SHORT_CURRENT_TEMP])),
                    ..Default::default()
                }))
            }
            _ => {
                debug!("type C frame 0x{:02X} carries no mapped fields", cmd);
                Ok(None)
            }
        }
    }

    fn encode(&self, state: &AcState) -> Result<Vec<u8>> {
        let target = state.target_temperature.round().clamp(16.0, 30.0) as u8;
        let mut frame = CONTROL_HEADER.to_vec();
        frame.push(target);
        Ok(seal(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_status(temp: u8, mode: u8) -> Vec<u8> {
        let mut body = vec![0u8; 57];
        body[0] = SYNC_BYTE;
        body[2] = CMD_STATUS_SHORT;
        body[SHORT_CURRENT_TEMP] = temp;
        body[SHORT_MODE] = mode;
        seal(body)
    }

    #[test]
    fn test_expected_lengths() {
        assert_eq!(expected_length(0x82), Some(59));
        assert_eq!(expected_length(0x83), Some(134));
        assert_eq!(expected_length(0x8F), Some(133));
        assert_eq!(expected_length(0x10), None);
    }

    #[test]
    fn test_short_status() {
        let frame = short_status(23, 0x02);
        assert_eq!(frame.len(), 59);
        let report = TypeCProtocol.decode(&frame).unwrap().unwrap();
        assert_eq!(report.current_temperature, Some(23.0));
        assert_eq!(report.mode, Some(ClimateMode::Heat));
    }

    #[test]
    fn test_unknown_mode_keeps_state() {
        let report = TypeCProtocol.decode(&short_status(20, 0x09)).unwrap().unwrap();
        assert!(report.mode.is_none());
    }

    #[test]
    fn test_crc_failure() {
        let mut frame = short_status(23, 0x01);
        frame[10] ^= 0x01;
        assert!(matches!(
            TypeCProtocol.decode(&frame),
            Err(AcBridgeError::Checksum { .. })
        ));
    }

    #[test]
    fn test_long_status_has_no_fields() {
        let mut body = vec![0u8; 132];
        body[0] = SYNC_BYTE;
        body[2] = CMD_STATUS_LONG;
        assert!(TypeCProtocol.decode(&seal(body)).unwrap().is_none());
    }

    #[test]
    fn test_control_frame() {
        let state = AcState {
            target_temperature: 25.0,
            ..AcState::default()
        };
        let frame = TypeCProtocol.encode(&state).unwrap();
        assert_eq!(&frame[..5], &[0x7E, 0x7E, 0x2F, 0x01, 25]);
        assert_eq!(frame.len(), 7);
        assert!(verify_crc(&frame).is_ok());
    }
}

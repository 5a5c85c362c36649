//! Sinclair ASC-18 wall controller protocol
//!
//! Status frames are `7E 7E` plus a 64-byte body. Control frames are `7E 7E`
//! plus a 46-byte body closed by a 16-bit byte sum and its complement.

use super::checksum::sum16;
use super::receiver::SYNC_BYTE;
use super::{AcProtocol, AcState, Framing, UnitReport};
use crate::entities::{ClimateMode, ClimateTraits, FanMode};
use crate::error::{AcBridgeError, Result};
use crate::models::Model;

/// Body size of a status frame
pub const STATUS_BODY_LEN: usize = 64;
/// Status bodies shorter than this are ignored
const STATUS_MIN_LEN: usize = 40;
/// Body size of a control frame
pub const CONTROL_BODY_LEN: usize = 46;

const STATUS_TARGET_TEMP: usize = 0x1A;
const STATUS_FAN: usize = 0x2D;

const CONTROL_HEADER: [u8; 10] = [0x00, 0xFF, 0x01, 0x28, 0x30, 0x18, 0x82, 0x17, 0x04, 0xB2];
const CONTROL_MODE: usize = 0x16;
const CONTROL_TARGET_TEMP: usize = 0x17;
const CONTROL_PADDING_START: usize = 24;
const CONTROL_FAN: usize = CONTROL_BODY_LEN - 3;
const CONTROL_CHECKSUM: usize = CONTROL_BODY_LEN - 2;
const PADDING: u8 = 0x5F;

const TEMP_MIN: u8 = 0x10;
const TEMP_MAX: u8 = 0x1E;

const FAN_LEVELS: [(FanMode, u8); 7] = [
    (FanMode::Auto, 0x00),
    (FanMode::Low, 0x01),
    (FanMode::MiddleLow, 0x02),
    (FanMode::Medium, 0x03),
    (FanMode::MiddleHigh, 0x04),
    (FanMode::High, 0x05),
    (FanMode::Turbo, 0x06),
];

fn fan_from_raw(raw: u8) -> FanMode {
    FAN_LEVELS
        .iter()
        .find(|(_, r)| *r == raw)
        .map_or(FanMode::Auto, |(f, _)| *f)
}

fn fan_to_raw(fan: FanMode) -> u8 {
    FAN_LEVELS
        .iter()
        .find(|(f, _)| *f == fan)
        .map_or(0x00, |(_, r)| *r)
}

fn mode_to_raw(mode: ClimateMode) -> u8 {
    match mode {
        ClimateMode::Off => 0x00,
        ClimateMode::Cool => 0x01,
        ClimateMode::Heat => 0x02,
        ClimateMode::Dry => 0x03,
        ClimateMode::FanOnly => 0x04,
        ClimateMode::Auto => 0x11,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Asc18Protocol;

impl AcProtocol for Asc18Protocol {
    fn model(&self) -> Model {
        Model::SinclairAsc18
    }

    fn framing(&self) -> Framing {
        Framing::Fixed(STATUS_BODY_LEN)
    }

    fn traits(&self) -> ClimateTraits {
        ClimateTraits {
            supported_modes: vec![
                ClimateMode::Off,
                ClimateMode::Cool,
                ClimateMode::Heat,
                ClimateMode::Dry,
                ClimateMode::FanOnly,
                ClimateMode::Auto,
            ],
            supported_fan_modes: FAN_LEVELS.iter().map(|(f, _)| *f).collect(),
            min_temperature: f32::from(TEMP_MIN),
            max_temperature: f32::from(TEMP_MAX),
            temperature_step: 1.0,
            supports_current_temperature: false,
            supports_action: false,
        }
    }

    fn decode(&self, frame: &[u8]) -> Result<Option<UnitReport>> {
        if frame.len() < 2 || frame[0] != SYNC_BYTE || frame[1] != SYNC_BYTE {
            return Err(AcBridgeError::protocol("ASC-18 frame missing sync header"));
        }
        let body = &frame[2..];
        if body.len() < STATUS_MIN_LEN {
            return Ok(None);
        }

        let mut report = UnitReport::default();
        if let Some(&t) = body.get(STATUS_TARGET_TEMP)
            && (TEMP_MIN..=TEMP_MAX).contains(&t)
        {
            report.target_temperature = Some(f32::from(t));
        }
        if let Some(&fan) = body.get(STATUS_FAN) {
            report.fan_mode = Some(fan_from_raw(fan));
        }
        Ok(Some(report))
    }

    fn encode(&self, state: &AcState) -> Result<Vec<u8>> {
        let mut body = [0u8; CONTROL_BODY_LEN];
        body[..CONTROL_HEADER.len()].copy_from_slice(&CONTROL_HEADER);
        body[CONTROL_MODE] = mode_to_raw(state.mode);

        let target = state
            .target_temperature
            .round()
            .clamp(f32::from(TEMP_MIN), f32::from(TEMP_MAX));
        body[CONTROL_TARGET_TEMP] = target as u8;

        body[CONTROL_PADDING_START..CONTROL_FAN].fill(PADDING);
        body[CONTROL_FAN] = fan_to_raw(state.fan_mode);

        let sum = sum16(&body[..CONTROL_CHECKSUM]);
        let [lo, _] = sum.to_le_bytes();
        let [not_lo, _] = (!sum).to_le_bytes();
        body[CONTROL_CHECKSUM] = lo;
        body[CONTROL_CHECKSUM + 1] = not_lo;

        let mut frame = Vec::with_capacity(CONTROL_BODY_LEN + 2);
        frame.extend_from_slice(&[SYNC_BYTE, SYNC_BYTE]);
        frame.extend_from_slice(&body);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_frame() {
        let state = AcState {
            mode: ClimateMode::Auto,
            target_temperature: 23.0,
            fan_mode: FanMode::Turbo,
            ..AcState::default()
        };
        let frame = Asc18Protocol.encode(&state).unwrap();
        assert_eq!(frame.len(), 48);
        let body = &frame[2..];
        assert_eq!(&body[..10], &CONTROL_HEADER);
        assert_eq!(body[0x16], 0x11);
        assert_eq!(body[0x17], 23);
        assert!(body[24..43].iter().all(|b| *b == 0x5F));
        assert_eq!(body[43], 0x06);
        let s = sum16(&body[..44]);
        assert_eq!(body[44], (s & 0xFF) as u8);
        assert_eq!(body[45], (!s & 0xFF) as u8);
    }

    #[test]
    fn test_off_and_clamped_temperature() {
        let state = AcState {
            mode: ClimateMode::Off,
            target_temperature: 40.0,
            ..AcState::default()
        };
        let frame = Asc18Protocol.encode(&state).unwrap();
        assert_eq!(frame[2 + 0x16], 0x00);
        assert_eq!(frame[2 + 0x17], 0x1E);
    }

    #[test]
    fn test_status_decode() {
        let mut frame = vec![0x7E, 0x7E];
        let mut body = vec![0u8; STATUS_BODY_LEN];
        body[0x1A] = 0x15;
        body[0x2D] = 0x02;
        frame.extend_from_slice(&body);

        let report = Asc18Protocol.decode(&frame).unwrap().unwrap();
        assert_eq!(report.target_temperature, Some(21.0));
        assert_eq!(report.fan_mode, Some(FanMode::MiddleLow));
        assert!(report.mode.is_none());
    }

    #[test]
    fn test_status_out_of_range_target_ignored() {
        let mut frame = vec![0x7E, 0x7E];
        let mut body = vec![0u8; STATUS_BODY_LEN];
        body[0x1A] = 0x40;
        body[0x2D] = 0x33;
        frame.extend_from_slice(&body);

        let report = Asc18Protocol.decode(&frame).unwrap().unwrap();
        assert!(report.target_temperature.is_none());
        assert_eq!(report.fan_mode, Some(FanMode::Auto));
    }

    #[test]
    fn test_short_status_ignored() {
        let frame = [0x7E, 0x7E, 0x00, 0x01];
        assert!(Asc18Protocol.decode(&frame).unwrap().is_none());
    }
}

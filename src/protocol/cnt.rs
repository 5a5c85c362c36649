//! Gree / Sinclair "CNT" UART protocol
//!
//! Frame layout: `7E 7E LEN CMD PAYLOAD.. CHK` where LEN counts CMD, the
//! payload and CHK, and CHK is the 8-bit sum of LEN, CMD and the payload.
//! Units report their state with `CMD_REPORT`; a state change is requested
//! by sending the complete parameter set with `CMD_SET`.
//!
//! Payload layout (offsets into the payload):
//!
//! | byte | bits | field |
//! |------|------|-------|
//! | 3 | 7 / 6-4 / 3 | power / mode / sleep |
//! | 4 | 7-4 | target temperature - 16 |
//! | 5 | 0..5 | turbo, light, health, xfan, powersave, beeper |
//! | 6 | 7-4 / 2-0 | vertical / horizontal swing |
//! | 7 | 7 / 6-4 / 0 | Fahrenheit / display mode / I-Feel |
//! | 8 | 5-4 / 2-0 | quiet / fan speed |
//! | 42, 43 | | indoor / outdoor temperature + 40 (report only) |

use super::checksum::sum8;
use super::receiver::SYNC_BYTE;
use super::{AcProtocol, AcState, Framing, UnitReport};
use crate::entities::{ClimateMode, ClimateTraits, FanMode};
use crate::error::{AcBridgeError, Result};
use crate::models::{Feature, Model};
use tracing::{debug, warn};

pub const CMD_SET: u8 = 0x01;
pub const CMD_REPORT: u8 = 0x31;

/// Payload size of a parameter-set frame
pub const PAYLOAD_LEN: usize = 45;
/// LEN byte of a parameter-set frame
pub const SET_LEN_BYTE: u8 = (PAYLOAD_LEN + 2) as u8;

const HEADER_LEN: usize = 4;

const P_SET_MARKER: usize = 2;
const SET_MARKER: u8 = 0xAF;

const P_POWER_MODE: usize = 3;
const POWER_BIT: u8 = 0x80;
const MODE_MASK: u8 = 0x70;
const MODE_SHIFT: u8 = 4;
const SLEEP_BIT: u8 = 0x08;

const P_TEMP: usize = 4;
const TEMP_MASK: u8 = 0xF0;
const TEMP_SHIFT: u8 = 4;

const P_FLAGS: usize = 5;
const TURBO_BIT: u8 = 0x01;
const LIGHT_BIT: u8 = 0x02;
const HEALTH_BIT: u8 = 0x04;
const XFAN_BIT: u8 = 0x08;
const POWERSAVE_BIT: u8 = 0x10;
const BEEPER_BIT: u8 = 0x20;

const P_SWING: usize = 6;
const VSWING_MASK: u8 = 0xF0;
const VSWING_SHIFT: u8 = 4;
const HSWING_MASK: u8 = 0x07;

const P_DISPLAY: usize = 7;
const FAHRENHEIT_BIT: u8 = 0x80;
const DISPLAY_MASK: u8 = 0x70;
const DISPLAY_SHIFT: u8 = 4;

const P_FAN: usize = 8;
const QUIET_MASK: u8 = 0x30;
const QUIET_SHIFT: u8 = 4;
const FAN_MASK: u8 = 0x07;

const P_INDOOR_TEMP: usize = 42;
const P_OUTDOOR_TEMP: usize = 43;
const REPORTED_TEMP_OFFSET: i16 = 40;

pub const TEMP_MIN: f32 = 16.0;
pub const TEMP_MAX: f32 = 30.0;
pub const TEMP_STEP: f32 = 1.0;

/// Reported temperatures above this are sensor glitches
pub const TEMPERATURE_THRESHOLD: f32 = 100.0;

const FLAG_BITS: [(Feature, u8); 6] = [
    (Feature::Turbo, TURBO_BIT),
    (Feature::Light, LIGHT_BIT),
    (Feature::Health, HEALTH_BIT),
    (Feature::Xfan, XFAN_BIT),
    (Feature::Powersave, POWERSAVE_BIT),
    (Feature::Beeper, BEEPER_BIT),
];

const FAN_CODES: [(FanMode, u8); 6] = [
    (FanMode::Auto, 0),
    (FanMode::Minimum, 1),
    (FanMode::Low, 2),
    (FanMode::Medium, 3),
    (FanMode::High, 4),
    (FanMode::Maximum, 5),
];

fn mode_code(mode: ClimateMode) -> u8 {
    match mode {
        ClimateMode::Auto | ClimateMode::Off => 0,
        ClimateMode::Cool => 1,
        ClimateMode::Dry => 2,
        ClimateMode::FanOnly => 3,
        ClimateMode::Heat => 4,
    }
}

fn mode_from_code(code: u8) -> Option<ClimateMode> {
    match code {
        0 => Some(ClimateMode::Auto),
        1 => Some(ClimateMode::Cool),
        2 => Some(ClimateMode::Dry),
        3 => Some(ClimateMode::FanOnly),
        4 => Some(ClimateMode::Heat),
        _ => None,
    }
}

fn fan_code(fan: FanMode) -> u8 {
    FAN_CODES
        .iter()
        .find(|(f, _)| *f == fan)
        .map_or(0, |(_, code)| *code)
}

fn fan_from_code(code: u8) -> Option<FanMode> {
    FAN_CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(f, _)| *f)
}

fn reported_temperature(raw: u8) -> Option<f32> {
    if raw == 0 {
        return None;
    }
    let celsius = f32::from(i16::from(raw) - REPORTED_TEMP_OFFSET);
    if celsius > TEMPERATURE_THRESHOLD {
        warn!("Reported temperature {} out of range, ignoring", celsius);
        return None;
    }
    Some(celsius)
}

/// Wrap a payload into a complete frame
pub fn build_frame(cmd: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let len = u8::try_from(payload.len() + 2)
        .map_err(|_| AcBridgeError::protocol("CNT payload too long"))?;
    let mut frame = Vec::with_capacity(payload.len() + HEADER_LEN + 1);
    frame.extend_from_slice(&[SYNC_BYTE, SYNC_BYTE, len, cmd]);
    frame.extend_from_slice(payload);
    frame.push(sum8(&frame[2..]));
    Ok(frame)
}

/// Check framing and checksum; returns `(cmd, payload)`
pub fn split_frame(frame: &[u8]) -> Result<(u8, &[u8])> {
    if frame.len() < HEADER_LEN + 1 || frame[0] != SYNC_BYTE || frame[1] != SYNC_BYTE {
        return Err(AcBridgeError::protocol("CNT frame missing sync header"));
    }
    let declared = usize::from(frame[2]) + 3;
    if declared != frame.len() {
        return Err(AcBridgeError::protocol(format!(
            "CNT frame length mismatch: header says {}, got {}",
            declared,
            frame.len()
        )));
    }
    let last = frame.len() - 1;
    let expected = sum8(&frame[2..last]);
    if expected != frame[last] {
        return Err(AcBridgeError::checksum(
            u16::from(expected),
            u16::from(frame[last]),
        ));
    }
    Ok((frame[3], &frame[HEADER_LEN..last]))
}

/// Gree and Sinclair units share the CNT wire format
#[derive(Debug, Clone, Copy)]
pub struct CntProtocol {
    model: Model,
}

impl CntProtocol {
    pub fn new(model: Model) -> Self {
        Self { model }
    }

    fn decode_report(&self, p: &[u8]) -> UnitReport {
        let power = p[P_POWER_MODE] & POWER_BIT != 0;
        let mode = if power {
            mode_from_code((p[P_POWER_MODE] & MODE_MASK) >> MODE_SHIFT)
        } else {
            Some(ClimateMode::Off)
        };

        let target = TEMP_MIN + f32::from((p[P_TEMP] & TEMP_MASK) >> TEMP_SHIFT);

        let mut switches: Vec<(Feature, bool)> = FLAG_BITS
            .iter()
            .map(|&(feature, bit)| (feature, p[P_FLAGS] & bit != 0))
            .collect();
        switches.push((Feature::Sleep, p[P_POWER_MODE] & SLEEP_BIT != 0));
        switches.retain(|(f, _)| self.model.feature_spec(*f).is_some());

        let mut selects = vec![
            (
                Feature::VerticalSwing,
                (p[P_SWING] & VSWING_MASK) >> VSWING_SHIFT,
            ),
            (Feature::HorizontalSwing, p[P_SWING] & HSWING_MASK),
            (
                Feature::DisplayMode,
                (p[P_DISPLAY] & DISPLAY_MASK) >> DISPLAY_SHIFT,
            ),
            (
                Feature::DisplayUnit,
                u8::from(p[P_DISPLAY] & FAHRENHEIT_BIT != 0),
            ),
            (Feature::Quiet, (p[P_FAN] & QUIET_MASK) >> QUIET_SHIFT),
        ];
        selects.retain(|(f, _)| self.model.feature_spec(*f).is_some());

        UnitReport {
            mode,
            target_temperature: Some(target.min(TEMP_MAX)),
            current_temperature: reported_temperature(p[P_INDOOR_TEMP]),
            outdoor_temperature: reported_temperature(p[P_OUTDOOR_TEMP]),
            fan_mode: fan_from_code(p[P_FAN] & FAN_MASK),
            selects,
            switches,
        }
    }
}

impl AcProtocol for CntProtocol {
    fn model(&self) -> Model {
        self.model
    }

    fn framing(&self) -> Framing {
        Framing::LengthPrefixed
    }

    fn traits(&self) -> ClimateTraits {
        ClimateTraits {
            supported_modes: vec![
                ClimateMode::Off,
                ClimateMode::Auto,
                ClimateMode::Cool,
                ClimateMode::Heat,
                ClimateMode::FanOnly,
                ClimateMode::Dry,
            ],
            supported_fan_modes: FAN_CODES.iter().map(|(f, _)| *f).collect(),
            min_temperature: TEMP_MIN,
            max_temperature: TEMP_MAX,
            temperature_step: TEMP_STEP,
            supports_current_temperature: true,
            supports_action: true,
        }
    }

    fn decode(&self, frame: &[u8]) -> Result<Option<UnitReport>> {
        let (cmd, payload) = split_frame(frame)?;
        if cmd != CMD_REPORT {
            debug!("Ignoring CNT frame with command 0x{:02X}", cmd);
            return Ok(None);
        }
        if payload.len() < PAYLOAD_LEN {
            return Err(AcBridgeError::protocol(format!(
                "CNT report too short: {} bytes",
                payload.len()
            )));
        }
        Ok(Some(self.decode_report(payload)))
    }

    fn encode(&self, state: &AcState) -> Result<Vec<u8>> {
        let mut p = [0u8; PAYLOAD_LEN];
        p[P_SET_MARKER] = SET_MARKER;

        if state.power() {
            p[P_POWER_MODE] |= POWER_BIT;
        }
        p[P_POWER_MODE] |= (mode_code(state.mode) << MODE_SHIFT) & MODE_MASK;
        if state.sleep {
            p[P_POWER_MODE] |= SLEEP_BIT;
        }

        let target = state.target_temperature.round().clamp(TEMP_MIN, TEMP_MAX);
        // clamped to 16..=30 above, so the offset fits in the nibble
        let offset = (target - TEMP_MIN) as u8;
        p[P_TEMP] = (offset << TEMP_SHIFT) & TEMP_MASK;

        for (feature, bit) in FLAG_BITS {
            if state.switch(feature) == Some(true) {
                p[P_FLAGS] |= bit;
            }
        }

        p[P_SWING] = ((state.vertical_swing << VSWING_SHIFT) & VSWING_MASK)
            | (state.horizontal_swing & HSWING_MASK);

        p[P_DISPLAY] = (state.display_mode << DISPLAY_SHIFT) & DISPLAY_MASK;
        if state.display_unit != 0 {
            p[P_DISPLAY] |= FAHRENHEIT_BIT;
        }

        p[P_FAN] = ((state.quiet << QUIET_SHIFT) & QUIET_MASK) | (fan_code(state.fan_mode) & FAN_MASK);

        build_frame(CMD_SET, &p)
    }
}

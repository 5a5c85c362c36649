//! UART protocols spoken by the supported units
//!
//! Every model is handled by an [`AcProtocol`] implementation that knows the
//! framing, decodes unit reports into a [`UnitReport`] and encodes the full
//! desired [`AcState`] into a control frame. Frames are assembled from the
//! byte stream by [`FrameReceiver`].

pub mod asc18;
pub mod checksum;
pub mod cnt;
pub mod receiver;
pub mod type_c;

pub use receiver::{FrameReceiver, Framing, ReceiverState, ReceiverStats};

use crate::entities::{ClimateMode, ClimateTraits, FanMode};
use crate::error::Result;
use crate::models::{Feature, Model};
use serde::Serialize;

/// Full settable state of a unit, as last reported and as requested
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcState {
    pub mode: ClimateMode,
    pub target_temperature: f32,
    pub fan_mode: FanMode,
    pub horizontal_swing: u8,
    pub vertical_swing: u8,
    pub display_mode: u8,
    pub display_unit: u8,
    pub quiet: u8,
    pub light: bool,
    pub health: bool,
    pub beeper: bool,
    pub sleep: bool,
    pub xfan: bool,
    pub powersave: bool,
    pub turbo: bool,
}

impl Default for AcState {
    fn default() -> Self {
        Self {
            mode: ClimateMode::Off,
            target_temperature: 24.0,
            fan_mode: FanMode::Auto,
            horizontal_swing: 0,
            vertical_swing: 0,
            display_mode: 2,
            display_unit: 0,
            quiet: 0,
            light: true,
            health: false,
            beeper: true,
            sleep: false,
            xfan: false,
            powersave: false,
            turbo: false,
        }
    }
}

impl AcState {
    pub fn power(&self) -> bool {
        self.mode != ClimateMode::Off
    }

    /// Raw option code of a select feature; `None` for switch features
    pub fn select_raw(&self, feature: Feature) -> Option<u8> {
        match feature {
            Feature::HorizontalSwing => Some(self.horizontal_swing),
            Feature::VerticalSwing => Some(self.vertical_swing),
            Feature::DisplayMode => Some(self.display_mode),
            Feature::DisplayUnit => Some(self.display_unit),
            Feature::Quiet => Some(self.quiet),
            _ => None,
        }
    }

    pub fn set_select_raw(&mut self, feature: Feature, raw: u8) {
        match feature {
            Feature::HorizontalSwing => self.horizontal_swing = raw,
            Feature::VerticalSwing => self.vertical_swing = raw,
            Feature::DisplayMode => self.display_mode = raw,
            Feature::DisplayUnit => self.display_unit = raw,
            Feature::Quiet => self.quiet = raw,
            _ => {}
        }
    }

    /// State of a switch feature; `None` for select features
    pub fn switch(&self, feature: Feature) -> Option<bool> {
        match feature {
            Feature::Light => Some(self.light),
            Feature::Health => Some(self.health),
            Feature::Beeper => Some(self.beeper),
            Feature::Sleep => Some(self.sleep),
            Feature::Xfan => Some(self.xfan),
            Feature::Powersave => Some(self.powersave),
            Feature::Turbo => Some(self.turbo),
            _ => None,
        }
    }

    pub fn set_switch(&mut self, feature: Feature, on: bool) {
        match feature {
            Feature::Light => self.light = on,
            Feature::Health => self.health = on,
            Feature::Beeper => self.beeper = on,
            Feature::Sleep => self.sleep = on,
            Feature::Xfan => self.xfan = on,
            Feature::Powersave => self.powersave = on,
            Feature::Turbo => self.turbo = on,
            _ => {}
        }
    }

    /// Merge the fields a report carries
    pub fn apply(&mut self, report: &UnitReport) {
        if let Some(mode) = report.mode {
            self.mode = mode;
        }
        if let Some(t) = report.target_temperature {
            self.target_temperature = t;
        }
        if let Some(fan) = report.fan_mode {
            self.fan_mode = fan;
        }
        for &(feature, raw) in &report.selects {
            self.set_select_raw(feature, raw);
        }
        for &(feature, on) in &report.switches {
            self.set_switch(feature, on);
        }
    }
}

/// Fields decoded from one unit frame; absent fields were not reported
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitReport {
    pub mode: Option<ClimateMode>,
    pub target_temperature: Option<f32>,
    pub current_temperature: Option<f32>,
    pub outdoor_temperature: Option<f32>,
    pub fan_mode: Option<FanMode>,
    pub selects: Vec<(Feature, u8)>,
    pub switches: Vec<(Feature, bool)>,
}

/// Wire protocol of one model
pub trait AcProtocol: Send + Sync {
    fn model(&self) -> Model;

    fn framing(&self) -> Framing;

    fn traits(&self) -> ClimateTraits;

    /// Decode a complete frame. `Ok(None)` for valid frames without state.
    fn decode(&self, frame: &[u8]) -> Result<Option<UnitReport>>;

    /// Encode the full desired state as a control frame
    fn encode(&self, state: &AcState) -> Result<Vec<u8>>;
}

pub fn protocol_for(model: Model) -> Box<dyn AcProtocol> {
    match model {
        Model::GreeAc | Model::SinclairAc => Box::new(cnt::CntProtocol::new(model)),
        Model::SinclairAsc18 => Box::new(asc18::Asc18Protocol),
        Model::SinclairC => Box::new(type_c::TypeCProtocol),
    }
}

use crate::error::{AcBridgeError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tolerance around the target before the unit is considered active
pub const TEMPERATURE_TOLERANCE: f32 = 2.0;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ClimateMode {
    #[default]
    Off,
    Auto,
    Cool,
    Heat,
    FanOnly,
    Dry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClimateAction {
    #[default]
    Off,
    Idle,
    Cooling,
    Heating,
    Drying,
    Fan,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FanMode {
    #[default]
    Auto,
    Minimum,
    Low,
    MiddleLow,
    Medium,
    MiddleHigh,
    High,
    Maximum,
    Turbo,
}

impl FanMode {
    pub fn label(self) -> &'static str {
        match self {
            FanMode::Auto => "Auto",
            FanMode::Minimum => "Minimum",
            FanMode::Low => "Low",
            FanMode::MiddleLow => "Middle-Low",
            FanMode::Medium => "Medium",
            FanMode::MiddleHigh => "Middle-High",
            FanMode::High => "High",
            FanMode::Maximum => "Maximum",
            FanMode::Turbo => "Turbo",
        }
    }
}

/// Capabilities advertised by a climate device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateTraits {
    pub supported_modes: Vec<ClimateMode>,
    pub supported_fan_modes: Vec<FanMode>,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub temperature_step: f32,
    pub supports_current_temperature: bool,
    pub supports_action: bool,
}

impl ClimateTraits {
    /// Check a control request and return it with the target snapped to the
    /// temperature step.
    pub fn validate(&self, call: &ClimateCall) -> Result<ClimateCall> {
        if let Some(mode) = call.mode
            && !self.supported_modes.contains(&mode)
        {
            return Err(AcBridgeError::validation(
                "mode",
                format!("Unsupported mode {:?}", mode),
            ));
        }
        if let Some(fan) = call.fan_mode
            && !self.supported_fan_modes.contains(&fan)
        {
            return Err(AcBridgeError::validation(
                "fan_mode",
                format!("Unsupported fan mode {}", fan.label()),
            ));
        }
        let target_temperature = match call.target_temperature {
            Some(t) => {
                if !t.is_finite() || t < self.min_temperature || t > self.max_temperature {
                    return Err(AcBridgeError::validation(
                        "target_temperature",
                        format!(
                            "Must be between {} and {}",
                            self.min_temperature, self.max_temperature
                        ),
                    ));
                }
                let step = self.temperature_step;
                Some((t / step).round() * step)
            }
            None => None,
        };
        Ok(ClimateCall {
            target_temperature,
            ..call.clone()
        })
    }
}

/// A requested climate change; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClimateCall {
    #[serde(default)]
    pub mode: Option<ClimateMode>,
    #[serde(default)]
    pub target_temperature: Option<f32>,
    #[serde(default)]
    pub fan_mode: Option<FanMode>,
}

impl ClimateCall {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.target_temperature.is_none() && self.fan_mode.is_none()
    }
}

/// Published climate state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClimateState {
    pub mode: ClimateMode,
    pub action: ClimateAction,
    pub target_temperature: f32,
    pub current_temperature: Option<f32>,
    pub outdoor_temperature: Option<f32>,
    pub fan_mode: Option<FanMode>,
}

impl ClimateState {
    /// Recompute the action from mode and temperatures
    pub fn refresh_action(&mut self) {
        self.action = determine_action(self.mode, self.current_temperature, self.target_temperature);
    }
}

/// What the unit is doing, derived from mode and the temperature gap
pub fn determine_action(mode: ClimateMode, current: Option<f32>, target: f32) -> ClimateAction {
    match mode {
        ClimateMode::Off => ClimateAction::Off,
        ClimateMode::FanOnly => ClimateAction::Fan,
        ClimateMode::Dry => ClimateAction::Drying,
        ClimateMode::Cool
            if current.is_some_and(|c| c + TEMPERATURE_TOLERANCE >= target) =>
        {
            ClimateAction::Cooling
        }
        ClimateMode::Heat
            if current.is_some_and(|c| c - TEMPERATURE_TOLERANCE <= target) =>
        {
            ClimateAction::Heating
        }
        _ => ClimateAction::Idle,
    }
}

//! Entities exposed by climate devices
//!
//! A climate device owns its climate state plus zero or more select and
//! switch entities; sensors are declared separately and referenced by id.

pub mod climate;
pub mod select;
pub mod sensor;
pub mod switch;

pub use climate::{
    ClimateAction, ClimateCall, ClimateMode, ClimateState, ClimateTraits, FanMode,
    determine_action,
};
pub use select::SelectEntity;
pub use sensor::SensorEntity;
pub use switch::SwitchEntity;

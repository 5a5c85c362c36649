//! Supported air-conditioner models and their per-model feature tables
//!
//! Each model declares which select and switch entities its climate device
//! owns. The tables drive both component wiring and the published device
//! schema, so they are the single place where labels, options and icons live.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Air-conditioner platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    /// Gree units speaking the CNT UART protocol
    GreeAc,
    /// Sinclair units speaking the CNT UART protocol
    SinclairAc,
    /// Sinclair ASC-18 controller frames
    SinclairAsc18,
    /// Sinclair "type C" units with CRC16 frames
    SinclairC,
}

impl Model {
    pub const ALL: [Model; 4] = [
        Model::GreeAc,
        Model::SinclairAc,
        Model::SinclairAsc18,
        Model::SinclairC,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Model::GreeAc => "gree_ac",
            Model::SinclairAc => "sinclair_ac",
            Model::SinclairAsc18 => "sinclair_asc18",
            Model::SinclairC => "sinclair_c",
        }
    }

    /// Climate name used when the configuration does not provide one
    pub fn default_name(self) -> &'static str {
        match self {
            Model::GreeAc => "Thermostat",
            Model::SinclairAc => "climate",
            Model::SinclairAsc18 => "Sinclair ASC-18",
            Model::SinclairC => "Sinclair",
        }
    }

    /// Child entities owned by a climate device of this model
    pub fn features(self) -> &'static [FeatureSpec] {
        match self {
            Model::GreeAc => GREE_FEATURES,
            Model::SinclairAc => SINCLAIR_FEATURES,
            Model::SinclairAsc18 | Model::SinclairC => &[],
        }
    }

    pub fn feature_by_key(self, conf_key: &str) -> Option<&'static FeatureSpec> {
        self.features().iter().find(|f| f.conf_key == conf_key)
    }

    pub fn feature_spec(self, feature: Feature) -> Option<&'static FeatureSpec> {
        self.features().iter().find(|f| f.feature == feature)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Device setting controlled by a child entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    HorizontalSwing,
    VerticalSwing,
    DisplayMode,
    DisplayUnit,
    Quiet,
    Light,
    Health,
    Beeper,
    Sleep,
    Xfan,
    Powersave,
    Turbo,
}

/// One selectable option with its wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: &'static str,
    pub raw: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Select(&'static [SelectOption]),
    Switch,
}

/// Static description of a child entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSpec {
    /// Configuration key naming the entity id
    pub conf_key: &'static str,
    /// Default entity name
    pub name: &'static str,
    pub feature: Feature,
    pub kind: FeatureKind,
    /// Parent attachment point
    pub setter: &'static str,
    pub icon: Option<&'static str>,
}

impl FeatureSpec {
    pub fn options(&self) -> &'static [SelectOption] {
        match self.kind {
            FeatureKind::Select(options) => options,
            FeatureKind::Switch => &[],
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self.kind, FeatureKind::Select(_))
    }
}

const fn opt(label: &'static str, raw: u8) -> SelectOption {
    SelectOption { label, raw }
}

const fn select(
    conf_key: &'static str,
    name: &'static str,
    feature: Feature,
    options: &'static [SelectOption],
    setter: &'static str,
    icon: Option<&'static str>,
) -> FeatureSpec {
    FeatureSpec {
        conf_key,
        name,
        feature,
        kind: FeatureKind::Select(options),
        setter,
        icon,
    }
}

const fn switch(
    conf_key: &'static str,
    name: &'static str,
    feature: Feature,
    setter: &'static str,
    icon: Option<&'static str>,
) -> FeatureSpec {
    FeatureSpec {
        conf_key,
        name,
        feature,
        kind: FeatureKind::Switch,
        setter,
        icon,
    }
}

pub const GREE_HORIZONTAL_SWING: &[SelectOption] = &[
    opt("Off", 0),
    opt("Swing - Full", 1),
    opt("Constant - Left", 2),
    opt("Constant - Mid-Left", 3),
    opt("Constant - Middle", 4),
    opt("Constant - Mid-Right", 5),
    opt("Constant - Right", 6),
];

pub const GREE_VERTICAL_SWING: &[SelectOption] = &[
    opt("Off", 0),
    opt("Swing - Full", 1),
    opt("Swing - Down", 2),
    opt("Swing - Mid-Down", 3),
    opt("Swing - Middle", 4),
    opt("Swing - Mid-Up", 5),
    opt("Swing - Up", 6),
    opt("Constant - Down", 7),
    opt("Constant - Mid-Down", 8),
    opt("Constant - Middle", 9),
    opt("Constant - Mid-Up", 10),
    opt("Constant - Up", 11),
];

pub const GREE_DISPLAY: &[SelectOption] = &[
    opt("Set temperature", 2),
    opt("Actual temperature", 3),
    opt("Outside temperature", 4),
];

pub const DISPLAY_UNIT: &[SelectOption] = &[opt("C", 0), opt("F", 1)];

pub const GREE_QUIET: &[SelectOption] = &[opt("Off", 0), opt("On", 1), opt("Auto", 2)];

pub const SINCLAIR_HORIZONTAL_SWING: &[SelectOption] = &[
    opt("0 - OFF", 0),
    opt("1 - Swing - Full", 1),
    opt("2 - Constant - Left", 2),
    opt("3 - Constant - Mid-Left", 3),
    opt("4 - Constant - Middle", 4),
    opt("5 - Constant - Mid-Right", 5),
    opt("6 - Constant - Right", 6),
];

pub const SINCLAIR_VERTICAL_SWING: &[SelectOption] = &[
    opt("00 - OFF", 0),
    opt("01 - Swing - Full", 1),
    opt("02 - Swing - Down", 2),
    opt("03 - Swing - Mid-Down", 3),
    opt("04 - Swing - Middle", 4),
    opt("05 - Swing - Mid-Up", 5),
    opt("06 - Swing - Up", 6),
    opt("07 - Constant - Down", 7),
    opt("08 - Constant - Mid-Down", 8),
    opt("09 - Constant - Middle", 9),
    opt("10 - Constant - Mid-Up", 10),
    opt("11 - Constant - Up", 11),
];

pub const SINCLAIR_DISPLAY: &[SelectOption] = &[
    opt("2 - Set temperature", 2),
    opt("3 - Actual temperature", 3),
    opt("4 - Outside temperature", 4),
];

const GREE_FEATURES: &[FeatureSpec] = &[
    select(
        "horizontal_swing_select",
        "Horizontal swing",
        Feature::HorizontalSwing,
        GREE_HORIZONTAL_SWING,
        "set_horizontal_swing_select",
        Some("mdi:arrow-expand-horizontal"),
    ),
    select(
        "vertical_swing_select",
        "Vertical swing",
        Feature::VerticalSwing,
        GREE_VERTICAL_SWING,
        "set_vertical_swing_select",
        Some("mdi:arrow-expand-vertical"),
    ),
    select(
        "display_select",
        "Display mode",
        Feature::DisplayMode,
        GREE_DISPLAY,
        "set_display_select",
        Some("mdi:wrench-cog"),
    ),
    select(
        "display_unit_select",
        "Display unit",
        Feature::DisplayUnit,
        DISPLAY_UNIT,
        "set_display_unit_select",
        Some("mdi:wrench-cog"),
    ),
    select(
        "quiet_select",
        "Quiet",
        Feature::Quiet,
        GREE_QUIET,
        "set_quiet_select",
        Some("mdi:headphones"),
    ),
    switch(
        "light_switch",
        "Light",
        Feature::Light,
        "set_light_switch",
        Some("mdi:lightbulb-on-outline"),
    ),
    switch(
        "health_switch",
        "Health",
        Feature::Health,
        "set_health_switch",
        Some("mdi:pine-tree"),
    ),
    switch(
        "beeper_switch",
        "Beeper",
        Feature::Beeper,
        "set_beeper_switch",
        Some("mdi:bell-ring"),
    ),
    switch(
        "sleep_switch",
        "Sleep",
        Feature::Sleep,
        "set_sleep_switch",
        Some("mdi:power-sleep"),
    ),
    switch(
        "xfan_switch",
        "X-Fan",
        Feature::Xfan,
        "set_xfan_switch",
        Some("mdi:fan"),
    ),
    switch(
        "powersave_switch",
        "Powersave",
        Feature::Powersave,
        "set_powersave_switch",
        Some("mdi:leaf"),
    ),
    switch(
        "turbo_switch",
        "Turbo",
        Feature::Turbo,
        "set_turbo_switch",
        Some("mdi:car-turbocharger"),
    ),
];

const SINCLAIR_FEATURES: &[FeatureSpec] = &[
    select(
        "horizontal_swing_select",
        "hswing",
        Feature::HorizontalSwing,
        SINCLAIR_HORIZONTAL_SWING,
        "set_horizontal_swing_select",
        None,
    ),
    select(
        "vertical_swing_select",
        "vswing",
        Feature::VerticalSwing,
        SINCLAIR_VERTICAL_SWING,
        "set_vertical_swing_select",
        None,
    ),
    select(
        "display_select",
        "display_mode",
        Feature::DisplayMode,
        SINCLAIR_DISPLAY,
        "set_display_select",
        None,
    ),
    select(
        "display_unit_select",
        "display_unit",
        Feature::DisplayUnit,
        DISPLAY_UNIT,
        "set_display_unit_select",
        None,
    ),
    switch("light_switch", "light", Feature::Light, "set_light_switch", None),
    switch(
        "plasma_switch",
        "health",
        Feature::Health,
        "set_plasma_switch",
        None,
    ),
    switch("beeper_switch", "beeper", Feature::Beeper, "set_beeper_switch", None),
    switch("sleep_switch", "sleep", Feature::Sleep, "set_sleep_switch", None),
    switch("xfan_switch", "xfan", Feature::Xfan, "set_xfan_switch", None),
    switch(
        "save_switch",
        "powersave",
        Feature::Powersave,
        "set_save_switch",
        None,
    ),
];

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("drive.pulses_per_rev must be a nonzero multiple of two, got {value}")]
    BadPulseCount { value: u32 },
}

/// Full motion configuration for one printer.
///
/// Every constant that the firmware arithmetic depends on lives here under
/// a named field; nothing is baked into the formulas themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrinterConfig {
    #[serde(default)]
    pub drive: DriveConfig,

    #[serde(default)]
    pub extruder: ExtruderConfig,

    #[serde(default)]
    pub travel: TravelConfig,
}

/// Geometry and step-conversion constants shared by all coordinated moves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Step-line edges per full axis revolution. The drivers run 32x
    /// micro-stepping on 200-step motors (6400 microsteps per revolution),
    /// and each microstep takes two edges.
    #[serde(default = "default_pulses_per_rev")]
    pub pulses_per_rev: u32,

    /// Effective pulley radius coupling the radius slide to its motor, in
    /// plot units. `dr / pulley_radius` is the pulley rotation in radians.
    #[serde(default = "default_pulley_radius")]
    pub pulley_radius: f64,

    /// Angular sampling resolution in radians.
    #[serde(default = "default_theta_resolution")]
    pub theta_resolution: f64,
}

/// Extrusion pacing and retraction policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtruderConfig {
    /// Base extruder pulse interval in microseconds. The whole move's
    /// duration is this interval times the extrusion step goal.
    #[serde(default = "default_base_interval_us")]
    pub base_interval_us: u64,

    /// Interval reduction in microseconds per unit of current radius,
    /// applied beyond `radius_trim_threshold`. Compensates line-width
    /// variation at large radius; an acknowledged approximation, tunable.
    #[serde(default = "default_radius_trim_us")]
    pub radius_trim_us: f64,

    #[serde(default = "default_radius_trim_threshold")]
    pub radius_trim_threshold: f64,

    /// Extruder pulses dispensed per unit of chord length traveled.
    #[serde(default = "default_pulses_per_unit")]
    pub pulses_per_unit: f64,

    /// Traced samples between periodic pressure-relief retractions.
    #[serde(default = "default_retract_every")]
    pub retract_every: u32,

    /// Pulse count of a periodic retraction.
    #[serde(default = "default_retract_pulses")]
    pub retract_pulses: u32,

    /// Pulse count of the larger end-of-function retraction.
    #[serde(default = "default_end_retract_pulses")]
    pub end_retract_pulses: u32,

    /// Cadence of retraction pulses in microseconds.
    #[serde(default = "default_retract_interval_us")]
    pub retract_interval_us: u64,

    /// Pulse count of the slow retract/restore pair around flips and jogs.
    #[serde(default = "default_flip_retract_pulses")]
    pub flip_retract_pulses: u32,

    #[serde(default = "default_flip_retract_interval_us")]
    pub flip_retract_interval_us: u64,
}

/// Non-extruding motion: lifts, homing, and layer changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TravelConfig {
    /// Radius cadence for pure travel moves, in microseconds.
    #[serde(default = "default_travel_radius_interval_us")]
    pub radius_interval_us: u64,

    /// Angle cadence for pure travel moves, in microseconds.
    #[serde(default = "default_travel_theta_interval_us")]
    pub theta_interval_us: u64,

    /// Vertical pulses for the lift around jogs and flips.
    #[serde(default = "default_lift_pulses")]
    pub lift_pulses: u32,

    #[serde(default = "default_jog_lift_interval_us")]
    pub jog_lift_interval_us: u64,

    #[serde(default = "default_flip_lift_interval_us")]
    pub flip_lift_interval_us: u64,

    /// Vertical pulses of one layer advance.
    #[serde(default = "default_layer_pulses")]
    pub layer_pulses: u32,

    #[serde(default = "default_layer_interval_us")]
    pub layer_interval_us: u64,

    /// Vertical clearance raised for the whole calibration routine.
    #[serde(default = "default_clearance_pulses")]
    pub clearance_pulses: u32,

    #[serde(default = "default_clearance_interval_us")]
    pub clearance_interval_us: u64,

    /// Cadence of homing and angle-unwind pulses, in microseconds.
    #[serde(default = "default_homing_interval_us")]
    pub homing_interval_us: u64,

    /// Pulses backed off the radius endstop after it closes.
    #[serde(default = "default_homing_backoff_pulses")]
    pub homing_backoff_pulses: u32,

    /// Homing pulses allowed before giving up on the endstop.
    #[serde(default = "default_homing_pulse_budget")]
    pub homing_pulse_budget: u32,
}

fn default_pulses_per_rev() -> u32 {
    12_800
}

fn default_pulley_radius() -> f64 {
    10.0
}

fn default_theta_resolution() -> f64 {
    TAU / 200.0
}

fn default_base_interval_us() -> u64 {
    10_000
}

fn default_radius_trim_us() -> f64 {
    30.0
}

fn default_radius_trim_threshold() -> f64 {
    5.0
}

fn default_pulses_per_unit() -> f64 {
    15.0
}

fn default_retract_every() -> u32 {
    40
}

fn default_retract_pulses() -> u32 {
    15
}

fn default_end_retract_pulses() -> u32 {
    750
}

fn default_retract_interval_us() -> u64 {
    500
}

fn default_flip_retract_pulses() -> u32 {
    100
}

fn default_flip_retract_interval_us() -> u64 {
    5_000
}

fn default_travel_radius_interval_us() -> u64 {
    750
}

fn default_travel_theta_interval_us() -> u64 {
    500
}

fn default_lift_pulses() -> u32 {
    3_200
}

fn default_jog_lift_interval_us() -> u64 {
    250
}

fn default_flip_lift_interval_us() -> u64 {
    1_000
}

fn default_layer_pulses() -> u32 {
    3_200
}

fn default_layer_interval_us() -> u64 {
    500
}

fn default_clearance_pulses() -> u32 {
    6_400
}

fn default_clearance_interval_us() -> u64 {
    250
}

fn default_homing_interval_us() -> u64 {
    500
}

fn default_homing_backoff_pulses() -> u32 {
    400
}

fn default_homing_pulse_budget() -> u32 {
    200_000
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            pulses_per_rev: default_pulses_per_rev(),
            pulley_radius: default_pulley_radius(),
            theta_resolution: default_theta_resolution(),
        }
    }
}

impl Default for ExtruderConfig {
    fn default() -> Self {
        Self {
            base_interval_us: default_base_interval_us(),
            radius_trim_us: default_radius_trim_us(),
            radius_trim_threshold: default_radius_trim_threshold(),
            pulses_per_unit: default_pulses_per_unit(),
            retract_every: default_retract_every(),
            retract_pulses: default_retract_pulses(),
            end_retract_pulses: default_end_retract_pulses(),
            retract_interval_us: default_retract_interval_us(),
            flip_retract_pulses: default_flip_retract_pulses(),
            flip_retract_interval_us: default_flip_retract_interval_us(),
        }
    }
}

impl Default for TravelConfig {
    fn default() -> Self {
        Self {
            radius_interval_us: default_travel_radius_interval_us(),
            theta_interval_us: default_travel_theta_interval_us(),
            lift_pulses: default_lift_pulses(),
            jog_lift_interval_us: default_jog_lift_interval_us(),
            flip_lift_interval_us: default_flip_lift_interval_us(),
            layer_pulses: default_layer_pulses(),
            layer_interval_us: default_layer_interval_us(),
            clearance_pulses: default_clearance_pulses(),
            clearance_interval_us: default_clearance_interval_us(),
            homing_interval_us: default_homing_interval_us(),
            homing_backoff_pulses: default_homing_backoff_pulses(),
            homing_pulse_budget: default_homing_pulse_budget(),
        }
    }
}

impl DriveConfig {
    /// Step-line edges per radian of axis rotation.
    pub fn pulses_per_radian(&self) -> f64 {
        f64::from(self.pulses_per_rev) / TAU
    }

    /// Edges of a half revolution, the amount one flip rotates the plate.
    pub fn half_rev_pulses(&self) -> u32 {
        self.pulses_per_rev / 2
    }
}

impl PrinterConfig {
    /// Reject geometry the planner cannot safely divide by.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.drive.pulses_per_rev == 0 || self.drive.pulses_per_rev % 2 != 0 {
            return Err(ConfigError::BadPulseCount {
                value: self.drive.pulses_per_rev,
            });
        }
        if self.drive.pulley_radius <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "drive.pulley_radius",
                value: self.drive.pulley_radius,
            });
        }
        if self.drive.theta_resolution <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "drive.theta_resolution",
                value: self.drive.theta_resolution,
            });
        }
        if self.extruder.base_interval_us == 0 {
            return Err(ConfigError::NonPositive {
                field: "extruder.base_interval_us",
                value: 0.0,
            });
        }
        if self.extruder.pulses_per_unit <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "extruder.pulses_per_unit",
                value: self.extruder.pulses_per_unit,
            });
        }
        if self.travel.homing_pulse_budget == 0 {
            return Err(ConfigError::NonPositive {
                field: "travel.homing_pulse_budget",
                value: 0.0,
            });
        }
        Ok(())
    }
}

// Polar-delta planning: sampled deltas to coordinated step goals

use crate::axis::Direction;
use crate::config::PrinterConfig;

/// Mutable controller state threaded through one print job.
///
/// Single-writer by construction: only the path executor and the planner
/// ever touch it, strictly sequentially. The radius is always
/// non-negative; the pre-fold sign of the most recent sample is tracked
/// separately because the radius slide has no negative travel.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub radius: f64,
    pub theta: f64,
    pub radius_positive: bool,
    pub layer: u32,
    /// Fractional step remainder carried between radius goals.
    pub radius_err: f64,
    /// Fractional step remainder carried between angle goals.
    pub theta_err: f64,
    /// Accumulated signed angle pulses, for modulo-wrap bookkeeping when
    /// the plate is re-zeroed.
    pub theta_pulses: i64,
}

impl MotionState {
    pub fn new() -> Self {
        Self {
            radius: 0.0,
            theta: 0.0,
            radius_positive: true,
            layer: 0,
            radius_err: 0.0,
            theta_err: 0.0,
            theta_pulses: 0,
        }
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Step goal for a single axis within one coordinated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisGoal {
    pub steps: u32,
    pub direction: Direction,
    /// Pulse cadence in microseconds. Meaningless when `steps` is zero;
    /// such an axis is complete before the move starts and the scheduler
    /// never reads its interval.
    pub interval_us: u64,
}

impl AxisGoal {
    pub fn idle() -> Self {
        Self {
            steps: 0,
            direction: Direction::Forward,
            interval_us: 0,
        }
    }
}

/// One coordinated move across the radius, angle, and extrusion axes.
///
/// Created per sample transition and consumed immediately by the
/// scheduler; never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveGoal {
    pub radius: AxisGoal,
    pub theta: AxisGoal,
    pub extruder: AxisGoal,
}

/// Converts polar deltas into coordinated step goals, carrying the
/// fractional rounding remainder forward between calls so repeated
/// rounding never accumulates drift.
#[derive(Debug, Clone)]
pub struct DeltaPlanner {
    config: PrinterConfig,
}

impl DeltaPlanner {
    pub fn new(config: PrinterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Straight-line distance between two polar points (law of cosines).
    pub fn chord(r0: f64, t0: f64, r1: f64, t1: f64) -> f64 {
        let d2 = r1 * r1 + r0 * r0 - 2.0 * r1 * r0 * (t1 - t0).cos();
        d2.max(0.0).sqrt()
    }

    /// Plan one extruding move from the current state to `(theta, radius)`,
    /// with `radius` already folded non-negative.
    ///
    /// Updates the state's error carry: each goal is rounded against the
    /// accumulated remainder, so the emitted step total never drifts more
    /// than half a step from the exact position.
    pub fn plan_trace(&self, state: &mut MotionState, theta: f64, radius: f64) -> MoveGoal {
        let k = self.config.drive.pulses_per_radian();
        let dr = radius - state.radius;
        let dt = theta - state.theta;
        let chord = Self::chord(state.radius, state.theta, radius, theta);

        let exact_r = dr / self.config.drive.pulley_radius * k;
        let exact_t = dt * k;
        let goal_r = (exact_r - state.radius_err).round();
        let goal_t = (exact_t - state.theta_err).round();
        let goal_e = (chord * self.config.extruder.pulses_per_unit).round();
        state.radius_err += goal_r - exact_r;
        state.theta_err += goal_t - exact_t;

        self.assemble(state.radius, goal_r, goal_t, goal_e)
    }

    /// Plan a non-extruding travel move to `(theta, radius)`.
    ///
    /// Travel uses fixed cadences and does not participate in error
    /// diffusion; jogs are positioning moves, not deposition.
    pub fn plan_travel(&self, state: &MotionState, theta: f64, radius: f64) -> MoveGoal {
        let k = self.config.drive.pulses_per_radian();
        let goal_r = ((radius - state.radius) / self.config.drive.pulley_radius * k).round();
        let goal_t = ((theta - state.theta) * k).round();
        self.assemble(state.radius, goal_r, goal_t, 0.0)
    }

    /// Size directions, magnitudes, and cadences for one move.
    ///
    /// When extrusion is present the move's duration is the extruder's:
    /// `base interval x extrusion steps`, and the other axes stretch their
    /// cadence to finish in the same window. Zero-step axes get no
    /// interval at all; the scheduler treats them as already satisfied,
    /// so no cadence is ever derived by dividing by a zero goal.
    fn assemble(&self, radius_now: f64, goal_r: f64, goal_t: f64, goal_e: f64) -> MoveGoal {
        let steps_r = goal_r.abs() as u32;
        let steps_t = goal_t.abs() as u32;
        let steps_e = goal_e.abs() as u32;

        if steps_e != 0 {
            let extruder = &self.config.extruder;
            let mut interval = extruder.base_interval_us as f64;
            if radius_now > extruder.radius_trim_threshold {
                interval -= extruder.radius_trim_us * radius_now;
            }
            let interval = interval.max(1.0) as u64;
            let total = interval * u64::from(steps_e);

            MoveGoal {
                radius: AxisGoal {
                    steps: steps_r,
                    direction: Direction::from_sign(goal_r),
                    interval_us: if steps_r == 0 {
                        0
                    } else {
                        total / u64::from(steps_r)
                    },
                },
                theta: AxisGoal {
                    steps: steps_t,
                    direction: Direction::from_sign(goal_t),
                    interval_us: if steps_t == 0 {
                        0
                    } else {
                        total / u64::from(steps_t)
                    },
                },
                extruder: AxisGoal {
                    steps: steps_e,
                    direction: Direction::Forward,
                    interval_us: interval,
                },
            }
        } else {
            let travel = &self.config.travel;
            MoveGoal {
                radius: AxisGoal {
                    steps: steps_r,
                    direction: Direction::from_sign(goal_r),
                    interval_us: travel.radius_interval_us,
                },
                theta: AxisGoal {
                    steps: steps_t,
                    direction: Direction::from_sign(goal_t),
                    interval_us: travel.theta_interval_us,
                },
                extruder: AxisGoal::idle(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurveKind, PolarFunction};
    use std::f64::consts::PI;

    fn planner() -> DeltaPlanner {
        DeltaPlanner::new(PrinterConfig::default())
    }

    #[test]
    fn chord_follows_law_of_cosines() {
        // Same angle: chord is the radial difference.
        assert!((DeltaPlanner::chord(2.0, 1.0, 5.0, 1.0) - 3.0).abs() < 1e-12);
        // Quarter turn at equal radius: chord is r * sqrt(2).
        let d = DeltaPlanner::chord(3.0, 0.0, 3.0, PI / 2.0);
        assert!((d - 3.0 * 2.0_f64.sqrt()).abs() < 1e-12);
        // Coincident points.
        assert_eq!(DeltaPlanner::chord(4.0, 0.7, 4.0, 0.7), 0.0);
    }

    #[test]
    fn zero_delta_is_idempotent() {
        let planner = planner();
        let mut state = MotionState::new();
        state.radius = 3.0;
        state.theta = 1.0;
        state.radius_err = 0.3;
        state.theta_err = -0.2;

        let goal = planner.plan_trace(&mut state, 1.0, 3.0);
        assert_eq!(goal.radius.steps, 0);
        assert_eq!(goal.theta.steps, 0);
        assert_eq!(goal.extruder.steps, 0);
        assert!((state.radius_err - 0.3).abs() < 1e-12);
        assert!((state.theta_err + 0.2).abs() < 1e-12);
    }

    #[test]
    fn error_carry_stays_within_half_step() {
        let planner = planner();
        let function = PolarFunction {
            kind: CurveKind::Sine,
            amplitude: 10.0,
            frequency: 1.0,
            time_shift: 0.0,
            left_bound: 0.0,
            right_bound: PI,
            layer: 0,
        };
        let mut state = MotionState::new();
        let mut emitted_r = 0.0;
        let mut exact_r = 0.0;
        let k = planner.config().drive.pulses_per_radian();
        let pulley = planner.config().drive.pulley_radius;

        for sample in function.samples(PI / 100.0) {
            let radius = sample.radius.abs();
            exact_r += (radius - state.radius) / pulley * k;
            let goal = planner.plan_trace(&mut state, sample.theta, radius);
            let signed = match goal.radius.direction {
                Direction::Forward => f64::from(goal.radius.steps),
                Direction::Reverse => -f64::from(goal.radius.steps),
            };
            emitted_r += signed;
            state.theta = sample.theta;
            state.radius = radius;

            assert!(state.radius_err.abs() <= 0.5 + 1e-9);
            assert!(state.theta_err.abs() <= 0.5 + 1e-9);
        }

        // Cumulative drift equals the final carry: within half a step of
        // the exact position no matter how many samples were traced.
        assert!((emitted_r - exact_r).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn extrusion_total_tracks_arc_length() {
        let planner = planner();
        let function = PolarFunction {
            kind: CurveKind::Sine,
            amplitude: 10.0,
            frequency: 1.0,
            time_shift: 0.0,
            left_bound: 0.0,
            right_bound: PI,
            layer: 0,
        };
        let mut state = MotionState::new();
        let mut extruded = 0u64;
        for sample in function.samples(PI / 100.0) {
            let radius = sample.radius.abs();
            let goal = planner.plan_trace(&mut state, sample.theta, radius);
            extruded += u64::from(goal.extruder.steps);
            state.theta = sample.theta;
            state.radius = radius;
        }

        // r = 10 sin(theta) over [0, pi) is a circle of diameter 10, so
        // the path length approaches 10π; dispensed pulses approach
        // length x pulses_per_unit. Chord sampling undershoots slightly.
        let expected = 10.0 * PI * planner.config().extruder.pulses_per_unit;
        let extruded = extruded as f64;
        assert!(extruded > expected * 0.95, "extruded {extruded} vs {expected}");
        assert!(extruded < expected * 1.05, "extruded {extruded} vs {expected}");
    }

    #[test]
    fn axes_share_the_extruders_time_window() {
        let planner = planner();
        let mut state = MotionState::new();
        state.radius = 2.0;
        state.theta = 0.0;

        let goal = planner.plan_trace(&mut state, 0.3, 4.0);
        assert!(goal.radius.steps > 0);
        assert!(goal.theta.steps > 0);
        assert!(goal.extruder.steps > 0);

        let total = goal.extruder.interval_us * u64::from(goal.extruder.steps);
        assert_eq!(
            goal.radius.interval_us,
            total / u64::from(goal.radius.steps)
        );
        assert_eq!(goal.theta.interval_us, total / u64::from(goal.theta.steps));
        // Below the trim threshold the extruder runs at its base cadence.
        assert_eq!(
            goal.extruder.interval_us,
            planner.config().extruder.base_interval_us
        );
    }

    #[test]
    fn radius_trim_speeds_up_wide_lines() {
        let planner = planner();
        let mut state = MotionState::new();
        state.radius = 8.0;

        let goal = planner.plan_trace(&mut state, 0.1, 9.0);
        let expected = (10_000.0 - 30.0 * 8.0) as u64;
        assert_eq!(goal.extruder.interval_us, expected);
    }

    #[test]
    fn travel_uses_fixed_cadences() {
        let planner = planner();
        let state = MotionState::new();

        let goal = planner.plan_travel(&state, 1.0, 5.0);
        assert!(goal.radius.steps > 0);
        assert!(goal.theta.steps > 0);
        assert_eq!(goal.extruder.steps, 0);
        assert_eq!(
            goal.radius.interval_us,
            planner.config().travel.radius_interval_us
        );
        assert_eq!(
            goal.theta.interval_us,
            planner.config().travel.theta_interval_us
        );
    }

    #[test]
    fn travel_leaves_error_carry_untouched() {
        let planner = planner();
        let mut state = MotionState::new();
        state.radius_err = 0.25;
        let before = state.clone();
        planner.plan_travel(&state, 2.0, 3.0);
        assert_eq!(state, before);
    }

    #[test]
    fn pure_rotation_keeps_radius_idle() {
        let planner = planner();
        let mut state = MotionState::new();
        state.radius = 5.0;

        let goal = planner.plan_trace(&mut state, 0.5, 5.0);
        assert_eq!(goal.radius.steps, 0);
        assert_eq!(goal.radius.interval_us, 0);
        assert!(goal.theta.steps > 0);
        assert!(goal.extruder.steps > 0);
    }

    #[test]
    fn reverse_deltas_set_reverse_directions() {
        let planner = planner();
        let mut state = MotionState::new();
        state.radius = 6.0;
        state.theta = 1.0;

        let goal = planner.plan_trace(&mut state, 0.5, 4.0);
        assert_eq!(goal.radius.direction, Direction::Reverse);
        assert_eq!(goal.theta.direction, Direction::Reverse);
        assert_eq!(goal.extruder.direction, Direction::Forward);
    }
}

// Print-job orchestration

use crate::{
    axis::{AxisDriver, Direction, Endstop, Machine},
    calibrate::{CalibrationError, CalibrationRoutine},
    clock::Clock,
    config::PrinterConfig,
    curve::PolarFunction,
    plan::{DeltaPlanner, MotionState, MoveGoal},
    schedule::{execute_goal, pulse_train, MoveReport},
};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("calibration failed: {0}")]
    Calibration(#[from] CalibrationError),
}

/// Execution statistics for one traced function.
///
/// Pulse totals count coordinated moves only; collaborator motion
/// (lifts, retraction, homing) is not included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionReport {
    pub samples: usize,
    pub flips: u32,
    pub radius_pulses: u64,
    pub theta_pulses: u64,
    pub extruder_pulses: u64,
}

impl FunctionReport {
    fn absorb(&mut self, moved: &MoveReport) {
        self.radius_pulses += u64::from(moved.radius_pulses);
        self.theta_pulses += u64::from(moved.theta_pulses);
        self.extruder_pulses += u64::from(moved.extruder_pulses);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    pub functions: Vec<FunctionReport>,
}

/// Drives one full print job through the planning and scheduling pipeline.
///
/// Owns the motion state, the machine bundle, and the time source for the
/// whole job; everything runs on the caller's thread as one cooperative,
/// non-preemptible loop.
pub struct PathExecutor<C, A, E> {
    clock: C,
    machine: Machine<A>,
    endstop: E,
    planner: DeltaPlanner,
    state: MotionState,
}

impl<C, A, E> PathExecutor<C, A, E>
where
    C: Clock,
    A: AxisDriver,
    E: Endstop,
{
    pub fn new(config: PrinterConfig, clock: C, machine: Machine<A>, endstop: E) -> Self {
        Self {
            clock,
            machine,
            endstop,
            planner: DeltaPlanner::new(config),
            state: MotionState::new(),
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn machine(&self) -> &Machine<A> {
        &self.machine
    }

    pub fn into_parts(self) -> (C, Machine<A>, E) {
        (self.clock, self.machine, self.endstop)
    }

    /// Run one complete print job.
    ///
    /// Calibrates first, then traces every function in submission order.
    /// Motion state persists across the functions of a job and is
    /// re-zeroed by the next job's calibration.
    pub fn print(&mut self, functions: &[PolarFunction]) -> Result<JobReport, JobError> {
        info!(functions = functions.len(), "starting print job");
        self.machine.radius.set_enabled(true);
        self.machine.theta.set_enabled(true);
        self.machine.vertical.set_enabled(true);
        self.machine.extruder.set_enabled(true);

        CalibrationRoutine::new(self.planner.config()).run(
            &mut self.clock,
            &mut self.machine,
            &mut self.endstop,
            &mut self.state,
        )?;

        let mut report = JobReport::default();
        for (index, function) in functions.iter().enumerate() {
            info!(index, kind = ?function.kind, layer = function.layer, "plotting function");
            report.functions.push(self.run_function(function));
        }
        info!("print job complete");
        Ok(report)
    }

    fn run_function(&mut self, function: &PolarFunction) -> FunctionReport {
        let resolution = self.planner.config().drive.theta_resolution;
        let retract_every = self.planner.config().extruder.retract_every;
        let retract_pulses = self.planner.config().extruder.retract_pulses;
        let end_retract_pulses = self.planner.config().extruder.end_retract_pulses;

        let mut report = FunctionReport::default();
        let mut flip_count = 0u32;
        let mut retract_count = 0u32;

        if function.layer > self.state.layer {
            self.advance_layer();
        }

        for (index, sample) in function.samples(resolution).enumerate() {
            let positive = sample.radius >= 0.0;
            let radius = sample.radius.abs();

            if positive != self.state.radius_positive {
                self.flip_half_turn();
                flip_count += 1;
                self.state.radius_positive = positive;
            }

            if index == 0 {
                self.jog_to_start(sample.theta, radius);
            } else {
                let goal = self
                    .planner
                    .plan_trace(&mut self.state, sample.theta, radius);
                debug!(
                    sample = index,
                    theta = sample.theta,
                    radius,
                    radius_steps = goal.radius.steps,
                    theta_steps = goal.theta.steps,
                    extruder_steps = goal.extruder.steps,
                    radius_err = self.state.radius_err,
                    theta_err = self.state.theta_err,
                    "traced move"
                );
                let moved = self.execute(&goal);
                report.absorb(&moved);
            }

            self.state.theta = sample.theta;
            self.state.radius = radius;
            report.samples += 1;

            retract_count += 1;
            if retract_count > retract_every {
                self.retract(retract_pulses);
                retract_count = 0;
            }
        }

        self.retract(end_retract_pulses);
        // Flips rotated the plate without moving through angle state;
        // fold them in so the next function sees a consistent reference.
        self.state.theta += f64::from(flip_count) * PI;
        report.flips = flip_count;
        report
    }

    /// Execute one coordinated move and fold the signed angle pulses into
    /// the wrap bookkeeping, exactly once per move.
    fn execute(&mut self, goal: &MoveGoal) -> MoveReport {
        let moved = execute_goal(
            &mut self.clock,
            goal,
            &mut self.machine.radius,
            &mut self.machine.theta,
            &mut self.machine.extruder,
        );
        let signed = i64::from(moved.theta_pulses);
        self.state.theta_pulses += match goal.theta.direction {
            Direction::Forward => signed,
            Direction::Reverse => -signed,
        };
        moved
    }

    /// Travel to a function's starting point without extruding.
    ///
    /// The dispenser is retracted and lifted clear before the move and
    /// restored after, so it cannot drag through material already laid
    /// down. Skipped entirely when the start coincides with the current
    /// position.
    fn jog_to_start(&mut self, theta: f64, radius: f64) {
        let goal = self.planner.plan_travel(&self.state, theta, radius);
        if goal.radius.steps == 0 && goal.theta.steps == 0 {
            return;
        }
        debug!(theta, radius, "jogging to segment start");
        let extruder = self.planner.config().extruder;
        let travel = self.planner.config().travel;

        pulse_train(
            &mut self.clock,
            &mut self.machine.extruder,
            Direction::Reverse,
            extruder.flip_retract_pulses,
            extruder.flip_retract_interval_us,
        );
        pulse_train(
            &mut self.clock,
            &mut self.machine.vertical,
            Direction::Forward,
            travel.lift_pulses,
            travel.jog_lift_interval_us,
        );

        self.execute(&goal);

        pulse_train(
            &mut self.clock,
            &mut self.machine.extruder,
            Direction::Forward,
            extruder.flip_retract_pulses,
            extruder.flip_retract_interval_us,
        );
        pulse_train(
            &mut self.clock,
            &mut self.machine.vertical,
            Direction::Reverse,
            travel.lift_pulses,
            travel.jog_lift_interval_us,
        );
    }

    /// Realize a radius sign change by rotating the plate half a turn.
    ///
    /// The slide cannot travel negative, so the sign flips by
    /// reorientation instead: retract, lift clear, rotate π, restore.
    /// Visually discontinuous but safe for the deposited material.
    fn flip_half_turn(&mut self) {
        info!("radius sign change, flipping angle plate half a revolution");
        let extruder = self.planner.config().extruder;
        let travel = self.planner.config().travel;
        let half_rev = self.planner.config().drive.half_rev_pulses();

        pulse_train(
            &mut self.clock,
            &mut self.machine.extruder,
            Direction::Reverse,
            extruder.flip_retract_pulses,
            extruder.flip_retract_interval_us,
        );
        pulse_train(
            &mut self.clock,
            &mut self.machine.vertical,
            Direction::Forward,
            travel.lift_pulses,
            travel.flip_lift_interval_us,
        );
        pulse_train(
            &mut self.clock,
            &mut self.machine.theta,
            Direction::Forward,
            half_rev,
            travel.theta_interval_us,
        );
        self.state.theta_pulses += i64::from(half_rev);
        pulse_train(
            &mut self.clock,
            &mut self.machine.extruder,
            Direction::Forward,
            extruder.flip_retract_pulses,
            extruder.flip_retract_interval_us,
        );
        pulse_train(
            &mut self.clock,
            &mut self.machine.vertical,
            Direction::Reverse,
            travel.lift_pulses,
            travel.flip_lift_interval_us,
        );
    }

    /// One fixed vertical increment between layers.
    fn advance_layer(&mut self) {
        let travel = self.planner.config().travel;
        info!(layer = self.state.layer + 1, "advancing layer");
        pulse_train(
            &mut self.clock,
            &mut self.machine.vertical,
            Direction::Forward,
            travel.layer_pulses,
            travel.layer_interval_us,
        );
        self.state.layer += 1;
    }

    /// Reverse the extruder to relieve dispensing pressure, leaving the
    /// axis pointed forward again afterwards.
    fn retract(&mut self, pulses: u32) {
        let interval = self.planner.config().extruder.retract_interval_us;
        pulse_train(
            &mut self.clock,
            &mut self.machine.extruder,
            Direction::Reverse,
            pulses,
            interval,
        );
        self.machine.extruder.set_direction(Direction::Forward);
    }
}

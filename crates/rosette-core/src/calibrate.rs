// Homing and state zeroing

use crate::{
    axis::{AxisDriver, Direction, Endstop, Machine},
    clock::Clock,
    config::PrinterConfig,
    plan::MotionState,
    schedule::pulse_train,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("radius endstop not triggered within {budget} pulses")]
    EndstopTimeout { budget: u32 },
}

/// Homes the radius slide and re-zeros the angle plate.
///
/// Run once at the start of every print job. Raises a vertical clearance
/// for the whole routine so the dispenser cannot drag through deposited
/// material, then drives the radius slide into its endstop, backs off,
/// and unwinds any accumulated angle rotation along the shorter arc.
pub struct CalibrationRoutine<'a> {
    config: &'a PrinterConfig,
}

impl<'a> CalibrationRoutine<'a> {
    pub fn new(config: &'a PrinterConfig) -> Self {
        Self { config }
    }

    pub fn run<C, A, E>(
        &self,
        clock: &mut C,
        machine: &mut Machine<A>,
        endstop: &mut E,
        state: &mut MotionState,
    ) -> Result<(), CalibrationError>
    where
        C: Clock,
        A: AxisDriver,
        E: Endstop,
    {
        let travel = &self.config.travel;
        info!("calibrating");

        pulse_train(
            clock,
            &mut machine.vertical,
            Direction::Forward,
            travel.clearance_pulses,
            travel.clearance_interval_us,
        );

        self.home_radius(clock, machine, endstop)?;
        state.radius = 0.0;
        state.radius_err = 0.0;
        state.radius_positive = true;

        self.unwind_theta(clock, machine, state);
        state.theta = 0.0;
        state.theta_err = 0.0;
        state.theta_pulses = 0;

        pulse_train(
            clock,
            &mut machine.vertical,
            Direction::Reverse,
            travel.clearance_pulses,
            travel.clearance_interval_us,
        );

        Ok(())
    }

    /// Drive the slide into the endstop, then back off a fixed distance.
    ///
    /// Two consecutive closed reads are required before the switch counts
    /// as hit, filtering contact bounce. The sweep is bounded: a switch
    /// that never closes is an operator problem, not a reason to spin.
    fn home_radius<C, A, E>(
        &self,
        clock: &mut C,
        machine: &mut Machine<A>,
        endstop: &mut E,
    ) -> Result<(), CalibrationError>
    where
        C: Clock,
        A: AxisDriver,
        E: Endstop,
    {
        let travel = &self.config.travel;
        machine.radius.set_direction(Direction::Reverse);

        let mut consecutive = 0u32;
        let mut emitted = 0u32;
        while consecutive < 2 {
            if emitted >= travel.homing_pulse_budget {
                return Err(CalibrationError::EndstopTimeout {
                    budget: travel.homing_pulse_budget,
                });
            }
            machine.radius.emit_pulse();
            emitted += 1;
            if endstop.triggered() {
                consecutive += 1;
            } else {
                consecutive = 0;
            }
            clock.delay_us(travel.homing_interval_us);
        }
        debug!(pulses = emitted, "radius endstop found");

        clock.delay_us(100_000);
        pulse_train(
            clock,
            &mut machine.radius,
            Direction::Forward,
            travel.homing_backoff_pulses,
            travel.homing_interval_us,
        );
        Ok(())
    }

    /// Rotate the plate back to its zero reference along the shorter arc.
    fn unwind_theta<C, A>(&self, clock: &mut C, machine: &mut Machine<A>, state: &MotionState)
    where
        C: Clock,
        A: AxisDriver,
    {
        let rev = i64::from(self.config.drive.pulses_per_rev);
        let wound = state.theta_pulses.rem_euclid(rev);
        if wound == 0 {
            return;
        }
        let travel = &self.config.travel;
        debug!(pulses = wound, "unwinding angle plate");
        if wound < rev / 2 {
            pulse_train(
                clock,
                &mut machine.theta,
                Direction::Reverse,
                wound as u32,
                travel.homing_interval_us,
            );
        } else {
            pulse_train(
                clock,
                &mut machine.theta,
                Direction::Forward,
                (rev - wound) as u32,
                travel.homing_interval_us,
            );
        }
    }
}

// Cooperative pulse interleaving for coordinated moves

use crate::{
    axis::{AxisDriver, Direction},
    clock::Clock,
    plan::MoveGoal,
};

/// Per-axis transient counters for one scheduler invocation.
#[derive(Debug, Clone, Copy, Default)]
struct AxisRuntime {
    fired: u32,
    next_fire_us: u64,
}

/// Pulses actually emitted per axis during one coordinated move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveReport {
    pub radius_pulses: u32,
    pub theta_pulses: u32,
    pub extruder_pulses: u32,
}

/// Drive up to three axes through one coordinated move.
///
/// This is a priority-free round-robin busy-wait scheduler: a single
/// elapsed-time origin is taken at entry, and every polling pass checks
/// each axis against its own next-fire threshold. On fire the axis's step
/// line toggles once, its threshold advances by its own cadence, and its
/// pulse counter increments. The loop exits only when every axis has
/// reached its goal; completion is the AND of per-axis counters, never a
/// time comparison, so uneven interval rounding cannot strand pulses on a
/// slower axis. A zero-step axis is vacuously complete and its interval
/// is never read.
///
/// The cadences chosen by the planner make all participating axes finish
/// in the same wall-clock window, so in practice they complete together.
pub fn execute_goal<C: Clock, A: AxisDriver>(
    clock: &mut C,
    goal: &MoveGoal,
    radius: &mut A,
    theta: &mut A,
    extruder: &mut A,
) -> MoveReport {
    let goals = [goal.radius, goal.theta, goal.extruder];
    let mut axes: [&mut A; 3] = [radius, theta, extruder];
    let mut runtime = [AxisRuntime::default(); 3];

    for (axis, g) in axes.iter_mut().zip(&goals) {
        if g.steps > 0 {
            axis.set_direction(g.direction);
        }
    }

    let start = clock.now_us();
    loop {
        for i in 0..3 {
            if runtime[i].fired >= goals[i].steps {
                continue;
            }
            let elapsed = clock.now_us().wrapping_sub(start);
            if elapsed > runtime[i].next_fire_us {
                axes[i].emit_pulse();
                runtime[i].next_fire_us += goals[i].interval_us;
                runtime[i].fired += 1;
            }
        }
        if runtime
            .iter()
            .zip(&goals)
            .all(|(rt, g)| rt.fired >= g.steps)
        {
            break;
        }
    }

    MoveReport {
        radius_pulses: runtime[0].fired,
        theta_pulses: runtime[1].fired,
        extruder_pulses: runtime[2].fired,
    }
}

/// Emit `count` pulses on one axis at a fixed cadence.
///
/// Used for the uncoordinated collaborator moves: retraction, lifts,
/// layer changes, and homing sweeps.
pub fn pulse_train<C: Clock, A: AxisDriver>(
    clock: &mut C,
    axis: &mut A,
    direction: Direction,
    count: u32,
    interval_us: u64,
) {
    axis.set_direction(direction);
    for _ in 0..count {
        axis.emit_pulse();
        clock.delay_us(interval_us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        axis::RecordingDriver,
        clock::FakeClock,
        plan::AxisGoal,
    };

    fn goal(r: (u32, u64), t: (u32, u64), e: (u32, u64)) -> MoveGoal {
        let axis = |steps: u32, interval_us: u64| AxisGoal {
            steps,
            direction: Direction::Forward,
            interval_us,
        };
        MoveGoal {
            radius: axis(r.0, r.1),
            theta: axis(t.0, t.1),
            extruder: axis(e.0, e.1),
        }
    }

    fn run(goal: &MoveGoal, tick: u64) -> (MoveReport, [RecordingDriver; 3]) {
        let mut clock = FakeClock::new(tick);
        let mut radius = RecordingDriver::default();
        let mut theta = RecordingDriver::default();
        let mut extruder = RecordingDriver::default();
        let report = execute_goal(&mut clock, goal, &mut radius, &mut theta, &mut extruder);
        (report, [radius, theta, extruder])
    }

    #[test]
    fn every_axis_reaches_its_goal_exactly() {
        let goal = goal((5, 7), (3, 11), (9, 4));
        let (report, drivers) = run(&goal, 1);
        assert_eq!(report.radius_pulses, 5);
        assert_eq!(report.theta_pulses, 3);
        assert_eq!(report.extruder_pulses, 9);
        assert_eq!(drivers[0].pulses(), 5);
        assert_eq!(drivers[1].pulses(), 3);
        assert_eq!(drivers[2].pulses(), 9);
    }

    #[test]
    fn zero_step_axes_are_vacuously_complete() {
        let goal = goal((0, 0), (4, 3), (0, 0));
        let (report, drivers) = run(&goal, 1);
        assert_eq!(report.radius_pulses, 0);
        assert_eq!(report.theta_pulses, 4);
        assert_eq!(report.extruder_pulses, 0);
        assert!(drivers[0].events.is_empty());
        assert!(drivers[2].events.is_empty());
    }

    #[test]
    fn all_zero_goals_terminate_without_pulses() {
        let goal = goal((0, 0), (0, 0), (0, 0));
        let (report, drivers) = run(&goal, 1);
        assert_eq!(report, MoveReport::default());
        for driver in &drivers {
            assert!(driver.events.is_empty());
        }
    }

    #[test]
    fn terminates_with_coarse_clock_ticks() {
        // Tick far larger than any cadence: each pass fires each axis once.
        let goal = goal((20, 3), (10, 5), (40, 2));
        let (report, _) = run(&goal, 1_000);
        assert_eq!(report.radius_pulses, 20);
        assert_eq!(report.theta_pulses, 10);
        assert_eq!(report.extruder_pulses, 40);
    }

    #[test]
    fn direction_is_set_before_any_pulse() {
        let mut g = goal((2, 5), (0, 0), (0, 0));
        g.radius.direction = Direction::Reverse;
        let (_, drivers) = run(&g, 1);
        assert_eq!(
            drivers[0].events.first(),
            Some(&crate::axis::AxisEvent::Direction(Direction::Reverse))
        );
        assert_eq!(drivers[0].net_pulses(), -2);
    }

    #[test]
    fn matched_cadences_finish_in_the_same_window() {
        // 6 steps at 10us and 3 steps at 20us both span 60us.
        let goal = goal((6, 10), (3, 20), (0, 0));
        let (report, _) = run(&goal, 1);
        assert_eq!(report.radius_pulses, 6);
        assert_eq!(report.theta_pulses, 3);
    }

    #[test]
    fn pulse_train_emits_fixed_cadence() {
        let mut clock = FakeClock::new(1);
        let mut axis = RecordingDriver::default();
        pulse_train(&mut clock, &mut axis, Direction::Reverse, 8, 250);
        assert_eq!(axis.pulses(), 8);
        assert_eq!(axis.last_direction(), Some(Direction::Reverse));
        assert!(clock.now() >= 8 * 250);
    }
}

// Hardware traits for the stepper axes

/// Travel direction of a stepper axis.
///
/// `Forward` is outward travel for the radius slide, counter-clockwise for
/// the angle plate, up for the vertical axis, and dispensing for the
/// extruder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Direction implied by the sign of a step delta.
    pub fn from_sign(value: f64) -> Self {
        if value >= 0.0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// One independently driven stepper axis.
///
/// A pulse is a single edge on the step line; drivers latch a microstep on
/// the rising edge, so two pulses advance the motor by one microstep. All
/// step accounting in this crate is in edge units.
pub trait AxisDriver {
    fn set_direction(&mut self, direction: Direction);

    /// Toggle the step line once.
    fn emit_pulse(&mut self);

    fn set_enabled(&mut self, enabled: bool);
}

/// Digital input for the radius homing switch.
pub trait Endstop {
    fn triggered(&mut self) -> bool;
}

/// The four axes of the printer, exclusively owned as one bundle.
#[derive(Debug)]
pub struct Machine<A> {
    pub radius: A,
    pub theta: A,
    pub vertical: A,
    pub extruder: A,
}

/// Everything an [`AxisDriver`] was asked to do, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisEvent {
    Direction(Direction),
    Pulse,
    Enabled(bool),
}

/// Recording test double for an axis driver.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub events: Vec<AxisEvent>,
}

impl RecordingDriver {
    pub fn pulses(&self) -> u64 {
        self.events
            .iter()
            .filter(|e| matches!(e, AxisEvent::Pulse))
            .count() as u64
    }

    /// Net pulse count, signed by the direction in effect at each pulse.
    pub fn net_pulses(&self) -> i64 {
        let mut direction = Direction::Forward;
        let mut net = 0i64;
        for event in &self.events {
            match event {
                AxisEvent::Direction(d) => direction = *d,
                AxisEvent::Pulse => {
                    net += match direction {
                        Direction::Forward => 1,
                        Direction::Reverse => -1,
                    }
                }
                AxisEvent::Enabled(_) => {}
            }
        }
        net
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.events.iter().rev().find_map(|e| match e {
            AxisEvent::Direction(d) => Some(*d),
            _ => None,
        })
    }
}

impl AxisDriver for RecordingDriver {
    fn set_direction(&mut self, direction: Direction) {
        self.events.push(AxisEvent::Direction(direction));
    }

    fn emit_pulse(&mut self) {
        self.events.push(AxisEvent::Pulse);
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.events.push(AxisEvent::Enabled(enabled));
    }
}

/// Endstop test double that reads open until it has been polled
/// `trigger_after` times, then reads closed forever.
#[derive(Debug)]
pub struct ScriptedEndstop {
    trigger_after: u32,
    polls: u32,
}

impl ScriptedEndstop {
    pub fn new(trigger_after: u32) -> Self {
        Self {
            trigger_after,
            polls: 0,
        }
    }
}

impl Endstop for ScriptedEndstop {
    fn triggered(&mut self) -> bool {
        self.polls += 1;
        self.polls >= self.trigger_after
    }
}

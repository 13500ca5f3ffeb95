use rosette_core::axis::{AxisDriver, Direction, Machine};

/// Virtual stepper axis: counts step-line edges instead of driving pins.
#[derive(Debug)]
pub struct SimDriver {
    name: &'static str,
    direction: Direction,
    enabled: bool,
    pulses: u64,
    net_pulses: i64,
}

impl SimDriver {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            direction: Direction::Forward,
            enabled: false,
            pulses: 0,
            net_pulses: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    /// Net position in step-line edges; divide by two for microsteps.
    pub fn net_pulses(&self) -> i64 {
        self.net_pulses
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

impl AxisDriver for SimDriver {
    fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    fn emit_pulse(&mut self) {
        self.pulses += 1;
        self.net_pulses += match self.direction {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        };
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// A fresh virtual machine with one simulated driver per axis.
pub fn sim_machine() -> Machine<SimDriver> {
    Machine {
        radius: SimDriver::new("radius"),
        theta: SimDriver::new("theta"),
        vertical: SimDriver::new("vertical"),
        extruder: SimDriver::new("extruder"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_driver_tracks_position() {
        let mut driver = SimDriver::new("radius");
        driver.set_enabled(true);
        driver.set_direction(Direction::Forward);
        driver.emit_pulse();
        driver.emit_pulse();
        driver.set_direction(Direction::Reverse);
        driver.emit_pulse();

        assert!(driver.enabled());
        assert_eq!(driver.pulses(), 3);
        assert_eq!(driver.net_pulses(), 1);
    }
}

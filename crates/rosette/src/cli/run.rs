use crate::{job::JobFile, sim::sim_machine};
use anyhow::Result;
use clap::Args;
use rosette_core::{axis::ScriptedEndstop, clock::FakeClock, executor::PathExecutor};
use std::path::PathBuf;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the job file (TOML or JSON).
    pub job: PathBuf,

    /// Virtual microseconds consumed per scheduler poll.
    #[arg(long, default_value_t = 25)]
    pub tick_us: u64,

    /// Virtual homing pulses before the simulated endstop closes.
    #[arg(long, default_value_t = 1_024)]
    pub endstop_after: u32,
}

impl RunArgs {
    pub fn run(&self) -> Result<()> {
        tracing_subscriber::fmt::init();

        let job = JobFile::from_file(&self.job)?;
        job.printer.validate()?;
        let functions = job.resolve_functions();

        let clock = FakeClock::new(self.tick_us);
        let endstop = ScriptedEndstop::new(self.endstop_after);
        let mut executor = PathExecutor::new(job.printer.clone(), clock, sim_machine(), endstop);

        let report = executor.print(&functions)?;
        for (index, stats) in report.functions.iter().enumerate() {
            println!(
                "#{index}: samples={} flips={} pulses r={} t={} e={}",
                stats.samples,
                stats.flips,
                stats.radius_pulses,
                stats.theta_pulses,
                stats.extruder_pulses,
            );
        }

        let (clock, machine, _) = executor.into_parts();
        println!(
            "axes (net microsteps): radius={} theta={} vertical={} extruder={}",
            machine.radius.net_pulses() / 2,
            machine.theta.net_pulses() / 2,
            machine.vertical.net_pulses() / 2,
            machine.extruder.net_pulses() / 2,
        );
        println!("virtual time: {:.3}s", clock.now() as f64 / 1e6);
        Ok(())
    }
}

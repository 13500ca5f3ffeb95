use crate::job::JobFile;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the job file (TOML or JSON).
    pub job: PathBuf,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        let job = JobFile::from_file(&self.job)?;
        job.printer.validate()?;

        let resolution = job.printer.drive.theta_resolution;
        let mut valid = 0usize;
        for (index, spec) in job.functions.iter().enumerate() {
            match spec.resolve() {
                Ok(function) => {
                    valid += 1;
                    println!(
                        "#{index}: {:?} amplitude={} domain=[{}, {}) layer={} samples={}",
                        function.kind,
                        function.amplitude,
                        function.left_bound,
                        function.right_bound,
                        function.layer,
                        function.sample_count(resolution),
                    );
                }
                Err(err) => {
                    println!("#{index}: invalid ({err})");
                }
            }
        }

        println!("{valid} of {} functions valid", job.functions.len());
        Ok(())
    }
}

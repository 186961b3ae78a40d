//! Properties command implementation
//!
//! Lists the properties a job accepts.

use crate::core::job::{job_for_name, JOB_NAMES};
use clap::Args;

/// Arguments for the properties command
#[derive(Args, Debug)]
pub struct PropertiesArgs {
    /// Job name
    pub job: String,

    /// Print descriptors as JSON
    #[arg(long)]
    pub json: bool,
}

impl PropertiesArgs {
    /// Execute the properties command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let Some(job) = job_for_name(&self.job) else {
            eprintln!(
                "Unknown job '{}'. Available jobs: {}",
                self.job,
                JOB_NAMES.join(", ")
            );
            return Ok(2);
        };

        let descriptors = job.properties();
        if self.json {
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
        } else {
            println!("Properties for {}:", job.name());
            for descriptor in &descriptors {
                println!("  {descriptor}");
            }
        }
        Ok(0)
    }
}

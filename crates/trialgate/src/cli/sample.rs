//! `trialgate gen-sample`: write a valid data file.

use anyhow::Context;
use trialgate::sample::{default_sample_name, generate_sample};
use trialgate::TrialgateConfig;

pub fn run(settings: &TrialgateConfig, name: Option<String>) -> anyhow::Result<()> {
    let name = name.unwrap_or_else(default_sample_name);
    let path = generate_sample(&settings.sample_dir, &name)
        .with_context(|| format!("Failed to write sample {}", name))?;
    println!("sample written to {}", path.display());
    Ok(())
}

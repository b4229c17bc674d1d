use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use unreach::{NoopProgress, UnreachConfig, UnreachJsonConfig};

#[derive(Parser, Debug)]
struct CliArgs {
    #[arg(short, long, default_value = None)]
    config_path: Option<String>,
}

const DEFAULT_CONFIG_PATH: &str = "unreach.json";

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config_path = args.config_path.unwrap_or_else(|| {
        println!("no config file path provided, using default config file path");
        DEFAULT_CONFIG_PATH.to_string()
    });

    println!("reading config from path {config_path}");
    let config_str = fs::read_to_string(&config_path)
        .with_context(|| format!("reading unreach config {config_path}"))?;
    let json: UnreachJsonConfig = serde_json::from_str(&config_str)
        .with_context(|| format!("parsing unreach config {config_path}"))?;
    let config = UnreachConfig::try_from(json)
        .with_context(|| format!("validating unreach config {config_path}"))?;

    let project_root = Path::new(&config_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    println!("analyzing {}..", project_root.display());
    let start_time = std::time::Instant::now();
    let result = unreach::analyze(project_root, &config, true, &NoopProgress)
        .with_context(|| format!("analyzing {}", project_root.display()))?;
    let delta = start_time.elapsed();
    println!("result ({}ms):\n{result}", delta.as_millis());

    Ok(())
}

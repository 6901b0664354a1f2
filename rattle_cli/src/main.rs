use rattle_core::config::{GeneratorSettings, HarnessConfig};
use rattle_core::executor::{CommandExecutor, CommandExecutorConfig};
use rattle_core::fuzzer::Fuzzer;
use rattle_core::generator::GenerationPolicy;

use clap::Parser;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    #[clap(long)]
    target: Option<PathBuf>,
    #[clap(short, long)]
    iterations: Option<u64>,
    #[clap(short, long)]
    seed: Option<u64>,
    #[clap(short, long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match cli.config_file {
        Some(config_path) => {
            println!("Loading configuration from specified path: {config_path:?}");
            HarnessConfig::load_from_file(&config_path)?
        }
        None => {
            let default_config_path = PathBuf::from("rattle.toml");
            if default_config_path.exists() {
                println!(
                    "No config file specified via CLI, loading default: {default_config_path:?}",
                );
                HarnessConfig::load_from_file(&default_config_path)?
            } else {
                HarnessConfig::default()
            }
        }
    };

    if let Some(iterations) = cli.iterations {
        config
            .fuzzer
            .get_or_insert_with(Default::default)
            .max_iterations = iterations;
    }
    if let Some(seed) = cli.seed {
        config.fuzzer.get_or_insert_with(Default::default).seed = Some(seed);
    }
    if let Some(target) = cli.target {
        config.executor.target = Some(target);
    }

    let target = config.executor.target.clone().ok_or_else(|| {
        anyhow::anyhow!("no target executable configured; pass --target or set executor.target")
    })?;

    let policy = match &config.generator {
        GeneratorSettings::UniformRandom { min, max } => {
            GenerationPolicy::uniform_random(*min, *max)?
        }
        GeneratorSettings::FileSample { path } => GenerationPolicy::file_sample(path),
        GeneratorSettings::Mutate { base } => GenerationPolicy::mutate_base(base.clone())?,
    };

    let executor = CommandExecutor::new(CommandExecutorConfig {
        target,
        timeout: config.executor.timeout_ms.map(Duration::from_millis),
        artifact_dir: config.executor.artifact_dir.clone(),
        preserve_failures: config.executor.preserve_failures,
    });

    let fuzzer_settings = config.fuzzer.clone().unwrap_or_default();
    let seed = fuzzer_settings
        .seed
        .unwrap_or_else(|| rand::rng().random());
    println!("Using RNG seed {seed} (pass --seed {seed} to reproduce this run)");
    let rng = ChaCha8Rng::seed_from_u64(seed);

    let mut fuzzer = Fuzzer::new(policy, executor, rng);

    println!(
        "Starting fuzz loop for {} iterations...",
        fuzzer_settings.max_iterations
    );
    let report = fuzzer.run(fuzzer_settings.max_iterations);

    let summary = report.summary();
    println!(
        "Fuzz loop finished: {} tests, {} failures, {:.2}s total target time",
        summary.total_tests, summary.total_crashes, summary.total_time_secs
    );

    if let Some(report_path) = cli.report {
        report.save(&report_path)?;
        println!("Report saved as {report_path:?}");
    }

    Ok(())
}

//! s3 - run governance scenarios and audit transparency logs
//!
//! - `s3 run` coordinates every scenario in a JSON file and emits the
//!   per-scenario records
//! - `s3 verify` checks an exported transparency log
//! - `s3 classify` prints the consent level for a driver profile

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use s3_coordinator::{success_rate, Coordinator, ScenarioRecord};
use s3_ledger::{verify_entries, LogEntry};
use s3_types::{classify, DriverType, ScenarioDescriptor};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::S3Config;

#[derive(Parser)]
#[command(name = "s3", about = "S3 governance protocol runner")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "S3_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "S3_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Coordinate every scenario in a JSON file
    Run {
        /// JSON array of scenario descriptors
        #[arg(short, long)]
        scenarios: PathBuf,

        /// Write result records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export every agent's full transparency log into this directory
        #[arg(long)]
        logs_dir: Option<PathBuf>,
    },

    /// Verify an exported transparency log
    Verify {
        #[arg(short, long)]
        log: PathBuf,
    },

    /// Print the consent level for a driver profile
    Classify {
        #[arg(short = 't', long = "type")]
        driver_type: DriverType,

        #[arg(short, long, allow_hyphen_values = true)]
        urgency: i32,

        #[arg(long, default_value_t = 1)]
        scope_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = S3Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json {
        config.logging.json = true;
    }
    init_tracing(&config);

    match cli.command {
        Commands::Run {
            scenarios,
            output,
            logs_dir,
        } => run(&config, &scenarios, output.as_deref(), logs_dir.as_deref())
            .await
            .map(|_| ()),
        Commands::Verify { log } => verify(&log),
        Commands::Classify {
            driver_type,
            urgency,
            scope_size,
        } => {
            println!("{}", classify(driver_type, urgency, scope_size));
            Ok(())
        }
    }
}

fn init_tracing(config: &S3Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(
    config: &S3Config,
    scenarios: &Path,
    output: Option<&Path>,
    logs_dir: Option<&Path>,
) -> Result<Vec<ScenarioRecord>> {
    let raw = fs::read_to_string(scenarios)
        .with_context(|| format!("reading {}", scenarios.display()))?;
    let descriptors: Vec<ScenarioDescriptor> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", scenarios.display()))?;

    let coordinator = Coordinator::with_local_network(
        config.coordinator.membership.clone(),
        config.governance.clone(),
        config.coordinator.membership_mode,
    );

    let mut records: Vec<ScenarioRecord> = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        match coordinator.coordinate_scenario(descriptor).await {
            Ok(result) => records.push(result.into_record()),
            Err(e) => {
                warn!(scenario_id = %descriptor.id, error = %e, "Scenario failed");
                records.push(ScenarioRecord::failed(descriptor));
            }
        }
    }

    let rendered = serde_json::to_string_pretty(&records)?;
    match output {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{rendered}"),
    }

    if let Some(dir) = logs_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for robot_id in coordinator.membership() {
            let Some(handle) = coordinator.agent(robot_id) else {
                continue;
            };
            let log = handle.log_reader().snapshot().await;
            let path = dir.join(format!("{robot_id}.json"));
            fs::write(&path, log.export_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }

    let achieved = records.iter().filter(|r| r.consent_achieved).count();
    info!(
        scenarios = records.len(),
        achieved,
        success_rate = success_rate(&records),
        "Run complete"
    );

    coordinator.shutdown().await;
    Ok(records)
}

fn verify(path: &Path) -> Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let entries: Vec<LogEntry> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    match verify_entries(&entries) {
        Ok(()) => {
            let robot = entries
                .first()
                .map(|e| e.robot_id.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("ok: {} entries for {robot}", entries.len());
            Ok(())
        }
        Err(e) => {
            warn!(log = %path.display(), error = %e, "Transparency log failed verification");
            bail!("{}: {e}", path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3_coordinator::MembershipMode;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
    }

    #[tokio::test]
    async fn run_writes_records_and_verifiable_logs() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("records.json");
        let logs = dir.path().join("logs");

        let records = run(
            &S3Config::default(),
            &fixture("scenarios.json"),
            Some(&output),
            Some(&logs),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.consent_achieved));

        let written: Vec<ScenarioRecord> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, records);

        for i in 1..=5 {
            assert!(verify(&logs.join(format!("robot_{i}.json"))).is_ok());
        }
    }

    #[tokio::test]
    async fn tampered_log_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        run(
            &S3Config::default(),
            &fixture("scenarios.json"),
            Some(&dir.path().join("records.json")),
            Some(&logs),
        )
        .await
        .unwrap();

        let path = logs.join("robot_1.json");
        let mut entries: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        entries[0]["details"]["urgency"] = serde_json::json!(10);
        fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        assert!(verify(&path).is_err());
    }

    #[tokio::test]
    async fn failed_scenario_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let scenarios = dir.path().join("scenarios.json");
        fs::write(
            &scenarios,
            r#"[
                {"id": "s-ghost", "description": "move pallet", "urgency": 4,
                 "impact_scope": ["robot_1", "robot_9"]},
                {"id": "s-ok", "description": "move pallet", "urgency": 4,
                 "impact_scope": ["robot_1"]}
            ]"#,
        )
        .unwrap();

        let mut config = S3Config::default();
        config.coordinator.membership_mode = MembershipMode::Strict;

        let records = run(&config, &scenarios, Some(&dir.path().join("out.json")), None)
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].scenario_id, "s-ghost");
        assert!(!records[0].consent_achieved);
        assert!(records[0].logs.is_empty());
        assert!(records[1].consent_achieved);
    }
}

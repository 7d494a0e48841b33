//! dcqc CLI - quality control stages for file pipelines.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dcqc_core::{LogArtifactPaths, QcConfig};
use dcqc_quality::StageEngine;
use dcqc_storage::LocalBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dcqc")]
#[command(about = "Quality control for file pipelines", long_about = None)]
struct Cli {
    /// Root of the local blob mirror
    #[arg(long, global = true, env = "DCQC_BLOB_ROOT", default_value = "blobs")]
    blob_root: PathBuf,

    /// Directory where target files are staged
    #[arg(long, global = true, env = "DCQC_STAGING_DIR", default_value = ".")]
    staging_dir: PathBuf,

    /// Directory holding the logs of external commands
    #[arg(long, global = true, env = "DCQC_LOG_DIR", default_value = ".")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one target document per manifest row
    PrepareTargets {
        /// CSV manifest with a `uri` column
        manifest: PathBuf,
        /// Output directory
        #[arg(long, default_value = "targets")]
        output_dir: PathBuf,
    },
    /// Stage the files of a target into the staging directory
    StageTarget {
        /// Target document
        target: PathBuf,
    },
    /// Write one test document per suite test
    PrepareTests {
        /// Target document
        target: PathBuf,
        /// Output directory
        #[arg(long, default_value = "tests")]
        output_dir: PathBuf,
    },
    /// Write the command document of an external test
    PrepareCmd {
        /// Test document
        test: PathBuf,
        /// Command document path
        #[arg(long, default_value = "command.json")]
        output: PathBuf,
    },
    /// Run an internal test
    RunTest {
        /// Test document
        test: PathBuf,
        /// Updated test document path
        #[arg(long)]
        output: PathBuf,
    },
    /// Decide an external test from its logs
    InterpretCmd {
        /// Test document
        test: PathBuf,
        /// Updated test document path
        #[arg(long)]
        output: PathBuf,
    },
    /// Reassemble one target's tests into a report
    TargetReport {
        /// Report path
        #[arg(long)]
        output: PathBuf,
        /// Test documents of a single target
        #[arg(required = true)]
        tests: Vec<PathBuf>,
    },
    /// Concatenate target reports
    CompileReports {
        /// Compiled report path
        #[arg(long)]
        output: PathBuf,
        /// Reports to concatenate, in order
        #[arg(required = true)]
        reports: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = QcConfig {
        staging_dir: cli.staging_dir,
        log_artifacts: LogArtifactPaths::in_dir(&cli.log_dir),
    };
    let store = Arc::new(LocalBlobStore::new(&cli.blob_root));
    let engine = StageEngine::new(store, config);

    match cli.command {
        Commands::PrepareTargets { manifest, output_dir } => {
            for path in engine.prepare_targets(&manifest, &output_dir).await? {
                println!("{}", path.display());
            }
        }
        Commands::StageTarget { target } => {
            let staging_dir = engine.config().staging_dir.clone();
            for path in engine.stage_target(&target, &staging_dir).await? {
                println!("{}", path.display());
            }
        }
        Commands::PrepareTests { target, output_dir } => {
            for path in engine.prepare_tests(&target, &output_dir).await? {
                println!("{}", path.display());
            }
        }
        Commands::PrepareCmd { test, output } => {
            let command = engine.prepare_cmd(&test, &output).await?;
            println!("{}", command.command_string);
        }
        Commands::RunTest { test, output } => {
            let status = engine.run_test(&test, &output).await?;
            println!("{}", status);
        }
        Commands::InterpretCmd { test, output } => {
            let status = engine.interpret_cmd(&test, &output).await?;
            println!("{}", status);
        }
        Commands::TargetReport { output, tests } => {
            let passed = engine.target_report(&output, &tests).await?;
            println!("{}", if passed { "PASS" } else { "FAIL" });
        }
        Commands::CompileReports { output, reports } => {
            let count = engine.compile_reports(&output, &reports).await?;
            info!("Wrote {} suites to {}", count, output.display());
        }
    }

    Ok(())
}

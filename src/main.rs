//! import-volume
//!
//! Imports a pre-existing CSI volume into Kubernetes: reads a
//! PersistentVolumeClaim manifest, derives the volume handle from the
//! driver's template and the `-p key=value` parameters, then creates the
//! matching PersistentVolume and the claim.
//!
//! ```text
//! import-volume -f claim.yaml -n apps -p pool=replicapool -p image=csi-vol-01
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use volume_importer::config::{parse_key_value, DEFAULT_NAMESPACE, DEFAULT_TEMPLATE_DIR};
use volume_importer::{load_claim, ImportPlan, ImportRequest, ImporterConfig, VolumeImporter};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Import an existing CSI volume as a PersistentVolume and PersistentVolumeClaim
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the kubeconfig file; without it the client is inferred from
    /// the environment, including multi-path KUBECONFIG lists
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Namespace to create the PersistentVolumeClaim in
    #[arg(short, long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// File that contains the PersistentVolumeClaim definition
    #[arg(short = 'f', long)]
    filename: PathBuf,

    /// Parameters identifying the volume to import (key=value, repeatable or comma-separated)
    #[arg(short = 'p', long = "parameters", value_parser = parse_key_value, value_delimiter = ',')]
    parameters: Vec<(String, String)>,

    /// Directory holding one volume handle template per CSI driver
    #[arg(long, env = "IMPORT_VOLUME_TEMPLATE", default_value = DEFAULT_TEMPLATE_DIR)]
    template_dir: PathBuf,

    /// Print the resolved objects instead of creating them
    #[arg(long)]
    dry_run: bool,

    /// Output format for --dry-run
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

impl Args {
    fn importer_config(&self) -> ImporterConfig {
        ImporterConfig {
            kubeconfig: self.kubeconfig.clone(),
            namespace: self.namespace.clone(),
            template_dir: self.template_dir.clone(),
            dry_run: self.dry_run,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.importer_config();

    info!("Starting volume importer");
    info!("  Version: {}", volume_importer::VERSION);
    info!("  Claim file: {}", args.filename.display());
    info!("  Namespace: {}", config.namespace);
    info!("  Dry run: {}", config.dry_run);

    let (importer, plan) = prepare(&args, &config)
        .await
        .context("Failed to start importer")?;

    if config.dry_run {
        print_plan(&plan, args.output)?;
        return Ok(());
    }

    importer
        .apply(plan)
        .await
        .with_context(|| format!("Failed to import {:?}", args.filename))?;

    Ok(())
}

/// Connect, read the claim and resolve everything needed for the import
async fn prepare(
    args: &Args,
    config: &ImporterConfig,
) -> volume_importer::Result<(VolumeImporter, ImportPlan)> {
    let importer = VolumeImporter::from_config(config).await?;
    let claim = load_claim(&args.filename).await?;

    let request = ImportRequest {
        claim,
        parameters: args.parameters.iter().cloned().collect(),
    };
    let plan = importer.plan(request).await?;
    Ok((importer, plan))
}

fn print_plan(plan: &ImportPlan, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&plan.volume)?);
            println!("---");
            print!("{}", serde_yaml::to_string(&plan.claim)?);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(plan)?);
        }
    }
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "kube=info", "tower=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // stdout is reserved for --dry-run output
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

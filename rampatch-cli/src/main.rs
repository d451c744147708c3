use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use fs_err as fs;
use rampatch_archive::{load_dir, persist_changes};
use rampatch_cli::config::{self, ConfigMerger};
use rampatch_cli::report::{PatchReport, render_patch};
use rampatch_domain::{SkinVariant, VARIANTS, Variant};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rampatch",
    version,
    about = "Patch extracted Android ramdisks for booting from a secondary slot."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a variant pipeline over an extracted ramdisk (default: dry-run).
    Patch(PatchArgs),
    /// List available variant pipelines.
    List(ListArgs),
    /// Show the steps a variant pipeline runs.
    Explain(ExplainArgs),
    /// Report which low-power-mode script generation a ramdisk carries.
    Detect(DetectArgs),
}

#[derive(Debug, Parser)]
struct PatchArgs {
    /// Directory holding the extracted ramdisk.
    #[arg(long)]
    ramdisk: Utf8PathBuf,

    /// Pipeline identifier (default: [patch].variant from rampatch.toml).
    #[arg(long)]
    variant: Option<String>,

    /// Config file (default: rampatch.toml next to the ramdisk directory).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Write changes back to the ramdisk. If omitted, only the diff is printed.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Do not back up entries before overwriting them.
    #[arg(long, default_value_t = false)]
    no_backup: bool,

    /// Write a JSON run report to this file.
    #[arg(long)]
    report: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ListArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Pipeline identifier, e.g. "jflte/AOSP/AOSP".
    variant: String,
}

#[derive(Debug, Parser)]
struct DetectArgs {
    /// Directory holding the extracted ramdisk.
    #[arg(long)]
    ramdisk: Utf8PathBuf,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Patch(args) => cmd_patch(args),
        Command::List(args) => cmd_list(args).map(|()| ExitCode::SUCCESS),
        Command::Explain(args) => cmd_explain(args).map(|()| ExitCode::SUCCESS),
        Command::Detect(args) => cmd_detect(args).map(|()| ExitCode::SUCCESS),
    }
}

fn cmd_patch(args: PatchArgs) -> anyhow::Result<ExitCode> {
    let file_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(&args.ramdisk).context("load rampatch.toml config")?,
    };
    let merged =
        ConfigMerger::new(file_config).merge_patch_args(args.variant, args.apply, args.no_backup);
    debug!(
        "merged config: variant={:?}, apply={}, backup_suffix={:?}",
        merged.variant, merged.apply, merged.backup_suffix
    );

    let variant_id = merged
        .variant
        .context("no variant given (use --variant or [patch].variant in rampatch.toml)")?;
    let variant = Variant::from_id(&variant_id).with_context(|| {
        format!("unknown variant {variant_id} (see `rampatch list`)")
    })?;

    let before = load_dir(&args.ramdisk)
        .with_context(|| format!("load ramdisk from {}", args.ramdisk))?;
    let mut after = before.clone();

    let outcome = {
        let mut pipeline = variant.pipeline(&mut after, &merged.pipeline);
        pipeline.patch()
    };

    match outcome {
        Ok(()) => {
            print!("{}", render_patch(&before, &after));

            if merged.apply {
                let backups = merged
                    .backup_suffix
                    .as_deref()
                    .map(|suffix| config::backup_dir(&args.ramdisk, suffix))
                    .transpose()?;
                let written =
                    persist_changes(&args.ramdisk, &before, &after, backups.as_deref())
                        .with_context(|| format!("write ramdisk {}", args.ramdisk))?;
                if let Some(dir) = &backups {
                    info!("originals backed up under {}", dir);
                }
                info!("wrote {} entries to {}", written.len(), args.ramdisk);
            } else {
                info!("dry run; {} left untouched", args.ramdisk);
            }

            if let Some(path) = &args.report {
                let report = PatchReport::new(variant.id(), &before, &after, Ok(()), merged.apply);
                write_json(path, &report)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) => {
            error!(
                step = failure.step.as_str(),
                kind = failure.error.kind().as_str(),
                path = failure.error.path(),
                "pipeline failed; nothing written"
            );
            eprintln!("error: {failure}");
            if let Some(path) = &args.report {
                let report = PatchReport::new(variant.id(), &before, &after, Err(&failure), false);
                write_json(path, &report)?;
            }
            Ok(ExitCode::from(2))
        }
    }
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    match args.format {
        OutputFormat::Text => {
            for meta in VARIANTS {
                println!("{:<36} {}", meta.id, meta.title);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(VARIANTS).context("serialize variants")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    let variant = Variant::from_id(&args.variant).with_context(|| {
        format!("unknown variant {} (see `rampatch list`)", args.variant)
    })?;
    let meta = variant.meta();

    println!("{}", meta.id);
    println!("{}", meta.title);
    println!();
    println!("{}", meta.description);
    println!();
    println!("Steps:");
    for (i, step) in meta.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
    Ok(())
}

fn cmd_detect(args: DetectArgs) -> anyhow::Result<()> {
    let archive = load_dir(&args.ramdisk)
        .with_context(|| format!("load ramdisk from {}", args.ramdisk))?;
    let skin = SkinVariant::detect(&archive);
    match args.format {
        OutputFormat::Text => println!("{} ({})", skin.as_str(), skin.script()),
        OutputFormat::Json => {
            let json = serde_json::json!({ "skin": skin, "script": skin.script() });
            println!("{json}");
        }
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &camino::Utf8Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    fs::write(path, json).with_context(|| format!("write {}", path))
}

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use fs_err as fs;
use rampatch_domain::{VARIANTS, Variant};
use std::process::Command as ProcessCommand;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the variant catalog as JSON.
    PrintVariants,
    /// Write a small jflte-style ramdisk to try the CLI against.
    SeedRamdisk {
        #[arg(long, default_value = "target/sample-ramdisk")]
        dir: Utf8PathBuf,
        /// Seed the legacy charger script (MSM8960_lpm.rc) instead of lpm.rc.
        #[arg(long)]
        legacy: bool,
    },
    /// Bless golden fixtures (overwrite expected patch previews).
    BlessFixtures,
    /// Check that every fixture names a known variant and has its expected outputs.
    CheckFixtures,
}

const SAMPLE_INIT_RC: &str = "\
on early-init
    start ueventd

on charger
    mount ext4 /dev/block/platform/msm_sdcc.1/by-name/system /system ro
    class_start charger
";

const SAMPLE_TARGET_RC: &str = "\
on fs
    mount_all fstab.qcom
    mount ext4 /dev/block/platform/msm_sdcc.1/by-name/cache /cache nosuid nodev barrier=1
";

const SAMPLE_FSTAB: &str = "\
/dev/block/platform/msm_sdcc.1/by-name/system /system ext4 ro,barrier=1 wait
/dev/block/platform/msm_sdcc.1/by-name/userdata /data ext4 nosuid,nodev,barrier=1 wait,check
";

const SAMPLE_FILE_CONTEXTS: &str = "\
/system(/.*)?\t\tu:object_r:system_file:s0
/data(/.*)?\t\tu:object_r:system_data_file:s0
";

const SAMPLE_LPM_RC: &str = "\
on fs
    mount_all fstab.qcom
    wait /dev/block/platform/msm_sdcc.1/by-name/cache
    mount ext4 /dev/block/platform/msm_sdcc.1/by-name/cache /cache nosuid nodev barrier=1
";

fn seed_ramdisk(dir: &Utf8Path, legacy: bool) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {dir}"))?;
    let lpm = if legacy { "MSM8960_lpm.rc" } else { "lpm.rc" };
    for (name, contents) in [
        ("init.rc", SAMPLE_INIT_RC),
        ("init.target.rc", SAMPLE_TARGET_RC),
        ("fstab.qcom", SAMPLE_FSTAB),
        ("file_contexts", SAMPLE_FILE_CONTEXTS),
        (lpm, SAMPLE_LPM_RC),
    ] {
        fs::write(dir.join(name), contents)?;
    }
    println!("seeded {dir} ({lpm})");
    Ok(())
}

fn fixtures_root() -> anyhow::Result<Utf8PathBuf> {
    let manifest_dir = Utf8Path::new(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .context("xtask has no parent directory")?;
    Ok(root.join("tests").join("fixtures"))
}

fn check_fixtures() -> anyhow::Result<()> {
    let root = fixtures_root()?;
    let mut problems = Vec::new();
    let mut count = 0usize;

    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        count += 1;
        let dir = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        match fs::read_to_string(dir.join("variant.txt")) {
            Ok(id) if Variant::from_id(id.trim()).is_some() => {}
            Ok(id) => problems.push(format!("{name}: unknown variant '{}'", id.trim())),
            Err(_) => problems.push(format!("{name}: missing variant.txt")),
        }
        if !dir.join("ramdisk").is_dir() {
            problems.push(format!("{name}: missing ramdisk/"));
        }
        for expected in ["outcome.txt", "patch.diff"] {
            if !dir.join("expected").join(expected).is_file() {
                problems.push(format!("{name}: missing expected/{expected}"));
            }
        }
    }

    if !problems.is_empty() {
        for p in &problems {
            eprintln!("{p}");
        }
        anyhow::bail!("{} fixture problem(s)", problems.len());
    }
    println!("{count} fixture(s) ok");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintVariants => {
            let json = serde_json::to_string_pretty(VARIANTS)?;
            println!("{json}");
        }
        Command::SeedRamdisk { dir, legacy } => seed_ramdisk(&dir, legacy)?,
        Command::BlessFixtures => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "rampatch", "--test", "golden_fixtures"])
                .env("RAMPATCH_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                anyhow::bail!("bless-fixtures failed");
            }
        }
        Command::CheckFixtures => check_fixtures()?,
    }
    Ok(())
}

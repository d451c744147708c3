//! Configuration file loading for rampatch.
//!
//! Discovers and loads `rampatch.toml` next to the ramdisk directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use rampatch_domain::PipelineConfig;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "rampatch.toml";

/// Top-level configuration from rampatch.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RampatchConfig {
    /// Pipeline selection and run behaviour.
    pub patch: PatchSection,

    /// Backup settings.
    pub backups: BackupsConfig,

    /// Overrides for the Qualcomm platform fixups.
    pub platform: PlatformSection,

    /// Overrides for the charger-mode service.
    pub charger: ChargerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatchSection {
    /// Pipeline identifier, e.g. `jflte/AOSP/AOSP`.
    pub variant: Option<String>,

    /// Write changes back to the ramdisk directory.
    pub apply: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupsConfig {
    /// Whether to back up entries before overwriting them.
    pub enabled: bool,

    /// Suffix appended to the ramdisk directory name to form the sibling backup directory.
    pub suffix: String,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            suffix: ".rampatch.bak".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    pub script: Option<String>,
    pub static_fstab: Option<String>,
    pub generated_fstab: Option<String>,
    pub cache_line: Option<String>,
    pub cache_skip_devices: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChargerSection {
    pub init_rc: Option<String>,
    pub service: Option<String>,
    pub fstab: Option<String>,
    pub wait_secs: Option<u32>,
}

/// Discover rampatch.toml in the directory containing the ramdisk.
pub fn discover_config(ramdisk: &Utf8Path) -> Option<Utf8PathBuf> {
    let dir = ramdisk.parent().unwrap_or(ramdisk);
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a rampatch.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<RampatchConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<RampatchConfig> {
    let config: RampatchConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config next to the ramdisk, or return default if not found.
pub fn load_or_default(ramdisk: &Utf8Path) -> anyhow::Result<RampatchConfig> {
    match discover_config(ramdisk) {
        Some(path) => load_config(&path),
        None => Ok(RampatchConfig::default()),
    }
}

/// Sibling directory that receives backups for `ramdisk`: `<parent>/<ramdisk name><suffix>`.
pub fn backup_dir(ramdisk: &Utf8Path, suffix: &str) -> anyhow::Result<Utf8PathBuf> {
    if suffix.is_empty() {
        anyhow::bail!("[backups].suffix must not be empty");
    }
    let ramdisk = ramdisk
        .canonicalize_utf8()
        .with_context(|| format!("resolve ramdisk directory {}", ramdisk))?;
    let name = ramdisk
        .file_name()
        .with_context(|| format!("ramdisk directory {} has no name", ramdisk))?;
    let parent = ramdisk
        .parent()
        .with_context(|| format!("ramdisk directory {} has no parent", ramdisk))?;
    Ok(parent.join(format!("{name}{suffix}")))
}

/// Settings for one `patch` run after merging file config and CLI flags.
#[derive(Debug, Clone)]
pub struct MergedPatchConfig {
    pub variant: Option<String>,
    pub apply: bool,
    /// `None` when backups are disabled.
    pub backup_suffix: Option<String>,
    pub pipeline: PipelineConfig,
}

/// Merges config file settings with CLI arguments.
pub struct ConfigMerger {
    file_config: RampatchConfig,
}

impl ConfigMerger {
    pub fn new(file_config: RampatchConfig) -> Self {
        Self { file_config }
    }

    /// CLI `--variant` wins over `[patch].variant`; `--apply` and `--no-backup` can only turn
    /// their behaviour on.
    pub fn merge_patch_args(
        self,
        variant: Option<String>,
        apply: bool,
        no_backup: bool,
    ) -> MergedPatchConfig {
        let RampatchConfig {
            patch,
            backups,
            platform,
            charger,
        } = self.file_config;

        let mut pipeline = PipelineConfig::default();
        if let Some(script) = platform.script {
            pipeline.platform.script = script;
        }
        if let Some(fstab) = platform.static_fstab {
            pipeline.platform.static_fstab = fstab;
        }
        if let Some(fstab) = platform.generated_fstab {
            pipeline.platform.generated_fstab = fstab;
        }
        if let Some(line) = platform.cache_line {
            pipeline.platform.cache_line = line;
        }
        if let Some(devices) = platform.cache_skip_devices {
            pipeline.platform.cache_skip_devices = devices;
        }
        if let Some(init_rc) = charger.init_rc {
            pipeline.charger.init_rc = init_rc;
        }
        if let Some(service) = charger.service {
            pipeline.charger.service = service;
        }
        if let Some(fstab) = charger.fstab {
            pipeline.charger.fstab = fstab;
        }
        if let Some(secs) = charger.wait_secs {
            pipeline.charger.wait_secs = secs;
        }

        let backup_suffix = (backups.enabled && !no_backup).then_some(backups.suffix);

        MergedPatchConfig {
            variant: variant.or(patch.variant),
            apply: apply || patch.apply,
            backup_suffix,
            pipeline,
        }
    }
}

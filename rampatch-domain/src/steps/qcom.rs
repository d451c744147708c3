//! Qualcomm platform fixups: cache mounts and the generated fstab.

use super::PatchStep;
use rampatch_archive::Archive;
use rampatch_edit::{
    PatchError, PatchResult, line_regex, read_lines, remove_matching, replace_matching,
    write_lines,
};
use regex::bytes::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// `[# comment]<device> <mount point> <type> <flags> <fs_mgr flags>`
static FSTAB_LINE: LazyLock<Regex> = LazyLock::new(|| {
    line_regex(r"^(#.+)?(/dev/\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)").expect("valid fstab regex")
});

static MANUAL_CACHE_MOUNT: LazyLock<Regex> = LazyLock::new(|| {
    line_regex(r"^\s*mount\s+\S+\s+\S+\s+/cache(\s|$)").expect("valid cache mount regex")
});

/// `fstab.<device>` at the archive root. Names with a further `.` (`fstab.qcom.gen`, backups)
/// are not fstabs the stock init scripts load.
fn is_fstab_entry(name: &str) -> bool {
    !name.contains('/')
        && name
            .strip_prefix("fstab.")
            .is_some_and(|device| !device.is_empty() && !device.contains('.'))
}

/// Entry names and the synthetic cache line used by [`QcomFixups`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Init script holding the platform's `mount_all` and manual mounts.
    pub script: String,
    /// Fstab referenced by the stock init scripts.
    pub static_fstab: String,
    /// Fstab written at boot by the multiboot mount helper.
    pub generated_fstab: String,
    /// Line appended to fstabs that never mount `/cache`.
    pub cache_line: String,
    /// Devices whose presence in an fstab suppresses the cache line.
    pub cache_skip_devices: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            script: "init.target.rc".to_string(),
            static_fstab: "fstab.qcom".to_string(),
            generated_fstab: "fstab.qcom.gen".to_string(),
            cache_line: "/dev/block/platform/msm_sdcc.1/by-name/cache /cache ext4 nosuid,nodev,barrier=1 wait,check".to_string(),
            cache_skip_devices: Vec::new(),
        }
    }
}

/// Platform fixups shared by every Qualcomm-based variant.
#[derive(Debug, Clone, Default)]
pub struct QcomFixups {
    config: PlatformConfig,
}

impl QcomFixups {
    pub const ID: &'static str = "qcom";

    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Append a `/cache` line to every `fstab.*` entry that lacks one.
    ///
    /// Some Android 4.2 ROMs mount `/cache` from the init scripts instead of the fstab. Those
    /// mounts are stripped later, so the fstab has to carry the partition. An fstab is left alone
    /// when an active line already mounts `/cache` or when an active line's device is in
    /// `skip_paths`.
    pub fn ensure_cache_entry(
        &self,
        archive: &mut dyn Archive,
        skip_paths: &[String],
    ) -> PatchResult<()> {
        let fstabs: Vec<String> = archive
            .entries()
            .into_iter()
            .filter(|name| is_fstab_entry(name))
            .collect();

        for fstab in fstabs {
            let mut lines = read_lines(archive, &fstab)?;

            let mut has_cache = false;
            let mut skipped = false;
            for caps in lines.iter().filter_map(|line| FSTAB_LINE.captures(line)) {
                if caps.get(1).is_some() {
                    continue;
                }
                if &caps[3] == b"/cache" {
                    has_cache = true;
                }
                if skip_paths.iter().any(|p| p.as_bytes() == &caps[2]) {
                    skipped = true;
                }
            }

            if has_cache || skipped {
                debug!(entry = fstab.as_str(), has_cache, skipped, "fstab needs no cache line");
                continue;
            }

            lines.push(self.config.cache_line.as_bytes().to_vec());
            write_lines(archive, &fstab, &lines);
            debug!(entry = fstab.as_str(), "added cache line");
        }

        Ok(())
    }

    /// Remove `mount <type> <device> /cache ...` commands from `script`.
    pub fn strip_manual_cache_mounts(
        &self,
        archive: &mut dyn Archive,
        script: &str,
    ) -> PatchResult<()> {
        let mut lines = read_lines(archive, script)?;
        let removed = remove_matching(&mut lines, &MANUAL_CACHE_MOUNT);
        if removed > 0 {
            write_lines(archive, script, &lines);
        }
        debug!(entry = script, removed, "stripped manual cache mounts");
        Ok(())
    }

    /// Point `mount_all` in `script` at the generated fstab instead of the static one.
    pub fn switch_to_generated_fstab(
        &self,
        archive: &mut dyn Archive,
        script: &str,
    ) -> PatchResult<()> {
        let mut lines = read_lines(archive, script)?;

        let pattern = line_regex(&format!(
            r"^(\s*mount_all\s+\S*?){}(\s.*)?$",
            regex::escape(&self.config.static_fstab)
        ))
        .map_err(|_| PatchError::malformed(script))?;
        let replacement = format!("${{1}}{}${{2}}", self.config.generated_fstab.replace('$', "$$"));

        let rewritten = replace_matching(&mut lines, &pattern, &replacement);
        if rewritten > 0 {
            write_lines(archive, script, &lines);
        }
        debug!(entry = script, rewritten, "switched to generated fstab");
        Ok(())
    }
}

impl PatchStep for QcomFixups {
    fn id(&self) -> &str {
        Self::ID
    }

    fn apply(&self, archive: &mut dyn Archive) -> PatchResult<()> {
        self.ensure_cache_entry(archive, &self.config.cache_skip_devices)?;
        self.strip_manual_cache_mounts(archive, &self.config.script)?;
        self.switch_to_generated_fstab(archive, &self.config.script)
    }
}

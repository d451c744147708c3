//! Charger-mode mount service for Google Edition ramdisks.

use super::PatchStep;
use rampatch_archive::Archive;
use rampatch_edit::{
    PatchError, PatchResult, append_lines, insert_after_match, line_regex, read_lines,
    write_lines,
};
use regex::bytes::Regex;
use std::sync::LazyLock;
use tracing::debug;

static SYSTEM_MOUNT: LazyLock<Regex> =
    LazyLock::new(|| line_regex(r"mount.*/system").expect("valid system mount regex"));

static ON_CHARGER: LazyLock<Regex> =
    LazyLock::new(|| line_regex(r"on\s+charger").expect("valid charger trigger regex"));

/// Names used by the charger-mode service stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargerConfig {
    pub init_rc: String,
    pub service: String,
    /// Fstab mounted by the service; its completion marker is `/.<name>.completed`.
    pub fstab: String,
    pub wait_secs: u32,
}

impl Default for ChargerConfig {
    fn default() -> Self {
        Self {
            init_rc: "init.rc".to_string(),
            service: "mbtool-charger".to_string(),
            fstab: "/fstab.jgedlte".to_string(),
            wait_secs: 15,
        }
    }
}

impl ChargerConfig {
    fn completion_marker(&self) -> String {
        format!("/.{}.completed", self.fstab.trim_start_matches('/'))
    }
}

/// Mounts the relocated partitions before `/system` is touched in charger mode.
///
/// Google Edition ramdisks mount `/system` straight from `on charger`, which bypasses the
/// generated fstab. The step starts a oneshot service ahead of that mount and waits for it.
///
/// An empty `init.rc` counts as missing. Not idempotent: every run appends another service
/// stanza. Apply at most once per archive.
#[derive(Debug, Clone, Default)]
pub struct ChargerModeMount {
    config: ChargerConfig,
}

impl ChargerModeMount {
    pub const ID: &'static str = "ge-charger-mount";

    pub fn new(config: ChargerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChargerConfig {
        &self.config
    }
}

impl PatchStep for ChargerModeMount {
    fn id(&self) -> &str {
        Self::ID
    }

    fn apply(&self, archive: &mut dyn Archive) -> PatchResult<()> {
        let cfg = &self.config;
        if archive.read(&cfg.init_rc).is_none_or(<[u8]>::is_empty) {
            return Err(PatchError::entry_not_found(cfg.init_rc.as_str()));
        }
        let lines = read_lines(archive, &cfg.init_rc)?;
        let before = lines.len();

        let start = format!("    start {}", cfg.service);
        let wait = format!("    wait {} {}", cfg.completion_marker(), cfg.wait_secs);
        let mut lines = insert_after_match(
            lines,
            &SYSTEM_MOUNT,
            &ON_CHARGER,
            &[start.as_str(), wait.as_str()],
        );
        debug!(
            entry = cfg.init_rc.as_str(),
            inserted = lines.len() - before,
            "injected charger-mode wait"
        );

        let service = format!("service {} /mbtool mount_fstab {}", cfg.service, cfg.fstab);
        append_lines(
            &mut lines,
            &[service.as_str(), "    class core", "    critical", "    oneshot"],
        );

        write_lines(archive, &cfg.init_rc, &lines);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rampatch_archive::MemoryArchive;

    #[test]
    fn injects_wait_before_system_mount_and_appends_service() {
        let mut archive = MemoryArchive::new().with_entry(
            "init.rc",
            "on charger\n    mount ext4 /dev/block/mmcblk0p16 /system ro\n    class_start charger",
        );

        ChargerModeMount::default().apply(&mut archive).unwrap();
        assert_eq!(
            archive.read_string("init.rc").unwrap(),
            "on charger\n\
             \x20   start mbtool-charger\n\
             \x20   wait /.fstab.jgedlte.completed 15\n\
             \x20   mount ext4 /dev/block/mmcblk0p16 /system ro\n\
             \x20   class_start charger\n\
             service mbtool-charger /mbtool mount_fstab /fstab.jgedlte\n\
             \x20   class core\n\
             \x20   critical\n\
             \x20   oneshot"
        );
    }

    #[test]
    fn system_mount_outside_charger_is_untouched() {
        let mut archive = MemoryArchive::new().with_entry(
            "init.rc",
            "on fs\n    mount ext4 /dev/block/mmcblk0p16 /system ro",
        );

        ChargerModeMount::default().apply(&mut archive).unwrap();
        let contents = archive.read_string("init.rc").unwrap();
        assert!(!contents.contains("start mbtool-charger"));
        assert!(contents.ends_with(
            "service mbtool-charger /mbtool mount_fstab /fstab.jgedlte\n    class core\n    critical\n    oneshot"
        ));
    }

    #[test]
    fn rerun_appends_a_second_stanza() {
        let mut archive = MemoryArchive::new().with_entry("init.rc", "on boot");
        let step = ChargerModeMount::default();

        step.apply(&mut archive).unwrap();
        step.apply(&mut archive).unwrap();
        let contents = archive.read_string("init.rc").unwrap();
        assert_eq!(contents.matches("service mbtool-charger").count(), 2);
    }

    #[test]
    fn empty_init_rc_is_entry_not_found() {
        let mut archive = MemoryArchive::new().with_entry("init.rc", "");
        let err = ChargerModeMount::default().apply(&mut archive).unwrap_err();
        assert_eq!(err, PatchError::entry_not_found("init.rc"));
        assert_eq!(archive.read_string("init.rc").unwrap(), "");
    }

    #[test]
    fn missing_init_rc_is_entry_not_found() {
        let mut archive = MemoryArchive::new();
        let err = ChargerModeMount::default().apply(&mut archive).unwrap_err();
        assert_eq!(err, PatchError::entry_not_found("init.rc"));
    }
}

//! Samsung (TouchWiz and Google Edition) skin fixups for the low-power-mode scripts.

use super::PatchStep;
use rampatch_archive::Archive;
use rampatch_edit::{LineRule, PatchResult, apply_rules, read_lines, write_lines};
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

/// Low-power-mode script generation, detected from the ramdisk contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinVariant {
    /// Jelly Bean era ramdisks that ship `MSM8960_lpm.rc`.
    Legacy,
    /// KitKat era ramdisks.
    Current,
}

impl SkinVariant {
    /// Entry that only exists in legacy ramdisks.
    pub const MARKER: &'static str = "MSM8960_lpm.rc";

    pub fn detect(archive: &dyn Archive) -> Self {
        if archive.exists(Self::MARKER) {
            SkinVariant::Legacy
        } else {
            SkinVariant::Current
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SkinVariant::Legacy => "legacy",
            SkinVariant::Current => "current",
        }
    }

    /// Low-power-mode script rewritten for this variant.
    pub fn script(self) -> &'static str {
        self.table().script
    }

    fn table(self) -> &'static SkinTable {
        match self {
            SkinVariant::Legacy => &LEGACY,
            SkinVariant::Current => &CURRENT,
        }
    }
}

struct SkinTable {
    script: &'static str,
    rules: Vec<LineRule>,
}

impl SkinTable {
    fn compile(script: &'static str, rules: &[(&str, &str)]) -> Self {
        Self {
            script,
            rules: rules
                .iter()
                .map(|(pattern, replacement)| {
                    LineRule::new(pattern, *replacement).expect("valid skin rule regex")
                })
                .collect(),
        }
    }
}

/// The generated fstab owns `/cache` now, so manual mounts (and the waits guarding them) are
/// commented out rather than deleted. Jelly Bean scripts drive the Samsung `lpm` service from
/// their power-state triggers; those lines are pointed at the `charger` service instead.
const LEGACY_RULES: &[(&str, &str)] = &[
    (r"^(\s+)(mount\s.*\s/cache(?:\s.*)?)$", "${1}#${2}"),
    (r"^(\s+)(wait\s+\S*/cache(?:\s.*)?)$", "${1}#${2}"),
    (r"^(\s+(?:start|stop|restart)\s+)lpm(\s.*)?$", "${1}charger${2}"),
];

const CURRENT_RULES: &[(&str, &str)] = &[
    (r"^(\s+mount_all\s+\S*?)fstab\.qcom(\s.*)?$", "${1}fstab.qcom.gen${2}"),
    (r"^(\s+)(mount\s.*\s/cache(?:\s.*)?)$", "${1}#${2}"),
];

static LEGACY: LazyLock<SkinTable> =
    LazyLock::new(|| SkinTable::compile(SkinVariant::MARKER, LEGACY_RULES));
static CURRENT: LazyLock<SkinTable> = LazyLock::new(|| SkinTable::compile("lpm.rc", CURRENT_RULES));

/// Vendor-skin fixups, parameterized by the detected [`SkinVariant`].
#[derive(Debug, Clone)]
pub struct VendorSkinFixups {
    variant: SkinVariant,
}

impl VendorSkinFixups {
    pub const ID: &'static str = "galaxy";

    pub fn new(variant: SkinVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> SkinVariant {
        self.variant
    }

    /// Rewrite the low-power-mode script with this variant's substitution table.
    ///
    /// The script must exist; callers that tolerate its absence check first.
    pub fn modify_lpm_script(&self, archive: &mut dyn Archive) -> PatchResult<()> {
        let table = self.variant.table();
        let mut lines = read_lines(archive, table.script)?;

        let rewritten = apply_rules(&mut lines, &table.rules);
        if rewritten > 0 {
            write_lines(archive, table.script, &lines);
        }
        debug!(
            entry = table.script,
            variant = self.variant.as_str(),
            rewritten,
            "modified low-power-mode script"
        );
        Ok(())
    }
}

impl PatchStep for VendorSkinFixups {
    fn id(&self) -> &str {
        Self::ID
    }

    fn apply(&self, archive: &mut dyn Archive) -> PatchResult<()> {
        self.modify_lpm_script(archive)
    }
}

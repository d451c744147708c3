//! Device/ROM variants and the pipelines they map to.

use crate::pipeline::Pipeline;
use crate::steps::{
    ChargerConfig, ChargerModeMount, CoreFixups, PatchStep, PlatformConfig, QcomFixups,
    SkinVariant, VendorSkinFixups,
};
use rampatch_archive::Archive;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// AOSP and AOSP-derived ROMs.
    JflteAosp,
    /// Google Play Edition ROMs.
    JflteGoogleEdition,
    /// Samsung TouchWiz ROMs (Android 4.2 to 4.4).
    JflteTouchWiz,
}

/// Static description of a variant, for listing and explanations.
#[derive(Debug, Clone, Serialize)]
pub struct VariantMeta {
    pub id: &'static str,
    pub variant: Variant,
    pub title: &'static str,
    pub description: &'static str,
    /// Step ids in run order.
    pub steps: &'static [&'static str],
}

pub static VARIANTS: &[VariantMeta] = &[
    VariantMeta {
        id: "jflte/AOSP/AOSP",
        variant: Variant::JflteAosp,
        title: "Galaxy S 4, AOSP-based ROM",
        description: "SELinux context fixups plus Qualcomm cache and generated-fstab fixups.",
        steps: &[CoreFixups::ID, QcomFixups::ID],
    },
    VariantMeta {
        id: "jflte/GoogleEdition/GoogleEdition",
        variant: Variant::JflteGoogleEdition,
        title: "Galaxy S 4, Google Play Edition ROM",
        description: "Core and Qualcomm fixups, a charger-mode mount service started before \
                      /system is mounted, and low-power-mode script fixups.",
        steps: &[
            CoreFixups::ID,
            ChargerModeMount::ID,
            QcomFixups::ID,
            VendorSkinFixups::ID,
        ],
    },
    VariantMeta {
        id: "jflte/TouchWiz/TouchWiz",
        variant: Variant::JflteTouchWiz,
        title: "Galaxy S 4, TouchWiz ROM",
        description: "Core and Qualcomm fixups plus low-power-mode script fixups.",
        steps: &[CoreFixups::ID, QcomFixups::ID, VendorSkinFixups::ID],
    },
];

/// Configuration shared by all pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub platform: PlatformConfig,
    pub charger: ChargerConfig,
}

impl Variant {
    pub fn meta(self) -> &'static VariantMeta {
        match self {
            Variant::JflteAosp => &VARIANTS[0],
            Variant::JflteGoogleEdition => &VARIANTS[1],
            Variant::JflteTouchWiz => &VARIANTS[2],
        }
    }

    pub fn id(self) -> &'static str {
        self.meta().id
    }

    pub fn from_id(id: &str) -> Option<Self> {
        VARIANTS.iter().find(|m| m.id == id).map(|m| m.variant)
    }

    /// Build this variant's pipeline bound to `archive`.
    ///
    /// Variants with skin fixups detect the [`SkinVariant`] from `archive` here, before any step
    /// runs.
    pub fn pipeline<'a>(
        self,
        archive: &'a mut dyn Archive,
        config: &PipelineConfig,
    ) -> Pipeline<'a> {
        let core: Box<dyn PatchStep> = Box::new(CoreFixups::new());
        let qcom: Box<dyn PatchStep> = Box::new(QcomFixups::new(config.platform.clone()));

        let steps: Vec<Box<dyn PatchStep>> = match self {
            Variant::JflteAosp => vec![core, qcom],
            Variant::JflteGoogleEdition => {
                let skin = SkinVariant::detect(&*archive);
                debug!(variant = self.id(), skin = skin.as_str(), "detected skin variant");
                vec![
                    core,
                    Box::new(ChargerModeMount::new(config.charger.clone())),
                    qcom,
                    Box::new(VendorSkinFixups::new(skin)),
                ]
            }
            Variant::JflteTouchWiz => {
                let skin = SkinVariant::detect(&*archive);
                debug!(variant = self.id(), skin = skin.as_str(), "detected skin variant");
                vec![core, qcom, Box::new(VendorSkinFixups::new(skin))]
            }
        };

        Pipeline::new(self.id(), archive, steps)
    }
}

use rampatch_archive::Archive;
use rampatch_edit::PatchResult;

mod charger;
mod common;
mod galaxy;
mod qcom;

pub use charger::{ChargerConfig, ChargerModeMount};
pub use common::CoreFixups;
pub use galaxy::{SkinVariant, VendorSkinFixups};
pub use qcom::{PlatformConfig, QcomFixups};

/// One patch step of a pipeline.
///
/// `apply` mutates the archive in place through `Archive::write`. An error leaves the entry the
/// step was editing untouched.
pub trait PatchStep {
    /// Stable identifier for diagnostics. Never used for control flow.
    fn id(&self) -> &str;

    fn apply(&self, archive: &mut dyn Archive) -> PatchResult<()>;
}

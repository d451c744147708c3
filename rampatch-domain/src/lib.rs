//! Domain logic: the ramdisk patch steps and the pipelines that compose them.
//!
//! This crate owns *what* gets rewritten in a ramdisk and in which order. Line-level editing lives
//! in `rampatch-edit`; the archive container is behind the `rampatch-archive` port.

mod catalog;
mod pipeline;
mod steps;

pub use catalog::{PipelineConfig, VARIANTS, Variant, VariantMeta};
pub use pipeline::{Pipeline, PipelineFailure, PipelineState};
pub use steps::{
    ChargerConfig, ChargerModeMount, CoreFixups, PatchStep, PlatformConfig, QcomFixups,
    SkinVariant, VendorSkinFixups,
};

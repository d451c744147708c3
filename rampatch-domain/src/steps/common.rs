//! Device-agnostic fixups applied to every ramdisk.

use super::PatchStep;
use rampatch_archive::Archive;
use rampatch_edit::{PatchResult, read_lines, write_lines};
use tracing::debug;

/// Fixups every variant gets, regardless of device or ROM type.
#[derive(Debug, Clone, Default)]
pub struct CoreFixups;

impl CoreFixups {
    pub const ID: &'static str = "core";

    const FILE_CONTEXTS: &'static str = "file_contexts";
    const DATA_MEDIA_PREFIX: &'static str = "/data/media";
    const DATA_MEDIA_CONTEXT: &'static str = "/data/media(/.*)? u:object_r:media_rw_data_file:s0";

    pub fn new() -> Self {
        Self
    }

    /// Make sure `/data/media` has its own SELinux context.
    ///
    /// Some ROMs leave it out, so after a restorecon the directory inherits the context of `/data`
    /// and stricter policies deny access to internal storage. Ramdisks without `file_contexts`
    /// predate SELinux and are left alone.
    pub fn fix_data_media_context(&self, archive: &mut dyn Archive) -> PatchResult<()> {
        if !archive.exists(Self::FILE_CONTEXTS) {
            debug!(entry = Self::FILE_CONTEXTS, "no security context table, skipping");
            return Ok(());
        }

        let mut lines = read_lines(archive, Self::FILE_CONTEXTS)?;
        if lines
            .iter()
            .any(|line| line.starts_with(Self::DATA_MEDIA_PREFIX.as_bytes()))
        {
            return Ok(());
        }

        lines.push(Self::DATA_MEDIA_CONTEXT.as_bytes().to_vec());
        write_lines(archive, Self::FILE_CONTEXTS, &lines);
        debug!(entry = Self::FILE_CONTEXTS, "added /data/media context");
        Ok(())
    }
}

impl PatchStep for CoreFixups {
    fn id(&self) -> &str {
        Self::ID
    }

    fn apply(&self, archive: &mut dyn Archive) -> PatchResult<()> {
        self.fix_data_media_context(archive)
    }
}

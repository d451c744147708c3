//! Run reports: unified diff preview and a JSON summary of changed entries.

use diffy::PatchFormatter;
use rampatch_archive::{Archive, MemoryArchive};
use rampatch_domain::PipelineFailure;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFailure {
    pub step: String,
    pub kind: &'static str,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryChange {
    pub entry: String,
    pub before_sha256: Option<String>,
    pub after_sha256: String,
}

/// Summary of one pipeline run over one ramdisk.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    pub pipeline: String,
    pub status: ReportStatus,
    pub failure: Option<ReportFailure>,
    /// Whether changes were written back to disk.
    pub applied: bool,
    pub changes: Vec<EntryChange>,
}

impl PatchReport {
    pub fn new(
        pipeline: &str,
        before: &MemoryArchive,
        after: &MemoryArchive,
        outcome: Result<(), &PipelineFailure>,
        applied: bool,
    ) -> Self {
        let changes = after
            .changed_since(before)
            .into_iter()
            .map(|entry| EntryChange {
                before_sha256: before.read(&entry).map(sha256_hex),
                after_sha256: after.read(&entry).map(sha256_hex).unwrap_or_default(),
                entry,
            })
            .collect();

        let (status, failure) = match outcome {
            Ok(()) => (ReportStatus::Succeeded, None),
            Err(f) => (
                ReportStatus::Failed,
                Some(ReportFailure {
                    step: f.step.clone(),
                    kind: f.error.kind().as_str(),
                    path: f.error.path().to_string(),
                }),
            ),
        };

        Self {
            pipeline: pipeline.to_string(),
            status,
            failure,
            applied,
            changes,
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Render a git-style unified diff of every entry that differs between the two archives.
pub fn render_patch(before: &MemoryArchive, after: &MemoryArchive) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for entry in after.changed_since(before) {
        let old = before.read_string(&entry).unwrap_or_default();
        let new = after.read_string(&entry).unwrap_or_default();

        out.push_str(&format!("diff --git a/{0} b/{0}\n", entry));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", entry));

        let patch = diffy::create_patch(&old, &new);
        // diffy emits its own ---/+++ header; keep only the hunks.
        let body = formatter.fmt_patch(&patch).to_string();
        for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampatch_edit::PatchError;

    fn archives() -> (MemoryArchive, MemoryArchive) {
        let before = MemoryArchive::new()
            .with_entry("init.rc", "on boot\n")
            .with_entry("fstab.qcom", "/dev/a /system ext4 ro wait\n");
        let mut after = before.clone();
        after.write("fstab.qcom", b"/dev/a /system ext4 ro wait\n/dev/b /cache ext4 rw wait\n".to_vec());
        (before, after)
    }

    #[test]
    fn patch_covers_only_changed_entries() {
        let (before, after) = archives();
        let patch = render_patch(&before, &after);

        assert!(patch.starts_with("diff --git a/fstab.qcom b/fstab.qcom\n--- a/fstab.qcom\n+++ b/fstab.qcom\n@@"));
        assert!(patch.contains("+/dev/b /cache ext4 rw wait\n"));
        assert!(!patch.contains("init.rc"));
        assert_eq!(patch.matches("--- a/").count(), 1);
    }

    #[test]
    fn empty_patch_when_nothing_changed() {
        let (before, _) = archives();
        assert_eq!(render_patch(&before, &before), "");
    }

    #[test]
    fn report_lists_changes_with_digests() {
        let (before, after) = archives();
        let report = PatchReport::new("jflte/AOSP/AOSP", &before, &after, Ok(()), false);

        assert_eq!(report.status, ReportStatus::Succeeded);
        assert!(report.failure.is_none());
        assert_eq!(report.changes.len(), 1);
        let change = &report.changes[0];
        assert_eq!(change.entry, "fstab.qcom");
        assert_eq!(change.after_sha256.len(), 64);
        assert_ne!(change.before_sha256.as_deref(), Some(change.after_sha256.as_str()));
    }

    #[test]
    fn report_carries_failure() {
        let (before, _) = archives();
        let failure = PipelineFailure {
            pipeline: "jflte/AOSP/AOSP".to_string(),
            step: "qcom".to_string(),
            error: PatchError::entry_not_found("init.target.rc"),
        };
        let report = PatchReport::new("jflte/AOSP/AOSP", &before, &before, Err(&failure), false);

        assert_eq!(report.status, ReportStatus::Failed);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure"]["step"], "qcom");
        assert_eq!(json["failure"]["kind"], "entry_not_found");
        assert_eq!(json["failure"]["path"], "init.target.rc");
    }
}

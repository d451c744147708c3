//! End-to-end pipeline runs against in-memory ramdisks.

use pretty_assertions::assert_eq;
use rampatch_archive::{Archive, MemoryArchive};
use rampatch_domain::{
    ChargerModeMount, CoreFixups, PipelineConfig, PipelineState, QcomFixups, SkinVariant,
    Variant, VendorSkinFixups,
};
use rampatch_edit::{ErrorKind, PatchError};

const INIT_RC: &str = "on early-init\n    start ueventd\n\non charger\n    mount ext4 /dev/block/platform/msm_sdcc.1/by-name/system /system ro\n    class_start charger\n";

const INIT_TARGET_RC: &str = "on fs\n    mount_all fstab.qcom\n    mount ext4 /dev/block/platform/msm_sdcc.1/by-name/cache /cache nosuid nodev barrier=1\n";

const FSTAB_QCOM: &str = "/dev/block/platform/msm_sdcc.1/by-name/system /system ext4 ro,barrier=1 wait\n";

const CACHE_LINE: &str =
    "/dev/block/platform/msm_sdcc.1/by-name/cache /cache ext4 nosuid,nodev,barrier=1 wait,check";

fn aosp_ramdisk() -> MemoryArchive {
    MemoryArchive::new()
        .with_entry("init.rc", "on boot\n")
        .with_entry("init.target.rc", "/dev/x /system ext4 ro,noatime wait\n")
}

#[test]
fn plain_variant_succeeds_on_minimal_ramdisk() {
    let mut archive = aosp_ramdisk();

    let mut pipeline = Variant::JflteAosp.pipeline(&mut archive, &PipelineConfig::default());
    assert_eq!(pipeline.id(), "jflte/AOSP/AOSP");
    assert!(!pipeline.step_ids().contains(&VendorSkinFixups::ID));

    pipeline.patch().expect("plain variant succeeds");
    assert_eq!(pipeline.state(), &PipelineState::Succeeded);
    drop(pipeline);

    let target = archive.read_string("init.target.rc").unwrap();
    assert_eq!(target, "/dev/x /system ext4 ro,noatime wait\n");
    assert!(!archive.exists("file_contexts"));
}

#[test]
fn plain_variant_fails_at_platform_step_without_target_script() {
    let mut archive = MemoryArchive::new()
        .with_entry("init.rc", "on boot\n")
        .with_entry("file_contexts", "/system(/.*)? u:object_r:system_file:s0");

    let mut pipeline = Variant::JflteAosp.pipeline(&mut archive, &PipelineConfig::default());
    let failure = pipeline.patch().unwrap_err();

    assert_eq!(failure.step, QcomFixups::ID);
    assert_eq!(failure.error.kind(), ErrorKind::EntryNotFound);
    assert_eq!(failure.error.path(), "init.target.rc");
    assert!(matches!(pipeline.state(), PipelineState::Failed(f) if f == &failure));
    drop(pipeline);

    // Core fixups ran first and keep their effect.
    assert!(
        archive
            .read_string("file_contexts")
            .unwrap()
            .ends_with("/data/media(/.*)? u:object_r:media_rw_data_file:s0")
    );
}

#[test]
fn google_edition_runs_every_step() {
    let mut archive = MemoryArchive::new()
        .with_entry("init.rc", INIT_RC)
        .with_entry("init.target.rc", INIT_TARGET_RC)
        .with_entry("fstab.qcom", FSTAB_QCOM)
        .with_entry("file_contexts", "/data(/.*)? u:object_r:system_data_file:s0\n")
        .with_entry(
            "MSM8960_lpm.rc",
            "on charger\n    mount ext4 /dev/block/platform/msm_sdcc.1/by-name/cache /cache nosuid\n",
        );

    let mut pipeline =
        Variant::JflteGoogleEdition.pipeline(&mut archive, &PipelineConfig::default());
    assert_eq!(
        pipeline.step_ids(),
        vec![
            CoreFixups::ID,
            ChargerModeMount::ID,
            QcomFixups::ID,
            VendorSkinFixups::ID
        ]
    );
    pipeline.patch().expect("google edition succeeds");
    drop(pipeline);

    let init_rc = archive.read_string("init.rc").unwrap();
    assert!(init_rc.contains(
        "on charger\n    start mbtool-charger\n    wait /.fstab.jgedlte.completed 15\n    mount ext4"
    ));
    assert_eq!(init_rc.matches("service mbtool-charger").count(), 1);

    assert_eq!(
        archive.read_string("init.target.rc").unwrap(),
        "on fs\n    mount_all fstab.qcom.gen\n"
    );
    assert_eq!(
        archive.read_string("fstab.qcom").unwrap(),
        format!("{FSTAB_QCOM}\n{CACHE_LINE}")
    );
    assert_eq!(
        archive.read_string("MSM8960_lpm.rc").unwrap(),
        "on charger\n    #mount ext4 /dev/block/platform/msm_sdcc.1/by-name/cache /cache nosuid\n"
    );
}

#[test]
fn touchwiz_without_lpm_script_fails_at_skin_step() {
    let mut archive = MemoryArchive::new()
        .with_entry("init.rc", INIT_RC)
        .with_entry("init.target.rc", INIT_TARGET_RC);
    assert_eq!(SkinVariant::detect(&archive), SkinVariant::Current);

    let mut pipeline = Variant::JflteTouchWiz.pipeline(&mut archive, &PipelineConfig::default());
    let failure = pipeline.patch().unwrap_err();
    assert_eq!(failure.step, VendorSkinFixups::ID);
    assert_eq!(failure.error, PatchError::entry_not_found("lpm.rc"));
    drop(pipeline);

    // Platform fixups already ran.
    assert_eq!(
        archive.read_string("init.target.rc").unwrap(),
        "on fs\n    mount_all fstab.qcom.gen\n"
    );
}

#[test]
fn touchwiz_current_rewrites_lpm_rc() {
    let mut archive = MemoryArchive::new()
        .with_entry("init.rc", INIT_RC)
        .with_entry("init.target.rc", INIT_TARGET_RC)
        .with_entry("lpm.rc", "on charger\n    mount_all fstab.qcom\n");

    let mut pipeline = Variant::JflteTouchWiz.pipeline(&mut archive, &PipelineConfig::default());
    pipeline.patch().expect("touchwiz succeeds");
    drop(pipeline);

    assert_eq!(
        archive.read_string("lpm.rc").unwrap(),
        "on charger\n    mount_all fstab.qcom.gen\n"
    );
    // No charger service outside the Google Edition pipeline.
    assert_eq!(archive.read_string("init.rc").unwrap(), INIT_RC);
}

#[test]
fn google_edition_without_init_rc_fails_before_platform_step() {
    let mut archive = MemoryArchive::new().with_entry("init.target.rc", INIT_TARGET_RC);

    let mut pipeline =
        Variant::JflteGoogleEdition.pipeline(&mut archive, &PipelineConfig::default());
    let failure = pipeline.patch().unwrap_err();
    assert_eq!(failure.step, ChargerModeMount::ID);
    assert_eq!(failure.error, PatchError::entry_not_found("init.rc"));
    drop(pipeline);

    assert_eq!(archive.read_string("init.target.rc").unwrap(), INIT_TARGET_RC);
}

#[test]
fn plain_variant_patches_non_utf8_entries() {
    let mut archive = MemoryArchive::new()
        .with_entry("init.rc", "on boot\n")
        .with_entry(
            "file_contexts",
            b"# caf\xe9 comment\n/system(/.*)? u:object_r:system_file:s0\n".to_vec(),
        )
        .with_entry(
            "init.target.rc",
            b"# propri\xe9t\xe9\non fs\n    mount_all fstab.qcom\n".to_vec(),
        );

    let mut pipeline = Variant::JflteAosp.pipeline(&mut archive, &PipelineConfig::default());
    pipeline.patch().expect("non UTF-8 entries are still patchable");
    drop(pipeline);

    assert_eq!(
        archive.read("file_contexts"),
        Some(
            &b"# caf\xe9 comment\n/system(/.*)? u:object_r:system_file:s0\n\n/data/media(/.*)? u:object_r:media_rw_data_file:s0"[..]
        )
    );
    assert_eq!(
        archive.read("init.target.rc"),
        Some(&b"# propri\xe9t\xe9\non fs\n    mount_all fstab.qcom.gen\n"[..])
    );
}

//! Golden fixture tests for rampatch.
//!
//! Each fixture under `tests/fixtures/<name>/` contains:
//!
//! - `variant.txt` - the pipeline id to run
//! - `ramdisk/` - the extracted ramdisk
//! - `expected/outcome.txt` - `succeeded` or `failed <step> <kind> <path>`
//! - `expected/patch.diff` - the rendered preview
//!
//! Set `RAMPATCH_BLESS=1` to (re)write `patch.diff` files instead of comparing against them.

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use pretty_assertions::assert_eq;
use rampatch_archive::load_dir;
use rampatch_cli::report::render_patch;
use rampatch_domain::{PipelineConfig, Variant};

fn fixture_dir(name: &str) -> Utf8PathBuf {
    let manifest_dir = Utf8Path::new(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().expect("workspace root");
    workspace_root.join("tests").join("fixtures").join(name)
}

fn run_fixture_test(fixture_name: &str) {
    let fixture = fixture_dir(fixture_name);
    assert!(fixture.exists(), "Fixture directory does not exist: {fixture}");

    let variant_id = fs::read_to_string(fixture.join("variant.txt")).expect("read variant.txt");
    let variant = Variant::from_id(variant_id.trim())
        .unwrap_or_else(|| panic!("unknown variant in fixture: {}", variant_id.trim()));

    let before = load_dir(&fixture.join("ramdisk")).expect("load ramdisk");
    let mut after = before.clone();
    let config = PipelineConfig::default();

    let outcome = {
        let mut pipeline = variant.pipeline(&mut after, &config);
        match pipeline.patch() {
            Ok(()) => "succeeded".to_string(),
            Err(f) => format!("failed {} {} {}", f.step, f.error.kind().as_str(), f.error.path()),
        }
    };

    let expected_dir = fixture.join("expected");
    let expected_outcome =
        fs::read_to_string(expected_dir.join("outcome.txt")).expect("read outcome.txt");
    assert_eq!(outcome, expected_outcome.trim(), "outcome mismatch for {fixture_name}");

    let actual_patch = render_patch(&before, &after);
    let expected_patch_path = expected_dir.join("patch.diff");
    let bless = std::env::var_os("RAMPATCH_BLESS").is_some();

    if bless {
        fs::create_dir_all(&expected_dir).expect("create expected dir");
        fs::write(&expected_patch_path, &actual_patch).expect("write expected patch");
        println!("Blessed expected patch for '{fixture_name}' at {expected_patch_path}");
        return;
    }

    assert!(
        expected_patch_path.exists(),
        "missing {expected_patch_path}; run `cargo run -p xtask -- bless-fixtures` and commit the result"
    );
    let expected_patch = fs::read_to_string(&expected_patch_path).expect("read patch.diff");
    assert_eq!(
        actual_patch.replace("\r\n", "\n"),
        expected_patch.replace("\r\n", "\n"),
        "patch mismatch for {fixture_name}"
    );
}

#[test]
fn golden_jflte_aosp_minimal() {
    run_fixture_test("jflte_aosp_minimal");
}

#[test]
fn golden_jflte_aosp_missing_target() {
    run_fixture_test("jflte_aosp_missing_target");
}

#[test]
fn golden_jflte_ge_legacy() {
    run_fixture_test("jflte_ge_legacy");
}

#[test]
fn golden_jflte_touchwiz_current() {
    run_fixture_test("jflte_touchwiz_current");
}

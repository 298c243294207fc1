use std::path::Path;
use std::process::Command;

/// Drive the bundled `.test.vim` fixtures through `viml test`.
#[test]
fn bundled_fixtures_pass() {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let output = Command::new(env!("CARGO_BIN_EXE_viml"))
        .arg("test")
        .arg("--no-color")
        .arg(&fixtures)
        .output()
        .expect("failed to launch viml");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "fixture run failed:\n{}",
        stderr
    );
    assert!(stderr.contains("test result: ok"), "unexpected output:\n{}", stderr);
}

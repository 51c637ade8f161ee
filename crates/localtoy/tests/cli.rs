use std::process::Command;

use tempfile::TempDir;

// These tests exercise only the argument and filesystem checks that run
// before the window or GPU device is touched, so they pass on headless CI.

fn localtoy() -> Command {
    Command::new(env!("CARGO_BIN_EXE_localtoy"))
}

#[test]
fn help_exits_successfully() {
    let output = localtoy().arg("--help").output().expect("launch localtoy");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("--size"));
    assert!(text.contains("--no-vsync"));
}

#[test]
fn malformed_size_is_rejected_before_startup() {
    let output = localtoy()
        .args(["--size", "notasize"])
        .output()
        .expect("launch localtoy");
    assert!(!output.status.success());
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("invalid --size"), "stderr was: {text}");
}

#[test]
fn missing_shader_pair_is_rejected_before_startup() {
    let empty = TempDir::new().unwrap();
    let output = localtoy()
        .args(["--shaders-root", empty.path().to_str().unwrap()])
        .output()
        .expect("launch localtoy");
    assert!(!output.status.success());
    let text = String::from_utf8_lossy(&output.stderr);
    assert!(text.contains("not found under"), "stderr was: {text}");
}

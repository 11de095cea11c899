//! CLI argument errors terminate before any side effect, with a
//! corrective hint on stderr and exit code 2.

use assert_cmd::Command;

fn reel_bin_path() -> std::path::PathBuf {
    let mut path = std::env::current_exe().expect("current test exe");
    path.pop(); // deps/
    path.pop(); // debug/ (or release/)
    path.push(if cfg!(windows) { "reel.exe" } else { "reel" });
    path
}

fn run_reel(args: &[&str]) -> (Option<i32>, String, String) {
    let output = Command::new(reel_bin_path())
        // Point all state at a scratch directory so a bug cannot touch
        // the developer's real state.
        .env("REEL_STATE_DIR", std::env::temp_dir().join("reel-spec-state"))
        .args(args)
        .output()
        .expect("spawn reel");
    (
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn start_stage_above_one_without_resume_is_exit_2_with_hint() {
    let (code, _out, err) = run_reel(&["run", "https://example.com/v/1", "--start-stage", "3"]);
    assert_eq!(code, Some(2));
    assert!(err.contains("requires --resume"), "{err}");
    assert!(err.contains("hint:"), "{err}");
}

#[test]
fn out_of_range_start_stage_is_exit_2() {
    let (code, _out, err) = run_reel(&["run", "https://example.com/v/1", "--start-stage", "12"]);
    assert_eq!(code, Some(2));
    assert!(err.contains("out of range"), "{err}");
}

#[test]
fn missing_resume_path_is_exit_2() {
    let (code, _out, err) = run_reel(&[
        "run",
        "https://example.com/v/1",
        "--resume",
        "/nonexistent/workspace/runs/r1",
        "--start-stage",
        "3",
    ]);
    assert_eq!(code, Some(2));
    assert!(err.contains("does not exist"), "{err}");
}

#[test]
fn non_url_argument_is_exit_2() {
    let (code, _out, err) = run_reel(&["run", "not-a-url"]);
    assert_eq!(code, Some(2));
    assert!(err.contains("http(s) URL"), "{err}");
}

#[test]
fn help_documents_the_run_surface() {
    let (code, out, _err) = run_reel(&["run", "--help"]);
    assert_eq!(code, Some(0));
    for flag in ["--target-duration", "--start-stage", "--resume", "--moments"] {
        assert!(out.contains(flag), "missing {flag} in help:\n{out}");
    }
}

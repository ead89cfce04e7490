use std::process::Command;

fn uploader(args: &[&str]) -> std::process::Output {
    let cwd = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_tcx-uploader"))
        .args(args)
        .current_dir(cwd.path())
        .env_remove("STRAVA_ACCESS_TOKEN")
        .env_remove("RUST_LOG")
        .env("STRAVA_API_URL", "http://127.0.0.1:9")
        .env("STRAVA_ACTIVITIES_DIR", cwd.path())
        .output()
        .unwrap()
}

#[test]
fn empty_token_exits_with_usage() {
    let out = uploader(&["-token", ""]);
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert_eq!(out.status.code(), Some(1));
    assert!(stderr.contains("Please provide an access_token"));
    assert!(stderr.contains("--token"));
    assert!(!stderr.contains("Uploading file"));
}

#[test]
fn missing_token_exits_with_usage() {
    let out = uploader(&[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Please provide an access_token"));
}

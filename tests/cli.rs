use std::io::Write;
use std::process::{Command, Output};

fn mkpasswd(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grub-mkpasswd-pbkdf2"))
        .args(args)
        .output()
        .expect("failed to run binary")
}

#[test]
fn version_flag() {
    let out = mkpasswd(&["-V"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("grub-mkpasswd-pbkdf2 "));
}

#[test]
fn help_lists_options() {
    let out = mkpasswd(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    for flag in ["--iteration-count", "--buflen", "--saltlen"] {
        assert!(stdout.contains(flag), "help is missing {flag}");
    }
}

#[test]
fn zero_iterations_rejected_before_prompting() {
    let out = mkpasswd(&["-c", "0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert_eq!(
        stderr,
        "grub-mkpasswd-pbkdf2: error: invalid iteration count `0`: must be a positive integer\n"
    );
}

#[test]
fn malformed_lengths_are_one_line_errors() {
    let cases: [&[&str]; 3] = [&["-l", "ten"], &["-s", "0x"], &["--buflen=-1"]];
    for args in cases {
        let out = mkpasswd(args);
        assert_eq!(out.status.code(), Some(1), "{args:?}");
        assert!(out.stdout.is_empty());
        let stderr = String::from_utf8(out.stderr).unwrap();
        assert_eq!(stderr.lines().count(), 1, "{stderr}");
        assert!(stderr.starts_with("grub-mkpasswd-pbkdf2: error: invalid "), "{stderr}");
    }
}

#[test]
fn missing_config_is_one_line_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");
    let out = mkpasswd(&["--config", path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert_eq!(stderr.lines().count(), 1);
    assert!(stderr.starts_with("grub-mkpasswd-pbkdf2: error: Failed to load config"));
}

#[test]
fn zero_saltlen_in_config_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"saltlen = 0\n").unwrap();
    let out = mkpasswd(&["--config", file.path().to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid saltlen `0`"));
}

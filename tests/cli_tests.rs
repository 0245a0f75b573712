#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    const ENV_VARS: &[&str] = &[
        "CLICKONCE_PROJECT",
        "CLICKONCE_PUBLISH_DIR",
        "CLICKONCE_PFX",
        "CLICKONCE_PFX_PASSWORD",
        "CLICKONCE_THUMBPRINT",
        "CLICKONCE_TIMESTAMP_URL",
        "CLICKONCE_PUBLISHER",
        "CLICKONCE_TOOL_TIMEOUT",
        "SIGNTOOL_PATH",
        "MAGE_PATH",
        "OPENSSL_PATH",
        "CERTUTIL_PATH",
    ];

    fn cmd() -> Command {
        let mut cmd = Command::cargo_bin("kodegen_bundler_clickonce").expect("binary builds");
        for var in ENV_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn test_help_lists_commands() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("sign"))
            .stdout(predicate::str::contains("restore"))
            .stdout(predicate::str::contains("thumbprint"));
    }

    #[test]
    fn test_sign_help_shows_env_fallbacks() {
        cmd()
            .args(["sign", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("CLICKONCE_THUMBPRINT"))
            .stdout(predicate::str::contains("http://timestamp.digicert.com"))
            .stdout(predicate::str::contains("--dry-run"));
    }

    #[test]
    fn test_missing_required_arguments_is_a_usage_error() {
        cmd().arg("sign").assert().code(2);
    }

    #[test]
    fn test_invalid_marker_is_rejected() {
        cmd()
            .args([
                "sign",
                "--project",
                "App",
                "--publisher",
                "Contoso",
                "--marker",
                "deploy",
            ])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Marker extension"));
    }

    #[test]
    fn test_restore_without_journal_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        cmd()
            .args(["restore", "--publish-dir"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to restore"));
    }

    #[test]
    fn test_restore_missing_publish_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        cmd()
            .args(["restore", "--publish-dir"])
            .arg(dir.path().join("missing"))
            .assert()
            .code(11)
            .stderr(predicate::str::contains("Command 'restore' failed"));
    }

    #[test]
    fn test_restore_repairs_stripped_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let payload = dir.path().join("Application Files").join("App_1_0_0_1");
        std::fs::create_dir_all(&payload).expect("mkdir");
        std::fs::write(payload.join("App.exe.deploy"), b"exe").expect("write");

        kodegen_bundler_clickonce::payload::PayloadFileSet::strip(
            &payload,
            ".deploy",
            vec![],
            &kodegen_bundler_clickonce::payload::journal_path(dir.path()),
        )
        .expect("strip");

        cmd()
            .args(["restore", "--publish-dir"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Restored marker on 1 file(s)"));
        assert!(payload.join("App.exe.deploy").exists());
    }
}

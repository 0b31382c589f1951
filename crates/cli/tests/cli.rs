use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("bookshelf")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("migrate"));
}

#[test]
fn migrate_without_database_url_fails() {
    let output = Command::cargo_bin("bookshelf")
        .unwrap()
        .arg("migrate")
        .env_remove("DATABASE_URL")
        .env_remove("BOOKSHELF_DATABASE__URL")
        .env("BOOKSHELF_CONFIG_DIR", "/nonexistent")
        .current_dir(std::env::temp_dir())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DATABASE_URL"));
}
